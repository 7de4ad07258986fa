// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::Result;
use crate::admin_client::AdminClient;
use crate::metadata_update_policy::{MetadataParamTypes, MetadataUpdatePolicy};
use crate::model::{
    CreateTableRequest, DeleteTableRequest, GetTableRequest, ListTablesRequest, Table, TableView,
};
use futures::future::Either;
use google_cloud_retry::async_retry_loop::retry_async_unary_rpc;
use google_cloud_retry::call_context::{CallContext, ContextSetup};
use google_cloud_retry::client::StubClient;
use google_cloud_retry::completion_queue::CompletionQueue;
use google_cloud_retry::idempotency::Idempotency;
use google_cloud_retry::retry_loop::{call_with_retry, call_with_retry_borrow, call_without_retry};
use std::future::Future;
use std::sync::Arc;

/// Implements the table administration API for a Bigtable instance.
///
/// # Example
/// ```
/// # use google_cloud_bigtable::admin_client::AdminClient;
/// # use google_cloud_bigtable::table_admin::TableAdmin;
/// # use google_cloud_bigtable::model::TableView;
/// # use std::sync::Arc;
/// # fn sample(client: Arc<AdminClient>) -> google_cloud_bigtable::Result<()> {
/// let admin = TableAdmin::new(client, "my-instance");
/// for table in admin.list_tables(TableView::NameOnly)? {
///     println!("{}", table.name);
/// }
/// # Ok(()) }
/// ```
///
/// # Retries
///
/// `CreateTable` and `DeleteTable` are not idempotent, they are attempted
/// once. `GetTable` retries transient failures using fresh copies of the
/// client policies. `ListTables` shares one retry policy and one backoff
/// policy across all the pages, the retry budget applies to the complete
/// listing.
#[derive(Clone, Debug)]
pub struct TableAdmin {
    client: Arc<AdminClient>,
    instance_id: String,
    instance_name: String,
}

impl TableAdmin {
    pub fn new(client: Arc<AdminClient>, instance_id: impl Into<String>) -> Self {
        let instance_id = instance_id.into();
        let instance_name = format!("projects/{}/instances/{instance_id}", client.project());
        Self {
            client,
            instance_id,
            instance_name,
        }
    }

    pub fn project(&self) -> &str {
        self.client.project()
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    /// The full name of the instance, `projects/{project}/instances/{instance}`.
    pub fn instance_name(&self) -> &str {
        &self.instance_name
    }

    /// The full name of `table_id` in this instance.
    pub fn table_name(&self, table_id: &str) -> String {
        format!("{}/tables/{table_id}", self.instance_name)
    }

    /// Creates a new table in the instance.
    pub fn create_table(&self, table_id: &str, table: Table) -> Result<Table> {
        let request = CreateTableRequest::default()
            .set_parent(&self.instance_name)
            .set_table_id(table_id)
            .set_table(table);
        let metadata = MetadataUpdatePolicy::new(&self.instance_name, MetadataParamTypes::Parent)?;
        call_without_retry(
            self.client.as_ref(),
            &metadata,
            |stub, context, request| stub.create_table(context, request),
            &request,
            "TableAdmin::CreateTable",
        )
    }

    /// Lists all the tables in the instance, following all the pages.
    pub fn list_tables(&self, view: TableView) -> Result<Vec<Table>> {
        let metadata = MetadataUpdatePolicy::new(&self.instance_name, MetadataParamTypes::Parent)?;
        // A single budget for all the pages.
        let mut retry = self.client.options().retry_policy().fresh();
        let mut backoff = self.client.options().backoff_policy().fresh();

        let mut request = ListTablesRequest::default()
            .set_parent(&self.instance_name)
            .set_view(view);
        let mut tables = Vec::new();
        loop {
            let response = call_with_retry_borrow(
                self.client.as_ref(),
                &mut retry,
                &mut backoff,
                Idempotency::Idempotent,
                &metadata,
                |stub, context, request| stub.list_tables(context, request),
                &request,
                "TableAdmin::ListTables",
            )?;
            tables.extend(response.tables);
            if response.next_page_token.is_empty() {
                return Ok(tables);
            }
            request.page_token = response.next_page_token;
        }
    }

    /// Gets the metadata for a table.
    pub fn get_table(&self, table_id: &str, view: TableView) -> Result<Table> {
        let request = GetTableRequest::default()
            .set_name(self.table_name(table_id))
            .set_view(view);
        let metadata = MetadataUpdatePolicy::with_table_id(
            &self.instance_name,
            MetadataParamTypes::Name,
            table_id,
        )?;
        call_with_retry(
            self.client.as_ref(),
            self.client.options(),
            Idempotency::Idempotent,
            &metadata,
            |stub, context, request| stub.get_table(context, request),
            &request,
            "TableAdmin::GetTable",
        )
    }

    /// Deletes a table.
    pub fn delete_table(&self, table_id: &str) -> Result<()> {
        let request = DeleteTableRequest::default().set_name(self.table_name(table_id));
        let metadata = MetadataUpdatePolicy::with_table_id(
            &self.instance_name,
            MetadataParamTypes::Name,
            table_id,
        )?;
        call_without_retry(
            self.client.as_ref(),
            &metadata,
            |stub, context, request| stub.delete_table(context, request),
            &request,
            "TableAdmin::DeleteTable",
        )
    }

    /// Gets the metadata for a table, without blocking the calling thread.
    ///
    /// The retry loop runs as a task on `cq`, and waits on `cq` timers between
    /// attempts.
    pub fn async_get_table(
        &self,
        cq: &CompletionQueue,
        table_id: &str,
        view: TableView,
    ) -> impl Future<Output = Result<Table>> + Send + 'static {
        let metadata = match MetadataUpdatePolicy::with_table_id(
            &self.instance_name,
            MetadataParamTypes::Name,
            table_id,
        ) {
            Ok(m) => m,
            Err(e) => return Either::Left(std::future::ready(Err(e))),
        };
        let request = GetTableRequest::default()
            .set_name(self.table_name(table_id))
            .set_view(view);
        let client = self.client.clone();
        let call = move |mut context: CallContext, request: GetTableRequest| {
            metadata.setup(&mut context);
            client.stub().async_get_table(context, request)
        };
        let options = self.client.options();
        Either::Right(retry_async_unary_rpc(
            cq,
            "TableAdmin::AsyncGetTable",
            options.retry_policy().fresh(),
            options.backoff_policy().fresh(),
            Idempotency::Idempotent,
            call,
            request,
        ))
    }
}
