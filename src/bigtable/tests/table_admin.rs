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

//! Runs the table admin client against an in-memory service that fails every
//! other read with a transient error.

use futures::future::BoxFuture;
use google_cloud_bigtable::Result;
use google_cloud_bigtable::admin_client::AdminClient;
use google_cloud_bigtable::metadata_update_policy::REQUEST_PARAMS_HEADER;
use google_cloud_bigtable::model::*;
use google_cloud_bigtable::stub;
use google_cloud_bigtable::table_admin::TableAdmin;
use google_cloud_retry::call_context::CallContext;
use google_cloud_retry::completion_queue::CompletionQueue;
use google_cloud_retry::error::Error;
use google_cloud_retry::error::rpc::{Code, Status};
use google_cloud_retry::exponential_backoff::ExponentialBackoff;
use google_cloud_retry::options::RetryOptions;
use google_cloud_retry::retry_policy::RetryPolicy;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const PAGE_SIZE: usize = 2;

#[derive(Debug, Default)]
struct FakeService {
    tables: Mutex<BTreeMap<String, Table>>,
    reads: AtomicUsize,
    routing: Mutex<Vec<String>>,
}

impl FakeService {
    fn record(&self, context: &CallContext) {
        let value = context
            .metadata()
            .get(REQUEST_PARAMS_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        self.routing.lock().unwrap().push(value);
    }

    fn flaky(&self) -> Result<()> {
        if self.reads.fetch_add(1, Ordering::SeqCst) % 2 == 0 {
            return Err(Error::service(Status::new(Code::Unavailable, "flaky")));
        }
        Ok(())
    }

    fn lookup(&self, name: &str) -> Result<Table> {
        self.tables
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .ok_or_else(|| Error::service(Status::new(Code::NotFound, format!("{name} not found"))))
    }
}

impl stub::TableAdmin for FakeService {
    fn create_table(&self, context: &CallContext, request: &CreateTableRequest) -> Result<Table> {
        self.record(context);
        let name = format!("{}/tables/{}", request.parent, request.table_id);
        let table = request.table.clone().set_name(&name);
        let mut tables = self.tables.lock().unwrap();
        if tables.contains_key(&name) {
            return Err(Error::service(Status::new(Code::AlreadyExists, "exists")));
        }
        tables.insert(name, table.clone());
        Ok(table)
    }

    fn list_tables(
        &self,
        context: &CallContext,
        request: &ListTablesRequest,
    ) -> Result<ListTablesResponse> {
        self.record(context);
        self.flaky()?;
        let tables = self.tables.lock().unwrap();
        let page: Vec<_> = tables
            .values()
            .filter(|t| t.name > request.page_token)
            .take(PAGE_SIZE)
            .cloned()
            .collect();
        let more = tables
            .keys()
            .any(|k| page.last().is_some_and(|last| *k > last.name));
        let next = if more {
            page.last().map(|t| t.name.clone()).unwrap_or_default()
        } else {
            String::new()
        };
        Ok(ListTablesResponse::default()
            .set_tables(page)
            .set_next_page_token(next))
    }

    fn get_table(&self, context: &CallContext, request: &GetTableRequest) -> Result<Table> {
        self.record(context);
        self.flaky()?;
        self.lookup(&request.name)
    }

    fn delete_table(&self, context: &CallContext, request: &DeleteTableRequest) -> Result<()> {
        self.record(context);
        self.tables
            .lock()
            .unwrap()
            .remove(&request.name)
            .map(|_| ())
            .ok_or_else(|| Error::service(Status::new(Code::NotFound, "not found")))
    }

    fn async_get_table(
        &self,
        context: CallContext,
        request: GetTableRequest,
    ) -> BoxFuture<'static, Result<Table>> {
        self.record(&context);
        let result = self.flaky().and_then(|_| self.lookup(&request.name));
        Box::pin(async move { result })
    }
}

fn make_admin(service: Arc<FakeService>) -> TableAdmin {
    let options = RetryOptions::default()
        .with_retry_policy(RetryPolicy::limited_error_count(5))
        .with_backoff_policy(ExponentialBackoff::new(
            Duration::from_millis(1),
            Duration::from_millis(4),
        ));
    let client = AdminClient::new(
        "test-project",
        move || -> Arc<dyn stub::TableAdmin> { service.clone() },
        options,
    );
    TableAdmin::new(Arc::new(client), "test-instance")
}

#[test]
fn table_lifecycle() -> anyhow::Result<()> {
    let service = Arc::new(FakeService::default());
    let admin = make_admin(service.clone());

    for id in ["t1", "t2", "t3", "t4", "t5"] {
        admin.create_table(id, Table::default().set_column_families(["cf"]))?;
    }
    let err = admin.create_table("t1", Table::default()).unwrap_err();
    assert!(err.is_non_idempotent(), "{err:?}");
    assert_eq!(err.code(), Code::AlreadyExists);

    let tables = admin.list_tables(TableView::NameOnly)?;
    let names: Vec<_> = tables.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(
        names,
        ["t1", "t2", "t3", "t4", "t5"]
            .iter()
            .map(|id| admin.table_name(id))
            .collect::<Vec<_>>()
    );

    let table = admin.get_table("t3", TableView::Full)?;
    assert_eq!(table.name, admin.table_name("t3"));
    assert_eq!(table.column_families, vec!["cf"]);

    admin.delete_table("t3")?;
    let err = admin.get_table("t3", TableView::Full).unwrap_err();
    assert!(err.is_permanent(), "{err:?}");
    assert_eq!(err.code(), Code::NotFound);

    let routing = service.routing.lock().unwrap().clone();
    assert!(
        routing
            .iter()
            .all(|r| r.starts_with("parent=projects/test-project/instances/test-instance")
                || r.starts_with("name=projects/test-project/instances/test-instance/tables/")),
        "{routing:?}"
    );
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn async_get_table() -> anyhow::Result<()> {
    let service = Arc::new(FakeService::default());
    let admin = make_admin(service.clone());
    admin.create_table("t1", Table::default())?;

    let cq = CompletionQueue::new(tokio::runtime::Handle::current());
    let table = admin
        .async_get_table(&cq, "t1", TableView::Full)
        .await?;
    assert_eq!(table.name, admin.table_name("t1"));
    // The first attempt fails, the second succeeds.
    assert_eq!(service.reads.load(Ordering::SeqCst), 2);
    Ok(())
}
