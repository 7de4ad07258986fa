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

//! Traits to mock the table admin service.
//!
//! Application developers may need to mock the clients in this library to
//! test how their application works with different (and sometimes hard to
//! trigger) error conditions. Transports implement the same trait.

use crate::Result;
use crate::model;
use futures::future::BoxFuture;
use google_cloud_retry::call_context::CallContext;

/// Defines the trait used to implement [crate::table_admin::TableAdmin].
///
/// Each function makes exactly one attempt. The retry loops call them once
/// per attempt, with the deadline and metadata for that attempt in `context`.
pub trait TableAdmin: std::fmt::Debug + Send + Sync {
    fn create_table(
        &self,
        context: &CallContext,
        request: &model::CreateTableRequest,
    ) -> Result<model::Table>;

    fn list_tables(
        &self,
        context: &CallContext,
        request: &model::ListTablesRequest,
    ) -> Result<model::ListTablesResponse>;

    fn get_table(
        &self,
        context: &CallContext,
        request: &model::GetTableRequest,
    ) -> Result<model::Table>;

    fn delete_table(
        &self,
        context: &CallContext,
        request: &model::DeleteTableRequest,
    ) -> Result<()>;

    /// The asynchronous version of [get_table][TableAdmin::get_table].
    fn async_get_table(
        &self,
        context: CallContext,
        request: model::GetTableRequest,
    ) -> BoxFuture<'static, Result<model::Table>>;
}
