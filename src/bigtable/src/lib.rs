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

//! Google Cloud Client Libraries for Rust - Bigtable table administration.
//!
//! This crate contains a [TableAdmin][table_admin::TableAdmin] client. The
//! client runs each RPC through the retry loops in [google_cloud_retry],
//! choosing the loop that matches the idempotency of the RPC:
//!
//! - `CreateTable` and `DeleteTable` are attempted once.
//! - `GetTable` is retried with fresh policies.
//! - `ListTables` shares one policy pair across all the pages.
//!
//! The transport is abstracted by the [stub::TableAdmin] trait.

pub use google_cloud_retry::Result;
pub use google_cloud_retry::error::Error;

pub mod admin_client;
pub mod metadata_update_policy;
pub mod model;
pub mod stub;
pub mod table_admin;
