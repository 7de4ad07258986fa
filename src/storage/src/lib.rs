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

//! Google Cloud Client Libraries for Rust - Storage
//!
//! This crate contains the retry layer for [Google Cloud Storage]:
//!
//! * The [idempotency policies][idempotency_policy] that decide which requests
//!   are safe to retry, based on their preconditions.
//! * The storage [retry][retry_policy] and [backoff][backoff_policy] policies.
//! * A [StorageConnection][connection::StorageConnection] that applies these
//!   policies to each request.
//!
//! The transport is abstracted by the [stub::Storage] trait.
//!
//! [Google Cloud Storage]: https://cloud.google.com/storage

pub use google_cloud_retry::Result;
pub use google_cloud_retry::error::Error;

pub mod backoff_policy;
pub mod connection;
pub mod idempotency_policy;
pub mod model;
pub mod retry_policy;
pub mod stub;
