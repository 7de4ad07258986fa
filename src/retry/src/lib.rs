// Copyright 2024 Google LLC
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

//! Retry, backoff, and idempotency helpers for Google Cloud clients.
//!
//! This crate contains the policies and loops used by the Google Cloud Client
//! Libraries for Rust to retry RPCs:
//!
//! - [retry_policy] decides if a failed request can be attempted again.
//! - [backoff_policy] computes how long to wait between attempts.
//! - [polling_policy] combines both to poll long-running operations.
//! - [retry_loop] runs a blocking unary RPC with retries.
//! - [async_retry_loop] runs an asynchronous unary RPC with retries, waiting
//!   on [CompletionQueue][completion_queue::CompletionQueue] timers.
//! - [streaming] wraps a bidirectional stream and reconnects it when it
//!   breaks.
//!
//! Requests are only retried if they are [idempotent][idempotency::Idempotency].

/// An alias of [std::result::Result] where the error is always [Error][crate::error::Error].
///
/// This is the result type used by all functions wrapping RPCs.
pub type Result<T> = std::result::Result<T, crate::error::Error>;

/// The core error types used by the retry loops.
pub mod error;

pub mod async_retry_loop;
pub mod backoff_policy;
pub mod call_context;
pub mod client;
pub mod completion_queue;
pub mod exponential_backoff;
pub mod idempotency;
pub mod options;
pub mod polling_loop;
pub mod polling_policy;
pub mod retry_loop;
pub mod retry_policy;
pub mod streaming;

#[cfg(test)]
mod mock_rng;
