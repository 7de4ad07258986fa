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

//! Defines the retry policies for Google Cloud Storage.
//!
//! The storage service [recommends] retrying `UNAVAILABLE`, `INTERNAL`, and
//! `RESOURCE_EXHAUSTED` errors. Over gRPC, the service also returns
//! `DEADLINE_EXCEEDED` for some "Internal Error; please retry" conditions.
//! Transport errors count as `UNAVAILABLE` and client timeouts as
//! `DEADLINE_EXCEEDED`, both are retried.
//!
//! [recommends]: https://cloud.google.com/storage/docs/retry-strategy

use google_cloud_retry::error::rpc::Code;
use google_cloud_retry::retry_policy::RetryPolicy;
use std::time::Duration;

/// The status codes retried by the storage policies.
pub const RETRYABLE_CODES: [Code; 4] = [
    Code::Unavailable,
    Code::Internal,
    Code::ResourceExhausted,
    Code::DeadlineExceeded,
];

/// The default retry policy for the Storage client.
///
/// The client will retry all the errors shown as retryable in the service
/// documentation, and stop retrying after 15 minutes.
pub fn storage_default() -> RetryPolicy {
    limited_time(Duration::from_secs(15 * 60))
}

/// Retries the storage errors until `maximum_duration` elapses.
///
/// # Example
/// ```
/// # use google_cloud_storage::retry_policy;
/// use std::time::Duration;
/// let policy = retry_policy::limited_time(Duration::from_secs(60));
/// ```
pub fn limited_time(maximum_duration: Duration) -> RetryPolicy {
    RetryPolicy::limited_time(maximum_duration).with_retryable_codes(RETRYABLE_CODES)
}

/// Retries the storage errors until more than `maximum_failures` occur.
pub fn limited_error_count(maximum_failures: u32) -> RetryPolicy {
    RetryPolicy::limited_error_count(maximum_failures).with_retryable_codes(RETRYABLE_CODES)
}
