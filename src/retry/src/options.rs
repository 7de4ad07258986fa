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

//! Client configuration for the retry loops.
//!
//! While the defaults are intended to work for most applications, it is
//! sometimes necessary to change the configuration. Applications create a
//! [RetryOptions] and pass it to the client at construction. The client keeps
//! these policies as prototypes, each call starts from a fresh copy.
//!
//! # Example
//! ```
//! # use google_cloud_retry::options::RetryOptions;
//! # use google_cloud_retry::retry_policy::RetryPolicy;
//! # use google_cloud_retry::exponential_backoff::ExponentialBackoff;
//! use std::time::Duration;
//! let options = RetryOptions::default()
//!     .with_retry_policy(RetryPolicy::limited_error_count(5))
//!     .with_backoff_policy(ExponentialBackoff::new(
//!         Duration::from_millis(50), Duration::from_secs(2)));
//! ```

use crate::backoff_policy::BackoffPolicy;
use crate::polling_policy::PollingPolicy;
use crate::retry_policy::RetryPolicy;

/// The policies used by a client.
///
/// The defaults are:
/// - retry transient failures for up to 10 minutes,
/// - back off from 100ms to 60s, with jitter,
/// - poll long-running operations for up to 30 minutes, waiting from 1s to
///   60s between polls.
#[derive(Clone, Debug, Default)]
pub struct RetryOptions {
    retry_policy: RetryPolicy,
    backoff_policy: BackoffPolicy,
    polling_policy: PollingPolicy,
}

impl RetryOptions {
    /// Sets the retry policy prototype.
    pub fn with_retry_policy<V: Into<RetryPolicy>>(mut self, v: V) -> Self {
        self.retry_policy = v.into();
        self
    }

    /// Sets the backoff policy prototype.
    pub fn with_backoff_policy<V: Into<BackoffPolicy>>(mut self, v: V) -> Self {
        self.backoff_policy = v.into();
        self
    }

    /// Sets the polling policy prototype.
    pub fn with_polling_policy<V: Into<PollingPolicy>>(mut self, v: V) -> Self {
        self.polling_policy = v.into();
        self
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }

    pub fn backoff_policy(&self) -> &BackoffPolicy {
        &self.backoff_policy
    }

    pub fn polling_policy(&self) -> &PollingPolicy {
        &self.polling_policy
    }
}
