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

//! Defines the policies to poll long-running operations.
//!
//! Some Google Cloud services use long-running operations to implement
//! requests that may take a long time to complete. The client polls the
//! operation until it completes. The [PollingPolicy] decides how long to wait
//! between polls, which polling errors are permanent, and when to give up.
//!
//! # Example
//! ```
//! # use google_cloud_retry::polling_policy::PollingPolicy;
//! # use google_cloud_retry::retry_policy::RetryPolicy;
//! # use google_cloud_retry::exponential_backoff::ExponentialBackoff;
//! use std::time::Duration;
//! let mut policy = PollingPolicy::new(
//!     RetryPolicy::limited_time(Duration::from_secs(300)),
//!     ExponentialBackoff::new(Duration::from_secs(1), Duration::from_secs(10)).into(),
//! );
//! assert_eq!(policy.wait_period(), Duration::from_secs(1));
//! assert_eq!(policy.wait_period(), Duration::from_secs(2));
//! ```

use crate::backoff_policy::BackoffPolicy;
use crate::error::Error;
use crate::exponential_backoff::ExponentialBackoff;
use crate::retry_policy::RetryPolicy;
use std::time::Duration;

/// Combines a retry policy and a backoff policy to poll operations.
#[derive(Clone, Debug)]
pub struct PollingPolicy {
    retry: RetryPolicy,
    backoff: BackoffPolicy,
}

impl PollingPolicy {
    pub fn new(retry: RetryPolicy, backoff: BackoffPolicy) -> Self {
        Self { retry, backoff }
    }

    /// Returns true if retrying cannot fix a polling error.
    pub fn is_permanent_error(&self, error: &Error) -> bool {
        self.retry.is_permanent_failure(error)
    }

    /// Records a polling error and returns true if polling can continue.
    pub fn on_failure(&mut self, error: &Error) -> bool {
        self.retry.on_failure(error)
    }

    /// Returns true if the policy does not allow more polls.
    pub fn exhausted(&self) -> bool {
        self.retry.is_exhausted()
    }

    /// The time to wait before the next poll.
    pub fn wait_period(&mut self) -> Duration {
        self.backoff.on_completion()
    }

    /// Returns a policy with the original configuration.
    pub fn fresh(&self) -> Self {
        Self {
            retry: self.retry.fresh(),
            backoff: self.backoff.fresh(),
        }
    }
}

impl Default for PollingPolicy {
    /// Polls for up to 30 minutes, waiting from 1s up to 60s between polls.
    fn default() -> Self {
        Self::new(
            RetryPolicy::limited_time(Duration::from_secs(30 * 60)),
            ExponentialBackoff::new(Duration::from_secs(1), Duration::from_secs(60)).into(),
        )
    }
}
