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

//! Defines the retry policies used by the retry loops.
//!
//! The client libraries automatically retry RPCs when (1) they fail due to
//! transient errors **and** the RPC is [idempotent], (2) or failed before an
//! RPC was started. That is, we will not automatically retry a request to
//! create or modify a resource unless the request includes preconditions that
//! make it idempotent.
//!
//! The retry policy decides which errors are transient, and limits how long
//! the loop keeps trying. Two policies are available:
//!
//! - [LimitedErrorCount] stops after a number of transient failures.
//! - [LimitedTime] stops after a fixed amount of time.
//!
//! Policies are stateful, each logical operation must use its own
//! [fresh][RetryPolicy::fresh] copy.
//!
//! # Example
//! ```
//! # use google_cloud_retry::retry_policy::RetryPolicy;
//! # use google_cloud_retry::error::{Error, rpc::{Code, Status}};
//! let mut policy = RetryPolicy::limited_error_count(2);
//! let unavailable = Error::service(Status::new(Code::Unavailable, "try-again"));
//! assert!(policy.on_failure(&unavailable));
//! assert!(policy.on_failure(&unavailable));
//! assert!(!policy.on_failure(&unavailable));
//! assert!(policy.is_exhausted());
//! ```
//!
//! [idempotent]: https://en.wikipedia.org/wiki/Idempotence

use crate::call_context::CallContext;
use crate::error::Error;
use crate::error::rpc::Code;
use std::time::Duration;
use tokio::time::Instant;

/// The status codes that a retry policy treats as transient.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryableCodes(Vec<Code>);

impl RetryableCodes {
    /// Creates a set with the given codes.
    pub fn new<I: IntoIterator<Item = Code>>(codes: I) -> Self {
        Self(codes.into_iter().collect())
    }

    pub fn contains(&self, code: Code) -> bool {
        self.0.contains(&code)
    }
}

impl Default for RetryableCodes {
    /// `OK`, `ABORTED`, `UNAVAILABLE`, and `DEADLINE_EXCEEDED`.
    fn default() -> Self {
        Self::new([
            Code::Ok,
            Code::Aborted,
            Code::Unavailable,
            Code::DeadlineExceeded,
        ])
    }
}

/// The retry policies available to the retry loops.
#[derive(Clone, Debug)]
#[non_exhaustive]
pub enum RetryPolicy {
    /// Retries transient failures until a number of them is reached.
    LimitedErrorCount(LimitedErrorCount),
    /// Retries transient failures until a deadline.
    LimitedTime(LimitedTime),
}

impl RetryPolicy {
    /// A policy tolerating up to `maximum_failures` transient failures.
    pub fn limited_error_count(maximum_failures: u32) -> Self {
        Self::LimitedErrorCount(LimitedErrorCount::new(maximum_failures))
    }

    /// A policy retrying transient failures for `maximum_duration`.
    ///
    /// The deadline starts when the policy is created.
    pub fn limited_time(maximum_duration: Duration) -> Self {
        Self::LimitedTime(LimitedTime::new(maximum_duration))
    }

    /// Replaces the set of status codes treated as transient.
    pub fn with_retryable_codes<I: IntoIterator<Item = Code>>(mut self, codes: I) -> Self {
        let codes = RetryableCodes::new(codes);
        match &mut self {
            Self::LimitedErrorCount(p) => p.retryable = codes,
            Self::LimitedTime(p) => p.retryable = codes,
        }
        self
    }

    /// Records a failure and returns true if the request can be attempted
    /// again.
    ///
    /// Permanent failures always return false.
    pub fn on_failure(&mut self, error: &Error) -> bool {
        match self {
            Self::LimitedErrorCount(p) => p.on_failure(error),
            Self::LimitedTime(p) => p.on_failure(error),
        }
    }

    /// Returns true if the policy does not allow more attempts.
    pub fn is_exhausted(&self) -> bool {
        match self {
            Self::LimitedErrorCount(p) => p.is_exhausted(),
            Self::LimitedTime(p) => p.is_exhausted(),
        }
    }

    /// Returns true if retrying cannot fix `error`.
    pub fn is_permanent_failure(&self, error: &Error) -> bool {
        !self.retryable().contains(error.code())
    }

    /// Prepares the context for the next attempt.
    ///
    /// Time limited policies shrink the context deadline to the policy
    /// deadline. The context deadline never grows.
    pub fn setup(&self, context: &mut CallContext) {
        if let Self::LimitedTime(p) = self {
            context.shrink_deadline(p.deadline);
        }
    }

    /// Returns a new policy with the original configuration.
    ///
    /// The new policy does not inherit any failures recorded in `self`, and
    /// time limited policies start a new deadline.
    pub fn fresh(&self) -> Self {
        match self {
            Self::LimitedErrorCount(p) => Self::LimitedErrorCount(p.fresh()),
            Self::LimitedTime(p) => Self::LimitedTime(p.fresh()),
        }
    }

    fn retryable(&self) -> &RetryableCodes {
        match self {
            Self::LimitedErrorCount(p) => &p.retryable,
            Self::LimitedTime(p) => &p.retryable,
        }
    }
}

impl Default for RetryPolicy {
    /// Retries transient failures for up to 10 minutes.
    fn default() -> Self {
        Self::limited_time(Duration::from_secs(600))
    }
}

/// Stops retrying after `maximum_failures` transient failures.
///
/// The loop makes at most `maximum_failures + 1` attempts.
#[derive(Clone, Debug)]
pub struct LimitedErrorCount {
    maximum_failures: u32,
    failure_count: u32,
    retryable: RetryableCodes,
}

impl LimitedErrorCount {
    pub fn new(maximum_failures: u32) -> Self {
        Self {
            maximum_failures,
            failure_count: 0,
            retryable: RetryableCodes::default(),
        }
    }

    pub fn maximum_failures(&self) -> u32 {
        self.maximum_failures
    }

    fn on_failure(&mut self, error: &Error) -> bool {
        if !self.retryable.contains(error.code()) {
            return false;
        }
        self.failure_count = self.failure_count.saturating_add(1);
        !self.is_exhausted()
    }

    fn is_exhausted(&self) -> bool {
        self.failure_count > self.maximum_failures
    }

    fn fresh(&self) -> Self {
        Self {
            failure_count: 0,
            ..self.clone()
        }
    }
}

/// Stops retrying once a deadline expires.
#[derive(Clone, Debug)]
pub struct LimitedTime {
    maximum_duration: Duration,
    deadline: Instant,
    retryable: RetryableCodes,
}

impl LimitedTime {
    pub fn new(maximum_duration: Duration) -> Self {
        Self {
            maximum_duration,
            deadline: deadline_after(maximum_duration),
            retryable: RetryableCodes::default(),
        }
    }

    pub fn maximum_duration(&self) -> Duration {
        self.maximum_duration
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    fn on_failure(&mut self, error: &Error) -> bool {
        self.retryable.contains(error.code()) && !self.is_exhausted()
    }

    fn is_exhausted(&self) -> bool {
        Instant::now() >= self.deadline
    }

    fn fresh(&self) -> Self {
        Self {
            deadline: deadline_after(self.maximum_duration),
            ..self.clone()
        }
    }
}

/// Returns `now + duration`, saturating to a distant deadline on overflow.
pub(crate) fn deadline_after(duration: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(duration)
        // A very distant deadline, about 30 years.
        .unwrap_or_else(|| now + Duration::from_secs(86400 * 365 * 30))
}
