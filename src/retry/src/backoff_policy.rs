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

//! Defines the backoff policies used by the retry loops.
//!
//! When a request fails with a transient error the retry loops wait before
//! trying again. Waiting gives the service a chance to recover, and the
//! growing delays avoid synchronized retry storms.
//!
//! The backoff policy is stateful: each call to
//! [on_completion][BackoffPolicy::on_completion] returns the next delay and
//! advances the state. Each logical operation starts from a
//! [fresh][BackoffPolicy::fresh] copy of the configured policy.
//!
//! # Example
//! ```
//! # use google_cloud_retry::backoff_policy::BackoffPolicy;
//! use google_cloud_retry::exponential_backoff::ExponentialBackoff;
//! use std::time::Duration;
//! let prototype = BackoffPolicy::from(
//!     ExponentialBackoff::new(Duration::from_millis(10), Duration::from_millis(50)));
//! let mut backoff = prototype.fresh();
//! assert_eq!(backoff.on_completion(), Duration::from_millis(10));
//! ```

use crate::exponential_backoff::ExponentialBackoff;
use std::time::Duration;

/// The backoff policies available to the retry loops.
#[derive(Clone, Debug)]
#[non_exhaustive]
pub enum BackoffPolicy {
    /// Truncated exponential backoff, optionally with jitter.
    Exponential(ExponentialBackoff),
}

impl BackoffPolicy {
    /// Returns the delay before the next attempt.
    pub fn on_completion(&mut self) -> Duration {
        match self {
            Self::Exponential(p) => p.on_completion(),
        }
    }

    /// Returns a copy of this policy with its original configuration.
    ///
    /// The copy does not inherit any growth in the delays.
    pub fn fresh(&self) -> Self {
        match self {
            Self::Exponential(p) => Self::Exponential(p.fresh()),
        }
    }
}

impl Default for BackoffPolicy {
    /// An exponential backoff from 100ms to 60s, with jitter.
    fn default() -> Self {
        Self::Exponential(ExponentialBackoff::default())
    }
}

impl From<ExponentialBackoff> for BackoffPolicy {
    fn from(value: ExponentialBackoff) -> Self {
        Self::Exponential(value)
    }
}
