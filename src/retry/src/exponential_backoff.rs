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

//! Truncated exponential backoff.
//!
//! This module provides an implementation of truncated [exponential backoff].
//! Each call to [on_completion][ExponentialBackoff::on_completion] returns the
//! current delay and then grows it by the scaling factor, up to the maximum
//! delay.
//!
//! [exponential backoff]: https://en.wikipedia.org/wiki/Exponential_backoff

use std::time::Duration;

/// The error type for exponential backoff creation.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("the scaling value ({0}) should be >= 1.0")]
    InvalidScalingFactor(f64),
    #[error("the initial delay ({0:?}) should be greater than zero")]
    InvalidInitialDelay(Duration),
    #[error(
        "the maximum delay ({maximum:?}) should be greater than or equal to the initial delay ({initial:?})"
    )]
    EmptyRange {
        maximum: Duration,
        initial: Duration,
    },
}

/// Builds [ExponentialBackoff] policies.
#[derive(Clone, Debug)]
pub struct ExponentialBackoffBuilder {
    initial_delay: Duration,
    maximum_delay: Duration,
    scaling: f64,
    jitter: bool,
}

impl ExponentialBackoffBuilder {
    /// Creates a builder with the default parameters.
    ///
    /// The defaults are a 100ms initial delay, a 60s maximum delay, a scaling
    /// factor of 2.0, and full jitter.
    ///
    /// # Example
    /// ```
    /// # use google_cloud_retry::exponential_backoff::Error;
    /// # use google_cloud_retry::exponential_backoff::ExponentialBackoffBuilder;
    /// use std::time::Duration;
    ///
    /// let policy = ExponentialBackoffBuilder::new()
    ///         .with_initial_delay(Duration::from_millis(100))
    ///         .with_maximum_delay(Duration::from_secs(5))
    ///         .with_scaling(4.0)
    ///         .build()?;
    /// # Ok::<(), Error>(())
    /// ```
    pub fn new() -> Self {
        Self {
            initial_delay: Duration::from_millis(100),
            maximum_delay: Duration::from_secs(60),
            scaling: 2.0,
            jitter: true,
        }
    }

    /// Change the initial delay.
    pub fn with_initial_delay<V: Into<Duration>>(mut self, v: V) -> Self {
        self.initial_delay = v.into();
        self
    }

    /// Change the maximum delay.
    pub fn with_maximum_delay<V: Into<Duration>>(mut self, v: V) -> Self {
        self.maximum_delay = v.into();
        self
    }

    /// Change the scaling factor in this backoff policy.
    pub fn with_scaling<V: Into<f64>>(mut self, v: V) -> Self {
        self.scaling = v.into();
        self
    }

    /// Enable or disable jitter.
    ///
    /// With jitter, each delay is uniformly distributed between zero and the
    /// current delay.
    pub fn with_jitter(mut self, v: bool) -> Self {
        self.jitter = v;
        self
    }

    /// Creates a new exponential backoff policy.
    ///
    /// # Example
    /// ```
    /// # use google_cloud_retry::exponential_backoff::Error;
    /// # use google_cloud_retry::exponential_backoff::ExponentialBackoffBuilder;
    /// use std::time::Duration;
    /// let mut backoff = ExponentialBackoffBuilder::new()
    ///     .with_initial_delay(Duration::from_secs(5))
    ///     .with_maximum_delay(Duration::from_secs(50))
    ///     .with_scaling(2.0)
    ///     .build()?;
    /// let p = backoff.on_completion();
    /// assert!(p <= Duration::from_secs(5));
    /// let p = backoff.on_completion();
    /// assert!(p <= Duration::from_secs(10));
    /// # Ok::<(), Error>(())
    /// ```
    pub fn build(self) -> Result<ExponentialBackoff, Error> {
        if self.scaling < 1.0 {
            return Err(Error::InvalidScalingFactor(self.scaling));
        }
        if self.initial_delay.is_zero() {
            return Err(Error::InvalidInitialDelay(self.initial_delay));
        }
        if self.maximum_delay < self.initial_delay {
            return Err(Error::EmptyRange {
                maximum: self.maximum_delay,
                initial: self.initial_delay,
            });
        }
        Ok(ExponentialBackoff {
            initial_delay: self.initial_delay,
            maximum_delay: self.maximum_delay,
            scaling: self.scaling,
            jitter: self.jitter,
            current_delay: self.initial_delay,
        })
    }

    /// Creates a new exponential backoff policy clamping the ranges towards
    /// recommended values.
    ///
    /// The maximum delay is clamped first, to be between one second and one day
    /// (both inclusive). Then the initial delay is clamped to be between one
    /// millisecond and the maximum delay. Finally, the scaling factor is
    /// clamped to the `[1.0, 32.0]` range.
    ///
    /// # Example
    /// ```
    /// # use google_cloud_retry::exponential_backoff::ExponentialBackoffBuilder;
    /// use std::time::Duration;
    /// let mut backoff = ExponentialBackoffBuilder::new().with_jitter(false).clamp();
    /// assert!(backoff.on_completion() > Duration::ZERO);
    /// ```
    pub fn clamp(self) -> ExponentialBackoff {
        let scaling = self.scaling.clamp(1.0, 32.0);
        let maximum_delay = self
            .maximum_delay
            .clamp(Duration::from_secs(1), Duration::from_secs(24 * 60 * 60));
        let initial_delay = self
            .initial_delay
            .clamp(Duration::from_millis(1), maximum_delay);
        ExponentialBackoff {
            initial_delay,
            maximum_delay,
            scaling,
            jitter: self.jitter,
            current_delay: initial_delay,
        }
    }
}

impl Default for ExponentialBackoffBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Implements truncated exponential backoff, optionally with jitter.
///
/// The policy keeps the delay for the next wait. Use
/// [fresh][ExponentialBackoff::fresh] to get a policy with the same
/// configuration that starts again from the initial delay.
#[derive(Clone, Debug)]
pub struct ExponentialBackoff {
    initial_delay: Duration,
    maximum_delay: Duration,
    scaling: f64,
    jitter: bool,
    current_delay: Duration,
}

impl ExponentialBackoff {
    /// Creates a policy doubling the delay on each call, without jitter.
    ///
    /// If `maximum_delay` is smaller than `initial_delay` the policy always
    /// returns `initial_delay`.
    ///
    /// # Example
    /// ```
    /// # use google_cloud_retry::exponential_backoff::ExponentialBackoff;
    /// use std::time::Duration;
    /// let mut backoff = ExponentialBackoff::new(Duration::from_millis(10), Duration::from_millis(50));
    /// assert_eq!(backoff.on_completion(), Duration::from_millis(10));
    /// assert_eq!(backoff.on_completion(), Duration::from_millis(20));
    /// ```
    pub fn new(initial_delay: Duration, maximum_delay: Duration) -> Self {
        Self {
            initial_delay,
            maximum_delay: std::cmp::max(initial_delay, maximum_delay),
            scaling: 2.0,
            jitter: false,
            current_delay: initial_delay,
        }
    }

    /// Returns the delay before the next attempt, and grows the delay for the
    /// following attempt.
    pub fn on_completion(&mut self) -> Duration {
        self.on_completion_with_rng(&mut rand::rng())
    }

    /// Returns a policy with the same configuration, starting at the initial
    /// delay.
    pub fn fresh(&self) -> Self {
        Self {
            current_delay: self.initial_delay,
            ..self.clone()
        }
    }

    pub fn initial_delay(&self) -> Duration {
        self.initial_delay
    }

    pub fn maximum_delay(&self) -> Duration {
        self.maximum_delay
    }

    fn on_completion_with_rng(&mut self, rng: &mut impl rand::Rng) -> Duration {
        let delay = self.current_delay;
        self.current_delay = self.next_delay();
        if self.jitter {
            rng.random_range(Duration::ZERO..=delay)
        } else {
            delay
        }
    }

    fn next_delay(&self) -> Duration {
        if self.scaling >= self.maximum_delay.div_duration_f64(self.current_delay) {
            self.maximum_delay
        } else {
            // .mul_f64() cannot panic: scaling is finite and
            //     self.current_delay * scaling < maximum_delay.
            self.current_delay.mul_f64(self.scaling)
        }
    }
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        ExponentialBackoffBuilder::new().clamp()
    }
}
