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

//! Timers and background tasks for the asynchronous loops.

use crate::Result;
use crate::error::Error;
use crate::retry_policy::deadline_after;
use std::future::Future;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Runs the timers and tasks of the asynchronous retry loops.
///
/// The queue is a cheap-to-clone handle: all the clones share the same
/// runtime and the same shutdown state. After [shutdown][Self::shutdown] all
/// pending and future timers fail with a cancelled error.
///
/// # Example
/// ```
/// # use google_cloud_retry::completion_queue::CompletionQueue;
/// # tokio_test_main();
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn tokio_test_main() {
/// use std::time::Duration;
/// let cq = CompletionQueue::new(tokio::runtime::Handle::current());
/// let timer = cq.make_relative_timer(Duration::from_millis(1));
/// assert!(timer.await.is_ok());
/// cq.shutdown();
/// assert!(cq.make_relative_timer(Duration::from_millis(1)).await.is_err());
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct CompletionQueue {
    handle: Handle,
    shutdown: CancellationToken,
}

impl CompletionQueue {
    /// Creates a queue running its tasks on `handle`.
    pub fn new(handle: Handle) -> Self {
        Self {
            handle,
            shutdown: CancellationToken::new(),
        }
    }

    /// Returns a future that resolves `duration` from now.
    ///
    /// The future resolves with the deadline, or with a cancelled error if the
    /// queue shuts down first. Durations too large to represent wait until a
    /// very distant deadline.
    pub fn make_relative_timer(
        &self,
        duration: Duration,
    ) -> impl Future<Output = Result<Instant>> + Send + 'static {
        let shutdown = self.shutdown.clone();
        let deadline = deadline_after(duration);
        async move {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    Err(Error::cancelled("the completion queue is shut down"))
                },
                _ = tokio::time::sleep_until(deadline) => Ok(deadline),
            }
        }
    }

    /// Runs `future` in the background.
    pub fn spawn<F>(&self, future: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        self.handle.spawn(future)
    }

    /// Cancels all pending timers. New timers fail immediately.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.is_cancelled()
    }
}
