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

//! Polls a long-running operation until it completes.

use crate::Result;
use crate::completion_queue::CompletionQueue;
use crate::error::{Error, LoopTermination};
use crate::polling_policy::PollingPolicy;
use std::future::Future;

/// Calls `poll` until the operation completes.
///
/// `poll` returns `Ok(Some(value))` once the operation is done, and
/// `Ok(None)` while it is still running. Polling errors are classified by the
/// polling policy: permanent errors stop the loop immediately, transient
/// errors are retried until the policy is exhausted. Between polls the loop
/// waits on a completion queue timer for the policy's
/// [wait_period][PollingPolicy::wait_period].
///
/// The errors returned by the loop are annotated with `location` and one of
/// `"permanent failure"` or `"polling policy exhausted"`.
pub async fn poll_until_complete<T, P, Fut>(
    cq: &CompletionQueue,
    location: &str,
    mut polling: PollingPolicy,
    mut poll: P,
) -> Result<T>
where
    P: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>>>,
{
    loop {
        match poll().await {
            Ok(Some(value)) => return Ok(value),
            Ok(None) if polling.exhausted() => {
                return Err(Error::terminated(
                    LoopTermination::PollingExhausted,
                    location,
                    Error::timeout("the operation did not complete"),
                ));
            }
            Ok(None) => {}
            Err(e) if polling.is_permanent_error(&e) => {
                return Err(Error::terminated(LoopTermination::Permanent, location, e));
            }
            Err(e) if !polling.on_failure(&e) => {
                return Err(Error::terminated(
                    LoopTermination::PollingExhausted,
                    location,
                    e,
                ));
            }
            Err(e) => {
                tracing::debug!("{location}: polling error, will try again: {e}");
            }
        }
        let delay = polling.wait_period();
        cq.make_relative_timer(delay).await?;
    }
}
