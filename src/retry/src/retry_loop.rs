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

//! The synchronous retry loop.
//!
//! These functions run a blocking unary RPC until it succeeds, fails with a
//! permanent error, or the retry policy is exhausted. Between attempts the
//! calling thread sleeps for the period prescribed by the backoff policy.
//!
//! The caller chooses how the policies are shared:
//! - [call_with_retry] starts from fresh copies of the client policies, each
//!   call has its own attempt budget.
//! - [call_with_retry_borrow] uses policies owned by the caller. Paginated
//!   calls use this to share one budget across all the pages.
//! - [call_without_retry] makes a single attempt.

use crate::Result;
use crate::backoff_policy::BackoffPolicy;
use crate::call_context::{CallContext, ContextSetup};
use crate::client::StubClient;
use crate::error::{Error, LoopTermination};
use crate::idempotency::Idempotency;
use crate::options::RetryOptions;
use crate::retry_policy::RetryPolicy;
use std::time::Duration;

/// Runs `call` with fresh copies of the policies in `options`.
///
/// On failure the error [status][Error::status] has the code of the last
/// attempt and a message of the form
/// `{error_label}: {reason}, last failure: {last message}`.
pub fn call_with_retry<C, M, Req, Resp, F>(
    client: &C,
    options: &RetryOptions,
    idempotency: Idempotency,
    metadata: &M,
    call: F,
    request: &Req,
    error_label: &str,
) -> Result<Resp>
where
    C: StubClient + ?Sized,
    M: ContextSetup + ?Sized,
    F: Fn(&C::Stub, &CallContext, &Req) -> Result<Resp>,
{
    let mut retry = options.retry_policy().fresh();
    let mut backoff = options.backoff_policy().fresh();
    retry_loop(
        client,
        &mut retry,
        &mut backoff,
        idempotency,
        metadata,
        call,
        request,
        error_label,
        std::thread::sleep,
    )
}

/// Runs `call` using policies owned by the caller.
///
/// Any failures recorded in `retry`, and any growth in `backoff`, carry over
/// to the next call using the same policies.
#[allow(clippy::too_many_arguments)]
pub fn call_with_retry_borrow<C, M, Req, Resp, F>(
    client: &C,
    retry: &mut RetryPolicy,
    backoff: &mut BackoffPolicy,
    idempotency: Idempotency,
    metadata: &M,
    call: F,
    request: &Req,
    error_label: &str,
) -> Result<Resp>
where
    C: StubClient + ?Sized,
    M: ContextSetup + ?Sized,
    F: Fn(&C::Stub, &CallContext, &Req) -> Result<Resp>,
{
    retry_loop(
        client,
        retry,
        backoff,
        idempotency,
        metadata,
        call,
        request,
        error_label,
        std::thread::sleep,
    )
}

/// Makes a single attempt.
///
/// A failure is annotated as a non-idempotent operation failure.
pub fn call_without_retry<C, M, Req, Resp, F>(
    client: &C,
    metadata: &M,
    call: F,
    request: &Req,
    error_label: &str,
) -> Result<Resp>
where
    C: StubClient + ?Sized,
    M: ContextSetup + ?Sized,
    F: Fn(&C::Stub, &CallContext, &Req) -> Result<Resp>,
{
    let mut context = CallContext::default();
    metadata.setup(&mut context);
    let result = call(client.stub().as_ref(), &context, request);
    client.on_completion(result.as_ref().map(|_| ()));
    result.map_err(|e| Error::terminated(LoopTermination::NonIdempotent, error_label, e))
}

/// Runs the retry loop for `call`.
///
/// This functions calls `call` as long as (1) the request is idempotent, (2)
/// the retry policy has not expired, and (3) `call` has not returned a
/// success or a permanent error.
///
/// In between calls the function waits the amount of time prescribed by the
/// backoff policy, using `sleep` to implement any sleep.
#[allow(clippy::too_many_arguments)]
pub fn retry_loop<C, M, Req, Resp, F, S>(
    client: &C,
    retry: &mut RetryPolicy,
    backoff: &mut BackoffPolicy,
    idempotency: Idempotency,
    metadata: &M,
    call: F,
    request: &Req,
    error_label: &str,
    mut sleep: S,
) -> Result<Resp>
where
    C: StubClient + ?Sized,
    M: ContextSetup + ?Sized,
    F: Fn(&C::Stub, &CallContext, &Req) -> Result<Resp>,
    S: FnMut(Duration),
{
    loop {
        let mut context = CallContext::default();
        retry.setup(&mut context);
        metadata.setup(&mut context);
        let result = call(client.stub().as_ref(), &context, request);
        client.on_completion(result.as_ref().map(|_| ()));
        let error = match result {
            Ok(response) => return Ok(response),
            Err(e) => e,
        };
        if let Some(reason) = classify_failure(retry, idempotency, &error) {
            tracing::debug!("{error_label}: stopping the retry loop: {reason}, error={error}");
            return Err(Error::terminated(reason, error_label, error));
        }
        let delay = backoff.on_completion();
        tracing::debug!("{error_label}: retrying in {delay:?} after error={error}");
        sleep(delay);
    }
}

/// Decides if the loop must stop after `error`.
///
/// The checks run in order: non-idempotent requests are never retried, then
/// permanent errors stop the loop, and finally the retry policy records the
/// failure.
pub(crate) fn classify_failure(
    retry: &mut RetryPolicy,
    idempotency: Idempotency,
    error: &Error,
) -> Option<LoopTermination> {
    if !idempotency.is_idempotent() {
        return Some(LoopTermination::NonIdempotent);
    }
    if retry.is_permanent_failure(error) {
        return Some(LoopTermination::Permanent);
    }
    if !retry.on_failure(error) {
        return Some(LoopTermination::Exhausted);
    }
    None
}
