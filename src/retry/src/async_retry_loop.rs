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

//! The asynchronous retry loop for unary RPCs.
//!
//! [retry_async_unary_rpc] has the same contract as the
//! [synchronous loop][crate::retry_loop], but no thread ever blocks: each
//! attempt is a future, and the backoff is a timer on a [CompletionQueue].
//!
//! The loop runs as a task on the completion queue. It owns all of its state,
//! which lives until the task completes.

use crate::Result;
use crate::backoff_policy::BackoffPolicy;
use crate::call_context::CallContext;
use crate::completion_queue::CompletionQueue;
use crate::error::Error;
use crate::idempotency::Idempotency;
use crate::retry_loop::classify_failure;
use crate::retry_policy::RetryPolicy;
use std::future::Future;
use tokio::sync::oneshot;

/// Starts a retry loop for an asynchronous unary RPC.
///
/// `call` makes a single attempt, it receives the context for the attempt and
/// a copy of `request`. The returned future resolves with the first success,
/// or with an error annotated with `location` and the reason the loop
/// stopped: `"non-idempotent operation failed"`, `"permanent failure"`, or
/// `"retry policy exhausted"`. If the completion queue shuts down during a
/// backoff the loop stops with the timer's cancelled error.
///
/// The loop starts immediately, even if the returned future is not polled.
///
/// # Example
/// ```
/// # use google_cloud_retry::async_retry_loop::retry_async_unary_rpc;
/// # use google_cloud_retry::completion_queue::CompletionQueue;
/// # use google_cloud_retry::idempotency::Idempotency;
/// # use google_cloud_retry::retry_policy::RetryPolicy;
/// # use google_cloud_retry::backoff_policy::BackoffPolicy;
/// # tokio_test_main();
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn tokio_test_main() {
/// let cq = CompletionQueue::new(tokio::runtime::Handle::current());
/// let response = retry_async_unary_rpc(
///     &cq,
///     "Echo::Echo",
///     RetryPolicy::limited_error_count(3),
///     BackoffPolicy::default(),
///     Idempotency::Idempotent,
///     |_context, request: String| async move { Ok(request) },
///     "hello".to_string(),
/// );
/// assert_eq!(response.await.ok().as_deref(), Some("hello"));
/// # }
/// ```
pub fn retry_async_unary_rpc<Req, Resp, F, Fut>(
    cq: &CompletionQueue,
    location: impl Into<String>,
    retry: RetryPolicy,
    backoff: BackoffPolicy,
    idempotency: Idempotency,
    call: F,
    request: Req,
) -> impl Future<Output = Result<Resp>> + Send + 'static
where
    Req: Clone + Send + 'static,
    Resp: Send + 'static,
    F: Fn(CallContext, Req) -> Fut + Send + 'static,
    Fut: Future<Output = Result<Resp>> + Send + 'static,
{
    let (sender, receiver) = oneshot::channel();
    let retry_loop = AsyncRetryUnaryRpc {
        location: location.into(),
        retry,
        backoff,
        idempotency,
        call,
        request,
        cq: cq.clone(),
        state: State::Issuing,
    };
    cq.spawn(retry_loop.run(sender));
    async move {
        receiver
            .await
            .unwrap_or_else(|_| Err(Error::cancelled("the retry loop task was dropped")))
    }
}

/// The states of the asynchronous retry loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    /// About to start an attempt.
    Issuing,
    /// Waiting for the result of the attempt.
    AwaitingResult,
    /// Waiting for the backoff timer.
    AwaitingBackoff,
    /// The result has been delivered.
    Done,
}

struct AsyncRetryUnaryRpc<Req, F> {
    location: String,
    retry: RetryPolicy,
    backoff: BackoffPolicy,
    idempotency: Idempotency,
    call: F,
    request: Req,
    cq: CompletionQueue,
    state: State,
}

impl<Req, F> AsyncRetryUnaryRpc<Req, F> {
    fn transition(&mut self, next: State) {
        tracing::trace!(
            "{}: retry loop state {:?} -> {:?}",
            self.location,
            self.state,
            next
        );
        self.state = next;
    }

    async fn run<Resp, Fut>(mut self, sender: oneshot::Sender<Result<Resp>>)
    where
        Req: Clone,
        F: Fn(CallContext, Req) -> Fut,
        Fut: Future<Output = Result<Resp>>,
    {
        let result = self.drive().await;
        self.transition(State::Done);
        // The caller may have dropped the future, nobody is waiting for the
        // result in that case.
        let _ = sender.send(result);
    }

    async fn drive<Resp, Fut>(&mut self) -> Result<Resp>
    where
        Req: Clone,
        F: Fn(CallContext, Req) -> Fut,
        Fut: Future<Output = Result<Resp>>,
    {
        loop {
            debug_assert_eq!(self.state, State::Issuing);
            let mut context = CallContext::default();
            self.retry.setup(&mut context);
            let attempt = (self.call)(context, self.request.clone());
            self.transition(State::AwaitingResult);
            let error = match attempt.await {
                Ok(response) => return Ok(response),
                Err(e) => e,
            };
            if let Some(reason) = classify_failure(&mut self.retry, self.idempotency, &error) {
                tracing::debug!(
                    "{}: stopping the retry loop: {reason}, error={error}",
                    self.location
                );
                return Err(Error::terminated(reason, &self.location, error));
            }
            let delay = self.backoff.on_completion();
            tracing::debug!(
                "{}: retrying in {delay:?} after error={error}",
                self.location
            );
            self.transition(State::AwaitingBackoff);
            self.cq.make_relative_timer(delay).await?;
            self.transition(State::Issuing);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::rpc::{Code, Status};
    use crate::exponential_backoff::{ExponentialBackoff, ExponentialBackoffBuilder};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::runtime::Handle;
    use tokio::time::Instant;

    fn transient() -> Error {
        Error::service(Status::new(Code::Unavailable, "try-again"))
    }

    fn permanent() -> Error {
        Error::service(Status::new(Code::PermissionDenied, "uh-oh"))
    }

    fn backoff() -> BackoffPolicy {
        ExponentialBackoff::new(Duration::from_secs(1), Duration::from_secs(5)).into()
    }

    /// Returns a call failing `failures` times with `error`, then succeeding.
    fn fail_then_succeed(
        failures: usize,
        error: fn() -> Error,
    ) -> (
        Arc<AtomicUsize>,
        impl Fn(CallContext, String) -> futures::future::Ready<Result<String>> + Send + 'static,
    ) {
        let counter = Arc::new(AtomicUsize::new(0));
        let calls = counter.clone();
        let call = move |_context: CallContext, request: String| {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            if n < failures {
                futures::future::ready(Err(error()))
            } else {
                futures::future::ready(Ok(format!("{request}-response")))
            }
        };
        (counter, call)
    }

    #[tokio::test(start_paused = true)]
    async fn success_after_transient_failures() -> anyhow::Result<()> {
        let start = Instant::now();
        let cq = CompletionQueue::new(Handle::current());
        let (counter, call) = fail_then_succeed(3, transient);
        let response = retry_async_unary_rpc(
            &cq,
            "Test::Echo",
            RetryPolicy::limited_error_count(5),
            backoff(),
            Idempotency::Idempotent,
            call,
            "hello".to_string(),
        )
        .await?;
        assert_eq!(response, "hello-response");
        assert_eq!(counter.load(Ordering::SeqCst), 4);
        // 1s + 2s + 4s of backoff.
        assert_eq!(start.elapsed(), Duration::from_secs(7));
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn permanent_failure() {
        let start = Instant::now();
        let cq = CompletionQueue::new(Handle::current());
        let (counter, call) = fail_then_succeed(usize::MAX, permanent);
        let err = retry_async_unary_rpc(
            &cq,
            "Test::Echo",
            RetryPolicy::limited_error_count(5),
            backoff(),
            Idempotency::Idempotent,
            call,
            "hello".to_string(),
        )
        .await
        .unwrap_err();
        assert!(err.is_permanent(), "{err:?}");
        let status = err.status().cloned();
        assert_eq!(
            status,
            Some(Status::new(
                Code::PermissionDenied,
                "Test::Echo: permanent failure, last failure: uh-oh"
            ))
        );
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted() {
        let cq = CompletionQueue::new(Handle::current());
        let (counter, call) = fail_then_succeed(usize::MAX, transient);
        let err = retry_async_unary_rpc(
            &cq,
            "Test::Echo",
            RetryPolicy::limited_error_count(3),
            backoff(),
            Idempotency::Idempotent,
            call,
            "hello".to_string(),
        )
        .await
        .unwrap_err();
        assert!(err.is_exhausted(), "{err:?}");
        let message = err.status().map(|s| s.message.clone());
        assert_eq!(
            message.as_deref(),
            Some("Test::Echo: retry policy exhausted, last failure: try-again")
        );
        assert_eq!(err.code(), Code::Unavailable);
        assert_eq!(counter.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn non_idempotent() {
        let cq = CompletionQueue::new(Handle::current());
        let (counter, call) = fail_then_succeed(usize::MAX, transient);
        let err = retry_async_unary_rpc(
            &cq,
            "Test::Create",
            RetryPolicy::limited_error_count(3),
            backoff(),
            Idempotency::NonIdempotent,
            call,
            "hello".to_string(),
        )
        .await
        .unwrap_err();
        assert!(err.is_non_idempotent(), "{err:?}");
        let message = err.status().map(|s| s.message.clone());
        assert_eq!(
            message.as_deref(),
            Some("Test::Create: non-idempotent operation failed, last failure: try-again")
        );
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn queue_shutdown_during_backoff() -> anyhow::Result<()> {
        let cq = CompletionQueue::new(Handle::current());
        let (counter, call) = fail_then_succeed(usize::MAX, transient);
        let pending = tokio::spawn(retry_async_unary_rpc(
            &cq,
            "Test::Echo",
            RetryPolicy::limited_error_count(3),
            backoff(),
            Idempotency::Idempotent,
            call,
            "hello".to_string(),
        ));
        // Let the first attempt fail and the loop start its backoff.
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        cq.shutdown();
        let err = pending.await?.unwrap_err();
        assert!(err.is_cancelled(), "{err:?}");
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn unbounded_backoff() -> anyhow::Result<()> {
        let cq = CompletionQueue::new(Handle::current());
        let (counter, call) = fail_then_succeed(usize::MAX, transient);
        let backoff = ExponentialBackoffBuilder::new()
            .with_initial_delay(Duration::MAX)
            .with_maximum_delay(Duration::MAX)
            .with_jitter(false)
            .build()?;
        let pending = tokio::spawn(retry_async_unary_rpc(
            &cq,
            "Test::Echo",
            RetryPolicy::limited_error_count(3),
            backoff.into(),
            Idempotency::Idempotent,
            call,
            "hello".to_string(),
        ));
        tokio::time::sleep(Duration::from_secs(3600)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(!pending.is_finished());

        cq.shutdown();
        let err = pending.await?.unwrap_err();
        assert!(err.is_cancelled(), "{err:?}");
        let source = std::error::Error::source(&err).map(|e| e.to_string());
        assert_eq!(source.as_deref(), Some("the completion queue is shut down"));
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn limited_time_sets_deadline() -> anyhow::Result<()> {
        let start = Instant::now();
        let cq = CompletionQueue::new(Handle::current());
        let response = retry_async_unary_rpc(
            &cq,
            "Test::Echo",
            RetryPolicy::limited_time(Duration::from_secs(30)),
            backoff(),
            Idempotency::Idempotent,
            |context: CallContext, _request: ()| async move { Ok(context.deadline()) },
            (),
        )
        .await?;
        assert_eq!(response, Some(start + Duration::from_secs(30)));
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn limited_time_exhausted() {
        let start = Instant::now();
        let cq = CompletionQueue::new(Handle::current());
        let (counter, call) = fail_then_succeed(usize::MAX, transient);
        let err = retry_async_unary_rpc(
            &cq,
            "Test::Echo",
            RetryPolicy::limited_time(Duration::from_secs(10)),
            backoff(),
            Idempotency::Idempotent,
            call,
            "hello".to_string(),
        )
        .await
        .unwrap_err();
        assert!(err.is_exhausted(), "{err:?}");
        // Attempts at 0s, 1s, 3s, 7s, and 12s. The last one is past the deadline.
        assert_eq!(counter.load(Ordering::SeqCst), 5);
        assert_eq!(start.elapsed(), Duration::from_secs(12));
    }
}
