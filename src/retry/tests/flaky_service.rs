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

//! Runs the retry loops against a service that fails a fixed number of times
//! before succeeding.

use google_cloud_retry::Result;
use google_cloud_retry::async_retry_loop::retry_async_unary_rpc;
use google_cloud_retry::call_context::CallContext;
use google_cloud_retry::client::StubClient;
use google_cloud_retry::completion_queue::CompletionQueue;
use google_cloud_retry::error::Error;
use google_cloud_retry::error::rpc::{Code, Status};
use google_cloud_retry::exponential_backoff::ExponentialBackoff;
use google_cloud_retry::idempotency::Idempotency;
use google_cloud_retry::options::RetryOptions;
use google_cloud_retry::polling_loop::poll_until_complete;
use google_cloud_retry::polling_policy::PollingPolicy;
use google_cloud_retry::retry_loop::{call_with_retry, call_without_retry};
use google_cloud_retry::retry_policy::RetryPolicy;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug)]
struct FlakyService {
    failures: usize,
    code: Code,
    calls: AtomicUsize,
}

impl FlakyService {
    fn new(failures: usize, code: Code) -> Self {
        Self {
            failures,
            code,
            calls: AtomicUsize::new(0),
        }
    }

    fn echo(&self, request: &str) -> Result<String> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.failures {
            return Err(Error::service(Status::new(
                self.code,
                format!("failure {call}"),
            )));
        }
        Ok(request.to_string())
    }
}

#[derive(Debug)]
struct Client {
    stub: Mutex<Arc<FlakyService>>,
    completions: Mutex<Vec<bool>>,
}

impl Client {
    fn new(service: FlakyService) -> Self {
        Self {
            stub: Mutex::new(Arc::new(service)),
            completions: Mutex::new(Vec::new()),
        }
    }
}

impl StubClient for Client {
    type Stub = FlakyService;

    fn stub(&self) -> Arc<FlakyService> {
        self.stub.lock().unwrap().clone()
    }

    fn reset(&self) {}

    fn on_completion(&self, result: std::result::Result<(), &Error>) {
        self.completions.lock().unwrap().push(result.is_ok());
    }
}

fn options(retry: RetryPolicy) -> RetryOptions {
    RetryOptions::default()
        .with_retry_policy(retry)
        .with_backoff_policy(ExponentialBackoff::new(
            Duration::from_millis(1),
            Duration::from_millis(4),
        ))
}

#[test]
fn sync_success_after_transient_failures() -> anyhow::Result<()> {
    let client = Client::new(FlakyService::new(2, Code::Unavailable));
    let response = call_with_retry(
        &client,
        &options(RetryPolicy::limited_error_count(3)),
        Idempotency::Idempotent,
        &(),
        |stub, _context, request: &String| stub.echo(request),
        &"hello".to_string(),
        "Flaky::Echo",
    )?;
    assert_eq!(response, "hello");
    assert_eq!(*client.completions.lock().unwrap(), vec![false, false, true]);
    Ok(())
}

#[test]
fn sync_each_call_has_its_own_budget() -> anyhow::Result<()> {
    let options = options(RetryPolicy::limited_error_count(2));
    for _ in 0..3 {
        let client = Client::new(FlakyService::new(2, Code::Aborted));
        let response = call_with_retry(
            &client,
            &options,
            Idempotency::Idempotent,
            &(),
            |stub, _context, request: &String| stub.echo(request),
            &"hello".to_string(),
            "Flaky::Echo",
        )?;
        assert_eq!(response, "hello");
    }
    Ok(())
}

#[test]
fn sync_exhausted() {
    let client = Client::new(FlakyService::new(10, Code::Unavailable));
    let err = call_with_retry(
        &client,
        &options(RetryPolicy::limited_error_count(3)),
        Idempotency::Idempotent,
        &(),
        |stub, _context, request: &String| stub.echo(request),
        &"hello".to_string(),
        "Flaky::Echo",
    )
    .unwrap_err();
    assert!(err.is_exhausted(), "{err:?}");
    assert_eq!(err.code(), Code::Unavailable);
    let message = err.status().map(|s| s.message.clone());
    assert_eq!(
        message.as_deref(),
        Some("Flaky::Echo: retry policy exhausted, last failure: failure 3")
    );
    // The last attempt error is available as the source.
    let source = std::error::Error::source(&err)
        .and_then(|e| e.downcast_ref::<Error>())
        .and_then(|e| e.status())
        .map(|s| s.message.clone());
    assert_eq!(source.as_deref(), Some("failure 3"));
}

#[test]
fn sync_without_retry() {
    let client = Client::new(FlakyService::new(1, Code::Unavailable));
    let err = call_without_retry(
        &client,
        &(),
        |stub, _context, request: &String| stub.echo(request),
        &"hello".to_string(),
        "Flaky::Echo",
    )
    .unwrap_err();
    assert!(err.is_non_idempotent(), "{err:?}");
    assert_eq!(*client.completions.lock().unwrap(), vec![false]);
}

#[tokio::test(start_paused = true)]
async fn async_success_after_transient_failures() -> anyhow::Result<()> {
    let start = Instant::now();
    let cq = CompletionQueue::new(tokio::runtime::Handle::current());
    let service = Arc::new(FlakyService::new(3, Code::DeadlineExceeded));
    let stub = service.clone();
    let response = retry_async_unary_rpc(
        &cq,
        "Flaky::AsyncEcho",
        RetryPolicy::limited_error_count(3),
        ExponentialBackoff::new(Duration::from_secs(1), Duration::from_secs(10)).into(),
        Idempotency::Idempotent,
        move |_context: CallContext, request: String| {
            let result = stub.echo(&request);
            async move { result }
        },
        "hello".to_string(),
    )
    .await?;
    assert_eq!(response, "hello");
    assert_eq!(service.calls.load(Ordering::SeqCst), 4);
    assert_eq!(start.elapsed(), Duration::from_secs(1 + 2 + 4));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn async_loops_are_independent() -> anyhow::Result<()> {
    let cq = CompletionQueue::new(tokio::runtime::Handle::current());
    let pending: Vec<_> = (0..4)
        .map(|i| {
            let service = FlakyService::new(i, Code::Unavailable);
            retry_async_unary_rpc(
                &cq,
                "Flaky::AsyncEcho",
                RetryPolicy::limited_error_count(2),
                ExponentialBackoff::new(Duration::from_secs(1), Duration::from_secs(1)).into(),
                Idempotency::Idempotent,
                move |_context: CallContext, request: String| {
                    let result = service.echo(&request);
                    async move { result }
                },
                format!("request-{i}"),
            )
        })
        .collect();
    let results = futures::future::join_all(pending).await;
    assert_eq!(results[0].as_deref().ok(), Some("request-0"));
    assert_eq!(results[1].as_deref().ok(), Some("request-1"));
    assert_eq!(results[2].as_deref().ok(), Some("request-2"));
    let err = results[3].as_ref().unwrap_err();
    assert!(err.is_exhausted(), "{err:?}");
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn polling() -> anyhow::Result<()> {
    let cq = CompletionQueue::new(tokio::runtime::Handle::current());
    let polls = Arc::new(AtomicUsize::new(0));
    let counter = polls.clone();
    let policy = PollingPolicy::new(
        RetryPolicy::limited_time(Duration::from_secs(60)),
        ExponentialBackoff::new(Duration::from_secs(1), Duration::from_secs(4)).into(),
    );
    let value = poll_until_complete(&cq, "Flaky::Poll", policy, || {
        let n = counter.fetch_add(1, Ordering::SeqCst);
        async move {
            match n {
                0 | 1 => Ok(None),
                2 => Err(Error::io("connection reset")),
                _ => Ok(Some(n)),
            }
        }
    })
    .await?;
    assert_eq!(value, 3);
    assert_eq!(polls.load(Ordering::SeqCst), 4);
    Ok(())
}
