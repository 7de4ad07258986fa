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

use super::StreamingReadWriteRpc;
use crate::Result;
use crate::backoff_policy::BackoffPolicy;
use crate::completion_queue::CompletionQueue;
use crate::error::Error;
use crate::error::rpc::{Code, Status};
use crate::idempotency::Idempotency;
use crate::retry_loop::classify_failure;
use crate::retry_policy::RetryPolicy;
use futures::FutureExt;
use futures::future::BoxFuture;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

type DynStream<Req, Resp> = dyn StreamingReadWriteRpc<Req, Resp>;

/// Creates a new low-level stream for each connection attempt.
pub type StreamFactory<Req, Resp> = Arc<dyn Fn() -> Box<DynStream<Req, Resp>> + Send + Sync>;

/// Prepares a newly started stream before it is used, e.g. sends the
/// initial handshake request.
///
/// The initializer owns the stream. If it fails it must finish the stream
/// before returning the error.
pub type StreamInitializer<Req, Resp> = Arc<
    dyn Fn(Box<DynStream<Req, Resp>>) -> BoxFuture<'static, Result<Box<DynStream<Req, Resp>>>>
        + Send
        + Sync,
>;

/// A bidirectional stream that reconnects when the underlying stream breaks.
///
/// When the current stream breaks, the wrapper:
/// 1. cancels and finishes the broken stream,
/// 2. consults a fresh copy of the retry policy, and stops if the error is
///    permanent or the policy is exhausted,
/// 3. waits for the backoff period,
/// 4. creates a new stream via the factory, starts it, and runs the
///    initializer,
/// 5. publishes the new stream to any pending reads and writes.
///
/// Reads and writes issued while there is no live stream wait for the next
/// one. At most one low-level stream exists at a time.
///
/// The future returned by [start][ResumableStream::start] resolves when the
/// stream stops: with an error if it fails permanently, or with `Ok(())` after
/// [shutdown][ResumableStream::shutdown]. Applications must call `shutdown()`
/// to release the stream.
pub struct ResumableStream<Req, Resp> {
    shared: Arc<Shared<Req, Resp>>,
}

impl<Req, Resp> ResumableStream<Req, Resp>
where
    Req: Clone + Send + Sync + 'static,
    Resp: Send + 'static,
{
    /// Creates a new stream, without starting it.
    ///
    /// `retry` and `backoff` are prototypes, each reconnect episode uses fresh
    /// copies.
    pub fn new<F, I, IFut>(
        location: impl Into<String>,
        factory: F,
        initializer: I,
        retry: RetryPolicy,
        backoff: BackoffPolicy,
        cq: CompletionQueue,
    ) -> Self
    where
        F: Fn() -> Box<DynStream<Req, Resp>> + Send + Sync + 'static,
        I: Fn(Box<DynStream<Req, Resp>>) -> IFut + Send + Sync + 'static,
        IFut: Future<Output = Result<Box<DynStream<Req, Resp>>>> + Send + 'static,
    {
        let (start_tx, start_rx) = oneshot::channel();
        let initializer: StreamInitializer<Req, Resp> =
            Arc::new(move |stream| initializer(stream).boxed());
        let (phase, _) = watch::channel(Phase::Connecting);
        let shared = Shared {
            location: location.into(),
            factory: Arc::new(factory),
            initializer,
            retry,
            backoff,
            cq,
            phase,
            generation: AtomicU64::new(0),
            shutdown: CancellationToken::new(),
            retry_task: Mutex::new(None),
            start_tx: Mutex::new(Some(start_tx)),
            start_rx: Mutex::new(Some(start_rx)),
            shutdown_lock: tokio::sync::Mutex::new(()),
        };
        Self {
            shared: Arc::new(shared),
        }
    }

    /// Starts the stream.
    ///
    /// The first connection attempt starts immediately. The returned future
    /// resolves when the stream stops, either with the error that stopped it
    /// or `Ok(())` after a shutdown. Only the first call starts the stream,
    /// later calls resolve with an error.
    pub fn start(&self) -> impl Future<Output = Result<()>> + Send + 'static {
        let receiver = self
            .shared
            .start_rx
            .lock()
            .expect("never poisoned")
            .take();
        if receiver.is_some() {
            self.shared.spawn_reconnect(None);
        }
        async move {
            match receiver {
                None => Err(Error::other("the stream was already started")),
                Some(r) => r
                    .await
                    .unwrap_or_else(|_| Err(Error::cancelled("the stream was dropped"))),
            }
        }
    }

    /// Reads the next response.
    ///
    /// If the current stream breaks the read waits for a new stream and reads
    /// from it. Returns `None` once the stream stopped.
    pub async fn read(&self) -> Option<Resp> {
        loop {
            let (stream, generation) = self.shared.wait_live().await?;
            if let Some(response) = stream.read().await {
                return Some(response);
            }
            self.shared.on_broken(generation);
        }
    }

    /// Writes a request.
    ///
    /// If the current stream breaks the request is written again to the new
    /// stream. Returns false once the stream stopped.
    pub async fn write(&self, request: Req) -> bool {
        loop {
            let Some((stream, generation)) = self.shared.wait_live().await else {
                return false;
            };
            if stream.write(request.clone()).await {
                return true;
            }
            self.shared.on_broken(generation);
        }
    }

    /// Stops the stream and releases all its resources.
    ///
    /// Cancels and finishes the live stream, if any. Waits for any reconnect
    /// attempt in progress, and tears down any stream it produced. Resolves
    /// the [start][Self::start] future with `Ok(())` if it is still pending.
    /// Reads and writes after `shutdown()` returns never reach a low-level
    /// stream.
    ///
    /// Calling `shutdown()` more than once, or concurrently, is safe. All the
    /// calls return after the resources are released.
    pub async fn shutdown(&self) {
        let _guard = self.shared.shutdown_lock.lock().await;
        self.shared.shutdown.cancel();
        let previous = self.shared.phase.send_replace(Phase::Shutdown);
        if let Phase::Live { stream, .. } = previous {
            teardown(stream.as_ref()).await;
        }
        let task = self
            .shared
            .retry_task
            .lock()
            .expect("never poisoned")
            .take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                tracing::warn!("{}: reconnect task failed: {e}", self.shared.location);
            }
        }
        let start_tx = self
            .shared
            .start_tx
            .lock()
            .expect("never poisoned")
            .take();
        if let Some(tx) = start_tx {
            let _ = tx.send(Ok(()));
        }
    }
}

enum Phase<Req, Resp> {
    /// Waiting for the first stream, or reconnecting after a break.
    Connecting,
    Live {
        stream: Arc<DynStream<Req, Resp>>,
        generation: u64,
    },
    /// Stopped after a permanent error or an exhausted retry policy.
    Failed,
    Shutdown,
}

impl<Req, Resp> Clone for Phase<Req, Resp> {
    fn clone(&self) -> Self {
        match self {
            Self::Connecting => Self::Connecting,
            Self::Live { stream, generation } => Self::Live {
                stream: stream.clone(),
                generation: *generation,
            },
            Self::Failed => Self::Failed,
            Self::Shutdown => Self::Shutdown,
        }
    }
}

struct Shared<Req, Resp> {
    location: String,
    factory: StreamFactory<Req, Resp>,
    initializer: StreamInitializer<Req, Resp>,
    retry: RetryPolicy,
    backoff: BackoffPolicy,
    cq: CompletionQueue,
    phase: watch::Sender<Phase<Req, Resp>>,
    generation: AtomicU64,
    shutdown: CancellationToken,
    // Held while deciding to start a reconnect task and while storing its
    // handle, so `shutdown()` always finds the task it must wait for.
    retry_task: Mutex<Option<JoinHandle<()>>>,
    start_tx: Mutex<Option<oneshot::Sender<Result<()>>>>,
    start_rx: Mutex<Option<oneshot::Receiver<Result<()>>>>,
    shutdown_lock: tokio::sync::Mutex<()>,
}

impl<Req, Resp> Shared<Req, Resp>
where
    Req: Send + Sync + 'static,
    Resp: Send + 'static,
{
    async fn wait_live(&self) -> Option<(Arc<DynStream<Req, Resp>>, u64)> {
        let mut receiver = self.phase.subscribe();
        loop {
            let phase = receiver.borrow_and_update().clone();
            match phase {
                Phase::Live { stream, generation } => return Some((stream, generation)),
                Phase::Failed | Phase::Shutdown => return None,
                Phase::Connecting => {}
            }
            receiver.changed().await.ok()?;
        }
    }

    fn spawn_reconnect(self: &Arc<Self>, previous: Option<Arc<DynStream<Req, Resp>>>) {
        let mut task = self.retry_task.lock().expect("never poisoned");
        if self.shutdown.is_cancelled() {
            return;
        }
        *task = Some(self.cq.spawn(self.clone().reconnect(previous)));
    }

    /// Starts a reconnect episode if `generation` is still the live stream.
    fn on_broken(self: &Arc<Self>, generation: u64) {
        let mut task = self.retry_task.lock().expect("never poisoned");
        let mut previous = None;
        self.phase.send_if_modified(|phase| {
            let current =
                matches!(phase, Phase::Live { generation: g, .. } if *g == generation);
            if current {
                previous = Some(std::mem::replace(phase, Phase::Connecting));
            }
            current
        });
        let Some(Phase::Live { stream, .. }) = previous else {
            return;
        };
        tracing::debug!("{}: stream broken, reconnecting", self.location);
        *task = Some(self.cq.spawn(self.clone().reconnect(Some(stream))));
    }

    async fn reconnect(self: Arc<Self>, previous: Option<Arc<DynStream<Req, Resp>>>) {
        let mut retry = self.retry.fresh();
        let mut backoff = self.backoff.fresh();
        let mut last_error = match previous {
            None => None,
            Some(stream) => Some(teardown(stream.as_ref()).await),
        };
        loop {
            if let Some(error) = last_error.take() {
                if self.shutdown.is_cancelled() {
                    return;
                }
                if let Some(reason) =
                    classify_failure(&mut retry, Idempotency::Idempotent, &error)
                {
                    tracing::warn!(
                        "{}: cannot reconnect the stream: {reason}, error={error}",
                        self.location
                    );
                    self.fail(Error::terminated(reason, &self.location, error));
                    return;
                }
                let delay = backoff.on_completion();
                tracing::debug!(
                    "{}: reconnecting in {delay:?} after error={error}",
                    self.location
                );
                let timer = self.cq.make_relative_timer(delay);
                tokio::select! {
                    _ = self.shutdown.cancelled() => return,
                    r = timer => if let Err(e) = r {
                        self.fail(e);
                        return;
                    },
                }
            }
            if self.shutdown.is_cancelled() {
                return;
            }
            match self.connect().await {
                Ok(stream) => {
                    if let Some(rejected) = self.publish(stream) {
                        teardown(rejected.as_ref()).await;
                    }
                    return;
                }
                Err(e) => last_error = Some(e),
            }
        }
    }

    async fn connect(&self) -> Result<Arc<DynStream<Req, Resp>>> {
        let stream = (self.factory)();
        let started = tokio::select! {
            started = stream.start() => started,
            _ = self.shutdown.cancelled() => {
                teardown(stream.as_ref()).await;
                return Err(Error::cancelled("the stream is shutting down"));
            },
        };
        if !started {
            let status = stream.finish().await;
            return Err(closed_error(status));
        }
        let stream = (self.initializer)(stream).await?;
        Ok(Arc::from(stream))
    }

    /// Makes `stream` the live stream, unless the wrapper shut down.
    ///
    /// Returns the stream if it was not published.
    fn publish(&self, stream: Arc<DynStream<Req, Resp>>) -> Option<Arc<DynStream<Req, Resp>>> {
        let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
        let mut pending = Some(stream);
        self.phase.send_if_modified(|phase| {
            if !matches!(phase, Phase::Connecting) {
                return false;
            }
            match pending.take() {
                Some(stream) => {
                    *phase = Phase::Live { stream, generation };
                    true
                }
                None => false,
            }
        });
        pending
    }

    fn fail(&self, error: Error) {
        self.phase.send_if_modified(|phase| {
            if matches!(phase, Phase::Shutdown) {
                return false;
            }
            *phase = Phase::Failed;
            true
        });
        let start_tx = self.start_tx.lock().expect("never poisoned").take();
        if let Some(tx) = start_tx {
            let _ = tx.send(Err(error));
        }
    }
}

/// Cancels and finishes `stream`, returns the error that closed it.
async fn teardown<Req, Resp>(stream: &DynStream<Req, Resp>) -> Error {
    stream.cancel();
    closed_error(stream.finish().await)
}

// A stream that closes with a successful status still needs a reconnect, `OK`
// is in the retryable set.
fn closed_error(status: Result<()>) -> Error {
    match status {
        Err(e) => e,
        Ok(()) => Error::service(Status::new(Code::Ok, "the stream was closed")),
    }
}
