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

//! Bidirectional streaming RPCs and their resumable wrapper.
//!
//! A [StreamingReadWriteRpc] is a single, low-level bidirectional stream. It
//! may break at any time, after which reads return `None` and writes return
//! `false`. The [ResumableStream] hides such breaks: it finishes the broken
//! stream, creates a new one, and replays the pending reads and writes
//! against it.

use crate::Result;

mod resumable;
pub use resumable::{ResumableStream, StreamFactory, StreamInitializer};

/// A bidirectional streaming RPC.
///
/// All the operations take `&self`, implementations use interior mutability
/// to allow a concurrent read and write.
#[async_trait::async_trait]
pub trait StreamingReadWriteRpc<Req, Resp>: Send + Sync {
    /// Requests the cancellation of the stream.
    ///
    /// Pending and future reads and writes fail. The caller must still call
    /// [finish][StreamingReadWriteRpc::finish].
    fn cancel(&self);

    /// Starts the stream, returns false if the stream broke.
    async fn start(&self) -> bool;

    /// Reads the next response, returns `None` if the stream broke or closed.
    async fn read(&self) -> Option<Resp>;

    /// Writes a request, returns false if the stream broke.
    async fn write(&self, request: Req) -> bool;

    /// Half-closes the stream.
    async fn writes_done(&self) -> bool;

    /// Waits for the stream to finish and returns its final status.
    async fn finish(&self) -> Result<()>;
}
