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

//! Clients holding a refreshable stub.

use crate::error::Error;
use std::sync::Arc;

/// A client wrapping a service stub that can be rebuilt.
///
/// The synchronous retry loop gets the stub before each attempt, and reports
/// the outcome of each attempt via
/// [on_completion][StubClient::on_completion]. Implementations may use this
/// hook to refresh credentials or to record telemetry.
pub trait StubClient {
    /// The stub type, typically a `dyn` trait.
    type Stub: ?Sized;

    /// The current stub.
    fn stub(&self) -> Arc<Self::Stub>;

    /// Rebuilds the stub, e.g. after the underlying channel is broken.
    ///
    /// Callers already holding the previous stub keep using it. Only calls to
    /// [stub][StubClient::stub] made after `reset()` returns observe the new
    /// stub.
    fn reset(&self);

    /// Called after each attempt with its outcome.
    fn on_completion(&self, _result: std::result::Result<(), &Error>) {}
}
