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

use crate::Error;
use crate::stub;
use google_cloud_retry::client::StubClient;
use google_cloud_retry::options::RetryOptions;
use std::sync::{Arc, Mutex};

type StubFactory = Box<dyn Fn() -> Arc<dyn stub::TableAdmin> + Send + Sync>;

/// Holds the table admin stub for a project.
///
/// The stub is created by a factory and can be rebuilt with
/// [reset][StubClient::reset], for example after the underlying channel
/// breaks. Calls that already hold the previous stub keep using it.
///
/// # Example
/// ```
/// # use google_cloud_bigtable::admin_client::AdminClient;
/// # use google_cloud_bigtable::stub::TableAdmin;
/// # use google_cloud_retry::options::RetryOptions;
/// # use std::sync::Arc;
/// # fn make_stub() -> Arc<dyn TableAdmin> { unimplemented!() }
/// # fn sample() {
/// let client = AdminClient::new("my-project", make_stub, RetryOptions::default());
/// assert_eq!(client.project(), "my-project");
/// # }
/// ```
pub struct AdminClient {
    project: String,
    options: RetryOptions,
    factory: StubFactory,
    stub: Mutex<Arc<dyn stub::TableAdmin>>,
}

impl AdminClient {
    /// Creates a client, the first stub is created immediately.
    pub fn new<F>(project: impl Into<String>, factory: F, options: RetryOptions) -> Self
    where
        F: Fn() -> Arc<dyn stub::TableAdmin> + Send + Sync + 'static,
    {
        let stub = Mutex::new(factory());
        Self {
            project: project.into(),
            options,
            factory: Box::new(factory),
            stub,
        }
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    /// The policy prototypes used by the calls on this client.
    pub fn options(&self) -> &RetryOptions {
        &self.options
    }
}

impl StubClient for AdminClient {
    type Stub = dyn stub::TableAdmin;

    fn stub(&self) -> Arc<Self::Stub> {
        self.stub.lock().expect("never poisoned").clone()
    }

    fn reset(&self) {
        let stub = (self.factory)();
        *self.stub.lock().expect("never poisoned") = stub;
    }

    fn on_completion(&self, result: std::result::Result<(), &Error>) {
        if let Err(e) = result {
            tracing::debug!("project={}: table admin attempt failed: {e}", self.project);
        }
    }
}

impl std::fmt::Debug for AdminClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminClient")
            .field("project", &self.project)
            .field("options", &self.options)
            .field("stub", &self.stub)
            .finish_non_exhaustive()
    }
}
