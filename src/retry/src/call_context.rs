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

//! The per-attempt context of a RPC.
//!
//! The retry loops create a new [CallContext] for each attempt. The retry
//! policy may set a deadline, and a [ContextSetup] implementation adds the
//! request metadata (e.g. routing headers).

use http::HeaderMap;
use tokio::time::Instant;

/// The deadline and metadata for a single RPC attempt.
#[derive(Clone, Debug, Default)]
pub struct CallContext {
    deadline: Option<Instant>,
    metadata: HeaderMap,
}

impl CallContext {
    /// The deadline for this attempt, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Sets the deadline, replacing any previous value.
    pub fn set_deadline(&mut self, v: Instant) {
        self.deadline = Some(v);
    }

    /// Moves the deadline to `v` if that is earlier than the current deadline.
    ///
    /// A context without a deadline always takes `v`. The deadline never
    /// moves later.
    pub fn shrink_deadline(&mut self, v: Instant) {
        self.deadline = Some(match self.deadline {
            Some(current) => std::cmp::min(current, v),
            None => v,
        });
    }

    /// The request metadata.
    pub fn metadata(&self) -> &HeaderMap {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut HeaderMap {
        &mut self.metadata
    }
}

/// Populates the [CallContext] before each attempt.
pub trait ContextSetup {
    fn setup(&self, context: &mut CallContext);
}

/// Leaves the context unchanged.
impl ContextSetup for () {
    fn setup(&self, _context: &mut CallContext) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn shrink_deadline() {
        let now = Instant::now();
        let mut context = CallContext::default();
        assert!(context.deadline().is_none());

        context.shrink_deadline(now + Duration::from_secs(10));
        assert_eq!(context.deadline(), Some(now + Duration::from_secs(10)));

        context.shrink_deadline(now + Duration::from_secs(20));
        assert_eq!(context.deadline(), Some(now + Duration::from_secs(10)));

        context.shrink_deadline(now + Duration::from_secs(5));
        assert_eq!(context.deadline(), Some(now + Duration::from_secs(5)));

        context.set_deadline(now + Duration::from_secs(30));
        assert_eq!(context.deadline(), Some(now + Duration::from_secs(30)));
    }

    #[test]
    fn metadata() {
        let mut context = CallContext::default();
        context
            .metadata_mut()
            .insert("x-goog-request-params", "name=test".parse().unwrap());
        assert_eq!(
            context
                .metadata()
                .get("x-goog-request-params")
                .and_then(|v| v.to_str().ok()),
            Some("name=test")
        );
        ().setup(&mut context);
        assert_eq!(context.metadata().len(), 1);
    }
}
