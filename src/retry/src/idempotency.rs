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

/// Whether a request can be safely attempted more than once.
///
/// The retry loops never retry a non-idempotent request, regardless of the
/// error returned by the first attempt.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Idempotency {
    Idempotent,
    #[default]
    NonIdempotent,
}

impl Idempotency {
    pub fn is_idempotent(&self) -> bool {
        matches!(self, Self::Idempotent)
    }
}

impl From<bool> for Idempotency {
    fn from(value: bool) -> Self {
        if value {
            Self::Idempotent
        } else {
            Self::NonIdempotent
        }
    }
}
