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

//! Routing headers for Bigtable RPCs.
//!
//! The service routes each request using the `x-goog-request-params` header.
//! Its value names the resource the request operates on, for example
//! `parent=projects/p/instances/i` or
//! `name=projects/p/instances/i/tables/t`.

use crate::{Error, Result};
use google_cloud_retry::call_context::{CallContext, ContextSetup};
use http::{HeaderName, HeaderValue};

/// The name of the routing header.
pub const REQUEST_PARAMS_HEADER: &str = "x-goog-request-params";

/// The request field named in the routing header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MetadataParamTypes {
    Parent,
    Name,
    Resource,
    TableName,
    AppProfileId,
}

impl MetadataParamTypes {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Parent => "parent",
            Self::Name => "name",
            Self::Resource => "resource",
            Self::TableName => "table_name",
            Self::AppProfileId => "app_profile_id",
        }
    }
}

impl std::fmt::Display for MetadataParamTypes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Computes the routing header for a RPC and adds it to each attempt.
///
/// # Example
/// ```
/// # use google_cloud_bigtable::metadata_update_policy::*;
/// # fn sample() -> google_cloud_bigtable::Result<()> {
/// let policy = MetadataUpdatePolicy::with_table_id(
///     "projects/p/instances/i", MetadataParamTypes::Name, "t")?;
/// assert_eq!(policy.value(), "name=projects/p/instances/i/tables/t");
/// # Ok(()) }
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct MetadataUpdatePolicy {
    value: HeaderValue,
}

impl MetadataUpdatePolicy {
    /// Routes using `resource_name`, the header value is
    /// `{param}={resource_name}`.
    pub fn new(resource_name: &str, param: MetadataParamTypes) -> Result<Self> {
        Self::from_string(format!("{param}={resource_name}"))
    }

    /// Routes to a child of `resource_name` known only by its id.
    ///
    /// The header value is `{param}={resource_name}/{collection}/{id}`, for
    /// example `name=projects/p/instances/i/clusters/c`.
    pub fn with_collection_id(
        resource_name: &str,
        param: MetadataParamTypes,
        collection: &str,
        id: &str,
    ) -> Result<Self> {
        Self::from_string(format!("{param}={resource_name}/{collection}/{id}"))
    }

    /// Routes to a table in the instance `resource_name`.
    ///
    /// The header value is `{param}={resource_name}/tables/{table_id}`.
    pub fn with_table_id(
        resource_name: &str,
        param: MetadataParamTypes,
        table_id: &str,
    ) -> Result<Self> {
        Self::with_collection_id(resource_name, param, "tables", table_id)
    }

    fn from_string(value: String) -> Result<Self> {
        let value = HeaderValue::try_from(value).map_err(Error::other)?;
        Ok(Self { value })
    }

    pub fn value(&self) -> &HeaderValue {
        &self.value
    }
}

impl ContextSetup for MetadataUpdatePolicy {
    fn setup(&self, context: &mut CallContext) {
        context.metadata_mut().insert(
            HeaderName::from_static(REQUEST_PARAMS_HEADER),
            self.value.clone(),
        );
    }
}
