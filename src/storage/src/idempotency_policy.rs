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

//! Decides which requests are safe to retry.
//!
//! Many Cloud Storage operations change the state of a resource. Retrying such
//! an operation after a transient failure may apply the change twice, for
//! example, deleting a newer version of an object created after the first
//! attempt. With preconditions the service rejects a second application of the
//! change, and the operation becomes idempotent.
//!
//! The [StrictIdempotencyPolicy] (the default) only retries requests that are
//! naturally idempotent or that set the relevant preconditions. The
//! [AlwaysRetryIdempotencyPolicy] retries all requests, applications that
//! tolerate duplicate changes may prefer it.
//!
//! # Example
//! ```
//! # use google_cloud_storage::idempotency_policy::*;
//! # use google_cloud_storage::model::DeleteObjectRequest;
//! # use google_cloud_retry::idempotency::Idempotency;
//! let policy = StrictIdempotencyPolicy;
//! let request = DeleteObjectRequest::default();
//! assert_eq!(policy.idempotency(&request), Idempotency::NonIdempotent);
//! let request = DeleteObjectRequest { generation: Some(42), ..Default::default() };
//! assert_eq!(policy.idempotency(&request), Idempotency::Idempotent);
//! ```

use crate::model::*;
use google_cloud_retry::idempotency::Idempotency;

/// A request to the Cloud Storage service.
pub trait StorageRequest: std::fmt::Debug {
    /// The name of the RPC, used in error messages and logs.
    fn name(&self) -> &'static str;

    /// The idempotency of the request, considering its preconditions.
    fn strict_idempotency(&self) -> Idempotency;
}

/// Classifies requests as idempotent or not.
///
/// Implementations must be pure: they only examine the request.
pub trait IdempotencyPolicy: std::fmt::Debug + Send + Sync {
    fn idempotency(&self, request: &dyn StorageRequest) -> Idempotency;
}

/// Retries requests only when they are idempotent.
///
/// - Reads, lists, and bucket creation are always idempotent.
/// - `DeleteObject` requires a `generation` or an `if_generation_match`
///   precondition.
/// - `InsertObject`, `CopyObject`, `ComposeObject`, and `RewriteObject`
///   require an `if_generation_match` precondition.
/// - `UpdateObject`, `PatchObject`, `DeleteBucket`, `UpdateBucket`, and
///   `PatchBucket` require an `if_metageneration_match` precondition.
/// - `SetBucketIamPolicy` requires an `etag` in the policy.
/// - `CreateHmacKey` and `CreateNotification` are never idempotent.
#[derive(Clone, Copy, Debug, Default)]
pub struct StrictIdempotencyPolicy;

impl IdempotencyPolicy for StrictIdempotencyPolicy {
    fn idempotency(&self, request: &dyn StorageRequest) -> Idempotency {
        request.strict_idempotency()
    }
}

/// Treats every request as idempotent.
#[derive(Clone, Copy, Debug, Default)]
pub struct AlwaysRetryIdempotencyPolicy;

impl IdempotencyPolicy for AlwaysRetryIdempotencyPolicy {
    fn idempotency(&self, _request: &dyn StorageRequest) -> Idempotency {
        Idempotency::Idempotent
    }
}

macro_rules! fixed_idempotency {
    ($idempotency:expr => $($request:ident as $name:literal),+ $(,)?) => {
        $(
            impl StorageRequest for $request {
                fn name(&self) -> &'static str {
                    $name
                }
                fn strict_idempotency(&self) -> Idempotency {
                    $idempotency
                }
            }
        )+
    };
}

macro_rules! conditional_idempotency {
    ($($request:ident as $name:literal => |$r:ident| $condition:expr),+ $(,)?) => {
        $(
            impl StorageRequest for $request {
                fn name(&self) -> &'static str {
                    $name
                }
                fn strict_idempotency(&self) -> Idempotency {
                    let $r = self;
                    Idempotency::from($condition)
                }
            }
        )+
    };
}

fixed_idempotency!(Idempotency::Idempotent =>
    ListBucketsRequest as "ListBuckets",
    CreateBucketRequest as "CreateBucket",
    GetBucketMetadataRequest as "GetBucketMetadata",
    GetBucketIamPolicyRequest as "GetBucketIamPolicy",
    TestBucketIamPermissionsRequest as "TestBucketIamPermissions",
    LockBucketRetentionPolicyRequest as "LockBucketRetentionPolicy",
    ListObjectsRequest as "ListObjects",
    GetObjectMetadataRequest as "GetObjectMetadata",
    ReadObjectRequest as "ReadObject",
    ListHmacKeysRequest as "ListHmacKeys",
    GetHmacKeyRequest as "GetHmacKey",
    DeleteHmacKeyRequest as "DeleteHmacKey",
    ListNotificationsRequest as "ListNotifications",
    GetNotificationRequest as "GetNotification",
    DeleteNotificationRequest as "DeleteNotification",
    GetProjectServiceAccountRequest as "GetProjectServiceAccount",
);

fixed_idempotency!(Idempotency::NonIdempotent =>
    CreateHmacKeyRequest as "CreateHmacKey",
    CreateNotificationRequest as "CreateNotification",
);

conditional_idempotency!(
    DeleteBucketRequest as "DeleteBucket" => |r| r.if_metageneration_match.is_some(),
    UpdateBucketRequest as "UpdateBucket" => |r| r.if_metageneration_match.is_some(),
    PatchBucketRequest as "PatchBucket" => |r| r.if_metageneration_match.is_some(),
    SetBucketIamPolicyRequest as "SetBucketIamPolicy" => |r| !r.policy.etag.is_empty(),
    InsertObjectRequest as "InsertObject" => |r| r.if_generation_match.is_some(),
    CopyObjectRequest as "CopyObject" => |r| r.if_generation_match.is_some(),
    ComposeObjectRequest as "ComposeObject" => |r| r.if_generation_match.is_some(),
    RewriteObjectRequest as "RewriteObject" => |r| r.if_generation_match.is_some(),
    DeleteObjectRequest as "DeleteObject" =>
        |r| r.generation.is_some() || r.if_generation_match.is_some(),
    UpdateObjectRequest as "UpdateObject" => |r| r.if_metageneration_match.is_some(),
    PatchObjectRequest as "PatchObject" => |r| r.if_metageneration_match.is_some(),
    UpdateHmacKeyRequest as "UpdateHmacKey" => |r| !r.etag.is_empty(),
);
