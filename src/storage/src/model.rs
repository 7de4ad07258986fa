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

//! The requests and resources of the Cloud Storage API.
//!
//! Only the fields that matter to the retry layer are modeled: the resource
//! names, the payloads echoed in tests, and the preconditions. Preconditions
//! are optional, `None` means the request does not set them.

/// The metadata for a bucket.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BucketMetadata {
    pub name: String,
    pub metageneration: i64,
    pub labels: Vec<(String, String)>,
}

/// The metadata for an object.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ObjectMetadata {
    pub bucket: String,
    pub name: String,
    pub generation: i64,
    pub metageneration: i64,
    pub size: u64,
    pub content_type: String,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ListObjectsResponse {
    pub items: Vec<ObjectMetadata>,
    /// Empty on the last page.
    pub next_page_token: String,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct HmacKeyMetadata {
    pub access_id: String,
    pub service_account_email: String,
    pub state: String,
    pub etag: String,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct NotificationMetadata {
    pub id: String,
    pub topic: String,
    pub etag: String,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct IamBinding {
    pub role: String,
    pub members: Vec<String>,
}

/// An IAM policy.
///
/// The service rejects a policy update if `etag` does not match the current
/// policy. Updates with an `etag` are therefore safe to retry.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct IamPolicy {
    pub version: i32,
    pub bindings: Vec<IamBinding>,
    pub etag: String,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ListBucketsRequest {
    pub project_id: String,
    pub page_token: String,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct CreateBucketRequest {
    pub project_id: String,
    pub metadata: BucketMetadata,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct GetBucketMetadataRequest {
    pub bucket_name: String,
    pub if_metageneration_match: Option<i64>,
    pub if_metageneration_not_match: Option<i64>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct DeleteBucketRequest {
    pub bucket_name: String,
    pub if_metageneration_match: Option<i64>,
    pub if_metageneration_not_match: Option<i64>,
}

/// Replaces all the bucket metadata.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UpdateBucketRequest {
    pub metadata: BucketMetadata,
    pub if_metageneration_match: Option<i64>,
    pub if_metageneration_not_match: Option<i64>,
}

/// Changes some of the bucket metadata.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PatchBucketRequest {
    pub bucket_name: String,
    pub labels: Vec<(String, String)>,
    pub if_metageneration_match: Option<i64>,
    pub if_metageneration_not_match: Option<i64>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct GetBucketIamPolicyRequest {
    pub bucket_name: String,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SetBucketIamPolicyRequest {
    pub bucket_name: String,
    pub policy: IamPolicy,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TestBucketIamPermissionsRequest {
    pub bucket_name: String,
    pub permissions: Vec<String>,
}

/// Locks the retention policy of a bucket.
///
/// The request always names the metageneration being locked.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LockBucketRetentionPolicyRequest {
    pub bucket_name: String,
    pub metageneration: i64,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ListObjectsRequest {
    pub bucket_name: String,
    pub prefix: String,
    pub page_token: String,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct GetObjectMetadataRequest {
    pub bucket_name: String,
    pub object_name: String,
    pub generation: Option<i64>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReadObjectRequest {
    pub bucket_name: String,
    pub object_name: String,
    pub generation: Option<i64>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct InsertObjectRequest {
    pub bucket_name: String,
    pub object_name: String,
    pub contents: Vec<u8>,
    /// Set to `Some(0)` to create the object only if it does not exist.
    pub if_generation_match: Option<i64>,
    pub if_generation_not_match: Option<i64>,
    pub if_metageneration_match: Option<i64>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct CopyObjectRequest {
    pub source_bucket: String,
    pub source_object: String,
    pub destination_bucket: String,
    pub destination_object: String,
    /// A precondition on the destination object.
    pub if_generation_match: Option<i64>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ComposeObjectRequest {
    pub bucket_name: String,
    pub source_objects: Vec<String>,
    pub destination_object: String,
    /// A precondition on the destination object.
    pub if_generation_match: Option<i64>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct RewriteObjectRequest {
    pub source_bucket: String,
    pub source_object: String,
    pub destination_bucket: String,
    pub destination_object: String,
    /// Continues a previous rewrite, empty for the first call.
    pub rewrite_token: String,
    /// A precondition on the destination object.
    pub if_generation_match: Option<i64>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct DeleteObjectRequest {
    pub bucket_name: String,
    pub object_name: String,
    /// Deletes this specific generation of the object.
    pub generation: Option<i64>,
    pub if_generation_match: Option<i64>,
    pub if_generation_not_match: Option<i64>,
    pub if_metageneration_match: Option<i64>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct UpdateObjectRequest {
    pub metadata: ObjectMetadata,
    pub if_generation_match: Option<i64>,
    pub if_metageneration_match: Option<i64>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PatchObjectRequest {
    pub bucket_name: String,
    pub object_name: String,
    pub content_type: Option<String>,
    pub if_generation_match: Option<i64>,
    pub if_metageneration_match: Option<i64>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ListHmacKeysRequest {
    pub project_id: String,
    pub service_account: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct CreateHmacKeyRequest {
    pub project_id: String,
    pub service_account: String,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct GetHmacKeyRequest {
    pub project_id: String,
    pub access_id: String,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct UpdateHmacKeyRequest {
    pub project_id: String,
    pub access_id: String,
    pub state: String,
    /// Empty if the update is unconditional.
    pub etag: String,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct DeleteHmacKeyRequest {
    pub project_id: String,
    pub access_id: String,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ListNotificationsRequest {
    pub bucket_name: String,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct CreateNotificationRequest {
    pub bucket_name: String,
    pub metadata: NotificationMetadata,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct GetNotificationRequest {
    pub bucket_name: String,
    pub notification_id: String,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct DeleteNotificationRequest {
    pub bucket_name: String,
    pub notification_id: String,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct GetProjectServiceAccountRequest {
    pub project_id: String,
}
