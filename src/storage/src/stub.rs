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

//! Traits to mock the Cloud Storage service.
//!
//! Application developers may need to mock the clients in this library to
//! test how their application works with different (and sometimes hard to
//! trigger) error conditions.

use crate::Result;
use crate::model::*;
use google_cloud_retry::call_context::CallContext;

/// Defines the trait used to implement [crate::connection::StorageConnection].
///
/// Each function makes exactly one attempt.
#[async_trait::async_trait]
pub trait Storage: std::fmt::Debug + Send + Sync {
    async fn get_bucket_metadata(
        &self,
        context: CallContext,
        request: GetBucketMetadataRequest,
    ) -> Result<BucketMetadata>;

    async fn delete_bucket(&self, context: CallContext, request: DeleteBucketRequest)
    -> Result<()>;

    async fn set_bucket_iam_policy(
        &self,
        context: CallContext,
        request: SetBucketIamPolicyRequest,
    ) -> Result<IamPolicy>;

    async fn list_objects(
        &self,
        context: CallContext,
        request: ListObjectsRequest,
    ) -> Result<ListObjectsResponse>;

    async fn get_object_metadata(
        &self,
        context: CallContext,
        request: GetObjectMetadataRequest,
    ) -> Result<ObjectMetadata>;

    async fn insert_object(
        &self,
        context: CallContext,
        request: InsertObjectRequest,
    ) -> Result<ObjectMetadata>;

    async fn delete_object(&self, context: CallContext, request: DeleteObjectRequest)
    -> Result<()>;

    async fn create_hmac_key(
        &self,
        context: CallContext,
        request: CreateHmacKeyRequest,
    ) -> Result<HmacKeyMetadata>;

    async fn create_notification(
        &self,
        context: CallContext,
        request: CreateNotificationRequest,
    ) -> Result<NotificationMetadata>;

    async fn delete_notification(
        &self,
        context: CallContext,
        request: DeleteNotificationRequest,
    ) -> Result<()>;
}
