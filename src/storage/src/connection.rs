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

use crate::Result;
use crate::idempotency_policy::{IdempotencyPolicy, StorageRequest, StrictIdempotencyPolicy};
use crate::model::*;
use crate::stub;
use google_cloud_retry::async_retry_loop::retry_async_unary_rpc;
use google_cloud_retry::backoff_policy::BackoffPolicy;
use google_cloud_retry::call_context::CallContext;
use google_cloud_retry::completion_queue::CompletionQueue;
use google_cloud_retry::retry_policy::RetryPolicy;
use std::future::Future;
use std::sync::Arc;

/// A connection to Cloud Storage that retries transient failures.
///
/// Each call classifies the request with the configured
/// [IdempotencyPolicy]. Idempotent requests are retried using fresh copies of
/// the retry and backoff policies, non-idempotent requests are attempted once.
/// The retry loops run on the [CompletionQueue].
///
/// # Example
/// ```
/// # use google_cloud_storage::connection::StorageConnection;
/// # use google_cloud_storage::idempotency_policy::AlwaysRetryIdempotencyPolicy;
/// # use google_cloud_storage::model::GetBucketMetadataRequest;
/// # use google_cloud_storage::{retry_policy, stub};
/// # use google_cloud_retry::completion_queue::CompletionQueue;
/// # use std::sync::Arc;
/// # use std::time::Duration;
/// # async fn sample(stub: Arc<dyn stub::Storage>) -> google_cloud_storage::Result<()> {
/// let cq = CompletionQueue::new(tokio::runtime::Handle::current());
/// let connection = StorageConnection::new(stub, cq)
///     .with_retry_policy(retry_policy::limited_time(Duration::from_secs(60)))
///     .with_idempotency_policy(AlwaysRetryIdempotencyPolicy);
/// let request = GetBucketMetadataRequest {
///     bucket_name: "my-bucket".to_string(),
///     ..Default::default()
/// };
/// let metadata = connection.get_bucket_metadata(request).await?;
/// println!("{metadata:?}");
/// # Ok(()) }
/// ```
#[derive(Clone, Debug)]
pub struct StorageConnection {
    stub: Arc<dyn stub::Storage>,
    cq: CompletionQueue,
    retry: RetryPolicy,
    backoff: BackoffPolicy,
    idempotency: Arc<dyn IdempotencyPolicy>,
}

impl StorageConnection {
    /// Creates a connection with the storage default policies.
    pub fn new(stub: Arc<dyn stub::Storage>, cq: CompletionQueue) -> Self {
        Self {
            stub,
            cq,
            retry: crate::retry_policy::storage_default(),
            backoff: crate::backoff_policy::storage_default(),
            idempotency: Arc::new(StrictIdempotencyPolicy),
        }
    }

    pub fn with_retry_policy<V: Into<RetryPolicy>>(mut self, v: V) -> Self {
        self.retry = v.into();
        self
    }

    pub fn with_backoff_policy<V: Into<BackoffPolicy>>(mut self, v: V) -> Self {
        self.backoff = v.into();
        self
    }

    pub fn with_idempotency_policy<V: IdempotencyPolicy + 'static>(mut self, v: V) -> Self {
        self.idempotency = Arc::new(v);
        self
    }

    pub async fn get_bucket_metadata(
        &self,
        request: GetBucketMetadataRequest,
    ) -> Result<BucketMetadata> {
        self.retry(request, |stub, context, request| async move {
            stub.get_bucket_metadata(context, request).await
        })
        .await
    }

    pub async fn delete_bucket(&self, request: DeleteBucketRequest) -> Result<()> {
        self.retry(request, |stub, context, request| async move {
            stub.delete_bucket(context, request).await
        })
        .await
    }

    pub async fn set_bucket_iam_policy(
        &self,
        request: SetBucketIamPolicyRequest,
    ) -> Result<IamPolicy> {
        self.retry(request, |stub, context, request| async move {
            stub.set_bucket_iam_policy(context, request).await
        })
        .await
    }

    pub async fn list_objects(&self, request: ListObjectsRequest) -> Result<ListObjectsResponse> {
        self.retry(request, |stub, context, request| async move {
            stub.list_objects(context, request).await
        })
        .await
    }

    pub async fn get_object_metadata(
        &self,
        request: GetObjectMetadataRequest,
    ) -> Result<ObjectMetadata> {
        self.retry(request, |stub, context, request| async move {
            stub.get_object_metadata(context, request).await
        })
        .await
    }

    pub async fn insert_object(&self, request: InsertObjectRequest) -> Result<ObjectMetadata> {
        self.retry(request, |stub, context, request| async move {
            stub.insert_object(context, request).await
        })
        .await
    }

    pub async fn delete_object(&self, request: DeleteObjectRequest) -> Result<()> {
        self.retry(request, |stub, context, request| async move {
            stub.delete_object(context, request).await
        })
        .await
    }

    pub async fn create_hmac_key(&self, request: CreateHmacKeyRequest) -> Result<HmacKeyMetadata> {
        self.retry(request, |stub, context, request| async move {
            stub.create_hmac_key(context, request).await
        })
        .await
    }

    pub async fn create_notification(
        &self,
        request: CreateNotificationRequest,
    ) -> Result<NotificationMetadata> {
        self.retry(request, |stub, context, request| async move {
            stub.create_notification(context, request).await
        })
        .await
    }

    pub async fn delete_notification(&self, request: DeleteNotificationRequest) -> Result<()> {
        self.retry(request, |stub, context, request| async move {
            stub.delete_notification(context, request).await
        })
        .await
    }

    fn retry<Req, Resp, F, Fut>(
        &self,
        request: Req,
        call: F,
    ) -> impl Future<Output = Result<Resp>> + Send + 'static
    where
        Req: StorageRequest + Clone + Send + 'static,
        Resp: Send + 'static,
        F: Fn(Arc<dyn stub::Storage>, CallContext, Req) -> Fut + Send + 'static,
        Fut: Future<Output = Result<Resp>> + Send + 'static,
    {
        let idempotency = self.idempotency.idempotency(&request);
        let location = format!("Storage::{}", request.name());
        tracing::debug!("{location}: starting with idempotency={idempotency:?}");
        let stub = self.stub.clone();
        retry_async_unary_rpc(
            &self.cq,
            location,
            self.retry.fresh(),
            self.backoff.fresh(),
            idempotency,
            move |context, request| call(stub.clone(), context, request),
            request,
        )
    }
}
