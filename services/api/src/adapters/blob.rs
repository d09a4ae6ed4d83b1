//! services/api/src/adapters/blob.rs
//!
//! This module contains the adapter for the S3-compatible document bucket (MinIO
//! in deployment). It implements the `BlobStore` port from the `core` crate on
//! top of the `object_store` crate.

use crate::config::ObjectStoreSettings;
use async_trait::async_trait;
use bytes::Bytes;
use object_store::{
    aws::AmazonS3Builder, path::Path, Attribute, ObjectStore, PutOptions, PutPayload,
};
use palabra_core::ports::{BlobStore, PortError, PortResult, StoredObject};
use std::sync::Arc;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements the `BlobStore` port on any `ObjectStore`.
#[derive(Clone)]
pub struct ObjectStoreAdapter {
    store: Arc<dyn ObjectStore>,
}

impl ObjectStoreAdapter {
    /// Creates a new `ObjectStoreAdapter` over an already built store.
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Builds an S3 client for the configured MinIO bucket. Path-style requests
    /// are used since MinIO does not serve virtual-hosted buckets by default.
    pub fn from_settings(settings: &ObjectStoreSettings) -> Result<Self, object_store::Error> {
        let store = AmazonS3Builder::new()
            .with_endpoint(settings.endpoint_url())
            .with_bucket_name(&settings.bucket)
            .with_access_key_id(&settings.access_key)
            .with_secret_access_key(&settings.secret_key)
            .with_region(&settings.region)
            .with_allow_http(!settings.use_ssl)
            .with_virtual_hosted_style_request(false)
            .build()?;
        Ok(Self::new(Arc::new(store)))
    }
}

//=========================================================================================
// `BlobStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl BlobStore for ObjectStoreAdapter {
    async fn put(
        &self,
        key: &str,
        data: Bytes,
        content_type: Option<&str>,
    ) -> PortResult<StoredObject> {
        let path = Path::from(key);
        let size = data.len() as u64;

        let mut options = PutOptions::default();
        if let Some(content_type) = content_type {
            options
                .attributes
                .insert(Attribute::ContentType, content_type.to_string().into());
        }

        let result = self
            .store
            .put_opts(&path, PutPayload::from(data), options)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        Ok(StoredObject {
            key: path.to_string(),
            size,
            content_id: result.e_tag,
        })
    }
}
