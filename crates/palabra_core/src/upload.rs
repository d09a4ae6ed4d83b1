//! crates/palabra_core/src/upload.rs
//!
//! Sequences a single upload: blob write, then metadata insert, then a
//! best-effort notification to the analysis worker.
//!
//! There is no compensation between steps. A blob written before a failed
//! metadata insert is left in place and logged as an orphan, and a failed
//! notification leaves the book `pending` for an outside sweep to pick up.

use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::domain::{NewBook, UploadReceipt, UploadRequest};
use crate::ports::{BlobStore, BookStore, JobEnqueuer, PortError};

/// Failures the caller can see. Enqueue failures never show up here.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("Failed to write the document to blob storage: {0}")]
    StorageWrite(#[source] PortError),
    #[error("Failed to persist book metadata: {0}")]
    Persistence(#[source] PortError),
}

#[derive(Clone)]
pub struct UploadCoordinator {
    blobs: Arc<dyn BlobStore>,
    books: Arc<dyn BookStore>,
    jobs: Arc<dyn JobEnqueuer>,
}

impl UploadCoordinator {
    pub fn new(
        blobs: Arc<dyn BlobStore>,
        books: Arc<dyn BookStore>,
        jobs: Arc<dyn JobEnqueuer>,
    ) -> Self {
        Self { blobs, books, jobs }
    }

    pub async fn upload(&self, request: UploadRequest) -> Result<UploadReceipt, UploadError> {
        // The id is fixed before any I/O so the blob and the row share it.
        let book_id = Uuid::new_v4();
        let stored_key = storage_key(book_id, &request.original_filename);

        let stored = self
            .blobs
            .put(&stored_key, request.data, request.content_type.as_deref())
            .await
            .map_err(UploadError::StorageWrite)?;
        info!(
            "Document stored: key={}, size={} bytes",
            stored.key, stored.size
        );

        let new_book = NewBook {
            id: book_id,
            title: request.original_filename.clone(),
            filename: stored_key.clone(),
            original_filename: request.original_filename.clone(),
            language: request.language,
            user_id: request.user_id,
        };
        if let Err(e) = self.books.create(new_book).await {
            error!(
                "Book {} metadata insert failed; blob {} is now orphaned: {}",
                book_id, stored_key, e
            );
            return Err(UploadError::Persistence(e));
        }
        info!("Book record inserted: id={}, key={}", book_id, stored_key);

        match self.jobs.enqueue(book_id, &stored_key).await {
            Ok(()) => info!("Book {} enqueued for processing", book_id),
            Err(e) => warn!(
                "Failed to enqueue book {} (left pending): {}",
                book_id, e
            ),
        }

        Ok(UploadReceipt {
            id: book_id,
            stored_key,
            original_filename: request.original_filename,
        })
    }
}

/// `<id>` plus the original extension (text after the last `.`), if any.
/// Extensions that are not plain ASCII alphanumerics are dropped so client
/// input can never add path segments to the key.
pub fn storage_key(book_id: Uuid, original_filename: &str) -> String {
    match original_filename.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()) => {
            format!("{}.{}", book_id, ext)
        }
        _ => book_id.to_string(),
    }
}
