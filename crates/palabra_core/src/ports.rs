//! crates/palabra_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or
//! object storage.

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use uuid::Uuid;

use crate::domain::{Book, NewBook, NewWord, Word, WordCount};
use crate::query::WordQuery;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Identity already exists: {0}")]
    DuplicateIdentity(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// Result of a successful blob write.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredObject {
    pub key: String,
    pub size: u64,
    /// Store-assigned content identifier (an ETag for S3-compatible stores).
    pub content_id: Option<String>,
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Writes `data` under `key` and reports what was stored.
    async fn put(
        &self,
        key: &str,
        data: Bytes,
        content_type: Option<&str>,
    ) -> PortResult<StoredObject>;
}

#[async_trait]
pub trait BookStore: Send + Sync {
    /// Inserts a `pending` book. Must reject an existing id with
    /// `PortError::DuplicateIdentity` rather than overwrite it.
    async fn create(&self, book: NewBook) -> PortResult<Book>;

    async fn get_by_id(&self, id: Uuid) -> PortResult<Book>;

    /// Most recent books first. A non-positive limit falls back to
    /// [`DEFAULT_RECENT_BOOKS`].
    async fn list_recent(&self, limit: i64) -> PortResult<Vec<Book>>;
}

/// Fallback page size for [`BookStore::list_recent`].
pub const DEFAULT_RECENT_BOOKS: i64 = 20;

/// Resolves a caller-supplied recent-books limit.
pub fn recent_books_limit(limit: i64) -> i64 {
    if limit > 0 {
        limit
    } else {
        DEFAULT_RECENT_BOOKS
    }
}

#[async_trait]
pub trait WordStore: Send + Sync {
    /// Inserts the word or refreshes its difficulty and score, returning its id.
    async fn upsert_word(&self, word: NewWord) -> PortResult<i32>;

    async fn get_word(&self, id: i32) -> PortResult<Word>;
}

#[async_trait]
pub trait WordFrequencyStore: Send + Sync {
    /// Adds `count` to the stored tally for `(book_id, word_id)`, creating the
    /// row when absent. Must be a single atomic statement.
    async fn record_occurrence(&self, book_id: Uuid, word_id: i32, count: i32) -> PortResult<()>;

    /// Filtered, sorted and paginated words for one book. A book without
    /// association rows yields an empty vector.
    async fn book_words(&self, book_id: Uuid, query: &WordQuery) -> PortResult<Vec<WordCount>>;

    /// The raw word id to count association for one book.
    async fn counts_for_book(&self, book_id: Uuid) -> PortResult<HashMap<i32, i32>>;
}

#[async_trait]
pub trait JobEnqueuer: Send + Sync {
    /// Tells the analysis worker that `stored_key` is ready for `book_id`.
    async fn enqueue(&self, book_id: Uuid, stored_key: &str) -> PortResult<()>;
}
