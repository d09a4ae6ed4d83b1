//! crates/palabra_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Lifecycle of an uploaded book. Only the analysis worker moves a book
/// past `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookStatus {
    Pending,
    Processing,
    Done,
    Failed,
}

impl BookStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookStatus::Pending => "pending",
            BookStatus::Processing => "processing",
            BookStatus::Done => "done",
            BookStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for BookStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(BookStatus::Pending),
            "processing" => Ok(BookStatus::Processing),
            "done" => Ok(BookStatus::Done),
            "failed" => Ok(BookStatus::Failed),
            other => Err(format!("unknown book status '{}'", other)),
        }
    }
}

/// Represents one uploaded document and its processing lifecycle.
#[derive(Debug, Clone, PartialEq)]
pub struct Book {
    pub id: Uuid,
    pub title: String,
    /// The object-store key the document was written under.
    pub filename: String,
    pub original_filename: String,
    pub language: String,
    pub user_id: Option<i32>,
    pub status: BookStatus,
    pub created: DateTime<Utc>,
    pub processed: Option<DateTime<Utc>>,
}

/// The metadata row written by the upload path. Always starts out `pending`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBook {
    pub id: Uuid,
    pub title: String,
    pub filename: String,
    pub original_filename: String,
    pub language: String,
    pub user_id: Option<i32>,
}

/// A distinct lexical item tracked per language.
#[derive(Debug, Clone, PartialEq)]
pub struct Word {
    pub id: i32,
    pub word: String,
    pub language: String,
    /// Ordinal difficulty tier. `None` means "not rated", which is not tier 0.
    pub difficulty: Option<i32>,
    pub zipf_score: Option<f64>,
    pub created: DateTime<Utc>,
}

/// Input for the word catalogue upsert; `(word, language)` is the natural key.
#[derive(Debug, Clone, PartialEq)]
pub struct NewWord {
    pub word: String,
    pub language: String,
    pub difficulty: Option<i32>,
    pub zipf_score: Option<f64>,
}

/// One row of a word-frequency query: a word joined with its count in a book.
#[derive(Debug, Clone, PartialEq)]
pub struct WordCount {
    pub word: Word,
    pub count: i32,
}

/// Everything the upload path needs from the inbound request.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub original_filename: String,
    pub content_type: Option<String>,
    pub language: String,
    pub user_id: Option<i32>,
    pub data: Bytes,
}

/// What a successful upload hands back to the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadReceipt {
    pub id: Uuid,
    pub stored_key: String,
    pub original_filename: String,
}
