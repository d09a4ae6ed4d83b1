//! Shared helpers for the API integration tests: in-memory port
//! implementations and request builders.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{body::Body, http::Request, Router};
use bytes::Bytes;
use chrono::{Duration, Utc};
use object_store::memory::InMemory;
use palabra_api::{
    adapters::ObjectStoreAdapter,
    config::Config,
    web::{self, AppState},
};
use palabra_core::{
    domain::{Book, BookStatus, NewBook, Word, WordCount},
    ports::{
        recent_books_limit, BlobStore, BookStore, JobEnqueuer, PortError, PortResult,
        StoredObject, WordFrequencyStore,
    },
    query::{SortOrder, WordQuery},
    upload::UploadCoordinator,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

//=========================================================================================
// In-memory ports
//=========================================================================================

#[derive(Default)]
pub struct MemoryBooks {
    pub rows: Mutex<Vec<Book>>,
}

#[async_trait]
impl BookStore for MemoryBooks {
    async fn create(&self, book: NewBook) -> PortResult<Book> {
        let mut rows = self.rows.lock().await;
        if rows.iter().any(|b| b.id == book.id) {
            return Err(PortError::DuplicateIdentity(book.id.to_string()));
        }
        // Strictly increasing timestamps keep "most recent" deterministic.
        let created = Utc::now() + Duration::milliseconds(rows.len() as i64);
        let row = Book {
            id: book.id,
            title: book.title,
            filename: book.filename,
            original_filename: book.original_filename,
            language: book.language,
            user_id: book.user_id,
            status: BookStatus::Pending,
            created,
            processed: None,
        };
        rows.push(row.clone());
        Ok(row)
    }

    async fn get_by_id(&self, id: Uuid) -> PortResult<Book> {
        self.rows
            .lock()
            .await
            .iter()
            .find(|b| b.id == id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Book {} not found", id)))
    }

    async fn list_recent(&self, limit: i64) -> PortResult<Vec<Book>> {
        let mut rows = self.rows.lock().await.clone();
        rows.sort_by(|a, b| b.created.cmp(&a.created));
        rows.truncate(recent_books_limit(limit) as usize);
        Ok(rows)
    }
}

#[derive(Default)]
pub struct MemoryWordFrequencies {
    pub words: Mutex<Vec<Word>>,
    pub counts: Mutex<HashMap<(Uuid, i32), i32>>,
}

impl MemoryWordFrequencies {
    pub async fn add_word(&self, id: i32, text: &str, difficulty: Option<i32>) {
        self.words.lock().await.push(Word {
            id,
            word: text.to_string(),
            language: "es".to_string(),
            difficulty,
            zipf_score: difficulty.map(|d| 7.0 - d as f64),
            created: Utc::now(),
        });
    }
}

#[async_trait]
impl WordFrequencyStore for MemoryWordFrequencies {
    async fn record_occurrence(&self, book_id: Uuid, word_id: i32, count: i32) -> PortResult<()> {
        if count <= 0 {
            return Err(PortError::InvalidInput(format!(
                "occurrence count must be positive, got {}",
                count
            )));
        }
        *self.counts.lock().await.entry((book_id, word_id)).or_insert(0) += count;
        Ok(())
    }

    async fn book_words(&self, book_id: Uuid, query: &WordQuery) -> PortResult<Vec<WordCount>> {
        let words = self.words.lock().await;
        let counts = self.counts.lock().await;

        let mut rows: Vec<WordCount> = counts
            .iter()
            .filter(|((b, _), _)| *b == book_id)
            .filter_map(|((_, word_id), count)| {
                words.iter().find(|w| w.id == *word_id).map(|w| WordCount {
                    word: w.clone(),
                    count: *count,
                })
            })
            .filter(|row| query.difficulty.map_or(true, |d| row.word.difficulty == Some(d)))
            .filter(|row| query.min_count.map_or(true, |min| row.count >= min))
            .filter(|row| query.max_count.map_or(true, |max| row.count <= max))
            .collect();

        rows.sort_by(|a, b| {
            let by_count = match query.sort {
                SortOrder::Asc => a.count.cmp(&b.count),
                SortOrder::Desc => b.count.cmp(&a.count),
            };
            by_count.then(a.word.id.cmp(&b.word.id))
        });

        Ok(rows
            .into_iter()
            .skip(query.offset as usize)
            .take(query.limit as usize)
            .collect())
    }

    async fn counts_for_book(&self, book_id: Uuid) -> PortResult<HashMap<i32, i32>> {
        Ok(self
            .counts
            .lock()
            .await
            .iter()
            .filter(|((b, _), _)| *b == book_id)
            .map(|((_, w), c)| (*w, *c))
            .collect())
    }
}

pub struct FailingBlobs;

#[async_trait]
impl BlobStore for FailingBlobs {
    async fn put(&self, _key: &str, _data: Bytes, _ct: Option<&str>) -> PortResult<StoredObject> {
        Err(PortError::Unexpected("storage quota exceeded".to_string()))
    }
}

#[derive(Default)]
pub struct RecordingEnqueuer {
    pub fail: bool,
    pub jobs: Mutex<Vec<(Uuid, String)>>,
}

#[async_trait]
impl JobEnqueuer for RecordingEnqueuer {
    async fn enqueue(&self, book_id: Uuid, stored_key: &str) -> PortResult<()> {
        self.jobs.lock().await.push((book_id, stored_key.to_string()));
        if self.fail {
            return Err(PortError::Unexpected("enqueue request returned status 503".to_string()));
        }
        Ok(())
    }
}

//=========================================================================================
// Test application
//=========================================================================================

pub struct TestApp {
    pub router: Router,
    pub books: Arc<MemoryBooks>,
    pub word_frequencies: Arc<MemoryWordFrequencies>,
    pub objects: Arc<InMemory>,
    pub jobs: Arc<RecordingEnqueuer>,
}

pub fn test_config() -> Config {
    Config::from_lookup(|key| match key {
        "DATABASE_URL" => Some("postgres://localhost/palabra_test".to_string()),
        _ => None,
    })
    .expect("test config")
}

pub fn test_app() -> TestApp {
    build_app(false, false)
}

pub fn build_app(fail_blob: bool, fail_enqueue: bool) -> TestApp {
    let books = Arc::new(MemoryBooks::default());
    let word_frequencies = Arc::new(MemoryWordFrequencies::default());
    let objects = Arc::new(InMemory::new());
    let jobs = Arc::new(RecordingEnqueuer {
        fail: fail_enqueue,
        ..Default::default()
    });

    let blobs: Arc<dyn BlobStore> = if fail_blob {
        Arc::new(FailingBlobs)
    } else {
        Arc::new(ObjectStoreAdapter::new(objects.clone()))
    };

    let app_state = Arc::new(AppState {
        books: books.clone(),
        word_frequencies: word_frequencies.clone(),
        uploads: UploadCoordinator::new(blobs, books.clone(), jobs.clone()),
        config: Arc::new(test_config()),
    });

    TestApp {
        router: web::router(app_state),
        books,
        word_frequencies,
        objects,
        jobs,
    }
}

//=========================================================================================
// Request helpers
//=========================================================================================

const BOUNDARY: &str = "palabra-test-boundary";

/// Builds a multipart upload from text fields and an optional
/// `(filename, content_type, bytes)` file part.
pub fn upload_request(fields: &[(&str, &str)], file: Option<(&str, &str, &[u8])>) -> Request<Body> {
    let mut body: Vec<u8> = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
    }
    if let Some((filename, content_type, data)) = file {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                BOUNDARY, filename, content_type
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method("POST")
        .uri("/api/books/upload")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

pub fn get(path: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(path)
        .body(Body::empty())
        .unwrap()
}

pub async fn body_bytes(response: axum::response::Response) -> Bytes {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
}

pub async fn body_json(response: axum::response::Response) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
