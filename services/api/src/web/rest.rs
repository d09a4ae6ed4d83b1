//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use crate::{error::ApiError, web::state::AppState};
use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use palabra_core::{
    domain::{Book, UploadRequest, WordCount},
    ports::DEFAULT_RECENT_BOOKS,
    query::{RawWordQuery, WordQuery},
};
use serde::Serialize;
use std::sync::Arc;
use utoipa::{IntoParams, OpenApi, ToSchema};
use uuid::Uuid;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        list_books_handler,
        upload_book_handler,
        get_book_handler,
        get_book_words_handler,
    ),
    components(
        schemas(BookResponse, BookListResponse, UploadResponse, WordCountResponse)
    ),
    tags(
        (name = "Palabra API", description = "Book upload and word-frequency endpoints.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

/// A book and its processing status.
#[derive(Serialize, ToSchema)]
pub struct BookResponse {
    id: Uuid,
    title: String,
    filename: String,
    original_filename: String,
    language: String,
    #[serde(rename = "userId")]
    user_id: Option<i32>,
    status: String,
    created: DateTime<Utc>,
    processed: Option<DateTime<Utc>>,
}

impl From<Book> for BookResponse {
    fn from(book: Book) -> Self {
        Self {
            id: book.id,
            title: book.title,
            filename: book.filename,
            original_filename: book.original_filename,
            language: book.language,
            user_id: book.user_id,
            status: book.status.to_string(),
            created: book.created,
            processed: book.processed,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct BookListResponse {
    books: Vec<BookResponse>,
}

/// The response payload sent after a successful upload.
#[derive(Serialize, ToSchema)]
pub struct UploadResponse {
    status: String,
    id: Uuid,
    /// The key the document was stored under.
    filename: String,
    original_filename: String,
}

/// One word of a book with its occurrence count.
#[derive(Serialize, ToSchema)]
pub struct WordCountResponse {
    id: i32,
    word: String,
    language: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    difficulty: Option<i32>,
    #[serde(rename = "zipfScore", skip_serializing_if = "Option::is_none")]
    zipf_score: Option<f64>,
    created: DateTime<Utc>,
    count: i32,
}

impl From<WordCount> for WordCountResponse {
    fn from(row: WordCount) -> Self {
        Self {
            id: row.word.id,
            word: row.word.word,
            language: row.word.language,
            difficulty: row.word.difficulty,
            zipf_score: row.word.zipf_score,
            created: row.word.created,
            count: row.count,
        }
    }
}

/// Query-string options for the book words endpoint. Values that do not parse
/// are ignored rather than rejected, and a repeated key keeps its first value.
#[derive(Debug, Default, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct WordsParams {
    /// `asc` or `desc` on occurrence count (default `desc`).
    sort: Option<String>,
    /// Exact difficulty tier.
    difficulty: Option<String>,
    /// Inclusive lower bound on count.
    min_count: Option<String>,
    /// Inclusive upper bound on count.
    max_count: Option<String>,
    /// Page size (default 50).
    limit: Option<String>,
    /// Rows to skip (default 0).
    offset: Option<String>,
}

impl WordsParams {
    /// Collects recognised keys from decoded query pairs. Unknown keys are
    /// skipped.
    pub fn from_pairs(pairs: &[(String, String)]) -> Self {
        let mut params = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "sort" => &mut params.sort,
                "difficulty" => &mut params.difficulty,
                "min_count" => &mut params.min_count,
                "max_count" => &mut params.max_count,
                "limit" => &mut params.limit,
                "offset" => &mut params.offset,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.clone());
            }
        }
        params
    }

    fn resolve(&self) -> WordQuery {
        WordQuery::resolve(RawWordQuery {
            sort: self.sort.as_deref(),
            difficulty: self.difficulty.as_deref(),
            min_count: self.min_count.as_deref(),
            max_count: self.max_count.as_deref(),
            limit: self.limit.as_deref(),
            offset: self.offset.as_deref(),
        })
    }
}

fn parse_book_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::ClientInput("Invalid Book ID".to_string()))
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

pub async fn home() -> &'static str {
    "Palabra API Service"
}

pub async fn api_root() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "service": "Palabra API",
        "version": "v1",
        "endpoints": {
            "books": "/api/books",
            "upload": "/api/books/upload"
        }
    }))
}

/// List the most recently uploaded books.
#[utoipa::path(
    get,
    path = "/api/books",
    responses(
        (status = 200, description = "Recent books, newest first", body = BookListResponse),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn list_books_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<BookListResponse>, ApiError> {
    let books = app_state.books.list_recent(DEFAULT_RECENT_BOOKS).await?;
    Ok(Json(BookListResponse {
        books: books.into_iter().map(BookResponse::from).collect(),
    }))
}

/// Upload a document for analysis.
///
/// Accepts a multipart/form-data request with a `file` part, a `language`
/// field and an optional numeric `user_id` field.
#[utoipa::path(
    post,
    path = "/api/books/upload",
    request_body(content_type = "multipart/form-data", description = "The document to upload."),
    responses(
        (status = 201, description = "Book stored and queued", body = UploadResponse),
        (status = 400, description = "Bad request (e.g., missing file or language)"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn upload_book_handler(
    State(app_state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let malformed = |e: axum::extract::multipart::MultipartError| {
        ApiError::ClientInput(format!("Failed to read multipart data: {}", e))
    };

    let mut file: Option<(String, Option<String>, Bytes)> = None;
    let mut language: Option<String> = None;
    let mut user_id_raw: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(malformed)? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let file_name = field.file_name().unwrap_or("untitled.txt").to_string();
                let content_type = field.content_type().map(str::to_string);
                let data = field.bytes().await.map_err(malformed)?;
                file = Some((file_name, content_type, data));
            }
            Some("language") => language = Some(field.text().await.map_err(malformed)?),
            Some("user_id") => user_id_raw = Some(field.text().await.map_err(malformed)?),
            _ => {}
        }
    }

    let (original_filename, content_type, data) = file
        .ok_or_else(|| ApiError::ClientInput("Multipart form must include a file".to_string()))?;

    let language = language
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .ok_or_else(|| ApiError::ClientInput("language is required".to_string()))?;

    let user_id = match user_id_raw.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(
            raw.parse::<i32>()
                .map_err(|_| ApiError::ClientInput("Invalid user_id format".to_string()))?,
        ),
    };

    let receipt = app_state
        .uploads
        .upload(UploadRequest {
            original_filename,
            content_type,
            language,
            user_id,
            data,
        })
        .await?;

    let response = UploadResponse {
        status: "uploaded".to_string(),
        id: receipt.id,
        filename: receipt.stored_key,
        original_filename: receipt.original_filename,
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// Fetch a single book.
#[utoipa::path(
    get,
    path = "/api/books/{id}",
    params(
        ("id" = Uuid, Path, description = "The book identity.")
    ),
    responses(
        (status = 200, description = "The book", body = BookResponse),
        (status = 400, description = "Malformed book id"),
        (status = 404, description = "Unknown book"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn get_book_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<BookResponse>, ApiError> {
    let book_id = parse_book_id(&id)?;
    let book = app_state.books.get_by_id(book_id).await?;
    Ok(Json(BookResponse::from(book)))
}

/// Word frequencies for a book, filtered, sorted and paginated.
#[utoipa::path(
    get,
    path = "/api/books/{id}/words",
    params(
        ("id" = Uuid, Path, description = "The book identity."),
        WordsParams
    ),
    responses(
        (status = 200, description = "Matching words; empty when the book has none", body = [WordCountResponse]),
        (status = 400, description = "Malformed book id"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn get_book_words_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<Vec<WordCountResponse>>, ApiError> {
    let book_id = parse_book_id(&id)?;
    let query = WordsParams::from_pairs(&pairs).resolve();
    let rows = app_state
        .word_frequencies
        .book_words(book_id, &query)
        .await?;
    Ok(Json(rows.into_iter().map(WordCountResponse::from).collect()))
}
