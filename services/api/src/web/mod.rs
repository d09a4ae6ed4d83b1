pub mod rest;
pub mod state;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

pub use rest::{
    api_root, get_book_handler, get_book_words_handler, home, list_books_handler,
    upload_book_handler,
};
pub use state::AppState;

/// Builds the application routes. Method mismatches are answered with 405 and
/// an `Allow` header by the router itself.
pub fn router(app_state: Arc<AppState>) -> Router {
    let max_upload_bytes = app_state.config.max_upload_bytes;

    Router::new()
        .route("/", get(home))
        .route("/api", get(api_root))
        .route("/api/books", get(list_books_handler))
        .route("/api/books/upload", post(upload_book_handler))
        .route("/api/books/{id}", get(get_book_handler))
        .route("/api/books/{id}/words", get(get_book_words_handler))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(app_state)
}
