//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use palabra_core::ports::{BookStore, WordFrequencyStore};
use palabra_core::upload::UploadCoordinator;
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all handlers.
/// Holds only pooled, concurrency-safe clients; there is no per-process mutable state.
#[derive(Clone)]
pub struct AppState {
    pub books: Arc<dyn BookStore>,
    pub word_frequencies: Arc<dyn WordFrequencyStore>,
    pub uploads: UploadCoordinator,
    pub config: Arc<Config>,
}
