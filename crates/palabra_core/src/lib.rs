pub mod domain;
pub mod ports;
pub mod query;
pub mod upload;

pub use domain::{Book, BookStatus, NewBook, NewWord, UploadReceipt, UploadRequest, Word, WordCount};
pub use ports::{
    BlobStore, BookStore, JobEnqueuer, PortError, PortResult, StoredObject, WordFrequencyStore,
    WordStore,
};
pub use query::{SortOrder, WordQuery};
pub use upload::{UploadCoordinator, UploadError};
