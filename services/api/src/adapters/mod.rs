pub mod blob;
pub mod db;
pub mod enqueue;

pub use blob::ObjectStoreAdapter;
pub use db::DbAdapter;
pub use enqueue::HttpJobEnqueuer;
