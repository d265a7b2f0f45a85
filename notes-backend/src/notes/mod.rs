//! Notes system: notes held in memory, mirrored into a local key-value cache
//! and, once a folder is picked, written as one JSON file per note.
//!
//! Edits are debounced per note; the store reconciles the three layers.

pub mod debounce;
pub mod error;
pub mod file_ops;
pub mod format;
pub mod local_cache;
pub mod store;
pub mod workspace;

pub use error::NoteError;
pub use local_cache::{FileKvStore, KeyValueStore, MemoryKvStore};
pub use store::NoteStore;
