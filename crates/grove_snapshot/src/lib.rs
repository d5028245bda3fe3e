//! Vault file access for grove.
//!
//! [`FileStore`] is the only way the engine touches documents on disk.
//! [`RawSnapshot`] captures the raw text of every document once, up front,
//! so that every later phase sees the same immutable vault.

pub mod fs_store;
pub mod memory;
pub mod snapshot;
pub mod store;

pub use fs_store::FsStore;
pub use memory::MemoryStore;
pub use snapshot::{sha256_hex, RawFile, RawSnapshot, ReadFailure};
pub use store::{normalize_rel_path, FileStore};
