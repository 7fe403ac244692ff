//! kura-kernel (蔵): the engine of kura.
//!
//! This crate provides:
//!
//! - **Paths**: normalization and namespace resolution (`paths`)
//! - **Storage**: the key/value capability the engine persists through, with
//!   in-memory and directory-backed implementations (`storage`)
//! - **Codec**: the transform applied to every persisted payload (`codec`)
//! - **Tree**: the arena form of a project's directory tree (`tree`)
//! - **Store**: tree, file, and version records over storage (`store`)
//! - **Locks**: per-project FIFO serialization (`lock`)
//! - **Operations**: the filesystem itself, on [`Project`] handles (`vfs`,
//!   `orphans`)
//!
//! ```no_run
//! # async fn demo() -> kura_kernel::VfsResult<()> {
//! let vfs = kura_kernel::Vfs::in_memory();
//! let project = vfs.project("demo");
//! project.create_file("/notes/todo.md", "- write docs").await?;
//! let read = project.read_file("/notes/todo.md").await?;
//! assert_eq!(read.content, "- write docs");
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod config;
pub mod content;
pub mod edit;
pub mod lock;
mod orphans;
pub mod paths;
pub mod storage;
pub mod store;
pub mod tree;
pub mod vfs;

pub use codec::{BlobCodec, PlainCodec};
pub use config::{DEFAULT_KEEP_COUNT, VfsConfig};
pub use content::FileContent;
pub use lock::TreeLocks;
pub use storage::{LocalStorage, MemoryStorage, RecordMeta, Storage, StorageError, StoredRecord};
pub use vfs::{Project, Vfs};

// Re-export the data types so callers need only one dependency.
pub use kura_types::*;
