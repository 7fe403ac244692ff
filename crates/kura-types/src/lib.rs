//! Pure data types for kura: persisted records, output shapes, error codes.
//!
//! This crate is a leaf dependency with no async runtime and no I/O. It exists
//! so that consumers (UIs, tooling, import/export scripts) can read and write
//! kura's records without pulling in the engine.

pub mod error;
pub mod output;
pub mod record;

// Flat re-exports for convenience
pub use error::*;
pub use output::*;
pub use record::*;

/// Milliseconds since the Unix epoch. Every timestamp kura stores uses this.
pub type Timestamp = i64;

/// MIME type assigned to text files and to files without an explicit type.
pub const DEFAULT_MIME: &str = "text/plain";

/// MIME type for binary content that matches no known signature.
pub const OCTET_STREAM: &str = "application/octet-stream";
