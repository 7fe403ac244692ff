//! The single error type for every VFS operation.
//!
//! Errors carry a machine-checkable [`ErrorCode`] plus a human-readable
//! message. Callers branch on the code; the message is for people.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for VFS operations.
pub type VfsResult<T> = Result<T, VfsError>;

/// Closed set of failure codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    PathNotFound,
    NotAFile,
    NotADirectory,
    IsDeleted,
    FileExists,
    DirExists,
    DirNotEmpty,
    DestinationExists,
    InvalidPath,
    StringNotFound,
    StringNotUnique,
    InvalidLine,
    BinaryFile,
    Readonly,
    /// Persistence backend, codec, or record decoding failed.
    Storage,
}

impl ErrorCode {
    /// The wire spelling of this code (e.g. `PATH_NOT_FOUND`).
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::PathNotFound => "PATH_NOT_FOUND",
            ErrorCode::NotAFile => "NOT_A_FILE",
            ErrorCode::NotADirectory => "NOT_A_DIRECTORY",
            ErrorCode::IsDeleted => "IS_DELETED",
            ErrorCode::FileExists => "FILE_EXISTS",
            ErrorCode::DirExists => "DIR_EXISTS",
            ErrorCode::DirNotEmpty => "DIR_NOT_EMPTY",
            ErrorCode::DestinationExists => "DESTINATION_EXISTS",
            ErrorCode::InvalidPath => "INVALID_PATH",
            ErrorCode::StringNotFound => "STRING_NOT_FOUND",
            ErrorCode::StringNotUnique => "STRING_NOT_UNIQUE",
            ErrorCode::InvalidLine => "INVALID_LINE",
            ErrorCode::BinaryFile => "BINARY_FILE",
            ErrorCode::Readonly => "READONLY",
            ErrorCode::Storage => "STORAGE",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed VFS operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code}: {message}")]
pub struct VfsError {
    pub code: ErrorCode,
    pub message: String,
}

impl VfsError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(path: &str) -> Self {
        Self::new(ErrorCode::PathNotFound, format!("no such file or directory: {path}"))
    }

    pub fn not_a_file(path: &str) -> Self {
        Self::new(ErrorCode::NotAFile, format!("not a file: {path}"))
    }

    pub fn not_a_directory(path: &str) -> Self {
        Self::new(ErrorCode::NotADirectory, format!("not a directory: {path}"))
    }

    pub fn is_deleted(path: &str) -> Self {
        Self::new(ErrorCode::IsDeleted, format!("deleted: {path}"))
    }

    pub fn file_exists(path: &str) -> Self {
        Self::new(ErrorCode::FileExists, format!("file exists: {path}"))
    }

    pub fn dir_exists(path: &str) -> Self {
        Self::new(ErrorCode::DirExists, format!("directory exists: {path}"))
    }

    pub fn invalid_path(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidPath, message)
    }

    pub fn readonly(path: &str) -> Self {
        Self::new(ErrorCode::Readonly, format!("read-only path: {path}"))
    }

    pub fn binary_file(path: &str) -> Self {
        Self::new(
            ErrorCode::BinaryFile,
            format!("cannot edit binary file as text: {path}"),
        )
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Storage, message)
    }

    /// Returns true if this error carries the given code.
    pub fn is(&self, code: ErrorCode) -> bool {
        self.code == code
    }
}

impl From<serde_json::Error> for VfsError {
    fn from(err: serde_json::Error) -> Self {
        VfsError::storage(format!("record decode failed: {err}"))
    }
}
