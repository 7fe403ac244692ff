//! File content as callers supply it, and MIME sniffing for binary data.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use kura_types::{DEFAULT_MIME, OCTET_STREAM, VfsError, VfsResult};

/// Magic-byte prefixes, checked in order.
const SIGNATURES: &[(&[u8], &str)] = &[
    (b"\xFF\xD8\xFF", "image/jpeg"),
    (b"\x89PNG\r\n\x1A\n", "image/png"),
    (b"GIF87a", "image/gif"),
    (b"GIF89a", "image/gif"),
    (b"%PDF-", "application/pdf"),
    (b"PK\x03\x04", "application/zip"),
];

/// Guess a MIME type from leading bytes.
///
/// WEBP needs the full 12-byte RIFF header (`RIFF....WEBP`); a bare `RIFF`
/// prefix could be WAV or AVI.
pub fn sniff_mime(bytes: &[u8]) -> &'static str {
    if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        return "image/webp";
    }
    SIGNATURES
        .iter()
        .find(|(magic, _)| bytes.starts_with(magic))
        .map(|(_, mime)| *mime)
        .unwrap_or(OCTET_STREAM)
}

/// Content handed to a write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileContent {
    Text(String),
    Binary(Vec<u8>),
}

impl FileContent {
    pub fn is_binary(&self) -> bool {
        matches!(self, FileContent::Binary(_))
    }

    pub fn mime(&self) -> &'static str {
        match self {
            FileContent::Text(_) => DEFAULT_MIME,
            FileContent::Binary(bytes) => sniff_mime(bytes),
        }
    }

    /// The string stored in `VfsFile.content`: text as-is, bytes as base64.
    pub fn encode(&self) -> String {
        match self {
            FileContent::Text(text) => text.clone(),
            FileContent::Binary(bytes) => STANDARD.encode(bytes),
        }
    }
}

impl From<&str> for FileContent {
    fn from(text: &str) -> Self {
        FileContent::Text(text.to_string())
    }
}

impl From<String> for FileContent {
    fn from(text: String) -> Self {
        FileContent::Text(text)
    }
}

impl From<Vec<u8>> for FileContent {
    fn from(bytes: Vec<u8>) -> Self {
        FileContent::Binary(bytes)
    }
}

impl From<&[u8]> for FileContent {
    fn from(bytes: &[u8]) -> Self {
        FileContent::Binary(bytes.to_vec())
    }
}

/// Decode stored base64 content back into bytes.
pub fn decode_binary(content: &str) -> VfsResult<Vec<u8>> {
    STANDARD
        .decode(content.as_bytes())
        .map_err(|e| VfsError::storage(format!("binary content is not valid base64: {e}")))
}

/// Byte size of stored content without decoding it.
pub fn stored_size(content: &str, is_binary: bool) -> u64 {
    if !is_binary {
        return content.len() as u64;
    }
    let padding = content.bytes().rev().take_while(|b| *b == b'=').count();
    ((content.len() / 4) * 3).saturating_sub(padding) as u64
}
