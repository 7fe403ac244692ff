//! Blob transform applied to every persisted JSON payload.
//!
//! Encryption and compression live outside the engine. Whatever codec is
//! installed sees plaintext JSON on the way in and hands back plaintext JSON
//! on the way out; the engine never inspects the blob format.

use async_trait::async_trait;

use kura_types::{VfsError, VfsResult};

/// Encrypt/compress on save, decrypt/decompress on load.
#[async_trait]
pub trait BlobCodec: Send + Sync {
    async fn encrypt_and_compress(&self, plaintext: &str) -> VfsResult<Vec<u8>>;

    async fn decrypt_and_decompress(&self, blob: &[u8]) -> VfsResult<String>;
}

/// UTF-8 passthrough. Stores plaintext JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainCodec;

#[async_trait]
impl BlobCodec for PlainCodec {
    async fn encrypt_and_compress(&self, plaintext: &str) -> VfsResult<Vec<u8>> {
        Ok(plaintext.as_bytes().to_vec())
    }

    async fn decrypt_and_decompress(&self, blob: &[u8]) -> VfsResult<String> {
        String::from_utf8(blob.to_vec())
            .map_err(|e| VfsError::storage(format!("blob is not valid UTF-8: {e}")))
    }
}
