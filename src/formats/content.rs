//! Content blocks - the encrypted payloads a TMD describes.
//!
//! Each block in the content area is AES-128-CBC encrypted with the title key
//! (see [`crate::crypto::title`]) and stored rounded up to 16 bytes. Blocks
//! follow one another in content-record order, each followed by zero padding
//! to the next 64-byte boundary.
//!
//! A [`Content`] starts out holding ciphertext exactly as read from the
//! package and becomes plaintext once [`Content::decrypt`] has verified it
//! against its record.

use crate::crypto::title::{decrypt_content, encrypt_content, sha1};
use crate::formats::tmd::ContentRecord;
use crate::{Error, Result};

/// What the bytes held by a [`Content`] currently are.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentState {
    /// Block-rounded ciphertext, as stored on disk.
    Encrypted,
    /// Plaintext, exactly `record.size` bytes after decryption.
    Decrypted,
}

/// A content record paired with its bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Content {
    pub record: ContentRecord,
    data: Vec<u8>,
    state: ContentState,
}

impl Content {
    /// Wrap ciphertext read from the content area.
    pub fn from_encrypted(record: ContentRecord, ciphertext: Vec<u8>) -> Self {
        Self {
            record,
            data: ciphertext,
            state: ContentState::Encrypted,
        }
    }

    /// Wrap plaintext. The record's size and hash are refreshed on the next
    /// [`Content::encrypt`] or package serialization.
    pub fn from_decrypted(record: ContentRecord, plaintext: Vec<u8>) -> Self {
        Self {
            record,
            data: plaintext,
            state: ContentState::Decrypted,
        }
    }

    pub fn state(&self) -> ContentState {
        self.state
    }

    /// The current bytes, ciphertext or plaintext depending on [`Content::state`].
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Replace the plaintext.
    pub fn set_data(&mut self, plaintext: Vec<u8>) {
        self.data = plaintext;
        self.state = ContentState::Decrypted;
    }

    /// Decrypt in place and check the result against the record's hash.
    ///
    /// Only the first `record.size` bytes are hashed and kept. On a hash
    /// mismatch the content is left encrypted and
    /// [`Error::ContentIntegrityMismatch`] names its content id. Does nothing
    /// if the content is already decrypted.
    pub fn decrypt(&mut self, title_key: &[u8; 16]) -> Result<()> {
        if self.state == ContentState::Decrypted {
            return Ok(());
        }
        self.data = self.verified_plaintext(title_key)?;
        self.state = ContentState::Decrypted;
        Ok(())
    }

    /// Encrypt in place, refreshing the record's size and hash from the
    /// plaintext first. Does nothing if the content is already encrypted.
    pub fn encrypt(&mut self, title_key: &[u8; 16]) -> Result<()> {
        if self.state == ContentState::Encrypted {
            return Ok(());
        }
        let (ciphertext, record) = self.encrypted(title_key)?;
        self.record = record;
        self.data = ciphertext;
        self.state = ContentState::Encrypted;
        Ok(())
    }

    /// Ciphertext and refreshed record for this content, leaving `self`
    /// untouched.
    ///
    /// Already-encrypted content is returned as-is with its current record.
    pub fn encrypted(&self, title_key: &[u8; 16]) -> Result<(Vec<u8>, ContentRecord)> {
        match self.state {
            ContentState::Encrypted => Ok((self.data.clone(), self.record.clone())),
            ContentState::Decrypted => {
                let ciphertext = encrypt_content(&self.data, title_key, self.record.index)?;
                let record = ContentRecord {
                    size: self.data.len() as u64,
                    hash: sha1(&self.data),
                    ..self.record.clone()
                };
                Ok((ciphertext, record))
            }
        }
    }

    /// Decrypt and verify without changing `self`.
    pub(crate) fn verified_plaintext(&self, title_key: &[u8; 16]) -> Result<Vec<u8>> {
        let size = usize::try_from(self.record.size)
            .map_err(|_| Error::Parse("content size does not fit in memory"))?;
        let plain = decrypt_content(&self.data, title_key, self.record.index, size)?;
        if sha1(&plain) != self.record.hash {
            return Err(Error::ContentIntegrityMismatch {
                content_id: self.record.content_id,
            });
        }
        tracing::trace!(
            content_id = self.record.content_id,
            index = self.record.index,
            size,
            "content hash verified"
        );
        Ok(plain)
    }
}
