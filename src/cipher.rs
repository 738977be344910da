// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Content Encryption
//!
//! AES-256-GCM encryption of file contents using `ring`.
//!
//! ## Token Format
//!
//! ```text
//! base64( nonce[12] || ciphertext || tag[16] )
//! ```
//!
//! Every call to [`ContentCipher::encrypt`] draws a fresh random nonce, so the
//! same plaintext never produces the same token twice. The nonce travels inside
//! the token, so no separate nonce column is needed.
//!
//! ## Key Material
//!
//! The configured secret is taken as UTF-8 bytes and right-padded with zeros
//! (or truncated) to 32 bytes. The key is read-only after construction.

use base64ct::{Base64, Encoding};
use ring::aead::{Aad, LessSafeKey, Nonce, UnboundKey, AES_256_GCM, NONCE_LEN};
use ring::rand::{SecureRandom, SystemRandom};
use serde::{Deserialize, Serialize};

/// AES-256 key width in bytes.
pub const KEY_LEN: usize = 32;

/// GCM authentication tag width in bytes.
const TAG_LEN: usize = 16;

/// Errors from content encryption.
///
/// Decryption failures deliberately carry no detail about which check
/// failed.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CipherError {
    #[error("content encryption failed")]
    Encryption,

    #[error("content could not be decrypted")]
    Decryption,
}

pub type CipherResult<T> = Result<T, CipherError>;

/// Opaque encrypted token as persisted in file and version records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncryptedContent(String);

impl EncryptedContent {
    /// Wrap a token read from elsewhere. No validation happens until decrypt.
    pub fn from_token(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Authenticated symmetric cipher for file contents.
pub struct ContentCipher {
    key: LessSafeKey,
    rng: SystemRandom,
}

impl std::fmt::Debug for ContentCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentCipher").finish_non_exhaustive()
    }
}

impl ContentCipher {
    /// Build a cipher from a configured secret.
    pub fn from_secret(secret: &str) -> CipherResult<Self> {
        let key_bytes = derive_key(secret);
        let unbound =
            UnboundKey::new(&AES_256_GCM, &key_bytes).map_err(|_| CipherError::Encryption)?;
        Ok(Self {
            key: LessSafeKey::new(unbound),
            rng: SystemRandom::new(),
        })
    }

    /// Encrypt arbitrary bytes into a self-describing token.
    pub fn encrypt(&self, plaintext: &[u8]) -> CipherResult<EncryptedContent> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        self.rng
            .fill(&mut nonce_bytes)
            .map_err(|_| CipherError::Encryption)?;
        let nonce = Nonce::assume_unique_for_key(nonce_bytes);

        let mut in_out = plaintext.to_vec();
        self.key
            .seal_in_place_append_tag(nonce, Aad::empty(), &mut in_out)
            .map_err(|_| CipherError::Encryption)?;

        let mut combined = Vec::with_capacity(NONCE_LEN + in_out.len());
        combined.extend_from_slice(&nonce_bytes);
        combined.extend_from_slice(&in_out);

        Ok(EncryptedContent(Base64::encode_string(&combined)))
    }

    /// Encrypt a UTF-8 string.
    pub fn encrypt_str(&self, plaintext: &str) -> CipherResult<EncryptedContent> {
        self.encrypt(plaintext.as_bytes())
    }

    /// Decrypt a token back into bytes.
    ///
    /// Fails on malformed base64, truncated tokens, tampering, or a key
    /// mismatch.
    pub fn decrypt(&self, token: &EncryptedContent) -> CipherResult<Vec<u8>> {
        let data = Base64::decode_vec(token.as_str()).map_err(|_| CipherError::Decryption)?;
        if data.len() < NONCE_LEN + TAG_LEN {
            return Err(CipherError::Decryption);
        }

        let (nonce_bytes, sealed) = data.split_at(NONCE_LEN);
        let nonce =
            Nonce::try_assume_unique_for_key(nonce_bytes).map_err(|_| CipherError::Decryption)?;

        let mut in_out = sealed.to_vec();
        let plaintext_len = self
            .key
            .open_in_place(nonce, Aad::empty(), &mut in_out)
            .map_err(|_| CipherError::Decryption)?
            .len();
        in_out.truncate(plaintext_len);
        Ok(in_out)
    }

    /// Decrypt a token into a UTF-8 string.
    pub fn decrypt_to_string(&self, token: &EncryptedContent) -> CipherResult<String> {
        let bytes = self.decrypt(token)?;
        String::from_utf8(bytes).map_err(|_| CipherError::Decryption)
    }
}

/// Pad with zeros or truncate the secret to exactly [`KEY_LEN`] bytes.
fn derive_key(secret: &str) -> [u8; KEY_LEN] {
    let mut key = [0u8; KEY_LEN];
    let bytes = secret.as_bytes();
    let len = bytes.len().min(KEY_LEN);
    key[..len].copy_from_slice(&bytes[..len]);
    key
}
