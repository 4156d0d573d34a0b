// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! AES-128-CBC codec shared with the browser clients.
//!
//! ## Wire Format
//!
//! Ciphertext is the standard (padded) base64 encoding of the raw CBC output.
//! Key and IV are fixed per process, so encryption is deterministic: the same
//! plaintext always produces the same ciphertext. The clients depend on this
//! format; it is not a confidentiality guarantee against an observer who can
//! compare messages.

use aes::Aes128;
use base64::{engine::general_purpose::STANDARD, Engine};
use cbc::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};

type Aes128CbcEnc = cbc::Encryptor<Aes128>;
type Aes128CbcDec = cbc::Decryptor<Aes128>;

/// Key and IV size in bytes (AES-128, one block IV).
pub const KEY_LEN: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CipherError {
    #[error("cipher key must be 16 bytes, got {0}")]
    InvalidKeyLength(usize),

    #[error("cipher IV must be 16 bytes, got {0}")]
    InvalidIvLength(usize),

    #[error("ciphertext is not valid base64")]
    Encoding,

    #[error("ciphertext has invalid length or padding")]
    Padding,

    #[error("decrypted plaintext is not valid UTF-8")]
    Utf8,
}

/// Symmetric codec with a fixed key and IV.
#[derive(Clone)]
pub struct SymmetricCipher {
    key: [u8; KEY_LEN],
    iv: [u8; KEY_LEN],
}

impl std::fmt::Debug for SymmetricCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SymmetricCipher").finish_non_exhaustive()
    }
}

impl SymmetricCipher {
    /// Build a codec from raw key and IV bytes. Both must be exactly 16 bytes.
    pub fn new(key: &[u8], iv: &[u8]) -> Result<Self, CipherError> {
        let key: [u8; KEY_LEN] = key
            .try_into()
            .map_err(|_| CipherError::InvalidKeyLength(key.len()))?;
        let iv: [u8; KEY_LEN] = iv
            .try_into()
            .map_err(|_| CipherError::InvalidIvLength(iv.len()))?;
        Ok(Self { key, iv })
    }

    /// Encrypt a UTF-8 string and return base64 ciphertext.
    pub fn encrypt(&self, plaintext: &str) -> String {
        let ciphertext = Aes128CbcEnc::new(&self.key.into(), &self.iv.into())
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes());
        STANDARD.encode(ciphertext)
    }

    /// Decrypt base64 ciphertext back into a UTF-8 string.
    pub fn decrypt(&self, ciphertext: &str) -> Result<String, CipherError> {
        let raw = STANDARD
            .decode(ciphertext.trim())
            .map_err(|_| CipherError::Encoding)?;

        let plaintext = Aes128CbcDec::new(&self.key.into(), &self.iv.into())
            .decrypt_padded_vec_mut::<Pkcs7>(&raw)
            .map_err(|_| CipherError::Padding)?;

        String::from_utf8(plaintext).map_err(|_| CipherError::Utf8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cipher() -> SymmetricCipher {
        SymmetricCipher::new(b"1234567890123456", b"1234567890123456").unwrap()
    }

    #[test]
    fn round_trips_utf8_strings() {
        let cipher = cipher();
        let long = "x".repeat(4097);
        for input in [
            "",
            "a",
            "exactly 16 bytes",
            r#"{"email":"ops@example.com","password":"p@ss"}"#,
            "naïve café – ₹ 1,000 – 日本語 – 🚀",
            long.as_str(),
        ] {
            let encrypted = cipher.encrypt(input);
            assert_eq!(cipher.decrypt(&encrypted).unwrap(), input);
        }
    }

    #[test]
    fn encryption_is_deterministic() {
        let cipher = cipher();
        assert_eq!(cipher.encrypt("same input"), cipher.encrypt("same input"));
        assert_ne!(cipher.encrypt("same input"), cipher.encrypt("other input"));
    }

    #[test]
    fn ciphertext_is_block_aligned_base64() {
        let raw = STANDARD.decode(cipher().encrypt("hello")).unwrap();
        assert_eq!(raw.len(), 16);

        // PKCS7 always adds a full block when the input is already aligned.
        let raw = STANDARD.decode(cipher().encrypt("exactly 16 bytes")).unwrap();
        assert_eq!(raw.len(), 32);
    }

    #[test]
    fn empty_plaintext_is_distinct_from_failure() {
        let cipher = cipher();
        let encrypted = cipher.encrypt("");
        assert_eq!(cipher.decrypt(&encrypted), Ok(String::new()));
        assert_eq!(cipher.decrypt(""), Err(CipherError::Padding));
    }

    #[test]
    fn rejects_non_base64_input() {
        assert_eq!(cipher().decrypt("not base64 at all!"), Err(CipherError::Encoding));
    }

    #[test]
    fn rejects_unaligned_ciphertext() {
        let short = STANDARD.encode([0u8; 10]);
        assert_eq!(cipher().decrypt(&short), Err(CipherError::Padding));
    }

    #[test]
    fn wrong_key_does_not_yield_the_plaintext() {
        let encrypted = cipher().encrypt(r#"{"secret":true}"#);
        let other = SymmetricCipher::new(b"6543210987654321", b"1234567890123456").unwrap();
        assert_ne!(other.decrypt(&encrypted).ok().as_deref(), Some(r#"{"secret":true}"#));
    }

    #[test]
    fn rejects_wrong_key_and_iv_sizes() {
        assert_eq!(
            SymmetricCipher::new(b"short", b"1234567890123456").unwrap_err(),
            CipherError::InvalidKeyLength(5)
        );
        assert_eq!(
            SymmetricCipher::new(b"1234567890123456", &[0u8; 32]).unwrap_err(),
            CipherError::InvalidIvLength(32)
        );
    }
}
