// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Payload Encryption
//!
//! Every API response is encrypted with a process-wide AES key, and request
//! bodies may arrive encrypted, base64-encoded or as plain JSON.
//!
//! - `cipher` - the AES-128-CBC codec
//! - `payload` - the inbound fallback chain

pub mod cipher;
pub mod payload;

pub use cipher::{CipherError, SymmetricCipher};
pub use payload::{normalize, RawPayload};
