//! Cryptographic helper functions
//!
//! Common utilities for cipher initialization and nonce generation.

use crate::random::RandomSource;
use crate::types::{Nonce96, NONCE_SIZE};
use aes_gcm::{Aes256Gcm, KeyInit};
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Invalid key length")]
    InvalidKeyLength,

    #[error("Encryption failed")]
    EncryptionFailed,

    #[error("Authentication failed")]
    AuthenticationFailure,

    #[error("Integrity check failed")]
    IntegrityFailure,

    #[error("Segment size must be greater than zero")]
    InvalidSegmentSize,

    #[error("Segment too small: {len} bytes (minimum {min})")]
    SegmentTooShort { len: usize, min: usize },

    #[error("HMAC error: {0}")]
    Hmac(#[from] crate::hmac::HmacError),
}

/// Create an AES-256-GCM cipher from a key
pub fn create_aes_cipher(key: &[u8]) -> Result<Aes256Gcm, CryptoError> {
    Aes256Gcm::new_from_slice(key).map_err(|_| CryptoError::InvalidKeyLength)
}

/// Generate a random 96-bit nonce for AES-GCM
pub fn generate_nonce(rng: &dyn RandomSource) -> Nonce96 {
    let mut nonce = Nonce96::default();
    rng.fill(nonce.as_mut_slice());
    nonce
}

/// Tracks every nonce issued under a single key
///
/// A repeated nonce under one AES-GCM key destroys both confidentiality and
/// authenticity, so a repeat is treated as a broken precondition and panics.
#[derive(Debug, Default)]
pub struct NonceLedger {
    issued: HashSet<[u8; NONCE_SIZE]>,
}

impl NonceLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draw a fresh nonce and record it
    ///
    /// # Panics
    ///
    /// Panics if the random source returns a nonce already issued by this ledger.
    pub fn issue(&mut self, rng: &dyn RandomSource) -> Nonce96 {
        let nonce = generate_nonce(rng);
        self.record(&nonce);
        nonce
    }

    /// Record an externally produced nonce
    ///
    /// # Panics
    ///
    /// Panics if the nonce was already recorded.
    pub fn record(&mut self, nonce: &Nonce96) {
        let mut bytes = [0u8; NONCE_SIZE];
        bytes.copy_from_slice(nonce.as_slice());
        assert!(
            self.issued.insert(bytes),
            "AES-GCM nonce reused under a single key"
        );
    }

    /// Number of nonces issued so far
    pub fn len(&self) -> usize {
        self.issued.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issued.is_empty()
    }
}
