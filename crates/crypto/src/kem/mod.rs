//! Key Encapsulation Mechanisms (KEM)
//!
//! This module provides abstractions for wrapping and unwrapping the
//! payload key, with RSA-OAEP for recipient public keys and AES-256-GCM for
//! a locally held wrapping key.

use crate::random::RandomSource;
use thiserror::Error;
use zeroize::Zeroizing;

pub mod aes;
pub mod rsa;

/// KEM-related errors
#[derive(Debug, Error)]
pub enum KemError {
    #[error("Key wrapping failed: {0}")]
    WrapError(String),

    #[error("Key unwrapping failed")]
    UnwrapError,

    #[error("Invalid key format: {0}")]
    InvalidKey(String),

    #[error("Key size too small: {bits} bits (minimum {min})")]
    KeyTooSmall { bits: usize, min: usize },

    #[error("Encoding error: {0}")]
    EncodingError(String),
}

/// Trait for key encapsulation mechanisms
pub trait KeyEncapsulation {
    /// Key used to wrap
    type PublicKey;

    /// Key used to unwrap
    type PrivateKey;

    /// Wrap a symmetric key with a public key
    fn wrap(
        &self,
        key: &[u8],
        public_key: &Self::PublicKey,
        rng: &dyn RandomSource,
    ) -> Result<Vec<u8>, KemError>;

    /// Unwrap a symmetric key with a private key
    fn unwrap(
        &self,
        wrapped: &[u8],
        private_key: &Self::PrivateKey,
    ) -> Result<Zeroizing<Vec<u8>>, KemError>;
}
