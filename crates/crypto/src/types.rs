//! Zeroizing cryptographic key types
//!
//! This module provides secure wrappers for cryptographic key material that
//! automatically clear memory on drop to prevent key leakage.

use crate::random::RandomSource;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Size of every symmetric key handled by the engine (AES-256, HMAC-SHA256)
pub const KEY_SIZE: usize = 32;

/// Size of an AES-GCM nonce
pub const NONCE_SIZE: usize = 12;

macro_rules! symmetric_key {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Zeroize, ZeroizeOnDrop)]
        pub struct $name(pub(crate) [u8; KEY_SIZE]);

        impl $name {
            /// Create a key from a 32-byte slice
            pub fn from_slice(bytes: &[u8]) -> Result<Self, KeyError> {
                if bytes.len() != KEY_SIZE {
                    return Err(KeyError::InvalidLength {
                        expected: KEY_SIZE,
                        got: bytes.len(),
                    });
                }
                let mut key = [0u8; KEY_SIZE];
                key.copy_from_slice(bytes);
                Ok($name(key))
            }

            /// Generate a fresh key from the given random source
            pub fn generate(rng: &dyn RandomSource) -> Self {
                let mut key = [0u8; KEY_SIZE];
                rng.fill(&mut key);
                $name(key)
            }

            /// Get a reference to the key bytes
            pub fn as_slice(&self) -> &[u8] {
                &self.0
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(concat!(stringify!($name), "([REDACTED])"))
            }
        }
    };
}

symmetric_key!(
    /// Data encryption key (DEK) protecting one container's payload
    PayloadKey
);

symmetric_key!(
    /// Key used to bind a policy to a wrapped payload key
    BindingKey
);

symmetric_key!(
    /// Local AES-256 key-encryption key for the `A256GCMKW` wrap scheme
    LocalWrapKey
);

/// 96-bit nonce (12 bytes) that zeroizes on drop
#[derive(Clone, Zeroize, ZeroizeOnDrop, Default, PartialEq, Eq)]
pub struct Nonce96(pub(crate) [u8; NONCE_SIZE]);

impl Nonce96 {
    /// Create a new nonce from a 12-byte slice
    pub fn from_slice(bytes: &[u8]) -> Result<Self, KeyError> {
        if bytes.len() != NONCE_SIZE {
            return Err(KeyError::InvalidLength {
                expected: NONCE_SIZE,
                got: bytes.len(),
            });
        }
        let mut nonce = [0u8; NONCE_SIZE];
        nonce.copy_from_slice(bytes);
        Ok(Nonce96(nonce))
    }

    /// Get a reference to the nonce bytes
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    /// Get a mutable reference to the nonce bytes
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.0
    }
}

impl std::fmt::Debug for Nonce96 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Nonce96({:02x?})", self.0)
    }
}

/// Key-related errors
#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    #[error("Invalid key length: expected {expected}, got {got}")]
    InvalidLength { expected: usize, got: usize },
}
