//! TDF Engine Cryptographic Operations
//!
//! This crate provides the cryptographic building blocks of the TDF engine:
//! - Zeroizing key types that automatically clear memory
//! - Constant-time HMAC verification
//! - KEM abstractions for RSA-OAEP and local AES-256-GCM key wrapping
//! - Segment-based AES-256-GCM payload encryption
//! - Injectable randomness for reproducible output
//!
//! # Security Features
//!
//! - **Zeroization**: All key material uses `zeroize` to clear memory on drop
//! - **Constant-time comparison**: MAC verification uses `subtle::ConstantTimeEq`
//! - **Nonce discipline**: [`NonceLedger`] panics on nonce reuse under one key
//!
//! # Example
//!
//! ```
//! use tdf_engine_crypto::{decrypt_segment, encrypt_segments, PayloadKey, SegmentHashKind};
//! use tdf_engine_crypto::random::OsRandom;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let key = PayloadKey::generate(&OsRandom);
//! let segmented = encrypt_segments(&key, b"sensitive information", 8, SegmentHashKind::Hmac, &OsRandom)?;
//!
//! let first = &segmented.segments[0];
//! let stored = &segmented.payload[..first.length as usize];
//! let plaintext = decrypt_segment(&key, 0, stored)?;
//! assert_eq!(plaintext.as_slice(), b"sensitiv");
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

pub mod aead;
pub mod helpers;
pub mod hmac;
pub mod kem;
pub mod random;
pub mod segment;
pub mod types;

// Re-export commonly used types
pub use aead::{aead_decrypt, aead_encrypt, Sealed, GCM_IV_SIZE, GCM_TAG_SIZE};
pub use helpers::{create_aes_cipher, generate_nonce, CryptoError, NonceLedger};
pub use hmac::{
    calculate_hmac, calculate_policy_binding, calculate_root_signature, verify_policy_binding,
    verify_root_signature, HmacError, HMAC_SIZE,
};
pub use kem::aes::AesGcmKem;
pub use kem::rsa::{public_key_from_pem, OaepHash, RsaKeyPair, RsaOaepKem, MIN_RSA_BITS};
pub use kem::{KemError, KeyEncapsulation};
pub use random::{OsRandom, RandomSource, SeededRandom};
pub use segment::{
    decrypt_segment, encrypt_segments, verify_segment, SegmentHashKind, SegmentRecord,
    SegmentedPayload, SEGMENT_OVERHEAD,
};
pub use types::{BindingKey, KeyError, LocalWrapKey, Nonce96, PayloadKey, KEY_SIZE, NONCE_SIZE};

// Re-export the RSA backend for callers handling key material directly
pub use rsa;
