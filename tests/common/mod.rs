//! Common test utilities for tdf-engine integration tests
//!
//! This module provides shared helper functions to reduce code duplication
//! across integration test files.

#![allow(dead_code)]

use lazy_static::lazy_static;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};
use tracing_subscriber::EnvFilter;

// Re-export commonly used types
pub use tdf_engine::prelude::*;
pub use tdf_engine::AuthorityError;
pub use tdf_engine_crypto::PayloadKey;

/// Test data for encryption/decryption
pub const TEST_PLAINTEXT: &str = "Hello, TDF! This is test data for encryption.";

/// Fixed policy identifier so containers are reproducible
pub const POLICY_ID: &str = "3f2b8c1e-5d4a-4e7b-9c6f-1a2b3c4d5e6f";

lazy_static! {
    /// RSA key generation is slow, so one authority key serves every test
    pub static ref AUTHORITY_KEYPAIR: RsaKeyPair =
        RsaKeyPair::generate(2048, &SeededRandom::new(0xC0FFEE)).expect("RSA key generation");
}

static TRACING: Once = Once::new();

/// Install a test-writer subscriber; filter with `RUST_LOG`
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// `{clearance: "public"}` with a fixed id
pub fn public_policy() -> Policy {
    PolicyBuilder::new()
        .id(POLICY_ID)
        .attribute("clearance", "public")
        .build()
        .expect("valid policy")
}

/// Engine wrapping to a local AES key, with every random draw seeded
pub fn local_engine(seed: u64, segment_size: usize) -> TdfEngine {
    let keys = SeededRandom::new(seed ^ 0x5EED);
    let wrap_key = LocalWrapKey::generate(&keys);
    TdfEngine::builder()
        .recipient(Recipient::local(wrap_key.clone()))
        .binding_key(BindingKey::generate(&keys))
        .authority(LocalKeyAuthority::local(wrap_key))
        .random_source(SeededRandom::new(seed))
        .segment_size(segment_size)
        .build()
        .expect("engine configuration")
}

/// Engine wrapping to the shared RSA key
pub fn rsa_engine(hash: OaepHash, authority: Arc<dyn KeyAuthority>) -> TdfEngine {
    let recipient = match hash {
        OaepHash::Sha1 => Recipient::rsa(AUTHORITY_KEYPAIR.public_key().clone()),
        OaepHash::Sha256 => Recipient::rsa_sha256(AUTHORITY_KEYPAIR.public_key().clone()),
    };
    TdfEngine::builder()
        .recipient(recipient)
        .binding_key(binding_key())
        .shared_authority(authority)
        .segment_size(64)
        .build()
        .expect("engine configuration")
}

/// Binding key shared between the RSA engines and their authority
pub fn binding_key() -> BindingKey {
    BindingKey::from_slice(&[0x42u8; 32]).expect("32-byte key")
}

/// Permitting authority over the shared RSA key
pub fn rsa_authority() -> LocalKeyAuthority {
    LocalKeyAuthority::rsa(AUTHORITY_KEYPAIR.clone())
}

/// Authority wrapper that counts how often it is consulted
pub struct CountingAuthority<A> {
    inner: A,
    calls: AtomicUsize,
}

impl<A: KeyAuthority> CountingAuthority<A> {
    pub fn new(inner: A) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl<A: KeyAuthority> KeyAuthority for CountingAuthority<A> {
    fn unwrap_key(&self, request: &UnwrapRequest<'_>) -> Result<PayloadKey, AuthorityError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.unwrap_key(request)
    }
}
