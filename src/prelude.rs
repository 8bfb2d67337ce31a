//! TDF engine prelude
//!
//! The prelude module provides a convenient way to import commonly used types and traits.
//!
//! # Example
//!
//! ```rust
//! use tdf_engine::prelude::*;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let rng = OsRandom;
//! let wrap_key = LocalWrapKey::generate(&rng);
//! let engine = TdfEngine::builder()
//!     .recipient(Recipient::local(wrap_key.clone()))
//!     .binding_key(BindingKey::generate(&rng))
//!     .authority(LocalKeyAuthority::local(wrap_key))
//!     .build()?;
//!
//! let container = engine.encrypt("report", &Policy::with_attributes([("clearance", "public")]))?;
//! let manifest = TdfEngine::inspect(&container)?;
//! assert_eq!(manifest.payload.plaintext_length, 6);
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

// Re-export core types
pub use crate::authority::{AccessDecision, KeyAuthority, LocalKeyAuthority, UnwrapRequest};
pub use crate::config::EngineSettings;
pub use crate::engine::{Container, Recipient, TdfEngine, TdfEngineBuilder};
pub use crate::error::TdfError;

// Extension traits
pub use crate::manifest::ManifestExt;

// Re-export protocol types
pub use tdf_engine_protocol::{
    AttributeValue, Manifest, Policy, PolicyBuilder, SegmentHashAlgorithm, WrapAlgorithm,
};

// Re-export crypto types
pub use tdf_engine_crypto::{
    BindingKey, LocalWrapKey, OaepHash, OsRandom, RandomSource, RsaKeyPair, SeededRandom,
};
