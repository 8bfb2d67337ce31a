//! Trusted Data Format (TDF) engine
//!
//! Encrypts plaintext into a self-describing container that binds the
//! ciphertext to an access policy and to integrity metadata, and recovers the
//! plaintext only when the binding, the key authority, and every integrity
//! check agree.
//!
//! # Example
//!
//! ```
//! use tdf_engine::prelude::*;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = TdfEngine::with_local_keys();
//! let policy = PolicyBuilder::new()
//!     .id_auto()
//!     .attribute("clearance", "public")
//!     .build()?;
//!
//! let container = engine.encrypt("hello world", &policy)?;
//! assert_eq!(engine.decrypt(&container)?, "hello world");
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

pub mod authority;
pub mod binding;
pub mod config;
pub mod decrypt;
pub mod engine;
pub mod error;
pub mod manifest;
pub mod prelude;

pub use authority::{
    AccessDecision, AuthorityError, AuthorityKey, KeyAuthority, LocalKeyAuthority, UnwrapRequest,
};
pub use config::{ConfigError, EngineSettings, DEFAULT_SEGMENT_SIZE, MAX_SEGMENT_SIZE};
pub use engine::{Container, Recipient, TdfEngine, TdfEngineBuilder};
pub use error::TdfError;
pub use manifest::ManifestExt;

pub use tdf_engine_protocol::{AttributeValue, Manifest, Policy, PolicyBuilder, PolicyError};

pub use tdf_engine_crypto as crypto;
pub use tdf_engine_protocol as protocol;
