//! Unified error type for the TDF engine public API
//!
//! Component crates keep their domain-specific errors for precise handling.
//! They are folded into [`TdfError`] at the engine boundary, where the
//! decrypt-side variants carry no detail about which check or
//! which segment failed.
//!
//! # Example
//!
//! ```no_run
//! use tdf_engine::TdfError;
//!
//! fn handle(result: Result<String, TdfError>) {
//!     if let Err(e) = result {
//!         eprintln!("{} ({})", e, e.error_code());
//!     }
//! }
//! ```

use crate::authority::AuthorityError;
use crate::config::ConfigError;
use tdf_engine_crypto::{CryptoError, HmacError, KemError};
use tdf_engine_protocol::{ContainerError, ManifestError, PolicyError};
use thiserror::Error;

/// Unified error type for all engine operations
///
/// # Error Categories
///
/// - **Format**: `MalformedManifest`, `UnsupportedVersion`, `TruncatedContainer`
/// - **Security**: `PolicyBindingFailure`, `AccessDenied`, `IntegrityFailure`,
///   `AuthenticationFailure`
/// - **Output**: `InvalidEncoding`
/// - **Encrypt/setup**: `Policy`, `KeyWrap`, `Crypto`, `Config`
#[derive(Debug, Error)]
pub enum TdfError {
    #[error("Malformed manifest: {reason}")]
    MalformedManifest { reason: String },

    #[error("Unsupported container version")]
    UnsupportedVersion,

    #[error("Container is truncated")]
    TruncatedContainer,

    #[error("Policy binding verification failed")]
    PolicyBindingFailure,

    #[error("Access denied")]
    AccessDenied,

    #[error("Integrity verification failed")]
    IntegrityFailure,

    #[error("Payload authentication failed")]
    AuthenticationFailure,

    #[error("Plaintext is not valid UTF-8")]
    InvalidEncoding,

    /// Policy validation or serialization error
    #[error("Policy error: {0}")]
    Policy(#[from] PolicyError),

    /// Wrapping the payload key for the recipient failed
    #[error("Key wrap error: {0}")]
    KeyWrap(#[from] KemError),

    /// Encrypt-side cryptographic failure
    #[error("Crypto error: {0}")]
    Crypto(#[source] CryptoError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl TdfError {
    /// Returns a stable error code
    ///
    /// Error codes follow the format `TDF_E_<CATEGORY>`.
    pub fn error_code(&self) -> &'static str {
        match self {
            TdfError::MalformedManifest { .. } => "TDF_E_MANIFEST_MALFORMED",
            TdfError::UnsupportedVersion => "TDF_E_VERSION_UNSUPPORTED",
            TdfError::TruncatedContainer => "TDF_E_CONTAINER_TRUNCATED",
            TdfError::PolicyBindingFailure => "TDF_E_POLICY_BINDING",
            TdfError::AccessDenied => "TDF_E_ACCESS_DENIED",
            TdfError::IntegrityFailure => "TDF_E_INTEGRITY",
            TdfError::AuthenticationFailure => "TDF_E_AUTHENTICATION",
            TdfError::InvalidEncoding => "TDF_E_ENCODING",
            TdfError::Policy(_) => "TDF_E_POLICY",
            TdfError::KeyWrap(_) => "TDF_E_KEY_WRAP",
            TdfError::Crypto(_) => "TDF_E_CRYPTO",
            TdfError::Config(_) => "TDF_E_CONFIG",
        }
    }

    /// Every failure is deterministic for the same input, so nothing is retryable
    pub fn is_retryable(&self) -> bool {
        false
    }

    /// Returns true for integrity and authorization failures
    pub fn is_security_failure(&self) -> bool {
        matches!(
            self,
            TdfError::PolicyBindingFailure
                | TdfError::AccessDenied
                | TdfError::IntegrityFailure
                | TdfError::AuthenticationFailure
        )
    }

    /// Returns true if the container bytes could not be parsed
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            TdfError::MalformedManifest { .. }
                | TdfError::UnsupportedVersion
                | TdfError::TruncatedContainer
        )
    }

    /// Returns a suggestion for resolving this error
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            TdfError::UnsupportedVersion => {
                Some("The container was produced by an incompatible engine version")
            }
            TdfError::TruncatedContainer => Some("Check that the full container was transferred"),
            TdfError::AccessDenied => Some("Request access from the key authority for this policy"),
            TdfError::InvalidEncoding => Some("Use decrypt_bytes for binary payloads"),
            TdfError::Config(_) => Some("Check the engine settings and keys"),
            _ => None,
        }
    }
}

impl From<ContainerError> for TdfError {
    fn from(err: ContainerError) -> Self {
        match err {
            ContainerError::Truncated => TdfError::TruncatedContainer,
            ContainerError::UnsupportedVersion => TdfError::UnsupportedVersion,
            ContainerError::Manifest(e) => e.into(),
            other => TdfError::MalformedManifest {
                reason: other.to_string(),
            },
        }
    }
}

impl From<ManifestError> for TdfError {
    fn from(err: ManifestError) -> Self {
        TdfError::MalformedManifest {
            reason: err.to_string(),
        }
    }
}

impl From<AuthorityError> for TdfError {
    fn from(_: AuthorityError) -> Self {
        TdfError::AccessDenied
    }
}

impl From<HmacError> for TdfError {
    fn from(err: HmacError) -> Self {
        TdfError::Crypto(CryptoError::Hmac(err))
    }
}
