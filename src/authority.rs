//! Key authority contract
//!
//! The engine never holds the private half of a recipient key. Unwrapping is
//! delegated to a [`KeyAuthority`], which sees the bound policy and decides
//! whether to release the payload key. [`LocalKeyAuthority`] is an in-process
//! authority holding the key material itself, with the access decision
//! injected by the caller.

use std::fmt;
use tdf_engine_crypto::{
    AesGcmKem, KeyEncapsulation, LocalWrapKey, OaepHash, PayloadKey, RsaKeyPair, RsaOaepKem,
};
use tdf_engine_protocol::{Policy, WrapAlgorithm};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum AuthorityError {
    #[error("Access denied by key authority")]
    Denied,

    #[error("Key unwrap failed")]
    UnwrapFailed,

    #[error("Wrap algorithm {0} is not served by this authority")]
    UnsupportedAlgorithm(WrapAlgorithm),

    #[error("Key authority unavailable: {0}")]
    Unavailable(String),
}

/// Everything an authority may inspect when asked for a payload key
#[derive(Debug, Clone, Copy)]
pub struct UnwrapRequest<'a> {
    pub policy: &'a Policy,
    pub wrap_algorithm: WrapAlgorithm,
    pub wrapped_key: &'a [u8],
    pub kid: Option<&'a str>,
    pub url: Option<&'a str>,
}

/// Releases payload keys subject to policy
pub trait KeyAuthority: Send + Sync {
    /// Unwrap the payload key for `request`, or refuse
    fn unwrap_key(&self, request: &UnwrapRequest<'_>) -> Result<PayloadKey, AuthorityError>;
}

/// Outcome of an access decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    Permit,
    Deny,
}

type DecisionFn = dyn Fn(&UnwrapRequest<'_>) -> AccessDecision + Send + Sync;

/// Key material held by a [`LocalKeyAuthority`]
pub enum AuthorityKey {
    Rsa(RsaKeyPair),
    Local(LocalWrapKey),
}

impl fmt::Debug for AuthorityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthorityKey::Rsa(pair) => f.debug_tuple("Rsa").field(pair).finish(),
            AuthorityKey::Local(key) => f.debug_tuple("Local").field(key).finish(),
        }
    }
}

/// In-process key authority
pub struct LocalKeyAuthority {
    key: AuthorityKey,
    decide: Box<DecisionFn>,
}

impl LocalKeyAuthority {
    /// Authority for RSA-OAEP wrapped keys, permitting every request
    pub fn rsa(key_pair: RsaKeyPair) -> Self {
        Self::new(AuthorityKey::Rsa(key_pair))
    }

    /// Authority for keys wrapped under a local AES key, permitting every request
    pub fn local(key: LocalWrapKey) -> Self {
        Self::new(AuthorityKey::Local(key))
    }

    fn new(key: AuthorityKey) -> Self {
        Self {
            key,
            decide: Box::new(|_| AccessDecision::Permit),
        }
    }

    /// Replace the access decision
    #[must_use]
    pub fn with_access_decision<F>(mut self, decide: F) -> Self
    where
        F: Fn(&UnwrapRequest<'_>) -> AccessDecision + Send + Sync + 'static,
    {
        self.decide = Box::new(decide);
        self
    }

    fn unwrap_raw(
        &self,
        request: &UnwrapRequest<'_>,
    ) -> Result<zeroize::Zeroizing<Vec<u8>>, AuthorityError> {
        let unwrapped = match (&self.key, request.wrap_algorithm) {
            (AuthorityKey::Rsa(pair), WrapAlgorithm::RsaOaep) => {
                RsaOaepKem::new(OaepHash::Sha1).unwrap(request.wrapped_key, pair.private_key())
            }
            (AuthorityKey::Rsa(pair), WrapAlgorithm::RsaOaep256) => {
                RsaOaepKem::new(OaepHash::Sha256).unwrap(request.wrapped_key, pair.private_key())
            }
            (AuthorityKey::Local(key), WrapAlgorithm::A256Gcmkw) => {
                AesGcmKem.unwrap(request.wrapped_key, key)
            }
            (_, alg) => return Err(AuthorityError::UnsupportedAlgorithm(alg)),
        };
        unwrapped.map_err(|_| AuthorityError::UnwrapFailed)
    }
}

impl KeyAuthority for LocalKeyAuthority {
    fn unwrap_key(&self, request: &UnwrapRequest<'_>) -> Result<PayloadKey, AuthorityError> {
        if (self.decide)(request) == AccessDecision::Deny {
            debug!(policy = %request.policy.uuid, "access decision: deny");
            return Err(AuthorityError::Denied);
        }
        let raw = self.unwrap_raw(request)?;
        PayloadKey::from_slice(&raw).map_err(|_| AuthorityError::UnwrapFailed)
    }
}

impl fmt::Debug for LocalKeyAuthority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalKeyAuthority")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}
