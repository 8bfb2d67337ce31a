//! Decrypt pipeline
//!
//! Each stage consumes the previous one, so a later step cannot run until
//! every earlier check has passed:
//!
//! ```text
//! Decoded -> PolicyVerified -> KeyUnwrapped -> IntegrityVerified -> plaintext
//! ```
//!
//! Any stage may fail; there are no retries and no partial output.

use crate::authority::{KeyAuthority, UnwrapRequest};
use crate::binding;
use crate::error::TdfError;
use crate::manifest::{stored_segment, ManifestExt};
use tdf_engine_crypto::{decrypt_segment, BindingKey, CryptoError, PayloadKey};
use tdf_engine_protocol::{container, Manifest, Policy};
use tracing::{debug, warn};
use zeroize::Zeroizing;

/// Container whose header and manifest parsed cleanly
#[derive(Debug)]
pub struct Decoded<'a> {
    manifest: Manifest,
    payload: &'a [u8],
}

/// Policy binding verified; the policy is safe to present to an authority
#[derive(Debug)]
pub struct PolicyVerified<'a> {
    manifest: Manifest,
    payload: &'a [u8],
    policy: Policy,
}

/// Payload key released by the authority
#[derive(Debug)]
pub struct KeyUnwrapped<'a> {
    manifest: Manifest,
    payload: &'a [u8],
    key: PayloadKey,
}

/// Root signature and every segment digest verified
#[derive(Debug)]
pub struct IntegrityVerified<'a> {
    manifest: Manifest,
    payload: &'a [u8],
    key: PayloadKey,
}

impl<'a> Decoded<'a> {
    pub fn decode(bytes: &'a [u8]) -> Result<Self, TdfError> {
        let decoded = container::decode(bytes).map_err(|e| {
            warn!("container decode failed");
            TdfError::from(e)
        })?;
        debug!(
            segments = decoded.manifest.integrity().segments.len(),
            "container decoded"
        );
        Ok(Self {
            manifest: decoded.manifest,
            payload: decoded.payload,
        })
    }

    pub fn verify_policy(self, binding_key: &BindingKey) -> Result<PolicyVerified<'a>, TdfError> {
        binding::verify_manifest(binding_key, &self.manifest).inspect_err(|_| {
            warn!("policy binding verification failed");
        })?;
        let policy = self.manifest.policy()?;
        debug!(policy = %policy.uuid, "policy binding verified");
        Ok(PolicyVerified {
            manifest: self.manifest,
            payload: self.payload,
            policy,
        })
    }
}

impl<'a> PolicyVerified<'a> {
    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    pub fn unwrap_key(self, authority: &dyn KeyAuthority) -> Result<KeyUnwrapped<'a>, TdfError> {
        let key_access = self.manifest.key_access();
        let request = UnwrapRequest {
            policy: &self.policy,
            wrap_algorithm: key_access.wrap_algorithm,
            wrapped_key: &key_access.wrapped_key,
            kid: key_access.kid.as_deref(),
            url: key_access.url.as_deref(),
        };
        let key = authority.unwrap_key(&request).map_err(|_| {
            warn!("key authority refused to release the payload key");
            TdfError::AccessDenied
        })?;
        debug!("payload key unwrapped");
        Ok(KeyUnwrapped {
            manifest: self.manifest,
            payload: self.payload,
            key,
        })
    }
}

impl<'a> KeyUnwrapped<'a> {
    pub fn verify_integrity(self) -> Result<IntegrityVerified<'a>, TdfError> {
        self.manifest
            .verify_root_signature(&self.key)
            .and_then(|()| self.manifest.verify_segments(&self.key, self.payload))
            .inspect_err(|_| warn!("integrity verification failed"))?;
        debug!("integrity verified");
        Ok(IntegrityVerified {
            manifest: self.manifest,
            payload: self.payload,
            key: self.key,
        })
    }
}

impl IntegrityVerified<'_> {
    /// Decrypt every segment; the buffer is wiped if any segment fails
    pub fn decrypt(self) -> Result<Zeroizing<Vec<u8>>, TdfError> {
        let integrity = self.manifest.integrity();
        let capacity = usize::try_from(self.manifest.payload.plaintext_length)
            .map_err(|_| TdfError::IntegrityFailure)?;
        let mut plaintext = Zeroizing::new(Vec::with_capacity(capacity));

        for (index, segment) in integrity.segments.iter().enumerate() {
            let stored =
                stored_segment(self.payload, segment).ok_or(TdfError::IntegrityFailure)?;
            let chunk = decrypt_segment(&self.key, index as u64, stored).map_err(|e| {
                warn!("payload authentication failed");
                match e {
                    CryptoError::SegmentTooShort { .. } => TdfError::IntegrityFailure,
                    _ => TdfError::AuthenticationFailure,
                }
            })?;
            plaintext.extend_from_slice(&chunk);
        }

        debug!(plaintext_len = plaintext.len(), "payload decrypted");
        Ok(plaintext)
    }
}
