//! HMAC operations with constant-time verification
//!
//! This module provides the HMAC-SHA256 operations behind policy binding,
//! segment digests, and the manifest root signature. Verification always
//! uses constant-time comparison to prevent timing attacks.

use crate::types::{BindingKey, PayloadKey};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Output size of HMAC-SHA256
pub const HMAC_SIZE: usize = 32;

#[derive(Debug, Error)]
pub enum HmacError {
    #[error("HMAC initialization failed")]
    InitFailed,

    #[error("HMAC verification failed")]
    VerificationFailed,
}

/// Calculate HMAC-SHA256 over data
///
/// This is a low-level function. For TDF operations, use the specific
/// functions like `calculate_root_signature` or `calculate_policy_binding`.
pub fn calculate_hmac(key: &[u8], data: &[u8]) -> Result<Vec<u8>, HmacError> {
    calculate_hmac_parts(key, &[data])
}

/// Calculate HMAC-SHA256 over the concatenation of `parts`
pub fn calculate_hmac_parts(key: &[u8], parts: &[&[u8]]) -> Result<Vec<u8>, HmacError> {
    let mut mac = HmacSha256::new_from_slice(key).map_err(|_| HmacError::InitFailed)?;
    for part in parts {
        mac.update(part);
    }
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Verify an HMAC-SHA256 digest in constant time
pub fn verify_hmac_parts(key: &[u8], parts: &[&[u8]], expected: &[u8]) -> Result<(), HmacError> {
    let calculated = calculate_hmac_parts(key, parts)?;
    if calculated.ct_eq(expected).into() {
        Ok(())
    } else {
        Err(HmacError::VerificationFailed)
    }
}

/// Calculate the policy binding digest
///
/// `HMAC-SHA256(bindingKey, canonicalPolicy || wrappedKey)`
pub fn calculate_policy_binding(
    binding_key: &BindingKey,
    canonical_policy: &[u8],
    wrapped_key: &[u8],
) -> Result<Vec<u8>, HmacError> {
    calculate_hmac_parts(binding_key.as_slice(), &[canonical_policy, wrapped_key])
}

/// Verify a policy binding digest using constant-time comparison
pub fn verify_policy_binding(
    binding_key: &BindingKey,
    canonical_policy: &[u8],
    wrapped_key: &[u8],
    expected: &[u8],
) -> Result<(), HmacError> {
    verify_hmac_parts(
        binding_key.as_slice(),
        &[canonical_policy, wrapped_key],
        expected,
    )
}

/// Calculate the root signature over the manifest signing bytes
pub fn calculate_root_signature(
    payload_key: &PayloadKey,
    signing_bytes: &[u8],
) -> Result<Vec<u8>, HmacError> {
    calculate_hmac(payload_key.as_slice(), signing_bytes)
}

/// Verify the root signature using constant-time comparison
pub fn verify_root_signature(
    payload_key: &PayloadKey,
    signing_bytes: &[u8],
    expected: &[u8],
) -> Result<(), HmacError> {
    verify_hmac_parts(payload_key.as_slice(), &[signing_bytes], expected)
}
