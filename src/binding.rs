//! Policy binding
//!
//! The binding is `HMAC-SHA256(bindingKey, canonicalPolicy || wrappedKey)`.
//! It ties one policy to one wrapped payload key, and is checked before any
//! key authority is asked to unwrap.

use crate::error::TdfError;
use tdf_engine_crypto::{calculate_policy_binding, verify_policy_binding, BindingKey};
use tdf_engine_protocol::Manifest;

/// Compute the binding digest
pub fn compute(
    binding_key: &BindingKey,
    canonical_policy: &[u8],
    wrapped_key: &[u8],
) -> Result<Vec<u8>, TdfError> {
    Ok(calculate_policy_binding(
        binding_key,
        canonical_policy,
        wrapped_key,
    )?)
}

/// Recompute and compare in constant time
pub fn verify(
    binding_key: &BindingKey,
    canonical_policy: &[u8],
    wrapped_key: &[u8],
    expected: &[u8],
) -> Result<(), TdfError> {
    verify_policy_binding(binding_key, canonical_policy, wrapped_key, expected)
        .map_err(|_| TdfError::PolicyBindingFailure)
}

/// Verify the binding recorded in a manifest
pub fn verify_manifest(binding_key: &BindingKey, manifest: &Manifest) -> Result<(), TdfError> {
    let key_access = manifest.key_access();
    verify(
        binding_key,
        manifest.policy_bytes(),
        &key_access.wrapped_key,
        &key_access.policy_binding.hash,
    )
}
