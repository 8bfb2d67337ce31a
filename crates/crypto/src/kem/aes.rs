//! Local AES-256-GCM key wrapping
//!
//! Wire form of a wrapped key: `nonce (12) || ciphertext || tag (16)`.

use super::{KemError, KeyEncapsulation};
use crate::aead::{aead_decrypt, aead_encrypt, GCM_IV_SIZE, GCM_TAG_SIZE};
use crate::helpers::generate_nonce;
use crate::random::RandomSource;
use crate::types::{LocalWrapKey, Nonce96};
use zeroize::Zeroizing;

/// Associated data binding wrapped keys to this scheme
const WRAP_AAD: &[u8] = b"A256GCMKW";

/// AES-256-GCM wrapping under a locally held key
#[derive(Debug, Clone, Copy, Default)]
pub struct AesGcmKem;

impl KeyEncapsulation for AesGcmKem {
    type PublicKey = LocalWrapKey;
    type PrivateKey = LocalWrapKey;

    fn wrap(
        &self,
        key: &[u8],
        wrapping_key: &LocalWrapKey,
        rng: &dyn RandomSource,
    ) -> Result<Vec<u8>, KemError> {
        let nonce = generate_nonce(rng);
        let sealed = aead_encrypt(wrapping_key.as_slice(), &nonce, key, WRAP_AAD)
            .map_err(|e| KemError::WrapError(e.to_string()))?;

        let mut wrapped = Vec::with_capacity(GCM_IV_SIZE + sealed.ciphertext.len() + GCM_TAG_SIZE);
        wrapped.extend_from_slice(nonce.as_slice());
        wrapped.extend_from_slice(&sealed.ciphertext);
        wrapped.extend_from_slice(&sealed.tag);
        Ok(wrapped)
    }

    fn unwrap(
        &self,
        wrapped: &[u8],
        wrapping_key: &LocalWrapKey,
    ) -> Result<Zeroizing<Vec<u8>>, KemError> {
        if wrapped.len() < GCM_IV_SIZE + GCM_TAG_SIZE {
            return Err(KemError::UnwrapError);
        }
        let (nonce, rest) = wrapped.split_at(GCM_IV_SIZE);
        let (ciphertext, tag) = rest.split_at(rest.len() - GCM_TAG_SIZE);
        let nonce = Nonce96::from_slice(nonce).map_err(|_| KemError::UnwrapError)?;

        aead_decrypt(wrapping_key.as_slice(), &nonce, ciphertext, tag, WRAP_AAD)
            .map_err(|_| KemError::UnwrapError)
    }
}
