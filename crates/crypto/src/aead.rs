//! AES-256-GCM with detached tags

use crate::helpers::{create_aes_cipher, CryptoError};
use crate::types::Nonce96;
use aes_gcm::{aead::AeadInPlace, Nonce, Tag};
use zeroize::Zeroizing;

/// 128-bit GCM authentication tag
pub const GCM_TAG_SIZE: usize = 16;

/// 96-bit GCM IV
pub const GCM_IV_SIZE: usize = 12;

/// Ciphertext with its detached authentication tag
#[derive(Debug, Clone)]
pub struct Sealed {
    pub ciphertext: Vec<u8>,
    pub tag: [u8; GCM_TAG_SIZE],
}

/// Encrypt `plaintext` under `key` and `nonce`, authenticating `aad`
///
/// The caller owns nonce uniqueness; see [`crate::NonceLedger`].
pub fn aead_encrypt(
    key: &[u8],
    nonce: &Nonce96,
    plaintext: &[u8],
    aad: &[u8],
) -> Result<Sealed, CryptoError> {
    let cipher = create_aes_cipher(key)?;
    // Holds plaintext until encryption succeeds, so it is wiped on failure
    let mut buffer = Zeroizing::new(plaintext.to_vec());
    let tag = cipher
        .encrypt_in_place_detached(
            Nonce::from_slice(nonce.as_slice()),
            aad,
            buffer.as_mut_slice(),
        )
        .map_err(|_| CryptoError::EncryptionFailed)?;

    let mut tag_bytes = [0u8; GCM_TAG_SIZE];
    tag_bytes.copy_from_slice(&tag);
    Ok(Sealed {
        ciphertext: std::mem::take(&mut *buffer),
        tag: tag_bytes,
    })
}

/// Decrypt and authenticate; the plaintext buffer is wiped when dropped
pub fn aead_decrypt(
    key: &[u8],
    nonce: &Nonce96,
    ciphertext: &[u8],
    tag: &[u8],
    aad: &[u8],
) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
    if tag.len() != GCM_TAG_SIZE {
        return Err(CryptoError::AuthenticationFailure);
    }
    let cipher = create_aes_cipher(key)?;
    let mut buffer = Zeroizing::new(ciphertext.to_vec());
    cipher
        .decrypt_in_place_detached(
            Nonce::from_slice(nonce.as_slice()),
            aad,
            buffer.as_mut_slice(),
            Tag::from_slice(tag),
        )
        .map_err(|_| CryptoError::AuthenticationFailure)?;
    Ok(buffer)
}
