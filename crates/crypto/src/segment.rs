//! Segment-based payload encryption
//!
//! The payload is split into fixed-size plaintext segments. Each segment is
//! encrypted with AES-256-GCM under the payload key and stored as
//! `[IV (12)][ciphertext][tag (16)]`. The segment index (u64, big-endian) is
//! authenticated as associated data so segments cannot be reordered.

use crate::aead::{aead_decrypt, aead_encrypt, GCM_IV_SIZE, GCM_TAG_SIZE};
use crate::helpers::{CryptoError, NonceLedger};
use crate::hmac::{calculate_hmac, verify_hmac_parts};
use crate::random::RandomSource;
use crate::types::{Nonce96, PayloadKey};
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

/// Bytes added to every segment by encryption (IV + tag)
pub const SEGMENT_OVERHEAD: usize = GCM_IV_SIZE + GCM_TAG_SIZE;

/// How a segment digest is computed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SegmentHashKind {
    /// HMAC-SHA256 under the payload key over the stored segment
    #[default]
    Hmac,
    /// The segment's GCM authentication tag
    Gmac,
}

/// One encrypted segment's position and digest within the payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentRecord {
    /// Byte offset of the stored segment within the payload
    pub offset: u64,
    /// Stored size (IV + ciphertext + tag)
    pub length: u64,
    /// Size before encryption
    pub plaintext_length: u64,
    /// Raw digest bytes
    pub hash: Vec<u8>,
}

/// Result of segment-based encryption
#[derive(Debug)]
pub struct SegmentedPayload {
    /// Concatenated stored segments
    pub payload: Vec<u8>,
    /// Metadata for the manifest
    pub segments: Vec<SegmentRecord>,
}

/// Encrypt `plaintext` in segments of `segment_size` bytes
///
/// Empty plaintext produces a single empty segment so every payload carries
/// at least one authenticated record.
pub fn encrypt_segments(
    payload_key: &PayloadKey,
    plaintext: &[u8],
    segment_size: usize,
    hash_kind: SegmentHashKind,
    rng: &dyn RandomSource,
) -> Result<SegmentedPayload, CryptoError> {
    if segment_size == 0 {
        return Err(CryptoError::InvalidSegmentSize);
    }

    let chunks: Vec<&[u8]> = if plaintext.is_empty() {
        vec![plaintext]
    } else {
        plaintext.chunks(segment_size).collect()
    };

    let mut ledger = NonceLedger::new();
    let mut payload = Vec::with_capacity(plaintext.len() + chunks.len() * SEGMENT_OVERHEAD);
    let mut segments = Vec::with_capacity(chunks.len());

    for (index, chunk) in chunks.into_iter().enumerate() {
        let nonce = ledger.issue(rng);
        let sealed = aead_encrypt(
            payload_key.as_slice(),
            &nonce,
            chunk,
            &segment_aad(index as u64),
        )?;

        let offset = payload.len();
        payload.extend_from_slice(nonce.as_slice());
        payload.extend_from_slice(&sealed.ciphertext);
        payload.extend_from_slice(&sealed.tag);
        let stored = &payload[offset..];

        let hash = match hash_kind {
            SegmentHashKind::Hmac => calculate_hmac(payload_key.as_slice(), stored)?,
            SegmentHashKind::Gmac => sealed.tag.to_vec(),
        };

        segments.push(SegmentRecord {
            offset: offset as u64,
            length: stored.len() as u64,
            plaintext_length: chunk.len() as u64,
            hash,
        });
    }

    tracing::trace!(
        segments = segments.len(),
        payload_len = payload.len(),
        "payload encrypted"
    );
    Ok(SegmentedPayload { payload, segments })
}

/// Check a stored segment against its recorded digest in constant time
pub fn verify_segment(
    payload_key: &PayloadKey,
    hash_kind: SegmentHashKind,
    stored: &[u8],
    expected: &[u8],
) -> Result<(), CryptoError> {
    if stored.len() < SEGMENT_OVERHEAD {
        return Err(CryptoError::IntegrityFailure);
    }
    match hash_kind {
        SegmentHashKind::Hmac => verify_hmac_parts(payload_key.as_slice(), &[stored], expected)
            .map_err(|_| CryptoError::IntegrityFailure),
        SegmentHashKind::Gmac => {
            let tag = &stored[stored.len() - GCM_TAG_SIZE..];
            if tag.ct_eq(expected).into() {
                Ok(())
            } else {
                Err(CryptoError::IntegrityFailure)
            }
        }
    }
}

/// Decrypt one stored segment at position `index`
pub fn decrypt_segment(
    payload_key: &PayloadKey,
    index: u64,
    stored: &[u8],
) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
    if stored.len() < SEGMENT_OVERHEAD {
        return Err(CryptoError::SegmentTooShort {
            len: stored.len(),
            min: SEGMENT_OVERHEAD,
        });
    }
    let (iv, rest) = stored.split_at(GCM_IV_SIZE);
    let (ciphertext, tag) = rest.split_at(rest.len() - GCM_TAG_SIZE);
    let nonce = Nonce96::from_slice(iv).map_err(|_| CryptoError::AuthenticationFailure)?;

    aead_decrypt(
        payload_key.as_slice(),
        &nonce,
        ciphertext,
        tag,
        &segment_aad(index),
    )
}

fn segment_aad(index: u64) -> [u8; 8] {
    index.to_be_bytes()
}
