//! Keyed manifest operations
//!
//! The protocol crate owns the manifest data model and knows nothing about
//! keys. This extension trait adds the operations that need the payload key:
//! sealing with the root signature and verifying segment digests.

use crate::error::TdfError;
use tdf_engine_crypto::{
    calculate_root_signature, verify_root_signature, verify_segment, PayloadKey, SegmentHashKind,
    SegmentRecord,
};
use tdf_engine_protocol::{Manifest, Segment, SegmentHashAlgorithm};

/// Extension trait for [`Manifest`] operations keyed by the payload key
pub trait ManifestExt {
    /// Compute and store the root signature over the signing bytes
    fn seal(&mut self, payload_key: &PayloadKey) -> Result<(), TdfError>;

    /// Check the root signature; any mismatch is an integrity failure
    fn verify_root_signature(&self, payload_key: &PayloadKey) -> Result<(), TdfError>;

    /// Check every segment digest against `payload`
    fn verify_segments(&self, payload_key: &PayloadKey, payload: &[u8]) -> Result<(), TdfError>;
}

impl ManifestExt for Manifest {
    fn seal(&mut self, payload_key: &PayloadKey) -> Result<(), TdfError> {
        let signing_bytes = self.signing_bytes()?;
        let sig = calculate_root_signature(payload_key, &signing_bytes)?;
        self.set_root_signature(sig);
        Ok(())
    }

    fn verify_root_signature(&self, payload_key: &PayloadKey) -> Result<(), TdfError> {
        let signing_bytes = self.signing_bytes()?;
        let expected = &self.integrity().root_signature.sig;
        verify_root_signature(payload_key, &signing_bytes, expected)
            .map_err(|_| TdfError::IntegrityFailure)
    }

    fn verify_segments(&self, payload_key: &PayloadKey, payload: &[u8]) -> Result<(), TdfError> {
        let integrity = self.integrity();
        let kind = hash_kind(integrity.segment_hash_alg);
        for segment in &integrity.segments {
            let stored = stored_segment(payload, segment).ok_or(TdfError::IntegrityFailure)?;
            verify_segment(payload_key, kind, stored, &segment.hash)
                .map_err(|_| TdfError::IntegrityFailure)?;
        }
        Ok(())
    }
}

/// Slice one stored segment out of the payload
pub(crate) fn stored_segment<'a>(payload: &'a [u8], segment: &Segment) -> Option<&'a [u8]> {
    let start = usize::try_from(segment.offset).ok()?;
    let len = usize::try_from(segment.length).ok()?;
    payload.get(start..start.checked_add(len)?)
}

pub(crate) fn hash_kind(alg: SegmentHashAlgorithm) -> SegmentHashKind {
    match alg {
        SegmentHashAlgorithm::Hs256 => SegmentHashKind::Hmac,
        SegmentHashAlgorithm::Gmac => SegmentHashKind::Gmac,
    }
}

pub(crate) fn to_manifest_segments(records: Vec<SegmentRecord>) -> Vec<Segment> {
    records
        .into_iter()
        .map(|r| Segment {
            offset: r.offset,
            length: r.length,
            plaintext_length: r.plaintext_length,
            hash: r.hash,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tdf_engine_crypto::{encrypt_segments, SeededRandom, SEGMENT_OVERHEAD};
    use tdf_engine_protocol::{KeyAccess, ManifestBuilder, PolicyBuilder, WrapAlgorithm};

    fn sealed(kind: SegmentHashAlgorithm) -> (Manifest, Vec<u8>, PayloadKey) {
        let rng = SeededRandom::new(21);
        let key = PayloadKey::generate(&rng);
        let segmented = encrypt_segments(&key, &[9u8; 50], 16, hash_kind(kind), &rng).unwrap();

        let policy = PolicyBuilder::new().id_auto().build().unwrap();
        let mut manifest = ManifestBuilder::new(&policy)
            .unwrap()
            .key_access(KeyAccess::new(
                WrapAlgorithm::A256Gcmkw,
                vec![1u8; 60],
                vec![2u8; 32],
            ))
            .segment_hash_alg(kind)
            .segment_size(16)
            .segments(to_manifest_segments(segmented.segments))
            .build()
            .unwrap();
        manifest.seal(&key).unwrap();
        (manifest, segmented.payload, key)
    }

    #[test]
    fn test_overhead_constants_agree() {
        assert_eq!(SEGMENT_OVERHEAD as u64, tdf_engine_protocol::SEGMENT_OVERHEAD);
    }

    #[test]
    fn test_seal_then_verify() {
        let (manifest, payload, key) = sealed(SegmentHashAlgorithm::Hs256);
        assert!(manifest.validate().is_ok());
        assert!(manifest.verify_root_signature(&key).is_ok());
        assert!(manifest.verify_segments(&key, &payload).is_ok());
    }

    #[test]
    fn test_root_signature_covers_manifest_fields() {
        let (manifest, _, key) = sealed(SegmentHashAlgorithm::Gmac);

        let mut altered = manifest.clone();
        altered.payload.mime_type = Some("text/plain".to_string());
        assert!(matches!(
            altered.verify_root_signature(&key),
            Err(TdfError::IntegrityFailure)
        ));

        let other_key = PayloadKey::from_slice(&[0u8; 32]).unwrap();
        assert!(manifest.verify_root_signature(&other_key).is_err());
    }

    #[test]
    fn test_segment_tampering_detected() {
        for kind in [SegmentHashAlgorithm::Hs256, SegmentHashAlgorithm::Gmac] {
            let (manifest, mut payload, key) = sealed(kind);
            let last = payload.len() - 1;
            payload[last] ^= 0x01;
            assert!(matches!(
                manifest.verify_segments(&key, &payload),
                Err(TdfError::IntegrityFailure)
            ));
        }
    }

    #[test]
    fn test_short_payload_is_integrity_failure() {
        let (manifest, payload, key) = sealed(SegmentHashAlgorithm::Hs256);
        assert!(matches!(
            manifest.verify_segments(&key, &payload[..payload.len() - 1]),
            Err(TdfError::IntegrityFailure)
        ));
    }
}
