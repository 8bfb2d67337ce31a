//! TDF Manifest structures
//!
//! This module contains the data structures for TDF manifests, including:
//! - Payload information
//! - Encryption configuration
//! - The key access object with its policy binding
//! - Integrity information (segments and root signature)
//!
//! A manifest has exactly one byte encoding: compact JSON in declaration
//! order with no unknown fields. Parsing re-serializes and rejects input that
//! does not reproduce itself, so any change to the bytes changes the value.
//!
//! Note: Cryptographic operations (HMAC, policy binding generation) are in the crypto crate.

use crate::policy::{Policy, PolicyError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Manifest schema version written and accepted
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Bytes each stored segment adds over its plaintext (IV + GCM tag)
pub const SEGMENT_OVERHEAD: u64 = 28;

/// Size of an HMAC-SHA256 digest
pub const HS256_DIGEST_SIZE: usize = 32;

/// Size of a GMAC (GCM tag) digest
pub const GMAC_DIGEST_SIZE: usize = 16;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("Invalid manifest JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Manifest bytes are not in canonical form")]
    NonCanonical,

    #[error("Unsupported manifest schema version: {0}")]
    UnsupportedSchema(String),

    #[error("Invalid manifest: {0}")]
    Invalid(String),

    #[error("Invalid manifest policy: {0}")]
    Policy(#[from] PolicyError),
}

mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&BASE64.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        BASE64.decode(encoded).map_err(serde::de::Error::custom)
    }
}

/// Payload encryption algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EncryptionAlgorithm {
    #[default]
    #[serde(rename = "AES-256-GCM")]
    Aes256Gcm,
}

/// Payload key wrapping scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WrapAlgorithm {
    /// RSA-OAEP with SHA-1
    #[serde(rename = "RSA-OAEP")]
    RsaOaep,
    /// RSA-OAEP with SHA-256
    #[serde(rename = "RSA-OAEP-256")]
    RsaOaep256,
    /// AES-256-GCM under a local wrapping key
    #[serde(rename = "A256GCMKW")]
    A256Gcmkw,
}

impl WrapAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            WrapAlgorithm::RsaOaep => "RSA-OAEP",
            WrapAlgorithm::RsaOaep256 => "RSA-OAEP-256",
            WrapAlgorithm::A256Gcmkw => "A256GCMKW",
        }
    }
}

impl std::fmt::Display for WrapAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-segment digest algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SegmentHashAlgorithm {
    #[default]
    #[serde(rename = "HS256")]
    Hs256,
    #[serde(rename = "GMAC")]
    Gmac,
}

impl SegmentHashAlgorithm {
    /// Expected digest length in bytes
    pub fn digest_size(&self) -> usize {
        match self {
            SegmentHashAlgorithm::Hs256 => HS256_DIGEST_SIZE,
            SegmentHashAlgorithm::Gmac => GMAC_DIGEST_SIZE,
        }
    }
}

/// Keyed digest used for the policy binding and the root signature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BindingAlgorithm {
    #[default]
    #[serde(rename = "HS256")]
    Hs256,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PayloadKind {
    #[default]
    #[serde(rename = "embedded")]
    Embedded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EncryptionType {
    #[default]
    #[serde(rename = "split")]
    Split,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum KeyAccessType {
    #[default]
    #[serde(rename = "wrapped")]
    Wrapped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum KeyAccessProtocol {
    #[default]
    #[serde(rename = "kas")]
    Kas,
}

/// TDF manifest structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Manifest {
    pub schema_version: String,
    pub payload: Payload,
    pub encryption_information: EncryptionInformation,
}

/// Payload description
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Payload {
    #[serde(rename = "type")]
    pub kind: PayloadKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    pub is_encrypted: bool,
    /// Stored payload size in bytes
    pub length: u64,
    pub plaintext_length: u64,
}

/// Encryption information in TDF manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EncryptionInformation {
    #[serde(rename = "type")]
    pub kind: EncryptionType,
    pub key_access: KeyAccess,
    pub method: EncryptionMethod,
    pub integrity_information: IntegrityInformation,
    /// Canonical policy bytes
    #[serde(with = "base64_bytes")]
    pub policy: Vec<u8>,
}

/// Key access object in manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct KeyAccess {
    #[serde(rename = "type")]
    pub kind: KeyAccessType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
    pub protocol: KeyAccessProtocol,
    pub wrap_algorithm: WrapAlgorithm,
    #[serde(with = "base64_bytes")]
    pub wrapped_key: Vec<u8>,
    pub policy_binding: PolicyBinding,
}

impl KeyAccess {
    /// Creates a new KeyAccess object for a wrapped key and its binding
    pub fn new(wrap_algorithm: WrapAlgorithm, wrapped_key: Vec<u8>, binding_hash: Vec<u8>) -> Self {
        KeyAccess {
            kind: KeyAccessType::Wrapped,
            url: None,
            kid: None,
            protocol: KeyAccessProtocol::Kas,
            wrap_algorithm,
            wrapped_key,
            policy_binding: PolicyBinding {
                alg: BindingAlgorithm::Hs256,
                hash: binding_hash,
            },
        }
    }

    /// Record where and under which key id the payload key can be unwrapped
    #[must_use]
    pub fn with_location(mut self, url: Option<String>, kid: Option<String>) -> Self {
        self.url = url;
        self.kid = kid;
        self
    }
}

/// Policy binding structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyBinding {
    pub alg: BindingAlgorithm,
    #[serde(with = "base64_bytes")]
    pub hash: Vec<u8>,
}

/// Encryption method configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EncryptionMethod {
    pub algorithm: EncryptionAlgorithm,
    pub is_streamable: bool,
}

impl Default for EncryptionMethod {
    fn default() -> Self {
        Self {
            algorithm: EncryptionAlgorithm::Aes256Gcm,
            is_streamable: true,
        }
    }
}

/// Integrity information including segments and root signature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct IntegrityInformation {
    pub root_signature: RootSignature,
    pub segment_hash_alg: SegmentHashAlgorithm,
    pub segment_size_default: u64,
    pub encrypted_segment_size_default: u64,
    pub segments: Vec<Segment>,
}

/// Root signature for integrity verification
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RootSignature {
    pub alg: BindingAlgorithm,
    #[serde(with = "base64_bytes")]
    pub sig: Vec<u8>,
}

/// Segment information
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Segment {
    pub offset: u64,
    /// Stored size (IV + ciphertext + tag)
    pub length: u64,
    pub plaintext_length: u64,
    #[serde(with = "base64_bytes")]
    pub hash: Vec<u8>,
}

impl Manifest {
    /// Serialize to canonical bytes
    pub fn to_canonical_bytes(&self) -> Result<Vec<u8>, ManifestError> {
        serde_json::to_vec(self).map_err(ManifestError::from)
    }

    /// Parse and validate canonical manifest bytes
    pub fn from_canonical_bytes(bytes: &[u8]) -> Result<Self, ManifestError> {
        let manifest: Manifest = serde_json::from_slice(bytes)?;
        if manifest.to_canonical_bytes()? != bytes {
            return Err(ManifestError::NonCanonical);
        }
        manifest.validate()?;
        Ok(manifest)
    }

    /// Bytes covered by the root signature: the canonical manifest with an
    /// empty signature
    pub fn signing_bytes(&self) -> Result<Vec<u8>, ManifestError> {
        let mut unsigned = self.clone();
        unsigned
            .encryption_information
            .integrity_information
            .root_signature
            .sig
            .clear();
        unsigned.to_canonical_bytes()
    }

    /// Full structural validation, including the root signature size
    pub fn validate(&self) -> Result<(), ManifestError> {
        self.validate_unsigned()?;
        let sig = &self.encryption_information.integrity_information.root_signature.sig;
        if sig.len() != HS256_DIGEST_SIZE {
            return Err(invalid(format!(
                "root signature is {} bytes, expected {}",
                sig.len(),
                HS256_DIGEST_SIZE
            )));
        }
        Ok(())
    }

    /// Validation of everything the root signature does not carry
    fn validate_unsigned(&self) -> Result<(), ManifestError> {
        if self.schema_version != SCHEMA_VERSION {
            return Err(ManifestError::UnsupportedSchema(self.schema_version.clone()));
        }
        if !self.payload.is_encrypted {
            return Err(invalid("payload is not marked encrypted"));
        }

        let info = &self.encryption_information;
        if info.key_access.wrapped_key.is_empty() {
            return Err(invalid("wrapped key is empty"));
        }
        if info.key_access.policy_binding.hash.len() != HS256_DIGEST_SIZE {
            return Err(invalid("policy binding digest has the wrong size"));
        }
        self.validate_segments()?;

        let policy = Policy::from_canonical_bytes(&info.policy)?;
        policy.validate()?;
        Ok(())
    }

    fn validate_segments(&self) -> Result<(), ManifestError> {
        let integrity = &self.encryption_information.integrity_information;
        let segment_size = integrity.segment_size_default;
        if segment_size == 0 {
            return Err(invalid("segment size must be greater than zero"));
        }
        if segment_size.checked_add(SEGMENT_OVERHEAD) != Some(integrity.encrypted_segment_size_default)
        {
            return Err(invalid("encrypted segment size disagrees with segment size"));
        }

        let segments = &integrity.segments;
        if segments.is_empty() {
            return Err(invalid("segment list is empty"));
        }

        let digest_size = integrity.segment_hash_alg.digest_size();
        let last = segments.len() - 1;
        let mut offset: u64 = 0;
        let mut plaintext_total: u64 = 0;

        for (index, segment) in segments.iter().enumerate() {
            if segment.offset != offset {
                return Err(invalid(format!("segment {} is not contiguous", index)));
            }
            if segment.plaintext_length.checked_add(SEGMENT_OVERHEAD) != Some(segment.length) {
                return Err(invalid(format!("segment {} length disagrees with plaintext length", index)));
            }
            let full = segment.plaintext_length == segment_size;
            let fits = segment.plaintext_length <= segment_size;
            // Only the last segment may be short, and only a lone segment may be empty
            let size_ok = if index < last {
                full
            } else {
                fits && (segment.plaintext_length > 0 || last == 0)
            };
            if !size_ok {
                return Err(invalid(format!("segment {} size is inconsistent", index)));
            }
            if segment.hash.len() != digest_size {
                return Err(invalid(format!("segment {} digest has the wrong size", index)));
            }

            offset = offset
                .checked_add(segment.length)
                .ok_or_else(|| invalid("segment offsets overflow"))?;
            plaintext_total = plaintext_total
                .checked_add(segment.plaintext_length)
                .ok_or_else(|| invalid("segment sizes overflow"))?;
        }

        if offset != self.payload.length {
            return Err(invalid("segments do not cover the payload length"));
        }
        if plaintext_total != self.payload.plaintext_length {
            return Err(invalid("segments do not cover the plaintext length"));
        }
        Ok(())
    }

    /// Decode the bound policy
    pub fn policy(&self) -> Result<Policy, ManifestError> {
        Policy::from_canonical_bytes(&self.encryption_information.policy).map_err(ManifestError::from)
    }

    /// Canonical policy bytes as bound
    pub fn policy_bytes(&self) -> &[u8] {
        &self.encryption_information.policy
    }

    pub fn key_access(&self) -> &KeyAccess {
        &self.encryption_information.key_access
    }

    pub fn integrity(&self) -> &IntegrityInformation {
        &self.encryption_information.integrity_information
    }

    /// Store the root signature
    pub fn set_root_signature(&mut self, sig: Vec<u8>) {
        self.encryption_information
            .integrity_information
            .root_signature
            .sig = sig;
    }

    /// Serialize to pretty JSON for display
    pub fn to_json_pretty(&self) -> Result<String, ManifestError> {
        serde_json::to_string_pretty(self).map_err(ManifestError::from)
    }
}

fn invalid(reason: impl Into<String>) -> ManifestError {
    ManifestError::Invalid(reason.into())
}

/// Builder for an unsigned manifest
///
/// Payload lengths are derived from the segments. The result carries an empty
/// root signature, to be filled in once the signing bytes are known.
#[derive(Debug)]
pub struct ManifestBuilder {
    policy: Vec<u8>,
    key_access: Option<KeyAccess>,
    segment_hash_alg: SegmentHashAlgorithm,
    segment_size: u64,
    segments: Vec<Segment>,
    mime_type: Option<String>,
}

impl ManifestBuilder {
    /// Start a manifest bound to `policy`
    pub fn new(policy: &Policy) -> Result<Self, ManifestError> {
        Ok(Self {
            policy: policy.to_canonical_bytes()?,
            key_access: None,
            segment_hash_alg: SegmentHashAlgorithm::default(),
            segment_size: 0,
            segments: Vec::new(),
            mime_type: None,
        })
    }

    #[must_use]
    pub fn key_access(mut self, key_access: KeyAccess) -> Self {
        self.key_access = Some(key_access);
        self
    }

    #[must_use]
    pub fn segment_hash_alg(mut self, alg: SegmentHashAlgorithm) -> Self {
        self.segment_hash_alg = alg;
        self
    }

    #[must_use]
    pub fn segment_size(mut self, size: u64) -> Self {
        self.segment_size = size;
        self
    }

    #[must_use]
    pub fn segments(mut self, segments: impl IntoIterator<Item = Segment>) -> Self {
        self.segments.extend(segments);
        self
    }

    #[must_use]
    pub fn mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    /// Assemble and validate the unsigned manifest
    pub fn build(self) -> Result<Manifest, ManifestError> {
        let key_access = self
            .key_access
            .ok_or_else(|| invalid("key access is required"))?;
        let length = self.segments.iter().map(|s| s.length).sum();
        let plaintext_length = self.segments.iter().map(|s| s.plaintext_length).sum();

        let manifest = Manifest {
            schema_version: SCHEMA_VERSION.to_string(),
            payload: Payload {
                kind: PayloadKind::Embedded,
                mime_type: self.mime_type,
                is_encrypted: true,
                length,
                plaintext_length,
            },
            encryption_information: EncryptionInformation {
                kind: EncryptionType::Split,
                key_access,
                method: EncryptionMethod::default(),
                integrity_information: IntegrityInformation {
                    root_signature: RootSignature::default(),
                    segment_hash_alg: self.segment_hash_alg,
                    segment_size_default: self.segment_size,
                    encrypted_segment_size_default: self.segment_size.saturating_add(SEGMENT_OVERHEAD),
                    segments: self.segments,
                },
                policy: self.policy,
            },
        };
        manifest.validate_unsigned()?;
        Ok(manifest)
    }
}
