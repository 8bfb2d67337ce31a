//! Engine facade
//!
//! [`TdfEngine`] holds only immutable configuration and can be shared across
//! threads. Every call generates its own payload key and nonces.
//!
//! # Example
//!
//! ```
//! use tdf_engine::{Policy, TdfEngine};
//!
//! # fn example() -> Result<(), tdf_engine::TdfError> {
//! let engine = TdfEngine::with_local_keys();
//! let policy = Policy::with_attributes([("clearance", "public")]);
//!
//! let container = engine.encrypt("hello world", &policy)?;
//! assert_eq!(engine.decrypt(&container)?, "hello world");
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

use crate::authority::{KeyAuthority, LocalKeyAuthority};
use crate::binding;
use crate::config::{ConfigError, EngineSettings};
use crate::decrypt::Decoded;
use crate::error::TdfError;
use crate::manifest::{hash_kind, to_manifest_segments, ManifestExt};
use std::fmt;
use std::sync::Arc;
use tdf_engine_crypto::rsa::RsaPublicKey;
use tdf_engine_crypto::{
    encrypt_segments, public_key_from_pem, AesGcmKem, BindingKey, KemError, KeyEncapsulation,
    LocalWrapKey, OaepHash, OsRandom, PayloadKey, RandomSource, RsaOaepKem,
};
use tdf_engine_protocol::{
    container, KeyAccess, Manifest, ManifestBuilder, Policy, SegmentHashAlgorithm, WrapAlgorithm,
};
use tracing::{debug, instrument};
use zeroize::Zeroizing;

/// Encrypted container bytes
#[derive(Clone, PartialEq, Eq)]
pub struct Container(Vec<u8>);

impl Container {
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Container(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for Container {
    fn from(bytes: Vec<u8>) -> Self {
        Container(bytes)
    }
}

impl AsRef<[u8]> for Container {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("len", &self.0.len())
            .finish()
    }
}

/// Key the payload key is wrapped under
#[derive(Debug, Clone)]
pub enum Recipient {
    Rsa {
        public_key: RsaPublicKey,
        hash: OaepHash,
    },
    Local {
        key: LocalWrapKey,
    },
}

impl Recipient {
    /// RSA-OAEP recipient with SHA-1 padding
    pub fn rsa(public_key: RsaPublicKey) -> Self {
        Recipient::Rsa {
            public_key,
            hash: OaepHash::Sha1,
        }
    }

    /// RSA-OAEP recipient with SHA-256 padding
    pub fn rsa_sha256(public_key: RsaPublicKey) -> Self {
        Recipient::Rsa {
            public_key,
            hash: OaepHash::Sha256,
        }
    }

    /// RSA-OAEP recipient from an SPKI PEM public key
    pub fn rsa_from_pem(pem: &str, hash: OaepHash) -> Result<Self, TdfError> {
        let public_key =
            public_key_from_pem(pem).map_err(|e| ConfigError::InvalidKey(e.to_string()))?;
        Ok(Recipient::Rsa { public_key, hash })
    }

    /// Local AES-256-GCM wrapping key
    pub fn local(key: LocalWrapKey) -> Self {
        Recipient::Local { key }
    }

    pub fn wrap_algorithm(&self) -> WrapAlgorithm {
        match self {
            Recipient::Rsa {
                hash: OaepHash::Sha1,
                ..
            } => WrapAlgorithm::RsaOaep,
            Recipient::Rsa {
                hash: OaepHash::Sha256,
                ..
            } => WrapAlgorithm::RsaOaep256,
            Recipient::Local { .. } => WrapAlgorithm::A256Gcmkw,
        }
    }

    fn wrap(&self, payload_key: &PayloadKey, rng: &dyn RandomSource) -> Result<Vec<u8>, KemError> {
        match self {
            Recipient::Rsa { public_key, hash } => {
                RsaOaepKem::new(*hash).wrap(payload_key.as_slice(), public_key, rng)
            }
            Recipient::Local { key } => AesGcmKem.wrap(payload_key.as_slice(), key, rng),
        }
    }
}

/// TDF encryption engine
pub struct TdfEngine {
    settings: EngineSettings,
    recipient: Recipient,
    binding_key: BindingKey,
    authority: Arc<dyn KeyAuthority>,
    rng: Arc<dyn RandomSource>,
}

impl TdfEngine {
    pub fn builder() -> TdfEngineBuilder {
        TdfEngineBuilder::new()
    }

    /// Engine that wraps to a freshly generated local key and unwraps through
    /// a permitting in-process authority holding the same key
    pub fn with_local_keys() -> Self {
        let wrap_key = LocalWrapKey::generate(&OsRandom);
        TdfEngine {
            settings: EngineSettings::default(),
            recipient: Recipient::local(wrap_key.clone()),
            binding_key: BindingKey::generate(&OsRandom),
            authority: Arc::new(LocalKeyAuthority::local(wrap_key)),
            rng: Arc::new(OsRandom),
        }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Encrypt UTF-8 text under `policy`
    pub fn encrypt(&self, plaintext: &str, policy: &Policy) -> Result<Container, TdfError> {
        self.encrypt_bytes(plaintext.as_bytes(), policy)
    }

    /// Encrypt arbitrary bytes under `policy`
    #[instrument(skip_all, fields(plaintext_len = plaintext.len(), policy = %policy.uuid))]
    pub fn encrypt_bytes(&self, plaintext: &[u8], policy: &Policy) -> Result<Container, TdfError> {
        policy.validate()?;
        let rng = self.rng.as_ref();

        let payload_key = PayloadKey::generate(rng);
        let segmented = encrypt_segments(
            &payload_key,
            plaintext,
            self.settings.segment_size,
            hash_kind(self.settings.segment_hash),
            rng,
        )
        .map_err(TdfError::Crypto)?;
        debug!(segments = segmented.segments.len(), "payload encrypted");

        let wrapped_key = self.recipient.wrap(&payload_key, rng)?;
        let canonical_policy = policy.to_canonical_bytes()?;
        let binding = binding::compute(&self.binding_key, &canonical_policy, &wrapped_key)?;
        debug!(wrap_algorithm = %self.recipient.wrap_algorithm(), "payload key wrapped and bound");

        let key_access = KeyAccess::new(self.recipient.wrap_algorithm(), wrapped_key, binding)
            .with_location(self.settings.key_url.clone(), self.settings.key_id.clone());
        let mut builder = ManifestBuilder::new(policy)?
            .key_access(key_access)
            .segment_hash_alg(self.settings.segment_hash)
            .segment_size(self.settings.segment_size as u64)
            .segments(to_manifest_segments(segmented.segments));
        if let Some(mime_type) = &self.settings.mime_type {
            builder = builder.mime_type(mime_type.clone());
        }
        let mut manifest = builder.build()?;
        manifest.seal(&payload_key)?;

        // Never emit a container whose binding does not verify
        binding::verify_manifest(&self.binding_key, &manifest)?;

        let bytes = container::encode(&manifest, &segmented.payload)?;
        debug!(container_len = bytes.len(), "container encoded");
        Ok(Container(bytes))
    }

    /// Decrypt a container holding UTF-8 text
    pub fn decrypt(&self, container: &Container) -> Result<String, TdfError> {
        let mut plaintext = self.open(container)?;
        String::from_utf8(std::mem::take(&mut *plaintext)).map_err(|e| {
            drop(Zeroizing::new(e.into_bytes()));
            TdfError::InvalidEncoding
        })
    }

    /// Decrypt a container holding arbitrary bytes
    pub fn decrypt_bytes(&self, container: &Container) -> Result<Vec<u8>, TdfError> {
        let mut plaintext = self.open(container)?;
        Ok(std::mem::take(&mut *plaintext))
    }

    /// Decode the manifest without any key material
    pub fn inspect(container: &Container) -> Result<Manifest, TdfError> {
        Ok(container::decode(container.as_bytes())?.manifest)
    }

    #[instrument(skip_all, fields(container_len = container.len()))]
    fn open(&self, container: &Container) -> Result<Zeroizing<Vec<u8>>, TdfError> {
        Decoded::decode(container.as_bytes())?
            .verify_policy(&self.binding_key)?
            .unwrap_key(self.authority.as_ref())?
            .verify_integrity()?
            .decrypt()
    }
}

impl fmt::Debug for TdfEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TdfEngine")
            .field("settings", &self.settings)
            .field("wrap_algorithm", &self.recipient.wrap_algorithm())
            .finish_non_exhaustive()
    }
}

/// Builder for [`TdfEngine`]
#[derive(Default)]
pub struct TdfEngineBuilder {
    settings: Option<EngineSettings>,
    recipient: Option<Recipient>,
    binding_key: Option<BindingKey>,
    authority: Option<Arc<dyn KeyAuthority>>,
    rng: Option<Arc<dyn RandomSource>>,
}

impl TdfEngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn settings(mut self, settings: EngineSettings) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Set the segment size (default: 2MB)
    #[must_use]
    pub fn segment_size(mut self, size: usize) -> Self {
        self.settings.get_or_insert_with(EngineSettings::default).segment_size = size;
        self
    }

    #[must_use]
    pub fn segment_hash(mut self, alg: SegmentHashAlgorithm) -> Self {
        self.settings.get_or_insert_with(EngineSettings::default).segment_hash = alg;
        self
    }

    #[must_use]
    pub fn recipient(mut self, recipient: Recipient) -> Self {
        self.recipient = Some(recipient);
        self
    }

    /// Key shared with the key authority for policy binding
    #[must_use]
    pub fn binding_key(mut self, key: BindingKey) -> Self {
        self.binding_key = Some(key);
        self
    }

    #[must_use]
    pub fn authority(mut self, authority: impl KeyAuthority + 'static) -> Self {
        self.authority = Some(Arc::new(authority));
        self
    }

    #[must_use]
    pub fn shared_authority(mut self, authority: Arc<dyn KeyAuthority>) -> Self {
        self.authority = Some(authority);
        self
    }

    /// Randomness for keys and nonces (default: operating system CSPRNG)
    #[must_use]
    pub fn random_source(mut self, rng: impl RandomSource + 'static) -> Self {
        self.rng = Some(Arc::new(rng));
        self
    }

    pub fn build(self) -> Result<TdfEngine, TdfError> {
        let settings = self.settings.unwrap_or_default();
        settings.validate()?;
        Ok(TdfEngine {
            settings,
            recipient: self.recipient.ok_or(ConfigError::MissingRecipient)?,
            binding_key: self.binding_key.ok_or(ConfigError::MissingBindingKey)?,
            authority: self.authority.ok_or(ConfigError::MissingAuthority)?,
            rng: self.rng.unwrap_or_else(|| Arc::new(OsRandom)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tdf_engine_crypto::SeededRandom;
    use tdf_engine_protocol::PolicyBuilder;

    fn assert_send_sync<T: Send + Sync>() {}

    fn policy() -> Policy {
        PolicyBuilder::new()
            .id("0b7e6f1c-6a51-4c1e-9a57-2f1f0e4f9d21")
            .attribute("clearance", "public")
            .build()
            .unwrap()
    }

    fn seeded_engine(seed: u64) -> TdfEngine {
        let keys = SeededRandom::new(1000);
        let wrap_key = LocalWrapKey::generate(&keys);
        TdfEngine::builder()
            .recipient(Recipient::local(wrap_key.clone()))
            .binding_key(BindingKey::generate(&keys))
            .authority(LocalKeyAuthority::local(wrap_key))
            .random_source(SeededRandom::new(seed))
            .segment_size(16)
            .build()
            .unwrap()
    }

    #[test]
    fn test_engine_is_send_sync() {
        assert_send_sync::<TdfEngine>();
        assert_send_sync::<Container>();
    }

    #[test]
    fn test_roundtrip_with_local_keys() {
        let engine = TdfEngine::with_local_keys();
        let container = engine.encrypt("hello world", &policy()).unwrap();
        assert_eq!(engine.decrypt(&container).unwrap(), "hello world");
    }

    #[test]
    fn test_deterministic_for_equal_seeds() {
        let a = seeded_engine(5).encrypt("same input", &policy()).unwrap();
        let b = seeded_engine(5).encrypt("same input", &policy()).unwrap();
        let c = seeded_engine(6).encrypt("same input", &policy()).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_inspect_needs_no_keys() {
        let engine = seeded_engine(1);
        let container = engine.encrypt("0123456789abcdefXYZ", &policy()).unwrap();
        let manifest = TdfEngine::inspect(&container).unwrap();

        assert_eq!(manifest.integrity().segments.len(), 2);
        assert_eq!(manifest.payload.plaintext_length, 19);
        assert_eq!(manifest.key_access().wrap_algorithm, WrapAlgorithm::A256Gcmkw);
        assert_eq!(manifest.policy().unwrap(), policy());
    }

    #[test]
    fn test_settings_recorded_in_manifest() {
        let wrap_key = LocalWrapKey::generate(&OsRandom);
        let settings = EngineSettings::from_json(
            r#"{"segmentSize":4,"segmentHash":"GMAC","mimeType":"text/plain","keyUrl":"https://kas.example.com","keyId":"r1"}"#,
        )
        .unwrap();
        let engine = TdfEngine::builder()
            .settings(settings)
            .recipient(Recipient::local(wrap_key.clone()))
            .binding_key(BindingKey::generate(&OsRandom))
            .authority(LocalKeyAuthority::local(wrap_key))
            .build()
            .unwrap();

        let container = engine.encrypt("abcdefghij", &policy()).unwrap();
        let manifest = TdfEngine::inspect(&container).unwrap();
        assert_eq!(manifest.integrity().segment_hash_alg, SegmentHashAlgorithm::Gmac);
        assert_eq!(manifest.integrity().segments.len(), 3);
        assert_eq!(manifest.payload.mime_type.as_deref(), Some("text/plain"));
        assert_eq!(manifest.key_access().kid.as_deref(), Some("r1"));
        assert_eq!(engine.decrypt(&container).unwrap(), "abcdefghij");
    }

    #[test]
    fn test_empty_plaintext_roundtrip() {
        let engine = seeded_engine(2);
        let container = engine.encrypt("", &policy()).unwrap();
        assert_eq!(TdfEngine::inspect(&container).unwrap().integrity().segments.len(), 1);
        assert_eq!(engine.decrypt(&container).unwrap(), "");
    }

    #[test]
    fn test_binary_payload_is_invalid_encoding() {
        let engine = seeded_engine(3);
        let container = engine.encrypt_bytes(&[0xFF, 0xFE, 0x00], &policy()).unwrap();
        assert!(matches!(
            engine.decrypt(&container),
            Err(TdfError::InvalidEncoding)
        ));
        assert_eq!(engine.decrypt_bytes(&container).unwrap(), vec![0xFF, 0xFE, 0x00]);
    }

    #[test]
    fn test_invalid_policy_rejected_before_encryption() {
        let engine = seeded_engine(4);
        let mut bad = policy();
        bad.uuid = "nope".to_string();
        assert!(matches!(
            engine.encrypt("x", &bad),
            Err(TdfError::Policy(_))
        ));
    }

    #[test]
    fn test_builder_reports_missing_pieces() {
        let missing_recipient = TdfEngine::builder()
            .binding_key(BindingKey::generate(&OsRandom))
            .build();
        assert!(matches!(
            missing_recipient,
            Err(TdfError::Config(ConfigError::MissingRecipient))
        ));

        let wrap_key = LocalWrapKey::generate(&OsRandom);
        let missing_authority = TdfEngine::builder()
            .recipient(Recipient::local(wrap_key))
            .binding_key(BindingKey::generate(&OsRandom))
            .build();
        assert!(matches!(
            missing_authority,
            Err(TdfError::Config(ConfigError::MissingAuthority))
        ));

        let zero_segments = TdfEngine::builder().segment_size(0).build();
        assert!(matches!(
            zero_segments,
            Err(TdfError::Config(ConfigError::InvalidSettings(_)))
        ));
    }

    #[test]
    fn test_container_debug_hides_bytes() {
        let container = Container::from_bytes(vec![1, 2, 3]);
        assert_eq!(format!("{:?}", container), "Container { len: 3 }");
    }
}
