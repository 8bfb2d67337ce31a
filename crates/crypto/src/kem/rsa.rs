//! RSA-OAEP Key Encapsulation Mechanism
//!
//! This module implements RSA-OAEP key wrapping of the payload key.
//! SHA-1 OAEP is available for interoperability with existing OpenTDF
//! deployments; SHA-256 is recommended for new recipients.
//!
//! The RustCrypto `rsa` backend is subject to RUSTSEC-2023-0071 (Marvin)
//! timing side channels on decryption. Unwrap errors are collapsed into a
//! single variant so callers cannot distinguish padding failures.

use super::{KemError, KeyEncapsulation};
use crate::random::{RandomSource, RngAdapter};
use ::rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey, LineEnding};
use ::rsa::traits::PublicKeyParts;
use ::rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use sha1::Sha1;
use sha2::Sha256;
use zeroize::Zeroizing;

/// Smallest modulus accepted for recipient keys
pub const MIN_RSA_BITS: usize = 2048;

/// OAEP hash algorithm selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OaepHash {
    /// SHA-1 (interoperable default)
    #[default]
    Sha1,

    /// SHA-256 (recommended for new deployments)
    Sha256,
}

/// RSA-OAEP key encapsulation mechanism
#[derive(Debug, Clone, Copy, Default)]
pub struct RsaOaepKem {
    /// Hash algorithm for OAEP padding
    pub hash: OaepHash,
}

impl RsaOaepKem {
    /// Create a new RSA-OAEP KEM with the specified hash algorithm
    pub fn new(hash: OaepHash) -> Self {
        RsaOaepKem { hash }
    }

    /// Create with SHA-1
    pub fn with_sha1() -> Self {
        Self::new(OaepHash::Sha1)
    }

    /// Create with SHA-256
    pub fn with_sha256() -> Self {
        Self::new(OaepHash::Sha256)
    }

    fn padding(&self) -> Oaep {
        match self.hash {
            OaepHash::Sha1 => Oaep::new::<Sha1>(),
            OaepHash::Sha256 => Oaep::new::<Sha256>(),
        }
    }
}

impl KeyEncapsulation for RsaOaepKem {
    type PublicKey = RsaPublicKey;
    type PrivateKey = RsaPrivateKey;

    fn wrap(
        &self,
        key: &[u8],
        public_key: &RsaPublicKey,
        rng: &dyn RandomSource,
    ) -> Result<Vec<u8>, KemError> {
        check_modulus(public_key)?;
        let mut rng = RngAdapter::new(rng);
        public_key
            .encrypt(&mut rng, self.padding(), key)
            .map_err(|e| KemError::WrapError(format!("RSA-OAEP encryption failed: {}", e)))
    }

    fn unwrap(
        &self,
        wrapped: &[u8],
        private_key: &RsaPrivateKey,
    ) -> Result<Zeroizing<Vec<u8>>, KemError> {
        private_key
            .decrypt(self.padding(), wrapped)
            .map(Zeroizing::new)
            .map_err(|_| KemError::UnwrapError)
    }
}

fn check_modulus(public_key: &RsaPublicKey) -> Result<(), KemError> {
    let bits = public_key.size() * 8;
    if bits < MIN_RSA_BITS {
        return Err(KemError::KeyTooSmall {
            bits,
            min: MIN_RSA_BITS,
        });
    }
    Ok(())
}

/// Parse a PEM-encoded SPKI RSA public key
pub fn public_key_from_pem(pem: &str) -> Result<RsaPublicKey, KemError> {
    let public_key = RsaPublicKey::from_public_key_pem(pem)
        .map_err(|e| KemError::InvalidKey(format!("Failed to parse RSA public key: {}", e)))?;
    check_modulus(&public_key)?;
    Ok(public_key)
}

/// RSA key pair held by a key authority
#[derive(Clone)]
pub struct RsaKeyPair {
    private_key: RsaPrivateKey,
    public_key: RsaPublicKey,
}

impl RsaKeyPair {
    /// Generate a new random key pair
    pub fn generate(bits: usize, rng: &dyn RandomSource) -> Result<Self, KemError> {
        if bits < MIN_RSA_BITS {
            return Err(KemError::KeyTooSmall {
                bits,
                min: MIN_RSA_BITS,
            });
        }
        let mut rng = RngAdapter::new(rng);
        let private_key = RsaPrivateKey::new(&mut rng, bits)
            .map_err(|e| KemError::InvalidKey(format!("RSA key generation failed: {}", e)))?;
        Ok(Self::from_private_key(private_key))
    }

    /// Create from an existing private key in PKCS#8 PEM format
    pub fn from_pkcs8_pem(pem: &str) -> Result<Self, KemError> {
        let private_key = RsaPrivateKey::from_pkcs8_pem(pem)
            .map_err(|e| KemError::InvalidKey(format!("Failed to parse RSA private key: {}", e)))?;
        let pair = Self::from_private_key(private_key);
        check_modulus(&pair.public_key)?;
        Ok(pair)
    }

    fn from_private_key(private_key: RsaPrivateKey) -> Self {
        let public_key = RsaPublicKey::from(&private_key);
        Self {
            private_key,
            public_key,
        }
    }

    pub fn private_key(&self) -> &RsaPrivateKey {
        &self.private_key
    }

    pub fn public_key(&self) -> &RsaPublicKey {
        &self.public_key
    }

    /// Public key in SPKI PEM format
    pub fn public_key_pem(&self) -> Result<String, KemError> {
        self.public_key
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| KemError::EncodingError(e.to_string()))
    }

    /// Private key in PKCS#8 PEM format
    pub fn private_key_pem(&self) -> Result<Zeroizing<String>, KemError> {
        self.private_key
            .to_pkcs8_pem(LineEnding::LF)
            .map_err(|e| KemError::EncodingError(e.to_string()))
    }
}

impl std::fmt::Debug for RsaKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RsaKeyPair")
            .field("bits", &(self.public_key.size() * 8))
            .finish_non_exhaustive()
    }
}
