//! Injectable randomness
//!
//! Every key, nonce, and wrap seed the engine produces is drawn from a
//! [`RandomSource`]. Production code uses [`OsRandom`]; [`SeededRandom`]
//! makes container output reproducible for a given seed.

use parking_lot::Mutex;
use rand::{
    rngs::{OsRng, StdRng},
    CryptoRng, RngCore, SeedableRng,
};

/// A cryptographically secure random source shared across calls
///
/// Implementations must be safe to call concurrently from many threads.
pub trait RandomSource: Send + Sync {
    /// Fill `dest` with random bytes
    fn fill(&self, dest: &mut [u8]);
}

/// Operating system CSPRNG
#[derive(Debug, Default, Clone, Copy)]
pub struct OsRandom;

impl RandomSource for OsRandom {
    fn fill(&self, dest: &mut [u8]) {
        OsRng.fill_bytes(dest);
    }
}

/// Deterministic CSPRNG seeded by the caller
pub struct SeededRandom {
    rng: Mutex<StdRng>,
}

impl SeededRandom {
    /// Seed from a 64-bit value
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Seed from 32 bytes of caller-provided entropy
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self {
            rng: Mutex::new(StdRng::from_seed(seed)),
        }
    }
}

impl RandomSource for SeededRandom {
    fn fill(&self, dest: &mut [u8]) {
        self.rng.lock().fill_bytes(dest);
    }
}

impl std::fmt::Debug for SeededRandom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeededRandom").finish_non_exhaustive()
    }
}

/// Exposes a [`RandomSource`] as a `rand` RNG for APIs such as RSA-OAEP
pub struct RngAdapter<'a> {
    source: &'a dyn RandomSource,
}

impl<'a> RngAdapter<'a> {
    pub fn new(source: &'a dyn RandomSource) -> Self {
        Self { source }
    }
}

impl RngCore for RngAdapter<'_> {
    fn next_u32(&mut self) -> u32 {
        let mut buf = [0u8; 4];
        self.source.fill(&mut buf);
        u32::from_le_bytes(buf)
    }

    fn next_u64(&mut self) -> u64 {
        let mut buf = [0u8; 8];
        self.source.fill(&mut buf);
        u64::from_le_bytes(buf)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.source.fill(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.source.fill(dest);
        Ok(())
    }
}

// Every RandomSource is required to be cryptographically secure.
impl CryptoRng for RngAdapter<'_> {}
