//! Secure random source
//!
//! Randomness is passed in explicitly rather than pulled from a global, so
//! tests can substitute a deterministic source for IVs and salts.

use rand::rngs::OsRng;
use rand::RngCore;

use crate::error::{EnvelopeError, EnvelopeResult};

/// A source of cryptographically secure random bytes
pub trait EntropySource: Send + Sync {
    /// Fill `buf` entirely with random bytes
    fn fill(&self, buf: &mut [u8]) -> EnvelopeResult<()>;
}

/// Operating system CSPRNG
#[derive(Debug, Clone, Copy, Default)]
pub struct OsEntropy;

impl EntropySource for OsEntropy {
    fn fill(&self, buf: &mut [u8]) -> EnvelopeResult<()> {
        OsRng
            .try_fill_bytes(buf)
            .map_err(|e| EnvelopeError::Crypto(format!("Random source failed: {}", e)))
    }
}

impl<E: EntropySource + ?Sized> EntropySource for &E {
    fn fill(&self, buf: &mut [u8]) -> EnvelopeResult<()> {
        (**self).fill(buf)
    }
}

impl<E: EntropySource + ?Sized> EntropySource for std::sync::Arc<E> {
    fn fill(&self, buf: &mut [u8]) -> EnvelopeResult<()> {
        (**self).fill(buf)
    }
}

/// Draw `N` random bytes from `source`
pub fn random_array<const N: usize>(source: &dyn EntropySource) -> EnvelopeResult<[u8; N]> {
    let mut buf = [0u8; N];
    source.fill(&mut buf)?;
    Ok(buf)
}
