// The hash-algorithm capability: a small interface the kernel hashes
// through, selected per-job from the job's ChainwebVersion. Digest
// algorithm is treated as a capability ("produces a 32-byte digest of
// arbitrary input"), not a fixed choice.
use sha2::{Digest, Sha512_256};

use crate::version::ChainwebVersion;

pub trait HashAlgorithm: Send {
    /// Discard any buffered input and start a fresh digest.
    fn reset(&mut self);
    /// Feed bytes into the digest in progress.
    fn update(&mut self, data: &[u8]);
    /// Finalize the digest in progress into a 32-byte output and reset,
    /// leaving the algorithm ready for the next `update` without a
    /// separate `reset` call.
    fn finalize_32_bytes(&mut self) -> [u8; 32];
}

/// Truncated SHA-512/256: a SHA-512 run whose output is the standardized
/// 256-bit truncation, the default digest for every current chainweb
/// version.
#[derive(Default)]
pub struct Sha512Truncated256 {
    hasher: Sha512_256,
}

impl HashAlgorithm for Sha512Truncated256 {
    fn reset(&mut self) {
        self.hasher = Sha512_256::new();
    }

    fn update(&mut self, data: &[u8]) {
        Digest::update(&mut self.hasher, data);
    }

    fn finalize_32_bytes(&mut self) -> [u8; 32] {
        let digest = Digest::finalize_reset(&mut self.hasher);
        let mut out = [0u8; 32];
        out.copy_from_slice(&digest);
        out
    }
}

/// Select the digest algorithm for a version. Exhaustive over
/// `ChainwebVersion`'s variants by construction, so the enumeration and
/// the selection table can never drift apart: adding a version variant
/// without extending this match is a compile error.
pub fn for_version(version: ChainwebVersion) -> Box<dyn HashAlgorithm> {
    match version {
        ChainwebVersion::Test => Box::<Sha512Truncated256>::default(),
        ChainwebVersion::Simulation => Box::<Sha512Truncated256>::default(),
        ChainwebVersion::Testnet00 => Box::<Sha512Truncated256>::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn produces_32_bytes() {
        let mut algo = Sha512Truncated256::default();
        algo.reset();
        algo.update(b"hello world");
        let out = algo.finalize_32_bytes();
        assert_eq!(out.len(), 32);
    }

    #[test]
    fn reset_clears_prior_input() {
        let mut algo = Sha512Truncated256::default();
        algo.update(b"first");
        let first = algo.finalize_32_bytes();

        algo.reset();
        algo.update(b"first");
        let second = algo.finalize_32_bytes();

        assert_eq!(first, second);
    }

    #[test]
    fn every_version_selects_an_algorithm() {
        for v in [
            ChainwebVersion::Test,
            ChainwebVersion::Simulation,
            ChainwebVersion::Testnet00,
        ] {
            let mut algo = for_version(v);
            algo.reset();
            algo.update(b"x");
            assert_eq!(algo.finalize_32_bytes().len(), 32);
        }
    }
}
