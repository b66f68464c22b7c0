// 256-bit difficulty target and the little-endian comparison the kernel
// checks every hash against.

/// A 256-bit unsigned target, stored as 32 bytes / four little-endian u64
/// limbs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashTarget(pub [u8; 32]);

impl HashTarget {
    pub const MAX: HashTarget = HashTarget([0xff; 32]);

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        HashTarget(bytes)
    }

    fn limbs(&self) -> [u64; 4] {
        let mut limbs = [0u64; 4];
        for (i, limb) in limbs.iter_mut().enumerate() {
            let mut word = [0u8; 8];
            word.copy_from_slice(&self.0[i * 8..i * 8 + 8]);
            *limb = u64::from_le_bytes(word);
        }
        limbs
    }

    /// `true` iff `digest` interpreted as a little-endian 256-bit unsigned
    /// integer is less than or equal to this target (the bound is
    /// inclusive).
    pub fn meets(&self, digest: &[u8; 32]) -> bool {
        let target_limbs = self.limbs();
        let digest_target = HashTarget(*digest);
        let digest_limbs = digest_target.limbs();

        for i in (0..4).rev() {
            if digest_limbs[i] < target_limbs[i] {
                return true;
            }
            if digest_limbs[i] > target_limbs[i] {
                return false;
            }
        }
        // All limbs equal.
        true
    }
}
