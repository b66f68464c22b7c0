// The byte-offset contract the core shares with the enclosing node:
// bytes [0,8) are the nonce, bytes [8,16) are the creation time in
// epoch microseconds, everything else is opaque to us.
use crate::target::HashTarget;

pub const NONCE_RANGE: std::ops::Range<usize> = 0..8;
pub const TIME_RANGE: std::ops::Range<usize> = 8..16;

/// A typed view over a serialized header buffer, restricted to the two
/// fields the hash kernel is allowed to mutate. Named field slices avoid
/// re-serializing the header on every iteration of the hot loop.
pub struct HeaderView<'a> {
    buf: &'a mut [u8],
}

impl<'a> HeaderView<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        HeaderView { buf }
    }

    pub fn set_nonce(&mut self, nonce: u64) {
        self.buf[NONCE_RANGE].copy_from_slice(&nonce.to_le_bytes());
    }

    pub fn set_creation_time_micros(&mut self, micros: u64) {
        self.buf[TIME_RANGE].copy_from_slice(&micros.to_le_bytes());
    }

    pub fn nonce(&self) -> u64 {
        read_nonce(self.buf)
    }
}

/// Read the nonce field out of a header buffer without needing a mutable
/// borrow, used by the pool to compute each worker's starting nonce.
pub fn read_nonce(buf: &[u8]) -> u64 {
    let mut word = [0u8; 8];
    word.copy_from_slice(&buf[NONCE_RANGE]);
    u64::from_le_bytes(word)
}

/// What the core learns about a job from the opaque header buffer, via
/// the external decoder. `chain_id`/`block_height` key the results map;
/// `target` is copied out once at job submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedHeader {
    pub chain_id: u32,
    pub block_height: u64,
    pub target: HashTarget,
}

/// The results-map key: `(chain_id, block_height)`.
pub type JobKey = (u32, u64);

impl DecodedHeader {
    pub fn key(&self) -> JobKey {
        (self.chain_id, self.block_height)
    }
}

/// The external decoder capability: converts a serialized buffer to the
/// fields the core needs, and converts a mutated buffer back into the
/// caller's `BlockHeader` type `H`.
///
/// `H` is the caller's opaque block header type; the core never inspects
/// it beyond what `decode` extracts.
pub trait HeaderCodec<H> {
    type Error: std::fmt::Display;

    /// Extract `(chain_id, block_height, target)` from a serialized header.
    /// Must reject a buffer whose length is not the codec's fixed `L`, or
    /// whose target field is malformed.
    fn decode_job(&self, bytes: &[u8]) -> Result<DecodedHeader, Self::Error>;

    /// Re-parse a buffer that has had only bytes `[0,16)` mutated by the
    /// kernel back into the caller's header type. A failure here indicates
    /// a layout assumption violation and is fatal to the run.
    fn decode_header(&self, bytes: &[u8]) -> Result<H, Self::Error>;

    /// Fixed serialized length `L` this codec expects.
    fn header_len(&self) -> usize;
}
