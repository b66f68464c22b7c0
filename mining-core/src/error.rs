// Error types for the mining core
use thiserror::Error;

/// Errors the mining core can surface: transient internal failures
/// (fatal to the current run only), caller misuse (rejected
/// synchronously from `submit`), and decoder failures on an otherwise
/// successful search.
#[derive(Error, Debug)]
pub enum MiningError {
    #[error("digest computation failed")]
    DigestFailure,

    #[error("failed to spawn worker thread: {0}")]
    ThreadSpawn(String),

    #[error("header length mismatch: expected {expected} bytes, got {actual}")]
    InvalidHeaderLength { expected: usize, actual: usize },

    #[error("malformed target field")]
    MalformedTarget,

    #[error("failed to decode mined header: {0}")]
    DecoderFailure(String),

    #[error("unknown chainweb version wire tag: 0x{0:08x}")]
    UnknownVersionTag(u32),

    #[error("unknown chainweb version name: {0}")]
    UnknownVersionName(String),
}

pub type Result<T> = std::result::Result<T, MiningError>;
