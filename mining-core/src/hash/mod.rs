pub mod algorithm;
pub mod kernel;

pub use algorithm::{for_version, HashAlgorithm, Sha512Truncated256};
pub use kernel::{search, HASH_BATCH};
