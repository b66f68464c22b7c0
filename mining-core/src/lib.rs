// Chainweb-style mining core: the mining supervisor and the inner
// hashing loop it dispatches across worker threads.
//
// Networking, CLI surface, persistence, and the block header's wire
// format are owned by the caller; this crate only needs a fixed-length
// byte buffer with nonce/creation-time at bytes [0,16) and a decoder for
// the rest (see `header::HeaderCodec`).

pub mod clock;
pub mod error;
pub mod hash;
pub mod header;
pub mod mailbox;
pub mod pool;
pub mod supervisor;
pub mod target;
pub mod version;

pub use clock::{Clock, SystemClock};
pub use error::{MiningError, Result};
pub use header::{DecodedHeader, HeaderCodec, HeaderView, JobKey};
pub use pool::{PoolResult, WorkerPool};
pub use supervisor::Supervisor;
pub use target::HashTarget;
pub use version::ChainwebVersion;
