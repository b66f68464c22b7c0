// The inner hashing loop. Mutates a serialized header buffer in place
// and re-hashes it until either the digest meets the target or
// cancellation is observed.
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crate::clock::Clock;
use crate::hash::algorithm::HashAlgorithm;
use crate::header::HeaderView;
use crate::target::HashTarget;

/// Number of hashes between creation-time refreshes and cancellation
/// checks.
pub const HASH_BATCH: u64 = 100_000;

/// Cooperative cancellation check. The pool may need to fold several
/// independent signals (supervisor preemption, a sibling worker's
/// success) into one of these.
pub trait CancelSignal: Send + Sync {
    fn is_cancelled(&self) -> bool;
}

impl CancelSignal for AtomicBool {
    fn is_cancelled(&self) -> bool {
        self.load(Ordering::Relaxed)
    }
}

/// Search `buf` for a nonce whose digest meets `target`, starting from
/// `n0`. Returns the winning nonce, or `None` if `cancel` was observed
/// first. On success `buf` is left with the winning nonce and the
/// creation time of the last refresh already written into it.
///
/// `hashes` is incremented once per iteration for hash-rate reporting; it
/// plays no role in the search itself.
pub fn search(
    buf: &mut [u8],
    target: &HashTarget,
    n0: u64,
    algorithm: &mut dyn HashAlgorithm,
    clock: &dyn Clock,
    cancel: &dyn CancelSignal,
    hashes: &AtomicU64,
) -> Option<u64> {
    let mut nonce = n0;
    let mut i: u64 = 0;

    if cancel.is_cancelled() {
        return None;
    }

    loop {
        if i == HASH_BATCH {
            HeaderView::new(buf).set_creation_time_micros(clock.now_micros());
            i = 0;
            if cancel.is_cancelled() {
                return None;
            }
        }

        HeaderView::new(buf).set_nonce(nonce);

        algorithm.update(buf);
        let digest = algorithm.finalize_32_bytes();
        hashes.fetch_add(1, Ordering::Relaxed);

        if target.meets(&digest) {
            return Some(nonce);
        }

        i += 1;
        nonce = nonce.wrapping_add(1);
    }
}
