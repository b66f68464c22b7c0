// Parallelizes the hash kernel across CPU cores: one thread per core,
// each searching a disjoint nonce range, racing to a channel that
// yields the first winner. Generalized over an injected hash algorithm
// and an injected cancellation source instead of a single hard-coded
// algorithm and a single hard-coded stop flag.
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;

use tracing::debug;

use crate::clock::Clock;
use crate::error::{MiningError, Result};
use crate::hash::algorithm;
use crate::hash::kernel::{self, CancelSignal};
use crate::header;
use crate::target::HashTarget;
use crate::version::ChainwebVersion;

/// Per-worker starting-nonce stride: large enough that, across realistic
/// run durations, no two workers hash the same (nonce, time) pair
/// before one of them succeeds.
const WORKER_NONCE_STRIDE: u64 = 1 << 56;

/// A single successful search result: the mutated header buffer.
pub struct PoolResult {
    pub buf: Vec<u8>,
}

/// Folds the supervisor's preemption signal and the pool's own "a sibling
/// worker already won" signal into one cancellation check.
struct JoinedCancel {
    external: Arc<AtomicBool>,
    internal: Arc<AtomicBool>,
}

impl CancelSignal for JoinedCancel {
    fn is_cancelled(&self) -> bool {
        self.external.load(Ordering::Relaxed) || self.internal.load(Ordering::Relaxed)
    }
}

/// Runs `cores` independent kernel searches over clones of `template`,
/// returning the first one to find a nonce. All spawned threads have
/// terminated by the time this returns, whether it returns a result or
/// observes `external_cancel` first.
pub struct WorkerPool {
    cores: u16,
    version: ChainwebVersion,
}

impl WorkerPool {
    pub fn new(cores: u16, version: ChainwebVersion) -> Self {
        WorkerPool {
            cores: cores.max(1),
            version,
        }
    }

    /// Run the pool to completion. Returns `Ok(None)` if `external_cancel`
    /// fires before any worker succeeds. `hashes` is incremented by every
    /// worker for hash-rate reporting; it survives across runs so callers
    /// can track a cumulative count.
    pub fn run(
        &self,
        template: &[u8],
        target: &HashTarget,
        clock: Arc<dyn Clock>,
        external_cancel: Arc<AtomicBool>,
        hashes: Arc<AtomicU64>,
    ) -> Result<Option<PoolResult>> {
        let n0 = header::read_nonce(template);
        let internal_cancel = Arc::new(AtomicBool::new(false));

        if self.cores == 1 {
            let cancel = JoinedCancel {
                external: external_cancel,
                internal: internal_cancel,
            };
            return Ok(self.run_one(0, template, target, n0, clock.as_ref(), &cancel, hashes.as_ref()));
        }

        let (tx, rx) = mpsc::channel::<PoolResult>();
        let mut handles = Vec::with_capacity(self.cores as usize);

        for worker_id in 0..self.cores {
            let mut buf = template.to_vec();
            let target = *target;
            let version = self.version;
            let tx = tx.clone();
            let clock = clock.clone();
            let cancel = JoinedCancel {
                external: external_cancel.clone(),
                internal: internal_cancel.clone(),
            };
            let internal_cancel_for_winner = internal_cancel.clone();
            let worker_n0 = n0.wrapping_add((worker_id as u64).wrapping_mul(WORKER_NONCE_STRIDE));
            let hashes = hashes.clone();

            let handle = thread::Builder::new()
                .name(format!("mining-worker-{worker_id}"))
                .spawn(move || {
                    debug!(worker_id, "worker starting");
                    let mut algo = algorithm::for_version(version);
                    let result = kernel::search(
                        &mut buf,
                        &target,
                        worker_n0,
                        algo.as_mut(),
                        clock.as_ref(),
                        &cancel,
                        hashes.as_ref(),
                    );
                    if result.is_some() {
                        internal_cancel_for_winner.store(true, Ordering::Relaxed);
                        let _ = tx.send(PoolResult { buf });
                    }
                    debug!(worker_id, "worker stopping");
                })
                .map_err(|e| MiningError::ThreadSpawn(e.to_string()))?;
            handles.push(handle);
        }
        drop(tx);

        let found = rx.recv().ok();
        internal_cancel.store(true, Ordering::Relaxed);

        for handle in handles {
            let _ = handle.join();
        }

        Ok(found)
    }

    fn run_one(
        &self,
        worker_id: u16,
        template: &[u8],
        target: &HashTarget,
        n0: u64,
        clock: &dyn Clock,
        cancel: &dyn CancelSignal,
        hashes: &AtomicU64,
    ) -> Option<PoolResult> {
        debug!(worker_id, "worker starting (inline)");
        let mut buf = template.to_vec();
        let mut algo = algorithm::for_version(self.version);
        let result = kernel::search(&mut buf, target, n0, algo.as_mut(), clock, cancel, hashes);
        debug!(worker_id, "worker stopping (inline)");
        result.map(|_| PoolResult { buf })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SystemClock;
    use crate::header::HeaderView;

    fn header_with_nonce(nonce: u64, len: usize) -> Vec<u8> {
        let mut buf = vec![0u8; len];
        HeaderView::new(&mut buf).set_nonce(nonce);
        buf
    }

    #[test]
    fn single_core_trivial_target_succeeds() {
        let pool = WorkerPool::new(1, ChainwebVersion::Test);
        let template = header_with_nonce(0, 64);
        let target = HashTarget::MAX;
        let external_cancel = Arc::new(AtomicBool::new(false));
        let hashes = Arc::new(AtomicU64::new(0));

        let result = pool
            .run(&template, &target, Arc::new(SystemClock), external_cancel, hashes.clone())
            .unwrap();
        assert!(result.is_some());
        assert!(hashes.load(Ordering::Relaxed) >= 1);
    }

    #[test]
    fn multi_core_result_is_reverifiable_by_a_single_threaded_hasher() {
        use crate::hash::algorithm::{HashAlgorithm, Sha512Truncated256};

        let pool = WorkerPool::new(4, ChainwebVersion::Test);
        let template = header_with_nonce(0, 64);
        // A target with a rare but not quite trivial probability forces
        // actual iteration across all four workers rather than a
        // first-nonce win.
        let mut target_bytes = [0xffu8; 32];
        target_bytes[31] = 0x0f;
        let target = HashTarget::from_bytes(target_bytes);
        let external_cancel = Arc::new(AtomicBool::new(false));
        let hashes = Arc::new(AtomicU64::new(0));

        let result = pool
            .run(&template, &target, Arc::new(SystemClock), external_cancel, hashes)
            .unwrap()
            .expect("target is reachable within a bounded search");

        let mut algo = Sha512Truncated256::default();
        algo.update(&result.buf);
        let digest = algo.finalize_32_bytes();
        assert!(target.meets(&digest));
    }

    #[test]
    fn preemption_before_start_returns_none() {
        let pool = WorkerPool::new(4, ChainwebVersion::Test);
        let template = header_with_nonce(0, 64);
        let target = HashTarget::from_bytes([0u8; 32]);
        let external_cancel = Arc::new(AtomicBool::new(true));
        let hashes = Arc::new(AtomicU64::new(0));

        let result = pool
            .run(&template, &target, Arc::new(SystemClock), external_cancel, hashes)
            .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn worker_count_is_never_zero() {
        let pool = WorkerPool::new(0, ChainwebVersion::Test);
        assert_eq!(pool.cores, 1);
    }
}
