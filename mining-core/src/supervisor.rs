// Owns the single-slot job mailbox and the results map; races each job
// against preemption and publishes results.
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use tracing::{info, warn};

use crate::clock::Clock;
use crate::error::{MiningError, Result};
use crate::header::{DecodedHeader, HeaderCodec, JobKey};
use crate::mailbox::Mailbox;
use crate::pool::WorkerPool;
use crate::version::ChainwebVersion;

enum WorkItem {
    Job(Vec<u8>),
    Shutdown,
}

struct Inner<H, C> {
    mailbox: Arc<Mailbox<WorkItem>>,
    results: Mutex<HashMap<JobKey, H>>,
    cores: u16,
    version: ChainwebVersion,
    codec: C,
    clock: Arc<dyn Clock>,
    hashes: Arc<AtomicU64>,
    jobs_submitted: AtomicU64,
    jobs_completed: AtomicU64,
    jobs_preempted: AtomicU64,
}

/// A cheaply-cloneable handle onto one mining supervisor. `submit` and
/// `poll` are the two non-blocking operations the enclosing node calls;
/// the background mining loop lives on the thread returned by
/// `Supervisor::spawn`.
pub struct Supervisor<H, C> {
    inner: Arc<Inner<H, C>>,
}

impl<H, C> Clone for Supervisor<H, C> {
    fn clone(&self) -> Self {
        Supervisor {
            inner: self.inner.clone(),
        }
    }
}

impl<H, C> Supervisor<H, C>
where
    H: Send + Sync + Clone + 'static,
    C: HeaderCodec<H> + Send + Sync + 'static,
{
    /// Start the supervisor's background mining loop. Returns a handle for
    /// `submit`/`poll` plus the loop's join handle, which the caller joins
    /// after calling `shutdown`.
    pub fn spawn(
        cores: u16,
        version: ChainwebVersion,
        codec: C,
        clock: Arc<dyn Clock>,
    ) -> (Self, thread::JoinHandle<()>) {
        let inner = Arc::new(Inner {
            mailbox: Arc::new(Mailbox::new()),
            results: Mutex::new(HashMap::new()),
            cores: cores.max(1),
            version,
            codec,
            clock,
            hashes: Arc::new(AtomicU64::new(0)),
            jobs_submitted: AtomicU64::new(0),
            jobs_completed: AtomicU64::new(0),
            jobs_preempted: AtomicU64::new(0),
        });

        let loop_inner = inner.clone();
        let handle = thread::Builder::new()
            .name("mining-supervisor".to_string())
            .spawn(move || run_loop(loop_inner))
            .expect("failed to spawn mining supervisor thread");

        (Supervisor { inner }, handle)
    }

    /// Place `header` into the mailbox, replacing any pending job.
    /// Rejects malformed headers synchronously without touching the
    /// mailbox.
    pub fn submit(&self, header: Vec<u8>) -> Result<()> {
        let decoded = self.decode_job(&header)?;
        info!(chain_id = decoded.chain_id, height = decoded.block_height, "job submitted");
        self.inner.jobs_submitted.fetch_add(1, Ordering::Relaxed);
        self.inner.mailbox.put(WorkItem::Job(header));
        Ok(())
    }

    /// Look up a completed header by key. Never blocks.
    pub fn poll(&self, key: JobKey) -> Option<H> {
        self.inner.results.lock().unwrap().get(&key).cloned()
    }

    /// Signal the background loop to stop after its current job (if any)
    /// is preempted. Join the handle returned by `spawn` to wait for it.
    pub fn shutdown(&self) {
        self.inner.mailbox.put(WorkItem::Shutdown);
    }

    /// Cumulative hash count across every job run so far, for hash-rate
    /// reporting.
    pub fn hashes_computed(&self) -> u64 {
        self.inner.hashes.load(Ordering::Relaxed)
    }

    pub fn jobs_submitted(&self) -> u64 {
        self.inner.jobs_submitted.load(Ordering::Relaxed)
    }

    pub fn jobs_completed(&self) -> u64 {
        self.inner.jobs_completed.load(Ordering::Relaxed)
    }

    pub fn jobs_preempted(&self) -> u64 {
        self.inner.jobs_preempted.load(Ordering::Relaxed)
    }

    fn decode_job(&self, header: &[u8]) -> Result<DecodedHeader> {
        let expected = self.inner.codec.header_len();
        if header.len() != expected {
            return Err(MiningError::InvalidHeaderLength {
                expected,
                actual: header.len(),
            });
        }
        self.inner
            .codec
            .decode_job(header)
            .map_err(|_| MiningError::MalformedTarget)
    }
}

fn run_loop<H, C>(inner: Arc<Inner<H, C>>)
where
    H: Send + Sync + Clone + 'static,
    C: HeaderCodec<H> + Send + Sync,
{
    loop {
        let (item, generation_at_take) = inner.mailbox.take();

        let header = match item {
            WorkItem::Shutdown => {
                info!("mining supervisor shutting down");
                return;
            }
            WorkItem::Job(bytes) => bytes,
        };

        let decoded = match inner.codec.decode_job(&header) {
            Ok(decoded) => decoded,
            Err(e) => {
                warn!(error = %e, "dropping job that failed to decode at run time");
                continue;
            }
        };

        let pool = WorkerPool::new(inner.cores, inner.version);
        let external_cancel = Arc::new(AtomicBool::new(false));

        // Race the pool run against a new submission: a watcher thread
        // wakes on the next mailbox write (not the one that started this
        // job) and flips the shared cancel flag.
        let watcher_handle = {
            // An `Arc` clone, not a borrow: the watcher thread may outlive
            // this loop iteration (it is only opportunistically joined
            // below), so it needs to keep the mailbox alive on its own.
            let work_mailbox = inner.mailbox.clone();
            let external_cancel = external_cancel.clone();
            thread::spawn(move || {
                work_mailbox.wait_new(generation_at_take);
                external_cancel.store(true, Ordering::Relaxed);
            })
        };

        let result = pool.run(
            &header,
            &decoded.target,
            inner.clock.clone(),
            external_cancel.clone(),
            inner.hashes.clone(),
        );

        match result {
            Ok(Some(pool_result)) => {
                external_cancel.store(true, Ordering::Relaxed);
                match inner.codec.decode_header(&pool_result.buf) {
                    Ok(mined) => {
                        info!(chain_id = decoded.chain_id, height = decoded.block_height, "job completed");
                        inner.jobs_completed.fetch_add(1, Ordering::Relaxed);
                        inner.results.lock().unwrap().insert(decoded.key(), mined);
                    }
                    Err(e) => {
                        warn!(error = %e, "decoder rejected a mined header; dropping result");
                    }
                }
            }
            Ok(None) => {
                info!(chain_id = decoded.chain_id, height = decoded.block_height, "job preempted");
                inner.jobs_preempted.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                warn!(error = %e, "mining run aborted");
            }
        }

        // Either the pool found a result (and the watcher's wakeup is
        // irrelevant) or it was preempted by a new write (and the watcher
        // has already woken). Either way a future write will also wake a
        // still-parked watcher, so simply detach: join only if it already
        // finished to avoid leaking unbounded threads across a long idle
        // period between jobs.
        if watcher_handle.is_finished() {
            let _ = watcher_handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SystemClock;
    use crate::header::HeaderView;
    use crate::target::HashTarget;

    const HEADER_LEN: usize = 64;

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct TestHeader {
        bytes: Vec<u8>,
    }

    #[derive(Clone)]
    struct TestCodec;

    impl HeaderCodec<TestHeader> for TestCodec {
        type Error = String;

        fn decode_job(&self, bytes: &[u8]) -> std::result::Result<DecodedHeader, Self::Error> {
            if bytes.len() != HEADER_LEN {
                return Err("bad length".to_string());
            }
            let chain_id = u32::from_le_bytes(bytes[16..20].try_into().unwrap());
            let height = u64::from_le_bytes(bytes[20..28].try_into().unwrap());
            let mut target_bytes = [0u8; 32];
            target_bytes.copy_from_slice(&bytes[28..60]);
            Ok(DecodedHeader {
                chain_id,
                block_height: height,
                target: HashTarget::from_bytes(target_bytes),
            })
        }

        fn decode_header(&self, bytes: &[u8]) -> std::result::Result<TestHeader, Self::Error> {
            Ok(TestHeader {
                bytes: bytes.to_vec(),
            })
        }

        fn header_len(&self) -> usize {
            HEADER_LEN
        }
    }

    fn header(chain_id: u32, height: u64, target: [u8; 32]) -> Vec<u8> {
        let mut buf = vec![0u8; HEADER_LEN];
        buf[16..20].copy_from_slice(&chain_id.to_le_bytes());
        buf[20..28].copy_from_slice(&height.to_le_bytes());
        buf[28..60].copy_from_slice(&target);
        buf
    }

    #[test]
    fn trivial_target_is_found_and_polled() {
        let (sup, join) = Supervisor::spawn(2, ChainwebVersion::Test, TestCodec, Arc::new(SystemClock));
        sup.submit(header(0, 1, [0xff; 32])).unwrap();

        let key = (0, 1);
        let mut mined = None;
        for _ in 0..200 {
            if let Some(h) = sup.poll(key) {
                mined = Some(h);
                break;
            }
            thread::sleep(std::time::Duration::from_millis(10));
        }
        assert!(mined.is_some());

        sup.shutdown();
        join.join().unwrap();
    }

    #[test]
    fn impossible_target_is_preempted_by_a_new_submission() {
        let (sup, join) = Supervisor::spawn(2, ChainwebVersion::Test, TestCodec, Arc::new(SystemClock));

        sup.submit(header(0, 1, [0x00; 32])).unwrap();
        thread::sleep(std::time::Duration::from_millis(50));
        sup.submit(header(0, 2, [0xff; 32])).unwrap();

        let mut h1 = None;
        let mut h2 = None;
        for _ in 0..200 {
            h1 = sup.poll((0, 1));
            h2 = sup.poll((0, 2));
            if h2.is_some() {
                break;
            }
            thread::sleep(std::time::Duration::from_millis(10));
        }

        assert!(h1.is_none());
        assert!(h2.is_some());

        sup.shutdown();
        join.join().unwrap();
    }

    #[test]
    fn submit_rejects_wrong_length_without_touching_mailbox() {
        let (sup, join) = Supervisor::spawn(1, ChainwebVersion::Test, TestCodec, Arc::new(SystemClock));
        let err = sup.submit(vec![0u8; 10]);
        assert!(err.is_err());

        sup.shutdown();
        join.join().unwrap();
    }
}
