// Prometheus metrics for worker observability
use anyhow::Result;
use prometheus::{Encoder, Gauge, IntCounter, IntGauge, Registry, TextEncoder};

/// Metrics collected by the worker.
pub struct WorkerMetrics {
    registry: Registry,

    pub mining_hash_rate: Gauge,
    pub mining_active_workers: IntGauge,
    pub mining_jobs_submitted_total: IntCounter,
    pub mining_jobs_completed_total: IntCounter,
    pub mining_jobs_preempted_total: IntCounter,
}

impl WorkerMetrics {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let mining_hash_rate = Gauge::new("mining_hash_rate", "Current mining hash rate (H/s)")?;
        let mining_active_workers =
            IntGauge::new("mining_active_workers", "Number of worker threads currently mining")?;
        let mining_jobs_submitted_total =
            IntCounter::new("mining_jobs_submitted_total", "Total jobs submitted to the mailbox")?;
        let mining_jobs_completed_total =
            IntCounter::new("mining_jobs_completed_total", "Total jobs mined to completion")?;
        let mining_jobs_preempted_total =
            IntCounter::new("mining_jobs_preempted_total", "Total jobs preempted before completion")?;

        registry.register(Box::new(mining_hash_rate.clone()))?;
        registry.register(Box::new(mining_active_workers.clone()))?;
        registry.register(Box::new(mining_jobs_submitted_total.clone()))?;
        registry.register(Box::new(mining_jobs_completed_total.clone()))?;
        registry.register(Box::new(mining_jobs_preempted_total.clone()))?;

        Ok(Self {
            registry,
            mining_hash_rate,
            mining_active_workers,
            mining_jobs_submitted_total,
            mining_jobs_completed_total,
            mining_jobs_preempted_total,
        })
    }

    /// Gather and encode metrics in Prometheus text format.
    pub fn gather(&self) -> Result<Vec<u8>> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();

        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;

        Ok(buffer)
    }
}
