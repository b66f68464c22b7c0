// Worker configuration
use anyhow::Result;
use chainweb_mining_core::ChainwebVersion;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Number of mining threads. 0 means "use all available cores".
    #[serde(default)]
    pub cores: u16,

    /// Chainweb network whose hash selection rules the worker follows.
    #[serde(default)]
    pub version: ChainwebVersion,

    /// Submit/poll HTTP bridge address.
    pub http_addr: String,

    #[serde(default)]
    pub operational: OperationalConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationalConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable structured logging (JSON format).
    pub structured_logging: bool,

    /// Metrics/health endpoint address; served on the same router as
    /// the submit/poll bridge.
    pub enable_metrics: bool,
}

impl Default for OperationalConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            structured_logging: false,
            enable_metrics: true,
        }
    }
}

impl WorkerConfig {
    /// Load configuration from file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Development configuration: single core, Test version, chatty logs.
    pub fn development() -> Self {
        Self {
            cores: 1,
            version: ChainwebVersion::Test,
            http_addr: "127.0.0.1:1917".to_string(),
            operational: OperationalConfig {
                log_level: "debug".to_string(),
                structured_logging: false,
                enable_metrics: true,
            },
        }
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            cores: 0,
            version: ChainwebVersion::Testnet00,
            http_addr: "0.0.0.0:1917".to_string(),
            operational: OperationalConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn development_config_uses_test_version() {
        let config = WorkerConfig::development();
        assert_eq!(config.version, ChainwebVersion::Test);
        assert_eq!(config.cores, 1);
    }

    #[test]
    fn default_config_targets_testnet00() {
        let config = WorkerConfig::default();
        assert_eq!(config.version, ChainwebVersion::Testnet00);
    }

    #[test]
    fn from_file_rejects_missing_path() {
        let result = WorkerConfig::from_file(Path::new("/nonexistent/worker.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn from_file_round_trips_a_written_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("worker.toml");
        let config = WorkerConfig::development();
        std::fs::write(&path, toml::to_string(&config).unwrap()).unwrap();

        let loaded = WorkerConfig::from_file(&path).unwrap();
        assert_eq!(loaded.version, config.version);
        assert_eq!(loaded.http_addr, config.http_addr);
    }
}
