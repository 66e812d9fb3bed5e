//! Configuration for the points ledger

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Ledger configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Data directory for RocksDB
    pub data_dir: PathBuf,

    /// Service name
    pub service_name: String,

    /// Service version
    pub service_version: String,

    /// RocksDB configuration
    pub rocksdb: RocksDbConfig,

    /// Engine actor configuration
    pub engine: EngineConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data/loyalty"),
            service_name: "loyalty-ledger".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            rocksdb: RocksDbConfig::default(),
            engine: EngineConfig::default(),
        }
    }
}

/// RocksDB configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RocksDbConfig {
    /// Write buffer size (MB)
    pub write_buffer_size_mb: usize,

    /// Max write buffers
    pub max_write_buffer_number: i32,

    /// Target file size (MB)
    pub target_file_size_mb: u64,

    /// Max background jobs (compaction + flush)
    pub max_background_jobs: i32,
}

impl Default for RocksDbConfig {
    fn default() -> Self {
        Self {
            write_buffer_size_mb: 128,
            max_write_buffer_number: 4,
            target_file_size_mb: 128,
            max_background_jobs: 4,
        }
    }
}

/// Engine actor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Actor mailbox capacity (bounded for backpressure)
    pub mailbox_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            mailbox_capacity: 1000,
        }
    }
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let mut config = Config::default();

        if let Ok(data_dir) = std::env::var("LOYALTY_DATA_DIR") {
            config.data_dir = PathBuf::from(data_dir);
        }

        if let Ok(capacity) = std::env::var("LOYALTY_MAILBOX_CAPACITY") {
            config.engine.mailbox_capacity = capacity
                .parse()
                .map_err(|e| crate::Error::Config(format!("Invalid mailbox capacity: {}", e)))?;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.service_name, "loyalty-ledger");
        assert_eq!(config.engine.mailbox_capacity, 1000);
    }

    #[test]
    fn test_from_toml() {
        let toml = r#"
            data_dir = "/tmp/loyalty"
            service_name = "loyalty-ledger"
            service_version = "0.1.0"

            [rocksdb]
            write_buffer_size_mb = 64
            max_write_buffer_number = 2
            target_file_size_mb = 64
            max_background_jobs = 2

            [engine]
            mailbox_capacity = 500
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.rocksdb.write_buffer_size_mb, 64);
        assert_eq!(config.engine.mailbox_capacity, 500);
    }
}
