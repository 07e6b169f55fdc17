//! Validator Configuration

use l2_consensus::{ClosingConfig, DEFAULT_GRACE_PERIOD};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Validator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    /// Grace period after sequence number agreement, in L1 time units
    pub grace_period: u64,
    /// Delay between bridge inputs in milliseconds (0 = replay immediately)
    pub tick_interval_ms: u64,
    /// L1 RPC URL
    pub l1_rpc_url: String,
    /// Messages already waiting in the inbox
    pub inbox: Vec<String>,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            grace_period: DEFAULT_GRACE_PERIOD,
            tick_interval_ms: 0,
            l1_rpc_url: "http://127.0.0.1:8545".to_string(),
            inbox: Vec::new(),
        }
    }
}

impl ValidatorConfig {
    /// Load a JSON config file; missing fields take their defaults
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let data = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    pub fn closing_config(&self) -> ClosingConfig {
        ClosingConfig {
            grace_period: self.grace_period,
        }
    }

    pub fn inbox_messages(&self) -> impl Iterator<Item = Vec<u8>> + '_ {
        self.inbox.iter().map(|msg| msg.as_bytes().to_vec())
    }
}
