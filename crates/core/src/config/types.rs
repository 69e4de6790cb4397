use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};

use crate::admission::AdmissionConfig;
use crate::orchestrator::OrchestratorConfig;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub devices: DevicesConfig,
    #[serde(default)]
    pub admission: AdmissionConfig,
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
    #[serde(default)]
    pub tracker: TrackerConfig,
    #[serde(default)]
    pub loader: LoaderConfig,
    /// Remote recognizer service. Without it the server cannot process jobs.
    #[serde(default)]
    pub recognizer: Option<RecognizerConfig>,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    8000
}

/// Accelerator devices the pool dispatches to.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DevicesConfig {
    /// Device ids, one slot each, in round-robin order.
    #[serde(default = "default_device_ids")]
    pub device_ids: Vec<u32>,
}

impl Default for DevicesConfig {
    fn default() -> Self {
        Self {
            device_ids: default_device_ids(),
        }
    }
}

fn default_device_ids() -> Vec<u32> {
    vec![0, 1, 2]
}

/// Task history configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TrackerConfig {
    /// Maximum number of task records kept; oldest are evicted first.
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            history_capacity: default_history_capacity(),
        }
    }
}

fn default_history_capacity() -> usize {
    10_000
}

/// HTTP unit loader configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoaderConfig {
    /// Timeout for fetching one page image, in seconds.
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            fetch_timeout_secs: default_fetch_timeout(),
        }
    }
}

fn default_fetch_timeout() -> u64 {
    10
}

/// Remote recognizer configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RecognizerConfig {
    /// Base URL of the recognizer service (e.g., "http://localhost:9000")
    pub url: String,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_recognizer_timeout")]
    pub timeout_secs: u64,
}

fn default_recognizer_timeout() -> u64 {
    30
}
