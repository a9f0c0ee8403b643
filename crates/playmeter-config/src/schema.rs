//! Raw configuration schema (as parsed from TOML)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw configuration as parsed from TOML
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawConfig {
    /// Config schema version
    pub config_version: u32,

    /// Service-level settings
    #[serde(default)]
    pub service: RawServiceConfig,

    /// Billing defaults
    #[serde(default)]
    pub billing: RawBillingConfig,

    /// Fixed set of terminals. Empty means the built-in three screens.
    #[serde(default)]
    pub terminals: Vec<RawTerminal>,

    /// Image-edit collaborator
    #[serde(default)]
    pub imaging: RawImagingConfig,
}

/// Service-level settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawServiceConfig {
    /// IPC socket path
    pub socket_path: Option<PathBuf>,

    /// Data directory for the store
    pub data_dir: Option<PathBuf>,

    /// Live ticker cadence in milliseconds (default: 1000)
    pub tick_interval_ms: Option<u64>,
}

/// Billing defaults
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawBillingConfig {
    /// Hourly rate used until the operator sets one (default: 50)
    pub hourly_rate: Option<f64>,

    /// Currency label shown next to amounts
    pub currency: Option<String>,
}

/// Raw terminal definition
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawTerminal {
    /// Unique stable ID
    pub id: u32,

    /// Display label
    pub name: String,
}

/// Image-edit collaborator settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawImagingConfig {
    /// Base URL of the generative API
    pub endpoint: Option<String>,

    /// Model name
    pub model: Option<String>,

    /// Environment variable holding the API key
    pub api_key_env: Option<String>,

    /// Request timeout in seconds
    pub timeout_seconds: Option<u64>,

    /// Turn the feature off entirely
    #[serde(default)]
    pub disabled: bool,
}
