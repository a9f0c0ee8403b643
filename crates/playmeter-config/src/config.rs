//! Validated configuration structures

use crate::schema::{RawBillingConfig, RawConfig, RawImagingConfig, RawServiceConfig};
use playmeter_util::{TerminalId, data_dir_without_env, socket_path_without_env};
use std::path::PathBuf;
use std::time::Duration;

/// Default hourly rate, in currency units
pub const DEFAULT_HOURLY_RATE: f64 = 50.0;

/// Default currency label
pub const DEFAULT_CURRENCY: &str = "EGP";

/// Reference live ticker cadence
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

pub const DEFAULT_IMAGING_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_IMAGING_MODEL: &str = "gemini-2.5-flash-image";
pub const DEFAULT_API_KEY_ENV: &str = "GEMINI_API_KEY";
pub const DEFAULT_IMAGING_TIMEOUT: Duration = Duration::from_secs(120);

/// Validated configuration ready for use by the daemon
#[derive(Debug, Clone)]
pub struct Config {
    pub service: ServiceConfig,
    pub billing: BillingConfig,
    /// Terminals in display order
    pub terminals: Vec<TerminalConfig>,
    pub imaging: ImagingConfig,
}

impl Config {
    /// Convert from raw config (after validation)
    pub fn from_raw(raw: RawConfig) -> Self {
        let terminals = if raw.terminals.is_empty() {
            default_terminals()
        } else {
            raw.terminals
                .into_iter()
                .map(|t| TerminalConfig {
                    id: TerminalId::new(t.id),
                    name: t.name.trim().to_string(),
                })
                .collect()
        };

        Self {
            service: ServiceConfig::from_raw(raw.service),
            billing: BillingConfig::from_raw(raw.billing),
            terminals,
            imaging: ImagingConfig::from_raw(raw.imaging),
        }
    }

    pub fn get_terminal(&self, id: TerminalId) -> Option<&TerminalConfig> {
        self.terminals.iter().find(|t| t.id == id)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service: ServiceConfig::default(),
            billing: BillingConfig::default(),
            terminals: default_terminals(),
            imaging: ImagingConfig::default(),
        }
    }
}

/// Service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub socket_path: PathBuf,
    pub data_dir: PathBuf,
    pub tick_interval: Duration,
}

impl ServiceConfig {
    fn from_raw(raw: RawServiceConfig) -> Self {
        Self {
            socket_path: raw.socket_path.unwrap_or_else(socket_path_without_env),
            data_dir: raw.data_dir.unwrap_or_else(data_dir_without_env),
            tick_interval: raw
                .tick_interval_ms
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_TICK_INTERVAL),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self::from_raw(RawServiceConfig::default())
    }
}

/// Billing configuration
#[derive(Debug, Clone)]
pub struct BillingConfig {
    /// Rate used when no operator-set rate has been persisted
    pub default_hourly_rate: f64,
    pub currency: String,
}

impl BillingConfig {
    fn from_raw(raw: RawBillingConfig) -> Self {
        Self {
            default_hourly_rate: raw.hourly_rate.unwrap_or(DEFAULT_HOURLY_RATE),
            currency: raw.currency.unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
        }
    }
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self::from_raw(RawBillingConfig::default())
    }
}

/// A configured terminal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminalConfig {
    pub id: TerminalId,
    pub name: String,
}

/// Image-edit collaborator configuration
#[derive(Debug, Clone)]
pub struct ImagingConfig {
    pub enabled: bool,
    pub endpoint: String,
    pub model: String,
    pub api_key_env: String,
    pub timeout: Duration,
}

impl ImagingConfig {
    fn from_raw(raw: RawImagingConfig) -> Self {
        Self {
            enabled: !raw.disabled,
            endpoint: raw
                .endpoint
                .map(|e| e.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_IMAGING_ENDPOINT.to_string()),
            model: raw.model.unwrap_or_else(|| DEFAULT_IMAGING_MODEL.to_string()),
            api_key_env: raw
                .api_key_env
                .unwrap_or_else(|| DEFAULT_API_KEY_ENV.to_string()),
            timeout: raw
                .timeout_seconds
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_IMAGING_TIMEOUT),
        }
    }
}

impl Default for ImagingConfig {
    fn default() -> Self {
        Self::from_raw(RawImagingConfig::default())
    }
}

/// The three screens the shop ships with
pub fn default_terminals() -> Vec<TerminalConfig> {
    [(1, "Screen 1 (PS5)"), (2, "Screen 2 (PS5)"), (3, "Screen 3 (PS4)")]
        .into_iter()
        .map(|(id, name)| TerminalConfig {
            id: TerminalId::new(id),
            name: name.to_string(),
        })
        .collect()
}
