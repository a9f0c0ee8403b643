//! Configuration validation

use crate::schema::{RawConfig, RawImagingConfig, RawServiceConfig};
use std::collections::HashSet;
use thiserror::Error;

/// Validation error
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Terminal {terminal_id}: {message}")]
    TerminalError { terminal_id: u32, message: String },

    #[error("Duplicate terminal ID: {0}")]
    DuplicateTerminalId(u32),

    #[error("Invalid hourly rate {0}: must be a finite, non-negative number")]
    InvalidHourlyRate(f64),

    #[error("Service config error: {0}")]
    ServiceError(String),

    #[error("Imaging config error: {0}")]
    ImagingError(String),
}

/// Validate a raw configuration
pub fn validate_config(config: &RawConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    let mut seen_ids = HashSet::new();
    for terminal in &config.terminals {
        if !seen_ids.insert(terminal.id) {
            errors.push(ValidationError::DuplicateTerminalId(terminal.id));
        }
        if terminal.name.trim().is_empty() {
            errors.push(ValidationError::TerminalError {
                terminal_id: terminal.id,
                message: "name cannot be empty".into(),
            });
        }
    }

    if let Some(rate) = config.billing.hourly_rate
        && (!rate.is_finite() || rate < 0.0)
    {
        errors.push(ValidationError::InvalidHourlyRate(rate));
    }

    errors.extend(validate_service(&config.service));
    errors.extend(validate_imaging(&config.imaging));

    errors
}

fn validate_service(service: &RawServiceConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if service.tick_interval_ms == Some(0) {
        errors.push(ValidationError::ServiceError(
            "tick_interval_ms must be greater than zero".into(),
        ));
    }

    errors
}

fn validate_imaging(imaging: &RawImagingConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if imaging.timeout_seconds == Some(0) {
        errors.push(ValidationError::ImagingError(
            "timeout_seconds must be greater than zero".into(),
        ));
    }

    if let Some(endpoint) = &imaging.endpoint
        && !(endpoint.starts_with("http://") || endpoint.starts_with("https://"))
    {
        errors.push(ValidationError::ImagingError(format!(
            "endpoint '{}' must be an http(s) URL",
            endpoint
        )));
    }

    if let Some(var) = &imaging.api_key_env
        && var.trim().is_empty()
    {
        errors.push(ValidationError::ImagingError(
            "api_key_env cannot be empty".into(),
        ));
    }

    errors
}
