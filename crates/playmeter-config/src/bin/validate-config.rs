//! Config validation CLI tool
//!
//! Validates a playmeterd configuration file and reports any errors.

use playmeter_util::default_config_path;
use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    let config_path = match args.get(1) {
        Some(path) => PathBuf::from(path),
        None => {
            let default_path = default_config_path();
            eprintln!("Usage: validate-config [config-file]");
            eprintln!();
            eprintln!("Validates a playmeterd configuration file.");
            eprintln!();
            eprintln!("If no path is provided, uses: {}", default_path.display());
            return ExitCode::from(2);
        }
    };

    if !config_path.exists() {
        eprintln!("Error: Configuration file not found: {}", config_path.display());
        return ExitCode::from(1);
    }

    match playmeter_config::load_config(&config_path) {
        Ok(config) => {
            println!("✓ Configuration is valid");
            println!();
            println!("Summary:");
            println!("  Config version: {}", playmeter_config::CURRENT_CONFIG_VERSION);
            println!(
                "  Hourly rate: {:.2} {}",
                config.billing.default_hourly_rate, config.billing.currency
            );
            println!("  Tick interval: {}ms", config.service.tick_interval.as_millis());
            println!(
                "  Image editing: {}",
                if config.imaging.enabled {
                    config.imaging.model.as_str()
                } else {
                    "disabled"
                }
            );
            println!();
            println!("Terminals ({}):", config.terminals.len());
            for terminal in &config.terminals {
                println!("  - {}: {}", terminal.id, terminal.name);
            }

            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("✗ Configuration validation failed");
            eprintln!();
            match &e {
                playmeter_config::ConfigError::ReadError(io_err) => {
                    eprintln!("Failed to read file: {}", io_err);
                }
                playmeter_config::ConfigError::ParseError(parse_err) => {
                    eprintln!("TOML parse error:");
                    eprintln!("  {}", parse_err);
                }
                playmeter_config::ConfigError::ValidationFailed { errors } => {
                    eprintln!("Validation errors ({}):", errors.len());
                    for err in errors {
                        eprintln!("  - {}", err);
                    }
                }
                playmeter_config::ConfigError::UnsupportedVersion(ver) => {
                    eprintln!(
                        "Unsupported config version: {} (expected {})",
                        ver,
                        playmeter_config::CURRENT_CONFIG_VERSION
                    );
                }
            }
            ExitCode::from(1)
        }
    }
}
