//! Default paths for playmeter components
//!
//! Paths are user-writable by default:
//! - Socket: `$XDG_RUNTIME_DIR/playmeter/playmeterd.sock` or `/tmp/playmeter-$USER/playmeterd.sock`
//! - Data: `$XDG_DATA_HOME/playmeter` or `~/.local/share/playmeter`
//! - Config: `$XDG_CONFIG_HOME/playmeter/config.toml` or `~/.config/playmeter/config.toml`

use std::path::PathBuf;

/// Environment variable for overriding the socket path
pub const PLAYMETER_SOCKET_ENV: &str = "PLAYMETER_SOCKET";

/// Environment variable for overriding the data directory
pub const PLAYMETER_DATA_DIR_ENV: &str = "PLAYMETER_DATA_DIR";

/// Environment variable for overriding the config file
pub const PLAYMETER_CONFIG_ENV: &str = "PLAYMETER_CONFIG";

const SOCKET_FILENAME: &str = "playmeterd.sock";
const CONFIG_FILENAME: &str = "config.toml";
const APP_DIR: &str = "playmeter";

/// Get the default socket path.
///
/// Order of precedence:
/// 1. `$PLAYMETER_SOCKET`
/// 2. `$XDG_RUNTIME_DIR/playmeter/playmeterd.sock`
/// 3. `/tmp/playmeter-$USER/playmeterd.sock`
pub fn default_socket_path() -> PathBuf {
    if let Ok(path) = std::env::var(PLAYMETER_SOCKET_ENV) {
        return PathBuf::from(path);
    }

    socket_path_without_env()
}

/// Socket path ignoring `$PLAYMETER_SOCKET`, for config defaults.
pub fn socket_path_without_env() -> PathBuf {
    if let Ok(runtime_dir) = std::env::var("XDG_RUNTIME_DIR") {
        return PathBuf::from(runtime_dir).join(APP_DIR).join(SOCKET_FILENAME);
    }

    let username = std::env::var("USER").unwrap_or_else(|_| "unknown".to_string());
    PathBuf::from(format!("/tmp/{}-{}", APP_DIR, username)).join(SOCKET_FILENAME)
}

/// Get the default data directory.
///
/// Order of precedence:
/// 1. `$PLAYMETER_DATA_DIR`
/// 2. `$XDG_DATA_HOME/playmeter`
/// 3. `~/.local/share/playmeter`
pub fn default_data_dir() -> PathBuf {
    if let Ok(path) = std::env::var(PLAYMETER_DATA_DIR_ENV) {
        return PathBuf::from(path);
    }

    data_dir_without_env()
}

/// Data directory ignoring `$PLAYMETER_DATA_DIR`, for config defaults.
pub fn data_dir_without_env() -> PathBuf {
    if let Ok(data_home) = std::env::var("XDG_DATA_HOME") {
        return PathBuf::from(data_home).join(APP_DIR);
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".local").join("share").join(APP_DIR);
    }

    PathBuf::from("/tmp").join(APP_DIR).join("data")
}

/// Get the default configuration file path.
///
/// Order of precedence:
/// 1. `$PLAYMETER_CONFIG`
/// 2. `$XDG_CONFIG_HOME/playmeter/config.toml`
/// 3. `~/.config/playmeter/config.toml`
pub fn default_config_path() -> PathBuf {
    if let Ok(path) = std::env::var(PLAYMETER_CONFIG_ENV) {
        return PathBuf::from(path);
    }

    if let Ok(config_home) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(config_home).join(APP_DIR).join(CONFIG_FILENAME);
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home)
            .join(".config")
            .join(APP_DIR)
            .join(CONFIG_FILENAME);
    }

    PathBuf::from("/etc").join(APP_DIR).join(CONFIG_FILENAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn socket_path_contains_app_dir() {
        let path = socket_path_without_env();
        assert!(path.to_string_lossy().contains("playmeter"));
        assert!(path.to_string_lossy().ends_with(".sock"));
    }

    #[test]
    fn data_dir_contains_app_dir() {
        let path = data_dir_without_env();
        assert!(path.to_string_lossy().contains("playmeter"));
    }

    #[test]
    fn config_path_is_toml() {
        let path = default_config_path();
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("toml"));
    }
}
