//! Configuration loader
//!
//! Loads client configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If `ASSETDESK_API_URL` is not set, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `ASSETDESK_API_URL`: API base URL (required for env loading)
//! - `ASSETDESK_API_TIMEOUT`: Request timeout in seconds
//! - `ASSETDESK_REFRESH_TIMEOUT`: Refresh call timeout in seconds
//! - `ASSETDESK_MAX_ATTEMPTS`: Transport attempts per send
//! - `ASSETDESK_STORAGE_BACKEND`: `keychain`, `file` or `memory`
//! - `ASSETDESK_STORAGE_PATH`: Session file path (file backend)
//! - `ASSETDESK_KEYCHAIN_SERVICE`: Keychain service name
//! - `ASSETDESK_LOG`: Tracing filter directive
//! - `ASSETDESK_LOG_JSON`: Emit JSON logs (true/false)
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./config.json` or `./config.toml` (current working directory)
//! 2. `./assetdesk.json` or `./assetdesk.toml` (current working directory)
//! 3. `../config.json` or `../config.toml` (parent directory)
//! 4. `../../config.json` or `../../config.toml` (grandparent directory)
//! 5. Relative to executable location

use std::path::{Path, PathBuf};
use std::str::FromStr;

use assetdesk_domain::{ClientConfig, ClientError, Result, StorageBackend};

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If the base URL is
/// not set there, falls back to a config file.
///
/// # Errors
/// Returns `ClientError::Config` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
/// - The loaded configuration fails validation
pub fn load() -> Result<ClientConfig> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// Only `ASSETDESK_API_URL` is required; every other setting falls back to
/// its default.
///
/// # Errors
/// Returns `ClientError::Config` if the base URL is missing or a variable
/// has an invalid value.
pub fn load_from_env() -> Result<ClientConfig> {
    let mut config = ClientConfig::default();

    config.api.base_url = env_var("ASSETDESK_API_URL")?;
    if let Some(timeout) = env_parse::<u64>("ASSETDESK_API_TIMEOUT")? {
        config.api.timeout_secs = timeout;
    }
    if let Some(timeout) = env_parse::<u64>("ASSETDESK_REFRESH_TIMEOUT")? {
        config.api.refresh_timeout_secs = timeout;
    }
    if let Some(attempts) = env_parse::<usize>("ASSETDESK_MAX_ATTEMPTS")? {
        config.api.max_attempts = attempts;
    }

    if let Some(backend) = env_parse::<StorageBackend>("ASSETDESK_STORAGE_BACKEND")? {
        config.storage.backend = backend;
    }
    if let Ok(path) = std::env::var("ASSETDESK_STORAGE_PATH") {
        config.storage.path = Some(PathBuf::from(path));
    }
    if let Ok(service) = std::env::var("ASSETDESK_KEYCHAIN_SERVICE") {
        config.storage.service_name = service;
    }

    if let Ok(filter) = std::env::var("ASSETDESK_LOG") {
        config.logging.filter = filter;
    }
    config.logging.json = env_bool("ASSETDESK_LOG_JSON", config.logging.json);

    config.validate()?;
    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `ClientError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
/// - The configuration fails validation
pub fn load_from_file(path: Option<PathBuf>) -> Result<ClientConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(ClientError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            ClientError::Config("No config file found in any of the standard locations".to_string())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| ClientError::Config(format!("Failed to read config file: {}", e)))?;

    let config = parse_config(&contents, &config_path)?;
    config.validate()?;
    Ok(config)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<ClientConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| ClientError::Config(format!("Invalid TOML format: {}", e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| ClientError::Config(format!("Invalid JSON format: {}", e))),
        _ => Err(ClientError::Config(format!("Unsupported config format: {}", extension))),
    }
}

/// Probe multiple paths for configuration files
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        candidates.extend(candidate_files(&cwd));
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.extend(candidate_files(exe_dir));
        }
    }

    candidates.into_iter().find(|path| path.exists())
}

fn candidate_files(dir: &Path) -> Vec<PathBuf> {
    vec![
        dir.join("config.json"),
        dir.join("config.toml"),
        dir.join("assetdesk.json"),
        dir.join("assetdesk.toml"),
        dir.join("../config.json"),
        dir.join("../config.toml"),
        dir.join("../../config.json"),
        dir.join("../../config.toml"),
    ]
}

/// Get required environment variable
///
/// # Errors
/// Returns `ClientError::Config` if the variable is not set.
fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| {
        ClientError::Config(format!("Missing required environment variable: {}", key))
    })
}

/// Parse an optional environment variable.
///
/// # Errors
/// Returns `ClientError::Config` if the variable is set but does not parse.
fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ClientError::Config(format!("Invalid value for {}: {}", key, e))),
        Err(_) => Ok(None),
    }
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Mutex;

    use tempfile::NamedTempFile;

    use super::*;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const ENV_KEYS: [&str; 9] = [
        "ASSETDESK_API_URL",
        "ASSETDESK_API_TIMEOUT",
        "ASSETDESK_REFRESH_TIMEOUT",
        "ASSETDESK_MAX_ATTEMPTS",
        "ASSETDESK_STORAGE_BACKEND",
        "ASSETDESK_STORAGE_PATH",
        "ASSETDESK_KEYCHAIN_SERVICE",
        "ASSETDESK_LOG",
        "ASSETDESK_LOG_JSON",
    ];

    fn clear_env() {
        for key in ENV_KEYS {
            std::env::remove_var(key);
        }
    }

    #[test]
    fn test_env_bool_parsing() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");

        std::env::set_var("ASSETDESK_TEST_BOOL_YES", "YES");
        std::env::set_var("ASSETDESK_TEST_BOOL_OFF", "off");

        assert!(env_bool("ASSETDESK_TEST_BOOL_YES", false));
        assert!(!env_bool("ASSETDESK_TEST_BOOL_OFF", true));

        std::env::remove_var("ASSETDESK_TEST_BOOL_MISSING");
        assert!(env_bool("ASSETDESK_TEST_BOOL_MISSING", true));

        std::env::remove_var("ASSETDESK_TEST_BOOL_YES");
        std::env::remove_var("ASSETDESK_TEST_BOOL_OFF");
    }

    #[test]
    fn test_load_from_env_all_vars_set() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        std::env::set_var("ASSETDESK_API_URL", "https://assets.example.com/api/v1");
        std::env::set_var("ASSETDESK_API_TIMEOUT", "10");
        std::env::set_var("ASSETDESK_REFRESH_TIMEOUT", "4");
        std::env::set_var("ASSETDESK_MAX_ATTEMPTS", "3");
        std::env::set_var("ASSETDESK_STORAGE_BACKEND", "file");
        std::env::set_var("ASSETDESK_STORAGE_PATH", "/tmp/assetdesk-session.json");
        std::env::set_var("ASSETDESK_KEYCHAIN_SERVICE", "AssetDesk.test");
        std::env::set_var("ASSETDESK_LOG", "debug");
        std::env::set_var("ASSETDESK_LOG_JSON", "true");

        let result = load_from_env();
        clear_env();

        let config = result.expect("config from env");
        assert_eq!(config.api.base_url, "https://assets.example.com/api/v1");
        assert_eq!(config.api.timeout_secs, 10);
        assert_eq!(config.api.refresh_timeout_secs, 4);
        assert_eq!(config.api.max_attempts, 3);
        assert_eq!(config.storage.backend, StorageBackend::File);
        assert_eq!(config.storage.path, Some(PathBuf::from("/tmp/assetdesk-session.json")));
        assert_eq!(config.storage.service_name, "AssetDesk.test");
        assert_eq!(config.logging.filter, "debug");
        assert!(config.logging.json);
    }

    #[test]
    fn test_load_from_env_missing_url() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        let err = load_from_env().unwrap_err();
        assert!(matches!(err, ClientError::Config(_)), "Should be a Config error");
    }

    #[test]
    fn test_load_from_env_invalid_number() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        std::env::set_var("ASSETDESK_API_URL", "http://localhost:8000/api/v1");
        std::env::set_var("ASSETDESK_API_TIMEOUT", "soon");

        let result = load_from_env();
        clear_env();

        assert!(matches!(result, Err(ClientError::Config(msg)) if msg.contains("ASSETDESK_API_TIMEOUT")));
    }

    #[test]
    fn test_load_from_env_rejects_unknown_backend() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        std::env::set_var("ASSETDESK_API_URL", "http://localhost:8000/api/v1");
        std::env::set_var("ASSETDESK_STORAGE_BACKEND", "redis");

        let result = load_from_env();
        clear_env();

        assert!(result.is_err());
    }

    #[test]
    fn test_load_from_file_json() {
        let json_content = r#"{
            "api": {"base_url": "https://assets.example.com/api/v1", "timeout_secs": 12},
            "storage": {"backend": "memory"}
        }"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(json_content.as_bytes()).unwrap();
        let path = temp_file.path().with_extension("json");
        std::fs::copy(temp_file.path(), &path).unwrap();

        let result = load_from_file(Some(path.clone()));
        std::fs::remove_file(&path).ok();

        let config = result.expect("config from JSON file");
        assert_eq!(config.api.timeout_secs, 12);
        assert_eq!(config.storage.backend, StorageBackend::Memory);
    }

    #[test]
    fn test_load_from_file_toml() {
        let toml_content = r#"
[api]
base_url = "https://assets.example.com/api/v1"
refresh_timeout_secs = 8

[logging]
filter = "assetdesk_infra=debug"
json = true
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        let path = temp_file.path().with_extension("toml");
        std::fs::copy(temp_file.path(), &path).unwrap();

        let result = load_from_file(Some(path.clone()));
        std::fs::remove_file(&path).ok();

        let config = result.expect("config from TOML file");
        assert_eq!(config.api.refresh_timeout_secs, 8);
        assert!(config.logging.json);
        assert_eq!(config.storage.backend, StorageBackend::Keychain);
    }

    #[test]
    fn test_load_from_file_not_found() {
        let result = load_from_file(Some(PathBuf::from("/nonexistent/config.json")));
        assert!(matches!(result, Err(ClientError::Config(_))));
    }

    #[test]
    fn test_load_from_file_fails_validation() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(br#"{"api": {"base_url": "ftp://example.com"}}"#).unwrap();
        let path = temp_file.path().with_extension("json");
        std::fs::copy(temp_file.path(), &path).unwrap();

        let result = load_from_file(Some(path.clone()));
        std::fs::remove_file(&path).ok();

        assert!(result.is_err(), "Should reject non-http base URL");
    }

    #[test]
    fn test_parse_config_unsupported_format() {
        let result = parse_config("api: {}", &PathBuf::from("test.yaml"));
        assert!(result.is_err(), "Should fail with unsupported format");
    }
}
