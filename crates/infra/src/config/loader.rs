//! Configuration loader
//!
//! Loads client configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If `SMSDESK_API_BASE_URL` is missing, falls back to loading from file;
//!    an invalid value in the environment is an error, not a fallback
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `SMSDESK_API_BASE_URL` (required): backend base URL
//! - `SMSDESK_REQUEST_TIMEOUT_MS`: per-attempt timeout in milliseconds
//! - `SMSDESK_MAX_RETRIES`: retries after the first attempt
//! - `SMSDESK_RETRY_BASE_DELAY_MS`: first backoff delay
//! - `SMSDESK_RETRY_MAX_DELAY_MS`: backoff ceiling
//! - `SMSDESK_RETRY_JITTER`: whether to jitter backoff delays (true/false)
//! - `SMSDESK_SHOP_DOMAIN_SUFFIX`: required tenant domain suffix
//! - `SMSDESK_SHOP`: explicit tenant identifier
//! - `SMSDESK_LOG_LEVEL`: default tracing level
//! - `SMSDESK_LOG_JSON`: emit JSON log lines (true/false)
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./smsdesk.json` or `./smsdesk.toml` (current working directory)
//! 2. `./config.json` or `./config.toml` (current working directory)
//! 3. The same names in the parent and grandparent directories

use std::path::{Path, PathBuf};
use std::str::FromStr;

use smsdesk_domain::{ClientConfig, Result, SmsDeskError};

const BASE_URL_VAR: &str = "SMSDESK_API_BASE_URL";
const FILE_STEMS: [&str; 2] = ["smsdesk", "config"];
const FILE_EXTENSIONS: [&str; 2] = ["json", "toml"];

/// Load configuration with automatic fallback strategy
///
/// Loads from environment variables when `SMSDESK_API_BASE_URL` is set;
/// otherwise falls back to a config file. The result is validated either
/// way.
///
/// # Errors
/// Returns `SmsDeskError::Config` if:
/// - An environment variable is set but invalid
/// - No environment configuration exists and no file can be loaded
/// - File format is invalid
/// - A value fails validation
pub fn load() -> Result<ClientConfig> {
    load_or_else(|| load_from_file(None))
}

fn load_or_else<F>(fallback: F) -> Result<ClientConfig>
where
    F: FnOnce() -> Result<ClientConfig>,
{
    let config = if std::env::var_os(BASE_URL_VAR).is_some() {
        let config = load_from_env()?;
        tracing::info!("Configuration loaded from environment variables");
        config
    } else {
        tracing::debug!("{} not set, trying file", BASE_URL_VAR);
        fallback()?
    };
    config.validate()?;
    Ok(config)
}

/// Load configuration from environment variables
///
/// Only `SMSDESK_API_BASE_URL` is required; every other value keeps its
/// default when unset.
///
/// # Errors
/// Returns `SmsDeskError::Config` if the base URL is missing or a numeric
/// variable cannot be parsed.
pub fn load_from_env() -> Result<ClientConfig> {
    let mut config = ClientConfig::default();

    config.api.base_url = env_var(BASE_URL_VAR)?;
    if let Some(timeout) = env_parse("SMSDESK_REQUEST_TIMEOUT_MS")? {
        config.api.request_timeout_ms = timeout;
    }

    if let Some(retries) = env_parse("SMSDESK_MAX_RETRIES")? {
        config.retry.max_retries = retries;
    }
    if let Some(base) = env_parse("SMSDESK_RETRY_BASE_DELAY_MS")? {
        config.retry.base_delay_ms = base;
    }
    if let Some(max) = env_parse("SMSDESK_RETRY_MAX_DELAY_MS")? {
        config.retry.max_delay_ms = max;
    }
    config.retry.jitter = env_bool("SMSDESK_RETRY_JITTER", config.retry.jitter);

    if let Ok(suffix) = std::env::var("SMSDESK_SHOP_DOMAIN_SUFFIX") {
        config.shop.domain_suffix = suffix;
    }
    config.shop.shop = std::env::var("SMSDESK_SHOP").ok().filter(|shop| !shop.trim().is_empty());

    if let Ok(level) = std::env::var("SMSDESK_LOG_LEVEL") {
        config.logging.level = level;
    }
    config.logging.json = env_bool("SMSDESK_LOG_JSON", config.logging.json);

    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `SmsDeskError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
pub fn load_from_file(path: Option<PathBuf>) -> Result<ClientConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(SmsDeskError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            SmsDeskError::Config("No config file found in any of the standard locations".into())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| SmsDeskError::Config(format!("Failed to read config file: {}", e)))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content, detecting the format by
/// file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<ClientConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| SmsDeskError::Config(format!("Invalid TOML format: {}", e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| SmsDeskError::Config(format!("Invalid JSON format: {}", e))),
        _ => Err(SmsDeskError::Config(format!("Unsupported config format: {}", extension))),
    }
}

/// Probe the standard locations for a configuration file
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    probe_from(&cwd)
}

fn probe_from(start: &Path) -> Option<PathBuf> {
    let dirs = [start.to_path_buf(), start.join(".."), start.join("../..")];

    dirs.iter()
        .flat_map(|dir| {
            FILE_STEMS.iter().flat_map(move |stem| {
                FILE_EXTENSIONS.iter().map(move |ext| dir.join(format!("{stem}.{ext}")))
            })
        })
        .find(|path| path.exists())
}

/// Get required environment variable
fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| {
        SmsDeskError::Config(format!("Missing required environment variable: {}", key))
    })
}

/// Parse an optional numeric environment variable
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
            .map_err(|e| SmsDeskError::Config(format!("Invalid value for {}: {}", key, e))),
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
