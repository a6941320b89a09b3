//! Resilience settings loader
//!
//! Loads executor and cache tuning from environment variables or files.
//!
//! ## Loading Strategy
//! 1. Reads a `.env` file into the process environment when one exists
//! 2. Uses environment variables if any `STEADFAST_*` variable is set
//! 3. Otherwise probes for a settings file (JSON or TOML)
//! 4. Otherwise falls back to defaults
//!
//! Every field has a default, so a partial environment or file is fine.
//!
//! ## Environment Variables
//! - `STEADFAST_MAX_ATTEMPTS`: attempts of the default retry policy
//! - `STEADFAST_WAIT_SECONDS`: base wait of the default retry policy
//! - `STEADFAST_DEFAULT_POLICY_NAME`: name of the default retry policy
//! - `STEADFAST_STATUS_LOWER_BOUND`: lowest accepted response status
//! - `STEADFAST_STATUS_UPPER_BOUND`: highest accepted response status
//! - `STEADFAST_HANDLE_CACHE_TTL_SECONDS`: handle cache TTL
//! - `STEADFAST_REQUEST_TIMEOUT_SECONDS`: per-request transport timeout
//! - `STEADFAST_USER_AGENT`: user agent sent by the transport
//!
//! ## File Locations
//! The loader probes `./steadfast.toml`, `./steadfast.json`, then the same
//! names next to the executable.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use steadfast_common::config::{
    StaticConfigReader, DEFAULT_HANDLE_CACHE_TTL_SECONDS, HANDLE_CACHE_TTL_SECONDS_KEY,
};
use steadfast_common::http::{
    DefaultPolicySettings, DEFAULT_HTTP_STATUS_SUCCESSFUL_LOWER_BOUND,
    DEFAULT_HTTP_STATUS_SUCCESSFUL_UPPER_BOUND,
};
use steadfast_common::resilience::{
    DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_POLICY_NAME, DEFAULT_WAIT_SECONDS,
};

use crate::errors::{InfraError, InfraResult};
use crate::http::DEFAULT_REQUEST_TIMEOUT;

/// Prefix shared by every settings environment variable
pub const ENV_PREFIX: &str = "STEADFAST_";

const FILE_NAMES: [&str; 2] = ["steadfast.toml", "steadfast.json"];

/// Tuning for the executor, validator, transport and handle cache
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResilienceSettings {
    pub max_attempts: u32,
    pub wait_seconds: f64,
    pub default_policy_name: String,
    pub status_lower_bound: u16,
    pub status_upper_bound: u16,
    pub handle_cache_ttl_seconds: u64,
    pub request_timeout_seconds: u64,
    pub user_agent: Option<String>,
}

impl Default for ResilienceSettings {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            wait_seconds: DEFAULT_WAIT_SECONDS,
            default_policy_name: DEFAULT_RETRY_POLICY_NAME.to_string(),
            status_lower_bound: DEFAULT_HTTP_STATUS_SUCCESSFUL_LOWER_BOUND,
            status_upper_bound: DEFAULT_HTTP_STATUS_SUCCESSFUL_UPPER_BOUND,
            handle_cache_ttl_seconds: DEFAULT_HANDLE_CACHE_TTL_SECONDS,
            request_timeout_seconds: DEFAULT_REQUEST_TIMEOUT.as_secs(),
            user_agent: None,
        }
    }
}

impl ResilienceSettings {
    /// Reject inconsistent values
    ///
    /// # Errors
    /// Returns `InfraError::Config` naming the first offending field.
    pub fn validate(&self) -> InfraResult<()> {
        if self.max_attempts == 0 {
            return Err(InfraError::Config("max_attempts must be greater than 0".into()));
        }
        if !self.wait_seconds.is_finite() || self.wait_seconds < 0.0 {
            return Err(InfraError::Config(format!(
                "wait_seconds must be a non-negative number, got {}",
                self.wait_seconds
            )));
        }
        if self.default_policy_name.trim().is_empty() {
            return Err(InfraError::Config("default_policy_name must be non-empty".into()));
        }
        if !(100..=599).contains(&self.status_lower_bound)
            || !(100..=599).contains(&self.status_upper_bound)
        {
            return Err(InfraError::Config(format!(
                "status bounds must be valid HTTP status codes, got {}..={}",
                self.status_lower_bound, self.status_upper_bound
            )));
        }
        if self.status_lower_bound > self.status_upper_bound {
            return Err(InfraError::Config(format!(
                "status_lower_bound {} is above status_upper_bound {}",
                self.status_lower_bound, self.status_upper_bound
            )));
        }
        if self.request_timeout_seconds == 0 {
            return Err(InfraError::Config("request_timeout_seconds must be greater than 0".into()));
        }
        Ok(())
    }

    /// Tuning for the executor's lazily built default policy
    pub fn default_policy(&self) -> DefaultPolicySettings {
        DefaultPolicySettings {
            max_attempts: self.max_attempts,
            wait_seconds: self.wait_seconds,
            name: self.default_policy_name.clone(),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    /// Config reader exposing the handle cache TTL to `HandleCacheAside`
    pub fn config_reader(&self) -> StaticConfigReader {
        StaticConfigReader::new()
            .with_value(HANDLE_CACHE_TTL_SECONDS_KEY, self.handle_cache_ttl_seconds.to_string())
    }
}

/// Load settings with automatic fallback strategy
///
/// # Errors
/// Returns `InfraError` if a present source is malformed or the resulting
/// settings fail [`ResilienceSettings::validate`].
pub fn load() -> InfraResult<ResilienceSettings> {
    match dotenvy::dotenv() {
        Ok(path) => tracing::debug!(path = %path.display(), "Loaded .env file"),
        Err(e) if e.not_found() => {}
        Err(e) => tracing::warn!(error = %e, "Ignoring unreadable .env file"),
    }

    let settings = if env_configured() {
        let settings = load_from_env()?;
        tracing::info!("Resilience settings loaded from environment variables");
        settings
    } else if let Some(path) = probe_config_paths() {
        load_from_file(Some(path))?
    } else {
        tracing::info!("No resilience settings found, using defaults");
        ResilienceSettings::default()
    };

    settings.validate()?;
    Ok(settings)
}

/// Load settings from `STEADFAST_*` environment variables
///
/// Unset variables keep their defaults.
///
/// # Errors
/// Returns `InfraError::Config` if a set variable has an invalid value.
pub fn load_from_env() -> InfraResult<ResilienceSettings> {
    let defaults = ResilienceSettings::default();

    Ok(ResilienceSettings {
        max_attempts: env_parse("MAX_ATTEMPTS")?.unwrap_or(defaults.max_attempts),
        wait_seconds: env_parse("WAIT_SECONDS")?.unwrap_or(defaults.wait_seconds),
        default_policy_name: env_string("DEFAULT_POLICY_NAME")
            .unwrap_or(defaults.default_policy_name),
        status_lower_bound: env_parse("STATUS_LOWER_BOUND")?
            .unwrap_or(defaults.status_lower_bound),
        status_upper_bound: env_parse("STATUS_UPPER_BOUND")?
            .unwrap_or(defaults.status_upper_bound),
        handle_cache_ttl_seconds: env_parse("HANDLE_CACHE_TTL_SECONDS")?
            .unwrap_or(defaults.handle_cache_ttl_seconds),
        request_timeout_seconds: env_parse("REQUEST_TIMEOUT_SECONDS")?
            .unwrap_or(defaults.request_timeout_seconds),
        user_agent: env_string("USER_AGENT").or(defaults.user_agent),
    })
}

/// Load settings from a file
///
/// If `path` is `None`, probes the standard locations. Supports JSON and
/// TOML, detected by file extension.
///
/// # Errors
/// Returns `InfraError::Config` if no file is found or it does not parse,
/// and `InfraError::Io` if it cannot be read.
pub fn load_from_file(path: Option<PathBuf>) -> InfraResult<ResilienceSettings> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(InfraError::Config(format!("Config file not found: {}", p.display())));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            InfraError::Config("No config file found in any of the standard locations".to_string())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading resilience settings from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|source| InfraError::Io { path: config_path.clone(), source })?;

    parse_settings(&contents, &config_path)
}

fn parse_settings(contents: &str, path: &Path) -> InfraResult<ResilienceSettings> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| InfraError::Config(format!("Invalid TOML format: {}", e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| InfraError::Config(format!("Invalid JSON format: {}", e))),
        _ => Err(InfraError::Config(format!("Unsupported config format: {}", extension))),
    }
}

/// First existing settings file among the standard locations
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        candidates.extend(FILE_NAMES.iter().map(|name| cwd.join(name)));
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.extend(FILE_NAMES.iter().map(|name| exe_dir.join(name)));
        }
    }

    candidates.into_iter().find(|path| path.exists())
}

fn env_configured() -> bool {
    std::env::vars_os().any(|(key, _)| key.to_string_lossy().starts_with(ENV_PREFIX))
}

fn env_string(suffix: &str) -> Option<String> {
    std::env::var(format!("{ENV_PREFIX}{suffix}"))
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn env_parse<T>(suffix: &str) -> InfraResult<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    env_string(suffix)
        .map(|raw| {
            raw.parse::<T>().map_err(|e| {
                InfraError::Config(format!("Invalid {ENV_PREFIX}{suffix} value \"{raw}\": {e}"))
            })
        })
        .transpose()
}
