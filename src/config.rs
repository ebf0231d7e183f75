//! Configuration loader for the flood risk service.
//!
//! This module centralizes all runtime configuration values and their defaults,
//! loading from environment variables (with optional `.env` file support
//! provided by the caller), so the rest of the service never calls `env::var`
//! directly.
use std::{env, net::SocketAddr, path::PathBuf, time::Duration};

use anyhow::{anyhow, Result};

/// Parse an optional integer variable through `$get` with a default value.
macro_rules! parse_env_u64 {
    ($get:expr, $var_name:expr, $default:expr) => {
        optional_env!($get, $var_name)
            .map(|v| v.parse::<u64>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

/// Read an optional string variable through `$get`, treating blank as unset.
macro_rules! optional_env {
    ($get:expr, $var_name:expr) => {
        $get($var_name).filter(|v: &String| !v.trim().is_empty())
    };
}

/// Strongly typed application configuration.
///
/// All fields are immutable after loading, ensuring a consistent configuration
/// snapshot for the lifetime of the application.
#[derive(Debug, Clone)]
pub struct Config {
    // ---
    /// Address the HTTP server binds to.
    pub bind_addr: SocketAddr,

    /// Historical observation dataset (JSON array).
    pub data_file: PathBuf,

    /// Upstream district feed base URL. The `/district_risk` route is
    /// disabled when unset.
    pub district_api_url: Option<String>,

    /// Value sent in the `Authorization` header to the district feed.
    pub district_api_key: Option<String>,

    /// Timeout for a single district feed request.
    pub district_api_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8090)),
            data_file: PathBuf::from("data/training_data.json"),
            district_api_url: None,
            district_api_key: None,
            district_api_timeout: Duration::from_secs(10),
        }
    }
}

/// Load configuration from environment variables with defaults.
///
/// Optional:
/// - `BIND_ADDR` – listen address (default: `0.0.0.0:8090`)
/// - `DATA_FILE` – historical dataset path (default: `data/training_data.json`)
/// - `DISTRICT_API_URL` – upstream district feed (default: unset)
/// - `DISTRICT_API_KEY` – upstream `Authorization` header value (default: unset)
/// - `DISTRICT_API_TIMEOUT_SECS` – upstream timeout (default: 10)
///
/// Returns an error if any variable is present but invalid.
pub fn load_from_env() -> Result<Config> {
    load_from(|name| env::var(name).ok())
}

/// Build a [`Config`] from an arbitrary variable lookup.
pub fn load_from(get: impl Fn(&str) -> Option<String>) -> Result<Config> {
    // ---
    let defaults = Config::default();

    let bind_addr = match optional_env!(get, "BIND_ADDR") {
        Some(v) => v
            .parse::<SocketAddr>()
            .map_err(|e| anyhow!("Invalid BIND_ADDR '{}': {}", v, e))?,
        None => defaults.bind_addr,
    };
    let data_file = optional_env!(get, "DATA_FILE")
        .map(PathBuf::from)
        .unwrap_or(defaults.data_file);
    let district_api_url = optional_env!(get, "DISTRICT_API_URL");
    let district_api_key = optional_env!(get, "DISTRICT_API_KEY");
    let timeout_secs = parse_env_u64!(
        get,
        "DISTRICT_API_TIMEOUT_SECS",
        defaults.district_api_timeout.as_secs()
    );
    if timeout_secs == 0 {
        return Err(anyhow!("Invalid DISTRICT_API_TIMEOUT_SECS: must be at least 1"));
    }

    Ok(Config {
        bind_addr,
        data_file,
        district_api_url,
        district_api_key,
        district_api_timeout: Duration::from_secs(timeout_secs),
    })
}

impl Config {
    /// Log the loaded configuration, masking the district API key.
    pub fn log_config(&self) {
        // ---
        let masked_key = self.district_api_key.as_deref().map(mask_secret);

        tracing::info!("Configuration loaded:");
        tracing::info!("  BIND_ADDR                 : {}", self.bind_addr);
        tracing::info!("  DATA_FILE                 : {}", self.data_file.display());
        tracing::info!(
            "  DISTRICT_API_URL          : {}",
            self.district_api_url.as_deref().unwrap_or("(disabled)")
        );
        tracing::info!(
            "  DISTRICT_API_KEY          : {}",
            masked_key.as_deref().unwrap_or("(none)")
        );
        tracing::info!(
            "  DISTRICT_API_TIMEOUT_SECS : {}",
            self.district_api_timeout.as_secs()
        );
    }
}

/// Keep the first four characters of a secret and mask the rest.
fn mask_secret(secret: &str) -> String {
    // ---
    let visible: String = secret.chars().take(4).collect();
    if visible.chars().count() == secret.chars().count() {
        "****".to_string()
    } else {
        format!("{visible}****")
    }
}
