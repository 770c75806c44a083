//! Configuration loader for the `polderflow` backend service.
//!
//! This module centralizes all runtime configuration values and their defaults,
//! loading from environment variables (with optional `.env` file support
//! provided by the caller). By consolidating configuration logic here, we
//! avoid scattering `env::var` calls throughout the codebase.
//!
use std::env;

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

use crate::features::ModelVariant;

/// Parse an optional integer environment variable with a default value.
macro_rules! parse_env_u32 {
    ($var_name:expr, $default:expr) => {
        env::var($var_name)
            .ok()
            .map(|v| v.parse::<u32>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

/// Parse a required string environment variable.
macro_rules! require_env {
    ($var_name:expr) => {
        env::var($var_name)
            .map_err(|_| anyhow!("{} must be set in .env or environment", $var_name))?
    };
}

/// Structured credential object for the remote store, supplied as one JSON
/// blob in `STORE_CREDENTIALS_JSON`.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreCredentials {
    /// Cloud project the realtime database belongs to.
    pub project_id: String,

    /// Database secret appended as the `auth` query parameter on REST calls.
    pub database_secret: String,
}

/// Strongly typed application configuration.
///
/// All fields are immutable after loading, ensuring a consistent configuration
/// snapshot for the lifetime of the application.
#[derive(Debug, Clone)]
pub struct Config {
    // ---
    /// Remote store base URL.
    pub database_url: String,

    /// Parsed store credential object.
    pub credentials: StoreCredentials,

    /// Weather data API base URL.
    pub weather_api_url: String,

    /// Locations to fetch weather data for.
    pub weather_locations: Vec<String>,

    /// Filesystem path of the serialized classifier artifact.
    pub model_path: String,

    /// Which trained model variant (and feature enumeration) is active.
    pub model_variant: ModelVariant,

    /// HTTP listen port.
    pub port: u16,

    /// Interval between scheduled prediction runs, in seconds.
    pub predict_interval_secs: u32,

    /// Interval between scheduled weather uploads, in seconds.
    pub weather_interval_secs: u32,

    /// Timeout applied to every outbound store/weather HTTP call, in seconds.
    pub http_timeout_secs: u32,
}

/// Load configuration from environment variables with defaults.
///
/// Required:
/// - `DATABASE_URL` – remote store base URL
/// - `STORE_CREDENTIALS_JSON` – structured credential object (JSON)
/// - `WEATHER_API_URL` – weather data API base URL
///
/// Optional:
/// - `WEATHER_LOCATIONS` – comma-separated location list
/// - `MODEL_PATH` – classifier artifact path (default: `models/flood_classifier.onnx`)
/// - `MODEL_VARIANT` – `alert_only` or `joint` (default: `alert_only`)
/// - `PORT` – HTTP listen port (default: 5000)
/// - `PREDICT_INTERVAL_SECS` – scheduled prediction interval (default: 60)
/// - `WEATHER_INTERVAL_SECS` – scheduled weather upload interval (default: 300)
/// - `HTTP_TIMEOUT_SECS` – outbound HTTP timeout (default: 10)
///
/// Returns an error if any required variable is missing or invalid.
pub fn load_from_env() -> Result<Config> {
    // ---
    let database_url = require_env!("DATABASE_URL");
    let credentials_json = require_env!("STORE_CREDENTIALS_JSON");
    let credentials: StoreCredentials = serde_json::from_str(&credentials_json)
        .context("STORE_CREDENTIALS_JSON is not a valid credential object")?;

    let weather_api_url = require_env!("WEATHER_API_URL");
    let weather_locations = env::var("WEATHER_LOCATIONS")
        .unwrap_or_else(|_| "Dayeuhkolot,Bojongsoang,Baleendah".to_string())
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    let model_path = env::var("MODEL_PATH")
        .unwrap_or_else(|_| "models/flood_classifier.onnx".to_string());
    let model_variant = env::var("MODEL_VARIANT")
        .unwrap_or_else(|_| "alert_only".to_string())
        .parse::<ModelVariant>()?;

    let port = u16::try_from(parse_env_u32!("PORT", 5000))
        .map_err(|_| anyhow!("PORT out of range"))?;
    let predict_interval_secs = parse_env_u32!("PREDICT_INTERVAL_SECS", 60);
    let weather_interval_secs = parse_env_u32!("WEATHER_INTERVAL_SECS", 300);
    let http_timeout_secs = parse_env_u32!("HTTP_TIMEOUT_SECS", 10);

    Ok(Config {
        database_url,
        credentials,
        weather_api_url,
        weather_locations,
        model_path,
        model_variant,
        port,
        predict_interval_secs,
        weather_interval_secs,
        http_timeout_secs,
    })
}

impl Config {
    /// Log the loaded configuration for debugging purposes.
    ///
    /// Masks the database secret while showing all configuration values that
    /// were loaded.
    pub fn log_config(&self) {
        // ---
        tracing::info!("Configuration loaded:");
        tracing::info!("  DATABASE_URL          : {}", self.database_url);
        tracing::info!("  STORE project_id      : {}", self.credentials.project_id);
        tracing::info!("  STORE database_secret : ****");
        tracing::info!("  WEATHER_API_URL       : {}", self.weather_api_url);
        tracing::info!("  WEATHER_LOCATIONS     : {}", self.weather_locations.join(","));
        tracing::info!("  MODEL_PATH            : {}", self.model_path);
        tracing::info!("  MODEL_VARIANT         : {}", self.model_variant);
        tracing::info!("  PORT                  : {}", self.port);
        tracing::info!("  PREDICT_INTERVAL_SECS : {}", self.predict_interval_secs);
        tracing::info!("  WEATHER_INTERVAL_SECS : {}", self.weather_interval_secs);
        tracing::info!("  HTTP_TIMEOUT_SECS     : {}", self.http_timeout_secs);
    }
}
