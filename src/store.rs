//! Remote store client for the polder telemetry database.
//!
//! The store is a hosted hierarchical key-value database addressed by path:
//! `GET|PUT|PATCH {base}/{path}.json`, with the database secret passed as an
//! `auth` query parameter. Sensor readings live under `/Polder/{Feature}` as
//! maps from timestamp key to value; predictions are appended under
//! `/Polder/pump_on` and `/Polder/status_banjir`.
//!
//! One `Store` (and its underlying connection pool) is built at startup and
//! shared by every request handler and scheduled job. `Store::init` is
//! idempotent: a second call returns the handle built by the first.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use serde_json::Value;

use crate::config::Config;
use crate::models::coerce_number;

/// Top-level node all location and prediction data live under.
pub const POLDER_ROOT: &str = "Polder";

/// Timestamp key format of externally written sensor readings.
pub const READING_TS_FORMAT: &str = "%Y-%m-%d-%H_%M_%S";

/// Timestamp key format of prediction records written by this service.
/// Millisecond precision keeps keys distinct across overlapping runs.
pub const RUN_TS_FORMAT: &str = "%Y-%m-%d-%H_%M_%S%.3f";

static STORE: OnceLock<Arc<Store>> = OnceLock::new();

// ---

/// Client for the remote hierarchical store.
#[derive(Debug)]
pub struct Store {
    // ---
    client: reqwest::Client,
    base_url: String,
    auth: Option<String>,
}

impl Store {
    /// Build a store client against `base_url` with a bounded request timeout.
    ///
    /// `auth` is the database secret sent on every call; `None` disables the
    /// query parameter (used by tests against a local mock).
    pub fn new(base_url: &str, auth: Option<String>, timeout: Duration) -> Result<Self> {
        // ---
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build store HTTP client")?;

        Ok(Store {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth,
        })
    }

    /// Initialize the process-wide store handle from configuration.
    ///
    /// The first call builds the client; every later call returns the
    /// existing handle unchanged, regardless of the config passed.
    pub fn init(config: &Config) -> Result<Arc<Store>> {
        // ---
        if let Some(existing) = STORE.get() {
            return Ok(Arc::clone(existing));
        }

        let store = Arc::new(Store::new(
            &config.database_url,
            Some(config.credentials.database_secret.clone()),
            Duration::from_secs(u64::from(config.http_timeout_secs)),
        )?);

        // Another caller may have won the race; either way one handle exists.
        Ok(Arc::clone(STORE.get_or_init(|| store)))
    }

    fn url_for(&self, path: &str) -> String {
        // ---
        match &self.auth {
            Some(secret) => format!("{}/{}.json?auth={}", self.base_url, path, secret),
            None => format!("{}/{}.json", self.base_url, path),
        }
    }

    /// Read the value at `path`. Absent nodes come back as `Value::Null`.
    pub async fn get(&self, path: &str) -> Result<Value> {
        // ---
        let response = self
            .client
            .get(self.url_for(path))
            .send()
            .await
            .with_context(|| format!("Store read failed at '{}'", path))?
            .error_for_status()
            .with_context(|| format!("Store read rejected at '{}'", path))?;

        response
            .json()
            .await
            .with_context(|| format!("Store read at '{}' returned invalid JSON", path))
    }

    /// Replace the value at `path` entirely.
    pub async fn set(&self, path: &str, value: &Value) -> Result<()> {
        // ---
        self.client
            .put(self.url_for(path))
            .json(value)
            .send()
            .await
            .with_context(|| format!("Store write failed at '{}'", path))?
            .error_for_status()
            .with_context(|| format!("Store write rejected at '{}'", path))?;

        Ok(())
    }

    /// Merge the fields of `value` into the object at `path`.
    pub async fn update(&self, path: &str, value: &Value) -> Result<()> {
        // ---
        self.client
            .patch(self.url_for(path))
            .json(value)
            .send()
            .await
            .with_context(|| format!("Store update failed at '{}'", path))?
            .error_for_status()
            .with_context(|| format!("Store update rejected at '{}'", path))?;

        Ok(())
    }

    /// Current value of a feature: the entry under `/Polder/{feature}` with
    /// the temporally greatest timestamp key, or `0.0` when no readings
    /// exist.
    pub async fn latest_reading(&self, feature: &str) -> Result<f64> {
        // ---
        let node = self.get(&format!("{}/{}", POLDER_ROOT, feature)).await?;
        Ok(latest_value(&node))
    }
}

// ---

/// Select the most recent value from a timestamp-keyed reading map.
///
/// Keys are compared as parsed instants, not as strings: the store holds
/// second-precision reading keys and millisecond-precision run keys side by
/// side, and string order is not trusted across formats. Keys that do not
/// parse as timestamps are skipped. A missing, non-map, or empty node yields
/// `0.0`.
pub fn latest_value(node: &Value) -> f64 {
    // ---
    let Some(map) = node.as_object() else {
        return 0.0;
    };

    map.iter()
        .filter_map(|(key, value)| parse_timestamp_key(key).map(|ts| (ts, value)))
        .max_by_key(|(ts, _)| *ts)
        .map(|(_, value)| coerce_number(value))
        .unwrap_or(0.0)
}

fn parse_timestamp_key(key: &str) -> Option<NaiveDateTime> {
    // ---
    NaiveDateTime::parse_from_str(key, READING_TS_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(key, RUN_TS_FORMAT))
        .ok()
}
