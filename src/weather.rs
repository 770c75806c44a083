//! Weather data client and ingestion.
//!
//! Fetches current weather for each configured location from the external
//! weather API and writes each location's payload into the store under a
//! location-named child of the root node. A location whose fetch fails gets
//! an `{"error": ...}` payload instead of failing the whole sweep, and an
//! error payload replaces the stored node outright rather than merging into
//! stale data.

use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::{Context, Result};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::store::{Store, POLDER_ROOT};

// ---

/// Client for the per-location weather API.
#[derive(Debug)]
pub struct WeatherClient {
    // ---
    client: reqwest::Client,
    base_url: String,
    locations: Vec<String>,
}

impl WeatherClient {
    pub fn new(base_url: &str, locations: Vec<String>, timeout: Duration) -> Result<Self> {
        // ---
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build weather HTTP client")?;

        Ok(WeatherClient {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            locations,
        })
    }

    /// Fetch current weather for every configured location.
    ///
    /// Never fails as a whole: a location whose fetch or parse fails is
    /// represented by an `{"error": ...}` object in the returned mapping.
    pub async fn fetch_all_locations(&self) -> BTreeMap<String, Value> {
        // ---
        let mut data = BTreeMap::new();
        for location in &self.locations {
            let payload = match self.fetch_location(location).await {
                Ok(value) => value,
                Err(e) => {
                    warn!("Weather fetch failed for {}: {}", location, e);
                    json!({ "error": e.to_string() })
                }
            };
            data.insert(location.clone(), payload);
        }
        data
    }

    async fn fetch_location(&self, location: &str) -> Result<Value> {
        // ---
        let url = format!("{}/{}", self.base_url, location);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Request to '{}' failed", url))?
            .error_for_status()
            .with_context(|| format!("Weather API rejected '{}'", url))?;

        response
            .json()
            .await
            .with_context(|| format!("Weather API returned invalid JSON for '{}'", location))
    }
}

// ---

/// Fetch all locations and write each payload into the store.
///
/// Error-state payloads use `set` (full replace); healthy payloads use
/// `update` (merge) so fields absent from this fetch survive.
pub async fn upload_weather(store: &Store, weather: &WeatherClient) -> Result<()> {
    // ---
    let data = weather.fetch_all_locations().await;

    for (location, payload) in &data {
        let path = format!("{}/{}", POLDER_ROOT, location);
        if should_replace(payload) {
            store.set(&path, payload).await?;
        } else {
            store.update(&path, payload).await?;
        }
    }

    info!("Weather data uploaded for {} locations", data.len());
    Ok(())
}

/// An error payload (or anything that is not a mergeable object) replaces
/// the stored node instead of merging into it.
fn should_replace(payload: &Value) -> bool {
    // ---
    match payload {
        Value::Object(map) => map.contains_key("error"),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn test_error_payloads_replace() {
        // ---
        assert!(should_replace(&json!({"error": "timeout"})));
        assert!(should_replace(&json!("not an object")));
    }

    #[test]
    fn test_healthy_payloads_merge() {
        // ---
        assert!(!should_replace(
            &json!({"curah_hujan": 12.5, "suhu": 27.0})
        ));
    }
}
