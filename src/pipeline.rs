//! The prediction pipeline.
//!
//! Both invocation paths — an inbound HTTP request and the scheduled
//! background job — funnel into [`run`], so behavior is identical regardless
//! of source. One run assembles the feature vector (from an explicit payload
//! or from the store), predicts, derives the pump recommendation when the
//! model does not supply one, and appends both outputs to the store under a
//! single freshly generated run timestamp.

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use serde_json::{json, Map, Value};
use tracing::{debug, info};

use crate::features::{Feature, ModelVariant};
use crate::inference::AlertModel;
use crate::models::{coerce_number, pump_recommendation, PredictionResult};
use crate::store::{Store, POLDER_ROOT, RUN_TS_FORMAT};

// ---

/// Execute one pipeline run.
///
/// With `payload`, the vector is taken from the request body (missing keys
/// default to 0); without it, every feature's latest value is read from the
/// store in enumeration order. Store and inference failures propagate; no
/// retry, no rollback of a partially persisted record.
pub async fn run(
    store: &Store,
    model: &Arc<dyn AlertModel>,
    variant: ModelVariant,
    payload: Option<&Map<String, Value>>,
) -> Result<PredictionResult> {
    // ---
    let features = variant.features();

    // Step 1: assemble the feature vector
    debug!("predict pipeline - Step 1 (assemble vector)");

    let values = match payload {
        Some(map) => vector_from_payload(features, map),
        None => {
            let mut values = Vec::with_capacity(features.len());
            for feature in features {
                let value = store.latest_reading(feature.key()).await?;
                info!("Feature {}: {}", feature.key(), value);
                values.push(value);
            }
            values
        }
    };

    // Step 2: run inference
    debug!("predict pipeline - Step 2 (inference)");

    let vector: Vec<f32> = values.iter().map(|&v| v as f32).collect();
    let labels = run_inference(model, vector).await?;

    // Step 3: derive the pump recommendation if the model did not supply one
    let result = match variant {
        ModelVariant::AlertOnly => {
            let alert_level = labels
                .first()
                .copied()
                .context("Model returned no labels")?;
            let kolam_index = features
                .iter()
                .position(|f| *f == Feature::TmaKolam)
                .context("Active enumeration is missing TMA_Kolam")?;
            let pump_on = pump_recommendation(values[kolam_index]);
            info!("Pump recommendation from TMA_Kolam: {}", pump_on);
            PredictionResult {
                pump_on,
                alert_level,
            }
        }
        ModelVariant::Joint => {
            let (pump_on, alert_level) = match labels.as_slice() {
                [pump, alert] => (*pump, *alert),
                other => {
                    return Err(anyhow!(
                        "Joint model returned {} labels, expected 2",
                        other.len()
                    ))
                }
            };
            PredictionResult {
                pump_on,
                alert_level,
            }
        }
    };

    info!("predict -> alert_level={}", result.alert_level);

    // Step 4: persist both outputs under one run timestamp
    debug!("predict pipeline - Step 4 (persist)");

    let ts = run_timestamp(Utc::now());
    persist(store, &ts, &result).await?;

    Ok(result)
}

// ---

/// Assemble a vector from an explicit request payload. Missing keys default
/// to 0; values coerce permissively.
pub fn vector_from_payload(features: &[Feature], payload: &Map<String, Value>) -> Vec<f64> {
    // ---
    features
        .iter()
        .map(|feature| {
            payload
                .get(feature.key())
                .map(coerce_number)
                .unwrap_or(0.0)
        })
        .collect()
}

/// Inference is CPU-bound — run it on the blocking thread pool.
async fn run_inference(model: &Arc<dyn AlertModel>, vector: Vec<f32>) -> Result<Vec<i64>> {
    // ---
    let model = Arc::clone(model);
    tokio::task::spawn_blocking(move || model.predict(&vector))
        .await
        .map_err(|e| anyhow!("Inference task failed to join: {}", e))?
}

/// Generation timestamp for one pipeline run, in WIB (UTC+7, no DST).
///
/// Millisecond precision keeps record keys distinct when runs overlap;
/// sensor readings written externally use the plain second format.
pub fn run_timestamp(now: DateTime<Utc>) -> String {
    // ---
    let wib = now + chrono::Duration::hours(7); // WIB = UTC+7
    wib.format(RUN_TS_FORMAT).to_string()
}

/// Append `pump_on` and `status_banjir` under the run timestamp.
///
/// The two writes are independent key sets; a failure of the second after
/// the first succeeded leaves a partial record in place. That is accepted —
/// records are append-only and the next scheduled run writes a fresh pair.
async fn persist(store: &Store, ts: &str, result: &PredictionResult) -> Result<()> {
    // ---
    store
        .set(
            &format!("{}/pump_on/{}", POLDER_ROOT, ts),
            &json!(result.pump_on),
        )
        .await
        .context("pump_on record was not stored")?;

    store
        .set(
            &format!("{}/status_banjir/{}", POLDER_ROOT, ts),
            &json!(result.alert_level),
        )
        .await
        .context("status_banjir record was not stored (pump_on record already was)")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use chrono::{NaiveDateTime, TimeZone};

    #[test]
    fn test_vector_from_payload_defaults_missing_keys() {
        // ---
        let features = ModelVariant::AlertOnly.features();
        let mut payload = Map::new();
        payload.insert("TMA_Kolam".to_string(), json!(10.0));

        let values = vector_from_payload(features, &payload);
        assert_eq!(values, vec![0.0, 0.0, 0.0, 0.0, 0.0, 10.0]);
    }

    #[test]
    fn test_vector_from_payload_ignores_unknown_keys() {
        // ---
        let features = ModelVariant::AlertOnly.features();
        let mut payload = Map::new();
        payload.insert("Debit_Hulu".to_string(), json!("2.5"));
        payload.insert("Not_A_Feature".to_string(), json!(99.0));

        let values = vector_from_payload(features, &payload);
        assert_eq!(values, vec![0.0, 0.0, 2.5, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_run_timestamp_is_wib_and_parses_back() {
        // ---
        let utc = Utc.with_ymd_and_hms(2025, 6, 1, 20, 30, 0).unwrap();
        let ts = run_timestamp(utc);

        // 20:30 UTC is 03:30 the next day in WIB
        assert_eq!(ts, "2025-06-02-03_30_00.000");
        assert!(NaiveDateTime::parse_from_str(&ts, RUN_TS_FORMAT).is_ok());
    }
}
