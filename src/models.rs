//! Simple data models for the prediction pipeline.

use serde::Serialize;
use serde_json::Value;

// ---

/// Outcome of one pipeline run, returned to HTTP callers and logged by the
/// scheduled job. Both codes are in the closed range 0–3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PredictionResult {
    // ---
    pub pump_on: i64,
    pub alert_level: i64,
}

/// Pump recommendation from the basin ("kolam") water level, in centimeters.
///
/// Used only when the active model does not itself predict a pump state.
/// Lower bound of tier 1 is inclusive via `<`, upper bounds via `<=`.
pub fn pump_recommendation(level_cm: f64) -> i64 {
    // ---
    if level_cm < 3.2 {
        0
    } else if level_cm <= 9.6 {
        1
    } else if level_cm <= 14.0 {
        2
    } else {
        3
    }
}

/// Permissive numeric coercion for request payload values.
///
/// Numbers pass through; numeric strings parse; everything else (and any
/// missing key, handled by the caller) collapses to `0.0`.
pub fn coerce_number(value: &Value) -> f64 {
    // ---
    value
        .as_f64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse::<f64>().ok()))
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pump_rule_boundaries() {
        // ---
        // Tier 0: below 3.2
        assert_eq!(pump_recommendation(0.0), 0);
        assert_eq!(pump_recommendation(3.19), 0);

        // Tier 1: 3.2 inclusive through 9.6 inclusive
        assert_eq!(pump_recommendation(3.2), 1);
        assert_eq!(pump_recommendation(5.0), 1);
        assert_eq!(pump_recommendation(9.6), 1);

        // Tier 2: above 9.6 through 14.0 inclusive
        assert_eq!(pump_recommendation(9.61), 2);
        assert_eq!(pump_recommendation(14.0), 2);

        // Tier 3: above 14.0
        assert_eq!(pump_recommendation(14.01), 3);
        assert_eq!(pump_recommendation(100.0), 3);
    }

    #[test]
    fn test_coerce_number_accepts_numbers_and_numeric_strings() {
        // ---
        assert_eq!(coerce_number(&json!(10.5)), 10.5);
        assert_eq!(coerce_number(&json!(7)), 7.0);
        assert_eq!(coerce_number(&json!("3.2")), 3.2);
        assert_eq!(coerce_number(&json!(" 14 ")), 14.0);
    }

    #[test]
    fn test_coerce_number_collapses_garbage_to_zero() {
        // ---
        assert_eq!(coerce_number(&json!("deep water")), 0.0);
        assert_eq!(coerce_number(&json!(null)), 0.0);
        assert_eq!(coerce_number(&json!([1, 2])), 0.0);
        assert_eq!(coerce_number(&json!({"v": 1})), 0.0);
    }

    #[test]
    fn test_prediction_result_serializes_expected_keys() {
        // ---
        let result = PredictionResult {
            pump_on: 2,
            alert_level: 1,
        };
        let body = serde_json::to_value(&result).unwrap();
        assert_eq!(body, json!({"pump_on": 2, "alert_level": 1}));
    }
}
