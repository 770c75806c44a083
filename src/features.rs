//! Feature enumeration and model variant selection.
//!
//! The classifier consumes a fixed-length vector whose entries are the
//! latest readings of a fixed, ordered set of named sensors. The ordering is
//! a versioned contract tied to the trained model: two variants of the model
//! exist, trained on differently ordered frames, and their enumerations must
//! never be mixed. The active variant is chosen once at startup via
//! `MODEL_VARIANT` and carried through [`ModelVariant`], which ties the
//! enumeration and the model's output shape together.

use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;

// ---

/// A named sensor measurement consumed by the classifier.
///
/// `key()` returns the store node name the readings live under; these match
/// the column names of the training data and must not be renamed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feature {
    DebitCipalasari,
    DebitHilir,
    DebitHulu,
    TmaCipalasari,
    TmaCitarum,
    TmaKolam,
}

impl Feature {
    /// Store node / training column name for this feature.
    pub fn key(self) -> &'static str {
        // ---
        match self {
            Feature::DebitCipalasari => "Debit_Cipalasari",
            Feature::DebitHilir => "Debit_Hilir",
            Feature::DebitHulu => "Debit_Hulu",
            Feature::TmaCipalasari => "TMA_Cipalasari",
            Feature::TmaCitarum => "TMA_Citarum",
            Feature::TmaKolam => "TMA_Kolam",
        }
    }
}

/// Feature order the alert-only model was trained on.
const ALERT_ONLY_FEATURES: [Feature; 6] = [
    Feature::DebitCipalasari,
    Feature::DebitHilir,
    Feature::DebitHulu,
    Feature::TmaCipalasari,
    Feature::TmaCitarum,
    Feature::TmaKolam,
];

/// Feature order the joint model was trained on. Same sensors, different
/// training frame; incompatible with the alert-only order.
const JOINT_FEATURES: [Feature; 6] = [
    Feature::TmaKolam,
    Feature::TmaCitarum,
    Feature::TmaCipalasari,
    Feature::DebitHulu,
    Feature::DebitHilir,
    Feature::DebitCipalasari,
];

// ---

/// Which trained classifier is active, selected once at startup.
///
/// Each variant carries its own feature enumeration and output shape:
/// - `AlertOnly` predicts `[alert_level]`; the pump state is derived from
///   the basin water level by rule.
/// - `Joint` predicts `[pump_on, alert_level]` directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelVariant {
    AlertOnly,
    Joint,
}

impl ModelVariant {
    /// The ordered feature enumeration this variant was trained on.
    pub fn features(self) -> &'static [Feature] {
        // ---
        match self {
            ModelVariant::AlertOnly => &ALERT_ONLY_FEATURES,
            ModelVariant::Joint => &JOINT_FEATURES,
        }
    }

    /// Number of labels the model emits per prediction.
    pub fn output_len(self) -> usize {
        // ---
        match self {
            ModelVariant::AlertOnly => 1,
            ModelVariant::Joint => 2,
        }
    }
}

impl fmt::Display for ModelVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelVariant::AlertOnly => write!(f, "alert_only"),
            ModelVariant::Joint => write!(f, "joint"),
        }
    }
}

impl FromStr for ModelVariant {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "alert_only" => Ok(ModelVariant::AlertOnly),
            "joint" => Ok(ModelVariant::Joint),
            other => Err(anyhow!(
                "Invalid MODEL_VARIANT '{}': expected 'alert_only' or 'joint'",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn test_feature_keys_match_training_columns() {
        // ---
        let keys: Vec<&str> = ALERT_ONLY_FEATURES.iter().map(|f| f.key()).collect();
        assert_eq!(
            keys,
            vec![
                "Debit_Cipalasari",
                "Debit_Hilir",
                "Debit_Hulu",
                "TMA_Cipalasari",
                "TMA_Citarum",
                "TMA_Kolam",
            ]
        );
    }

    #[test]
    fn test_variant_enumerations_are_incompatible() {
        // ---
        // Same sensors, different order: positions must not line up.
        let alert = ModelVariant::AlertOnly.features();
        let joint = ModelVariant::Joint.features();
        assert_eq!(alert.len(), joint.len());
        assert_ne!(alert, joint);
    }

    #[test]
    fn test_output_shapes() {
        // ---
        assert_eq!(ModelVariant::AlertOnly.output_len(), 1);
        assert_eq!(ModelVariant::Joint.output_len(), 2);
    }

    #[test]
    fn test_variant_parsing() {
        // ---
        assert_eq!(
            "alert_only".parse::<ModelVariant>().unwrap(),
            ModelVariant::AlertOnly
        );
        assert_eq!("joint".parse::<ModelVariant>().unwrap(), ModelVariant::Joint);
        assert!("dt_model".parse::<ModelVariant>().is_err());
    }
}
