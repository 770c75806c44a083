//! Classifier wrapper — local inference via the pre-trained ONNX artifact.
//!
//! The model is exported from the offline training pipeline and loaded once
//! at process start; a missing or corrupt artifact is fatal to startup.
//! Inference is CPU-bound and synchronous; async callers hop through
//! `tokio::task::spawn_blocking` (see `pipeline`).

use std::path::Path;
use std::sync::Mutex;

use anyhow::{anyhow, bail, Result};
use ort::session::Session;
use ort::value::Tensor;

use crate::features::ModelVariant;

// ---

/// A classifier that maps a feature vector to one or two integer labels.
///
/// The production implementation is [`OnnxClassifier`]; tests substitute a
/// stub so the pipeline and routes can run without a model artifact.
pub trait AlertModel: Send + Sync {
    /// Predict labels for one feature vector. The vector must follow the
    /// active variant's enumeration; the label count matches the variant's
    /// output shape.
    fn predict(&self, vector: &[f32]) -> Result<Vec<i64>>;
}

/// ONNX-backed classifier, one session per process lifetime.
pub struct OnnxClassifier {
    session: Mutex<Session>,
    variant: ModelVariant,
}

impl std::fmt::Debug for OnnxClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxClassifier")
            .field("variant", &self.variant)
            .finish_non_exhaustive()
    }
}

impl OnnxClassifier {
    /// Load the classifier artifact from `path`.
    ///
    /// Fails if the file is missing or the ONNX runtime rejects it.
    pub fn load(path: &str, variant: ModelVariant) -> Result<Self> {
        // ---
        if !Path::new(path).exists() {
            bail!("Classifier artifact not found at '{}'", path);
        }

        let session = Session::builder()
            .and_then(|b| Ok(b.with_intra_threads(1)?))
            .and_then(|mut b| b.commit_from_file(path))
            .map_err(|e| anyhow!("Failed to load classifier from '{}': {}", path, e))?;

        tracing::info!("Classifier loaded from {} (variant: {})", path, variant);

        Ok(OnnxClassifier {
            session: Mutex::new(session),
            variant,
        })
    }
}

impl AlertModel for OnnxClassifier {
    fn predict(&self, vector: &[f32]) -> Result<Vec<i64>> {
        // ---
        let expected = self.variant.features().len();
        if vector.len() != expected {
            bail!(
                "Feature vector has {} entries but the {} enumeration has {}",
                vector.len(),
                self.variant,
                expected
            );
        }

        let mut session = self
            .session
            .lock()
            .map_err(|e| anyhow!("Classifier session lock poisoned: {}", e))?;

        let shape = vec![1i64, vector.len() as i64];
        let input = Tensor::from_array((shape, vector.to_vec()))
            .map_err(|e| anyhow!("Failed to build input tensor: {}", e))?;

        let outputs = session
            .run(ort::inputs! { "float_input" => input })
            .map_err(|e| anyhow!("Inference failed: {}", e))?;

        // Output 0 of the exported classifier is the label tensor; the
        // probability output is ignored.
        let (_shape, labels) = outputs[0]
            .try_extract_tensor::<i64>()
            .map_err(|e| anyhow!("Failed to extract label tensor: {}", e))?;

        let labels = labels.to_vec();
        if labels.len() != self.variant.output_len() {
            bail!(
                "Model emitted {} labels but variant {} expects {}",
                labels.len(),
                self.variant,
                self.variant.output_len()
            );
        }

        Ok(labels)
    }
}
