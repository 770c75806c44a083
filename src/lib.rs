//! Library crate for the `polderflow` backend service.
//!
//! The binary in `main.rs` only handles process startup; everything it wires
//! together lives here so the integration tests can build the same router
//! and pipeline against mocked collaborators.

use std::sync::Arc;

pub mod config;
pub mod features;
pub mod inference;
pub mod models;
pub mod pipeline;
pub mod routes;
pub mod scheduler;
pub mod store;
pub mod weather;

pub use config::Config;

// These are re-exported for routes/*.rs and the scheduler, that way
// refactoring is easier since those modules do not need to know which
// sibling module owns each type, only the crate root.
pub use features::ModelVariant;
pub use inference::AlertModel;
pub use models::PredictionResult;
pub use store::Store;
pub use weather::WeatherClient;

// ---

/// Shared application state handed to every route handler and both
/// scheduled jobs. Cloning is cheap; all heavy members are behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Store>,
    pub model: Arc<dyn AlertModel>,
    pub variant: ModelVariant,
    pub weather: Arc<WeatherClient>,
}
