use axum::Router;

use crate::AppState;

mod health;
mod predict;
mod weather;

// ---

pub fn router(state: AppState) -> Router {
    // ---
    Router::new()
        .merge(health::router())
        .nest("/api", predict::router().merge(weather::router()))
        .with_state(state)
}
