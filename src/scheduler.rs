//! Recurring background jobs.
//!
//! Two independent fixed-interval jobs share the runtime: the prediction
//! pipeline (store-read mode, no payload) and the weather upload. Each job
//! awaits its own run inline, so a new fire cannot stack on a still-running
//! instance, and `MissedTickBehavior::Delay` makes a late fire run once
//! instead of being dropped. The prediction job calls the pipeline function
//! directly — no HTTP hop.

use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::{error, info};

use crate::{pipeline, weather, AppState};

// ---

/// Spawn both recurring jobs onto the runtime. Jobs run for the life of the
/// process; results pass only into the log.
pub fn spawn_jobs(state: &AppState, predict_period: Duration, weather_period: Duration) {
    // ---
    tokio::spawn(run_predict_job(state.clone(), predict_period));
    tokio::spawn(run_weather_job(state.clone(), weather_period));
}

async fn run_predict_job(state: AppState, period: Duration) {
    // ---
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    // The first tick completes immediately; consume it so the first run
    // happens one full period after startup.
    ticker.tick().await;

    info!("Scheduled job 'predict_job' every {}s", period.as_secs());

    loop {
        ticker.tick().await;
        info!("[job] Running scheduled predict");

        match pipeline::run(&state.store, &state.model, state.variant, None).await {
            Ok(result) => info!(
                "[job] Scheduled predict: pump_on={} alert_level={}",
                result.pump_on, result.alert_level
            ),
            Err(e) => error!("[job] Scheduled predict failed: {:#}", e),
        }
    }
}

async fn run_weather_job(state: AppState, period: Duration) {
    // ---
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker.tick().await;

    info!("Scheduled job 'weather_upload_job' every {}s", period.as_secs());

    loop {
        ticker.tick().await;
        info!("[job] Running scheduled weather upload");

        if let Err(e) = weather::upload_weather(&state.store, &state.weather).await {
            error!("[job] Scheduled weather upload failed: {:#}", e);
        }
    }
}
