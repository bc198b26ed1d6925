//! Driveguard Monitor - Main Entry Point
//!
//! Replays a scripted multi-sensor drive through the full pipeline:
//! signal sources -> detectors -> session controller -> drive store,
//! then prints the finalized record and history aggregates.

mod demo;
mod settings;

use anyhow::Context;
use detectors::{DetectorConfig, DetectorSet};
use session::{FixedLocationProvider, LogAnnouncer, SessionController};
use settings::MonitorSettings;
use signal::Location;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use storage::{aggregate, DriveStore};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

fn init_logging() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    info!("=== Driveguard Monitor v{} ===", env!("CARGO_PKG_VERSION"));

    let settings = MonitorSettings::load().context("loading settings")?;
    info!(
        session_secs = settings.session_secs,
        speed_limit_kmh = settings.speed_limit_kmh,
        loudness_threshold_db = settings.loudness_threshold_db,
        "settings loaded"
    );

    let config = DetectorConfig {
        speed_limit_kmh: settings.speed_limit_kmh,
        loudness_threshold_db: settings.loudness_threshold_db,
        ..DetectorConfig::default()
    };

    let store = Arc::new(DriveStore::new());
    let history = Path::new(&settings.history_path);
    if history.exists() {
        let loaded = store
            .load_from(history)
            .context("loading drive history")?;
        info!(drives = loaded, "drive history loaded");
    }

    let detectors = DetectorSet::new(config, demo::scripted_sources());
    let mut controller = SessionController::new(
        detectors,
        FixedLocationProvider::new(Some(Location::new(43.4723, -80.5449, 0.0))),
        LogAnnouncer,
        store.clone(),
    );

    controller.start()?;
    info!(secs = settings.session_secs, "session running");
    tokio::time::sleep(Duration::from_secs(settings.session_secs)).await;

    let id = controller
        .end()
        .await
        .context("session produced no drive")?;

    let drive = store.get(&id)?;
    info!(
        %id,
        duration_s = drive.duration().num_seconds(),
        violations = drive.violations.len(),
        "drive complete"
    );
    for violation in &drive.violations {
        info!(
            time = %violation.time,
            description = %violation.description,
            located = violation.location.is_some(),
            "  violation"
        );
    }

    store.save_to(history).context("saving drive history")?;

    let drives = store.list()?;
    let stats = aggregate(&drives);
    info!(
        drives = drives.len(),
        average_duration_ms = stats.average_duration_ms,
        "history aggregate"
    );
    for (description, count) in &stats.top_violations {
        info!(description, count, "  top violation");
    }

    Ok(())
}
