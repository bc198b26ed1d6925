//! Monitor settings

use config::{Config, Environment};
use serde::Deserialize;

/// Runtime settings, overridable through `MONITOR_*` environment
/// variables (e.g. `MONITOR_SESSION_SECS=30`).
#[derive(Debug, Clone, Deserialize)]
pub struct MonitorSettings {
    /// How long the demo session runs before ending
    pub session_secs: u64,
    /// Speed limit handed to the speeding detector (km/h)
    pub speed_limit_kmh: f64,
    /// Loudness threshold handed to the noise detector (dB)
    pub loudness_threshold_db: f64,
    /// Drive-history snapshot path
    pub history_path: String,
}

impl MonitorSettings {
    pub fn load() -> Result<Self, config::ConfigError> {
        Config::builder()
            .set_default("session_secs", 12u64)?
            .set_default("speed_limit_kmh", 60.0)?
            .set_default("loudness_threshold_db", 70.0)?
            .set_default("history_path", "driveHistory.json")?
            .add_source(Environment::with_prefix("MONITOR"))
            .build()?
            .try_deserialize()
    }
}
