//! Detector configuration

use serde::{Deserialize, Serialize};

/// Per-modality detection constants. Set once at session start and
/// read-only thereafter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Dynamic acceleration magnitude threshold (g)
    pub accel_threshold_g: f32,

    /// Low-pass coefficient separating the gravity component from the
    /// dynamic acceleration of interest
    pub accel_alpha: f32,

    /// Acceleration debounce window (milliseconds)
    pub accel_debounce_ms: u64,

    /// Eye-open probability below which an eye counts as closed
    pub eye_open_threshold: f32,

    /// Minimum continuous eyes-closed duration to count as distracted
    /// (milliseconds)
    pub eyes_closed_min_ms: u64,

    /// Face debounce window (milliseconds)
    pub face_debounce_ms: u64,

    /// Loudness threshold (dB)
    pub loudness_threshold_db: f64,

    /// Audio debounce window (milliseconds)
    pub audio_debounce_ms: u64,

    /// Speed limit (km/h)
    pub speed_limit_kmh: f64,

    /// Speeding debounce window (milliseconds)
    pub speed_debounce_ms: u64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            accel_threshold_g: 3.0,
            accel_alpha: 0.8,
            accel_debounce_ms: 1000,
            eye_open_threshold: 0.5,
            eyes_closed_min_ms: 50,
            face_debounce_ms: 1000,
            loudness_threshold_db: 70.0,
            audio_debounce_ms: 1000,
            speed_limit_kmh: 60.0,
            speed_debounce_ms: 5000,
        }
    }
}

impl DetectorConfig {
    /// Stricter variant (lower thresholds) for sensitive fleets.
    pub fn strict() -> Self {
        Self {
            accel_threshold_g: 2.5,
            loudness_threshold_db: 65.0,
            speed_limit_kmh: 50.0,
            ..Default::default()
        }
    }
}
