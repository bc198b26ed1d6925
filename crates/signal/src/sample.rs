//! Raw sample types

use serde::{Deserialize, Serialize};

/// Geographic fix. Also the location payload attached to persisted
/// violations and drives.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    /// Ground speed in meters per second
    pub speed_mps: f32,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64, speed_mps: f32) -> Self {
        Self {
            latitude,
            longitude,
            speed_mps,
        }
    }

    /// Ground speed in km/h.
    pub fn speed_kmh(&self) -> f64 {
        self.speed_mps as f64 * 3.6
    }
}

/// Sensor modality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Modality {
    /// Linear acceleration (IMU / device accelerometer)
    Acceleration,
    /// Facial landmark / eye-state analysis from the cabin camera
    Face,
    /// Microphone amplitude
    Audio,
    /// GPS ground speed
    Speed,
}

impl Modality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Modality::Acceleration => "acceleration",
            Modality::Face => "face",
            Modality::Audio => "audio",
            Modality::Speed => "speed",
        }
    }
}

impl std::fmt::Display for Modality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One raw sensor sample. Ephemeral: produced by a source, consumed by the
/// detection pipeline, never persisted.
#[derive(Debug, Clone, PartialEq)]
pub enum RawSample {
    /// Accelerometer vector, sensor units per axis
    Acceleration { x: f32, y: f32, z: f32 },
    /// Eye-open probabilities for the detected face. A missing probability
    /// means the classifier could not score that eye and is treated as
    /// closed; frames with no detected face are skipped at the source.
    FaceState {
        left_eye_open: Option<f32>,
        right_eye_open: Option<f32>,
    },
    /// One microphone buffer of 16-bit PCM samples
    AudioFrame { pcm: Vec<i16> },
    /// GPS fix carrying the current ground speed
    LocationFix(Location),
}

impl RawSample {
    /// Modality this sample belongs to.
    pub fn modality(&self) -> Modality {
        match self {
            RawSample::Acceleration { .. } => Modality::Acceleration,
            RawSample::FaceState { .. } => Modality::Face,
            RawSample::AudioFrame { .. } => Modality::Audio,
            RawSample::LocationFix(_) => Modality::Speed,
        }
    }
}
