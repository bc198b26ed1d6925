//! Modality policies
//!
//! Each policy owns the modality-specific front of the pipeline: optional
//! smoothing, reduction to a scalar, and thresholding into the boolean
//! "dangerous condition currently true" state. The generic back half
//! (edge detection, debounce, startup suppression) lives in the runner.

use crate::config::DetectorConfig;
use crate::pipeline::{DurationGate, ExpSmoother};
use signal::{Modality, RawSample};
use std::time::Duration;
use tokio::time::Instant;

/// Per-modality reduce+threshold step feeding the generic edge-debounce
/// primitive.
pub trait ViolationPolicy: Send + Sync {
    /// Modality this policy evaluates.
    fn modality(&self) -> Modality;

    /// Violation description announced and persisted on emission.
    fn description(&self) -> &'static str;

    /// Debounce window for confirmed emissions.
    fn debounce(&self) -> Duration;

    /// Whether the first debounced emission after activation is a startup
    /// artifact to discard.
    fn suppress_first(&self) -> bool {
        false
    }

    /// Fold one sample into the policy state. Returns the current active
    /// state, or `None` if the sample does not belong to this modality.
    fn observe(&mut self, now: Instant, sample: &RawSample) -> Option<bool>;
}

/// Build the policy for a modality from the session configuration.
pub fn build(config: &DetectorConfig, modality: Modality) -> Box<dyn ViolationPolicy> {
    match modality {
        Modality::Acceleration => Box::new(AccelerationPolicy::new(config)),
        Modality::Face => Box::new(DistractionPolicy::new(config)),
        Modality::Audio => Box::new(NoisePolicy::new(config)),
        Modality::Speed => Box::new(SpeedingPolicy::new(config)),
    }
}

/// Reckless-maneuver detection over the accelerometer: gravity-removed
/// squared magnitude against a squared threshold.
pub struct AccelerationPolicy {
    threshold_sq: f32,
    smoother: ExpSmoother,
    debounce: Duration,
}

impl AccelerationPolicy {
    pub fn new(config: &DetectorConfig) -> Self {
        Self {
            threshold_sq: config.accel_threshold_g * config.accel_threshold_g,
            smoother: ExpSmoother::new(config.accel_alpha),
            debounce: Duration::from_millis(config.accel_debounce_ms),
        }
    }
}

impl ViolationPolicy for AccelerationPolicy {
    fn modality(&self) -> Modality {
        Modality::Acceleration
    }

    fn description(&self) -> &'static str {
        "Reckless maneuvering!"
    }

    fn debounce(&self) -> Duration {
        self.debounce
    }

    /// The smoother's zero initial state always produces one spurious
    /// leading edge right after activation.
    fn suppress_first(&self) -> bool {
        true
    }

    fn observe(&mut self, _now: Instant, sample: &RawSample) -> Option<bool> {
        let RawSample::Acceleration { x, y, z } = *sample else {
            return None;
        };
        let d = self.smoother.feed([x, y, z]);
        let magnitude_sq = d[0] * d[0] + d[1] * d[1] + d[2] * d[2];
        Some(magnitude_sq > self.threshold_sq)
    }
}

/// Distracted-driving detection over face samples: either eye below the
/// open-probability threshold, held continuously past the minimum
/// duration.
pub struct DistractionPolicy {
    eye_threshold: f32,
    gate: DurationGate,
    debounce: Duration,
}

impl DistractionPolicy {
    pub fn new(config: &DetectorConfig) -> Self {
        Self {
            eye_threshold: config.eye_open_threshold,
            gate: DurationGate::new(Duration::from_millis(config.eyes_closed_min_ms)),
            debounce: Duration::from_millis(config.face_debounce_ms),
        }
    }
}

impl ViolationPolicy for DistractionPolicy {
    fn modality(&self) -> Modality {
        Modality::Face
    }

    fn description(&self) -> &'static str {
        "Distracted driving!"
    }

    fn debounce(&self) -> Duration {
        self.debounce
    }

    fn observe(&mut self, now: Instant, sample: &RawSample) -> Option<bool> {
        let RawSample::FaceState {
            left_eye_open,
            right_eye_open,
        } = *sample
        else {
            return None;
        };
        // an unscored eye counts as closed
        let closed = left_eye_open.unwrap_or(0.0) < self.eye_threshold
            || right_eye_open.unwrap_or(0.0) < self.eye_threshold;
        Some(self.gate.feed(now, closed))
    }
}

/// Excessive-noise detection over microphone buffers: RMS loudness in dB
/// against a fixed threshold.
pub struct NoisePolicy {
    threshold_db: f64,
    debounce: Duration,
}

impl NoisePolicy {
    pub fn new(config: &DetectorConfig) -> Self {
        Self {
            threshold_db: config.loudness_threshold_db,
            debounce: Duration::from_millis(config.audio_debounce_ms),
        }
    }
}

impl ViolationPolicy for NoisePolicy {
    fn modality(&self) -> Modality {
        Modality::Audio
    }

    fn description(&self) -> &'static str {
        "Excessive Noise!"
    }

    fn debounce(&self) -> Duration {
        self.debounce
    }

    fn observe(&mut self, _now: Instant, sample: &RawSample) -> Option<bool> {
        let RawSample::AudioFrame { pcm } = sample else {
            return None;
        };
        Some(loudness_db(pcm) > self.threshold_db)
    }
}

/// Speeding detection over GPS fixes: ground speed in km/h against the
/// configured limit.
pub struct SpeedingPolicy {
    limit_kmh: f64,
    debounce: Duration,
}

impl SpeedingPolicy {
    pub fn new(config: &DetectorConfig) -> Self {
        Self {
            limit_kmh: config.speed_limit_kmh,
            debounce: Duration::from_millis(config.speed_debounce_ms),
        }
    }
}

impl ViolationPolicy for SpeedingPolicy {
    fn modality(&self) -> Modality {
        Modality::Speed
    }

    fn description(&self) -> &'static str {
        "Speeding!"
    }

    fn debounce(&self) -> Duration {
        self.debounce
    }

    fn observe(&mut self, _now: Instant, sample: &RawSample) -> Option<bool> {
        let RawSample::LocationFix(fix) = sample else {
            return None;
        };
        Some(fix.speed_kmh() > self.limit_kmh)
    }
}

/// RMS loudness of a PCM buffer in dB. An empty or silent buffer yields
/// negative infinity, which never crosses a finite threshold.
pub fn loudness_db(pcm: &[i16]) -> f64 {
    if pcm.is_empty() {
        return f64::NEG_INFINITY;
    }
    let sum: f64 = pcm.iter().map(|&s| s as f64 * s as f64).sum();
    let rms = (sum / pcm.len() as f64).sqrt();
    20.0 * rms.log10()
}

#[cfg(test)]
mod tests {
    use super::*;
    use signal::Location;

    #[test]
    fn test_loudness_of_constant_amplitude() {
        // rms of a constant-amplitude buffer is the amplitude itself:
        // 20*log10(1000) = 60 dB
        let db = loudness_db(&[1000; 512]);
        assert!((db - 60.0).abs() < 1e-6);
    }

    #[test]
    fn test_loudness_degenerate_buffers() {
        assert_eq!(loudness_db(&[]), f64::NEG_INFINITY);
        assert_eq!(loudness_db(&[0; 64]), f64::NEG_INFINITY);
    }

    #[test]
    fn test_noise_policy_thresholds_loudness() {
        let mut policy = NoisePolicy::new(&DetectorConfig::default());
        let now = Instant::now();
        // ~72 dB
        let loud = RawSample::AudioFrame { pcm: vec![3981; 256] };
        // ~60 dB
        let quiet = RawSample::AudioFrame { pcm: vec![1000; 256] };
        assert_eq!(policy.observe(now, &loud), Some(true));
        assert_eq!(policy.observe(now, &quiet), Some(false));
    }

    #[test]
    fn test_speeding_policy_converts_to_kmh() {
        let mut policy = SpeedingPolicy::new(&DetectorConfig::default());
        let now = Instant::now();
        // 16 m/s = 57.6 km/h, under the 60 km/h limit
        let under = RawSample::LocationFix(Location::new(0.0, 0.0, 16.0));
        // 17 m/s = 61.2 km/h
        let over = RawSample::LocationFix(Location::new(0.0, 0.0, 17.0));
        assert_eq!(policy.observe(now, &under), Some(false));
        assert_eq!(policy.observe(now, &over), Some(true));
    }

    #[test]
    fn test_distraction_policy_unscored_eye_counts_as_closed() {
        let config = DetectorConfig {
            eyes_closed_min_ms: 0,
            ..Default::default()
        };
        let mut policy = DistractionPolicy::new(&config);
        let now = Instant::now();
        let unscored = RawSample::FaceState {
            left_eye_open: None,
            right_eye_open: Some(0.9),
        };
        assert_eq!(policy.observe(now, &unscored), Some(true));
        let open = RawSample::FaceState {
            left_eye_open: Some(0.9),
            right_eye_open: Some(0.9),
        };
        assert_eq!(policy.observe(now, &open), Some(false));
    }

    #[test]
    fn test_distraction_policy_requires_hold() {
        let mut policy = DistractionPolicy::new(&DetectorConfig::default());
        let start = Instant::now();
        let closed = RawSample::FaceState {
            left_eye_open: Some(0.1),
            right_eye_open: Some(0.8),
        };
        assert_eq!(policy.observe(start, &closed), Some(false));
        assert_eq!(
            policy.observe(start + Duration::from_millis(30), &closed),
            Some(false)
        );
        assert_eq!(
            policy.observe(start + Duration::from_millis(60), &closed),
            Some(true)
        );
    }

    #[test]
    fn test_policies_are_shareable_across_threads() {
        // pipeline tasks borrow the policy across await points, so the
        // trait object must be both Send and Sync
        fn assert_send_sync<T: Send + Sync + ?Sized>() {}
        assert_send_sync::<dyn ViolationPolicy>();
    }

    #[test]
    fn test_acceleration_policy_ignores_foreign_samples() {
        let mut policy = AccelerationPolicy::new(&DetectorConfig::default());
        let now = Instant::now();
        let foreign = RawSample::AudioFrame { pcm: vec![0; 8] };
        assert_eq!(policy.observe(now, &foreign), None);
    }

    #[test]
    fn test_acceleration_policy_spurious_initial_state() {
        // first sample at rest still reads as active because the gravity
        // estimate starts at zero; that is what startup suppression guards
        let mut policy = AccelerationPolicy::new(&DetectorConfig::default());
        let now = Instant::now();
        let rest = RawSample::Acceleration {
            x: 0.0,
            y: 0.0,
            z: 9.81,
        };
        assert_eq!(policy.observe(now, &rest), Some(true));
        assert!(policy.suppress_first());
        // converges to inactive at rest
        let mut last = true;
        for _ in 0..20 {
            last = policy.observe(now, &rest).unwrap();
        }
        assert!(!last);
    }
}
