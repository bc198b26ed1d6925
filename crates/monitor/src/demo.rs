//! Scripted demo drive
//!
//! A ~12 second drive that trips each detector once: a violent swerve at
//! 3s, a long eyes-closed stretch at 6s, a sustained loud burst at 8s,
//! and a speeding excursion from 2s to 4s.

use signal::{Location, Modality, RawSample, ScriptedSource, SignalSource};
use std::time::Duration;

// Constant-amplitude PCM frames; rms of a constant frame is the
// amplitude itself, so 3981 sits at ~72 dB and 100 at 40 dB.
const LOUD_AMPLITUDE: i16 = 3981;
const QUIET_AMPLITUDE: i16 = 100;

fn ms(v: u64) -> Duration {
    Duration::from_millis(v)
}

fn accel_script() -> Vec<(Duration, RawSample)> {
    let rest = |t| (ms(t), RawSample::Acceleration { x: 0.0, y: 0.0, z: 9.81 });
    let mut script: Vec<_> = (0..30).map(|i| rest(i * 100)).collect();
    // violent swerve: alternating lateral jerks for a second
    for i in 0..10 {
        let x = if i % 2 == 0 { 30.0 } else { -30.0 };
        script.push((ms(3000 + i * 100), RawSample::Acceleration { x, y: 0.0, z: 9.81 }));
    }
    script.extend((40..120).map(|i| rest(i * 100)));
    script
}

fn face_script() -> Vec<(Duration, RawSample)> {
    let eyes = |t, p| {
        (
            ms(t),
            RawSample::FaceState {
                left_eye_open: Some(p),
                right_eye_open: Some(p),
            },
        )
    };
    let mut script: Vec<_> = (0..60).map(|i| eyes(i * 100, 0.9)).collect();
    // eyes closed for 300ms
    script.extend((0..4).map(|i| eyes(6000 + i * 100, 0.1)));
    script.extend((64..120).map(|i| eyes(i * 100, 0.9)));
    script
}

fn audio_script() -> Vec<(Duration, RawSample)> {
    let frame = |t, amplitude| {
        (
            ms(t),
            RawSample::AudioFrame {
                pcm: vec![amplitude; 256],
            },
        )
    };
    let mut script: Vec<_> = (0..40).map(|i| frame(i * 200, QUIET_AMPLITUDE)).collect();
    // sustained loud burst
    script.extend((0..4).map(|i| frame(8000 + i * 200, LOUD_AMPLITUDE)));
    script.extend((44..60).map(|i| frame(i * 200, QUIET_AMPLITUDE)));
    script
}

fn speed_script() -> Vec<(Duration, RawSample)> {
    let fix = |t, mps| (ms(t), RawSample::LocationFix(Location::new(43.4723, -80.5449, mps)));
    (0..12)
        .map(|i| {
            // 70 km/h between 2s and 4s, 50 km/h otherwise
            let mps = if (2..=4).contains(&i) { 19.5 } else { 13.9 };
            fix(i * 1000, mps)
        })
        .collect()
}

/// One scripted source per modality.
pub fn scripted_sources() -> Vec<Box<dyn SignalSource>> {
    vec![
        Box::new(ScriptedSource::new(Modality::Acceleration, accel_script())),
        Box::new(ScriptedSource::new(Modality::Face, face_script())),
        Box::new(ScriptedSource::new(Modality::Audio, audio_script())),
        Box::new(ScriptedSource::new(Modality::Speed, speed_script())),
    ]
}
