//! Detector set: per-source producer tasks and the merged event stream

use crate::pipeline::{Debouncer, EdgeDetector};
use crate::policy::{self, ViolationPolicy};
use crate::{DetectorConfig, DetectorError, ViolationEvent};
use signal::{SampleStream, SignalSource};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};

/// Capacity of the merged violation-event channel.
pub const EVENT_CHANNEL_CAPACITY: usize = 16;

/// Owns the lifecycle of every signal source and its pipeline task, and
/// exposes one merged event stream interleaving all modalities in
/// emission order (first ready, first emitted).
pub struct DetectorSet {
    config: DetectorConfig,
    sources: Vec<Box<dyn SignalSource>>,
    tasks: JoinSet<()>,
    started: bool,
}

impl DetectorSet {
    pub fn new(config: DetectorConfig, sources: Vec<Box<dyn SignalSource>>) -> Self {
        Self {
            config,
            sources,
            tasks: JoinSet::new(),
            started: false,
        }
    }

    /// Start every source and spawn one pipeline task per source that
    /// started. A source that fails to start is logged once and stays
    /// silent for the session; the rest proceed. Startable at most once
    /// per session.
    pub fn start(&mut self) -> Result<mpsc::Receiver<ViolationEvent>, DetectorError> {
        if self.started {
            return Err(DetectorError::AlreadyStarted);
        }
        self.started = true;

        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        for source in &mut self.sources {
            let modality = source.modality();
            match source.start() {
                Ok(stream) => {
                    let policy = policy::build(&self.config, modality);
                    info!(%modality, "detector started");
                    self.tasks.spawn(run_pipeline(policy, stream, tx.clone()));
                }
                Err(e) => {
                    warn!(%modality, error = %e, "source failed to start, modality silent for this session");
                }
            }
        }
        // the receiver closes once every pipeline task has exited
        Ok(rx)
    }

    /// Cancel every pipeline task, await them, and release every source's
    /// underlying resource, including sources that never started.
    pub async fn stop(&mut self) {
        self.tasks.abort_all();
        while self.tasks.join_next().await.is_some() {}
        for source in &mut self.sources {
            source.stop();
        }
        info!("detector set stopped");
    }

    /// Number of pipeline tasks currently running.
    pub fn active_detectors(&self) -> usize {
        self.tasks.len()
    }
}

/// Drive one modality's samples through threshold -> edge -> debounce,
/// racing the sample stream against the pending debounce deadline.
async fn run_pipeline(
    mut policy: Box<dyn ViolationPolicy>,
    mut samples: SampleStream,
    events: mpsc::Sender<ViolationEvent>,
) {
    let modality = policy.modality();
    let mut edges = EdgeDetector::default();
    let mut debounce = Debouncer::new(policy.debounce());
    let mut suppress_startup = policy.suppress_first();

    loop {
        let deadline = debounce.deadline();
        tokio::select! {
            sample = samples.recv() => {
                match sample {
                    Some(sample) => {
                        let now = Instant::now();
                        let Some(active) = policy.observe(now, &sample) else {
                            continue;
                        };
                        if edges.feed(active) {
                            debounce.arm(now);
                        }
                    }
                    None => {
                        // source terminated; let a pending window run out
                        if let Some(deadline) = debounce.deadline() {
                            sleep_until(deadline).await;
                            if debounce.expire(Instant::now()) {
                                emit(policy.as_ref(), &mut suppress_startup, &events).await;
                            }
                        }
                        break;
                    }
                }
            }
            _ = sleep_until(deadline.unwrap_or_else(far_future)), if deadline.is_some() => {
                if debounce.expire(Instant::now())
                    && !emit(policy.as_ref(), &mut suppress_startup, &events).await
                {
                    break;
                }
            }
        }
    }
    debug!(%modality, "detector pipeline stopped");
}

/// Deliver one confirmed emission, honoring startup suppression. Returns
/// false once the consumer is gone.
async fn emit(
    policy: &dyn ViolationPolicy,
    suppress_startup: &mut bool,
    events: &mpsc::Sender<ViolationEvent>,
) -> bool {
    if *suppress_startup {
        *suppress_startup = false;
        debug!(modality = %policy.modality(), "discarding startup edge");
        return true;
    }
    let event = ViolationEvent {
        modality: policy.modality(),
        description: policy.description().to_string(),
    };
    debug!(modality = %event.modality, description = %event.description, "violation detected");
    events.send(event).await.is_ok()
}

fn far_future() -> Instant {
    Instant::now() + Duration::from_secs(86_400 * 365)
}

#[cfg(test)]
mod tests {
    use super::*;
    use signal::{DeniedSource, Location, Modality, RawSample, ScriptedSource, SilentSource};

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    /// Collect all events (with arrival offsets from `origin`) until the
    /// merged stream closes.
    async fn collect(
        mut rx: mpsc::Receiver<ViolationEvent>,
        origin: Instant,
    ) -> Vec<(Duration, ViolationEvent)> {
        let mut out = Vec::new();
        while let Some(event) = rx.recv().await {
            out.push((origin.elapsed(), event));
        }
        out
    }

    fn rest_accel() -> RawSample {
        RawSample::Acceleration {
            x: 0.0,
            y: 0.0,
            z: 9.81,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_acceleration_spike_emits_exactly_once() {
        // at rest 0..3s, a violent 1.2s maneuver, then at rest again;
        // raw alternates sign during the spike so the smoothed dynamic
        // magnitude stays above threshold for the whole 1.2s
        let mut script = Vec::new();
        for i in 0..30 {
            script.push((ms(i * 100), rest_accel()));
        }
        for i in 0..12 {
            let x = if i % 2 == 0 { 30.0 } else { -30.0 };
            script.push((ms(3000 + i * 100), RawSample::Acceleration { x, y: 0.0, z: 9.81 }));
        }
        for i in 0..8 {
            script.push((ms(4200 + i * 100), rest_accel()));
        }

        let source = ScriptedSource::new(Modality::Acceleration, script);
        let mut set = DetectorSet::new(DetectorConfig::default(), vec![Box::new(source)]);
        let origin = Instant::now();
        let rx = set.start().unwrap();
        let events = collect(rx, origin).await;

        // the startup edge's emission is discarded; the real edge at 3.0s
        // is confirmed one debounce window later
        assert_eq!(events.len(), 1);
        let (at, event) = &events[0];
        assert_eq!(event.description, "Reckless maneuvering!");
        assert!(*at >= ms(3990) && *at <= ms(4010), "emitted at {:?}", at);
        set.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_acceleration_startup_edge_is_discarded() {
        // at rest only: the smoother's zero initial state produces one
        // spurious edge, which must never surface
        let script: Vec<_> = (0..40).map(|i| (ms(i * 100), rest_accel())).collect();
        let source = ScriptedSource::new(Modality::Acceleration, script);
        let mut set = DetectorSet::new(DetectorConfig::default(), vec![Box::new(source)]);
        let origin = Instant::now();
        let rx = set.start().unwrap();
        let events = collect(rx, origin).await;
        assert!(events.is_empty());
        set.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_noise_oscillation_absorbed_into_single_event() {
        // 72 dB / 68 dB alternating every 200ms for 3s: every rising edge
        // restarts the debounce window, so nothing fires. Sustained 72 dB
        // afterwards lets the last window run out.
        let loud = || RawSample::AudioFrame { pcm: vec![3981; 256] };
        let quiet = || RawSample::AudioFrame { pcm: vec![2512; 256] };

        let mut script = Vec::new();
        for k in 0..15 {
            let frame = if k % 2 == 0 { loud() } else { quiet() };
            script.push((ms(k * 200), frame));
        }
        for k in 0..8 {
            script.push((ms(3000 + k * 200), loud()));
        }

        let source = ScriptedSource::new(Modality::Audio, script);
        let mut set = DetectorSet::new(DetectorConfig::default(), vec![Box::new(source)]);
        let origin = Instant::now();
        let rx = set.start().unwrap();
        let events = collect(rx, origin).await;

        // last rising edge is at 2.8s; confirmed at 3.8s
        assert_eq!(events.len(), 1);
        let (at, event) = &events[0];
        assert_eq!(event.description, "Excessive Noise!");
        assert!(*at >= ms(3790) && *at <= ms(3810), "emitted at {:?}", at);
        set.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_eyes_closed_past_hold_emits_once() {
        let open = || RawSample::FaceState {
            left_eye_open: Some(0.9),
            right_eye_open: Some(0.9),
        };
        let closed = || RawSample::FaceState {
            left_eye_open: Some(0.1),
            right_eye_open: Some(0.9),
        };

        let mut script = Vec::new();
        for i in 0..10 {
            script.push((ms(i * 20), open()));
        }
        // eyes closed 200..400ms, well past the 50ms hold
        for i in 0..10 {
            script.push((ms(200 + i * 20), closed()));
        }
        for i in 0..10 {
            script.push((ms(400 + i * 20), open()));
        }

        let source = ScriptedSource::new(Modality::Face, script);
        let mut set = DetectorSet::new(DetectorConfig::default(), vec![Box::new(source)]);
        let origin = Instant::now();
        let rx = set.start().unwrap();
        let events = collect(rx, origin).await;

        // hold satisfied at 260ms (first closed sample 60ms earlier),
        // confirmed one second later
        assert_eq!(events.len(), 1);
        let (at, event) = &events[0];
        assert_eq!(event.description, "Distracted driving!");
        assert!(*at >= ms(1250) && *at <= ms(1270), "emitted at {:?}", at);
        set.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_blink_below_hold_emits_nothing() {
        let open = || RawSample::FaceState {
            left_eye_open: Some(0.9),
            right_eye_open: Some(0.9),
        };
        let closed = || RawSample::FaceState {
            left_eye_open: Some(0.1),
            right_eye_open: Some(0.1),
        };
        // a 40ms blink never satisfies the 50ms hold
        let script = vec![
            (ms(0), open()),
            (ms(20), closed()),
            (ms(40), closed()),
            (ms(60), open()),
            (ms(80), open()),
        ];
        let source = ScriptedSource::new(Modality::Face, script);
        let mut set = DetectorSet::new(DetectorConfig::default(), vec![Box::new(source)]);
        let origin = Instant::now();
        let rx = set.start().unwrap();
        let events = collect(rx, origin).await;
        assert!(events.is_empty());
        set.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_speeding_excursion_confirmed_after_long_window() {
        let fix = |mps: f32| RawSample::LocationFix(Location::new(43.47, -80.54, mps));
        // ~1Hz fixes: 50 km/h, then 70 km/h for 2s, then back down
        let script = vec![
            (ms(0), fix(13.9)),
            (ms(1000), fix(19.5)),
            (ms(2000), fix(19.5)),
            (ms(3000), fix(13.9)),
            (ms(4000), fix(13.9)),
        ];
        let source = ScriptedSource::new(Modality::Speed, script);
        let mut set = DetectorSet::new(DetectorConfig::default(), vec![Box::new(source)]);
        let origin = Instant::now();
        let rx = set.start().unwrap();
        let events = collect(rx, origin).await;

        // edge at 1s, 5s debounce
        assert_eq!(events.len(), 1);
        let (at, event) = &events[0];
        assert_eq!(event.description, "Speeding!");
        assert!(*at >= ms(5990) && *at <= ms(6010), "emitted at {:?}", at);
        set.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_sources_neither_block_nor_emit() {
        let sources: Vec<Box<dyn SignalSource>> = vec![
            Box::new(SilentSource::new(Modality::Acceleration)),
            Box::new(SilentSource::new(Modality::Face)),
            Box::new(SilentSource::new(Modality::Audio)),
            Box::new(SilentSource::new(Modality::Speed)),
        ];
        let mut set = DetectorSet::new(DetectorConfig::default(), sources);
        let origin = Instant::now();
        let rx = set.start().unwrap();
        let events = collect(rx, origin).await;
        assert!(events.is_empty());
        set.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_denied_source_degrades_without_silencing_others() {
        let fix = |mps: f32| RawSample::LocationFix(Location::new(0.0, 0.0, mps));
        let script = vec![(ms(0), fix(13.9)), (ms(1000), fix(25.0))];
        let sources: Vec<Box<dyn SignalSource>> = vec![
            Box::new(DeniedSource::new(Modality::Face)),
            Box::new(ScriptedSource::new(Modality::Speed, script)),
        ];
        let mut set = DetectorSet::new(DetectorConfig::default(), sources);
        let origin = Instant::now();
        let rx = set.start().unwrap();
        let events = collect(rx, origin).await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].1.description, "Speeding!");
        set.stop().await;
    }

    #[tokio::test]
    async fn test_start_is_once_per_session() {
        let mut set = DetectorSet::new(DetectorConfig::default(), vec![]);
        let _rx = set.start().unwrap();
        assert!(matches!(set.start(), Err(DetectorError::AlreadyStarted)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_cancels_live_producers() {
        // a source that would run for a minute; stop() must end it now
        let script = vec![(Duration::from_secs(60), rest_accel())];
        let source = ScriptedSource::new(Modality::Acceleration, script);
        let mut set = DetectorSet::new(DetectorConfig::default(), vec![Box::new(source)]);
        let rx = set.start().unwrap();
        assert_eq!(set.active_detectors(), 1);
        set.stop().await;
        assert_eq!(set.active_detectors(), 0);
        drop(rx);
    }
}
