//! Session controller state machine

use crate::provider::{LocationPriority, LocationProvider, SpeechAnnouncer};
use crate::SessionError;
use chrono::{DateTime, Utc};
use detectors::{DetectorSet, ViolationEvent};
use std::sync::{Arc, Mutex};
use storage::{Drive, DriveId, DriveRepository, Violation};
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Session lifecycle phase. Transitions Idle -> Active -> Ended exactly
/// once; Ended is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Active,
    Ended,
}

/// Mutable session record, shared between the consumer loop, detached
/// registration tasks, and the controller.
struct SessionState {
    id: DriveId,
    start_time: DateTime<Utc>,
    start_location: Option<signal::Location>,
    end_time: Option<DateTime<Utc>>,
    violations: Vec<Violation>,
}

impl SessionState {
    fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            start_time: Utc::now(),
            start_location: None,
            end_time: None,
            violations: Vec::new(),
        }
    }

    /// Append a violation unless the session has already ended.
    /// Registrations complete out of order (each waits on its own location
    /// fetch), so insertion is positioned by timestamp; normally this is a
    /// pure append.
    fn record(&mut self, violation: Violation) -> bool {
        if self.end_time.is_some() {
            return false;
        }
        let idx = self
            .violations
            .partition_point(|v| v.time <= violation.time);
        self.violations.insert(idx, violation);
        true
    }
}

/// Orchestrates one drive session: starts and stops the detector set,
/// consumes the merged violation stream, and finalizes the drive record.
pub struct SessionController<L, A, R> {
    phase: SessionPhase,
    detectors: DetectorSet,
    location: Arc<L>,
    announcer: Arc<A>,
    repository: R,
    state: Arc<Mutex<SessionState>>,
    consumer: Option<JoinHandle<()>>,
    start_location_task: Option<JoinHandle<()>>,
}

impl<L, A, R> SessionController<L, A, R>
where
    L: LocationProvider,
    A: SpeechAnnouncer,
    R: DriveRepository,
{
    pub fn new(detectors: DetectorSet, location: L, announcer: A, repository: R) -> Self {
        Self {
            phase: SessionPhase::Idle,
            detectors,
            location: Arc::new(location),
            announcer: Arc::new(announcer),
            repository,
            state: Arc::new(Mutex::new(SessionState::new())),
            consumer: None,
            start_location_task: None,
        }
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Id of the in-progress (or finalized) drive.
    pub fn drive_id(&self) -> DriveId {
        self.state.lock().map(|s| s.id).unwrap_or_default()
    }

    /// Snapshot of the violations recorded so far.
    pub fn violations(&self) -> Vec<Violation> {
        self.state
            .lock()
            .map(|s| s.violations.clone())
            .unwrap_or_default()
    }

    /// Idle -> Active: capture the start time, resolve the start location
    /// in the background (absent on failure, non-fatal), start every
    /// detector, and begin consuming the merged event stream.
    pub fn start(&mut self) -> Result<(), SessionError> {
        if self.phase != SessionPhase::Idle {
            return Err(SessionError::AlreadyStarted);
        }

        let events = self.detectors.start()?;

        let start_time = Utc::now();
        if let Ok(mut state) = self.state.lock() {
            state.start_time = start_time;
        }

        {
            let state = self.state.clone();
            let location = self.location.clone();
            self.start_location_task = Some(tokio::spawn(async move {
                let fix = location
                    .current_location(LocationPriority::HighAccuracy)
                    .await;
                if fix.is_none() {
                    warn!("start location unavailable");
                }
                if let Ok(mut state) = state.lock() {
                    if state.end_time.is_none() {
                        state.start_location = fix;
                    }
                }
            }));
        }

        self.consumer = Some(tokio::spawn(consume(
            events,
            self.state.clone(),
            self.location.clone(),
            self.announcer.clone(),
        )));

        self.phase = SessionPhase::Active;
        info!(id = %self.drive_id(), "drive session started");
        Ok(())
    }

    /// Active -> Ended: stop every detector (awaiting resource release),
    /// drain in-flight registrations, resolve the best-effort end
    /// location, and hand the finalized drive to the repository.
    /// Idempotent: any call after the first is a no-op returning `None`.
    pub async fn end(&mut self) -> Option<DriveId> {
        if self.phase != SessionPhase::Active {
            return None;
        }

        let end_time = Utc::now();
        if let Ok(mut state) = self.state.lock() {
            state.end_time = Some(end_time);
        }

        self.shutdown_pipeline().await;
        self.phase = SessionPhase::Ended;

        let end_location = self
            .location
            .current_location(LocationPriority::HighAccuracy)
            .await;

        let drive = {
            let state = match self.state.lock() {
                Ok(state) => state,
                Err(e) => {
                    warn!(error = %e, "session state unavailable, drive lost");
                    return None;
                }
            };
            Drive {
                id: state.id,
                start_time: state.start_time,
                end_time,
                start_location: state.start_location,
                end_location,
                violations: state.violations.clone(),
            }
        };

        let id = drive.id;
        info!(%id, violations = drive.violations.len(), "drive finalized");
        self.repository.add(drive);
        Some(id)
    }

    /// Cancel-and-discard: stop every detector but persist nothing. A
    /// no-op unless the session is active.
    pub async fn discard(&mut self) {
        if self.phase != SessionPhase::Active {
            return;
        }
        if let Ok(mut state) = self.state.lock() {
            state.end_time = Some(Utc::now());
        }
        self.shutdown_pipeline().await;
        self.phase = SessionPhase::Ended;
        info!(id = %self.drive_id(), "drive discarded");
    }

    /// Inject a synthetic violation through the normal registration path.
    pub fn simulate_violation(&self) {
        if self.phase != SessionPhase::Active {
            return;
        }
        let count = self
            .state
            .lock()
            .map(|s| s.violations.len())
            .unwrap_or_default();
        let description = match count % 3 {
            0 => "Speeding!",
            1 => "Red light!",
            _ => "Stop Sign!",
        };
        let time = Utc::now();
        tokio::spawn(register(
            description.to_string(),
            time,
            self.state.clone(),
            self.location.clone(),
            self.announcer.clone(),
        ));
    }

    async fn shutdown_pipeline(&mut self) {
        self.detectors.stop().await;
        if let Some(task) = self.start_location_task.take() {
            task.abort();
        }
        if let Some(consumer) = self.consumer.take() {
            let _ = consumer.await;
        }
    }
}

/// Single consumer over the merged event stream. Timestamps are assigned
/// here, serially, so they are monotonically non-decreasing; the rest of
/// each registration runs detached so a slow announcement or location
/// fetch never backpressures detection.
async fn consume<L: LocationProvider, A: SpeechAnnouncer>(
    mut events: mpsc::Receiver<ViolationEvent>,
    state: Arc<Mutex<SessionState>>,
    location: Arc<L>,
    announcer: Arc<A>,
) {
    let mut registrations = JoinSet::new();
    while let Some(event) = events.recv().await {
        let time = Utc::now();
        info!(modality = %event.modality, description = %event.description, "violation event");
        registrations.spawn(register(
            event.description,
            time,
            state.clone(),
            location.clone(),
            announcer.clone(),
        ));
        // reap whatever has already finished
        while registrations.try_join_next().is_some() {}
    }
    // event stream closed: drain in-flight registrations before the
    // session finalizes
    while registrations.join_next().await.is_some() {}
    debug!("event consumer stopped");
}

/// Announce, geotag, and append one violation. Dropped if the session
/// ended while the location fetch was in flight.
async fn register<L: LocationProvider, A: SpeechAnnouncer>(
    description: String,
    time: DateTime<Utc>,
    state: Arc<Mutex<SessionState>>,
    location: Arc<L>,
    announcer: Arc<A>,
) {
    announcer.speak(&description);
    let fix = location
        .current_location(LocationPriority::HighAccuracy)
        .await;
    let violation = Violation {
        time,
        location: fix,
        description,
    };
    let Ok(mut state) = state.lock() else {
        return;
    };
    if !state.record(violation) {
        debug!("session already ended, dropping violation");
    }
}
