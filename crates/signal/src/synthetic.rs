//! Synthetic sources for tests and demos

use crate::sample::{Modality, RawSample};
use crate::source::{SampleStream, SignalSource, SourceError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

/// Replays a fixed script of `(offset, sample)` pairs on the tokio clock,
/// each sample delivered at its offset from `start`.
pub struct ScriptedSource {
    modality: Modality,
    script: Vec<(Duration, RawSample)>,
    task: Option<JoinHandle<()>>,
}

impl ScriptedSource {
    pub fn new(modality: Modality, script: Vec<(Duration, RawSample)>) -> Self {
        Self {
            modality,
            script,
            task: None,
        }
    }
}

impl SignalSource for ScriptedSource {
    fn modality(&self) -> Modality {
        self.modality
    }

    fn start(&mut self) -> Result<SampleStream, SourceError> {
        let (tx, rx) = sample_buffer::channel(sample_buffer::DEFAULT_CAPACITY);
        let script = std::mem::take(&mut self.script);
        let modality = self.modality;
        self.task = Some(tokio::spawn(async move {
            let started = Instant::now();
            for (offset, sample) in script {
                tokio::time::sleep_until(started + offset).await;
                tx.push(sample);
            }
            debug!(%modality, "scripted source exhausted");
        }));
        Ok(rx)
    }

    fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Starts successfully but produces nothing: the stream terminates
/// immediately. Models a present but silent sensor.
pub struct SilentSource {
    modality: Modality,
}

impl SilentSource {
    pub fn new(modality: Modality) -> Self {
        Self { modality }
    }
}

impl SignalSource for SilentSource {
    fn modality(&self) -> Modality {
        self.modality
    }

    fn start(&mut self) -> Result<SampleStream, SourceError> {
        let (tx, rx) = sample_buffer::channel(1);
        drop(tx);
        Ok(rx)
    }

    fn stop(&mut self) {}
}

/// Never starts: models a revoked runtime permission.
pub struct DeniedSource {
    modality: Modality,
}

impl DeniedSource {
    pub fn new(modality: Modality) -> Self {
        Self { modality }
    }
}

impl SignalSource for DeniedSource {
    fn modality(&self) -> Modality {
        self.modality
    }

    fn start(&mut self) -> Result<SampleStream, SourceError> {
        Err(SourceError::PermissionDenied(self.modality.to_string()))
    }

    fn stop(&mut self) {}
}
