//! Signal source capability

use crate::sample::{Modality, RawSample};
use thiserror::Error;

/// Stream handle returned by a started source. Terminates (yields `None`)
/// once the source stops producing and releases its sender.
pub type SampleStream = sample_buffer::SampleReceiver<RawSample>;

/// Source error types
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("hardware unavailable: {0}")]
    Unavailable(String),
}

/// A per-modality sample producer.
///
/// `start` is the only point where host OS / hardware APIs are touched.
/// A failed `start` silences that modality for the session; there is no
/// retry until a fresh session re-attempts all sources. `stop` must
/// release the underlying resource (listener, camera binding, microphone
/// handle, location callback) and must be safe to call whether or not
/// `start` succeeded.
pub trait SignalSource: Send {
    /// Modality this source produces.
    fn modality(&self) -> Modality;

    /// Acquire the underlying resource and begin producing samples.
    fn start(&mut self) -> Result<SampleStream, SourceError>;

    /// Release the underlying resource and halt production.
    fn stop(&mut self);
}
