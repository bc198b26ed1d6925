//! Violation Detectors
//!
//! Reduces each raw signal stream to debounced, edge-triggered violation
//! events and merges all modalities into one ordered stream:
//! smooth -> reduce-to-scalar -> threshold -> edge-detect -> debounce.
//!
//! Every stage is a pure state+sample step; the only clocked element is
//! the debounce deadline, raced against the sample stream on the tokio
//! timer so emission is event-time driven rather than polled.

pub mod config;
pub mod pipeline;
pub mod policy;
pub mod set;

pub use config::DetectorConfig;
pub use policy::ViolationPolicy;
pub use set::{DetectorSet, EVENT_CHANNEL_CAPACITY};

use serde::{Deserialize, Serialize};
use signal::Modality;
use thiserror::Error;

/// Detector error types
#[derive(Error, Debug)]
pub enum DetectorError {
    #[error("detector set already started")]
    AlreadyStarted,
}

/// A qualifying edge emitted by one modality's pipeline. Ephemeral:
/// consumed immediately by the session controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViolationEvent {
    /// Modality that produced the event
    pub modality: Modality,
    /// Spoken / persisted violation description
    pub description: String,
}
