//! Drive Session Control
//!
//! Owns the bounded interval between session start and end: starts the
//! detector set, consumes the merged violation stream, timestamps and
//! geotags each event, announces it, and finalizes the drive record when
//! the session ends or discards everything on request.

pub mod controller;
pub mod provider;

pub use controller::{SessionController, SessionPhase};
pub use provider::{
    FixedLocationProvider, LocationPriority, LocationProvider, LogAnnouncer, SpeechAnnouncer,
};

use detectors::DetectorError;
use thiserror::Error;

/// Session error types
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("session already started")]
    AlreadyStarted,

    #[error(transparent)]
    Detector(#[from] DetectorError),
}
