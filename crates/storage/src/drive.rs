//! Drive and violation records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use signal::Location;
use uuid::Uuid;

/// Drive identifier
pub type DriveId = Uuid;

/// A recorded instance of a detected unsafe-driving condition. Immutable
/// once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    /// When the event was consumed
    pub time: DateTime<Utc>,
    /// Best-effort fix at registration time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    /// What happened ("Speeding!", "Distracted driving!", ...)
    pub description: String,
}

/// The unit of persistence: one bounded drive session and the violations
/// that accrued during it. Never mutated after finalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Drive {
    pub id: DriveId,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_location: Option<Location>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_location: Option<Location>,
    /// Append-only during the session, ordered by time non-decreasing
    pub violations: Vec<Violation>,
}

impl Drive {
    /// Session length.
    pub fn duration(&self) -> chrono::Duration {
        self.end_time - self.start_time
    }
}
