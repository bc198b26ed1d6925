//! Storage Layer
//!
//! Drive records, the repository they persist through, and aggregate
//! drive statistics. Backing store is an in-memory map with optional
//! JSON drive-history snapshots.

mod aggregate;
mod drive;
mod repository;

pub use aggregate::{aggregate, violation_counts, AggregatedDriveData};
pub use drive::{Drive, DriveId, Violation};
pub use repository::{DriveRepository, DriveStore};

use thiserror::Error;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Store error: {0}")]
    Store(String),
    #[error("Record not found")]
    NotFound,
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
