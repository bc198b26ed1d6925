//! Aggregate drive statistics

use crate::Drive;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Summary statistics over a set of drives, used for insight views and
/// export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatedDriveData {
    /// Mean session length in milliseconds
    pub average_duration_ms: i64,
    /// Up to three most frequent violation descriptions with counts
    pub top_violations: Vec<(String, usize)>,
}

/// Count violations across drives by description.
pub fn violation_counts(drives: &[Drive]) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for violation in drives.iter().flat_map(|d| &d.violations) {
        *counts.entry(violation.description.clone()).or_insert(0) += 1;
    }
    counts
}

/// Compute aggregate statistics over a set of drives.
pub fn aggregate(drives: &[Drive]) -> AggregatedDriveData {
    let total_ms: i64 = drives.iter().map(|d| d.duration().num_milliseconds()).sum();
    let average_duration_ms = if drives.is_empty() {
        0
    } else {
        total_ms / drives.len() as i64
    };

    let mut top: Vec<(String, usize)> = violation_counts(drives).into_iter().collect();
    // count descending, description ascending for a stable order
    top.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    top.truncate(3);

    AggregatedDriveData {
        average_duration_ms,
        top_violations: top,
    }
}
