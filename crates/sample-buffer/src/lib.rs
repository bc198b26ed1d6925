//! Bounded Drop-Oldest Sample Queue
//!
//! Every sensor producer feeds its pipeline through one of these: a small
//! bounded buffer that prefers fresh samples over complete history. When
//! the buffer is full, pushing evicts the oldest queued sample instead of
//! blocking the producer.

mod queue;

pub use queue::{channel, SampleReceiver, SampleSender};

/// Default per-producer hop capacity.
pub const DEFAULT_CAPACITY: usize = 10;
