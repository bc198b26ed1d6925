//! Collaborator interfaces: location resolution and speech announcement

use signal::Location;
use std::future::Future;
use std::sync::Arc;
use tracing::info;

/// Requested fix quality for a one-shot location request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationPriority {
    HighAccuracy,
    BalancedPowerAccuracy,
    LowPower,
    Passive,
}

/// One-shot, best-effort location resolution. A request that fails (lost
/// permission, no fix) resolves to `None`; failures are never surfaced as
/// session errors.
pub trait LocationProvider: Send + Sync + 'static {
    fn current_location(
        &self,
        priority: LocationPriority,
    ) -> impl Future<Output = Option<Location>> + Send;
}

impl<T: LocationProvider> LocationProvider for Arc<T> {
    fn current_location(
        &self,
        priority: LocationPriority,
    ) -> impl Future<Output = Option<Location>> + Send {
        self.as_ref().current_location(priority)
    }
}

/// Fire-and-forget violation announcement. Implementations log failures
/// and never propagate them.
pub trait SpeechAnnouncer: Send + Sync + 'static {
    fn speak(&self, text: &str);
}

impl<T: SpeechAnnouncer> SpeechAnnouncer for Arc<T> {
    fn speak(&self, text: &str) {
        self.as_ref().speak(text);
    }
}

/// Announcer that speaks through the log stream. Stands in where the host
/// platform provides no text-to-speech binding.
#[derive(Debug, Default)]
pub struct LogAnnouncer;

impl SpeechAnnouncer for LogAnnouncer {
    fn speak(&self, text: &str) {
        info!(announcement = text, "speaking");
    }
}

/// Location provider returning a fixed (possibly absent) fix. Used by
/// demos and tests; `None` models a provider that keeps failing.
#[derive(Debug, Clone, Copy)]
pub struct FixedLocationProvider {
    fix: Option<Location>,
}

impl FixedLocationProvider {
    pub fn new(fix: Option<Location>) -> Self {
        Self { fix }
    }
}

impl LocationProvider for FixedLocationProvider {
    fn current_location(
        &self,
        _priority: LocationPriority,
    ) -> impl Future<Output = Option<Location>> + Send {
        std::future::ready(self.fix)
    }
}
