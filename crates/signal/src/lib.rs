//! Signal Sources
//!
//! The sample model and the capability trait behind which every hardware
//! adapter lives (accelerometer, cabin camera face analysis, microphone,
//! GPS). Sources are injected, never hard-wired, so the detection pipeline
//! runs identically against real hardware or the synthetic sources used by
//! tests and demos.

pub mod sample;
pub mod source;
pub mod synthetic;

pub use sample::{Location, Modality, RawSample};
pub use source::{SampleStream, SignalSource, SourceError};
pub use synthetic::{DeniedSource, ScriptedSource, SilentSource};
