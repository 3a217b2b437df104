//! Audio synchronization and speed control
//!
//! The emulation thread pushes samples into a ring ([`SampleProducer`]); the
//! device thread drains it through [`AudioSync`], which keeps latency bounded
//! and follows the [`ThrottleMode`] chosen on the main thread.
//!
//! - [`ThrottleController`] - pause, frame stepping, slow motion, fast forward
//! - [`AudioSync`] - per-callback wait, skip and stretch decisions
//! - `AudioOutput` - cpal device stream (feature `audio-output`)

pub mod metrics;
#[cfg(feature = "audio-output")]
pub mod output;
pub mod source;
pub mod sync;
pub mod throttle;

pub use metrics::{AudioDiagnostics, StretchMeter};
#[cfg(feature = "audio-output")]
pub use output::AudioOutput;
pub use source::{
    CHANNELS, Clock, DEFAULT_RING_FRAMES, RingSource, SampleProducer, SampleSource, SystemClock,
    sample_ring,
};
pub use sync::{AudioSync, MAX_WORKING_FRAMES, SyncTiming};
pub use throttle::{FrameRun, ThrottleController, ThrottleMode, ThrottleSignals};
