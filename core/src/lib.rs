//! Retrolink Core - Emulator front-end plumbing
//!
//! This crate provides the pieces of an emulator front-end that sit between
//! the host (controllers, audio device, file system) and an emulation engine.
//!
//! # Architecture
//!
//! - [`BindingRegistry`] - Maps logical engine actions to physical controller inputs
//! - [`CaptureSession`] - Learns a binding from the next intentional input
//! - [`StateCodec`] - Chunked, LZ4-compressed save state files with legacy fallback
//! - [`AudioSync`] - Adaptive audio that follows pause, slow motion and fast forward
//! - [`FrontendSession`] - Ties the above together for the main loop

pub mod audio;
pub mod config;
pub mod error;
pub mod input;
pub mod notify;
pub mod save;
pub mod session;
#[cfg(test)]
pub mod test_utils;

// Re-export core types
pub use audio::{
    AudioSync, FrameRun, SampleProducer, SampleSource, SyncTiming, ThrottleController,
    ThrottleMode, ThrottleSignals,
};
pub use config::{FrontendConfig, SettingsStore, SharedSettings};
pub use error::{AudioOutputError, StateError};
pub use input::{
    BindAction, BindingRegistry, BindingSource, CaptureSession, CaptureStep, ControllerHost,
    ControllerId, PhysicalController, PhysicalInput,
};
pub use notify::{Notification, NotificationQueue, NotifyLevel};
pub use save::{Engine, SaveSlots, StateCodec};
pub use session::{FrontendSession, MouseState, PendingStateOp};

#[cfg(feature = "audio-output")]
pub use audio::AudioOutput;
#[cfg(feature = "gamepad")]
pub use input::GilrsHost;
