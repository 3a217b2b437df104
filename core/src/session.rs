//! Front-end session state
//!
//! Owns the binding table, an armed capture, the throttle, save slots and
//! on-screen notifications, and answers the engine's per-frame input queries.
//! Everything here runs on the main thread.

use std::io;
use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};

#[cfg(feature = "audio-output")]
use crate::audio::{AudioOutput, SampleSource};
use crate::audio::{SyncTiming, ThrottleController, ThrottleMode, ThrottleSignals};
use crate::config::{SharedSettings, lock_settings};
#[cfg(feature = "audio-output")]
use crate::error::AudioOutputError;
use crate::error::StateError;
use crate::input::action::{DEVICE_ANALOG, DEVICE_JOYPAD};
use crate::input::{
    BindAction, BindingDescription, BindingRegistry, CaptureSession, CaptureStep, ControllerHost,
};
use crate::notify::{Notification, NotificationQueue};
use crate::save::{Engine, SaveSlots, StateCodec};

pub const DEVICE_MOUSE: u32 = 2;

pub const MOUSE_ID_X: u32 = 0;
pub const MOUSE_ID_Y: u32 = 1;
pub const MOUSE_ID_LEFT: u32 = 2;
pub const MOUSE_ID_RIGHT: u32 = 3;
pub const MOUSE_ID_WHEEL_UP: u32 = 4;
pub const MOUSE_ID_WHEEL_DOWN: u32 = 5;
pub const MOUSE_ID_MIDDLE: u32 = 6;

/// Joypad bitmask query, only used by some engines to probe focus.
pub const JOYPAD_ID_MASK: u32 = 256;

/// Mouse state for the current frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MouseState {
    pub dx: i16,
    pub dy: i16,
    pub left: bool,
    pub right: bool,
    pub middle: bool,
    /// Positive up, negative down
    pub wheel: i8,
}

impl MouseState {
    fn query(&self, id: u32) -> i16 {
        match id {
            MOUSE_ID_X => self.dx,
            MOUSE_ID_Y => self.dy,
            MOUSE_ID_LEFT => i16::from(self.left),
            MOUSE_ID_RIGHT => i16::from(self.right),
            MOUSE_ID_MIDDLE => i16::from(self.middle),
            MOUSE_ID_WHEEL_UP => i16::from(self.wheel > 0),
            MOUSE_ID_WHEEL_DOWN => i16::from(self.wheel < 0),
            _ => 0,
        }
    }
}

/// Save or load queued from the UI, run after the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PendingStateOp {
    #[default]
    None,
    Save,
    Load,
}

pub struct FrontendSession {
    registry: BindingRegistry,
    capture: Option<CaptureSession>,
    throttle: ThrottleController,
    codec: StateCodec,
    slots: SaveSlots,
    pending: PendingStateOp,
    notifications: NotificationQueue,
    settings: SharedSettings,
}

impl FrontendSession {
    /// Session configured from the current settings.
    pub fn new(settings: SharedSettings, core_fps: f64, signals: Arc<ThrottleSignals>) -> Self {
        let (audio, saves_dir) = {
            let store = lock_settings(&settings);
            let config = store.config();
            (config.audio.clone(), config.paths.saves_dir())
        };
        let mut throttle = ThrottleController::new(core_fps, signals);
        throttle.set_rates(audio.fast_rate, audio.slow_rate);
        throttle.set_hold(audio.hold_to_throttle);

        Self {
            registry: BindingRegistry::new(),
            capture: None,
            throttle,
            codec: StateCodec::new(),
            slots: SaveSlots::new(saves_dir),
            pending: PendingStateOp::None,
            notifications: NotificationQueue::new(),
            settings,
        }
    }

    pub fn registry(&self) -> &BindingRegistry {
        &self.registry
    }

    pub fn throttle(&self) -> &ThrottleController {
        &self.throttle
    }

    pub fn throttle_mut(&mut self) -> &mut ThrottleController {
        &mut self.throttle
    }

    pub fn slots(&self) -> &SaveSlots {
        &self.slots
    }

    pub fn slots_mut(&mut self) -> &mut SaveSlots {
        &mut self.slots
    }

    pub fn notifications(&self) -> &NotificationQueue {
        &self.notifications
    }

    pub fn notifications_mut(&mut self) -> &mut NotificationQueue {
        &mut self.notifications
    }

    pub fn settings(&self) -> &SharedSettings {
        &self.settings
    }

    /// Pick up controller hot-plugs.
    pub fn refresh_controllers<H: ControllerHost + ?Sized>(&mut self, host: &H, now: Instant) -> bool {
        self.registry.refresh_controllers(host, &self.settings, now)
    }

    pub fn describe_binding(&self, port: usize, action: BindAction) -> Option<BindingDescription> {
        self.registry.describe(port, action)
    }

    /// Arm a capture for one slot, replacing any capture in progress.
    pub fn start_capture(&mut self, port: usize, action: BindAction) {
        info!("Capturing binding for port {} {}", port + 1, action.config_name());
        self.capture = Some(CaptureSession::new(port, action));
    }

    pub fn capture_target(&self) -> Option<(usize, BindAction)> {
        self.capture.as_ref().map(CaptureSession::target)
    }

    pub fn is_capturing(&self) -> bool {
        self.capture.is_some()
    }

    pub fn cancel_capture(&mut self) {
        self.capture = None;
    }

    /// Answer an engine input query.
    ///
    /// While a capture is armed, joypad and analog queries read 0 and the
    /// secondary mouse button query drives the capture instead; it reads 1
    /// once the capture ends.
    #[allow(clippy::too_many_arguments)]
    pub fn input_state<H: ControllerHost + ?Sized>(
        &mut self,
        port: u32,
        device: u32,
        index: u32,
        id: u32,
        host: &H,
        mouse: &MouseState,
        now: Instant,
    ) -> i16 {
        if device == DEVICE_MOUSE && (self.capture.is_none() || id != MOUSE_ID_RIGHT) {
            return mouse.query(id);
        }
        if device == DEVICE_JOYPAD && id == JOYPAD_ID_MASK {
            return 0;
        }
        if self.capture.is_some() {
            if device != DEVICE_MOUSE {
                return 0;
            }
            return i16::from(self.step_capture(host, mouse.right, now));
        }
        if device != DEVICE_JOYPAD && device != DEVICE_ANALOG {
            return 0;
        }
        match BindAction::from_device(device, index, id, false) {
            Some(action) => self.registry.resolve(port as usize, action, host),
            None => 0,
        }
    }

    /// Advance the armed capture by one poll. Returns whether it ended.
    pub fn step_capture<H: ControllerHost + ?Sized>(
        &mut self,
        host: &H,
        cancel_held: bool,
        now: Instant,
    ) -> bool {
        let Some(capture) = self.capture.as_mut() else {
            return false;
        };
        match capture.step(host, cancel_held) {
            CaptureStep::Pending => false,
            CaptureStep::Cancelled => {
                self.capture = None;
                true
            }
            CaptureStep::Detected(binding) => {
                let (port, action) = capture.target();
                self.capture = None;
                self.registry
                    .commit_binding(port, action, binding, host, &self.settings, now);
                true
            }
        }
    }

    /// Queue a save or load for the next safe point. A save wins over a load.
    pub fn request_save_load(&mut self, save: bool, load: bool) {
        self.pending = if save {
            PendingStateOp::Save
        } else if load {
            PendingStateOp::Load
        } else {
            PendingStateOp::None
        };
    }

    pub fn pending(&self) -> PendingStateOp {
        self.pending
    }

    /// Whether the selected slot holds a state, counting a queued save.
    pub fn has_save_slot(&self) -> bool {
        self.pending == PendingStateOp::Save || self.slots.exists()
    }

    /// Run a queued save or load. Call after the frame has run.
    ///
    /// The outcome has already been posted as a notification when this returns.
    pub fn run_pending<E: Engine + ?Sized>(
        &mut self,
        engine: &mut E,
        now: Instant,
    ) -> Result<(), StateError> {
        match self.pending {
            PendingStateOp::None => Ok(()),
            PendingStateOp::Save => self.save(engine, now),
            PendingStateOp::Load => self.load(engine, now),
        }
    }

    /// Audio timing for this core with the configured latency.
    pub fn sync_timing(&self) -> SyncTiming {
        let store = lock_settings(&self.settings);
        SyncTiming::from_config(&store.config().audio, self.throttle.core_fps())
    }

    /// Open the default audio device, mixing from `source` with the configured timing.
    #[cfg(feature = "audio-output")]
    pub fn open_audio<S>(&self, source: S) -> Result<AudioOutput, AudioOutputError>
    where
        S: SampleSource + Send + 'static,
    {
        AudioOutput::new(
            source,
            self.sync_timing(),
            Arc::clone(self.throttle.signals()),
        )
    }

    /// Save the engine to the selected slot and post the outcome.
    pub fn save<E: Engine + ?Sized>(&mut self, engine: &mut E, now: Instant) -> Result<(), StateError> {
        self.pending = PendingStateOp::None;
        let path = self.slots.path();
        match self.codec.save(engine, &path) {
            Ok(()) => {
                info!("Saved state to {}", path.display());
                self.notifications.push(Notification::state_saved(), now);
                Ok(())
            }
            Err(e) => {
                warn!("Failed to save state to {}: {}", path.display(), e);
                self.notifications.push(Notification::state_save_failed(), now);
                Err(e)
            }
        }
    }

    /// Load the selected slot into the engine and post the outcome.
    ///
    /// The audio backlog is dropped afterwards. An engine rejection posts
    /// nothing; the engine reports it itself.
    pub fn load<E: Engine + ?Sized>(&mut self, engine: &mut E, now: Instant) -> Result<(), StateError> {
        self.pending = PendingStateOp::None;
        let path = self.slots.path();
        let result = self.codec.load(engine, &path);
        match &result {
            Ok(()) => {
                info!("Loaded state from {}", path.display());
                self.notifications.push(Notification::state_loaded(), now);
            }
            Err(StateError::EngineRejected) => {
                warn!("Engine rejected state {}", path.display());
            }
            Err(e) => {
                warn!("Failed to load state from {}: {}", path.display(), e);
                self.notifications.push(Notification::state_load_failed(), now);
            }
        }
        self.throttle.signals().request_skip();
        result
    }

    /// Toggle a speed modifier from its hotkey.
    pub fn speed_key(&mut self, mode: ThrottleMode, down: bool) {
        self.throttle.speed_key(mode, down);
    }

    /// Write dirty settings once the debounce delay has passed (or `force`).
    pub fn flush_settings(&self, now: Instant, force: bool) -> io::Result<bool> {
        lock_settings(&self.settings).flush(now, force)
    }
}
