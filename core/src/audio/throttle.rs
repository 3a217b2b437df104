//! Emulation speed control
//!
//! Pause, single-frame stepping, slow motion and fast forward. The mode is
//! mirrored into [`ThrottleSignals`] so the audio thread can follow it.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU32, Ordering};
use std::time::Duration;

use tracing::debug;

/// Above this target rate, fast forward runs several frames per tick instead.
pub const FAST_FPS_LIMIT: f64 = 200.0;

/// Smallest accepted fast-forward multiplier (0 means unlimited).
pub const MIN_FAST_RATE: f32 = 1.001;

/// Largest accepted slow-motion multiplier.
pub const MAX_SLOW_RATE: f32 = 0.999;

pub const DEFAULT_FAST_RATE: f32 = 5.0;
pub const DEFAULT_SLOW_RATE: f32 = 0.3;

/// Unlimited fast forward runs for 1.2 frame durations per tick.
const UNLIMITED_BUDGET_MICROS: f64 = 1_200_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum ThrottleMode {
    #[default]
    None = 0,
    FastForward = 1,
    SlowMotion = 2,
    FrameStepping = 3,
}

impl ThrottleMode {
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::FastForward,
            2 => Self::SlowMotion,
            3 => Self::FrameStepping,
            _ => Self::None,
        }
    }
}

/// Throttle state read by the audio thread.
///
/// Rates are stored as `f32` bits.
#[derive(Debug)]
pub struct ThrottleSignals {
    mode: AtomicU8,
    skip: AtomicBool,
    fast_rate: AtomicU32,
    slow_rate: AtomicU32,
}

impl Default for ThrottleSignals {
    fn default() -> Self {
        Self {
            mode: AtomicU8::new(ThrottleMode::None as u8),
            skip: AtomicBool::new(false),
            fast_rate: AtomicU32::new(DEFAULT_FAST_RATE.to_bits()),
            slow_rate: AtomicU32::new(DEFAULT_SLOW_RATE.to_bits()),
        }
    }
}

impl ThrottleSignals {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn mode(&self) -> ThrottleMode {
        ThrottleMode::from_u8(self.mode.load(Ordering::Relaxed))
    }

    pub fn set_mode(&self, mode: ThrottleMode) {
        self.mode.store(mode as u8, Ordering::Relaxed);
    }

    /// Ask the mixer to drop its backlog on the next callback.
    pub fn request_skip(&self) {
        self.skip.store(true, Ordering::Relaxed);
    }

    pub fn skip_requested(&self) -> bool {
        self.skip.load(Ordering::Relaxed)
    }

    pub fn clear_skip(&self) {
        self.skip.store(false, Ordering::Relaxed);
    }

    pub fn fast_rate(&self) -> f32 {
        f32::from_bits(self.fast_rate.load(Ordering::Relaxed))
    }

    pub fn slow_rate(&self) -> f32 {
        f32::from_bits(self.slow_rate.load(Ordering::Relaxed))
    }

    fn set_rates(&self, fast_rate: f32, slow_rate: f32) {
        self.fast_rate.store(fast_rate.to_bits(), Ordering::Relaxed);
        self.slow_rate.store(slow_rate.to_bits(), Ordering::Relaxed);
    }
}

/// How much emulation to run on one display tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameRun {
    /// Paused; run nothing.
    Skip,
    /// Run this many frames back to back.
    Frames(u32),
    /// Keep running frames until this much wall time has passed.
    For(Duration),
}

/// Tracks the throttle mode and decides how many frames each tick runs.
#[derive(Debug, Clone)]
pub struct ThrottleController {
    mode: ThrottleMode,
    /// Set after a stepped frame; cleared by [`ThrottleController::request_step`]
    paused: bool,
    fast_rate: f32,
    slow_rate: f32,
    /// Speed modifiers act only while their key is held
    hold: bool,
    core_fps: f64,
    signals: Arc<ThrottleSignals>,
}

impl ThrottleController {
    pub fn new(core_fps: f64, signals: Arc<ThrottleSignals>) -> Self {
        Self {
            mode: ThrottleMode::None,
            paused: false,
            fast_rate: DEFAULT_FAST_RATE,
            slow_rate: DEFAULT_SLOW_RATE,
            hold: false,
            core_fps,
            signals,
        }
    }

    /// Set the speed multipliers, clamped to their valid ranges.
    ///
    /// A fast rate of 0 runs fast forward unlimited.
    pub fn set_rates(&mut self, fast_rate: f32, slow_rate: f32) {
        self.fast_rate = if fast_rate <= 0.0 {
            0.0
        } else {
            fast_rate.max(MIN_FAST_RATE)
        };
        self.slow_rate = slow_rate.clamp(0.01, MAX_SLOW_RATE);
        self.signals.set_rates(self.fast_rate, self.slow_rate);
        self.apply(self.mode, false);
    }

    pub fn set_hold(&mut self, hold: bool) {
        self.hold = hold;
    }

    pub fn set_core_fps(&mut self, core_fps: f64) {
        self.core_fps = core_fps;
        self.apply(self.mode, false);
    }

    pub fn mode(&self) -> ThrottleMode {
        self.mode
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn fast_rate(&self) -> f32 {
        self.fast_rate
    }

    pub fn slow_rate(&self) -> f32 {
        self.slow_rate
    }

    pub fn core_fps(&self) -> f64 {
        self.core_fps
    }

    pub fn signals(&self) -> &Arc<ThrottleSignals> {
        &self.signals
    }

    /// Switch mode. Every switch makes the mixer drop its backlog.
    pub fn apply(&mut self, mode: ThrottleMode, unpause: bool) {
        if mode != self.mode {
            debug!("Throttle mode {:?} -> {:?}", self.mode, mode);
        }
        self.mode = mode;
        if unpause {
            self.paused = false;
        }
        self.signals.set_mode(mode);
        self.signals.request_skip();
    }

    /// Enter frame stepping, or leave it and resume.
    pub fn toggle_pause(&mut self) {
        if self.mode == ThrottleMode::FrameStepping {
            self.apply(ThrottleMode::None, true);
        } else {
            self.apply(ThrottleMode::FrameStepping, false);
        }
    }

    /// Run one more frame while frame stepping.
    ///
    /// Returns false outside frame stepping so the key can do something else.
    pub fn request_step(&mut self) -> bool {
        if self.mode != ThrottleMode::FrameStepping {
            return false;
        }
        self.paused = false;
        true
    }

    pub fn toggle_fast_forward(&mut self) {
        self.toggle(ThrottleMode::FastForward);
    }

    pub fn toggle_slow_motion(&mut self) {
        self.toggle(ThrottleMode::SlowMotion);
    }

    fn toggle(&mut self, mode: ThrottleMode) {
        let next = if self.mode == mode {
            ThrottleMode::None
        } else {
            mode
        };
        self.apply(next, true);
    }

    /// Speed modifier key went down or up.
    ///
    /// In hold mode the modifier is active only while held, otherwise each
    /// press toggles it.
    pub fn speed_key(&mut self, mode: ThrottleMode, down: bool) {
        debug_assert!(matches!(
            mode,
            ThrottleMode::FastForward | ThrottleMode::SlowMotion
        ));
        if self.hold {
            if down {
                self.apply(mode, false);
            } else if self.mode == mode {
                self.apply(ThrottleMode::None, true);
            }
        } else if down {
            self.toggle(mode);
        }
    }

    /// Frame rate the display loop should be limited to.
    pub fn target_fps(&self) -> f64 {
        match self.mode {
            ThrottleMode::SlowMotion => self.core_fps * f64::from(self.slow_rate),
            ThrottleMode::FastForward if self.fast_rate > 0.0 => {
                let rate = self.core_fps * f64::from(self.fast_rate);
                if rate >= FAST_FPS_LIMIT {
                    rate / f64::from(self.fast_rate.trunc())
                } else {
                    rate
                }
            }
            _ => self.core_fps,
        }
    }

    /// Effective emulation rate reported to the core (0 while stepping).
    pub fn reported_rate(&self) -> f64 {
        match self.mode {
            ThrottleMode::None => self.core_fps,
            ThrottleMode::FastForward => self.core_fps * f64::from(self.fast_rate),
            ThrottleMode::SlowMotion => self.core_fps * f64::from(self.slow_rate),
            ThrottleMode::FrameStepping => 0.0,
        }
    }

    /// Decide what this tick runs. Frame stepping pauses again afterwards.
    pub fn next_run(&mut self) -> FrameRun {
        if self.paused {
            return FrameRun::Skip;
        }
        match self.mode {
            ThrottleMode::FrameStepping => {
                self.paused = true;
                FrameRun::Frames(1)
            }
            ThrottleMode::FastForward if self.fast_rate == 0.0 => {
                let micros = UNLIMITED_BUDGET_MICROS / self.core_fps.max(1.0);
                FrameRun::For(Duration::from_micros(micros as u64))
            }
            ThrottleMode::FastForward
                if self.core_fps * f64::from(self.fast_rate) >= FAST_FPS_LIMIT =>
            {
                FrameRun::Frames((self.fast_rate.trunc() as u32).max(1))
            }
            _ => FrameRun::Frames(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller(fps: f64) -> ThrottleController {
        ThrottleController::new(fps, ThrottleSignals::shared())
    }

    #[test]
    fn test_mode_u8_roundtrip() {
        for mode in [
            ThrottleMode::None,
            ThrottleMode::FastForward,
            ThrottleMode::SlowMotion,
            ThrottleMode::FrameStepping,
        ] {
            assert_eq!(ThrottleMode::from_u8(mode as u8), mode);
        }
        assert_eq!(ThrottleMode::from_u8(200), ThrottleMode::None);
    }

    #[test]
    fn test_every_switch_requests_skip() {
        let mut throttle = controller(60.0);
        let signals = throttle.signals().clone();
        throttle.toggle_slow_motion();
        assert!(signals.skip_requested());
        assert_eq!(signals.mode(), ThrottleMode::SlowMotion);

        signals.clear_skip();
        throttle.toggle_slow_motion();
        assert!(signals.skip_requested());
        assert_eq!(signals.mode(), ThrottleMode::None);
    }

    #[test]
    fn test_target_fps() {
        let mut throttle = controller(60.0);
        throttle.set_rates(5.0, 0.5);
        assert_eq!(throttle.target_fps(), 60.0);

        throttle.toggle_slow_motion();
        assert_eq!(throttle.target_fps(), 30.0);

        // 60 * 5 = 300 is over the limit: 5 frames per tick at 60 fps.
        throttle.toggle_fast_forward();
        assert_eq!(throttle.target_fps(), 60.0);
        assert_eq!(throttle.next_run(), FrameRun::Frames(5));

        throttle.set_rates(2.5, 0.5);
        assert_eq!(throttle.target_fps(), 150.0);
        assert_eq!(throttle.next_run(), FrameRun::Frames(1));
    }

    #[test]
    fn test_unlimited_fast_forward() {
        let mut throttle = controller(50.0);
        throttle.set_rates(0.0, 0.3);
        throttle.toggle_fast_forward();
        assert_eq!(throttle.target_fps(), 50.0);
        assert_eq!(throttle.next_run(), FrameRun::For(Duration::from_millis(24)));
    }

    #[test]
    fn test_rates_are_clamped() {
        let mut throttle = controller(60.0);
        throttle.set_rates(1.0, 1.0);
        assert_eq!(throttle.fast_rate(), MIN_FAST_RATE);
        assert_eq!(throttle.slow_rate(), MAX_SLOW_RATE);
        assert_eq!(throttle.signals().fast_rate(), MIN_FAST_RATE);
        assert_eq!(throttle.signals().slow_rate(), MAX_SLOW_RATE);
    }

    #[test]
    fn test_frame_stepping() {
        let mut throttle = controller(60.0);
        throttle.toggle_pause();
        assert_eq!(throttle.mode(), ThrottleMode::FrameStepping);
        assert_eq!(throttle.reported_rate(), 0.0);

        assert_eq!(throttle.next_run(), FrameRun::Frames(1));
        assert_eq!(throttle.next_run(), FrameRun::Skip);
        assert_eq!(throttle.next_run(), FrameRun::Skip);

        assert!(throttle.request_step());
        assert_eq!(throttle.next_run(), FrameRun::Frames(1));
        assert_eq!(throttle.next_run(), FrameRun::Skip);

        throttle.toggle_pause();
        assert_eq!(throttle.mode(), ThrottleMode::None);
        assert!(!throttle.is_paused());
        assert_eq!(throttle.next_run(), FrameRun::Frames(1));
        assert!(!throttle.request_step());
    }

    #[test]
    fn test_speed_key_toggle_and_hold() {
        let mut throttle = controller(60.0);
        throttle.speed_key(ThrottleMode::FastForward, true);
        throttle.speed_key(ThrottleMode::FastForward, false);
        assert_eq!(throttle.mode(), ThrottleMode::FastForward);
        throttle.speed_key(ThrottleMode::SlowMotion, true);
        assert_eq!(throttle.mode(), ThrottleMode::SlowMotion);

        throttle.set_hold(true);
        throttle.speed_key(ThrottleMode::FastForward, true);
        assert_eq!(throttle.mode(), ThrottleMode::FastForward);
        // Releasing a different key leaves the mode alone.
        throttle.speed_key(ThrottleMode::SlowMotion, false);
        assert_eq!(throttle.mode(), ThrottleMode::FastForward);
        throttle.speed_key(ThrottleMode::FastForward, false);
        assert_eq!(throttle.mode(), ThrottleMode::None);
    }

    #[test]
    fn test_speed_change_resumes_stepping() {
        let mut throttle = controller(60.0);
        throttle.toggle_pause();
        throttle.next_run();
        assert!(throttle.is_paused());
        throttle.toggle_fast_forward();
        assert!(!throttle.is_paused());
        assert_eq!(throttle.next_run(), FrameRun::Frames(1));
    }
}
