//! Mixer diagnostics

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Instant;

use tracing::debug;

/// Last stretch ratio applied by the mixer, shared with the UI.
///
/// Stored as `f32` bits; 1.0 means unstretched.
#[derive(Debug)]
pub struct StretchMeter {
    bits: AtomicU32,
}

impl Default for StretchMeter {
    fn default() -> Self {
        Self {
            bits: AtomicU32::new(1.0f32.to_bits()),
        }
    }
}

impl StretchMeter {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn record(&self, stretch: f32) {
        self.bits.store(stretch.to_bits(), Ordering::Relaxed);
    }

    pub fn last(&self) -> f32 {
        f32::from_bits(self.bits.load(Ordering::Relaxed))
    }

    /// Value to draw this UI frame. The stored value then eases 10% toward 1.0.
    pub fn display_tick(&self) -> f32 {
        let shown = self.last();
        if shown != 0.0 {
            self.record(shown + (1.0 - shown) * 0.1);
        }
        shown
    }
}

/// Per-second mixer counters, logged at debug level.
#[derive(Debug, Clone)]
pub struct AudioDiagnostics {
    pub callbacks: u64,
    pub silent_callbacks: u64,
    pub stretched_callbacks: u64,
    pub wait_timeouts: u64,
    pub skips: u64,
    pub scrapped_frames: u64,
    /// Largest backlog seen this interval (frames)
    pub backlog_max: usize,
    last_log_time: Instant,
}

impl Default for AudioDiagnostics {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioDiagnostics {
    pub fn new() -> Self {
        Self {
            callbacks: 0,
            silent_callbacks: 0,
            stretched_callbacks: 0,
            wait_timeouts: 0,
            skips: 0,
            scrapped_frames: 0,
            backlog_max: 0,
            last_log_time: Instant::now(),
        }
    }

    pub fn update_backlog(&mut self, frames: usize) {
        self.backlog_max = self.backlog_max.max(frames);
    }

    /// Log counters if enough time has passed (every 1 second)
    pub fn maybe_log(&mut self, stretch: f32) {
        if self.last_log_time.elapsed().as_secs() < 1 {
            return;
        }
        debug!(
            "AUDIO SYNC: callbacks={}, silent={}, stretched={}, timeouts={}, skips={}, \
             scrapped={}, backlog_max={}, stretch={:.3}",
            self.callbacks,
            self.silent_callbacks,
            self.stretched_callbacks,
            self.wait_timeouts,
            self.skips,
            self.scrapped_frames,
            self.backlog_max,
            stretch
        );
        *self = Self::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_eases_toward_one() {
        let meter = StretchMeter::default();
        assert_eq!(meter.display_tick(), 1.0);

        meter.record(0.5);
        assert_eq!(meter.display_tick(), 0.5);
        assert!((meter.last() - 0.55).abs() < 1e-6);
        for _ in 0..100 {
            meter.display_tick();
        }
        assert!((meter.last() - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_zero_stays_zero() {
        let meter = StretchMeter::default();
        meter.record(0.0);
        meter.display_tick();
        assert_eq!(meter.last(), 0.0);
    }

    #[test]
    fn test_backlog_max() {
        let mut diag = AudioDiagnostics::new();
        diag.update_backlog(10);
        diag.update_backlog(4);
        assert_eq!(diag.backlog_max, 10);
    }
}
