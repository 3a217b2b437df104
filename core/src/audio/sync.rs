//! Adaptive audio mixing
//!
//! Once per device callback, [`AudioSync::mix`] fills exactly the requested
//! number of stereo frames from whatever the emulation has produced. It
//! waits a bounded time for missing audio, drops stale backlog in one cut
//! rather than playing it sped up, and linearly stretches what it has to the
//! requested length when the throttle mode changes the playback rate.

use std::sync::Arc;

use tracing::{debug, trace};

use super::metrics::{AudioDiagnostics, StretchMeter};
use super::source::{CHANNELS, Clock, SampleSource};
use super::throttle::{ThrottleMode, ThrottleSignals};
use crate::config::AudioConfig;

/// Most frames pulled from the source in one callback.
pub const MAX_WORKING_FRAMES: usize = 4096 * 4;

/// Catch-up callbacks tolerated before the backlog is dropped.
const BASE_SKIP_CATCHUPS: u32 = 30;

/// Below this backlog, stretching uses all of it.
const MIN_STRETCH_BACKLOG: usize = 10;

/// Timing parameters that do not change with the throttle mode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyncTiming {
    /// Longest wait for missing audio in one callback
    pub latency_ms: u32,
    /// Frame rate the emulated system runs at
    pub core_fps: f64,
    /// Display refresh rate when vsynced, 0 when unknown
    pub vsync_fps: f64,
}

impl Default for SyncTiming {
    fn default() -> Self {
        Self {
            latency_ms: 25,
            core_fps: 60.0,
            vsync_fps: 0.0,
        }
    }
}

impl SyncTiming {
    /// Timing for a core running at `core_fps` with the configured latency.
    pub fn from_config(audio: &AudioConfig, core_fps: f64) -> Self {
        Self {
            latency_ms: audio.effective_latency_ms(),
            core_fps,
            ..Self::default()
        }
    }

    /// Catch-up callbacks allowed before forcing a skip.
    ///
    /// A display running faster than the core drains the backlog on its own
    /// only when the emulation skips a frame, so it gets longer.
    fn skip_catchups(&self) -> u32 {
        let mut limit = BASE_SKIP_CATCHUPS;
        if self.vsync_fps > self.core_fps && self.latency_ms > 0 {
            let extra = 1000.0 / ((self.vsync_fps - self.core_fps) * f64::from(self.latency_ms));
            limit = limit.saturating_add(extra as u32);
        }
        limit
    }
}

/// Audio-thread mixer between the emulation's sample ring and the device.
pub struct AudioSync<S, C> {
    source: S,
    clock: C,
    timing: SyncTiming,
    signals: Arc<ThrottleSignals>,
    stretch: Arc<StretchMeter>,
    last_mode: ThrottleMode,
    catchups: u32,
    work: Vec<i16>,
    diagnostics: AudioDiagnostics,
}

impl<S: SampleSource, C: Clock> AudioSync<S, C> {
    pub fn new(source: S, clock: C, timing: SyncTiming, signals: Arc<ThrottleSignals>) -> Self {
        Self {
            source,
            clock,
            timing,
            signals,
            stretch: StretchMeter::shared(),
            last_mode: ThrottleMode::None,
            catchups: 0,
            work: vec![0; MAX_WORKING_FRAMES * CHANNELS],
            diagnostics: AudioDiagnostics::new(),
        }
    }

    /// Meter the UI reads the last stretch ratio from.
    pub fn stretch_meter(&self) -> Arc<StretchMeter> {
        Arc::clone(&self.stretch)
    }

    pub fn timing(&self) -> SyncTiming {
        self.timing
    }

    pub fn set_timing(&mut self, timing: SyncTiming) {
        self.timing = timing;
    }

    /// Hysteresis counter of consecutive oversized backlogs.
    pub fn catchups(&self) -> u32 {
        self.catchups
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Fill `dst` (interleaved stereo) with exactly `dst.len() / 2` frames.
    ///
    /// Returns within roughly the configured latency whatever the producer
    /// does.
    pub fn mix(&mut self, dst: &mut [i16], mode: ThrottleMode) -> bool {
        // Fast forward drains its backlog for one more callback after it ends.
        let tm = if self.last_mode == ThrottleMode::FastForward {
            ThrottleMode::FastForward
        } else {
            mode
        };
        self.last_mode = mode;
        self.diagnostics.callbacks += 1;

        let samples = dst.len() / CHANNELS;
        if samples == 0 {
            return true;
        }

        let mut have = self.source.available_frames();
        let want = match tm {
            ThrottleMode::FastForward => {
                let fast_rate = self.signals.fast_rate();
                if fast_rate > 0.0 {
                    (samples as f64 * f64::from(fast_rate)) as usize
                } else {
                    have
                }
            }
            ThrottleMode::SlowMotion => {
                (samples as f64 * f64::from(self.signals.slow_rate())) as usize
            }
            ThrottleMode::None | ThrottleMode::FrameStepping => samples,
        };

        if tm == ThrottleMode::None && have < want {
            have = self.wait_for(want, have);
        }
        self.diagnostics.update_backlog(have);

        if have == 0 {
            dst.fill(0);
            self.diagnostics.silent_callbacks += 1;
            self.diagnostics.maybe_log(self.stretch.last());
            return true;
        }

        self.track_catchup(have, want, samples);

        let skip = self.signals.skip_requested();
        if have < want || want != samples || skip || tm == ThrottleMode::FrameStepping {
            self.stretch_into(dst, tm, have, want, skip);
        } else {
            self.source.pull(&mut dst[..want * CHANNELS]);
            self.stretch.record(1.0);
        }
        self.diagnostics.maybe_log(self.stretch.last());
        true
    }

    fn wait_for(&mut self, want: usize, mut have: usize) -> usize {
        let mut started = None;
        while have < want {
            self.clock.pause();
            have = self.source.available_frames();
            if have >= want {
                break;
            }
            let now = self.clock.now_millis();
            let start = *started.get_or_insert(now);
            if now.saturating_sub(start) >= u64::from(self.timing.latency_ms) {
                // Emulation lagging or stalled.
                trace!("Not enough audio: have {} want {}", have, want);
                self.diagnostics.wait_timeouts += 1;
                break;
            }
        }
        have
    }

    fn track_catchup(&mut self, have: usize, want: usize, samples: usize) {
        let ratio = if self.timing.core_fps < 50.0 { 20 } else { 6 };
        let catchup = have > want.saturating_mul(ratio) / 4 && want == samples;
        if !catchup && self.catchups == 0 {
            return;
        }
        self.catchups = if catchup {
            self.catchups.saturating_add(2)
        } else {
            self.catchups - 1
        };
        if self.catchups > self.timing.skip_catchups() || have > want.saturating_mul(3) {
            self.signals.request_skip();
        }
        trace!(
            "Catch-up: have {} want {} (catchups: {})",
            have, want, self.catchups
        );
    }

    fn stretch_into(
        &mut self,
        dst: &mut [i16],
        tm: ThrottleMode,
        mut have: usize,
        want: usize,
        skip: bool,
    ) {
        let samples = dst.len() / CHANNELS;
        let stepping = tm == ThrottleMode::FrameStepping;

        let mut use_frames = match tm {
            ThrottleMode::FastForward | ThrottleMode::SlowMotion => have.min(want),
            _ if have >= want || skip || stepping => {
                if skip {
                    debug!("Audio skip: dropping {} stale frames", have.saturating_sub(samples));
                    self.diagnostics.skips += 1;
                }
                self.signals.clear_skip();
                self.catchups = 0;
                have.min(samples)
            }
            // Behind: stretch most of what there is, keep the rest as headroom.
            _ if have < MIN_STRETCH_BACKLOG => have,
            _ => have * 7 / 10,
        };
        use_frames = use_frames.min(MAX_WORKING_FRAMES);
        if use_frames == 0 {
            dst.fill(0);
            return;
        }

        let stretch = if stepping {
            1.0
        } else {
            use_frames as f64 / samples as f64
        };
        trace!(
            "Stretch {} (of {} available) into {} (factor {:.3})",
            use_frames, have, samples, stretch
        );

        // Drop the oldest surplus so what plays is the most recent audio.
        let keep = want / 5;
        while have >= samples && have > use_frames + keep {
            let scrap = (have - use_frames - keep).min(MAX_WORKING_FRAMES);
            self.source.discard(scrap);
            self.diagnostics.scrapped_frames += scrap as u64;
            trace!("Scrapping {} (of {} available)", scrap, have);
            have -= scrap;
        }

        let work = &mut self.work[..use_frames * CHANNELS];
        self.source.pull(work);

        let filled = if stepping {
            samples.min(use_frames)
        } else {
            samples
        };
        let last = use_frames - 1;
        for (i, frame) in dst[..filled * CHANNELS]
            .chunks_exact_mut(CHANNELS)
            .enumerate()
        {
            let pos = i as f64 * stretch;
            let j0 = (pos as usize).min(last);
            let j1 = if j0 == last { j0 } else { j0 + 1 };
            let frac = pos - j0 as f64;
            for (ch, out) in frame.iter_mut().enumerate() {
                let a = f64::from(work[j0 * CHANNELS + ch]);
                let b = f64::from(work[j1 * CHANNELS + ch]);
                *out = ((1.0 - frac) * a + frac * b) as i16;
            }
        }
        // Frame stepping pads with silence instead of stretching.
        dst[filled * CHANNELS..].fill(0);

        if !stepping && use_frames != samples {
            self.diagnostics.stretched_callbacks += 1;
        }
        self.stretch.record(stretch as f32);
    }
}
