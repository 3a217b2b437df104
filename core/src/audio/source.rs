//! Producer side of the audio path
//!
//! The emulation thread pushes interleaved stereo i16 samples into a ring
//! buffer; the mixer on the audio thread reads them through [`SampleSource`].

use std::time::{Duration, Instant};

use ringbuf::{
    HeapCons, HeapProd, HeapRb,
    traits::{Consumer, Observer, Producer, Split},
};
use tracing::debug;

/// Interleaved channels per frame.
pub const CHANNELS: usize = 2;

/// Default ring capacity in frames (~370 ms at 44.1 kHz).
pub const DEFAULT_RING_FRAMES: usize = 16_384;

/// Mixed audio the emulation has produced but nobody has played yet.
pub trait SampleSource {
    /// Stereo frames ready to pull.
    fn available_frames(&self) -> usize;

    /// Pull `dst.len() / 2` frames into `dst`. Missing frames become silence.
    fn pull(&mut self, dst: &mut [i16]);

    /// Drop up to `frames` of the oldest frames.
    fn discard(&mut self, frames: usize) {
        let mut scratch = [0i16; 512 * CHANNELS];
        let mut left = frames;
        while left > 0 {
            let n = left.min(512);
            self.pull(&mut scratch[..n * CHANNELS]);
            left -= n;
        }
    }
}

/// Monotonic time source for the mixer's bounded wait.
pub trait Clock {
    fn now_millis(&self) -> u64;

    /// Give the producer a chance to run.
    fn pause(&self);
}

/// Wall clock backed by [`Instant`].
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }

    fn pause(&self) {
        std::thread::sleep(Duration::from_micros(250));
    }
}

/// Emulation-thread half: pushes frames and counts them.
pub struct SampleProducer {
    producer: HeapProd<i16>,
    produced: u64,
    dropped: u64,
}

impl SampleProducer {
    /// Push interleaved stereo samples. Frames that do not fit are dropped.
    pub fn push(&mut self, samples: &[i16]) -> usize {
        let whole = samples.len() - samples.len() % CHANNELS;
        let room = self.producer.vacant_len() - self.producer.vacant_len() % CHANNELS;
        let pushed = self.producer.push_slice(&samples[..whole.min(room)]);
        if pushed < whole {
            self.dropped += ((whole - pushed) / CHANNELS) as u64;
            debug!(
                "Audio ring overflow: dropped {} frames",
                (whole - pushed) / CHANNELS
            );
        }
        self.produced += (pushed / CHANNELS) as u64;
        pushed / CHANNELS
    }

    /// Frames pushed since creation.
    pub fn produced_frames(&self) -> u64 {
        self.produced
    }

    pub fn dropped_frames(&self) -> u64 {
        self.dropped
    }
}

/// Audio-thread half of the ring.
pub struct RingSource {
    consumer: HeapCons<i16>,
}

impl RingSource {
    pub fn frames_capacity(&self) -> usize {
        self.consumer.capacity().get() / CHANNELS
    }
}

impl SampleSource for RingSource {
    fn available_frames(&self) -> usize {
        self.consumer.occupied_len() / CHANNELS
    }

    fn pull(&mut self, dst: &mut [i16]) {
        let popped = self.consumer.pop_slice(dst);
        dst[popped..].fill(0);
    }

    fn discard(&mut self, frames: usize) {
        self.consumer.skip(frames * CHANNELS);
    }
}

/// Create a linked producer and source holding up to `frames` stereo frames.
pub fn sample_ring(frames: usize) -> (SampleProducer, RingSource) {
    let ring = HeapRb::<i16>::new(frames.max(1) * CHANNELS);
    let (producer, consumer) = ring.split();
    (
        SampleProducer {
            producer,
            produced: 0,
            dropped: 0,
        },
        RingSource { consumer },
    )
}
