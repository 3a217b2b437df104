//! Audio output using cpal
//!
//! The device callback runs [`AudioSync::mix`] on the stream's thread. The
//! emulation feeds the other end of the sample ring at the device rate
//! reported by [`AudioOutput::sample_rate`].

use std::sync::Arc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use tracing::{debug, error};

use super::metrics::StretchMeter;
use super::source::{CHANNELS, SampleSource, SystemClock};
use super::sync::{AudioSync, SyncTiming};
use super::throttle::ThrottleSignals;
use crate::error::AudioOutputError;

/// Pre-allocated stereo scratch, in samples
const SCRATCH_SAMPLES: usize = 4096;

/// Open audio output stream
pub struct AudioOutput {
    /// The cpal stream (kept alive for the duration)
    _stream: cpal::Stream,
    sample_rate: u32,
    channels: u16,
    stretch: Arc<StretchMeter>,
}

impl AudioOutput {
    /// Open the default output device and start mixing from `source`.
    pub fn new<S>(
        source: S,
        timing: SyncTiming,
        signals: Arc<ThrottleSignals>,
    ) -> Result<Self, AudioOutputError>
    where
        S: SampleSource + Send + 'static,
    {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or(AudioOutputError::NoDevice)?;
        let supported = device
            .default_output_config()
            .map_err(|e| AudioOutputError::Config(e.to_string()))?;

        let sample_rate = supported.sample_rate().0;
        let channels = supported.channels();
        let format = supported.sample_format();
        let config: cpal::StreamConfig = supported.into();

        let sync = AudioSync::new(source, SystemClock::default(), timing, Arc::clone(&signals));
        let stretch = sync.stretch_meter();

        let stream = match format {
            cpal::SampleFormat::F32 => build_stream::<f32, _>(
                &device,
                &config,
                sync,
                signals,
                |s| f32::from(s) / 32768.0,
                0.0f32,
            )?,
            cpal::SampleFormat::I16 => {
                build_stream::<i16, _>(&device, &config, sync, signals, |s| s, 0)?
            }
            cpal::SampleFormat::U16 => build_stream::<u16, _>(
                &device,
                &config,
                sync,
                signals,
                // 0x8000 is silence for u16 audio
                |s| (i32::from(s) + 32768) as u16,
                32768u16,
            )?,
            other => return Err(AudioOutputError::UnsupportedFormat(format!("{other:?}"))),
        };

        stream
            .play()
            .map_err(|e| AudioOutputError::Play(e.to_string()))?;

        debug!(
            "Audio stream started ({} Hz, {} channels, {:?})",
            sample_rate, channels, format
        );

        Ok(Self {
            _stream: stream,
            sample_rate,
            channels,
            stretch,
        })
    }

    /// Device sample rate the emulation should produce at.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Stretch ratio published by the mixer.
    pub fn stretch_meter(&self) -> Arc<StretchMeter> {
        Arc::clone(&self.stretch)
    }
}

fn build_stream<T, S>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mut sync: AudioSync<S, SystemClock>,
    signals: Arc<ThrottleSignals>,
    convert: fn(i16) -> T,
    silence: T,
) -> Result<cpal::Stream, AudioOutputError>
where
    T: cpal::SizedSample + Send + 'static,
    S: SampleSource + Send + 'static,
{
    let channels = usize::from(config.channels).max(1);
    let mut stereo: Vec<i16> = vec![0; SCRATCH_SAMPLES];
    device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                let frames = data.len() / channels;
                if stereo.len() < frames * CHANNELS {
                    stereo.resize(frames * CHANNELS, 0);
                }
                let mixed = &mut stereo[..frames * CHANNELS];
                sync.mix(mixed, signals.mode());

                for (out, lr) in data
                    .chunks_exact_mut(channels)
                    .zip(mixed.chunks_exact(CHANNELS))
                {
                    match out {
                        [mono] => {
                            *mono = convert(((i32::from(lr[0]) + i32::from(lr[1])) / 2) as i16)
                        }
                        [left, right, rest @ ..] => {
                            *left = convert(lr[0]);
                            *right = convert(lr[1]);
                            rest.fill(silence);
                        }
                        [] => {}
                    }
                }
            },
            |err| error!("Audio stream error: {}", err),
            None,
        )
        .map_err(|e| AudioOutputError::Build(e.to_string()))
}
