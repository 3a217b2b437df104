//! Error types for state persistence and audio output

use std::io;

use lz4_flex::block::{CompressError, DecompressError};

/// Failures while saving or loading an emulation state file.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("state file I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error("state header truncated after {0} bytes")]
    TruncatedHeader(usize),

    /// Deflate-chunked files from older front-ends.
    #[error("state file uses unsupported deflate chunks")]
    UnsupportedCompression,

    #[error("invalid chunk size {0}")]
    InvalidChunkSize(u32),

    #[error("chunk {index} declares invalid compressed length {len}")]
    BadChunkLength { index: usize, len: u32 },

    #[error("chunk {index} failed to decompress: {source}")]
    Decompress {
        index: usize,
        #[source]
        source: DecompressError,
    },

    #[error("chunk {index} decompressed to {actual} bytes, expected {expected}")]
    SizeMismatch {
        index: usize,
        expected: usize,
        actual: usize,
    },

    #[error("state block declares {declared} bytes, only {available} present")]
    TruncatedBlock { declared: usize, available: usize },

    #[error("declared state size {0} exceeds the {limit} byte limit", limit = crate::save::MAX_STATE_SIZE)]
    TooLarge(u64),

    #[error("chunk compression failed: {0}")]
    Compress(#[from] CompressError),

    #[error("engine failed to serialize its state")]
    EngineSerialize,

    /// The engine refused the payload. The engine reports the reason itself.
    #[error("engine rejected the state payload")]
    EngineRejected,
}

impl StateError {
    /// Whether the failure comes from a damaged or truncated file rather than I/O or the engine.
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            Self::TruncatedHeader(_)
                | Self::InvalidChunkSize(_)
                | Self::BadChunkLength { .. }
                | Self::Decompress { .. }
                | Self::SizeMismatch { .. }
                | Self::TruncatedBlock { .. }
                | Self::TooLarge(_)
        )
    }
}

/// Failures while opening the audio output device.
#[derive(Debug, thiserror::Error)]
pub enum AudioOutputError {
    #[error("no audio output device available")]
    NoDevice,

    #[error("failed to query output config: {0}")]
    Config(String),

    #[error("unsupported sample format: {0}")]
    UnsupportedFormat(String),

    #[error("failed to build audio stream: {0}")]
    Build(String),

    #[error("failed to start audio stream: {0}")]
    Play(String),
}
