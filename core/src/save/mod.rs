//! Save states
//!
//! # File Structure
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │ Header (20 bytes)                            │
//! │ ├─ magic: "#RLZ4v\x01#"                      │
//! │ ├─ chunk_size: u32 LE                        │
//! │ └─ total_size: u64 LE                        │
//! ├──────────────────────────────────────────────┤
//! │ Chunk × ceil(total_size / chunk_size)        │
//! │ ├─ compressed_len: u32 LE (non-zero)         │
//! │ └─ LZ4 block                                 │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! The uncompressed payload is a tagged container (see [`container`]) holding
//! the engine blob. Files without the magic are raw engine dumps. Files with
//! the `#RZIPv` magic of older deflate-chunked saves are refused.

pub mod codec;
pub mod container;
pub mod format;
pub mod slot;

pub use codec::{Engine, StateCodec};
pub use format::{DEFAULT_CHUNK_SIZE, HEADER_SIZE, STATE_MAGIC, StateHeader};
pub use slot::SaveSlots;

/// Largest uncompressed state accepted on save or load (1 GiB).
pub const MAX_STATE_SIZE: u64 = 1 << 30;
