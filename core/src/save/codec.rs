//! State file encoder/decoder
//!
//! Writes the engine blob inside a tagged container, split into fixed-size
//! chunks that are LZ4-compressed independently. Files without the format
//! magic are read back as raw legacy dumps.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use lz4_flex::block::{compress_into, decompress_into, get_maximum_output_size};
use std::ffi::OsString;
use std::fs;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use super::MAX_STATE_SIZE;
use super::container::{find_core_memory, wrap_core_memory};
use super::format::{
    DEFAULT_CHUNK_SIZE, DEFLATE_MAGIC_PREFIX, HEADER_SIZE, STATE_MAGIC, StateHeader, chunk_spans,
    read_up_to,
};
use crate::error::StateError;

/// The emulation engine, as far as save states are concerned.
pub trait Engine {
    /// Bytes needed by [`Engine::serialize`].
    fn serialize_size(&self) -> usize;

    /// Write the full emulation state into `dst`.
    fn serialize(&mut self, dst: &mut [u8]) -> bool;

    /// Restore the emulation state. The engine reports its own errors.
    fn deserialize(&mut self, src: &[u8]) -> bool;
}

/// Chunked, compressed state file codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateCodec {
    chunk_size: u32,
}

impl Default for StateCodec {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl StateCodec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_chunk_size(chunk_size: u32) -> Result<Self, StateError> {
        if chunk_size == 0 {
            return Err(StateError::InvalidChunkSize(chunk_size));
        }
        Ok(Self { chunk_size })
    }

    pub fn chunk_size(&self) -> u32 {
        self.chunk_size
    }

    /// Write `payload` as header plus compressed chunks.
    pub fn encode<W: Write>(&self, payload: &[u8], writer: &mut W) -> Result<(), StateError> {
        let chunk_size = self.chunk_size as usize;
        StateHeader {
            chunk_size: self.chunk_size,
            total_size: payload.len() as u64,
        }
        .write(writer)?;

        let mut compressed = vec![0u8; get_maximum_output_size(chunk_size)];
        for span in chunk_spans(payload.len(), chunk_size) {
            let written = compress_into(&payload[span], &mut compressed)?;
            writer.write_u32::<LittleEndian>(written as u32)?;
            writer.write_all(&compressed[..written])?;
        }
        Ok(())
    }

    /// Read a state file back into its uncompressed payload.
    ///
    /// Input without the format magic (including input shorter than the
    /// magic) is returned as-is. Input with the magic but a cut header, or
    /// with deflate chunks, is an error.
    pub fn decode<R: Read>(&self, reader: &mut R) -> Result<Vec<u8>, StateError> {
        let mut head = [0u8; HEADER_SIZE];
        let got = read_up_to(reader, &mut head)?;
        let read = &head[..got];
        if read.starts_with(&DEFLATE_MAGIC_PREFIX) {
            return Err(StateError::UnsupportedCompression);
        }
        if got < HEADER_SIZE && read.starts_with(&STATE_MAGIC) {
            return Err(StateError::TruncatedHeader(got));
        }

        let header = if got == HEADER_SIZE {
            StateHeader::parse(&head)
        } else {
            None
        };

        let Some(header) = header else {
            tracing::debug!("No state header; reading legacy raw state");
            let mut raw = head[..got].to_vec();
            reader.read_to_end(&mut raw)?;
            return Ok(raw);
        };

        if header.chunk_size == 0 {
            return Err(StateError::InvalidChunkSize(0));
        }
        if header.total_size > MAX_STATE_SIZE {
            return Err(StateError::TooLarge(header.total_size));
        }

        let chunk_size = header.chunk_size as usize;
        let total = header.total_size as usize;
        let max_compressed = get_maximum_output_size(chunk_size);
        let mut payload = vec![0u8; total];
        let mut compressed = Vec::new();

        for (index, span) in chunk_spans(total, chunk_size).enumerate() {
            let len = reader.read_u32::<LittleEndian>()?;
            if len == 0 || len as usize > max_compressed {
                return Err(StateError::BadChunkLength { index, len });
            }
            compressed.resize(len as usize, 0);
            reader.read_exact(&mut compressed)?;

            let expected = span.len();
            let actual = decompress_into(&compressed, &mut payload[span])
                .map_err(|source| StateError::Decompress { index, source })?;
            if actual != expected {
                return Err(StateError::SizeMismatch {
                    index,
                    expected,
                    actual,
                });
            }
        }
        Ok(payload)
    }

    /// Serialize the engine into `path`.
    ///
    /// The file is written next to the target and renamed over it, so a failed
    /// save leaves the previous file untouched.
    pub fn save<E: Engine + ?Sized>(&self, engine: &mut E, path: &Path) -> Result<(), StateError> {
        let size = engine.serialize_size();
        if size as u64 > MAX_STATE_SIZE {
            return Err(StateError::TooLarge(size as u64));
        }
        let payload = wrap_core_memory(size as u32, |dst| engine.serialize(dst))
            .ok_or(StateError::EngineSerialize)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp_path = temp_path(path)?;
        let result = self.write_file(&payload, &tmp_path);
        if let Err(e) = result {
            let _ = fs::remove_file(&tmp_path);
            return Err(e);
        }

        #[cfg(windows)]
        {
            if path.exists() {
                // Windows rename fails if destination exists.
                fs::remove_file(path)?;
            }
        }

        fs::rename(&tmp_path, path)?;
        tracing::debug!("Saved {} byte state to {}", payload.len(), path.display());
        Ok(())
    }

    fn write_file(&self, payload: &[u8], path: &Path) -> Result<(), StateError> {
        let mut writer = BufWriter::new(fs::File::create(path)?);
        self.encode(payload, &mut writer)?;
        let file = writer.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;
        Ok(())
    }

    /// Read `path` and hand the engine's block to it.
    pub fn load<E: Engine + ?Sized>(&self, engine: &mut E, path: &Path) -> Result<(), StateError> {
        let mut reader = BufReader::new(fs::File::open(path)?);
        let payload = self.decode(&mut reader)?;
        let memory = find_core_memory(&payload)?;
        if !engine.deserialize(memory) {
            return Err(StateError::EngineRejected);
        }
        tracing::debug!("Loaded {} byte state from {}", memory.len(), path.display());
        Ok(())
    }
}

fn temp_path(path: &Path) -> io::Result<PathBuf> {
    match path.file_name() {
        Some(name) => {
            let mut tmp_name = OsString::from(name);
            tmp_name.push(".tmp");
            Ok(path.with_file_name(tmp_name))
        }
        None => Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "state path has no file name",
        )),
    }
}
