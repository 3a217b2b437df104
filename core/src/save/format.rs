//! Chunked state file header and chunk layout

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Read, Write};
use std::ops::Range;

/// Format magic, version byte included.
pub const STATE_MAGIC: [u8; 8] = *b"#RLZ4v\x01#";

/// Magic prefix of deflate-chunked files, which are not read.
pub const DEFLATE_MAGIC_PREFIX: [u8; 6] = *b"#RZIPv";

/// Magic, chunk size and total size.
pub const HEADER_SIZE: usize = 20;

/// Each chunk is prefixed by its compressed length.
pub const CHUNK_PREFIX_SIZE: usize = 4;

pub const DEFAULT_CHUNK_SIZE: u32 = 131_072;

/// Global header of a chunked state file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateHeader {
    /// Uncompressed size of every chunk but the last
    pub chunk_size: u32,
    /// Uncompressed size of the whole payload
    pub total_size: u64,
}

impl StateHeader {
    pub fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(&STATE_MAGIC)?;
        writer.write_u32::<LittleEndian>(self.chunk_size)?;
        writer.write_u64::<LittleEndian>(self.total_size)?;
        Ok(())
    }

    /// Parse a header, `None` if the magic does not match.
    pub fn parse(bytes: &[u8; HEADER_SIZE]) -> Option<Self> {
        if bytes[..STATE_MAGIC.len()] != STATE_MAGIC {
            return None;
        }
        let mut rest = &bytes[STATE_MAGIC.len()..];
        // Reads from a slice of known length cannot fail.
        let chunk_size = rest.read_u32::<LittleEndian>().ok()?;
        let total_size = rest.read_u64::<LittleEndian>().ok()?;
        Some(Self {
            chunk_size,
            total_size,
        })
    }
}

/// Fill `buf` from `reader`, stopping early only at end of input.
///
/// Returns the number of bytes read.
pub fn read_up_to<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Byte ranges of consecutive chunks covering `0..total`.
///
/// Every range is `chunk_size` long except possibly the last.
pub fn chunk_spans(total: usize, chunk_size: usize) -> impl Iterator<Item = Range<usize>> {
    let step = chunk_size.max(1);
    (0..total)
        .step_by(step)
        .map(move |start| start..(start + step).min(total))
}
