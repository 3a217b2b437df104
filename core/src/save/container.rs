//! Tagged block container around the engine's state blob
//!
//! ```text
//! "RASTATE\x01"
//! "MEM " <u32 LE length> <engine bytes> <zero padding to 8>
//! <further tagged blocks, skipped on load>
//! ```

use byteorder::{ByteOrder, LittleEndian};

use crate::error::StateError;

pub const CONTAINER_MAGIC: [u8; 8] = *b"RASTATE\x01";

/// Tag of the block holding the engine's own serialization.
pub const CORE_MEMORY_TAG: [u8; 4] = *b"MEM ";

/// Container magic plus one block header.
pub const CONTAINER_OVERHEAD: usize = 16;

const BLOCK_HEADER_SIZE: usize = 8;

fn align8(n: usize) -> usize {
    n.saturating_add(7) & !7
}

/// Build a container with one core memory block of `size` bytes.
///
/// `fill` writes the block's contents; returns `None` if it reports failure.
pub fn wrap_core_memory(size: u32, fill: impl FnOnce(&mut [u8]) -> bool) -> Option<Vec<u8>> {
    let len = size as usize;
    let mut buf = vec![0u8; CONTAINER_OVERHEAD + align8(len)];
    buf[..8].copy_from_slice(&CONTAINER_MAGIC);
    buf[8..12].copy_from_slice(&CORE_MEMORY_TAG);
    LittleEndian::write_u32(&mut buf[12..16], size);
    if !fill(&mut buf[CONTAINER_OVERHEAD..CONTAINER_OVERHEAD + len]) {
        return None;
    }
    Some(buf)
}

/// Locate the core memory block.
///
/// Buffers without the container magic, or without a core memory block, are
/// legacy raw saves and are returned whole. A block whose length runs past the
/// end of the buffer is an error.
pub fn find_core_memory(buf: &[u8]) -> Result<&[u8], StateError> {
    if buf.len() <= CONTAINER_MAGIC.len() || buf[..CONTAINER_MAGIC.len()] != CONTAINER_MAGIC {
        return Ok(buf);
    }
    let mut i = CONTAINER_MAGIC.len();
    while i.saturating_add(BLOCK_HEADER_SIZE) <= buf.len() {
        let tag = &buf[i..i + 4];
        let size = LittleEndian::read_u32(&buf[i + 4..i + 8]) as usize;
        let start = i + BLOCK_HEADER_SIZE;
        if tag == CORE_MEMORY_TAG {
            let available = buf.len() - start;
            if size > available {
                return Err(StateError::TruncatedBlock {
                    declared: size,
                    available,
                });
            }
            return Ok(&buf[start..start + size]);
        }
        tracing::trace!(
            "Skipping state block {:?} ({} bytes)",
            String::from_utf8_lossy(tag),
            size
        );
        i = start.saturating_add(align8(size));
    }
    Ok(buf)
}
