use byteorder::{ByteOrder, LittleEndian};

use crate::constants::{FRAME_HEADER_LEN, FRAME_LEN_OFFSET};
use crate::stream::framing::types::{FrameError, FrameHeader};

#[inline]
pub fn parse_frame_header(wire: &[u8]) -> Result<FrameHeader, FrameError> {
    if wire.len() < FRAME_HEADER_LEN {
        return Err(FrameError::TruncatedHeader { have: wire.len() });
    }

    let mut prefix = [0u8; 4];
    prefix.copy_from_slice(&wire[..FRAME_LEN_OFFSET]);
    let frame_len = LittleEndian::read_u32(&wire[FRAME_LEN_OFFSET..FRAME_HEADER_LEN]);

    let header = FrameHeader { prefix, frame_len };
    header.validate()?;
    Ok(header)
}

/// Follow the length chain of a whole archive held in memory.
///
/// Returns the `(offset, len)` of every frame. Fails unless the last frame
/// ends exactly at the end of `archive`.
pub fn walk_frames(archive: &[u8]) -> Result<Vec<(usize, usize)>, FrameError> {
    let mut frames = Vec::new();
    let mut off = 0;

    while off < archive.len() {
        let header = parse_frame_header(&archive[off..])?;
        let len = header.frame_len as usize;
        let available = archive.len() - off;
        if len > available {
            return Err(FrameError::TruncatedBody { expected: len, actual: available });
        }
        frames.push((off, len));
        off += len;
    }

    Ok(frames)
}
