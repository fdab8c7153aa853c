use byteorder::{ByteOrder, LittleEndian};

use crate::constants::{FRAME_HEADER_LEN, FRAME_LEN_OFFSET, MAX_FRAME_LEN};
use crate::stream::framing::types::FrameError;

/// Overwrite bytes `[4, 8)` of a compressed member with its own total length.
///
/// The member becomes a self-describing frame: a reader positioned on its
/// first byte learns where the next frame starts after reading 8 bytes.
pub fn stamp_frame_len(member: &mut [u8]) -> Result<(), FrameError> {
    let len = member.len();
    if len < FRAME_HEADER_LEN {
        return Err(FrameError::TruncatedHeader { have: len });
    }
    if len > MAX_FRAME_LEN {
        return Err(FrameError::Oversized(len));
    }
    LittleEndian::write_u32(&mut member[FRAME_LEN_OFFSET..FRAME_HEADER_LEN], len as u32);
    Ok(())
}
