use std::fmt;

use crate::constants::{FRAME_HEADER_LEN, MAX_FRAME_LEN};

/// Fixed 8-byte prefix of every frame.
///
/// ```text
/// [ member header (4) ]   gzip ID1 ID2 CM FLG, untouched
/// [ frame_len (4, LE) ]   total frame length, header included
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub prefix: [u8; 4],
    pub frame_len: u32,
}

impl FrameHeader {
    pub const LEN: usize = FRAME_HEADER_LEN;

    /// Bytes that follow the 8-byte prefix.
    pub fn body_len(&self) -> usize {
        self.frame_len as usize - Self::LEN
    }

    pub fn validate(&self) -> Result<(), FrameError> {
        let len = self.frame_len as usize;
        if len < Self::LEN {
            return Err(FrameError::LengthTooSmall(self.frame_len));
        }
        if len > MAX_FRAME_LEN {
            return Err(FrameError::LengthTooLarge { have: len, max: MAX_FRAME_LEN });
        }
        Ok(())
    }
}

#[derive(Debug)]
pub enum FrameError {
    /// Fewer than 8 bytes left at a frame boundary.
    TruncatedHeader { have: usize },
    /// Frame body ended before `frame_len` bytes.
    TruncatedBody { expected: usize, actual: usize },
    LengthTooSmall(u32),
    LengthTooLarge { have: usize, max: usize },
    /// Compressed member cannot be described by a u32 length.
    Oversized(usize),
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use FrameError::*;
        match self {
            TruncatedHeader { have } =>
                write!(f, "truncated frame header: {} of {} bytes", have, FRAME_HEADER_LEN),
            TruncatedBody { expected, actual } =>
                write!(f, "truncated frame body: expected {}, got {}", expected, actual),
            LengthTooSmall(len) =>
                write!(f, "frame length {} shorter than its header", len),
            LengthTooLarge { have, max } =>
                write!(f, "frame length {} exceeds {}", have, max),
            Oversized(len) =>
                write!(f, "compressed member of {} bytes does not fit a frame", len),
        }
    }
}

impl std::error::Error for FrameError {}
