//! Core types for the DSKY channel-bus protocol
//!
//! This module defines the error type shared by every decoder in the crate and the
//! small value types that travel between them: decoded channel frames, display rows
//! and the three-valued sign.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Result type for protocol operations
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors that can occur while decoding channel data
///
/// None of these are fatal. Decoders recover locally (skip the field, drop the byte,
/// ignore the frame) and report the condition so the caller can log or count it.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("Invalid 7-segment pattern: {0:#07b}")]
    InvalidPattern(u8),

    #[error("Invalid relay word: {0}")]
    InvalidRelayWord(u8),

    #[error("Register bit out of range: {0} (valid bits are 1-15)")]
    InvalidBit(u8),

    #[error("Invalid key code: {0} (key codes are 5 bits)")]
    InvalidKeyCode(u8),

    #[error("Frame marker mismatch at position {position}: byte 0x{byte:02X}")]
    FrameMarkerMismatch { position: u8, byte: u8 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// One decoded (channel, data) pair from the socket framing protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelFrame {
    /// Channel number (0-127)
    pub channel: u8,
    /// 15-bit channel data
    pub data: u16,
}

impl ChannelFrame {
    /// Create a new frame, masking channel to 7 bits and data to 15 bits
    pub fn new(channel: u8, data: u16) -> Self {
        Self {
            channel: channel & 0x7F,
            data: data & 0x7FFF,
        }
    }
}

impl fmt::Display for ChannelFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Channels are conventionally written in octal
        write!(f, "channel {:o} data {:05o}", self.channel, self.data)
    }
}

/// Register row on the display (R1, R2, R3)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Row {
    R1,
    R2,
    R3,
}

impl Row {
    /// All rows, top to bottom
    pub const ALL: [Row; 3] = [Row::R1, Row::R2, Row::R3];

    pub(crate) fn index(self) -> usize {
        match self {
            Row::R1 => 0,
            Row::R2 => 1,
            Row::R3 => 2,
        }
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Row::R1 => write!(f, "R1"),
            Row::R2 => write!(f, "R2"),
            Row::R3 => write!(f, "R3"),
        }
    }
}

/// Net sign shown in front of a register row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Sign {
    #[default]
    Blank,
    Minus,
    Plus,
}

impl Sign {
    /// Wire code understood by the display controller (0=blank, 1=minus, 2=plus)
    pub fn code(self) -> u8 {
        match self {
            Sign::Blank => 0,
            Sign::Minus => 1,
            Sign::Plus => 2,
        }
    }
}

impl fmt::Display for Sign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sign::Blank => write!(f, "blank"),
            Sign::Minus => write!(f, "-"),
            Sign::Plus => write!(f, "+"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_frame_masks_inputs() {
        let frame = ChannelFrame::new(0xFF, 0xFFFF);
        assert_eq!(frame.channel, 0x7F);
        assert_eq!(frame.data, 0x7FFF);
    }

    #[test]
    fn test_channel_frame_display_is_octal() {
        let frame = ChannelFrame::new(115, 8);
        assert_eq!(format!("{}", frame), "channel 163 data 00010");
    }

    #[test]
    fn test_sign_codes() {
        assert_eq!(Sign::Blank.code(), 0);
        assert_eq!(Sign::Minus.code(), 1);
        assert_eq!(Sign::Plus.code(), 2);
        assert_eq!(Sign::default(), Sign::Blank);
    }
}
