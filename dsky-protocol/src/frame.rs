//! Simulator socket framing
//!
//! Frame format (four bytes, one per position):
//! - byte 0: `00` marker, then `cccc`   (channel bits 6-3)
//! - byte 1: `01` marker, then `cccddd` (channel bits 2-0, data bits 14-12)
//! - byte 2: `10` marker, then `dddddd` (data bits 11-6)
//! - byte 3: `11` marker, then `dddddd` (data bits 5-0)
//!
//! The decoder resynchronizes byte by byte. A byte whose marker does not match the
//! expected position is dropped and the position stays where it was. Position 3 is
//! terminal: whatever arrives there completes the frame.

use crate::types::{ChannelFrame, ProtocolError};

/// Size of one frame on the wire
pub const FRAME_SIZE: usize = 4;

const MARKER_MASK: u8 = 0xC0;
const PAYLOAD_MASK: u8 = 0x3F;

/// Counters describing the byte stream seen so far
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Complete frames yielded
    pub frames: usize,
    /// Bytes dropped at positions 0-2 because of a marker mismatch
    pub dropped_bytes: usize,
    /// Frames completed by a mismatched byte at position 3
    pub truncated_frames: usize,
}

/// Streaming decoder/encoder for the 4-byte channel framing
#[derive(Debug, Clone, Default)]
pub struct FrameCodec {
    position: u8,
    channel: u8,
    data: u16,
    stats: FrameStats,
}

impl FrameCodec {
    /// Create a codec waiting for position 0
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of bytes and collect every frame it completes
    ///
    /// A partial frame at the end of the chunk is carried over to the next call.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<ChannelFrame> {
        bytes.iter().filter_map(|&byte| self.push(byte)).collect()
    }

    /// Feed a single byte
    pub fn push(&mut self, byte: u8) -> Option<ChannelFrame> {
        let marker = (byte & MARKER_MASK) >> 6;
        let payload = byte & PAYLOAD_MASK;
        let matched = marker == self.position;

        if self.position == 3 {
            if matched {
                self.data = (self.data << 6) | payload as u16;
            } else {
                self.stats.truncated_frames += 1;
                log::debug!("{}, completing frame anyway", self.mismatch(byte));
            }
            let frame = ChannelFrame::new(self.channel, self.data);
            self.clear();
            self.stats.frames += 1;
            return Some(frame);
        }

        if !matched {
            self.stats.dropped_bytes += 1;
            log::trace!("{}, byte dropped", self.mismatch(byte));
            return None;
        }

        match self.position {
            0 => self.channel = (payload & 0x0F) << 3,
            1 => {
                self.channel |= (payload >> 3) & 0x07;
                self.data = (payload & 0x07) as u16;
            }
            _ => self.data = (self.data << 6) | payload as u16,
        }
        self.position += 1;
        None
    }

    fn mismatch(&self, byte: u8) -> ProtocolError {
        ProtocolError::FrameMarkerMismatch { position: self.position, byte }
    }

    fn clear(&mut self) {
        self.position = 0;
        self.channel = 0;
        self.data = 0;
    }

    /// Discard any partially received frame
    pub fn reset(&mut self) {
        self.clear();
    }

    /// Position the next byte is expected at (0-3)
    pub fn position(&self) -> u8 {
        self.position
    }

    /// Stream counters
    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    /// Encode a (channel, data) pair as a 4-byte frame
    pub fn encode(frame: ChannelFrame) -> [u8; FRAME_SIZE] {
        let channel = frame.channel & 0x7F;
        let data = frame.data & 0x7FFF;
        [
            (channel >> 3) & 0x0F,
            0x40 | ((channel & 0x07) << 3) | ((data >> 12) as u8 & 0x07),
            0x80 | ((data >> 6) as u8 & PAYLOAD_MASK),
            0xC0 | (data as u8 & PAYLOAD_MASK),
        ]
    }
}
