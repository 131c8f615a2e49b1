//! 7-segment pattern codec
//!
//! The guidance computer does not send digits; it sends the 5-bit relay pattern that
//! lights the segments of one display position. Only 11 of the 32 patterns are
//! meaningful.

use crate::types::{ProtocolError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Pattern for a blank position
pub const BLANK_PATTERN: u8 = 0;

/// Patterns for the digits 0 through 9, indexed by digit
const DIGIT_PATTERNS: [u8; 10] = [21, 3, 25, 27, 15, 30, 28, 19, 29, 31];

/// A decoded display position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Digit {
    #[default]
    Blank,
    Decimal(u8),
}

impl Digit {
    /// Numeric code for this position: -1 for blank, 0-9 for digits
    pub fn code(self) -> i8 {
        match self {
            Digit::Blank => -1,
            Digit::Decimal(d) => d as i8,
        }
    }

    /// Build a digit from its numeric code
    pub fn from_code(code: i8) -> Option<Self> {
        match code {
            -1 => Some(Digit::Blank),
            0..=9 => Some(Digit::Decimal(code as u8)),
            _ => None,
        }
    }

    /// ASCII byte sent to the display controller
    pub fn ascii(self) -> u8 {
        match self {
            Digit::Blank => b' ',
            Digit::Decimal(d) => b'0' + d,
        }
    }
}

impl fmt::Display for Digit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Digit::Blank => write!(f, "_"),
            Digit::Decimal(d) => write!(f, "{}", d),
        }
    }
}

/// Seven-segment codec - stateless lookup between patterns and digits
pub struct SevenSegmentCodec;

impl SevenSegmentCodec {
    /// Decode a 5-bit segment pattern
    ///
    /// Bits above the low five are ignored. Any pattern outside the fixed table
    /// returns [`ProtocolError::InvalidPattern`].
    pub fn decode(pattern: u8) -> Result<Digit> {
        let pattern = pattern & 0x1F;
        if pattern == BLANK_PATTERN {
            return Ok(Digit::Blank);
        }

        DIGIT_PATTERNS
            .iter()
            .position(|&p| p == pattern)
            .map(|d| Digit::Decimal(d as u8))
            .ok_or(ProtocolError::InvalidPattern(pattern))
    }

    /// Encode a digit back to its segment pattern
    ///
    /// Digits above 9 encode as blank.
    pub fn encode(digit: Digit) -> u8 {
        match digit {
            Digit::Decimal(d) if d <= 9 => DIGIT_PATTERNS[d as usize],
            _ => BLANK_PATTERN,
        }
    }
}
