//! Protocol configuration types
//!
//! This module defines the small set of knobs the protocol layer exposes. Transport
//! settings (socket address, device paths, write pacing) belong to the application
//! layer and are not represented here.

use serde::{Deserialize, Serialize};

/// Channel 10 mirror on the simulator socket
pub const CHANNEL_DISPLAY: u8 = 0o10;
/// Channel 11 mirror on the simulator socket
pub const CHANNEL_INDICATORS: u8 = 0o11;
/// Keyboard register (DSKY #1)
pub const CHANNEL_KEYBOARD: u8 = 0o15;
/// Pseudo channel carrying the DSKY-only indicator bits
pub const CHANNEL_DSKY_LAMPS: u8 = 0o163;

/// Rule applied when both sign flags of a row are set at the same time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SignPrecedence {
    /// The flag that was set most recently wins
    #[default]
    MostRecent,
    /// Plus always wins
    Plus,
    /// Minus always wins
    Minus,
}

/// Configuration for the protocol layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtocolConfig {
    /// Only these socket channels are dispatched; everything else is rejected
    #[serde(default = "default_channel_filter")]
    pub channel_filter: Vec<u8>,

    /// Skip channel 10 frames whose data is zero (simulator idle traffic)
    #[serde(default = "default_true")]
    pub skip_zero_display: bool,

    /// Emit packed indicator words in addition to per-lamp commands
    #[serde(default)]
    pub indicator_words: bool,

    /// Precedence when plus and minus are both asserted for a row
    #[serde(default)]
    pub sign_precedence: SignPrecedence,
}

fn default_channel_filter() -> Vec<u8> {
    vec![CHANNEL_DISPLAY, CHANNEL_INDICATORS, CHANNEL_DSKY_LAMPS]
}

fn default_true() -> bool {
    true
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            channel_filter: default_channel_filter(),
            skip_zero_display: true,
            indicator_words: false,
            sign_precedence: SignPrecedence::default(),
        }
    }
}

impl ProtocolConfig {
    /// Create a new protocol configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set channel filter
    pub fn with_channel_filter(mut self, channels: Vec<u8>) -> Self {
        self.channel_filter = channels;
        self
    }

    /// Builder method: forward zero-valued display frames
    pub fn with_zero_display(mut self, forward: bool) -> Self {
        self.skip_zero_display = !forward;
        self
    }

    /// Builder method: enable packed indicator words
    pub fn with_indicator_words(mut self, enabled: bool) -> Self {
        self.indicator_words = enabled;
        self
    }

    /// Builder method: set sign precedence
    pub fn with_sign_precedence(mut self, precedence: SignPrecedence) -> Self {
        self.sign_precedence = precedence;
        self
    }

    /// Check if a socket channel should be processed
    pub fn should_process_channel(&self, channel: u8) -> bool {
        self.channel_filter.contains(&channel)
    }
}
