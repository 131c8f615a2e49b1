//! Keyboard register
//!
//! The keyboard controller reports each key press as its NASA key code. Every key but
//! PRO is latched into the Channel 15 register until the guidance computer strobes
//! for it. PRO is wired separately (it is read through the RPRO line as bit 14 of
//! Channel 32), and the controller reports it as code 0.

use crate::config::CHANNEL_KEYBOARD;
use crate::frame::{FrameCodec, FRAME_SIZE};
use crate::register::ChannelRegister;
use crate::types::{ChannelFrame, ProtocolError, Result};
use std::fmt;

/// A 5-bit DSKY key code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyCode(u8);

impl KeyCode {
    pub const VERB: KeyCode = KeyCode(17);
    pub const NOUN: KeyCode = KeyCode(31);
    pub const ENTER: KeyCode = KeyCode(28);
    pub const CLEAR: KeyCode = KeyCode(30);
    pub const KEY_REL: KeyCode = KeyCode(25);
    pub const RESET: KeyCode = KeyCode(18);
    pub const PLUS: KeyCode = KeyCode(26);
    pub const MINUS: KeyCode = KeyCode(27);

    /// Create a key code, rejecting values wider than 5 bits
    pub fn new(code: u8) -> Result<Self> {
        if code > 0x1F {
            return Err(ProtocolError::InvalidKeyCode(code));
        }
        Ok(Self(code))
    }

    /// Key code for a numeric key
    pub fn digit(n: u8) -> Option<Self> {
        match n {
            0 => Some(KeyCode(16)),
            1..=9 => Some(KeyCode(n)),
            _ => None,
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02o}", self.0)
    }
}

/// What a byte from the keyboard controller meant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEvent {
    /// A key was latched into Channel 15
    Key(KeyCode),
    /// The PRO key was pressed
    Proceed,
}

/// Build the simulator frame announcing a key press on Channel 15
pub fn keypress_frame(key: KeyCode) -> [u8; FRAME_SIZE] {
    FrameCodec::encode(ChannelFrame::new(CHANNEL_KEYBOARD, key.value() as u16))
}

/// Key state waiting to be read by the guidance computer
#[derive(Debug, Clone, Default)]
pub struct Keyboard {
    channel15: ChannelRegister,
    proceed: bool,
}

impl Keyboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept one byte from the keyboard controller
    pub fn accept(&mut self, byte: u8) -> Result<KeyEvent> {
        let key = KeyCode::new(byte)?;
        if key.value() == 0 {
            self.proceed = true;
            log::debug!("PRO key pressed");
            return Ok(KeyEvent::Proceed);
        }

        self.channel15.set_value(key.value() as u16);
        log::debug!("Key {} latched into channel 15", key);
        Ok(KeyEvent::Key(key))
    }

    /// Channel 15 contents for a keyboard strobe
    pub fn channel15(&self) -> &ChannelRegister {
        &self.channel15
    }

    /// Whether PRO has been pressed since it was last read
    pub fn proceed_pending(&self) -> bool {
        self.proceed
    }

    /// Report and clear the PRO latch
    pub fn take_proceed(&mut self) -> bool {
        std::mem::take(&mut self.proceed)
    }

    pub fn reset(&mut self) {
        self.channel15.clear();
        self.proceed = false;
    }
}
