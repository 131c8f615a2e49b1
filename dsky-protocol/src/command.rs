//! Peripheral command encoding
//!
//! The display and indicator controllers understand a tiny ASCII protocol: the
//! decimal command number, a space, and one value byte. Reset and identify carry no
//! value. Each controller has its own command-number space; the numbers below are
//! fixed by the controller firmware.

use crate::segment::Digit;
use crate::types::{Row, Sign};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Peripheral controller a command is addressed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeripheralRole {
    Display,
    Indicators,
    Keyboard,
}

impl PeripheralRole {
    /// Name the controller answers with to an identify command
    pub fn identity(self) -> &'static str {
        match self {
            PeripheralRole::Display => "Display",
            PeripheralRole::Indicators => "Indicators",
            PeripheralRole::Keyboard => "Keyboard",
        }
    }

    /// Match an identify reply (case-insensitive) to a role
    pub fn from_identity(reply: &str) -> Option<Self> {
        [
            PeripheralRole::Display,
            PeripheralRole::Indicators,
            PeripheralRole::Keyboard,
        ]
        .into_iter()
        .find(|role| role.identity().eq_ignore_ascii_case(reply.trim()))
    }
}

impl fmt::Display for PeripheralRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.identity())
    }
}

/// A single digit position on the display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DisplayField {
    Md1,
    Md2,
    Vd1,
    Vd2,
    Nd1,
    Nd2,
    R1d1,
    R1d2,
    R1d3,
    R1d4,
    R1d5,
    R2d1,
    R2d2,
    R2d3,
    R2d4,
    R2d5,
    R3d1,
    R3d2,
    R3d3,
    R3d4,
    R3d5,
}

impl DisplayField {
    /// Every field in command-number order
    pub const ALL: [DisplayField; 21] = [
        DisplayField::Md1,
        DisplayField::Md2,
        DisplayField::Vd1,
        DisplayField::Vd2,
        DisplayField::Nd1,
        DisplayField::Nd2,
        DisplayField::R1d1,
        DisplayField::R1d2,
        DisplayField::R1d3,
        DisplayField::R1d4,
        DisplayField::R1d5,
        DisplayField::R2d1,
        DisplayField::R2d2,
        DisplayField::R2d3,
        DisplayField::R2d4,
        DisplayField::R2d5,
        DisplayField::R3d1,
        DisplayField::R3d2,
        DisplayField::R3d3,
        DisplayField::R3d4,
        DisplayField::R3d5,
    ];

    /// Position of this field in [`DisplayField::ALL`]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Display controller command number
    pub fn command_number(self) -> u8 {
        match self {
            DisplayField::Md1 => 3,
            DisplayField::Md2 => 4,
            DisplayField::Vd1 => 5,
            DisplayField::Vd2 => 6,
            DisplayField::Nd1 => 7,
            DisplayField::Nd2 => 8,
            // 9 is R1S
            DisplayField::R1d1 => 10,
            DisplayField::R1d2 => 11,
            DisplayField::R1d3 => 12,
            DisplayField::R1d4 => 13,
            DisplayField::R1d5 => 14,
            // 15 is R2S
            DisplayField::R2d1 => 16,
            DisplayField::R2d2 => 17,
            DisplayField::R2d3 => 18,
            DisplayField::R2d4 => 19,
            DisplayField::R2d5 => 20,
            // 21 is R3S
            DisplayField::R3d1 => 22,
            DisplayField::R3d2 => 23,
            DisplayField::R3d3 => 24,
            DisplayField::R3d4 => 25,
            DisplayField::R3d5 => 26,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            DisplayField::Md1 => "MD1",
            DisplayField::Md2 => "MD2",
            DisplayField::Vd1 => "VD1",
            DisplayField::Vd2 => "VD2",
            DisplayField::Nd1 => "ND1",
            DisplayField::Nd2 => "ND2",
            DisplayField::R1d1 => "R1D1",
            DisplayField::R1d2 => "R1D2",
            DisplayField::R1d3 => "R1D3",
            DisplayField::R1d4 => "R1D4",
            DisplayField::R1d5 => "R1D5",
            DisplayField::R2d1 => "R2D1",
            DisplayField::R2d2 => "R2D2",
            DisplayField::R2d3 => "R2D3",
            DisplayField::R2d4 => "R2D4",
            DisplayField::R2d5 => "R2D5",
            DisplayField::R3d1 => "R3D1",
            DisplayField::R3d2 => "R3D2",
            DisplayField::R3d3 => "R3D3",
            DisplayField::R3d4 => "R3D4",
            DisplayField::R3d5 => "R3D5",
        }
    }
}

impl fmt::Display for DisplayField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Sign command numbers, indexed by row
const SIGN_COMMANDS: [u8; 3] = [9, 15, 21];

const DISPLAY_RESET: u8 = 1;
const DISPLAY_IDENTIFY: u8 = 2;
const COMP_ACTY: u8 = 27;
const VERB_NOUN_FLASH: u8 = 28;

const INDICATOR_RESET: u8 = 1;
const INDICATOR_IDENTIFY: u8 = 2;
const INDICATOR_WORD: u8 = 15;

/// Lamps on the indicator panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Indicator {
    UplinkActy,
    NoAtt,
    Stby,
    KeyRel,
    OprErr,
    Temp,
    GimbalLock,
    Prog,
    Restart,
    Tracker,
    Alt,
    Vel,
}

impl Indicator {
    /// Indicator controller command number
    pub fn command_number(self) -> u8 {
        match self {
            Indicator::UplinkActy => 3,
            Indicator::NoAtt => 4,
            Indicator::Stby => 5,
            Indicator::KeyRel => 6,
            Indicator::OprErr => 7,
            Indicator::Temp => 8,
            Indicator::GimbalLock => 9,
            Indicator::Prog => 10,
            Indicator::Restart => 11,
            Indicator::Tracker => 12,
            Indicator::Alt => 13,
            Indicator::Vel => 14,
        }
    }

    /// Bit of this lamp in a packed indicator word
    pub fn word_mask(self) -> u16 {
        1 << (self.command_number() - 3)
    }

    pub fn name(self) -> &'static str {
        match self {
            Indicator::UplinkActy => "UPLINK ACTY",
            Indicator::NoAtt => "NO ATT",
            Indicator::Stby => "STBY",
            Indicator::KeyRel => "KEY REL",
            Indicator::OprErr => "OPR ERR",
            Indicator::Temp => "TEMP",
            Indicator::GimbalLock => "GIMBAL LOCK",
            Indicator::Prog => "PROG",
            Indicator::Restart => "RESTART",
            Indicator::Tracker => "TRACKER",
            Indicator::Alt => "ALT",
            Indicator::Vel => "VEL",
        }
    }
}

impl fmt::Display for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A semantic command for one of the peripheral controllers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PeripheralCommand {
    /// Show a digit (or blank) in one display position
    Digit { field: DisplayField, digit: Digit },
    /// Show the sign of a register row
    Sign { row: Row, sign: Sign },
    /// Turn a lamp on the indicator panel on or off
    Lamp { indicator: Indicator, lit: bool },
    /// Computer activity light, driven by the display controller
    CompActy { lit: bool },
    /// Flash the verb and noun digits, driven by the display controller
    VerbNounFlash { on: bool },
    /// Packed state of every indicator lamp
    IndicatorWord { word: u16 },
    /// Return a controller to its power-on state
    Reset { role: PeripheralRole },
    /// Ask a controller to announce its role
    Identify { role: PeripheralRole },
}

impl PeripheralCommand {
    /// Controller this command is addressed to
    pub fn role(&self) -> PeripheralRole {
        match self {
            PeripheralCommand::Digit { .. }
            | PeripheralCommand::Sign { .. }
            | PeripheralCommand::CompActy { .. }
            | PeripheralCommand::VerbNounFlash { .. } => PeripheralRole::Display,
            PeripheralCommand::Lamp { .. } | PeripheralCommand::IndicatorWord { .. } => {
                PeripheralRole::Indicators
            }
            PeripheralCommand::Reset { role } | PeripheralCommand::Identify { role } => *role,
        }
    }
}

impl fmt::Display for PeripheralCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeripheralCommand::Digit { field, digit } => write!(f, "{} = {}", field, digit),
            PeripheralCommand::Sign { row, sign } => write!(f, "{}S = {}", row, sign),
            PeripheralCommand::Lamp { indicator, lit } => {
                write!(f, "{} {}", indicator, if *lit { "on" } else { "off" })
            }
            PeripheralCommand::CompActy { lit } => {
                write!(f, "COMP ACTY {}", if *lit { "on" } else { "off" })
            }
            PeripheralCommand::VerbNounFlash { on } => {
                write!(f, "VERB/NOUN flash {}", if *on { "on" } else { "off" })
            }
            PeripheralCommand::IndicatorWord { word } => write!(f, "indicator word {:#06x}", word),
            PeripheralCommand::Reset { role } => write!(f, "{} reset", role),
            PeripheralCommand::Identify { role } => write!(f, "{} identify", role),
        }
    }
}

/// Command encoder - maps semantic commands to controller byte sequences
pub struct CommandEncoder;

impl CommandEncoder {
    /// Encode a command as the ASCII bytes the controller expects
    ///
    /// # Example
    /// ```
    /// use dsky_protocol::{CommandEncoder, DisplayField, Digit, PeripheralCommand};
    ///
    /// let bytes = CommandEncoder::encode(&PeripheralCommand::Digit {
    ///     field: DisplayField::Md1,
    ///     digit: Digit::Decimal(8),
    /// });
    /// assert_eq!(bytes, b"3 8");
    /// ```
    pub fn encode(command: &PeripheralCommand) -> Vec<u8> {
        match *command {
            PeripheralCommand::Digit { field, digit } => {
                Self::with_value(field.command_number(), digit.ascii())
            }
            PeripheralCommand::Sign { row, sign } => {
                Self::with_value(SIGN_COMMANDS[row.index()], b'0' + sign.code())
            }
            PeripheralCommand::Lamp { indicator, lit } => {
                Self::with_value(indicator.command_number(), Self::flag(lit))
            }
            PeripheralCommand::CompActy { lit } => Self::with_value(COMP_ACTY, Self::flag(lit)),
            PeripheralCommand::VerbNounFlash { on } => {
                Self::with_value(VERB_NOUN_FLASH, Self::flag(on))
            }
            PeripheralCommand::IndicatorWord { word } => {
                let mut bytes = Self::number(INDICATOR_WORD);
                bytes.push(b' ');
                bytes.extend_from_slice(word.to_string().as_bytes());
                bytes
            }
            PeripheralCommand::Reset { role } => Self::number(match role {
                PeripheralRole::Indicators => INDICATOR_RESET,
                _ => DISPLAY_RESET,
            }),
            PeripheralCommand::Identify { role } => Self::number(match role {
                PeripheralRole::Indicators => INDICATOR_IDENTIFY,
                _ => DISPLAY_IDENTIFY,
            }),
        }
    }

    fn number(command: u8) -> Vec<u8> {
        command.to_string().into_bytes()
    }

    fn with_value(command: u8, value: u8) -> Vec<u8> {
        let mut bytes = Self::number(command);
        bytes.push(b' ');
        bytes.push(value);
        bytes
    }

    fn flag(value: bool) -> u8 {
        if value {
            b'1'
        } else {
            b'0'
        }
    }
}
