//! Channel 10 display decoder
//!
//! Channel 10 is multiplexed. The relay word in bits 12-15 selects which pair of
//! display positions the two 5-bit digit patterns belong to, and bit 11 carries the
//! sign for relay words that have one. Relay word 12 is different: its low bits drive
//! a handful of indicator lamps instead of digits.
//!
//! The decoder keeps the state the guidance computer assumes the hardware remembers
//! between words: the digit shown in every position, both sign flags per row, and the
//! relay-12 lamp bits.

use crate::command::{DisplayField, Indicator, PeripheralCommand, PeripheralRole};
use crate::config::SignPrecedence;
use crate::register::{Bit, ChannelRegister};
use crate::segment::{Digit, SevenSegmentCodec};
use crate::types::{ProtocolError, Row, Sign};

/// Relay word that carries indicator lamps instead of digits
pub const RELAY_WORD_LAMPS: u8 = 12;

/// Which half of a sign pair a relay word writes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Polarity {
    Plus,
    Minus,
}

/// Fields written by one relay word
struct RelayEntry {
    upper: Option<DisplayField>,
    lower: Option<DisplayField>,
    sign: Option<(Row, Polarity)>,
}

/// Relay word table, indexed by relay word - 1
const RELAY_TABLE: [RelayEntry; 11] = [
    // 1
    RelayEntry {
        upper: Some(DisplayField::R3d4),
        lower: Some(DisplayField::R3d5),
        sign: Some((Row::R3, Polarity::Minus)),
    },
    // 2
    RelayEntry {
        upper: Some(DisplayField::R3d2),
        lower: Some(DisplayField::R3d3),
        sign: Some((Row::R3, Polarity::Plus)),
    },
    // 3
    RelayEntry {
        upper: Some(DisplayField::R2d5),
        lower: Some(DisplayField::R3d1),
        sign: None,
    },
    // 4
    RelayEntry {
        upper: Some(DisplayField::R2d3),
        lower: Some(DisplayField::R2d4),
        sign: Some((Row::R2, Polarity::Minus)),
    },
    // 5
    RelayEntry {
        upper: Some(DisplayField::R2d1),
        lower: Some(DisplayField::R2d2),
        sign: Some((Row::R2, Polarity::Plus)),
    },
    // 6
    RelayEntry {
        upper: Some(DisplayField::R1d4),
        lower: Some(DisplayField::R1d5),
        sign: Some((Row::R1, Polarity::Minus)),
    },
    // 7
    RelayEntry {
        upper: Some(DisplayField::R1d2),
        lower: Some(DisplayField::R1d3),
        sign: Some((Row::R1, Polarity::Plus)),
    },
    // 8
    RelayEntry {
        upper: None,
        lower: Some(DisplayField::R1d1),
        sign: None,
    },
    // 9
    RelayEntry {
        upper: Some(DisplayField::Nd1),
        lower: Some(DisplayField::Nd2),
        sign: None,
    },
    // 10
    RelayEntry {
        upper: Some(DisplayField::Vd1),
        lower: Some(DisplayField::Vd2),
        sign: None,
    },
    // 11
    RelayEntry {
        upper: Some(DisplayField::Md1),
        lower: Some(DisplayField::Md2),
        sign: None,
    },
];

/// Relay word 12 lamp bits. Bits 1, 2, 7 and 10 (PRIO DISP, NO DAP and spares)
/// have no lamp on this unit.
const RELAY_12_LAMPS: [(Bit, Indicator); 6] = [
    (Bit::of(3), Indicator::Vel),
    (Bit::of(4), Indicator::NoAtt),
    (Bit::of(5), Indicator::Alt),
    (Bit::of(6), Indicator::GimbalLock),
    (Bit::of(8), Indicator::Tracker),
    (Bit::of(9), Indicator::Prog),
];

/// Plus/minus flags for one register row
#[derive(Debug, Clone, Copy, Default)]
struct SignState {
    plus: bool,
    minus: bool,
    last_set: Option<Polarity>,
    shown: Sign,
}

impl SignState {
    fn update(&mut self, polarity: Polarity, value: bool) {
        let flag = match polarity {
            Polarity::Plus => &mut self.plus,
            Polarity::Minus => &mut self.minus,
        };
        // Only a rising edge counts as the most recent set; refreshes do not
        let rising = value && !*flag;
        *flag = value;
        if rising {
            self.last_set = Some(polarity);
        }
    }

    fn net(&self, precedence: SignPrecedence) -> Sign {
        match (self.plus, self.minus) {
            (false, false) => Sign::Blank,
            (true, false) => Sign::Plus,
            (false, true) => Sign::Minus,
            (true, true) => match precedence {
                SignPrecedence::Plus => Sign::Plus,
                SignPrecedence::Minus => Sign::Minus,
                SignPrecedence::MostRecent => match self.last_set {
                    Some(Polarity::Minus) => Sign::Minus,
                    _ => Sign::Plus,
                },
            },
        }
    }
}

/// Counters describing what the decoder has seen
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DisplayStats {
    /// Relay words 1-12 decoded
    pub words_decoded: usize,
    /// Relay word 0 (no-op) frames
    pub blank_words: usize,
    /// Relay words 13-15, ignored
    pub invalid_relay_words: usize,
    /// Digit halves left unchanged because of an unknown pattern
    pub invalid_patterns: usize,
}

/// Channel 10 decoder with persisted display state
#[derive(Debug, Clone)]
pub struct DisplayDecoder {
    register: ChannelRegister,
    digits: [Option<Digit>; 21],
    signs: [SignState; 3],
    lamps: ChannelRegister,
    precedence: SignPrecedence,
    stats: DisplayStats,
}

impl Default for DisplayDecoder {
    fn default() -> Self {
        Self::new(SignPrecedence::default())
    }
}

impl DisplayDecoder {
    /// Create a decoder in the power-on state
    pub fn new(precedence: SignPrecedence) -> Self {
        Self {
            register: ChannelRegister::new(),
            digits: [None; 21],
            signs: [SignState::default(); 3],
            lamps: ChannelRegister::new(),
            precedence,
            stats: DisplayStats::default(),
        }
    }

    /// Set or clear one bit of the held Channel 10 register
    pub fn set_bit(&mut self, bit: Bit, value: bool) {
        self.register.set(bit, value);
    }

    /// Assign the held Channel 10 register from an integer value
    pub fn set_value(&mut self, value: u16) {
        self.register.set_value(value);
    }

    /// The last register value received
    pub fn register(&self) -> &ChannelRegister {
        &self.register
    }

    /// Store a register snapshot and decode it
    pub fn apply(&mut self, register: &ChannelRegister) -> Vec<PeripheralCommand> {
        self.register = *register;
        self.decode()
    }

    /// Decode the held register into peripheral commands
    pub fn decode(&mut self) -> Vec<PeripheralCommand> {
        let relay_word = self.register.relay_word();

        match relay_word {
            0 => {
                self.stats.blank_words += 1;
                Vec::new()
            }
            1..=11 => {
                self.stats.words_decoded += 1;
                self.decode_digits(relay_word)
            }
            RELAY_WORD_LAMPS => {
                self.stats.words_decoded += 1;
                self.decode_lamps()
            }
            _ => {
                self.stats.invalid_relay_words += 1;
                log::warn!(
                    "{}, ignoring register {}",
                    ProtocolError::InvalidRelayWord(relay_word),
                    self.register
                );
                Vec::new()
            }
        }
    }

    fn decode_digits(&mut self, relay_word: u8) -> Vec<PeripheralCommand> {
        let entry = &RELAY_TABLE[(relay_word - 1) as usize];
        let mut commands = Vec::with_capacity(3);

        let halves = [
            (entry.upper, self.register.dsph()),
            (entry.lower, self.register.dspl()),
        ];

        for (field, pattern) in halves {
            let Some(field) = field else { continue };

            match SevenSegmentCodec::decode(pattern) {
                Ok(digit) => {
                    self.digits[field.index()] = Some(digit);
                    commands.push(PeripheralCommand::Digit { field, digit });
                }
                Err(e) => {
                    self.stats.invalid_patterns += 1;
                    log::warn!("{} for {} (relay word {}), field left unchanged", e, field, relay_word);
                }
            }
        }

        if let Some((row, polarity)) = entry.sign {
            let state = &mut self.signs[row.index()];
            state.update(polarity, self.register.sign_bit());

            let net = state.net(self.precedence);
            if net != state.shown {
                state.shown = net;
                commands.push(PeripheralCommand::Sign { row, sign: net });
            }
        }

        log::trace!("Relay word {} -> {} command(s)", relay_word, commands.len());
        commands
    }

    fn decode_lamps(&mut self) -> Vec<PeripheralCommand> {
        let mut commands = Vec::new();

        for (bit, indicator) in RELAY_12_LAMPS {
            let lit = self.register.get(bit);
            if lit != self.lamps.get(bit) {
                self.lamps.set(bit, lit);
                commands.push(PeripheralCommand::Lamp { indicator, lit });
            }
        }

        commands
    }

    /// Return to the power-on state and produce the controller reset command
    pub fn reset(&mut self) -> PeripheralCommand {
        self.register.clear();
        self.digits = [None; 21];
        self.signs = [SignState::default(); 3];
        self.lamps.clear();
        log::debug!("Display state reset");
        PeripheralCommand::Reset { role: PeripheralRole::Display }
    }

    /// Last digit decoded for a field, or `None` if unknown since reset
    pub fn digit(&self, field: DisplayField) -> Option<Digit> {
        self.digits[field.index()]
    }

    /// Numeric code of a field: -1 for blank or unknown, otherwise the digit
    pub fn digit_code(&self, field: DisplayField) -> i8 {
        self.digit(field).map_or(-1, Digit::code)
    }

    /// Sign currently shown for a row
    pub fn sign(&self, row: Row) -> Sign {
        self.signs[row.index()].shown
    }

    /// Packed word of the relay-12 panel lamps currently lit
    pub fn lamp_word(&self) -> u16 {
        RELAY_12_LAMPS
            .iter()
            .filter(|(bit, _)| self.lamps.get(*bit))
            .fold(0, |word, (_, indicator)| word | indicator.word_mask())
    }

    /// Decoder counters
    pub fn stats(&self) -> DisplayStats {
        self.stats
    }
}
