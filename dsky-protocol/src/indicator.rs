//! Edge-triggered indicator tracking
//!
//! Indicator channels are resent constantly, but the controllers only need to hear
//! about changes. A tracker remembers the last value of every bit and produces a
//! command only when a mapped bit flips.
//!
//! Two of the Channel 11 bits are not lamps on the indicator panel. COMP ACTY and the
//! verb/noun flash are handled by the display controller, so their commands go to a
//! different peripheral with a different command number.

use crate::command::{Indicator, PeripheralCommand, PeripheralRole};
use crate::register::{Bit, ChannelRegister};

/// What a tracked bit drives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndicatorTarget {
    /// A lamp on the indicator panel
    Lamp(Indicator),
    /// The computer activity light on the display panel
    CompActy,
    /// Flashing of the verb and noun digits
    VerbNounFlash,
}

impl IndicatorTarget {
    fn command(self, value: bool) -> PeripheralCommand {
        match self {
            IndicatorTarget::Lamp(indicator) => PeripheralCommand::Lamp { indicator, lit: value },
            IndicatorTarget::CompActy => PeripheralCommand::CompActy { lit: value },
            IndicatorTarget::VerbNounFlash => PeripheralCommand::VerbNounFlash { on: value },
        }
    }
}

/// Fixed bit-to-indicator table for one channel
#[derive(Debug, Clone, Copy)]
pub struct IndicatorMap {
    pub name: &'static str,
    pub entries: &'static [(Bit, IndicatorTarget)],
}

impl IndicatorMap {
    /// Channel 11, as strobed by INDC or mirrored on socket channel 11
    pub const CHANNEL_11: IndicatorMap = IndicatorMap {
        name: "channel 11",
        entries: &[
            (Bit::of(2), IndicatorTarget::CompActy),
            (Bit::of(3), IndicatorTarget::Lamp(Indicator::UplinkActy)),
            (Bit::of(4), IndicatorTarget::Lamp(Indicator::Temp)),
            (Bit::of(5), IndicatorTarget::Lamp(Indicator::KeyRel)),
            (Bit::of(6), IndicatorTarget::VerbNounFlash),
            (Bit::of(7), IndicatorTarget::Lamp(Indicator::OprErr)),
        ],
    };

    /// Simulator pseudo channel 163 with the DSKY-only lamps
    pub const CHANNEL_163: IndicatorMap = IndicatorMap {
        name: "channel 163",
        entries: &[
            (Bit::of(4), IndicatorTarget::Lamp(Indicator::Temp)),
            (Bit::of(5), IndicatorTarget::Lamp(Indicator::KeyRel)),
            (Bit::of(6), IndicatorTarget::VerbNounFlash),
            (Bit::of(7), IndicatorTarget::Lamp(Indicator::OprErr)),
            (Bit::of(8), IndicatorTarget::Lamp(Indicator::Restart)),
            (Bit::of(9), IndicatorTarget::Lamp(Indicator::Stby)),
        ],
    };

    /// Target driven by a bit, if any
    pub fn target(&self, bit: Bit) -> Option<IndicatorTarget> {
        self.entries
            .iter()
            .find(|(b, _)| *b == bit)
            .map(|(_, target)| *target)
    }
}

/// Edge-triggered tracker for one indicator channel
#[derive(Debug, Clone)]
pub struct IndicatorTracker {
    map: IndicatorMap,
    register: ChannelRegister,
    /// Lamps driven by dedicated control lines (STBY, PARALM)
    latched: u16,
}

impl IndicatorTracker {
    /// Create a tracker with every bit clear
    pub fn new(map: IndicatorMap) -> Self {
        Self {
            map,
            register: ChannelRegister::new(),
            latched: 0,
        }
    }

    /// Record one bit; returns a command only if a mapped bit changed
    pub fn set_bit(&mut self, bit: Bit, value: bool) -> Option<PeripheralCommand> {
        if self.register.get(bit) == value {
            return None;
        }
        self.register.set(bit, value);

        let target = self.map.target(bit)?;
        log::debug!("{} {} -> {} ({:?})", self.map.name, bit, value, target);
        Some(target.command(value))
    }

    /// Record every mapped bit of a whole channel value
    pub fn set_word(&mut self, value: u16) -> Vec<PeripheralCommand> {
        let incoming = ChannelRegister::from_value(value);
        let entries = self.map.entries;
        entries
            .iter()
            .filter_map(|(bit, _)| self.set_bit(*bit, incoming.get(*bit)))
            .collect()
    }

    /// Drive a lamp from its own control line, edge-triggered
    pub fn set_lamp(&mut self, indicator: Indicator, lit: bool) -> Option<PeripheralCommand> {
        let mask = indicator.word_mask();
        if (self.latched & mask != 0) == lit {
            return None;
        }

        if lit {
            self.latched |= mask;
        } else {
            self.latched &= !mask;
        }
        Some(PeripheralCommand::Lamp { indicator, lit })
    }

    /// Stored value of a bit
    pub fn bit(&self, bit: Bit) -> bool {
        self.register.get(bit)
    }

    /// Whether a panel lamp is currently lit through this tracker
    pub fn is_lit(&self, indicator: Indicator) -> bool {
        self.lamp_word() & indicator.word_mask() != 0
    }

    /// Packed word of every lit panel lamp
    pub fn lamp_word(&self) -> u16 {
        self.map
            .entries
            .iter()
            .filter(|(bit, _)| self.register.get(*bit))
            .fold(self.latched, |word, (_, target)| match target {
                IndicatorTarget::Lamp(indicator) => word | indicator.word_mask(),
                _ => word,
            })
    }

    /// Clear all stored state and produce the controller reset command
    pub fn reset(&mut self) -> PeripheralCommand {
        self.register.clear();
        self.latched = 0;
        log::debug!("{} indicator state reset", self.map.name);
        PeripheralCommand::Reset { role: PeripheralRole::Indicators }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_bit_is_idempotent() {
        let mut tracker = IndicatorTracker::new(IndicatorMap::CHANNEL_11);

        let first = tracker.set_bit(Bit::of(7), true);
        assert_eq!(first, Some(PeripheralCommand::Lamp { indicator: Indicator::OprErr, lit: true }));
        assert_eq!(tracker.set_bit(Bit::of(7), true), None);

        let off = tracker.set_bit(Bit::of(7), false);
        assert_eq!(off, Some(PeripheralCommand::Lamp { indicator: Indicator::OprErr, lit: false }));
    }

    #[test]
    fn test_comp_acty_goes_to_display() {
        let mut tracker = IndicatorTracker::new(IndicatorMap::CHANNEL_11);

        let command = tracker.set_bit(Bit::of(2), true).unwrap();
        assert_eq!(command, PeripheralCommand::CompActy { lit: true });
        assert_eq!(command.role(), PeripheralRole::Display);

        let command = tracker.set_bit(Bit::of(6), true).unwrap();
        assert_eq!(command, PeripheralCommand::VerbNounFlash { on: true });
    }

    #[test]
    fn test_unmapped_bits_produce_nothing() {
        let mut tracker = IndicatorTracker::new(IndicatorMap::CHANNEL_11);
        assert_eq!(tracker.set_bit(Bit::of(1), true), None);
        assert_eq!(tracker.set_bit(Bit::of(15), true), None);
        assert!(tracker.bit(Bit::of(15)));
    }

    #[test]
    fn test_set_word_channel_11() {
        let mut tracker = IndicatorTracker::new(IndicatorMap::CHANNEL_11);

        // COMP ACTY (bit 2) and TEMP (bit 4)
        let commands = tracker.set_word(0x0002 | 0x0008);
        assert_eq!(
            commands,
            vec![
                PeripheralCommand::CompActy { lit: true },
                PeripheralCommand::Lamp { indicator: Indicator::Temp, lit: true },
            ]
        );

        assert!(tracker.set_word(0x000A).is_empty());

        let commands = tracker.set_word(0x0008);
        assert_eq!(commands, vec![PeripheralCommand::CompActy { lit: false }]);
    }

    #[test]
    fn test_set_word_channel_163() {
        let mut tracker = IndicatorTracker::new(IndicatorMap::CHANNEL_163);

        // RESTART (bit 8) and STBY (bit 9)
        let commands = tracker.set_word(0x0080 | 0x0100);
        assert_eq!(
            commands,
            vec![
                PeripheralCommand::Lamp { indicator: Indicator::Restart, lit: true },
                PeripheralCommand::Lamp { indicator: Indicator::Stby, lit: true },
            ]
        );
        assert!(tracker.is_lit(Indicator::Stby));
    }

    #[test]
    fn test_lamp_word_packs_panel_lamps() {
        let mut tracker = IndicatorTracker::new(IndicatorMap::CHANNEL_11);

        tracker.set_word(0x0008);
        assert_eq!(tracker.lamp_word(), Indicator::Temp.word_mask());

        // COMP ACTY is not a panel lamp, so the word does not change
        tracker.set_word(0x000A);
        assert_eq!(tracker.lamp_word(), Indicator::Temp.word_mask());

        tracker.set_lamp(Indicator::Stby, true);
        assert_eq!(tracker.lamp_word(), Indicator::Temp.word_mask() | Indicator::Stby.word_mask());
    }

    #[test]
    fn test_latched_lamps() {
        let mut tracker = IndicatorTracker::new(IndicatorMap::CHANNEL_11);

        assert_eq!(
            tracker.set_lamp(Indicator::Restart, true),
            Some(PeripheralCommand::Lamp { indicator: Indicator::Restart, lit: true })
        );
        assert_eq!(tracker.set_lamp(Indicator::Restart, true), None);
        assert!(tracker.is_lit(Indicator::Restart));
        assert_eq!(tracker.set_lamp(Indicator::Stby, false), None);
    }

    #[test]
    fn test_reset() {
        let mut tracker = IndicatorTracker::new(IndicatorMap::CHANNEL_11);
        tracker.set_word(0x7FFF);
        tracker.set_lamp(Indicator::Stby, true);

        assert_eq!(tracker.reset(), PeripheralCommand::Reset { role: PeripheralRole::Indicators });
        assert_eq!(tracker.lamp_word(), 0);

        // After reset, the same bit produces a command again
        assert!(tracker.set_bit(Bit::of(3), true).is_some());
    }
}
