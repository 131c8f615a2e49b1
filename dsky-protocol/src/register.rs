//! Channel register storage
//!
//! Channel registers are 15 bits wide and numbered 1 through 15, the way the
//! guidance computer documentation numbers them. Bit 1 is the least significant
//! bit of the integer value. [`Bit`] cannot represent index 0.

use crate::types::{ProtocolError, Result};
use std::fmt;

/// Mask for the 15 meaningful bits of a channel value
pub const REGISTER_MASK: u16 = 0x7FFF;

/// A register bit index in 1..=15
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Bit(u8);

impl Bit {
    /// Create a bit index, or `None` if outside 1..=15
    pub const fn new(index: u8) -> Option<Self> {
        if index >= 1 && index <= 15 {
            Some(Self(index))
        } else {
            None
        }
    }

    /// Create a bit index for a value known at compile time
    ///
    /// Fails const evaluation for out-of-range indices.
    pub const fn of(index: u8) -> Self {
        match Self::new(index) {
            Some(bit) => bit,
            None => panic!("register bits are numbered 1-15"),
        }
    }

    /// One-based index of this bit
    pub fn index(self) -> u8 {
        self.0
    }

    /// Mask selecting this bit in an integer channel value
    pub fn mask(self) -> u16 {
        1 << (self.0 - 1)
    }

    /// Iterate over all 15 bits in ascending order
    pub fn all() -> impl Iterator<Item = Bit> {
        (1..=15).map(Bit)
    }
}

impl TryFrom<u8> for Bit {
    type Error = ProtocolError;

    fn try_from(index: u8) -> Result<Self> {
        Bit::new(index).ok_or(ProtocolError::InvalidBit(index))
    }
}

impl fmt::Display for Bit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bit {}", self.0)
    }
}

/// Raw bits of the last value received on a channel
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChannelRegister {
    bits: u16,
}

impl ChannelRegister {
    /// Create an all-clear register
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a register holding an integer channel value
    pub fn from_value(value: u16) -> Self {
        let mut register = Self::new();
        register.set_value(value);
        register
    }

    /// Read one bit
    pub fn get(&self, bit: Bit) -> bool {
        self.bits & bit.mask() != 0
    }

    /// Set or clear one bit
    pub fn set(&mut self, bit: Bit, value: bool) {
        if value {
            self.bits |= bit.mask();
        } else {
            self.bits &= !bit.mask();
        }
    }

    /// Assign the whole register from an integer value
    ///
    /// Integer bit 0 becomes register bit 1; anything above integer bit 14 is dropped.
    pub fn set_value(&mut self, value: u16) {
        self.bits = value & REGISTER_MASK;
    }

    /// Integer value of the register
    pub fn value(&self) -> u16 {
        self.bits
    }

    /// Clear every bit
    pub fn clear(&mut self) {
        self.bits = 0;
    }

    /// Extract `len` bits starting at register bit `low`
    fn field(&self, low: Bit, len: u8) -> u8 {
        ((self.bits >> (low.index() - 1)) & ((1 << len) - 1)) as u8
    }

    /// DSPL: low digit pattern, bits 1-5
    pub fn dspl(&self) -> u8 {
        self.field(Bit::of(1), 5)
    }

    /// DSPH: high digit pattern, bits 6-10
    pub fn dsph(&self) -> u8 {
        self.field(Bit::of(6), 5)
    }

    /// Sign / selector bit 11
    pub fn sign_bit(&self) -> bool {
        self.get(Bit::of(11))
    }

    /// Relay word, bits 12-15
    pub fn relay_word(&self) -> u8 {
        self.field(Bit::of(12), 4)
    }
}

impl From<u16> for ChannelRegister {
    fn from(value: u16) -> Self {
        Self::from_value(value)
    }
}

impl fmt::Display for ChannelRegister {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:015b}", self.bits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_range() {
        assert!(Bit::new(0).is_none());
        assert!(Bit::new(16).is_none());
        assert_eq!(Bit::new(1).unwrap().mask(), 0x0001);
        assert_eq!(Bit::new(15).unwrap().mask(), 0x4000);
        assert!(matches!(Bit::try_from(0), Err(ProtocolError::InvalidBit(0))));
        assert_eq!(Bit::all().count(), 15);
    }

    #[test]
    fn test_set_and_clear_bits() {
        let mut register = ChannelRegister::new();
        register.set(Bit::of(3), true);
        register.set(Bit::of(15), true);
        assert_eq!(register.value(), 0x4004);

        register.set(Bit::of(3), false);
        assert!(!register.get(Bit::of(3)));
        assert!(register.get(Bit::of(15)));
    }

    #[test]
    fn test_set_value_ignores_msb() {
        let register = ChannelRegister::from_value(0xFFFF);
        assert_eq!(register.value(), 0x7FFF);
        assert!(Bit::all().all(|bit| register.get(bit)));
    }

    #[test]
    fn test_field_extraction() {
        // MD1/MD2 showing "88": 101 1011 1011 1101
        let register = ChannelRegister::from_value(0x5BBD);
        assert_eq!(register.relay_word(), 11);
        assert!(!register.sign_bit());
        assert_eq!(register.dsph(), 29);
        assert_eq!(register.dspl(), 29);

        // R1D2/R1D3 with the plus sign: 011 1111 1011 1101
        let register = ChannelRegister::from_value(0x3FBD);
        assert_eq!(register.relay_word(), 7);
        assert!(register.sign_bit());
    }

    #[test]
    fn test_clear() {
        let mut register = ChannelRegister::from_value(0x1234);
        register.clear();
        assert_eq!(register, ChannelRegister::new());
    }
}
