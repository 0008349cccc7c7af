//! Conversion between eight bulbs and the byte they show.
//!
//! A [`BitVector`] is always exactly eight digits. How those digits map to
//! weights depends on the [`BitOrder`] chosen on the screen: with
//! [`BitOrder::MsbFirst`] index 0 weighs 128, with [`BitOrder::LsbFirst`]
//! index 0 weighs 1.
//!
//! # Example
//! ```ignore
//! let bits = bits_of(170, BitOrder::MsbFirst);
//! assert_eq!(binary_string(value_of(&bits, BitOrder::MsbFirst)), "10101010");
//! ```

use serde::{Deserialize, Serialize};

pub const BIT_COUNT: usize = 8;

const MSB_FIRST_WEIGHTS: [u8; BIT_COUNT] = [128, 64, 32, 16, 8, 4, 2, 1];
const LSB_FIRST_WEIGHTS: [u8; BIT_COUNT] = [1, 2, 4, 8, 16, 32, 64, 128];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BitOrder {
    #[default]
    MsbFirst,
    LsbFirst,
}

impl BitOrder {
    pub fn flipped(self) -> Self {
        match self {
            BitOrder::MsbFirst => BitOrder::LsbFirst,
            BitOrder::LsbFirst => BitOrder::MsbFirst,
        }
    }
}

/// Weight of each index under `order`.
pub fn weights(order: BitOrder) -> [u8; BIT_COUNT] {
    match order {
        BitOrder::MsbFirst => MSB_FIRST_WEIGHTS,
        BitOrder::LsbFirst => LSB_FIRST_WEIGHTS,
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BitVector([bool; BIT_COUNT]);

impl BitVector {
    pub fn zeroed() -> Self {
        Self([false; BIT_COUNT])
    }

    pub fn from_bits(bits: [bool; BIT_COUNT]) -> Self {
        Self(bits)
    }

    pub fn get(&self, index: usize) -> Option<bool> {
        self.0.get(index).copied()
    }

    /// Flips one bit. Returns `false` when `index` is not a bulb.
    pub fn toggle(&mut self, index: usize) -> bool {
        match self.0.get_mut(index) {
            Some(bit) => {
                *bit = !*bit;
                true
            }
            None => false,
        }
    }

    pub fn ones(&self) -> usize {
        self.0.iter().filter(|b| **b).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        self.0.iter().copied()
    }
}

/// Weighted sum of the lit bulbs.
pub fn value_of(bits: &BitVector, order: BitOrder) -> u8 {
    bits.iter()
        .zip(weights(order))
        .filter(|(bit, _)| *bit)
        .fold(0u8, |sum, (_, weight)| sum + weight)
}

/// Lights the bulbs for `value`, wrapping it into 0..=255 first
/// (-1 becomes 255, 256 becomes 0).
pub fn bits_of(value: i64, order: BitOrder) -> BitVector {
    let value = value.rem_euclid(256) as u8;
    let mut bits = [false; BIT_COUNT];
    // every weight is a distinct power of two
    for (bit, weight) in bits.iter_mut().zip(weights(order)) {
        *bit = value & weight != 0;
    }
    BitVector(bits)
}

/// Eight binary digits, most significant on the left, regardless of bit order.
pub fn binary_string(value: u8) -> String {
    format!("{:08b}", value)
}

/// What the ASCII readout shows for `value`.
pub fn ascii_glyph(value: u8) -> String {
    match value {
        b' ' => "␠".to_string(),
        0x21..=0x7e => (value as char).to_string(),
        _ => "·".to_string(),
    }
}
