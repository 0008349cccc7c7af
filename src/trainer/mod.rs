//! Untimed practice: one row of bulbs per channel.
//!
//! The same trainer backs two screens. ByteName builds one row per character
//! of some text, each targeting that character's byte. RGBit builds exactly
//! three rows targeting the red, green and blue channels of a color.
//!
//! Unlike the quiz, a wrong check does not lock a row: the learner can keep
//! adjusting and check again. A correct check locks the row until it is reset.

pub mod color;

use serde::{Deserialize, Serialize};

use crate::bits::{value_of, BitOrder, BitVector};
use crate::error::Result;
use color::{clamp_channel, parse_channel_setting, ColorChannel, Rgb};

/// Used when the learner asks for rows without typing anything.
pub const DEFAULT_TEXT: &str = "Hi!";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelKind {
    Character(char),
    Color(ColorChannel),
}

impl ChannelKind {
    pub fn label(&self) -> String {
        match self {
            ChannelKind::Character(' ') => "␠ Space".to_string(),
            ChannelKind::Character(ch) => ch.to_string(),
            ChannelKind::Color(channel) => channel.letter().to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RowResult {
    #[default]
    Pending,
    Correct,
    Incorrect,
}

/// Byte a character is taught as: the low eight bits of its code point.
pub fn byte_of_char(ch: char) -> u8 {
    (ch as u32 & 0xff) as u8
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelRow {
    pub kind: ChannelKind,
    pub target: u8,
    bits: BitVector,
    locked: bool,
    result: RowResult,
}

impl ChannelRow {
    pub fn new(kind: ChannelKind, target: u8) -> Self {
        Self {
            kind,
            target,
            bits: BitVector::zeroed(),
            locked: false,
            result: RowResult::Pending,
        }
    }

    pub fn bits(&self) -> &BitVector {
        &self.bits
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn result(&self) -> RowResult {
        self.result
    }

    pub fn value(&self, order: BitOrder) -> u8 {
        value_of(&self.bits, order)
    }

    // The only place bits of a row change, apart from reset.
    fn toggle_bit(&mut self, bit: usize) -> bool {
        if self.locked {
            return false;
        }
        self.bits.toggle(bit)
    }

    fn check(&mut self, order: BitOrder) -> RowResult {
        if self.locked {
            return self.result;
        }
        let correct = self.value(order) == self.target;
        self.result = if correct {
            RowResult::Correct
        } else {
            RowResult::Incorrect
        };
        self.locked = correct;
        self.result
    }

    fn reset(&mut self) {
        self.bits = BitVector::zeroed();
        self.locked = false;
        self.result = RowResult::Pending;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelTrainer {
    rows: Vec<ChannelRow>,
    order: BitOrder,
}

impl ChannelTrainer {
    /// One row per character of `text`; empty text trains on [`DEFAULT_TEXT`].
    pub fn for_text(text: &str) -> Self {
        let mut trainer = Self::default();
        trainer.retarget_text(text);
        trainer
    }

    pub fn for_color(target: Rgb) -> Self {
        let mut trainer = Self::default();
        trainer.retarget_color(target);
        trainer
    }

    pub fn rows(&self) -> &[ChannelRow] {
        &self.rows
    }

    pub fn row(&self, row: usize) -> Option<&ChannelRow> {
        self.rows.get(row)
    }

    pub fn order(&self) -> BitOrder {
        self.order
    }

    /// Flips the bit order. The bulbs stay where they are, so the values they
    /// show change.
    pub fn toggle_order(&mut self) {
        self.order = self.order.flipped();
    }

    pub fn retarget_text(&mut self, text: &str) {
        let text = if text.is_empty() { DEFAULT_TEXT } else { text };
        self.rows = text
            .chars()
            .map(|ch| ChannelRow::new(ChannelKind::Character(ch), byte_of_char(ch)))
            .collect();
        log::debug!("Trainer retargeted to text {:?} ({} rows)", text, self.rows.len());
    }

    pub fn retarget_color(&mut self, target: Rgb) {
        self.rows = ColorChannel::ALL
            .iter()
            .map(|channel| ChannelRow::new(ChannelKind::Color(*channel), target.channel(*channel)))
            .collect();
        log::debug!("Trainer retargeted to color {}", target.to_hex());
    }

    /// Retargets to a hex color. Malformed input leaves the trainer untouched.
    pub fn apply_hex(&mut self, input: &str) -> Result<Rgb> {
        let target = Rgb::from_hex(input)?;
        self.retarget_color(target);
        Ok(target)
    }

    /// Moves one channel's target, clamped into a byte. The bulbs stay lit;
    /// a row whose target actually moves is unlocked and back to pending.
    pub fn set_channel_target(&mut self, channel: ColorChannel, value: i64) -> bool {
        let value = clamp_channel(value);
        match self
            .rows
            .iter_mut()
            .find(|row| row.kind == ChannelKind::Color(channel))
        {
            Some(row) => {
                if row.target != value {
                    row.target = value;
                    row.locked = false;
                    row.result = RowResult::Pending;
                }
                true
            }
            None => false,
        }
    }

    /// Applies a `R 200` style setting. Malformed input leaves the trainer untouched.
    pub fn apply_channel_setting(&mut self, input: &str) -> Result<(ColorChannel, u8)> {
        let (channel, value) = parse_channel_setting(input)?;
        self.set_channel_target(channel, value as i64);
        Ok((channel, value))
    }

    pub fn toggle_bit(&mut self, row: usize, bit: usize) -> bool {
        match self.rows.get_mut(row) {
            Some(row) => row.toggle_bit(bit),
            None => false,
        }
    }

    pub fn check_row(&mut self, row: usize) -> Option<RowResult> {
        let order = self.order;
        self.rows.get_mut(row).map(|row| row.check(order))
    }

    pub fn check_all(&mut self) {
        let order = self.order;
        for row in self.rows.iter_mut() {
            row.check(order);
        }
    }

    pub fn reset_row(&mut self, row: usize) -> bool {
        match self.rows.get_mut(row) {
            Some(row) => {
                row.reset();
                true
            }
            None => false,
        }
    }

    pub fn reset_all(&mut self) {
        for row in self.rows.iter_mut() {
            row.reset();
        }
    }

    pub fn correct_count(&self) -> usize {
        self.rows
            .iter()
            .filter(|row| row.result == RowResult::Correct)
            .count()
    }

    /// The color the rows aim at, if this is a color trainer.
    pub fn target_color(&self) -> Option<Rgb> {
        self.color_from(|row| row.target)
    }

    /// The color the learner's bulbs currently mix, if this is a color trainer.
    pub fn current_color(&self) -> Option<Rgb> {
        let order = self.order;
        self.color_from(|row| row.value(order))
    }

    fn color_from<F>(&self, value: F) -> Option<Rgb>
    where
        F: Fn(&ChannelRow) -> u8,
    {
        let mut rgb = Rgb::default();
        let mut seen = 0;
        for row in &self.rows {
            if let ChannelKind::Color(channel) = row.kind {
                rgb.set_channel(channel, value(row));
                seen += 1;
            }
        }
        (seen == ColorChannel::ALL.len()).then_some(rgb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn set_row(trainer: &mut ChannelTrainer, row: usize, value: u8) {
        let bits = crate::bits::bits_of(value as i64, trainer.order());
        for (i, bit) in bits.iter().enumerate() {
            if bit != trainer.row(row).unwrap().bits().get(i).unwrap() {
                trainer.toggle_bit(row, i);
            }
        }
    }

    #[test]
    fn test_text_rows_target_character_bytes() {
        let trainer = ChannelTrainer::for_text("Ab ");
        let targets: Vec<u8> = trainer.rows().iter().map(|r| r.target).collect();
        assert_eq!(targets, vec![65, 98, 32]);
        assert_eq!(trainer.rows()[2].kind.label(), "␠ Space");
    }

    #[test]
    fn test_non_ascii_is_masked_to_low_byte() {
        assert_eq!(byte_of_char('é'), 0xe9);
        assert_eq!(byte_of_char('Ā'), 0x00);
        assert_eq!(byte_of_char('€'), 0xac);
        let trainer = ChannelTrainer::for_text("€");
        assert_eq!(trainer.rows()[0].target, 0xac);
    }

    #[test]
    fn test_empty_text_uses_default() {
        let trainer = ChannelTrainer::for_text("");
        assert_eq!(trainer.rows().len(), 3);
        assert_eq!(trainer.rows()[0].kind, ChannelKind::Character('H'));
    }

    #[test]
    fn test_wrong_check_stays_open() {
        let mut trainer = ChannelTrainer::for_text("A");
        set_row(&mut trainer, 0, 64);
        assert_eq!(trainer.check_row(0), Some(RowResult::Incorrect));
        assert!(!trainer.rows()[0].is_locked());

        // still adjustable, and re-checkable
        assert!(trainer.toggle_bit(0, 7));
        assert_eq!(trainer.check_row(0), Some(RowResult::Correct));
        assert!(trainer.rows()[0].is_locked());
    }

    #[test]
    fn test_correct_check_locks_until_reset() {
        let mut trainer = ChannelTrainer::for_text("A");
        set_row(&mut trainer, 0, 65);
        assert_eq!(trainer.check_row(0), Some(RowResult::Correct));

        assert!(!trainer.toggle_bit(0, 0));
        assert_eq!(trainer.rows()[0].value(BitOrder::MsbFirst), 65);
        assert_eq!(trainer.check_row(0), Some(RowResult::Correct));

        assert!(trainer.reset_row(0));
        let row = &trainer.rows()[0];
        assert!(!row.is_locked());
        assert_eq!(row.result(), RowResult::Pending);
        assert_eq!(row.value(BitOrder::MsbFirst), 0);
        assert!(trainer.toggle_bit(0, 0));
    }

    #[test]
    fn test_check_all_checks_each_row() {
        let mut trainer = ChannelTrainer::for_text("Hi");
        set_row(&mut trainer, 0, b'H');
        set_row(&mut trainer, 1, b'j');
        trainer.check_all();

        assert_eq!(trainer.rows()[0].result(), RowResult::Correct);
        assert!(trainer.rows()[0].is_locked());
        assert_eq!(trainer.rows()[1].result(), RowResult::Incorrect);
        assert!(!trainer.rows()[1].is_locked());
        assert_eq!(trainer.correct_count(), 1);

        trainer.check_all();
        assert!(trainer.rows()[0].is_locked());

        trainer.reset_all();
        assert_eq!(trainer.correct_count(), 0);
        assert!(trainer.rows().iter().all(|r| !r.is_locked() && r.bits().ones() == 0));
    }

    #[test]
    fn test_check_uses_active_order() {
        let mut trainer = ChannelTrainer::for_text("\u{1}");
        trainer.toggle_bit(0, 0);
        assert_eq!(trainer.check_row(0), Some(RowResult::Incorrect));
        trainer.toggle_order();
        assert_eq!(trainer.check_row(0), Some(RowResult::Correct));
    }

    #[test]
    fn test_out_of_range_indices_are_ignored() {
        let mut trainer = ChannelTrainer::for_text("A");
        assert!(!trainer.toggle_bit(1, 0));
        assert!(!trainer.toggle_bit(0, 8));
        assert_eq!(trainer.check_row(5), None);
        assert!(!trainer.reset_row(5));
    }

    #[test]
    fn test_color_rows() {
        let trainer = ChannelTrainer::for_color(Rgb::new(10, 20, 30));
        let kinds: Vec<ChannelKind> = trainer.rows().iter().map(|r| r.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ChannelKind::Color(ColorChannel::Red),
                ChannelKind::Color(ColorChannel::Green),
                ChannelKind::Color(ColorChannel::Blue),
            ]
        );
        assert_eq!(trainer.target_color(), Some(Rgb::new(10, 20, 30)));
        assert_eq!(trainer.current_color(), Some(Rgb::new(0, 0, 0)));
        assert_eq!(ChannelTrainer::for_text("RGB").target_color(), None);
    }

    #[test]
    fn test_hex_retarget_resets_rows() {
        let mut trainer = ChannelTrainer::for_color(Rgb::new(255, 0, 0));
        set_row(&mut trainer, 0, 255);
        trainer.check_row(0);

        trainer.apply_hex("#00ff80").unwrap();
        assert_eq!(trainer.target_color(), Some(Rgb::new(0, 255, 128)));
        assert!(trainer
            .rows()
            .iter()
            .all(|r| r.result() == RowResult::Pending && !r.is_locked() && r.bits().ones() == 0));
    }

    #[test]
    fn test_bad_hex_changes_nothing() {
        let mut trainer = ChannelTrainer::for_color(Rgb::new(1, 2, 3));
        set_row(&mut trainer, 1, 7);
        let before = trainer.clone();

        let err = trainer.apply_hex("zzzzzz").unwrap_err();
        assert!(matches!(err, Error::InvalidHexColor(_)));
        assert_eq!(trainer, before);
    }

    #[test]
    fn test_channel_target_is_clamped_and_keeps_bits() {
        let mut trainer = ChannelTrainer::for_color(Rgb::new(1, 2, 3));
        set_row(&mut trainer, 2, 9);

        assert!(trainer.set_channel_target(ColorChannel::Blue, 300));
        assert!(trainer.set_channel_target(ColorChannel::Red, -5));
        assert_eq!(trainer.target_color(), Some(Rgb::new(0, 2, 255)));
        assert_eq!(trainer.rows()[2].value(trainer.order()), 9);

        assert_eq!(
            trainer.apply_channel_setting("g=40").unwrap(),
            (ColorChannel::Green, 40)
        );
        assert_eq!(trainer.target_color(), Some(Rgb::new(0, 40, 255)));

        let mut text = ChannelTrainer::for_text("x");
        assert!(!text.set_channel_target(ColorChannel::Red, 1));
    }

    #[test]
    fn test_moving_a_checked_target_reopens_the_row() {
        let mut trainer = ChannelTrainer::for_color(Rgb::new(0, 7, 0));
        assert_eq!(trainer.check_row(0), Some(RowResult::Correct));
        assert_eq!(trainer.check_row(1), Some(RowResult::Incorrect));

        // same value: nothing to redo
        assert!(trainer.set_channel_target(ColorChannel::Red, 0));
        assert!(trainer.rows()[0].is_locked());

        assert!(trainer.set_channel_target(ColorChannel::Red, 200));
        let row = &trainer.rows()[0];
        assert_eq!(row.target, 200);
        assert!(!row.is_locked());
        assert_eq!(row.result(), RowResult::Pending);
        assert_eq!(row.value(trainer.order()), 0);
        assert!(trainer.toggle_bit(0, 0));
        assert_eq!(trainer.correct_count(), 0);
    }

    #[test]
    fn test_trainer_survives_json_round_trip() {
        let mut trainer = ChannelTrainer::for_text("Hi");
        set_row(&mut trainer, 0, b'H');
        trainer.check_row(0);
        let json = serde_json::to_string(&trainer).unwrap();
        let back: ChannelTrainer = serde_json::from_str(&json).unwrap();
        assert_eq!(back, trainer);
    }
}
