use rand::Rng;

use crate::bits::{bits_of, value_of, BitOrder, BitVector};
use crate::quiz::bank::QuestionBank;
use crate::quiz::timer::QuestionTimer;
use crate::quiz::{NextOutcome, QuizResult, QuizSession, TickOutcome, QUESTIONS_PER_QUIZ};

pub const PRESET_ALTERNATING_HIGH: u8 = 0b1010_1010;
pub const PRESET_ALTERNATING_LOW: u8 = 0b0101_0101;

/// The BitWise trainer screen: one row of bulbs plus the quiz played on it.
#[derive(Debug, Default)]
pub struct BulbBoard {
    bits: BitVector,
    order: BitOrder,
    session: QuizSession,
    feedback: Option<String>,
    /// Result of the last finished quiz, until it is logged or a new quiz starts
    last_result: Option<QuizResult>,
}

impl BulbBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bits(&self) -> &BitVector {
        &self.bits
    }

    pub fn order(&self) -> BitOrder {
        self.order
    }

    pub fn value(&self) -> u8 {
        value_of(&self.bits, self.order)
    }

    pub fn session(&self) -> &QuizSession {
        &self.session
    }

    pub fn feedback(&self) -> Option<&str> {
        self.feedback.as_deref()
    }

    pub fn last_result(&self) -> Option<QuizResult> {
        self.last_result
    }

    pub fn take_last_result(&mut self) -> Option<QuizResult> {
        self.last_result.take()
    }

    fn locked(&self) -> bool {
        self.session.is_running() && self.session.is_locked()
    }

    pub fn toggle_bit(&mut self, index: usize) -> bool {
        if self.locked() {
            return false;
        }
        self.bits.toggle(index)
    }

    pub fn clear(&mut self) -> bool {
        self.set_value(0)
    }

    /// Shows `value` on the bulbs (wrapped into a byte). No-op while locked.
    pub fn set_value(&mut self, value: i64) -> bool {
        if self.locked() {
            return false;
        }
        self.bits = bits_of(value, self.order);
        true
    }

    pub fn randomize<R: Rng + ?Sized>(&mut self, rng: &mut R) -> bool {
        let value = rng.gen_range(0..=255);
        self.set_value(value)
    }

    /// Flips the bit order, re-lighting the bulbs so the value stays the same.
    pub fn toggle_order(&mut self) {
        let value = self.value();
        self.order = self.order.flipped();
        self.bits = bits_of(value as i64, self.order);
    }

    pub fn start_quiz<R: Rng + ?Sized>(&mut self, rng: &mut R, now_ms: i64) {
        let bank = QuestionBank::new(rng);
        let questions = bank.draw(QUESTIONS_PER_QUIZ, rng);
        self.session.start(questions, now_ms);
        self.bits = BitVector::zeroed();
        self.feedback = None;
        self.last_result = None;
    }

    pub fn arm_timer(&mut self, timer: QuestionTimer) {
        self.session.arm_timer(timer);
    }

    pub fn tick(&mut self, question: usize) -> TickOutcome {
        let value = self.value();
        let outcome = self.session.tick(question, value);
        if let TickOutcome::Expired(check) = outcome {
            self.feedback = Some(check.message());
        }
        outcome
    }

    pub fn check(&mut self) -> bool {
        let value = self.value();
        match self.session.check(value) {
            Some(outcome) => {
                self.feedback = Some(outcome.message());
                true
            }
            None => false,
        }
    }

    pub fn next(&mut self, now_ms: i64) -> Option<NextOutcome> {
        let outcome = self.session.next(now_ms)?;
        match outcome {
            NextOutcome::Question(_) => {
                self.bits = BitVector::zeroed();
                self.feedback = None;
            }
            NextOutcome::Ended(result) => self.record_end(result),
        }
        Some(outcome)
    }

    pub fn end(&mut self, now_ms: i64) -> Option<QuizResult> {
        let result = self.session.end(now_ms)?;
        self.record_end(result);
        Some(result)
    }

    fn record_end(&mut self, result: QuizResult) {
        self.feedback = Some(format!(
            "Quiz complete. Score: {}/{}",
            result.score, result.total
        ));
        self.last_result = Some(result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn light(board: &mut BulbBoard, value: u8) {
        board.set_value(value as i64);
    }

    #[test]
    fn test_toggling_to_170_reads_170() {
        let mut board = BulbBoard::new();
        for i in [0, 2, 4, 6] {
            assert!(board.toggle_bit(i));
        }
        assert_eq!(board.value(), 170);
        assert_eq!(
            *board.bits(),
            BitVector::from_bits([true, false, true, false, true, false, true, false])
        );
    }

    #[test]
    fn test_order_toggle_keeps_value() {
        let mut board = BulbBoard::new();
        light(&mut board, 6);
        board.toggle_order();
        assert_eq!(board.order(), BitOrder::LsbFirst);
        assert_eq!(board.value(), 6);
        assert_eq!(board.bits().get(1), Some(true));
        assert_eq!(board.bits().get(2), Some(true));
    }

    #[test]
    fn test_locked_question_freezes_bulbs() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut board = BulbBoard::new();
        board.start_quiz(&mut rng, 0);
        assert!(board.check());

        assert!(!board.toggle_bit(0));
        assert!(!board.clear());
        assert!(!board.randomize(&mut rng));
        assert!(!board.set_value(PRESET_ALTERNATING_HIGH as i64));
        assert_eq!(board.value(), 0);
    }

    #[test]
    fn test_correct_answer_scores_and_next_clears() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut board = BulbBoard::new();
        light(&mut board, 99);
        board.start_quiz(&mut rng, 0);
        assert_eq!(board.value(), 0);

        let target = board.session().current_question().unwrap().target;
        light(&mut board, target);
        assert!(board.check());
        assert_eq!(board.session().score(), 1);
        assert!(board.feedback().unwrap().starts_with("✅ Correct!"));

        assert_eq!(board.next(1_000), Some(NextOutcome::Question(1)));
        assert_eq!(board.value(), 0);
        assert_eq!(board.feedback(), None);
    }

    #[test]
    fn test_full_quiz_leaves_result_to_log() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut board = BulbBoard::new();
        board.start_quiz(&mut rng, 0);

        let mut ended = None;
        for _ in 0..QUESTIONS_PER_QUIZ {
            board.check();
            if let Some(NextOutcome::Ended(result)) = board.next(30_000) {
                ended = Some(result);
            }
        }
        let result = ended.unwrap();
        assert_eq!(result.total, QUESTIONS_PER_QUIZ as u32);
        assert_eq!(result.duration_secs, 30);
        assert_eq!(
            board.feedback(),
            Some(format!("Quiz complete. Score: {}/5", result.score).as_str())
        );
        assert_eq!(board.take_last_result(), Some(result));
        assert_eq!(board.last_result(), None);

        // bulbs are free again once the quiz is over
        assert!(board.toggle_bit(3));
    }

    #[test]
    fn test_expiry_through_board_sets_feedback() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut board = BulbBoard::new();
        board.start_quiz(&mut rng, 0);
        let target = board.session().current_question().unwrap().target;

        let mut last = TickOutcome::Ignored;
        for _ in 0..crate::quiz::SECONDS_PER_QUESTION {
            last = board.tick(0);
        }
        assert!(matches!(last, TickOutcome::Expired(_)));
        assert_eq!(
            board.feedback(),
            Some(format!("⏰ Time! Answer: {:08b} ({})", target, target).as_str())
        );
    }
}
