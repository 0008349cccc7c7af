pub mod bank;
pub mod board;
pub mod timer;

use serde::{Deserialize, Serialize};

use crate::bits::binary_string;
use timer::QuestionTimer;

pub const QUESTIONS_PER_QUIZ: usize = 5;
pub const SECONDS_PER_QUESTION: u32 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuestionKind {
    Decimal,
    Ascii,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub target: u8,
    pub label: String,
    pub kind: QuestionKind,
}

impl Question {
    pub fn decimal(id: String, target: u8) -> Self {
        Self {
            id,
            target,
            label: format!("DEC {}", target),
            kind: QuestionKind::Decimal,
        }
    }

    /// A character question targets the low byte of the character's code point.
    pub fn character(id: String, ch: char) -> Self {
        Self {
            id,
            target: (ch as u32 & 0xff) as u8,
            label: format!("ASCII '{}'", ch),
            kind: QuestionKind::Ascii,
        }
    }

    pub fn prompt(&self) -> String {
        match self.kind {
            QuestionKind::Decimal => format!("Set bulbs to show {}", self.label),
            QuestionKind::Ascii => {
                format!("Set bulbs to show {} (DEC {})", self.label, self.target)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Correct,
    Incorrect,
    TimeExpired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckOutcome {
    pub verdict: Verdict,
    pub target: u8,
}

impl CheckOutcome {
    pub fn message(&self) -> String {
        let answer = binary_string(self.target);
        match self.verdict {
            Verdict::Correct => format!("✅ Correct! ({} = {})", answer, self.target),
            Verdict::Incorrect => format!("❌ Not quite. Answer: {} ({})", answer, self.target),
            Verdict::TimeExpired => format!("⏰ Time! Answer: {} ({})", answer, self.target),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The tick did not apply: no running question, already locked, or the
    /// tick belongs to a question that has been left behind.
    Ignored,
    Counting(u32),
    Expired(CheckOutcome),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextOutcome {
    Question(usize),
    Ended(QuizResult),
}

/// Final numbers of a finished quiz, kept until the learner logs them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizResult {
    pub score: u32,
    pub total: u32,
    pub duration_secs: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum QuizState {
    #[default]
    Idle,
    Running,
    Ended,
}

/// A timed quiz over a fixed list of questions.
///
/// Each question starts unlocked with a full countdown. A check (by the
/// learner, or forced when the countdown runs out) locks it; only then can
/// the quiz move on. Every transition that closes the unlocked window cancels
/// the armed countdown.
#[derive(Debug, Default)]
pub struct QuizSession {
    questions: Vec<Question>,
    index: usize,
    score: u32,
    time_left: u32,
    locked: bool,
    expired: bool,
    state: QuizState,
    started_at_ms: i64,
    ended_at_ms: Option<i64>,
    timer: Option<QuestionTimer>,
}

impl QuizSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, questions: Vec<Question>, now_ms: i64) {
        self.cancel_timer();
        log::debug!("Quiz started with {} questions", questions.len());
        *self = Self {
            questions,
            time_left: SECONDS_PER_QUESTION,
            state: QuizState::Running,
            started_at_ms: now_ms,
            ..Self::default()
        };
        if self.questions.is_empty() {
            self.finish(now_ms);
        }
    }

    pub fn state(&self) -> QuizState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == QuizState::Running
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn total(&self) -> usize {
        self.questions.len()
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn time_left(&self) -> u32 {
        self.time_left
    }

    pub fn current_question(&self) -> Option<&Question> {
        match self.state {
            QuizState::Running => self.questions.get(self.index),
            _ => None,
        }
    }

    /// Hands the countdown task of the current question to the session.
    ///
    /// A timer for any other question, or one offered while the question is
    /// not answerable, is cancelled right away.
    pub fn arm_timer(&mut self, timer: QuestionTimer) {
        if !self.is_running() || self.locked || timer.question() != self.index {
            timer.cancel();
            return;
        }
        self.cancel_timer();
        self.timer = Some(timer);
    }

    /// One second passes on `question`, whose current value is `value`.
    pub fn tick(&mut self, question: usize, value: u8) -> TickOutcome {
        if !self.is_running() || self.locked || question != self.index {
            return TickOutcome::Ignored;
        }
        self.time_left = self.time_left.saturating_sub(1);
        if self.time_left > 0 {
            return TickOutcome::Counting(self.time_left);
        }

        // The countdown task is the caller here, let it finish its render
        if let Some(timer) = self.timer.take() {
            timer.detach();
        }
        self.expired = true;
        match self.check(value) {
            Some(outcome) => TickOutcome::Expired(outcome),
            None => TickOutcome::Ignored,
        }
    }

    /// Locks the current question and scores it. `None` if there is nothing to check.
    pub fn check(&mut self, value: u8) -> Option<CheckOutcome> {
        if self.locked {
            return None;
        }
        let target = self.current_question()?.target;
        self.cancel_timer();
        self.locked = true;

        let verdict = if self.expired {
            Verdict::TimeExpired
        } else if value == target {
            self.score += 1;
            Verdict::Correct
        } else {
            Verdict::Incorrect
        };
        log::debug!(
            "Question {} checked: {:?} (value {}, target {})",
            self.index,
            verdict,
            value,
            target
        );
        Some(CheckOutcome { verdict, target })
    }

    /// Moves past a locked question. `None` while the question is still open.
    pub fn next(&mut self, now_ms: i64) -> Option<NextOutcome> {
        if !self.is_running() || !self.locked {
            return None;
        }
        if self.index + 1 >= self.questions.len() {
            return self.finish(now_ms).map(NextOutcome::Ended);
        }
        self.index += 1;
        self.locked = false;
        self.expired = false;
        self.time_left = SECONDS_PER_QUESTION;
        Some(NextOutcome::Question(self.index))
    }

    /// Stops a running quiz early, keeping the score so far.
    pub fn end(&mut self, now_ms: i64) -> Option<QuizResult> {
        if !self.is_running() {
            return None;
        }
        self.finish(now_ms)
    }

    pub fn result(&self) -> Option<QuizResult> {
        if self.state != QuizState::Ended {
            return None;
        }
        let ended_at = self.ended_at_ms.unwrap_or(self.started_at_ms);
        let elapsed_ms = (ended_at - self.started_at_ms).max(0) as u64;
        Some(QuizResult {
            score: self.score,
            total: self.questions.len() as u32,
            duration_secs: ((elapsed_ms + 500) / 1000).max(1),
        })
    }

    fn finish(&mut self, now_ms: i64) -> Option<QuizResult> {
        self.cancel_timer();
        self.state = QuizState::Ended;
        self.locked = false;
        self.ended_at_ms = Some(now_ms);
        let result = self.result();
        log::debug!("Quiz ended: {:?}", result);
        result
    }

    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn questions() -> Vec<Question> {
        vec![
            Question::character("A0-A".to_string(), 'A'),
            Question::decimal("D0-5".to_string(), 5),
            Question::decimal("D8-64".to_string(), 64),
            Question::character("A1-C".to_string(), 'C'),
            Question::decimal("D11-85".to_string(), 85),
        ]
    }

    fn running() -> QuizSession {
        let mut session = QuizSession::new();
        session.start(questions(), 1_000);
        session
    }

    #[test]
    fn test_start_resets_everything() {
        let mut session = running();
        session.check(65);
        session.next(2_000);
        session.check(0);

        session.start(questions(), 10_000);
        assert_eq!(session.state(), QuizState::Running);
        assert_eq!(session.score(), 0);
        assert_eq!(session.index(), 0);
        assert!(!session.is_locked());
        assert_eq!(session.time_left(), SECONDS_PER_QUESTION);
    }

    #[test]
    fn test_matching_check_scores_once() {
        let mut session = running();
        let outcome = session.check(65).unwrap();
        assert_eq!(outcome.verdict, Verdict::Correct);
        assert_eq!(session.score(), 1);
        assert!(session.is_locked());

        // locked: a second check changes nothing
        assert_eq!(session.check(65), None);
        assert_eq!(session.score(), 1);
    }

    #[test]
    fn test_wrong_check_locks_without_score() {
        let mut session = running();
        let outcome = session.check(64).unwrap();
        assert_eq!(outcome.verdict, Verdict::Incorrect);
        assert_eq!(outcome.message(), "❌ Not quite. Answer: 01000001 (65)");
        assert_eq!(session.score(), 0);
        assert!(session.is_locked());
    }

    #[test]
    fn test_timeout_with_all_bulbs_off() {
        let mut session = running();
        for left in (1..SECONDS_PER_QUESTION).rev() {
            assert_eq!(session.tick(0, 0), TickOutcome::Counting(left));
        }
        match session.tick(0, 0) {
            TickOutcome::Expired(outcome) => {
                assert_eq!(outcome.verdict, Verdict::TimeExpired);
                assert_eq!(outcome.message(), "⏰ Time! Answer: 01000001 (65)");
            }
            other => panic!("expected expiry, got {:?}", other),
        }
        assert_eq!(session.score(), 0);
        assert!(session.is_locked());
        assert_eq!(session.tick(0, 0), TickOutcome::Ignored);
    }

    #[test]
    fn test_timeout_never_scores_even_on_match() {
        let mut session = running();
        for _ in 0..SECONDS_PER_QUESTION - 1 {
            session.tick(0, 65);
        }
        let outcome = session.tick(0, 65);
        assert!(matches!(
            outcome,
            TickOutcome::Expired(CheckOutcome {
                verdict: Verdict::TimeExpired,
                target: 65
            })
        ));
        assert_eq!(session.score(), 0);
    }

    #[test]
    fn test_stale_tick_is_ignored() {
        let mut session = running();
        session.check(65);
        session.next(2_000);
        assert_eq!(session.tick(0, 0), TickOutcome::Ignored);
        assert_eq!(session.time_left(), SECONDS_PER_QUESTION);
        assert_eq!(session.tick(1, 0), TickOutcome::Counting(SECONDS_PER_QUESTION - 1));
    }

    #[test]
    fn test_next_requires_a_locked_question() {
        let mut session = running();
        assert_eq!(session.next(2_000), None);
        assert_eq!(session.index(), 0);

        session.check(1);
        assert_eq!(session.next(2_000), Some(NextOutcome::Question(1)));
        assert!(!session.is_locked());
        assert_eq!(session.time_left(), SECONDS_PER_QUESTION);
    }

    #[test]
    fn test_next_after_last_question_ends_quiz() {
        let mut session = running();
        let targets = [65, 5, 64, 67, 0];
        for (i, target) in targets.iter().enumerate() {
            assert_eq!(session.index(), i);
            session.check(*target);
            let outcome = session.next(1_000 + 7_400).unwrap();
            if i < 4 {
                assert_eq!(outcome, NextOutcome::Question(i + 1));
            } else {
                assert_eq!(
                    outcome,
                    NextOutcome::Ended(QuizResult {
                        score: 4,
                        total: 5,
                        duration_secs: 7,
                    })
                );
            }
        }
        assert_eq!(session.state(), QuizState::Ended);
        assert_eq!(session.current_question(), None);
        assert_eq!(session.check(0), None);
        assert_eq!(session.next(9_000), None);
    }

    #[test]
    fn test_end_keeps_score() {
        let mut session = running();
        session.check(65);
        session.next(2_000);
        let result = session.end(1_200).unwrap();
        assert_eq!(result.score, 1);
        assert_eq!(result.total, 5);
        // never reported as zero seconds
        assert_eq!(result.duration_secs, 1);
        assert_eq!(session.end(3_000), None);
        assert_eq!(session.result(), Some(result));
    }

    #[test]
    fn test_idle_session_ignores_everything() {
        let mut session = QuizSession::new();
        assert_eq!(session.state(), QuizState::Idle);
        assert_eq!(session.tick(0, 0), TickOutcome::Ignored);
        assert_eq!(session.check(0), None);
        assert_eq!(session.next(0), None);
        assert_eq!(session.end(0), None);
        assert_eq!(session.result(), None);
    }

    #[test]
    fn test_prompts() {
        let q = Question::decimal("D7-42".to_string(), 42);
        assert_eq!(q.prompt(), "Set bulbs to show DEC 42");
        let q = Question::character("A2-E".to_string(), 'E');
        assert_eq!(q.prompt(), "Set bulbs to show ASCII 'E' (DEC 69)");
    }

    #[tokio::test]
    async fn test_check_cancels_armed_timer() {
        let (tx, mut rx) = tokio::sync::mpsc::channel::<()>(1);
        let handle = tokio::spawn(async move {
            let _tx = tx;
            std::future::pending::<()>().await;
        });

        let mut session = running();
        session.arm_timer(QuestionTimer::new(0, handle));
        session.check(65);

        // the task was aborted, so its sender is gone
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_timer_for_another_question_is_cancelled() {
        let (tx, mut rx) = tokio::sync::mpsc::channel::<()>(1);
        let handle = tokio::spawn(async move {
            let _tx = tx;
            std::future::pending::<()>().await;
        });

        let mut session = running();
        session.arm_timer(QuestionTimer::new(3, handle));
        assert!(rx.recv().await.is_none());
    }
}
