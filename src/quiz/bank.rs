use rand::seq::SliceRandom;
use rand::Rng;

use crate::quiz::{Question, QuestionKind};

pub const BANK_SIZE: usize = 20;

const DECIMAL_POOL: [u8; 20] = [
    5, 10, 13, 17, 21, 31, 32, 42, 64, 65, 73, 85, 97, 100, 113, 127, 128, 150, 170, 200,
];
const DECIMAL_PICKS: usize = 12;

const CHARACTER_POOL: [char; 25] = [
    'A', 'C', 'E', 'H', 'I', 'J', 'K', 'L', 'N', 'O', 'R', 'S', 'T', 'Z', 'a', 'e', 'i', 'o',
    'u', '0', '1', '2', '5', '8', '?',
];
const CHARACTER_PICKS: usize = 8;

// Filler questions draw from here if the fixed picks fall short
const PRINTABLE_POOL: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789?! ";

/// The 20 questions a quiz is drawn from.
#[derive(Debug, Clone)]
pub struct QuestionBank {
    pub questions: Vec<Question>,
}

impl QuestionBank {
    pub fn new<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::from_pools(
            &DECIMAL_POOL[..DECIMAL_PICKS],
            &CHARACTER_POOL[..CHARACTER_PICKS],
            rng,
        )
    }

    fn from_pools<R: Rng + ?Sized>(decimals: &[u8], characters: &[char], rng: &mut R) -> Self {
        let mut questions: Vec<Question> = Vec::with_capacity(BANK_SIZE);

        for (i, n) in decimals.iter().enumerate() {
            questions.push(Question::decimal(format!("D{}-{}", i, n), *n));
        }
        for (i, ch) in characters.iter().enumerate() {
            questions.push(Question::character(format!("A{}-{}", i, ch), *ch));
        }

        let printable: Vec<char> = PRINTABLE_POOL.chars().collect();
        while questions.len() < BANK_SIZE {
            let ch = printable[rng.gen_range(0..printable.len())];
            let id = format!("R-{}-{}", questions.len(), ch);
            questions.push(Question::character(id, ch));
        }
        questions.truncate(BANK_SIZE);

        Self { questions }
    }

    /// Shuffles a copy of the bank and keeps the first `count` questions.
    pub fn draw<R: Rng + ?Sized>(&self, count: usize, rng: &mut R) -> Vec<Question> {
        let mut pool = self.questions.clone();
        pool.shuffle(rng);
        pool.truncate(count);
        log::debug!(
            "Drew quiz: {:?}",
            pool.iter().map(|q| q.id.as_str()).collect::<Vec<_>>()
        );
        pool
    }
}
