//! Road-trip trivia.
//!
//! The deck is shuffled once and dealt one question at a time. Answers match
//! the correct choice by text (case-insensitive) or by its letter ("b").

use rand::seq::SliceRandom;
use rand::Rng;

use crate::game::types::TriviaQuestion;

/// Points for a correct answer unless the question says otherwise.
pub const DEFAULT_TRIVIA_POINTS: u32 = 3;

const BANK: &[(&str, &[&str], &str)] = &[
    (
        "How many stomachs does a cow have?",
        &["One", "Two", "Four"],
        "One",
    ),
    (
        "What do you call a group of cows?",
        &["A herd", "A flock", "A pack"],
        "A herd",
    ),
    (
        "Roughly how many gallons of water does a cow drink a day?",
        &["5", "30", "100"],
        "30",
    ),
    (
        "Which US state is nicknamed the Dairy State?",
        &["Texas", "Wisconsin", "Ohio"],
        "Wisconsin",
    ),
    (
        "What is the tallest part of most churches called?",
        &["Steeple", "Nave", "Apse"],
        "Steeple",
    ),
    (
        "Why are water towers built up high?",
        &["Gravity gives water pressure", "To keep it cold", "To hide it from birds"],
        "Gravity gives water pressure",
    ),
    (
        "How many colours are in a rainbow?",
        &["Five", "Seven", "Nine"],
        "Seven",
    ),
    (
        "What colour is a stop sign in the United States?",
        &["Red", "Yellow", "Blue"],
        "Red",
    ),
    (
        "What is a baby cow called?",
        &["Foal", "Calf", "Kid"],
        "Calf",
    ),
    (
        "Which breed of cow is black and white?",
        &["Jersey", "Holstein", "Hereford"],
        "Holstein",
    ),
];

/// The built-in questions.
pub fn question_bank() -> Vec<TriviaQuestion> {
    BANK.iter()
        .map(|(prompt, choices, answer)| TriviaQuestion {
            prompt: prompt.to_string(),
            choices: choices.iter().map(|c| c.to_string()).collect(),
            answer: answer.to_string(),
            points: DEFAULT_TRIVIA_POINTS,
        })
        .collect()
}

/// Whether `answer` is right for `question`.
pub fn check_answer(question: &TriviaQuestion, answer: &str) -> bool {
    let given = answer.trim();
    if given.eq_ignore_ascii_case(question.answer.trim()) {
        return true;
    }
    let mut chars = given.chars();
    let (Some(letter), None) = (chars.next(), chars.next()) else {
        return false;
    };
    let letter = letter.to_ascii_lowercase();
    if !letter.is_ascii_lowercase() {
        return false;
    }
    let idx = (letter as u8 - b'a') as usize;
    question
        .choices
        .get(idx)
        .is_some_and(|choice| choice.eq_ignore_ascii_case(question.answer.trim()))
}

/// A shuffled stack of questions with one face up.
#[derive(Debug, Clone, Default)]
pub struct TriviaDeck {
    pending: Vec<TriviaQuestion>,
    current: Option<TriviaQuestion>,
}

impl TriviaDeck {
    pub fn shuffled<R: Rng + ?Sized>(rng: &mut R, mut questions: Vec<TriviaQuestion>) -> Self {
        questions.shuffle(rng);
        let mut deck = Self {
            pending: questions,
            current: None,
        };
        deck.advance();
        deck
    }

    /// Deck with a fixed order, first question face up.
    pub fn in_order(mut questions: Vec<TriviaQuestion>) -> Self {
        questions.reverse();
        let mut deck = Self {
            pending: questions,
            current: None,
        };
        deck.advance();
        deck
    }

    pub fn current(&self) -> Option<&TriviaQuestion> {
        self.current.as_ref()
    }

    /// Discard the face-up question and turn over the next one.
    pub fn advance(&mut self) -> Option<&TriviaQuestion> {
        self.current = self.pending.pop();
        self.current.as_ref()
    }

    pub fn remaining(&self) -> usize {
        self.pending.len() + usize::from(self.current.is_some())
    }
}
