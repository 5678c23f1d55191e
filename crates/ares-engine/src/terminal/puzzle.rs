//! One code-breaking puzzle: ten candidate codes, a partly masked sequence,
//! and an attempt budget.

use ares_mechanics::CodeGenerator;
use rand::rngs::StdRng;
use rand::seq::{IndexedRandom, SliceRandom, index};

use crate::actor::UserId;
use crate::error::{EngineError, EngineResult, check_range};

/// Number of candidate codes on every terminal.
pub const ANSWER_COUNT: usize = 10;

/// Shown in place of a masked digit.
pub const PLACEHOLDER: char = '?';

/// What picking an answer does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerKind {
    /// Opens the terminal.
    Correct,
    /// Costs one attempt.
    Incorrect,
    /// Costs two attempts and triggers ICE damage.
    Virus,
}

impl AnswerKind {
    /// Attempts lost when this answer is picked.
    pub fn cost(self) -> u32 {
        match self {
            Self::Correct => 0,
            Self::Incorrect => 1,
            Self::Virus => 2,
        }
    }
}

/// One candidate code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    /// Uppercase hex code.
    pub value: String,
    /// Effect of picking it.
    pub kind: AnswerKind,
}

/// Creation parameters of a terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PuzzleParams {
    /// Code length in hex digits.
    pub difficulty: u32,
    /// Digits of the correct code masked in the sequence.
    pub unknowns: u32,
    /// Near-miss codes among the answers.
    pub viruses: u32,
    /// Starting attempt budget.
    pub attempts: u32,
}

impl Default for PuzzleParams {
    fn default() -> Self {
        Self {
            difficulty: 8,
            unknowns: 4,
            viruses: 1,
            attempts: 2,
        }
    }
}

impl PuzzleParams {
    /// Set the code length.
    pub fn with_difficulty(mut self, difficulty: u32) -> Self {
        self.difficulty = difficulty;
        self
    }

    /// Set the number of masked digits.
    pub fn with_unknowns(mut self, unknowns: u32) -> Self {
        self.unknowns = unknowns;
        self
    }

    /// Set the number of virus codes.
    pub fn with_viruses(mut self, viruses: u32) -> Self {
        self.viruses = viruses;
        self
    }

    /// Set the attempt budget.
    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts;
        self
    }

    /// Check every parameter against its allowed range.
    pub fn validate(&self) -> EngineResult<()> {
        check_range("difficulty", self.difficulty.into(), 2, 16)?;
        check_range(
            "unknowns",
            self.unknowns.into(),
            0,
            i64::from(self.difficulty) - 1,
        )?;
        check_range("viruses", self.viruses.into(), 0, 9)?;
        check_range("attempts", self.attempts.into(), 1, 9)?;
        Ok(())
    }
}

/// A live terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminalPuzzle {
    assigned: Option<UserId>,
    attempts: u32,
    question: Vec<char>,
    answers: Vec<Answer>,
}

impl TerminalPuzzle {
    /// Generate a puzzle.
    ///
    /// Every code shares one random leading digit. Virus codes differ from
    /// the correct code in a single later digit. The leading digit of the
    /// sequence is never masked.
    pub fn generate(
        assigned: Option<UserId>,
        params: PuzzleParams,
        rng: &mut StdRng,
    ) -> EngineResult<Self> {
        params.validate()?;
        let length = params.difficulty as usize;
        let mut codes = CodeGenerator::new(length, rng)?;

        let correct = codes.next_code(rng)?;
        let mut answers = Vec::with_capacity(ANSWER_COUNT);
        answers.push(Answer {
            value: correct.clone(),
            kind: AnswerKind::Correct,
        });
        for _ in 0..params.viruses {
            answers.push(Answer {
                value: codes.next_variant(&correct, rng)?,
                kind: AnswerKind::Virus,
            });
        }
        while answers.len() < ANSWER_COUNT {
            answers.push(Answer {
                value: codes.next_code(rng)?,
                kind: AnswerKind::Incorrect,
            });
        }
        answers.shuffle(rng);

        let mut question: Vec<char> = correct.chars().collect();
        for offset in index::sample(rng, length - 1, params.unknowns as usize) {
            question[offset + 1] = PLACEHOLDER;
        }

        Ok(Self {
            assigned,
            attempts: params.attempts,
            question,
            answers,
        })
    }

    /// The only user allowed to act on this terminal, if any.
    pub fn assigned(&self) -> Option<UserId> {
        self.assigned
    }

    /// Attempts left before lockout.
    pub fn attempts_remaining(&self) -> u32 {
        self.attempts
    }

    /// The correct code with masked digits replaced by [`PLACEHOLDER`].
    pub fn question(&self) -> String {
        self.question.iter().collect()
    }

    /// Candidate codes in display order.
    pub fn answers(&self) -> &[Answer] {
        &self.answers
    }

    /// Slot of the correct answer.
    pub fn correct_index(&self) -> usize {
        self.answers
            .iter()
            .position(|a| a.kind == AnswerKind::Correct)
            .unwrap_or_default()
    }

    /// The correct code.
    pub fn correct_code(&self) -> &str {
        &self.answers[self.correct_index()].value
    }

    /// Positions of the sequence still masked.
    pub fn masked_positions(&self) -> Vec<usize> {
        self.question
            .iter()
            .enumerate()
            .filter(|(_, c)| **c == PLACEHOLDER)
            .map(|(i, _)| i)
            .collect()
    }

    /// Fail unless `caller` may act on this terminal.
    pub fn check_hacker(&self, caller: UserId) -> EngineResult<()> {
        match self.assigned {
            Some(expected) if expected != caller => Err(EngineError::WrongHacker { expected }),
            _ => Ok(()),
        }
    }

    /// Pick answer `index` and charge its cost.
    pub fn guess(&mut self, index: usize) -> EngineResult<AnswerKind> {
        let kind = self
            .answers
            .get(index)
            .map(|a| a.kind)
            .ok_or(EngineError::AnswerOutOfRange {
                index,
                max: ANSWER_COUNT - 1,
            })?;
        self.attempts = self.attempts.saturating_sub(kind.cost());
        Ok(kind)
    }

    /// Unmask one random digit for one attempt, returning its position.
    ///
    /// Refused on the last attempt, so revealing never locks a terminal.
    pub fn reveal_one(&mut self, rng: &mut StdRng) -> EngineResult<usize> {
        if self.attempts <= 1 {
            return Err(EngineError::CannotReveal);
        }
        let masked = self.masked_positions();
        let position = *masked.choose(rng).ok_or(EngineError::NothingToReveal)?;
        let digit = self.correct_code().chars().nth(position);
        if let Some(digit) = digit {
            self.question[position] = digit;
        }
        self.attempts -= 1;
        Ok(position)
    }
}
