//! PlayerState aggregate - the per-player puzzle state machine.
//!
//! Two states: no puzzle in progress, or awaiting an answer to the pending
//! puzzle. A wrong answer never leaves the awaiting state; only a correct
//! answer (or an explicit reset) clears the pending puzzle.
//!
//! Selection randomness lives in the engine. This aggregate only enforces
//! what a selection must satisfy and how answers evolve the state.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::entities::Municipality;
use crate::error::DomainError;

/// Upper bound on the number of options shown for one puzzle.
pub const MAX_OPTIONS: usize = 10;

/// Running correctness counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub correct: u32,
    pub wrong: u32,
}

/// One multiple-choice question.
///
/// # Invariants
///
/// - `options` is non-empty, at most [`MAX_OPTIONS`] long and duplicate free
/// - `options` contains `correct_name` exactly once
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Puzzle {
    #[serde(rename = "image_url")]
    emblem_ref: String,
    #[serde(rename = "image_desc", default)]
    description: String,
    options: Vec<String>,
    #[serde(rename = "correct_answer")]
    correct_name: String,
    #[serde(rename = "wiki_url", default)]
    source_article_url: String,
}

impl Puzzle {
    /// Build a puzzle asking for `correct`, offering `options` in display order.
    pub fn new(correct: &Municipality, options: Vec<String>) -> Result<Self, DomainError> {
        if options.is_empty() || options.len() > MAX_OPTIONS {
            return Err(DomainError::validation(format!(
                "a puzzle needs 1..={MAX_OPTIONS} options, got {}",
                options.len()
            )));
        }

        let mut seen = HashSet::with_capacity(options.len());
        if let Some(dup) = options.iter().find(|o| !seen.insert(o.as_str())) {
            return Err(DomainError::validation(format!("duplicate option '{dup}'")));
        }
        if !seen.contains(correct.name()) {
            return Err(DomainError::validation(format!(
                "options do not contain the correct answer '{}'",
                correct.name()
            )));
        }

        Ok(Self {
            emblem_ref: correct.emblem_ref().to_string(),
            description: correct.description().to_string(),
            options,
            correct_name: correct.name().to_string(),
            source_article_url: correct.source_article_url().to_string(),
        })
    }

    #[inline]
    pub fn emblem_ref(&self) -> &str {
        &self.emblem_ref
    }

    #[inline]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[inline]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[inline]
    pub fn correct_name(&self) -> &str {
        &self.correct_name
    }

    #[inline]
    pub fn source_article_url(&self) -> &str {
        &self.source_article_url
    }
}

/// A past answer, one per distinct correct name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(rename = "image_url")]
    pub emblem_ref: String,
    #[serde(rename = "wiki_url", default)]
    pub source_article_url: String,
    #[serde(rename = "correct_answer")]
    pub correct_name: String,
    #[serde(rename = "user_answer", default)]
    pub submitted_name: String,
    #[serde(rename = "is_correct")]
    pub was_correct: bool,
}

/// Result of [`PlayerState::answer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerOutcome {
    pub is_correct: bool,
    pub correct_name: String,
}

/// Everything remembered about one player.
///
/// Serialized field names form the persisted player record:
/// `{correct, wrong, history, used_municipalities, current_puzzle?}`.
/// Missing fields default, so older or partial records still load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerState {
    #[serde(rename = "correct")]
    correct_count: u32,
    #[serde(rename = "wrong")]
    wrong_count: u32,
    history: Vec<HistoryEntry>,
    #[serde(rename = "used_municipalities")]
    used_names: Vec<String>,
    #[serde(rename = "current_puzzle", skip_serializing_if = "Option::is_none")]
    pending_puzzle: Option<Puzzle>,
}

impl PlayerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> Stats {
        Stats {
            correct: self.correct_count,
            wrong: self.wrong_count,
        }
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    /// Names already asked in the current cycle, in the order they were asked.
    pub fn used_names(&self) -> &[String] {
        &self.used_names
    }

    pub fn pending_puzzle(&self) -> Option<&Puzzle> {
        self.pending_puzzle.as_ref()
    }

    pub fn is_awaiting_answer(&self) -> bool {
        self.pending_puzzle.is_some()
    }

    /// Municipalities from `pool` not yet asked in this cycle.
    ///
    /// When every member of `pool` has been asked, the cycle restarts: the
    /// used set is cleared and the whole pool is returned.
    pub fn candidates<'a>(&mut self, pool: &'a [Municipality]) -> Vec<&'a Municipality> {
        let used: HashSet<&str> = self.used_names.iter().map(String::as_str).collect();
        let available: Vec<&Municipality> =
            pool.iter().filter(|m| !used.contains(m.name())).collect();

        if available.is_empty() {
            self.used_names.clear();
            return pool.iter().collect();
        }
        available
    }

    /// Make `puzzle` the pending puzzle and mark its answer as used.
    pub fn issue(&mut self, puzzle: Puzzle) -> Result<&Puzzle, DomainError> {
        if self.pending_puzzle.is_some() {
            return Err(DomainError::invalid_state_transition(
                "a puzzle is already awaiting an answer",
            ));
        }

        if !self.used_names.iter().any(|n| n == puzzle.correct_name()) {
            self.used_names.push(puzzle.correct_name().to_string());
        }
        Ok(&*self.pending_puzzle.insert(puzzle))
    }

    /// Score `submitted` against the pending puzzle.
    ///
    /// Comparison is exact and case-sensitive. A wrong answer keeps the same
    /// puzzle pending so it cannot be skipped.
    pub fn answer(&mut self, submitted: &str) -> Result<AnswerOutcome, DomainError> {
        let puzzle = self
            .pending_puzzle
            .as_ref()
            .ok_or(DomainError::NoPuzzlePending)?;

        let is_correct = submitted == puzzle.correct_name();
        let correct_name = puzzle.correct_name().to_string();

        if !self.history.iter().any(|h| h.correct_name == correct_name) {
            self.history.push(HistoryEntry {
                emblem_ref: puzzle.emblem_ref().to_string(),
                source_article_url: puzzle.source_article_url().to_string(),
                correct_name: correct_name.clone(),
                submitted_name: submitted.to_string(),
                was_correct: is_correct,
            });
        }

        if is_correct {
            self.correct_count = self.correct_count.saturating_add(1);
            self.pending_puzzle = None;
        } else {
            self.wrong_count = self.wrong_count.saturating_add(1);
        }

        Ok(AnswerOutcome {
            is_correct,
            correct_name,
        })
    }

    /// Back to a fresh player: zero stats, no history, no pending puzzle.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
