//! # Interaction History
//!
//! One entry per problem id recording what the tutor has already told the
//! student. The merge contract here is what stops duplicate and oscillating
//! announcements: a proposal is applied only when it is a genuine change.
//!
//! | Proposal | Applied when |
//! |----------|--------------|
//! | hint at level `n` | `n` is above the stored level (levels cap at 3) |
//! | check result | the problem was never checked, or correctness flipped |
//!
//! A check that repeats the stored correctness is not announced. It only
//! refreshes the answer text the stored verdict refers to, so a later
//! revision of that text can be recognised.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::text::truncate_chars;

/// Highest hint level; hints never go past it.
pub const MAX_HINT_LEVEL: u8 = 3;

/// Error explanations are kept to this many characters.
pub const MAX_EXPLANATION_CHARS: usize = 15;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LastAction {
    #[default]
    None,
    HintGiven,
    CheckedCorrect,
    CheckedIncorrect,
}

impl LastAction {
    pub fn is_check(self) -> bool {
        matches!(self, Self::CheckedCorrect | Self::CheckedIncorrect)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProblemStatus {
    #[default]
    InProgress,
    NeedsCorrection,
    Completed,
}

/// What has been delivered for one problem.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HistoryEntry {
    /// 0-3, never decreases
    pub hint_level: u8,
    pub last_action: LastAction,
    pub status: ProblemStatus,
    pub last_action_at: Option<DateTime<Utc>>,
    /// Correctness from the most recent check
    pub is_correct: Option<bool>,
    pub error_explanation: Option<String>,
    /// Answer text the most recent check judged
    pub checked_answer: Option<String>,
}

impl HistoryEntry {
    /// True once any check result has been recorded.
    pub fn is_checked(&self) -> bool {
        self.is_correct.is_some()
    }

    /// Whether `answer` still needs a check: never checked, or revised since.
    pub fn needs_check(&self, answer: &str) -> bool {
        match (&self.is_correct, &self.checked_answer) {
            (None, _) => true,
            (Some(_), Some(checked)) => checked.trim() != answer.trim(),
            // Judged text unknown: the recorded result stands.
            (Some(_), None) => false,
        }
    }
}

pub type InteractionHistory = BTreeMap<String, HistoryEntry>;

/// A proposed change to one history entry.
#[derive(Debug, Clone, PartialEq)]
pub enum HistoryUpdate {
    HintGiven {
        problem_id: String,
        level: u8,
        at: DateTime<Utc>,
    },
    Checked {
        problem_id: String,
        is_correct: bool,
        explanation: Option<String>,
        answer: String,
        at: DateTime<Utc>,
    },
}

impl HistoryUpdate {
    pub fn problem_id(&self) -> &str {
        match self {
            Self::HintGiven { problem_id, .. } | Self::Checked { problem_id, .. } => problem_id,
        }
    }
}

/// How a proposal was treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// A genuine change, recorded and announced
    Applied,
    /// Same verdict on the same problem; bookkeeping only
    Refreshed,
    /// Not a change; ignored
    Dropped,
}

/// Decide what merging `update` onto `entry` would do, without doing it.
pub fn classify_update(entry: Option<&HistoryEntry>, update: &HistoryUpdate) -> MergeOutcome {
    match update {
        HistoryUpdate::HintGiven { level, .. } => {
            let current = entry.map_or(0, |e| e.hint_level);
            if (*level).min(MAX_HINT_LEVEL) > current {
                MergeOutcome::Applied
            } else {
                MergeOutcome::Dropped
            }
        }
        HistoryUpdate::Checked {
            is_correct, answer, ..
        } => match entry.and_then(|e| e.is_correct.map(|stored| (e, stored))) {
            None => MergeOutcome::Applied,
            Some((_, stored)) if stored != *is_correct => MergeOutcome::Applied,
            Some((e, _)) if e.checked_answer.as_deref() == Some(answer.trim()) => {
                MergeOutcome::Dropped
            }
            Some(_) => MergeOutcome::Refreshed,
        },
    }
}

/// Merge one proposal into the table.
pub fn merge_update(history: &mut InteractionHistory, update: &HistoryUpdate) -> MergeOutcome {
    let outcome = classify_update(history.get(update.problem_id()), update);
    if outcome == MergeOutcome::Dropped {
        return outcome;
    }

    let entry = history.entry(update.problem_id().to_string()).or_default();
    match (update, outcome) {
        (HistoryUpdate::HintGiven { level, at, .. }, MergeOutcome::Applied) => {
            entry.hint_level = (*level).min(MAX_HINT_LEVEL);
            entry.last_action = LastAction::HintGiven;
            entry.last_action_at = Some(*at);
        }
        (
            HistoryUpdate::Checked {
                is_correct,
                explanation,
                answer,
                at,
                ..
            },
            MergeOutcome::Applied,
        ) => {
            let (action, status) = if *is_correct {
                (LastAction::CheckedCorrect, ProblemStatus::Completed)
            } else {
                (LastAction::CheckedIncorrect, ProblemStatus::NeedsCorrection)
            };
            entry.last_action = action;
            entry.status = status;
            entry.is_correct = Some(*is_correct);
            entry.error_explanation = if *is_correct {
                None
            } else {
                explanation
                    .as_deref()
                    .map(str::trim)
                    .filter(|text| !text.is_empty())
                    .map(|text| truncate_chars(text, MAX_EXPLANATION_CHARS))
            };
            entry.checked_answer = Some(answer.trim().to_string());
            entry.last_action_at = Some(*at);
        }
        (HistoryUpdate::Checked { answer, .. }, MergeOutcome::Refreshed) => {
            entry.checked_answer = Some(answer.trim().to_string());
        }
        _ => {}
    }
    outcome
}
