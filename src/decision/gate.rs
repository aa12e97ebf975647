//! # Decision Gate
//!
//! Strict priority ladder, first match wins:
//!
//! 1. Writing guard: `is_writing == Some(true)` clears the projection. It
//!    overrides everything, pending answers included.
//! 2. Pending checks: every non-blank answer that was never checked, or was
//!    revised since its last check, is checked now. Never deferred.
//! 3. No active problem: stay silent.
//! 4. Dwell below the threshold: stay silent.
//! 5. Dwell at or above the threshold with no answer for the active problem:
//!    hint one level above the stored level. At level 3 nothing new is
//!    offered.
//! 6. Otherwise stay silent.

use crate::{
    perception::PerceptionSnapshot,
    session::history::{InteractionHistory, MAX_HINT_LEVEL},
};

use super::types::{
    DecisionConfig, REASON_DEFAULT, REASON_HINTS_EXHAUSTED, REASON_NO_ACTIVE, REASON_SHORT_DWELL,
    REASON_WRITING,
};

/// An answer waiting for verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingCheck {
    pub problem_id: String,
    pub answer: String,
}

/// Outcome of the gate.
#[derive(Debug, Clone, PartialEq)]
pub enum Gate {
    Clear { reason: &'static str },
    Check { pending: Vec<PendingCheck> },
    NoInteraction { reason: &'static str },
    Hint { problem_id: String, level: u8 },
}

/// Evaluate the priority ladder. Pure; no model call.
pub fn evaluate_gate(
    snapshot: &PerceptionSnapshot,
    history: &InteractionHistory,
    config: &DecisionConfig,
) -> Gate {
    if snapshot.is_writing_now() {
        return Gate::Clear {
            reason: REASON_WRITING,
        };
    }

    let pending = pending_checks(snapshot, history);
    if !pending.is_empty() {
        return Gate::Check { pending };
    }

    let Some(active) = snapshot.active_problem_id.as_deref() else {
        return Gate::NoInteraction {
            reason: REASON_NO_ACTIVE,
        };
    };

    if snapshot.dwell_seconds < config.dwell_threshold_secs {
        return Gate::NoInteraction {
            reason: REASON_SHORT_DWELL,
        };
    }

    if snapshot.answer(active).is_none() {
        let current = history.get(active).map_or(0, |entry| entry.hint_level);
        if current >= MAX_HINT_LEVEL {
            return Gate::NoInteraction {
                reason: REASON_HINTS_EXHAUSTED,
            };
        }
        return Gate::Hint {
            problem_id: active.to_string(),
            level: current + 1,
        };
    }

    Gate::NoInteraction {
        reason: REASON_DEFAULT,
    }
}

/// Answers that need verification, in problem id order.
pub fn pending_checks(
    snapshot: &PerceptionSnapshot,
    history: &InteractionHistory,
) -> Vec<PendingCheck> {
    snapshot
        .answered()
        .filter(|(id, answer)| history.get(*id).is_none_or(|entry| entry.needs_check(answer)))
        .map(|(id, answer)| PendingCheck {
            problem_id: id.to_string(),
            answer: answer.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::history::{HistoryEntry, LastAction};
    use chrono::Utc;

    fn snapshot(active: Option<&str>, dwell: f64, writing: Option<bool>) -> PerceptionSnapshot {
        let mut snapshot = PerceptionSnapshot::empty(Utc::now());
        snapshot.active_problem_id = active.map(str::to_string);
        snapshot.dwell_seconds = dwell;
        snapshot.is_writing = writing;
        snapshot
    }

    fn config() -> DecisionConfig {
        DecisionConfig::default()
    }

    #[test]
    fn test_writing_guard_beats_pending_check() {
        let mut s = snapshot(Some("p1"), 100.0, Some(true));
        s.answers.insert("p1".into(), "3x=9".into());
        assert_eq!(
            evaluate_gate(&s, &InteractionHistory::new(), &config()),
            Gate::Clear { reason: REASON_WRITING }
        );
    }

    #[test]
    fn test_unknown_writing_is_not_writing() {
        let s = snapshot(Some("p1"), 5.0, None);
        assert_eq!(
            evaluate_gate(&s, &InteractionHistory::new(), &config()),
            Gate::NoInteraction { reason: REASON_SHORT_DWELL }
        );
    }

    #[test]
    fn test_pending_check_ignores_dwell_and_focus() {
        let mut s = snapshot(None, 0.0, Some(false));
        s.answers.insert("p2".into(), "x=3".into());
        s.answers.insert("p1".into(), "  ".into());
        assert_eq!(
            evaluate_gate(&s, &InteractionHistory::new(), &config()),
            Gate::Check {
                pending: vec![PendingCheck {
                    problem_id: "p2".into(),
                    answer: "x=3".into()
                }]
            }
        );
    }

    #[test]
    fn test_checked_answer_not_pending() {
        let mut s = snapshot(Some("p1"), 5.0, Some(false));
        s.answers.insert("p1".into(), "x=3".into());
        let mut history = InteractionHistory::new();
        history.insert(
            "p1".into(),
            HistoryEntry {
                last_action: LastAction::CheckedCorrect,
                is_correct: Some(true),
                checked_answer: Some("x=3".into()),
                ..HistoryEntry::default()
            },
        );
        assert!(pending_checks(&s, &history).is_empty());

        s.answers.insert("p1".into(), "x=4".into());
        assert_eq!(pending_checks(&s, &history).len(), 1);
    }

    #[test]
    fn test_no_active_problem() {
        let s = snapshot(None, 100.0, Some(false));
        assert_eq!(
            evaluate_gate(&s, &InteractionHistory::new(), &config()),
            Gate::NoInteraction { reason: REASON_NO_ACTIVE }
        );
    }

    #[test]
    fn test_long_dwell_hints_next_level() {
        let s = snapshot(Some("p1"), 45.0, Some(false));
        let mut history = InteractionHistory::new();
        assert_eq!(
            evaluate_gate(&s, &history, &config()),
            Gate::Hint { problem_id: "p1".into(), level: 1 }
        );

        history.insert(
            "p1".into(),
            HistoryEntry {
                hint_level: 2,
                ..HistoryEntry::default()
            },
        );
        assert_eq!(
            evaluate_gate(&s, &history, &config()),
            Gate::Hint { problem_id: "p1".into(), level: 3 }
        );

        history.get_mut("p1").unwrap().hint_level = 3;
        assert_eq!(
            evaluate_gate(&s, &history, &config()),
            Gate::NoInteraction { reason: REASON_HINTS_EXHAUSTED }
        );
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let s = snapshot(Some("p1"), 30.0, Some(false));
        assert!(matches!(
            evaluate_gate(&s, &InteractionHistory::new(), &config()),
            Gate::Hint { level: 1, .. }
        ));
    }

    #[test]
    fn test_answered_active_problem_is_default() {
        let mut s = snapshot(Some("p1"), 45.0, Some(false));
        s.answers.insert("p1".into(), "x=3".into());
        let mut history = InteractionHistory::new();
        history.insert(
            "p1".into(),
            HistoryEntry {
                is_correct: Some(true),
                checked_answer: Some("x=3".into()),
                ..HistoryEntry::default()
            },
        );
        assert_eq!(
            evaluate_gate(&s, &history, &config()),
            Gate::NoInteraction { reason: REASON_DEFAULT }
        );
    }
}
