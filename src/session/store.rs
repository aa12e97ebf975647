//! # Session State Store
//!
//! Single owner of the three session tables. Each table sits behind its
//! own lock; every method takes exactly one lock, copies out or applies a
//! change, and releases it. No method holds two locks at once, so neither
//! the render loop nor the analysis task can deadlock against the other.
//!
//! A poisoned lock is recovered rather than propagated: the tables hold
//! plain values that are replaced whole, never left half-written.

use std::sync::{Mutex, MutexGuard};

use super::history::{HistoryUpdate, InteractionHistory, MergeOutcome, merge_update};
use crate::{decision::Decision, decision::Verdict, perception::PerceptionSnapshot};

/// Copy of everything the render planner needs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionView {
    pub perception: Option<PerceptionSnapshot>,
    pub history: InteractionHistory,
    pub decision: Option<Decision>,
}

#[derive(Debug, Default)]
pub struct SessionStore {
    perception: Mutex<Option<PerceptionSnapshot>>,
    history: Mutex<InteractionHistory>,
    decision: Mutex<Option<Decision>>,
    feedback: Mutex<Option<String>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn perception_snapshot(&self) -> Option<PerceptionSnapshot> {
        lock(&self.perception).clone()
    }

    pub fn commit_perception(&self, snapshot: PerceptionSnapshot) {
        *lock(&self.perception) = Some(snapshot);
    }

    pub fn history_snapshot(&self) -> InteractionHistory {
        lock(&self.history).clone()
    }

    /// Merge proposals through the history contract, in order.
    pub fn commit_history(&self, updates: &[HistoryUpdate]) -> Vec<MergeOutcome> {
        let mut history = lock(&self.history);
        updates
            .iter()
            .map(|update| merge_update(&mut history, update))
            .collect()
    }

    pub fn current_decision(&self) -> Option<Decision> {
        lock(&self.decision).clone()
    }

    pub fn commit_decision(&self, decision: Decision) {
        *lock(&self.decision) = Some(decision);
    }

    /// Note from the last verification call for the next perception call.
    pub fn perception_feedback(&self) -> Option<String> {
        lock(&self.feedback).clone()
    }

    /// Apply a decision pass. History changes land before the decision that
    /// announces them, so a render never shows a check mark the history
    /// does not hold.
    pub fn apply_verdict(&self, verdict: Verdict) -> Vec<MergeOutcome> {
        match verdict {
            Verdict::Decided {
                decision,
                updates,
                feedback,
            } => {
                let outcomes = self.commit_history(&updates);
                self.commit_decision(decision);
                self.set_feedback(feedback);
                outcomes
            }
            Verdict::Silent { updates, feedback } => {
                let outcomes = self.commit_history(&updates);
                self.set_feedback(feedback);
                outcomes
            }
            Verdict::Failed(_) => Vec::new(),
        }
    }

    fn set_feedback(&self, feedback: Option<String>) {
        if feedback.is_some() {
            *lock(&self.feedback) = feedback;
        }
    }

    /// Consistent-enough copy of all tables for one render tick.
    ///
    /// Tables are read one after another, never nested; a commit landing in
    /// between is picked up on the next tick.
    pub fn view(&self) -> SessionView {
        let perception = self.perception_snapshot();
        let history = self.history_snapshot();
        let decision = self.current_decision();
        SessionView {
            perception,
            history,
            decision,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::TutorError, session::history::LastAction};
    use chrono::Utc;
    use std::sync::Arc;

    fn check(id: &str, correct: bool) -> HistoryUpdate {
        HistoryUpdate::Checked {
            problem_id: id.into(),
            is_correct: correct,
            explanation: None,
            answer: "x=3".into(),
            at: Utc::now(),
        }
    }

    #[test]
    fn test_empty_store() {
        let store = SessionStore::new();
        assert_eq!(store.view(), SessionView::default());
    }

    #[test]
    fn test_decided_verdict_commits_both() {
        let store = SessionStore::new();
        let outcomes = store.apply_verdict(Verdict::Decided {
            decision: Decision::no_interaction("x"),
            updates: vec![check("p1", true)],
            feedback: Some("look lower".into()),
        });
        assert_eq!(outcomes, vec![MergeOutcome::Applied]);
        assert_eq!(store.current_decision(), Some(Decision::no_interaction("x")));
        assert_eq!(
            store.history_snapshot()["p1"].last_action,
            LastAction::CheckedCorrect
        );
        assert_eq!(store.perception_feedback().as_deref(), Some("look lower"));
    }

    #[test]
    fn test_silent_verdict_keeps_decision() {
        let store = SessionStore::new();
        store.commit_decision(Decision::clear("user is writing"));
        store.apply_verdict(Verdict::Silent {
            updates: vec![check("p1", true)],
            feedback: None,
        });
        assert_eq!(store.current_decision(), Some(Decision::clear("user is writing")));
        assert!(store.history_snapshot().contains_key("p1"));
    }

    #[test]
    fn test_failed_verdict_is_noop() {
        let store = SessionStore::new();
        store.commit_decision(Decision::clear("before"));
        let before = store.view();
        store.apply_verdict(Verdict::Failed(TutorError::transport("x", "down")));
        assert_eq!(store.view(), before);
    }

    #[test]
    fn test_concurrent_commits_and_views() {
        let store = Arc::new(SessionStore::new());
        let writer = {
            let store = Arc::clone(&store);
            std::thread::spawn(move || {
                for i in 0..200 {
                    store.commit_history(&[check(&format!("p{}", i % 5), i % 2 == 0)]);
                    store.commit_decision(Decision::no_interaction(format!("tick {}", i)));
                }
            })
        };
        for _ in 0..200 {
            let view = store.view();
            assert!(view.history.len() <= 5);
        }
        writer.join().unwrap();
        assert_eq!(store.history_snapshot().len(), 5);
    }
}
