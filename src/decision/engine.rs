//! # Decision Engine
//!
//! Runs the gate and, for answer checks and hints, the single verification
//! call. Never fails across its boundary: any model problem becomes
//! [`Verdict::Failed`], which leaves the current decision and the history
//! untouched.
//!
//! Check results are filtered through the history merge contract before
//! they are announced. A re-check that confirms the stored verdict produces
//! no decision; it only refreshes the judged answer text.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::{
    gate::{Gate, PendingCheck, evaluate_gate},
    prompt::{check_instruction, hint_instruction},
    reply::DecisionReply,
    types::{CheckResult, Decision, DecisionConfig, MAX_HINT_CHARS},
};
use crate::{
    error::TutorError,
    gateway::{EncodedImage, ModelGateway, extract_json},
    perception::{PerceptionSnapshot, ids::qualify},
    session::history::{
        HistoryUpdate, InteractionHistory, MAX_EXPLANATION_CHARS, MergeOutcome, classify_update,
    },
    text::truncate_chars,
};

/// Result of one decision pass.
#[derive(Debug)]
pub enum Verdict {
    /// A new current decision, with the history changes it implies
    Decided {
        decision: Decision,
        updates: Vec<HistoryUpdate>,
        feedback: Option<String>,
    },
    /// Nothing to announce; bookkeeping updates only
    Silent {
        updates: Vec<HistoryUpdate>,
        feedback: Option<String>,
    },
    /// The verification call failed; keep everything as it is
    Failed(TutorError),
}

impl Verdict {
    fn decided(decision: Decision) -> Self {
        Self::Decided {
            decision,
            updates: Vec::new(),
            feedback: None,
        }
    }

    pub fn decision(&self) -> Option<&Decision> {
        match self {
            Self::Decided { decision, .. } => Some(decision),
            _ => None,
        }
    }

    pub fn updates(&self) -> &[HistoryUpdate] {
        match self {
            Self::Decided { updates, .. } | Self::Silent { updates, .. } => updates,
            Self::Failed(_) => &[],
        }
    }
}

pub struct DecisionEngine {
    gateway: Arc<dyn ModelGateway>,
    config: DecisionConfig,
}

impl DecisionEngine {
    pub fn new(gateway: Arc<dyn ModelGateway>, config: DecisionConfig) -> Self {
        Self { gateway, config }
    }

    pub fn config(&self) -> &DecisionConfig {
        &self.config
    }

    /// Decide what to project for `snapshot`.
    pub fn decide(
        &self,
        snapshot: &PerceptionSnapshot,
        history: &InteractionHistory,
        image: Option<&EncodedImage>,
        now: DateTime<Utc>,
    ) -> Verdict {
        match evaluate_gate(snapshot, history, &self.config) {
            Gate::Clear { reason } => Verdict::decided(Decision::clear(reason)),
            Gate::NoInteraction { reason } => Verdict::decided(Decision::no_interaction(reason)),
            Gate::Check { pending } => self.check(snapshot, history, image, &pending, now),
            Gate::Hint { problem_id, level } => {
                self.hint(snapshot, history, image, &problem_id, level, now)
            }
        }
    }

    fn check(
        &self,
        snapshot: &PerceptionSnapshot,
        history: &InteractionHistory,
        image: Option<&EncodedImage>,
        pending: &[PendingCheck],
        now: DateTime<Utc>,
    ) -> Verdict {
        let instruction = check_instruction(snapshot, history, pending);
        let reply = match self.ask(image, &instruction, "answer_check") {
            Ok(reply) => reply,
            Err(e) => return Verdict::Failed(e),
        };
        let Some(checked) = reply.checked_problems.as_ref() else {
            return Verdict::Failed(TutorError::malformed(
                "answer_check",
                "reply has no checked_problems",
            ));
        };

        let page = snapshot.page_id.as_deref();
        let mut results = Vec::new();
        let mut updates = Vec::new();
        for check in pending {
            let Some(judged) = checked
                .iter()
                .find(|c| qualify(&c.problem_id, page) == check.problem_id)
            else {
                log::debug!("no verdict for {} in check reply", check.problem_id);
                continue;
            };

            let explanation = judged
                .explanation
                .as_deref()
                .map(str::trim)
                .filter(|text| !text.is_empty() && !judged.is_correct)
                .map(|text| truncate_chars(text, MAX_EXPLANATION_CHARS));
            let update = HistoryUpdate::Checked {
                problem_id: check.problem_id.clone(),
                is_correct: judged.is_correct,
                explanation: explanation.clone(),
                answer: check.answer.clone(),
                at: now,
            };

            match classify_update(history.get(&check.problem_id), &update) {
                MergeOutcome::Applied => {
                    results.push(CheckResult {
                        problem_id: check.problem_id.clone(),
                        is_correct: judged.is_correct,
                        explanation,
                    });
                    updates.push(update);
                }
                MergeOutcome::Refreshed => updates.push(update),
                MergeOutcome::Dropped => {}
            }
        }

        if results.is_empty() && updates.is_empty() {
            return Verdict::Failed(TutorError::malformed(
                "answer_check",
                "reply judged none of the pending answers",
            ));
        }

        let feedback = reply.feedback();
        if results.is_empty() {
            Verdict::Silent { updates, feedback }
        } else {
            Verdict::Decided {
                decision: Decision::CheckAnswer { results },
                updates,
                feedback,
            }
        }
    }

    fn hint(
        &self,
        snapshot: &PerceptionSnapshot,
        history: &InteractionHistory,
        image: Option<&EncodedImage>,
        problem_id: &str,
        level: u8,
        now: DateTime<Utc>,
    ) -> Verdict {
        let instruction = hint_instruction(snapshot, history, problem_id, level);
        let reply = match self.ask(image, &instruction, "hint") {
            Ok(reply) => reply,
            Err(e) => return Verdict::Failed(e),
        };
        let Some(content) = reply
            .content
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
        else {
            return Verdict::Failed(TutorError::malformed("hint", "reply has no hint content"));
        };

        Verdict::Decided {
            decision: Decision::ProjectHint {
                target_problem_id: problem_id.to_string(),
                level,
                content: truncate_chars(content, MAX_HINT_CHARS),
            },
            updates: vec![HistoryUpdate::HintGiven {
                problem_id: problem_id.to_string(),
                level,
                at: now,
            }],
            feedback: reply.feedback(),
        }
    }

    fn ask(
        &self,
        image: Option<&EncodedImage>,
        instruction: &str,
        stage: &str,
    ) -> Result<DecisionReply, TutorError> {
        let raw = self
            .gateway
            .call(image, instruction, self.config.max_output_tokens)?;
        log::debug!("{} reply: {}", stage, raw);

        let value = extract_json(&raw)
            .ok_or_else(|| TutorError::malformed(stage, "no JSON object in reply"))?;
        let reply = DecisionReply::from_value(&value)
            .map_err(|reason| TutorError::malformed(stage, reason))?;
        if let Some(rationale) = reply.rationale() {
            log::info!("{} rationale: {}", stage, rationale);
        }
        Ok(reply)
    }
}
