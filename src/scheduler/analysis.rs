//! One analysis cycle: encode, perceive, reconcile, decide, commit.
//!
//! Runs synchronously on the blocking pool. Every failure ends the cycle
//! with a log line (an error for auth and config failures, a warning
//! otherwise); the store keeps what it had, and the render loop keeps
//! projecting the last good decision.

use std::sync::Arc;

use chrono::Utc;

use crate::{
    core::Frame,
    decision::{DecisionEngine, Verdict},
    error::{TutorError, classify},
    gateway::{ImageOptions, ModelGateway, encode_frame},
    perception::{PerceptionAgent, Reconciliation, RejectReason},
    session::{MergeOutcome, SessionStore},
};

use super::SchedulerConfig;

/// How far an analysis cycle got.
#[derive(Debug)]
pub enum CycleReport {
    /// The frame could not be encoded for upload
    EncodeFailed(TutorError),
    /// The perception call failed
    PerceptionFailed(TutorError),
    /// The perception reply was unusable; the previous snapshot stands
    PerceptionRejected(RejectReason),
    /// A new decision was committed
    Decided {
        kind: &'static str,
        outcomes: Vec<MergeOutcome>,
    },
    /// Perception committed, decision unchanged
    Unchanged { outcomes: Vec<MergeOutcome> },
    /// Perception committed, but the decision call failed
    DecisionFailed(TutorError),
}

impl CycleReport {
    /// Whether a new perception snapshot reached the store.
    pub fn perceived(&self) -> bool {
        matches!(
            self,
            Self::Decided { .. } | Self::Unchanged { .. } | Self::DecisionFailed(_)
        )
    }
}

pub struct AnalysisCycle {
    perception: PerceptionAgent,
    engine: DecisionEngine,
    store: Arc<SessionStore>,
    image_options: ImageOptions,
}

impl AnalysisCycle {
    pub fn new(
        gateway: Arc<dyn ModelGateway>,
        engine: DecisionEngine,
        store: Arc<SessionStore>,
        image_options: ImageOptions,
        config: &SchedulerConfig,
    ) -> Self {
        Self {
            perception: PerceptionAgent::new(gateway, config.perception_max_tokens),
            engine,
            store,
            image_options,
        }
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    pub fn run(&self, frame: &Frame) -> CycleReport {
        let image = match encode_frame(frame, &self.image_options) {
            Ok(image) => image,
            Err(e) => {
                log::warn!("frame {} not encoded: {}", frame.sequence, e);
                return CycleReport::EncodeFailed(e);
            }
        };

        let previous = self.store.perception_snapshot();
        let feedback = self.store.perception_feedback();
        let observed = self.perception.observe(
            &image,
            frame.size,
            previous.as_ref(),
            feedback.as_deref(),
            Utc::now(),
        );
        let snapshot = match observed {
            Ok(Reconciliation::Merged(snapshot)) => snapshot,
            Ok(Reconciliation::Rejected(reason)) => {
                log::warn!("perception update rejected: {}", reason);
                return CycleReport::PerceptionRejected(reason);
            }
            Err(e) => {
                log_failure("perception", &e);
                return CycleReport::PerceptionFailed(e);
            }
        };
        self.store.commit_perception(snapshot.clone());

        let history = self.store.history_snapshot();
        let verdict = self
            .engine
            .decide(&snapshot, &history, Some(&image), Utc::now());
        match verdict {
            Verdict::Failed(e) => {
                log_failure("decision", &e);
                CycleReport::DecisionFailed(e)
            }
            verdict @ Verdict::Decided { .. } => {
                let (kind, reason) = match verdict.decision() {
                    Some(decision) => (decision.kind(), decision.reason()),
                    None => ("", String::new()),
                };
                log::info!("decision {}: {}", kind, reason);
                let outcomes = self.store.apply_verdict(verdict);
                CycleReport::Decided { kind, outcomes }
            }
            verdict @ Verdict::Silent { .. } => {
                let outcomes = self.store.apply_verdict(verdict);
                CycleReport::Unchanged { outcomes }
            }
        }
    }
}

/// Log level for a failed stage: fatal errors need the operator, the rest
/// clear up or are retried on the next cycle.
fn failure_level(e: &TutorError) -> log::Level {
    if classify::is_fatal(e) {
        log::Level::Error
    } else {
        log::Level::Warn
    }
}

fn log_failure(stage: &str, e: &TutorError) {
    let note = if classify::is_transient(e) {
        "retrying next cycle"
    } else {
        "keeping current projection"
    };
    log::log!(failure_level(e), "{} failed, {}: {}", stage, note, e);
}
