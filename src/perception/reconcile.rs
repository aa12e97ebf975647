//! # Perception Reconciler
//!
//! Merges one perception reply onto the previous snapshot.
//!
//! 1. No payload: rejected, previous snapshot stands.
//! 2. Parse into [`PerceptionUpdate`]; a type mismatch rejects the update.
//! 3. Validate every present box and the dwell value. One bad box rejects
//!    the whole update: partial trust is never given.
//! 4. Merge: timestamp always replaced, scalars replaced when present, the
//!    problem list replaced wholesale when present, answers merged by key.
//! 5. Derive pixel boxes for every problem from the current frame size.
//!
//! The reconciler is a pure function. A rejected update never touches the
//! previous snapshot, and no input can make it panic.

use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value;

use super::{
    ids::{normalize_page, qualify},
    model::{NormRect, PerceptionSnapshot, PerceptionUpdate, Problem},
};
use crate::{core::Size, error::TutorError};

/// Outcome of one reconciliation.
#[derive(Debug, Clone, PartialEq)]
pub enum Reconciliation {
    Merged(PerceptionSnapshot),
    Rejected(RejectReason),
}

/// Why an update was not merged.
#[derive(Debug, Clone, PartialEq)]
pub enum RejectReason {
    /// The reply contained no recoverable JSON object
    MissingPayload,
    /// The object did not match the expected field types
    Schema(String),
    /// A bounding box was out of range or inverted
    InvalidGeometry { problem_id: String, reason: String },
    /// A scalar held an impossible value
    InvalidValue { field: &'static str, reason: String },
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::MissingPayload => write!(f, "no JSON object in reply"),
            RejectReason::Schema(reason) => write!(f, "schema mismatch: {}", reason),
            RejectReason::InvalidGeometry { problem_id, reason } => {
                write!(f, "invalid bbox for {}: {}", problem_id, reason)
            }
            RejectReason::InvalidValue { field, reason } => {
                write!(f, "invalid {}: {}", field, reason)
            }
        }
    }
}

impl RejectReason {
    pub fn into_error(self) -> TutorError {
        TutorError::malformed("perception", self.to_string())
            .with_recovery_suggestion("previous snapshot kept")
    }
}

/// Merge a raw perception reply onto `previous`.
pub fn reconcile(
    previous: Option<&PerceptionSnapshot>,
    raw: Option<&Value>,
    frame_size: Size,
    received_at: DateTime<Utc>,
) -> Reconciliation {
    let Some(raw) = raw else {
        return Reconciliation::Rejected(RejectReason::MissingPayload);
    };

    let update = match PerceptionUpdate::deserialize_from(raw) {
        Ok(update) => update,
        Err(reason) => return Reconciliation::Rejected(RejectReason::Schema(reason)),
    };

    let problems = match validate(&update) {
        Ok(problems) => problems,
        Err(reason) => return Reconciliation::Rejected(reason),
    };

    let mut snapshot = previous
        .cloned()
        .unwrap_or_else(|| PerceptionSnapshot::empty(received_at));

    snapshot.timestamp = update
        .timestamp
        .as_ref()
        .and_then(parse_timestamp)
        .unwrap_or(received_at);

    if let Some(page) = update.page_id.as_deref().and_then(normalize_page) {
        snapshot.page_id = Some(page);
    }
    let page = snapshot.page_id.clone();
    let page = page.as_deref();

    if let Some(active) = &update.active_problem_id {
        snapshot.active_problem_id = active.as_deref().map(|id| qualify(id, page));
    }

    if let Some(problems) = problems {
        let mut merged: Vec<Problem> = Vec::with_capacity(problems.len());
        for (raw_id, text, bbox) in problems {
            let id = qualify(&raw_id, page);
            if merged.iter().any(|p| p.id == id) {
                log::debug!("duplicate problem id {} in perception reply, keeping first", id);
                continue;
            }
            merged.push(Problem {
                id,
                text,
                bbox,
                pixel_bbox: None,
            });
        }
        snapshot.problems = merged;
    }

    if let Some(dwell) = update.dwell_seconds {
        snapshot.dwell_seconds = dwell;
    }
    if let Some(writing) = update.is_writing {
        snapshot.is_writing = Some(writing);
    }
    if let Some(complete) = update.active_problem_complete {
        snapshot.active_problem_complete = Some(complete);
    }
    if let Some(answers) = update.answers {
        for (raw_id, text) in answers {
            let text = text.unwrap_or_default().trim().to_string();
            snapshot.answers.insert(qualify(&raw_id, page), text);
        }
    }

    for problem in &mut snapshot.problems {
        problem.pixel_bbox = problem.bbox.map(|bbox| bbox.to_pixels(frame_size));
    }

    Reconciliation::Merged(snapshot)
}

type ValidatedProblem = (String, String, Option<NormRect>);

fn validate(update: &PerceptionUpdate) -> Result<Option<Vec<ValidatedProblem>>, RejectReason> {
    if let Some(dwell) = update.dwell_seconds {
        if !dwell.is_finite() || dwell < 0.0 {
            return Err(RejectReason::InvalidValue {
                field: "dwell_seconds",
                reason: format!("{} is not a non-negative duration", dwell),
            });
        }
    }

    let Some(problems) = &update.problems else {
        return Ok(None);
    };

    let mut validated = Vec::with_capacity(problems.len());
    for problem in problems {
        let bbox = match &problem.bbox {
            None => None,
            Some(coords) => Some(NormRect::from_slice(coords).map_err(|reason| {
                RejectReason::InvalidGeometry {
                    problem_id: problem.id.clone(),
                    reason,
                }
            })?),
        };
        validated.push((
            problem.id.clone(),
            problem.text.clone().unwrap_or_default(),
            bbox,
        ));
    }
    Ok(Some(validated))
}

fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    let text = value.as_str()?.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

impl PerceptionUpdate {
    fn deserialize_from(raw: &Value) -> Result<Self, String> {
        if !raw.is_object() {
            return Err("top-level value is not an object".to_string());
        }
        serde_json::from_value(raw.clone()).map_err(|e| e.to_string())
    }
}
