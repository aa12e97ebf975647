//! Decision values.

use serde::Serialize;

/// Highest-priority reason: never project over active handwriting.
pub const REASON_WRITING: &str = "user is writing";
pub const REASON_NO_ACTIVE: &str = "no active problem";
pub const REASON_SHORT_DWELL: &str = "dwell too short";
pub const REASON_HINTS_EXHAUSTED: &str = "hint levels exhausted";
pub const REASON_DEFAULT: &str = "no action needed";

/// Hint content is kept to this many characters.
pub const MAX_HINT_CHARS: usize = 10;

/// The single current choice of what to project.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "decision_type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    NoInteraction {
        reason: String,
    },
    ClearProjection {
        reason: String,
    },
    ProjectHint {
        target_problem_id: String,
        level: u8,
        content: String,
    },
    CheckAnswer {
        results: Vec<CheckResult>,
    },
}

impl Decision {
    pub fn no_interaction(reason: impl Into<String>) -> Self {
        Self::NoInteraction {
            reason: reason.into(),
        }
    }

    pub fn clear(reason: impl Into<String>) -> Self {
        Self::ClearProjection {
            reason: reason.into(),
        }
    }

    /// Short label for logs and the status sidebar.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NoInteraction { .. } => "NO_INTERACTION",
            Self::ClearProjection { .. } => "CLEAR_PROJECTION",
            Self::ProjectHint { .. } => "PROJECT_HINT",
            Self::CheckAnswer { .. } => "CHECK_ANSWER",
        }
    }

    /// Human-readable reason shown in the sidebar.
    pub fn reason(&self) -> String {
        match self {
            Self::NoInteraction { reason } | Self::ClearProjection { reason } => reason.clone(),
            Self::ProjectHint {
                target_problem_id,
                level,
                ..
            } => format!("hint {} for {}", level, target_problem_id),
            Self::CheckAnswer { results } => {
                let correct = results.iter().filter(|r| r.is_correct).count();
                format!("checked {}, {} correct", results.len(), correct)
            }
        }
    }
}

/// One judged answer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckResult {
    pub problem_id: String,
    pub is_correct: bool,
    pub explanation: Option<String>,
}

/// Thresholds for the decision gate and the verification call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecisionConfig {
    /// Dwell on the active problem before a hint is offered
    pub dwell_threshold_secs: f64,
    /// Reply size cap for the verification call
    pub max_output_tokens: u32,
}

impl Default for DecisionConfig {
    fn default() -> Self {
        Self {
            dwell_threshold_secs: 30.0,
            max_output_tokens: 2000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialized_tag() {
        let value = serde_json::to_value(Decision::clear(REASON_WRITING)).unwrap();
        assert_eq!(value["decision_type"], "CLEAR_PROJECTION");
        assert_eq!(value["reason"], "user is writing");
    }

    #[test]
    fn test_reason_summaries() {
        let check = Decision::CheckAnswer {
            results: vec![
                CheckResult {
                    problem_id: "page1-problem1".into(),
                    is_correct: true,
                    explanation: None,
                },
                CheckResult {
                    problem_id: "page1-problem2".into(),
                    is_correct: false,
                    explanation: Some("sign".into()),
                },
            ],
        };
        assert_eq!(check.kind(), "CHECK_ANSWER");
        assert_eq!(check.reason(), "checked 2, 1 correct");
    }
}
