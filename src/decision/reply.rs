//! Typed verification replies.
//!
//! The verification call answers with one JSON object. Check replies carry
//! `checked_problems`; hint replies carry `content`. The older
//! `checked_questions` / `error_analysis` / `projection_content` names are
//! accepted as aliases.

use serde::Deserialize;
use serde_json::Value;

use crate::perception::model::lenient_id;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DecisionReply {
    #[serde(default, alias = "checked_questions")]
    pub checked_problems: Option<Vec<CheckedReply>>,

    #[serde(default, alias = "projection_content")]
    pub content: Option<String>,

    /// Note for the next perception call
    #[serde(default, alias = "feedback_to_perception")]
    pub perception_feedback: Option<String>,

    /// The model's own account of its verdict
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckedReply {
    #[serde(alias = "question_id", deserialize_with = "lenient_id")]
    pub problem_id: String,
    pub is_correct: bool,
    #[serde(default, alias = "error_analysis")]
    pub explanation: Option<String>,
}

impl DecisionReply {
    /// Parse an extracted reply object.
    pub fn from_value(value: &Value) -> Result<Self, String> {
        serde_json::from_value(value.clone()).map_err(|e| e.to_string())
    }

    /// Stated reason, if non-blank.
    pub fn rationale(&self) -> Option<&str> {
        self.reason.as_deref().map(str::trim).filter(|text| !text.is_empty())
    }

    /// Feedback text, if non-blank.
    pub fn feedback(&self) -> Option<String> {
        self.perception_feedback
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_check_reply_with_aliases() {
        let reply = DecisionReply::from_value(&json!({
            "decision_type": "CHECK_ANSWER",
            "checked_questions": [
                {"question_id": "第1题", "is_correct": false, "error_analysis": "符号错误"},
                {"question_id": 2, "is_correct": true}
            ]
        }))
        .unwrap();
        let checked = reply.checked_problems.unwrap();
        assert_eq!(checked[0].problem_id, "第1题");
        assert_eq!(checked[0].explanation.as_deref(), Some("符号错误"));
        assert_eq!(checked[1].problem_id, "2");
        assert!(checked[1].is_correct);
    }

    #[test]
    fn test_hint_reply() {
        let reply = DecisionReply::from_value(&json!({
            "projection_content": "先移项",
            "feedback_to_perception": "  watch the lower half  "
        }))
        .unwrap();
        assert_eq!(reply.content.as_deref(), Some("先移项"));
        assert_eq!(reply.feedback().as_deref(), Some("watch the lower half"));
        assert_eq!(reply.rationale(), None);
    }

    #[test]
    fn test_rationale_trimmed_and_blank_ignored() {
        let reply = DecisionReply::from_value(&json!({
            "content": "先移项",
            "reason": " stuck on the first step "
        }))
        .unwrap();
        assert_eq!(reply.rationale(), Some("stuck on the first step"));

        let blank = DecisionReply::from_value(&json!({"content": "先移项", "reason": "  "})).unwrap();
        assert_eq!(blank.rationale(), None);
    }

    #[test]
    fn test_wrong_types_rejected() {
        let result = DecisionReply::from_value(&json!({
            "checked_problems": [{"problem_id": "p1", "is_correct": "yes"}]
        }));
        assert!(result.is_err());
    }
}
