//! Verification instructions for answer checks and hints.

use serde_json::json;

use super::gate::PendingCheck;
use crate::{perception::PerceptionSnapshot, session::InteractionHistory};

const CHECK_INSTRUCTION: &str = r#"You are a patient tutor looking at a student's workbook page.
Judge each listed answer against its problem as printed on the page.
Reply with ONE JSON object and nothing else:
{"checked_problems": [{"problem_id": "<id as listed>", "is_correct": true|false,
  "explanation": "<what went wrong, at most 15 characters, empty if correct>"}],
 "perception_feedback": "<optional note for the next observation>"}
Include every listed problem exactly once."#;

const HINT_INSTRUCTION: &str = r#"You are a patient tutor. The student has been stuck on one problem.
Write a hint at the requested level: 1 = gentle nudge, 2 = name the method,
3 = show the first step. Never give the final answer.
Reply with ONE JSON object and nothing else:
{"content": "<hint, at most 10 characters>", "reason": "<why this hint>",
 "perception_feedback": "<optional note for the next observation>"}"#;

/// Instruction for verifying the pending answers.
pub fn check_instruction(
    snapshot: &PerceptionSnapshot,
    history: &InteractionHistory,
    pending: &[PendingCheck],
) -> String {
    let answers: Vec<_> = pending
        .iter()
        .map(|check| {
            let text = snapshot
                .problem(&check.problem_id)
                .map(|p| p.text.as_str())
                .unwrap_or("");
            json!({"problem_id": check.problem_id, "problem_text": text, "answer": check.answer})
        })
        .collect();
    format!(
        "{}\n\nAnswers to check:\n{}\n\nPage state:\n{}\n\nHistory:\n{}\n",
        CHECK_INSTRUCTION,
        to_pretty(&answers),
        to_pretty(snapshot),
        to_pretty(history),
    )
}

/// Instruction for a hint on `problem_id` at `level`.
pub fn hint_instruction(
    snapshot: &PerceptionSnapshot,
    history: &InteractionHistory,
    problem_id: &str,
    level: u8,
) -> String {
    let text = snapshot
        .problem(problem_id)
        .map(|p| p.text.as_str())
        .unwrap_or("");
    format!(
        "{}\n\nProblem: {} ({})\nHint level: {}\n\nPage state:\n{}\n\nHistory:\n{}\n",
        HINT_INSTRUCTION,
        problem_id,
        text,
        level,
        to_pretty(snapshot),
        to_pretty(history),
    )
}

fn to_pretty<T: serde::Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}
