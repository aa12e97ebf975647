//! Perception instruction.
//!
//! The previous snapshot is embedded so the model can report only what
//! changed; the reconciler fills in everything it leaves out.

use super::model::PerceptionSnapshot;

const INSTRUCTION: &str = r#"You are watching a camera image of a student's workbook page on a desk.
Report what you see as ONE JSON object and nothing else. Fields:
- timestamp: ISO 8601 time of this observation
- page_id: identifier of the visible page, e.g. "page3"
- active_problem_id: id of the problem the student is working on, or null
- problems: every problem on the page, as a list of
  {"id": "problem<n>", "text": short excerpt, "bbox": [x_min, y_min, x_max, y_max]}
  with bbox in normalized 0-1 image coordinates
- dwell_seconds: estimated seconds spent on the active problem
- is_writing: true only while the pen is visibly moving on the page
- answers: object mapping problem id to the handwritten answer text
- active_problem_complete: whether the active problem looks finished
Output rules:
- Omit any field whose value is unchanged from the previous state.
- In answers, include only problems whose answer text changed.
- Emit the problems list in full, or omit it if nothing changed.
- Number problems by their printed order on the page."#;

/// Build the perception instruction for one call.
///
/// `feedback` is the tutor's note from the last verification call.
pub fn perception_instruction(
    previous: Option<&PerceptionSnapshot>,
    feedback: Option<&str>,
) -> String {
    let previous_json = previous
        .and_then(|snapshot| serde_json::to_string_pretty(snapshot).ok())
        .unwrap_or_else(|| "none (first observation)".to_string());
    let mut text = format!("{}\n\nPrevious state:\n{}\n", INSTRUCTION, previous_json);
    if let Some(note) = feedback {
        text.push_str(&format!("\nNote from the tutor: {}\n", note));
    }
    text
}
