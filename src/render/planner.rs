//! # Render Planner
//!
//! `plan(view, frame_size)` turns session state into draw commands:
//!
//! - a divider at 90% of the frame width with a status sidebar to its right
//!   (decision kind, shortened reason, writing or idle, dwell seconds);
//! - for every problem the history shows as checked, a check mark (correct)
//!   or the error note (incorrect) just below its box, whatever the current
//!   decision is, so earlier verdicts stay visible;
//! - the current decision's own content: a hint under its target problem,
//!   and check results for problems whose box is unknown. Anything without
//!   a known box is drawn near the frame centre.
//!
//! Every anchor is clamped into the frame. Commands that would still be
//! illegal (empty text, zero-sized frame) are left out.

use crate::{
    core::Size,
    decision::{CheckResult, Decision},
    perception::{PerceptionSnapshot, PixelRect},
    session::{LastAction, SessionView},
    text::ellipsize,
};

use super::surface::{Color, DrawCommand, Point};

const DIVIDER_FRACTION: f64 = 0.9;
const SIDEBAR_MARGIN: u32 = 10;
const SIDEBAR_TOP: u32 = 30;
const SIDEBAR_LINE_HEIGHT: u32 = 22;
const SIDEBAR_FONT: u32 = 13;
const SIDEBAR_REASON_CHARS: usize = 20;

const HINT_FONT: u32 = 18;
const NOTE_FONT: u32 = 16;
const NOTE_OFFSET: u32 = 20;
const CHECKMARK_OFFSET: u32 = 30;
const CHECKMARK_SIZE: u32 = 30;
const CHECKMARK_THICKNESS: u32 = 3;
const CENTER_X_SHIFT: u32 = 100;
const CENTER_LINE_HEIGHT: u32 = 40;

/// Plan the overlay for one render tick.
pub fn plan(view: &SessionView, frame: Size) -> Vec<DrawCommand> {
    if frame.w == 0 || frame.h == 0 {
        return Vec::new();
    }
    let mut out = Planner {
        frame,
        commands: Vec::new(),
    };

    out.sidebar(view);

    if let Some(snapshot) = &view.perception {
        out.persisted_checks(view, snapshot);
    }

    match &view.decision {
        Some(Decision::ProjectHint {
            target_problem_id,
            content,
            ..
        }) => {
            let anchor = known_box(view.perception.as_ref(), target_problem_id)
                .map(|px| Point { x: px.x1, y: px.y2 + NOTE_OFFSET })
                .unwrap_or_else(|| out.centered(0));
            out.text(content, anchor, HINT_FONT, Color::YELLOW);
        }
        Some(Decision::CheckAnswer { results }) => {
            let unplaced = results
                .iter()
                .filter(|r| known_box(view.perception.as_ref(), &r.problem_id).is_none());
            for (slot, result) in unplaced.enumerate() {
                let anchor = out.centered(slot as u32);
                out.verdict(result, anchor);
            }
        }
        _ => {}
    }

    out.commands
}

fn known_box(snapshot: Option<&PerceptionSnapshot>, problem_id: &str) -> Option<PixelRect> {
    snapshot?.problem(problem_id)?.pixel_bbox
}

struct Planner {
    frame: Size,
    commands: Vec<DrawCommand>,
}

impl Planner {
    fn clamp(&self, at: Point) -> Point {
        Point {
            x: at.x.min(self.frame.w - 1),
            y: at.y.min(self.frame.h - 1),
        }
    }

    fn centered(&self, slot: u32) -> Point {
        self.clamp(Point {
            x: (self.frame.w / 2).saturating_sub(CENTER_X_SHIFT),
            y: self.frame.h / 2 + slot * CENTER_LINE_HEIGHT,
        })
    }

    fn text(&mut self, text: &str, at: Point, font_size: u32, color: Color) {
        if text.trim().is_empty() {
            return;
        }
        let at = self.clamp(at);
        self.commands.push(DrawCommand::Text {
            text: text.to_string(),
            at,
            font_size,
            color,
        });
    }

    fn checkmark(&mut self, at: Point) {
        let at = self.clamp(at);
        self.commands.push(DrawCommand::Checkmark {
            at,
            size: CHECKMARK_SIZE,
            color: Color::GREEN,
            thickness: CHECKMARK_THICKNESS,
        });
    }

    fn sidebar(&mut self, view: &SessionView) {
        let divider_x = ((f64::from(self.frame.w) * DIVIDER_FRACTION) as u32).min(self.frame.w - 1);
        self.commands.push(DrawCommand::Divider {
            x: divider_x,
            color: Color::DIVIDER_GRAY,
        });

        let mut lines = Vec::new();
        if let Some(decision) = &view.decision {
            lines.push(decision.kind().to_string());
            let reason = decision.reason();
            if !reason.is_empty() {
                lines.push(ellipsize(&reason, SIDEBAR_REASON_CHARS));
            }
        }
        if let Some(snapshot) = &view.perception {
            let state = if snapshot.is_writing_now() { "writing" } else { "idle" };
            lines.push(state.to_string());
            if snapshot.dwell_seconds > 0.0 {
                lines.push(format!("{}s", snapshot.dwell_seconds as u64));
            }
        }

        let x = divider_x + SIDEBAR_MARGIN;
        for (i, line) in lines.iter().enumerate() {
            let y = SIDEBAR_TOP + i as u32 * SIDEBAR_LINE_HEIGHT;
            self.text(line, Point { x, y }, SIDEBAR_FONT, Color::GREEN);
        }
    }

    fn persisted_checks(&mut self, view: &SessionView, snapshot: &PerceptionSnapshot) {
        for (problem_id, entry) in &view.history {
            if !entry.last_action.is_check() {
                continue;
            }
            let Some(px) = known_box(Some(snapshot), problem_id) else {
                continue;
            };
            if entry.last_action == LastAction::CheckedCorrect {
                self.checkmark(Point { x: px.x1, y: px.y2 + CHECKMARK_OFFSET });
            } else {
                let note = entry.error_explanation.as_deref().unwrap_or("✗");
                self.text(note, Point { x: px.x1, y: px.y2 + NOTE_OFFSET }, NOTE_FONT, Color::WHITE);
            }
        }
    }

    fn verdict(&mut self, result: &CheckResult, at: Point) {
        if result.is_correct {
            self.checkmark(Point { x: at.x, y: at.y + CHECKMARK_SIZE });
        } else {
            let note = match &result.explanation {
                Some(text) => format!("{}: {}", result.problem_id, text),
                None => format!("{}: ✗", result.problem_id),
            };
            self.text(&note, at, NOTE_FONT, Color::WHITE);
        }
    }
}
