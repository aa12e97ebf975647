//! Perception snapshot and update types.
//!
//! [`PerceptionUpdate`] is the strict parse boundary: a model reply either
//! deserializes into it or the whole update is rejected. Field aliases accept
//! the older `questions_on_page` / `user_attempt_content` vocabulary.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::core::Size;

/// Normalized `[x_min, y_min, x_max, y_max]` box, each coordinate in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NormRect {
    pub x_min: f64,
    pub y_min: f64,
    pub x_max: f64,
    pub y_max: f64,
}

impl NormRect {
    /// Validate a raw coordinate list from the model.
    pub fn from_slice(coords: &[f64]) -> Result<Self, String> {
        let [x_min, y_min, x_max, y_max] = coords else {
            return Err(format!("expected 4 coordinates, got {}", coords.len()));
        };
        let rect = Self {
            x_min: *x_min,
            y_min: *y_min,
            x_max: *x_max,
            y_max: *y_max,
        };
        rect.validate()?;
        Ok(rect)
    }

    pub fn validate(&self) -> Result<(), String> {
        let coords = [self.x_min, self.y_min, self.x_max, self.y_max];
        if coords.iter().any(|c| !c.is_finite() || !(0.0..=1.0).contains(c)) {
            return Err(format!("coordinate outside [0, 1]: {:?}", coords));
        }
        if self.x_min >= self.x_max || self.y_min >= self.y_max {
            return Err(format!("min not below max: {:?}", coords));
        }
        Ok(())
    }

    /// Scale to pixel coordinates of a frame, truncating toward zero.
    pub fn to_pixels(&self, size: Size) -> PixelRect {
        let (w, h) = (f64::from(size.w), f64::from(size.h));
        PixelRect {
            x1: (self.x_min * w) as u32,
            y1: (self.y_min * h) as u32,
            x2: (self.x_max * w) as u32,
            y2: (self.y_max * h) as u32,
        }
    }
}

/// Box in frame pixels, derived from a [`NormRect`] on every merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PixelRect {
    pub x1: u32,
    pub y1: u32,
    pub x2: u32,
    pub y2: u32,
}

impl PixelRect {
    pub fn width(&self) -> u32 {
        self.x2.saturating_sub(self.x1)
    }

    pub fn height(&self) -> u32 {
        self.y2.saturating_sub(self.y1)
    }
}

/// One problem visible on the page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Problem {
    /// Page-qualified id such as `page3-problem2`
    pub id: String,
    /// Display excerpt of the problem text
    pub text: String,
    /// Normalized position; `None` means unknown
    pub bbox: Option<NormRect>,
    #[serde(skip_serializing)]
    pub pixel_bbox: Option<PixelRect>,
}

/// Cumulative world-model of the page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerceptionSnapshot {
    pub timestamp: DateTime<Utc>,
    pub page_id: Option<String>,
    pub active_problem_id: Option<String>,
    pub problems: Vec<Problem>,
    /// Seconds the user has stayed on the active problem
    pub dwell_seconds: f64,
    /// `None` means the model has not said
    pub is_writing: Option<bool>,
    /// Latest transcribed answer per problem id
    pub answers: BTreeMap<String, String>,
    pub active_problem_complete: Option<bool>,
}

impl PerceptionSnapshot {
    /// A snapshot with nothing observed yet.
    pub fn empty(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            page_id: None,
            active_problem_id: None,
            problems: Vec::new(),
            dwell_seconds: 0.0,
            is_writing: None,
            answers: BTreeMap::new(),
            active_problem_complete: None,
        }
    }

    pub fn problem(&self, id: &str) -> Option<&Problem> {
        self.problems.iter().find(|p| p.id == id)
    }

    /// Answer text for a problem, if non-blank.
    pub fn answer(&self, id: &str) -> Option<&str> {
        self.answers
            .get(id)
            .map(|text| text.trim())
            .filter(|text| !text.is_empty())
    }

    /// Problems with a non-blank answer, in id order.
    pub fn answered(&self) -> impl Iterator<Item = (&str, &str)> {
        self.answers
            .iter()
            .map(|(id, text)| (id.as_str(), text.trim()))
            .filter(|(_, text)| !text.is_empty())
    }

    pub fn is_writing_now(&self) -> bool {
        self.is_writing == Some(true)
    }
}

/// One perception reply, as typed fields. Absent fields mean "unchanged".
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PerceptionUpdate {
    #[serde(default)]
    pub timestamp: Option<Value>,

    #[serde(default, alias = "current_page_id", deserialize_with = "lenient_id_opt")]
    pub page_id: Option<String>,

    /// `Some(None)` is an explicit null: the active problem is cleared.
    #[serde(default, alias = "active_question_id", deserialize_with = "nullable_id")]
    pub active_problem_id: Option<Option<String>>,

    #[serde(default, alias = "questions_on_page")]
    pub problems: Option<Vec<ProblemUpdate>>,

    #[serde(default, alias = "time_on_active_question_seconds")]
    pub dwell_seconds: Option<f64>,

    #[serde(default)]
    pub is_writing: Option<bool>,

    /// A null value clears the stored text but keeps the key.
    #[serde(default, alias = "user_attempt_content")]
    pub answers: Option<BTreeMap<String, Option<String>>>,

    #[serde(default, alias = "is_active_question_completed")]
    pub active_problem_complete: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProblemUpdate {
    #[serde(alias = "question_id", deserialize_with = "lenient_id")]
    pub id: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub bbox: Option<Vec<f64>>,
}

/// Models emit ids as strings or bare numbers.
pub(crate) fn lenient_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {}",
            other
        ))),
    }
}

fn lenient_id_opt<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    nullable_id(deserializer).map(Option::flatten)
}

fn nullable_id<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(Some(None)),
        Value::String(s) if s.trim().is_empty() => Ok(Some(None)),
        Value::String(s) => Ok(Some(Some(s))),
        Value::Number(n) => Ok(Some(Some(n.to_string()))),
        other => Err(serde::de::Error::custom(format!(
            "expected string, number or null id, got {}",
            other
        ))),
    }
}
