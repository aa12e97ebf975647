//! # Rendering
//!
//! Maps session state to draw commands and executes them against a drawing
//! surface. Planning is a pure function of the state; it never calls a
//! model and never fails.

pub mod planner;
pub mod presenter;
pub mod surface;

pub use planner::plan;
pub use presenter::{LogPresenter, Presenter};
pub use surface::{Color, DrawCommand, DrawingSurface, Point, RecordingSurface, apply_plan};
