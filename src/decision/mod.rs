//! # Decision Engine
//!
//! Chooses what, if anything, to project next.
//!
//! The choice is made in two stages. [`gate::evaluate_gate`] is a pure
//! priority ladder over the perception snapshot and interaction history that
//! settles most ticks without a model call. Only when it asks for an answer
//! check or a hint does [`DecisionEngine`] make one verification call, and
//! its result is filtered through the history merge contract before anything
//! is announced.

pub mod engine;
pub mod gate;
pub mod prompt;
pub mod reply;
pub mod types;

pub use engine::{DecisionEngine, Verdict};
pub use gate::{Gate, PendingCheck, evaluate_gate};
pub use types::{CheckResult, Decision, DecisionConfig};
