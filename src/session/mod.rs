//! # Session State
//!
//! The process-wide tables bridging analysis and rendering: the perception
//! snapshot, the per-problem interaction history and the current decision.
//! [`SessionStore`] is their single owner; everything else works on copies
//! taken with its snapshot methods and hands changes back through commits.

pub mod history;
pub mod store;

pub use history::{
    HistoryEntry, HistoryUpdate, InteractionHistory, LastAction, MergeOutcome, ProblemStatus,
};
pub use store::{SessionStore, SessionView};
