//! # Perception
//!
//! Turns one perception model call's partial, untrusted JSON into the
//! cumulative world-model of the page.
//!
//! - [`model`]: the snapshot types and the typed update the reply parses into
//! - [`ids`]: page-qualified problem identifiers
//! - [`reconcile`]: validation and field-by-field merge
//! - [`prompt`]: the perception instruction
//! - [`agent`]: one perception call, end to end

pub mod agent;
pub mod ids;
pub mod model;
pub mod prompt;
pub mod reconcile;

pub use agent::PerceptionAgent;
pub use model::{NormRect, PerceptionSnapshot, PerceptionUpdate, PixelRect, Problem};
pub use reconcile::{Reconciliation, RejectReason, reconcile};
