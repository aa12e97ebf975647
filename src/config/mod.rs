//! # Configuration Module
//!
//! Process configuration for the tutoring pipeline: credential, endpoint,
//! image encoding, analysis cadence and decision thresholds.

pub mod check;
pub mod config;

pub use check::{CheckStatus, EnvReport, check_environment};
pub use config::{TutorConfig, credential_looks_valid, mask_credential};
