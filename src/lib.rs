//! # Desk Tutor
//!
//! A desk-projection tutoring aid. A camera looks down at a workbook page; a
//! vision-language model finds the problems on it and watches the student
//! write; a second pass decides whether to project anything back onto the
//! page: a hint, a check mark, a short error note, or nothing.
//!
//! ## Architecture
//!
//! The library is organized into these modules:
//! - `core`: Frames and the latest-frame buffer
//! - `gateway`: Model calls, frame encoding and reply JSON extraction
//! - `perception`: Reconciling model observations into a running world model
//! - `decision`: Gating and choosing interventions
//! - `session`: The single owner of perception, history and decision state
//! - `render`: Pure overlay planning and the drawing-surface seam
//! - `scheduler`: The render loop and the rate-gated analysis cycle
//! - `capture`: Frame sources
//! - `config`, `error`, `logging`: Ambient plumbing
//!
//! Model replies are untrusted. Every reply passes a typed parse boundary
//! and a malformed one is dropped with a warning; it never changes state
//! and never stops the loop.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use desk_tutor::{analysis_cycle, config::TutorConfig, gateway::QwenGateway};
//!
//! # fn example() -> desk_tutor::TutorResult<()> {
//! let config = TutorConfig::from_env()?;
//! config.validate()?;
//! let gateway = Arc::new(QwenGateway::new(config.gateway_config())?);
//! let cycle = analysis_cycle(&config, gateway);
//! # let _ = cycle;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

pub mod capture;
pub mod config;
pub mod core;
pub mod decision;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod perception;
pub mod render;
pub mod scheduler;
pub mod session;
pub mod text;

pub use error::{ErrorContext, ErrorSeverity, Retryable, TutorError, TutorResult};

use config::TutorConfig;
use decision::DecisionEngine;
use gateway::ModelGateway;
use scheduler::AnalysisCycle;
use session::SessionStore;

/// Wire perception and decision to one gateway over a fresh session.
pub fn analysis_cycle(config: &TutorConfig, gateway: Arc<dyn ModelGateway>) -> AnalysisCycle {
    let engine = DecisionEngine::new(Arc::clone(&gateway), config.decision_config());
    AnalysisCycle::new(
        gateway,
        engine,
        Arc::new(SessionStore::new()),
        config.image_options(),
        &config.scheduler_config(),
    )
}
