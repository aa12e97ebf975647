//! # Scheduler
//!
//! Drives the two halves of the tutor:
//!
//! - the render loop, ticking at display rate, which reads a frame, draws
//!   whatever the session store holds and shows it; and
//! - the analysis cycle, started from the render loop at most once per
//!   analysis interval and never while another one is running.
//!
//! Rendering never waits on analysis. An analysis cycle runs on the blocking
//! pool and delivers its results only through the session store.

pub mod analysis;
pub mod gate;
pub mod runner;

use std::time::Duration;

pub use analysis::{AnalysisCycle, CycleReport};
pub use gate::{AnalysisGate, AnalysisPermit};
pub use runner::{RunSummary, Runner, RunnerOptions, StopReason};

/// Timing for the render loop and analysis dispatch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SchedulerConfig {
    /// Minimum gap between the end of one analysis and the start of the next
    pub analysis_interval: Duration,
    /// Render tick period
    pub render_interval: Duration,
    /// Output token cap for perception calls
    pub perception_max_tokens: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            analysis_interval: Duration::from_millis(500),
            render_interval: Duration::from_millis(100),
            perception_max_tokens: 2000,
        }
    }
}
