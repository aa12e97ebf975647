//! Analysis admission.
//!
//! One lock guards both "is an analysis running" and "when did the last one
//! finish", so the check and the claim happen together and two ticks can
//! never both start an analysis.

use std::{
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

#[derive(Debug, Default)]
struct GateState {
    in_flight: bool,
    last_completed: Option<Instant>,
}

#[derive(Debug)]
pub struct AnalysisGate {
    state: Mutex<GateState>,
    interval: Duration,
}

/// Proof that an analysis was admitted. Dropping it marks the analysis done
/// and starts the interval.
#[derive(Debug)]
pub struct AnalysisPermit {
    gate: Arc<AnalysisGate>,
}

impl AnalysisGate {
    pub fn new(interval: Duration) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(GateState::default()),
            interval,
        })
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Admit an analysis if none is running and the interval since the last
    /// completion has elapsed.
    pub fn try_begin(self: &Arc<Self>, now: Instant) -> Option<AnalysisPermit> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if state.in_flight {
            return None;
        }
        if let Some(done) = state.last_completed {
            if now.saturating_duration_since(done) < self.interval {
                return None;
            }
        }
        state.in_flight = true;
        Some(AnalysisPermit {
            gate: Arc::clone(self),
        })
    }

    pub fn is_in_flight(&self) -> bool {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .in_flight
    }

    fn finish(&self, at: Instant) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.in_flight = false;
        state.last_completed = Some(at);
    }
}

impl Drop for AnalysisPermit {
    fn drop(&mut self) {
        self.gate.finish(Instant::now());
    }
}
