//! The render loop.
//!
//! Every tick reads one frame, publishes it to the latest-frame buffer,
//! offers the analysis gate a chance to start a cycle, then plans and shows
//! the overlay from whatever the session store holds right now.

use std::{sync::Arc, time::Instant};

use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{self, Duration, MissedTickBehavior},
};

use super::{
    SchedulerConfig,
    analysis::{AnalysisCycle, CycleReport},
    gate::AnalysisGate,
};
use crate::{
    capture::CaptureSource,
    core::{Frame, LatestFrame},
    error::{Retryable, TutorError, TutorResult, classify},
    render::{Presenter, plan},
    session::SessionStore,
};

/// Retryable read failures in a row before capture is given up.
const MAX_CONSECUTIVE_READ_FAILURES: u32 = 5;

#[derive(Debug, Clone, Copy)]
pub struct RunnerOptions {
    pub render_interval: Duration,
    /// Stop after this many rendered ticks
    pub max_ticks: Option<u64>,
    /// Wait for an in-flight analysis before returning
    pub drain_on_exit: bool,
}

impl RunnerOptions {
    pub fn from_config(config: &SchedulerConfig) -> Self {
        Self {
            render_interval: config.render_interval,
            max_ticks: None,
            drain_on_exit: false,
        }
    }
}

/// Why the loop ended.
#[derive(Debug)]
pub enum StopReason {
    Shutdown,
    TickLimit,
    CaptureEnded(TutorError),
}

#[derive(Debug)]
pub struct RunSummary {
    pub ticks: u64,
    pub analyses_started: u64,
    pub analyses_completed: u64,
    /// Cycles that committed a new perception snapshot
    pub analyses_perceived: u64,
    /// Ticks shown without an overlay after drawing failed
    pub bare_frames: u64,
    /// Ticks skipped after a retryable read failure
    pub skipped_reads: u64,
    pub stop: StopReason,
}

pub struct Runner<S, P> {
    source: S,
    presenter: P,
    frames: Arc<LatestFrame>,
    store: Arc<SessionStore>,
    gate: Arc<AnalysisGate>,
    cycle: Arc<AnalysisCycle>,
    options: RunnerOptions,
    pending: Option<JoinHandle<CycleReport>>,
}

impl<S: CaptureSource, P: Presenter> Runner<S, P> {
    pub fn new(
        source: S,
        presenter: P,
        cycle: AnalysisCycle,
        config: &SchedulerConfig,
        options: RunnerOptions,
    ) -> Self {
        Self {
            source,
            presenter,
            frames: Arc::new(LatestFrame::new()),
            store: Arc::clone(cycle.store()),
            gate: AnalysisGate::new(config.analysis_interval),
            cycle: Arc::new(cycle),
            options,
            pending: None,
        }
    }

    pub fn store(&self) -> Arc<SessionStore> {
        Arc::clone(&self.store)
    }

    pub fn frames(&self) -> Arc<LatestFrame> {
        Arc::clone(&self.frames)
    }

    /// Run until shutdown is signalled, the tick limit is hit, or capture
    /// fails. Capture and display are released on every exit path.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> TutorResult<(RunSummary, P)> {
        self.source.initialize().await?;
        if let Some(size) = self.source.input_size() {
            log::info!("capture source ready at {}x{}", size.w, size.h);
        }

        let mut summary = RunSummary {
            ticks: 0,
            analyses_started: 0,
            analyses_completed: 0,
            analyses_perceived: 0,
            bare_frames: 0,
            skipped_reads: 0,
            stop: StopReason::Shutdown,
        };

        let mut ticker = time::interval(self.options.render_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut failed_reads = 0;

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        summary.stop = StopReason::Shutdown;
                        break;
                    }
                    continue;
                }
            }

            let frame = match self.source.read_frame().await {
                Ok(frame) => {
                    failed_reads = 0;
                    frame
                }
                Err(e) if !classify::ends_capture_loop(&e) && e.is_retryable() => {
                    failed_reads += 1;
                    if failed_reads >= MAX_CONSECUTIVE_READ_FAILURES {
                        log::error!("giving up after {} failed reads: {}", failed_reads, e);
                        summary.stop = StopReason::CaptureEnded(e);
                        break;
                    }
                    log::warn!("frame skipped: {}", e);
                    summary.skipped_reads += 1;
                    continue;
                }
                Err(e) => {
                    log::warn!("capture ended: {}", e);
                    summary.stop = StopReason::CaptureEnded(e);
                    break;
                }
            };
            self.frames.publish(frame.clone());

            self.collect_finished(&mut summary).await;
            self.maybe_dispatch(&mut summary);
            self.render(&frame, &mut summary);

            summary.ticks += 1;
            if self.options.max_ticks.is_some_and(|limit| summary.ticks >= limit) {
                summary.stop = StopReason::TickLimit;
                break;
            }
        }

        if let Err(e) = self.source.release().await {
            log::warn!("capture release failed: {}", e);
        }
        if let Err(e) = self.presenter.close() {
            log::warn!("display close failed: {}", e);
        }
        if self.options.drain_on_exit {
            if let Some(handle) = self.pending.take() {
                Self::record(handle.await, &mut summary);
            }
        }

        log::info!(
            "render loop stopped after {} ticks, {} analyses ({:?})",
            summary.ticks,
            summary.analyses_started,
            summary.stop
        );
        Ok((summary, self.presenter))
    }

    fn maybe_dispatch(&mut self, summary: &mut RunSummary) {
        // The previous task has not been collected yet.
        if self.pending.is_some() {
            return;
        }
        let Some(permit) = self.gate.try_begin(Instant::now()) else {
            return;
        };
        // Analysis takes its own copy so the buffer lock is released first.
        let Some(frame) = self.frames.latest() else {
            return;
        };
        let cycle = Arc::clone(&self.cycle);
        log::debug!("starting analysis on frame {}", frame.sequence);
        self.pending = Some(tokio::task::spawn_blocking(move || {
            let _permit = permit;
            cycle.run(&frame)
        }));
        summary.analyses_started += 1;
    }

    async fn collect_finished(&mut self, summary: &mut RunSummary) {
        if self.pending.as_ref().is_some_and(|h| h.is_finished()) {
            if let Some(handle) = self.pending.take() {
                Self::record(handle.await, summary);
            }
        }
    }

    fn record(joined: Result<CycleReport, tokio::task::JoinError>, summary: &mut RunSummary) {
        match joined {
            Ok(report) => {
                summary.analyses_completed += 1;
                if report.perceived() {
                    summary.analyses_perceived += 1;
                }
                log::debug!("analysis finished: {:?}", report);
            }
            Err(e) => log::warn!("analysis task aborted: {}", e),
        }
    }

    fn render(&mut self, frame: &Frame, summary: &mut RunSummary) {
        let commands = plan(&self.store.view(), frame.size);
        if let Err(e) = self.presenter.present(frame, &commands) {
            log::warn!("overlay failed on frame {}: {}", frame.sequence, e);
            summary.bare_frames += 1;
            if let Err(e) = self.presenter.present(frame, &[]) {
                log::warn!("frame {} not shown: {}", frame.sequence, e);
            }
        }
    }
}
