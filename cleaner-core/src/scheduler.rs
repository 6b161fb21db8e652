use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, watch};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::reconcile::ReconcileSettings;
use crate::outcome::PassReport;
use crate::reconciler::Reconciler;
use crate::supplier::ClientSupplier;

const REPORT_CAPACITY: usize = 16;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SchedulerState {
    Idle,
    Reconciling,
}

/// Runs a reconciliation pass every interval, never more than one at a time.
///
/// A pass is awaited inside the tick loop, ticks that elapse meanwhile are
/// skipped rather than queued. Shutdown is only observed between passes so a
/// pass in flight always completes.
pub struct Scheduler<S> {
    reconciler: Reconciler<S>,
    interval: Duration,
    state: watch::Sender<SchedulerState>,
    reports: broadcast::Sender<Arc<PassReport>>,
}

impl<S> Scheduler<S> where S: ClientSupplier {
    pub fn new(reconciler: Reconciler<S>, settings: &ReconcileSettings) -> Self {
        Self::with_interval(reconciler, settings.interval())
    }

    pub fn with_interval(reconciler: Reconciler<S>, interval: Duration) -> Self {
        let (state, _) = watch::channel(SchedulerState::Idle);
        let (reports, _) = broadcast::channel(REPORT_CAPACITY);
        Self {
            reconciler,
            interval,
            state,
            reports,
        }
    }

    pub fn reconciler(&self) -> &Reconciler<S> {
        &self.reconciler
    }

    /// Reports of every pass finished after subscribing.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<PassReport>> {
        self.reports.subscribe()
    }

    pub fn state(&self) -> watch::Receiver<SchedulerState> {
        self.state.subscribe()
    }

    pub async fn run(&self, shutdown: CancellationToken) {
        let mut ticker = tokio::time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        debug!("reconciliation scheduler started with interval {:?}", self.interval);
        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {}
            }
            info!("clean fired");
            self.state.send_replace(SchedulerState::Reconciling);
            let report = self.reconciler.run_pass().await;
            self.state.send_replace(SchedulerState::Idle);
            info!("clean finished, {}", report);
            let _ = self.reports.send(Arc::new(report));
        }
        info!("reconciliation scheduler stopped");
    }
}
