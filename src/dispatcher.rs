//! Per-record orchestration.
//!
//! A `Dispatcher` owns all monitoring state (pool tracker, error window and
//! alert policy) and is driven by one task, one line at a time. For each
//! usable record the pool transition is evaluated first, then the outcome is
//! counted towards the error window, so a record that flips the pool can
//! raise a failover alert and still count towards the error rate.

use tokio::time::Instant;

use crate::alert::{Alert, AlertCategory, AlertSink};
use crate::cli::Config;
use crate::policy::{AlertPolicy, DispatchOutcome};
use crate::record::{PoolEvent, parse_line};
use crate::state::{PoolStateTracker, Transition};
use crate::window::ErrorRateWindow;

/// An alert the dispatcher attempted to raise and what became of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dispatched {
    pub category: AlertCategory,
    pub outcome: DispatchOutcome,
}

pub struct Dispatcher {
    tracker: PoolStateTracker,
    window: ErrorRateWindow,
    policy: AlertPolicy,
    threshold: f64,
    sink: Box<dyn AlertSink>,
}

impl Dispatcher {
    pub fn new(config: &Config, sink: Box<dyn AlertSink>) -> Self {
        Self {
            tracker: PoolStateTracker::new(),
            window: ErrorRateWindow::new(config.window_size),
            policy: AlertPolicy::new(config.maintenance_mode, config.alert_cooldown),
            threshold: config.error_rate_threshold,
            sink,
        }
    }

    pub fn active_pool(&self) -> Option<&str> {
        self.tracker.active_pool()
    }

    pub fn window(&self) -> &ErrorRateWindow {
        &self.window
    }

    pub fn policy(&self) -> &AlertPolicy {
        &self.policy
    }

    /// Processes one raw log line. Lines that are not request records are
    /// ignored without touching any state.
    pub async fn process_line(&mut self, line: &str) -> Vec<Dispatched> {
        match parse_line(line) {
            Some(event) => self.process(event).await,
            None => Vec::new(),
        }
    }

    pub async fn process(&mut self, event: PoolEvent) -> Vec<Dispatched> {
        let mut dispatched = Vec::new();

        let pool_alert = match self.tracker.observe(&event.pool) {
            Transition::Baseline(pool) => {
                tracing::info!(%pool, "initial pool detected, monitoring for changes");
                None
            }
            Transition::Unchanged => None,
            Transition::Failover { from, to } => Some(Alert::failover(&from, &to)),
            Transition::Recovery { to, .. } => Some(Alert::recovery(&to)),
            Transition::Switched { from, to } => {
                tracing::info!(%from, %to, "active pool changed to an unrecognized pool, not alerting");
                None
            }
        };
        if let Some(alert) = pool_alert {
            dispatched.push(self.raise(alert).await);
        }

        self.window.push(event.is_error());
        if let Some(rate) = self.window.error_rate() {
            if rate > self.threshold {
                let pool = self.tracker.active_pool().unwrap_or(&event.pool);
                let alert = Alert::high_error_rate(rate, self.window.capacity(), self.threshold, pool);
                dispatched.push(self.raise(alert).await);
            }
        }

        dispatched
    }

    async fn raise(&mut self, alert: Alert) -> Dispatched {
        let outcome = self.policy.dispatch(&alert, self.sink.as_ref(), Instant::now()).await;
        Dispatched {
            category: alert.category,
            outcome,
        }
    }
}
