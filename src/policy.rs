//! Decides whether a candidate alert may go out, and remembers when each
//! category was last delivered.

use std::collections::HashMap;
use std::time::Duration;

use tokio::time::Instant;

use crate::alert::{Alert, AlertCategory, AlertSink};

/// Last successful delivery per category. A missing entry means "never sent".
#[derive(Debug, Default, Clone)]
pub struct CooldownLedger {
    last_sent: HashMap<AlertCategory, Instant>,
}

impl CooldownLedger {
    pub fn last_sent(&self, category: AlertCategory) -> Option<Instant> {
        self.last_sent.get(&category).copied()
    }

    pub fn record(&mut self, category: AlertCategory, at: Instant) {
        self.last_sent.insert(category, at);
    }

    pub fn is_empty(&self) -> bool {
        self.last_sent.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Maintenance mode is on.
    Suppressed,
    /// Same category went out too recently.
    Throttled { remaining: Duration },
    Deliver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Suppressed,
    Throttled,
    Delivered,
    Failed,
}

#[derive(Debug)]
pub struct AlertPolicy {
    maintenance: bool,
    cooldown: Duration,
    ledger: CooldownLedger,
}

impl AlertPolicy {
    pub fn new(maintenance: bool, cooldown: Duration) -> Self {
        Self {
            maintenance,
            cooldown,
            ledger: CooldownLedger::default(),
        }
    }

    pub fn ledger(&self) -> &CooldownLedger {
        &self.ledger
    }

    pub fn check(&self, category: AlertCategory, now: Instant) -> Verdict {
        if self.maintenance {
            return Verdict::Suppressed;
        }
        if let Some(last) = self.ledger.last_sent(category) {
            let elapsed = now.saturating_duration_since(last);
            if elapsed < self.cooldown {
                return Verdict::Throttled { remaining: self.cooldown - elapsed };
            }
        }
        Verdict::Deliver
    }

    /// Runs `alert` through the policy and, if allowed, through `sink`.
    /// The ledger only moves on a successful send.
    pub async fn dispatch(
        &mut self,
        alert: &Alert,
        sink: &dyn AlertSink,
        now: Instant,
    ) -> DispatchOutcome {
        let category = alert.category;
        match self.check(category, now) {
            Verdict::Suppressed => {
                tracing::info!(%category, title = %alert.title, "maintenance mode: skipping alert");
                DispatchOutcome::Suppressed
            }
            Verdict::Throttled { remaining } => {
                tracing::info!(
                    %category,
                    title = %alert.title,
                    remaining_secs = remaining.as_secs(),
                    "cooldown: skipping alert"
                );
                DispatchOutcome::Throttled
            }
            Verdict::Deliver => {
                tracing::warn!(%category, title = %alert.title, "sending alert");
                match sink.send(alert).await {
                    Ok(()) => {
                        self.ledger.record(category, now);
                        DispatchOutcome::Delivered
                    }
                    Err(err) => {
                        tracing::error!(%category, error = %err, "failed to deliver alert");
                        DispatchOutcome::Failed
                    }
                }
            }
        }
    }
}
