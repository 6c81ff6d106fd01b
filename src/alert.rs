//! Alert messages and the sinks that deliver them.
//!
//! `AlertSink` is the seam between the detection core and the outside world:
//! `WebhookSink` posts to a Slack-compatible incoming webhook, `ConsoleSink`
//! only writes the alert to the log when no webhook is configured.

use std::fmt;
use std::time::Duration;

use reqwest::{Client, Url};
use serde_json::json;

use crate::error::DeliveryError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlertCategory {
    Failover,
    Recovery,
    ErrorRate,
}

impl fmt::Display for AlertCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertCategory::Failover => write!(f, "failover"),
            AlertCategory::Recovery => write!(f, "recovery"),
            AlertCategory::ErrorRate => write!(f, "error_rate"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Alert {
    pub category: AlertCategory,
    pub title: String,
    pub body: String,
}

impl Alert {
    pub fn failover(from: &str, to: &str) -> Self {
        Self {
            category: AlertCategory::Failover,
            title: "🚨 FAILOVER DETECTED 🚨".to_string(),
            body: format!(
                "Primary pool **{}** appears down. Failing over to backup pool **{}**.",
                from.to_uppercase(),
                to.to_uppercase()
            ),
        }
    }

    pub fn recovery(to: &str) -> Self {
        Self {
            category: AlertCategory::Recovery,
            title: "✅ RECOVERY ✅".to_string(),
            body: format!(
                "Primary pool **{}** has recovered. Serving normal traffic.",
                to.to_uppercase()
            ),
        }
    }

    pub fn high_error_rate(rate: f64, window: usize, threshold: f64, pool: &str) -> Self {
        Self {
            category: AlertCategory::ErrorRate,
            title: "📈 HIGH ERROR RATE 📈".to_string(),
            body: format!(
                "Upstream 5xx error rate is **{rate:.2}%** over the last {window} requests \
                 (Threshold: {threshold:?}%). Currently active pool: **{}**",
                pool.to_uppercase()
            ),
        }
    }

    /// Single text field carried to the endpoint: title on the first line.
    pub fn text(&self) -> String {
        format!("{}\n{}", self.title, self.body)
    }
}

/// Best-effort delivery of one alert. Implementations must not retry.
#[async_trait::async_trait]
pub trait AlertSink: Send + Sync {
    async fn send(&self, alert: &Alert) -> Result<(), DeliveryError>;
}

/// Posts `{"text": ...}` to an incoming webhook.
#[derive(Debug, Clone)]
pub struct WebhookSink {
    url: Url,
    client: Client,
}

impl WebhookSink {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, DeliveryError> {
        let url = Url::parse(url).map_err(|e| DeliveryError::InvalidUrl(format!("{url}: {e}")))?;
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { url, client })
    }
}

#[async_trait::async_trait]
impl AlertSink for WebhookSink {
    async fn send(&self, alert: &Alert) -> Result<(), DeliveryError> {
        let payload = json!({ "text": alert.text() });
        let response = self.client.post(self.url.clone()).json(&payload).send().await?;

        // Any answer is a completed attempt; only transport failures are errors.
        let status = response.status();
        if !status.is_success() {
            tracing::error!(
                category = %alert.category,
                status = status.as_u16(),
                "webhook answered with a non-success status"
            );
        }
        Ok(())
    }
}

/// Stand-in when no webhook is configured; the alert only reaches the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleSink;

#[async_trait::async_trait]
impl AlertSink for ConsoleSink {
    async fn send(&self, alert: &Alert) -> Result<(), DeliveryError> {
        tracing::warn!(category = %alert.category, "{}", alert.text());
        Ok(())
    }
}
