//! Error types for alert delivery.

use thiserror::Error;

/// Why an alert could not be handed to the notification endpoint.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The webhook URL could not be parsed.
    #[error("invalid webhook url: {0}")]
    InvalidUrl(String),

    /// The endpoint did not answer within the configured timeout.
    #[error("webhook request timed out")]
    Timeout,

    /// Connection, TLS or protocol failure.
    #[error("webhook transport error: {0}")]
    Transport(#[source] reqwest::Error),
}

impl From<reqwest::Error> for DeliveryError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            DeliveryError::Timeout
        } else {
            DeliveryError::Transport(err)
        }
    }
}
