//! Decodes proxy access-log lines into the two fields the monitor cares about.

use serde_json::{Map, Value};

/// One request as seen by the monitor: which pool served it and what the
/// upstream answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolEvent {
    pub pool: String,
    pub status: String,
}

impl PoolEvent {
    /// A request counts as an error when the upstream status is a 5xx.
    pub fn is_error(&self) -> bool {
        self.status.starts_with('5')
    }
}

/// Returns `None` for anything that is not a usable request record: invalid
/// JSON, a value that is not an object, or an object without a non-empty
/// string `pool` and `upstream_status`.
pub fn parse_line(line: &str) -> Option<PoolEvent> {
    let record: Map<String, Value> = match serde_json::from_str(line) {
        Ok(r) => r,
        Err(err) => {
            tracing::trace!(%err, "dropping undecodable log line");
            return None;
        }
    };
    let pool = non_empty_str(&record, "pool")?;
    let status = non_empty_str(&record, "upstream_status")?;
    Some(PoolEvent { pool, status })
}

fn non_empty_str(record: &Map<String, Value>, key: &str) -> Option<String> {
    record
        .get(key)
        .and_then(Value::as_str)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
