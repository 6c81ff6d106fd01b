use clap::{ArgAction, Parser};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_LOG_FILE: &str = "/var/log/nginx/access.log";

/// Immutable configuration used by the monitor runtime
#[derive(Debug, Clone)]
pub struct Config {
    pub log_file: PathBuf,
    pub webhook_url: Option<String>,
    pub initial_pool: String,
    pub window_size: usize,
    pub error_rate_threshold: f64,
    pub alert_cooldown: Duration,
    pub maintenance_mode: bool,
    pub alert_timeout: Duration,
    pub file_poll_interval: Duration,
    pub from_start: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            webhook_url: None,
            initial_pool: "blue".to_string(),
            window_size: 200,
            error_rate_threshold: 2.0,
            alert_cooldown: Duration::from_secs(300),
            maintenance_mode: false,
            alert_timeout: Duration::from_secs(5),
            file_poll_interval: Duration::from_secs(5),
            from_start: false,
        }
    }
}

/// User-facing CLI arguments (kept private to the CLI layer).
/// Every option can also be supplied through its environment variable.
#[derive(Parser, Debug)]
#[command(name = "poolwatch", version, about = "Blue/green failover and error-rate alerting for proxy logs")]
struct Args {
    /// Access log to tail (one JSON object per line)
    #[arg(long, env = "LOG_FILE", default_value = DEFAULT_LOG_FILE)]
    log_file: PathBuf,

    /// Incoming webhook for alerts; alerts only go to the console when unset
    #[arg(long, env = "SLACK_WEBHOOK_URL")]
    webhook_url: Option<String>,

    /// Pool expected to be serving at startup (informational)
    #[arg(long, env = "ACTIVE_POOL", default_value = "blue")]
    active_pool: String,

    /// Number of recent requests the error rate is computed over
    #[arg(long, env = "WINDOW_SIZE", default_value = "200", value_parser = parse_window_size)]
    window_size: usize,

    /// Error rate, in percent, that must be exceeded to alert
    #[arg(long, env = "ERROR_RATE_THRESHOLD", default_value = "2.0", value_parser = parse_threshold)]
    error_rate_threshold: f64,

    /// Minimum seconds between two alerts of the same kind
    #[arg(long, env = "ALERT_COOLDOWN_SEC", default_value_t = 300)]
    alert_cooldown_sec: u64,

    /// Suppress every outbound alert ("true" to enable)
    #[arg(long, env = "MAINTENANCE_MODE", default_value = "false", action = ArgAction::Set, value_parser = parse_flag)]
    maintenance_mode: bool,

    /// Timeout for a single webhook request, in seconds
    #[arg(long, env = "ALERT_TIMEOUT_SEC", default_value = "5", value_parser = parse_timeout_secs)]
    alert_timeout_sec: u64,

    /// Seconds between checks while waiting for the log file to appear
    #[arg(long, env = "FILE_POLL_SEC", default_value_t = 5)]
    file_poll_sec: u64,

    /// Read the log from its beginning instead of only new lines ("true" to enable)
    #[arg(long, env = "FROM_START", default_value = "false", action = ArgAction::Set, value_parser = parse_flag)]
    from_start: bool,
}

impl From<Args> for Config {
    fn from(args: Args) -> Self {
        Config {
            log_file: args.log_file,
            webhook_url: args.webhook_url.filter(|url| !url.trim().is_empty()),
            initial_pool: args.active_pool,
            window_size: args.window_size,
            error_rate_threshold: args.error_rate_threshold,
            alert_cooldown: Duration::from_secs(args.alert_cooldown_sec),
            maintenance_mode: args.maintenance_mode,
            alert_timeout: Duration::from_secs(args.alert_timeout_sec),
            file_poll_interval: Duration::from_secs(args.file_poll_sec),
            from_start: args.from_start,
        }
    }
}

fn parse_window_size(s: &str) -> Result<usize, String> {
    match s.trim().parse::<usize>() {
        Ok(0) => Err("window size must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(format!("invalid window size {s:?}: {e}")),
    }
}

fn parse_timeout_secs(s: &str) -> Result<u64, String> {
    match s.trim().parse::<u64>() {
        Ok(0) => Err("alert timeout must be at least 1 second".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(format!("invalid alert timeout {s:?}: {e}")),
    }
}

fn parse_threshold(s: &str) -> Result<f64, String> {
    let value: f64 = s.trim().parse().map_err(|e| format!("invalid threshold {s:?}: {e}"))?;
    if !value.is_finite() || value < 0.0 {
        return Err(format!("threshold must be a non-negative percentage, got {s:?}"));
    }
    Ok(value)
}

// Anything other than "true" (any case) is off.
fn parse_flag(s: &str) -> Result<bool, String> {
    Ok(s.trim().eq_ignore_ascii_case("true"))
}

/// Parse CLI options and environment into an application Config
pub fn parse() -> Config {
    Args::parse().into()
}

// Command-line only: environment fallbacks are stripped so exported
// variables cannot leak into the result.
#[cfg(test)]
fn try_parse_from<I, T>(args: I) -> Result<Config, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    use clap::{CommandFactory, FromArgMatches};

    let matches = Args::command()
        .mut_args(|arg| arg.env(None::<&'static str>))
        .try_get_matches_from(args)?;
    Args::from_arg_matches(&matches).map(Config::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_defaults() {
        let config = try_parse_from([
            "poolwatch",
            "--log-file",
            "/tmp/access.log",
            "--webhook-url",
            "https://hooks.example.com/T000",
            "--window-size",
            "10",
            "--error-rate-threshold",
            "20",
            "--alert-cooldown-sec",
            "60",
            "--maintenance-mode",
            "TRUE",
        ])
        .unwrap();
        assert_eq!(config.log_file, PathBuf::from("/tmp/access.log"));
        assert_eq!(config.webhook_url.as_deref(), Some("https://hooks.example.com/T000"));
        assert_eq!(config.window_size, 10);
        assert_eq!(config.error_rate_threshold, 20.0);
        assert_eq!(config.alert_cooldown, Duration::from_secs(60));
        assert!(config.maintenance_mode);
    }

    #[test]
    fn empty_webhook_means_console_only() {
        let config = try_parse_from(["poolwatch", "--webhook-url", ""]).unwrap();
        assert_eq!(config.webhook_url, None);
    }

    #[test]
    fn rejects_invalid_numbers() {
        assert!(try_parse_from(["poolwatch", "--window-size", "0"]).is_err());
        assert!(try_parse_from(["poolwatch", "--window-size", "lots"]).is_err());
        assert!(try_parse_from(["poolwatch", "--error-rate-threshold", "abc"]).is_err());
        assert!(try_parse_from(["poolwatch", "--error-rate-threshold", "-1"]).is_err());
        assert!(try_parse_from(["poolwatch", "--alert-timeout-sec", "0"]).is_err());
    }

    #[test]
    fn flag_values_other_than_true_are_off() {
        assert!(!parse_flag("yes").unwrap());
        assert!(!parse_flag("1").unwrap());
        assert!(parse_flag("True").unwrap());
    }

    #[test]
    fn default_config_matches_documented_defaults() {
        let config = Config::default();
        assert_eq!(config.window_size, 200);
        assert_eq!(config.error_rate_threshold, 2.0);
        assert_eq!(config.alert_cooldown, Duration::from_secs(300));
        assert!(!config.maintenance_mode);
        assert_eq!(config.webhook_url, None);
    }

    #[test]
    fn parsing_without_flags_yields_defaults() {
        let config = try_parse_from(["poolwatch"]).unwrap();
        assert_eq!(config.log_file, PathBuf::from(DEFAULT_LOG_FILE));
        assert_eq!(config.window_size, 200);
        assert_eq!(config.error_rate_threshold, 2.0);
        assert_eq!(config.alert_timeout, Duration::from_secs(5));
        assert!(!config.maintenance_mode);
        assert!(!config.from_start);
        assert_eq!(config.webhook_url, None);
    }

    #[test]
    fn alert_timeout_must_be_positive() {
        assert!(parse_timeout_secs("0").is_err());
        assert_eq!(parse_timeout_secs("3"), Ok(3));
        let config = try_parse_from(["poolwatch", "--alert-timeout-sec", "2"]).unwrap();
        assert_eq!(config.alert_timeout, Duration::from_secs(2));
    }
}
