use std::future::Future;

use anyhow::{Context, Result};
use tokio::sync::mpsc;

use crate::alert::{AlertSink, ConsoleSink, WebhookSink};
use crate::cli::Config;
use crate::dispatcher::Dispatcher;
use crate::log::{FileTail, LineSource, wait_for_file};

const LINE_CHANNEL_CAPACITY: usize = 1024;

/// Monitor runtime: wires the log source, the dispatcher and the alert sink.
pub async fn run(config: Config) -> Result<()> {
    tracing::info!(
        log_file = %config.log_file.display(),
        threshold = config.error_rate_threshold,
        window = config.window_size,
        cooldown_secs = config.alert_cooldown.as_secs(),
        maintenance = config.maintenance_mode,
        initial_pool = %config.initial_pool,
        "log watcher started"
    );

    let sink = build_sink(&config)?;

    wait_for_file(&config.log_file, config.file_poll_interval).await;
    tracing::info!(path = %config.log_file.display(), "log file found, tailing for new entries");

    // Channel for log lines
    let (tx, rx) = mpsc::channel::<String>(LINE_CHANNEL_CAPACITY);

    // Spawn log reader
    let source = FileTail {
        from_start: config.from_start,
        ..FileTail::new(config.log_file.clone())
    };
    let reader = tokio::spawn(async move { source.stream(tx).await });

    let mut dispatcher = Dispatcher::new(&config, sink);
    let processed = drive(rx, &mut dispatcher, shutdown_signal()).await;
    tracing::info!(
        processed,
        active_pool = dispatcher.active_pool().unwrap_or("unknown"),
        window_errors = dispatcher.window().error_count(),
        "log watcher stopped"
    );

    // No-op if the reader already ended; then its result is what we report.
    reader.abort();
    match reader.await {
        Ok(result) => result,
        Err(err) if err.is_cancelled() => Ok(()),
        Err(err) => Err(err).context("log reader task panicked"),
    }
}

fn build_sink(config: &Config) -> Result<Box<dyn AlertSink>> {
    match &config.webhook_url {
        Some(url) => {
            let sink = WebhookSink::new(url, config.alert_timeout)
                .context("invalid webhook configuration")?;
            Ok(Box::new(sink))
        }
        None => {
            tracing::warn!("SLACK_WEBHOOK_URL is not set, alerts will be printed to the console only");
            Ok(Box::new(ConsoleSink))
        }
    }
}

/// Feeds lines to the dispatcher one at a time until the source closes or
/// `shutdown` resolves. Returns the number of lines consumed.
pub async fn drive(
    mut rx: mpsc::Receiver<String>,
    dispatcher: &mut Dispatcher,
    shutdown: impl Future<Output = ()>,
) -> u64 {
    tokio::pin!(shutdown);
    let mut processed = 0;
    loop {
        tokio::select! {
            line = rx.recv() => match line {
                Some(line) => {
                    dispatcher.process_line(&line).await;
                    processed += 1;
                }
                None => break,
            },
            _ = &mut shutdown => {
                tracing::info!("shutdown requested");
                break;
            }
        }
    }
    processed
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}
