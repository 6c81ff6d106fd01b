//! Log ingestion layer: a generic interface for streaming lines out of a growing log.
//!
//! The monitor depends on `LineSource` rather than on a concrete reader. `FileTail`
//! is the file-backed implementation: it behaves like `tail -F`, polling for new
//! data and reopening the path when the file is truncated or replaced by rotation.

use std::fs::Metadata;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncSeekExt, BufReader, SeekFrom};
use tokio::sync::mpsc::Sender;
use tokio::time::sleep;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Generic trait for line sources.
///
/// Implementors send lines to the channel, in order, until the receiver goes away.
#[async_trait::async_trait]
pub trait LineSource {
    async fn stream(self, tx: Sender<String>) -> Result<()>;
}

/// Follows a file across appends, truncation and rotation.
pub struct FileTail {
    pub path: PathBuf,
    /// Start at offset 0 instead of the current end of the file.
    pub from_start: bool,
    pub poll_interval: Duration,
}

impl FileTail {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            from_start: false,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

// (device, inode) on unix; elsewhere rotation is only detected through truncation.
#[cfg(unix)]
fn file_identity(meta: &Metadata) -> Option<(u64, u64)> {
    use std::os::unix::fs::MetadataExt;
    Some((meta.dev(), meta.ino()))
}

#[cfg(not(unix))]
fn file_identity(_meta: &Metadata) -> Option<(u64, u64)> {
    None
}

struct OpenLog {
    reader: BufReader<File>,
    offset: u64,
    identity: Option<(u64, u64)>,
}

impl OpenLog {
    async fn open(path: &Path, at_end: bool) -> Result<Self> {
        let mut file = File::open(path)
            .await
            .with_context(|| format!("failed to open {}", path.display()))?;
        let offset = if at_end { file.seek(SeekFrom::End(0)).await? } else { 0 };
        let identity = file_identity(&file.metadata().await?);
        Ok(Self {
            reader: BufReader::new(file),
            offset,
            identity,
        })
    }

    /// True when the path now holds a different file, or this one shrank
    /// below what was already read.
    async fn rotated(&self, path: &Path) -> bool {
        match tokio::fs::metadata(path).await {
            Ok(meta) => meta.len() < self.offset || file_identity(&meta) != self.identity,
            // Moved away and not recreated yet; keep the old handle.
            Err(_) => false,
        }
    }
}

#[async_trait::async_trait]
impl LineSource for FileTail {
    async fn stream(self, tx: Sender<String>) -> Result<()> {
        let mut log = OpenLog::open(&self.path, !self.from_start).await?;
        let mut buf: Vec<u8> = Vec::new();
        loop {
            let n = log.reader.read_until(b'\n', &mut buf).await?;
            log.offset += n as u64;

            if n == 0 {
                if tx.is_closed() {
                    break;
                }
                if log.rotated(&self.path).await {
                    tracing::info!(path = %self.path.display(), "log file rotated, reopening");
                    match OpenLog::open(&self.path, false).await {
                        Ok(reopened) => {
                            log = reopened;
                            buf.clear();
                            continue;
                        }
                        Err(err) => tracing::debug!(error = %err, "reopen failed, retrying"),
                    }
                }
                sleep(self.poll_interval).await;
                continue;
            }

            // A writer may flush half a line; wait for the rest.
            if buf.last() != Some(&b'\n') {
                continue;
            }
            buf.pop();
            if buf.last() == Some(&b'\r') {
                buf.pop();
            }
            let line = String::from_utf8_lossy(&buf).into_owned();
            buf.clear();
            if tx.send(line).await.is_err() {
                break; // receiver gone
            }
        }
        Ok(())
    }
}

/// Blocks until `path` exists, checking every `interval`.
pub async fn wait_for_file(path: &Path, interval: Duration) {
    while !tokio::fs::try_exists(path).await.unwrap_or(false) {
        tracing::info!(
            path = %path.display(),
            retry_secs = interval.as_secs_f64(),
            "log file not found, waiting"
        );
        sleep(interval).await;
    }
}
