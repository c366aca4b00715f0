//! Bucket upload watcher.
//!
//! Watches the local bucket directory for new audio files and emits events
//! once a file is stable (the writer has finished flushing it).

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Result;
use chrono::{DateTime, Utc};
use notify::RecursiveMode;
use notify_debouncer_mini::new_debouncer;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

#[derive(Debug, Error)]
pub enum WatcherError {
    #[error("Bucket directory does not exist: {0}")]
    DirectoryNotFound(PathBuf),

    #[error("Notify error: {0}")]
    Notify(#[from] notify::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration for the upload watcher
#[derive(Debug, Clone)]
pub struct WatcherConfig {
    /// Bucket root to watch
    pub bucket: PathBuf,

    /// How long a file must be stable before it counts as finalized (seconds)
    pub stability_delay_secs: u64,

    /// File extensions to watch
    pub extensions: Vec<String>,
}

impl WatcherConfig {
    pub fn validate(&self) -> Result<(), WatcherError> {
        if !self.bucket.exists() {
            return Err(WatcherError::DirectoryNotFound(self.bucket.clone()));
        }
        Ok(())
    }
}

/// Event emitted when an uploaded audio file is stable
#[derive(Debug, Clone)]
pub struct UploadEvent {
    /// Object path relative to the bucket root
    pub object_path: String,

    /// File size in bytes
    pub size: u64,

    pub detected_at: DateTime<Utc>,
}

/// Upload watcher with stability checking
pub struct UploadWatcher {
    config: WatcherConfig,
}

impl UploadWatcher {
    pub fn new(config: WatcherConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &WatcherConfig {
        &self.config
    }

    /// Watch the bucket and emit events for new stable audio files. Runs
    /// until stopped via the returned handle.
    pub async fn watch(&self) -> Result<(mpsc::Receiver<UploadEvent>, WatchHandle)> {
        self.config.validate()?;

        let (event_tx, event_rx) = mpsc::channel::<UploadEvent>(100);
        let (stop_tx, mut stop_rx) = mpsc::channel::<()>(1);

        let config = self.config.clone();

        let task = tokio::spawn(async move {
            if let Err(e) = run_watcher(config, event_tx, &mut stop_rx).await {
                error!("Watcher error: {}", e);
            }
        });

        Ok((event_rx, WatchHandle { stop_tx, task }))
    }
}

/// Handle to control the watcher
pub struct WatchHandle {
    stop_tx: mpsc::Sender<()>,
    task: tokio::task::JoinHandle<()>,
}

impl WatchHandle {
    pub async fn stop(self) -> Result<()> {
        let _ = self.stop_tx.send(()).await;
        self.task.await?;
        Ok(())
    }
}

fn is_audio_file(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}

fn relative_object_path(bucket: &Path, path: &Path) -> Option<String> {
    path.strip_prefix(bucket)
        .ok()
        .map(|rel| rel.to_string_lossy().replace('\\', "/"))
}

/// Internal watcher loop
async fn run_watcher(
    config: WatcherConfig,
    event_tx: mpsc::Sender<UploadEvent>,
    stop_rx: &mut mpsc::Receiver<()>,
) -> Result<()> {
    // Files being stabilized (path -> (size, last_seen))
    let mut pending: HashMap<PathBuf, (u64, Instant)> = HashMap::new();

    let (tx, rx) = std::sync::mpsc::channel();

    let mut debouncer = new_debouncer(Duration::from_secs(2), tx)?;

    // Uploads land in per-user subdirectories, so recurse
    debouncer
        .watcher()
        .watch(&config.bucket, RecursiveMode::Recursive)?;

    let stability_delay = Duration::from_secs(config.stability_delay_secs);

    info!("Watching {} for uploaded audio", config.bucket.display());

    loop {
        if stop_rx.try_recv().is_ok() {
            info!("Watcher stopping...");
            break;
        }

        match rx.recv_timeout(Duration::from_millis(500)) {
            Ok(Ok(events)) => {
                for event in events {
                    let path = event.path;

                    if !is_audio_file(&path, &config.extensions) {
                        continue;
                    }

                    if let Ok(metadata) = std::fs::metadata(&path) {
                        if metadata.is_file() {
                            pending.insert(path, (metadata.len(), Instant::now()));
                        }
                    }
                }
            }
            Ok(Err(e)) => {
                warn!("Watcher error: {:?}", e);
            }
            Err(std::sync::mpsc::RecvTimeoutError::Timeout) => {
                // Expected, continue to stability check
            }
            Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => {
                error!("Watcher channel disconnected");
                break;
            }
        }

        // Promote files whose size held still for the full delay
        let now = Instant::now();
        let mut stable_files = Vec::new();

        for (path, (last_size, last_seen)) in pending.iter() {
            if now.duration_since(*last_seen) >= stability_delay {
                if let Ok(metadata) = std::fs::metadata(path) {
                    let current_size = metadata.len();
                    if current_size == *last_size && current_size > 0 {
                        stable_files.push((path.clone(), current_size));
                    }
                }
            }
        }

        for (path, size) in stable_files {
            pending.remove(&path);

            let Some(object_path) = relative_object_path(&config.bucket, &path) else {
                debug!("Ignoring file outside bucket: {}", path.display());
                continue;
            };

            info!(object = %object_path, bytes = size, "Upload finalized");

            let _ = event_tx
                .send(UploadEvent {
                    object_path,
                    size,
                    detected_at: Utc::now(),
                })
                .await;
        }

        // Small sleep to prevent busy loop
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_filter() {
        let extensions = vec!["m4a".to_string(), "mp3".to_string()];

        assert!(is_audio_file(Path::new("/b/users/u1/audio/n.m4a"), &extensions));
        assert!(is_audio_file(Path::new("/b/users/u1/audio/n.M4A"), &extensions));
        assert!(!is_audio_file(Path::new("/b/users/u1/audio/n.txt"), &extensions));
        assert!(!is_audio_file(Path::new("/b/users/u1/audio/noext"), &extensions));
    }

    #[test]
    fn test_relative_object_path() {
        let bucket = Path::new("/data/bucket");
        let path = Path::new("/data/bucket/users/u1/audio/note-0001.m4a");

        assert_eq!(
            relative_object_path(bucket, path),
            Some("users/u1/audio/note-0001.m4a".to_string())
        );
        assert_eq!(
            relative_object_path(bucket, Path::new("/elsewhere/x.m4a")),
            None
        );
    }

    #[test]
    fn test_validate_missing_bucket() {
        let config = WatcherConfig {
            bucket: PathBuf::from("/definitely/not/here"),
            stability_delay_secs: 1,
            extensions: vec!["m4a".to_string()],
        };

        assert!(matches!(
            config.validate(),
            Err(WatcherError::DirectoryNotFound(_))
        ));
    }
}
