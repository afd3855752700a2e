//! File watching for automatic configuration reloads.

use crate::error::{ConfError, Result};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher as NotifyWatcher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{Instant, sleep};

/// Watches configuration files and emits debounced reload signals.
///
/// Bursts of filesystem events (editors often write a file in several steps)
/// collapse into one signal per debounce window. Must be created inside a
/// tokio runtime.
///
/// # Examples
///
/// ```rust,no_run
/// use hotlog_conf::notify::ConfigWatcher;
/// use std::time::Duration;
///
/// # async fn example() -> hotlog_conf::error::Result<()> {
/// let (watcher, mut rx) = ConfigWatcher::new(Duration::from_millis(500))?;
/// watcher.watch("/etc/app/log.conf")?;
///
/// while let Some(()) = rx.recv().await {
///     println!("log configuration changed");
/// }
/// # Ok(())
/// # }
/// ```
pub struct ConfigWatcher {
    watcher: Arc<parking_lot::Mutex<RecommendedWatcher>>,
    debounce_duration: Duration,
    watched_paths: Arc<parking_lot::Mutex<Vec<PathBuf>>>,
}

impl ConfigWatcher {
    /// Create a watcher and the receiver its reload signals arrive on.
    ///
    /// # Errors
    ///
    /// Returns [`ConfError::Watch`] if the platform watcher cannot be created.
    pub fn new(debounce_duration: Duration) -> Result<(Self, mpsc::Receiver<()>)> {
        let (tx, rx) = mpsc::channel(16);
        let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Event>();

        let watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
            Ok(event) if matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) => {
                let _ = event_tx.send(event);
            }
            Ok(_) => {}
            Err(e) => tracing::warn!(error = %e, "configuration watch error"),
        })
        .map_err(|e| ConfError::Watch(format!("failed to create file watcher: {}", e)))?;

        let debounce = debounce_duration;
        tokio::spawn(async move {
            let mut last_signal: Option<Instant> = None;

            while event_rx.recv().await.is_some() {
                let now = Instant::now();
                match last_signal {
                    Some(last) if now.duration_since(last) < debounce => {
                        // fold the burst into one trailing signal
                        let remaining = debounce - now.duration_since(last);
                        sleep(remaining).await;
                        while event_rx.try_recv().is_ok() {}
                    }
                    _ => {}
                }
                if tx.send(()).await.is_err() {
                    break;
                }
                last_signal = Some(Instant::now());
            }
        });

        Ok((
            Self {
                watcher: Arc::new(parking_lot::Mutex::new(watcher)),
                debounce_duration,
                watched_paths: Arc::new(parking_lot::Mutex::new(Vec::new())),
            },
            rx,
        ))
    }

    /// Start watching `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the path does not exist or cannot be watched.
    pub fn watch(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let canonical_path = path.canonicalize().map_err(|source| ConfError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        self.watcher
            .lock()
            .watch(&canonical_path, RecursiveMode::NonRecursive)
            .map_err(|e| ConfError::Watch(format!("failed to watch {}: {}", path.display(), e)))?;

        let mut paths = self.watched_paths.lock();
        if !paths.contains(&canonical_path) {
            tracing::debug!(path = %canonical_path.display(), "watching configuration file");
            paths.push(canonical_path);
        }
        Ok(())
    }

    /// Stop watching `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the path cannot be resolved or was not watched.
    pub fn unwatch(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let canonical_path = path.canonicalize().map_err(|source| ConfError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        self.watcher
            .lock()
            .unwatch(&canonical_path)
            .map_err(|e| ConfError::Watch(format!("failed to unwatch {}: {}", path.display(), e)))?;

        self.watched_paths.lock().retain(|p| p != &canonical_path);
        Ok(())
    }

    /// Minimum spacing between two reload signals.
    pub fn debounce_duration(&self) -> Duration {
        self.debounce_duration
    }

    /// Currently watched paths, canonicalized.
    pub fn watched_paths(&self) -> Vec<PathBuf> {
        self.watched_paths.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;
    use tokio::time::timeout;

    #[tokio::test]
    async fn test_watch_and_unwatch() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("log.conf");
        fs::write(&config_path, "*.* >stdout\n").unwrap();

        let (watcher, _rx) = ConfigWatcher::new(Duration::from_millis(100)).unwrap();
        watcher.watch(&config_path).unwrap();
        watcher.watch(&config_path).unwrap();
        assert_eq!(watcher.watched_paths().len(), 1);

        watcher.unwatch(&config_path).unwrap();
        assert!(watcher.watched_paths().is_empty());
    }

    #[tokio::test]
    async fn test_watch_nonexistent_file() {
        let (watcher, _rx) = ConfigWatcher::new(Duration::from_millis(100)).unwrap();
        assert!(matches!(
            watcher.watch("/nonexistent/log.conf"),
            Err(ConfError::Io { .. })
        ));
    }

    #[tokio::test]
    async fn test_file_change_emits_signal() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("log.conf");
        fs::write(&config_path, "*.* >stdout\n").unwrap();

        let (watcher, mut rx) = ConfigWatcher::new(Duration::from_millis(100)).unwrap();
        watcher.watch(&config_path).unwrap();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            fs::write(&config_path, "*.* >stderr\n").unwrap();
        });

        let result = timeout(Duration::from_secs(2), rx.recv()).await;
        assert!(matches!(result, Ok(Some(()))));
    }

    #[tokio::test]
    async fn test_debounce_duration() {
        let duration = Duration::from_millis(500);
        let (watcher, _rx) = ConfigWatcher::new(duration).unwrap();
        assert_eq!(watcher.debounce_duration(), duration);
    }
}
