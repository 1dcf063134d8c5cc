//! Recursive file watcher with per-path debounce.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashSet;
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::config::ServeConfig;
use crate::lifecycle::KillSwitch;
use crate::observability::metrics;

/// File extensions that produce change events. Everything else is discarded
/// silently.
pub const WATCHED_EXTENSIONS: &[&str] = &[
    ".json", ".js", ".ts", ".html", ".htm", ".xhtml", ".css", ".scss", ".less",
];

/// A debounced filesystem change, consumed immediately by the broadcaster.
#[derive(Debug, Clone)]
pub struct ChangeEvent {
    /// Path of the changed file.
    pub path: PathBuf,
    /// File extension including the leading dot, lowercased.
    pub extension: String,
    /// Full file content read after the debounce window.
    pub content: String,
    /// Snapshot of the configuration active for this run.
    pub config: Arc<ServeConfig>,
}

/// Error type for watcher startup.
#[derive(Debug, Error)]
pub enum WatchError {
    #[error("failed to start file watcher: {0}")]
    Notify(#[from] notify::Error),
}

/// Recursive watcher over the configured directories.
///
/// Owns the notify backend and the debounce pump task; dropping either stops
/// event delivery, so both are held until [`FileWatcher::close`].
pub struct FileWatcher {
    watcher: RecommendedWatcher,
    pump: JoinHandle<()>,
}

impl FileWatcher {
    /// Begin monitoring the configured directories.
    ///
    /// Emits [`ChangeEvent`]s on `events`. Notification-stream errors fire
    /// `kill`, which tears down the whole run.
    pub fn spawn(
        config: Arc<ServeConfig>,
        events: mpsc::UnboundedSender<ChangeEvent>,
        kill: KillSwitch,
    ) -> Result<Self, WatchError> {
        let ignore = compile_ignore_patterns(&config.ignore);
        let (raw_tx, raw_rx) = mpsc::unbounded_channel::<PathBuf>();

        // The callback runs on notify's own thread; it only filters and
        // forwards paths into the async side.
        let callback_ignore = ignore.clone();
        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if !(event.kind.is_modify() || event.kind.is_create()) {
                        return;
                    }
                    for path in event.paths {
                        if file_extension(&path).is_none() || is_ignored(&path, &callback_ignore) {
                            continue;
                        }
                        let _ = raw_tx.send(path);
                    }
                }
                Err(e) => {
                    kill.fire(format!("watcher error: {}", e));
                }
            },
            Config::default(),
        )?;

        for dir in config.effective_watch_dirs() {
            watcher.watch(&dir, RecursiveMode::Recursive)?;
            tracing::info!(directory = %dir.display(), "Watching");
        }

        let pump = tokio::spawn(debounce_pump(config, events, raw_rx));

        Ok(Self { watcher, pump })
    }

    /// Stop watching. Pending debounce timers may still fire, but their
    /// events land in a channel nobody reads after teardown.
    pub fn close(self) {
        drop(self.watcher);
        self.pump.abort();
        tracing::debug!("File watcher closed");
    }
}

/// Consume filtered paths and schedule one debounce timer per distinct path.
///
/// A path with a timer already pending is skipped; the read after the window
/// captures the last-observed content of the whole burst.
async fn debounce_pump(
    config: Arc<ServeConfig>,
    events: mpsc::UnboundedSender<ChangeEvent>,
    mut raw_rx: mpsc::UnboundedReceiver<PathBuf>,
) {
    let pending: Arc<DashSet<PathBuf>> = Arc::new(DashSet::new());
    let delay = Duration::from_millis(config.debounce_ms);

    while let Some(path) = raw_rx.recv().await {
        if !pending.insert(path.clone()) {
            continue;
        }

        let pending = Arc::clone(&pending);
        let events = events.clone();
        let config = Arc::clone(&config);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            pending.remove(&path);

            let Some(extension) = file_extension(&path) else {
                return;
            };
            match tokio::fs::read_to_string(&path).await {
                Ok(content) => {
                    metrics::record_change_event(&extension);
                    tracing::debug!(
                        path = %path.display(),
                        extension = %extension,
                        "Change event"
                    );
                    let _ = events.send(ChangeEvent {
                        path,
                        extension,
                        content,
                        config,
                    });
                }
                // File deleted mid-debounce or unreadable: skip, not fatal.
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "Skipping change event, file could not be read"
                    );
                }
            }
        });
    }
}

/// Extension of `path` including the leading dot, lowercased, if it is in
/// the watched set.
pub(crate) fn file_extension(path: &Path) -> Option<String> {
    let ext = path.extension()?.to_str()?;
    let dotted = format!(".{}", ext.to_ascii_lowercase());
    WATCHED_EXTENSIONS.contains(&dotted.as_str()).then_some(dotted)
}

/// Whether any path component (or the full path) matches an ignore pattern.
pub(crate) fn is_ignored(path: &Path, patterns: &[glob::Pattern]) -> bool {
    let full = path.to_string_lossy();
    for pattern in patterns {
        if pattern.matches(&full) {
            return true;
        }
        for component in path.components() {
            if pattern.matches(&component.as_os_str().to_string_lossy()) {
                return true;
            }
        }
    }
    false
}

/// Compile ignore globs, skipping invalid entries (validation rejects them
/// before a run starts; this guards programmatic callers).
fn compile_ignore_patterns(ignore: &[String]) -> Vec<glob::Pattern> {
    ignore
        .iter()
        .filter_map(|raw| match glob::Pattern::new(raw) {
            Ok(pattern) => Some(pattern),
            Err(e) => {
                tracing::warn!(pattern = %raw, error = %e, "Skipping invalid ignore pattern");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_filter_allows_watched_types() {
        assert_eq!(
            file_extension(Path::new("/site/app/app.js")),
            Some(".js".to_string())
        );
        assert_eq!(
            file_extension(Path::new("/site/INDEX.HTML")),
            Some(".html".to_string())
        );
        assert_eq!(file_extension(Path::new("/site/logo.png")), None);
        assert_eq!(file_extension(Path::new("/site/Makefile")), None);
    }

    #[test]
    fn ignore_matches_path_components() {
        let patterns = compile_ignore_patterns(&[
            "node_modules".to_string(),
            ".git".to_string(),
            "*.min.js".to_string(),
        ]);
        assert!(is_ignored(
            Path::new("/site/node_modules/lib/index.js"),
            &patterns
        ));
        assert!(is_ignored(Path::new("/site/.git/HEAD"), &patterns));
        assert!(is_ignored(Path::new("/site/app/app.min.js"), &patterns));
        assert!(!is_ignored(Path::new("/site/app/app.js"), &patterns));
    }

    #[test]
    fn invalid_patterns_are_skipped() {
        let patterns = compile_ignore_patterns(&["[".to_string(), ".git".to_string()]);
        assert_eq!(patterns.len(), 1);
    }
}
