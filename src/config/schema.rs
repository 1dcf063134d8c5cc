//! Configuration schema definitions.
//!
//! All types derive Serde traits: `Deserialize` for config files and
//! `Serialize` because the active configuration is flattened into every
//! reload message sent to clients.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration for a serve run.
///
/// Constructed once at `start()` and never mutated afterwards. Unset fields
/// fall back to the documented defaults; `root` is the only required field.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServeConfig {
    /// Bind host.
    pub host: String,

    /// Bind port. Port 0 asks the OS for an ephemeral port.
    pub port: u16,

    /// Directory files are served from. Required; no default.
    pub root: PathBuf,

    /// Directories monitored for changes. Empty means "watch `root`".
    pub watch_dirs: Vec<PathBuf>,

    /// Debounce delay applied to change notifications, in milliseconds.
    pub debounce_ms: u64,

    /// Glob patterns excluded from watching.
    pub ignore: Vec<String>,

    /// Inject the reload-client script into served HTML.
    pub inject: bool,

    /// Open a browser after startup. Acted on by the host, not by this crate.
    pub open_browser: bool,

    /// Optional TLS material for the listener.
    pub tls: Option<TlsConfig>,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8125,
            root: PathBuf::new(),
            watch_dirs: Vec::new(),
            debounce_ms: 200,
            ignore: vec![
                "node_modules".to_string(),
                ".git".to_string(),
                ".cache".to_string(),
            ],
            inject: true,
            open_browser: true,
            tls: None,
        }
    }
}

impl ServeConfig {
    /// Create a configuration for `root` with every other field defaulted.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    /// The directories the file watcher monitors.
    ///
    /// Falls back to `[root]` when no watch directories are configured.
    pub fn effective_watch_dirs(&self) -> Vec<PathBuf> {
        if self.watch_dirs.is_empty() {
            vec![self.root.clone()]
        } else {
            self.watch_dirs.clone()
        }
    }

    /// The `host:port` string the listener binds.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: PathBuf,

    /// Path to private key file (PEM).
    pub key_path: PathBuf,
}
