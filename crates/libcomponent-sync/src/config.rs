// SPDX-License-Identifier: MIT OR Apache-2.0

use std::{path::PathBuf, time::Duration};

const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_ENTRY_SCHEME: &str = "sn";
const DEFAULT_DOWNLOAD_TIMEOUT_SECS: u64 = 120;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// verbosity level for operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    Quiet,
    #[default]
    Normal,
    Verbose,
}

impl std::fmt::Display for Verbosity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Quiet => write!(f, "quiet"),
            Self::Normal => write!(f, "normal"),
            Self::Verbose => write!(f, "verbose"),
        }
    }
}

/// configuration for the sync engine.
///
/// hosts construct this directly; the cli builds it from its toml file.
#[derive(Debug, Clone)]
pub struct Config {
    /// directory that holds `Extensions/`.
    pub root: PathBuf,

    /// attempts per task before it is dropped from the queue.
    pub max_attempts: u32,

    /// scheme prefix of the entry point handed back to the host.
    pub entry_scheme: String,

    /// upper bound on a single download or manifest request.
    pub download_timeout: Duration,

    pub connect_timeout: Duration,

    /// component ids that are never auto-updated.
    pub excluded_components: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: crate::paths::default_root(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            entry_scheme: DEFAULT_ENTRY_SCHEME.to_string(),
            download_timeout: Duration::from_secs(DEFAULT_DOWNLOAD_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            excluded_components: Vec::new(),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    /// values below one are raised to one.
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn with_entry_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.entry_scheme = scheme.into();
        self
    }

    pub fn with_download_timeout(mut self, timeout: Duration) -> Self {
        self.download_timeout = timeout;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_excluded_components(mut self, ids: Vec<String>) -> Self {
        self.excluded_components = ids;
        self
    }

    pub(crate) fn is_excluded(&self, id: &str) -> bool {
        self.excluded_components.iter().any(|e| e == id)
    }
}
