// SPDX-License-Identifier: MIT OR Apache-2.0

use std::path::{Path, PathBuf};

use crate::Component;

const EXTENSIONS_DIR: &str = "Extensions";
pub const DOWNLOADS_DIR: &str = "downloads";
pub const MAPPING_FILE: &str = "mapping.json";

/// true for names the engine itself keeps directly under `Extensions/`.
///
/// compared case-insensitively so case-folding filesystems are covered too.
pub fn is_reserved_name(name: &str) -> bool {
    [DOWNLOADS_DIR, MAPPING_FILE]
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(name))
}

/// default components root when the host does not supply one.
pub fn default_root() -> PathBuf {
    dirs::data_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join(".local/share")))
        .unwrap_or_default()
        .join("component-sync")
}

/// computes every on-disk location the engine touches, relative to one root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    root: PathBuf,
}

impl Paths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn extensions_dir(&self) -> PathBuf {
        self.root.join(EXTENSIONS_DIR)
    }

    pub fn downloads_dir(&self) -> PathBuf {
        self.extensions_dir().join(DOWNLOADS_DIR)
    }

    /// `{root}/Extensions/{identifier}`
    pub fn install_dir(&self, identifier: &str) -> PathBuf {
        self.extensions_dir().join(identifier)
    }

    /// install location as recorded in the mapping file.
    pub fn relative_install_path(&self, identifier: &str) -> String {
        format!("{EXTENSIONS_DIR}/{identifier}")
    }

    /// `{root}/Extensions/downloads/{name}.zip`
    pub fn download_staging_path(&self, component: &Component) -> PathBuf {
        self.downloads_dir()
            .join(format!("{}.zip", component.archive_stem()))
    }

    /// `{root}/Extensions/mapping.json`
    pub fn mapping_file_path(&self) -> PathBuf {
        self.extensions_dir().join(MAPPING_FILE)
    }

    /// resolves a mapping location back to an absolute path.
    pub fn resolve(&self, location: &str) -> PathBuf {
        self.root.join(location)
    }
}
