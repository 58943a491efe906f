//! # libcomponent-sync
//!
//! Keeps a local directory of downloadable components (themes, editors and
//! other plugin-like packages) in step with the set a host application wants.
//!
//! ## Features
//!
//! - **Serialized sync queue**: requests run one task at a time, in arrival order
//! - **Retries**: a failing task is attempted up to `max_attempts` times before it is dropped
//! - **Opposite-task cancellation**: a queued install and uninstall of the same component collapse to nothing
//! - **Parallel reconciliation**: the components of one task are installed concurrently
//! - **Unnesting extraction**: zip archives wrapped in a single top-level folder are flattened
//! - **Durable mapping**: `Extensions/mapping.json` records where every component lives
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use libcomponent_sync::{Component, Config, Engine, InstallError, PackageInfo};
//!
//! # fn main() -> libcomponent_sync::Result<()> {
//! let engine = Engine::builder(Config::new())
//!     .listener(Arc::new(|component: &Component, error: Option<&InstallError>| {
//!         match error {
//!             None => println!("{} ready at {:?}", component.id, component.local_entry_point()),
//!             Some(e) => println!("{} failed: {} ({})", component.id, e.message, e.tag),
//!         }
//!     }))
//!     .build()?;
//!
//! engine.request_sync(vec![Component::new("abc", "Markdown Editor").with_package_info(
//!     PackageInfo::new("org.example.markdown")
//!         .with_download_url("https://example.org/markdown.zip")
//!         .with_latest_url("https://example.org/markdown/latest.json"),
//! )]);
//! engine.request_sync(vec![Component::deletion("old-theme")]);
//!
//! engine.wait_idle();
//! println!("{} components installed", engine.installed()?.len());
//! # Ok(())
//! # }
//! ```
//!
//! ### Error Handling
//!
//! Install failures reach the host through [`InstallListener`], tagged with an
//! [`ErrorTag`]. [`Error::tag()`] performs the same classification for library
//! callers and [`Error::is_transient()`] separates network and disk failures
//! from permanent ones.
//!
//! ### Custom capabilities
//!
//! Downloads and extraction go through the [`Transport`] and [`Extractor`]
//! traits. [`HttpTransport`] and [`NestedZipExtractor`] are used unless the
//! builder is given others.

// SPDX-License-Identifier: MIT OR Apache-2.0

pub mod config;
mod context;
pub mod engine;
pub mod error;
pub mod fs_utils;
mod installer;
pub mod mapping;
pub mod paths;
mod queue;
mod sync;
pub mod transport;
pub mod types;
mod uninstaller;
mod updater;
pub mod version;

#[cfg(test)]
mod test_support;

pub use config::{Config, Verbosity};
pub use engine::{Engine, EngineBuilder};
pub use error::{Error, Result};
pub use mapping::MappingStore;
pub use paths::Paths;
pub use transport::{
    Extractor, HttpTransport, InstallListener, LogListener, NestedZipExtractor, Transport,
};
pub use types::{
    Component, DEFAULT_ENTRY_FILE, ErrorTag, InstallError, LatestManifest, Mapping, MappingEntry,
    PackageInfo, PackageManifest, SyncTask,
};
pub use version::{compare as compare_versions, is_update_available};
