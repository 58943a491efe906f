// SPDX-License-Identifier: MIT OR Apache-2.0

pub mod list_installed;
pub mod sync;
pub mod uninstall;

use libcomponent_sync::{Engine, InstallListener};
use std::sync::Arc;

use crate::cli_config::CliConfig;

fn build_engine(
    config: &CliConfig,
    listener: Arc<dyn InstallListener>,
) -> libcomponent_sync::Result<Engine> {
    Engine::builder(config.inner.clone())
        .listener(listener)
        .build()
}
