// SPDX-License-Identifier: MIT OR Apache-2.0

use std::path::{Component as PathComponent, Path};

use crate::{Error, Result, context::SyncContext, fs_utils};

/// removes the directory recorded for `id` and then its mapping entry.
/// an id with no recorded location is already uninstalled.
pub(crate) fn uninstall(ctx: &SyncContext, id: &str) -> Result<()> {
    let Some(location) = ctx.mapping.location(id)? else {
        log::debug!(target: "uninstall", "{id} is not installed");
        return Ok(());
    };

    if !is_contained(&location) {
        return Err(Error::mapping(format!(
            "refusing to delete '{location}' recorded for {id}"
        )));
    }

    let dir = ctx.paths.resolve(&location);
    fs_utils::delete_directory_recursive(&dir)?;
    ctx.mapping.remove_entry(id)?;

    log::info!(target: "uninstall", "removed {id} from {}", dir.display());
    Ok(())
}

fn is_contained(location: &str) -> bool {
    let path = Path::new(location);
    !location.trim().is_empty()
        && path
            .components()
            .all(|c| matches!(c, PathComponent::Normal(_) | PathComponent::CurDir))
}
