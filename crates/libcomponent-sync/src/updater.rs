// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    Component, Error, LatestManifest, Result, context::SyncContext, installer, version,
};

#[derive(Debug)]
pub(crate) enum UpdateOutcome {
    /// no `latestUrl`, or the install was skipped.
    Skipped,
    UpToDate { installed: String },
    Updated(Box<Component>),
}

/// installs the version advertised at `latestUrl` when it is newer than what is on disk.
pub(crate) fn check_for_update(ctx: &SyncContext, component: &Component) -> Result<UpdateOutcome> {
    let Some(info) = component.package_info.as_ref() else {
        return Ok(UpdateOutcome::Skipped);
    };

    let Some(latest_url) = info.latest_url.as_deref().filter(|u| !u.trim().is_empty()) else {
        log::warn!(target: "update", "{} has no latest url, skipping update check", component.id);
        return Ok(UpdateOutcome::Skipped);
    };

    let body = ctx.transport.fetch(latest_url)?;
    let latest: LatestManifest = serde_json::from_slice(&body)
        .map_err(|e| Error::manifest(format!("{latest_url}: {e}")))?;

    // the package on disk is authoritative over the version the host synced
    let installed = installed_version(ctx, &info.identifier)?;

    if !version::is_update_available(&installed, &latest.version) {
        log::debug!(
            target: "update",
            "{} is up to date ({installed}, latest {})",
            component.id,
            latest.version
        );
        return Ok(UpdateOutcome::UpToDate { installed });
    }

    log::info!(
        target: "update",
        "{} {installed} -> {}",
        component.id,
        latest.version
    );

    let mut target = component.clone();
    if let Some(target_info) = target.package_info.as_mut() {
        target_info.version = Some(latest.version);
        if let Some(url) = latest.download_url.filter(|u| !u.trim().is_empty()) {
            target_info.download_url = Some(url);
        }
    }

    Ok(match installer::install(ctx, &target)? {
        Some(updated) => UpdateOutcome::Updated(Box::new(updated)),
        None => UpdateOutcome::Skipped,
    })
}

fn installed_version(ctx: &SyncContext, identifier: &str) -> Result<String> {
    let manifest = installer::read_package_manifest(&ctx.paths.install_dir(identifier))?;
    Ok(manifest.version.unwrap_or_default())
}
