// SPDX-License-Identifier: MIT OR Apache-2.0

use std::{fs, io, path::Path};

use crate::{
    Component, DEFAULT_ENTRY_FILE, Error, InstallError, PackageManifest, Result,
    context::SyncContext, fs_utils,
};

const PACKAGE_MANIFEST: &str = "package.json";

/// installs `component` and reports the outcome to the host listener.
///
/// returns `Ok(None)` without notifying when the component has nothing to download.
pub(crate) fn install(ctx: &SyncContext, component: &Component) -> Result<Option<Component>> {
    let Some(url) = component.download_url() else {
        log::warn!(target: "install", "{} has no download url, skipping", component.id);
        return Ok(None);
    };

    match install_from_url(ctx, component, url) {
        Ok(installed) => {
            log::info!(
                target: "install",
                "installed {} at {}",
                installed.id,
                installed.local_entry_point().unwrap_or_default()
            );
            ctx.listener.on_install_complete(&installed, None);
            Ok(Some(installed))
        }
        Err(e) => {
            log::error!(target: "install", "failed for {}: {e}", component.id);
            ctx.listener
                .on_install_complete(component, Some(&InstallError::from(&e)));
            Err(e)
        }
    }
}

fn install_from_url(ctx: &SyncContext, component: &Component, url: &str) -> Result<Component> {
    let identifier = component
        .identifier()
        .ok_or_else(|| Error::invalid_component(format!("{} has no package info", component.id)))?;

    let install_dir = ctx.paths.install_dir(identifier);
    let staging = ctx.paths.download_staging_path(component);
    fs_utils::ensure_directory_exists(&ctx.paths.downloads_dir())?;

    log::debug!(target: "download", "{} <- {url}", staging.display());

    // stale files from a previous version must not survive next to the new ones
    let (downloaded, prepared) = rayon::join(
        || ctx.transport.download(url, &staging),
        || fs_utils::clear_directory(&install_dir),
    );
    if let Err(e) = downloaded.and(prepared) {
        discard(&install_dir);
        return Err(e);
    }

    if let Err(e) = ctx.extractor.extract(&staging, &install_dir) {
        discard(&install_dir);
        return Err(match e {
            Error::Io(io) => Error::extraction(io.to_string()),
            other => other,
        });
    }

    let installed = record_install(ctx, component, identifier, &install_dir);
    if installed.is_err() {
        discard(&install_dir);
    }
    installed
}

/// reads the extracted manifest, builds the entry point and records the mapping entry.
fn record_install(
    ctx: &SyncContext,
    component: &Component,
    identifier: &str,
    install_dir: &Path,
) -> Result<Component> {
    let manifest = read_package_manifest(install_dir)?;
    let entry_file = match manifest.main() {
        Some(main) => main.trim_start_matches('/').to_string(),
        None => {
            log::warn!(
                target: "install",
                "{} declares no entry point, using {DEFAULT_ENTRY_FILE}",
                component.id
            );
            DEFAULT_ENTRY_FILE.to_string()
        }
    };

    let location = ctx.paths.relative_install_path(identifier);
    let mut installed = component.clone();
    if let Some(info) = installed.package_info.as_mut() {
        if let Some(version) = manifest.version {
            info.version = Some(version);
        }
        info.local_entry_point = Some(format!(
            "{}://{location}/{entry_file}",
            ctx.config.entry_scheme
        ));
    }

    ctx.mapping.set_location(&component.id, &location)?;

    Ok(installed)
}

fn discard(install_dir: &Path) {
    if let Err(e) = fs_utils::delete_directory_recursive(install_dir) {
        log::warn!(target: "install", "could not remove partial {}: {e}", install_dir.display());
    }
}

/// parses `package.json` from an installed package directory.
pub(crate) fn read_package_manifest(dir: &Path) -> Result<PackageManifest> {
    let path = dir.join(PACKAGE_MANIFEST);
    let content = match fs::read_to_string(&path) {
        Ok(c) => c,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(Error::manifest(format!(
                "{PACKAGE_MANIFEST} not found in {}",
                dir.display()
            )));
        }
        Err(e) => return Err(e.into()),
    };

    serde_json::from_str(&content)
        .map_err(|e| Error::manifest(format!("{}: {e}", path.display())))
}
