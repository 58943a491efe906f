// SPDX-License-Identifier: MIT OR Apache-2.0

use std::{fs, io};

use rayon::prelude::*;

use crate::{
    Component, Error, Result, context::SyncContext, installer, uninstaller,
    updater::{self, UpdateOutcome},
};

/// reconciles every component of one task concurrently.
///
/// components that share a staging archive name run one after another.
/// all components run to completion; the task fails if any of them failed.
pub(crate) fn sync_components(ctx: &SyncContext, components: &[Component]) -> Result<()> {
    let mut failures: Vec<(String, Error)> = staging_groups(components)
        .par_iter()
        .flat_map_iter(|group| {
            group
                .iter()
                .filter_map(|c| sync_component(ctx, c).err().map(|e| (c.id.clone(), e)))
                .collect::<Vec<_>>()
        })
        .collect();

    match failures.len() {
        0 => Ok(()),
        1 => Err(failures.remove(0).1),
        n => {
            let detail = failures
                .iter()
                .map(|(id, e)| format!("{id}: {e}"))
                .collect::<Vec<_>>()
                .join("; ");
            Err(Error::other(format!("{n} components failed: {detail}")))
        }
    }
}

/// groups components by the download staging file they would write, keeping task order.
fn staging_groups(components: &[Component]) -> Vec<Vec<&Component>> {
    let mut groups: Vec<(String, Vec<&Component>)> = Vec::new();
    for component in components {
        let stem = component.archive_stem();
        match groups.iter_mut().find(|(s, _)| *s == stem) {
            Some((_, group)) => group.push(component),
            None => groups.push((stem, vec![component])),
        }
    }
    groups.into_iter().map(|(_, group)| group).collect()
}

fn sync_component(ctx: &SyncContext, component: &Component) -> Result<()> {
    if let Err(e) = component.validate() {
        log::warn!(target: "sync", "skipping malformed component: {e}");
        return Ok(());
    }

    if component.deleted {
        return uninstaller::uninstall(ctx, &component.id);
    }

    let Some(info) = component.package_info.as_ref() else {
        log::debug!(target: "sync", "{} has no package, skipping", component.id);
        return Ok(());
    };

    if info.local_entry_point.is_none() {
        return installer::install(ctx, component).map(|_| ());
    }

    let install_dir = ctx.paths.install_dir(&info.identifier);
    match fs::metadata(&install_dir) {
        Ok(_) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            log::info!(
                target: "sync",
                "{} is missing from {}, reinstalling",
                component.id,
                install_dir.display()
            );
            return installer::install(ctx, component).map(|_| ());
        }
        Err(e) => return Err(e.into()),
    }

    if info.autoupdate_disabled || ctx.config.is_excluded(&component.id) {
        log::debug!(target: "sync", "{} has updates disabled", component.id);
        return Ok(());
    }

    match updater::check_for_update(ctx, component)? {
        UpdateOutcome::Updated(updated) => log::debug!(
            target: "sync",
            "{} updated to {}",
            updated.id,
            updated
                .package_info
                .as_ref()
                .and_then(|p| p.version.as_deref())
                .unwrap_or("?")
        ),
        UpdateOutcome::UpToDate { installed } => {
            log::debug!(target: "sync", "{} current at {installed}", component.id)
        }
        UpdateOutcome::Skipped => {}
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ErrorTag, PackageInfo, test_support::*};

    #[test]
    fn installs_component_without_entry_point() {
        let fx = Fixture::new();
        fx.serve_versioned("u", "1.0.0");

        sync_components(&fx.ctx, &[installable("a", "A", "org.example.a", "u")]).unwrap();

        assert!(fx.ctx.mapping.location("a").unwrap().is_some());
        assert_eq!(fx.transport.download_count(), 1);
    }

    #[test]
    fn reinstalls_when_directory_was_removed_externally() {
        let fx = Fixture::new();
        fx.serve_versioned("u", "1.0.0");
        let installed =
            installer::install(&fx.ctx, &installable("a", "A", "org.example.a", "u"))
                .unwrap()
                .unwrap();
        std::fs::remove_dir_all(fx.ctx.paths.install_dir("org.example.a")).unwrap();

        sync_components(&fx.ctx, &[installed]).unwrap();

        assert!(fx.ctx.paths.install_dir("org.example.a").join("package.json").is_file());
        assert_eq!(fx.transport.download_count(), 2);
    }

    #[test]
    fn present_component_runs_update_check() {
        let fx = Fixture::new();
        fx.serve_versioned("u", "1.0.0");
        let mut component = installable("a", "A", "org.example.a", "u");
        component.package_info.as_mut().unwrap().latest_url = Some("latest".to_string());
        let installed = installer::install(&fx.ctx, &component).unwrap().unwrap();
        fx.transport.serve_json("latest", r#"{"version": "1.0.0"}"#);

        sync_components(&fx.ctx, &[installed]).unwrap();

        assert_eq!(fx.transport.fetch_count(), 1);
        assert_eq!(fx.transport.download_count(), 1);
    }

    #[test]
    fn autoupdate_disabled_does_nothing() {
        let fx = Fixture::new();
        fx.serve_versioned("u", "1.0.0");
        let mut component = installable("a", "A", "org.example.a", "u");
        {
            let info = component.package_info.as_mut().unwrap();
            info.latest_url = Some("latest".to_string());
            info.autoupdate_disabled = true;
        }
        let installed = installer::install(&fx.ctx, &component).unwrap().unwrap();

        sync_components(&fx.ctx, &[installed]).unwrap();

        assert_eq!(fx.transport.fetch_count(), 0);
        assert_eq!(fx.transport.download_count(), 1);
    }

    #[test]
    fn component_without_package_is_skipped() {
        let fx = Fixture::new();

        sync_components(&fx.ctx, &[Component::new("a", "Note")]).unwrap();

        assert_eq!(fx.transport.download_count(), 0);
        assert!(fx.events().is_empty());
    }

    #[test]
    fn malformed_component_is_skipped() {
        let fx = Fixture::new();
        let bad = Component::new("a", "A")
            .with_package_info(PackageInfo::new("../escape").with_download_url("u"));

        sync_components(&fx.ctx, &[bad]).unwrap();

        assert_eq!(fx.transport.download_count(), 0);
    }

    #[test]
    fn deleted_component_is_uninstalled() {
        let fx = Fixture::new();
        fx.serve_versioned("u", "1.0.0");
        installer::install(&fx.ctx, &installable("a", "A", "org.example.a", "u")).unwrap();

        sync_components(&fx.ctx, &[Component::deletion("a")]).unwrap();

        assert!(fx.ctx.mapping.read().unwrap().is_empty());
        assert!(!fx.ctx.paths.install_dir("org.example.a").exists());
    }

    #[test]
    fn one_failure_does_not_block_siblings() {
        let fx = Fixture::new();
        fx.serve_versioned("good", "1.0.0");

        let err = sync_components(
            &fx.ctx,
            &[
                installable("bad", "Bad", "org.example.bad", "missing"),
                installable("good", "Good", "org.example.good", "good"),
            ],
        )
        .unwrap_err();

        assert_eq!(err.tag(), ErrorTag::Downloading);
        assert!(fx.ctx.mapping.location("good").unwrap().is_some());
        assert!(fx.ctx.mapping.location("bad").unwrap().is_none());
    }

    #[test]
    fn multiple_failures_are_aggregated() {
        let fx = Fixture::new();

        let err = sync_components(
            &fx.ctx,
            &[
                installable("x", "X", "org.example.x", "missing-x"),
                installable("y", "Y", "org.example.y", "missing-y"),
            ],
        )
        .unwrap_err();

        let message = err.to_string();
        assert!(message.starts_with("2 components failed"));
        assert!(message.contains("x:"));
        assert!(message.contains("y:"));
    }

    #[test]
    fn same_named_components_keep_their_own_archive() {
        let fx = Fixture::new();
        fx.serve_versioned("one", "1.0.0");
        fx.serve_versioned("two", "2.0.0");

        sync_components(
            &fx.ctx,
            &[
                installable("a", "Theme", "org.example.a", "one"),
                installable("b", "Theme", "org.example.b", "two"),
            ],
        )
        .unwrap();

        let version = |identifier: &str| {
            installer::read_package_manifest(&fx.ctx.paths.install_dir(identifier))
                .unwrap()
                .version
        };
        assert_eq!(version("org.example.a").as_deref(), Some("1.0.0"));
        assert_eq!(version("org.example.b").as_deref(), Some("2.0.0"));
    }

    #[test]
    fn staging_groups_collect_shared_names_in_order() {
        let components = [
            installable("a", "Theme", "org.example.a", "u"),
            installable("b", "Editor", "org.example.b", "u"),
            installable("c", "Theme", "org.example.c", "u"),
        ];

        let groups = staging_groups(&components);

        let ids: Vec<Vec<&str>> = groups
            .iter()
            .map(|g| g.iter().map(|c| c.id.as_str()).collect())
            .collect();
        assert_eq!(ids, vec![vec!["a", "c"], vec!["b"]]);
    }
}
