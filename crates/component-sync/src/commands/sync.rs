// SPDX-License-Identifier: MIT OR Apache-2.0

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Read};
use std::path::Path;
use std::sync::Arc;

use libcomponent_sync::{Component, InstallError, Verbosity};
use parking_lot::Mutex;
use serde::Serialize;

use crate::cli_config::CliConfig;
use crate::exit_code::ExitCode;
use crate::output::{JsonOutput, output_json, plural, print_failure, print_info};

const STDIN_MARKER: &str = "-";

/// one install notification as received from the engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstallReport {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_point: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<InstallError>,
}

impl InstallReport {
    fn new(component: &Component, error: Option<&InstallError>) -> Self {
        Self {
            id: component.id.clone(),
            name: component.name.clone(),
            version: component
                .package_info
                .as_ref()
                .and_then(|p| p.version.clone()),
            entry_point: component.local_entry_point().map(str::to_string),
            error: error.cloned(),
        }
    }
}

pub fn execute(
    config: &CliConfig,
    files: &[String],
    json: bool,
) -> Result<ExitCode, libcomponent_sync::Error> {
    let batches = files
        .iter()
        .map(|f| read_components(f))
        .collect::<libcomponent_sync::Result<Vec<_>>>()?;

    let total: usize = batches.iter().map(Vec::len).sum();
    if total == 0 {
        print_info(config.verbosity, "nothing to sync");
        return Ok(ExitCode::Success);
    }

    let reports: Arc<Mutex<Vec<InstallReport>>> = Arc::default();
    let sink = Arc::clone(&reports);
    let verbosity = config.verbosity;
    let listener = Arc::new(move |component: &Component, error: Option<&InstallError>| {
        let report = InstallReport::new(component, error);
        if !json {
            print_report(verbosity, &report);
        }
        sink.lock().push(report);
    });

    let engine = super::build_engine(config, listener)?;
    log::debug!(
        target: "cli",
        "syncing {total} component{} from {} file{}",
        plural(total),
        files.len(),
        plural(files.len())
    );
    engine.request_sync_all(batches);
    engine.wait_idle();

    let reports = std::mem::take(&mut *reports.lock());
    let failed = failed_ids(&reports);
    let code = if failed.is_empty() {
        ExitCode::Success
    } else {
        ExitCode::PartialFailure
    };

    if json {
        let output = if failed.is_empty() {
            JsonOutput::ok(&reports)
        } else {
            JsonOutput::failed(&reports)
        };
        return output_json(&output, code);
    }

    if !failed.is_empty() {
        print_failure(&format!(
            "{} component{} not installed: {}",
            failed.len(),
            plural(failed.len()),
            failed.join(", ")
        ));
    }

    Ok(code)
}

fn print_report(verbosity: Verbosity, report: &InstallReport) {
    match &report.error {
        None => print_info(
            verbosity,
            &format!(
                "installed {} {} -> {}",
                report.id,
                report.version.as_deref().unwrap_or("-"),
                report.entry_point.as_deref().unwrap_or("-")
            ),
        ),
        Some(e) => print_failure(&format!("{} [{}] {}", report.id, e.tag, e.message)),
    }
}

/// ids whose most recent notification was a failure.
fn failed_ids(reports: &[InstallReport]) -> Vec<String> {
    let mut last: BTreeMap<&str, bool> = BTreeMap::new();
    for report in reports {
        last.insert(report.id.as_str(), report.error.is_some());
    }

    last.into_iter()
        .filter(|(_, failed)| *failed)
        .map(|(id, _)| id.to_string())
        .collect()
}

/// reads a json array of components from `source`, or stdin for `-`.
fn read_components(source: &str) -> libcomponent_sync::Result<Vec<Component>> {
    let content = if source == STDIN_MARKER {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        fs::read_to_string(Path::new(source)).map_err(|e| {
            libcomponent_sync::Error::other(format!("failed to read {source}: {e}"))
        })?
    };

    serde_json::from_str(&content).map_err(|e| {
        libcomponent_sync::Error::other(format!("{source} is not a component list: {e}"))
    })
}
