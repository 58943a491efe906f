// SPDX-License-Identifier: MIT OR Apache-2.0

use std::sync::Arc;

use libcomponent_sync::{Component, LogListener};
use serde::Serialize;

use crate::cli_config::CliConfig;
use crate::exit_code::ExitCode;
use crate::output::{JsonOutput, output_json, plural, print_failure, print_info};

#[derive(Debug, Serialize)]
struct UninstallResult {
    removed: Vec<String>,
    remaining: Vec<String>,
}

pub fn execute(
    config: &CliConfig,
    ids: &[String],
    json: bool,
) -> Result<ExitCode, libcomponent_sync::Error> {
    let engine = super::build_engine(config, Arc::new(LogListener))?;

    engine.request_sync_all(ids.iter().map(|id| vec![Component::deletion(id.as_str())]));
    engine.wait_idle();

    let mapping = engine.installed()?;
    let (remaining, removed): (Vec<String>, Vec<String>) =
        ids.iter().cloned().partition(|id| mapping.contains_key(id));

    let code = if remaining.is_empty() {
        ExitCode::Success
    } else {
        ExitCode::PartialFailure
    };

    if json {
        let result = UninstallResult { removed, remaining };
        let output = if code == ExitCode::Success {
            JsonOutput::ok(result)
        } else {
            JsonOutput::failed(result)
        };
        return output_json(&output, code);
    }

    if !removed.is_empty() {
        print_info(
            config.verbosity,
            &format!(
                "{} component{} no longer installed: {}",
                removed.len(),
                plural(removed.len()),
                removed.join(", ")
            ),
        );
    }
    if !remaining.is_empty() {
        print_failure(&format!("could not remove {}", remaining.join(", ")));
    }

    Ok(code)
}
