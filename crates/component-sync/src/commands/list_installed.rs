// SPDX-License-Identifier: MIT OR Apache-2.0

use libcomponent_sync::{Mapping, MappingStore, Paths};

use crate::cli_config::CliConfig;
use crate::exit_code::ExitCode;
use crate::output::{JsonOutput, output_json, plural, print_info};
use libcomponent_sync::Verbosity;

pub fn execute(config: &CliConfig, json: bool) -> Result<ExitCode, libcomponent_sync::Error> {
    let paths = Paths::new(config.root.clone());
    let mapping = MappingStore::new(paths.mapping_file_path()).read()?;

    if json {
        return output_json(&JsonOutput::ok(&mapping), ExitCode::Success);
    }

    if mapping.is_empty() {
        print_info(config.verbosity, "no components installed");
        return Ok(ExitCode::Success);
    }

    if config.verbosity == Verbosity::Quiet {
        println!("{}", mapping.len());
        return Ok(ExitCode::Success);
    }

    print_info(
        config.verbosity,
        &format!(
            "{} installed component{}:",
            mapping.len(),
            plural(mapping.len())
        ),
    );
    println!();
    for line in format_rows(&mapping, &paths, config.verbosity == Verbosity::Verbose) {
        println!("{line}");
    }

    Ok(ExitCode::Success)
}

fn format_rows(mapping: &Mapping, paths: &Paths, verbose: bool) -> Vec<String> {
    let width = mapping.keys().map(String::len).max().unwrap_or(0);

    mapping
        .iter()
        .map(|(id, entry)| {
            let location = entry.location.as_deref().unwrap_or("-");
            if verbose {
                let present = entry
                    .location
                    .as_deref()
                    .is_some_and(|l| paths.resolve(l).is_dir());
                let state = if present { "" } else { "  (missing)" };
                format!("{id:<width$}  {}{state}", paths.resolve(location).display())
            } else {
                format!("{id:<width$}  {location}")
            }
        })
        .collect()
}
