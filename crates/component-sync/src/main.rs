// SPDX-License-Identifier: MIT OR Apache-2.0

mod cli_config;
mod commands;
mod exit_code;
mod output;

use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use libcomponent_sync::Verbosity;

use cli_config::CliConfig;
use exit_code::ExitCode;

#[derive(Parser)]
#[command(name = "component-sync")]
#[command(about = "install, update and remove downloadable components")]
#[command(version)]
#[command(disable_help_subcommand = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// directory that holds Extensions/ (overrides the config file)
    #[arg(long, global = true, value_name = "DIR")]
    root: Option<PathBuf>,

    /// print machine-readable json
    #[arg(long, global = true)]
    json: bool,

    /// enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[arg(long, help = "open configuration file in editor")]
    edit_config: bool,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "reconcile components listed in json files ('-' reads stdin)")]
    Sync {
        #[arg(required = true, value_name = "FILE")]
        files: Vec<String>,
    },
    #[command(about = "remove installed components by id")]
    Uninstall {
        #[arg(required = true, value_name = "ID")]
        ids: Vec<String>,
    },
    #[command(about = "list installed components")]
    ListInstalled,
}

fn main() {
    let cli = Cli::parse();
    let json = cli.json;

    let exit_code = run(cli).unwrap_or_else(|e| {
        output::output_error(json, &e.to_string());
        ExitCode::FatalError
    });

    std::process::exit(exit_code.into());
}

fn run(cli: Cli) -> Result<ExitCode, libcomponent_sync::Error> {
    if cli.edit_config {
        CliConfig::edit_config()?;
        return Ok(ExitCode::Success);
    }

    let mut config = CliConfig::load()?;
    if let Some(root) = &cli.root {
        config.inner = config.inner.with_root(root);
    }
    if cli.verbose {
        config.verbosity = Verbosity::Verbose;
    }

    init_logging(config.verbosity);
    log::debug!(target: "cli", "components root: {}", config.root.display());

    execute_command(&cli, &config)
}

fn init_logging(verbosity: Verbosity) {
    let default_level = match verbosity {
        Verbosity::Quiet => "warn",
        Verbosity::Normal => "info",
        Verbosity::Verbose => "debug",
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

fn execute_command(cli: &Cli, config: &CliConfig) -> Result<ExitCode, libcomponent_sync::Error> {
    match &cli.command {
        Some(Commands::Sync { files }) => commands::sync::execute(config, files, cli.json),
        Some(Commands::Uninstall { ids }) => commands::uninstall::execute(config, ids, cli.json),
        Some(Commands::ListInstalled) => commands::list_installed::execute(config, cli.json),
        None => {
            Cli::command().print_help()?;
            Ok(ExitCode::Success)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_sync_with_global_flags() {
        let cli = Cli::try_parse_from([
            "component-sync",
            "sync",
            "a.json",
            "-",
            "--root",
            "/tmp/components",
            "--json",
        ])
        .unwrap();

        assert!(cli.json);
        assert_eq!(cli.root, Some(PathBuf::from("/tmp/components")));
        let Some(Commands::Sync { files }) = cli.command else {
            panic!("expected sync");
        };
        assert_eq!(files, vec!["a.json".to_string(), "-".to_string()]);
    }

    #[test]
    fn uninstall_requires_an_id() {
        assert!(Cli::try_parse_from(["component-sync", "uninstall"]).is_err());
    }
}
