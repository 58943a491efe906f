// SPDX-License-Identifier: MIT OR Apache-2.0

use libcomponent_sync::Verbosity;
use serde::Serialize;

use crate::exit_code::ExitCode;

mod ansi {
    pub const BOLD: &str = "\x1b[1m";
    pub const RESET: &str = "\x1b[0m";

    #[inline]
    pub fn bold(s: &str) -> String {
        format!("{BOLD}{s}{RESET}")
    }
}

/// Generic JSON output wrapper for CLI responses.
#[derive(Debug, Serialize)]
pub struct JsonOutput<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> JsonOutput<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            error: None,
            data: Some(data),
        }
    }

    pub fn failed(data: T) -> Self {
        Self {
            success: false,
            error: None,
            data: Some(data),
        }
    }

    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(msg.into()),
            data: None,
        }
    }
}

pub fn output_json<T: Serialize>(
    output: &JsonOutput<T>,
    code: ExitCode,
) -> Result<ExitCode, libcomponent_sync::Error> {
    println!("{}", serde_json::to_string_pretty(output)?);
    Ok(code)
}

pub fn output_error(json: bool, msg: &str) {
    if json {
        let output: JsonOutput<()> = JsonOutput::err(msg);
        match serde_json::to_string(&output) {
            Ok(s) => println!("{s}"),
            Err(_) => eprintln!("error: {msg}"),
        }
    } else {
        eprintln!("{} {msg}", ansi::bold("error:"));
    }
}

pub fn print_info(verbosity: Verbosity, msg: &str) {
    if verbosity != Verbosity::Quiet {
        println!("{} {msg}", ansi::bold("info:"));
    }
}

pub fn print_failure(msg: &str) {
    eprintln!("{} {msg}", ansi::bold("failed:"));
}

pub fn plural(count: usize) -> &'static str {
    if count == 1 { "" } else { "s" }
}
