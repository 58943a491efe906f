// SPDX-License-Identifier: MIT OR Apache-2.0

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use libcomponent_sync::{Config, Verbosity};
use serde::Deserialize;

const CONFIG_FILE_NAME: &str = "component-sync.toml";

fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(CONFIG_FILE_NAME))
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct TomlConfig {
    root: Option<PathBuf>,
    max_attempts: Option<u32>,
    entry_scheme: Option<String>,
    download_timeout_secs: Option<u64>,
    connect_timeout_secs: Option<u64>,
    excluded_components: Vec<String>,
    verbosity: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CliConfig {
    pub inner: Config,
    pub verbosity: Verbosity,
}

impl std::ops::Deref for CliConfig {
    type Target = Config;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl CliConfig {
    pub fn load() -> libcomponent_sync::Result<Self> {
        let Some(path) = config_path() else {
            return Ok(Self::from_toml(TomlConfig::default()));
        };

        if !path.exists() {
            return Ok(Self::from_toml(TomlConfig::default()));
        }

        Self::load_from(&path)
    }

    fn load_from(path: &Path) -> libcomponent_sync::Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            libcomponent_sync::Error::other(format!(
                "failed to read config file {}: {e}",
                path.display()
            ))
        })?;

        let toml_config: TomlConfig = toml::from_str(&content).map_err(|e| {
            libcomponent_sync::Error::other(format!(
                "failed to parse config file {}: {e}",
                path.display()
            ))
        })?;

        Ok(Self::from_toml(toml_config))
    }

    fn from_toml(toml_config: TomlConfig) -> Self {
        let mut inner = Config::new().with_excluded_components(toml_config.excluded_components);

        if let Some(root) = toml_config.root {
            inner = inner.with_root(root);
        }
        if let Some(attempts) = toml_config.max_attempts {
            inner = inner.with_max_attempts(attempts);
        }
        if let Some(scheme) = toml_config.entry_scheme {
            inner = inner.with_entry_scheme(scheme);
        }
        if let Some(secs) = toml_config.download_timeout_secs {
            inner = inner.with_download_timeout(Duration::from_secs(secs));
        }
        if let Some(secs) = toml_config.connect_timeout_secs {
            inner = inner.with_connect_timeout(Duration::from_secs(secs));
        }

        Self {
            inner,
            verbosity: parse_verbosity(toml_config.verbosity.as_deref()),
        }
    }

    pub fn edit_config() -> libcomponent_sync::Result<()> {
        let path = config_path()
            .ok_or_else(|| libcomponent_sync::Error::other("could not determine config directory"))?;

        ensure_config_exists(&path)?;
        open_in_editor(&path)
    }
}

fn parse_verbosity(verbosity: Option<&str>) -> Verbosity {
    match verbosity {
        Some("quiet") => Verbosity::Quiet,
        Some("verbose") => Verbosity::Verbose,
        _ => Verbosity::Normal,
    }
}

fn ensure_config_exists(path: &Path) -> libcomponent_sync::Result<()> {
    if path.exists() {
        return Ok(());
    }

    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(|e| {
            libcomponent_sync::Error::other(format!(
                "failed to create config directory {}: {e}",
                dir.display()
            ))
        })?;
    }

    create_default_config(path)
}

fn create_default_config(path: &Path) -> libcomponent_sync::Result<()> {
    let default_content = r#"# component-sync configuration
# root = "/path/to/components"  # holds Extensions/ and mapping.json
# max_attempts = 3
# entry_scheme = "sn"
# download_timeout_secs = 120
# connect_timeout_secs = 10
# excluded_components = ["component-id"]  # never auto-updated
# verbosity = "normal"  # quiet, normal, verbose
"#;
    fs::write(path, default_content).map_err(|e| {
        libcomponent_sync::Error::other(format!(
            "failed to create config file {}: {e}",
            path.display()
        ))
    })
}

fn open_in_editor(path: &Path) -> libcomponent_sync::Result<()> {
    let editor = std::env::var("EDITOR").unwrap_or_else(|_| "nano".to_string());
    std::process::Command::new(&editor)
        .arg(path)
        .status()
        .map_err(|e| {
            libcomponent_sync::Error::other(format!("failed to open editor {editor}: {e}"))
        })?;
    Ok(())
}
