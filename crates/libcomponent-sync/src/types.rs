// SPDX-License-Identifier: MIT OR Apache-2.0

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// entry file used when a package manifest does not declare one.
pub const DEFAULT_ENTRY_FILE: &str = "index.html";

/// an installable package descriptor as supplied by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Component {
    pub id: String,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_info: Option<PackageInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PackageInfo {
    pub identifier: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_entry_point: Option<String>,
    pub autoupdate_disabled: bool,
}

impl Component {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            deleted: false,
            name: name.into(),
            package_info: None,
        }
    }

    /// builds a request to remove the component with the given id.
    pub fn deletion(id: impl Into<String>) -> Self {
        Self {
            deleted: true,
            ..Self::new(id, "")
        }
    }

    pub fn with_package_info(mut self, info: PackageInfo) -> Self {
        self.package_info = Some(info);
        self
    }

    pub fn identifier(&self) -> Option<&str> {
        self.package_info.as_ref().map(|p| p.identifier.as_str())
    }

    pub fn download_url(&self) -> Option<&str> {
        self.package_info
            .as_ref()?
            .download_url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
    }

    pub fn local_entry_point(&self) -> Option<&str> {
        self.package_info.as_ref()?.local_entry_point.as_deref()
    }

    /// name used for the staging archive, falling back to the identifier.
    ///
    /// not unique: components with the same name share one staging file.
    pub fn archive_stem(&self) -> String {
        let base = if self.name.trim().is_empty() {
            self.identifier().unwrap_or(&self.id)
        } else {
            self.name.trim()
        };

        base.chars()
            .map(|c| if matches!(c, '/' | '\\' | ':') { '_' } else { c })
            .collect()
    }

    /// rejects payloads that would produce unusable or escaping paths.
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(Error::invalid_component("empty id"));
        }

        if self.deleted {
            return Ok(());
        }

        let Some(info) = &self.package_info else {
            return Ok(());
        };

        let identifier = info.identifier.trim();
        if identifier.is_empty() {
            return Err(Error::invalid_component(format!(
                "{}: empty package identifier",
                self.id
            )));
        }

        if !is_safe_segment(identifier) {
            return Err(Error::invalid_component(format!(
                "{}: identifier '{identifier}' is not a plain directory name",
                self.id
            )));
        }

        if crate::paths::is_reserved_name(identifier) {
            return Err(Error::invalid_component(format!(
                "{}: identifier '{identifier}' is reserved",
                self.id
            )));
        }

        if self.archive_stem() == ".." || self.archive_stem() == "." {
            return Err(Error::invalid_component(format!(
                "{}: name '{}' is not usable as a file name",
                self.id, self.name
            )));
        }

        Ok(())
    }
}

fn is_safe_segment(segment: &str) -> bool {
    segment != "."
        && segment != ".."
        && !segment.contains(['/', '\\'])
        && !segment.contains('\0')
}

impl PackageInfo {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            ..Self::default()
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_download_url(mut self, url: impl Into<String>) -> Self {
        self.download_url = Some(url.into());
        self
    }

    pub fn with_latest_url(mut self, url: impl Into<String>) -> Self {
        self.latest_url = Some(url.into());
        self
    }

    pub fn with_local_entry_point(mut self, entry: impl Into<String>) -> Self {
        self.local_entry_point = Some(entry.into());
        self
    }

    pub fn with_autoupdate_disabled(mut self, disabled: bool) -> Self {
        self.autoupdate_disabled = disabled;
        self
    }
}

/// one queued reconciliation batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncTask {
    pub components: Vec<Component>,
}

impl SyncTask {
    pub fn new(components: Vec<Component>) -> Self {
        Self { components }
    }

    /// the sole component of a single-component task.
    pub fn single(&self) -> Option<&Component> {
        match self.components.as_slice() {
            [only] => Some(only),
            _ => None,
        }
    }

    /// true when both tasks touch the same single component in opposite directions.
    pub fn is_opposite_of(&self, other: &SyncTask) -> bool {
        match (self.single(), other.single()) {
            (Some(a), Some(b)) => a.id == b.id && a.deleted != b.deleted,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorTag {
    #[serde(rename = "error-downloading")]
    Downloading,
    #[serde(rename = "error-extracting")]
    Extracting,
    #[serde(rename = "error-parsing-manifest")]
    ParsingManifest,
}

impl ErrorTag {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Downloading => "error-downloading",
            Self::Extracting => "error-extracting",
            Self::ParsingManifest => "error-parsing-manifest",
        }
    }
}

impl std::fmt::Display for ErrorTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// failure details delivered with an install-completion notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallError {
    pub message: String,
    pub tag: ErrorTag,
}

impl From<&Error> for InstallError {
    fn from(err: &Error) -> Self {
        Self {
            message: err.to_string(),
            tag: err.tag(),
        }
    }
}

/// a value in the mapping file. unknown fields are carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MappingEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// component id -> install location, relative to the components root.
pub type Mapping = BTreeMap<String, MappingEntry>;

/// the subset of an extracted `package.json` the installer reads.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PackageManifest {
    pub version: Option<String>,
    pub sn: Option<EntrySection>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EntrySection {
    pub main: Option<String>,
}

impl PackageManifest {
    pub fn main(&self) -> Option<&str> {
        self.sn
            .as_ref()?
            .main
            .as_deref()
            .filter(|m| !m.trim().is_empty())
    }
}

/// document served at a component's `latestUrl`.
#[derive(Debug, Clone, Deserialize)]
pub struct LatestManifest {
    pub version: String,
    #[serde(default, alias = "downloadUrl")]
    pub download_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn installable(id: &str, identifier: &str) -> Component {
        Component::new(id, "Some Editor").with_package_info(PackageInfo::new(identifier))
    }

    #[test]
    fn deserializes_camel_case_wire_shape() {
        let json = r#"{
            "id": "abc",
            "name": "Markdown Pro",
            "packageInfo": {
                "identifier": "org.example.markdown",
                "version": "1.2.0",
                "downloadUrl": "https://example.org/md.zip",
                "latestUrl": "https://example.org/md.json",
                "autoupdateDisabled": true
            }
        }"#;

        let component: Component = serde_json::from_str(json).unwrap();
        assert!(!component.deleted);
        let info = component.package_info.as_ref().unwrap();
        assert_eq!(info.identifier, "org.example.markdown");
        assert_eq!(info.version.as_deref(), Some("1.2.0"));
        assert_eq!(component.download_url(), Some("https://example.org/md.zip"));
        assert!(info.autoupdate_disabled);
        assert!(info.local_entry_point.is_none());
    }

    #[test]
    fn missing_fields_default() {
        let component: Component = serde_json::from_str(r#"{"id": "x"}"#).unwrap();
        assert!(!component.deleted);
        assert!(component.name.is_empty());
        assert!(component.package_info.is_none());
    }

    #[test]
    fn blank_download_url_counts_as_absent() {
        let component = Component::new("a", "A")
            .with_package_info(PackageInfo::new("a").with_download_url("  "));
        assert_eq!(component.download_url(), None);
    }

    #[test]
    fn validate_rejects_empty_id() {
        assert!(Component::new("", "x").validate().is_err());
    }

    #[test]
    fn validate_rejects_escaping_identifier() {
        assert!(installable("a", "../etc").validate().is_err());
        assert!(installable("a", "nested/dir").validate().is_err());
        assert!(installable("a", "..").validate().is_err());
        assert!(installable("a", "").validate().is_err());
        assert!(installable("a", "org.example.theme").validate().is_ok());
    }

    #[test]
    fn validate_rejects_engine_owned_names() {
        assert!(installable("a", "mapping.json").validate().is_err());
        assert!(installable("a", "downloads").validate().is_err());
        assert!(installable("a", "Downloads").validate().is_err());
        assert!(installable("a", "downloads-extra").validate().is_ok());
    }

    #[test]
    fn validate_skips_package_checks_for_deletions() {
        let mut component = installable("a", "../bad");
        component.deleted = true;
        assert!(component.validate().is_ok());
    }

    #[test]
    fn archive_stem_replaces_separators() {
        let component = Component::new("a", "Dark/Light Theme");
        assert_eq!(component.archive_stem(), "Dark_Light Theme");

        let unnamed = installable("a", "org.example.theme");
        let unnamed = Component {
            name: String::new(),
            ..unnamed
        };
        assert_eq!(unnamed.archive_stem(), "org.example.theme");
    }

    #[test]
    fn opposite_tasks_match_on_id_and_direction() {
        let install = SyncTask::new(vec![installable("a", "a")]);
        let uninstall = SyncTask::new(vec![Component::deletion("a")]);
        let other = SyncTask::new(vec![Component::deletion("b")]);
        let batch = SyncTask::new(vec![Component::deletion("a"), Component::deletion("b")]);

        assert!(install.is_opposite_of(&uninstall));
        assert!(uninstall.is_opposite_of(&install));
        assert!(!install.is_opposite_of(&install.clone()));
        assert!(!install.is_opposite_of(&other));
        assert!(!install.is_opposite_of(&batch));
    }

    #[test]
    fn error_tag_serializes_to_wire_names() {
        let err = InstallError {
            message: "boom".to_string(),
            tag: ErrorTag::ParsingManifest,
        };
        let json = serde_json::to_string(&err).unwrap();
        assert_eq!(json, r#"{"message":"boom","tag":"error-parsing-manifest"}"#);
    }

    #[test]
    fn mapping_entry_keeps_unknown_fields() {
        let entry: MappingEntry =
            serde_json::from_str(r#"{"location": "Extensions/a", "pinned": true}"#).unwrap();
        assert_eq!(entry.location.as_deref(), Some("Extensions/a"));
        assert_eq!(entry.extra.get("pinned"), Some(&serde_json::Value::Bool(true)));

        let back = serde_json::to_value(&entry).unwrap();
        assert_eq!(back["pinned"], serde_json::Value::Bool(true));
    }

    #[test]
    fn manifest_main_reads_nested_field() {
        let manifest: PackageManifest =
            serde_json::from_str(r#"{"version": "2.0.0", "sn": {"main": "dist/index.html"}}"#)
                .unwrap();
        assert_eq!(manifest.main(), Some("dist/index.html"));

        let bare: PackageManifest = serde_json::from_str(r#"{"name": "x"}"#).unwrap();
        assert_eq!(bare.main(), None);
        assert_eq!(bare.version, None);
    }

    #[test]
    fn latest_manifest_accepts_both_url_spellings() {
        let snake: LatestManifest =
            serde_json::from_str(r#"{"version": "1.1.0", "download_url": "u1"}"#).unwrap();
        let camel: LatestManifest =
            serde_json::from_str(r#"{"version": "1.1.0", "downloadUrl": "u2"}"#).unwrap();
        assert_eq!(snake.download_url.as_deref(), Some("u1"));
        assert_eq!(camel.download_url.as_deref(), Some("u2"));
    }
}
