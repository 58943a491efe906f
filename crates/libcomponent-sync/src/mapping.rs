// SPDX-License-Identifier: MIT OR Apache-2.0

use std::{
    fs, io,
    io::Write,
    path::{Path, PathBuf},
    sync::Arc,
};

use parking_lot::Mutex;

use crate::{Error, Mapping, MappingEntry, Result, fs_utils};

/// reads and writes the id -> location mapping file.
///
/// every mutation is a full read-modify-write cycle. mutations through clones
/// of one store are serialized, so components of the same task touching
/// different ids never drop each other's entries.
#[derive(Debug, Clone)]
pub struct MappingStore {
    path: PathBuf,
    update: Arc<Mutex<()>>,
}

impl MappingStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            update: Arc::default(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// returns the stored mapping; a missing file is an empty mapping.
    pub fn read(&self) -> Result<Mapping> {
        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Mapping::new()),
            Err(e) => return Err(e.into()),
        };

        serde_json::from_str(&content).map_err(|e| {
            Error::mapping(format!("{} is not valid: {e}", self.path.display()))
        })
    }

    /// replaces the whole file with `mapping`.
    pub fn write(&self, mapping: &Mapping) -> Result<()> {
        let parent = self
            .path
            .parent()
            .ok_or_else(|| Error::mapping("mapping path has no parent directory"))?;
        fs_utils::ensure_directory_exists(parent)?;

        let content = serde_json::to_string_pretty(mapping)?;

        let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
        tmp.write_all(content.as_bytes())?;
        tmp.persist(&self.path).map_err(|e| Error::Io(e.error))?;

        Ok(())
    }

    /// recorded location for `id`, if any.
    pub fn location(&self, id: &str) -> Result<Option<String>> {
        Ok(self.read()?.remove(id).and_then(|entry| entry.location))
    }

    /// merges `location` into the entry for `id`, keeping its other fields.
    pub fn set_location(&self, id: &str, location: &str) -> Result<()> {
        let _guard = self.update.lock();
        let mut mapping = self.read()?;
        mapping
            .entry(id.to_string())
            .or_insert_with(MappingEntry::default)
            .location = Some(location.to_string());
        self.write(&mapping)?;

        log::debug!(target: "mapping", "{id} -> {location}");
        Ok(())
    }

    /// deletes the entry for `id`. a missing id leaves the file untouched.
    pub fn remove_entry(&self, id: &str) -> Result<()> {
        let _guard = self.update.lock();
        let mut mapping = self.read()?;
        if mapping.remove(id).is_none() {
            return Ok(());
        }
        self.write(&mapping)?;

        log::debug!(target: "mapping", "removed {id}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, MappingStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = MappingStore::new(dir.path().join("Extensions/mapping.json"));
        (dir, store)
    }

    #[test]
    fn missing_file_reads_as_empty() {
        let (_dir, store) = store();
        assert!(store.read().unwrap().is_empty());
        assert_eq!(store.location("a").unwrap(), None);
    }

    #[test]
    fn set_location_creates_file_and_entry() {
        let (_dir, store) = store();

        store.set_location("a", "Extensions/org.example.a").unwrap();

        assert!(store.path().is_file());
        assert_eq!(
            store.location("a").unwrap().as_deref(),
            Some("Extensions/org.example.a")
        );
    }

    #[test]
    fn set_location_preserves_other_fields_and_entries() {
        let (_dir, store) = store();
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(
            store.path(),
            r#"{"a": {"location": "old", "pinned": true}, "b": {"location": "Extensions/b"}}"#,
        )
        .unwrap();

        store.set_location("a", "Extensions/a").unwrap();

        let mapping = store.read().unwrap();
        let a = &mapping["a"];
        assert_eq!(a.location.as_deref(), Some("Extensions/a"));
        assert_eq!(a.extra.get("pinned"), Some(&serde_json::Value::Bool(true)));
        assert_eq!(mapping["b"].location.as_deref(), Some("Extensions/b"));
    }

    #[test]
    fn remove_entry_deletes_key() {
        let (_dir, store) = store();
        store.set_location("a", "Extensions/a").unwrap();
        store.set_location("b", "Extensions/b").unwrap();

        store.remove_entry("a").unwrap();

        let mapping = store.read().unwrap();
        assert!(!mapping.contains_key("a"));
        assert!(mapping.contains_key("b"));
    }

    #[test]
    fn remove_absent_entry_does_not_create_file() {
        let (_dir, store) = store();
        store.remove_entry("ghost").unwrap();
        assert!(!store.path().exists());
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let (_dir, store) = store();
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), "{not json").unwrap();

        assert!(matches!(store.read(), Err(Error::Mapping(_))));
    }

    #[test]
    fn written_file_is_pretty_json_object() {
        let (_dir, store) = store();
        store.set_location("a", "Extensions/a").unwrap();

        let raw = fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains('\n'));
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["a"]["location"], "Extensions/a");
    }

    #[test]
    fn concurrent_updates_keep_every_entry() {
        let (_dir, store) = store();

        std::thread::scope(|s| {
            for n in 0..16 {
                let store = store.clone();
                s.spawn(move || {
                    store
                        .set_location(&format!("c{n}"), &format!("Extensions/c{n}"))
                        .unwrap();
                });
            }
        });

        assert_eq!(store.read().unwrap().len(), 16);
    }
}
