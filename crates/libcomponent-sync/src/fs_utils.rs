// SPDX-License-Identifier: MIT OR Apache-2.0

use std::{
    fs::{self, File},
    io::{self, BufReader},
    path::{Path, PathBuf},
};

use crate::{Error, Result};

/// creates `path` and any missing parents. succeeds if it already exists as a directory.
pub fn ensure_directory_exists(path: &Path) -> Result<()> {
    match fs::metadata(path) {
        Ok(meta) if meta.is_dir() => return Ok(()),
        Ok(_) => return Err(Error::NotADirectory(path.to_path_buf())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }

    match fs::create_dir_all(path) {
        Ok(()) => Ok(()),
        // another caller won the race between the check and the create
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists && path.is_dir() => Ok(()),
        Err(e) if path.exists() && !path.is_dir() => {
            log::debug!(target: "fs", "create {} failed: {e}", path.display());
            Err(Error::NotADirectory(path.to_path_buf()))
        }
        Err(e) => Err(e.into()),
    }
}

/// removes a directory tree. a missing path is not an error.
pub fn delete_directory_recursive(path: &Path) -> Result<()> {
    match fs::symlink_metadata(path) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e.into()),
        Ok(meta) if !meta.is_dir() => return Err(Error::NotADirectory(path.to_path_buf())),
        Ok(_) => {}
    }

    match fs::remove_dir_all(path) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other.map_err(Error::from),
    }
}

/// ensures `path` exists and is empty, removing whatever it held before.
pub fn clear_directory(path: &Path) -> Result<()> {
    ensure_directory_exists(path)?;

    for entry in fs::read_dir(path)? {
        let entry = entry?;
        let entry_path = entry.path();
        if entry.file_type()?.is_dir() {
            delete_directory_recursive(&entry_path)?;
        } else {
            fs::remove_file(&entry_path)?;
        }
    }

    Ok(())
}

/// renames `src` to `dst`, copying then deleting when they sit on different devices.
pub fn move_file(src: &Path, dst: &Path) -> Result<()> {
    if let Some(parent) = dst.parent() {
        ensure_directory_exists(parent)?;
    }

    match fs::rename(src, dst) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            log::debug!(
                target: "fs",
                "{} -> {} crosses devices, copying",
                src.display(),
                dst.display()
            );
            if src.is_dir() {
                copy_dir_recursive(src, dst)?;
                fs::remove_dir_all(src)?;
            } else {
                fs::copy(src, dst)?;
                fs::remove_file(src)?;
            }
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

pub(crate) fn copy_dir_recursive(src: &Path, dst: &Path) -> Result<()> {
    if !src.is_dir() {
        return Err(Error::NotADirectory(src.to_path_buf()));
    }

    ensure_directory_exists(dst)?;

    let options = fs_extra::dir::CopyOptions::new()
        .content_only(true)
        .overwrite(true);

    fs_extra::dir::copy(src, dst, &options)
        .map_err(|e| Error::other(format!("copy {}: {e}", src.display())))?;

    Ok(())
}

/// extracts a zip archive into `dest`, dropping the first path segment of every entry
/// so a single wrapper folder is flattened away.
pub fn extract_nested_archive(archive_path: &Path, dest: &Path) -> Result<()> {
    let file = File::open(archive_path)?;
    let mut archive = zip::ZipArchive::new(BufReader::new(file))?;

    ensure_directory_exists(dest)?;

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        if entry.is_dir() {
            continue;
        }

        let name = entry.name().to_string();
        let Some(enclosed) = entry.enclosed_name() else {
            return Err(Error::extraction(format!("unsafe entry path: {name}")));
        };

        let relative = strip_first_segment(&enclosed);
        if relative.as_os_str().is_empty() {
            continue;
        }

        let out_path = dest.join(&relative);
        if let Some(parent) = out_path.parent() {
            ensure_directory_exists(parent)?;
        }

        let mut out = File::create(&out_path)?;
        io::copy(&mut entry, &mut out)
            .map_err(|e| Error::extraction(format!("{name}: {e}")))?;
    }

    log::debug!(
        target: "extract",
        "extracted {} entries from {} into {}",
        archive.len(),
        archive_path.display(),
        dest.display()
    );

    Ok(())
}

/// `pkg/src/a.js` -> `src/a.js`; single-segment names are kept as they are.
fn strip_first_segment(path: &Path) -> PathBuf {
    let mut components = path.components();
    if path.components().count() > 1 {
        components.next();
    }
    components.as_path().to_path_buf()
}
