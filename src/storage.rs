//! Writing relocated output to the local filesystem

use crate::errors::RelocationError;
use std::{
    fs, io,
    os::unix::fs::{DirBuilderExt, PermissionsExt},
    path::{Path, PathBuf},
};

const FILE_MODE: u32 = 0o644;
const DIR_MODE: u32 = 0o755;

/// Replace the file at `path` with `data`
///
/// Data is written to a nearby temp file first, which is then renamed over
/// the destination. Readers see either the old file or the complete new one.
pub fn write_atomic(path: &Path, data: &[u8]) -> io::Result<()> {
    log::debug!("storage write, {:?}, {} bytes", path, data.len());
    let temp_path = temp_path_for(path);
    let result = fs::write(&temp_path, data)
        .and_then(|()| fs::set_permissions(&temp_path, fs::Permissions::from_mode(FILE_MODE)))
        .and_then(|()| fs::rename(&temp_path, path));
    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    result
}

fn temp_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(
        ".{}.{}-{}.tmp",
        name,
        std::process::id(),
        rand::random::<u64>()
    ))
}

/// Make sure `path` is a directory, creating it and its parents if needed
pub fn ensure_directory(path: &Path) -> Result<(), RelocationError> {
    match fs::metadata(path) {
        Ok(metadata) if metadata.is_dir() => Ok(()),
        Ok(_) => Err(RelocationError::OutputIsFile(path.display().to_string())),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            log::debug!("creating output directory {:?}", path);
            fs::DirBuilder::new()
                .recursive(true)
                .mode(DIR_MODE)
                .create(path)
                .map_err(|source| storage_error(path, source))
        }
        Err(source) => Err(storage_error(path, source)),
    }
}

/// Do both paths name one existing file or directory?
///
/// Paths which cannot be resolved are never the same.
pub fn same_path(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// The directory holding `path`, which is `.` for a bare file name
pub fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    }
}

/// Recursively copy the directory `src` to `dest`
///
/// A missing `src` is not an error, there is simply nothing to copy. Copying
/// a directory onto itself is refused since it would truncate every file.
pub fn copy_dir(src: &Path, dest: &Path) -> Result<(), RelocationError> {
    if !src.is_dir() {
        log::debug!("nothing to copy at {:?}", src);
        return Ok(());
    }
    if same_path(src, dest) {
        return Err(RelocationError::OutputIsInput(dest.display().to_string()));
    }
    ensure_directory(dest)?;
    let entries = fs::read_dir(src).map_err(|source| storage_error(src, source))?;
    for entry in entries {
        let entry = entry.map_err(|source| storage_error(src, source))?;
        let from = entry.path();
        let to = dest.join(entry.file_name());
        if from.is_dir() {
            copy_dir(&from, &to)?;
        } else {
            log::trace!("copying {:?} to {:?}", from, to);
            fs::copy(&from, &to).map_err(|source| storage_error(&to, source))?;
        }
    }
    Ok(())
}

pub(crate) fn storage_error(path: &Path, source: io::Error) -> RelocationError {
    RelocationError::Storage {
        path: path.display().to_string(),
        source,
    }
}
