//! Small filesystem helpers shared by the object store and relation index

use arbor_core::{Error, Result};
use std::fs;
use std::io::{self, Write};
use std::path::{Path as FsPath, PathBuf};
use uuid::Uuid;

/// Prefix of in-flight temp files; never a valid `Name`, so listings skip them
pub const TEMP_PREFIX: &str = ".tmp-";

/// Attempts made by [`write_atomic`] when the parent directory vanishes
pub const WRITE_ATTEMPTS: usize = 16;

/// Write `bytes` to `target` atomically (temp + fsync + rename)
///
/// Only the single file is atomic; callers that update several files get
/// no guarantee across them.
///
/// A concurrent [`prune_empty_dirs`] may delete the parent between
/// `create_dir_all` and the temp file create. That surfaces as `NotFound`
/// and the whole sequence is retried, up to [`WRITE_ATTEMPTS`] times.
pub fn write_atomic(target: &FsPath, bytes: &[u8]) -> Result<()> {
    let dir = target
        .parent()
        .ok_or_else(|| Error::unavailable(format!("{} has no parent directory", target.display())))?;

    let mut attempt = 1;
    loop {
        match try_write_atomic(dir, target, bytes) {
            Ok(()) => return Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound && attempt < WRITE_ATTEMPTS => {
                attempt += 1;
            }
            Err(e) => return Err(Error::io(target.display(), e)),
        }
    }
}

fn try_write_atomic(dir: &FsPath, target: &FsPath, bytes: &[u8]) -> io::Result<()> {
    fs::create_dir_all(dir)?;

    let tmp_path = dir.join(format!("{}{}", TEMP_PREFIX, Uuid::new_v4().simple()));
    let result = (|| -> io::Result<()> {
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        fs::rename(&tmp_path, target)
    })();

    if result.is_err() {
        let _ = fs::remove_file(&tmp_path);
    }
    result
}

/// Read a file, mapping "not found" to `None`
pub fn read_optional(path: &FsPath) -> Result<Option<Vec<u8>>> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(Error::io(path.display(), e)),
    }
}

/// Metadata, mapping "not found" to `None`
pub fn metadata_optional(path: &FsPath) -> Result<Option<fs::Metadata>> {
    match fs::metadata(path) {
        Ok(meta) => Ok(Some(meta)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(Error::io(path.display(), e)),
    }
}

/// Remove `path` if it is a file; "not found" is not an error
pub fn remove_file_optional(path: &FsPath) -> Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(Error::io(path.display(), e)),
    }
}

/// Remove a directory tree if present
pub fn remove_dir_all_optional(path: &FsPath) -> Result<()> {
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::io(path.display(), e)),
    }
}

/// True if `dir` has no entries at all; a missing directory counts as empty
pub fn dir_is_empty(dir: &FsPath) -> Result<bool> {
    match fs::read_dir(dir) {
        Ok(mut entries) => Ok(entries.next().is_none()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(true),
        Err(e) => Err(Error::io(dir.display(), e)),
    }
}

/// Remove empty directories from `start` upwards, stopping at `stop` (exclusive)
///
/// A concurrent writer may create an entry at any moment; a non-empty
/// directory simply ends the walk.
pub fn prune_empty_dirs(start: &FsPath, stop: &FsPath) {
    let mut current: Option<PathBuf> = Some(start.to_path_buf());
    while let Some(dir) = current {
        if dir == stop || !dir.starts_with(stop) {
            break;
        }
        if fs::remove_dir(&dir).is_err() {
            break;
        }
        current = dir.parent().map(FsPath::to_path_buf);
    }
}
