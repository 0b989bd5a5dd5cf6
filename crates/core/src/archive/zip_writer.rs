//! Copy-and-replace zip writer.
//!
//! Zip keeps its central directory at the end of the file, so entries cannot
//! be inserted in place. Every upsert rebuilds the container in a staging
//! file next to the target and renames it over the original; the rename is
//! the only step that touches the live container.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use super::ArchiveError;

/// Mode given to finished containers, which are served as public downloads.
#[cfg(unix)]
const CONTAINER_MODE: u32 = 0o644;

/// Appends entries to on-disk containers.
///
/// Implementations do no locking: callers must serialize upserts that target
/// the same path.
pub trait ArchiveWriter: Send + Sync {
    /// Add `bytes` as `entry_name` to the container at `path`, keeping every
    /// entry already stored there. Returns the name the entry was stored under.
    fn upsert(&self, path: &Path, entry_name: &str, bytes: &[u8]) -> Result<String, ArchiveError>;
}

/// Zip container writer.
#[derive(Debug, Clone, Default)]
pub struct ZipArchiveWriter {
    staging_dir: Option<PathBuf>,
}

impl ZipArchiveWriter {
    /// Writer staging rewrites next to each container.
    pub fn new() -> Self {
        Self::default()
    }

    /// Writer staging rewrites in `dir`, which must share a filesystem with
    /// the containers.
    pub fn with_staging_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            staging_dir: Some(dir.into()),
        }
    }

    fn staging_dir_for(&self, path: &Path) -> PathBuf {
        match &self.staging_dir {
            Some(dir) => dir.clone(),
            None => match path.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
                _ => PathBuf::from("."),
            },
        }
    }

    fn entry_options() -> SimpleFileOptions {
        SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .unix_permissions(0o644)
    }

    /// Open the current container, or `None` when it is missing or empty.
    fn open_existing(path: &Path) -> Result<Option<ZipArchive<BufReader<File>>>, ArchiveError> {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(ArchiveError::OpenFailed {
                    path: path.to_path_buf(),
                    source: e,
                })
            }
        };

        let len = file
            .metadata()
            .map_err(|e| ArchiveError::OpenFailed {
                path: path.to_path_buf(),
                source: e,
            })?
            .len();
        if len == 0 {
            return Ok(None);
        }

        ZipArchive::new(BufReader::new(file))
            .map(Some)
            .map_err(|e| ArchiveError::zip(path, e))
    }
}

impl ArchiveWriter for ZipArchiveWriter {
    fn upsert(&self, path: &Path, entry_name: &str, bytes: &[u8]) -> Result<String, ArchiveError> {
        let mut existing = Self::open_existing(path)?;

        let staging_dir = self.staging_dir_for(path);
        let mut staged = NamedTempFile::new_in(&staging_dir).map_err(|e| {
            ArchiveError::StagingFailed {
                dir: staging_dir.clone(),
                source: e,
            }
        })?;

        let stored_name = {
            let mut writer = ZipWriter::new(staged.as_file_mut());

            let stored_name = match existing.as_mut() {
                Some(archive) => {
                    let taken: HashSet<String> =
                        archive.file_names().map(str::to_string).collect();
                    for index in 0..archive.len() {
                        let entry = archive
                            .by_index_raw(index)
                            .map_err(|e| ArchiveError::zip(path, e))?;
                        writer
                            .raw_copy_file(entry)
                            .map_err(|e| ArchiveError::zip(path, e))?;
                    }
                    unique_entry_name(entry_name, &taken)
                }
                None => entry_name.to_string(),
            };

            writer
                .start_file(stored_name.as_str(), Self::entry_options())
                .map_err(|e| ArchiveError::zip(path, e))?;
            writer.write_all(bytes)?;
            writer.finish().map_err(|e| ArchiveError::zip(path, e))?;
            stored_name
        };

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            staged
                .as_file()
                .set_permissions(std::fs::Permissions::from_mode(CONTAINER_MODE))?;
        }
        staged.as_file().sync_all()?;
        // Release the read handle before replacing the file it points at.
        drop(existing);

        staged
            .persist(path)
            .map_err(|e| ArchiveError::CommitFailed {
                path: path.to_path_buf(),
                source: e.error,
            })?;

        debug!(
            archive = %path.display(),
            entry = %stored_name,
            size = bytes.len(),
            "Entry added to archive"
        );
        Ok(stored_name)
    }
}

/// Pick a name for `wanted` that does not collide with `taken`.
///
/// Collisions get a numeric suffix before the extension: `photo.jpg`,
/// `photo (1).jpg`, `photo (2).jpg`, ...
pub fn unique_entry_name(wanted: &str, taken: &HashSet<String>) -> String {
    if !taken.contains(wanted) {
        return wanted.to_string();
    }

    let (stem, ext) = match wanted.rfind('.') {
        Some(dot) if dot > 0 => (&wanted[..dot], &wanted[dot..]),
        _ => (wanted, ""),
    };

    (1..)
        .map(|n| format!("{} ({}){}", stem, n, ext))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or_else(|| wanted.to_string())
}
