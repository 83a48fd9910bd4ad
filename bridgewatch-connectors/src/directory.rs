//! Local mirror directory source
//!
//! Sensor gateways upload one CSV file per capture period into a shared
//! folder. When that folder is synced to local disk, the newest file by
//! modification time is the current capture. Files with other extensions,
//! subdirectories and hidden files are ignored.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use log::debug;

use bridgewatch_core::traits::{CsvSource, SourceError, SourceResolver};

/// Resolver reading the newest matching file of a directory
#[derive(Debug, Clone)]
pub struct DirectorySource {
    path: PathBuf,
    extension: String,
}

impl DirectorySource {
    /// Scan `path` for `.csv` files
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            extension: "csv".to_string(),
        }
    }

    /// Match files with this extension (case-insensitive, without the dot)
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into().trim_start_matches('.').to_lowercase();
        self
    }

    /// Directory being scanned
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn matches(&self, path: &Path) -> bool {
        let hidden = path
            .file_name()
            .and_then(|name| name.to_str())
            .map_or(true, |name| name.starts_with('.'));
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_lowercase);
        !hidden && extension.as_deref() == Some(self.extension.as_str())
    }

    /// Newest matching file; ties on mtime go to the greater file name
    ///
    /// Entries that disappear while the directory is scanned (renamed temp
    /// files, finished partial uploads) are skipped.
    pub fn latest_file(&self) -> Result<Option<PathBuf>, SourceError> {
        let mut latest: Option<(SystemTime, PathBuf)> = None;

        for entry in fs::read_dir(&self.path)? {
            let path = entry?.path();
            if !self.matches(&path) {
                continue;
            }

            let Some(modified) = modified_time(&path)? else {
                continue;
            };
            let newer = match &latest {
                Some((best_time, best_path)) => (modified, &path) > (*best_time, best_path),
                None => true,
            };
            if newer {
                latest = Some((modified, path));
            }
        }

        Ok(latest.map(|(_, path)| path))
    }
}

/// Modification time of a regular file, following symlinks
///
/// `Ok(None)` for anything that is not a file, including entries that vanished.
fn modified_time(path: &Path) -> io::Result<Option<SystemTime>> {
    let metadata = match fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!("{} vanished during scan", path.display());
            return Ok(None);
        }
        Err(e) => return Err(e),
    };
    if !metadata.is_file() {
        return Ok(None);
    }
    match metadata.modified() {
        Ok(modified) => Ok(Some(modified)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

impl SourceResolver for DirectorySource {
    fn name(&self) -> &str {
        "directory"
    }

    fn fetch_raw_csv(&self) -> Result<Option<CsvSource>, SourceError> {
        let Some(path) = self.latest_file()? else {
            debug!("no .{} files in {}", self.extension, self.path.display());
            return Ok(None);
        };

        let bytes = fs::read(&path)?;
        let content = String::from_utf8(bytes)
            .map_err(|e| SourceError::Decode(format!("{}: {}", path.display(), e)))?;
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(Some(CsvSource::new(filename, content)))
    }
}
