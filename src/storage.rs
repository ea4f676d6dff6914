use percent_encoding::percent_decode_str;
use std::cmp::Ordering;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tokio::fs;

use crate::config::INDEX_FILENAMES;

/// Read-only view over the served folder. Owns the root path and performs
/// all path resolution and filesystem probing against it.
#[derive(Clone, Debug)]
pub struct Storage {
    root: PathBuf,
}

/// A request target mapped onto the served folder.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resolved {
    /// Cleaned client-facing path, always absolute from the served root.
    pub logical: String,
    /// Root joined with the logical path's segments.
    pub filesystem: PathBuf,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PathKind {
    Missing,
    File,
    Directory,
}

/// Snapshot of one directory child taken at listing time.
#[derive(Clone, Debug)]
pub struct FileEntry {
    pub name: String,
    pub is_dir: bool,
    pub size: u64,
    pub modified: Option<SystemTime>,
}

impl Storage {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root_path(&self) -> &Path {
        &self.root
    }

    /// Maps a raw request target to a cleaned logical path and the
    /// corresponding filesystem path under the root.
    ///
    /// The target is percent-decoded first, then cleaned lexically: empty
    /// and `.` segments are dropped and `..` pops the previous segment,
    /// never rising above the served root, so the result cannot escape it.
    pub fn resolve(&self, raw_target: &str) -> Resolved {
        let decoded = percent_decode_str(raw_target).decode_utf8_lossy();
        let mut segments: Vec<&str> = Vec::new();
        for segment in decoded.split('/') {
            match segment {
                "" | "." => continue,
                ".." => {
                    segments.pop();
                }
                segment => segments.push(segment),
            }
        }

        let logical = format!("/{}", segments.join("/"));
        let mut filesystem = self.root.clone();
        for segment in &segments {
            filesystem.push(segment);
        }

        Resolved {
            logical,
            filesystem,
        }
    }

    /// Determines whether the path exists and what it is.
    pub async fn probe(&self, path: &Path) -> io::Result<PathKind> {
        match fs::metadata(path).await {
            Ok(metadata) if metadata.is_dir() => Ok(PathKind::Directory),
            Ok(_) => Ok(PathKind::File),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(PathKind::Missing),
            Err(err) => Err(err),
        }
    }

    /// Returns the first configured index file present in the directory.
    pub async fn resolve_index(&self, dir: &Path) -> io::Result<Option<PathBuf>> {
        for name in INDEX_FILENAMES {
            let candidate = dir.join(name);
            match fs::metadata(&candidate).await {
                Ok(metadata) if metadata.is_file() => return Ok(Some(candidate)),
                Ok(_) => continue,
                Err(err) if err.kind() == ErrorKind::NotFound => continue,
                Err(err) => return Err(err),
            }
        }
        Ok(None)
    }

    /// Enumerates the directory's immediate children, directories first,
    /// then by name ascending within each group.
    pub async fn list_dir(&self, dir: &Path) -> io::Result<Vec<FileEntry>> {
        let mut dir = fs::read_dir(dir).await?;
        let mut entries = Vec::new();

        while let Some(entry) = dir.next_entry().await? {
            let metadata = entry.metadata().await?;
            entries.push(FileEntry {
                name: entry.file_name().to_string_lossy().to_string(),
                is_dir: metadata.is_dir(),
                size: metadata.len(),
                modified: metadata.modified().ok(),
            });
        }

        entries.sort_by(|a, b| match (a.is_dir, b.is_dir) {
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            _ => a.name.cmp(&b.name),
        });

        Ok(entries)
    }
}
