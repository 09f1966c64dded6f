//! Reconciliation of the archive root against the ledger.
//!
//! Three sweeps run in order: orphaned archive directories, stale job
//! history, and temp leftovers (temp files plus empty stack directories).
//! Every destructive decision is gated on the ledger; anything that cannot be
//! classified with certainty is kept.

mod classifier;
mod engine;
mod log;
mod orphans;
mod report;
mod retention;
mod temp;

pub use classifier::{is_stack_directory_empty, is_timestamp_dir_name, TIMESTAMP_DIR_PATTERN};
pub use engine::{CleanupEngine, CleanupRun};
pub use log::{CleanupLog, LogEntry, LogLevel};
pub use orphans::{cleanup_orphaned_archives, OrphanStats};
pub use report::{generate_cleanup_report, CleanupReport, OrphanEntry, TempItem};
pub use retention::{cleanup_old_logs, retention_cutoff, LogStats};
pub use temp::{cleanup_temp_files, TempStats};

use crate::error::Error;
use crate::storage::models::StackReference;
use crate::storage::Database;
use crate::utils::{file_name_string, path_string, relative_display};
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Top-level directories starting with this are never scanned.
pub const RESERVED_DIR_PREFIX: char = '_';
pub const TEMP_FILE_SUFFIX: &str = ".tmp";
/// Recorded in `deleted_by` when a metric is soft-deleted by a sweep.
pub const DELETED_BY_CLEANUP: &str = "cleanup";

pub fn is_reserved_name(name: &str) -> bool {
    name.starts_with(RESERVED_DIR_PREFIX)
}

/// A top-level archive directory and whether the registry snapshot owns it.
#[derive(Debug, Clone)]
pub(crate) struct ArchiveDir {
    pub name: String,
    pub path: PathBuf,
    pub registered: bool,
}

/// Real (non-symlink) subdirectories of `dir`, sorted by name.
pub(crate) fn list_subdirectories(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Error reading entry in {}: {}", dir.display(), e);
                continue;
            }
        };
        match entry.file_type() {
            Ok(file_type) if file_type.is_dir() => dirs.push(entry.path()),
            Ok(_) => {}
            Err(e) => warn!("Error reading file type of {}: {}", entry.path().display(), e),
        }
    }
    dirs.sort();
    Ok(dirs)
}

/// Non-reserved top-level directories of the archive root.
pub(crate) fn archive_directories(archive_base: &Path) -> io::Result<Vec<PathBuf>> {
    Ok(list_subdirectories(archive_base)?
        .into_iter()
        .filter(|path| !is_reserved_name(&file_name_string(path)))
        .collect())
}

/// [`archive_directories`], each tagged against the registry snapshot.
pub(crate) fn classify_archive_dirs(
    archive_base: &Path,
    registered: &HashSet<String>,
) -> Result<Vec<ArchiveDir>, Error> {
    let dirs = archive_directories(archive_base)?
        .into_iter()
        .map(|path| {
            let name = file_name_string(&path);
            ArchiveDir {
                registered: registered.contains(&name),
                name,
                path,
            }
        })
        .collect();
    Ok(dirs)
}

/// Outcome of the live-reference gate. `Unknown` must be treated as `Active`.
#[derive(Debug)]
pub(crate) enum ReferenceCheck {
    Clear,
    Active,
    Unknown(Error),
}

impl ReferenceCheck {
    pub fn blocks_deletion(&self) -> bool {
        !matches!(self, ReferenceCheck::Clear)
    }
}

pub(crate) fn check_active_reference(db: &Database, dir: &Path) -> ReferenceCheck {
    match db.has_active_reference(&path_string(dir)) {
        Ok(true) => ReferenceCheck::Active,
        Ok(false) => ReferenceCheck::Clear,
        Err(e) => ReferenceCheck::Unknown(e.into()),
    }
}

/// Ledger context for a directory, used for display only.
#[derive(Debug)]
pub(crate) enum ReferenceLookup {
    Found(StackReference),
    Missing,
    Failed(Error),
}

impl ReferenceLookup {
    pub fn resolve(db: &Database, dir: &Path) -> Self {
        match db.latest_reference(&path_string(dir)) {
            Ok(Some(reference)) => ReferenceLookup::Found(reference),
            Ok(None) => ReferenceLookup::Missing,
            Err(e) => ReferenceLookup::Failed(e.into()),
        }
    }

    pub fn archive_label(&self) -> Option<&str> {
        match self {
            ReferenceLookup::Found(reference) => reference.archive_name.as_deref(),
            _ => None,
        }
    }

    /// `archive='a', stack='s'`, a failure note, or empty.
    pub fn describe(&self) -> String {
        match self {
            ReferenceLookup::Found(reference) => format!(
                "archive='{}', stack='{}'",
                reference.archive_name.as_deref().unwrap_or("unknown"),
                reference.stack_name.as_deref().unwrap_or("unknown"),
            ),
            ReferenceLookup::Missing => String::new(),
            ReferenceLookup::Failed(e) => format!("DB lookup failed: {}", e),
        }
    }
}

/// Relative path of `dir`, prefixed with its owning archive's name unless already present.
/// Without a ledger label the parent directory name is used.
pub(crate) fn display_path(archive_base: &Path, dir: &Path, archive_label: Option<&str>) -> String {
    let rel = relative_display(archive_base, dir);
    let label = match archive_label {
        Some(label) => label.to_string(),
        None => match dir.parent() {
            Some(parent) => file_name_string(parent),
            None => return rel,
        },
    };
    if label.is_empty() || rel == label || rel.starts_with(&format!("{}/", label)) {
        rel
    } else {
        format!("{}/{}", label, rel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_path_uses_ledger_label() {
        let base = Path::new("/archives");
        let dir = base.join("alpha").join("web");
        assert_eq!(display_path(base, &dir, Some("nightly")), "nightly/alpha/web");
        assert_eq!(display_path(base, &dir, Some("alpha")), "alpha/web");
    }

    #[test]
    fn test_display_path_falls_back_to_parent_name() {
        let base = Path::new("/archives");
        let dir = base.join("alpha").join("web");
        assert_eq!(display_path(base, &dir, None), "alpha/web");
    }

    #[test]
    fn test_reserved_names() {
        assert!(is_reserved_name("_staging"));
        assert!(!is_reserved_name("alpha_1"));
    }

    #[test]
    fn test_describe_reference() {
        let found = ReferenceLookup::Found(StackReference {
            archive_name: Some("nightly".to_string()),
            stack_name: None,
        });
        assert_eq!(found.describe(), "archive='nightly', stack='unknown'");
        assert_eq!(ReferenceLookup::Missing.describe(), "");
    }
}
