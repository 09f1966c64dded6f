use super::{classify_archive_dirs, ArchiveDir, CleanupLog, DELETED_BY_CLEANUP};
use crate::error::Error;
use crate::storage::Database;
use crate::utils::{directory_size, file_name_string, format_bytes, normalize_root, path_string};
use serde::Serialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OrphanStats {
    pub count: u64,
    pub reclaimed: u64,
}

/// Remove top-level archive directories that have no registry entry.
///
/// Registered directories are only audited: files inside them that no stack
/// metric references are reported for manual cleanup, never deleted.
pub fn cleanup_orphaned_archives(
    db: &Database,
    archive_base: &Path,
    dry_run: bool,
    log: &mut CleanupLog,
) -> Result<OrphanStats, Error> {
    log.info("Checking for orphaned archive directories...");
    let root = normalize_root(archive_base);
    let archive_base = root.as_path();

    if !archive_base.exists() {
        log.info("Archive directory does not exist, skipping");
        return Ok(OrphanStats::default());
    }

    let registered = db.list_archive_names()?;
    let mut stats = OrphanStats::default();

    for archive_dir in classify_archive_dirs(archive_base, &registered)? {
        if archive_dir.registered {
            audit_archive_files(db, &archive_dir, log);
            continue;
        }

        let size = directory_size(&archive_dir.path);

        if dry_run {
            log.info(format!(
                "Would delete orphaned archive directory: {} ({})",
                archive_dir.name,
                format_bytes(size)
            ));
            stats.count += 1;
            stats.reclaimed += size;
            continue;
        }

        if remove_orphan(db, &archive_dir, size, log) {
            stats.count += 1;
            stats.reclaimed += size;
        }
    }

    if stats.count > 0 {
        log.info(format!(
            "Found {} orphaned archive(s), {} to reclaim",
            stats.count,
            format_bytes(stats.reclaimed)
        ));
    } else {
        log.info("No orphaned archives found");
    }

    Ok(stats)
}

/// Soft-delete the ledger rows under the directory, then remove the tree.
/// The directory is kept if the ledger cannot be updated first.
fn remove_orphan(db: &Database, archive_dir: &ArchiveDir, size: u64, log: &mut CleanupLog) -> bool {
    log.info(format!(
        "Deleting orphaned archive directory: {} ({})",
        archive_dir.name,
        format_bytes(size)
    ));

    match db.soft_delete_metrics_under(&path_string(&archive_dir.path), DELETED_BY_CLEANUP) {
        Ok(0) => {}
        Ok(marked) => log.info(format!(
            "Marked {} archive record(s) under {} as deleted",
            marked, archive_dir.name
        )),
        Err(e) => {
            log.error(format!(
                "Failed to mark archives as deleted in DB for {}: {}. Keeping directory.",
                archive_dir.name, e
            ));
            return false;
        }
    }

    match fs::remove_dir_all(&archive_dir.path) {
        Ok(()) => true,
        Err(e) => {
            log.error(format!("Failed to delete {}: {}", archive_dir.path.display(), e));
            false
        }
    }
}

fn audit_archive_files(db: &Database, archive_dir: &ArchiveDir, log: &mut CleanupLog) {
    let entries = match fs::read_dir(&archive_dir.path) {
        Ok(entries) => entries,
        Err(e) => {
            log.warn(format!(
                "Failed to inspect files in {}: {}",
                archive_dir.path.display(),
                e
            ));
            return;
        }
    };

    let mut files: Vec<_> = entries
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry.path()),
            Err(e) => {
                log.warn(format!(
                    "Error inspecting entry in {}: {}",
                    archive_dir.path.display(),
                    e
                ));
                None
            }
        })
        .filter(|path| path.is_file())
        .collect();
    files.sort();

    for file in files {
        let file_name = file_name_string(&file);
        match db.file_is_referenced(&path_string(&file), &file_name) {
            Ok(true) => log.info(format!(
                "Keeping referenced file: {}/{}",
                archive_dir.name, file_name
            )),
            Ok(false) => log.info(format!(
                "Unreferenced file in archive dir: {}/{} (candidate for manual cleanup)",
                archive_dir.name, file_name
            )),
            Err(e) => log.warn(format!("Error inspecting {}: {}", file.display(), e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_already_removed_orphan_is_a_logged_failure() {
        let tmp = tempdir().unwrap();
        let db = Database::open_in_memory().unwrap();
        let orphan = ArchiveDir {
            name: "beta".to_string(),
            path: tmp.path().join("beta"),
            registered: false,
        };
        let mut log = CleanupLog::new();

        assert!(!remove_orphan(&db, &orphan, 0, &mut log));
        assert!(log.contains("Deleting orphaned archive directory: beta (0.00 B)"));
        assert!(log.contains("Failed to delete"));
    }
}
