use super::{
    archive_directories, check_active_reference, display_path, is_reserved_name,
    is_stack_directory_empty, list_subdirectories, CleanupLog, ReferenceCheck, ReferenceLookup,
    TEMP_FILE_SUFFIX,
};
use crate::error::Error;
use crate::storage::Database;
use crate::utils::{file_name_string, format_bytes, normalize_root, relative_display};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TempStats {
    /// Temp files and empty stack directories together.
    pub count: u64,
    pub reclaimed: u64,
}

/// Remove temp files left by interrupted archive jobs, then empty stack
/// directories that no live stack metric points into.
pub fn cleanup_temp_files(
    db: &Database,
    archive_base: &Path,
    dry_run: bool,
    log: &mut CleanupLog,
) -> Result<TempStats, Error> {
    log.info("Checking for temporary files...");
    let root = normalize_root(archive_base);
    let archive_base = root.as_path();

    if !archive_base.exists() {
        return Ok(TempStats::default());
    }

    let mut stats = TempStats::default();

    for temp_file in find_temp_files(archive_base, log) {
        if let Some(size) = sweep_temp_file(archive_base, &temp_file, dry_run, log) {
            stats.count += 1;
            stats.reclaimed += size;
        }
    }

    // Registered and orphaned archive directories alike.
    for archive_dir in archive_directories(archive_base)? {
        let stack_dirs = match list_subdirectories(&archive_dir) {
            Ok(dirs) => dirs,
            Err(e) => {
                log.warn(format!(
                    "Failed to list stack directories in {}: {}",
                    file_name_string(&archive_dir),
                    e
                ));
                continue;
            }
        };

        for stack_dir in stack_dirs {
            if !is_stack_directory_empty(&stack_dir) {
                continue;
            }
            if sweep_empty_stack_dir(db, archive_base, &stack_dir, dry_run, log) {
                stats.count += 1;
            }
        }
    }

    if stats.count > 0 {
        log.info(format!(
            "Found {} temp file(s)/directory(ies), {} to reclaim",
            stats.count,
            format_bytes(stats.reclaimed)
        ));
    } else {
        log.info("No temporary files found");
    }

    Ok(stats)
}

/// Size reclaimed (or in dry-run reclaimable), `None` if the removal failed.
fn sweep_temp_file(
    archive_base: &Path,
    temp_file: &Path,
    dry_run: bool,
    log: &mut CleanupLog,
) -> Option<u64> {
    // Vanished between the walk and now.
    let size = fs::metadata(temp_file).map(|m| m.len()).unwrap_or(0);
    let rel = relative_display(archive_base, temp_file);

    if dry_run {
        log.info(format!("Would delete temp file: {} ({})", rel, format_bytes(size)));
        return Some(size);
    }

    log.info(format!("Deleting temp file: {} ({})", rel, format_bytes(size)));
    match fs::remove_file(temp_file) {
        Ok(()) => Some(size),
        Err(e) => {
            log.error(format!("Failed to delete temp file {}: {}", rel, e));
            None
        }
    }
}

/// Returns whether the directory was (or in dry-run would be) removed.
fn sweep_empty_stack_dir(
    db: &Database,
    archive_base: &Path,
    stack_dir: &Path,
    dry_run: bool,
    log: &mut CleanupLog,
) -> bool {
    let rel = relative_display(archive_base, stack_dir);

    match check_active_reference(db, stack_dir) {
        ReferenceCheck::Clear => {}
        ReferenceCheck::Active => {
            if dry_run {
                log.info(format!(
                    "Would keep stack directory (active DB references exist): {}",
                    rel
                ));
            } else {
                log.info(format!("Skipping deletion (active DB references exist): {}", rel));
            }
            return false;
        }
        ReferenceCheck::Unknown(e) => {
            log.warn(format!("DB check failed for {}: {}. Skipping deletion.", rel, e));
            return false;
        }
    }

    let reference = ReferenceLookup::resolve(db, stack_dir);
    let display = display_path(archive_base, stack_dir, reference.archive_label());
    let context = match reference.describe() {
        info if info.is_empty() => String::new(),
        info => format!(" ({})", info),
    };

    if dry_run {
        log.info(format!("Would delete empty stack directory: {}{}", display, context));
        return true;
    }

    log.info(format!("Deleting empty stack directory: {}{}", display, context));
    match fs::remove_dir_all(stack_dir) {
        Ok(()) => true,
        Err(e) => {
            log.error(format!("Failed to delete empty stack directory {}: {}", display, e));
            false
        }
    }
}

/// Temp-suffixed regular files anywhere under the root, outside reserved directories.
fn find_temp_files(archive_base: &Path, log: &mut CleanupLog) -> Vec<PathBuf> {
    let walker = WalkDir::new(archive_base)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            !(entry.depth() == 1
                && entry.file_type().is_dir()
                && is_reserved_name(&entry.file_name().to_string_lossy()))
        });

    let mut temp_files = Vec::new();
    for entry in walker {
        match entry {
            Ok(entry) => {
                if entry.file_type().is_file()
                    && entry.file_name().to_string_lossy().ends_with(TEMP_FILE_SUFFIX)
                {
                    temp_files.push(entry.into_path());
                }
            }
            Err(e) => log.warn(format!("Error walking {}: {}", archive_base.display(), e)),
        }
    }
    temp_files
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_vanished_temp_file_counts_zero_bytes() {
        let tmp = tempdir().unwrap();
        let gone = tmp.path().join("alpha").join("web").join("upload.tmp");
        let mut log = CleanupLog::new();

        assert_eq!(sweep_temp_file(tmp.path(), &gone, true, &mut log), Some(0));
        assert!(log.contains("Would delete temp file: alpha/web/upload.tmp (0.00 B)"));

        assert_eq!(sweep_temp_file(tmp.path(), &gone, false, &mut log), None);
        assert!(log.contains("Failed to delete temp file alpha/web/upload.tmp"));
    }
}
