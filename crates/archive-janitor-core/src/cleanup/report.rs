use super::{
    archive_directories, check_active_reference, classify_archive_dirs, display_path,
    is_stack_directory_empty, list_subdirectories, retention_cutoff, CleanupLog, ReferenceCheck,
    ReferenceLookup,
};
use crate::error::Error;
use crate::storage::Database;
use crate::utils::{directory_size, format_bytes, normalize_root, path_string, timestamp};
use chrono::Utc;
use serde::Serialize;
use std::path::Path;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrphanEntry {
    pub name: String,
    pub size: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TempItem {
    pub display_path: String,
    pub path: String,
    pub has_active_db_ref: bool,
    pub reference_info: String,
}

/// What a cleanup run would touch, computed without mutating anything.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    pub orphaned: Vec<OrphanEntry>,
    pub old_logs_count: u64,
    pub temp_items: Vec<TempItem>,
}

pub fn generate_cleanup_report(
    db: &Database,
    archive_base: &Path,
    retention_days: i64,
) -> Result<CleanupReport, Error> {
    let root = normalize_root(archive_base);
    let archive_base = root.as_path();
    let mut report = CleanupReport::default();

    if !archive_base.exists() {
        return Ok(report);
    }

    let registered = db.list_archive_names()?;
    report.orphaned = classify_archive_dirs(archive_base, &registered)?
        .into_iter()
        .filter(|dir| !dir.registered)
        .map(|dir| OrphanEntry {
            size: directory_size(&dir.path),
            name: dir.name,
        })
        .collect();

    if retention_days > 0 {
        let cutoff = timestamp(retention_cutoff(Utc::now(), retention_days));
        report.old_logs_count = db.count_jobs_started_before(&cutoff)?;
    }

    for archive_dir in archive_directories(archive_base)? {
        let stack_dirs = match list_subdirectories(&archive_dir) {
            Ok(dirs) => dirs,
            Err(e) => {
                warn!("Failed to list stack directories in {}: {}", archive_dir.display(), e);
                continue;
            }
        };

        for stack_dir in stack_dirs {
            if !is_stack_directory_empty(&stack_dir) {
                continue;
            }
            report.temp_items.push(describe_stack_dir(db, archive_base, &stack_dir));
        }
    }

    Ok(report)
}

fn describe_stack_dir(db: &Database, archive_base: &Path, stack_dir: &Path) -> TempItem {
    let check = check_active_reference(db, stack_dir);
    let reference = ReferenceLookup::resolve(db, stack_dir);

    let mut reference_info = reference.describe();
    if let ReferenceCheck::Unknown(e) = &check {
        if reference_info.is_empty() {
            reference_info = format!("DB lookup failed: {}", e);
        }
    }

    TempItem {
        display_path: display_path(archive_base, stack_dir, reference.archive_label()),
        path: path_string(stack_dir),
        has_active_db_ref: check.blocks_deletion(),
        reference_info,
    }
}

impl CleanupReport {
    pub fn write_to_log(&self, log: &mut CleanupLog) {
        log.info("--- Cleanup Dry-Run Report ---");

        if self.orphaned.is_empty() {
            log.info("Orphaned archive directories: None");
        } else {
            log.info(format!(
                "Orphaned archive directories (not in DB): {}",
                self.orphaned.len()
            ));
            for orphan in &self.orphaned {
                log.info(format!("  - {} ({})", orphan.name, format_bytes(orphan.size)));
            }
        }

        log.info(format!(
            "Old job logs older than retention: {}",
            self.old_logs_count
        ));

        if self.temp_items.is_empty() {
            log.info("Empty/Temp stack directories: None");
        } else {
            log.info(format!("Empty/Temp stack directories: {}", self.temp_items.len()));
            for item in &self.temp_items {
                log.info(format!(
                    "  - {} -> {} [{}] {}",
                    item.display_path,
                    item.path,
                    item.action(),
                    item.reference_info
                ));
            }
        }

        log.info("--- End Cleanup Dry-Run Report ---");
    }
}

impl TempItem {
    pub fn action(&self) -> &'static str {
        if self.has_active_db_ref {
            "KEEP"
        } else {
            "DELETE"
        }
    }
}
