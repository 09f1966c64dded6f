use lazy_static::lazy_static;
use regex::Regex;
use std::fs;
use std::path::Path;
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

/// Backup run directories are named `YYYYMMDD_HHMMSS`, optionally with a suffix.
pub const TIMESTAMP_DIR_PATTERN: &str = r"^\d{8}_\d{6}";

lazy_static! {
    static ref TIMESTAMP_DIR_RE: Regex =
        Regex::new(TIMESTAMP_DIR_PATTERN).expect("timestamp pattern is a valid regex");
}

pub fn is_timestamp_dir_name(name: &str) -> bool {
    TIMESTAMP_DIR_RE.is_match(name)
}

/// Whether a stack directory holds no backup content. Any doubt answers `false`.
pub fn is_stack_directory_empty(stack_dir: &Path) -> bool {
    let children = match fs::read_dir(stack_dir) {
        Ok(entries) => match entries.collect::<Result<Vec<_>, _>>() {
            Ok(children) => children,
            Err(e) => {
                debug!("Failed to list {}: {}", stack_dir.display(), e);
                return false;
            }
        },
        Err(e) => {
            debug!("Failed to read {}: {}", stack_dir.display(), e);
            return false;
        }
    };

    if children.is_empty() {
        return true;
    }

    if contains_file(stack_dir) {
        return false;
    }

    let child_dirs = children.iter().filter(|entry| entry.path().is_dir());
    for child in child_dirs {
        if is_timestamp_dir_name(&child.file_name().to_string_lossy()) {
            return false;
        }
    }

    // Layouts like stack/stack/...
    if let Some(name) = stack_dir.file_name() {
        let nested = stack_dir.join(name);
        if nested.is_dir() && contains_file(&nested) {
            return false;
        }
    }

    true
}

/// True if a regular file exists anywhere below `dir`, or if any part of the
/// tree could not be read.
fn contains_file(dir: &Path) -> bool {
    for entry in WalkDir::new(dir).min_depth(1) {
        match entry {
            Ok(entry) if is_regular_file(&entry) => return true,
            Ok(_) => {}
            Err(e) => {
                debug!("Unreadable entry under {}: {}", dir.display(), e);
                return true;
            }
        }
    }
    false
}

fn is_regular_file(entry: &DirEntry) -> bool {
    let file_type = entry.file_type();
    file_type.is_file()
        || (file_type.is_symlink()
            && fs::metadata(entry.path())
                .map(|m| m.is_file())
                .unwrap_or(false))
}
