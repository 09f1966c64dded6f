use chrono::{DateTime, SecondsFormat, Utc};
use std::path::{self, Component, Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// RFC 3339 UTC at second precision, so stored timestamps sort lexically.
pub fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn now_timestamp() -> String {
    timestamp(Utc::now())
}

pub fn format_bytes(size: u64) -> String {
    let mut value = size as f64;
    for unit in ["B", "KB", "MB", "GB", "TB"] {
        if value < 1024.0 {
            return format!("{:.2} {}", value, unit);
        }
        value /= 1024.0;
    }
    format!("{:.2} PB", value)
}

/// Total size of regular files under `path`. Entries that cannot be read are skipped.
pub fn directory_size(path: &Path) -> u64 {
    let mut total = 0u64;
    for entry in WalkDir::new(path).min_depth(1) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                debug!("Skipping unreadable entry while sizing {}: {}", path.display(), e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        match entry.metadata() {
            Ok(metadata) => total += metadata.len(),
            Err(e) => debug!("Error reading metadata for {}: {}", entry.path().display(), e),
        }
    }
    total
}

/// Absolute form of an archive root with `.` segments removed, so paths built
/// from it compare equal to the absolute paths stored in the ledger.
/// `..` is left alone since resolving it lexically can cross a symlink.
pub fn normalize_root(root: &Path) -> PathBuf {
    let absolute = match path::absolute(root) {
        Ok(absolute) => absolute,
        Err(e) => {
            debug!("Cannot make {} absolute: {}", root.display(), e);
            root.to_path_buf()
        }
    };
    absolute
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

pub fn path_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// `path` relative to `base` with `/` separators, or the full path if it is not under `base`.
pub fn relative_display(base: &Path, path: &Path) -> String {
    match path.strip_prefix(base) {
        Ok(rel) => rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/"),
        Err(_) => path_string(path),
    }
}

pub fn file_name_string(path: &Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_default()
}
