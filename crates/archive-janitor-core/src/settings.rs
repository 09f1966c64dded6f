use crate::error::Error;
use crate::storage::Database;
use std::collections::HashMap;
use tracing::warn;

pub const CLEANUP_ENABLED: &str = "cleanup_enabled";
pub const CLEANUP_DRY_RUN: &str = "cleanup_dry_run";
pub const CLEANUP_LOG_RETENTION_DAYS: &str = "cleanup_log_retention_days";
pub const NOTIFY_ON_CLEANUP: &str = "notify_on_cleanup";

pub const DEFAULT_LOG_RETENTION_DAYS: i64 = 90;

/// Key/value store the cleanup settings are read from.
pub trait SettingsProvider {
    fn get_setting(&self, key: &str) -> Result<Option<String>, Error>;
}

impl SettingsProvider for Database {
    fn get_setting(&self, key: &str) -> Result<Option<String>, Error> {
        Ok(Database::get_setting(self, key)?)
    }
}

impl SettingsProvider for HashMap<String, String> {
    fn get_setting(&self, key: &str) -> Result<Option<String>, Error> {
        Ok(self.get(key).cloned())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupSettings {
    pub enabled: bool,
    pub dry_run: bool,
    /// `<= 0` disables job-history purging.
    pub log_retention_days: i64,
    pub notify_on_cleanup: bool,
}

impl Default for CleanupSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            dry_run: false,
            log_retention_days: DEFAULT_LOG_RETENTION_DAYS,
            notify_on_cleanup: false,
        }
    }
}

impl CleanupSettings {
    /// Missing, unreadable or malformed values fall back to their defaults.
    pub fn load(provider: &dyn SettingsProvider) -> Self {
        let defaults = Self::default();
        Self {
            enabled: read_bool(provider, CLEANUP_ENABLED, defaults.enabled),
            dry_run: read_bool(provider, CLEANUP_DRY_RUN, defaults.dry_run),
            log_retention_days: read_int(
                provider,
                CLEANUP_LOG_RETENTION_DAYS,
                defaults.log_retention_days,
            ),
            notify_on_cleanup: read_bool(provider, NOTIFY_ON_CLEANUP, defaults.notify_on_cleanup),
        }
    }
}

fn read_raw(provider: &dyn SettingsProvider, key: &str) -> Option<String> {
    match provider.get_setting(key) {
        Ok(value) => value,
        Err(e) => {
            warn!("Failed to read setting '{}', using default: {}", key, e);
            None
        }
    }
}

fn read_bool(provider: &dyn SettingsProvider, key: &str, default: bool) -> bool {
    let Some(raw) = read_raw(provider, key) else {
        return default;
    };
    match raw.trim().to_lowercase().as_str() {
        "true" => true,
        "false" => false,
        other => {
            warn!("Invalid value '{}' for setting '{}', using default {}", other, key, default);
            default
        }
    }
}

fn read_int(provider: &dyn SettingsProvider, key: &str, default: i64) -> i64 {
    let Some(raw) = read_raw(provider, key) else {
        return default;
    };
    match raw.trim().parse::<i64>() {
        Ok(value) => value,
        Err(_) => {
            warn!("Invalid value '{}' for setting '{}', using default {}", raw, key, default);
            default
        }
    }
}
