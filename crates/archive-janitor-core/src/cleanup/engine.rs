use super::{
    cleanup_old_logs, cleanup_orphaned_archives, cleanup_temp_files, generate_cleanup_report,
    CleanupLog, CleanupReport,
};
use crate::error::Error;
use crate::notify::{CleanupSummary, Notifier, SilentNotifier};
use crate::settings::CleanupSettings;
use crate::storage::Database;
use crate::utils::{format_bytes, normalize_root, now_timestamp};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

pub const DEFAULT_TRIGGER: &str = "scheduled";

/// Result of a cleanup run that was not disabled by settings.
#[derive(Debug, Clone)]
pub struct CleanupRun {
    /// `None` when the job record could not be persisted.
    pub job_id: Option<i64>,
    pub summary: CleanupSummary,
    pub transcript: String,
}

/// Entry point for a cleanup pass over one archive root.
///
/// Concurrent runs against the same root are not coordinated; callers that
/// need at most one run at a time must hold their own lock.
pub struct CleanupEngine<'a> {
    db: &'a Database,
    archive_base: PathBuf,
    triggered_by: String,
    notifier: &'a dyn Notifier,
}

impl<'a> CleanupEngine<'a> {
    /// The archive root is made absolute here; ledger paths are matched against it as strings.
    pub fn new(db: &'a Database, archive_base: impl AsRef<Path>) -> Self {
        Self {
            db,
            archive_base: normalize_root(archive_base.as_ref()),
            triggered_by: DEFAULT_TRIGGER.to_string(),
            notifier: &SilentNotifier,
        }
    }

    pub fn with_trigger(mut self, triggered_by: &str) -> Self {
        self.triggered_by = triggered_by.to_string();
        self
    }

    pub fn with_notifier(mut self, notifier: &'a dyn Notifier) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn archive_base(&self) -> &Path {
        &self.archive_base
    }

    /// Non-destructive preview using the configured retention window.
    pub fn report(&self) -> Result<CleanupReport, Error> {
        let settings = CleanupSettings::load(self.db);
        generate_cleanup_report(self.db, &self.archive_base, settings.log_retention_days)
    }

    /// Run all sweeps. `dry_run_override` takes precedence over the
    /// `cleanup_dry_run` setting. Returns `Ok(None)` when cleanup is disabled.
    ///
    /// A sweep failure is recorded on the job as `failed` and then returned.
    pub fn run(&self, dry_run_override: Option<bool>) -> Result<Option<CleanupRun>, Error> {
        let settings = CleanupSettings::load(self.db);
        if !settings.enabled {
            info!("Cleanup task is disabled in settings");
            return Ok(None);
        }

        let dry_run = dry_run_override.unwrap_or(settings.dry_run);
        let mode = if dry_run { "DRY RUN" } else { "LIVE" };

        let job_id = match self
            .db
            .create_cleanup_job(&now_timestamp(), &self.triggered_by, dry_run)
        {
            Ok(id) => Some(id),
            Err(e) => {
                warn!("Failed to create job record, continuing without one: {}", e);
                None
            }
        };

        let mut log = CleanupLog::new();
        log.info(format!("Starting cleanup task ({})", mode));

        let summary = match self.sweep(&settings, dry_run, &mut log) {
            Ok(summary) => summary,
            Err(e) => {
                log.error(format!("Cleanup failed: {}", e));
                if let Some(id) = job_id {
                    if let Err(db_err) =
                        self.db
                            .fail_job(id, &now_timestamp(), &e.to_string(), &log.transcript())
                    {
                        error!("Failed to record failure of cleanup job {}: {}", id, db_err);
                    }
                }
                return Err(e);
            }
        };

        log.info(format!("Cleanup task completed ({})", mode));
        log.info(format!("Total reclaimed: {}", format_bytes(summary.total_reclaimed)));

        let transcript = log.transcript();
        if let Some(id) = job_id {
            if let Err(e) =
                self.db
                    .complete_job(id, &now_timestamp(), summary.total_reclaimed, &transcript)
            {
                error!("Failed to record completion of cleanup job {}: {}", id, e);
            }
        }

        if settings.notify_on_cleanup {
            if let Err(e) = self.notifier.notify_cleanup(&summary) {
                warn!("Failed to send cleanup notification: {}", e);
            }
        }

        Ok(Some(CleanupRun {
            job_id,
            summary,
            transcript,
        }))
    }

    fn sweep(
        &self,
        settings: &CleanupSettings,
        dry_run: bool,
        log: &mut CleanupLog,
    ) -> Result<CleanupSummary, Error> {
        let orphans = cleanup_orphaned_archives(self.db, &self.archive_base, dry_run, log)?;
        let logs = cleanup_old_logs(self.db, settings.log_retention_days, dry_run, log)?;
        let temp = cleanup_temp_files(self.db, &self.archive_base, dry_run, log)?;

        if dry_run {
            match generate_cleanup_report(self.db, &self.archive_base, settings.log_retention_days)
            {
                Ok(report) => report.write_to_log(log),
                Err(e) => log.error(format!("Failed to generate dry-run report: {}", e)),
            }
        }

        Ok(CleanupSummary {
            orphans,
            logs,
            temp,
            total_reclaimed: orphans.reclaimed + temp.reclaimed,
            dry_run,
        })
    }
}
