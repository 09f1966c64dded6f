use super::CleanupLog;
use crate::error::Error;
use crate::storage::Database;
use crate::utils::timestamp;
use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LogStats {
    pub count: u64,
}

/// Jobs started strictly before this instant fall outside the retention window.
pub fn retention_cutoff(now: DateTime<Utc>, retention_days: i64) -> DateTime<Utc> {
    TimeDelta::try_days(retention_days)
        .and_then(|window| now.checked_sub_signed(window))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Purge job history older than `retention_days`. `retention_days <= 0` disables purging.
pub fn cleanup_old_logs(
    db: &Database,
    retention_days: i64,
    dry_run: bool,
    log: &mut CleanupLog,
) -> Result<LogStats, Error> {
    if retention_days <= 0 {
        log.info("Log retention disabled (retention_days <= 0)");
        return Ok(LogStats::default());
    }

    log.info(format!("Checking for logs older than {} days...", retention_days));

    let cutoff = timestamp(retention_cutoff(Utc::now(), retention_days));
    let count = db.count_jobs_started_before(&cutoff)?;

    if count == 0 {
        log.info("No old logs to delete");
        return Ok(LogStats::default());
    }

    if dry_run {
        log.info(format!("Would delete {} old job record(s)", count));
    } else {
        db.delete_jobs_started_before(&cutoff)?;
        log.info(format!("Deleted {} old job record(s)", count));
    }

    Ok(LogStats { count })
}
