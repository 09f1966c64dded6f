use super::models::*;
use super::sqlite::Database;
use crate::utils::now_timestamp;
use rusqlite::{params, OptionalExtension, Result, Row};
use std::collections::HashSet;
use tracing::debug;

pub const CLEANUP_JOB_TYPE: &str = "cleanup";

/// Matches `archive_path` equal to `?1` or nested under `?1/`. `substr` keeps the
/// comparison case-sensitive and treats `%` and `_` in directory names literally.
const UNDER_DIRECTORY: &str = "(archive_path = ?1 \
     OR substr(archive_path, 1, length(?1) + 1) = ?1 || '/')";

const JOB_COLUMNS: &str = "id, archive_id, job_type, status, start_time, end_time, \
     triggered_by, is_dry_run, log, reclaimed_size_bytes, error_message";

fn job_from_row(row: &Row<'_>) -> Result<JobRecord> {
    let status: String = row.get(3)?;
    Ok(JobRecord {
        id: row.get(0)?,
        archive_id: row.get(1)?,
        job_type: row.get(2)?,
        status: status.parse::<JobStatus>().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                3,
                rusqlite::types::Type::Text,
                e.into(),
            )
        })?,
        start_time: row.get(4)?,
        end_time: row.get(5)?,
        triggered_by: row.get(6)?,
        is_dry_run: row.get(7)?,
        log: row.get(8)?,
        reclaimed_size_bytes: row.get(9)?,
        error_message: row.get(10)?,
    })
}

impl Database {
    // ── Archive Registry ─────────────────────────────────────────

    pub fn create_archive(&self, name: &str) -> Result<i64> {
        self.connection()
            .execute("INSERT INTO archives (name) VALUES (?1)", params![name])?;
        Ok(self.connection().last_insert_rowid())
    }

    pub fn list_archives(&self) -> Result<Vec<ArchiveRecord>> {
        let mut stmt = self
            .connection()
            .prepare("SELECT id, name FROM archives ORDER BY name")?;
        let archives = stmt
            .query_map([], |row| {
                Ok(ArchiveRecord {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>>>()?;
        Ok(archives)
    }

    /// Snapshot of every registered archive name.
    pub fn list_archive_names(&self) -> Result<HashSet<String>> {
        Ok(self.list_archives()?.into_iter().map(|a| a.name).collect())
    }

    // ── Job Ledger ───────────────────────────────────────────────

    pub fn record_job_start(
        &self,
        archive_id: Option<i64>,
        job_type: &str,
        start_time: &str,
        triggered_by: &str,
        is_dry_run: bool,
    ) -> Result<i64> {
        self.connection().execute(
            "INSERT INTO jobs (archive_id, job_type, status, start_time, triggered_by, is_dry_run, log) \
             VALUES (?1, ?2, 'running', ?3, ?4, ?5, '')",
            params![archive_id, job_type, start_time, triggered_by, is_dry_run],
        )?;
        Ok(self.connection().last_insert_rowid())
    }

    pub fn create_cleanup_job(
        &self,
        start_time: &str,
        triggered_by: &str,
        is_dry_run: bool,
    ) -> Result<i64> {
        let id = self.record_job_start(None, CLEANUP_JOB_TYPE, start_time, triggered_by, is_dry_run)?;
        debug!("Created cleanup job {}", id);
        Ok(id)
    }

    pub fn complete_job(
        &self,
        job_id: i64,
        end_time: &str,
        reclaimed_size_bytes: u64,
        log: &str,
    ) -> Result<()> {
        self.connection().execute(
            "UPDATE jobs SET status = 'success', end_time = ?1, \
             reclaimed_size_bytes = ?2, log = ?3 WHERE id = ?4",
            params![end_time, reclaimed_size_bytes as i64, log, job_id],
        )?;
        Ok(())
    }

    pub fn fail_job(&self, job_id: i64, end_time: &str, error_message: &str, log: &str) -> Result<()> {
        self.connection().execute(
            "UPDATE jobs SET status = 'failed', end_time = ?1, \
             error_message = ?2, log = ?3 WHERE id = ?4",
            params![end_time, error_message, log, job_id],
        )?;
        Ok(())
    }

    pub fn get_job(&self, job_id: i64) -> Result<Option<JobRecord>> {
        self.connection()
            .query_row(
                &format!("SELECT {} FROM jobs WHERE id = ?1", JOB_COLUMNS),
                params![job_id],
                job_from_row,
            )
            .optional()
    }

    pub fn count_jobs(&self) -> Result<i64> {
        self.connection()
            .query_row("SELECT COUNT(*) FROM jobs", [], |row| row.get(0))
    }

    pub fn count_jobs_started_before(&self, cutoff: &str) -> Result<u64> {
        let count: i64 = self.connection().query_row(
            "SELECT COUNT(*) FROM jobs WHERE start_time < ?1",
            params![cutoff],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    pub fn delete_jobs_started_before(&self, cutoff: &str) -> Result<usize> {
        let deleted = self
            .connection()
            .execute("DELETE FROM jobs WHERE start_time < ?1", params![cutoff])?;
        debug!("Deleted {} job(s) started before {}", deleted, cutoff);
        Ok(deleted)
    }

    // ── Stack Metrics ────────────────────────────────────────────

    pub fn insert_stack_metric(
        &self,
        job_id: Option<i64>,
        stack_name: &str,
        archive_path: &str,
    ) -> Result<i64> {
        self.connection().execute(
            "INSERT INTO job_stack_metrics (job_id, stack_name, archive_path) VALUES (?1, ?2, ?3)",
            params![job_id, stack_name, archive_path],
        )?;
        Ok(self.connection().last_insert_rowid())
    }

    pub fn list_stack_metrics_under(&self, directory: &str) -> Result<Vec<StackMetricRecord>> {
        let mut stmt = self.connection().prepare(&format!(
            "SELECT id, job_id, stack_name, archive_path, deleted_at, deleted_by \
             FROM job_stack_metrics WHERE {} ORDER BY id",
            UNDER_DIRECTORY
        ))?;
        let metrics = stmt
            .query_map(params![directory], |row| {
                Ok(StackMetricRecord {
                    id: row.get(0)?,
                    job_id: row.get(1)?,
                    stack_name: row.get(2)?,
                    archive_path: row.get(3)?,
                    deleted_at: row.get(4)?,
                    deleted_by: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>>>()?;
        Ok(metrics)
    }

    /// Soft-delete every live metric under `directory`. Rows are never removed.
    pub fn soft_delete_metrics_under(&self, directory: &str, deleted_by: &str) -> Result<usize> {
        let updated = self.connection().execute(
            &format!(
                "UPDATE job_stack_metrics SET deleted_at = ?2, deleted_by = ?3 \
                 WHERE {} AND deleted_at IS NULL",
                UNDER_DIRECTORY
            ),
            params![directory, now_timestamp(), deleted_by],
        )?;
        Ok(updated)
    }

    /// Whether any live metric points under `directory`.
    pub fn has_active_reference(&self, directory: &str) -> Result<bool> {
        let found: Option<i64> = self
            .connection()
            .query_row(
                &format!(
                    "SELECT 1 FROM job_stack_metrics WHERE {} AND deleted_at IS NULL LIMIT 1",
                    UNDER_DIRECTORY
                ),
                params![directory],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// Exact path match, or any metric whose path ends in `/<file_name>`.
    /// The basename match can hit a same-named file in another directory.
    pub fn file_is_referenced(&self, path: &str, file_name: &str) -> Result<bool> {
        let suffix = format!("/{}", file_name);
        let found: Option<i64> = self
            .connection()
            .query_row(
                "SELECT 1 FROM job_stack_metrics \
                 WHERE archive_path = ?1 \
                    OR (length(archive_path) >= length(?2) \
                        AND substr(archive_path, length(archive_path) - length(?2) + 1) = ?2) \
                 LIMIT 1",
                params![path, suffix],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// Newest metric under `directory`, live or not, joined to its job's archive.
    pub fn latest_reference(&self, directory: &str) -> Result<Option<StackReference>> {
        self.connection()
            .query_row(
                &format!(
                    "SELECT a.name, m.stack_name \
                     FROM job_stack_metrics m \
                     LEFT JOIN jobs j ON m.job_id = j.id \
                     LEFT JOIN archives a ON j.archive_id = a.id \
                     WHERE {} \
                     ORDER BY j.start_time DESC NULLS LAST, m.id DESC LIMIT 1",
                    UNDER_DIRECTORY.replace("archive_path", "m.archive_path")
                ),
                params![directory],
                |row| {
                    Ok(StackReference {
                        archive_name: row.get(0)?,
                        stack_name: row.get(1)?,
                    })
                },
            )
            .optional()
    }

    // ── Settings ─────────────────────────────────────────────────

    pub fn get_setting(&self, key: &str) -> Result<Option<String>> {
        self.connection()
            .query_row(
                "SELECT value FROM settings WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
    }

    pub fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        self.connection().execute(
            "INSERT INTO settings (key, value) VALUES (?1, ?2) \
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }
}
