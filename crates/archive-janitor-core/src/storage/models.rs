use std::fmt;
use std::str::FromStr;

/// A logical backup target. Its name matches a top-level directory under the archive root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveRecord {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Running,
    Success,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Running => "running",
            JobStatus::Success => "success",
            JobStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "running" => Ok(JobStatus::Running),
            "success" => Ok(JobStatus::Success),
            "failed" => Ok(JobStatus::Failed),
            other => Err(format!("unknown job status '{}'", other)),
        }
    }
}

/// One row of the job ledger.
#[derive(Debug, Clone)]
pub struct JobRecord {
    pub id: i64,
    pub archive_id: Option<i64>,
    pub job_type: String,
    pub status: JobStatus,
    pub start_time: String,
    pub end_time: Option<String>,
    pub triggered_by: String,
    pub is_dry_run: bool,
    pub log: String,
    pub reclaimed_size_bytes: Option<i64>,
    pub error_message: Option<String>,
}

/// Lifecycle of one produced archive file. `deleted_at == None` means believed live.
#[derive(Debug, Clone)]
pub struct StackMetricRecord {
    pub id: i64,
    pub job_id: Option<i64>,
    pub stack_name: String,
    pub archive_path: Option<String>,
    pub deleted_at: Option<String>,
    pub deleted_by: Option<String>,
}

impl StackMetricRecord {
    pub fn is_live(&self) -> bool {
        self.deleted_at.is_none()
    }
}

/// Most recent ledger context for a directory, used for display only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackReference {
    pub archive_name: Option<String>,
    pub stack_name: Option<String>,
}
