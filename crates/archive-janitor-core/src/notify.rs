use crate::cleanup::{LogStats, OrphanStats, TempStats};
use crate::error::Error;
use crate::utils::format_bytes;
use serde::Serialize;
use tracing::info;

/// Aggregated statistics of one completed cleanup run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CleanupSummary {
    pub orphans: OrphanStats,
    pub logs: LogStats,
    pub temp: TempStats,
    pub total_reclaimed: u64,
    pub dry_run: bool,
}

impl CleanupSummary {
    pub fn title(&self) -> String {
        if self.dry_run {
            "DRY RUN Cleanup Task Completed".to_string()
        } else {
            "Cleanup Task Completed".to_string()
        }
    }

    pub fn render_text(&self) -> String {
        let mut body = format!(
            "{}\n\n\
             Orphaned Archives: {} removed ({})\n\
             Old Logs: {} deleted\n\
             Temp Files: {} removed ({})\n\
             Total Reclaimed: {}\n",
            self.title(),
            self.orphans.count,
            format_bytes(self.orphans.reclaimed),
            self.logs.count,
            self.temp.count,
            format_bytes(self.temp.reclaimed),
            format_bytes(self.total_reclaimed),
        );
        if self.dry_run {
            body.push_str("\nThis was a dry run - no files were actually deleted.\n");
        }
        body
    }
}

/// Delivery of completed-run summaries. Channel formatting lives with the implementor.
pub trait Notifier: Send + Sync {
    fn notify_cleanup(&self, _summary: &CleanupSummary) -> Result<(), Error> {
        Ok(())
    }
}

/// No-op notifier.
pub struct SilentNotifier;

impl Notifier for SilentNotifier {}

/// Emits the rendered summary as a log event.
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify_cleanup(&self, summary: &CleanupSummary) -> Result<(), Error> {
        info!(
            orphans = summary.orphans.count,
            old_logs = summary.logs.count,
            temp = summary.temp.count,
            total_reclaimed = summary.total_reclaimed,
            dry_run = summary.dry_run,
            "{}",
            summary.render_text()
        );
        Ok(())
    }
}
