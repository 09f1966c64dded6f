use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "archive-janitor")]
#[command(
    about = "Reclaims storage from orphaned stack archives, stale job logs and temp leftovers",
    long_about = "Without --run-cleanup, prints a non-destructive report of what cleanup would remove."
)]
pub struct Cli {
    /// Path to archive base (overrides configuration)
    #[arg(long)]
    pub archive_base: Option<String>,

    /// Path to the SQLite database (overrides configuration)
    #[arg(long)]
    pub database: Option<String>,

    /// Output the report as JSON
    #[arg(long)]
    pub json: bool,

    /// Run cleanup now instead of printing a report. Runs live unless --dry-run
    /// is given; the cleanup_dry_run setting is not consulted.
    #[arg(long)]
    pub run_cleanup: bool,

    /// Simulate --run-cleanup without deleting anything
    #[arg(long, requires = "run_cleanup")]
    pub dry_run: bool,
}

impl Cli {
    /// Mode forced on the engine for `--run-cleanup`.
    pub fn dry_run_override(&self) -> Option<bool> {
        self.run_cleanup.then_some(self.dry_run)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_report_mode() {
        let cli = Cli::parse_from(["archive-janitor"]);
        assert!(!cli.run_cleanup);
        assert_eq!(cli.dry_run_override(), None);
    }

    #[test]
    fn test_run_cleanup_forces_mode() {
        let cli = Cli::parse_from(["archive-janitor", "--run-cleanup", "--dry-run"]);
        assert_eq!(cli.dry_run_override(), Some(true));

        let cli = Cli::parse_from(["archive-janitor", "--run-cleanup"]);
        assert_eq!(cli.dry_run_override(), Some(false));
    }

    #[test]
    fn test_dry_run_requires_run_cleanup() {
        let result = Cli::try_parse_from(["archive-janitor", "--dry-run"]);
        assert!(result.is_err());
    }
}
