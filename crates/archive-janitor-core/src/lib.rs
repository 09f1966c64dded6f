pub mod cleanup;
pub mod config;
pub mod error;
pub mod notify;
pub mod settings;
pub mod storage;
pub mod utils;

pub use cleanup::{CleanupEngine, CleanupLog, CleanupReport, CleanupRun};
pub use config::AppConfig;
pub use error::Error;
pub use notify::{CleanupSummary, Notifier, SilentNotifier, TracingNotifier};
pub use settings::{CleanupSettings, SettingsProvider};
