use config::{Config, ConfigError, Environment, File as ConfigFile};
use serde::Deserialize;

pub const DEFAULT_ARCHIVE_BASE: &str = "/archives";
pub const DEFAULT_DATABASE_PATH: &str = "archiver.db";

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Directory holding one sub-directory per archive.
    pub archive_base: String,
    /// SQLite file holding the archive registry and job ledger.
    pub database_path: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            archive_base: DEFAULT_ARCHIVE_BASE.to_string(),
            database_path: DEFAULT_DATABASE_PATH.to_string(),
        }
    }
}

/// Defaults, then `Config.toml` if present, then `ARCHIVER_*` environment variables.
pub fn load_configuration() -> Result<AppConfig, ConfigError> {
    let builder = Config::builder()
        .set_default("archive_base", DEFAULT_ARCHIVE_BASE)?
        .set_default("database_path", DEFAULT_DATABASE_PATH)?
        .add_source(ConfigFile::with_name("Config").required(false))
        .add_source(Environment::with_prefix("ARCHIVER"))
        .build()?;
    builder.try_deserialize::<AppConfig>()
}
