use rusqlite::{Connection, Result};
use tracing::{debug, info, warn};

/// Version stamped into `PRAGMA user_version` once `schema.sql` has been applied.
pub const SCHEMA_VERSION: i64 = 1;

/// The ledger shared with the archive producer: registry, jobs, stack metrics and settings.
pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &str) -> Result<Self> {
        debug!("Opening ledger at {}", path);
        Self::from_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        // WAL so the producer can keep writing while a sweep reads.
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = 5000;",
        )?;
        let db = Database { conn };
        db.ensure_schema()?;
        Ok(db)
    }

    /// Creates missing tables on a ledger older than [`SCHEMA_VERSION`].
    /// Existing tables are never altered or dropped, and a newer ledger is left as is.
    fn ensure_schema(&self) -> Result<()> {
        let version: i64 = self
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))?;

        if version > SCHEMA_VERSION {
            warn!(
                "Ledger schema version {} is newer than {}, not touching it",
                version, SCHEMA_VERSION
            );
            return Ok(());
        }
        if version == SCHEMA_VERSION {
            return Ok(());
        }

        info!("Upgrading ledger schema from version {} to {}", version, SCHEMA_VERSION);
        self.conn.execute_batch(include_str!("schema.sql"))?;
        self.conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
        Ok(())
    }

    /// Raw connection for statements not covered by the query methods.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}
