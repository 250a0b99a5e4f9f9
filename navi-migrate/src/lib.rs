//! Versioned, forward-only schema migrations for PostgreSQL.
//!
//! Point a [`Migrator`] at a database and a directory of `V<version>__<description>.sql`
//! scripts, and [`Migrator::migrate`] brings the schema up to date in a single
//! transaction, recording each script in a history table.
//!
//! ```no_run
//! # async fn run() -> Result<(), navi_migrate::Error> {
//! let report = navi_migrate::Migrator::new()
//!     .baseline_on_migrate(true)
//!     .data_source("jdbc:postgresql://localhost:5432/blog", Some("blog"), Some("secret"))
//!     .locations("db/migration")
//!     .migrate()
//!     .await?;
//! println!("schema now at {:?}", report.current);
//! # Ok(())
//! # }
//! ```

pub mod datasource;
pub mod db;
pub mod hash;
pub mod migrator;
pub mod plan;
pub mod source;
pub mod traits;
pub mod version;

pub use migrator::{MigrateReport, Migrator};
pub use version::MigrationVersion;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("i/o error on {}: {source}", path.display())]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid hash: {0}")]
    InvalidHash(String),

    #[error("invalid version {version:?}: {detail}")]
    InvalidVersion { version: String, detail: String },

    #[error("found more than one migration with version {version}: {first} and {second}")]
    DuplicateVersion {
        version: MigrationVersion,
        first: String,
        second: String,
    },

    #[error("db error: {0}")]
    Db(#[from] tokio_postgres::Error),

    #[error(
        "found non-empty schema {schema:?} without schema history table; \
         enable baseline-on-migrate to baseline it"
    )]
    NonEmptySchema { schema: String },

    #[error("checksum mismatch for migration {version}: applied {applied}, resolved locally {resolved}")]
    ChecksumMismatch {
        version: MigrationVersion,
        applied: String,
        resolved: String,
    },

    #[error("detected applied migration {version} ({script}) not resolved locally")]
    MissingLocally {
        version: MigrationVersion,
        script: String,
    },

    #[error("detected resolved migration {version} ({script}) not applied, but schema is already at {current}")]
    OutOfOrder {
        version: MigrationVersion,
        script: String,
        current: MigrationVersion,
    },

    #[error("schema history contains failed migration {version}; fix the database before migrating")]
    FailedMigration { version: String },

    #[error("migration {version} ({script}) failed: {source}")]
    Apply {
        version: MigrationVersion,
        script: String,
        #[source]
        source: tokio_postgres::Error,
    },
}

impl Error {
    fn io<P: AsRef<std::path::Path>>(path: P, source: std::io::Error) -> Self {
        Error::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    fn invalid_hash(detail: &str) -> Self {
        Error::InvalidHash(detail.into())
    }

    fn invalid_version(version: &str, detail: &str) -> Self {
        Error::InvalidVersion {
            version: version.into(),
            detail: detail.into(),
        }
    }
}
