//! CLI error types and result alias.

use crate::properties::PropertiesError;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// The configuration file could not be opened or read.
    #[error("unable to read {}: {source}", path.display())]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid properties file {}: {source}", path.display())]
    Properties {
        path: std::path::PathBuf,
        #[source]
        source: PropertiesError,
    },

    #[error("invalid value for {key}: {detail}")]
    Config { key: String, detail: String },

    #[error("migration failed: {0}")]
    Migrate(#[from] navi_migrate::Error),
}

impl CliError {
    pub(crate) fn io<P: AsRef<std::path::Path>>(path: P, source: std::io::Error) -> Self {
        CliError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}
