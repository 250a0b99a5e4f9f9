//! The database configuration file.

use crate::error::{CliError, CliResult};
use crate::properties::{Properties, PropertiesError};

use navi_migrate::MigrationVersion;

pub const URL: &str = "db.url";
pub const USERNAME: &str = "db.username";
pub const PASSWORD: &str = "db.password";
pub const LOCATIONS: &str = "db.locations";
pub const BASELINE_VERSION: &str = "db.baselineVersion";
pub const BASELINE_DESCRIPTION: &str = "db.baselineDescription";
pub const TABLE: &str = "db.table";

/// Settings read from the properties file.
///
/// Values are kept exactly as the file spells them; a key missing from the
/// file is `None`.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct DbConfig {
    pub url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub locations: Option<std::path::PathBuf>,
    pub baseline_version: Option<MigrationVersion>,
    pub baseline_description: Option<String>,
    pub table: Option<String>,
}

impl std::fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("DbConfig")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("locations", &self.locations)
            .field("baseline_version", &self.baseline_version)
            .field("baseline_description", &self.baseline_description)
            .field("table", &self.table)
            .finish()
    }
}

impl DbConfig {
    /// Open and parse the properties file at `path`.
    pub fn load<P: AsRef<std::path::Path>>(path: P) -> CliResult<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|source| CliError::io(path, source))?;
        let properties = Properties::load(std::io::BufReader::new(file)).map_err(|err| match err {
            PropertiesError::Io(source) => CliError::io(path, source),
            other => CliError::Properties {
                path: path.to_path_buf(),
                source: other,
            },
        })?;

        tracing::debug!(path = %path.display(), keys = properties.len(), "loaded database configuration");

        Self::from_properties(&properties)
    }

    pub fn from_properties(properties: &Properties) -> CliResult<Self> {
        let get = |key: &str| properties.get_property(key).map(str::to_string);

        let baseline_version = properties
            .get_property(BASELINE_VERSION)
            .map(|version| {
                version.trim().parse::<MigrationVersion>().map_err(|err| CliError::Config {
                    key: BASELINE_VERSION.into(),
                    detail: err.to_string(),
                })
            })
            .transpose()?;

        Ok(DbConfig {
            url: get(URL),
            username: get(USERNAME),
            password: get(PASSWORD),
            locations: get(LOCATIONS).map(Into::into),
            baseline_version,
            baseline_description: get(BASELINE_DESCRIPTION),
            table: get(TABLE),
        })
    }
}
