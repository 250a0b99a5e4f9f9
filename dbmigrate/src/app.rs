//! Load the configuration file and hand it to the migration client.

use crate::cli::Args;
use crate::config::DbConfig;
use crate::error::{CliError, CliResult};

use navi_migrate::{MigrateReport, MigrationVersion, Migrator};

pub const USAGE: &str =
    "Required at least one argument: filename with db configuration (check db.conf.example).";

/// The calls made on the migration library.
#[async_trait::async_trait]
pub trait MigrationClient: Send {
    fn set_baseline_on_migrate(&mut self, baseline_on_migrate: bool);
    fn set_data_source(&mut self, url: Option<&str>, username: Option<&str>, password: Option<&str>);
    fn set_locations(&mut self, locations: &std::path::Path);
    fn set_baseline_version(&mut self, version: MigrationVersion);
    fn set_baseline_description(&mut self, description: &str);
    fn set_table(&mut self, table: &str);
    async fn migrate(&mut self) -> Result<MigrateReport, navi_migrate::Error>;
}

#[async_trait::async_trait]
impl MigrationClient for Migrator {
    fn set_baseline_on_migrate(&mut self, baseline_on_migrate: bool) {
        *self = std::mem::take(self).baseline_on_migrate(baseline_on_migrate);
    }

    fn set_data_source(&mut self, url: Option<&str>, username: Option<&str>, password: Option<&str>) {
        *self = std::mem::take(self).data_source(url.unwrap_or_default(), username, password);
    }

    fn set_locations(&mut self, locations: &std::path::Path) {
        *self = std::mem::take(self).locations(locations);
    }

    fn set_baseline_version(&mut self, version: MigrationVersion) {
        *self = std::mem::take(self).baseline_version(version);
    }

    fn set_baseline_description(&mut self, description: &str) {
        *self = std::mem::take(self).baseline_description(description);
    }

    fn set_table(&mut self, table: &str) {
        *self = std::mem::take(self).table(table);
    }

    async fn migrate(&mut self) -> Result<MigrateReport, navi_migrate::Error> {
        Migrator::migrate(self).await
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// No configuration file was given; the usage line was printed.
    Usage,
    /// The configuration file could not be read; nothing was migrated.
    Unreadable,
    Migrated(MigrateReport),
}

/// Run one invocation.
///
/// An unreadable configuration file is logged and reported as
/// [`Outcome::Unreadable`]; failures from the migration itself are returned.
pub async fn run<C: MigrationClient>(args: &Args, client: &mut C) -> CliResult<Outcome> {
    let Some(path) = &args.config else {
        println!("{USAGE}");
        return Ok(Outcome::Usage);
    };

    let config = match DbConfig::load(path) {
        Ok(config) => config,
        Err(CliError::Io { path, source }) => {
            tracing::error!(
                path = %path.display(),
                error = %source,
                "unable to read database configuration"
            );
            return Ok(Outcome::Unreadable);
        }
        Err(err) => return Err(err),
    };

    client.set_baseline_on_migrate(true);
    client.set_data_source(
        config.url.as_deref(),
        config.username.as_deref(),
        config.password.as_deref(),
    );

    if let Some(locations) = args.locations.as_ref().or(config.locations.as_ref()) {
        client.set_locations(locations);
    }
    if let Some(version) = config.baseline_version {
        client.set_baseline_version(version);
    }
    if let Some(description) = &config.baseline_description {
        client.set_baseline_description(description);
    }
    if let Some(table) = &config.table {
        client.set_table(table);
    }

    let report = client.migrate().await?;
    Ok(Outcome::Migrated(report))
}
