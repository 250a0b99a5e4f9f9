//! The migration client.

use crate::datasource::DataSource;
use crate::db::{DbRepo, DEFAULT_TABLE};
use crate::plan::{Baseline, Plan};
use crate::source::{LocalMigration, SourceRepo};
use crate::traits::Apply;
use crate::version::MigrationVersion;
use crate::Error;

pub const DEFAULT_LOCATION: &str = "db/migration";

/// What a call to [`Migrator::migrate`] did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrateReport {
    /// Set when an existing schema was baselined at this version.
    pub baselined: Option<MigrationVersion>,
    /// Versions applied, in order.
    pub applied: Vec<MigrationVersion>,
    /// The schema version after the run.
    pub current: Option<MigrationVersion>,
}

impl MigrateReport {
    fn from_plan(plan: &Plan) -> Self {
        MigrateReport {
            baselined: plan.baseline.as_ref().map(|b| b.version.clone()),
            applied: plan.migrations.iter().map(|m| m.version.clone()).collect(),
            current: plan.target(),
        }
    }
}

/// Configures and runs migrations against one database.
#[derive(Debug, Clone)]
pub struct Migrator {
    data_source: Option<DataSource>,
    locations: std::path::PathBuf,
    baseline_on_migrate: bool,
    baseline: Baseline,
    table: String,
}

impl Default for Migrator {
    fn default() -> Self {
        Migrator {
            data_source: None,
            locations: DEFAULT_LOCATION.into(),
            baseline_on_migrate: false,
            baseline: Baseline::default(),
            table: DEFAULT_TABLE.into(),
        }
    }
}

impl Migrator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Baseline a non-empty schema that has no history instead of failing.
    pub fn baseline_on_migrate(mut self, baseline_on_migrate: bool) -> Self {
        self.baseline_on_migrate = baseline_on_migrate;
        self
    }

    pub fn data_source<U, P>(mut self, url: &str, user: Option<U>, password: Option<P>) -> Self
    where
        U: Into<String>,
        P: Into<String>,
    {
        self.data_source = Some(DataSource::new(
            url,
            user.map(Into::into),
            password.map(Into::into),
        ));
        self
    }

    pub fn locations<P: AsRef<std::path::Path>>(mut self, dir: P) -> Self {
        self.locations = dir.as_ref().to_path_buf();
        self
    }

    pub fn baseline_version(mut self, version: MigrationVersion) -> Self {
        self.baseline.version = version;
        self
    }

    pub fn baseline_description<S: Into<String>>(mut self, description: S) -> Self {
        self.baseline.description = description.into();
        self
    }

    pub fn table<S: Into<String>>(mut self, table: S) -> Self {
        self.table = table.into();
        self
    }

    pub fn get_data_source(&self) -> Option<&DataSource> {
        self.data_source.as_ref()
    }

    pub fn get_locations(&self) -> &std::path::Path {
        &self.locations
    }

    pub fn is_baseline_on_migrate(&self) -> bool {
        self.baseline_on_migrate
    }

    pub fn get_baseline(&self) -> &Baseline {
        &self.baseline
    }

    pub fn get_table(&self) -> &str {
        &self.table
    }

    /// Connect to the configured data source and migrate it.
    pub async fn migrate(&self) -> Result<MigrateReport, Error> {
        let data_source = self
            .data_source
            .as_ref()
            .ok_or_else(|| Error::Config("no data source configured".into()))?;
        let config = data_source.config()?;
        let local = self.resolve()?;

        let (mut client, connection) = config.connect(tokio_postgres::NoTls).await?;

        tokio::spawn(async move {
            if let Err(err) = connection.await {
                tracing::error!(error = %err, "connection error");
            }
        });

        self.migrate_resolved(&mut client, &local).await
    }

    /// Migrate through an already connected client.
    pub async fn migrate_client(
        &self,
        client: &mut tokio_postgres::Client,
    ) -> Result<MigrateReport, Error> {
        let local = self.resolve()?;
        self.migrate_resolved(client, &local).await
    }

    fn resolve(&self) -> Result<Vec<LocalMigration>, Error> {
        let local = SourceRepo::new(&self.locations)?.migrations()?;
        tracing::info!(
            count = local.len(),
            location = %self.locations.display(),
            "resolved migrations"
        );
        Ok(local)
    }

    async fn migrate_resolved(
        &self,
        client: &mut tokio_postgres::Client,
        local: &[LocalMigration],
    ) -> Result<MigrateReport, Error> {
        let repo = DbRepo::from_client(client, &self.table).await?;

        let baseline = self.baseline_on_migrate.then_some(&self.baseline);
        let plan = Plan::new(repo.applied(), local, repo.schema(), baseline)?;
        let report = MigrateReport::from_plan(&plan);
        let schema = repo.schema().name.clone();

        if plan.is_empty() {
            repo.commit().await?;
            match &report.current {
                Some(current) => {
                    tracing::info!(%schema, version = %current, "schema is up to date")
                }
                None => tracing::info!(%schema, "no migrations to apply"),
            }
            return Ok(report);
        }

        repo.apply(&plan).await?;

        tracing::info!(
            %schema,
            applied = report.applied.len(),
            version = ?report.current,
            "successfully applied migrations"
        );

        Ok(report)
    }
}
