//! The schema history table in the database.

use crate::hash::MigrationHash;
use crate::plan::{Baseline, MigrationStep};
use crate::traits::Apply;
use crate::version::MigrationVersion;
use crate::Error;

use chrono::{DateTime, Utc};

pub const DEFAULT_TABLE: &str = "schema_history";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationKind {
    Sql,
    Baseline,
}

impl MigrationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MigrationKind::Sql => "SQL",
            MigrationKind::Baseline => "BASELINE",
        }
    }
}

impl std::str::FromStr for MigrationKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SQL" => Ok(MigrationKind::Sql),
            "BASELINE" => Ok(MigrationKind::Baseline),
            other => Err(Error::Config(format!(
                "unknown migration type {other:?} in schema history"
            ))),
        }
    }
}

/// One row of the schema history table.
#[derive(Debug, Clone)]
pub struct AppliedMigration {
    pub installed_rank: i32,
    pub version: Option<MigrationVersion>,
    pub description: String,
    pub kind: MigrationKind,
    pub script: String,
    pub checksum: Option<MigrationHash>,
    pub installed_by: String,
    pub installed_on: DateTime<Utc>,
    pub execution_time: i32,
    pub success: bool,
}

impl AppliedMigration {
    fn from_row(row: &tokio_postgres::Row) -> Result<Self, Error> {
        let version: Option<String> = row.try_get("version")?;
        let version = version.map(|v| v.parse::<MigrationVersion>()).transpose()?;
        let kind: String = row.try_get("type")?;

        Ok(AppliedMigration {
            installed_rank: row.try_get("installed_rank")?,
            version,
            description: row.try_get("description")?,
            kind: kind.parse::<MigrationKind>()?,
            script: row.try_get("script")?,
            checksum: row.try_get("checksum")?,
            installed_by: row.try_get("installed_by")?,
            installed_on: row.try_get("installed_on")?,
            execution_time: row.try_get("execution_time")?,
            success: row.try_get("success")?,
        })
    }
}

/// What the planner needs to know about the target schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaState {
    pub name: String,
    /// Whether the schema holds any table besides the history table.
    pub has_tables: bool,
}

/// Quote a SQL identifier.
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// The schema history, read inside the transaction that will apply the plan.
///
/// Dropping the repo without calling [`Apply::commit`] rolls everything back.
pub struct DbRepo<'a> {
    txn: tokio_postgres::Transaction<'a>,
    table: String,
    schema: SchemaState,
    installed_by: String,
    applied: Vec<AppliedMigration>,
    next_rank: i32,
}

impl<'a> DbRepo<'a> {
    /// Open a transaction, make sure the history table exists and lock it.
    pub async fn from_client(
        client: &'a mut tokio_postgres::Client,
        table: &str,
    ) -> Result<DbRepo<'a>, Error> {
        let txn = client.transaction().await?;
        let quoted = quote_ident(table);

        txn.batch_execute(&format!(
            "
CREATE TABLE IF NOT EXISTS {quoted} (
    installed_rank INTEGER PRIMARY KEY,
    version TEXT,
    description TEXT NOT NULL,
    type TEXT NOT NULL,
    script TEXT NOT NULL,
    checksum TEXT,
    installed_by TEXT NOT NULL,
    installed_on TIMESTAMPTZ NOT NULL DEFAULT now(),
    execution_time INTEGER NOT NULL,
    success BOOLEAN NOT NULL
);
LOCK TABLE {quoted} IN ACCESS EXCLUSIVE MODE;
"
        ))
        .await?;

        let row = txn
            .query_one("SELECT current_schema(), current_user::TEXT", &[])
            .await?;
        let schema_name: Option<String> = row.try_get(0)?;
        let installed_by: String = row.try_get(1)?;
        let Some(schema_name) = schema_name else {
            return Err(Error::Config(
                "no current schema; check the search_path of the database user".into(),
            ));
        };

        let row = txn
            .query_one(
                "SELECT EXISTS (
                    SELECT 1 FROM information_schema.tables
                    WHERE table_schema = current_schema()
                        AND table_type = 'BASE TABLE'
                        AND table_name::TEXT <> $1::TEXT
                )",
                &[&table],
            )
            .await?;
        let has_tables: bool = row.try_get(0)?;

        let rows = txn
            .query(
                &format!(
                    "SELECT installed_rank, version, description, type, script, checksum, \
                     installed_by, installed_on, execution_time, success \
                     FROM {quoted} ORDER BY installed_rank"
                ),
                &[],
            )
            .await?;
        let applied = rows
            .iter()
            .map(AppliedMigration::from_row)
            .collect::<Result<Vec<_>, _>>()?;

        let next_rank = applied.iter().map(|m| m.installed_rank).max().unwrap_or(0) + 1;

        tracing::debug!(
            schema = %schema_name,
            table,
            applied = applied.len(),
            has_tables,
            "read schema history"
        );

        Ok(DbRepo {
            txn,
            table: quoted,
            schema: SchemaState {
                name: schema_name,
                has_tables,
            },
            installed_by,
            applied,
            next_rank,
        })
    }

    pub fn applied(&self) -> &[AppliedMigration] {
        &self.applied
    }

    pub fn schema(&self) -> &SchemaState {
        &self.schema
    }

    async fn insert(
        &mut self,
        version: &MigrationVersion,
        description: &str,
        kind: MigrationKind,
        script: &str,
        checksum: Option<&MigrationHash>,
        execution_time: i32,
    ) -> Result<(), Error> {
        let statement = format!(
            "INSERT INTO {} (installed_rank, version, description, type, script, checksum, \
             installed_by, execution_time, success) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, TRUE)",
            self.table
        );

        self.txn
            .execute(
                &statement,
                &[
                    &self.next_rank,
                    &version.to_string(),
                    &description,
                    &kind.as_str(),
                    &script,
                    &checksum,
                    &self.installed_by,
                    &execution_time,
                ],
            )
            .await?;

        self.next_rank += 1;
        Ok(())
    }
}

#[async_trait::async_trait]
impl<'a> Apply for DbRepo<'a> {
    type Error = Error;

    async fn apply_baseline(&mut self, baseline: &Baseline) -> Result<(), Error> {
        tracing::info!(
            schema = %self.schema.name,
            version = %baseline.version,
            "baselining existing schema"
        );

        let description = baseline.description.clone();
        self.insert(
            &baseline.version,
            &description,
            MigrationKind::Baseline,
            &description,
            None,
            0,
        )
        .await
    }

    async fn apply_migration(&mut self, step: &MigrationStep) -> Result<(), Error> {
        tracing::info!(
            schema = %self.schema.name,
            version = %step.version,
            description = %step.description,
            "migrating"
        );

        let started = std::time::Instant::now();
        self.txn
            .batch_execute(&step.text)
            .await
            .map_err(|source| Error::Apply {
                version: step.version.clone(),
                script: step.script.clone(),
                source,
            })?;
        let execution_time = i32::try_from(started.elapsed().as_millis()).unwrap_or(i32::MAX);

        self.insert(
            &step.version,
            &step.description,
            MigrationKind::Sql,
            &step.script,
            Some(&step.hash),
            execution_time,
        )
        .await
    }

    async fn commit(self) -> Result<(), Error> {
        self.txn.commit().await?;
        Ok(())
    }
}

impl<'a> std::fmt::Debug for DbRepo<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "DbRepo({})", self.table)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn quotes_identifiers() {
        assert_eq!(quote_ident("schema_history"), "\"schema_history\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn migration_kind_round_trips_through_text() {
        for kind in [MigrationKind::Sql, MigrationKind::Baseline] {
            assert_eq!(kind.as_str().parse::<MigrationKind>().unwrap(), kind);
        }
        assert!("UNDO_SQL".parse::<MigrationKind>().is_err());
    }
}
