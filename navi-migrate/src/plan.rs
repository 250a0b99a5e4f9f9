//! Deciding what to run, given the schema history and the local migrations.

use crate::db::{AppliedMigration, MigrationKind, SchemaState};
use crate::hash::MigrationHash;
use crate::source::LocalMigration;
use crate::version::MigrationVersion;
use crate::Error;

pub const DEFAULT_BASELINE_DESCRIPTION: &str = "<< Baseline >>";

/// Where to baseline an existing schema that has no history yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Baseline {
    pub version: MigrationVersion,
    pub description: String,
}

impl Default for Baseline {
    fn default() -> Self {
        Baseline {
            version: MigrationVersion::default(),
            description: DEFAULT_BASELINE_DESCRIPTION.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MigrationStep {
    pub version: MigrationVersion,
    pub description: String,
    pub script: String,
    pub text: String,
    pub hash: MigrationHash,
}

impl From<&LocalMigration> for MigrationStep {
    fn from(local: &LocalMigration) -> Self {
        MigrationStep {
            version: local.version.clone(),
            description: local.description.clone(),
            script: local.script.clone(),
            text: local.text.clone(),
            hash: local.hash(),
        }
    }
}

#[derive(Debug)]
pub struct Plan {
    /// The version the schema is at before any step runs.
    pub current: Option<MigrationVersion>,
    pub baseline: Option<Baseline>,
    pub migrations: Vec<MigrationStep>,
}

impl Plan {
    /// Validate the history against the local migrations and collect the pending ones.
    ///
    /// `baseline` is `None` when baseline-on-migrate is off.
    pub fn new(
        applied: &[AppliedMigration],
        local: &[LocalMigration],
        schema: &SchemaState,
        baseline: Option<&Baseline>,
    ) -> Result<Self, Error> {
        if let Some(failed) = applied.iter().find(|m| !m.success) {
            return Err(Error::FailedMigration {
                version: failed
                    .version
                    .as_ref()
                    .map(ToString::to_string)
                    .unwrap_or_else(|| failed.script.clone()),
            });
        }

        let mut new_baseline = None;
        let (current, baseline_version) = if applied.is_empty() {
            if schema.has_tables {
                match baseline {
                    Some(baseline) => {
                        new_baseline = Some(baseline.clone());
                        (Some(baseline.version.clone()), Some(baseline.version.clone()))
                    }
                    None => {
                        return Err(Error::NonEmptySchema {
                            schema: schema.name.clone(),
                        })
                    }
                }
            } else {
                (None, None)
            }
        } else {
            let current = applied.iter().filter_map(|m| m.version.clone()).max();
            let baseline_version = applied
                .iter()
                .filter(|m| m.kind == MigrationKind::Baseline)
                .filter_map(|m| m.version.clone())
                .max();
            (current, baseline_version)
        };

        let latest_local = local.iter().map(|l| &l.version).max();

        for row in applied.iter().filter(|m| m.kind == MigrationKind::Sql) {
            let Some(version) = &row.version else {
                continue;
            };
            if latest_local.map_or(true, |latest| version > latest) {
                tracing::warn!(
                    version = %version,
                    script = %row.script,
                    "schema has a migration newer than any local one; ignoring it"
                );
                continue;
            }
            let Some(resolved) = local.iter().find(|l| &l.version == version) else {
                return Err(Error::MissingLocally {
                    version: version.clone(),
                    script: row.script.clone(),
                });
            };
            let resolved_hash = resolved.hash();
            if let Some(checksum) = &row.checksum {
                if *checksum != resolved_hash {
                    return Err(Error::ChecksumMismatch {
                        version: version.clone(),
                        applied: checksum.to_string(),
                        resolved: resolved_hash.to_string(),
                    });
                }
            }
        }

        let mut migrations = vec![];
        for migration in local {
            let already_applied = applied
                .iter()
                .any(|m| m.kind == MigrationKind::Sql && m.version.as_ref() == Some(&migration.version));
            if already_applied {
                continue;
            }

            if let Some(baseline_version) = &baseline_version {
                if migration.version <= *baseline_version {
                    tracing::debug!(
                        version = %migration.version,
                        "skipping migration covered by the baseline"
                    );
                    continue;
                }
            }

            if let Some(current) = &current {
                if migration.version < *current {
                    return Err(Error::OutOfOrder {
                        version: migration.version.clone(),
                        script: migration.script.clone(),
                        current: current.clone(),
                    });
                }
            }

            migrations.push(MigrationStep::from(migration));
        }

        Ok(Plan {
            current,
            baseline: new_baseline,
            migrations,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.baseline.is_none() && self.migrations.is_empty()
    }

    /// The version the schema will be at once the plan is applied.
    pub fn target(&self) -> Option<MigrationVersion> {
        self.migrations
            .last()
            .map(|step| step.version.clone())
            .or_else(|| self.current.clone())
    }
}
