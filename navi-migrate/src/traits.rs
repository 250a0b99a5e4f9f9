use crate::plan::{Baseline, MigrationStep, Plan};

#[async_trait::async_trait]
pub trait Apply: Sized + Send {
    type Error;

    async fn apply_baseline(&mut self, baseline: &Baseline) -> Result<(), Self::Error>;
    async fn apply_migration(&mut self, step: &MigrationStep) -> Result<(), Self::Error>;
    async fn commit(self) -> Result<(), Self::Error>;

    /// Apply the given plan: baseline first, then each migration in order, then commit.
    async fn apply(mut self, plan: &Plan) -> Result<(), Self::Error> {
        if let Some(baseline) = &plan.baseline {
            self.apply_baseline(baseline).await?;
        }

        for migration in &plan.migrations {
            self.apply_migration(migration).await?;
        }

        self.commit().await?;

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::db::SchemaState;
    use crate::source::LocalMigration;

    #[derive(Default)]
    struct Recorder {
        log: Vec<String>,
        fail_on: Option<String>,
        committed: std::sync::Arc<std::sync::Mutex<Option<Vec<String>>>>,
    }

    #[async_trait::async_trait]
    impl Apply for Recorder {
        type Error = String;

        async fn apply_baseline(&mut self, baseline: &Baseline) -> Result<(), String> {
            self.log.push(format!("baseline {}", baseline.version));
            Ok(())
        }

        async fn apply_migration(&mut self, step: &MigrationStep) -> Result<(), String> {
            if self.fail_on.as_deref() == Some(step.script.as_str()) {
                return Err(format!("boom in {}", step.script));
            }
            self.log.push(format!("migrate {}", step.version));
            Ok(())
        }

        async fn commit(self) -> Result<(), String> {
            *self.committed.lock().unwrap() = Some(self.log);
            Ok(())
        }
    }

    fn plan() -> Plan {
        let local = ["1", "2", "3"]
            .into_iter()
            .map(|v| LocalMigration {
                version: v.parse().unwrap(),
                description: String::new(),
                script: format!("V{v}__x.sql"),
                text: format!("SELECT {v};"),
            })
            .collect::<Vec<_>>();
        let schema = SchemaState {
            name: "public".into(),
            has_tables: true,
        };
        Plan::new(&[], &local, &schema, Some(&Baseline::default())).unwrap()
    }

    #[tokio::test]
    async fn applies_baseline_then_migrations_then_commits() {
        let recorder = Recorder::default();
        let committed = recorder.committed.clone();

        recorder.apply(&plan()).await.unwrap();

        assert_eq!(
            committed.lock().unwrap().clone().unwrap(),
            ["baseline 1", "migrate 2", "migrate 3"]
        );
    }

    #[tokio::test]
    async fn failure_stops_before_commit() {
        let recorder = Recorder {
            fail_on: Some("V2__x.sql".into()),
            ..Default::default()
        };
        let committed = recorder.committed.clone();

        let err = recorder.apply(&plan()).await.unwrap_err();

        assert_eq!(err, "boom in V2__x.sql");
        assert!(committed.lock().unwrap().is_none());
    }
}
