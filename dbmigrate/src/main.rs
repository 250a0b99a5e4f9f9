use clap::Parser;

use dbmigrate::cli::Args;
use dbmigrate::{logging, Outcome};
use navi_migrate::Migrator;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    logging::init();
    let args = Args::parse();

    let mut migrator = Migrator::new();
    if let Outcome::Migrated(report) = dbmigrate::run(&args, &mut migrator).await? {
        if let Some(current) = &report.current {
            tracing::info!(version = %current, applied = report.applied.len(), "done");
        }
    }

    Ok(())
}
