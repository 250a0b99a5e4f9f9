//! Command-line arguments.

use std::path::PathBuf;

#[derive(clap::Parser, Debug, Clone, Default)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Properties file with the database configuration (see db.conf.example)
    pub config: Option<PathBuf>,

    /// Directory holding the V<version>__<description>.sql migrations
    /// [default: the file's db.locations, or db/migration]
    #[arg(long, env = "DBMIGRATE_LOCATIONS")]
    pub locations: Option<PathBuf>,
}
