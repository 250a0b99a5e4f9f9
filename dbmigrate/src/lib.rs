//! Apply the blog database migrations described by a properties file.

pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod properties;

pub use app::{run, MigrationClient, Outcome};
