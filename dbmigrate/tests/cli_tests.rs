//! Integration tests for the dbmigrate binary

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

#[allow(deprecated)]
fn dbmigrate_cmd() -> Command {
    let mut cmd = Command::cargo_bin("dbmigrate").unwrap();
    cmd.env_remove("DBMIGRATE_LOCATIONS").env("RUST_LOG", "info");
    cmd
}

fn write_config(dir: &TempDir, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join("db.conf");
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn test_no_arguments_prints_usage() {
    dbmigrate_cmd()
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Required at least one argument: filename with db configuration (check db.conf.example).",
        ));
}

#[test]
fn test_help() {
    dbmigrate_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Properties file with the database configuration"))
        .stdout(predicate::str::contains("--locations"));
}

#[test]
fn test_missing_config_file_is_logged() {
    let dir = TempDir::new().unwrap();

    dbmigrate_cmd()
        .arg(dir.path().join("missing.conf"))
        .assert()
        .success()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("unable to read database configuration"))
        .stderr(predicate::str::contains("missing.conf"));
}

#[test]
fn test_malformed_config_fails() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, "db.url=\\uZZZZ\n");

    dbmigrate_cmd()
        .arg(config)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("malformed"));
}

#[test]
fn test_unsupported_database_fails() {
    let dir = TempDir::new().unwrap();
    let config = write_config(
        &dir,
        "db.url=jdbc:mysql://localhost/blog\ndb.username=blog\ndb.password=blog\n",
    );

    dbmigrate_cmd()
        .arg(config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("only postgresql is supported"));
}

#[test]
fn test_missing_migrations_dir_fails_before_connecting() {
    let dir = TempDir::new().unwrap();
    let config = write_config(
        &dir,
        "db.url=jdbc:postgresql://127.0.0.1:1/blog\ndb.username=blog\ndb.password=blog\n",
    );

    dbmigrate_cmd()
        .arg(config)
        .arg("--locations")
        .arg(dir.path().join("no-such-dir"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("unable to open migrations dir"));
}
