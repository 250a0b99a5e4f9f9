//! Migration scripts on the local filesystem.
//!
//! A location is a directory holding files named `V<version>__<description>.sql`,
//! for instance `V1__create_posts.sql` or `V1.1__add_post_slug.sql`.

use crate::hash::MigrationHash;
use crate::version::MigrationVersion;
use crate::Error;

use itertools::Itertools;

const PREFIX: &str = "V";
const SEPARATOR: &str = "__";
const SUFFIX: &str = ".sql";

/// A versioned migration found in a location.
#[derive(Debug, Clone)]
pub struct LocalMigration {
    pub version: MigrationVersion,
    pub description: String,
    pub script: String,
    pub text: String,
}

impl LocalMigration {
    pub fn hash(&self) -> MigrationHash {
        MigrationHash::from_content(&self.text)
    }
}

/// The parts of a migration file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptName {
    pub version: MigrationVersion,
    pub description: String,
}

impl ScriptName {
    /// Parse a file name, returning `None` for files that are not versioned migrations.
    pub fn parse(file_name: &str) -> Result<Option<Self>, Error> {
        let Some(rest) = file_name.strip_prefix(PREFIX) else {
            return Ok(None);
        };
        let Some(rest) = rest.strip_suffix(SUFFIX) else {
            return Ok(None);
        };

        let (version, description) = match rest.split_once(SEPARATOR) {
            Some(parts) => parts,
            None => (rest, ""),
        };

        let version = version.parse::<MigrationVersion>().map_err(|err| {
            Error::invalid_version(file_name, &err.to_string())
        })?;
        let description = description.replace('_', " ");

        Ok(Some(ScriptName {
            version,
            description,
        }))
    }
}

#[derive(Debug)]
pub struct SourceRepo {
    migrations_dir: std::path::PathBuf,
}

impl SourceRepo {
    pub fn new<P: AsRef<std::path::Path>>(migrations_dir: P) -> Result<Self, Error> {
        let migrations_dir: std::path::PathBuf = migrations_dir.as_ref().into();
        let exists = migrations_dir
            .try_exists()
            .map_err(|err| Error::io(&migrations_dir, err))?;
        if exists && migrations_dir.is_dir() {
            Ok(SourceRepo { migrations_dir })
        } else {
            Err(Error::io(
                &migrations_dir,
                std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "unable to open migrations dir",
                ),
            ))
        }
    }

    /// Read every versioned migration, sorted by ascending version.
    pub fn migrations(&self) -> Result<Vec<LocalMigration>, Error> {
        let mut migrations = vec![];

        let entries = std::fs::read_dir(&self.migrations_dir)
            .map_err(|err| Error::io(&self.migrations_dir, err))?;

        for entry in entries {
            let entry = entry.map_err(|err| Error::io(&self.migrations_dir, err))?;
            let path = entry.path();

            if !path.is_file() {
                continue;
            }

            let Some(file_name) = path.file_name().and_then(|name| name.to_str()) else {
                tracing::debug!(path = %path.display(), "skipping file with non-utf8 name");
                continue;
            };

            let Some(name) = ScriptName::parse(file_name)? else {
                tracing::debug!(file = file_name, "skipping file that is not a versioned migration");
                continue;
            };

            let text = std::fs::read_to_string(&path).map_err(|err| Error::io(&path, err))?;

            migrations.push(LocalMigration {
                version: name.version,
                description: name.description,
                script: file_name.to_string(),
                text,
            });
        }

        migrations.sort_by(|a, b| a.version.cmp(&b.version));

        if let Some((a, b)) = migrations
            .iter()
            .tuple_windows()
            .find(|(a, b)| a.version == b.version)
        {
            return Err(Error::DuplicateVersion {
                version: a.version.clone(),
                first: a.script.clone(),
                second: b.script.clone(),
            });
        }

        tracing::debug!(
            count = migrations.len(),
            dir = %self.migrations_dir.display(),
            "resolved local migrations"
        );

        Ok(migrations)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn write(dir: &std::path::Path, name: &str, text: &str) {
        std::fs::write(dir.join(name), text).expect("write migration");
    }

    #[test]
    fn parse_script_names() {
        let name = ScriptName::parse("V1__create_posts.sql").unwrap().unwrap();
        assert_eq!(name.version, "1".parse::<MigrationVersion>().unwrap());
        assert_eq!(name.description, "create posts");

        let name = ScriptName::parse("V2_1__add_slug.sql").unwrap().unwrap();
        assert_eq!(name.version.parts(), &[2, 1]);

        let name = ScriptName::parse("V3.sql").unwrap().unwrap();
        assert_eq!(name.description, "");

        assert!(ScriptName::parse("README.md").unwrap().is_none());
        assert!(ScriptName::parse("U1__undo.sql").unwrap().is_none());
        assert!(ScriptName::parse("V1__notes.txt").unwrap().is_none());
        assert!(ScriptName::parse("Vx__broken.sql").is_err());
    }

    #[test]
    fn missing_dir_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = SourceRepo::new(dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn migrations_sorted_by_version() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "V10__ten.sql", "SELECT 10;");
        write(dir.path(), "V2__two.sql", "SELECT 2;");
        write(dir.path(), "V1.1__one_one.sql", "SELECT 11;");
        write(dir.path(), "notes.txt", "ignored");
        std::fs::create_dir(dir.path().join("V3__a_directory.sql")).unwrap();

        let repo = SourceRepo::new(dir.path()).unwrap();
        let migrations = repo.migrations().unwrap();

        let scripts = migrations
            .iter()
            .map(|m| m.script.as_str())
            .collect::<Vec<_>>();
        assert_eq!(scripts, ["V1.1__one_one.sql", "V2__two.sql", "V10__ten.sql"]);
        assert_eq!(migrations[0].text, "SELECT 11;");
        assert_eq!(migrations[0].description, "one one");
        assert_eq!(migrations[0].hash(), MigrationHash::from_content("SELECT 11;"));
    }

    #[test]
    fn duplicate_versions_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "V1__first.sql", "SELECT 1;");
        write(dir.path(), "V1.0__second.sql", "SELECT 1;");

        let repo = SourceRepo::new(dir.path()).unwrap();
        match repo.migrations() {
            Err(Error::DuplicateVersion { version, .. }) => {
                assert_eq!(version, "1".parse::<MigrationVersion>().unwrap())
            }
            other => panic!("expected duplicate version, got {other:?}"),
        }
    }
}
