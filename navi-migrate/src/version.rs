//! Migration versions.

use crate::Error;

/// A dotted numeric migration version, such as `1`, `1.2` or `2_0_3`.
///
/// Versions compare part by part; missing trailing parts count as zero,
/// so `1` and `1.0` are the same version.
#[derive(Clone)]
pub struct MigrationVersion {
    parts: Vec<u64>,
}

impl MigrationVersion {
    pub fn parts(&self) -> &[u64] {
        &self.parts
    }

    fn significant(&self) -> &[u64] {
        let len = self
            .parts
            .iter()
            .rposition(|part| *part != 0)
            .map_or(0, |i| i + 1);
        &self.parts[..len]
    }
}

impl Default for MigrationVersion {
    fn default() -> Self {
        MigrationVersion { parts: vec![1] }
    }
}

impl std::str::FromStr for MigrationVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(Error::invalid_version(s, "empty"));
        }

        let parts = s
            .split(['.', '_'])
            .map(|part| {
                if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(Error::invalid_version(s, "expected digits"));
                }
                part.parse::<u64>()
                    .map_err(|_| Error::invalid_version(s, "part out of range"))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(MigrationVersion { parts })
    }
}

impl std::fmt::Display for MigrationVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let mut first = true;
        for part in &self.parts {
            if !first {
                write!(f, ".")?;
            }
            write!(f, "{part}")?;
            first = false;
        }
        Ok(())
    }
}

impl std::fmt::Debug for MigrationVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "v{self}")
    }
}

impl PartialEq for MigrationVersion {
    fn eq(&self, other: &Self) -> bool {
        self.significant() == other.significant()
    }
}

impl Eq for MigrationVersion {}

impl std::hash::Hash for MigrationVersion {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.significant().hash(state);
    }
}

impl PartialOrd for MigrationVersion {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MigrationVersion {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.significant().cmp(other.significant())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn v(s: &str) -> MigrationVersion {
        s.parse().expect("version")
    }

    #[test]
    fn parses_dotted_and_underscored() {
        assert_eq!(v("1").parts(), &[1]);
        assert_eq!(v("1.2").parts(), &[1, 2]);
        assert_eq!(v("2_0_3").parts(), &[2, 0, 3]);
        assert_eq!(v("2_0_3").to_string(), "2.0.3");
    }

    #[test]
    fn rejects_malformed() {
        for bad in ["", "a", "1..2", "1.", "_1", "1.x", "-1", "1 "] {
            assert!(bad.parse::<MigrationVersion>().is_err(), "{bad:?}");
        }
    }

    #[test]
    fn orders_numerically() {
        assert!(v("2") < v("10"));
        assert!(v("1.9") < v("1.10"));
        assert!(v("1") < v("1.0.1"));
        assert!(v("1.1") > v("1.0.9"));
    }

    #[test]
    fn trailing_zeroes_are_insignificant() {
        assert_eq!(v("1"), v("1.0"));
        assert_eq!(v("1.0.0"), v("1_0"));
        assert_eq!(v("0"), v("0.0"));

        let mut set = std::collections::HashSet::new();
        set.insert(v("3"));
        assert!(set.contains(&v("3.0")));
    }
}
