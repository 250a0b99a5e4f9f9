//! Migration checksums.

use crate::Error;

use sha3::{Digest, Sha3_256};

/// The SHA3-256 digest of a migration script.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct MigrationHash([u8; 32]);

impl AsRef<[u8]> for MigrationHash {
    fn as_ref(&self) -> &[u8] {
        &self.0[..]
    }
}

impl std::fmt::Display for MigrationHash {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }

        Ok(())
    }
}

impl std::fmt::Debug for MigrationHash {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        for byte in self.0.iter().take(4) {
            write!(f, "{:02x}", byte)?;
        }

        Ok(())
    }
}

impl std::str::FromStr for MigrationHash {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if !s.is_ascii() {
            return Err(Error::invalid_hash("not ascii"));
        }
        if s.len() != 64 {
            return Err(Error::invalid_hash(&format!(
                "expected 64 hex digits, found {}",
                s.len()
            )));
        }

        let mut bytes = [0u8; 32];

        for (i, pair) in s.as_bytes().chunks(2).enumerate() {
            if !pair.iter().all(u8::is_ascii_hexdigit) {
                return Err(Error::invalid_hash("not hex"));
            }
            let digits = std::str::from_utf8(pair).map_err(|_| Error::invalid_hash("not ascii"))?;
            bytes[i] = u8::from_str_radix(digits, 16).map_err(|_| Error::invalid_hash("not hex"))?;
        }

        Ok(MigrationHash(bytes))
    }
}

impl postgres_types::ToSql for MigrationHash {
    fn to_sql(
        &self,
        ty: &postgres_types::Type,
        buf: &mut bytes::BytesMut,
    ) -> Result<postgres_types::IsNull, Box<(dyn std::error::Error + Send + Sync + 'static)>> {
        self.to_string().to_sql(ty, buf)
    }

    fn accepts(ty: &postgres_types::Type) -> bool {
        <String as postgres_types::ToSql>::accepts(ty)
    }

    postgres_types::to_sql_checked!();
}

impl<'a> postgres_types::FromSql<'a> for MigrationHash {
    fn from_sql(
        ty: &postgres_types::Type,
        buf: &'a [u8],
    ) -> Result<Self, Box<(dyn std::error::Error + Send + Sync + 'static)>> {
        let string = <String as postgres_types::FromSql>::from_sql(ty, buf)?;
        string.parse().map_err(Into::into)
    }

    fn accepts(ty: &postgres_types::Type) -> bool {
        <String as postgres_types::FromSql>::accepts(ty)
    }
}

impl MigrationHash {
    pub fn from_content<S: AsRef<str>>(string: S) -> MigrationHash {
        let mut hasher = Sha3_256::new();

        hasher.update(string.as_ref().as_bytes());

        MigrationHash(hasher.finalize().into())
    }
}
