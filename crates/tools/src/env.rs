//! Environment snapshot handed to the configuration loader.
//!
//! The loader never reads `std::env` directly. Callers build an
//! [`Environment`] from the process (optionally seeded from a `.env` file)
//! or from literal pairs in tests, and pass it in.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::Path;

use tracing::debug;

use crate::config::ConfigError;

const DOTENV_FILE: &str = ".env";

/// Immutable-by-convention mapping of variable names to values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    vars: BTreeMap<String, String>,
}

impl Environment {
    /// Build an environment from literal key/value pairs
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Snapshot the current process environment.
    ///
    /// Variables whose name or value is not valid UTF-8 are skipped.
    pub fn from_process() -> Self {
        Self::from_os_pairs(std::env::vars_os())
    }

    fn from_os_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (OsString, OsString)>,
    {
        let mut vars = BTreeMap::new();
        for (key, value) in pairs {
            match (key.into_string(), value.into_string()) {
                (Ok(key), Ok(value)) => {
                    vars.insert(key, value);
                }
                (Ok(key), Err(_)) => debug!(%key, "skipping non UTF-8 environment value"),
                (Err(key), _) => {
                    debug!(key = %key.to_string_lossy(), "skipping non UTF-8 environment name")
                }
            }
        }
        Self { vars }
    }

    /// Snapshot the process environment and fill gaps from a `.env` file.
    ///
    /// With `path == None` the `.env` file is searched for from the working
    /// directory upwards and a missing file is not an error. An explicit
    /// path must exist.
    pub fn from_process_with_dotenv(path: Option<&Path>) -> Result<Self, ConfigError> {
        let env = Self::from_process();

        match path {
            Some(path) => env.with_dotenv_file(path),
            None => {
                let cwd = std::env::current_dir()?;
                env.with_discovered_dotenv(&cwd)
            }
        }
    }

    /// Merge the first `.env` found in `start` or its ancestors, if any
    pub fn with_discovered_dotenv(self, start: &Path) -> Result<Self, ConfigError> {
        match start
            .ancestors()
            .map(|dir| dir.join(DOTENV_FILE))
            .find(|candidate| candidate.is_file())
        {
            Some(path) => self.with_dotenv_file(&path),
            None => {
                debug!("no .env file found, using process environment only");
                Ok(self)
            }
        }
    }

    /// Merge entries from a `.env` file. Variables already present win.
    pub fn with_dotenv_file(self, path: &Path) -> Result<Self, ConfigError> {
        debug!(path = %path.display(), "loading dotenv file");
        let iter = dotenvy::from_path_iter(path)?;
        self.merge_dotenv(iter)
    }

    fn merge_dotenv<I>(mut self, iter: I) -> Result<Self, ConfigError>
    where
        I: Iterator<Item = dotenvy::Result<(String, String)>>,
    {
        for item in iter {
            let (key, value) = item?;
            self.vars.entry(key).or_insert(value);
        }
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_from_pairs_and_get() {
        let env = Environment::from_pairs([("INFURA_ID", "abc123")]);
        assert_eq!(env.get("INFURA_ID"), Some("abc123"));
        assert_eq!(env.get("PRIVATE_KEY"), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_variables_are_skipped() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let bad = OsStr::from_bytes(b"\xff\xfe").to_os_string();
        let env = Environment::from_os_pairs([
            (OsString::from("INFURA_ID"), OsString::from("abc123")),
            (OsString::from("CHAINFORGE_BAD_VALUE"), bad.clone()),
            (bad, OsString::from("value")),
        ]);

        assert_eq!(env.get("INFURA_ID"), Some("abc123"));
        assert_eq!(env.get("CHAINFORGE_BAD_VALUE"), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_from_process_tolerates_non_utf8_variable() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        std::env::set_var(
            "CHAINFORGE_TEST_NON_UTF8",
            OsStr::from_bytes(b"\xff\xfe"),
        );
        let env = Environment::from_process();
        std::env::remove_var("CHAINFORGE_TEST_NON_UTF8");

        assert_eq!(env.get("CHAINFORGE_TEST_NON_UTF8"), None);
    }

    #[test]
    fn test_discovered_dotenv_missing_is_not_error() {
        let dir = tempfile::tempdir().unwrap();
        let env = Environment::from_pairs([("INFURA_ID", "abc123")])
            .with_discovered_dotenv(dir.path())
            .unwrap();
        assert_eq!(env, Environment::from_pairs([("INFURA_ID", "abc123")]));
    }

    #[test]
    fn test_discovered_dotenv_in_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".env"), "PRIVATE_KEY=0xabc\n").unwrap();
        let nested = dir.path().join("contracts").join("deep");
        std::fs::create_dir_all(&nested).unwrap();

        let env = Environment::default().with_discovered_dotenv(&nested).unwrap();
        assert_eq!(env.get("PRIVATE_KEY"), Some("0xabc"));
    }

    #[test]
    fn test_discovered_dotenv_malformed_is_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".env"), "this is not a dotenv line\n").unwrap();

        let result = Environment::default().with_discovered_dotenv(dir.path());
        assert!(matches!(result, Err(ConfigError::Dotenv(_))));
    }

    #[test]
    fn test_dotenv_fills_gaps_without_overriding() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "PRIVATE_KEY=0xfromfile").unwrap();
        writeln!(file, "INFURA_ID=fromfile").unwrap();

        let env = Environment::from_pairs([("PRIVATE_KEY", "0xfromprocess")])
            .with_dotenv_file(file.path())
            .unwrap();

        assert_eq!(env.get("PRIVATE_KEY"), Some("0xfromprocess"));
        assert_eq!(env.get("INFURA_ID"), Some("fromfile"));
    }

    #[test]
    fn test_dotenv_explicit_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = Environment::default().with_dotenv_file(&dir.path().join("absent.env"));
        assert!(matches!(result, Err(ConfigError::Dotenv(_))));
    }
}
