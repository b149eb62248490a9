// SPDX-License-Identifier: MIT

//! Concrete [`ConfigBackend`] wrapping the `config` crate: a layered
//! file-plus-environment source.

use std::path::Path;
use std::time::Duration;

use parking_lot::RwLock;
use serde::de::DeserializeOwned;

use crate::backend::{ConfigBackend, EnvBindable};
use crate::error::{Error, Result};

pub struct FileBackend {
    inner: RwLock<config::Config>,
    env_prefix: String,
}

impl FileBackend {
    /// Loads `path` (any format the `config` crate recognizes by extension)
    /// layered under environment variables prefixed with `env_prefix` and
    /// separated by double underscore, e.g. `MYAPP__SERVER__PORT`.
    pub fn from_file(path: impl AsRef<Path>, env_prefix: &str) -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(config::Environment::with_prefix(env_prefix).separator("__"))
            .build()?;
        Ok(FileBackend { inner: RwLock::new(config), env_prefix: env_prefix.to_string() })
    }

    /// Builds from environment variables alone, with no file source — useful
    /// for tests and for deployments that configure entirely via env.
    pub fn from_env(env_prefix: &str) -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix(env_prefix).separator("__"))
            .build()?;
        Ok(FileBackend { inner: RwLock::new(config), env_prefix: env_prefix.to_string() })
    }
}

impl ConfigBackend for FileBackend {
    fn get_string(&self, key: &str) -> Result<String> {
        Ok(self.inner.read().get_string(key)?)
    }

    fn get_int(&self, key: &str) -> Result<i64> {
        Ok(self.inner.read().get_int(key)?)
    }

    fn get_bool(&self, key: &str) -> Result<bool> {
        Ok(self.inner.read().get_bool(key)?)
    }

    fn get_float(&self, key: &str) -> Result<f64> {
        Ok(self.inner.read().get_float(key)?)
    }

    fn get_duration(&self, key: &str) -> Result<Duration> {
        let raw = self.get_string(key)?;
        humantime::parse_duration(&raw).map_err(|e| Error::Backend(anyhow::anyhow!(e)))
    }

    fn set(&self, key: &str, value: config::Value) -> Result<()> {
        let mut guard = self.inner.write();
        let rebuilt =
            config::Config::builder().add_source(guard.clone()).set_override(key, value)?.build()?;
        *guard = rebuilt;
        Ok(())
    }

    fn set_default(&self, key: &str, value: config::Value) -> Result<()> {
        let mut guard = self.inner.write();
        let rebuilt =
            config::Config::builder().set_default(key, value)?.add_source(guard.clone()).build()?;
        *guard = rebuilt;
        Ok(())
    }

    fn is_set(&self, key: &str) -> bool {
        self.inner.read().get::<config::Value>(key).is_ok()
    }

    fn unmarshal<T>(&self) -> Result<T>
    where
        T: DeserializeOwned,
    {
        Ok(self.inner.read().clone().try_deserialize()?)
    }

    fn unmarshal_key<T>(&self, key: &str) -> Result<T>
    where
        T: DeserializeOwned,
    {
        Ok(self.inner.read().get(key)?)
    }
}

impl EnvBindable for FileBackend {
    fn env_prefix(&self) -> &str {
        &self.env_prefix
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp_toml(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn reads_typed_values_from_file() {
        let file = write_temp_toml("name = \"svc\"\nport = 8080\nenabled = true\nratio = 0.5\n");
        let backend = FileBackend::from_file(file.path(), "FORGE_TEST_UNUSED").unwrap();
        assert_eq!(backend.get_string("name").unwrap(), "svc");
        assert_eq!(backend.get_int("port").unwrap(), 8080);
        assert!(backend.get_bool("enabled").unwrap());
        assert!((backend.get_float("ratio").unwrap() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    #[serial_test::serial]
    fn environment_overrides_file_value() {
        let file = write_temp_toml("port = 8080\n");
        std::env::set_var("FORGE_TEST_A__PORT", "9999");
        let backend = FileBackend::from_file(file.path(), "FORGE_TEST_A").unwrap();
        assert_eq!(backend.get_int("port").unwrap(), 9999);
        std::env::remove_var("FORGE_TEST_A__PORT");
    }

    #[test]
    fn set_then_get_round_trips() {
        let file = write_temp_toml("port = 8080\n");
        let backend = FileBackend::from_file(file.path(), "FORGE_TEST_UNUSED2").unwrap();
        backend.set("port", config::Value::from(1234i64)).unwrap();
        assert_eq!(backend.get_int("port").unwrap(), 1234);
    }

    #[test]
    fn is_set_reflects_presence() {
        let file = write_temp_toml("port = 8080\n");
        let backend = FileBackend::from_file(file.path(), "FORGE_TEST_UNUSED3").unwrap();
        assert!(backend.is_set("port"));
        assert!(!backend.is_set("missing_key"));
    }
}
