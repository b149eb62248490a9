// SPDX-License-Identifier: MIT

//! Abstract configuration backend. The core framework depends only on this
//! trait; `FileBackend` is the one concrete implementation this workspace
//! ships.

use std::time::Duration;

use serde::de::DeserializeOwned;

use crate::error::Result;

/// Backend-agnostic key/value accessor with typed getters. Kept dyn-safe so
/// callers can hold a `Box<dyn ConfigBackend>`/`Arc<dyn ConfigBackend>`; the
/// generic `unmarshal`/`unmarshal_key` methods require a concrete type and so
/// are declared `where Self: Sized`, usable only through static dispatch.
pub trait ConfigBackend: Send + Sync {
    fn get_string(&self, key: &str) -> Result<String>;
    fn get_int(&self, key: &str) -> Result<i64>;
    fn get_bool(&self, key: &str) -> Result<bool>;
    fn get_float(&self, key: &str) -> Result<f64>;
    fn get_duration(&self, key: &str) -> Result<Duration>;

    fn set(&self, key: &str, value: config::Value) -> Result<()>;
    fn set_default(&self, key: &str, value: config::Value) -> Result<()>;
    fn is_set(&self, key: &str) -> bool;

    fn unmarshal<T>(&self) -> Result<T>
    where
        Self: Sized,
        T: DeserializeOwned;

    fn unmarshal_key<T>(&self, key: &str) -> Result<T>
    where
        Self: Sized,
        T: DeserializeOwned;
}

/// Optional capability: file-change notification with a callback.
pub trait Watchable: ConfigBackend {
    fn watch(&self, callback: Box<dyn Fn() + Send + Sync>) -> Result<()>;
}

/// Optional capability: persisting in-memory overrides back to storage.
pub trait Writable: ConfigBackend {
    fn write(&self) -> Result<()>;
}

/// Optional capability: automatic mapping of nested keys to
/// uppercase-underscore environment variables under a configurable prefix.
pub trait EnvBindable: ConfigBackend {
    fn env_prefix(&self) -> &str;
}
