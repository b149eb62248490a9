// SPDX-License-Identifier: MIT

//! Canonical type keys identifying a registered service.

use std::any::{type_name, TypeId};
use std::fmt;

/// `(type-identity, optional-name)` tuple used to look up a service.
///
/// `TypeId` backs equality and hashing (it is the stable identity across a
/// single process run); `type_name` is carried only for diagnostics — it is
/// not guaranteed unique across generic instantiations on its own, which is
/// why it never participates in `Eq`/`Hash`.
#[derive(Clone)]
pub struct Key {
    type_id: TypeId,
    type_name: &'static str,
    name: Option<String>,
}

impl Key {
    /// Key for the unnamed instance of `T`.
    pub fn of<T: 'static>() -> Self {
        Key { type_id: TypeId::of::<T>(), type_name: type_name::<T>(), name: None }
    }

    /// Key for a named instance of `T`.
    pub fn named<T: 'static>(name: impl Into<String>) -> Self {
        Key { type_id: TypeId::of::<T>(), type_name: type_name::<T>(), name: Some(name.into()) }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Stable string used for display, blame logs, and deterministic tie-breaking.
    pub fn canonical(&self) -> String {
        match &self.name {
            Some(n) => format!("{}#{n}", self.type_name),
            None => self.type_name.to_string(),
        }
    }
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id && self.name == other.name
    }
}

impl Eq for Key {}

impl std::hash::Hash for Key {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
        self.name.hash(state);
    }
}

impl PartialOrd for Key {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Key {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.canonical().cmp(&other.canonical())
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key({})", self.canonical())
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.canonical())
    }
}
