// SPDX-License-Identifier: MIT

//! `LoadInto`: load from backend, optionally apply defaults, then validate.

use serde::de::DeserializeOwned;
use validator::Validate;

use crate::backend::ConfigBackend;
use crate::defaultable::Defaultable;
use crate::error::Result;
use crate::validate::validate_struct;

/// Loads `T` from `backend` (the whole store, or just `key` if given) and
/// validates it, returning the collected validation failures on error.
pub fn load_into<B, T>(backend: &B, key: Option<&str>) -> Result<T>
where
    B: ConfigBackend,
    T: DeserializeOwned + Validate,
{
    let value: T = match key {
        Some(k) => backend.unmarshal_key(k)?,
        None => backend.unmarshal()?,
    };
    validate_struct(&value)?;
    Ok(value)
}

/// Same as [`load_into`], but calls `T::apply_defaults` on the unmarshaled
/// struct before validation, for types that implement [`Defaultable`].
pub fn load_into_with_defaults<B, T>(backend: &B, key: Option<&str>) -> Result<T>
where
    B: ConfigBackend,
    T: DeserializeOwned + Validate + Defaultable,
{
    let mut value: T = match key {
        Some(k) => backend.unmarshal_key(k)?,
        None => backend.unmarshal()?,
    };
    value.apply_defaults();
    validate_struct(&value)?;
    Ok(value)
}
