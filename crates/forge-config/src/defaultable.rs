// SPDX-License-Identifier: MIT

//! The optional "apply defaults before validation" hook, invoked via an
//! optional interface method on the config struct. Rust has no runtime check
//! for "does T implement this trait", so the
//! optionality is expressed as two entry points in [`crate::load`] rather
//! than one call site that silently no-ops for non-implementors: call
//! [`crate::load::load_into`] for plain structs, or
//! [`crate::load::load_into_with_defaults`] for structs that implement this
//! trait.

pub trait Defaultable {
    /// Called on the freshly unmarshaled struct before validation.
    fn apply_defaults(&mut self);
}
