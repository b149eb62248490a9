// SPDX-License-Identifier: MIT

//! Thin wrapper over the `validator` crate: collects every field failure
//! instead of stopping at the first.

use std::collections::HashMap;

pub use validator::Validate;

/// Mirrors `validator::ValidationErrorsKind`'s shape so callers can match on
/// where a failure originated without depending on the underlying crate's
/// error type directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Field,
    Struct,
    List,
}

/// One field-level validation failure, with its dotted path for nested
/// structs and list elements (e.g. `"accounts[2].email"`).
#[derive(Debug, Clone)]
pub struct FieldViolation {
    pub field: String,
    kind: ErrorKind,
    pub code: String,
    pub params: HashMap<String, serde_json::Value>,
    pub message: String,
}

impl FieldViolation {
    /// Where this failure originated: a leaf field, a nested struct, or a
    /// list element — mirrors `validator::ValidationErrorsKind`'s shape.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }
}

/// The collected set of field-level failures from one `validate_struct` call.
#[derive(Clone)]
pub struct ValidationErrors(Vec<FieldViolation>);

impl std::fmt::Debug for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ValidationErrors").field(&self.0).finish()
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let joined = self.0.iter().map(|v| format!("{} ({})", v.field, v.code)).collect::<Vec<_>>().join(", ");
        write!(f, "{} field violation(s): {joined}", self.0.len())
    }
}

impl std::error::Error for ValidationErrors {}

impl ValidationErrors {
    pub fn field_errors(&self) -> &[FieldViolation] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Validates `value` and collects every field failure (not just the first).
pub fn validate_struct<T: Validate>(value: &T) -> Result<(), ValidationErrors> {
    match value.validate() {
        Ok(()) => Ok(()),
        Err(errors) => Err(flatten(errors, "")),
    }
}

fn flatten(errors: validator::ValidationErrors, prefix: &str) -> ValidationErrors {
    let mut out = Vec::new();
    for (field, kind) in errors.into_errors() {
        let path = if prefix.is_empty() { field.to_string() } else { format!("{prefix}.{field}") };
        match kind {
            validator::ValidationErrorsKind::Field(errs) => {
                for e in errs {
                    out.push(FieldViolation {
                        field: path.clone(),
                        kind: ErrorKind::Field,
                        code: e.code.to_string(),
                        params: e.params.into_iter().map(|(k, v)| (k.to_string(), v)).collect(),
                        message: e
                            .message
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| format!("validation failed: {}", e.code)),
                    });
                }
            }
            validator::ValidationErrorsKind::Struct(nested) => {
                out.extend(flatten(*nested, &path).0);
            }
            validator::ValidationErrorsKind::List(list) => {
                for (idx, nested) in list {
                    out.extend(flatten(*nested, &format!("{path}[{idx}]")).0);
                }
            }
        }
    }
    ValidationErrors(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Signup {
        #[validate(length(min = 3))]
        username: String,
        #[validate(range(min = 18))]
        age: u8,
    }

    #[test]
    fn collects_every_field_failure_not_just_the_first() {
        let signup = Signup { username: "ab".into(), age: 10 };
        let err = validate_struct(&signup).unwrap_err();
        assert_eq!(err.field_errors().len(), 2);
        assert!(err.field_errors().iter().any(|v| v.field == "username"));
        assert!(err.field_errors().iter().any(|v| v.field == "age"));
    }

    #[test]
    fn valid_struct_passes() {
        let signup = Signup { username: "alice".into(), age: 30 };
        assert!(validate_struct(&signup).is_ok());
    }
}
