// SPDX-License-Identifier: MIT

#![allow(clippy::unwrap_used)]

use std::io::Write;

use forge_config::{load_into, ConfigBackend, FileBackend};
use serde::Deserialize;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, PartialEq)]
struct Settings {
    #[validate(length(min = 1))]
    name: String,
    #[validate(range(min = 1, max = 65535))]
    port: u16,
}

fn backend_for(contents: &str) -> FileBackend {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    FileBackend::from_file(file.path(), "FORGE_CONFIG_ROUNDTRIP_UNUSED").unwrap()
}

#[test]
fn set_then_unmarshal_round_trips_values() {
    let backend = backend_for("name = \"original\"\nport = 1\n");
    backend.set("name", config::Value::from("svc")).unwrap();
    backend.set("port", config::Value::from(8080i64)).unwrap();

    let settings: Settings = load_into(&backend, None).unwrap();
    assert_eq!(settings, Settings { name: "svc".to_string(), port: 8080 });
}

#[test]
fn invalid_unmarshaled_struct_reports_every_violation() {
    let backend = backend_for("name = \"\"\nport = 0\n");
    let err = load_into::<_, Settings>(&backend, None).unwrap_err();
    let forge_config::Error::Validation(violations) = err else {
        panic!("expected a validation error");
    };
    assert_eq!(violations.field_errors().len(), 2);
}
