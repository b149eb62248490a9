// SPDX-License-Identifier: MIT

use std::time::Duration;

/// Emitted when a hook overran its declared timeout. Mirrored to both the
/// structured logger and standard error so it's visible even when the
/// logger is misconfigured.
#[derive(Debug, Clone)]
pub struct BlameRecord {
    pub key: String,
    pub declared_timeout: Duration,
    pub elapsed: Duration,
}

impl BlameRecord {
    pub(crate) fn emit(key: &str, declared_timeout: Duration, elapsed: Duration) -> Self {
        let record = BlameRecord { key: key.to_string(), declared_timeout, elapsed };
        tracing::warn!(
            hook = %record.key,
            declared_timeout_ms = record.declared_timeout.as_millis() as u64,
            elapsed_ms = record.elapsed.as_millis() as u64,
            "hook exceeded its declared timeout"
        );
        eprintln!(
            "BLAME hook={} declared_timeout={:?} elapsed={:?}",
            record.key, record.declared_timeout, record.elapsed
        );
        record
    }
}
