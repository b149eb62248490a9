// SPDX-License-Identifier: MIT

//! Cron-expression wrapping. Grammar is delegated to the `cron` crate; this
//! module only expands the common predefined macros (`@hourly`, `@daily`,
//! ...) into the 6-field `sec min hour day month dow` syntax that crate
//! expects, and special-cases `@every <dur>` into a fixed interval the `cron`
//! crate itself has no concept of.

use std::time::Duration;

use chrono::Utc;
use cron::Schedule as CronSchedule;
use std::str::FromStr;

use crate::error::Error;

/// A parsed, ready-to-drive schedule. An empty expression disables the job
/// without error.
pub(crate) enum ParsedSchedule {
    Disabled,
    Cron(CronSchedule),
    Every(Duration),
}

impl ParsedSchedule {
    pub(crate) fn parse(expr: &str) -> Result<Self, Error> {
        let expr = expr.trim();
        if expr.is_empty() {
            return Ok(ParsedSchedule::Disabled);
        }

        if let Some(rest) = expr.strip_prefix("@every ") {
            let duration = humantime::parse_duration(rest.trim()).map_err(|source| {
                Error::InvalidSchedule { expr: expr.to_string(), source: anyhow::Error::new(source) }
            })?;
            return Ok(ParsedSchedule::Every(duration));
        }

        let expanded = expand_macro(expr).unwrap_or_else(|| normalize_field_count(expr));
        let schedule = CronSchedule::from_str(&expanded).map_err(|source| Error::InvalidSchedule {
            expr: expr.to_string(),
            source: anyhow::anyhow!(source),
        })?;
        Ok(ParsedSchedule::Cron(schedule))
    }

    /// Duration until the next fire from now, or `None` if disabled or the
    /// underlying cron schedule has no further occurrences.
    pub(crate) fn next_delay(&self) -> Option<Duration> {
        match self {
            ParsedSchedule::Disabled => None,
            ParsedSchedule::Every(d) => Some(*d),
            ParsedSchedule::Cron(schedule) => {
                let now = Utc::now();
                let next = schedule.upcoming(Utc).next()?;
                (next - now).to_std().ok().or(Some(Duration::ZERO))
            }
        }
    }

    pub(crate) fn is_disabled(&self) -> bool {
        matches!(self, ParsedSchedule::Disabled)
    }
}

fn expand_macro(expr: &str) -> Option<String> {
    let expanded = match expr {
        "@hourly" => "0 0 * * * *",
        "@daily" | "@midnight" => "0 0 0 * * *",
        "@weekly" => "0 0 0 * * 0",
        "@monthly" => "0 0 0 1 * *",
        "@yearly" | "@annually" => "0 0 0 1 1 *",
        _ => return None,
    };
    Some(expanded.to_string())
}

/// The `cron` crate requires a leading seconds field (6 or 7 fields total),
/// but callers commonly write the standard 5-field form. Prefix a `0`
/// seconds field when exactly 5 space-separated fields are given.
fn normalize_field_count(expr: &str) -> String {
    if expr.split_whitespace().count() == 5 {
        format!("0 {expr}")
    } else {
        expr.to_string()
    }
}
