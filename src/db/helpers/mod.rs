//! Row-level coercions shared by the repositories.
//!
//! Writers go through the strict conversions; readers use the lenient ones so
//! a hand-edited or older row never makes a whole snapshot fail to load.

use std::convert::TryFrom;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use log::warn;

pub fn to_i64(value: u64) -> Result<i64> {
    i64::try_from(value).map_err(|_| anyhow!("value {value} exceeds SQLite INTEGER range"))
}

pub fn parse_datetime(value: &str, field: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("failed to parse {field}"))
}

/// Negative or missing counts read back as zero; oversized ones saturate.
pub fn count_or_zero(value: Option<i64>) -> u32 {
    match value {
        Some(raw) if raw > 0 => u32::try_from(raw).unwrap_or(u32::MAX),
        _ => 0,
    }
}

pub fn total_or_zero(value: Option<i64>) -> u64 {
    value.and_then(|raw| u64::try_from(raw).ok()).unwrap_or(0)
}

pub fn text_or_empty(value: Option<String>) -> String {
    value.unwrap_or_default()
}

pub fn encode_members(members: &[String]) -> Result<String> {
    serde_json::to_string(members).context("failed to encode group members")
}

/// Members are stored as a JSON array. Anything else reads back as no members.
pub fn decode_members(raw: Option<String>, group_id: &str) -> Vec<String> {
    let Some(raw) = raw else {
        return Vec::new();
    };
    match serde_json::from_str::<Vec<String>>(&raw) {
        Ok(members) => {
            let mut unique: Vec<String> = Vec::with_capacity(members.len());
            for member in members {
                if !unique.contains(&member) {
                    unique.push(member);
                }
            }
            unique
        }
        Err(err) => {
            warn!("group {group_id} has malformed members column, treating as empty: {err}");
            Vec::new()
        }
    }
}
