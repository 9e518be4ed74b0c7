//! Duration grammar for CLI flags and policy files.
//!
//! Strings like `7d`, `24h`, `30m`, `1d12h30m`. A day is exactly 24 hours.

use jiff::SignedDuration;

use crate::error::CoreError;

const SECS_PER_MIN: i64 = 60;
const SECS_PER_HOUR: i64 = 3_600;
const SECS_PER_DAY: i64 = 86_400;

/// Parse a duration string. Empty input and unknown units are errors.
pub fn parse(s: &str) -> Result<SignedDuration, CoreError> {
    if s.is_empty() {
        return Err(CoreError::InvalidDuration("empty duration".into()));
    }

    let mut total_secs: i64 = 0;
    let mut digits = String::new();

    for ch in s.chars() {
        if ch.is_ascii_digit() {
            digits.push(ch);
            continue;
        }
        if digits.is_empty() {
            return Err(CoreError::InvalidDuration(format!(
                "expected a number before '{ch}' in {s:?}"
            )));
        }
        let n: i64 = digits
            .parse()
            .map_err(|_| CoreError::InvalidDuration(format!("number out of range in {s:?}")))?;
        let unit_secs = match ch {
            'd' => SECS_PER_DAY,
            'h' => SECS_PER_HOUR,
            'm' => SECS_PER_MIN,
            other => {
                return Err(CoreError::InvalidDuration(format!(
                    "unknown unit '{other}' in {s:?} (expected d, h, or m)"
                )));
            }
        };
        total_secs = n
            .checked_mul(unit_secs)
            .and_then(|part| total_secs.checked_add(part))
            .ok_or_else(|| CoreError::InvalidDuration(format!("duration overflow in {s:?}")))?;
        digits.clear();
    }

    if !digits.is_empty() {
        return Err(CoreError::InvalidDuration(format!(
            "trailing number without a unit in {s:?}"
        )));
    }
    if total_secs <= 0 {
        return Err(CoreError::InvalidDuration(format!(
            "duration must be positive, got {s:?}"
        )));
    }

    Ok(SignedDuration::from_secs(total_secs))
}

/// Render a duration in the same grammar `parse` accepts (`1d12h30m`).
/// Sub-minute remainders are dropped.
pub fn format(d: SignedDuration) -> String {
    let mut secs = d.as_secs().max(0);
    let days = secs / SECS_PER_DAY;
    secs %= SECS_PER_DAY;
    let hours = secs / SECS_PER_HOUR;
    secs %= SECS_PER_HOUR;
    let mins = secs / SECS_PER_MIN;

    let mut out = String::new();
    if days > 0 {
        out.push_str(&format!("{days}d"));
    }
    if hours > 0 {
        out.push_str(&format!("{hours}h"));
    }
    if mins > 0 || out.is_empty() {
        out.push_str(&format!("{mins}m"));
    }
    out
}

/// Serialize a [`SignedDuration`] as whole seconds. This is the wire form
/// used for entity durations and policy bounds.
pub mod serde_secs {
    use jiff::SignedDuration;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &SignedDuration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_i64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<SignedDuration, D::Error> {
        let secs = i64::deserialize(d)?;
        Ok(SignedDuration::from_secs(secs))
    }
}
