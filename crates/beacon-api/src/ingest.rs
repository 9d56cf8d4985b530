//! Ingest payload normalization.
//!
//! Game clients send loosely typed JSON: numbers arrive as strings and
//! vice versa, and optional fields are often `null` or `""`. This module
//! turns such a payload into a [`Candidate`], rejecting it only when a
//! required field is missing.

use beacon_core::Candidate;
use beacon_core::value::parse_value;
use serde::Deserialize;
use serde_json::Value;

use crate::error::ApiError;

/// Longest job ID accepted on ingest or in a path.
pub const MAX_JOB_ID_LEN: usize = 256;

/// Raw body of `POST /api/notify`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotifyRequest {
    /// Item name (required).
    pub display_name: Option<Value>,
    /// Numeric value, or a rate string like `"$2.2M/s"`.
    pub value: Option<Value>,
    /// Client-rendered value string.
    pub value_formatted: Option<Value>,
    /// Mutation descriptor.
    pub mutation: Option<Value>,
    /// Rarity descriptor.
    pub rarity: Option<Value>,
    /// Player count string.
    pub players: Option<Value>,
    /// Job identifier (required).
    pub job_id: Option<Value>,
    /// Place identifier (required, may be numeric string).
    pub place_id: Option<Value>,
    /// Opaque teleport payload.
    pub teleport_script: Option<Value>,
}

impl NotifyRequest {
    /// Validate required fields and normalize the rest.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] when `displayName`, `jobId`, or
    /// `placeId` is missing or not a string or number, or the job ID is
    /// malformed.
    pub fn into_candidate(self) -> Result<Candidate, ApiError> {
        let required = [&self.display_name, &self.job_id, &self.place_id];
        if !required.iter().all(|field| is_present(field.as_ref())) {
            return Err(ApiError::Validation(
                "Missing required fields (displayName, jobId, placeId)".to_owned(),
            ));
        }
        if required
            .iter()
            .any(|field| matches!(field, Some(Value::Array(_) | Value::Object(_))))
        {
            return Err(ApiError::Validation(
                "displayName, jobId, and placeId must be strings or numbers".to_owned(),
            ));
        }

        let display_name = text(self.display_name).unwrap_or_default();
        let job_id = text(self.job_id).unwrap_or_default();
        validate_job_id(&job_id)?;

        Ok(Candidate {
            display_name,
            value: numeric_value(self.value.as_ref()),
            value_formatted: text(self.value_formatted),
            mutation: text(self.mutation),
            rarity: text(self.rarity),
            players: text(self.players),
            job_id,
            place_id: place_id(self.place_id.as_ref()),
            teleport_script: text(self.teleport_script),
        })
    }
}

/// Reject empty, oversized, or control-character job IDs.
pub fn validate_job_id(job_id: &str) -> Result<(), ApiError> {
    if job_id.trim().is_empty() {
        return Err(ApiError::Validation("jobId must not be empty".to_owned()));
    }
    if job_id.len() > MAX_JOB_ID_LEN {
        return Err(ApiError::Validation(format!(
            "jobId exceeds {MAX_JOB_ID_LEN} bytes"
        )));
    }
    if job_id.chars().any(char::is_control) {
        return Err(ApiError::Validation(
            "jobId contains control characters".to_owned(),
        ));
    }
    Ok(())
}

/// Parse the leading integer of a query value, `parseInt`-style.
///
/// Leading whitespace and a sign are accepted; parsing stops at the
/// first non-digit. Negative and unparseable input yields 0.
pub fn leading_integer(raw: &str) -> u64 {
    let trimmed = raw.trim_start();
    let (negative, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    let number = digits.get(..end).unwrap_or_default();

    if negative || number.is_empty() {
        return 0;
    }
    // All-digit input can only fail by overflowing.
    number.parse().unwrap_or(u64::MAX)
}

/// Truthiness of a JSON field: null, `""`, `0`, and `false` are absent.
fn is_present(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::Array(_) | Value::Object(_)) => true,
    }
}

/// String form of a scalar field; absent, empty, and composite values
/// become `None`.
fn text(value: Option<Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(true) => Some("true".to_owned()),
        _ => None,
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn numeric_value(value: Option<&Value>) -> u64 {
    match value {
        Some(Value::Number(n)) => n.as_u64().unwrap_or_else(|| {
            let f = n.as_f64().unwrap_or(0.0).floor();
            if f.is_finite() && f > 0.0 { f as u64 } else { 0 }
        }),
        Some(Value::String(s)) => parse_value(s),
        _ => 0,
    }
}

fn place_id(value: Option<&Value>) -> Option<u64> {
    let id = match value? {
        Value::Number(n) => n.as_u64()?,
        Value::String(s) => leading_integer(s),
        _ => return None,
    };
    (id != 0).then_some(id)
}
