//! Record types held by the store.
//!
//! A [`Candidate`] is what the request surface hands to
//! [`RecordStore::insert`](crate::store::RecordStore::insert) after
//! validating required fields. The store stamps it with an id and the
//! insertion/expiry times to produce an immutable [`Record`].

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::value::format_value;

/// Sentinel for absent descriptive fields.
pub const UNKNOWN: &str = "Unknown";

/// Sentinel for an absent player count.
pub const NOT_AVAILABLE: &str = "N/A";

/// Identifier of a stored record.
///
/// Derived from the insertion time in epoch milliseconds and the job ID
/// (`"{millis}-{jobId}"`). When that id is already held by a stored
/// record, the store appends the smallest free `-{n}` suffix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Build the base identifier for a record.
    pub fn derive(inserted_at: DateTime<Utc>, job_id: &str) -> Self {
        Self(format!("{}-{job_id}", inserted_at.timestamp_millis()))
    }

    /// Append a disambiguating sequence number.
    #[must_use]
    pub fn with_sequence(&self, sequence: u64) -> Self {
        Self(format!("{}-{sequence}", self.0))
    }

    /// Borrow the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for RecordId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// An event ready for insertion.
///
/// `display_name` and `job_id` are required and must already be
/// validated. Optional fields left as `None` (or empty) are normalized to
/// their sentinels when the record is created.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Candidate {
    /// Name of the discovered item.
    pub display_name: String,
    /// Integer magnitude of the reported value.
    pub value: u64,
    /// Client-supplied display string for `value`.
    pub value_formatted: Option<String>,
    /// Mutation descriptor.
    pub mutation: Option<String>,
    /// Rarity descriptor.
    pub rarity: Option<String>,
    /// Player count as reported by the client (e.g. `"5/8"`).
    pub players: Option<String>,
    /// External job (server instance) identifier. Not unique.
    pub job_id: String,
    /// External place identifier.
    pub place_id: Option<u64>,
    /// Opaque teleport payload, passed through unmodified.
    pub teleport_script: Option<String>,
}

impl Candidate {
    /// Create a candidate with the required fields and no optional data.
    pub fn new(display_name: impl Into<String>, job_id: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            job_id: job_id.into(),
            ..Self::default()
        }
    }

    /// Set the numeric value.
    #[must_use]
    pub const fn with_value(mut self, value: u64) -> Self {
        self.value = value;
        self
    }
}

/// A stored observation. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    /// Unique identifier, stable for the record's lifetime.
    pub id: RecordId,
    /// Name of the discovered item.
    pub display_name: String,
    /// Integer magnitude of the reported value.
    pub value: u64,
    /// Display string for `value`.
    pub value_formatted: String,
    /// Mutation descriptor, `"Unknown"` when absent.
    pub mutation: String,
    /// Rarity descriptor, `"Unknown"` when absent.
    pub rarity: String,
    /// Player count, `"N/A"` when absent.
    pub players: String,
    /// External job identifier.
    pub job_id: String,
    /// External place identifier.
    pub place_id: Option<u64>,
    /// Opaque teleport payload.
    pub teleport_script: Option<String>,
    /// Insertion time.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub inserted_at: DateTime<Utc>,
    /// Fixed expiry time (`inserted_at + ttl`).
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub expires_at: DateTime<Utc>,
}

impl Record {
    /// Build a record from a candidate, normalizing absent fields.
    pub(crate) fn from_candidate(
        candidate: Candidate,
        id: RecordId,
        inserted_at: DateTime<Utc>,
        ttl: TimeDelta,
    ) -> Self {
        let value_formatted = non_empty(candidate.value_formatted)
            .unwrap_or_else(|| format_value(candidate.value));

        Self {
            id,
            display_name: candidate.display_name,
            value: candidate.value,
            value_formatted,
            mutation: or_sentinel(candidate.mutation, UNKNOWN),
            rarity: or_sentinel(candidate.rarity, UNKNOWN),
            players: or_sentinel(candidate.players, NOT_AVAILABLE),
            job_id: candidate.job_id,
            place_id: candidate.place_id,
            teleport_script: non_empty(candidate.teleport_script),
            inserted_at,
            expires_at: inserted_at
                .checked_add_signed(ttl)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        }
    }

    /// Whether the record is still active at `now`.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn or_sentinel(value: Option<String>, sentinel: &str) -> String {
    non_empty(value).unwrap_or_else(|| sentinel.to_owned())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn at(millis: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(millis).unwrap()
    }

    #[test]
    fn id_combines_time_and_job() {
        let id = RecordId::derive(at(1_700_000_000_123), "job-abc");
        assert_eq!(id.as_str(), "1700000000123-job-abc");
        assert_eq!(id.with_sequence(2).to_string(), "1700000000123-job-abc-2");
    }

    #[test]
    fn absent_fields_get_sentinels() {
        let candidate = Candidate {
            mutation: Some(String::new()),
            ..Candidate::new("Tralalero", "job-1").with_value(2_500)
        };
        let record = Record::from_candidate(
            candidate,
            RecordId::derive(at(0), "job-1"),
            at(0),
            TimeDelta::milliseconds(1_000),
        );

        assert_eq!(record.mutation, UNKNOWN);
        assert_eq!(record.rarity, UNKNOWN);
        assert_eq!(record.players, NOT_AVAILABLE);
        assert_eq!(record.value_formatted, "$2.5K/s");
        assert_eq!(record.teleport_script, None);
        assert_eq!(record.expires_at, at(1_000));
    }

    #[test]
    fn supplied_fields_pass_through() {
        let candidate = Candidate {
            value_formatted: Some("$2.4K/s".to_owned()),
            rarity: Some("Secret".to_owned()),
            players: Some("3/8".to_owned()),
            place_id: Some(109_983_668_079_237),
            teleport_script: Some("game:GetService(\"TeleportService\")".to_owned()),
            ..Candidate::new("Tralalero", "job-1").with_value(2_500)
        };
        let record = Record::from_candidate(
            candidate,
            RecordId::derive(at(0), "job-1"),
            at(0),
            TimeDelta::milliseconds(1_000),
        );

        assert_eq!(record.value_formatted, "$2.4K/s");
        assert_eq!(record.rarity, "Secret");
        assert_eq!(record.players, "3/8");
        assert_eq!(record.place_id, Some(109_983_668_079_237));
        assert!(record.teleport_script.is_some());
    }

    #[test]
    fn activity_boundary_is_exclusive() {
        let record = Record::from_candidate(
            Candidate::new("a", "j"),
            RecordId::derive(at(0), "j"),
            at(0),
            TimeDelta::milliseconds(10),
        );
        assert!(record.is_active_at(at(9)));
        assert!(!record.is_active_at(at(10)));
    }

    #[test]
    fn serializes_camel_case_millis() {
        let record = Record::from_candidate(
            Candidate::new("a", "j"),
            RecordId::derive(at(5), "j"),
            at(5),
            TimeDelta::milliseconds(10),
        );
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["id"], "5-j");
        assert_eq!(json["displayName"], "a");
        assert_eq!(json["jobId"], "j");
        assert_eq!(json["insertedAt"], 5);
        assert_eq!(json["expiresAt"], 15);
        assert!(json["placeId"].is_null());
    }
}
