use std::fmt;

use serde::{Deserialize, Serialize};

/// Seconds a workout state survives after its last write: 14 days.
pub const STATE_TTL_SECS: i64 = 14 * 24 * 60 * 60;

const STATE_KEY_PREFIX: &str = "workout-state:";
const API_KEY_KEY_PREFIX: &str = "api-key:";

// ---------------------------------------------------------------------------
// WorkoutCode
// ---------------------------------------------------------------------------

/// Opaque identifier of a workout. Any string is accepted, including the
/// empty string; the code is only ever used to derive storage keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkoutCode(String);

impl WorkoutCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Storage key of the code's [`WorkoutStateRecord`].
    pub fn state_key(&self) -> String {
        format!("{STATE_KEY_PREFIX}{}", self.0)
    }

    /// Storage key of the code's [`ApiKeyRecord`].
    pub fn api_key_key(&self) -> String {
        format!("{API_KEY_KEY_PREFIX}{}", self.0)
    }
}

impl From<String> for WorkoutCode {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for WorkoutCode {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for WorkoutCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for WorkoutCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// WorkoutState
// ---------------------------------------------------------------------------

/// The public state of a workout. Serializes to exactly
/// `{"startDateTime": "<string>"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkoutState {
    /// Timezone-aware ISO 8601 datetime, stored exactly as the client sent it.
    #[serde(rename = "startDateTime")]
    pub start_date_time: String,
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// A workout state as persisted in the cache table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkoutStateRecord {
    /// `workout-state:{workout_code}`.
    pub key: String,

    pub state: WorkoutState,

    /// Unix epoch seconds after which the table may drop the item.
    pub ttl: i64,
}

impl WorkoutStateRecord {
    /// Build the record for a write happening at `now` (epoch seconds).
    pub fn new(code: &WorkoutCode, state: WorkoutState, now: i64) -> Self {
        Self {
            key: code.state_key(),
            state,
            ttl: now + STATE_TTL_SECS,
        }
    }

    /// Whether the record is past its TTL at `now`, whether or not the
    /// table has swept it yet.
    pub fn is_expired(&self, now: i64) -> bool {
        self.ttl <= now
    }
}

/// The secret guarding writes to one workout code. Provisioned out-of-band.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiKeyRecord {
    /// `api-key:{workout_code}`.
    pub key: String,

    /// Missing attributes read as an empty key, which never authorizes.
    #[serde(default)]
    pub api_key: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Unix epoch seconds when the key was provisioned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
}

impl ApiKeyRecord {
    pub fn new(code: &WorkoutCode, api_key: impl Into<String>) -> Self {
        Self {
            key: code.api_key_key(),
            api_key: api_key.into(),
            description: None,
            created_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_storage_keys() {
        let code = WorkoutCode::new("morning-hiit");
        assert_eq!(code.state_key(), "workout-state:morning-hiit");
        assert_eq!(code.api_key_key(), "api-key:morning-hiit");
    }

    #[test]
    fn any_string_is_a_code() {
        assert_eq!(WorkoutCode::new("").state_key(), "workout-state:");
        assert_eq!(WorkoutCode::from("Ä b/c").api_key_key(), "api-key:Ä b/c");
    }

    #[test]
    fn record_ttl_is_fourteen_days_after_write() {
        let code = WorkoutCode::new("abc");
        let state = WorkoutState {
            start_date_time: "2025-01-01T00:00:00+00:00".into(),
        };
        let record = WorkoutStateRecord::new(&code, state, 1_000);
        assert_eq!(record.key, "workout-state:abc");
        assert_eq!(record.ttl, 1_000 + 1_209_600);
    }

    #[test]
    fn expiry_boundary() {
        let record = WorkoutStateRecord {
            key: "workout-state:abc".into(),
            state: WorkoutState {
                start_date_time: "2025-01-01T00:00:00Z".into(),
            },
            ttl: 2_000,
        };
        assert!(!record.is_expired(1_999));
        assert!(record.is_expired(2_000));
        assert!(record.is_expired(2_001));
    }

    #[test]
    fn state_serializes_with_camel_case_field() {
        let state = WorkoutState {
            start_date_time: "2025-01-01T00:00:00+00:00".into(),
        };
        assert_eq!(
            serde_json::to_value(&state).unwrap(),
            serde_json::json!({ "startDateTime": "2025-01-01T00:00:00+00:00" })
        );
    }

    #[test]
    fn api_key_record_tolerates_missing_key_attribute() {
        let record: ApiKeyRecord =
            serde_json::from_value(serde_json::json!({ "key": "api-key:abc" })).unwrap();
        assert_eq!(record.api_key, "");
        assert_eq!(record.description, None);
    }
}
