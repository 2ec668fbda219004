//! Core registry data models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier embedded in a deep link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PayloadId(i64);

impl PayloadId {
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for PayloadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for PayloadId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

/// Error returned when a string is not a valid payload id
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid payload id: {0:?}")]
pub struct ParsePayloadIdError(pub String);

impl FromStr for PayloadId {
    type Err = ParsePayloadIdError;

    /// Accepts ASCII digits only: no sign, no whitespace.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ParsePayloadIdError(s.to_string()));
        }
        s.parse::<i64>()
            .map(PayloadId)
            .map_err(|_| ParsePayloadIdError(s.to_string()))
    }
}

/// A registered video: payload id -> opaque resource reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoRecord {
    pub payload_id: PayloadId,
    /// Opaque handle supplied by the chat transport (e.g. a file id)
    pub resource_ref: String,
    pub created_at: DateTime<Utc>,
}

impl VideoRecord {
    pub fn new(payload_id: PayloadId, resource_ref: impl Into<String>) -> Self {
        Self {
            payload_id,
            resource_ref: resource_ref.into(),
            created_at: Utc::now(),
        }
    }
}

/// Access log row as persisted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessLogEntry {
    /// Log sequence, assigned by the store
    pub id: i64,
    pub requester_id: i64,
    /// Need not reference a live video
    pub payload_id: PayloadId,
    pub accessed_at: DateTime<Utc>,
}

/// Access log row before the store assigns its sequence id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAccessLogEntry {
    pub requester_id: i64,
    pub payload_id: PayloadId,
    pub accessed_at: DateTime<Utc>,
}

impl NewAccessLogEntry {
    pub fn now(requester_id: i64, payload_id: PayloadId) -> Self {
        Self {
            requester_id,
            payload_id,
            accessed_at: Utc::now(),
        }
    }
}

/// Outcome of a lookup; not finding a video is an expected result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "resource_ref", rename_all = "snake_case")]
pub enum Resolution {
    Found(String),
    NotFound,
}

impl Resolution {
    pub fn is_found(&self) -> bool {
        matches!(self, Resolution::Found(_))
    }

    pub fn into_resource_ref(self) -> Option<String> {
        match self {
            Resolution::Found(r) => Some(r),
            Resolution::NotFound => None,
        }
    }
}
