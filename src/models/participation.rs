//! Participation model

use std::fmt;
use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use thiserror::Error;

/// Availability answer for one slot.
///
/// Persisted as the single-character symbols used on the response form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ParticipationStatus {
    Yes,
    Maybe,
    No,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Unknown participation status: {0}")]
pub struct UnknownStatus(pub String);

impl ParticipationStatus {
    pub const ALL: [ParticipationStatus; 3] = [
        ParticipationStatus::Yes,
        ParticipationStatus::Maybe,
        ParticipationStatus::No,
    ];

    /// Stored symbol
    pub fn symbol(self) -> &'static str {
        match self {
            ParticipationStatus::Yes => "○",
            ParticipationStatus::Maybe => "△",
            ParticipationStatus::No => "×",
        }
    }

    pub fn parse(value: &str) -> Result<Self, UnknownStatus> {
        match value.trim() {
            "○" | "yes" => Ok(ParticipationStatus::Yes),
            "△" | "maybe" => Ok(ParticipationStatus::Maybe),
            "×" | "no" => Ok(ParticipationStatus::No),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

impl fmt::Display for ParticipationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl TryFrom<String> for ParticipationStatus {
    type Error = UnknownStatus;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ParticipationStatus> for String {
    fn from(status: ParticipationStatus) -> Self {
        status.symbol().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participation {
    pub id: i64,
    pub event_id: i64,
    pub slot_id: i64,
    pub user_id: String,
    pub status: ParticipationStatus,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Raw participation row; the status column is text
#[derive(Debug, Clone, FromRow)]
pub struct ParticipationRow {
    pub id: i64,
    pub event_id: i64,
    pub slot_id: i64,
    pub user_id: String,
    pub status: String,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<ParticipationRow> for Participation {
    type Error = UnknownStatus;

    fn try_from(row: ParticipationRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            event_id: row.event_id,
            slot_id: row.slot_id,
            user_id: row.user_id,
            status: ParticipationStatus::parse(&row.status)?,
            comment: row.comment,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// One response in a participation submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotResponse {
    pub slot_id: i64,
    pub status: ParticipationStatus,
    #[serde(default)]
    pub comment: Option<String>,
}

impl SlotResponse {
    pub fn new(slot_id: i64, status: ParticipationStatus, comment: Option<&str>) -> Self {
        Self {
            slot_id,
            status,
            comment: comment.map(str::to_string),
        }
    }
}

/// A response that passed validation and is ready to be upserted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipationUpsert {
    pub slot_id: i64,
    pub status: ParticipationStatus,
    pub comment: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_symbols() {
        assert_eq!(ParticipationStatus::Yes.symbol(), "○");
        assert_eq!(ParticipationStatus::Maybe.symbol(), "△");
        assert_eq!(ParticipationStatus::No.symbol(), "×");
    }

    #[test]
    fn test_status_parse_accepts_words_and_symbols() {
        for status in ParticipationStatus::ALL {
            assert_eq!(ParticipationStatus::parse(status.symbol()), Ok(status));
        }
        assert_eq!(ParticipationStatus::parse("maybe"), Ok(ParticipationStatus::Maybe));
        assert!(ParticipationStatus::parse("?").is_err());
        assert!(ParticipationStatus::parse("").is_err());
    }

    #[test]
    fn test_status_serde() {
        let json = serde_json::to_string(&ParticipationStatus::Maybe).unwrap();
        assert_eq!(json, "\"△\"");

        let response: SlotResponse =
            serde_json::from_str(r#"{"slot_id": 3, "status": "yes"}"#).unwrap();
        assert_eq!(response.status, ParticipationStatus::Yes);
        assert_eq!(response.comment, None);

        assert!(serde_json::from_str::<SlotResponse>(r#"{"slot_id": 3, "status": "later"}"#).is_err());
    }
}
