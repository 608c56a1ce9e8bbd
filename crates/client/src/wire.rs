//! JSON shapes returned by the dashboard API and their conversion into
//! core records.

use chrono::{DateTime, NaiveDateTime, Utc};
use entoscope_core::detection::{DetectionRecord, ImageRef};
use entoscope_core::feedback::FeedbackRecord;
use entoscope_core::types::{DbId, Timestamp};
use serde::{Deserialize, Deserializer, Serialize};

/// Species label used when a row carries none.
pub const UNKNOWN_SPECIES: &str = "unknown";

// ---------------------------------------------------------------------------
// Envelopes
// ---------------------------------------------------------------------------

/// A list endpoint answers either a bare array or `{ items, total }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ListBody<T> {
    Bare(Vec<T>),
    Paged {
        items: Vec<T>,
        #[serde(default)]
        total: Option<u64>,
    },
}

impl<T> ListBody<T> {
    pub fn into_items(self) -> Vec<T> {
        match self {
            ListBody::Bare(items) | ListBody::Paged { items, .. } => items,
        }
    }
}

/// `GET /feedback/stats/detailed`.
#[derive(Debug, Deserialize)]
pub struct FeedbackStats {
    #[serde(rename = "totalFeedback", default)]
    pub total_feedback: u64,
}

/// `GET /feedback/user/{id}`.
#[derive(Debug, Deserialize)]
pub struct UserFeedbackStats {
    #[serde(rename = "userFeedbackCount", default)]
    pub user_feedback_count: u64,
}

/// `GET /auth/me`. Only the id is read.
#[derive(Debug, Deserialize)]
pub struct CurrentUser {
    pub id: DbId,
}

/// Query string for list endpoints. `None` fields are left out.
#[derive(Debug, Serialize)]
pub struct ListParams {
    pub skip: i64,
    pub limit: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<DbId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_correct: Option<bool>,
}

// ---------------------------------------------------------------------------
// Rows
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct AccountRef {
    pub username: Option<String>,
}

/// One row of `GET /history/` or `GET /history/admin/all`.
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryRow {
    pub id: DbId,
    pub image_id: Option<DbId>,
    pub result_species: Option<String>,
    pub confidence: Option<f64>,
    #[serde(alias = "created_at", deserialize_with = "de_timestamp")]
    pub detected_at: Timestamp,
    pub account_id: Option<DbId>,
    pub account: Option<AccountRef>,
    pub image: Option<ImageRef>,
    pub object_count: Option<u64>,
    pub species_count: Option<u64>,
}

impl From<HistoryRow> for DetectionRecord {
    fn from(row: HistoryRow) -> Self {
        DetectionRecord {
            id: row.id,
            image_id: row.image_id,
            species_name: species_or_unknown(row.result_species),
            confidence: row.confidence.unwrap_or(0.0),
            detected_at: row.detected_at,
            owner_id: row.account_id,
            owner_label: row.account.and_then(|a| a.username),
            image_ref: row.image,
            object_count: row.object_count,
            species_count: row.species_count,
        }
    }
}

/// The detection a feedback row refers to, when joined in.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedbackHistoryRef {
    pub image_id: Option<DbId>,
    pub result_species: Option<String>,
    pub confidence: Option<f64>,
    pub image: Option<ImageRef>,
}

/// One row of `GET /feedback/all` or `GET /feedback/my-feedback`.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedbackRow {
    pub id: DbId,
    pub is_correct: bool,
    pub comment: Option<String>,
    pub account_id: Option<DbId>,
    pub account: Option<AccountRef>,
    pub history: Option<FeedbackHistoryRef>,
    #[serde(deserialize_with = "de_timestamp")]
    pub created_at: Timestamp,
}

impl From<FeedbackRow> for FeedbackRecord {
    fn from(row: FeedbackRow) -> Self {
        let history = row.history;
        FeedbackRecord {
            id: row.id,
            is_correct: row.is_correct,
            comment: row.comment.filter(|c| !c.trim().is_empty()),
            owner_id: row.account_id,
            owner_label: row.account.and_then(|a| a.username),
            species_name: history.as_ref().and_then(|h| h.result_species.clone()),
            confidence: history.as_ref().and_then(|h| h.confidence),
            image_ref: history.and_then(|h| h.image),
            created_at: row.created_at,
        }
    }
}

fn species_or_unknown(species: Option<String>) -> String {
    species
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| UNKNOWN_SPECIES.to_string())
}

/// Accept RFC 3339 timestamps and naive ISO 8601 ones (read as UTC).
fn de_timestamp<'de, D>(deserializer: D) -> Result<Timestamp, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp `{raw}`")))
}

pub fn parse_timestamp(raw: &str) -> Option<Timestamp> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}
