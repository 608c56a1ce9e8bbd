//! The remote record source the pipelines read from.
//!
//! Implementations live outside this crate (an HTTP client, test fakes).
//! Records come back in whatever order the backing store provides.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::detection::DetectionRecord;
use crate::error::CoreError;
use crate::feedback::FeedbackRecord;
use crate::types::DbId;

/// Largest `limit` a list query may ask for.
pub const MAX_LIST_LIMIT: i64 = 1000;

// ---------------------------------------------------------------------------
// Query parameters
// ---------------------------------------------------------------------------

/// Parameters for listing detection records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ListQuery {
    pub skip: i64,
    pub limit: i64,
    pub owner_id: Option<DbId>,
    pub is_correct: Option<bool>,
}

impl ListQuery {
    /// Unfiltered slice of `limit` records after `skip`.
    pub fn page(skip: u64, limit: u64) -> Self {
        Self {
            skip: skip as i64,
            limit: limit as i64,
            ..Default::default()
        }
    }

    /// Forward an owner filter as `user_id`.
    pub fn with_owner(mut self, owner_id: Option<DbId>) -> Self {
        self.owner_id = owner_id;
        self
    }

    /// Forward a verdict filter as `is_correct`.
    pub fn with_correctness(mut self, is_correct: Option<bool>) -> Self {
        self.is_correct = is_correct;
        self
    }

    /// Reject negative `skip` and a `limit` outside `1..=MAX_LIST_LIMIT`.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.skip < 0 {
            return Err(CoreError::Validation(format!(
                "skip must be >= 0, got {}",
                self.skip
            )));
        }
        if !(1..=MAX_LIST_LIMIT).contains(&self.limit) {
            return Err(CoreError::Validation(format!(
                "limit must be between 1 and {MAX_LIST_LIMIT}, got {}",
                self.limit
            )));
        }
        Ok(())
    }
}

/// Parameters for the separate total-count query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CountQuery {
    pub owner_id: Option<DbId>,
}

/// Response of a count query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TotalCount {
    pub total: u64,
}

// ---------------------------------------------------------------------------
// RecordSource
// ---------------------------------------------------------------------------

/// Remote collaborator exposing paged listings and counts.
///
/// Identity is attached by whoever builds the implementation; a rejected
/// identity surfaces as [`CoreError::Auth`].
#[async_trait]
pub trait RecordSource: Send + Sync {
    async fn list_detections(&self, query: ListQuery) -> Result<Vec<DetectionRecord>, CoreError>;

    async fn count_detections(&self, query: CountQuery) -> Result<TotalCount, CoreError>;

    /// Authoritative per-image object counts. Missing keys mean unknown.
    async fn batch_object_counts(
        &self,
        image_ids: &[DbId],
    ) -> Result<HashMap<DbId, u64>, CoreError>;

    async fn list_feedback(&self, query: ListQuery) -> Result<Vec<FeedbackRecord>, CoreError>;

    async fn count_feedback(&self, query: CountQuery) -> Result<TotalCount, CoreError>;
}
