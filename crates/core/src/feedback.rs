//! User feedback on detection results.
//!
//! Feedback rows share the listing machinery with detections but carry a
//! correctness verdict, so they are the shape the tri-state correctness
//! filter applies to.

use serde::{Deserialize, Serialize};

use crate::detection::ImageRef;
use crate::types::{DbId, Timestamp};

/// One user verdict on a detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackRecord {
    pub id: DbId,
    /// Whether the user confirmed the detection as correct.
    pub is_correct: bool,
    pub comment: Option<String>,
    pub owner_id: Option<DbId>,
    pub owner_label: Option<String>,
    /// Species of the detection the feedback refers to, when joined in.
    pub species_name: Option<String>,
    pub confidence: Option<f64>,
    pub image_ref: Option<ImageRef>,
    pub created_at: Timestamp,
}
