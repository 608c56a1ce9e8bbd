//! View models handed to list/grid/table UIs.

use entoscope_core::aggregate::ImageAggregate;
use entoscope_core::feedback::FeedbackRecord;
use entoscope_core::paginate::PageWindow;
use entoscope_core::title::{aggregate_title, derive_badge};
use entoscope_core::types::{DbId, Timestamp};
use serde::Serialize;

/// One image tile or table row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageCard {
    pub image_id: DbId,
    pub title: String,
    /// Every distinct species, comma separated.
    pub species_summary: String,
    pub total_objects: u64,
    pub unique_species_count: u64,
    pub confidence_percent: String,
    pub detected_at: Timestamp,
    pub owner_label: String,
    pub image_url: String,
    pub badge: Option<String>,
    /// Detection event id of the representative record.
    pub detection_id: DbId,
}

impl ImageCard {
    pub fn from_aggregate(agg: &ImageAggregate, image_base_url: &str) -> Self {
        let rep = &agg.representative;
        Self {
            image_id: agg.image_id,
            title: aggregate_title(agg),
            species_summary: agg.species_summary(),
            total_objects: agg.total_objects,
            unique_species_count: agg.unique_species_count,
            confidence_percent: rep.confidence_percent(),
            detected_at: rep.detected_at,
            owner_label: rep.display_owner().to_string(),
            image_url: rep.image_url(image_base_url),
            badge: derive_badge(agg.unique_species_count, agg.total_objects),
            detection_id: rep.id,
        }
    }
}

/// Bookkeeping for one detection pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PipelineReport {
    /// Raw records returned by the list query.
    pub fetched_records: usize,
    /// Records removed by the dedup-by-id pre-pass.
    pub duplicates_removed: usize,
    /// Records skipped for lacking an image id.
    pub dropped_without_image: usize,
    /// Aggregates fetched but hidden by local filters.
    pub hidden_by_filters: usize,
    pub backfill: BackfillOutcome,
}

/// What happened to the object-count backfill.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BackfillOutcome {
    /// Not attempted: client-paged mode, disabled, or every image had hints.
    #[default]
    Skipped,
    /// Remote counts applied to `images` aggregates.
    Applied { images: usize },
    /// The batch call failed; local counts were kept.
    Degraded { error: String },
}

/// Output of a detection query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectionView {
    /// Visible aggregates with their page bookkeeping.
    pub window: PageWindow<ImageAggregate>,
    /// One card per item in `window.items`, same order.
    pub cards: Vec<ImageCard>,
    pub report: PipelineReport,
}

/// Output of a feedback query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedbackView {
    pub window: PageWindow<FeedbackRecord>,
    pub fetched_records: usize,
    pub hidden_by_filters: usize,
}
