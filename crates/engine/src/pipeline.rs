//! Record Source -> Aggregator -> Filter Engine -> Paginator -> view model.
//!
//! Each pipeline has one branch per [`PagingMode`]; the branches never share
//! counting logic so their notions of "total" stay distinct.

use async_trait::async_trait;
use entoscope_core::aggregate::{aggregate_with_report, dedup_by_id, ImageAggregate};
use entoscope_core::detection::DetectionRecord;
use entoscope_core::error::CoreError;
use entoscope_core::filter::{apply_client_filters, apply_text_filter};
use entoscope_core::paginate::{paginate, paginate_remote, PageTotal, PageWindow};
use entoscope_core::query::{PagingMode, ViewQuery};
use entoscope_core::source::{CountQuery, ListQuery, RecordSource};
use entoscope_core::types::DbId;

use crate::view::{BackfillOutcome, DetectionView, FeedbackView, ImageCard, PipelineReport};

/// Base URL images are served from when none is configured.
pub const DEFAULT_IMAGE_BASE_URL: &str = "http://localhost:8000";

// ---------------------------------------------------------------------------
// Pipeline trait
// ---------------------------------------------------------------------------

/// One query pipeline, run by a [`Screen`](crate::screen::Screen).
#[async_trait]
pub trait Pipeline: Send + Sync {
    type View: Clone + Send + Sync;

    async fn execute(
        &self,
        source: &dyn RecordSource,
        query: &ViewQuery,
    ) -> Result<Self::View, CoreError>;
}

/// Per-screen switches for the detection pipeline.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Run [`dedup_by_id`] before aggregating.
    pub dedupe_by_id: bool,
    /// Ask the source for authoritative object counts in server-paged mode.
    pub backfill_object_counts: bool,
    /// Prefix for resolving image paths into URLs.
    pub image_base_url: String,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            dedupe_by_id: false,
            backfill_object_counts: true,
            image_base_url: DEFAULT_IMAGE_BASE_URL.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Detections
// ---------------------------------------------------------------------------

/// Detection history pipeline producing [`DetectionView`]s.
#[derive(Debug, Clone, Default)]
pub struct DetectionPipeline {
    pub options: PipelineOptions,
}

impl DetectionPipeline {
    pub fn new(options: PipelineOptions) -> Self {
        Self { options }
    }
}

#[async_trait]
impl Pipeline for DetectionPipeline {
    type View = DetectionView;

    async fn execute(
        &self,
        source: &dyn RecordSource,
        query: &ViewQuery,
    ) -> Result<DetectionView, CoreError> {
        match query.mode {
            PagingMode::ServerPaged => run_server_paged(source, query, &self.options).await,
            PagingMode::ClientPaged { fetch_limit } => {
                run_client_paged(source, query, fetch_limit, &self.options).await
            }
        }
    }
}

/// Aggregate one server page; the window's totals come from the count query.
async fn run_server_paged(
    source: &dyn RecordSource,
    query: &ViewQuery,
    options: &PipelineOptions,
) -> Result<DetectionView, CoreError> {
    let owner_id = query.filters.owner.as_param();
    let is_correct = query.filters.correctness.as_param();

    let known_total = source.count_detections(CountQuery { owner_id }).await?.total;
    tracing::debug!(known_total, page = query.page, "Fetching server page");

    let raw = paginate_remote(
        |skip, limit| {
            let list = ListQuery::page(skip, limit)
                .with_owner(owner_id)
                .with_correctness(is_correct);
            async move {
                match list.validate() {
                    Ok(()) => source.list_detections(list).await,
                    Err(e) => Err(e),
                }
            }
        },
        query.page,
        query.page_size,
        known_total,
    )
    .await?;

    let mut report = PipelineReport {
        fetched_records: raw.items.len(),
        ..Default::default()
    };

    let window = raw.map_items(|records| build_aggregates(records, options, &mut report));

    // Only images left visible by the text filter are backfilled.
    let before = window.items.len();
    let mut window = window.map_items(|aggs| apply_text_filter(aggs, &query.filters));
    report.hidden_by_filters = before - window.items.len();

    if options.backfill_object_counts {
        report.backfill = backfill_object_counts(source, &mut window.items).await;
    }

    Ok(finish(window, report, options))
}

/// Fetch a bounded recent window once, filter everything locally, then slice.
async fn run_client_paged(
    source: &dyn RecordSource,
    query: &ViewQuery,
    fetch_limit: u64,
    options: &PipelineOptions,
) -> Result<DetectionView, CoreError> {
    let list = ListQuery::page(0, fetch_limit);
    list.validate()?;
    let records = source.list_detections(list).await?;

    let mut report = PipelineReport {
        fetched_records: records.len(),
        ..Default::default()
    };

    let aggregates = build_aggregates(records, options, &mut report);
    let before = aggregates.len();
    let filtered = apply_client_filters(aggregates, &query.filters);
    report.hidden_by_filters = before - filtered.len();

    let window = paginate(&filtered, query.page, query.page_size);
    Ok(finish(window, report, options))
}

/// Optional dedup, aggregation, and record-level count hints.
fn build_aggregates(
    records: Vec<DetectionRecord>,
    options: &PipelineOptions,
    report: &mut PipelineReport,
) -> Vec<ImageAggregate> {
    let records = if options.dedupe_by_id {
        let (kept, removed) = dedup_by_id(records);
        report.duplicates_removed = removed;
        kept
    } else {
        records
    };

    let aggregation = aggregate_with_report(&records);
    report.dropped_without_image = aggregation.dropped_without_image;

    let mut aggregates = aggregation.aggregates;
    for agg in &mut aggregates {
        let (objects, species) = (
            agg.representative.object_count,
            agg.representative.species_count,
        );
        agg.apply_count_hints(objects, species);
    }
    aggregates
}

/// Replace page-local object counts with remote per-image counts.
///
/// Aggregates whose representative already carries an `object_count` hint
/// are left alone. A failed batch call keeps the local counts.
async fn backfill_object_counts(
    source: &dyn RecordSource,
    aggregates: &mut [ImageAggregate],
) -> BackfillOutcome {
    let wanted: Vec<DbId> = aggregates
        .iter()
        .filter(|a| a.representative.object_count.is_none())
        .map(|a| a.image_id)
        .collect();

    if wanted.is_empty() {
        return BackfillOutcome::Skipped;
    }

    match source.batch_object_counts(&wanted).await {
        Ok(counts) => {
            let mut images = 0;
            for agg in aggregates.iter_mut() {
                if agg.representative.object_count.is_some() {
                    continue;
                }
                if let Some(&count) = counts.get(&agg.image_id) {
                    agg.set_remote_object_count(count);
                    images += 1;
                }
            }
            BackfillOutcome::Applied { images }
        }
        Err(e) => {
            tracing::warn!(
                error = %e,
                images = wanted.len(),
                "Object count backfill failed, keeping local counts",
            );
            BackfillOutcome::Degraded {
                error: e.to_string(),
            }
        }
    }
}

fn finish(
    window: PageWindow<ImageAggregate>,
    report: PipelineReport,
    options: &PipelineOptions,
) -> DetectionView {
    let cards = window
        .items
        .iter()
        .map(|agg| ImageCard::from_aggregate(agg, &options.image_base_url))
        .collect();
    DetectionView {
        window,
        cards,
        report,
    }
}

// ---------------------------------------------------------------------------
// Feedback
// ---------------------------------------------------------------------------

/// Feedback listing pipeline producing [`FeedbackView`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeedbackPipeline;

#[async_trait]
impl Pipeline for FeedbackPipeline {
    type View = FeedbackView;

    async fn execute(
        &self,
        source: &dyn RecordSource,
        query: &ViewQuery,
    ) -> Result<FeedbackView, CoreError> {
        let owner_id = query.filters.owner.as_param();

        let (window, fetched_records) = match query.mode {
            PagingMode::ServerPaged => {
                let is_correct = query.filters.correctness.as_param();
                let known_total = source.count_feedback(CountQuery { owner_id }).await?.total;
                let raw = paginate_remote(
                    |skip, limit| {
                        let list = ListQuery::page(skip, limit)
                            .with_owner(owner_id)
                            .with_correctness(is_correct);
                        async move {
                            match list.validate() {
                                Ok(()) => source.list_feedback(list).await,
                                Err(e) => Err(e),
                            }
                        }
                    },
                    query.page,
                    query.page_size,
                    known_total,
                )
                .await?;
                let fetched = raw.items.len();
                (raw.map_items(|items| apply_text_filter(items, &query.filters)), fetched)
            }
            PagingMode::ClientPaged { fetch_limit } => {
                let list = ListQuery::page(0, fetch_limit);
                list.validate()?;
                let records = source.list_feedback(list).await?;
                let fetched = records.len();
                let filtered = apply_client_filters(records, &query.filters);
                (paginate(&filtered, query.page, query.page_size), fetched)
            }
        };

        let hidden_by_filters = match window.total {
            PageTotal::Filtered { total_items } => {
                fetched_records.saturating_sub(total_items as usize)
            }
            PageTotal::ServerKnown { .. } => {
                fetched_records - window.items.len()
            }
        };

        Ok(FeedbackView {
            window,
            fetched_records,
            hidden_by_filters,
        })
    }
}
