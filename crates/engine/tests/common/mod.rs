//! Shared fixtures for engine integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::TimeZone;
use entoscope_core::detection::{DetectionRecord, ImageRef};
use entoscope_core::error::CoreError;
use entoscope_core::feedback::FeedbackRecord;
use entoscope_core::source::{CountQuery, ListQuery, RecordSource, TotalCount};
use entoscope_core::types::{DbId, Timestamp};
use tokio::sync::oneshot;

/// Base time for fixture records; each record is `id` minutes later.
pub fn at(minutes: i64) -> Timestamp {
    chrono::Utc
        .with_ymd_and_hms(2025, 3, 1, 8, 0, 0)
        .unwrap()
        + chrono::Duration::minutes(minutes)
}

pub fn detection(id: DbId, image_id: Option<DbId>, species: &str) -> DetectionRecord {
    DetectionRecord {
        id,
        image_id,
        species_name: species.to_string(),
        confidence: 0.875,
        detected_at: at(id),
        owner_id: Some(1),
        owner_label: Some("alice".to_string()),
        image_ref: Some(ImageRef {
            annotated_path: Some(format!("public\\annotated\\{}.jpg", image_id.unwrap_or(0))),
            original_path: None,
        }),
        object_count: None,
        species_count: None,
    }
}

pub fn owned_by(mut record: DetectionRecord, owner_id: DbId, label: &str) -> DetectionRecord {
    record.owner_id = Some(owner_id);
    record.owner_label = Some(label.to_string());
    record
}

pub fn feedback(id: DbId, is_correct: bool, comment: &str, owner_id: DbId) -> FeedbackRecord {
    FeedbackRecord {
        id,
        is_correct,
        comment: Some(comment.to_string()),
        owner_id: Some(owner_id),
        owner_label: Some(format!("user{owner_id}")),
        species_name: Some("Apis mellifera".to_string()),
        confidence: Some(0.8),
        image_ref: None,
        created_at: at(id),
    }
}

// ---------------------------------------------------------------------------
// MockSource
// ---------------------------------------------------------------------------

/// In-memory [`RecordSource`] that records the queries it receives.
///
/// `list_*` honours `skip`/`limit` and the owner/correctness parameters the
/// way a backend would; counts come from the configured totals.
#[derive(Default)]
pub struct MockSource {
    pub detections: Vec<DetectionRecord>,
    pub feedback: Vec<FeedbackRecord>,
    /// Overrides the detection count; defaults to the number of rows.
    pub detection_total: Option<u64>,
    pub object_counts: HashMap<DbId, u64>,
    pub fail_list: Mutex<Option<CoreError>>,
    pub fail_batch: AtomicBool,
    pub list_calls: Mutex<Vec<ListQuery>>,
    pub count_calls: AtomicUsize,
    pub batch_calls: Mutex<Vec<Vec<DbId>>>,
}

impl MockSource {
    pub fn with_detections(detections: Vec<DetectionRecord>) -> Self {
        Self {
            detections,
            ..Default::default()
        }
    }

    pub fn with_feedback(feedback: Vec<FeedbackRecord>) -> Self {
        Self {
            feedback,
            ..Default::default()
        }
    }

    /// Make every later `list_*` call fail with `error`.
    pub fn fail_lists_with(&self, error: CoreError) {
        *self.fail_list.lock().unwrap() = Some(error);
    }

    fn list_failure(&self) -> Option<CoreError> {
        self.fail_list.lock().unwrap().clone()
    }

    pub fn list_calls(&self) -> Vec<ListQuery> {
        self.list_calls.lock().unwrap().clone()
    }

    pub fn batch_calls(&self) -> Vec<Vec<DbId>> {
        self.batch_calls.lock().unwrap().clone()
    }

    fn window<T: Clone>(rows: Vec<T>, query: ListQuery) -> Vec<T> {
        rows.into_iter()
            .skip(query.skip as usize)
            .take(query.limit as usize)
            .collect()
    }
}

#[async_trait]
impl RecordSource for MockSource {
    async fn list_detections(&self, query: ListQuery) -> Result<Vec<DetectionRecord>, CoreError> {
        self.list_calls.lock().unwrap().push(query);
        if let Some(e) = self.list_failure() {
            return Err(e);
        }
        let rows: Vec<_> = self
            .detections
            .iter()
            .filter(|r| query.owner_id.is_none() || r.owner_id == query.owner_id)
            .cloned()
            .collect();
        Ok(Self::window(rows, query))
    }

    async fn count_detections(&self, query: CountQuery) -> Result<TotalCount, CoreError> {
        self.count_calls.fetch_add(1, Ordering::SeqCst);
        let total = match self.detection_total {
            Some(total) => total,
            None => self
                .detections
                .iter()
                .filter(|r| query.owner_id.is_none() || r.owner_id == query.owner_id)
                .count() as u64,
        };
        Ok(TotalCount { total })
    }

    async fn batch_object_counts(
        &self,
        image_ids: &[DbId],
    ) -> Result<HashMap<DbId, u64>, CoreError> {
        self.batch_calls.lock().unwrap().push(image_ids.to_vec());
        if self.fail_batch.load(Ordering::SeqCst) {
            return Err(CoreError::Server {
                status: 500,
                message: "object counts unavailable".into(),
            });
        }
        Ok(image_ids
            .iter()
            .filter_map(|id| self.object_counts.get(id).map(|c| (*id, *c)))
            .collect())
    }

    async fn list_feedback(&self, query: ListQuery) -> Result<Vec<FeedbackRecord>, CoreError> {
        self.list_calls.lock().unwrap().push(query);
        if let Some(e) = self.list_failure() {
            return Err(e);
        }
        let rows: Vec<_> = self
            .feedback
            .iter()
            .filter(|r| query.owner_id.is_none() || r.owner_id == query.owner_id)
            .filter(|r| query.is_correct.is_none() || Some(r.is_correct) == query.is_correct)
            .cloned()
            .collect();
        Ok(Self::window(rows, query))
    }

    async fn count_feedback(&self, query: CountQuery) -> Result<TotalCount, CoreError> {
        self.count_calls.fetch_add(1, Ordering::SeqCst);
        let total = self
            .feedback
            .iter()
            .filter(|r| query.owner_id.is_none() || r.owner_id == query.owner_id)
            .count() as u64;
        Ok(TotalCount { total })
    }
}

// ---------------------------------------------------------------------------
// GatedSource
// ---------------------------------------------------------------------------

/// Wraps a [`MockSource`] so each `list_detections` call waits for its own
/// gate, letting a test decide the order responses arrive in.
pub struct GatedSource {
    pub inner: MockSource,
    gates: Mutex<VecDeque<oneshot::Receiver<()>>>,
}

impl GatedSource {
    pub fn new(inner: MockSource) -> Self {
        Self {
            inner,
            gates: Mutex::new(VecDeque::new()),
        }
    }

    /// Queue a gate for the next list call; send on the returned half to
    /// release it.
    pub fn gate(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().unwrap().push_back(rx);
        tx
    }
}

#[async_trait]
impl RecordSource for GatedSource {
    async fn list_detections(&self, query: ListQuery) -> Result<Vec<DetectionRecord>, CoreError> {
        let gate = self.gates.lock().unwrap().pop_front();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        self.inner.list_detections(query).await
    }

    async fn count_detections(&self, query: CountQuery) -> Result<TotalCount, CoreError> {
        self.inner.count_detections(query).await
    }

    async fn batch_object_counts(
        &self,
        image_ids: &[DbId],
    ) -> Result<HashMap<DbId, u64>, CoreError> {
        self.inner.batch_object_counts(image_ids).await
    }

    async fn list_feedback(&self, query: ListQuery) -> Result<Vec<FeedbackRecord>, CoreError> {
        self.inner.list_feedback(query).await
    }

    async fn count_feedback(&self, query: CountQuery) -> Result<TotalCount, CoreError> {
        self.inner.count_feedback(query).await
    }
}
