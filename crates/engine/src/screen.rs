//! One list screen: a fixed paging mode, a pipeline, and a coordinator.

use std::sync::{Arc, Mutex, MutexGuard};

use entoscope_core::error::CoreError;
use entoscope_core::query::{PagingMode, ViewQuery};
use entoscope_core::source::RecordSource;
use tokio::sync::watch;

use crate::coordinator::{FetchState, RequestCoordinator};
use crate::pipeline::{DetectionPipeline, FeedbackPipeline, Pipeline};
use crate::session::SessionBus;

/// Detection history screen.
pub type DetectionScreen = Screen<DetectionPipeline>;

/// Feedback management screen.
pub type FeedbackScreen = Screen<FeedbackPipeline>;

/// Runs queries for one screen and owns its visible state.
///
/// The paging mode is chosen once at construction; queries built for the
/// other mode fail with [`CoreError::Validation`].
pub struct Screen<P: Pipeline> {
    source: Arc<dyn RecordSource>,
    mode: PagingMode,
    pipeline: P,
    coordinator: RequestCoordinator<P::View>,
    last_query: Mutex<Option<ViewQuery>>,
}

impl<P: Pipeline> Screen<P> {
    pub fn new(source: Arc<dyn RecordSource>, mode: PagingMode, pipeline: P) -> Self {
        Self {
            source,
            mode,
            pipeline,
            coordinator: RequestCoordinator::new(),
            last_query: Mutex::new(None),
        }
    }

    /// Forward auth rejections to `bus`.
    pub fn with_session(mut self, bus: Arc<SessionBus>) -> Self {
        self.coordinator = self.coordinator.with_session(bus);
        self
    }

    pub fn mode(&self) -> PagingMode {
        self.mode
    }

    /// A fresh query for this screen's mode, on page 1 with no filters.
    pub fn query(&self) -> ViewQuery {
        ViewQuery::new(self.mode)
    }

    /// The most recently dispatched query, if any.
    pub fn last_query(&self) -> Option<ViewQuery> {
        self.lock_last_query().clone()
    }

    /// Dispatch `query` and return the visible state once it settles.
    ///
    /// Concurrent calls are fine: only the last dispatched one can become
    /// visible.
    pub async fn run_query(&self, query: ViewQuery) -> FetchState<P::View> {
        *self.lock_last_query() = Some(query.clone());

        if query.mode != self.mode {
            let error = CoreError::Validation(format!(
                "{} query sent to a {} screen",
                query.mode.label(),
                self.mode.label()
            ));
            return self.coordinator.run(async { Err(error) }).await;
        }

        tracing::debug!(
            mode = self.mode.label(),
            page = query.page,
            page_size = query.page_size,
            "Running query",
        );
        let source = self.source.as_ref();
        self.coordinator
            .run(self.pipeline.execute(source, &query))
            .await
    }

    /// Re-dispatch the last query. Stays idle if nothing ran yet.
    pub async fn retry(&self) -> FetchState<P::View> {
        match self.last_query() {
            Some(query) => self.run_query(query).await,
            None => self.coordinator.state(),
        }
    }

    pub fn state(&self) -> FetchState<P::View> {
        self.coordinator.state()
    }

    pub fn subscribe(&self) -> watch::Receiver<FetchState<P::View>> {
        self.coordinator.subscribe()
    }

    /// Back to `Idle`; in-flight responses are discarded.
    pub fn reset(&self) {
        self.coordinator.reset();
    }

    /// The screen is going away. Nothing dispatched before or after this
    /// point will touch state again.
    pub fn abandon(&self) {
        self.coordinator.abandon();
    }

    fn lock_last_query(&self) -> MutexGuard<'_, Option<ViewQuery>> {
        self.last_query
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl DetectionScreen {
    pub fn detections(source: Arc<dyn RecordSource>, mode: PagingMode) -> Self {
        Self::new(source, mode, DetectionPipeline::default())
    }
}

impl FeedbackScreen {
    pub fn feedback(source: Arc<dyn RecordSource>, mode: PagingMode) -> Self {
        Self::new(source, mode, FeedbackPipeline)
    }
}
