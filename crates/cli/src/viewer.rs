//! One-shot query runner behind the `entoscope` binary.

use std::sync::Arc;

use entoscope_client::HttpRecordSource;
use entoscope_core::error::CoreError;
use entoscope_engine::pipeline::{DetectionPipeline, PipelineOptions};
use entoscope_engine::{DetectionScreen, FeedbackScreen, FetchState, SessionBus, SessionEvent};
use reqwest::header::{HeaderMap, HeaderValue, InvalidHeaderValue, AUTHORIZATION};

use crate::config::{ViewKind, ViewerConfig};

#[derive(Debug, thiserror::Error)]
pub enum ViewerError {
    #[error("API token is not a valid header value: {0}")]
    InvalidToken(#[from] InvalidHeaderValue),

    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error(transparent)]
    Query(#[from] CoreError),

    #[error("Query did not settle")]
    Unsettled,

    #[error("Failed to encode view: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Build the HTTP client, attaching the bearer token when configured.
pub fn build_http_client(config: &ViewerConfig) -> Result<reqwest::Client, ViewerError> {
    let mut headers = HeaderMap::new();
    if let Some(token) = &config.api_token {
        let mut value = HeaderValue::from_str(&format!("Bearer {token}"))?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
    }

    let client = reqwest::Client::builder()
        .default_headers(headers)
        .timeout(config.client_config().timeout)
        .build()?;
    Ok(client)
}

/// Run the configured query once and return the view as JSON.
pub async fn run(config: &ViewerConfig) -> Result<serde_json::Value, ViewerError> {
    let client = build_http_client(config)?;
    let source = Arc::new(HttpRecordSource::with_client(client, config.client_config()));
    let session = Arc::new(SessionBus::default());
    let mut events = session.subscribe();

    tracing::info!(
        api_url = %config.api_url,
        mode = config.mode.label(),
        page = config.page,
        page_size = config.page_size,
        "Running query",
    );

    let result = match config.view {
        ViewKind::Detections => {
            let pipeline = DetectionPipeline::new(PipelineOptions {
                dedupe_by_id: config.dedupe,
                image_base_url: config.api_url.clone(),
                ..Default::default()
            });
            let screen = DetectionScreen::new(source, config.mode, pipeline)
                .with_session(session.clone());
            let query = screen
                .query()
                .with_filters(config.filters.clone())
                .with_page_size(config.page_size)
                .with_page(config.page);
            settle(screen.run_query(query).await)
                .and_then(|view| Ok(serde_json::to_value(&*view)?))
        }
        ViewKind::Feedback => {
            let screen =
                FeedbackScreen::feedback(source, config.mode).with_session(session.clone());
            let query = screen
                .query()
                .with_filters(config.filters.clone())
                .with_page_size(config.page_size)
                .with_page(config.page);
            settle(screen.run_query(query).await)
                .and_then(|view| Ok(serde_json::to_value(&*view)?))
        }
    };

    if let Ok(SessionEvent::AuthRejected { message }) = events.try_recv() {
        tracing::warn!(%message, "Session rejected, set ENTOSCOPE_API_TOKEN to a fresh token");
    }

    result
}

fn settle<T>(state: FetchState<T>) -> Result<Arc<T>, ViewerError> {
    match state {
        FetchState::Loaded { data, .. } => Ok(data),
        FetchState::Failed { error, .. } => Err(error.into()),
        FetchState::Idle | FetchState::Loading { .. } => Err(ViewerError::Unsettled),
    }
}
