//! REST client for the dashboard's history and feedback endpoints.
//!
//! Identity is whatever the injected [`reqwest::Client`] carries (e.g. a
//! default `Authorization` header); this module never touches credentials.

use std::collections::HashMap;

use async_trait::async_trait;
use entoscope_core::detection::DetectionRecord;
use entoscope_core::error::CoreError;
use entoscope_core::feedback::FeedbackRecord;
use entoscope_core::source::{CountQuery, ListQuery, RecordSource, TotalCount};
use entoscope_core::types::DbId;

use crate::config::{ClientConfig, HistoryScope};
use crate::wire::{
    CurrentUser, FeedbackRow, FeedbackStats, HistoryRow, ListBody, ListParams, UserFeedbackStats,
};

/// Errors from the HTTP layer, before classification into [`CoreError`].
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    /// The request itself failed (connect, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// A 2xx response arrived but its body did not match the expected shape.
    #[error("Malformed response ({status}): {message}")]
    Decode { status: u16, message: String },

    /// The API returned a non-2xx status code.
    #[error("API error ({status}): {body}")]
    Status { status: u16, body: String },
}

impl From<HttpError> for CoreError {
    fn from(err: HttpError) -> Self {
        match err {
            HttpError::Request(e) => CoreError::Network(e.to_string()),
            HttpError::Status { status, body } => CoreError::from_status(status, body),
            HttpError::Decode { status, message } => CoreError::Server { status, message },
        }
    }
}

/// [`RecordSource`] backed by the dashboard REST API.
pub struct HttpRecordSource {
    client: reqwest::Client,
    config: ClientConfig,
}

impl HttpRecordSource {
    /// Build a source with a fresh client honouring `config.timeout`.
    pub fn new(config: ClientConfig) -> Result<Self, HttpError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self { client, config })
    }

    /// Reuse an existing client, typically one with auth headers preset.
    pub fn with_client(client: reqwest::Client, config: ClientConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    async fn get_list<R, T>(&self, path: &str, params: &ListParams) -> Result<Vec<T>, HttpError>
    where
        R: serde::de::DeserializeOwned,
        T: From<R>,
    {
        let response = self.client.get(self.url(path)).query(params).send().await?;
        let body: ListBody<R> = Self::parse_response(response).await?;
        Ok(body.into_items().into_iter().map(T::from).collect())
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, HttpError> {
        let response = self.client.get(self.url(path)).send().await?;
        Self::parse_response(response).await
    }

    // ---- private helpers ----

    /// Pass through a 2xx response, otherwise capture its status and body.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, HttpError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(HttpError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, HttpError> {
        let response = Self::ensure_success(response).await?;
        let status = response.status().as_u16();
        response.json::<T>().await.map_err(|e| {
            if e.is_decode() {
                HttpError::Decode {
                    status,
                    message: e.to_string(),
                }
            } else {
                HttpError::Request(e)
            }
        })
    }

    /// Owner a count is scoped to. In `Mine` scope this is always the
    /// caller: the filter's owner, the configured account, or whoever the
    /// session belongs to.
    async fn count_owner(&self, owner_id: Option<DbId>) -> Result<Option<DbId>, HttpError> {
        if self.config.scope == HistoryScope::All {
            return Ok(owner_id);
        }
        if let Some(id) = owner_id.or(self.config.account_id) {
            return Ok(Some(id));
        }
        let me: CurrentUser = self.get_json("/auth/me").await?;
        tracing::debug!(account_id = me.id, "Resolved session account");
        Ok(Some(me.id))
    }
}

#[async_trait]
impl RecordSource for HttpRecordSource {
    async fn list_detections(&self, query: ListQuery) -> Result<Vec<DetectionRecord>, CoreError> {
        query.validate()?;
        let path = match self.config.scope {
            HistoryScope::Mine => "/history/",
            HistoryScope::All => "/history/admin/all",
        };
        let params = ListParams {
            skip: query.skip,
            limit: query.limit,
            user_id: query.owner_id,
            is_correct: None,
        };
        tracing::debug!(path, skip = query.skip, limit = query.limit, "Listing detections");
        Ok(self.get_list::<HistoryRow, _>(path, &params).await?)
    }

    async fn count_detections(&self, query: CountQuery) -> Result<TotalCount, CoreError> {
        let owner_id = self.count_owner(query.owner_id).await?;
        let mut request = self.client.get(self.url("/history/count"));
        if let Some(owner_id) = owner_id {
            request = request.query(&[("user_id", owner_id)]);
        }
        let response = request.send().await.map_err(HttpError::from)?;
        Ok(Self::parse_response::<TotalCount>(response).await?)
    }

    async fn batch_object_counts(
        &self,
        image_ids: &[DbId],
    ) -> Result<HashMap<DbId, u64>, CoreError> {
        if image_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let response = self
            .client
            .post(self.url("/history/object-counts"))
            .json(image_ids)
            .send()
            .await
            .map_err(HttpError::from)?;
        Ok(Self::parse_response::<HashMap<DbId, u64>>(response).await?)
    }

    async fn list_feedback(&self, query: ListQuery) -> Result<Vec<FeedbackRecord>, CoreError> {
        query.validate()?;
        let path = match self.config.scope {
            HistoryScope::Mine => "/feedback/my-feedback",
            HistoryScope::All => "/feedback/all",
        };
        let params = ListParams {
            skip: query.skip,
            limit: query.limit,
            user_id: query.owner_id,
            is_correct: query.is_correct,
        };
        tracing::debug!(path, skip = query.skip, limit = query.limit, "Listing feedback");
        Ok(self.get_list::<FeedbackRow, _>(path, &params).await?)
    }

    async fn count_feedback(&self, query: CountQuery) -> Result<TotalCount, CoreError> {
        let owner_id = self.count_owner(query.owner_id).await?;
        let total = match owner_id {
            Some(owner_id) => {
                self.get_json::<UserFeedbackStats>(&format!("/feedback/user/{owner_id}"))
                    .await?
                    .user_feedback_count
            }
            None => {
                self.get_json::<FeedbackStats>("/feedback/stats/detailed")
                    .await?
                    .total_feedback
            }
        };
        Ok(TotalCount { total })
    }
}
