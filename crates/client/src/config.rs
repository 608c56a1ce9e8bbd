//! Client settings.

use std::str::FromStr;
use std::time::Duration;

use entoscope_core::types::DbId;

/// Default base URL of the dashboard API.
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Default HTTP timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Which listing endpoints to read from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HistoryScope {
    /// The caller's own history and feedback.
    #[default]
    Mine,
    /// Every account's records (admin endpoints).
    All,
}

impl FromStr for HistoryScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mine" => Ok(HistoryScope::Mine),
            "all" => Ok(HistoryScope::All),
            other => Err(format!("expected `mine` or `all`, got `{other}`")),
        }
    }
}

/// Settings for [`HttpRecordSource`](crate::api::HttpRecordSource).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL without a trailing slash, e.g. `http://localhost:8000`.
    pub base_url: String,
    pub scope: HistoryScope,
    /// Caller's account id for `Mine` counts. Looked up via `/auth/me` when unset.
    pub account_id: Option<DbId>,
    /// Applies to clients built by `HttpRecordSource::new`.
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>, scope: HistoryScope) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            scope,
            account_id: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Pin the caller's account id instead of asking the API for it.
    pub fn with_account(mut self, account_id: DbId) -> Self {
        self.account_id = Some(account_id);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL, HistoryScope::Mine)
    }
}
