//! Viewer configuration loaded from environment variables.

use std::time::Duration;

use entoscope_client::config::{DEFAULT_API_URL, DEFAULT_TIMEOUT_SECS};
use entoscope_client::{ClientConfig, HistoryScope};
use entoscope_core::filter::{CorrectnessFilter, FilterState, OwnerFilter};
use entoscope_core::paginate::DEFAULT_PAGE_SIZE;
use entoscope_core::query::{PagingMode, DEFAULT_CLIENT_WINDOW};

/// A malformed environment variable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{var} is invalid: {reason}")]
pub struct ConfigError {
    pub var: &'static str,
    pub reason: String,
}

impl ConfigError {
    fn new(var: &'static str, reason: impl Into<String>) -> Self {
        Self {
            var,
            reason: reason.into(),
        }
    }
}

/// Which listing the viewer renders.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ViewKind {
    #[default]
    Detections,
    Feedback,
}

#[derive(Debug, Clone)]
pub struct ViewerConfig {
    pub api_url: String,
    /// Bearer token attached to every request, if set.
    pub api_token: Option<String>,
    pub scope: HistoryScope,
    /// Account `mine` counts are scoped to. Resolved from the token when unset.
    pub account_id: Option<i64>,
    pub view: ViewKind,
    pub mode: PagingMode,
    pub page: i64,
    pub page_size: i64,
    pub filters: FilterState,
    pub dedupe: bool,
    pub request_timeout_secs: u64,
}

impl ViewerConfig {
    /// Load configuration from the process environment.
    ///
    /// | Env Var                   | Default                 |
    /// |---------------------------|-------------------------|
    /// | `ENTOSCOPE_API_URL`       | `http://localhost:8000` |
    /// | `ENTOSCOPE_API_TOKEN`     | unset                   |
    /// | `ENTOSCOPE_SCOPE`         | `mine`                  |
    /// | `ENTOSCOPE_ACCOUNT_ID`    | unset                   |
    /// | `ENTOSCOPE_VIEW`          | `detections`            |
    /// | `ENTOSCOPE_MODE`          | `server`                |
    /// | `ENTOSCOPE_CLIENT_WINDOW` | `50`                    |
    /// | `ENTOSCOPE_PAGE`          | `1`                     |
    /// | `ENTOSCOPE_PAGE_SIZE`     | `12`                    |
    /// | `ENTOSCOPE_SEARCH`        | empty                   |
    /// | `ENTOSCOPE_OWNER_ID`      | unset                   |
    /// | `ENTOSCOPE_CORRECTNESS`   | `all`                   |
    /// | `ENTOSCOPE_DEDUPE`        | `false`                 |
    /// | `REQUEST_TIMEOUT_SECS`    | `30`                    |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) over an arbitrary lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let api_url = get("ENTOSCOPE_API_URL").unwrap_or_else(|| DEFAULT_API_URL.into());
        let api_token = get("ENTOSCOPE_API_TOKEN");

        let scope = match get("ENTOSCOPE_SCOPE") {
            Some(raw) => raw
                .parse::<HistoryScope>()
                .map_err(|reason| ConfigError::new("ENTOSCOPE_SCOPE", reason))?,
            None => HistoryScope::default(),
        };

        let account_id = match get("ENTOSCOPE_ACCOUNT_ID") {
            Some(raw) => Some(
                raw.parse()
                    .map_err(|_| ConfigError::new("ENTOSCOPE_ACCOUNT_ID", "must be an integer"))?,
            ),
            None => None,
        };

        let view = match get("ENTOSCOPE_VIEW").as_deref() {
            None | Some("detections") => ViewKind::Detections,
            Some("feedback") => ViewKind::Feedback,
            Some(other) => {
                return Err(ConfigError::new(
                    "ENTOSCOPE_VIEW",
                    format!("expected `detections` or `feedback`, got `{other}`"),
                ))
            }
        };

        let window: u64 = parse_or(
            "ENTOSCOPE_CLIENT_WINDOW",
            get("ENTOSCOPE_CLIENT_WINDOW"),
            DEFAULT_CLIENT_WINDOW,
        )?;
        let mode = match get("ENTOSCOPE_MODE").as_deref() {
            None | Some("server") => PagingMode::ServerPaged,
            Some("client") => PagingMode::client(window),
            Some(other) => {
                return Err(ConfigError::new(
                    "ENTOSCOPE_MODE",
                    format!("expected `server` or `client`, got `{other}`"),
                ))
            }
        };

        let page: i64 = parse_or("ENTOSCOPE_PAGE", get("ENTOSCOPE_PAGE"), 1)?;
        let page_size: i64 = parse_or(
            "ENTOSCOPE_PAGE_SIZE",
            get("ENTOSCOPE_PAGE_SIZE"),
            DEFAULT_PAGE_SIZE as i64,
        )?;

        let owner = match get("ENTOSCOPE_OWNER_ID") {
            Some(raw) => OwnerFilter::Owner(
                raw.parse()
                    .map_err(|_| ConfigError::new("ENTOSCOPE_OWNER_ID", "must be an integer"))?,
            ),
            None => OwnerFilter::All,
        };

        let correctness = match get("ENTOSCOPE_CORRECTNESS").as_deref() {
            None | Some("all") => CorrectnessFilter::All,
            Some("correct") => CorrectnessFilter::Correct,
            Some("incorrect") => CorrectnessFilter::Incorrect,
            Some(other) => {
                return Err(ConfigError::new(
                    "ENTOSCOPE_CORRECTNESS",
                    format!("expected `all`, `correct` or `incorrect`, got `{other}`"),
                ))
            }
        };

        let filters = FilterState::default()
            .with_text(get("ENTOSCOPE_SEARCH").unwrap_or_default())
            .with_owner(owner)
            .with_correctness(correctness);

        let dedupe: bool = parse_or("ENTOSCOPE_DEDUPE", get("ENTOSCOPE_DEDUPE"), false)?;
        let request_timeout_secs: u64 = parse_or(
            "REQUEST_TIMEOUT_SECS",
            get("REQUEST_TIMEOUT_SECS"),
            DEFAULT_TIMEOUT_SECS,
        )?;

        Ok(Self {
            api_url,
            api_token,
            scope,
            account_id,
            view,
            mode,
            page,
            page_size,
            filters,
            dedupe,
            request_timeout_secs,
        })
    }

    pub fn client_config(&self) -> ClientConfig {
        let config = ClientConfig::new(self.api_url.clone(), self.scope)
            .with_timeout(Duration::from_secs(self.request_timeout_secs));
        match self.account_id {
            Some(id) => config.with_account(id),
            None => config,
        }
    }
}

fn parse_or<T: std::str::FromStr>(
    var: &'static str,
    raw: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        Some(raw) => raw
            .parse()
            .map_err(|_| ConfigError::new(var, format!("cannot parse `{raw}`"))),
        None => Ok(default),
    }
}
