//! Sequence-numbered request coordinator.
//!
//! Every dispatch takes the next sequence number and moves the state to
//! `Loading`. A response is applied only if its sequence number is still
//! the latest issued; anything older is discarded without touching state.
//! Failures keep the previously visible data around as `stale`.
//!
//! ```text
//! Idle -> Loading -> Loaded | Failed -> (next dispatch) Loading ...
//!          reset() / abandon() -> Idle
//! ```

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use entoscope_core::error::CoreError;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::session::{SessionBus, SessionEvent};

// ---------------------------------------------------------------------------
// FetchState
// ---------------------------------------------------------------------------

/// Visible state of one screen's data.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchState<T> {
    Idle,
    Loading {
        seq: u64,
        /// Data from the last completed request, still on screen.
        previous: Option<Arc<T>>,
    },
    Loaded {
        seq: u64,
        data: Arc<T>,
    },
    Failed {
        seq: u64,
        error: CoreError,
        /// Last good data; callers must present it as out of date.
        stale: Option<Arc<T>>,
    },
}

impl<T> FetchState<T> {
    /// Sequence number of the request this state belongs to.
    pub fn seq(&self) -> Option<u64> {
        match self {
            FetchState::Idle => None,
            FetchState::Loading { seq, .. }
            | FetchState::Loaded { seq, .. }
            | FetchState::Failed { seq, .. } => Some(*seq),
        }
    }

    /// Data from a successful latest request, and nothing else.
    pub fn data(&self) -> Option<&Arc<T>> {
        match self {
            FetchState::Loaded { data, .. } => Some(data),
            _ => None,
        }
    }

    /// Whatever data is on screen, fresh or not.
    pub fn visible_data(&self) -> Option<&Arc<T>> {
        match self {
            FetchState::Idle => None,
            FetchState::Loading { previous, .. } => previous.as_ref(),
            FetchState::Loaded { data, .. } => Some(data),
            FetchState::Failed { stale, .. } => stale.as_ref(),
        }
    }

    pub fn error(&self) -> Option<&CoreError> {
        match self {
            FetchState::Failed { error, .. } => Some(error),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, FetchState::Loading { .. })
    }
}

/// Handle for one dispatched request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTicket {
    seq: u64,
}

impl RequestTicket {
    pub fn seq(self) -> u64 {
        self.seq
    }
}

// ---------------------------------------------------------------------------
// RequestCoordinator
// ---------------------------------------------------------------------------

/// Gatekeeper between in-flight fetches and the visible [`FetchState`].
///
/// State is published through a `watch` channel so a UI layer can observe
/// transitions; all mutations happen under the channel's lock.
pub struct RequestCoordinator<T> {
    latest_seq: AtomicU64,
    state: watch::Sender<FetchState<T>>,
    cancel: CancellationToken,
    session: Option<Arc<SessionBus>>,
}

impl<T> RequestCoordinator<T> {
    pub fn new() -> Self {
        let (state, _) = watch::channel(FetchState::Idle);
        Self {
            latest_seq: AtomicU64::new(0),
            state,
            cancel: CancellationToken::new(),
            session: None,
        }
    }

    /// Forward auth rejections of the latest request to `bus`.
    pub fn with_session(mut self, bus: Arc<SessionBus>) -> Self {
        self.session = Some(bus);
        self
    }

    pub fn latest_seq(&self) -> u64 {
        self.latest_seq.load(Ordering::SeqCst)
    }

    pub fn is_abandoned(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn subscribe(&self) -> watch::Receiver<FetchState<T>> {
        self.state.subscribe()
    }

    /// Issue the next sequence number and enter `Loading`.
    pub fn begin(&self) -> RequestTicket {
        let mut seq = 0;
        self.state.send_modify(|state| {
            seq = self.latest_seq.fetch_add(1, Ordering::SeqCst) + 1;
            let previous = state.visible_data().cloned();
            *state = FetchState::Loading { seq, previous };
        });
        tracing::debug!(seq, "Dispatched request");
        RequestTicket { seq }
    }

    /// Apply a response if `ticket` is still the latest request.
    ///
    /// Returns `false` when the response was discarded as stale or the
    /// coordinator has been abandoned.
    pub fn complete(&self, ticket: RequestTicket, result: Result<T, CoreError>) -> bool {
        let seq = ticket.seq;
        let auth_message = match &result {
            Err(e) if e.is_auth() => Some(e.to_string()),
            _ => None,
        };

        let applied = self.state.send_if_modified(|state| {
            if self.cancel.is_cancelled() || self.latest_seq.load(Ordering::SeqCst) != seq {
                return false;
            }
            let stale = state.visible_data().cloned();
            *state = match result {
                Ok(data) => FetchState::Loaded {
                    seq,
                    data: Arc::new(data),
                },
                Err(error) => FetchState::Failed { seq, error, stale },
            };
            true
        });

        if !applied {
            tracing::debug!(seq, latest = self.latest_seq(), "Discarding stale response");
            return false;
        }

        if let Some(message) = auth_message {
            tracing::warn!(seq, "Record source rejected credentials");
            if let Some(bus) = &self.session {
                bus.publish(SessionEvent::AuthRejected { message });
            }
        }
        true
    }

    /// Dispatch `fetch` as a new request and return the visible state once
    /// it settles. A superseded request returns whatever is current instead
    /// of its own result.
    pub async fn run<Fut>(&self, fetch: Fut) -> FetchState<T>
    where
        T: Clone,
        Fut: Future<Output = Result<T, CoreError>>,
    {
        if self.is_abandoned() {
            return FetchState::Idle;
        }

        let ticket = self.begin();
        tokio::select! {
            _ = self.cancel.cancelled() => {
                tracing::debug!(seq = ticket.seq, "Request abandoned");
            }
            result = fetch => {
                if let Err(e) = &result {
                    tracing::warn!(seq = ticket.seq, error = %e, "Request failed");
                }
                self.complete(ticket, result);
            }
        }
        self.state()
    }

    /// Current visible state.
    pub fn state(&self) -> FetchState<T>
    where
        T: Clone,
    {
        self.state.borrow().clone()
    }

    /// Return to `Idle`, invalidating every in-flight request.
    pub fn reset(&self) {
        self.state.send_modify(|state| {
            self.latest_seq.fetch_add(1, Ordering::SeqCst);
            *state = FetchState::Idle;
        });
    }

    /// Stop caring about this screen: in-flight requests are dropped at
    /// their next await point and no further dispatches run.
    pub fn abandon(&self) {
        self.cancel.cancel();
        self.state.send_replace(FetchState::Idle);
        tracing::debug!(latest = self.latest_seq(), "Coordinator abandoned");
    }
}

impl<T> Default for RequestCoordinator<T> {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
