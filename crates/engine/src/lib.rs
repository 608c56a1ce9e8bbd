//! Request sequencing and query pipelines on top of `entoscope-core`.
//!
//! A [`screen::Screen`] owns one paging mode, one [`RequestCoordinator`]
//! and one pipeline. Every `run_query` call is sequence-numbered; only the
//! most recently dispatched request may become visible state.

pub mod coordinator;
pub mod pipeline;
pub mod screen;
pub mod session;
pub mod view;

pub use coordinator::{FetchState, RequestCoordinator, RequestTicket};
pub use pipeline::{DetectionPipeline, FeedbackPipeline, Pipeline, PipelineOptions};
pub use screen::{DetectionScreen, FeedbackScreen, Screen};
pub use session::{SessionBus, SessionEvent};
pub use view::{BackfillOutcome, DetectionView, FeedbackView, ImageCard, PipelineReport};
