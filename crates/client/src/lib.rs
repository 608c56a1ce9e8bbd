//! HTTP [`RecordSource`](entoscope_core::source::RecordSource) over the
//! detection dashboard's REST API.

pub mod api;
pub mod config;
pub mod wire;

pub use api::{HttpError, HttpRecordSource};
pub use config::{ClientConfig, HistoryScope};
