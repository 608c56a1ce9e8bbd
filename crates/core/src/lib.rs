//! Detection-result aggregation and pagination engine.
//!
//! Pure domain logic with no I/O: grouping per-object detection records
//! into per-image aggregates, deriving display titles, filtering, and
//! computing page windows. The [`source::RecordSource`] trait describes the
//! remote collaborator that the engine and client crates plug together.

pub mod aggregate;
pub mod detection;
pub mod error;
pub mod feedback;
pub mod filter;
pub mod paginate;
pub mod query;
pub mod source;
pub mod title;
pub mod types;
