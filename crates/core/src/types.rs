//! Identifier and time aliases shared by every crate.

/// Identifier assigned by the dashboard backend (detections, images, accounts).
pub type DbId = i64;

/// Timestamps are normalised to UTC when records are decoded.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
