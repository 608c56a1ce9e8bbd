//! Per-image rollup of detection records.
//!
//! [`aggregate`] folds a flat stream of [`DetectionRecord`]s into one
//! [`ImageAggregate`] per `image_id`, in first-occurrence order. Records
//! without an `image_id` are dropped and counted in [`Aggregation`].

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::detection::DetectionRecord;
use crate::types::DbId;

/// Rollup over every record that shares one `image_id`.
///
/// Invariant: `1 <= unique_species_count <= total_objects`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageAggregate {
    pub image_id: DbId,
    /// Number of records folded into this aggregate.
    pub total_objects: u64,
    /// Number of distinct species names seen.
    pub unique_species_count: u64,
    /// Distinct species names, first-occurrence order.
    pub species: Vec<String>,
    /// First record seen for this image; supplies confidence, timestamps,
    /// image path and owner for display.
    pub representative: DetectionRecord,
}

impl ImageAggregate {
    fn seed(image_id: DbId, record: &DetectionRecord) -> Self {
        Self {
            image_id,
            total_objects: 1,
            unique_species_count: 1,
            species: vec![record.species_name.clone()],
            representative: record.clone(),
        }
    }

    /// Species of the representative record.
    pub fn primary_species(&self) -> &str {
        &self.representative.species_name
    }

    /// All distinct species joined with `", "`.
    pub fn species_summary(&self) -> String {
        self.species.join(", ")
    }

    /// Raise the counts to server-reported values without dropping below
    /// what was observed locally. Keeps `unique_species_count <= total_objects`.
    pub fn apply_count_hints(&mut self, objects: Option<u64>, species: Option<u64>) {
        if let Some(species) = species {
            self.unique_species_count = self.unique_species_count.max(species);
        }
        if let Some(objects) = objects {
            self.total_objects = self.total_objects.max(objects);
        }
        self.total_objects = self.total_objects.max(self.unique_species_count);
    }

    /// Replace the object count with an authoritative remote count.
    ///
    /// Unlike [`apply_count_hints`](Self::apply_count_hints) this may lower the
    /// page-local count. It is only floored at `unique_species_count`.
    pub fn set_remote_object_count(&mut self, count: u64) {
        self.total_objects = count.max(self.unique_species_count);
    }
}

/// Result of an aggregation pass with its drop accounting.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Aggregation {
    pub aggregates: Vec<ImageAggregate>,
    /// Records skipped because they had no `image_id`.
    pub dropped_without_image: usize,
}

/// Group records by `image_id`, returning only the aggregates.
///
/// See [`aggregate_with_report`] for the dropped-record count.
pub fn aggregate(records: &[DetectionRecord]) -> Vec<ImageAggregate> {
    aggregate_with_report(records).aggregates
}

/// Group records by `image_id` in a single forward pass.
///
/// The same `id` appearing twice under one image counts as two objects;
/// use [`dedup_by_id`] first where duplicate ingestion is possible.
pub fn aggregate_with_report(records: &[DetectionRecord]) -> Aggregation {
    let mut aggregates: Vec<ImageAggregate> = Vec::new();
    let mut index: HashMap<DbId, usize> = HashMap::new();
    let mut seen_species: Vec<HashSet<&str>> = Vec::new();
    let mut dropped_without_image = 0usize;

    for record in records {
        let Some(image_id) = record.image_id else {
            dropped_without_image += 1;
            continue;
        };

        match index.get(&image_id) {
            Some(&slot) => {
                let agg = &mut aggregates[slot];
                agg.total_objects += 1;
                if seen_species[slot].insert(record.species_name.as_str()) {
                    agg.unique_species_count += 1;
                    agg.species.push(record.species_name.clone());
                }
            }
            None => {
                index.insert(image_id, aggregates.len());
                seen_species.push(HashSet::from([record.species_name.as_str()]));
                aggregates.push(ImageAggregate::seed(image_id, record));
            }
        }
    }

    if dropped_without_image > 0 {
        tracing::debug!(
            dropped = dropped_without_image,
            total = records.len(),
            "Dropped detection records without image id",
        );
    }

    Aggregation {
        aggregates,
        dropped_without_image,
    }
}

/// Keep the first record for each `id`, returning the kept records and the
/// number removed. Order is otherwise preserved.
pub fn dedup_by_id(records: Vec<DetectionRecord>) -> (Vec<DetectionRecord>, usize) {
    let before = records.len();
    let mut seen = HashSet::new();
    let kept: Vec<DetectionRecord> = records
        .into_iter()
        .filter(|r| seen.insert(r.id))
        .collect();
    let removed = before - kept.len();
    (kept, removed)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
