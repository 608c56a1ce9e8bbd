//! Human-readable summary titles for image aggregates.

use crate::aggregate::ImageAggregate;

/// Build the display title for an image.
///
/// Rules, first match wins:
/// 1. more than one species: `"{species} (+{n-1} more species) ({total} objects)"`
/// 2. more than one object: `"{species} ({total} objects)"`
/// 3. otherwise the bare species name (also for a zero total).
pub fn derive_title(species: &str, unique_species_count: u64, total_objects: u64) -> String {
    if unique_species_count > 1 {
        format!(
            "{species} (+{} more species) ({total_objects} objects)",
            unique_species_count - 1
        )
    } else if total_objects > 1 {
        format!("{species} ({total_objects} objects)")
    } else {
        species.to_string()
    }
}

/// Title for an aggregate, keyed on its representative species.
pub fn aggregate_title(agg: &ImageAggregate) -> String {
    derive_title(agg.primary_species(), agg.unique_species_count, agg.total_objects)
}

/// Short card badge: species count when mixed, else object count when
/// plural, else nothing.
pub fn derive_badge(unique_species_count: u64, total_objects: u64) -> Option<String> {
    if unique_species_count > 1 {
        Some(format!("{unique_species_count} species"))
    } else if total_objects > 1 {
        Some(format!("{total_objects} objects"))
    } else {
        None
    }
}
