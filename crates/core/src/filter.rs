//! Free-text and categorical predicates over listed items.
//!
//! Which predicates run locally depends on the paging mode:
//!
//! - server-paged: owner and correctness are forwarded upstream, only free
//!   text runs here, and only over the fetched page ([`apply_text_filter`]);
//! - client-paged: everything runs here over the full fetched collection
//!   ([`apply_client_filters`]).

use serde::{Deserialize, Serialize};

use crate::aggregate::ImageAggregate;
use crate::feedback::FeedbackRecord;
use crate::types::DbId;

// ---------------------------------------------------------------------------
// Filter values
// ---------------------------------------------------------------------------

/// Owner filter: exact match or everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OwnerFilter {
    #[default]
    All,
    Owner(DbId),
}

impl OwnerFilter {
    /// Owner id to forward upstream, `None` for all owners.
    pub fn as_param(self) -> Option<DbId> {
        match self {
            OwnerFilter::All => None,
            OwnerFilter::Owner(id) => Some(id),
        }
    }

    fn admits(self, owner_id: Option<DbId>) -> bool {
        match self {
            OwnerFilter::All => true,
            OwnerFilter::Owner(id) => owner_id == Some(id),
        }
    }
}

/// Tri-state correctness filter for feedback-shaped records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrectnessFilter {
    #[default]
    All,
    Correct,
    Incorrect,
}

impl CorrectnessFilter {
    /// `is_correct` value to forward upstream, `None` for all.
    pub fn as_param(self) -> Option<bool> {
        match self {
            CorrectnessFilter::All => None,
            CorrectnessFilter::Correct => Some(true),
            CorrectnessFilter::Incorrect => Some(false),
        }
    }

    /// Items without a verdict are outside this filter's domain and pass.
    fn admits(self, verdict: Option<bool>) -> bool {
        match (self.as_param(), verdict) {
            (Some(wanted), Some(actual)) => wanted == actual,
            _ => true,
        }
    }
}

/// Immutable snapshot of every active filter on a screen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    /// Case-insensitive substring; blank matches everything.
    pub text: String,
    pub owner: OwnerFilter,
    pub correctness: CorrectnessFilter,
}

impl FilterState {
    /// Set the free-text needle. Matching trims and lowercases it.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Restrict to one owner, or clear with [`OwnerFilter::All`].
    pub fn with_owner(mut self, owner: OwnerFilter) -> Self {
        self.owner = owner;
        self
    }

    /// Set the tri-state verdict filter.
    pub fn with_correctness(mut self, correctness: CorrectnessFilter) -> Self {
        self.correctness = correctness;
        self
    }

    /// Lowercased, trimmed search needle, or `None` when blank.
    fn needle(&self) -> Option<String> {
        let trimmed = self.text.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_lowercase())
        }
    }
}

// ---------------------------------------------------------------------------
// Filterable
// ---------------------------------------------------------------------------

/// Fields the filter engine inspects on a listed item.
pub trait Filterable {
    /// Text fields searched by the free-text filter. Absent fields are
    /// simply not included.
    fn search_fields(&self) -> Vec<&str>;

    fn owner_id(&self) -> Option<DbId>;

    /// Correctness verdict, for shapes that carry one.
    fn verdict(&self) -> Option<bool> {
        None
    }
}

impl Filterable for ImageAggregate {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields: Vec<&str> = self.species.iter().map(String::as_str).collect();
        if let Some(label) = self.representative.owner_label.as_deref() {
            fields.push(label);
        }
        fields
    }

    fn owner_id(&self) -> Option<DbId> {
        self.representative.owner_id
    }
}

impl Filterable for FeedbackRecord {
    fn search_fields(&self) -> Vec<&str> {
        [
            self.comment.as_deref(),
            self.species_name.as_deref(),
            self.owner_label.as_deref(),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    fn owner_id(&self) -> Option<DbId> {
        self.owner_id
    }

    fn verdict(&self) -> Option<bool> {
        Some(self.is_correct)
    }
}

// ---------------------------------------------------------------------------
// Predicates
// ---------------------------------------------------------------------------

fn matches_needle<T: Filterable>(item: &T, needle: &str) -> bool {
    item.search_fields()
        .iter()
        .any(|field| field.to_lowercase().contains(needle))
}

/// Whether `item` passes the free-text filter alone.
pub fn matches_text<T: Filterable>(item: &T, filters: &FilterState) -> bool {
    match filters.needle() {
        Some(needle) => matches_needle(item, &needle),
        None => true,
    }
}

/// Whether `item` passes every filter in `filters`.
pub fn matches_all<T: Filterable>(item: &T, filters: &FilterState) -> bool {
    filters.owner.admits(item.owner_id())
        && filters.correctness.admits(item.verdict())
        && matches_text(item, filters)
}

/// Server-paged filtering: free text only, over the page already fetched.
pub fn apply_text_filter<T: Filterable>(items: Vec<T>, filters: &FilterState) -> Vec<T> {
    let Some(needle) = filters.needle() else {
        return items;
    };
    items
        .into_iter()
        .filter(|item| matches_needle(item, &needle))
        .collect()
}

/// Client-paged filtering: every predicate, over the full collection.
pub fn apply_client_filters<T: Filterable>(items: Vec<T>, filters: &FilterState) -> Vec<T> {
    items
        .into_iter()
        .filter(|item| matches_all(item, filters))
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::aggregate::aggregate;
    use crate::detection::test_support::record;

    fn aggregates() -> Vec<ImageAggregate> {
        let mut a = record(1, Some(1), "Aedes aegypti");
        a.owner_id = Some(7);
        a.owner_label = Some("Alice".into());
        let b = record(2, Some(1), "Anopheles gambiae");
        let mut c = record(3, Some(2), "Culex pipiens");
        c.owner_id = Some(8);
        c.owner_label = Some("bob".into());
        let d = record(4, Some(3), "Culex quinquefasciatus");
        aggregate(&[a, b, c, d])
    }

    fn feedback(id: DbId, is_correct: bool, comment: &str) -> FeedbackRecord {
        FeedbackRecord {
            id,
            is_correct,
            comment: Some(comment.into()),
            owner_id: Some(id),
            owner_label: None,
            species_name: Some("Aedes aegypti".into()),
            confidence: Some(0.5),
            image_ref: None,
            created_at: Utc::now(),
        }
    }

    fn ids(items: &[ImageAggregate]) -> Vec<DbId> {
        items.iter().map(|a| a.image_id).collect()
    }

    // -- free text -----------------------------------------------------------

    #[test]
    fn blank_text_matches_everything() {
        let filters = FilterState::default().with_text("   ");
        assert_eq!(ids(&apply_text_filter(aggregates(), &filters)), vec![1, 2, 3]);
    }

    #[test]
    fn text_is_case_insensitive_substring() {
        let filters = FilterState::default().with_text("CULEX");
        assert_eq!(ids(&apply_text_filter(aggregates(), &filters)), vec![2, 3]);
    }

    #[test]
    fn text_matches_owner_label() {
        let filters = FilterState::default().with_text("alice");
        assert_eq!(ids(&apply_text_filter(aggregates(), &filters)), vec![1]);
    }

    #[test]
    fn text_matches_secondary_species() {
        let filters = FilterState::default().with_text("anopheles");
        assert_eq!(ids(&apply_text_filter(aggregates(), &filters)), vec![1]);
    }

    #[test]
    fn server_text_filter_ignores_owner() {
        let filters = FilterState::default().with_owner(OwnerFilter::Owner(8));
        assert_eq!(ids(&apply_text_filter(aggregates(), &filters)), vec![1, 2, 3]);
    }

    // -- categorical ---------------------------------------------------------

    #[test]
    fn client_filters_apply_owner_exactly() {
        let filters = FilterState::default().with_owner(OwnerFilter::Owner(8));
        assert_eq!(ids(&apply_client_filters(aggregates(), &filters)), vec![2]);
    }

    #[test]
    fn client_filters_combine_text_and_owner() {
        let filters = FilterState::default()
            .with_text("culex")
            .with_owner(OwnerFilter::Owner(7));
        assert!(apply_client_filters(aggregates(), &filters).is_empty());
    }

    #[test]
    fn correctness_does_not_apply_to_aggregates() {
        let filters = FilterState::default().with_correctness(CorrectnessFilter::Correct);
        assert_eq!(apply_client_filters(aggregates(), &filters).len(), 3);
    }

    #[test]
    fn correctness_filters_feedback() {
        let items = vec![
            feedback(1, true, "spot on"),
            feedback(2, false, "wrong species"),
            feedback(3, true, "ok"),
        ];
        let filters = FilterState::default().with_correctness(CorrectnessFilter::Incorrect);
        let kept = apply_client_filters(items, &filters);

        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id, 2);
    }

    #[test]
    fn feedback_text_matches_comment() {
        let items = vec![feedback(1, true, "Spot on"), feedback(2, false, "blurry")];
        let filters = FilterState::default().with_text("spot");
        assert_eq!(apply_text_filter(items, &filters).len(), 1);
    }

    #[test]
    fn params_forwarded_upstream() {
        assert_eq!(OwnerFilter::All.as_param(), None);
        assert_eq!(OwnerFilter::Owner(3).as_param(), Some(3));
        assert_eq!(CorrectnessFilter::All.as_param(), None);
        assert_eq!(CorrectnessFilter::Correct.as_param(), Some(true));
        assert_eq!(CorrectnessFilter::Incorrect.as_param(), Some(false));
    }
}
