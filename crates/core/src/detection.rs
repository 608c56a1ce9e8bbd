//! Detection record model and per-field display fallbacks.
//!
//! A [`DetectionRecord`] is one detected insect instance inside one
//! uploaded image. Optional fields each have exactly one fallback, applied
//! through the accessors here rather than by consumers.

use serde::{Deserialize, Serialize};

use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Fallback constants
// ---------------------------------------------------------------------------

/// Asset shown when a record has no rendered image path.
pub const PLACEHOLDER_IMAGE: &str = "/assets/no-image.svg";

/// Label shown when a record carries no owner attribution.
pub const UNKNOWN_OWNER_LABEL: &str = "unknown";

/// Directory prefix the backend stores rendered images under.
const PUBLIC_PREFIX: &str = "public/";

// ---------------------------------------------------------------------------
// ImageRef
// ---------------------------------------------------------------------------

/// Nested descriptor pointing at the stored image files for a detection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    /// Relative path to the image with bounding boxes drawn in.
    pub annotated_path: Option<String>,
    /// Relative path to the image as uploaded.
    pub original_path: Option<String>,
}

impl ImageRef {
    /// Preferred relative path, annotated first.
    pub fn best_path(&self) -> Option<&str> {
        self.annotated_path
            .as_deref()
            .or(self.original_path.as_deref())
            .filter(|p| !p.trim().is_empty())
    }
}

/// Resolve a stored image path into a URL under `{base_url}/public/`.
///
/// Windows separators are normalised and a leading `public/` is stripped so
/// the prefix is never doubled. Returns [`PLACEHOLDER_IMAGE`] when there is
/// no usable path.
pub fn resolve_image_url(image: Option<&ImageRef>, base_url: &str) -> String {
    let Some(path) = image.and_then(ImageRef::best_path) else {
        return PLACEHOLDER_IMAGE.to_string();
    };

    let normalised = path.replace('\\', "/");
    let relative = normalised.trim_start_matches('/');
    let relative = relative.strip_prefix(PUBLIC_PREFIX).unwrap_or(relative);

    format!("{}/{PUBLIC_PREFIX}{relative}", base_url.trim_end_matches('/'))
}

// ---------------------------------------------------------------------------
// DetectionRecord
// ---------------------------------------------------------------------------

/// One detected object instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionRecord {
    /// Identifier of the detection event.
    pub id: DbId,
    /// Source image; the grouping key. Records without one cannot be grouped.
    pub image_id: Option<DbId>,
    /// Recognised species label.
    pub species_name: String,
    /// Model confidence in `[0, 1]`.
    pub confidence: f64,
    pub detected_at: Timestamp,
    pub owner_id: Option<DbId>,
    pub owner_label: Option<String>,
    pub image_ref: Option<ImageRef>,
    /// Server-side object count for the whole image, when the list
    /// endpoint already carries it.
    #[serde(default)]
    pub object_count: Option<u64>,
    /// Server-side distinct species count for the whole image.
    #[serde(default)]
    pub species_count: Option<u64>,
}

impl DetectionRecord {
    /// Owner label for display, falling back to [`UNKNOWN_OWNER_LABEL`].
    pub fn display_owner(&self) -> &str {
        self.owner_label
            .as_deref()
            .filter(|l| !l.trim().is_empty())
            .unwrap_or(UNKNOWN_OWNER_LABEL)
    }

    /// Confidence clamped to `[0, 1]`; non-finite values read as zero.
    pub fn clamped_confidence(&self) -> f64 {
        if self.confidence.is_finite() {
            self.confidence.clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    /// Confidence as a percentage string with one decimal, e.g. `"87.5%"`.
    pub fn confidence_percent(&self) -> String {
        format!("{:.1}%", self.clamped_confidence() * 100.0)
    }

    /// Display URL for the rendered image.
    pub fn image_url(&self, base_url: &str) -> String {
        resolve_image_url(self.image_ref.as_ref(), base_url)
    }
}
