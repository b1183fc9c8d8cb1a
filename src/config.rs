//! Engine configuration.
//!
//! Thresholds that encode site policy rather than invariants. Defaults
//! match the behavior the production site shipped with; deployments can
//! load overrides from JSON.

use serde::{Deserialize, Serialize};

/// Tunable limits and thresholds for the tag-edit pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Hard cap on the number of tags a post may carry. Exceeding it
    /// aborts the edit (skipped for automated edits).
    pub max_tags_per_post: usize,
    /// Minimum general tags expected on a first upload (warning only).
    pub min_general_tags: usize,
    /// A tag with zero posts older than this is considered abandoned;
    /// re-using it produces a "repopulated" warning.
    pub repopulated_grace_secs: i64,
    /// Master switch for dimension/size/format classification tags.
    pub enable_autotagging: bool,
    /// Byte threshold for the huge_filesize tag.
    pub huge_filesize_bytes: i64,
    /// Both dimensions at or above this yield superabsurd_res.
    pub superabsurd_res_px: i64,
    /// Width/height thresholds for absurd_res (either suffices).
    pub absurd_res_width: i64,
    pub absurd_res_height: i64,
    /// Width/height thresholds for hi_res (either suffices).
    pub hi_res_width: i64,
    pub hi_res_height: i64,
    /// Both dimensions at or below these yield low_res / thumbnail.
    pub low_res_px: i64,
    pub thumbnail_px: i64,
    /// Minimum long dimension and aspect ratio for wide/tall_image.
    pub long_image_min_px: i64,
    pub long_image_ratio: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_tags_per_post: 2000,
            min_general_tags: 10,
            repopulated_grace_secs: 10,
            enable_autotagging: true,
            huge_filesize_bytes: 30 * 1024 * 1024,
            superabsurd_res_px: 10_000,
            absurd_res_width: 3200,
            absurd_res_height: 2400,
            hi_res_width: 1600,
            hi_res_height: 1200,
            low_res_px: 500,
            thumbnail_px: 250,
            long_image_min_px: 1024,
            long_image_ratio: 4.0,
        }
    }
}

impl EngineConfig {
    /// Parse a configuration from a JSON string, filling omitted fields
    /// with defaults.
    pub fn from_json(json: &str) -> crate::utils::AppResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| crate::utils::AppError::Config(format!("invalid engine config: {}", e)))
    }
}
