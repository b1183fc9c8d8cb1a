//! Automatic tags derived from media properties.
//!
//! Resolution, shape, filesize, and source-validity tags are owned by
//! the engine: each edit strips them and recomputes from the current
//! media info, so stale copies never survive a media swap. The
//! resolution classes are mutually exclusive; exactly one (or none)
//! applies, with `thumbnail` taking precedence over `low_res`.

use std::sync::OnceLock;

use regex::Regex;

use crate::config::EngineConfig;
use crate::models::post::MediaInfo;

/// Every tag this module may add. Stripped up front on each pass.
const MANAGED_TAGS: &[&str] = &[
    "superabsurd_res",
    "absurd_res",
    "hi_res",
    "low_res",
    "thumbnail",
    "wide_image",
    "tall_image",
    "long_image",
    "huge_filesize",
    "webm",
    "invalid_source",
];

fn valid_source(source: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^-?https?://").unwrap())
        .is_match(source)
}

/// Recompute managed tags. `animated_gif` and `animated_png` are
/// user-applied; they are only removed here when the format disagrees.
pub fn apply(
    tags: Vec<String>,
    media: &MediaInfo,
    sources: &[String],
    config: &EngineConfig,
) -> Vec<String> {
    let mut out: Vec<String> = tags
        .into_iter()
        .filter(|t| !MANAGED_TAGS.contains(&t.as_str()))
        .collect();

    if !media.is_gif {
        out.retain(|t| t != "animated_gif");
    }
    if !media.is_png {
        out.retain(|t| t != "animated_png");
    }

    if let (Some(width), Some(height)) = (media.width, media.height) {
        if let Some(class) = resolution_class(width, height, config) {
            out.push(class.to_string());
        }

        let min = config.long_image_min_px;
        let ratio = config.long_image_ratio;
        if height > 0 && width >= min && width as f64 / height as f64 >= ratio {
            out.push("wide_image".to_string());
            out.push("long_image".to_string());
        } else if width > 0 && height >= min && height as f64 / width as f64 >= ratio {
            out.push("tall_image".to_string());
            out.push("long_image".to_string());
        }
    }

    if media.size_bytes >= config.huge_filesize_bytes {
        out.push("huge_filesize".to_string());
    }

    if media.is_webm {
        out.push("webm".to_string());
    }

    if sources.iter().any(|s| !valid_source(s)) {
        out.push("invalid_source".to_string());
    }

    out
}

fn resolution_class(width: i64, height: i64, config: &EngineConfig) -> Option<&'static str> {
    let c = config;
    if width <= c.thumbnail_px && height <= c.thumbnail_px {
        Some("thumbnail")
    } else if width <= c.low_res_px && height <= c.low_res_px {
        Some("low_res")
    } else if width >= c.superabsurd_res_px && height >= c.superabsurd_res_px {
        Some("superabsurd_res")
    } else if width >= c.absurd_res_width || height >= c.absurd_res_height {
        Some("absurd_res")
    } else if width >= c.hi_res_width || height >= c.hi_res_height {
        Some("hi_res")
    } else {
        None
    }
}
