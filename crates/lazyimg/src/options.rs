//! Widget Options
//!
//! Tuning values shared by every lazy image on a page.

use serde::{Deserialize, Serialize};

/// Widget configuration options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WidgetOptions {
    /// Transformation for the blurred placeholder request
    pub placeholder_params: String,

    /// Format hints appended after the width in high-res requests
    pub format_hints: String,

    /// High-res widths are rounded up to a multiple of this (px)
    pub width_bucket: u32,

    /// Placeholder fade-out duration (ms)
    pub fade_duration_ms: f64,

    /// Easing keyword for the fade
    pub fade_easing: String,

    /// Grows the viewport on every side when testing visibility (px)
    pub root_margin_px: f64,
}

impl Default for WidgetOptions {
    fn default() -> Self {
        Self {
            placeholder_params: "w_40,e_blur:200,q_auto:low,f_auto".to_string(),
            format_hints: "q_auto,f_auto".to_string(),
            width_bucket: 100,
            fade_duration_ms: 400.0,
            fade_easing: "ease-out".to_string(),
            root_margin_px: 0.0,
        }
    }
}

impl WidgetOptions {
    /// Parse options from JSON; missing keys keep their defaults
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Value for the placeholder's `transition` style
    pub fn fade_transition(&self) -> String {
        format!("opacity {}ms {}", self.fade_duration_ms, self.fade_easing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let options = WidgetOptions::from_json(r#"{"fade_duration_ms": 250}"#).unwrap();
        assert_eq!(options.fade_duration_ms, 250.0);
        assert_eq!(options.width_bucket, 100);
        assert_eq!(options.fade_transition(), "opacity 250ms ease-out");
    }
}
