//! Image Host Requests
//!
//! URL layout understood by the image host:
//! `{base}fl_getinfo/{id}` for metadata and `{base}{params}/{id}` for pixels.

use crate::{ImageConfig, WidgetOptions};

/// Metadata endpoint for the configured image
pub fn metadata_url(config: &ImageConfig) -> String {
    format!("{}fl_getinfo/{}", config.base, config.image_id)
}

/// Image endpoint with a transformation segment
pub fn image_url(config: &ImageConfig, params: &str) -> String {
    format!("{}{}/{}", config.base, params, config.image_id)
}

/// Small blurred preview
pub fn placeholder_url(config: &ImageConfig, options: &WidgetOptions) -> String {
    image_url(config, &options.placeholder_params)
}

/// Device pixels needed to fill `css_width`, rounded up to the next bucket
pub fn target_width(css_width: f64, device_pixel_ratio: f64, bucket: u32) -> u32 {
    let bucket = bucket.max(1);
    let dpr = if device_pixel_ratio.is_finite() && device_pixel_ratio > 0.0 {
        device_pixel_ratio
    } else {
        1.0
    };
    let css_width = if css_width.is_finite() { css_width.max(0.0) } else { 0.0 };

    let buckets = (css_width * dpr / f64::from(bucket)).ceil().max(1.0);
    // `as` saturates at u32::MAX; the product must too
    (buckets as u32).saturating_mul(bucket)
}

/// Transformation segment for the high-res request
pub fn high_res_params(width: u32, options: &WidgetOptions) -> String {
    if options.format_hints.is_empty() {
        format!("w_{}", width)
    } else {
        format!("w_{},{}", width, options.format_hints)
    }
}

/// Full high-res URL at `width` device pixels
pub fn high_res_url(config: &ImageConfig, width: u32, options: &WidgetOptions) -> String {
    image_url(config, &high_res_params(width, options))
}
