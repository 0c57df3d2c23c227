//! Image Metadata
//!
//! Asks the image host for intrinsic dimensions and turns them into the
//! aspect ratio reserved on the layout container. Every failure ends in the
//! square default; nothing here reaches the caller as an error.

use std::fmt;

use lazyimg_net::{FetchResponse, Fetcher, NetError, Request};
use serde::Deserialize;

/// `fl_getinfo` payload (only the fields we read)
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ImageInfo {
    pub input: Dimensions,
}

/// Intrinsic image size in pixels
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Dimensions {
    pub width: f64,
    pub height: f64,
}

/// CSS `aspect-ratio` value, width over height
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AspectRatio(String);

impl AspectRatio {
    /// Square fallback
    pub fn square() -> Self {
        AspectRatio("1".to_string())
    }

    /// Ratio to three decimals; `None` for zero, negative or non-finite sizes
    pub fn from_dimensions(width: f64, height: f64) -> Option<Self> {
        if !(width.is_finite() && height.is_finite()) || width <= 0.0 || height <= 0.0 {
            return None;
        }
        Some(AspectRatio(format!("{:.3}", width / height)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for AspectRatio {
    fn default() -> Self {
        Self::square()
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Aspect ratio for raw dimensions, square when they can't give one
pub fn aspect_ratio(width: f64, height: f64) -> AspectRatio {
    AspectRatio::from_dimensions(width, height).unwrap_or_default()
}

/// Why a metadata lookup fell back to the default
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MetadataError {
    #[error("metadata request failed: {0}")]
    Transport(#[from] NetError),

    #[error("metadata request returned HTTP {0}")]
    Status(u16),

    #[error("malformed metadata payload: {0}")]
    Payload(String),

    #[error("unusable image dimensions {width}x{height}")]
    Dimensions { width: f64, height: f64 },
}

/// Decode an `fl_getinfo` response
pub fn parse_metadata(response: &FetchResponse) -> Result<AspectRatio, MetadataError> {
    if !response.ok() {
        return Err(MetadataError::Status(response.status()));
    }
    let info: ImageInfo = response
        .json()
        .map_err(|e| MetadataError::Payload(e.to_string()))?;
    let Dimensions { width, height } = info.input;

    AspectRatio::from_dimensions(width, height).ok_or(MetadataError::Dimensions { width, height })
}

/// Request and decode metadata
pub async fn fetch_metadata<F: Fetcher>(fetcher: &F, url: &str) -> Result<AspectRatio, MetadataError> {
    let response = fetcher.fetch(Request::get(url).accept_json()).await?;
    parse_metadata(&response)
}

/// Request metadata, logging any failure and substituting the square default
pub async fn resolve_aspect_ratio<F: Fetcher>(fetcher: &F, url: &str) -> AspectRatio {
    match fetch_metadata(fetcher, url).await {
        Ok(ratio) => {
            tracing::debug!(url, ratio = %ratio, "image metadata resolved");
            ratio
        }
        Err(e) => {
            tracing::warn!(url, error = %e, "image metadata unavailable, reserving square");
            AspectRatio::square()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lazyimg_net::MemoryFetcher;

    const URL: &str = "https://img.example.com/fl_getinfo/cat";

    #[test]
    fn test_widescreen_ratio() {
        assert_eq!(aspect_ratio(1600.0, 900.0).as_str(), "1.778");
    }

    #[test]
    fn test_zero_height_falls_back() {
        assert_eq!(aspect_ratio(1600.0, 0.0).as_str(), "1");
        assert_eq!(aspect_ratio(0.0, 900.0).as_str(), "1");
        assert_eq!(aspect_ratio(f64::NAN, 900.0).as_str(), "1");
    }

    #[test]
    fn test_portrait_ratio() {
        assert_eq!(aspect_ratio(600.0, 900.0).as_str(), "0.667");
    }

    #[test]
    fn test_resolve_success() {
        let fetcher = MemoryFetcher::new().with_json(
            URL,
            r#"{"input":{"width":1600,"height":900,"bytes":12345},"output":{"format":"jpg"}}"#,
        );
        let ratio = smol::block_on(resolve_aspect_ratio(&fetcher, URL));
        assert_eq!(ratio.as_str(), "1.778");
    }

    #[test]
    fn test_resolve_failures_fall_back() {
        let cases = [
            MemoryFetcher::new().with_status(URL, 500),
            MemoryFetcher::new().with_json(URL, r#"{"output":{}}"#),
            MemoryFetcher::new().with_json(URL, r#"{"input":{"width":1600,"height":0}}"#),
            MemoryFetcher::new().with_error(URL, NetError::Network("timed out".into())),
        ];
        for fetcher in cases {
            let ratio = smol::block_on(resolve_aspect_ratio(&fetcher, URL));
            assert_eq!(ratio, AspectRatio::square());
        }
    }

    #[test]
    fn test_parse_reports_reason() {
        let fetcher = MemoryFetcher::new().with_status(URL, 404);
        let result = smol::block_on(fetch_metadata(&fetcher, URL));
        assert_eq!(result, Err(MetadataError::Status(404)));
    }
}
