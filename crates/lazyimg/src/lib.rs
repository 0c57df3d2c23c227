//! lazyimg
//!
//! A lazy-loading, layout-stable image element.
//!
//! The element shows a blurred placeholder straight away, reserves its box
//! using the aspect ratio reported by the image host, and requests a
//! resolution-appropriate image the first time it scrolls into view.
//!
//! # Example
//! ```rust,ignore
//! use lazyimg::{Page, WidgetOptions};
//! use lazyimg::dom::DOMRect;
//! use lazyimg::net::HttpFetcher;
//!
//! let mut page = Page::new(HttpFetcher::new()?, WidgetOptions::default())?;
//! let img = page.create_lazy_image()?;
//! page.set_base(img, "https://res.example.com/image/upload/")?;
//! page.set_image_id(img, "sample.jpg")?;
//! page.connect(img, DOMRect::new(0.0, 1800.0, 640.0, 360.0))?;
//! smol::block_on(page.pump());
//! page.scroll_to(1500.0);
//! smol::block_on(page.pump());
//! ```

pub mod animation;
pub mod config;
pub mod element;
pub mod metadata;
pub mod observer;
pub mod options;
pub mod page;
pub mod params;

pub use config::{ConfigChange, ConfigField, ImageConfig, OBSERVED_ATTRIBUTES};
pub use element::{Command, LazyImage, LoadState, TAG_NAME};
pub use metadata::{aspect_ratio, AspectRatio, MetadataError};
pub use options::WidgetOptions;
pub use page::{Page, PageError, WidgetId};

// Re-export sub-crates
pub use lazyimg_dom as dom;
pub use lazyimg_net as net;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
