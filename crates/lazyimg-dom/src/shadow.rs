//! Shadow DOM
//!
//! Shadow root with a scoped style sheet.

use crate::NodeId;

/// Shadow root mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShadowRootMode {
    #[default]
    Open,
    Closed,
}

/// Shadow root
///
/// Children live in the tree like any other node; the root itself carries
/// the style sheet that applies only inside it.
#[derive(Debug, Clone)]
pub struct ShadowRoot {
    pub host: NodeId,
    pub mode: ShadowRootMode,
    style_sheet: String,
}

impl ShadowRoot {
    pub fn new(host: NodeId, mode: ShadowRootMode) -> Self {
        Self {
            host,
            mode,
            style_sheet: String::new(),
        }
    }

    /// Scoped style sheet text
    pub fn style_sheet(&self) -> &str {
        &self.style_sheet
    }

    pub fn set_style_sheet(&mut self, css: impl Into<String>) {
        self.style_sheet = css.into();
    }
}
