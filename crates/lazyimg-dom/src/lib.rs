//! lazyimg DOM
//!
//! Arena-backed element tree with attributes, inline style, shadow roots
//! and mutation events. Just enough DOM to host one custom element.

mod attributes;
mod geometry;
mod node;
mod style;
mod tree;
pub mod custom_elements;
pub mod dom_events;
pub mod shadow;

pub use attributes::{Attr, NamedNodeMap};
pub use custom_elements::{
    CustomElementDefinition, CustomElementError, CustomElementOptions, CustomElementRegistry,
};
pub use dom_events::{DomEvent, DomEventType};
pub use geometry::DOMRect;
pub use node::{ElementData, Node, NodeData};
pub use shadow::{ShadowRoot, ShadowRootMode};
pub use style::InlineStyle;
pub use tree::{DomError, DomTree};

/// Node identifier (index into arena)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Document node ID
    pub const ROOT: NodeId = NodeId(0);

    /// Build an ID from its raw arena index
    pub const fn from_raw(raw: u32) -> Self {
        NodeId(raw)
    }

    /// Arena index
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}
