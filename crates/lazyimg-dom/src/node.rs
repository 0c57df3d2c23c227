//! DOM Node
//!
//! Arena nodes refer to each other by `NodeId`, never by pointer.

use crate::{InlineStyle, NamedNodeMap, NodeId, ShadowRoot};

/// DOM Node - Core structure
#[derive(Debug)]
pub struct Node {
    /// Parent node (None if detached or document)
    pub parent: Option<NodeId>,
    /// Children in document order
    pub children: Vec<NodeId>,
    /// Node-specific data
    pub data: NodeData,
}

impl Node {
    pub fn new(data: NodeData) -> Self {
        Self {
            parent: None,
            children: Vec::new(),
            data,
        }
    }

    #[inline]
    pub fn is_element(&self) -> bool {
        matches!(self.data, NodeData::Element(_))
    }

    #[inline]
    pub fn as_element(&self) -> Option<&ElementData> {
        match &self.data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    #[inline]
    pub fn as_element_mut(&mut self) -> Option<&mut ElementData> {
        match &mut self.data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    #[inline]
    pub fn as_shadow_root(&self) -> Option<&ShadowRoot> {
        match &self.data {
            NodeData::ShadowRoot(s) => Some(s),
            _ => None,
        }
    }

    #[inline]
    pub fn as_text(&self) -> Option<&str> {
        match &self.data {
            NodeData::Text(t) => Some(t),
            _ => None,
        }
    }
}

/// Node-specific data
#[derive(Debug)]
pub enum NodeData {
    /// Document root
    Document,
    /// Element
    Element(ElementData),
    /// Text content
    Text(String),
    /// Shadow root attached to an element
    ShadowRoot(ShadowRoot),
}

/// Element data
#[derive(Debug)]
pub struct ElementData {
    /// Lowercase tag name
    pub tag_name: String,
    pub attributes: NamedNodeMap,
    pub style: InlineStyle,
    /// Attached shadow root, if any
    pub shadow_root: Option<NodeId>,
}

impl ElementData {
    pub fn new(tag_name: &str) -> Self {
        Self {
            tag_name: tag_name.to_ascii_lowercase(),
            attributes: NamedNodeMap::new(),
            style: InlineStyle::new(),
            shadow_root: None,
        }
    }
}
