//! DOM Events
//!
//! Mutation, load and transition events.

use crate::NodeId;

/// DOM event types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomEventType {
    // Mutation
    NodeInserted,
    NodeRemoved,
    AttrModified,
    StyleModified,

    // Resource
    Load,
    Error,

    // CSS transitions
    TransitionEnd,
}

/// DOM event
#[derive(Debug, Clone, PartialEq)]
pub struct DomEvent {
    pub event_type: DomEventType,
    pub target: NodeId,
    pub related_node: Option<NodeId>,
    /// Attribute or style property name
    pub name: Option<String>,
    pub prev_value: Option<String>,
    pub new_value: Option<String>,
    pub timestamp: f64,
}

impl DomEvent {
    fn new(event_type: DomEventType, target: NodeId) -> Self {
        Self {
            event_type,
            target,
            related_node: None,
            name: None,
            prev_value: None,
            new_value: None,
            timestamp: 0.0,
        }
    }

    pub fn node_inserted(target: NodeId, parent: NodeId) -> Self {
        Self {
            related_node: Some(parent),
            ..Self::new(DomEventType::NodeInserted, target)
        }
    }

    pub fn node_removed(target: NodeId, parent: NodeId) -> Self {
        Self {
            related_node: Some(parent),
            ..Self::new(DomEventType::NodeRemoved, target)
        }
    }

    pub fn attr_modified(
        target: NodeId,
        name: &str,
        old_value: Option<&str>,
        new_value: Option<&str>,
    ) -> Self {
        Self {
            name: Some(name.to_string()),
            prev_value: old_value.map(str::to_string),
            new_value: new_value.map(str::to_string),
            ..Self::new(DomEventType::AttrModified, target)
        }
    }

    pub fn style_modified(target: NodeId, property: &str, value: &str) -> Self {
        Self {
            name: Some(property.to_string()),
            new_value: Some(value.to_string()),
            ..Self::new(DomEventType::StyleModified, target)
        }
    }

    /// Resource finished loading
    pub fn load(target: NodeId, timestamp: f64) -> Self {
        Self {
            timestamp,
            ..Self::new(DomEventType::Load, target)
        }
    }

    /// Resource failed to load
    pub fn error(target: NodeId, timestamp: f64) -> Self {
        Self {
            timestamp,
            ..Self::new(DomEventType::Error, target)
        }
    }

    pub fn transition_end(target: NodeId, property: &str, timestamp: f64) -> Self {
        Self {
            name: Some(property.to_string()),
            timestamp,
            ..Self::new(DomEventType::TransitionEnd, target)
        }
    }
}
