//! DOM Tree (arena-based allocation)
//!
//! Nodes are never freed; removal only unlinks them, so a `NodeId` stays
//! valid for the lifetime of the tree.

use crate::{
    DomEvent, ElementData, InlineStyle, Node, NodeData, NodeId, ShadowRoot, ShadowRootMode,
};

/// Tree mutation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    #[error("node {0:?} does not exist")]
    NotFound(NodeId),

    #[error("node {0:?} is not an element")]
    NotAnElement(NodeId),

    #[error("element {0:?} already has a shadow root")]
    ShadowRootExists(NodeId),

    #[error("cannot insert {child:?} into its own subtree")]
    HierarchyRequest { child: NodeId },
}

/// Arena-based DOM tree
#[derive(Debug)]
pub struct DomTree {
    nodes: Vec<Node>,
    mutations: Vec<DomEvent>,
}

impl Default for DomTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DomTree {
    /// Create a tree holding only the document node
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new(NodeData::Document)],
            mutations: Vec::new(),
        }
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.index())
    }

    /// Number of nodes ever allocated
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn alloc(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node::new(data));
        id
    }

    /// Create a detached element
    pub fn create_element(&mut self, tag_name: &str) -> NodeId {
        self.alloc(NodeData::Element(ElementData::new(tag_name)))
    }

    /// Create a detached text node
    pub fn create_text(&mut self, content: &str) -> NodeId {
        self.alloc(NodeData::Text(content.to_string()))
    }

    /// Attach a shadow root to `host`
    pub fn attach_shadow(&mut self, host: NodeId, mode: ShadowRootMode) -> Result<NodeId, DomError> {
        let element = self.element(host).ok_or(DomError::NotAnElement(host))?;
        if element.shadow_root.is_some() {
            return Err(DomError::ShadowRootExists(host));
        }

        let root = self.alloc(NodeData::ShadowRoot(ShadowRoot::new(host, mode)));
        if let Some(element) = self.element_mut(host) {
            element.shadow_root = Some(root);
        }
        Ok(root)
    }

    pub fn shadow_root(&self, host: NodeId) -> Option<&ShadowRoot> {
        let root = self.element(host)?.shadow_root?;
        self.get(root)?.as_shadow_root()
    }

    pub fn shadow_root_mut(&mut self, host: NodeId) -> Option<&mut ShadowRoot> {
        let root = self.element(host)?.shadow_root?;
        match &mut self.get_mut(root)?.data {
            NodeData::ShadowRoot(s) => Some(s),
            _ => None,
        }
    }

    /// Append `child` to `parent`, moving it if it already has a parent
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        if self.get(parent).is_none() {
            return Err(DomError::NotFound(parent));
        }
        if self.get(child).is_none() {
            return Err(DomError::NotFound(child));
        }
        if self.is_inclusive_ancestor(child, parent) {
            return Err(DomError::HierarchyRequest { child });
        }

        self.detach(child);
        self.nodes[child.index()].parent = Some(parent);
        self.nodes[parent.index()].children.push(child);
        self.mutations.push(DomEvent::node_inserted(child, parent));
        Ok(())
    }

    /// Unlink `child` from `parent`
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        match self.get(child) {
            Some(node) if node.parent == Some(parent) => {
                self.detach(child);
                Ok(())
            }
            _ => Err(DomError::NotFound(child)),
        }
    }

    /// Unlink a node from wherever it is; no-op when already detached
    pub fn remove(&mut self, node: NodeId) {
        self.detach(node);
    }

    fn detach(&mut self, node: NodeId) {
        let Some(parent) = self.get(node).and_then(|n| n.parent) else {
            return;
        };
        self.nodes[parent.index()].children.retain(|&c| c != node);
        self.nodes[node.index()].parent = None;
        self.mutations.push(DomEvent::node_removed(node, parent));
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id)?.parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Effective parent for connectivity: shadow roots hang off their host
    fn composed_parent(&self, id: NodeId) -> Option<NodeId> {
        let node = self.get(id)?;
        match &node.data {
            NodeData::ShadowRoot(s) => Some(s.host),
            _ => node.parent,
        }
    }

    fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.composed_parent(id);
        }
        false
    }

    /// Whether the node is reachable from the document, crossing shadow boundaries
    pub fn is_connected(&self, id: NodeId) -> bool {
        self.is_inclusive_ancestor(NodeId::ROOT, id)
    }

    /// Whether `node` sits inside `root`'s subtree (including shadow trees)
    pub fn contains(&self, root: NodeId, node: NodeId) -> bool {
        self.is_inclusive_ancestor(root, node)
    }

    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        self.get(id)?.as_element()
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        self.get_mut(id)?.as_element_mut()
    }

    pub fn get_attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id)?.attributes.get(name)
    }

    /// Set an attribute, returning the previous value
    pub fn set_attribute(
        &mut self,
        id: NodeId,
        name: &str,
        value: &str,
    ) -> Result<Option<String>, DomError> {
        let element = self.element_mut(id).ok_or(DomError::NotAnElement(id))?;
        let old = element.attributes.set(name, value);
        tracing::trace!(node = id.0, name, value, "attribute set");
        self.mutations
            .push(DomEvent::attr_modified(id, name, old.as_deref(), Some(value)));
        Ok(old)
    }

    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> Result<Option<String>, DomError> {
        let element = self.element_mut(id).ok_or(DomError::NotAnElement(id))?;
        let old = element.attributes.remove(name).map(|a| a.value);
        if old.is_some() {
            self.mutations
                .push(DomEvent::attr_modified(id, name, old.as_deref(), None));
        }
        Ok(old)
    }

    pub fn style(&self, id: NodeId) -> Option<&InlineStyle> {
        Some(&self.element(id)?.style)
    }

    /// Set one inline style property
    pub fn set_style(&mut self, id: NodeId, property: &str, value: &str) -> Result<(), DomError> {
        let element = self.element_mut(id).ok_or(DomError::NotAnElement(id))?;
        element.style.set(property, value);
        self.mutations.push(DomEvent::style_modified(id, property, value));
        Ok(())
    }

    /// Elements under `root` (shadow trees included) with the given tag, in tree order
    pub fn elements_by_tag_name(&self, root: NodeId, tag_name: &str) -> Vec<NodeId> {
        let mut found = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let Some(node) = self.get(id) else { continue };
            if let Some(element) = node.as_element() {
                if element.tag_name == tag_name {
                    found.push(id);
                }
                if let Some(shadow) = element.shadow_root {
                    stack.push(shadow);
                }
            }
            stack.extend(node.children.iter().rev());
        }
        found
    }

    /// Drain recorded mutation events
    pub fn take_mutations(&mut self) -> Vec<DomEvent> {
        std::mem::take(&mut self.mutations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DomEventType;

    #[test]
    fn test_append_and_remove() {
        let mut tree = DomTree::new();
        let div = tree.create_element("DIV");
        let img = tree.create_element("img");

        tree.append_child(NodeId::ROOT, div).unwrap();
        tree.append_child(div, img).unwrap();
        assert!(tree.is_connected(img));
        assert_eq!(tree.element(div).unwrap().tag_name, "div");

        tree.remove_child(div, img).unwrap();
        assert!(!tree.is_connected(img));
        assert!(tree.children(div).is_empty());

        let events = tree.take_mutations();
        assert_eq!(events.last().unwrap().event_type, DomEventType::NodeRemoved);
    }

    #[test]
    fn test_shadow_tree_is_connected_through_host() {
        let mut tree = DomTree::new();
        let host = tree.create_element("lazy-image");
        let root = tree.attach_shadow(host, ShadowRootMode::Open).unwrap();
        let img = tree.create_element("img");
        tree.append_child(root, img).unwrap();

        assert!(!tree.is_connected(img));
        tree.append_child(NodeId::ROOT, host).unwrap();
        assert!(tree.is_connected(img));
        assert!(tree.contains(host, img));
        assert_eq!(tree.elements_by_tag_name(host, "img"), vec![img]);

        assert_eq!(
            tree.attach_shadow(host, ShadowRootMode::Open),
            Err(DomError::ShadowRootExists(host))
        );
    }

    #[test]
    fn test_cycle_rejected() {
        let mut tree = DomTree::new();
        let outer = tree.create_element("div");
        let inner = tree.create_element("div");
        tree.append_child(outer, inner).unwrap();

        assert_eq!(
            tree.append_child(inner, outer),
            Err(DomError::HierarchyRequest { child: outer })
        );
    }

    #[test]
    fn test_attribute_mutation_records_old_value() {
        let mut tree = DomTree::new();
        let el = tree.create_element("lazy-image");

        assert_eq!(tree.set_attribute(el, "imageid", "a").unwrap(), None);
        assert_eq!(tree.set_attribute(el, "imageid", "b").unwrap(), Some("a".into()));

        let events = tree.take_mutations();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].prev_value.as_deref(), Some("a"));
    }
}
