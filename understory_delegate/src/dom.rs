// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A minimal element tree implementing [`ElementLookup`].
//!
//! ## Overview
//!
//! [`Document`] holds a document node, elements and text nodes in slots
//! addressed by generational [`NodeId`]s. It exists so that delegation can be
//! exercised without a browser: tests, demos and benchmarks build small trees
//! with it. Hosts with their own tree implement [`ElementLookup`] directly.
//!
//! Nodes can be marked [opaque](Document::set_opaque) to model a boundary the
//! delegation root may not read across (for example a cross-origin frame);
//! reading such a node from a lookup yields [`NodeAccessDenied`].

use understory_selector::ElementData;

use crate::types::{ElementLookup, NodeAccessDenied};

/// Identifier for a node in a [`Document`].
///
/// A slot index plus a generation. Removing a node frees its slot; reuse
/// bumps the generation, so stale ids never alias a newer node.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct NodeId(u32, u32);

impl NodeId {
    const fn idx(self) -> usize {
        self.0 as usize
    }
}

/// Element properties used when inserting into a [`Document`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Element {
    tag_name: String,
    id: Option<String>,
    class_name: String,
}

impl Element {
    /// An element with the given tag name (stored uppercased, as HTML reports it).
    pub fn new(tag_name: &str) -> Self {
        Self {
            tag_name: tag_name.to_ascii_uppercase(),
            ..Self::default()
        }
    }

    /// Set the `id` attribute.
    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(id.to_owned());
        self
    }

    /// Set the whole `class` attribute.
    pub fn with_class(mut self, class_name: &str) -> Self {
        self.class_name = class_name.to_owned();
        self
    }
}

#[derive(Clone, Debug)]
enum Kind {
    Document,
    Element(Element),
    Text(String),
}

#[derive(Clone, Debug)]
struct Node {
    generation: u32,
    kind: Kind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    opaque: bool,
}

/// A small slot-based node tree with one document node at its root.
#[derive(Debug)]
pub struct Document {
    nodes: Vec<Option<Node>>,
    generations: Vec<u32>,
    free_list: Vec<usize>,
    root: NodeId,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create a document containing only its document node.
    pub fn new() -> Self {
        let mut doc = Self {
            nodes: Vec::new(),
            generations: Vec::new(),
            free_list: Vec::new(),
            root: NodeId(0, 1),
        };
        doc.root = doc.alloc(Kind::Document);
        doc
    }

    /// The document node.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Append an element as the last child of `parent`.
    ///
    /// A stale `parent` leaves the new node detached.
    pub fn append(&mut self, parent: NodeId, element: Element) -> NodeId {
        let id = self.alloc(Kind::Element(element));
        self.link_parent(id, parent);
        id
    }

    /// Append a text node as the last child of `parent`.
    pub fn append_text(&mut self, parent: NodeId, text: &str) -> NodeId {
        let id = self.alloc(Kind::Text(text.to_owned()));
        self.link_parent(id, parent);
        id
    }

    /// Remove a node and its subtree. The document node cannot be removed.
    pub fn remove(&mut self, id: NodeId) {
        if id == self.root || !self.is_alive(id) {
            return;
        }
        if let Some(parent) = self.node(id).and_then(|n| n.parent) {
            self.unlink_parent(id, parent);
        }
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if let Some(node) = self.nodes[next.idx()].take() {
                stack.extend(node.children);
                self.free_list.push(next.idx());
            }
        }
    }

    /// Move `id` to be the last child of `new_parent`.
    ///
    /// Does nothing if `new_parent` is `id` or one of its descendants.
    pub fn reparent(&mut self, id: NodeId, new_parent: NodeId) {
        if id == self.root || !self.is_alive(id) || !self.is_alive(new_parent) {
            return;
        }
        if self.is_inclusive_ancestor(id, new_parent) {
            return;
        }
        if let Some(parent) = self.node(id).and_then(|n| n.parent) {
            self.unlink_parent(id, parent);
        }
        self.link_parent(id, new_parent);
    }

    /// Replace the `class` attribute of an element.
    pub fn set_class_name(&mut self, id: NodeId, class_name: &str) {
        if let Some(Node {
            kind: Kind::Element(element),
            ..
        }) = self.node_mut(id)
        {
            element.class_name = class_name.to_owned();
        }
    }

    /// Mark a node as unreadable from the delegation root.
    pub fn set_opaque(&mut self, id: NodeId, opaque: bool) {
        if let Some(node) = self.node_mut(id) {
            node.opaque = opaque;
        }
    }

    /// Whether `id` refers to a live node.
    pub fn is_alive(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    /// Parent of a live node.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|n| n.parent)
    }

    /// Children of a live node, in document order.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id)
            .map(|n| n.children.as_slice())
            .unwrap_or_default()
    }

    /// Text content of a text node.
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.node(id)?.kind {
            Kind::Text(text) => Some(text.as_str()),
            _ => None,
        }
    }

    fn is_inclusive_ancestor(&self, ancestor: NodeId, mut node: NodeId) -> bool {
        loop {
            if node == ancestor {
                return true;
            }
            match self.parent(node) {
                Some(parent) => node = parent,
                None => return false,
            }
        }
    }

    fn alloc(&mut self, kind: Kind) -> NodeId {
        let (idx, generation) = if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx].saturating_add(1);
            self.generations[idx] = generation;
            (idx, generation)
        } else {
            self.nodes.push(None);
            self.generations.push(1);
            (self.nodes.len() - 1, 1)
        };
        self.nodes[idx] = Some(Node {
            generation,
            kind,
            parent: None,
            children: Vec::new(),
            opaque: false,
        });
        #[allow(
            clippy::cast_possible_truncation,
            reason = "Slot indices are 32-bit."
        )]
        let slot = idx as u32;
        NodeId(slot, generation)
    }

    fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes
            .get(id.idx())
            .and_then(Option::as_ref)
            .filter(|n| n.generation == id.1)
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes
            .get_mut(id.idx())
            .and_then(Option::as_mut)
            .filter(|n| n.generation == id.1)
    }

    fn link_parent(&mut self, id: NodeId, parent: NodeId) {
        let Some(p) = self.node_mut(parent) else {
            return;
        };
        p.children.push(id);
        if let Some(n) = self.node_mut(id) {
            n.parent = Some(parent);
        }
    }

    fn unlink_parent(&mut self, id: NodeId, parent: NodeId) {
        if let Some(p) = self.node_mut(parent) {
            p.children.retain(|c| *c != id);
        }
        if let Some(n) = self.node_mut(id) {
            n.parent = None;
        }
    }

    fn readable(&self, id: NodeId) -> Result<Option<&Node>, NodeAccessDenied> {
        match self.node(id) {
            Some(node) if node.opaque => Err(NodeAccessDenied),
            node => Ok(node),
        }
    }
}

impl ElementLookup<NodeId> for Document {
    fn element(&self, node: &NodeId) -> Result<Option<ElementData<'_>>, NodeAccessDenied> {
        Ok(self.readable(*node)?.and_then(|n| match &n.kind {
            Kind::Element(element) => Some(ElementData {
                tag_name: &element.tag_name,
                id: element.id.as_deref(),
                class_name: &element.class_name,
            }),
            Kind::Document | Kind::Text(_) => None,
        }))
    }

    fn parent_of(&self, node: &NodeId) -> Result<Option<NodeId>, NodeAccessDenied> {
        Ok(self.readable(*node)?.and_then(|n| n.parent))
    }
}
