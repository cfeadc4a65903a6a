//! Tree queries relative to a starting node.
//!
//! `tree.find_in_descendants(id).find(criteria)` returns the first match
//! along one axis. Descendants are searched breadth first; siblings are the
//! other children of the parent, keyed groups flattened. The start node
//! itself never matches.

use crate::component::ComponentType;
use crate::element::{ElementType, PrimitiveKind};
use crate::props::{Key, PropValue};
use crate::tree::{Node, NodeId, Tree};
use std::collections::VecDeque;

/// What a node must look like to match
#[derive(Debug, Clone, PartialEq)]
pub enum Criteria {
    Type(ElementType),
    /// Every `(path, value)` pair must equal the node's prop at that path
    Props(Vec<(String, PropValue)>),
    Key(Key),
}

impl Criteria {
    pub fn props<K: Into<String>, V: Into<PropValue>>(
        pairs: impl IntoIterator<Item = (K, V)>,
    ) -> Self {
        Criteria::Props(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn matches(&self, node: &Node) -> bool {
        match self {
            Criteria::Type(ty) => node.element_type() == ty,
            Criteria::Props(pairs) => {
                let props = node.props();
                pairs
                    .iter()
                    .all(|(path, value)| props.get_path(path) == Some(value))
            }
            Criteria::Key(key) => node.key() == Some(key),
        }
    }
}

impl From<ElementType> for Criteria {
    fn from(ty: ElementType) -> Self {
        Criteria::Type(ty)
    }
}

impl From<PrimitiveKind> for Criteria {
    fn from(kind: PrimitiveKind) -> Self {
        Criteria::Type(ElementType::Primitive(kind))
    }
}

impl From<&ComponentType> for Criteria {
    fn from(ty: &ComponentType) -> Self {
        Criteria::Type(ElementType::Custom(ty.clone()))
    }
}

impl From<Key> for Criteria {
    fn from(key: Key) -> Self {
        Criteria::Key(key)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Descendants,
    Ancestors,
    Siblings,
}

/// A search bound to a start node and axis
#[derive(Clone, Copy)]
pub struct Selector<'a> {
    tree: &'a Tree,
    start: NodeId,
    axis: Axis,
}

impl<'a> Selector<'a> {
    pub fn new(tree: &'a Tree, start: NodeId, axis: Axis) -> Self {
        Self { tree, start, axis }
    }

    /// First node along the axis matching `criteria`
    pub fn find(&self, criteria: impl Into<Criteria>) -> Option<NodeId> {
        let criteria = criteria.into();
        self.candidates()
            .into_iter()
            .find(|id| self.matches(*id, &criteria))
    }

    /// Every match along the axis, in search order
    pub fn find_all(&self, criteria: impl Into<Criteria>) -> Vec<NodeId> {
        let criteria = criteria.into();
        self.candidates()
            .into_iter()
            .filter(|id| self.matches(*id, &criteria))
            .collect()
    }

    fn matches(&self, id: NodeId, criteria: &Criteria) -> bool {
        self.tree.get(id).is_some_and(|node| criteria.matches(node))
    }

    fn candidates(&self) -> Vec<NodeId> {
        match self.axis {
            Axis::Descendants => self.tree.descendants(self.start),
            Axis::Ancestors => self.tree.ancestors(self.start),
            Axis::Siblings => self.tree.siblings(self.start),
        }
    }
}

impl Tree {
    pub fn find_in_descendants(&self, start: NodeId) -> Selector<'_> {
        Selector::new(self, start, Axis::Descendants)
    }

    pub fn find_in_ancestors(&self, start: NodeId) -> Selector<'_> {
        Selector::new(self, start, Axis::Ancestors)
    }

    pub fn find_in_siblings(&self, start: NodeId) -> Selector<'_> {
        Selector::new(self, start, Axis::Siblings)
    }

    /// Breadth-first walk below `start`, excluding it
    pub fn descendants(&self, start: NodeId) -> Vec<NodeId> {
        let mut found = Vec::new();
        let mut queue: VecDeque<NodeId> = self
            .get(start)
            .map(|node| node.child_ids().into())
            .unwrap_or_default();

        while let Some(id) = queue.pop_front() {
            if let Some(node) = self.get(id) {
                found.push(id);
                queue.extend(node.child_ids());
            }
        }
        found
    }

    /// Other children of the parent, in slot order
    pub fn siblings(&self, id: NodeId) -> Vec<NodeId> {
        self.get(id)
            .and_then(Node::parent)
            .and_then(|parent| self.get(parent))
            .map(|parent| {
                parent
                    .child_ids()
                    .into_iter()
                    .filter(|sibling| *sibling != id)
                    .collect()
            })
            .unwrap_or_default()
    }
}
