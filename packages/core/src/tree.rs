//! Live component tree storage.
//!
//! Nodes live in a generational arena. A parent owns its children through
//! the ids stored in its slots; a child only keeps its parent's id for
//! navigation. Removing a node bumps the slot generation, so stale ids held
//! by handles or selectors simply stop resolving.

use crate::component::Instance;
use crate::element::{ElementType, PrimitiveKind};
use crate::error::{ReconcileError, ReconcileResult};
use crate::host::HostRef;
use crate::props::{Key, Props};
use serde::Serialize;
use std::rc::Rc;

/// Generational handle to a live node
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MountState {
    Unmounted,
    Mounted,
}

/// One child position of a node
#[derive(Debug, Clone, PartialEq)]
pub enum Slot {
    Empty,
    Node(NodeId),
    Keyed(Vec<Option<NodeId>>),
}

impl Slot {
    /// Every node id held by this slot, in order
    pub fn ids(&self) -> Vec<NodeId> {
        match self {
            Slot::Empty => Vec::new(),
            Slot::Node(id) => vec![*id],
            Slot::Keyed(ids) => ids.iter().flatten().copied().collect(),
        }
    }
}

pub struct PrimitiveNode {
    pub kind: PrimitiveKind,
    pub graphic: HostRef,
    pub props: Props,
    /// Container assigned by the factory (input-like kinds)
    pub preset_container: Option<HostRef>,
}

pub enum NodeKind {
    Custom(Rc<Instance>),
    Primitive(PrimitiveNode),
}

/// A live component
pub struct Node {
    pub(crate) ty: ElementType,
    pub(crate) key: Option<Key>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) container: Option<HostRef>,
    pub(crate) children: Vec<Slot>,
    pub(crate) mount_state: MountState,
    pub(crate) depth: usize,
    pub(crate) kind: NodeKind,
}

impl Node {
    pub(crate) fn new(
        ty: ElementType,
        key: Option<Key>,
        parent: Option<NodeId>,
        depth: usize,
        kind: NodeKind,
    ) -> Self {
        Self {
            ty,
            key,
            parent,
            container: None,
            children: Vec::new(),
            mount_state: MountState::Unmounted,
            depth,
            kind,
        }
    }

    pub fn element_type(&self) -> &ElementType {
        &self.ty
    }

    pub fn key(&self) -> Option<&Key> {
        self.key.as_ref()
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn container(&self) -> Option<&HostRef> {
        self.container.as_ref()
    }

    pub fn slots(&self) -> &[Slot] {
        &self.children
    }

    pub fn mount_state(&self) -> MountState {
        self.mount_state
    }

    pub fn is_mounted(&self) -> bool {
        self.mount_state == MountState::Mounted
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Props currently applied to this node
    pub fn props(&self) -> Props {
        match &self.kind {
            NodeKind::Custom(instance) => instance.props(),
            NodeKind::Primitive(primitive) => primitive.props.clone(),
        }
    }

    pub fn instance(&self) -> Option<&Rc<Instance>> {
        match &self.kind {
            NodeKind::Custom(instance) => Some(instance),
            NodeKind::Primitive(_) => None,
        }
    }

    pub fn primitive(&self) -> Option<&PrimitiveNode> {
        match &self.kind {
            NodeKind::Primitive(primitive) => Some(primitive),
            NodeKind::Custom(_) => None,
        }
    }

    /// Ids of all direct children, keyed groups flattened
    pub fn child_ids(&self) -> Vec<NodeId> {
        self.children.iter().flat_map(Slot::ids).collect()
    }
}

struct Entry {
    generation: u32,
    node: Option<Node>,
}

/// Arena of live nodes
#[derive(Default)]
pub struct Tree {
    entries: Vec<Entry>,
    free_list: Vec<u32>,
    len: usize,
}

impl Tree {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, node: Node) -> NodeId {
        self.len += 1;

        if let Some(index) = self.free_list.pop() {
            let entry = &mut self.entries[index as usize];
            entry.node = Some(node);
            return NodeId {
                index,
                generation: entry.generation,
            };
        }

        let index = self.entries.len() as u32;
        self.entries.push(Entry {
            generation: 0,
            node: Some(node),
        });
        NodeId {
            index,
            generation: 0,
        }
    }

    /// Drop a node from the arena, invalidating its id
    pub(crate) fn remove(&mut self, id: NodeId) -> Option<Node> {
        let entry = self.entries.get_mut(id.index as usize)?;
        if entry.generation != id.generation {
            return None;
        }
        let node = entry.node.take()?;
        entry.generation = entry.generation.wrapping_add(1);
        self.free_list.push(id.index);
        self.len -= 1;
        Some(node)
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        let entry = self.entries.get(id.index as usize)?;
        if entry.generation != id.generation {
            return None;
        }
        entry.node.as_ref()
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        let entry = self.entries.get_mut(id.index as usize)?;
        if entry.generation != id.generation {
            return None;
        }
        entry.node.as_mut()
    }

    /// Like `get`, but a dangling id is an `UnrecognizedComponent` error
    pub fn node(&self, id: NodeId) -> ReconcileResult<&Node> {
        self.get(id)
            .ok_or(ReconcileError::UnrecognizedComponent { id })
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> ReconcileResult<&mut Node> {
        self.get_mut(id)
            .ok_or(ReconcileError::UnrecognizedComponent { id })
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Walk the parent chain, nearest first
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut chain = Vec::new();
        let mut current = self.get(id).and_then(Node::parent);
        while let Some(parent_id) = current {
            chain.push(parent_id);
            current = self.get(parent_id).and_then(Node::parent);
        }
        chain
    }

    /// Remove a node and everything under it from the arena
    pub(crate) fn release_subtree(&mut self, id: NodeId) {
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if let Some(node) = self.remove(next) {
                stack.extend(node.child_ids());
            }
        }
    }
}
