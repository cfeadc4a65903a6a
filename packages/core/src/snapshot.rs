//! Serializable view of a live subtree, for debugging and golden tests.

use crate::props::{Key, PropMap};
use crate::tree::{MountState, NodeId, NodeKind, Slot, Tree};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeSnapshot {
    pub id: NodeId,
    #[serde(rename = "type")]
    pub type_name: String,
    pub custom: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<Key>,
    pub mount_state: MountState,
    pub props: PropMap,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<PropMap>,
    pub children: Vec<SlotSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "slot", rename_all = "lowercase")]
pub enum SlotSnapshot {
    Empty,
    Node { node: Box<NodeSnapshot> },
    Keyed { nodes: Vec<Option<NodeSnapshot>> },
}

impl NodeSnapshot {
    /// Node count including this one
    pub fn size(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(|slot| match slot {
                SlotSnapshot::Empty => 0,
                SlotSnapshot::Node { node } => node.size(),
                SlotSnapshot::Keyed { nodes } => nodes.iter().flatten().map(Self::size).sum(),
            })
            .sum::<usize>()
    }
}

impl Tree {
    pub fn snapshot(&self, id: NodeId) -> Option<NodeSnapshot> {
        let node = self.get(id)?;
        let state = match node.kind() {
            NodeKind::Custom(instance) => Some(instance.state().values().clone()),
            NodeKind::Primitive(_) => None,
        };

        let children = node
            .slots()
            .iter()
            .map(|slot| match slot {
                Slot::Empty => SlotSnapshot::Empty,
                Slot::Node(child) => match self.snapshot(*child) {
                    Some(snapshot) => SlotSnapshot::Node {
                        node: Box::new(snapshot),
                    },
                    None => SlotSnapshot::Empty,
                },
                Slot::Keyed(ids) => SlotSnapshot::Keyed {
                    nodes: ids
                        .iter()
                        .map(|child| child.and_then(|c| self.snapshot(c)))
                        .collect(),
                },
            })
            .collect();

        Some(NodeSnapshot {
            id,
            type_name: node.element_type().name().to_string(),
            custom: node.instance().is_some(),
            key: node.key().cloned(),
            mount_state: node.mount_state(),
            props: node.props().values().clone(),
            state,
            children,
        })
    }
}
