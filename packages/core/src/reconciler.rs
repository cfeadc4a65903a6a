//! # Reconciler
//!
//! Diffs fresh render output against a node's existing slots.
//!
//! Slot `i` of the output is matched with slot `i` of the current children:
//!
//! | current | incoming            | action                                  |
//! |---------|---------------------|-----------------------------------------|
//! | none    | none                | nothing                                 |
//! | some    | none                | unmount current                         |
//! | none    | some                | build + mount incoming                  |
//! | some    | some, same type     | push new props into current, keep it    |
//! | some    | some, other type    | build + mount incoming, then unmount    |
//!
//! Group slots are matched by key instead of position. Slots past the end
//! of the new output are unmounted.
//!
//! Nothing is rolled back on failure: slots diffed before the error keep
//! their new occupants, and every node left mounted stays in a slot so a
//! later pass can still unmount it.

use crate::component::Output;
use crate::element::{Child, Element, MountStrategy};
use crate::error::{ReconcileError, ReconcileResult};
use crate::host::HostRef;
use crate::props::Key;
use crate::renderer::Renderer;
use crate::tree::{NodeId, NodeKind, Slot};
use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use tracing::{debug, instrument};

impl Renderer {
    /// Apply a fresh render result to `id`. Primitives only refresh their
    /// backend node.
    #[instrument(level = "debug", skip(self, output))]
    pub fn update_component(&mut self, id: NodeId, output: Output) -> ReconcileResult<()> {
        let node = self.tree.node(id)?;
        match &node.kind {
            NodeKind::Primitive(primitive) => {
                primitive.graphic.update(&primitive.props);
                Ok(())
            }
            NodeKind::Custom(_) => match node.container.clone() {
                Some(container) => self.update_container(output, id, &container),
                None => {
                    debug!(?id, "Skipping diff for unmounted component");
                    Ok(())
                }
            },
        }
    }

    /// Diff `output` against the slots of `id`, mounting new nodes into
    /// `container`
    pub fn update_container(
        &mut self,
        output: Output,
        id: NodeId,
        container: &HostRef,
    ) -> ReconcileResult<()> {
        let entries = match output {
            Output::Empty => vec![Child::Empty],
            Output::Single(element) => vec![Child::Node(element)],
            Output::Many(children) => children,
        };

        let mut slots = self.tree.node(id)?.children.clone();
        let result = self.diff_slots(&entries, &mut slots, id, container);
        self.tree.node_mut(id)?.children = slots;
        result
    }

    fn diff_slots(
        &mut self,
        entries: &[Child],
        slots: &mut Vec<Slot>,
        parent: NodeId,
        container: &HostRef,
    ) -> ReconcileResult<()> {
        for (index, entry) in entries.iter().enumerate() {
            if index == slots.len() {
                slots.push(Slot::Empty);
            }
            self.diff_slot(&mut slots[index], entry, parent, container)?;
        }

        if slots.len() > entries.len() {
            let trailing: Vec<NodeId> = slots
                .drain(entries.len()..)
                .flat_map(|slot| slot.ids())
                .collect();
            debug!(count = trailing.len(), "Unmounting trailing children");
            self.unmount_all(trailing)?;
        }
        Ok(())
    }

    /// Diff one slot in place. The slot always ends up naming every node
    /// that is still live, even when an error cuts the diff short.
    fn diff_slot(
        &mut self,
        slot: &mut Slot,
        entry: &Child,
        parent: NodeId,
        container: &HostRef,
    ) -> ReconcileResult<()> {
        match entry {
            Child::Group(group) => {
                let mut ids = match std::mem::replace(slot, Slot::Keyed(Vec::new())) {
                    Slot::Keyed(ids) => ids,
                    other => {
                        self.unmount_all(other.ids())?;
                        Vec::new()
                    }
                };
                let result = self.diff_keyed(group, &mut ids, parent, container);
                *slot = Slot::Keyed(ids);
                result
            }
            Child::Node(_) | Child::Empty => {
                let mut current = match std::mem::replace(slot, Slot::Empty) {
                    Slot::Node(id) => Some(id),
                    Slot::Empty => None,
                    Slot::Keyed(ids) => {
                        self.unmount_all(ids.into_iter().flatten())?;
                        None
                    }
                };
                let incoming = match entry {
                    Child::Node(element) => Some(element),
                    _ => None,
                };
                let result = self.place_child(&mut current, incoming, parent, container);
                *slot = current.map(Slot::Node).unwrap_or(Slot::Empty);
                result
            }
        }
    }

    /// Reconcile one position
    pub fn update_child(
        &mut self,
        current: Option<NodeId>,
        incoming: Option<&Element>,
        parent: NodeId,
        container: &HostRef,
    ) -> ReconcileResult<Option<NodeId>> {
        let mut slot = current;
        self.place_child(&mut slot, incoming, parent, container)?;
        Ok(slot)
    }

    /// `update_child` on a slot held by the caller. A node is written into
    /// `slot` as soon as it exists, before mounting it can fail.
    fn place_child(
        &mut self,
        slot: &mut Option<NodeId>,
        incoming: Option<&Element>,
        parent: NodeId,
        container: &HostRef,
    ) -> ReconcileResult<()> {
        match (*slot, incoming) {
            (None, None) => Ok(()),
            (Some(current), None) => {
                *slot = None;
                self.unmount_component(current)
            }
            (None, Some(element)) => {
                let id = self.create_component(element, Some(parent))?;
                *slot = Some(id);
                self.mount_component(id, container)
            }
            (Some(current), Some(element)) => {
                if self.tree.node(current)?.ty == *element.element_type() {
                    return self.update_component_props_by_type(current, element);
                }
                debug!(
                    ?current,
                    to = %element.element_type().name(),
                    "Replacing child of different type"
                );
                let id = self.create_component(element, Some(parent))?;
                *slot = Some(id);
                // The old node goes even if the new one fails to mount
                let mounted = self.mount_component(id, container);
                let removed = self.unmount_component(current);
                mounted.and(removed)
            }
        }
    }

    /// Unmount every id, returning the first error after trying them all
    fn unmount_all(&mut self, ids: impl IntoIterator<Item = NodeId>) -> ReconcileResult<()> {
        let mut first_error = None;
        for id in ids {
            if let Err(e) = self.unmount_component(id) {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Reconcile a keyed collection. Every new element must carry a key.
    /// Matching keys keep their node (or are replaced on a type change),
    /// new keys are built, and keys that disappeared are unmounted. The
    /// result follows the order of `elements`.
    pub fn update_keyed_children(
        &mut self,
        elements: &[Element],
        current: Vec<Option<NodeId>>,
        parent: NodeId,
        container: &HostRef,
    ) -> ReconcileResult<Vec<Option<NodeId>>> {
        let mut ids = current;
        self.diff_keyed(elements, &mut ids, parent, container)?;
        Ok(ids)
    }

    /// Keyed diff in place. If an entry fails, `ids` keeps the entries
    /// processed so far followed by the old nodes nothing claimed yet.
    fn diff_keyed(
        &mut self,
        elements: &[Element],
        ids: &mut Vec<Option<NodeId>>,
        parent: NodeId,
        container: &HostRef,
    ) -> ReconcileResult<()> {
        let mut keys = Vec::with_capacity(elements.len());
        for (index, element) in elements.iter().enumerate() {
            match element.key() {
                Some(key) => keys.push(key),
                None => {
                    return Err(ReconcileError::MissingKey {
                        index,
                        component: self.tree.node(parent)?.ty.name().to_string(),
                    })
                }
            }
        }

        let mut previous: HashMap<Key, NodeId> = HashMap::new();
        let mut order = Vec::new();
        for id in ids.drain(..).flatten() {
            let Some(node) = self.tree.get(id) else {
                continue;
            };
            match node.key.clone() {
                Some(key) if !previous.contains_key(&key) => {
                    previous.insert(key, id);
                    order.push(id);
                }
                // Unkeyed or duplicate-keyed leftovers can never be matched
                _ => order.push(id),
            }
        }
        let mut claimed = HashSet::new();

        let mut failure = None;
        for (element, key) in elements.iter().zip(keys) {
            let mut slot = previous.remove(&key);
            if let Some(id) = slot {
                claimed.insert(id);
            }
            let result = self.place_child(&mut slot, Some(element), parent, container);
            ids.push(slot);
            if let Err(e) = result {
                failure = Some(e);
                break;
            }
        }

        let leftovers: Vec<NodeId> = order
            .into_iter()
            .filter(|id| !claimed.contains(id))
            .collect();
        if let Some(e) = failure {
            ids.extend(leftovers.into_iter().map(Some));
            return Err(e);
        }

        debug!(count = leftovers.len(), "Unmounting keyed children no longer present");
        self.unmount_all(leftovers)
    }

    /// Push an element's props into an existing node of the same type
    pub fn update_component_props_by_type(
        &mut self,
        id: NodeId,
        element: &Element,
    ) -> ReconcileResult<()> {
        let node = self.tree.node_mut(id)?;
        let mounted = node.is_mounted();
        let container = node.container.clone();

        match &mut node.kind {
            NodeKind::Custom(instance) => {
                let instance = Rc::clone(instance);
                let result =
                    instance.push_props(id, element.props().clone(), None, &self.scheduler);
                match result {
                    Ok(_) => Ok(()),
                    Err(error) => self.contain(id, error),
                }
            }
            NodeKind::Primitive(primitive) => {
                primitive.props = element.props().clone();
                primitive.graphic.update(&primitive.props);

                if !mounted {
                    return Ok(());
                }
                let host = match primitive.kind.mount_strategy() {
                    MountStrategy::Nesting => Some(Rc::clone(&primitive.graphic)),
                    MountStrategy::Passthrough => container,
                    MountStrategy::Leaf | MountStrategy::Input => None,
                };
                match host {
                    Some(host) => {
                        let children = Output::Many(element.children().to_vec());
                        self.update_container(children, id, &host)
                    }
                    None => Ok(()),
                }
            }
        }
    }
}
