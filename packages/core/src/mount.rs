//! Attaching and detaching live subtrees.
//!
//! Mount order for a custom component: `will_mount`, children, `did_mount`.
//! Primitives follow their kind's [`MountStrategy`]. Both operations are
//! idempotent; the mount flag is flipped before any hook runs.
//!
//! A failing hook is routed to the nearest error boundary. Uncaught
//! failures propagate without rolling back what was already attached.
//! Unmounting finishes tearing down the subtree before reporting one.

use crate::component::Instance;
use crate::element::MountStrategy;
use crate::error::{LifecyclePhase, ReconcileResult};
use crate::host::HostRef;
use crate::renderer::Renderer;
use crate::tree::{MountState, NodeId, NodeKind, Slot};
use std::rc::Rc;
use tracing::debug;

impl Renderer {
    pub fn mount_component(&mut self, id: NodeId, container: &HostRef) -> ReconcileResult<()> {
        let node = self.tree.node_mut(id)?;
        if node.is_mounted() {
            return Ok(());
        }
        node.mount_state = MountState::Mounted;
        node.container = Some(Rc::clone(container));
        self.stats.mounted += 1;

        match &node.kind {
            NodeKind::Custom(instance) => {
                let instance = Rc::clone(instance);
                self.mount_custom(id, &instance, container)
            }
            NodeKind::Primitive(primitive) => {
                let strategy = primitive.kind.mount_strategy();
                let graphic = Rc::clone(&primitive.graphic);
                let props = primitive.props.clone();
                let preset = primitive.preset_container.clone();
                let children = node.child_ids();

                match strategy {
                    MountStrategy::Nesting => {
                        container.add_child(&graphic);
                        for child in children {
                            self.mount_component(child, &graphic)?;
                        }
                    }
                    MountStrategy::Leaf => container.add_child(&graphic),
                    MountStrategy::Passthrough => {
                        for child in children {
                            self.mount_component(child, container)?;
                        }
                    }
                    MountStrategy::Input => {
                        let target = preset.unwrap_or_else(|| Rc::clone(container));
                        target.add_child(&graphic);
                        graphic.link_event_parent(container);
                    }
                }
                graphic.update(&props);
                Ok(())
            }
        }
    }

    fn mount_custom(
        &mut self,
        id: NodeId,
        instance: &Rc<Instance>,
        container: &HostRef,
    ) -> ReconcileResult<()> {
        let cx = instance.context(id, &self.scheduler);
        let result = instance.run_hook(LifecyclePhase::WillMount, |c| c.will_mount(&cx));
        self.guard(id, result)?;

        for child in self.tree.node(id)?.child_ids() {
            self.mount_component(child, container)?;
        }

        let cx = instance.context(id, &self.scheduler);
        let result = instance.run_hook(LifecyclePhase::DidMount, |c| c.did_mount(&cx));
        self.guard(id, result)?;
        debug!(?id, component = %instance.name(), "Mounted component");
        Ok(())
    }

    /// Tear down a subtree: detach backend nodes, run `will_unmount`, and
    /// release the arena slots. Unknown or already-released ids are a no-op.
    /// A failing hook does not stop the teardown; the first uncaught error
    /// is returned once the whole subtree is gone.
    pub fn unmount_component(&mut self, id: NodeId) -> ReconcileResult<()> {
        if !self.tree.contains(id) {
            return Ok(());
        }
        let result = self.unmount_inner(id, true);
        self.detach_from_parent(id);
        self.tree.release_subtree(id);
        result
    }

    /// `detach` is false once an ancestor backend node has been removed,
    /// since everything under it left the scene with it.
    fn unmount_inner(&mut self, id: NodeId, detach: bool) -> ReconcileResult<()> {
        let node = self.tree.node_mut(id)?;
        if !node.is_mounted() {
            return Ok(());
        }
        node.mount_state = MountState::Unmounted;
        self.stats.unmounted += 1;
        let children = node.child_ids();

        match &node.kind {
            NodeKind::Custom(instance) => {
                let instance = Rc::clone(instance);
                let cx = instance.context(id, &self.scheduler);
                let result =
                    instance.run_hook(LifecyclePhase::WillUnmount, |c| c.will_unmount(&cx));
                let hook = self.guard(id, result);
                let cascade = self.unmount_children(children, detach);
                hook.and(cascade)
            }
            NodeKind::Primitive(primitive) => {
                if primitive.kind.mount_strategy() == MountStrategy::Passthrough {
                    return self.unmount_children(children, detach);
                }
                if detach {
                    primitive.graphic.remove_self();
                }
                self.unmount_children(children, false)
            }
        }
    }

    fn unmount_children(&mut self, children: Vec<NodeId>, detach: bool) -> ReconcileResult<()> {
        let mut first_error = None;
        for child in children {
            if let Err(e) = self.unmount_inner(child, detach) {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    fn detach_from_parent(&mut self, id: NodeId) {
        let Some(parent) = self.tree.get(id).and_then(|n| n.parent) else {
            return;
        };
        let Some(parent) = self.tree.get_mut(parent) else {
            return;
        };
        for slot in parent.children.iter_mut() {
            match slot {
                Slot::Node(child) if *child == id => *slot = Slot::Empty,
                Slot::Keyed(ids) => {
                    for entry in ids.iter_mut() {
                        if *entry == Some(id) {
                            *entry = None;
                        }
                    }
                }
                _ => {}
            }
        }
    }
}
