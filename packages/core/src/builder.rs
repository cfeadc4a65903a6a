//! Element → live tree construction.
//!
//! Building instantiates components and backend nodes but attaches nothing;
//! mounting is a separate step. A failure part way releases everything built
//! for the failing element, so no half-built node stays in the arena.

use crate::component::{ComponentType, Instance, Output};
use crate::element::{Child, Element, ElementType, PrimitiveKind};
use crate::error::{ReconcileError, ReconcileResult};
use crate::renderer::Renderer;
use crate::tree::{Node, NodeId, NodeKind, PrimitiveNode, Slot};
use std::rc::Rc;
use tracing::debug;

impl Renderer {
    /// Build the live subtree for `element` under `parent`
    pub fn create_component(
        &mut self,
        element: &Element,
        parent: Option<NodeId>,
    ) -> ReconcileResult<NodeId> {
        let depth = match parent {
            Some(parent_id) => self.tree.node(parent_id)?.depth + 1,
            None => 0,
        };
        if depth > self.config.max_depth {
            return Err(ReconcileError::DepthLimit {
                limit: self.config.max_depth,
            });
        }

        let declared = element.element_type().clone();
        match &declared {
            ElementType::Primitive(kind) => {
                // Backends may substitute a kind; only one hop is followed
                match self.meta.factory().real_type(*kind) {
                    Some(ElementType::Primitive(real)) if real != *kind => {
                        debug!(from = %kind, to = %real, "Resolved primitive alias");
                        self.build_primitive(real, declared.clone(), element, parent, depth)
                    }
                    Some(ElementType::Custom(ty)) => {
                        debug!(from = %kind, to = %ty.name(), "Resolved primitive alias");
                        self.build_custom(&ty, declared.clone(), element, parent, depth)
                    }
                    _ => self.build_primitive(*kind, declared.clone(), element, parent, depth),
                }
            }
            ElementType::Custom(ty) => {
                self.build_custom(ty, declared.clone(), element, parent, depth)
            }
        }
    }

    fn build_primitive(
        &mut self,
        kind: PrimitiveKind,
        declared: ElementType,
        element: &Element,
        parent: Option<NodeId>,
        depth: usize,
    ) -> ReconcileResult<NodeId> {
        let instance = self
            .meta
            .factory()
            .create(kind, element, &self.meta)
            .map_err(|e| ReconcileError::Factory {
                kind,
                message: e.to_string(),
            })?;
        let graphic = instance.graphic.clone();

        let node = Node::new(
            declared,
            element.key(),
            parent,
            depth,
            NodeKind::Primitive(PrimitiveNode {
                kind,
                graphic: instance.graphic,
                props: element.props().clone(),
                preset_container: instance.container,
            }),
        );
        let id = self.tree.insert(node);
        self.stats.built += 1;

        let slots = match self.build_slots(element.children(), id) {
            Ok(slots) => slots,
            Err(e) => {
                self.tree.release_subtree(id);
                return Err(e);
            }
        };
        self.tree.node_mut(id)?.children = slots;

        graphic.bind_component(id);
        Ok(id)
    }

    fn build_custom(
        &mut self,
        ty: &ComponentType,
        declared: ElementType,
        element: &Element,
        parent: Option<NodeId>,
        depth: usize,
    ) -> ReconcileResult<NodeId> {
        let instance = Rc::new(Instance::new(
            ty.clone(),
            element.props().clone(),
            self.meta.clone(),
        ));
        let node = Node::new(
            declared,
            element.key(),
            parent,
            depth,
            NodeKind::Custom(Rc::clone(&instance)),
        );
        // Inserted before rendering so boundary lookup can walk the parents
        let id = self.tree.insert(node);
        self.stats.built += 1;

        let cx = instance.context(id, &self.scheduler);
        let output = match instance.render(&cx) {
            Ok(output) => output,
            Err(error) => match self.contain(id, error) {
                Ok(()) => Output::Empty,
                Err(e) => {
                    self.tree.release_subtree(id);
                    return Err(e);
                }
            },
        };

        let slots = match self.build_output(output, id) {
            Ok(slots) => slots,
            Err(e) => {
                self.tree.release_subtree(id);
                return Err(e);
            }
        };
        self.tree.node_mut(id)?.children = slots;
        Ok(id)
    }

    pub(crate) fn build_output(
        &mut self,
        output: Output,
        parent: NodeId,
    ) -> ReconcileResult<Vec<Slot>> {
        match output {
            Output::Empty => Ok(Vec::new()),
            Output::Single(element) => {
                Ok(vec![Slot::Node(self.create_component(&element, Some(parent))?)])
            }
            Output::Many(children) => self.build_slots(&children, parent),
        }
    }

    fn build_slots(&mut self, children: &[Child], parent: NodeId) -> ReconcileResult<Vec<Slot>> {
        let mut slots = Vec::with_capacity(children.len());
        for child in children {
            match self.build_slot(child, parent) {
                Ok(slot) => slots.push(slot),
                Err(e) => {
                    for id in slots.iter().flat_map(Slot::ids) {
                        self.tree.release_subtree(id);
                    }
                    return Err(e);
                }
            }
        }
        Ok(slots)
    }

    fn build_slot(&mut self, child: &Child, parent: NodeId) -> ReconcileResult<Slot> {
        match child {
            Child::Empty => Ok(Slot::Empty),
            Child::Node(element) => Ok(Slot::Node(self.create_component(element, Some(parent))?)),
            Child::Group(group) => {
                if let Some(index) = group.iter().position(|e| e.key().is_none()) {
                    return Err(ReconcileError::MissingKey {
                        index,
                        component: self.tree.node(parent)?.ty.name().to_string(),
                    });
                }
                let mut ids = Vec::with_capacity(group.len());
                for element in group {
                    match self.create_component(element, Some(parent)) {
                        Ok(id) => ids.push(id),
                        Err(e) => {
                            for id in ids {
                                self.tree.release_subtree(id);
                            }
                            return Err(e);
                        }
                    }
                }
                Ok(Slot::Keyed(ids.into_iter().map(Some).collect()))
            }
        }
    }
}
