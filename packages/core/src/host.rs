//! Contracts with the rendering backend.
//!
//! The engine never inspects backend nodes; it only asks them to take a
//! child, remove themselves and refresh from props. Backend nodes are shared
//! (`Rc`) and use interior mutability, the same way retained scene graphs
//! hand out node references.

use crate::element::{Element, ElementType, PrimitiveKind};
use crate::error::BoxError;
use crate::props::Props;
use crate::tree::NodeId;
use std::any::Any;
use std::fmt;
use std::rc::Rc;

/// A backend-native node (or any container the engine mounts into)
pub trait HostNode {
    /// Attach `child` under this node
    fn add_child(&self, child: &HostRef);

    /// Detach this node from wherever it is attached
    fn remove_self(&self) {}

    /// Re-apply visual state from props
    fn update(&self, _props: &Props) {}

    /// Back-reference from the node to its live component, for event dispatch
    fn bind_component(&self, _id: NodeId) {}

    /// Event-bubbling link used by input-like nodes hosted elsewhere
    fn link_event_parent(&self, _parent: &HostRef) {}

    /// Concrete access for backends that need to recognise their own nodes
    fn as_any(&self) -> Option<&dyn Any> {
        None
    }
}

pub type HostRef = Rc<dyn HostNode>;

/// What a factory hands back for a primitive element
pub struct PrimitiveInstance {
    pub graphic: HostRef,
    /// Pre-assigned container (input-like kinds only)
    pub container: Option<HostRef>,
}

impl PrimitiveInstance {
    pub fn new(graphic: HostRef) -> Self {
        Self {
            graphic,
            container: None,
        }
    }

    pub fn with_container(mut self, container: HostRef) -> Self {
        self.container = Some(container);
        self
    }
}

/// Instantiates backend nodes per primitive kind
pub trait NodeFactory {
    fn create(
        &self,
        kind: PrimitiveKind,
        element: &Element,
        meta: &Meta,
    ) -> Result<PrimitiveInstance, BoxError>;

    /// Engine-specific substitute for a primitive kind, if any
    fn real_type(&self, _kind: PrimitiveKind) -> Option<ElementType> {
        None
    }
}

/// Ambient bundle threaded through every tree operation. Owned by the
/// caller; the engine only clones the handle.
#[derive(Clone)]
pub struct Meta {
    factory: Rc<dyn NodeFactory>,
    context: Option<Rc<dyn Any>>,
    assets: Option<Rc<dyn Any>>,
    root: HostRef,
}

impl Meta {
    pub fn new(factory: Rc<dyn NodeFactory>, root: HostRef) -> Self {
        Self {
            factory,
            context: None,
            assets: None,
            root,
        }
    }

    pub fn with_context<T: Any>(mut self, context: Rc<T>) -> Self {
        self.context = Some(context);
        self
    }

    pub fn with_assets<T: Any>(mut self, assets: Rc<T>) -> Self {
        self.assets = Some(assets);
        self
    }

    pub fn factory(&self) -> &dyn NodeFactory {
        self.factory.as_ref()
    }

    pub fn root(&self) -> &HostRef {
        &self.root
    }

    /// Typed access to the caller's context manager
    pub fn context<T: Any>(&self) -> Option<&T> {
        self.context.as_ref()?.downcast_ref::<T>()
    }

    /// Typed access to the caller's asset manager
    pub fn assets<T: Any>(&self) -> Option<&T> {
        self.assets.as_ref()?.downcast_ref::<T>()
    }
}

impl fmt::Debug for Meta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Meta")
            .field("context", &self.context.is_some())
            .field("assets", &self.assets.is_some())
            .finish_non_exhaustive()
    }
}
