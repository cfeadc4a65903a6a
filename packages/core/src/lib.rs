//! # Stagehand
//!
//! A retained-mode component reconciliation engine for 2D scene-graph
//! backends. Applications describe the scene as immutable [`Element`]s;
//! the [`Renderer`] builds a live tree of components from them, mounts it
//! onto backend nodes through a [`NodeFactory`], and on every state or props
//! change re-renders and diffs the affected component, touching only the
//! backend nodes that actually changed.
//!
//! ```ignore
//! let backend = HeadlessBackend::new();
//! let mut renderer = Renderer::new(backend.meta());
//! let app = Element::builder(&counter).prop("start", 1).build()?;
//! let id = renderer.render_root(&app)?;
//! renderer.handle(id).unwrap().set_state(prop_map([("count", 2)]));
//! renderer.flush()?;
//! ```

pub mod boundary;
pub mod builder;
pub mod component;
pub mod config;
pub mod element;
pub mod error;
pub mod headless;
pub mod host;
pub mod mount;
pub mod props;
pub mod reconciler;
pub mod renderer;
pub mod scheduler;
pub mod selector;
pub mod snapshot;
pub mod tree;

#[cfg(test)]
mod test_support;


#[cfg(test)]
mod tests_reconciler;

#[cfg(test)]
mod tests_keyed;


#[cfg(test)]
mod tests_selectors;


pub use component::{
    Change, Component, ComponentHandle, ComponentType, Context, ErrorBoundary, HookResult,
    Output, Update,
};
pub use config::{ConfigError, ReconcilerConfig, DEFAULT_CONFIG_NAME};
pub use element::{
    create_element, Child, Element, ElementBuilder, ElementType, MountStrategy, PrimitiveKind,
    PropChildren, TypeTag,
};
pub use error::{
    BoxError, LifecyclePhase, ReconcileError, ReconcileResult, RenderBoundaryError,
};
pub use headless::{HeadlessBackend, HeadlessFactory, HeadlessNode, HostOp, Journal};
pub use host::{HostNode, HostRef, Meta, NodeFactory, PrimitiveInstance};
pub use props::{prop_map, Callback, Key, PropMap, PropValue, Props, State};
pub use renderer::{FlushReport, Renderer, Stats};
pub use scheduler::{Scheduler, Task, TaskReason};
pub use selector::{Axis, Criteria, Selector};
pub use snapshot::{NodeSnapshot, SlotSnapshot};
pub use tree::{MountState, Node, NodeId, NodeKind, Slot, Tree};
