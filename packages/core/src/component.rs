//! # Component Base
//!
//! Custom components implement [`Component`]. The engine wraps each live
//! one in an [`Instance`] that stores its props and state, and hands user
//! code a [`Context`] (a snapshot of props/state plus a [`ComponentHandle`]).
//!
//! ## Scheduling contract
//!
//! `set_state` merges the partial state and makes it visible at once. If
//! `should_rerender` says yes, the render + diff pass, the callback and
//! `did_update` are deferred to a later scheduler turn. If it says no, the
//! callback runs synchronously and nothing is scheduled.
//!
//! `update_props` follows the same rules and additionally calls
//! `will_receive_props` (before the new props are applied) when a
//! re-render will happen.
//!
//! Hooks take `&self`; components that keep private mutable fields use
//! `Cell`/`RefCell`. Anything that should drive re-rendering belongs in
//! state.

use crate::element::{Child, Element, PropChildren};
use crate::error::{BoxError, LifecyclePhase, RenderBoundaryError};
use crate::host::Meta;
use crate::props::{PropMap, Props, State};
use crate::scheduler::{Scheduler, Task, TaskReason, UpdateCallback};
use crate::tree::NodeId;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use tracing::debug;

pub type HookResult = Result<(), BoxError>;

/// What `render()` returns
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Output {
    #[default]
    Empty,
    Single(Element),
    /// One slot per entry; `Child::Group` entries are keyed collections
    Many(Vec<Child>),
}

impl From<Element> for Output {
    fn from(element: Element) -> Self {
        Output::Single(element)
    }
}

impl From<Option<Element>> for Output {
    fn from(element: Option<Element>) -> Self {
        element.map(Output::Single).unwrap_or(Output::Empty)
    }
}

impl From<Vec<Child>> for Output {
    fn from(children: Vec<Child>) -> Self {
        Output::Many(children)
    }
}

impl From<Vec<Element>> for Output {
    fn from(elements: Vec<Element>) -> Self {
        Output::Many(elements.into_iter().map(Child::Node).collect())
    }
}

impl From<&PropChildren> for Output {
    fn from(children: &PropChildren) -> Self {
        match children {
            PropChildren::Single(element) => element.clone().into(),
            PropChildren::Many(_) => Output::Many(children.to_children()),
        }
    }
}

/// Before/after view handed to `should_rerender`
#[derive(Debug)]
pub struct Change<'a> {
    pub prev_props: &'a Props,
    pub next_props: &'a Props,
    pub prev_state: &'a State,
    pub next_state: &'a State,
}

impl Change<'_> {
    pub fn props_changed(&self) -> bool {
        !Props::ptr_eq(self.prev_props, self.next_props)
    }

    pub fn state_changed(&self) -> bool {
        !State::ptr_eq(self.prev_state, self.next_state)
    }
}

/// A user-defined stateful unit
pub trait Component {
    fn render(&self, cx: &Context) -> Result<Output, BoxError>;

    fn initial_state(&self, _props: &Props) -> PropMap {
        PropMap::new()
    }

    fn will_mount(&self, _cx: &Context) -> HookResult {
        Ok(())
    }

    fn did_mount(&self, _cx: &Context) -> HookResult {
        Ok(())
    }

    fn will_unmount(&self, _cx: &Context) -> HookResult {
        Ok(())
    }

    fn did_update(&self, _cx: &Context) -> HookResult {
        Ok(())
    }

    fn will_receive_props(&self, _cx: &Context, _next: &Props) -> HookResult {
        Ok(())
    }

    /// Shallow identity check by default
    fn should_rerender(&self, change: &Change<'_>) -> bool {
        change.props_changed() || change.state_changed()
    }

    /// Components that catch descendant failures return themselves here
    fn error_boundary(&self) -> Option<&dyn ErrorBoundary> {
        None
    }
}

pub trait ErrorBoundary {
    fn did_catch(&self, cx: &Context, error: &RenderBoundaryError);
}

type Constructor = dyn Fn(&Props, &Meta) -> Box<dyn Component>;

struct TypeInner {
    name: String,
    construct: Box<Constructor>,
}

/// Identity of a custom component definition. Two element types are the
/// same only if they share this handle.
#[derive(Clone)]
pub struct ComponentType(Rc<TypeInner>);

impl ComponentType {
    pub fn new<F, C>(name: impl Into<String>, construct: F) -> Self
    where
        F: Fn(&Props, &Meta) -> C + 'static,
        C: Component + 'static,
    {
        ComponentType(Rc::new(TypeInner {
            name: name.into(),
            construct: Box::new(move |props, meta| Box::new(construct(props, meta))),
        }))
    }

    /// Definition for a component built with `Default`
    pub fn of<C: Component + Default + 'static>(name: impl Into<String>) -> Self {
        Self::new(name, |_, _| C::default())
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn ptr_eq(a: &ComponentType, b: &ComponentType) -> bool {
        Rc::ptr_eq(&a.0, &b.0)
    }

    fn instantiate(&self, props: &Props, meta: &Meta) -> Box<dyn Component> {
        (self.0.construct)(props, meta)
    }
}

impl PartialEq for ComponentType {
    fn eq(&self, other: &Self) -> bool {
        ComponentType::ptr_eq(self, other)
    }
}

impl fmt::Debug for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentType({})", self.0.name)
    }
}

struct Base {
    props: Props,
    state: State,
}

/// Outcome of a state/props change request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Update {
    /// A render + diff pass was queued
    Scheduled,
    /// Applied without re-rendering; the callback already ran
    Applied,
    /// The component no longer exists
    Detached,
}

/// Live custom component: user logic plus props/state storage
pub struct Instance {
    ty: ComponentType,
    logic: Box<dyn Component>,
    meta: Meta,
    base: RefCell<Base>,
}

impl Instance {
    pub(crate) fn new(ty: ComponentType, props: Props, meta: Meta) -> Self {
        let logic = ty.instantiate(&props, &meta);
        let state = State::new(logic.initial_state(&props));
        Self {
            ty,
            logic,
            meta,
            base: RefCell::new(Base { props, state }),
        }
    }

    pub fn component_type(&self) -> &ComponentType {
        &self.ty
    }

    pub fn name(&self) -> &str {
        self.ty.name()
    }

    pub fn logic(&self) -> &dyn Component {
        self.logic.as_ref()
    }

    pub fn props(&self) -> Props {
        self.base.borrow().props.clone()
    }

    pub fn state(&self) -> State {
        self.base.borrow().state.clone()
    }

    pub(crate) fn context(self: &Rc<Self>, id: NodeId, scheduler: &Rc<Scheduler>) -> Context {
        let base = self.base.borrow();
        Context {
            id,
            props: base.props.clone(),
            state: base.state.clone(),
            meta: self.meta.clone(),
            handle: ComponentHandle::new(id, self, scheduler),
        }
    }

    /// Run one lifecycle hook, tagging a failure with its phase
    pub(crate) fn run_hook(
        &self,
        phase: LifecyclePhase,
        hook: impl FnOnce(&dyn Component) -> HookResult,
    ) -> Result<(), RenderBoundaryError> {
        hook(self.logic.as_ref()).map_err(|e| RenderBoundaryError::new(self.name(), phase, e))
    }

    pub(crate) fn render(&self, cx: &Context) -> Result<Output, RenderBoundaryError> {
        self.logic
            .render(cx)
            .map_err(|e| RenderBoundaryError::new(self.name(), LifecyclePhase::Render, e))
    }

    pub(crate) fn set_state(
        self: &Rc<Self>,
        id: NodeId,
        partial: PropMap,
        callback: Option<UpdateCallback>,
        scheduler: &Rc<Scheduler>,
    ) -> Update {
        let (props, prev_state) = {
            let base = self.base.borrow();
            (base.props.clone(), base.state.clone())
        };
        let next_state = prev_state.merge(partial);
        self.base.borrow_mut().state = next_state.clone();

        let rerender = self.logic.should_rerender(&Change {
            prev_props: &props,
            next_props: &props,
            prev_state: &prev_state,
            next_state: &next_state,
        });

        self.finish(id, rerender, TaskReason::State, callback, scheduler)
    }

    /// Install new props (full replacement). Shared by the reconciler and
    /// `ComponentHandle::update_props`.
    pub(crate) fn push_props(
        self: &Rc<Self>,
        id: NodeId,
        next_props: Props,
        callback: Option<UpdateCallback>,
        scheduler: &Rc<Scheduler>,
    ) -> Result<Update, RenderBoundaryError> {
        let (prev_props, state) = {
            let base = self.base.borrow();
            (base.props.clone(), base.state.clone())
        };

        let rerender = self.logic.should_rerender(&Change {
            prev_props: &prev_props,
            next_props: &next_props,
            prev_state: &state,
            next_state: &state,
        });

        if rerender {
            let cx = self.context(id, scheduler);
            self.logic
                .will_receive_props(&cx, &next_props)
                .map_err(|e| {
                    RenderBoundaryError::new(self.name(), LifecyclePhase::WillReceiveProps, e)
                })?;
        }

        self.base.borrow_mut().props = next_props;
        Ok(self.finish(id, rerender, TaskReason::Props, callback, scheduler))
    }

    fn finish(
        &self,
        id: NodeId,
        rerender: bool,
        reason: TaskReason,
        callback: Option<UpdateCallback>,
        scheduler: &Scheduler,
    ) -> Update {
        if rerender {
            debug!(?id, component = %self.name(), ?reason, "Scheduling re-render");
            scheduler.schedule(Task {
                id,
                reason,
                callback,
            });
            Update::Scheduled
        } else {
            if let Some(callback) = callback {
                callback();
            }
            Update::Applied
        }
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let base = self.base.borrow();
        f.debug_struct("Instance")
            .field("type", &self.ty)
            .field("props", &base.props)
            .field("state", &base.state)
            .finish()
    }
}

/// Snapshot handed to `render()` and lifecycle hooks
#[derive(Clone)]
pub struct Context {
    id: NodeId,
    props: Props,
    state: State,
    meta: Meta,
    handle: ComponentHandle,
}

impl Context {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn props(&self) -> &Props {
        &self.props
    }

    /// State at the time this context was taken
    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn children(&self) -> &PropChildren {
        self.props.children()
    }

    pub fn meta(&self) -> &Meta {
        &self.meta
    }

    pub fn handle(&self) -> &ComponentHandle {
        &self.handle
    }

    pub fn set_state(&self, partial: PropMap) -> Update {
        self.handle.set_state(partial)
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("id", &self.id)
            .field("props", &self.props)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

/// Imperative access to a live custom component (event handlers, timers)
#[derive(Clone)]
pub struct ComponentHandle {
    id: NodeId,
    instance: Weak<Instance>,
    scheduler: Rc<Scheduler>,
}

impl ComponentHandle {
    pub(crate) fn new(id: NodeId, instance: &Rc<Instance>, scheduler: &Rc<Scheduler>) -> Self {
        Self {
            id,
            instance: Rc::downgrade(instance),
            scheduler: Rc::clone(scheduler),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn is_alive(&self) -> bool {
        self.instance.strong_count() > 0
    }

    pub fn props(&self) -> Option<Props> {
        self.instance.upgrade().map(|i| i.props())
    }

    pub fn state(&self) -> Option<State> {
        self.instance.upgrade().map(|i| i.state())
    }

    pub fn set_state(&self, partial: PropMap) -> Update {
        self.set_state_inner(partial, None)
    }

    /// `set_state` with a callback that runs after the associated pass
    pub fn set_state_with(&self, partial: PropMap, callback: impl FnOnce() + 'static) -> Update {
        self.set_state_inner(partial, Some(Box::new(callback)))
    }

    fn set_state_inner(&self, partial: PropMap, callback: Option<UpdateCallback>) -> Update {
        match self.instance.upgrade() {
            Some(instance) => instance.set_state(self.id, partial, callback, &self.scheduler),
            None => Update::Detached,
        }
    }

    /// Merge `partial` into the current props
    pub fn update_props(&self, partial: PropMap) -> Result<Update, RenderBoundaryError> {
        self.update_props_inner(partial, None)
    }

    pub fn update_props_with(
        &self,
        partial: PropMap,
        callback: impl FnOnce() + 'static,
    ) -> Result<Update, RenderBoundaryError> {
        self.update_props_inner(partial, Some(Box::new(callback)))
    }

    fn update_props_inner(
        &self,
        partial: PropMap,
        callback: Option<UpdateCallback>,
    ) -> Result<Update, RenderBoundaryError> {
        match self.instance.upgrade() {
            Some(instance) => {
                let next = instance.props().merge(partial);
                instance.push_props(self.id, next, callback, &self.scheduler)
            }
            None => Ok(Update::Detached),
        }
    }
}

impl fmt::Debug for ComponentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentHandle")
            .field("id", &self.id)
            .field("alive", &self.is_alive())
            .finish()
    }
}
