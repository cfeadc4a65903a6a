//! Shared fixtures for the scenario tests: a configurable probe component
//! that logs its lifecycle, an error boundary, and a headless stage.

use crate::component::{Change, Component, ComponentType, Context, ErrorBoundary, HookResult, Output};
use crate::config::ReconcilerConfig;
use crate::element::{Element, ElementBuilder, TypeTag};
use crate::error::{BoxError, LifecyclePhase, RenderBoundaryError};
use crate::headless::HeadlessBackend;
use crate::props::{PropMap, Props};
use crate::renderer::Renderer;
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Clone, Default)]
pub(crate) struct Log(Rc<RefCell<Vec<String>>>);

impl Log {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.borrow_mut().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.borrow().clone()
    }

    pub fn count(&self, entry: &str) -> usize {
        self.0.borrow().iter().filter(|e| *e == entry).count()
    }

    pub fn position(&self, entry: &str) -> Option<usize> {
        self.0.borrow().iter().position(|e| e == entry)
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}

pub(crate) type RenderFn = Rc<dyn Fn(&Context) -> Result<Output, BoxError>>;

/// Component whose behaviour is assembled per test
#[derive(Clone)]
pub(crate) struct Probe {
    name: String,
    log: Log,
    render: RenderFn,
    initial: PropMap,
    fail_in: Option<LifecyclePhase>,
    rerender: Option<bool>,
    boundary: bool,
}

impl Probe {
    pub fn new(
        name: &str,
        log: &Log,
        render: impl Fn(&Context) -> Result<Output, BoxError> + 'static,
    ) -> Self {
        Self {
            name: name.to_string(),
            log: log.clone(),
            render: Rc::new(render),
            initial: PropMap::new(),
            fail_in: None,
            rerender: None,
            boundary: false,
        }
    }

    /// Renders whatever children it was given
    pub fn passthrough(name: &str, log: &Log) -> Self {
        Self::new(name, log, |cx| Ok(Output::from(cx.children())))
    }

    pub fn with_state(mut self, initial: PropMap) -> Self {
        self.initial = initial;
        self
    }

    pub fn failing(mut self, phase: LifecyclePhase) -> Self {
        self.fail_in = Some(phase);
        self
    }

    /// `should_rerender` always answers no
    pub fn frozen(mut self) -> Self {
        self.rerender = Some(false);
        self
    }

    pub fn catching(mut self) -> Self {
        self.boundary = true;
        self
    }

    pub fn into_type(self) -> ComponentType {
        let name = self.name.clone();
        ComponentType::new(name, move |_, _| self.clone())
    }

    fn hook(&self, phase: LifecyclePhase) -> HookResult {
        self.log.push(format!("{}:{}", self.name, phase));
        if self.fail_in == Some(phase) {
            return Err(format!("{} failed in {}", self.name, phase).into());
        }
        Ok(())
    }
}

impl Component for Probe {
    fn render(&self, cx: &Context) -> Result<Output, BoxError> {
        self.hook(LifecyclePhase::Render)?;
        (self.render)(cx)
    }

    fn initial_state(&self, _props: &Props) -> PropMap {
        self.initial.clone()
    }

    fn will_mount(&self, _cx: &Context) -> HookResult {
        self.hook(LifecyclePhase::WillMount)
    }

    fn did_mount(&self, _cx: &Context) -> HookResult {
        self.hook(LifecyclePhase::DidMount)
    }

    fn will_unmount(&self, _cx: &Context) -> HookResult {
        self.hook(LifecyclePhase::WillUnmount)
    }

    fn did_update(&self, _cx: &Context) -> HookResult {
        self.hook(LifecyclePhase::DidUpdate)
    }

    fn will_receive_props(&self, _cx: &Context, _next: &Props) -> HookResult {
        self.hook(LifecyclePhase::WillReceiveProps)
    }

    fn should_rerender(&self, change: &Change<'_>) -> bool {
        self.rerender
            .unwrap_or_else(|| change.props_changed() || change.state_changed())
    }

    fn error_boundary(&self) -> Option<&dyn ErrorBoundary> {
        if self.boundary {
            Some(self)
        } else {
            None
        }
    }
}

impl ErrorBoundary for Probe {
    fn did_catch(&self, _cx: &Context, error: &RenderBoundaryError) {
        self.log
            .push(format!("{}:caught:{}:{}", self.name, error.component, error.phase));
    }
}

pub(crate) fn el(ty: impl Into<TypeTag>) -> ElementBuilder {
    Element::builder(ty)
}

pub(crate) fn stage() -> (HeadlessBackend, Renderer) {
    stage_with(ReconcilerConfig::default())
}

pub(crate) fn stage_with(config: ReconcilerConfig) -> (HeadlessBackend, Renderer) {
    let backend = HeadlessBackend::new();
    let renderer = Renderer::with_config(backend.meta(), config);
    (backend, renderer)
}
