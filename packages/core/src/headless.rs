//! # Headless backend
//!
//! An in-memory scene graph implementing [`HostNode`] and [`NodeFactory`].
//! It keeps real parent/child links, journals every call the engine makes,
//! and prints the scene as indented markup. Used by the tests, the benches
//! and the CLI demo.

use crate::element::{Element, ElementType, PrimitiveKind};
use crate::error::BoxError;
use crate::host::{HostNode, HostRef, Meta, NodeFactory, PrimitiveInstance};
use crate::props::{PropValue, Props};
use crate::tree::NodeId;
use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::{Rc, Weak};

/// One backend call, as seen by the headless scene
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostOp {
    Add { parent: String, child: String },
    Remove { node: String },
    Update { node: String },
    Link { node: String, parent: String },
}

/// Shared, ordered log of backend calls
#[derive(Clone, Default)]
pub struct Journal {
    ops: Rc<RefCell<Vec<HostOp>>>,
    serial: Rc<Cell<u64>>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, op: HostOp) {
        self.ops.borrow_mut().push(op);
    }

    fn next_serial(&self) -> u64 {
        let serial = self.serial.get() + 1;
        self.serial.set(serial);
        serial
    }

    pub fn ops(&self) -> Vec<HostOp> {
        self.ops.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.ops.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.borrow().is_empty()
    }

    pub fn count(&self, pred: impl Fn(&HostOp) -> bool) -> usize {
        self.ops.borrow().iter().filter(|op| pred(op)).count()
    }

    pub fn clear(&self) {
        self.ops.borrow_mut().clear();
    }
}

impl fmt::Debug for Journal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.ops.borrow().iter()).finish()
    }
}

pub struct HeadlessNode {
    label: String,
    serial: u64,
    journal: Journal,
    this: Weak<HeadlessNode>,
    parent: RefCell<Weak<HeadlessNode>>,
    children: RefCell<Vec<Rc<HeadlessNode>>>,
    props: RefCell<Props>,
    component: Cell<Option<NodeId>>,
    event_parent: RefCell<Option<Weak<dyn HostNode>>>,
    removes: Cell<usize>,
    updates: Cell<usize>,
}

impl HeadlessNode {
    /// Standalone node with its own journal
    pub fn new(label: impl Into<String>) -> Rc<Self> {
        Self::with_journal(label, &Journal::new())
    }

    pub fn with_journal(label: impl Into<String>, journal: &Journal) -> Rc<Self> {
        let serial = journal.next_serial();
        let label = label.into();
        Rc::new_cyclic(|this| Self {
            label,
            serial,
            journal: journal.clone(),
            this: this.clone(),
            parent: RefCell::new(Weak::new()),
            children: RefCell::new(Vec::new()),
            props: RefCell::new(Props::empty()),
            component: Cell::new(None),
            event_parent: RefCell::new(None),
            removes: Cell::new(0),
            updates: Cell::new(0),
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Label plus creation serial, e.g. `text#4`
    pub fn name(&self) -> String {
        format!("{}#{}", self.label, self.serial)
    }

    pub fn children(&self) -> Vec<Rc<HeadlessNode>> {
        self.children.borrow().clone()
    }

    pub fn child_labels(&self) -> Vec<String> {
        self.children
            .borrow()
            .iter()
            .map(|c| c.label.clone())
            .collect()
    }

    pub fn parent(&self) -> Option<Rc<HeadlessNode>> {
        self.parent.borrow().upgrade()
    }

    pub fn is_attached(&self) -> bool {
        self.parent().is_some()
    }

    /// Props from the last `update` call
    pub fn props(&self) -> Props {
        self.props.borrow().clone()
    }

    pub fn component(&self) -> Option<NodeId> {
        self.component.get()
    }

    pub fn has_event_parent(&self) -> bool {
        self.event_parent
            .borrow()
            .as_ref()
            .is_some_and(|parent| parent.strong_count() > 0)
    }

    pub fn remove_count(&self) -> usize {
        self.removes.get()
    }

    pub fn update_count(&self) -> usize {
        self.updates.get()
    }

    /// Total nodes attached below this one
    pub fn descendant_count(&self) -> usize {
        self.children
            .borrow()
            .iter()
            .map(|c| 1 + c.descendant_count())
            .sum()
    }

    /// Indented markup of the attached scene below (and including) this node
    pub fn markup(&self) -> String {
        let mut printer = Printer::default();
        self.print(&mut printer);
        printer.buffer
    }

    fn print(&self, printer: &mut Printer) {
        let attributes = format_attributes(&self.props.borrow());
        let children = self.children.borrow();

        if children.is_empty() {
            printer.add_line(&format!("<{}{} />", self.label, attributes));
            return;
        }

        printer.add_line(&format!("<{}{}>", self.label, attributes));
        printer.indent();
        for child in children.iter() {
            child.print(printer);
        }
        printer.dedent();
        printer.add_line(&format!("</{}>", self.label));
    }

    fn detach_from_parent(&self) {
        if let Some(parent) = self.parent.replace(Weak::new()).upgrade() {
            parent
                .children
                .borrow_mut()
                .retain(|c| !std::ptr::eq(c.as_ref(), self));
        }
    }
}

impl HostNode for HeadlessNode {
    fn add_child(&self, child: &HostRef) {
        let Some(child) = child
            .as_any()
            .and_then(|any| any.downcast_ref::<HeadlessNode>())
            .and_then(|node| node.this.upgrade())
        else {
            return;
        };

        child.detach_from_parent();
        *child.parent.borrow_mut() = self.this.clone();
        self.journal.record(HostOp::Add {
            parent: self.name(),
            child: child.name(),
        });
        self.children.borrow_mut().push(child);
    }

    fn remove_self(&self) {
        self.removes.set(self.removes.get() + 1);
        self.journal.record(HostOp::Remove { node: self.name() });
        self.detach_from_parent();
    }

    fn update(&self, props: &Props) {
        self.updates.set(self.updates.get() + 1);
        self.journal.record(HostOp::Update { node: self.name() });
        *self.props.borrow_mut() = props.clone();
    }

    fn bind_component(&self, id: NodeId) {
        self.component.set(Some(id));
    }

    fn link_event_parent(&self, parent: &HostRef) {
        let parent_name = parent
            .as_any()
            .and_then(|any| any.downcast_ref::<HeadlessNode>())
            .map(HeadlessNode::name)
            .unwrap_or_else(|| "<foreign>".to_string());
        self.journal.record(HostOp::Link {
            node: self.name(),
            parent: parent_name,
        });
        *self.event_parent.borrow_mut() = Some(Rc::downgrade(parent));
    }

    fn as_any(&self) -> Option<&dyn Any> {
        Some(self)
    }
}

impl fmt::Debug for HeadlessNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeadlessNode")
            .field("name", &self.name())
            .field("children", &self.child_labels())
            .finish()
    }
}

#[derive(Default)]
struct Printer {
    depth: usize,
    buffer: String,
}

impl Printer {
    fn add_line(&mut self, text: &str) {
        for _ in 0..self.depth {
            self.buffer.push_str("  ");
        }
        self.buffer.push_str(text);
        self.buffer.push('\n');
    }

    fn indent(&mut self) {
        self.depth += 1;
    }

    fn dedent(&mut self) {
        if self.depth > 0 {
            self.depth -= 1;
        }
    }
}

fn format_attributes(props: &Props) -> String {
    let mut out = String::new();
    for (name, value) in props.values() {
        let rendered = match value {
            PropValue::Callback(_) => continue,
            PropValue::String(s) => s.clone(),
            PropValue::Null => "null".to_string(),
            other => serde_json::to_string(other).unwrap_or_default(),
        };
        out.push_str(&format!(" {}=\"{}\"", name, rendered));
    }
    out
}

/// Factory producing [`HeadlessNode`]s that all share one journal
#[derive(Default)]
pub struct HeadlessFactory {
    journal: Journal,
    created: Cell<usize>,
    aliases: RefCell<HashMap<PrimitiveKind, ElementType>>,
    failing: RefCell<HashSet<PrimitiveKind>>,
    input_host: RefCell<Option<HostRef>>,
}

impl HeadlessFactory {
    pub fn new(journal: Journal) -> Self {
        Self {
            journal,
            ..Self::default()
        }
    }

    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    /// Backend nodes created so far
    pub fn created(&self) -> usize {
        self.created.get()
    }

    /// Substitute `ty` whenever `kind` is requested
    pub fn alias(&self, kind: PrimitiveKind, ty: impl Into<ElementType>) {
        self.aliases.borrow_mut().insert(kind, ty.into());
    }

    /// Make creation of `kind` fail
    pub fn fail_on(&self, kind: PrimitiveKind) {
        self.failing.borrow_mut().insert(kind);
    }

    /// Pre-assign a container to every input created from now on
    pub fn host_inputs_in(&self, container: HostRef) {
        *self.input_host.borrow_mut() = Some(container);
    }
}

impl NodeFactory for HeadlessFactory {
    fn create(
        &self,
        kind: PrimitiveKind,
        _element: &Element,
        _meta: &Meta,
    ) -> Result<PrimitiveInstance, BoxError> {
        if self.failing.borrow().contains(&kind) {
            return Err(format!("headless backend refuses '{}'", kind).into());
        }

        self.created.set(self.created.get() + 1);
        let graphic: HostRef = HeadlessNode::with_journal(kind.name(), &self.journal);
        let instance = PrimitiveInstance::new(graphic);

        match (kind, self.input_host.borrow().as_ref()) {
            (PrimitiveKind::Input, Some(host)) => Ok(instance.with_container(Rc::clone(host))),
            _ => Ok(instance),
        }
    }

    fn real_type(&self, kind: PrimitiveKind) -> Option<ElementType> {
        self.aliases.borrow().get(&kind).cloned()
    }
}

/// A ready-to-use headless stage: shared journal, factory and root node
pub struct HeadlessBackend {
    pub journal: Journal,
    pub factory: Rc<HeadlessFactory>,
    pub root: Rc<HeadlessNode>,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        let journal = Journal::new();
        let factory = Rc::new(HeadlessFactory::new(journal.clone()));
        let root = HeadlessNode::with_journal("stage", &journal);
        Self {
            journal,
            factory,
            root,
        }
    }

    pub fn root_ref(&self) -> HostRef {
        self.root.clone()
    }

    pub fn meta(&self) -> Meta {
        Meta::new(self.factory.clone(), self.root_ref())
    }

    pub fn markup(&self) -> String {
        self.root.markup()
    }
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self::new()
    }
}
