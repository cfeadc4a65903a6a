//! # Element Model
//!
//! Immutable descriptions of what should be on screen. Elements are built by
//! [`create_element`] (or [`ElementBuilder`]), consumed by the tree builder
//! and the reconciler, and thrown away after each pass.
//!
//! ## Children normalization
//!
//! `Element::children` always keeps the call-site arguments as given: each
//! entry is empty, a single element, or a nested group (a keyed collection).
//!
//! `props.children` is the view a custom component receives:
//! - one element or empty argument is stored directly (`PropChildren::Single`)
//! - one group argument is stored as-is (`PropChildren::Many`)
//! - several arguments are flattened one level into `PropChildren::Many`

use crate::component::ComponentType;
use crate::error::{ReconcileError, ReconcileResult};
use crate::props::{Key, PropMap, PropValue, Props, KEY_PROP};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fixed vocabulary of backend primitives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveKind {
    Container,
    Rectangle,
    Circle,
    Ellipse,
    Polygon,
    Text,
    Line,
    Sprite,
    Fragment,
    Input,
}

/// How a primitive attaches itself and its children to the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountStrategy {
    /// Attaches its node and hosts its children inside it
    Nesting,
    /// Attaches its node, never has children
    Leaf,
    /// No node of its own; children go to the enclosing container
    Passthrough,
    /// May carry its own container; links to the outer one for event bubbling
    Input,
}

impl PrimitiveKind {
    pub const ALL: [PrimitiveKind; 10] = [
        PrimitiveKind::Container,
        PrimitiveKind::Rectangle,
        PrimitiveKind::Circle,
        PrimitiveKind::Ellipse,
        PrimitiveKind::Polygon,
        PrimitiveKind::Text,
        PrimitiveKind::Line,
        PrimitiveKind::Sprite,
        PrimitiveKind::Fragment,
        PrimitiveKind::Input,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            PrimitiveKind::Container => "container",
            PrimitiveKind::Rectangle => "rectangle",
            PrimitiveKind::Circle => "circle",
            PrimitiveKind::Ellipse => "ellipse",
            PrimitiveKind::Polygon => "polygon",
            PrimitiveKind::Text => "text",
            PrimitiveKind::Line => "line",
            PrimitiveKind::Sprite => "sprite",
            PrimitiveKind::Fragment => "fragment",
            PrimitiveKind::Input => "input",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    pub fn mount_strategy(&self) -> MountStrategy {
        match self {
            PrimitiveKind::Container
            | PrimitiveKind::Rectangle
            | PrimitiveKind::Circle
            | PrimitiveKind::Ellipse
            | PrimitiveKind::Polygon => MountStrategy::Nesting,
            PrimitiveKind::Text | PrimitiveKind::Line | PrimitiveKind::Sprite => MountStrategy::Leaf,
            PrimitiveKind::Fragment => MountStrategy::Passthrough,
            PrimitiveKind::Input => MountStrategy::Input,
        }
    }
}

impl FromStr for PrimitiveKind {
    type Err = ReconcileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PrimitiveKind::from_name(s).ok_or_else(|| ReconcileError::InvalidElementType {
            name: s.to_string(),
        })
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Resolved element type: a primitive kind or a custom component identity
#[derive(Clone, PartialEq)]
pub enum ElementType {
    Primitive(PrimitiveKind),
    Custom(ComponentType),
}

impl ElementType {
    pub fn name(&self) -> &str {
        match self {
            ElementType::Primitive(kind) => kind.name(),
            ElementType::Custom(ty) => ty.name(),
        }
    }

    pub fn as_primitive(&self) -> Option<PrimitiveKind> {
        match self {
            ElementType::Primitive(kind) => Some(*kind),
            ElementType::Custom(_) => None,
        }
    }
}

impl fmt::Debug for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementType::Primitive(kind) => write!(f, "{}", kind),
            ElementType::Custom(ty) => write!(f, "<{}>", ty.name()),
        }
    }
}

impl From<PrimitiveKind> for ElementType {
    fn from(kind: PrimitiveKind) -> Self {
        ElementType::Primitive(kind)
    }
}

impl From<ComponentType> for ElementType {
    fn from(ty: ComponentType) -> Self {
        ElementType::Custom(ty)
    }
}

impl From<&ComponentType> for ElementType {
    fn from(ty: &ComponentType) -> Self {
        ElementType::Custom(ty.clone())
    }
}

/// Type argument accepted by `create_element` before recognition
#[derive(Debug, Clone)]
pub enum TypeTag {
    Name(String),
    Resolved(ElementType),
}

impl TypeTag {
    fn resolve(self) -> ReconcileResult<ElementType> {
        match self {
            TypeTag::Resolved(ty) => Ok(ty),
            TypeTag::Name(name) => match PrimitiveKind::from_name(&name) {
                Some(kind) => Ok(ElementType::Primitive(kind)),
                None => Err(ReconcileError::InvalidElementType { name }),
            },
        }
    }
}

impl From<&str> for TypeTag {
    fn from(name: &str) -> Self {
        TypeTag::Name(name.to_string())
    }
}

impl From<String> for TypeTag {
    fn from(name: String) -> Self {
        TypeTag::Name(name)
    }
}

impl From<PrimitiveKind> for TypeTag {
    fn from(kind: PrimitiveKind) -> Self {
        TypeTag::Resolved(kind.into())
    }
}

impl From<ComponentType> for TypeTag {
    fn from(ty: ComponentType) -> Self {
        TypeTag::Resolved(ty.into())
    }
}

impl From<&ComponentType> for TypeTag {
    fn from(ty: &ComponentType) -> Self {
        TypeTag::Resolved(ty.into())
    }
}

impl From<ElementType> for TypeTag {
    fn from(ty: ElementType) -> Self {
        TypeTag::Resolved(ty)
    }
}

/// One child argument / render-output entry
#[derive(Debug, Clone, PartialEq)]
pub enum Child {
    Empty,
    Node(Element),
    /// Nested sequence: a keyed collection
    Group(Vec<Element>),
}

impl From<Element> for Child {
    fn from(element: Element) -> Self {
        Child::Node(element)
    }
}

impl From<Option<Element>> for Child {
    fn from(element: Option<Element>) -> Self {
        element.map(Child::Node).unwrap_or(Child::Empty)
    }
}

impl From<Vec<Element>> for Child {
    fn from(group: Vec<Element>) -> Self {
        Child::Group(group)
    }
}

/// Children as seen through `props.children`
#[derive(Debug, Clone, PartialEq)]
pub enum PropChildren {
    Single(Option<Element>),
    Many(Vec<Option<Element>>),
}

impl PropChildren {
    fn normalize(children: &[Child]) -> Self {
        match children {
            [Child::Node(element)] => PropChildren::Single(Some(element.clone())),
            [Child::Empty] => PropChildren::Single(None),
            [Child::Group(group)] => {
                PropChildren::Many(group.iter().cloned().map(Some).collect())
            }
            _ => {
                let mut flat = Vec::new();
                for child in children {
                    match child {
                        Child::Empty => flat.push(None),
                        Child::Node(element) => flat.push(Some(element.clone())),
                        Child::Group(group) => flat.extend(group.iter().cloned().map(Some)),
                    }
                }
                PropChildren::Many(flat)
            }
        }
    }

    /// The directly stored child, if exactly one was supplied
    pub fn single(&self) -> Option<&Element> {
        match self {
            PropChildren::Single(element) => element.as_ref(),
            PropChildren::Many(_) => None,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            PropChildren::Single(_) => 1,
            PropChildren::Many(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, PropChildren::Many(items) if items.is_empty())
    }

    pub fn iter(&self) -> impl Iterator<Item = Option<&Element>> + '_ {
        let items: Vec<Option<&Element>> = match self {
            PropChildren::Single(element) => vec![element.as_ref()],
            PropChildren::Many(items) => items.iter().map(Option::as_ref).collect(),
        };
        items.into_iter()
    }

    /// Re-expand into render output entries (for components that render
    /// their received children)
    pub fn to_children(&self) -> Vec<Child> {
        self.iter().map(|e| Child::from(e.cloned())).collect()
    }
}

impl Default for PropChildren {
    fn default() -> Self {
        PropChildren::Many(Vec::new())
    }
}

/// Immutable description of a desired node
#[derive(Clone, PartialEq)]
pub struct Element {
    ty: ElementType,
    props: Props,
    children: Vec<Child>,
}

impl Element {
    pub fn element_type(&self) -> &ElementType {
        &self.ty
    }

    pub fn props(&self) -> &Props {
        &self.props
    }

    pub fn children(&self) -> &[Child] {
        &self.children
    }

    pub fn key(&self) -> Option<Key> {
        self.props.key()
    }

    pub fn builder(ty: impl Into<TypeTag>) -> ElementBuilder {
        ElementBuilder::new(ty)
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("type", &self.ty)
            .field("props", self.props.values())
            .field("children", &self.children)
            .finish()
    }
}

/// Build an element from call-site arguments.
///
/// Fails with `InvalidElementType` when `ty` names neither a primitive nor a
/// custom component.
pub fn create_element(
    ty: impl Into<TypeTag>,
    props: Option<PropMap>,
    children: Vec<Child>,
) -> ReconcileResult<Element> {
    let ty = ty.into().resolve()?;
    let prop_children = PropChildren::normalize(&children);

    Ok(Element {
        ty,
        props: Props::new(props.unwrap_or_default(), prop_children),
        children,
    })
}

/// Fluent construction on top of `create_element`
#[derive(Debug)]
pub struct ElementBuilder {
    ty: TypeTag,
    props: PropMap,
    children: Vec<Child>,
}

impl ElementBuilder {
    pub fn new(ty: impl Into<TypeTag>) -> Self {
        Self {
            ty: ty.into(),
            props: PropMap::new(),
            children: Vec::new(),
        }
    }

    pub fn prop(mut self, name: impl Into<String>, value: impl Into<PropValue>) -> Self {
        self.props.insert(name.into(), value.into());
        self
    }

    pub fn props(mut self, props: PropMap) -> Self {
        self.props.extend(props);
        self
    }

    pub fn key(self, key: impl Into<PropValue>) -> Self {
        self.prop(KEY_PROP, key)
    }

    pub fn child(mut self, child: impl Into<Child>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn group(mut self, group: Vec<Element>) -> Self {
        self.children.push(Child::Group(group));
        self
    }

    pub fn build(self) -> ReconcileResult<Element> {
        create_element(self.ty, Some(self.props), self.children)
    }
}
