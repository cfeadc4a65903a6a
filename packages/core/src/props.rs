//! Frozen prop and state maps.
//!
//! Props are handed out behind an `Rc` and never mutated after creation.
//! The reconciler and the default `should_rerender` rely on pointer identity
//! of these maps, so every "change" produces a fresh allocation and every
//! no-op keeps the old one.

use crate::element::PropChildren;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

pub type PropMap = BTreeMap<String, PropValue>;

/// Callback stored in a prop (event handlers and the like)
pub type Callback = Rc<dyn Fn(&PropValue)>;

/// Name of the prop that identifies entries of a keyed collection
pub const KEY_PROP: &str = "key";

/// Dynamic prop value
#[derive(Clone)]
pub enum PropValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<PropValue>),
    Map(PropMap),
    Callback(Callback),
}

impl PropValue {
    pub fn callback(f: impl Fn(&PropValue) + 'static) -> Self {
        PropValue::Callback(Rc::new(f))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            PropValue::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            PropValue::Float(n) => Some(*n),
            PropValue::Int(n) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[PropValue]> {
        match self {
            PropValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&PropMap> {
        match self {
            PropValue::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Invoke the value if it is a callback. Returns false otherwise.
    pub fn call(&self, arg: &PropValue) -> bool {
        match self {
            PropValue::Callback(f) => {
                f(arg);
                true
            }
            _ => false,
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            PropValue::Null => false,
            PropValue::Bool(b) => *b,
            PropValue::Int(n) => *n != 0,
            PropValue::Float(n) => *n != 0.0,
            PropValue::String(s) => !s.is_empty(),
            PropValue::List(items) => !items.is_empty(),
            PropValue::Map(map) => !map.is_empty(),
            PropValue::Callback(_) => true,
        }
    }
}

impl PartialEq for PropValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (PropValue::Null, PropValue::Null) => true,
            (PropValue::Bool(a), PropValue::Bool(b)) => a == b,
            (PropValue::Int(a), PropValue::Int(b)) => a == b,
            (PropValue::Float(a), PropValue::Float(b)) => a == b,
            (PropValue::Int(a), PropValue::Float(b)) | (PropValue::Float(b), PropValue::Int(a)) => {
                (*a as f64) == *b
            }
            (PropValue::String(a), PropValue::String(b)) => a == b,
            (PropValue::List(a), PropValue::List(b)) => a == b,
            (PropValue::Map(a), PropValue::Map(b)) => a == b,
            (PropValue::Callback(a), PropValue::Callback(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for PropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropValue::Null => write!(f, "null"),
            PropValue::Bool(b) => write!(f, "{}", b),
            PropValue::Int(n) => write!(f, "{}", n),
            PropValue::Float(n) => write!(f, "{}", n),
            PropValue::String(s) => write!(f, "{:?}", s),
            PropValue::List(items) => f.debug_list().entries(items).finish(),
            PropValue::Map(map) => f.debug_map().entries(map).finish(),
            PropValue::Callback(_) => write!(f, "<callback>"),
        }
    }
}

impl Serialize for PropValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PropValue::Null => serializer.serialize_unit(),
            PropValue::Bool(b) => serializer.serialize_bool(*b),
            PropValue::Int(n) => serializer.serialize_i64(*n),
            PropValue::Float(n) => serializer.serialize_f64(*n),
            PropValue::String(s) => serializer.serialize_str(s),
            PropValue::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            PropValue::Map(map) => {
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (k, v) in map {
                    out.serialize_entry(k, v)?;
                }
                out.end()
            }
            PropValue::Callback(_) => serializer.serialize_str("<callback>"),
        }
    }
}

impl From<bool> for PropValue {
    fn from(b: bool) -> Self {
        PropValue::Bool(b)
    }
}

impl From<i64> for PropValue {
    fn from(n: i64) -> Self {
        PropValue::Int(n)
    }
}

impl From<i32> for PropValue {
    fn from(n: i32) -> Self {
        PropValue::Int(n as i64)
    }
}

impl From<usize> for PropValue {
    fn from(n: usize) -> Self {
        PropValue::Int(n as i64)
    }
}

impl From<f64> for PropValue {
    fn from(n: f64) -> Self {
        PropValue::Float(n)
    }
}

impl From<&str> for PropValue {
    fn from(s: &str) -> Self {
        PropValue::String(s.to_string())
    }
}

impl From<String> for PropValue {
    fn from(s: String) -> Self {
        PropValue::String(s)
    }
}

impl From<Vec<PropValue>> for PropValue {
    fn from(items: Vec<PropValue>) -> Self {
        PropValue::List(items)
    }
}

impl From<PropMap> for PropValue {
    fn from(map: PropMap) -> Self {
        PropValue::Map(map)
    }
}

impl<T: Into<PropValue>> From<Option<T>> for PropValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(PropValue::Null)
    }
}

/// Build a `PropMap` from `(name, value)` pairs
pub fn prop_map<K, V, I>(pairs: I) -> PropMap
where
    K: Into<String>,
    V: Into<PropValue>,
    I: IntoIterator<Item = (K, V)>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// Resolve a dotted path (`style.fill`) against a prop map
pub fn lookup_path<'a>(map: &'a PropMap, path: &str) -> Option<&'a PropValue> {
    let mut segments = path.split('.');
    let first = segments.next()?;
    let mut current = map.get(first)?;

    for segment in segments {
        current = match current {
            PropValue::Map(inner) => inner.get(segment)?,
            PropValue::List(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }

    Some(current)
}

/// Identity of an entry in a keyed collection
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(untagged)]
pub enum Key {
    Int(i64),
    Str(String),
}

impl Key {
    pub fn from_value(value: &PropValue) -> Option<Self> {
        match value {
            PropValue::Int(n) => Some(Key::Int(*n)),
            PropValue::String(s) => Some(Key::Str(s.clone())),
            _ => None,
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Int(n) => write!(f, "{}", n),
            Key::Str(s) => write!(f, "{}", s),
        }
    }
}

struct PropsInner {
    values: PropMap,
    children: PropChildren,
}

/// Read-only props of an element or component
#[derive(Clone)]
pub struct Props(Rc<PropsInner>);

impl Props {
    pub fn new(values: PropMap, children: PropChildren) -> Self {
        Props(Rc::new(PropsInner { values, children }))
    }

    pub fn empty() -> Self {
        Self::new(PropMap::new(), PropChildren::default())
    }

    pub fn get(&self, name: &str) -> Option<&PropValue> {
        self.0.values.get(name)
    }

    pub fn get_path(&self, path: &str) -> Option<&PropValue> {
        lookup_path(&self.0.values, path)
    }

    pub fn values(&self) -> &PropMap {
        &self.0.values
    }

    pub fn children(&self) -> &PropChildren {
        &self.0.children
    }

    pub fn key(&self) -> Option<Key> {
        self.get(KEY_PROP).and_then(Key::from_value)
    }

    pub fn ptr_eq(a: &Props, b: &Props) -> bool {
        Rc::ptr_eq(&a.0, &b.0)
    }

    /// Shallow-merge `partial` over these props. An empty partial returns
    /// the same allocation.
    pub fn merge(&self, partial: PropMap) -> Props {
        if partial.is_empty() {
            return self.clone();
        }
        let mut values = self.0.values.clone();
        values.extend(partial);
        Props::new(values, self.0.children.clone())
    }
}

impl Default for Props {
    fn default() -> Self {
        Self::empty()
    }
}

impl PartialEq for Props {
    fn eq(&self, other: &Self) -> bool {
        Props::ptr_eq(self, other)
            || (self.0.values == other.0.values && self.0.children == other.0.children)
    }
}

impl fmt::Debug for Props {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Props")
            .field("values", &self.0.values)
            .field("children", &self.0.children)
            .finish()
    }
}

impl Serialize for Props {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.values.serialize(serializer)
    }
}

/// Component state. Same freezing rules as `Props`.
#[derive(Clone, Default)]
pub struct State(Rc<PropMap>);

impl State {
    pub fn new(values: PropMap) -> Self {
        State(Rc::new(values))
    }

    pub fn get(&self, name: &str) -> Option<&PropValue> {
        self.0.get(name)
    }

    pub fn get_path(&self, path: &str) -> Option<&PropValue> {
        lookup_path(&self.0, path)
    }

    pub fn values(&self) -> &PropMap {
        &self.0
    }

    pub fn ptr_eq(a: &State, b: &State) -> bool {
        Rc::ptr_eq(&a.0, &b.0)
    }

    pub fn merge(&self, partial: PropMap) -> State {
        if partial.is_empty() {
            return self.clone();
        }
        let mut values = (*self.0).clone();
        values.extend(partial);
        State::new(values)
    }
}

impl PartialEq for State {
    fn eq(&self, other: &Self) -> bool {
        State::ptr_eq(self, other) || self.0 == other.0
    }
}

impl fmt::Debug for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.0.iter()).finish()
    }
}

impl Serialize for State {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}
