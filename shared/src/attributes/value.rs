use std::{collections::BTreeMap, fmt};

use super::{error::AttributeError, list_node::ListNode, map_node::MapNode, node::AttrNode};

/// Location of a value inside its parent container: a field name for a
/// [`MapNode`], a position for a [`ListNode`]
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AttrKey {
    Field(String),
    Index(usize),
}

impl fmt::Display for AttrKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrKey::Field(name) => write!(f, "{}", name),
            AttrKey::Index(index) => write!(f, "{}", index),
        }
    }
}

impl From<&str> for AttrKey {
    fn from(name: &str) -> Self {
        AttrKey::Field(name.to_string())
    }
}

impl From<String> for AttrKey {
    fn from(name: String) -> Self {
        AttrKey::Field(name)
    }
}

impl From<usize> for AttrKey {
    fn from(index: usize) -> Self {
        AttrKey::Index(index)
    }
}

/// Ordered keys leading from the owner's root container down to a node
pub type AttrPath = Vec<AttrKey>;

/// A value stored inside an attribute container.
///
/// Primitives compare by value. Containers compare by identity: two handles
/// are equal only when they refer to the same live node.
#[derive(Clone, Debug)]
pub enum AttributeValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    Map(MapNode),
    List(ListNode),
}

impl AttributeValue {
    pub fn kind(&self) -> &'static str {
        match self {
            AttributeValue::Int(_) => "Int",
            AttributeValue::Float(_) => "Float",
            AttributeValue::Bool(_) => "Bool",
            AttributeValue::Str(_) => "Str",
            AttributeValue::Map(_) => "MapNode",
            AttributeValue::List(_) => "ListNode",
        }
    }

    /// Deep-copies this value into its plain, wire-ready form. The result
    /// never shares structure with the live tree.
    pub fn materialize(&self) -> PlainValue {
        match self {
            AttributeValue::Int(value) => PlainValue::Int(*value),
            AttributeValue::Float(value) => PlainValue::Float(*value),
            AttributeValue::Bool(value) => PlainValue::Bool(*value),
            AttributeValue::Str(value) => PlainValue::Str(value.clone()),
            AttributeValue::Map(node) => PlainValue::Map(node.to_map()),
            AttributeValue::List(node) => PlainValue::List(node.to_list()),
        }
    }

    /// Builds a fresh, detached live value from its plain form
    pub fn from_plain(plain: &PlainValue) -> Self {
        match plain {
            PlainValue::Int(value) => AttributeValue::Int(*value),
            PlainValue::Float(value) => AttributeValue::Float(*value),
            PlainValue::Bool(value) => AttributeValue::Bool(*value),
            PlainValue::Str(value) => AttributeValue::Str(value.clone()),
            PlainValue::Map(fields) => {
                let node = MapNode::new();
                node.assign_map(fields);
                AttributeValue::Map(node)
            }
            PlainValue::List(items) => {
                let node = ListNode::new();
                node.assign_list(items);
                AttributeValue::List(node)
            }
        }
    }

    pub(crate) fn as_node(&self) -> Option<AttrNode> {
        match self {
            AttributeValue::Map(node) => Some(AttrNode::Map(node.clone())),
            AttributeValue::List(node) => Some(AttrNode::List(node.clone())),
            _ => None,
        }
    }
}

impl PartialEq for AttributeValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (AttributeValue::Int(a), AttributeValue::Int(b)) => a == b,
            (AttributeValue::Float(a), AttributeValue::Float(b)) => a == b,
            (AttributeValue::Bool(a), AttributeValue::Bool(b)) => a == b,
            (AttributeValue::Str(a), AttributeValue::Str(b)) => a == b,
            (AttributeValue::Map(a), AttributeValue::Map(b)) => a.ptr_eq(b),
            (AttributeValue::List(a), AttributeValue::List(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        AttributeValue::Int(value)
    }
}

impl From<i32> for AttributeValue {
    fn from(value: i32) -> Self {
        AttributeValue::Int(i64::from(value))
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        AttributeValue::Float(value)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        AttributeValue::Bool(value)
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::Str(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::Str(value)
    }
}

impl From<MapNode> for AttributeValue {
    fn from(node: MapNode) -> Self {
        AttributeValue::Map(node)
    }
}

impl From<ListNode> for AttributeValue {
    fn from(node: ListNode) -> Self {
        AttributeValue::List(node)
    }
}

/// Types an [`AttributeValue`] can be read back as
pub trait FromAttribute: Sized {
    const KIND: &'static str;

    fn from_attribute(value: AttributeValue) -> Option<Self>;

    fn read(key: AttrKey, value: AttributeValue) -> Result<Self, AttributeError> {
        let found = value.kind();
        Self::from_attribute(value).ok_or(AttributeError::TypeMismatch {
            key,
            expected: Self::KIND,
            found,
        })
    }
}

macro_rules! impl_from_attribute {
    ($ty:ty, $variant:ident, $kind:literal) => {
        impl FromAttribute for $ty {
            const KIND: &'static str = $kind;

            fn from_attribute(value: AttributeValue) -> Option<Self> {
                match value {
                    AttributeValue::$variant(inner) => Some(inner),
                    _ => None,
                }
            }
        }
    };
}

impl_from_attribute!(i64, Int, "Int");
impl_from_attribute!(f64, Float, "Float");
impl_from_attribute!(bool, Bool, "Bool");
impl_from_attribute!(String, Str, "Str");
impl_from_attribute!(MapNode, Map, "MapNode");
impl_from_attribute!(ListNode, List, "ListNode");

/// Materialized attribute value, detached from any tree
#[derive(Clone, Debug, PartialEq)]
pub enum PlainValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    Map(BTreeMap<String, PlainValue>),
    List(Vec<PlainValue>),
}

impl From<i64> for PlainValue {
    fn from(value: i64) -> Self {
        PlainValue::Int(value)
    }
}

impl From<f64> for PlainValue {
    fn from(value: f64) -> Self {
        PlainValue::Float(value)
    }
}

impl From<bool> for PlainValue {
    fn from(value: bool) -> Self {
        PlainValue::Bool(value)
    }
}

impl From<&str> for PlainValue {
    fn from(value: &str) -> Self {
        PlainValue::Str(value.to_string())
    }
}
