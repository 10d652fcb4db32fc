//! Heterogeneous nested key/value data for structural comparison.
//!
//! A [`Node`] is a closed set of the shapes the structural comparator knows how
//! to compare. Anything else is carried as [`Node::Unsupported`] with its
//! rendered form, so it can still be described in a failure message.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::collections::btree_map;
use std::fmt;

use serde_json::Value;
use thiserror::Error;

/// One value inside a [`Mapping`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Mapping(Mapping),
    Text(String),
    Integer(i64),
    /// A value outside the comparable set, kept as its rendered form.
    Unsupported(String),
}

/// Variant tag of a [`Node`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Mapping,
    Text,
    Integer,
    Unsupported,
}

impl NodeKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            NodeKind::Mapping => "mapping",
            NodeKind::Text => "text",
            NodeKind::Integer => "integer",
            NodeKind::Unsupported => "unsupported",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Node {
    /// Wrap an arbitrary value the comparator cannot look inside.
    pub fn unsupported(raw: impl fmt::Debug) -> Self {
        Self::Unsupported(format!("{raw:?}"))
    }

    #[must_use]
    pub const fn kind(&self) -> NodeKind {
        match self {
            Node::Mapping(_) => NodeKind::Mapping,
            Node::Text(_) => NodeKind::Text,
            Node::Integer(_) => NodeKind::Integer,
            Node::Unsupported(_) => NodeKind::Unsupported,
        }
    }

    /// Rendering without quotes around text, for messages that already quote.
    #[must_use]
    pub fn unquoted(&self) -> Cow<'_, str> {
        match self {
            Node::Text(text) => Cow::Borrowed(text),
            other => Cow::Owned(other.to_string()),
        }
    }

    #[must_use]
    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Node::Mapping(mapping) => Some(mapping),
            _ => None,
        }
    }

    #[must_use]
    pub fn into_mapping(self) -> Option<Mapping> {
        match self {
            Node::Mapping(mapping) => Some(mapping),
            _ => None,
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Mapping(mapping) => mapping.fmt(f),
            Node::Text(text) => write!(f, "{text:?}"),
            Node::Integer(value) => value.fmt(f),
            Node::Unsupported(raw) => f.write_str(raw),
        }
    }
}

impl From<&str> for Node {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for Node {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Mapping> for Node {
    fn from(value: Mapping) -> Self {
        Self::Mapping(value)
    }
}

macro_rules! lossless_integer {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Node {
                fn from(value: $ty) -> Self {
                    Self::Integer(i64::from(value))
                }
            }
        )*
    };
}

lossless_integer!(i8, i16, i32, i64, u8, u16, u32);

macro_rules! checked_integer {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Node {
                fn from(value: $ty) -> Self {
                    i64::try_from(value).map_or_else(|_| Self::Unsupported(value.to_string()), Self::Integer)
                }
            }
        )*
    };
}

checked_integer!(u64, usize, isize, i128, u128);

impl From<bool> for Node {
    fn from(value: bool) -> Self {
        Self::Unsupported(value.to_string())
    }
}

impl From<f64> for Node {
    fn from(value: f64) -> Self {
        Self::Unsupported(value.to_string())
    }
}

impl From<Value> for Node {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(object) => Self::Mapping(object.into_iter().collect()),
            Value::String(text) => Self::Text(text),
            Value::Number(number) => number
                .as_i64()
                .map_or_else(|| Self::Unsupported(number.to_string()), Self::Integer),
            other => Self::Unsupported(other.to_string()),
        }
    }
}

/// An ordered `String -> Node` map.
///
/// Keys are kept sorted so comparisons walk and report fields in a stable order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mapping(BTreeMap<String, Node>);

impl Mapping {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Node>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Node>) -> Option<Node> {
        self.0.insert(key.into(), value.into())
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Node> {
        self.0.get(key)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, Node> {
        self.0.iter()
    }
}

impl fmt::Display for Mapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (key, value)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{key:?}: {value}")?;
        }
        f.write_str("}")
    }
}

impl<K, V> FromIterator<(K, V)> for Mapping
where
    K: Into<String>,
    V: Into<Node>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for Mapping
where
    K: Into<String>,
    V: Into<Node>,
{
    fn from(entries: [(K, V); N]) -> Self {
        entries.into_iter().collect()
    }
}

impl<'a> IntoIterator for &'a Mapping {
    type Item = (&'a String, &'a Node);
    type IntoIter = btree_map::Iter<'a, String, Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl IntoIterator for Mapping {
    type Item = (String, Node);
    type IntoIter = btree_map::IntoIter<String, Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("expected a JSON object, found {found}")]
pub struct NotAMappingError {
    found: String,
}

impl TryFrom<Value> for Mapping {
    type Error = NotAMappingError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(object) => Ok(object.into_iter().collect()),
            other => Err(NotAMappingError {
                found: other.to_string(),
            }),
        }
    }
}
