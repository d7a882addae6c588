//! Container - the recursive config/results tree
//!
//! A [`Container`] is a tree where every node is either a leaf holding a
//! scalar, a list of scalars, or a table mapping field names to child nodes.
//! The root is always a table with at least one field.
//!
//! ## Ordering contract
//!
//! Tables are backed by `BTreeMap`, so siblings are always iterated in
//! lexicographic order by field name. Flattening (see [`Container::as_flat_map`])
//! walks the tree depth-first in that order; identifier derivation relies on
//! this being deterministic.
//!
//! ## Usage
//!
//! ```rust
//! use labrat::container::Container;
//!
//! let container = Container::from_value(&serde_json::json!({
//!     "a": 10,
//!     "b": { "c": [1, 2, 3] }
//! }))?;
//!
//! assert_eq!(container.to_value(), serde_json::json!({
//!     "a": 10,
//!     "b": { "c": [1, 2, 3] }
//! }));
//! # Ok::<(), labrat::Error>(())
//! ```

mod flat;

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Serialize;
use serde_json::Value;

use crate::error::{Error, Result};

/// A single scalar value held by a leaf or a list element.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    /// Boolean flag
    Bool(bool),
    /// Integer value
    Int(i64),
    /// Floating-point value
    Float(f64),
    /// String value
    Str(String),
}

impl Scalar {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Bool(b) => Ok(Self::Bool(*b)),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Self::Int(i))
                } else if let Some(f) = n.as_f64() {
                    Ok(Self::Float(f))
                } else {
                    Err(Error::UnsupportedValue(format!(
                        "number `{n}` is not representable as i64 or f64"
                    )))
                }
            }
            Value::String(s) => Ok(Self::Str(s.clone())),
            other => Err(Error::UnsupportedValue(format!(
                "expected a scalar, found `{other}`"
            ))),
        }
    }

    fn to_value(&self) -> Value {
        match self {
            Self::Bool(b) => Value::Bool(*b),
            Self::Int(i) => Value::from(*i),
            Self::Float(f) => Value::from(*f),
            Self::Str(s) => Value::from(s.clone()),
        }
    }
}

impl std::fmt::Display for Scalar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            // Whole-number floats keep an explicit decimal so a float field
            // never renders like an integer one
            Self::Float(x) if x.fract() == 0.0 && x.is_finite() => write!(f, "{x:.1}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Str(s) => write!(f, "{s}"),
        }
    }
}

impl From<bool> for Scalar {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Scalar {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<i32> for Scalar {
    fn from(i: i32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<u32> for Scalar {
    fn from(i: u32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<f64> for Scalar {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

/// One node of a [`Container`] tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Node {
    /// A leaf holding one scalar
    Leaf(Scalar),
    /// A leaf holding a list of scalars
    List(Vec<Scalar>),
    /// An internal node mapping field names to children
    Table(BTreeMap<String, Node>),
}

impl Node {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Object(map) => {
                if map.is_empty() {
                    return Err(Error::EmptyConfig);
                }
                let mut fields = BTreeMap::new();
                for (name, child) in map {
                    fields.insert(name.clone(), Self::from_value(child)?);
                }
                Ok(Self::Table(fields))
            }
            Value::Array(items) => {
                let elements = items
                    .iter()
                    .map(Scalar::from_value)
                    .collect::<Result<Vec<_>>>()?;
                Ok(Self::List(elements))
            }
            Value::Null => Err(Error::UnsupportedValue(
                "null values are not supported".to_string(),
            )),
            scalar => Ok(Self::Leaf(Scalar::from_value(scalar)?)),
        }
    }

    /// Reconstruct the JSON value this node was built from.
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            Self::Leaf(s) => s.to_value(),
            Self::List(xs) => Value::Array(xs.iter().map(Scalar::to_value).collect()),
            Self::Table(fields) => Value::Object(
                fields
                    .iter()
                    .map(|(name, child)| (name.clone(), child.to_value()))
                    .collect(),
            ),
        }
    }
}

impl From<Scalar> for Node {
    fn from(scalar: Scalar) -> Self {
        Self::Leaf(scalar)
    }
}

macro_rules! leaf_from {
    ($($ty:ty),*) => {
        $(impl From<$ty> for Node {
            fn from(value: $ty) -> Self {
                Self::Leaf(value.into())
            }
        })*
    };
}

leaf_from!(bool, i64, i32, u32, f64, &str, String);

impl<T: Into<Scalar>> From<Vec<T>> for Node {
    fn from(elements: Vec<T>) -> Self {
        Self::List(elements.into_iter().map(Into::into).collect())
    }
}

/// The recursive config/results structure.
///
/// The root is guaranteed to be a non-empty table; construction from an
/// empty mapping fails with [`Error::EmptyConfig`] at every nesting level.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Container {
    fields: BTreeMap<String, Node>,
}

impl Container {
    /// Build a container from a JSON object.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyConfig`] if the object (or any nested object)
    /// has zero entries, and [`Error::UnsupportedValue`] for nulls, nested
    /// lists, or non-scalar list elements.
    pub fn from_value(value: &Value) -> Result<Self> {
        match Node::from_value(value)? {
            Node::Table(fields) => Ok(Self { fields }),
            _ => Err(Error::UnsupportedValue(
                "top-level value must be an object".to_string(),
            )),
        }
    }

    /// Reconstruct the nested JSON object, keys in lexicographic order.
    #[must_use]
    pub fn to_value(&self) -> Value {
        Node::Table(self.fields.clone()).to_value()
    }

    /// Read a container from a JSON file.
    ///
    /// # Errors
    ///
    /// IO and JSON decode errors, plus the [`Container::from_value`] errors.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let value: Value = serde_json::from_str(&text)?;
        Self::from_value(&value)
    }

    /// Write the container to a JSON file (sorted keys, 4-space indent),
    /// creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// IO and JSON encode errors.
    pub fn to_json_file(&self, path: impl AsRef<Path>) -> Result<()> {
        write_pretty_json(path.as_ref(), self)
    }

    /// Look up a node by dotted path (`"a.b.c"`).
    #[must_use]
    pub fn get(&self, dotted: &str) -> Option<&Node> {
        let mut segments = dotted.split('.');
        let mut node = self.fields.get(segments.next()?)?;
        for segment in segments {
            match node {
                Node::Table(fields) => node = fields.get(segment)?,
                _ => return None,
            }
        }
        Some(node)
    }

    /// Iterate over the top-level fields, in lexicographic order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.fields.iter().map(|(name, node)| (name.as_str(), node))
    }

    pub(crate) fn from_fields(fields: BTreeMap<String, Node>) -> Result<Self> {
        if fields.is_empty() {
            return Err(Error::EmptyConfig);
        }
        Ok(Self { fields })
    }

    pub(crate) fn fields_map(&self) -> &BTreeMap<String, Node> {
        &self.fields
    }
}

impl std::fmt::Display for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", to_pretty_string(&self.to_value()))
    }
}

/// Render a JSON value with 4-space indentation and a trailing newline-free
/// body, matching the on-disk config format.
#[must_use]
pub fn to_pretty_string(value: &Value) -> String {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    // Value serialization into an in-memory buffer cannot fail
    if value.serialize(&mut ser).is_ok() {
        String::from_utf8_lossy(&buf).into_owned()
    } else {
        String::new()
    }
}

pub(crate) fn write_pretty_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;
    buf.push(b'\n');
    fs::write(path, buf)?;
    Ok(())
}
