//! Flat (dotted-path) view of a container
//!
//! `as_flat_map` walks the tree depth-first, siblings in lexicographic order
//! at every level, producing `("a.b.c", leaf)` pairs. That ordering is the
//! contract the identifier algorithm builds on. `from_flat_map` is the
//! inverse: dotted keys are split on `.` and inserted, creating intermediate
//! tables as needed.

use std::collections::BTreeMap;

use super::{Container, Node};
use crate::error::{Error, Result};

/// Separator between path segments in flat keys.
pub const PATH_SEPARATOR: char = '.';

impl Container {
    /// Flatten the tree into ordered `(dotted-path, leaf)` pairs.
    ///
    /// Values are [`Node::Leaf`] or [`Node::List`], never [`Node::Table`].
    ///
    /// ```rust
    /// use labrat::container::Container;
    ///
    /// let container = Container::from_value(&serde_json::json!({
    ///     "b": {"c": 20},
    ///     "a": 10
    /// }))?;
    ///
    /// let keys: Vec<_> = container
    ///     .as_flat_map()
    ///     .into_iter()
    ///     .map(|(key, _)| key)
    ///     .collect();
    /// assert_eq!(keys, vec!["a", "b.c"]);
    /// # Ok::<(), labrat::Error>(())
    /// ```
    #[must_use]
    pub fn as_flat_map(&self) -> Vec<(String, Node)> {
        let mut entries = Vec::new();
        collect(self.fields_map(), "", &mut entries);
        entries
    }

    /// Rebuild a container from `(dotted-path, leaf)` pairs.
    ///
    /// # Errors
    ///
    /// [`Error::EmptyConfig`] for an empty input, [`Error::UnsupportedValue`]
    /// when a value is a table or a key path collides with an already
    /// inserted leaf (e.g. `"a"` followed by `"a.b"`).
    pub fn from_flat_map<I>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, Node)>,
    {
        let mut fields = BTreeMap::new();
        for (key, value) in entries {
            if matches!(value, Node::Table(_)) {
                return Err(Error::UnsupportedValue(format!(
                    "flat value for `{key}` must be a leaf, not a table"
                )));
            }
            insert_dotted(&mut fields, &key, value)?;
        }
        Self::from_fields(fields)
    }
}

fn collect(fields: &BTreeMap<String, Node>, prefix: &str, entries: &mut Vec<(String, Node)>) {
    for (name, node) in fields {
        let full_name = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{prefix}{PATH_SEPARATOR}{name}")
        };
        match node {
            Node::Table(children) => collect(children, &full_name, entries),
            leaf => entries.push((full_name, leaf.clone())),
        }
    }
}

fn insert_dotted(fields: &mut BTreeMap<String, Node>, key: &str, value: Node) -> Result<()> {
    match key.split_once(PATH_SEPARATOR) {
        None => {
            if fields.contains_key(key) {
                return Err(Error::UnsupportedValue(format!(
                    "flat key `{key}` collides with an existing entry"
                )));
            }
            fields.insert(key.to_string(), value);
            Ok(())
        }
        Some((head, rest)) => {
            let entry = fields
                .entry(head.to_string())
                .or_insert_with(|| Node::Table(BTreeMap::new()));
            match entry {
                Node::Table(children) => insert_dotted(children, rest, value),
                _ => Err(Error::UnsupportedValue(format!(
                    "flat key `{key}` collides with the leaf `{head}`"
                ))),
            }
        }
    }
}
