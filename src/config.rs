//! Config - a container with a deterministic identifier
//!
//! A [`Config`] is the [`Container`] used for run parameters. On top of the
//! tree it adds source resolution (JSON file path, inline JSON object, or an
//! existing config) and identifier derivation.
//!
//! ## Identifier algorithm
//!
//! Flatten the tree (depth-first, siblings lexicographic), drop every entry
//! whose final path segment starts with `_` (the "non-descriptive" marker,
//! a naming convention the container itself does not enforce), stringify
//! each remaining value, and join the tokens in flatten order:
//!
//! - lists join their elements with `x`: `[1, 2, 3]` → `1x2x3`
//! - booleans encode as the field's own name (`flag`) when true and
//!   `no_flag` when false
//! - everything else uses its natural string form
//!
//! ```rust
//! use labrat::Config;
//!
//! let config = Config::from_value(&serde_json::json!({
//!     "a": 10,
//!     "b": [1, 2, 3],
//!     "c": "x"
//! }))?;
//!
//! assert_eq!(config.identifier(), "10-1x2x3-x");
//! # Ok::<(), labrat::Error>(())
//! ```

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::container::{Container, Node, Scalar};
use crate::error::{Error, Result};

/// Default token separator for identifiers.
pub const DEFAULT_SEPARATOR: &str = "-";

/// Separator between list elements inside an identifier token.
const LIST_SEPARATOR: &str = "x";

/// Field-name prefix marking a field as non-descriptive.
const NON_DESCRIPTIVE_MARKER: char = '_';

/// A run-parameter container.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    container: Container,
}

/// The accepted sources a [`Config`] can be resolved from.
#[derive(Debug, Clone)]
pub enum ConfigSource {
    /// A path to a JSON file
    Path(PathBuf),
    /// An inline JSON object
    Value(Value),
    /// An already constructed config
    Config(Config),
}

impl From<&Path> for ConfigSource {
    fn from(path: &Path) -> Self {
        Self::Path(path.to_path_buf())
    }
}

impl From<PathBuf> for ConfigSource {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl From<Value> for ConfigSource {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<&Value> for ConfigSource {
    fn from(value: &Value) -> Self {
        Self::Value(value.clone())
    }
}

impl From<Config> for ConfigSource {
    fn from(config: Config) -> Self {
        Self::Config(config)
    }
}

impl Config {
    /// Resolve a config from any accepted source.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidConfigSource`] when a path does not point to a file
    /// or an inline value is not an object; otherwise the underlying
    /// container construction errors.
    pub fn resolve(source: impl Into<ConfigSource>) -> Result<Self> {
        match source.into() {
            ConfigSource::Path(path) => {
                if !path.is_file() {
                    return Err(Error::InvalidConfigSource(format!(
                        "`{}` is not a file",
                        path.display()
                    )));
                }
                Self::from_json_file(path)
            }
            ConfigSource::Value(value) => {
                if !value.is_object() {
                    return Err(Error::InvalidConfigSource(format!(
                        "inline value must be a JSON object, found `{value}`"
                    )));
                }
                Self::from_value(&value)
            }
            ConfigSource::Config(config) => Ok(config),
        }
    }

    /// Build a config from a JSON object.
    ///
    /// # Errors
    ///
    /// Same as [`Container::from_value`].
    pub fn from_value(value: &Value) -> Result<Self> {
        Ok(Self {
            container: Container::from_value(value)?,
        })
    }

    /// Read a config from a JSON file.
    ///
    /// # Errors
    ///
    /// Same as [`Container::from_json_file`].
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self {
            container: Container::from_json_file(path)?,
        })
    }

    /// Write the config as JSON (sorted keys, 4-space indent).
    ///
    /// # Errors
    ///
    /// Same as [`Container::to_json_file`].
    pub fn to_json_file(&self, path: impl AsRef<Path>) -> Result<()> {
        self.container.to_json_file(path)
    }

    /// The underlying container.
    #[must_use]
    pub fn container(&self) -> &Container {
        &self.container
    }

    /// Reconstruct the nested JSON object.
    #[must_use]
    pub fn to_value(&self) -> Value {
        self.container.to_value()
    }

    /// Derive the identifier with the default `-` separator.
    #[must_use]
    pub fn identifier(&self) -> String {
        self.identifier_with(DEFAULT_SEPARATOR)
    }

    /// Derive the identifier, joining tokens with `separator`.
    ///
    /// Stable across repeated calls on an unmutated config: flatten order
    /// alone drives the join.
    #[must_use]
    pub fn identifier_with(&self, separator: &str) -> String {
        let tokens: Vec<String> = self
            .container
            .as_flat_map()
            .into_iter()
            .filter(|(name, _)| is_descriptive(name))
            .filter_map(|(name, node)| value_token(&node, basename(&name)))
            .collect();
        tokens.join(separator)
    }
}

impl std::fmt::Display for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.container, f)
    }
}

/// Final segment of a dotted path.
fn basename(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}

/// A field is descriptive unless its basename starts with the marker.
fn is_descriptive(name: &str) -> bool {
    !basename(name).starts_with(NON_DESCRIPTIVE_MARKER)
}

/// Translate a leaf into its identifier token. Tables never reach here
/// because flat maps only hold leaves.
fn value_token(node: &Node, name: &str) -> Option<String> {
    match node {
        Node::List(elements) => Some(
            elements
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(LIST_SEPARATOR),
        ),
        Node::Leaf(Scalar::Bool(true)) => Some(name.to_string()),
        Node::Leaf(Scalar::Bool(false)) => Some(format!("no_{name}")),
        Node::Leaf(scalar) => Some(scalar.to_string()),
        Node::Table(_) => None,
    }
}
