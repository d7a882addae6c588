//! Colored diff between two configs
//!
//! The diff works on the flattened trees: dotted keys present only in the
//! first config show as removals, keys only in the second as additions, and
//! keys whose values differ show both values. Unchanged keys are omitted.

use std::collections::BTreeMap;

use colored::Colorize;

use crate::config::Config;
use crate::container::Node;

/// Render the flat-key diff of `first` against `second`.
#[must_use]
pub(crate) fn render(first: &Config, second: &Config) -> String {
    let first_flat: BTreeMap<String, Node> =
        first.container().as_flat_map().into_iter().collect();
    let second_flat: BTreeMap<String, Node> =
        second.container().as_flat_map().into_iter().collect();

    let mut lines = Vec::new();

    for (key, value) in &first_flat {
        match second_flat.get(key) {
            None => lines.push(
                format!("- {key} = {}", render_node(value))
                    .red()
                    .to_string(),
            ),
            Some(other) if other != value => {
                lines.push(
                    format!("- {key} = {}", render_node(value))
                        .red()
                        .to_string(),
                );
                lines.push(
                    format!("+ {key} = {}", render_node(other))
                        .green()
                        .to_string(),
                );
            }
            Some(_) => {}
        }
    }

    for (key, value) in &second_flat {
        if !first_flat.contains_key(key) {
            lines.push(
                format!("+ {key} = {}", render_node(value))
                    .green()
                    .to_string(),
            );
        }
    }

    if lines.is_empty() {
        "Configs are identical.".blue().to_string()
    } else {
        lines.join("\n")
    }
}

pub(crate) fn render_node(node: &Node) -> String {
    match node {
        Node::Leaf(scalar) => scalar.to_string(),
        Node::List(elements) => format!(
            "[{}]",
            elements
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        ),
        Node::Table(_) => String::new(),
    }
}
