//! Indented text outline of a tree, for terminals.
//!
//! ```text
//! completed: 0
//! todos/
//!   [0]@/
//!     title: Buy milk
//! newTodo@/
//!   title: String
//! ```
//!
//! `@` marks controls (nodes with an href), `/` marks nodes with entries.

use crate::{Document, Key, NodeId, Value};
use colored::Colorize;
use std::fmt::Write;

impl Document {
    pub fn outline(&self, id: NodeId, color: bool) -> String {
        let mut output = String::new();
        self.outline_into(id, 0, color, &mut output);
        output
    }

    fn outline_into(&self, id: NodeId, depth: usize, color: bool, output: &mut String) {
        let indent = "  ".repeat(depth);

        for (key, value) in self.entries(id) {
            let label = match &key {
                Key::Name(name) => name.clone(),
                Key::Index(index) => format!("[{}]", index),
            };

            match value {
                Value::Scalar(scalar) => {
                    let _ = writeln!(output, "{}{}: {}", indent, label, scalar);
                }
                Value::Node(child) => {
                    let is_control = self
                        .attributes(child)
                        .map(|a| a.is_control())
                        .unwrap_or(false);
                    let has_children = !self.is_empty(child);
                    let suffix = match (is_control, has_children) {
                        (true, true) => "@/",
                        (true, false) => "@",
                        (false, true) => "/",
                        (false, false) => "",
                    };

                    let heading = format!("{}{}", label, suffix);
                    if is_control && color {
                        let _ = writeln!(output, "{}{}", indent, heading.bold());
                    } else {
                        let _ = writeln!(output, "{}{}", indent, heading);
                    }

                    if has_children {
                        self.outline_into(child, depth + 1, color, output);
                    }
                }
            }
        }
    }
}
