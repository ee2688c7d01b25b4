//! Render a step graph back to script text

use super::MIDDLE_STEP;
use super::lexer::{is_identifier, quote};
use crate::types::graph::{Action, StepGraph, ValueSpec};
use std::fmt::Write;

/// Render `graph` as script source.
///
/// Compiling the output yields a graph equal to `graph`, provided every
/// `Jump` targets the middle step (the only jump the script syntax can express).
pub fn render(graph: &StepGraph) -> String {
    let mut out = String::new();
    for step in graph.steps.values() {
        let _ = writeln!(out, "Step {}", step.name);
        for action in &step.actions {
            match action {
                Action::Speak { template } => {
                    let _ = writeln!(out, "  Speak {}", render_template(template));
                }
                Action::Listen {
                    min_duration,
                    max_duration,
                } => {
                    let _ = writeln!(out, "  Listen {min_duration},{max_duration}");
                }
                Action::Upgrade { field, value } => {
                    let value = match value {
                        ValueSpec::Literal(text) => quote(text),
                        ValueSpec::Reference(name) => quote(&format!("${name}")),
                    };
                    let _ = writeln!(out, "  UPGRATE ${field} {value}");
                }
                Action::Jump { target } => {
                    if target != MIDDLE_STEP {
                        log::warn!(
                            target: "csbot::parser",
                            "jump to '{target}' has no script form; rendering as Middle"
                        );
                    }
                    let _ = writeln!(out, "  Middle");
                }
                Action::Exit => {
                    let _ = writeln!(out, "  Exit");
                }
            }
        }
        for guard in &step.guards {
            let _ = writeln!(out, "  If {} Then {}", guard.condition, guard.target);
        }
        for (label, target) in &step.branch {
            let _ = writeln!(out, "  Branch {}, {}", quote(label), target);
        }
        out.push('\n');
    }
    out
}

/// Turn `Hello ${name}!` into `"Hello " + $name + "!"`
fn render_template(template: &str) -> String {
    let mut parts: Vec<String> = Vec::new();
    let mut literal = String::new();
    let mut rest = template;

    while let Some(start) = rest.find("${") {
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) if is_identifier(&after[..end]) => {
                literal.push_str(&rest[..start]);
                if !literal.is_empty() {
                    parts.push(quote(&literal));
                    literal.clear();
                }
                parts.push(format!("${}", &after[..end]));
                rest = &after[end + 1..];
            }
            _ => {
                literal.push_str(&rest[..start + 2]);
                rest = after;
            }
        }
    }
    literal.push_str(rest);
    if !literal.is_empty() || parts.is_empty() {
        parts.push(quote(&literal));
    }
    parts.join(" + ")
}
