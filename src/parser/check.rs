//! Static validation of compiled step graphs
//!
//! Everything reported here is advisory: the engine still detects dangling
//! transitions only when they are taken.

use crate::condition::parse_condition;
use crate::config::EngineConfig;
use crate::types::graph::{Action, StepGraph};
use std::collections::{BTreeSet, VecDeque};
use std::fmt;

/// A problem found in a step graph
#[derive(Debug, Clone, PartialEq)]
pub struct Warning {
    /// Step the warning belongs to, if any
    pub step: Option<String>,
    pub message: String,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.step {
            Some(step) => write!(f, "[{step}] {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Result of graph validation
#[derive(Debug, Clone, PartialEq)]
pub struct CheckResult {
    pub warnings: Vec<Warning>,
    /// Whether the graph can start at all (the entry step exists)
    pub is_valid: bool,
}

/// Perform static validation on a step graph
///
/// This function checks for:
/// - A missing entry step
/// - Branch, guard and jump targets that name no step
/// - Guard conditions outside the comparison grammar
/// - Branches on steps that never listen
/// - Steps with no way out
/// - Steps unreachable from the entry step
pub fn check(graph: &StepGraph, config: &EngineConfig) -> CheckResult {
    let mut warnings = Vec::new();

    let has_entry = graph.contains(&config.entry_step);
    if !has_entry {
        warnings.push(Warning {
            step: None,
            message: format!("entry step '{}' is not defined", config.entry_step),
        });
    }

    for step in graph.steps.values() {
        for target in step.targets() {
            if !graph.contains(target) {
                warnings.push(Warning {
                    step: Some(step.name.clone()),
                    message: format!("transition to undefined step '{target}'"),
                });
            }
        }

        for guard in &step.guards {
            if let Err(err) = parse_condition(&guard.condition) {
                warnings.push(Warning {
                    step: Some(step.name.clone()),
                    message: format!("guard never fires: {err}"),
                });
            }
        }

        if !step.branch.is_empty() && !step.has_listen() {
            warnings.push(Warning {
                step: Some(step.name.clone()),
                message: format!(
                    "branches without Listen; only '{}' can match",
                    config.fallback_label
                ),
            });
        }

        if step.name != config.exit_step
            && step.branch.is_empty()
            && step.guards.is_empty()
            && is_open_ended(step)
        {
            warnings.push(Warning {
                step: Some(step.name.clone()),
                message: "no branch, guard, Middle or Exit; the session ends here".to_string(),
            });
        }
    }

    if has_entry {
        let reachable = reachable_from(graph, &config.entry_step);
        for name in graph.names() {
            // The exit step is entered implicitly by Exit
            if !reachable.contains(name) && name != config.exit_step {
                warnings.push(Warning {
                    step: Some(name.to_string()),
                    message: format!("unreachable from '{}'", config.entry_step),
                });
            }
        }
    }

    CheckResult {
        is_valid: has_entry,
        warnings,
    }
}

fn is_open_ended(step: &crate::types::graph::Step) -> bool {
    !step
        .actions
        .iter()
        .any(|a| matches!(a, Action::Jump { .. } | Action::Exit))
}

fn reachable_from<'g>(graph: &'g StepGraph, entry: &'g str) -> BTreeSet<&'g str> {
    let mut seen = BTreeSet::new();
    let mut queue = VecDeque::from([entry]);
    while let Some(name) = queue.pop_front() {
        if !seen.insert(name) {
            continue;
        }
        if let Some(step) = graph.get(name) {
            queue.extend(step.targets().into_iter().filter(|t| graph.contains(t)));
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::compile;

    #[test]
    fn check_dangling_and_unreachable() {
        let script = r#"
Step welcome
  Speak "hi"
  Listen 5,20
  Branch "投诉", complainProc
  Branch "订单", orderProc

Step orderProc
  Exit

Step orphan
  Exit

Step exit
  Speak "Bye"
"#;
        let graph = compile(script).unwrap();
        let result = check(&graph, &EngineConfig::default());

        assert!(result.is_valid);
        let messages: Vec<String> = result.warnings.iter().map(|w| w.to_string()).collect();
        assert!(
            messages
                .iter()
                .any(|m| m.contains("[welcome]") && m.contains("complainProc"))
        );
        assert!(
            messages
                .iter()
                .any(|m| m.contains("[orphan]") && m.contains("unreachable"))
        );
        assert!(!messages.iter().any(|m| m.starts_with("[exit]")
            && m.contains("unreachable")));
    }

    #[test]
    fn check_missing_entry_and_bad_guard() {
        let script = r#"
Step start
  If $amount > 100 and $vip == true Then start
  Exit
"#;
        let graph = compile(script).unwrap();
        let result = check(&graph, &EngineConfig::default());

        assert!(!result.is_valid);
        assert!(result.warnings[0].message.contains("welcome"));
        assert!(
            result
                .warnings
                .iter()
                .any(|w| w.message.contains("guard never fires"))
        );
    }

    #[test]
    fn check_clean_graph_has_no_warnings() {
        let script = r#"
Step welcome
  Speak "hi"
  Exit

Step exit
  Speak "Bye"
"#;
        let graph = compile(script).unwrap();
        let result = check(&graph, &EngineConfig::default());
        assert!(result.is_valid);
        assert_eq!(result.warnings, Vec::new());
    }
}
