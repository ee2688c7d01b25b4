//! Session variable store and input buffer

use crate::types::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One committed variable write
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Commit {
    pub field: String,
    pub value: Value,
}

/// Mutable variable store owned by exactly one running session
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct VariableStore {
    vars: BTreeMap<String, Value>,
    /// Writes that changed a value, in commit order
    #[serde(skip)]
    changes: Vec<Commit>,
}

impl VariableStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a store without recording changes
    pub fn from_map(vars: BTreeMap<String, Value>) -> Self {
        Self {
            vars,
            changes: Vec::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    /// Get variable value as display string
    pub fn get_var(&self, name: &str) -> Option<String> {
        self.vars.get(name).map(Value::to_string)
    }

    /// Seed a value without recording a change (initial data only)
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.vars.insert(name.into(), value.into());
    }

    /// Merge seed values, overwriting existing entries without recording changes
    pub fn extend(&mut self, vars: impl IntoIterator<Item = (String, Value)>) {
        self.vars.extend(vars);
    }

    /// Write a value, returning the commit if the stored value changed.
    ///
    /// Writing the current value again is a no-op and leaves the change log untouched.
    pub fn set(&mut self, name: &str, value: Value) -> Option<Commit> {
        if self.vars.get(name) == Some(&value) {
            return None;
        }
        self.vars.insert(name.to_string(), value.clone());
        let commit = Commit {
            field: name.to_string(),
            value,
        };
        self.changes.push(commit.clone());
        Some(commit)
    }

    pub fn change_log(&self) -> &[Commit] {
        &self.changes
    }

    pub fn snapshot(&self) -> BTreeMap<String, Value> {
        self.vars.clone()
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Replace every `${name}` with the variable's display form.
    ///
    /// Unknown names and unterminated placeholders are left as literal text.
    pub fn substitute(&self, template: &str) -> String {
        let mut out = String::with_capacity(template.len());
        let mut rest = template;
        while let Some(start) = rest.find("${") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            match after.find('}') {
                Some(end) => {
                    let name = &after[..end];
                    match self.vars.get(name) {
                        Some(value) => out.push_str(&value.to_string()),
                        None => {
                            out.push_str("${");
                            out.push_str(name);
                            out.push('}');
                        }
                    }
                    rest = &after[end + 1..];
                }
                None => {
                    out.push_str(&rest[start..]);
                    rest = "";
                }
            }
        }
        out.push_str(rest);
        out
    }
}

/// Single-slot holder for the latest listened input and intent
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct InputBuffer {
    pub listen_content: Option<String>,
    pub intent: Option<String>,
}
