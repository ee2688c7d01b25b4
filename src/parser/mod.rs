//! Dialogue script compiler
//!
//! Converts the line-oriented script format into a [`StepGraph`]. One
//! directive per line; blank lines and `#`/`//` comments are skipped, and so
//! are lines whose keyword is not a directive. A recognized directive with
//! malformed arguments is a [`CompileError`].
//!
//! ```text
//! Step welcome
//!   Speak "您好，" + $name
//!   Listen 5,20
//!   If $amount > 100 Then vipProc
//!   Branch "投诉", complainProc
//! ```

use crate::condition;
use crate::domain::errors::CompileError;
use crate::types::graph::{Action, Guard, Step, StepGraph, ValueSpec};
use lexer::{Token, is_ident_char, is_identifier, split_literal, tokenize};
use std::collections::BTreeMap;

pub mod check;
pub mod lexer;
mod render;

pub use render::render;

#[cfg(test)]
mod tests;

/// Compile script source into a step graph
pub fn compile(source: &str) -> Result<StepGraph, CompileError> {
    let compiler = ScriptCompiler::new(source);
    compiler.compile()
}

/// Target of the `Middle` directive
pub const MIDDLE_STEP: &str = "middleProc";

struct ScriptCompiler<'a> {
    lines: Vec<&'a str>,
    current_line: usize,
    steps: BTreeMap<String, Step>,
    current: Option<Step>,
}

impl<'a> ScriptCompiler<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            lines: source.lines().collect(),
            current_line: 0,
            steps: BTreeMap::new(),
            current: None,
        }
    }

    fn compile(mut self) -> Result<StepGraph, CompileError> {
        while self.current_line < self.lines.len() {
            self.compile_line()?;
            self.current_line += 1;
        }
        // End of input flushes the last step
        self.flush();

        log::debug!(
            target: "csbot::parser",
            "compiled {} steps from {} lines",
            self.steps.len(),
            self.lines.len()
        );
        Ok(StepGraph::new(self.steps))
    }

    fn compile_line(&mut self) -> Result<(), CompileError> {
        let raw: &'a str = self.lines[self.current_line];
        let line = raw.trim();

        if line.is_empty() || line.starts_with('#') || line.starts_with("//") {
            return Ok(());
        }

        let (keyword, rest) = match line.split_once(char::is_whitespace) {
            Some((keyword, rest)) => (keyword, rest.trim()),
            None => (line, ""),
        };

        match keyword {
            "Step" => {
                let name = self.parse_step_name(rest)?;
                self.flush();
                self.current = Some(Step::new(name));
            }
            "Speak" => {
                let template = self.parse_speak(rest)?;
                self.push_action(Action::Speak { template });
            }
            "Listen" => {
                let (min_duration, max_duration) = self.parse_listen(rest)?;
                self.push_action(Action::Listen {
                    min_duration,
                    max_duration,
                });
            }
            "UPGRATE" | "UPGRADE" => {
                let (field, value) = self.parse_upgrade(rest)?;
                self.push_action(Action::Upgrade { field, value });
            }
            "If" => {
                let guard = self.parse_if(rest)?;
                if let Some(step) = self.current_step_mut() {
                    step.guards.push(guard);
                }
            }
            "Branch" => {
                let (label, target) = self.parse_branch(rest)?;
                if let Some(step) = self.current_step_mut() {
                    step.branch.insert(label, target);
                }
            }
            "Exit" => {
                self.expect_no_arguments(keyword, rest)?;
                self.push_action(Action::Exit);
            }
            "Middle" => {
                self.expect_no_arguments(keyword, rest)?;
                self.push_action(Action::Jump {
                    target: MIDDLE_STEP.to_string(),
                });
            }
            _ => {
                log::debug!(
                    target: "csbot::parser",
                    "skipping unrecognized line {}: {}",
                    self.current_line + 1,
                    line
                );
            }
        }

        Ok(())
    }

    fn flush(&mut self) {
        if let Some(step) = self.current.take() {
            if self.steps.contains_key(&step.name) {
                log::warn!(
                    target: "csbot::parser",
                    "step '{}' redefined; the later definition wins",
                    step.name
                );
            }
            self.steps.insert(step.name.clone(), step);
        }
    }

    fn current_step_mut(&mut self) -> Option<&mut Step> {
        if self.current.is_none() {
            log::warn!(
                target: "csbot::parser",
                "line {} appears before any Step and is ignored",
                self.current_line + 1
            );
        }
        self.current.as_mut()
    }

    fn push_action(&mut self, action: Action) {
        if let Some(step) = self.current_step_mut() {
            step.actions.push(action);
        }
    }

    fn error(&self, message: impl Into<String>) -> CompileError {
        CompileError::syntax(
            self.current_line + 1,
            self.lines[self.current_line].trim(),
            message,
        )
    }

    fn expect_no_arguments(&self, keyword: &str, rest: &str) -> Result<(), CompileError> {
        if rest.is_empty() {
            Ok(())
        } else {
            Err(self.error(format!("{keyword} takes no arguments")))
        }
    }

    fn parse_step_name(&self, rest: &str) -> Result<String, CompileError> {
        if rest.is_empty() {
            return Err(self.error("Step requires a name"));
        }
        if !is_identifier(rest) {
            return Err(self.error(format!("invalid step name '{rest}'")));
        }
        Ok(rest.to_string())
    }

    /// `"text"`, `$name`, or a `+`-concatenation of both; bare text is taken verbatim.
    ///
    /// `$name` written inside literal text is a placeholder too.
    fn parse_speak(&self, rest: &str) -> Result<String, CompileError> {
        if !rest.starts_with(['"', '\'', '$']) {
            return Ok(brace_variables(rest));
        }

        let tokens = tokenize(rest).map_err(|e| self.error(e.to_string()))?;
        let mut template = String::new();
        let mut expect_operand = true;
        for token in &tokens {
            match (expect_operand, token) {
                (true, Token::Str(text)) => template.push_str(&brace_variables(text)),
                (true, Token::Var(name)) => {
                    template.push_str("${");
                    template.push_str(name);
                    template.push('}');
                }
                (false, Token::Plus) => {}
                (true, other) => {
                    return Err(self.error(format!("expected a string or variable, found `{other}`")));
                }
                (false, other) => return Err(self.error(format!("expected '+', found `{other}`"))),
            }
            expect_operand = !expect_operand;
        }
        if expect_operand {
            return Err(self.error("Speak expression ends with '+'"));
        }
        Ok(template)
    }

    fn parse_listen(&self, rest: &str) -> Result<(u32, u32), CompileError> {
        let (min, max) = rest
            .split_once(',')
            .ok_or_else(|| self.error("Listen expects `<min>,<max>`"))?;
        let parse = |s: &str| {
            s.trim()
                .parse::<u32>()
                .map_err(|_| self.error(format!("invalid Listen duration '{}'", s.trim())))
        };
        Ok((parse(min)?, parse(max)?))
    }

    /// `$field "value"`, `$field value` or `$field $other`
    fn parse_upgrade(&self, rest: &str) -> Result<(String, ValueSpec), CompileError> {
        let field_part = rest
            .strip_prefix('$')
            .ok_or_else(|| self.error("UPGRATE expects `$field \"value\"`"))?;
        let (field, raw_value) = match field_part.split_once(char::is_whitespace) {
            Some((field, value)) => (field, value.trim()),
            None => (field_part, ""),
        };
        if !is_identifier(field) {
            return Err(self.error(format!("invalid field name '{field}'")));
        }
        if raw_value.is_empty() {
            return Err(self.error("UPGRATE requires a value"));
        }

        let value = if raw_value.starts_with('"') {
            match tokenize(raw_value).map_err(|e| self.error(e.to_string()))?.as_slice() {
                [Token::Str(text)] => text.clone(),
                _ => return Err(self.error("unexpected text after quoted value")),
            }
        } else {
            raw_value.to_string()
        };

        Ok((field.to_string(), ValueSpec::parse(&value)))
    }

    /// `<condition> Then <target>`
    fn parse_if(&self, rest: &str) -> Result<Guard, CompileError> {
        let (condition, target) =
            split_then(rest).ok_or_else(|| self.error("If expects `<condition> Then <target>`"))?;
        if condition.is_empty() {
            return Err(self.error("If requires a condition"));
        }
        if !is_identifier(target) {
            return Err(self.error(format!("invalid target step '{target}'")));
        }
        condition::check_syntax(condition).map_err(|message| self.error(message))?;
        Ok(Guard::new(condition, target))
    }

    /// `"label", target` or `label, target`
    fn parse_branch(&self, rest: &str) -> Result<(String, String), CompileError> {
        let (label, target) = if rest.starts_with(['"', '\'']) {
            let (label, after) = split_literal(rest).map_err(|e| self.error(e.to_string()))?;
            let target = after
                .trim_start()
                .strip_prefix(',')
                .ok_or_else(|| self.error("Branch expects `\"label\", target`"))?;
            (label, target.trim().to_string())
        } else {
            let (label, target) = rest
                .split_once(',')
                .ok_or_else(|| self.error("Branch expects `label, target`"))?;
            (label.trim().to_string(), target.trim().to_string())
        };
        if label.is_empty() {
            return Err(self.error("Branch requires a label"));
        }
        if !is_identifier(&target) {
            return Err(self.error(format!("invalid target step '{target}'")));
        }
        Ok((label, target))
    }
}

/// Rewrite each `$name` in literal text as `${name}`
fn brace_variables(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        out.push(c);
        if c != '$' || !chars.peek().is_some_and(|&next| is_ident_char(next)) {
            continue;
        }
        out.push('{');
        while let Some(next) = chars.next_if(|&next| is_ident_char(next)) {
            out.push(next);
        }
        out.push('}');
    }
    out
}

/// Split at the first whitespace-delimited `Then` outside quoted text
fn split_then(rest: &str) -> Option<(&str, &str)> {
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (i, c) in rest.char_indices() {
        if let Some(open) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == open {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' => quote = Some(c),
            'T' if rest[i..].starts_with("Then") => {
                let end = i + "Then".len();
                if rest[..i].ends_with(char::is_whitespace)
                    && rest[end..].starts_with(char::is_whitespace)
                {
                    return Some((rest[..i].trim(), rest[end..].trim()));
                }
            }
            _ => {}
        }
    }
    None
}
