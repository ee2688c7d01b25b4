//! Guard condition evaluation
//!
//! Conditions are a bounded grammar: a single comparison `$name <op> literal`,
//! optionally wrapped in parentheses. They are parsed into a [`Comparison`]
//! and evaluated against the variable store. Nothing in a condition is ever
//! executed.

use crate::domain::errors::EvaluationError;
use crate::parser::lexer::{Token, tokenize};
use crate::types::state::VariableStore;
use crate::types::value::Value;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Lt,
    Ge,
    Le,
}

impl CompareOp {
    fn is_ordering(self) -> bool {
        !matches!(self, CompareOp::Eq | CompareOp::Ne)
    }

    fn holds(self, ordering: Ordering) -> bool {
        match self {
            CompareOp::Eq => ordering == Ordering::Equal,
            CompareOp::Ne => ordering != Ordering::Equal,
            CompareOp::Gt => ordering == Ordering::Greater,
            CompareOp::Lt => ordering == Ordering::Less,
            CompareOp::Ge => ordering != Ordering::Less,
            CompareOp::Le => ordering != Ordering::Greater,
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
            CompareOp::Gt => ">",
            CompareOp::Lt => "<",
            CompareOp::Ge => ">=",
            CompareOp::Le => "<=",
        })
    }
}

/// A parsed guard condition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    /// Variable name, without the `$`
    pub left: String,
    pub op: CompareOp,
    pub right: Value,
}

impl Comparison {
    /// Evaluate against the current variable values
    pub fn evaluate(&self, store: &VariableStore) -> Result<bool, EvaluationError> {
        let left = store
            .get(&self.left)
            .ok_or_else(|| EvaluationError::unbound(&self.left))?;
        compare(left, self.op, &self.right)
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.right {
            Value::String(s) => write!(f, "${} {} {}", self.left, self.op, crate::parser::lexer::quote(s)),
            other => write!(f, "${} {} {}", self.left, self.op, other),
        }
    }
}

/// Parse a condition without evaluating it
pub fn parse_condition(condition: &str) -> Result<Comparison, EvaluationError> {
    let tokens =
        tokenize(condition).map_err(|e| EvaluationError::parse(condition, e.to_string()))?;
    check_parens(&tokens).map_err(|message| EvaluationError::parse(condition, message))?;

    let mut inner = tokens.as_slice();
    while let [Token::LParen, rest @ .., Token::RParen] = inner {
        // Only strip when the outer pair encloses everything
        if check_parens(rest).is_err() {
            break;
        }
        inner = rest;
    }

    match inner {
        [Token::Var(name), Token::Op(op), literal] => Ok(Comparison {
            left: name.clone(),
            op: *op,
            right: literal_value(literal).ok_or_else(|| {
                EvaluationError::parse(condition, format!("expected a literal, found `{literal}`"))
            })?,
        }),
        [] => Err(EvaluationError::parse(condition, "empty condition")),
        _ => Err(EvaluationError::parse(
            condition,
            "expected `$name <op> literal`",
        )),
    }
}

/// Parse and evaluate a condition against `store`
pub fn evaluate(condition: &str, store: &VariableStore) -> Result<bool, EvaluationError> {
    parse_condition(condition)?.evaluate(store)
}

/// Syntactic check used at compile time: terminated literals and balanced parentheses
pub fn check_syntax(condition: &str) -> Result<(), String> {
    let tokens = tokenize(condition).map_err(|e| e.to_string())?;
    check_parens(&tokens)
}

fn check_parens(tokens: &[Token]) -> Result<(), String> {
    let mut depth: usize = 0;
    for token in tokens {
        match token {
            Token::LParen => depth += 1,
            Token::RParen => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| "unbalanced parentheses: unexpected ')'".to_string())?;
            }
            _ => {}
        }
    }
    if depth == 0 {
        Ok(())
    } else {
        Err("unbalanced parentheses: missing ')'".to_string())
    }
}

fn literal_value(token: &Token) -> Option<Value> {
    match token {
        Token::Number(n) => Some(Value::Number(*n)),
        Token::Str(s) => Some(Value::String(s.clone())),
        Token::Word(w) if w == "true" => Some(Value::Bool(true)),
        Token::Word(w) if w == "false" => Some(Value::Bool(false)),
        Token::Word(w) => Some(Value::String(w.clone())),
        _ => None,
    }
}

fn compare(left: &Value, op: CompareOp, right: &Value) -> Result<bool, EvaluationError> {
    let ordering = match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.partial_cmp(b),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) if !op.is_ordering() => Some(a.cmp(b)),
        _ if !op.is_ordering() => Some(left.to_string().cmp(&right.to_string())),
        _ => None,
    };
    ordering.map(|o| op.holds(o)).ok_or_else(|| EvaluationError::TypeMismatch {
        op: op.to_string(),
        left: format!("{} {}", left.type_name(), left),
        right: format!("{} {}", right.type_name(), right),
    })
}
