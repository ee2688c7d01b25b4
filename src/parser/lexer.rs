//! Tokenizer shared by speak expressions and guard conditions

use crate::condition::CompareOp;
use std::fmt;

/// A lexical token
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// `$name`
    Var(String),
    /// `"text"` or `'text'`
    Str(String),
    /// Bare text that parses as a number
    Number(f64),
    /// Any other bare text
    Word(String),
    Op(CompareOp),
    Plus,
    Comma,
    LParen,
    RParen,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Var(name) => write!(f, "${name}"),
            Token::Str(s) => write!(f, "\"{s}\""),
            Token::Number(n) => write!(f, "{n}"),
            Token::Word(w) => f.write_str(w),
            Token::Op(op) => write!(f, "{op}"),
            Token::Plus => f.write_str("+"),
            Token::Comma => f.write_str(","),
            Token::LParen => f.write_str("("),
            Token::RParen => f.write_str(")"),
        }
    }
}

/// Tokenization failure with the character column it occurred at
#[derive(Debug, Clone, PartialEq)]
pub struct LexError {
    pub column: usize,
    pub message: String,
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at column {}", self.message, self.column)
    }
}

/// Characters allowed in variable and step names
pub fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

pub fn is_identifier(s: &str) -> bool {
    !s.is_empty() && s.chars().all(is_ident_char)
}

fn is_delimiter(c: char) -> bool {
    c.is_whitespace() || matches!(c, '"' | '\'' | '$' | '(' | ')' | '+' | ',' | '=' | '!' | '<' | '>')
}

/// Split `input` into tokens
pub fn tokenize(input: &str) -> Result<Vec<Token>, LexError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < chars.len() {
        let c = chars[pos];
        match c {
            c if c.is_whitespace() => pos += 1,
            '"' | '\'' => {
                let (text, next) = read_quoted(&chars, pos)?;
                tokens.push(Token::Str(text));
                pos = next;
            }
            '$' => {
                let start = pos + 1;
                let mut end = start;
                while end < chars.len() && is_ident_char(chars[end]) {
                    end += 1;
                }
                if end == start {
                    return Err(LexError {
                        column: pos + 1,
                        message: "expected variable name after '$'".to_string(),
                    });
                }
                tokens.push(Token::Var(chars[start..end].iter().collect()));
                pos = end;
            }
            '(' => {
                tokens.push(Token::LParen);
                pos += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                pos += 1;
            }
            '+' => {
                tokens.push(Token::Plus);
                pos += 1;
            }
            ',' => {
                tokens.push(Token::Comma);
                pos += 1;
            }
            '=' | '!' | '<' | '>' => {
                let next = chars.get(pos + 1).copied();
                let (op, width) = match (c, next) {
                    ('=', Some('=')) => (CompareOp::Eq, 2),
                    ('!', Some('=')) => (CompareOp::Ne, 2),
                    ('<', Some('=')) => (CompareOp::Le, 2),
                    ('>', Some('=')) => (CompareOp::Ge, 2),
                    ('<', _) => (CompareOp::Lt, 1),
                    ('>', _) => (CompareOp::Gt, 1),
                    _ => {
                        return Err(LexError {
                            column: pos + 1,
                            message: format!("unexpected '{c}'"),
                        });
                    }
                };
                tokens.push(Token::Op(op));
                pos += width;
            }
            _ => {
                let start = pos;
                while pos < chars.len() && !is_delimiter(chars[pos]) {
                    pos += 1;
                }
                let word: String = chars[start..pos].iter().collect();
                match word.parse::<f64>() {
                    Ok(n) if n.is_finite() => tokens.push(Token::Number(n)),
                    _ => tokens.push(Token::Word(word)),
                }
            }
        }
    }

    Ok(tokens)
}

/// Read a quoted literal starting at `start`; returns the text and the index after the closing quote
fn read_quoted(chars: &[char], start: usize) -> Result<(String, usize), LexError> {
    let quote = chars[start];
    let mut text = String::new();
    let mut pos = start + 1;
    while pos < chars.len() {
        match chars[pos] {
            '\\' if matches!(chars.get(pos + 1), Some(&c) if c == quote || c == '\\') => {
                text.push(chars[pos + 1]);
                pos += 2;
            }
            c if c == quote => return Ok((text, pos + 1)),
            c => {
                text.push(c);
                pos += 1;
            }
        }
    }
    Err(LexError {
        column: start + 1,
        message: "unterminated string literal".to_string(),
    })
}

/// Read the quoted literal at the start of `input` and return it with the unread remainder
pub fn split_literal(input: &str) -> Result<(String, &str), LexError> {
    let chars: Vec<char> = input.chars().collect();
    if !matches!(chars.first(), Some('"' | '\'')) {
        return Err(LexError {
            column: 1,
            message: "expected a quoted literal".to_string(),
        });
    }
    let (text, next) = read_quoted(&chars, 0)?;
    let offset = input.char_indices().nth(next).map_or(input.len(), |(i, _)| i);
    Ok((text, &input[offset..]))
}

/// Quote `text` so that `tokenize` reads it back as a single `Str` token
pub fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}
