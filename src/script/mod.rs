//! Room scripts
//!
//! A script is a list of [`ScriptNode`]s. The text front end ([`lex`],
//! [`Parser`]) produces them from source; the [`compiler`] lowers them to
//! bytecode.

pub mod compiler;
mod lexer;
mod parser;
mod span;

pub use compiler::{compile_script, RoomDirectory, ScriptContext, MAX_NESTING_DEPTH};
pub use lexer::{lex, LexError, SpannedToken, Token};
pub use parser::{ParseError, ParseErrorKind, ParseResult, Parser};
pub use span::{LineCol, Span};

use serde::Deserialize;
use std::fmt;

pub use crate::gamestate::VariableKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    Equal,
    NotEqual,
    LessThan,
    GreaterOrEqual,
    Set,
    Clear,
}

impl Comparator {
    /// Whether the comparator applies to variables of `kind`
    pub fn accepts(self, kind: VariableKind) -> bool {
        match self {
            Comparator::Set | Comparator::Clear => kind == VariableKind::Flag,
            _ => kind == VariableKind::Word,
        }
    }

    pub fn negate(self) -> Self {
        match self {
            Comparator::Equal => Comparator::NotEqual,
            Comparator::NotEqual => Comparator::Equal,
            Comparator::LessThan => Comparator::GreaterOrEqual,
            Comparator::GreaterOrEqual => Comparator::LessThan,
            Comparator::Set => Comparator::Clear,
            Comparator::Clear => Comparator::Set,
        }
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Comparator::Equal => "==",
            Comparator::NotEqual => "!=",
            Comparator::LessThan => "<",
            Comparator::GreaterOrEqual => ">=",
            Comparator::Set => "set",
            Comparator::Clear => "clear",
        };
        f.write_str(s)
    }
}

/// `flag NAME set`, `word NAME < 10`, ...
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    pub kind: VariableKind,
    pub variable: String,
    pub comparator: Comparator,
    /// Literal operand of a word comparison
    pub value: Option<String>,
}

impl Condition {
    pub fn flag(variable: &str, comparator: Comparator) -> Self {
        Self {
            kind: VariableKind::Flag,
            variable: variable.to_string(),
            comparator,
            value: None,
        }
    }

    pub fn word(variable: &str, comparator: Comparator, value: &str) -> Self {
        Self {
            kind: VariableKind::Word,
            variable: variable.to_string(),
            comparator,
            value: Some(value.to_string()),
        }
    }
}

/// An instruction invocation with its raw argument text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub opcode: String,
    pub arguments: Vec<String>,
}

impl Statement {
    pub fn new(opcode: &str, arguments: &[&str]) -> Self {
        Self {
            opcode: opcode.to_string(),
            arguments: arguments.iter().map(|a| a.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptNode {
    Statement(Statement),
    If {
        condition: Condition,
        then_branch: Vec<ScriptNode>,
        else_branch: Vec<ScriptNode>,
    },
    While {
        condition: Condition,
        body: Vec<ScriptNode>,
    },
    /// Compiles to nothing
    Comment(String),
}

/// A parsed script, deserialized from its source text
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct Script {
    pub nodes: Vec<ScriptNode>,
}

impl Script {
    pub fn new(nodes: Vec<ScriptNode>) -> Self {
        Self { nodes }
    }

    /// Lex and parse script source text
    pub fn parse(source: &str) -> Result<Self, String> {
        let tokens = lex(source).map_err(|e| {
            format!("{} at {}", e.message, Span::from(e.span).position(source))
        })?;
        let nodes = Parser::parse(&tokens).map_err(|e| e.format_with_source(source))?;
        Ok(Self { nodes })
    }
}

impl TryFrom<String> for Script {
    type Error = String;

    fn try_from(source: String) -> Result<Self, Self::Error> {
        Script::parse(&source)
    }
}
