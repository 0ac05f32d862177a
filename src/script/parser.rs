//! Parser for room script source
//!
//! A recursive descent parser that builds [`ScriptNode`] trees from tokens.
//! It does not check instruction names, argument counts or comparator
//! kinds; the compiler reports those with the rest of the script errors.

use super::lexer::{SpannedToken, Token};
use super::span::Span;
use super::{Comparator, Condition, ScriptNode, Statement, VariableKind};

/// Deepest `if`/`while` nesting the parser accepts
///
/// The compiler reports anything past its own, lower limit as a script
/// error; this bound only keeps hostile input from exhausting the stack.
pub const MAX_PARSE_DEPTH: usize = 64;

/// A parse error
#[derive(Debug, Clone)]
pub struct ParseError {
    pub span: Span,
    pub kind: ParseErrorKind,
}

#[derive(Debug, Clone)]
pub enum ParseErrorKind {
    UnexpectedToken {
        expected: String,
        found: Option<Token>,
    },
    UnexpectedEof { expected: String },
    NestingTooDeep { max: usize },
}

impl ParseError {
    pub fn unexpected_token(span: Span, expected: impl Into<String>, found: Option<Token>) -> Self {
        let expected = expected.into();
        match found {
            Some(found) => Self {
                span,
                kind: ParseErrorKind::UnexpectedToken {
                    expected,
                    found: Some(found),
                },
            },
            None => Self {
                span,
                kind: ParseErrorKind::UnexpectedEof { expected },
            },
        }
    }

    /// Format error with line:col instead of byte offsets
    pub fn format_with_source(&self, source: &str) -> String {
        match &self.kind {
            ParseErrorKind::UnexpectedToken { expected, found } => {
                let found_str = match found {
                    Some(tok) => format_token(tok),
                    None => "end of script".to_string(),
                };
                format!(
                    "expected {}, found {} at {}",
                    expected,
                    found_str,
                    self.span.position(source)
                )
            }
            ParseErrorKind::UnexpectedEof { expected } => {
                format!("unexpected end of script, expected {}", expected)
            }
            ParseErrorKind::NestingTooDeep { max } => format!(
                "blocks nested more than {} levels deep at {}",
                max,
                self.span.position(source)
            ),
        }
    }
}

fn format_token(token: &Token) -> String {
    match token {
        Token::Ident(name) => format!("identifier '{}'", name),
        Token::Number(n) => format!("number {}", n),
        Token::Comment(_) => "comment".to_string(),
        Token::If => "keyword 'if'".to_string(),
        Token::Else => "keyword 'else'".to_string(),
        Token::While => "keyword 'while'".to_string(),
        Token::Flag => "keyword 'flag'".to_string(),
        Token::Word => "keyword 'word'".to_string(),
        Token::Set => "keyword 'set'".to_string(),
        Token::Clear => "keyword 'clear'".to_string(),
        Token::EqEq => "'=='".to_string(),
        Token::Ne => "'!='".to_string(),
        Token::Lt => "'<'".to_string(),
        Token::Ge => "'>='".to_string(),
        Token::LBrace => "'{'".to_string(),
        Token::RBrace => "'}'".to_string(),
        Token::Semi => "';'".to_string(),
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            ParseErrorKind::UnexpectedToken { expected, found } => {
                let found_str = match found {
                    Some(tok) => format_token(tok),
                    None => "end of script".to_string(),
                };
                write!(
                    f,
                    "expected {}, found {} at {}..{}",
                    expected, found_str, self.span.start, self.span.end
                )
            }
            ParseErrorKind::UnexpectedEof { expected } => {
                write!(f, "unexpected end of script, expected {}", expected)
            }
            ParseErrorKind::NestingTooDeep { max } => write!(
                f,
                "blocks nested more than {} levels deep at {}..{}",
                max, self.span.start, self.span.end
            ),
        }
    }
}

impl std::error::Error for ParseError {}

pub type ParseResult<T> = Result<T, ParseError>;

pub struct Parser<'a> {
    tokens: &'a [SpannedToken],
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [SpannedToken]) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    /// Parse a complete script
    pub fn parse(tokens: &'a [SpannedToken]) -> ParseResult<Vec<ScriptNode>> {
        let mut parser = Parser::new(tokens);
        let mut nodes = Vec::new();
        while parser.peek().is_some() {
            nodes.push(parser.parse_node()?);
        }
        Ok(nodes)
    }

    // === Token navigation ===

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|t| &t.token)
    }

    fn advance(&mut self) {
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
    }

    fn check(&self, expected: &Token) -> bool {
        self.peek() == Some(expected)
    }

    fn expect(&mut self, expected: &Token) -> ParseResult<()> {
        if self.check(expected) {
            self.advance();
            Ok(())
        } else {
            Err(ParseError::unexpected_token(
                self.current_span(),
                format_token(expected),
                self.peek().cloned(),
            ))
        }
    }

    fn expect_ident(&mut self) -> ParseResult<String> {
        match self.peek().cloned() {
            Some(Token::Ident(name)) => {
                self.advance();
                Ok(name)
            }
            tok => Err(ParseError::unexpected_token(
                self.current_span(),
                "identifier",
                tok,
            )),
        }
    }

    fn current_span(&self) -> Span {
        self.tokens
            .get(self.pos)
            .map(|t| Span::from(t.span.clone()))
            .unwrap_or_else(|| {
                self.tokens
                    .last()
                    .map(|t| Span::new(t.span.end, t.span.end))
                    .unwrap_or_default()
            })
    }

    /// Run `parse` one nesting level deeper
    fn nested<T>(&mut self, parse: impl FnOnce(&mut Self) -> ParseResult<T>) -> ParseResult<T> {
        if self.depth >= MAX_PARSE_DEPTH {
            return Err(ParseError {
                span: self.current_span(),
                kind: ParseErrorKind::NestingTooDeep {
                    max: MAX_PARSE_DEPTH,
                },
            });
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    // === Grammar ===

    fn parse_node(&mut self) -> ParseResult<ScriptNode> {
        match self.peek().cloned() {
            Some(Token::Comment(text)) => {
                self.advance();
                Ok(ScriptNode::Comment(text))
            }
            Some(Token::If) => self.nested(Self::parse_if),
            Some(Token::While) => self.nested(Self::parse_while),
            Some(Token::Ident(_)) => self.parse_statement(),
            tok => Err(ParseError::unexpected_token(
                self.current_span(),
                "statement",
                tok,
            )),
        }
    }

    /// `name arg* ;`
    fn parse_statement(&mut self) -> ParseResult<ScriptNode> {
        let opcode = self.expect_ident()?;
        let mut arguments = Vec::new();

        loop {
            match self.peek().cloned() {
                Some(Token::Ident(arg)) | Some(Token::Number(arg)) => {
                    self.advance();
                    arguments.push(arg);
                }
                _ => break,
            }
        }
        self.expect(&Token::Semi)?;

        Ok(ScriptNode::Statement(Statement { opcode, arguments }))
    }

    /// `if cond { ... } [else { ... } | else if ...]`
    fn parse_if(&mut self) -> ParseResult<ScriptNode> {
        self.expect(&Token::If)?;
        let condition = self.parse_condition()?;
        let then_branch = self.parse_block()?;

        let else_branch = if self.check(&Token::Else) {
            self.advance();
            if self.check(&Token::If) {
                vec![self.nested(Self::parse_if)?]
            } else {
                self.parse_block()?
            }
        } else {
            Vec::new()
        };

        Ok(ScriptNode::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    fn parse_while(&mut self) -> ParseResult<ScriptNode> {
        self.expect(&Token::While)?;
        let condition = self.parse_condition()?;
        let body = self.parse_block()?;
        Ok(ScriptNode::While { condition, body })
    }

    fn parse_block(&mut self) -> ParseResult<Vec<ScriptNode>> {
        self.expect(&Token::LBrace)?;
        let mut nodes = Vec::new();
        while !self.check(&Token::RBrace) {
            if self.peek().is_none() {
                return Err(ParseError::unexpected_token(
                    self.current_span(),
                    "'}'",
                    None,
                ));
            }
            nodes.push(self.parse_node()?);
        }
        self.expect(&Token::RBrace)?;
        Ok(nodes)
    }

    /// `(flag | word) name comparator [value]`
    fn parse_condition(&mut self) -> ParseResult<Condition> {
        let kind = match self.peek() {
            Some(Token::Flag) => VariableKind::Flag,
            Some(Token::Word) => VariableKind::Word,
            tok => {
                return Err(ParseError::unexpected_token(
                    self.current_span(),
                    "'flag' or 'word'",
                    tok.cloned(),
                ));
            }
        };
        self.advance();

        let variable = self.expect_ident()?;

        let comparator = match self.peek() {
            Some(Token::Set) => Comparator::Set,
            Some(Token::Clear) => Comparator::Clear,
            Some(Token::EqEq) => Comparator::Equal,
            Some(Token::Ne) => Comparator::NotEqual,
            Some(Token::Lt) => Comparator::LessThan,
            Some(Token::Ge) => Comparator::GreaterOrEqual,
            tok => {
                return Err(ParseError::unexpected_token(
                    self.current_span(),
                    "comparator",
                    tok.cloned(),
                ));
            }
        };
        self.advance();

        let value = match comparator {
            Comparator::Set | Comparator::Clear => None,
            _ => match self.peek().cloned() {
                Some(Token::Number(n)) => {
                    self.advance();
                    Some(n)
                }
                tok => {
                    return Err(ParseError::unexpected_token(
                        self.current_span(),
                        "number",
                        tok,
                    ));
                }
            },
        };

        Ok(Condition {
            kind,
            variable,
            comparator,
            value,
        })
    }
}
