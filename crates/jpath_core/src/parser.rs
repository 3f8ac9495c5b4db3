//! Parser for JSONPath queries
//!
//! A recursive descent parser over the token list produced by the lexer.
//! Function calls are resolved against a [`Registry`] and type checked as
//! soon as their argument list is complete, so a successfully parsed
//! [`Query`] never fails during evaluation.

use crate::Error;
use crate::ast::{
    BasicExpr, CompOp, Comparable, Comparison, FuncArg, FunctionCall, LogicalAnd, LogicalOr, Query,
    Segment, Selector, Slice,
};
use crate::lexer::{Lexer, Token, TokenKind};
use crate::registry::{Registry, default_registry};
use crate::types::{FuncType, PathType};
use serde_json::Value;
use std::str::FromStr;
use tracing::debug;

/// Largest magnitude of an index or slice bound (I-JSON exact integers)
const MAX_INDEX: i64 = (1 << 53) - 1;

/// Deepest nesting of filters, parentheses and function calls
const MAX_DEPTH: usize = 128;

/// Parser for JSONPath queries
pub struct Parser<'r> {
    registry: &'r Registry,
    tokens: Vec<Token>,
    index: usize,
    depth: usize,
    eof: Token,
}

fn parse_error(message: impl Into<String>, position: usize) -> Error {
    Error::Parse {
        message: message.into(),
        position,
    }
}

impl Query {
    /// Parse a query using the standard function extensions
    pub fn parse(input: &str) -> Result<Query, Error> {
        Parser::new(default_registry()).parse(input)
    }
}

impl FromStr for Query {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Query::parse(s)
    }
}

impl<'r> Parser<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self {
            registry,
            tokens: Vec::new(),
            index: 0,
            depth: 0,
            eof: Token {
                kind: TokenKind::Eof,
                text: String::new(),
                position: 0,
            },
        }
    }

    /// Parse a complete query starting with `$`
    pub fn parse(&mut self, input: &str) -> Result<Query, Error> {
        self.tokens = Lexer::new(input).tokenize();
        self.index = 0;
        self.depth = 0;
        self.eof.position = input.chars().count();

        let query = self.parse_query()?;
        debug!(%query, "parsed query");
        Ok(query)
    }

    fn parse_query(&mut self) -> Result<Query, Error> {
        if self.kind() != TokenKind::Root {
            return Err(self.unexpected("'$'"));
        }
        self.advance();
        let segments = self.parse_segments()?;
        if self.kind() != TokenKind::Eof {
            return Err(self.unexpected("end of query"));
        }
        Ok(Query::new(segments, true))
    }

    // ========== Token access ==========

    fn current(&self) -> &Token {
        self.tokens.get(self.index).unwrap_or(&self.eof)
    }

    fn kind(&self) -> TokenKind {
        self.current().kind
    }

    fn position(&self) -> usize {
        self.current().position
    }

    fn advance(&mut self) {
        if !matches!(self.kind(), TokenKind::Eof | TokenKind::Invalid) {
            self.index += 1;
        }
    }

    fn skip_blank(&mut self) {
        while self.kind() == TokenKind::Blank {
            self.advance();
        }
    }

    /// Kind of the next token that is not blank space, without consuming anything
    fn peek_past_blank(&self) -> (TokenKind, usize) {
        let mut i = self.index;
        while self.tokens.get(i).is_some_and(|t| t.kind == TokenKind::Blank) {
            i += 1;
        }
        (self.tokens.get(i).map_or(TokenKind::Eof, |t| t.kind), i)
    }

    /// Comparison operator after optional blank space, and the index just past it
    fn peek_comparison(&self) -> Option<(CompOp, usize)> {
        let (kind, i) = self.peek_past_blank();
        let op = match kind {
            TokenKind::Equal => CompOp::Eq,
            TokenKind::NotEqual => CompOp::Ne,
            TokenKind::LessThan => CompOp::Lt,
            TokenKind::GreaterThan => CompOp::Gt,
            TokenKind::LessEq => CompOp::Le,
            TokenKind::GreaterEq => CompOp::Ge,
            _ => return None,
        };
        Some((op, i + 1))
    }

    fn expect(&mut self, kind: TokenKind, expected: &str) -> Result<(), Error> {
        if self.kind() != kind {
            return Err(self.unexpected(expected));
        }
        self.advance();
        Ok(())
    }

    /// Run `parse` one nesting level deeper, failing past `MAX_DEPTH`
    fn nested<T>(&mut self, parse: impl FnOnce(&mut Self) -> Result<T, Error>) -> Result<T, Error> {
        if self.depth >= MAX_DEPTH {
            return Err(parse_error("query nested too deeply", self.position()));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    /// Error for the current token; lexer errors are reported as they are
    fn unexpected(&self, expected: &str) -> Error {
        let token = self.current();
        let found = match token.kind {
            TokenKind::Invalid => return parse_error(token.text.clone(), token.position),
            TokenKind::Eof => "end of input".to_string(),
            TokenKind::Blank => "blank space".to_string(),
            TokenKind::String => format!("string {:?}", token.text),
            TokenKind::Ident => format!("identifier '{}'", token.text),
            _ => format!("'{}'", token.text),
        };
        parse_error(format!("unexpected {found}, expected {expected}"), token.position)
    }

    // ========== Segments and selectors ==========

    /// Zero or more segments, each optionally preceded by blank space
    fn parse_segments(&mut self) -> Result<Vec<Segment>, Error> {
        let mut segments = Vec::new();
        loop {
            let mark = self.index;
            self.skip_blank();
            let segment = match self.kind() {
                TokenKind::Dot => {
                    self.advance();
                    Segment::child(self.parse_dot_member()?)
                }
                TokenKind::DotDot => {
                    self.advance();
                    if self.kind() == TokenKind::BracketOpen {
                        Segment::descendant(self.parse_bracketed()?)
                    } else {
                        Segment::descendant(self.parse_dot_member()?)
                    }
                }
                TokenKind::BracketOpen => Segment::child(self.parse_bracketed()?),
                _ => {
                    self.index = mark;
                    return Ok(segments);
                }
            };
            segments.push(segment);
        }
    }

    /// `name` or `*` after `.` or `..`
    fn parse_dot_member(&mut self) -> Result<Vec<Selector>, Error> {
        let selector = match self.kind() {
            TokenKind::Wildcard => Selector::Wildcard,
            TokenKind::Ident | TokenKind::True | TokenKind::False | TokenKind::Null => {
                Selector::Name(self.current().text.clone())
            }
            _ => return Err(self.unexpected("member name or '*'")),
        };
        self.advance();
        Ok(vec![selector])
    }

    fn parse_bracketed(&mut self) -> Result<Vec<Selector>, Error> {
        self.expect(TokenKind::BracketOpen, "'['")?;
        let mut selectors = Vec::new();
        loop {
            self.skip_blank();
            selectors.push(self.parse_selector()?);
            self.skip_blank();
            match self.kind() {
                TokenKind::Comma => self.advance(),
                TokenKind::BracketClose => {
                    self.advance();
                    return Ok(selectors);
                }
                _ => return Err(self.unexpected("',' or ']'")),
            }
        }
    }

    fn parse_selector(&mut self) -> Result<Selector, Error> {
        match self.kind() {
            TokenKind::String => {
                let name = self.current().text.clone();
                self.advance();
                Ok(Selector::Name(name))
            }
            TokenKind::Wildcard => {
                self.advance();
                Ok(Selector::Wildcard)
            }
            TokenKind::Question => {
                self.advance();
                self.skip_blank();
                Ok(Selector::Filter(self.nested(Self::parse_logical_or)?))
            }
            TokenKind::Int | TokenKind::Number | TokenKind::Colon => self.parse_index_or_slice(),
            _ => Err(self.unexpected("selector")),
        }
    }

    /// `i`, or `[start]:[end][:[step]]`
    fn parse_index_or_slice(&mut self) -> Result<Selector, Error> {
        let start = self.parse_slice_int()?;
        self.skip_blank();
        if self.kind() != TokenKind::Colon {
            return match start {
                Some(index) => Ok(Selector::Index(index)),
                None => Err(self.unexpected("index or slice")),
            };
        }
        self.advance();
        self.skip_blank();
        let end = self.parse_slice_int()?;
        self.skip_blank();

        let mut step = None;
        if self.kind() == TokenKind::Colon {
            self.advance();
            self.skip_blank();
            step = self.parse_slice_int()?;
        }
        Ok(Selector::Slice(Slice { start, end, step }))
    }

    /// An integer if one is next; fractions, `-0` and out-of-range values are errors
    fn parse_slice_int(&mut self) -> Result<Option<i64>, Error> {
        let token = self.current();
        match token.kind {
            TokenKind::Int => {}
            TokenKind::Number if token.text == "-0" => {
                return Err(parse_error("negative zero is not a valid index", token.position));
            }
            TokenKind::Number => {
                return Err(parse_error(
                    format!("index must be an integer, found {}", token.text),
                    token.position,
                ));
            }
            _ => return Ok(None),
        }
        let value = token
            .text
            .parse::<i64>()
            .ok()
            .filter(|v| (-MAX_INDEX..=MAX_INDEX).contains(v))
            .ok_or_else(|| parse_error(format!("index {} out of range", token.text), token.position))?;
        self.advance();
        Ok(Some(value))
    }

    // ========== Filter expressions ==========

    fn parse_logical_or(&mut self) -> Result<LogicalOr, Error> {
        let first = self.parse_basic()?;
        self.finish_logical(first)
    }

    /// Continue an expression whose first operand is already parsed
    fn finish_logical(&mut self, first: BasicExpr) -> Result<LogicalOr, Error> {
        let mut ors = Vec::new();
        let mut ands = vec![first];
        loop {
            let (kind, next) = self.peek_past_blank();
            if !matches!(kind, TokenKind::And | TokenKind::Or) {
                break;
            }
            self.index = next;
            self.advance();
            self.skip_blank();
            if kind == TokenKind::Or {
                ors.push(LogicalAnd(std::mem::take(&mut ands)));
            }
            ands.push(self.parse_basic()?);
        }
        ors.push(LogicalAnd(ands));
        Ok(LogicalOr(ors))
    }

    fn parse_basic(&mut self) -> Result<BasicExpr, Error> {
        match self.kind() {
            TokenKind::Not => {
                self.advance();
                self.skip_blank();
                match self.kind() {
                    TokenKind::ParenOpen => Ok(BasicExpr::NotParen(self.parse_paren()?)),
                    TokenKind::Current | TokenKind::Root => {
                        Ok(BasicExpr::NotExists(self.parse_filter_query()?))
                    }
                    TokenKind::Ident => {
                        let position = self.position();
                        let call = self.parse_function_call()?;
                        check_test_function(&call, position)?;
                        Ok(BasicExpr::NotFunction(call))
                    }
                    _ => Err(self.unexpected("'(', query or function after '!'")),
                }
            }
            TokenKind::ParenOpen => Ok(BasicExpr::Paren(self.parse_paren()?)),
            _ => {
                let position = self.position();
                let operand = self.parse_operand()?;
                self.finish_operand(operand, position)
            }
        }
    }

    /// A comparison if an operator follows `left`, otherwise a test of `left`
    fn finish_operand(&mut self, left: Comparable, position: usize) -> Result<BasicExpr, Error> {
        let Some((op, next)) = self.peek_comparison() else {
            return match left {
                Comparable::Literal(value) => Ok(BasicExpr::Literal(value)),
                Comparable::Query(query) => Ok(BasicExpr::Exists(query)),
                Comparable::Function(call) => {
                    check_test_function(&call, position)?;
                    Ok(BasicExpr::Function(call))
                }
            };
        };
        check_comparable(&left, position)?;
        self.index = next;
        self.skip_blank();

        let right_position = self.position();
        let right = self.parse_operand()?;
        check_comparable(&right, right_position)?;
        Ok(BasicExpr::Comparison(Comparison { left, op, right }))
    }

    fn parse_paren(&mut self) -> Result<LogicalOr, Error> {
        self.nested(|p| {
            p.expect(TokenKind::ParenOpen, "'('")?;
            p.skip_blank();
            let expr = p.parse_logical_or()?;
            p.skip_blank();
            p.expect(TokenKind::ParenClose, "')'")?;
            Ok(expr)
        })
    }

    /// A literal, a `@`/`$` query, or a function call
    fn parse_operand(&mut self) -> Result<Comparable, Error> {
        let literal = match self.kind() {
            TokenKind::Current | TokenKind::Root => {
                return Ok(Comparable::Query(self.parse_filter_query()?));
            }
            TokenKind::Ident => return Ok(Comparable::Function(self.parse_function_call()?)),
            TokenKind::String => Value::String(self.current().text.clone()),
            TokenKind::Int | TokenKind::Number => {
                let token = self.current();
                serde_json::from_str(&token.text).map_err(|e| {
                    parse_error(format!("invalid number {}: {e}", token.text), token.position)
                })?
            }
            TokenKind::True => Value::Bool(true),
            TokenKind::False => Value::Bool(false),
            TokenKind::Null => Value::Null,
            _ => return Err(self.unexpected("literal, query or function")),
        };
        self.advance();
        Ok(Comparable::Literal(literal))
    }

    fn parse_filter_query(&mut self) -> Result<Query, Error> {
        let root = self.kind() == TokenKind::Root;
        self.advance();
        let segments = self.parse_segments()?;
        Ok(Query::new(segments, root))
    }

    fn parse_function_call(&mut self) -> Result<FunctionCall, Error> {
        let position = self.position();
        let name = self.current().text.clone();
        self.advance();
        if self.kind() != TokenKind::ParenOpen {
            return Err(self.unexpected("'(' after function name"));
        }
        let function = self
            .registry
            .get(&name)
            .ok_or_else(|| parse_error(format!("unknown function {name}()"), position))?;
        self.advance();
        self.skip_blank();

        let args = self.nested(Self::parse_function_args)?;
        self.advance();

        let types: Vec<FuncType> = args.iter().map(FuncArg::arg_type).collect();
        function
            .validate(&types)
            .map_err(|message| parse_error(format!("function {name}(): {message}"), position))?;
        Ok(FunctionCall { function, args })
    }

    /// Comma separated arguments, stopping at the closing `)`
    fn parse_function_args(&mut self) -> Result<Vec<FuncArg>, Error> {
        let mut args = Vec::new();
        if self.kind() == TokenKind::ParenClose {
            return Ok(args);
        }
        loop {
            args.push(self.parse_function_arg()?);
            self.skip_blank();
            match self.kind() {
                TokenKind::Comma => {
                    self.advance();
                    self.skip_blank();
                }
                TokenKind::ParenClose => return Ok(args),
                _ => return Err(self.unexpected("',' or ')'")),
            }
        }
    }

    /// A literal, query or function, or a logical expression built from them
    fn parse_function_arg(&mut self) -> Result<FuncArg, Error> {
        if matches!(self.kind(), TokenKind::ParenOpen | TokenKind::Not) {
            return Ok(FuncArg::Logical(self.parse_logical_or()?));
        }
        let position = self.position();
        let operand = self.parse_operand()?;
        let (next, _) = self.peek_past_blank();
        if self.peek_comparison().is_none() && !matches!(next, TokenKind::And | TokenKind::Or) {
            return Ok(match operand {
                Comparable::Literal(value) => FuncArg::Literal(value),
                Comparable::Query(query) => FuncArg::Query(query),
                Comparable::Function(call) => FuncArg::Function(call),
            });
        }
        let first = self.finish_operand(operand, position)?;
        Ok(FuncArg::Logical(self.finish_logical(first)?))
    }
}

/// Function results used directly as a test must be logical or a node list
fn check_test_function(call: &FunctionCall, position: usize) -> Result<(), Error> {
    if call.result_type() == PathType::Value {
        return Err(parse_error(
            format!("missing comparison to function result of {}()", call.name()),
            position,
        ));
    }
    Ok(())
}

fn check_comparable(operand: &Comparable, position: usize) -> Result<(), Error> {
    match operand {
        Comparable::Query(query) if !query.is_singular() => Err(parse_error(
            "non-singular query not allowed in comparison",
            position,
        )),
        Comparable::Function(call) => match call.result_type() {
            PathType::Value => Ok(()),
            PathType::Logical => Err(parse_error(
                format!("cannot compare result of logical function {}()", call.name()),
                position,
            )),
            PathType::Nodes => Err(parse_error(
                format!("cannot compare result of nodes function {}()", call.name()),
                position,
            )),
        },
        _ => Ok(()),
    }
}
