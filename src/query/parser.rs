/*!
# Query Parser

Recursive descent parser converting JSONPath query text into [`Query`]
objects.

## Examples

This module exposes the public API method [`parse_query`] that can be used to
convert raw JSONPath query strings into [`Query`] objects.

For example, we can construct the associated [`Query`] for the query string
`$.store.book[0].title` as so:

```rust
use jpq::query::{Query, parser};
let parsed: Query = parser::parse_query("$.store.book[0].title")
    .expect("Invalid query string");
assert_eq!("$.store.book[0].title", parsed.to_string());
```

## Errors

If the input query string is invalid, [`parse_query`] returns a [`ParseError`]
describing how the parsing failed:

```rust
use jpq::query::parser::{self, ParseErrorKind};

let result = parser::parse_query("$[notanindex]");
assert!(matches!(result, Err(e) if e.kind == ParseErrorKind::UnexpectedToken));
```

```rust
use jpq::query::parser::{self, ParseErrorKind};

let result = parser::parse_query("$.foo[");
assert!(matches!(
    result,
    Err(e) if e.kind == ParseErrorKind::UnexpectedEndOfInput
));
```

## See Also

- [`Query`]: The struct representing the query AST.
- [`ParseError`]: The error type for failed query parses.
*/

use std::error::Error;
use std::fmt;

use crate::query::ast::{
    BinaryOperator, DescendantTarget, Expression, Query, QueryKind, Segment,
    Selector, Slice,
};
use crate::tokenizer::{Lexer, Token, TokenKind, unescape_string_literal};

/// Largest magnitude of an index or slice bound, per the I-JSON number range.
pub const MAX_SAFE_INTEGER: i64 = (1 << 53) - 1;

/// Classification of a parse failure.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ParseErrorKind {
    /// A token that does not fit the grammar at this position.
    UnexpectedToken,
    /// The input ended unexpectedly, indicating an incomplete query.
    UnexpectedEndOfInput,
    /// A number literal out of range or otherwise unrepresentable.
    InvalidLiteral,
    /// A query that can select more than one node used as a comparison
    /// operand.
    NonSingularComparison,
    /// The query does not start with the root identifier `$`.
    NoRoot,
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedToken => write!(f, "Unexpected token"),
            Self::UnexpectedEndOfInput => write!(f, "Unexpected end of input"),
            Self::InvalidLiteral => write!(f, "Invalid literal"),
            Self::NonSingularComparison => {
                write!(f, "Non-singular query used in comparison")
            }
            Self::NoRoot => write!(f, "Query must start with `$`"),
        }
    }
}

/// Represents errors that can occur while parsing a JSONPath query.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ParseError {
    /// What went wrong
    pub kind: ParseErrorKind,
    /// Text of the offending token
    pub token: String,
    /// 0-based index of the offending token in the token stream
    pub position: usize,
}

impl Error for ParseError {}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.token.is_empty() {
            write!(f, "{} at token {}", self.kind, self.position)
        } else {
            write!(
                f,
                "{} at token {}: {:?}",
                self.kind, self.position, self.token
            )
        }
    }
}

type Result<T> = std::result::Result<T, ParseError>;

/// Parser state: the token just consumed and one token of lookahead.
struct Parser<'a> {
    lexer: Lexer<'a>,
    /// Most recently consumed token
    current: Token,
    /// Next token, not yet consumed
    peek: Token,
    /// Index of `peek` in the token stream
    position: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a [u8]) -> Self {
        let lexer = Lexer::new(input);
        let peek = lexer.look_ahead().clone();
        Self { lexer, current: Token::end_of_file(), peek, position: 0 }
    }

    /// Consumes `peek`, making it the current token.
    fn advance(&mut self) -> &Token {
        self.current = self.lexer.next_token();
        self.peek = self.lexer.look_ahead().clone();
        self.position += 1;
        &self.current
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.peek.kind == kind
    }

    /// Consumes `peek` if it is of the given kind.
    fn skip(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<()> {
        if self.skip(kind) { Ok(()) } else { Err(self.unexpected()) }
    }

    fn error(&self, kind: ParseErrorKind) -> ParseError {
        ParseError {
            kind,
            token: self.peek.text.clone(),
            position: self.position,
        }
    }

    /// Error describing `peek` as out of place.
    fn unexpected(&self) -> ParseError {
        if self.at(TokenKind::EndOfFile) {
            self.error(ParseErrorKind::UnexpectedEndOfInput)
        } else {
            self.error(ParseErrorKind::UnexpectedToken)
        }
    }

    fn parse_query(&mut self) -> Result<Query> {
        self.skip(TokenKind::ByteOrderMark);
        if !self.skip(TokenKind::DollarMark) {
            return Err(self.error(ParseErrorKind::NoRoot));
        }
        let segments = self.segments()?;
        self.expect(TokenKind::EndOfFile)?;
        Ok(Query::new(segments))
    }

    fn segments(&mut self) -> Result<Vec<Segment>> {
        let mut segments = vec![];
        loop {
            let segment = match self.peek.kind {
                TokenKind::OpenBracket => {
                    Segment::Bracketed(self.bracketed_selection()?)
                }
                TokenKind::Dot => {
                    self.advance();
                    Segment::Child(self.dot_selector()?)
                }
                TokenKind::DotDot => {
                    self.advance();
                    Segment::Descendant(self.descendant_target()?)
                }
                _ => return Ok(segments),
            };
            segments.push(segment);
        }
    }

    /// Wildcard or member name shorthand after `.` or `..`
    fn dot_selector(&mut self) -> Result<Selector> {
        match self.peek.kind {
            TokenKind::Asterisk => {
                self.advance();
                Ok(Selector::Wildcard)
            }
            TokenKind::MemberName => {
                let name = self.advance().text.clone();
                Ok(Selector::MemberNameShorthand(name))
            }
            _ => Err(self.unexpected()),
        }
    }

    fn descendant_target(&mut self) -> Result<DescendantTarget> {
        if self.at(TokenKind::OpenBracket) {
            return Ok(DescendantTarget::Bracketed(self.bracketed_selection()?));
        }
        Ok(DescendantTarget::Selector(self.dot_selector()?))
    }

    fn bracketed_selection(&mut self) -> Result<Vec<Selector>> {
        self.expect(TokenKind::OpenBracket)?;
        let mut selectors = vec![self.selector()?];
        while self.skip(TokenKind::Comma) {
            selectors.push(self.selector()?);
        }
        self.expect(TokenKind::CloseBracket)?;
        Ok(selectors)
    }

    fn selector(&mut self) -> Result<Selector> {
        match self.peek.kind {
            TokenKind::StringLiteral => {
                let text = &self.advance().text;
                Ok(Selector::Name(unescape_string_literal(text)))
            }
            TokenKind::Asterisk => {
                self.advance();
                Ok(Selector::Wildcard)
            }
            TokenKind::IntegerNumberLiteral | TokenKind::Colon => {
                self.slice_or_index()
            }
            TokenKind::QuestionMark => {
                self.advance();
                Ok(Selector::Filter(self.logical_or()?))
            }
            _ => Err(self.unexpected()),
        }
    }

    /// `int` or `[start] ":" [end] [":" [step]]`
    fn slice_or_index(&mut self) -> Result<Selector> {
        let start = self.optional_index()?;
        if !self.skip(TokenKind::Colon) {
            return match start {
                Some(index) => Ok(Selector::Index(index)),
                None => Err(self.unexpected()),
            };
        }
        let end = self.optional_index()?;
        let step = if self.skip(TokenKind::Colon) {
            self.optional_index()?
        } else {
            None
        };
        Ok(Selector::Slice(Slice { start, end, step }))
    }

    fn optional_index(&mut self) -> Result<Option<i64>> {
        if !self.at(TokenKind::IntegerNumberLiteral) {
            return Ok(None);
        }
        let error = self.error(ParseErrorKind::InvalidLiteral);
        match self.advance().text.parse::<i64>() {
            Ok(value)
                if (-MAX_SAFE_INTEGER..=MAX_SAFE_INTEGER).contains(&value) =>
            {
                Ok(Some(value))
            }
            _ => Err(error),
        }
    }

    // logical-or-expr = logical-and-expr *("||" logical-and-expr)
    fn logical_or(&mut self) -> Result<Expression> {
        let mut left = self.logical_and()?;
        while self.skip(TokenKind::BarBar) {
            let right = self.logical_and()?;
            left = Expression::binary(left, BinaryOperator::Or, right);
        }
        Ok(left)
    }

    // logical-and-expr = basic-expr *("&&" basic-expr)
    fn logical_and(&mut self) -> Result<Expression> {
        let mut left = self.basic_expression()?;
        while self.skip(TokenKind::AmpersandAmpersand) {
            let right = self.basic_expression()?;
            left = Expression::binary(left, BinaryOperator::And, right);
        }
        Ok(left)
    }

    /// Parenthesized expression, logical not, test expression or comparison.
    fn basic_expression(&mut self) -> Result<Expression> {
        let left = match self.peek.kind {
            TokenKind::Exclamation => return self.logical_not(),
            TokenKind::OpenParen => return self.parenthesized(),
            TokenKind::MemberName if !self.at_keyword() => {
                self.function_call()?
            }
            TokenKind::DollarMark | TokenKind::At => {
                let kind = self.query_kind();
                let segments = self.segments()?;
                if !self.peek.kind.is_comparison() {
                    return Ok(Expression::FilterQuery { kind, segments });
                }
                self.singular_query(kind, segments)?
            }
            _ => {
                // A literal is only meaningful as a comparison operand
                let literal = self.literal()?;
                if !self.peek.kind.is_comparison() {
                    return Err(self.unexpected());
                }
                literal
            }
        };
        self.comparison(left)
    }

    /// Completes `left op comparable` when a comparison operator follows.
    fn comparison(&mut self, left: Expression) -> Result<Expression> {
        let Some(operator) = comparison_operator(self.peek.kind) else {
            return Ok(left);
        };
        self.advance();
        let right = self.comparable()?;
        Ok(Expression::binary(left, operator, right))
    }

    /// Literal, function call or singular query.
    fn comparable(&mut self) -> Result<Expression> {
        match self.peek.kind {
            TokenKind::MemberName if !self.at_keyword() => self.function_call(),
            TokenKind::DollarMark | TokenKind::At => {
                let kind = self.query_kind();
                let segments = self.segments()?;
                self.singular_query(kind, segments)
            }
            _ => self.literal(),
        }
    }

    fn singular_query(
        &self,
        kind: QueryKind,
        segments: Vec<Segment>,
    ) -> Result<Expression> {
        if segments.iter().all(Segment::is_singular) {
            Ok(Expression::SingularQuery { kind, segments })
        } else {
            Err(ParseError {
                kind: ParseErrorKind::NonSingularComparison,
                token: self.current.text.clone(),
                position: self.position.saturating_sub(1),
            })
        }
    }

    /// Consumes `$` or `@`.
    fn query_kind(&mut self) -> QueryKind {
        if self.advance().kind == TokenKind::DollarMark {
            QueryKind::Root
        } else {
            QueryKind::Current
        }
    }

    fn logical_not(&mut self) -> Result<Expression> {
        self.expect(TokenKind::Exclamation)?;
        let inner = match self.peek.kind {
            TokenKind::OpenParen => self.parenthesized()?,
            TokenKind::MemberName if !self.at_keyword() => {
                self.function_call()?
            }
            TokenKind::DollarMark | TokenKind::At => {
                let kind = self.query_kind();
                Expression::FilterQuery { kind, segments: self.segments()? }
            }
            _ => return Err(self.unexpected()),
        };
        Ok(Expression::LogicalNot(Box::new(inner)))
    }

    fn parenthesized(&mut self) -> Result<Expression> {
        self.expect(TokenKind::OpenParen)?;
        let inner = self.logical_or()?;
        self.expect(TokenKind::CloseParen)?;
        Ok(Expression::Parenthesized(Box::new(inner)))
    }

    fn function_call(&mut self) -> Result<Expression> {
        self.expect(TokenKind::MemberName)?;
        let name = self.current.text.clone();
        self.expect(TokenKind::OpenParen)?;
        let mut arguments = vec![];
        if !self.at(TokenKind::CloseParen) {
            arguments.push(self.argument()?);
            while self.skip(TokenKind::Comma) {
                arguments.push(self.argument()?);
            }
        }
        self.expect(TokenKind::CloseParen)?;
        Ok(Expression::FunctionCall { name, arguments })
    }

    /// A literal, optionally compared with a comparable, or any logical
    /// expression.
    fn argument(&mut self) -> Result<Expression> {
        if self.at_literal() {
            let literal = self.literal()?;
            return self.comparison(literal);
        }
        self.logical_or()
    }

    fn at_keyword(&self) -> bool {
        self.at(TokenKind::MemberName)
            && matches!(self.peek.text.as_str(), "true" | "false" | "null")
    }

    fn at_literal(&self) -> bool {
        matches!(
            self.peek.kind,
            TokenKind::IntegerNumberLiteral
                | TokenKind::FloatNumberLiteral
                | TokenKind::StringLiteral
        ) || self.at_keyword()
    }

    fn literal(&mut self) -> Result<Expression> {
        if !self.at_literal() {
            return Err(self.unexpected());
        }
        let error = self.error(ParseErrorKind::InvalidLiteral);
        let token = self.advance();
        match token.kind {
            TokenKind::IntegerNumberLiteral => {
                token.text.parse().map(Expression::Integer).map_err(|_| error)
            }
            TokenKind::FloatNumberLiteral => match token.text.parse::<f64>() {
                Ok(value) if value.is_finite() => Ok(Expression::Float(value)),
                _ => Err(error),
            },
            TokenKind::StringLiteral => {
                Ok(Expression::String(unescape_string_literal(&token.text)))
            }
            _ => match token.text.as_str() {
                "true" => Ok(Expression::Boolean(true)),
                "false" => Ok(Expression::Boolean(false)),
                _ => Ok(Expression::Null),
            },
        }
    }
}

const fn comparison_operator(kind: TokenKind) -> Option<BinaryOperator> {
    match kind {
        TokenKind::EqualsEquals => Some(BinaryOperator::Eq),
        TokenKind::ExclamationEquals => Some(BinaryOperator::Ne),
        TokenKind::Less => Some(BinaryOperator::Lt),
        TokenKind::LessEquals => Some(BinaryOperator::Le),
        TokenKind::Greater => Some(BinaryOperator::Gt),
        TokenKind::GreaterEquals => Some(BinaryOperator::Ge),
        _ => None,
    }
}

/// Parses a JSONPath query from its text.
///
/// # Errors
///
/// Returns a [`ParseError`] at the first token that does not fit the
/// grammar.
pub fn parse_query(input: &str) -> Result<Query> {
    parse_query_utf8(input.as_bytes())
}

/// Parses a JSONPath query from UTF-8 encoded bytes. A leading byte order
/// mark is accepted.
///
/// # Errors
///
/// Returns a [`ParseError`] at the first token that does not fit the
/// grammar; invalid UTF-8 surfaces as an unexpected token.
pub fn parse_query_utf8(input: &[u8]) -> Result<Query> {
    Parser::new(input).parse_query().inspect_err(|error| {
        log::debug!("failed to parse query: {error}");
    })
}
