/*!
# Query AST and Builder

Defines the AST of RFC 9535 JSONPath queries, renders it back into canonical
query text, and exposes a fluent API for constructing queries using a builder
pattern.

# Examples

This module provides a fluent API for constructing queries using the
`QueryBuilder`.

For example, to construct a query that accesses a member named "foo", you can
use:
```
use jpq::query::{Query, QueryBuilder, Segment, Selector};
let query = QueryBuilder::new().name("foo").build();
assert_eq!(
    query,
    Query::new(vec![Segment::Child(Selector::MemberNameShorthand(
        "foo".into()
    ))])
);
```

In addition, the query can be constructed from a raw string:

```
use jpq::query::{Query, QueryBuilder};
let query: Query = "$.foo".parse().expect("Invalid query");
assert_eq!(query, QueryBuilder::new().name("foo").build());
```
*/
use std::{
    cmp::PartialEq,
    fmt::{self, Display},
    str::FromStr,
};

use super::{ParseError, parse_query};

/// A parsed JSONPath query: the root identifier `$` followed by an ordered
/// list of segments.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct Query {
    /// The segments applied in order, starting from the root node
    pub segments: Vec<Segment>,
}

/// One `.`, `[...]` or `..` step of a query.
#[derive(Debug, PartialEq, Clone)]
pub enum Segment {
    /// Dot notation child segment, e.g. `.foo` or `.*`
    Child(Selector),
    /// Bracketed selection, e.g. `['a', 0, 1:3]`
    Bracketed(Vec<Selector>),
    /// Descendant segment, e.g. `..foo`, `..*` or `..[0]`
    Descendant(DescendantTarget),
}

/// What a descendant segment applies at every visited node.
#[derive(Debug, PartialEq, Clone)]
pub enum DescendantTarget {
    /// A member name shorthand or a wildcard
    Selector(Selector),
    /// A bracketed selection
    Bracketed(Vec<Selector>),
}

impl DescendantTarget {
    /// Returns the selectors to apply at each visited node.
    #[must_use]
    pub fn selectors(&self) -> &[Selector] {
        match self {
            Self::Selector(selector) => std::slice::from_ref(selector),
            Self::Bracketed(selectors) => selectors,
        }
    }
}

/// A single match rule.
#[derive(Debug, PartialEq, Clone)]
pub enum Selector {
    /// Quoted name selector, e.g. `['foo']`
    Name(String),
    /// Unquoted member name after a dot, e.g. `.foo`
    MemberNameShorthand(String),
    /// Wildcard `*`
    Wildcard,
    /// Array index, negative values count from the end
    Index(i64),
    /// Array slice `start:end:step`
    Slice(Slice),
    /// Filter `?<logical-expr>`
    Filter(Expression),
}

/// Bounds of an array slice selector. Each bound is optional.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub struct Slice {
    /// First index (inclusive)
    pub start: Option<i64>,
    /// Last index (exclusive)
    pub end: Option<i64>,
    /// Distance between selected indices, defaults to 1
    pub step: Option<i64>,
}

/// Whether an embedded query starts at the root or at the current node.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum QueryKind {
    /// `$`
    Root,
    /// `@`
    Current,
}

/// Binary operators of the filter expression language.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum BinaryOperator {
    /// `&&`
    And,
    /// `||`
    Or,
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
}

impl Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            Self::And => "&&",
            Self::Or => "||",
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        };
        write!(f, "{symbol}")
    }
}

/// Filter expressions.
#[derive(Debug, PartialEq, Clone)]
pub enum Expression {
    /// Integer literal
    Integer(i64),
    /// Number literal with a fraction or exponent
    Float(f64),
    /// String literal, escapes already decoded
    String(String),
    /// `true` or `false`
    Boolean(bool),
    /// `null`
    Null,
    /// Logical connective or comparison
    Binary {
        /// Left operand
        left: Box<Self>,
        /// The operator
        operator: BinaryOperator,
        /// Right operand
        right: Box<Self>,
    },
    /// `!expr`
    LogicalNot(Box<Self>),
    /// `(expr)`
    Parenthesized(Box<Self>),
    /// Function extension call, e.g. `length(@.name)`
    FunctionCall {
        /// The function name
        name: String,
        /// Arguments in call order
        arguments: Vec<Self>,
    },
    /// Query addressing at most one node, used as a comparison operand.
    /// Contains only name and index segments.
    SingularQuery {
        /// Root or current node
        kind: QueryKind,
        /// Name and index segments
        segments: Vec<Segment>,
    },
    /// General embedded query producing a node list
    FilterQuery {
        /// Root or current node
        kind: QueryKind,
        /// Arbitrary segments
        segments: Vec<Segment>,
    },
}

impl Expression {
    /// Helper for ergonomic construction of binary expressions
    #[must_use]
    pub fn binary(left: Self, operator: BinaryOperator, right: Self) -> Self {
        Self::Binary { left: Box::new(left), operator, right: Box::new(right) }
    }

    /// Helper for ergonomic construction of `@`-relative singular queries
    #[must_use]
    pub fn current(segments: Vec<Segment>) -> Self {
        Self::SingularQuery { kind: QueryKind::Current, segments }
    }
}

impl Segment {
    /// Returns whether the segment selects at most one node: a single name
    /// or index selector, in dot or bracket notation.
    #[must_use]
    pub fn is_singular(&self) -> bool {
        match self {
            Self::Child(selector) => {
                matches!(selector, Selector::MemberNameShorthand(_))
            }
            Self::Bracketed(selectors) => matches!(
                selectors.as_slice(),
                [Selector::Name(_) | Selector::Index(_)]
            ),
            Self::Descendant(_) => false,
        }
    }
}

impl Query {
    /// Creates a query from its segments.
    #[must_use]
    pub const fn new(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    /// Returns whether the query can address at most one node.
    #[must_use]
    pub fn is_singular(&self) -> bool {
        self.segments.iter().all(Segment::is_singular)
    }

    /// Calculate the depth of the query, counting nested filter queries.
    #[must_use]
    pub fn depth(&self) -> usize {
        segments_depth(&self.segments)
    }
}

fn segments_depth(segments: &[Segment]) -> usize {
    segments
        .iter()
        .map(|segment| match segment {
            Segment::Child(selector) => selector_depth(selector),
            Segment::Bracketed(selectors)
            | Segment::Descendant(DescendantTarget::Bracketed(selectors)) => {
                selectors.iter().map(selector_depth).max().unwrap_or(1)
            }
            Segment::Descendant(DescendantTarget::Selector(selector)) => {
                selector_depth(selector)
            }
        })
        .sum()
}

fn selector_depth(selector: &Selector) -> usize {
    match selector {
        Selector::Filter(expression) => 1 + expression_depth(expression),
        _ => 1,
    }
}

fn expression_depth(expression: &Expression) -> usize {
    match expression {
        Expression::Binary { left, right, .. } => {
            expression_depth(left).max(expression_depth(right))
        }
        Expression::LogicalNot(inner) | Expression::Parenthesized(inner) => {
            expression_depth(inner)
        }
        Expression::FunctionCall { arguments, .. } => {
            arguments.iter().map(expression_depth).max().unwrap_or(0)
        }
        Expression::SingularQuery { segments, .. }
        | Expression::FilterQuery { segments, .. } => segments_depth(segments),
        _ => 0,
    }
}

impl Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "$")?;
        write_segments(f, &self.segments)
    }
}

fn write_segments(
    f: &mut fmt::Formatter<'_>,
    segments: &[Segment],
) -> fmt::Result {
    segments.iter().try_for_each(|segment| write!(f, "{segment}"))
}

fn write_selection(
    f: &mut fmt::Formatter<'_>,
    selectors: &[Selector],
) -> fmt::Result {
    write!(f, "[")?;
    for (i, selector) in selectors.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{selector}")?;
    }
    write!(f, "]")
}

impl Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Child(Selector::MemberNameShorthand(name)) => {
                write!(f, ".{name}")
            }
            Self::Child(Selector::Wildcard) => write!(f, ".*"),
            // Other selectors have no dot notation
            Self::Child(selector) => {
                write_selection(f, std::slice::from_ref(selector))
            }
            Self::Bracketed(selectors) => write_selection(f, selectors),
            Self::Descendant(DescendantTarget::Selector(selector)) => {
                match selector {
                    Selector::MemberNameShorthand(name) => {
                        write!(f, "..{name}")
                    }
                    Selector::Wildcard => write!(f, "..*"),
                    _ => {
                        write!(f, "..")?;
                        write_selection(f, std::slice::from_ref(selector))
                    }
                }
            }
            Self::Descendant(DescendantTarget::Bracketed(selectors)) => {
                write!(f, "..")?;
                write_selection(f, selectors)
            }
        }
    }
}

impl Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) | Self::MemberNameShorthand(name) => {
                write!(f, "'{}'", escape_for_quoted_name(name))
            }
            Self::Wildcard => write!(f, "*"),
            Self::Index(index) => write!(f, "{index}"),
            Self::Slice(slice) => write!(f, "{slice}"),
            Self::Filter(expression) => write!(f, "?{expression}"),
        }
    }
}

impl Display for Slice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(start) = self.start {
            write!(f, "{start}")?;
        }
        write!(f, ":")?;
        if let Some(end) = self.end {
            write!(f, "{end}")?;
        }
        if let Some(step) = self.step {
            write!(f, ":{step}")?;
        }
        Ok(())
    }
}

impl Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(value) => write!(f, "{value}"),
            // NOTE: Debug formatting keeps the fraction/exponent so the
            // literal lexes as a float again, e.g. `1.0` and not `1`.
            Self::Float(value) => write!(f, "{value:?}"),
            Self::String(value) => {
                write!(f, "'{}'", escape_for_quoted_name(value))
            }
            Self::Boolean(value) => write!(f, "{value}"),
            Self::Null => write!(f, "null"),
            Self::Binary { left, operator, right } => {
                write!(f, "{left} {operator} {right}")
            }
            Self::LogicalNot(inner) => write!(f, "!{inner}"),
            Self::Parenthesized(inner) => write!(f, "({inner})"),
            Self::FunctionCall { name, arguments } => {
                write!(f, "{name}(")?;
                for (i, argument) in arguments.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{argument}")?;
                }
                write!(f, ")")
            }
            Self::SingularQuery { kind, segments }
            | Self::FilterQuery { kind, segments } => {
                match kind {
                    QueryKind::Root => write!(f, "$")?,
                    QueryKind::Current => write!(f, "@")?,
                }
                write_segments(f, segments)
            }
        }
    }
}

/// Returns `true` if `name` can be written as a member name shorthand
/// (`.name`). This mirrors the lexer's member name rule and excludes the
/// literal keywords.
#[must_use]
pub fn is_member_name_shorthand(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    let name_first =
        |c: char| c.is_ascii_alphabetic() || c == '_' || !c.is_ascii();
    name_first(first)
        && chars.all(|c| name_first(c) || c.is_ascii_digit())
        && !matches!(name, "true" | "false" | "null")
}

/// Escape characters inside a single-quoted string literal for display. This
/// is the inverse of `unescape_string_literal` in the lexer.
fn escape_for_quoted_name(name: &str) -> String {
    let mut result = String::with_capacity(name.len());
    for c in name.chars() {
        match c {
            '\'' => result.push_str("\\'"),
            '\\' => result.push_str("\\\\"),
            '\u{0008}' => result.push_str("\\b"),
            '\u{000C}' => result.push_str("\\f"),
            '\n' => result.push_str("\\n"),
            '\r' => result.push_str("\\r"),
            '\t' => result.push_str("\\t"),
            c if u32::from(c) < 0x20 => {
                result.push_str(&format!("\\u{:04x}", u32::from(c)));
            }
            _ => result.push(c),
        }
    }
    result
}

impl FromStr for Query {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_query(s)
    }
}

/// Builder for constructing queries
pub struct QueryBuilder {
    /// The underlying query being built
    query: Query,
}

impl QueryBuilder {
    /// Creates a new `QueryBuilder` instance with an empty query, i.e. `$`.
    ///
    /// # Examples
    /// ```
    /// use jpq::query::QueryBuilder;
    /// let builder = QueryBuilder::new();
    /// assert_eq!(builder.build().to_string(), "$");
    /// ```
    #[must_use]
    pub const fn new() -> Self {
        Self { query: Query::new(vec![]) }
    }

    fn push(mut self, segment: Segment) -> Self {
        self.query.segments.push(segment);
        self
    }

    /// Adds a child member access. Names that cannot be written in dot
    /// notation are added as a bracketed name selector.
    ///
    /// # Examples
    ///
    /// ```
    /// use jpq::query::QueryBuilder;
    /// let query = QueryBuilder::new().name("foo").name("two words").build();
    /// assert_eq!(query.to_string(), "$.foo['two words']");
    /// ```
    #[must_use]
    pub fn name(self, name: &str) -> Self {
        if is_member_name_shorthand(name) {
            self.push(Segment::Child(Selector::MemberNameShorthand(
                name.to_string(),
            )))
        } else {
            self.push(Segment::Bracketed(vec![Selector::Name(
                name.to_string(),
            )]))
        }
    }

    /// Adds an index access to the query.
    ///
    /// # Examples
    ///
    /// ```
    /// use jpq::query::QueryBuilder;
    /// let query = QueryBuilder::new().index(-1).build();
    /// assert_eq!(query.to_string(), "$[-1]");
    /// ```
    #[must_use]
    pub fn index(self, index: i64) -> Self {
        self.push(Segment::Bracketed(vec![Selector::Index(index)]))
    }

    /// Adds a slice access to the query.
    ///
    /// # Examples
    ///
    /// ```
    /// use jpq::query::QueryBuilder;
    /// let query = QueryBuilder::new().slice(Some(1), None, Some(2)).build();
    /// assert_eq!(query.to_string(), "$[1::2]");
    /// ```
    #[must_use]
    pub fn slice(
        self,
        start: Option<i64>,
        end: Option<i64>,
        step: Option<i64>,
    ) -> Self {
        self.push(Segment::Bracketed(vec![Selector::Slice(Slice {
            start,
            end,
            step,
        })]))
    }

    /// Adds a wildcard child access, e.g. `.*`.
    ///
    /// # Examples
    ///
    /// ```
    /// use jpq::query::QueryBuilder;
    /// let query = QueryBuilder::new().name("foo").wildcard().build();
    /// assert_eq!(query.to_string(), "$.foo.*");
    /// ```
    #[must_use]
    pub fn wildcard(self) -> Self {
        self.push(Segment::Child(Selector::Wildcard))
    }

    /// Adds a bracketed selection of several selectors.
    ///
    /// # Examples
    ///
    /// ```
    /// use jpq::query::{QueryBuilder, Selector};
    /// let query = QueryBuilder::new()
    ///     .selection(vec![Selector::Index(0), Selector::Name("a".into())])
    ///     .build();
    /// assert_eq!(query.to_string(), "$[0, 'a']");
    /// ```
    #[must_use]
    pub fn selection(self, selectors: Vec<Selector>) -> Self {
        self.push(Segment::Bracketed(selectors))
    }

    /// Adds a filter selector.
    ///
    /// # Examples
    ///
    /// ```
    /// use jpq::query::{
    ///     BinaryOperator, Expression, QueryBuilder, Segment, Selector,
    /// };
    /// let price = Expression::current(vec![Segment::Child(
    ///     Selector::MemberNameShorthand("price".into()),
    /// )]);
    /// let query = QueryBuilder::new()
    ///     .filter(Expression::binary(
    ///         price,
    ///         BinaryOperator::Lt,
    ///         Expression::Integer(10),
    ///     ))
    ///     .build();
    /// assert_eq!(query.to_string(), "$[?@.price < 10]");
    /// ```
    #[must_use]
    pub fn filter(self, expression: Expression) -> Self {
        self.push(Segment::Bracketed(vec![Selector::Filter(expression)]))
    }

    /// Adds a descendant member access, e.g. `..author`.
    ///
    /// # Examples
    ///
    /// ```
    /// use jpq::query::QueryBuilder;
    /// let query = QueryBuilder::new().descendant("author").build();
    /// assert_eq!(query.to_string(), "$..author");
    /// ```
    #[must_use]
    pub fn descendant(self, name: &str) -> Self {
        let target = if is_member_name_shorthand(name) {
            DescendantTarget::Selector(Selector::MemberNameShorthand(
                name.to_string(),
            ))
        } else {
            DescendantTarget::Bracketed(vec![Selector::Name(name.to_string())])
        };
        self.push(Segment::Descendant(target))
    }

    /// Adds a descendant wildcard, e.g. `..*`.
    ///
    /// # Examples
    ///
    /// ```
    /// use jpq::query::QueryBuilder;
    /// let query = QueryBuilder::new().descendant_wildcard().build();
    /// assert_eq!(query.to_string(), "$..*");
    /// ```
    #[must_use]
    pub fn descendant_wildcard(self) -> Self {
        self.push(Segment::Descendant(DescendantTarget::Selector(
            Selector::Wildcard,
        )))
    }

    /// Return the built query as `Query`.
    ///
    /// # Examples
    ///
    /// Query containing mixed segments: `$.store.book[0:2]..price`
    ///
    /// ```
    /// use jpq::query::{Query, QueryBuilder};
    /// let query = QueryBuilder::new()
    ///                         .name("store")
    ///                         .name("book")
    ///                         .slice(Some(0), Some(2), None)
    ///                         .descendant("price")
    ///                         .build();
    ///
    /// let expected: Query = "$.store.book[0:2]..price".parse().unwrap();
    /// assert_eq!(query, expected, "Got: {query:?}, Expected: {expected:?}");
    /// ```
    #[must_use]
    pub fn build(self) -> Query {
        self.query
    }
}

impl Default for QueryBuilder {
    fn default() -> Self {
        Self::new()
    }
}
