//! # JSONPath Token
//!
//! Defines the possible tokens produced when lexing a JSONPath query.
use std::fmt::Display;

/// Classification of a JSONPath token.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum TokenKind {
    /* Reserved */
    /// Malformed or unrecognized input
    Unknown,

    /// Leading byte order mark of the query text
    ByteOrderMark,

    /// End of file
    EndOfFile,

    /* Identifiers */
    /// Root identifier `$`
    DollarMark,

    /// Current node identifier `@`
    At,

    /// Member name or function name, e.g. `author`
    MemberName,

    /* Delimiters */
    /// Opening square bracket
    OpenBracket,

    /// Closing square bracket
    CloseBracket,

    /// Opening parenthesis
    OpenParen,

    /// Closing parenthesis
    CloseParen,

    /// Dot `.`
    Dot,

    /// Double dot `..`
    DotDot,

    /// Asterisk `*`
    Asterisk,

    /// Comma character
    Comma,

    /// Colon character
    Colon,

    /// Question mark `?`
    QuestionMark,

    /* Literals */
    /// Quoted string, e.g. `'text'` or `"text"`
    StringLiteral,

    /// Integer, e.g. `-42`
    IntegerNumberLiteral,

    /// Number with fraction and/or exponent, e.g. `1.5e3`
    FloatNumberLiteral,

    /* Operators */
    /// `||`
    BarBar,

    /// `&&`
    AmpersandAmpersand,

    /// `!`
    Exclamation,

    /// `==`
    EqualsEquals,

    /// `!=`
    ExclamationEquals,

    /// `<`
    Less,

    /// `>`
    Greater,

    /// `<=`
    LessEquals,

    /// `>=`
    GreaterEquals,
}

impl TokenKind {
    /// Returns whether the token is one of the six comparison operators.
    #[must_use]
    pub const fn is_comparison(self) -> bool {
        matches!(
            self,
            Self::EqualsEquals
                | Self::ExclamationEquals
                | Self::Less
                | Self::Greater
                | Self::LessEquals
                | Self::GreaterEquals
        )
    }
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Unknown => "unknown token",
            Self::ByteOrderMark => "byte order mark",
            Self::EndOfFile => "end of input",
            Self::DollarMark => "`$`",
            Self::At => "`@`",
            Self::MemberName => "member name",
            Self::OpenBracket => "`[`",
            Self::CloseBracket => "`]`",
            Self::OpenParen => "`(`",
            Self::CloseParen => "`)`",
            Self::Dot => "`.`",
            Self::DotDot => "`..`",
            Self::Asterisk => "`*`",
            Self::Comma => "`,`",
            Self::Colon => "`:`",
            Self::QuestionMark => "`?`",
            Self::StringLiteral => "string literal",
            Self::IntegerNumberLiteral => "integer literal",
            Self::FloatNumberLiteral => "float literal",
            Self::BarBar => "`||`",
            Self::AmpersandAmpersand => "`&&`",
            Self::Exclamation => "`!`",
            Self::EqualsEquals => "`==`",
            Self::ExclamationEquals => "`!=`",
            Self::Less => "`<`",
            Self::Greater => "`>`",
            Self::LessEquals => "`<=`",
            Self::GreaterEquals => "`>=`",
        };
        write!(f, "{name}")
    }
}

/// A classified slice of the query text.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Token {
    /// The token classification
    pub kind: TokenKind,
    /// The exact decoded source text the token matched. Escapes inside
    /// string literals are kept as written.
    pub text: String,
}

impl Token {
    /// Creates a new token.
    pub fn new<T: Into<String>>(kind: TokenKind, text: T) -> Self {
        Self { kind, text: text.into() }
    }

    /// Creates the end-of-file token.
    #[must_use]
    pub const fn end_of_file() -> Self {
        Self { kind: TokenKind::EndOfFile, text: String::new() }
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.text.is_empty() {
            write!(f, "{}", self.kind)
        } else {
            write!(f, "{} {:?}", self.kind, self.text)
        }
    }
}
