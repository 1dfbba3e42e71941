//! # JSONPath Lexer
//!
//! Turns the code points of a JSONPath query into a stream of classified
//! tokens. The lexer never fails: malformed input is surfaced as
//! [`TokenKind::Unknown`] tokens and the parser decides what to do with them.
use std::mem;

use crate::tokenizer::reader::{CodePoint, CodepointReader};
use crate::tokenizer::{Token, TokenKind};

/// Text of the token emitted for a leading byte order mark.
const BYTE_ORDER_MARK: &str = "\u{FEFF}";

/// Returns whether `c` may start a member name.
const fn is_name_first(c: u32) -> bool {
    matches!(
        c,
        0x41..=0x5A | 0x61..=0x7A | 0x5F | 0x80..=0xD7FF | 0xE000..=0x10_FFFF
    )
}

/// Returns whether `c` may continue a member name.
const fn is_name_char(c: u32) -> bool {
    is_name_first(c) || is_digit(c)
}

const fn is_digit(c: u32) -> bool {
    matches!(c, 0x30..=0x39)
}

const fn is_digit1(c: u32) -> bool {
    matches!(c, 0x31..=0x39)
}

const fn is_blank(c: u32) -> bool {
    matches!(c, 0x20 | 0x09 | 0x0A | 0x0D)
}

/// Characters allowed unescaped inside either kind of string literal.
const fn is_unescaped(c: u32) -> bool {
    matches!(
        c,
        0x20..=0x21
            | 0x23..=0x26
            | 0x28..=0x5B
            | 0x5D..=0xD7FF
            | 0xE000..=0x10_FFFF
    )
}

fn hex_value(c: u32) -> Option<u32> {
    char::from_u32(c).and_then(|c| c.to_digit(16))
}

/// A lexer over a UTF-8 encoded JSONPath query with one token of lookahead.
pub struct Lexer<'a> {
    /// Source of decoded code points
    reader: CodepointReader<'a>,
    /// Code point under examination
    code_point: CodePoint,
    /// Lexeme under construction
    buffer: String,
    /// Pre-computed next token
    next: Token,
}

impl<'a> Lexer<'a> {
    /// Creates a lexer and pre-computes the first token.
    #[must_use]
    pub fn new(input: &'a [u8]) -> Self {
        let mut reader = CodepointReader::new(input);
        let code_point = reader.try_read_next();
        let mut lexer = Self {
            reader,
            code_point,
            buffer: String::new(),
            next: Token::end_of_file(),
        };
        lexer.next = if lexer.reader.had_byte_order_mark() {
            Token::new(TokenKind::ByteOrderMark, BYTE_ORDER_MARK)
        } else {
            lexer.scan()
        };
        lexer
    }

    /// Returns and consumes the next token.
    pub fn next_token(&mut self) -> Token {
        let scanned = self.scan();
        let token = mem::replace(&mut self.next, scanned);
        log::trace!("token: {token}");
        token
    }

    /// Peeks at the next token without consuming it.
    #[must_use]
    pub const fn look_ahead(&self) -> &Token {
        &self.next
    }

    const fn current(&self) -> Option<u32> {
        match self.code_point {
            CodePoint::Scalar(c) => Some(c),
            CodePoint::Invalid | CodePoint::EndOfStream => None,
        }
    }

    fn is_end_of_stream(&self) -> bool {
        self.code_point == CodePoint::EndOfStream
    }

    /// Appends the current code point to the lexeme and advances.
    fn add_char(&mut self) {
        match self.code_point {
            CodePoint::EndOfStream => return,
            CodePoint::Scalar(c) => self
                .buffer
                .push(char::from_u32(c).unwrap_or(char::REPLACEMENT_CHARACTER)),
            CodePoint::Invalid => self.buffer.push(char::REPLACEMENT_CHARACTER),
        }
        self.code_point = self.reader.try_read_next();
    }

    fn try_read(&mut self, expected: char) -> bool {
        self.try_read_if(|c| c == expected as u32)
    }

    fn try_read_if(&mut self, predicate: impl Fn(u32) -> bool) -> bool {
        match self.current() {
            Some(c) if predicate(c) => {
                self.add_char();
                true
            }
            _ => false,
        }
    }

    fn read_all(&mut self, predicate: impl Fn(u32) -> bool) {
        while self.try_read_if(&predicate) {}
    }

    /// Reads one or more code points satisfying `predicate`.
    fn read_any(&mut self, predicate: impl Fn(u32) -> bool) -> bool {
        if !self.try_read_if(&predicate) {
            return false;
        }
        self.read_all(predicate);
        true
    }

    fn create_token(&mut self, kind: TokenKind) -> Token {
        Token::new(kind, mem::take(&mut self.buffer))
    }

    fn single(&mut self, kind: TokenKind) -> Token {
        self.add_char();
        self.create_token(kind)
    }

    /// Reads the first character of a two-character operator, then the
    /// second one if present.
    fn pair(
        &mut self,
        second: char,
        paired: TokenKind,
        alone: TokenKind,
    ) -> Token {
        self.add_char();
        if self.try_read(second) {
            self.create_token(paired)
        } else {
            self.create_token(alone)
        }
    }

    fn skip_whitespace(&mut self) {
        while self.current().is_some_and(is_blank) {
            self.code_point = self.reader.try_read_next();
        }
    }

    fn scan(&mut self) -> Token {
        self.skip_whitespace();
        self.buffer.clear();

        let c = match self.code_point {
            CodePoint::EndOfStream => return Token::end_of_file(),
            CodePoint::Invalid => return self.single(TokenKind::Unknown),
            CodePoint::Scalar(c) => c,
        };
        let Some(symbol) = char::from_u32(c) else {
            return self.single(TokenKind::Unknown);
        };

        match symbol {
            '0' => {
                self.add_char();
                self.read_integer_or_decimal()
            }
            '1'..='9' => {
                self.add_char();
                self.read_all(is_digit);
                self.read_integer_or_decimal()
            }
            '-' => self.read_negative_number(),
            '|' => self.pair('|', TokenKind::BarBar, TokenKind::Unknown),
            '&' => self.pair(
                '&',
                TokenKind::AmpersandAmpersand,
                TokenKind::Unknown,
            ),
            '=' => {
                self.pair('=', TokenKind::EqualsEquals, TokenKind::Unknown)
            }
            '>' => self.pair('=', TokenKind::GreaterEquals, TokenKind::Greater),
            '<' => self.pair('=', TokenKind::LessEquals, TokenKind::Less),
            '!' => self.pair(
                '=',
                TokenKind::ExclamationEquals,
                TokenKind::Exclamation,
            ),
            '.' => self.pair('.', TokenKind::DotDot, TokenKind::Dot),
            '(' => self.single(TokenKind::OpenParen),
            ')' => self.single(TokenKind::CloseParen),
            '[' => self.single(TokenKind::OpenBracket),
            ']' => self.single(TokenKind::CloseBracket),
            '$' => self.single(TokenKind::DollarMark),
            '@' => self.single(TokenKind::At),
            ':' => self.single(TokenKind::Colon),
            ',' => self.single(TokenKind::Comma),
            '*' => self.single(TokenKind::Asterisk),
            '?' => self.single(TokenKind::QuestionMark),
            '\'' => self.read_string('\''),
            '"' => self.read_string('"'),
            _ if is_name_first(c) => {
                self.add_char();
                self.read_all(is_name_char);
                self.create_token(TokenKind::MemberName)
            }
            _ => self.single(TokenKind::Unknown),
        }
    }

    /// Reads a number starting with `-`. Negative zero is only accepted with
    /// a fraction or an exponent.
    fn read_negative_number(&mut self) -> Token {
        self.add_char();
        if self.try_read('0') {
            return self
                .read_decimal()
                .unwrap_or_else(|| self.create_token(TokenKind::Unknown));
        }
        if !self.try_read_if(is_digit1) {
            return self.create_token(TokenKind::Unknown);
        }
        self.read_all(is_digit);
        self.read_integer_or_decimal()
    }

    fn read_integer_or_decimal(&mut self) -> Token {
        self.read_decimal().unwrap_or_else(|| {
            self.create_token(TokenKind::IntegerNumberLiteral)
        })
    }

    /// Reads the optional fraction and exponent of a number whose integer
    /// part is already in the buffer. Returns `None` when neither is
    /// present.
    fn read_decimal(&mut self) -> Option<Token> {
        let mut has_fraction = false;
        if self.try_read('.') {
            if !self.read_any(is_digit) {
                return Some(self.create_token(TokenKind::Unknown));
            }
            has_fraction = true;
        }
        if !(self.try_read('e') || self.try_read('E')) {
            return has_fraction
                .then(|| self.create_token(TokenKind::FloatNumberLiteral));
        }
        let _ = self.try_read('-') || self.try_read('+');
        if self.read_any(is_digit) {
            Some(self.create_token(TokenKind::FloatNumberLiteral))
        } else {
            Some(self.create_token(TokenKind::Unknown))
        }
    }

    /// Reads a string literal delimited by `quote`. The other quote character
    /// may appear unescaped.
    fn read_string(&mut self, quote: char) -> Token {
        let other = if quote == '\'' { '"' } else { '\'' };
        self.add_char();

        let mut failed = false;
        while !self.is_end_of_stream() {
            if self.try_read_if(is_unescaped) || self.try_read(other) {
                continue;
            }
            if self.try_read('\\') {
                if self.try_read(quote) || self.read_escapable() {
                    continue;
                }
                failed = true;
            }
            break;
        }

        if !failed && self.try_read(quote) {
            self.create_token(TokenKind::StringLiteral)
        } else {
            self.create_token(TokenKind::Unknown)
        }
    }

    /// Reads the character following a backslash.
    fn read_escapable(&mut self) -> bool {
        if self.try_read_if(|c| {
            matches!(
                char::from_u32(c),
                Some('b' | 'f' | 'n' | 'r' | 't' | '/' | '\\')
            )
        }) {
            return true;
        }
        self.try_read('u') && self.read_hex_char()
    }

    fn read_hex_quad(&mut self) -> Option<u32> {
        let mut value = 0;
        for _ in 0..4 {
            let digit = self.current().and_then(hex_value)?;
            self.add_char();
            value = (value << 4) | digit;
        }
        Some(value)
    }

    /// Reads the four hex digits after `\u`; a high surrogate must be
    /// followed by an escaped low surrogate.
    fn read_hex_char(&mut self) -> bool {
        match self.read_hex_quad() {
            Some(0xD800..=0xDBFF) => {
                self.try_read('\\')
                    && self.try_read('u')
                    && matches!(self.read_hex_quad(), Some(0xDC00..=0xDFFF))
            }
            Some(0xDC00..=0xDFFF) | None => false,
            Some(_) => true,
        }
    }
}

/// Tokenize a UTF-8 encoded JSONPath query into its token sequence, ending
/// with [`TokenKind::EndOfFile`].
#[must_use]
pub fn tokenize(text: &[u8]) -> Vec<Token> {
    let mut lexer = Lexer::new(text);
    let mut tokens: Vec<Token> = vec![];

    loop {
        let token = lexer.next_token();
        let is_eof = token.kind == TokenKind::EndOfFile;

        tokens.push(token);

        if is_eof {
            break;
        }
    }

    tokens
}

/// Decodes the text of a [`TokenKind::StringLiteral`] token: strips the
/// surrounding quotes and resolves escape sequences. Surrogate pair escapes
/// are combined into a single character.
#[must_use]
pub fn unescape_string_literal(text: &str) -> String {
    let mut chars = text.chars();
    chars.next();
    chars.next_back();

    let mut result = String::with_capacity(text.len());
    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        match chars.next() {
            Some('b') => result.push('\u{0008}'),
            Some('f') => result.push('\u{000C}'),
            Some('n') => result.push('\n'),
            Some('r') => result.push('\r'),
            Some('t') => result.push('\t'),
            Some('u') => {
                let high = read_hex(&mut chars);
                let code = if (0xD800..=0xDBFF).contains(&high) {
                    // skip the `\u` of the low surrogate
                    chars.next();
                    chars.next();
                    let low = read_hex(&mut chars);
                    0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00)
                } else {
                    high
                };
                result.push(
                    char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER),
                );
            }
            // quotes, `/` and `\` stand for themselves
            Some(other) => result.push(other),
            None => {}
        }
    }
    result
}

fn read_hex(chars: &mut std::str::Chars<'_>) -> u32 {
    chars
        .take(4)
        .filter_map(|c| c.to_digit(16))
        .fold(0, |acc, digit| (acc << 4) | digit)
}
