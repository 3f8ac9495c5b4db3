//! Lexer for JSONPath queries

use std::iter::Peekable;
use std::str::Chars;

/// Token types for JSONPath
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Root identifier `$`
    Root,
    /// Current node `@`
    Current,
    /// Single dot `.`
    Dot,
    /// Double dot `..`
    DotDot,
    /// Opening bracket `[`
    BracketOpen,
    /// Closing bracket `]`
    BracketClose,
    /// Opening parenthesis `(`
    ParenOpen,
    /// Closing parenthesis `)`
    ParenClose,
    /// Wildcard `*`
    Wildcard,
    /// Colon `:`
    Colon,
    /// Comma `,`
    Comma,
    /// Question mark `?` (filter indicator)
    Question,
    /// Less than `<`
    LessThan,
    /// Greater than `>`
    GreaterThan,
    /// Less than or equal `<=`
    LessEq,
    /// Greater than or equal `>=`
    GreaterEq,
    /// Equal `==`
    Equal,
    /// Not equal `!=`
    NotEqual,
    /// Logical AND `&&`
    And,
    /// Logical OR `||`
    Or,
    /// Logical NOT `!`
    Not,
    /// Boolean true literal
    True,
    /// Boolean false literal
    False,
    /// Null literal
    Null,
    /// Identifier (member name shorthand or function name)
    Ident,
    /// String literal (single or double quoted), text is the decoded value
    String,
    /// Integer without fraction or exponent
    Int,
    /// Number with a fraction or exponent part (and `-0`)
    Number,
    /// Run of blank space: space, tab, CR, LF
    Blank,
    /// End of input
    Eof,
    /// Malformed input, text is the diagnostic message
    Invalid,
}

/// Token with position information
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    /// Offset of the first char of the token, counted in chars from 0
    pub position: usize,
}

impl Token {
    fn new(kind: TokenKind, text: impl Into<String>, position: usize) -> Self {
        Self {
            kind,
            text: text.into(),
            position,
        }
    }

    fn invalid(message: impl Into<String>, position: usize) -> Self {
        Self::new(TokenKind::Invalid, message, position)
    }
}

/// Failure inside a string or number scan, turned into an `Invalid` token.
struct ScanError {
    message: String,
    position: usize,
}

impl ScanError {
    fn new(message: impl Into<String>, position: usize) -> Self {
        Self {
            message: message.into(),
            position,
        }
    }
}

impl From<ScanError> for Token {
    fn from(e: ScanError) -> Self {
        Token::invalid(e.message, e.position)
    }
}

/// Lexer for tokenizing JSONPath queries
pub struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    position: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars().peekable(),
            position: 0,
        }
    }

    /// Tokenize the entire input.
    ///
    /// The returned list always ends with an `Eof` or an `Invalid` token;
    /// scanning stops at the first invalid token.
    pub fn tokenize(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let last = matches!(token.kind, TokenKind::Eof | TokenKind::Invalid);
            tokens.push(token);
            if last {
                return tokens;
            }
        }
    }

    /// Scan one token. Returns `Eof` once the input is exhausted.
    pub fn next_token(&mut self) -> Token {
        let start = self.position;
        let Some(ch) = self.advance() else {
            return Token::new(TokenKind::Eof, "", start);
        };

        let kind = match ch {
            '$' => TokenKind::Root,
            '@' => TokenKind::Current,
            '.' => {
                if self.eat('.') {
                    return Token::new(TokenKind::DotDot, "..", start);
                }
                TokenKind::Dot
            }
            '[' => TokenKind::BracketOpen,
            ']' => TokenKind::BracketClose,
            '(' => TokenKind::ParenOpen,
            ')' => TokenKind::ParenClose,
            '*' => TokenKind::Wildcard,
            ':' => TokenKind::Colon,
            ',' => TokenKind::Comma,
            '?' => TokenKind::Question,
            '<' => return self.one_or_two(start, '<', '=', TokenKind::LessThan, TokenKind::LessEq),
            '>' => {
                return self.one_or_two(start, '>', '=', TokenKind::GreaterThan, TokenKind::GreaterEq);
            }
            '!' => return self.one_or_two(start, '!', '=', TokenKind::Not, TokenKind::NotEqual),
            '=' => return self.pair(start, '=', TokenKind::Equal),
            '&' => return self.pair(start, '&', TokenKind::And),
            '|' => return self.pair(start, '|', TokenKind::Or),
            ' ' | '\t' | '\r' | '\n' => return self.read_blank(ch, start),
            '\'' | '"' => {
                return self
                    .read_string(ch, start)
                    .map_or_else(Token::from, |s| Token::new(TokenKind::String, s, start));
            }
            '-' | '0'..='9' => {
                return self
                    .read_number(ch, start)
                    .unwrap_or_else(Token::from);
            }
            _ if is_ident_start(ch) => return self.read_ident_or_keyword(ch, start),
            _ => return Token::invalid(format!("unexpected character '{ch}'"), start),
        };

        Token::new(kind, ch.to_string(), start)
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.chars.next();
        if ch.is_some() {
            self.position += 1;
        }
        ch
    }

    /// Consume the next char if it equals `expected`
    fn eat(&mut self, expected: char) -> bool {
        if self.chars.peek() == Some(&expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn one_or_two(
        &mut self,
        start: usize,
        first: char,
        second: char,
        single: TokenKind,
        double: TokenKind,
    ) -> Token {
        if self.eat(second) {
            Token::new(double, format!("{first}{second}"), start)
        } else {
            Token::new(single, first.to_string(), start)
        }
    }

    /// Operators that only exist doubled: `==`, `&&`, `||`
    fn pair(&mut self, start: usize, ch: char, kind: TokenKind) -> Token {
        if self.eat(ch) {
            Token::new(kind, format!("{ch}{ch}"), start)
        } else {
            Token::invalid(format!("expected '{ch}{ch}' but found single '{ch}'"), start)
        }
    }

    fn read_blank(&mut self, first: char, start: usize) -> Token {
        let mut text = String::from(first);
        while let Some(&ch) = self.chars.peek() {
            if !is_blank(ch) {
                break;
            }
            text.push(ch);
            self.advance();
        }
        Token::new(TokenKind::Blank, text, start)
    }

    fn read_string(&mut self, quote: char, start: usize) -> Result<String, ScanError> {
        let mut value = String::new();

        loop {
            let pos = self.position;
            match self.advance() {
                Some(ch) if ch == quote => return Ok(value),
                Some('\\') => value.push(self.read_escape(quote, pos)?),
                Some(ch) if (ch as u32) < 0x20 => {
                    return Err(ScanError::new(
                        format!("invalid control character U+{:04X} in string literal", ch as u32),
                        pos,
                    ));
                }
                Some(ch) => value.push(ch),
                None => return Err(ScanError::new("unterminated string literal", start)),
            }
        }
    }

    /// Decode the escape following a backslash at `pos`
    fn read_escape(&mut self, quote: char, pos: usize) -> Result<char, ScanError> {
        let Some(escaped) = self.advance() else {
            return Err(ScanError::new("unterminated string literal", pos));
        };
        match escaped {
            'b' => Ok('\x08'),
            'f' => Ok('\x0C'),
            'n' => Ok('\n'),
            'r' => Ok('\r'),
            't' => Ok('\t'),
            '/' => Ok('/'),
            '\\' => Ok('\\'),
            'u' => self.read_unicode_escape(pos),
            ch if ch == quote => Ok(ch),
            ch => Err(ScanError::new(format!("invalid escape '\\{ch}'"), pos)),
        }
    }

    /// Decode `XXXX` after `\u`, combining a following low surrogate escape
    fn read_unicode_escape(&mut self, pos: usize) -> Result<char, ScanError> {
        let code = self.read_hex4(pos)?;
        match code {
            0xD800..=0xDBFF => {
                let low_pos = self.position;
                if !(self.eat('\\') && self.eat('u')) {
                    return Err(ScanError::new(
                        "high surrogate must be followed by a low surrogate escape",
                        pos,
                    ));
                }
                let low = self.read_hex4(low_pos)?;
                if !(0xDC00..=0xDFFF).contains(&low) {
                    return Err(ScanError::new("invalid low surrogate", low_pos));
                }
                let combined = 0x10000 + ((code - 0xD800) << 10) + (low - 0xDC00);
                char::from_u32(combined)
                    .ok_or_else(|| ScanError::new("invalid unicode code point", pos))
            }
            0xDC00..=0xDFFF => Err(ScanError::new("unpaired low surrogate", pos)),
            _ => char::from_u32(code).ok_or_else(|| ScanError::new("invalid unicode code point", pos)),
        }
    }

    fn read_hex4(&mut self, pos: usize) -> Result<u32, ScanError> {
        let mut code = 0;
        for _ in 0..4 {
            let digit = self
                .chars
                .peek()
                .and_then(|ch| ch.to_digit(16))
                .ok_or_else(|| ScanError::new("invalid unicode escape: expected 4 hex digits", pos))?;
            self.advance();
            code = code * 16 + digit;
        }
        Ok(code)
    }

    fn read_digits(&mut self, text: &mut String) {
        while let Some(&ch) = self.chars.peek() {
            if !ch.is_ascii_digit() {
                break;
            }
            text.push(ch);
            self.advance();
        }
    }

    fn expect_digit(&mut self, text: &mut String, message: &str) -> Result<(), ScanError> {
        match self.chars.peek() {
            Some(ch) if ch.is_ascii_digit() => {
                self.read_digits(text);
                Ok(())
            }
            _ => Err(ScanError::new(message, self.position)),
        }
    }

    fn read_number(&mut self, first: char, start: usize) -> Result<Token, ScanError> {
        let mut text = String::from(first);

        let lead = if first == '-' {
            match self.advance() {
                Some(ch) if ch.is_ascii_digit() => {
                    text.push(ch);
                    ch
                }
                _ => return Err(ScanError::new("expected digit after '-'", start)),
            }
        } else {
            first
        };

        if lead == '0' {
            if self.chars.peek().is_some_and(char::is_ascii_digit) {
                return Err(ScanError::new("leading zeros not allowed", start));
            }
        } else {
            self.read_digits(&mut text);
        }

        let mut decimal = false;

        if self.eat('.') {
            text.push('.');
            self.expect_digit(&mut text, "expected digit after decimal point")?;
            decimal = true;
        }

        if let Some(&e) = self.chars.peek().filter(|&&c| c == 'e' || c == 'E') {
            self.advance();
            text.push(e);
            if let Some(&sign) = self.chars.peek().filter(|&&c| c == '+' || c == '-') {
                self.advance();
                text.push(sign);
            }
            self.expect_digit(&mut text, "expected digit in exponent")?;
            decimal = true;
        }

        // `-0` is a valid number literal but never a valid index
        let kind = if decimal || text == "-0" {
            TokenKind::Number
        } else {
            TokenKind::Int
        };
        Ok(Token::new(kind, text, start))
    }

    fn read_ident_or_keyword(&mut self, first: char, start: usize) -> Token {
        let mut ident = String::from(first);

        while let Some(&ch) = self.chars.peek() {
            if !is_ident_char(ch) {
                break;
            }
            ident.push(ch);
            self.advance();
        }

        let kind = match ident.as_str() {
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "null" => TokenKind::Null,
            _ => TokenKind::Ident,
        };
        Token::new(kind, ident, start)
    }
}

fn is_blank(ch: char) -> bool {
    matches!(ch, ' ' | '\t' | '\r' | '\n')
}

/// Check if character is valid as the start of an identifier (RFC 9535 name-first)
/// name-first = ALPHA / "_" / %x80-D7FF / %xE000-10FFFF
fn is_ident_start(ch: char) -> bool {
    let code = ch as u32;
    ch.is_ascii_alphabetic()
        || ch == '_'
        || (0x80..=0xD7FF).contains(&code)
        || (0xE000..=0x10FFFF).contains(&code)
}

/// Check if character is valid within an identifier (RFC 9535 name-char)
/// name-char = name-first / DIGIT
fn is_ident_char(ch: char) -> bool {
    is_ident_start(ch) || ch.is_ascii_digit()
}
