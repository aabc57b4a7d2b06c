//! Token cursor with single-token lookahead
//!
//! Every production reads tokens through this cursor. The `expect*` helpers either
//! advance past the expected token or build the [`ParseError`] describing what was
//! expected at the current position.

use crate::xprot::parsing::ParseError;
use crate::xprot::token::{Token, TokenKind};

/// Longest literal text quoted back in an error message
const MAX_FOUND_CHARS: usize = 32;

pub struct TokenCursor<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> TokenCursor<'a> {
    pub fn new(tokens: &'a [Token]) -> Self {
        Self { tokens, pos: 0 }
    }

    /// Index of the next token to be consumed
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn is_at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    pub fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    pub fn peek_kind(&self) -> Option<TokenKind> {
        self.peek_nth_kind(0)
    }

    pub fn peek_nth_kind(&self, n: usize) -> Option<TokenKind> {
        self.tokens.get(self.pos + n).map(|token| token.kind)
    }

    pub fn at(&self, kind: TokenKind) -> bool {
        self.peek_kind() == Some(kind)
    }

    /// Check for `<` followed by `keyword`
    pub fn at_field(&self, keyword: TokenKind) -> bool {
        self.at(TokenKind::LAngle) && self.peek_nth_kind(1) == Some(keyword)
    }

    pub fn advance(&mut self) -> Option<&'a Token> {
        let token = self.tokens.get(self.pos)?;
        self.pos += 1;
        Some(token)
    }

    /// Consume a token of the given kind
    pub fn expect(&mut self, kind: TokenKind, expected: &str) -> Result<&'a Token, ParseError> {
        match self.peek() {
            Some(token) if token.kind == kind => {
                self.pos += 1;
                Ok(token)
            }
            _ => Err(self.unexpected(expected)),
        }
    }

    /// Consume a `< keyword >` field marker
    pub fn expect_field(&mut self, keyword: TokenKind) -> Result<(), ParseError> {
        let expected = format!("'<{}>'", keyword);
        self.expect(TokenKind::LAngle, &expected)?;
        self.expect(keyword, &expected)?;
        self.expect(TokenKind::RAngle, &expected)?;
        Ok(())
    }

    /// Consume a quoted string and return its body
    pub fn expect_string(&mut self, expected: &str) -> Result<String, ParseError> {
        self.expect(TokenKind::QuotedString, expected)
            .map(|token| token.unquoted().to_string())
    }

    /// Consume an integer literal
    pub fn expect_integer(&mut self, expected: &str) -> Result<i64, ParseError> {
        let token = self.expect(TokenKind::Integer, expected)?;
        parse_integer(token)
    }

    /// Consume a float literal
    pub fn expect_float(&mut self, expected: &str) -> Result<f64, ParseError> {
        let token = self.expect(TokenKind::Float, expected)?;
        parse_float(token)
    }

    /// Line of the next token, or of the last token once input is exhausted
    pub fn line(&self) -> usize {
        self.peek()
            .or_else(|| self.tokens.last())
            .map_or(1, |token| token.line)
    }

    /// Build the error for a grammar mismatch at the current position
    pub fn unexpected(&self, expected: impl Into<String>) -> ParseError {
        match self.peek() {
            Some(token) => ParseError::UnexpectedToken {
                position: self.pos,
                line: token.line,
                expected: expected.into(),
                found: describe(token),
            },
            None => ParseError::UnexpectedEnd {
                line: self.line(),
                expected: expected.into(),
            },
        }
    }
}

pub fn parse_integer(token: &Token) -> Result<i64, ParseError> {
    token
        .text
        .parse::<i64>()
        .map_err(|_| invalid_literal(token))
}

pub fn parse_float(token: &Token) -> Result<f64, ParseError> {
    token
        .text
        .parse::<f64>()
        .map_err(|_| invalid_literal(token))
}

fn invalid_literal(token: &Token) -> ParseError {
    ParseError::InvalidLiteral {
        line: token.line,
        kind: token.kind,
        text: token.text.clone(),
    }
}

fn describe(token: &Token) -> String {
    if !token.kind.is_literal() {
        return token.kind.describe();
    }
    let text: String = token.text.chars().take(MAX_FOUND_CHARS).collect();
    if text.len() < token.text.len() {
        format!("{} {}...", token.kind.describe(), text)
    } else {
        format!("{} {}", token.kind.describe(), text)
    }
}
