//! Parsing of XProtocol token streams into a [`Document`]
//!
//! The grammar has a fixed top-level shape:
//!
//!     < XProtocol > {
//!         name id userversion evastringtable
//!         param*
//!         paramcardlayout
//!         dependency*
//!         protocolcomposer*
//!     }
//!
//! Each production is a function in [`grammar`]. Lookahead is never more than the keyword
//! right after a `<`, so recursive descent is enough for the sections. Parameter bodies
//! nest without bound and are built on an explicit container stack
//! ([`builder::BuilderContext`]) instead of the call stack.
//!
//! Failure is all or nothing: the first token that does not fit the grammar aborts the
//! parse with a [`ParseError`] carrying the source line. There is no resync and partial
//! documents are never returned. This is distinct from the tokenizer, which silently
//! drops characters it does not recognize.

pub mod builder;
pub mod cursor;
pub mod grammar;

use thiserror::Error;
use tracing::debug;

use crate::xprot::ast::Document;
use crate::xprot::config::ParserConfig;
use crate::xprot::lexing::tokenize;
use crate::xprot::token::{Token, TokenKind};

/// Fatal structural errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The token at `position` does not match the grammar
    #[error("line {line}: expected {expected}, found {found}")]
    UnexpectedToken {
        position: usize,
        line: usize,
        expected: String,
        found: String,
    },
    /// Input ended while a production was still open
    #[error("line {line}: expected {expected}, found end of input")]
    UnexpectedEnd { line: usize, expected: String },
    /// A numeric literal that does not fit the model type
    #[error("line {line}: invalid {kind} literal '{text}'")]
    InvalidLiteral {
        line: usize,
        kind: TokenKind,
        text: String,
    },
    /// A dependency block with more than one trailing attribute
    #[error("line {line}: dependency \"{label}\" has more than one trailing attribute")]
    DuplicateAttribute { line: usize, label: String },
}

impl ParseError {
    /// 1-based source line the error refers to
    pub fn line(&self) -> usize {
        match self {
            ParseError::UnexpectedToken { line, .. }
            | ParseError::UnexpectedEnd { line, .. }
            | ParseError::InvalidLiteral { line, .. }
            | ParseError::DuplicateAttribute { line, .. } => *line,
        }
    }
}

/// Parse a token stream with the default parser configuration
pub fn parse(tokens: &[Token]) -> Result<Document, ParseError> {
    parse_with(tokens, &ParserConfig::default())
}

/// Parse a token stream
pub fn parse_with(tokens: &[Token], config: &ParserConfig) -> Result<Document, ParseError> {
    let document = grammar::Parser::new(tokens, config).document()?;
    debug!(
        name = %document.name,
        params = document.walk().count(),
        dependencies = document.dependencies.len(),
        composers = document.protocol_composers.len(),
        "parsed document"
    );
    Ok(document)
}

/// Tokenize and parse source text in one step
pub fn parse_document(source: &str) -> Result<Document, ParseError> {
    parse(&tokenize(source))
}
