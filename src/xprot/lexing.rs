//! Tokenization of XProtocol source text
//!
//! This is the entry point where source strings become token streams. Tokenization is
//! total: scanner exports are not always clean, so an unrecognized character is dropped
//! and scanning resumes at the next character. Everything recognizable before and after
//! the noise is kept.

use logos::Logos;
use tracing::{debug, trace};

use crate::xprot::token::{Token, TokenKind};

/// Tokenize XProtocol source text
///
/// Returns the tokens in source order, each paired with the 1-based line it starts on.
/// Whitespace, newlines and `#` comments produce no tokens.
pub fn tokenize(source: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut skipped = 0usize;

    // Byte offset where the current logos lexer started, and the line bookkeeping
    // (newlines are counted lazily between token starts).
    let mut base = 0usize;
    let mut line = 1usize;
    let mut counted_to = 0usize;
    let mut lexer = TokenKind::lexer(source);

    loop {
        let Some(result) = lexer.next() else {
            break;
        };
        let span = lexer.span();
        let start = base + span.start;
        line += count_newlines(&source[counted_to..start]);
        counted_to = start;

        match result {
            Ok(kind) => {
                tokens.push(Token::new(kind, lexer.slice(), line));
            }
            Err(()) => {
                // logos may have consumed more than one character while trying to
                // match (e.g. an unterminated quote). Drop exactly one and rescan.
                let dropped = source[start..].chars().next().map_or(1, char::len_utf8);
                trace!(
                    line,
                    offset = start,
                    text = %&source[start..start + dropped],
                    "skipping illegal character"
                );
                skipped += 1;
                base = start + dropped;
                lexer = TokenKind::lexer(&source[base..]);
            }
        }
    }

    debug!(tokens = tokens.len(), skipped, "tokenized source");
    tokens
}

fn count_newlines(text: &str) -> usize {
    text.bytes().filter(|b| *b == b'\n').count()
}
