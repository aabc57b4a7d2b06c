//! Token definitions for the XProtocol format
//!
//! XProtocol mixes three token classes: structural punctuation (`<`, `>`, `{`, `}`, `.`),
//! reserved keywords and literals. Keywords never carry data. They only appear between
//! angle brackets, where they either open a section (`<ParamMap."name">`), introduce a
//! field (`<Name>`, `<Pos>`) or act as a tag for the literal that follows (`<Default>`).
//!
//! Keywords are matched by exact, case-sensitive text and, because logos always takes the
//! longest match, `ParamCardLayout` wins over `Param` and `PipeService` over `Pipe`.
//! Literals come last: a float needs a decimal point or an exponent marker, so `1E5` is a
//! float while `15` is an integer.

use logos::Logos;
use serde::Serialize;
use std::fmt;

use crate::xprot::ast::{ParamKind, Tag};

/// All token kinds produced by the XProtocol lexer
///
/// Whitespace, newlines and `#` comments are skipped by the lexer itself. Line numbers are
/// recovered from byte offsets in [`tokenize`](crate::xprot::lexing::tokenize).
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[logos(skip r"[ \t\r\n\f]+|#[^\n]*")]
pub enum TokenKind {
    // Structural punctuation
    #[token("<")]
    LAngle,
    #[token(">")]
    RAngle,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token(".")]
    Period,

    // Document structure
    #[token("XProtocol")]
    XProtocol,
    #[token("Name")]
    Name,
    #[token("ID")]
    Id,
    #[token("Userversion")]
    Userversion,
    #[token("EVAStringTable")]
    EvaStringTable,
    #[token("ParamCardLayout")]
    ParamCardLayout,
    #[token("Repr")]
    Repr,
    #[token("Control")]
    Control,
    #[token("Param")]
    Param,
    #[token("Pos")]
    Pos,
    #[token("Dependency")]
    Dependency,
    #[token("Dll")]
    Dll,
    #[token("Context")]
    Context,
    #[token("Visible")]
    Visible,
    #[token("ProtocolComposer")]
    ProtocolComposer,
    #[token("InFile")]
    InFile,

    // Container kinds
    #[token("ParamMap")]
    ParamMap,
    #[token("ParamString")]
    ParamString,
    #[token("ParamLong")]
    ParamLong,
    #[token("ParamBool")]
    ParamBool,
    #[token("ParamChoice")]
    ParamChoice,
    #[token("ParamDouble")]
    ParamDouble,
    #[token("ParamArray")]
    ParamArray,
    #[token("Pipe")]
    Pipe,
    #[token("PipeService")]
    PipeService,
    #[token("ParamFunctor")]
    ParamFunctor,
    #[token("Event")]
    Event,
    #[token("Method")]
    Method,
    #[token("Connection")]
    Connection,

    // Tags (`Visible` above doubles as a tag)
    #[token("LimitRange")]
    LimitRange,
    #[token("Default")]
    Default,
    #[token("MinSize")]
    MinSize,
    #[token("MaxSize")]
    MaxSize,
    #[token("Limit")]
    Limit,
    #[token("Precision")]
    Precision,
    #[token("Unit")]
    Unit,
    #[token("Class")]
    Class,
    #[token("Label")]
    Label,
    #[token("Comment")]
    Comment,
    #[token("Tooltip")]
    Tooltip,

    // Literals
    #[regex(r#""[^"]*""#)]
    QuotedString,
    #[regex(r"-?([0-9]*\.[0-9]+([eE][+-]?[0-9]+)?|[0-9]+[eE][+-]?[0-9]+)")]
    Float,
    #[regex(r"-?[0-9]+")]
    Integer,
}

impl TokenKind {
    /// The container kind opened by this keyword, if it is one of the 13 container keywords
    pub fn container_kind(&self) -> Option<ParamKind> {
        let kind = match self {
            TokenKind::ParamMap => ParamKind::Map,
            TokenKind::ParamString => ParamKind::String,
            TokenKind::ParamLong => ParamKind::Long,
            TokenKind::ParamBool => ParamKind::Bool,
            TokenKind::ParamChoice => ParamKind::Choice,
            TokenKind::ParamDouble => ParamKind::Double,
            TokenKind::ParamArray => ParamKind::Array,
            TokenKind::Pipe => ParamKind::Pipe,
            TokenKind::PipeService => ParamKind::PipeService,
            TokenKind::ParamFunctor => ParamKind::Functor,
            TokenKind::Event => ParamKind::Event,
            TokenKind::Method => ParamKind::Method,
            TokenKind::Connection => ParamKind::Connection,
            _ => return None,
        };
        Some(kind)
    }

    /// The attribute tag named by this keyword, if it is one of the 12 tag keywords
    pub fn tag(&self) -> Option<Tag> {
        let tag = match self {
            TokenKind::Default => Tag::Default,
            TokenKind::LimitRange => Tag::LimitRange,
            TokenKind::MinSize => Tag::MinSize,
            TokenKind::MaxSize => Tag::MaxSize,
            TokenKind::Limit => Tag::Limit,
            TokenKind::Precision => Tag::Precision,
            TokenKind::Unit => Tag::Unit,
            TokenKind::Class => Tag::Class,
            TokenKind::Label => Tag::Label,
            TokenKind::Visible => Tag::Visible,
            TokenKind::Comment => Tag::Comment,
            TokenKind::Tooltip => Tag::Tooltip,
            _ => return None,
        };
        Some(tag)
    }

    /// Check if this token is structural punctuation
    pub fn is_punctuation(&self) -> bool {
        matches!(
            self,
            TokenKind::LAngle
                | TokenKind::RAngle
                | TokenKind::LBrace
                | TokenKind::RBrace
                | TokenKind::Period
        )
    }

    /// Check if this token carries a literal value
    pub fn is_literal(&self) -> bool {
        matches!(
            self,
            TokenKind::QuotedString | TokenKind::Integer | TokenKind::Float
        )
    }

    /// Check if this token is one of the reserved keywords
    pub fn is_keyword(&self) -> bool {
        !self.is_punctuation() && !self.is_literal()
    }

    /// Human readable name used in diagnostics
    pub fn describe(&self) -> String {
        match self {
            TokenKind::QuotedString => "quoted string".to_string(),
            TokenKind::Integer => "integer".to_string(),
            TokenKind::Float => "float".to_string(),
            other if other.is_punctuation() => format!("'{}'", other),
            other => format!("keyword '{}'", other),
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            TokenKind::LAngle => "<",
            TokenKind::RAngle => ">",
            TokenKind::LBrace => "{",
            TokenKind::RBrace => "}",
            TokenKind::Period => ".",
            TokenKind::XProtocol => "XProtocol",
            TokenKind::Name => "Name",
            TokenKind::Id => "ID",
            TokenKind::Userversion => "Userversion",
            TokenKind::EvaStringTable => "EVAStringTable",
            TokenKind::ParamCardLayout => "ParamCardLayout",
            TokenKind::Repr => "Repr",
            TokenKind::Control => "Control",
            TokenKind::Param => "Param",
            TokenKind::Pos => "Pos",
            TokenKind::Dependency => "Dependency",
            TokenKind::Dll => "Dll",
            TokenKind::Context => "Context",
            TokenKind::Visible => "Visible",
            TokenKind::ProtocolComposer => "ProtocolComposer",
            TokenKind::InFile => "InFile",
            TokenKind::ParamMap => "ParamMap",
            TokenKind::ParamString => "ParamString",
            TokenKind::ParamLong => "ParamLong",
            TokenKind::ParamBool => "ParamBool",
            TokenKind::ParamChoice => "ParamChoice",
            TokenKind::ParamDouble => "ParamDouble",
            TokenKind::ParamArray => "ParamArray",
            TokenKind::Pipe => "Pipe",
            TokenKind::PipeService => "PipeService",
            TokenKind::ParamFunctor => "ParamFunctor",
            TokenKind::Event => "Event",
            TokenKind::Method => "Method",
            TokenKind::Connection => "Connection",
            TokenKind::LimitRange => "LimitRange",
            TokenKind::Default => "Default",
            TokenKind::MinSize => "MinSize",
            TokenKind::MaxSize => "MaxSize",
            TokenKind::Limit => "Limit",
            TokenKind::Precision => "Precision",
            TokenKind::Unit => "Unit",
            TokenKind::Class => "Class",
            TokenKind::Label => "Label",
            TokenKind::Comment => "Comment",
            TokenKind::Tooltip => "Tooltip",
            TokenKind::QuotedString => "QUOTED_STRING",
            TokenKind::Float => "FLOAT",
            TokenKind::Integer => "INTEGER",
        };
        write!(f, "{}", text)
    }
}

/// A token with its raw source text and the 1-based line it starts on
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub line: usize,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, line: usize) -> Self {
        Self {
            kind,
            text: text.into(),
            line,
        }
    }

    /// The body of a quoted string without its enclosing quotes
    ///
    /// For any other kind the raw text is returned unchanged.
    pub fn unquoted(&self) -> &str {
        if self.kind == TokenKind::QuotedString && self.text.len() >= 2 {
            &self.text[1..self.text.len() - 1]
        } else {
            &self.text
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.kind.is_literal() {
            write!(f, "{} {}", self.kind, self.text)
        } else {
            write!(f, "{}", self.kind)
        }
    }
}
