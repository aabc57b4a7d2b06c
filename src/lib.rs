//! # xprot
//!
//! A parser for XProtocol, the nested text protocol format emitted by MRI scanners to
//! describe acquisition parameters, pipeline configuration and UI layout.
//!
//! Data flows one way: text -> [tokens](xprot::lexing::tokenize) ->
//! [document tree](xprot::parsing::parse). The resulting [`Document`] is immutable and
//! exposes lookups by parameter name or dotted path.

pub mod xprot;

pub use xprot::ast::{Document, Param, ParamKind, Tag, Value};
pub use xprot::lexing::tokenize;
pub use xprot::parsing::{parse, parse_document, ParseError};
