//! Output renderers for token streams and documents

pub mod treeviz;

use crate::xprot::ast::Document;
use crate::xprot::token::Token;

pub use treeviz::to_treeviz_str;

/// One `line kind [text]` row per token
pub fn tokens_to_simple(tokens: &[Token]) -> String {
    let mut result = String::new();
    for token in tokens {
        result.push_str(&format!("{:>5} {}\n", token.line, token));
    }
    result
}

pub fn tokens_to_json(tokens: &[Token]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(tokens)
}

pub fn document_to_json(doc: &Document) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(doc)
}

pub fn document_to_yaml(doc: &Document) -> Result<String, serde_yaml::Error> {
    serde_yaml::to_string(doc)
}
