//! Document model for parsed XProtocol
//!
//! A [`Document`] owns its whole tree. The root record carries the fixed header fields
//! (`Name`, `ID`, `Userversion`), the EVA string table, the parameter-card layout, the
//! dependency and protocol-composer sections and the recursive [`Param`] tree.
//!
//! The model is produced once per parse and never mutated afterwards, so every type here
//! is plain data: `Clone`, `PartialEq` (two parses of the same text compare equal) and
//! `Serialize` for the output formats.

pub mod lookup;

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// The parse result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    pub name: String,
    pub id: i64,
    pub userversion: f64,
    pub eva_string_table: Vec<EvaStringEntry>,
    pub param_card_layout: ParamCardLayout,
    pub dependencies: BTreeMap<String, Dependency>,
    pub protocol_composers: BTreeMap<String, Vec<ComposerEntry>>,
    pub root_params: Vec<Param>,
}

/// One line of the EVA string table: an id with an optional string payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EvaStringEntry {
    pub id: i64,
    pub text: Option<String>,
}

/// The labelled UI layout section
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParamCardLayout {
    pub label: String,
    pub items: Vec<LayoutItem>,
}

/// A single line of the parameter-card layout, in textual order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum LayoutItem {
    /// A bare `<Repr> "text"` line
    ReprOnly(String),
    /// A `<Control> { <Param> "name" <Pos> x y [<Repr> "text"] }` block
    Control {
        param_name: String,
        pos: (i64, i64),
        repr: Option<String>,
    },
}

/// A named condition record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Dependency {
    pub string_list: Vec<String>,
    /// The single trailing attribute of the block, if any
    pub attribute: Option<DependencyAttribute>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum DependencyAttribute {
    /// `<Dll> "x"`, optionally followed by one or two `<Context>` strings
    Dll {
        dll: String,
        context: Option<DependencyContext>,
    },
    Context(String),
    Visible(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum DependencyContext {
    Single(String),
    Pair(String, String),
}

/// A file or DLL reference in a protocol composer, order-preserving
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ComposerEntry {
    InFile(String),
    Dll(String),
}

/// Container kinds, one per reserved container keyword
///
/// `Anonymous` stands for a bare `{ ... }` group with no keyword and no name, which the
/// exporter uses for array elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum ParamKind {
    Map,
    String,
    Long,
    Bool,
    Choice,
    Double,
    Array,
    Pipe,
    PipeService,
    Functor,
    Event,
    Method,
    Connection,
    Anonymous,
}

impl ParamKind {
    /// The keyword that opens this kind in source text (empty for anonymous groups)
    pub fn keyword(&self) -> &'static str {
        match self {
            ParamKind::Map => "ParamMap",
            ParamKind::String => "ParamString",
            ParamKind::Long => "ParamLong",
            ParamKind::Bool => "ParamBool",
            ParamKind::Choice => "ParamChoice",
            ParamKind::Double => "ParamDouble",
            ParamKind::Array => "ParamArray",
            ParamKind::Pipe => "Pipe",
            ParamKind::PipeService => "PipeService",
            ParamKind::Functor => "ParamFunctor",
            ParamKind::Event => "Event",
            ParamKind::Method => "Method",
            ParamKind::Connection => "Connection",
            ParamKind::Anonymous => "",
        }
    }

    /// Leaf kinds hold values rather than nested definitions
    pub fn is_leaf(&self) -> bool {
        matches!(
            self,
            ParamKind::String
                | ParamKind::Long
                | ParamKind::Bool
                | ParamKind::Choice
                | ParamKind::Double
                | ParamKind::Array
        )
    }
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamKind::Anonymous => write!(f, "{{}}"),
            other => write!(f, "{}", other.keyword()),
        }
    }
}

/// Attribute markers that bind to the literal immediately following them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Tag {
    Default,
    LimitRange,
    MinSize,
    MaxSize,
    Limit,
    Precision,
    Unit,
    Class,
    Label,
    Visible,
    Comment,
    Tooltip,
}

impl Tag {
    pub const ALL: [Tag; 12] = [
        Tag::Default,
        Tag::LimitRange,
        Tag::MinSize,
        Tag::MaxSize,
        Tag::Limit,
        Tag::Precision,
        Tag::Unit,
        Tag::Class,
        Tag::Label,
        Tag::Visible,
        Tag::Comment,
        Tag::Tooltip,
    ];

    pub fn keyword(&self) -> &'static str {
        match self {
            Tag::Default => "Default",
            Tag::LimitRange => "LimitRange",
            Tag::MinSize => "MinSize",
            Tag::MaxSize => "MaxSize",
            Tag::Limit => "Limit",
            Tag::Precision => "Precision",
            Tag::Unit => "Unit",
            Tag::Class => "Class",
            Tag::Label => "Label",
            Tag::Visible => "Visible",
            Tag::Comment => "Comment",
            Tag::Tooltip => "Tooltip",
        }
    }

    /// Look a tag up by its keyword text
    pub fn from_keyword(keyword: &str) -> Option<Tag> {
        Tag::ALL.into_iter().find(|tag| tag.keyword() == keyword)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.keyword())
    }
}

/// A literal, used both for untagged values and for attribute values
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Integer(i64),
    Float(f64),
    String(String),
    StringList(Vec<String>),
}

impl Value {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Floats and integers both read as `f64`
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(x) => Some(*x),
            Value::Integer(n) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_string_list(&self) -> Option<&[String]> {
        match self {
            Value::StringList(list) => Some(list),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(n) => write!(f, "{}", n),
            Value::Float(x) => write!(f, "{}", x),
            Value::String(s) => write!(f, "\"{}\"", s),
            Value::StringList(list) => {
                write!(f, "{{")?;
                for item in list {
                    write!(f, " \"{}\"", item)?;
                }
                write!(f, " }}")
            }
        }
    }
}

/// A named, typed, recursively nestable container
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Param {
    pub kind: ParamKind,
    pub name: String,
    /// The tag that introduced this param inside its parent (`<Default> <ParamLong."">{}`)
    pub tag: Option<Tag>,
    pub attributes: BTreeMap<Tag, Value>,
    /// Untagged literals, in document order
    pub values: Vec<Value>,
    /// Nested definitions, in document order. Names may repeat.
    pub children: Vec<Param>,
    /// 1-based line of the opening token
    pub line: usize,
}

impl Param {
    pub fn new(kind: ParamKind, name: impl Into<String>, line: usize) -> Self {
        Self {
            kind,
            name: name.into(),
            tag: None,
            attributes: BTreeMap::new(),
            values: Vec::new(),
            children: Vec::new(),
            line,
        }
    }

    pub fn anonymous(line: usize) -> Self {
        Self::new(ParamKind::Anonymous, "", line)
    }

    pub fn with_tag(mut self, tag: Option<Tag>) -> Self {
        self.tag = tag;
        self
    }

    pub fn is_anonymous(&self) -> bool {
        self.kind == ParamKind::Anonymous
    }
}

impl Drop for Param {
    /// Frees the subtree with a work-list so dropping a deep chain uses no stack
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut param) = pending.pop() {
            pending.append(&mut param.children);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_keywords_round_trip() {
        for tag in Tag::ALL {
            assert_eq!(Tag::from_keyword(tag.keyword()), Some(tag));
        }
        assert_eq!(Tag::from_keyword("Dll"), None);
    }

    #[test]
    fn test_value_accessors() {
        assert_eq!(Value::Integer(3).as_i64(), Some(3));
        assert_eq!(Value::Integer(3).as_f64(), Some(3.0));
        assert_eq!(Value::Float(2.5).as_i64(), None);
        assert_eq!(Value::String("Hz".into()).as_str(), Some("Hz"));
        let list = Value::StringList(vec!["a".into(), "b".into()]);
        assert_eq!(list.as_string_list().map(|l| l.len()), Some(2));
        assert_eq!(list.to_string(), "{ \"a\" \"b\" }");
    }

    #[test]
    fn test_value_serializes_untagged() {
        let json = serde_json::to_string(&vec![
            Value::Integer(5),
            Value::String("Hz".into()),
            Value::StringList(vec!["x".into()]),
        ])
        .unwrap();
        assert_eq!(json, r#"[5,"Hz",["x"]]"#);
    }

    #[test]
    fn test_param_kind_display() {
        assert_eq!(ParamKind::Functor.to_string(), "ParamFunctor");
        assert_eq!(ParamKind::Anonymous.to_string(), "{}");
        assert!(ParamKind::Long.is_leaf());
        assert!(!ParamKind::Map.is_leaf());
    }

    #[test]
    fn test_dropping_deep_chain() {
        let mut root = Param::new(ParamKind::Map, "m", 1);
        for _ in 0..200_000 {
            let mut parent = Param::new(ParamKind::Map, "m", 1);
            parent.children.push(root);
            root = parent;
        }
        drop(root);
    }
}
