//! Lookups over a parsed document
//!
//! Downstream code (scan-parameter extraction, header filling) treats the tree as a
//! key/value store: find a param by name or by a dotted path such as
//! `sKSpace.lBaseResolution`, then read its values or one of its attributes.
//!
//! Traversal is depth-first pre-order with an explicit stack, so lookups work on trees of
//! any depth.

use std::slice;

use super::{Document, Param, Tag, Value};

/// Pre-order walk over a forest of params
pub struct Walk<'a> {
    stack: Vec<slice::Iter<'a, Param>>,
}

impl<'a> Walk<'a> {
    fn new(roots: &'a [Param]) -> Self {
        Self {
            stack: vec![roots.iter()],
        }
    }
}

impl<'a> Iterator for Walk<'a> {
    type Item = &'a Param;

    fn next(&mut self) -> Option<&'a Param> {
        loop {
            let top = self.stack.last_mut()?;
            match top.next() {
                Some(param) => {
                    self.stack.push(param.children.iter());
                    return Some(param);
                }
                None => {
                    self.stack.pop();
                }
            }
        }
    }
}

impl Document {
    /// Every param in the document, depth-first in textual order
    pub fn walk(&self) -> Walk<'_> {
        Walk::new(&self.root_params)
    }

    /// First param with the given name, searching the whole tree
    pub fn find_param(&self, name: &str) -> Option<&Param> {
        self.walk().find(|param| param.name == name)
    }

    /// All params with the given name, in textual order
    pub fn find_params(&self, name: &str) -> Vec<&Param> {
        self.walk().filter(|param| param.name == name).collect()
    }

    /// Resolve a dotted path such as `sKSpace.lBaseResolution`
    ///
    /// The first segment may be anywhere in the tree. Each following segment must name a
    /// direct child of the previous one. When the first segment matches several params,
    /// the first one that resolves the whole path wins.
    pub fn find_path(&self, path: &str) -> Option<&Param> {
        let mut segments = path.split('.');
        let first = segments.next()?;
        let rest: Vec<&str> = segments.collect();

        self.walk()
            .filter(|param| param.name == first)
            .find_map(|start| {
                rest.iter()
                    .try_fold(start, |current, segment| current.child(segment))
            })
    }
}

impl Param {
    /// The attribute stored under `tag`, if one was written
    pub fn attribute(&self, tag: Tag) -> Option<&Value> {
        self.attributes.get(&tag)
    }

    /// First direct child with the given name
    pub fn child(&self, name: &str) -> Option<&Param> {
        self.children.iter().find(|child| child.name == name)
    }

    /// First direct child that was introduced by `tag`
    pub fn tagged_child(&self, tag: Tag) -> Option<&Param> {
        self.children.iter().find(|child| child.tag == Some(tag))
    }

    /// All params nested below this one, depth-first
    pub fn descendants(&self) -> Walk<'_> {
        Walk::new(&self.children)
    }

    /// First descendant with the given name
    pub fn find(&self, name: &str) -> Option<&Param> {
        self.descendants().find(|param| param.name == name)
    }

    /// Untagged values as text, with string lists flattened
    pub fn value_strings(&self) -> Vec<String> {
        let mut strings = Vec::with_capacity(self.values.len());
        for value in &self.values {
            match value {
                Value::Integer(n) => strings.push(n.to_string()),
                Value::Float(x) => strings.push(x.to_string()),
                Value::String(s) => strings.push(s.clone()),
                Value::StringList(list) => strings.extend(list.iter().cloned()),
            }
        }
        strings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xprot::ast::{ParamCardLayout, ParamKind};
    use std::collections::BTreeMap;

    fn leaf(kind: ParamKind, name: &str, values: Vec<Value>) -> Param {
        let mut param = Param::new(kind, name, 1);
        param.values = values;
        param
    }

    fn map(name: &str, children: Vec<Param>) -> Param {
        let mut param = Param::new(ParamKind::Map, name, 1);
        param.children = children;
        param
    }

    fn document(root_params: Vec<Param>) -> Document {
        Document {
            name: "test".into(),
            id: 1,
            userversion: 1.0,
            eva_string_table: vec![],
            param_card_layout: ParamCardLayout::default(),
            dependencies: BTreeMap::new(),
            protocol_composers: BTreeMap::new(),
            root_params,
        }
    }

    fn sample() -> Document {
        document(vec![map(
            "MEAS",
            vec![
                map(
                    "sKSpace",
                    vec![leaf(
                        ParamKind::Long,
                        "lBaseResolution",
                        vec![Value::Integer(256)],
                    )],
                ),
                leaf(ParamKind::Long, "lBaseResolution", vec![Value::Integer(128)]),
                map(
                    "sTXSPEC",
                    vec![leaf(ParamKind::String, "ucMode", vec![Value::String("x".into())])],
                ),
            ],
        )])
    }

    #[test]
    fn test_walk_is_preorder() {
        let doc = sample();
        let names: Vec<&str> = doc.walk().map(|p| p.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "MEAS",
                "sKSpace",
                "lBaseResolution",
                "lBaseResolution",
                "sTXSPEC",
                "ucMode"
            ]
        );
    }

    #[test]
    fn test_find_first_and_all() {
        let doc = sample();
        let first = doc.find_param("lBaseResolution").unwrap();
        assert_eq!(first.values, vec![Value::Integer(256)]);
        assert_eq!(doc.find_params("lBaseResolution").len(), 2);
        assert!(doc.find_param("missing").is_none());
        assert!(doc.find_params("missing").is_empty());
    }

    #[test]
    fn test_find_path() {
        let doc = sample();
        let param = doc.find_path("MEAS.lBaseResolution").unwrap();
        assert_eq!(param.values, vec![Value::Integer(128)]);
        let param = doc.find_path("sKSpace.lBaseResolution").unwrap();
        assert_eq!(param.values, vec![Value::Integer(256)]);
        assert_eq!(doc.find_path("sTXSPEC").unwrap().name, "sTXSPEC");
        assert!(doc.find_path("MEAS.ucMode").is_none());
    }

    #[test]
    fn test_find_path_tries_every_start() {
        let doc = document(vec![
            map("sAdjData", vec![]),
            map("sAdjData", vec![leaf(ParamKind::Bool, "bValid", vec![])]),
        ]);
        assert!(doc.find_path("sAdjData.bValid").is_some());
    }

    #[test]
    fn test_attribute_and_tagged_child() {
        let mut param = leaf(ParamKind::Double, "flFrequency", vec![Value::Float(1.5)]);
        param
            .attributes
            .insert(Tag::Unit, Value::String("Hz".into()));
        param
            .children
            .push(Param::new(ParamKind::Long, "", 2).with_tag(Some(Tag::Default)));
        assert_eq!(
            param.attribute(Tag::Unit).and_then(Value::as_str),
            Some("Hz")
        );
        assert!(param.attribute(Tag::Precision).is_none());
        assert_eq!(
            param.tagged_child(Tag::Default).map(|c| c.kind),
            Some(ParamKind::Long)
        );
    }

    #[test]
    fn test_value_strings() {
        let param = leaf(
            ParamKind::Array,
            "alFree",
            vec![
                Value::Integer(3),
                Value::Float(0.5),
                Value::String("x".into()),
                Value::StringList(vec!["a".into(), "b".into()]),
            ],
        );
        assert_eq!(param.value_strings(), vec!["3", "0.5", "x", "a", "b"]);
    }

    #[test]
    fn test_param_find_is_scoped() {
        let doc = sample();
        let meas = doc.find_param("MEAS").unwrap();
        let sks = meas.child("sKSpace").unwrap();
        assert!(sks.find("ucMode").is_none());
        assert!(meas.find("ucMode").is_some());
    }
}
