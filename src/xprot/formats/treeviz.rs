//! Treeviz formatter for parsed documents
//!
//! Treeviz is a one line per node view of the document tree, handy for eyeballing large
//! scanner exports. Nesting is drawn with box connectors and each line is
//! `<icon> <kind>: <label>`, with the label truncated to the configured width.
//!
//! Example:
//!
//!     ⧉ XProtocol: PhoenixMetaProt (ID 1000002, Userversion 2)
//!     ├─ ◫ EVAStringTable: 2 entries
//!     ├─ § ParamMap: MEAS
//!     │ └─ • ParamLong: lBaseResolution = 256 [Unit "mm"]
//!     ├─ ☰ ParamCardLayout: Inline Compose
//!     │ └─ ▸ Control: MultiStep.IsInlineCompose @ (10, 5)
//!     └─ ⊕ ProtocolComposer: Inline_Composing
//!       └─ ¶ InFile: a.evp
//!
//! Icons
//!     Document: ⧉
//!     EVAStringTable: ◫
//!     ParamMap and other containers: §
//!     Leaf params (String/Long/Bool/Choice/Double/Array): •
//!     Anonymous group: ∘
//!     ParamCardLayout: ☰
//!     Repr line, composer entry: ¶
//!     Control: ▸
//!     Dependency: ≔
//!     ProtocolComposer: ⊕

use crate::xprot::ast::{
    ComposerEntry, Dependency, DependencyAttribute, DependencyContext, Document, LayoutItem,
    Param, Value,
};
use crate::xprot::config::TreevizConfig;

/// A rendered node: the text for one line plus its children
struct Node {
    icon: &'static str,
    kind: String,
    label: String,
    children: Vec<Node>,
}

impl Node {
    fn new(icon: &'static str, kind: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            icon,
            kind: kind.into(),
            label: label.into(),
            children: Vec::new(),
        }
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() > max_chars {
        let mut truncated = s.chars().take(max_chars).collect::<String>();
        truncated.push_str("...");
        truncated
    } else {
        s.to_string()
    }
}

pub fn to_treeviz_str(doc: &Document, config: &TreevizConfig) -> String {
    let root = document_node(doc, config);
    let mut result = format!("{} {}: {}\n", root.icon, root.kind, root.label);
    append_children(&mut result, &root.children, "", config);
    result
}

fn append_node(
    result: &mut String,
    node: &Node,
    prefix: &str,
    is_last: bool,
    config: &TreevizConfig,
) {
    let connector = if is_last { "└─" } else { "├─" };
    let display_label = truncate(&node.label, config.max_label_width);

    result.push_str(&format!(
        "{}{} {} {}: {}\n",
        prefix, connector, node.icon, node.kind, display_label
    ));

    let new_prefix = format!("{}{}", prefix, if is_last { "  " } else { "│ " });
    append_children(result, &node.children, &new_prefix, config);
}

fn append_children(
    result: &mut String,
    children: &[Node],
    prefix: &str,
    config: &TreevizConfig,
) {
    for (i, child) in children.iter().enumerate() {
        let is_last = i == children.len() - 1;
        append_node(result, child, prefix, is_last, config);
    }
}

fn document_node(doc: &Document, config: &TreevizConfig) -> Node {
    let mut root = Node::new(
        "⧉",
        "XProtocol",
        format!(
            "{} (ID {}, Userversion {})",
            doc.name, doc.id, doc.userversion
        ),
    );

    root.children.push(Node::new(
        "◫",
        "EVAStringTable",
        format!("{} entries", doc.eva_string_table.len()),
    ));

    root.children
        .extend(doc.root_params.iter().map(|param| param_node(param, config)));

    let mut layout = Node::new("☰", "ParamCardLayout", doc.param_card_layout.label.clone());
    layout
        .children
        .extend(doc.param_card_layout.items.iter().map(layout_node));
    root.children.push(layout);

    root.children.extend(
        doc.dependencies
            .iter()
            .map(|(label, dependency)| dependency_node(label, dependency)),
    );

    for (label, entries) in &doc.protocol_composers {
        let mut composer = Node::new("⊕", "ProtocolComposer", label.clone());
        composer.children.extend(entries.iter().map(|entry| match entry {
            ComposerEntry::InFile(file) => Node::new("¶", "InFile", file.clone()),
            ComposerEntry::Dll(dll) => Node::new("¶", "Dll", dll.clone()),
        }));
        root.children.push(composer);
    }

    root
}

fn param_node(param: &Param, config: &TreevizConfig) -> Node {
    let icon = if param.is_anonymous() {
        "∘"
    } else if param.kind.is_leaf() {
        "•"
    } else {
        "§"
    };

    let mut kind = param.kind.to_string();
    if let Some(tag) = param.tag {
        kind = format!("<{}> {}", tag, kind);
    }

    let mut label = param.name.clone();
    if config.show_values {
        if !param.values.is_empty() {
            let values: Vec<String> = param.values.iter().map(Value::to_string).collect();
            label.push_str(&format!(" = {}", values.join(" ")));
        }
        if !param.attributes.is_empty() {
            let attributes: Vec<String> = param
                .attributes
                .iter()
                .map(|(tag, value)| format!("{} {}", tag, value))
                .collect();
            label.push_str(&format!(" [{}]", attributes.join(", ")));
        }
    }

    let mut node = Node::new(icon, kind, label.trim_start().to_string());
    node.children
        .extend(param.children.iter().map(|child| param_node(child, config)));
    node
}

fn layout_node(item: &LayoutItem) -> Node {
    match item {
        LayoutItem::ReprOnly(repr) => Node::new("¶", "Repr", repr.clone()),
        LayoutItem::Control {
            param_name,
            pos,
            repr,
        } => {
            let mut label = format!("{} @ ({}, {})", param_name, pos.0, pos.1);
            if let Some(repr) = repr {
                label.push_str(&format!(" \"{}\"", repr));
            }
            Node::new("▸", "Control", label)
        }
    }
}

fn dependency_node(label: &str, dependency: &Dependency) -> Node {
    let mut text = label.to_string();
    if !dependency.string_list.is_empty() {
        text.push_str(&format!(" ({} conditions)", dependency.string_list.len()));
    }
    match &dependency.attribute {
        Some(DependencyAttribute::Dll { dll, context }) => {
            text.push_str(&format!(" Dll {}", dll));
            match context {
                Some(DependencyContext::Single(c)) => text.push_str(&format!(" Context {}", c)),
                Some(DependencyContext::Pair(a, b)) => {
                    text.push_str(&format!(" Context {} {}", a, b))
                }
                None => {}
            }
        }
        Some(DependencyAttribute::Context(context)) => {
            text.push_str(&format!(" Context {}", context))
        }
        Some(DependencyAttribute::Visible(visible)) => {
            text.push_str(&format!(" Visible {}", visible))
        }
        None => {}
    }
    Node::new("≔", "Dependency", text)
}
