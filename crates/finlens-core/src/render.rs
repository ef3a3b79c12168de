//! Shape-driven rendering of arbitrary JSON into a nested view tree.

use std::sync::OnceLock;

use regex::Captures;
use regex::Regex;
use serde_json::Value;

static WORD_START: OnceLock<Regex> = OnceLock::new();

fn word_start() -> &'static Regex {
    WORD_START.get_or_init(|| Regex::new(r"\b\w").expect("static word-start pattern"))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewNode {
    Text(String),
    List(Vec<ViewNode>),
    Sections(Vec<Section>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub label: String,
    pub body: ViewNode,
}

/// One display row produced by [`ViewNode::lines`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewLine {
    pub depth: usize,
    pub bullet: bool,
    pub label: Option<String>,
    pub text: String,
}

impl ViewLine {
    fn text(depth: usize, text: &str) -> Self {
        Self {
            depth,
            bullet: false,
            label: None,
            text: text.to_string(),
        }
    }

    fn label(depth: usize, label: &str, text: &str) -> Self {
        Self {
            depth,
            bullet: false,
            label: Some(label.to_string()),
            text: text.to_string(),
        }
    }
}

/// `snake_case` / `lower case` keys to `Title Case`.
pub fn format_title(key: &str) -> String {
    let spaced = key.replace('_', " ");
    word_start()
        .replace_all(&spaced, |caps: &Captures<'_>| caps[0].to_uppercase())
        .into_owned()
}

pub fn render(value: &Value) -> ViewNode {
    match value {
        Value::Null => ViewNode::Text(String::new()),
        Value::Bool(flag) => ViewNode::Text(flag.to_string()),
        Value::Number(number) => ViewNode::Text(number.to_string()),
        Value::String(text) => ViewNode::Text(text.clone()),
        Value::Array(items) => ViewNode::List(items.iter().map(render).collect()),
        Value::Object(map) => ViewNode::Sections(
            map.iter()
                .map(|(key, value)| Section {
                    label: format_title(key),
                    body: render(value),
                })
                .collect(),
        ),
    }
}

/// Renders a value that may be absent altogether; absence is empty text.
pub fn render_optional(value: Option<&Value>) -> ViewNode {
    value.map_or_else(|| ViewNode::Text(String::new()), render)
}

impl ViewNode {
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(text) => text.is_empty(),
            Self::List(items) => items.is_empty(),
            Self::Sections(sections) => sections.is_empty(),
        }
    }

    pub fn leaf_count(&self) -> usize {
        match self {
            Self::Text(_) => 1,
            Self::List(items) => items.iter().map(Self::leaf_count).sum(),
            Self::Sections(sections) => sections.iter().map(|s| s.body.leaf_count()).sum(),
        }
    }

    pub fn lines(&self) -> Vec<ViewLine> {
        let mut out = Vec::new();
        self.push_lines(0, &mut out);
        out
    }

    fn push_lines(&self, depth: usize, out: &mut Vec<ViewLine>) {
        match self {
            Self::Text(text) => out.push(ViewLine::text(depth, text)),
            Self::List(items) => {
                for item in items {
                    let start = out.len();
                    match item {
                        Self::Text(text) => out.push(ViewLine::text(depth, text)),
                        nested => nested.push_lines(depth + 1, out),
                    }
                    // An empty nested container still occupies one bullet row.
                    if out.len() == start {
                        out.push(ViewLine::text(depth, ""));
                    }
                    out[start].bullet = true;
                }
            }
            Self::Sections(sections) => {
                for section in sections {
                    match &section.body {
                        Self::Text(text) => out.push(ViewLine::label(depth, &section.label, text)),
                        nested => {
                            out.push(ViewLine::label(depth, &section.label, ""));
                            nested.push_lines(depth + 1, out);
                        }
                    }
                }
            }
        }
    }
}

pub fn to_plain_text(node: &ViewNode) -> String {
    let mut out = String::new();
    for line in node.lines() {
        out.push_str(&"  ".repeat(line.depth));
        if line.bullet {
            out.push_str("- ");
        }
        match (&line.label, line.text.is_empty()) {
            (Some(label), true) => {
                out.push_str(label);
                out.push(':');
            }
            (Some(label), false) => {
                out.push_str(label);
                out.push_str(": ");
                out.push_str(&line.text);
            }
            (None, _) => out.push_str(&line.text),
        }
        out.push('\n');
    }
    out
}
