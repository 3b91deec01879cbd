use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag};
use std::collections::{BTreeMap, HashMap};
use std::panic::{self, AssertUnwindSafe};
use thiserror::Error;

use super::link_service::sanitize_href;
use crate::models::{Element, Node};

/// Deeper nesting is flattened into the enclosing node.
const MAX_NESTING: usize = 64;

pub const LINK_MISSING_TEXT: &str = "[link missing]";
pub const DEFAULT_CTA_LABEL: &str = "Open";

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("markdown rendering panicked: {0}")]
    Panicked(String),
}

/// Kind tag of a parsed markdown node. Keys the override table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Document,
    Paragraph,
    Heading,
    BlockQuote,
    CodeBlock,
    List,
    ListItem,
    Table,
    TableHead,
    TableRow,
    TableCell,
    Emphasis,
    Strong,
    Strikethrough,
    Link,
    Image,
    Text,
    Code,
    Html,
    SoftBreak,
    HardBreak,
    Rule,
    TaskMarker,
    Other,
}

pub type Attrs = BTreeMap<&'static str, String>;

/// Intermediate markdown tree built from pulldown-cmark events.
#[derive(Debug, Clone, PartialEq)]
pub struct MdNode {
    pub kind: NodeKind,
    pub attrs: Attrs,
    pub children: Vec<MdNode>,
}

impl MdNode {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            attrs: Attrs::new(),
            children: Vec::new(),
        }
    }

    fn leaf(kind: NodeKind, literal: impl Into<String>) -> Self {
        let mut node = Self::new(kind);
        node.attrs.insert("literal", literal.into());
        node
    }

    fn with_attr(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.attrs.insert(key, value.into());
        self
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).map(String::as_str)
    }

    pub fn literal(&self) -> &str {
        self.attr("literal").unwrap_or_default()
    }

    fn flag(&self, key: &str) -> bool {
        self.attr(key) == Some("true")
    }
}

/// Renders one node from its attributes and already-rendered children.
pub type RenderFn = fn(&MdNode, Vec<Node>) -> Node;

/// Node-kind dispatch table with a mandatory fallback.
#[derive(Clone)]
pub struct OverrideTable {
    entries: HashMap<NodeKind, RenderFn>,
    fallback: RenderFn,
}

impl OverrideTable {
    pub fn new(fallback: RenderFn) -> Self {
        Self {
            entries: HashMap::new(),
            fallback,
        }
    }

    pub fn with(mut self, kind: NodeKind, render: RenderFn) -> Self {
        self.entries.insert(kind, render);
        self
    }

    pub fn get(&self, kind: NodeKind) -> RenderFn {
        self.entries.get(&kind).copied().unwrap_or(self.fallback)
    }

    /// The overrides used for bot replies.
    pub fn chat() -> Self {
        Self::new(render_default)
            .with(NodeKind::Link, render_cta_link)
            .with(NodeKind::Paragraph, render_block)
            .with(NodeKind::List, render_list_block)
            .with(NodeKind::ListItem, render_list_item)
            .with(NodeKind::Table, render_grid)
            .with(NodeKind::TableHead, render_grid_head)
            .with(NodeKind::TableRow, render_grid_row)
            .with(NodeKind::TableCell, render_grid_cell)
    }
}

impl Default for OverrideTable {
    fn default() -> Self {
        Self::chat()
    }
}

fn markdown_options() -> Options {
    Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS
}

/// Parses markdown into an [`MdNode`] tree rooted at a `Document` node.
///
/// Never fails: pulldown-cmark accepts any input, and unbalanced or overly
/// deep structure is folded back into the nearest open node.
pub fn parse_markdown(source: &str) -> MdNode {
    let mut stack: Vec<MdNode> = vec![MdNode::new(NodeKind::Document)];
    let mut suppressed = 0usize;

    for event in Parser::new_ext(source, markdown_options()) {
        match event {
            Event::Start(tag) => {
                if stack.len() > MAX_NESTING {
                    suppressed += 1;
                    continue;
                }
                let in_head = stack.last().map(|n| n.kind) == Some(NodeKind::TableHead);
                stack.push(open_tag(tag, in_head));
            }
            Event::End(_) => {
                if suppressed > 0 {
                    suppressed -= 1;
                    continue;
                }
                close_top(&mut stack);
            }
            Event::Text(text) => push_leaf(&mut stack, MdNode::leaf(NodeKind::Text, text.to_string())),
            Event::Code(code) => push_leaf(&mut stack, MdNode::leaf(NodeKind::Code, code.to_string())),
            Event::Html(html) | Event::InlineHtml(html) => {
                push_leaf(&mut stack, MdNode::leaf(NodeKind::Html, html.to_string()))
            }
            Event::FootnoteReference(label) => {
                push_leaf(&mut stack, MdNode::leaf(NodeKind::Text, format!("[{}]", label)))
            }
            Event::SoftBreak => push_leaf(&mut stack, MdNode::new(NodeKind::SoftBreak)),
            Event::HardBreak => push_leaf(&mut stack, MdNode::new(NodeKind::HardBreak)),
            Event::Rule => push_leaf(&mut stack, MdNode::new(NodeKind::Rule)),
            Event::TaskListMarker(checked) => push_leaf(
                &mut stack,
                MdNode::new(NodeKind::TaskMarker).with_attr("checked", checked.to_string()),
            ),
            _ => {}
        }
    }

    while stack.len() > 1 {
        close_top(&mut stack);
    }
    stack
        .pop()
        .unwrap_or_else(|| MdNode::new(NodeKind::Document))
}

fn open_tag(tag: Tag<'_>, in_table_head: bool) -> MdNode {
    match tag {
        Tag::Paragraph => MdNode::new(NodeKind::Paragraph),
        Tag::Heading { level, .. } => {
            MdNode::new(NodeKind::Heading).with_attr("level", (level as u8).to_string())
        }
        Tag::BlockQuote(_) => MdNode::new(NodeKind::BlockQuote),
        Tag::CodeBlock(kind) => {
            let node = MdNode::new(NodeKind::CodeBlock);
            match kind {
                CodeBlockKind::Fenced(info) => match info.split_whitespace().next() {
                    Some(lang) => node.with_attr("lang", lang),
                    None => node,
                },
                CodeBlockKind::Indented => node,
            }
        }
        Tag::List(start) => {
            let node = MdNode::new(NodeKind::List).with_attr("ordered", start.is_some().to_string());
            match start {
                Some(start) => node.with_attr("start", start.to_string()),
                None => node,
            }
        }
        Tag::Item => MdNode::new(NodeKind::ListItem),
        Tag::Table(_) => MdNode::new(NodeKind::Table),
        Tag::TableHead => MdNode::new(NodeKind::TableHead),
        Tag::TableRow => MdNode::new(NodeKind::TableRow),
        Tag::TableCell => {
            MdNode::new(NodeKind::TableCell).with_attr("header", in_table_head.to_string())
        }
        Tag::Emphasis => MdNode::new(NodeKind::Emphasis),
        Tag::Strong => MdNode::new(NodeKind::Strong),
        Tag::Strikethrough => MdNode::new(NodeKind::Strikethrough),
        Tag::Link { dest_url, title, .. } => {
            let node = MdNode::new(NodeKind::Link).with_attr("href", dest_url.to_string());
            if title.is_empty() {
                node
            } else {
                node.with_attr("title", title.to_string())
            }
        }
        Tag::Image { dest_url, .. } => {
            MdNode::new(NodeKind::Image).with_attr("src", dest_url.to_string())
        }
        _ => MdNode::new(NodeKind::Other),
    }
}

fn push_leaf(stack: &mut [MdNode], leaf: MdNode) {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(leaf);
    }
}

fn close_top(stack: &mut Vec<MdNode>) {
    // The document root is never closed by an event.
    if stack.len() < 2 {
        return;
    }
    if let Some(node) = stack.pop() {
        push_leaf(stack, node);
    }
}

/// Markdown renderer driven by an [`OverrideTable`].
#[derive(Clone, Default)]
pub struct MarkdownRenderer {
    table: OverrideTable,
}

impl MarkdownRenderer {
    pub fn new(table: OverrideTable) -> Self {
        Self { table }
    }

    pub fn render(&self, source: &str) -> Node {
        self.render_tree(&parse_markdown(source))
    }

    pub fn render_tree(&self, node: &MdNode) -> Node {
        let children = node
            .children
            .iter()
            .map(|child| self.render_tree(child))
            .collect();
        (self.table.get(node.kind))(node, children)
    }

    /// Renders behind an unwind boundary so a faulty override cannot take
    /// down the caller.
    pub fn render_isolated(&self, source: &str) -> Result<Node, RenderError> {
        panic::catch_unwind(AssertUnwindSafe(|| self.render(source))).map_err(|payload| {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            tracing::error!("Markdown rendering failed: {}", message);
            RenderError::Panicked(message)
        })
    }
}

/// Link as a call-to-action control, or an inert placeholder when the href
/// is missing or unsafe.
pub fn render_cta_link(node: &MdNode, children: Vec<Node>) -> Node {
    let Some(href) = node.attr("href").and_then(sanitize_href) else {
        return Element::new("span")
            .class("link-missing")
            .text(LINK_MISSING_TEXT)
            .into();
    };

    let label = Node::Fragment(children);
    let label = if label.text_content().trim().is_empty() {
        Node::text(DEFAULT_CTA_LABEL)
    } else {
        label
    };

    let mut link = Element::new("a")
        .class("cta-button")
        .attr("role", "button")
        .attr("href", href)
        .attr("target", "_blank")
        .attr("rel", "noopener noreferrer");
    if let Some(title) = node.attr("title") {
        link = link.attr("title", title);
    }
    link.child(label).into()
}

pub fn render_block(_node: &MdNode, children: Vec<Node>) -> Node {
    Element::new("div").class("md-block").children(children).into()
}

pub fn render_list_block(_node: &MdNode, children: Vec<Node>) -> Node {
    Element::new("div").class("md-list").children(children).into()
}

pub fn render_list_item(_node: &MdNode, children: Vec<Node>) -> Node {
    Element::new("div").class("md-list-item").children(children).into()
}

pub fn render_grid(_node: &MdNode, children: Vec<Node>) -> Node {
    Element::new("table").class("md-table").children(children).into()
}

pub fn render_grid_head(_node: &MdNode, children: Vec<Node>) -> Node {
    Element::new("thead")
        .child(Element::new("tr").children(children))
        .into()
}

pub fn render_grid_row(_node: &MdNode, children: Vec<Node>) -> Node {
    Element::new("tr").children(children).into()
}

pub fn render_grid_cell(node: &MdNode, children: Vec<Node>) -> Node {
    if node.flag("header") {
        Element::new("th").class("md-cell-head").children(children).into()
    } else {
        Element::new("td").class("md-cell").children(children).into()
    }
}

/// Plain HTML for every node kind.
pub fn render_default(node: &MdNode, children: Vec<Node>) -> Node {
    let element = match node.kind {
        NodeKind::Document | NodeKind::Other => return Node::Fragment(children),
        NodeKind::Text | NodeKind::Html => return Node::text(node.literal()),
        NodeKind::SoftBreak => return Node::text(" "),
        NodeKind::Code => Element::new("code").text(node.literal()),
        NodeKind::HardBreak => Element::new("br"),
        NodeKind::Rule => Element::new("hr"),
        NodeKind::Paragraph => Element::new("p"),
        NodeKind::Heading => Element::new(heading_tag(node.attr("level"))),
        NodeKind::BlockQuote => Element::new("blockquote"),
        NodeKind::CodeBlock => {
            let lang = node.attr("lang").unwrap_or("plaintext");
            let code = Element::new("code")
                .attr("class", format!("language-{}", lang))
                .children(children);
            return Element::new("pre").child(code).into();
        }
        NodeKind::List => {
            if node.flag("ordered") {
                let list = Element::new("ol");
                match node.attr("start").filter(|start| *start != "1") {
                    Some(start) => list.attr("start", start),
                    None => list,
                }
            } else {
                Element::new("ul")
            }
        }
        NodeKind::ListItem => Element::new("li"),
        NodeKind::Table => Element::new("table"),
        NodeKind::TableHead => {
            return Element::new("thead")
                .child(Element::new("tr").children(children))
                .into()
        }
        NodeKind::TableRow => Element::new("tr"),
        NodeKind::TableCell => Element::new(if node.flag("header") { "th" } else { "td" }),
        NodeKind::Emphasis => Element::new("em"),
        NodeKind::Strong => Element::new("strong"),
        NodeKind::Strikethrough => Element::new("del"),
        NodeKind::Link => match node.attr("href").and_then(sanitize_href) {
            Some(href) => Element::new("a")
                .attr("href", href)
                .attr("target", "_blank")
                .attr("rel", "noopener noreferrer"),
            None => return Node::Fragment(children),
        },
        NodeKind::Image => {
            let alt = Node::Fragment(children).text_content();
            return match node.attr("src").and_then(sanitize_href) {
                Some(src) => Element::new("img")
                    .attr("src", src)
                    .attr("alt", alt)
                    .attr("loading", "lazy")
                    .into(),
                None => Node::text(alt),
            };
        }
        NodeKind::TaskMarker => {
            let checkbox = Element::new("input")
                .attr("type", "checkbox")
                .attr("disabled", "disabled");
            return if node.flag("checked") {
                checkbox.attr("checked", "checked").into()
            } else {
                checkbox.into()
            };
        }
    };

    element.children(children).into()
}

fn heading_tag(level: Option<&str>) -> &'static str {
    match level {
        Some("1") => "h1",
        Some("2") => "h2",
        Some("3") => "h3",
        Some("4") => "h4",
        Some("5") => "h5",
        _ => "h6",
    }
}
