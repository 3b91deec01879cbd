use std::fmt::Write;

/// Renderable output tree. Serialized to an HTML fragment for the webview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
    Fragment(Vec<Node>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: &'static str,
    pub attrs: Vec<(&'static str, String)>,
    pub children: Vec<Node>,
}

const VOID_TAGS: &[&str] = &["img", "br", "hr", "input"];

impl Element {
    pub fn new(tag: &'static str) -> Self {
        Self {
            tag,
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn attr(mut self, name: &'static str, value: impl Into<String>) -> Self {
        let value = value.into();
        match self.attrs.iter_mut().find(|(key, _)| *key == name) {
            Some((_, existing)) => *existing = value,
            None => self.attrs.push((name, value)),
        }
        self
    }

    /// Appends a class token to the `class` attribute.
    pub fn class(mut self, class: &str) -> Self {
        match self.attrs.iter_mut().find(|(key, _)| *key == "class") {
            Some((_, existing)) => {
                existing.push(' ');
                existing.push_str(class);
            }
            None => self.attrs.push(("class", class.to_string())),
        }
        self
    }

    pub fn child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = Node>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn text(self, text: impl Into<String>) -> Self {
        self.child(Node::Text(text.into()))
    }

    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.get_attr("class")
            .map(|classes| classes.split_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Node::Element(element)
    }
}

impl Node {
    pub fn text(text: impl Into<String>) -> Self {
        Node::Text(text.into())
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(element) => Some(element),
            _ => None,
        }
    }

    /// Concatenated text of this node and its descendants.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            Node::Text(text) => out.push_str(text),
            Node::Element(element) => {
                for child in &element.children {
                    child.collect_text(out);
                }
            }
            Node::Fragment(children) => {
                for child in children {
                    child.collect_text(out);
                }
            }
        }
    }

    /// All elements with the given tag, in document order.
    pub fn find_all(&self, tag: &str) -> Vec<&Element> {
        let mut found = Vec::new();
        self.collect_tag(tag, &mut found);
        found
    }

    fn collect_tag<'a>(&'a self, tag: &str, found: &mut Vec<&'a Element>) {
        let children = match self {
            Node::Text(_) => return,
            Node::Element(element) => {
                if element.tag == tag {
                    found.push(element);
                }
                &element.children
            }
            Node::Fragment(children) => children,
        };
        for child in children {
            child.collect_tag(tag, found);
        }
    }

    /// All elements carrying the given class, in document order.
    pub fn find_by_class(&self, class: &str) -> Vec<&Element> {
        let mut found = Vec::new();
        self.collect_class(class, &mut found);
        found
    }

    fn collect_class<'a>(&'a self, class: &str, found: &mut Vec<&'a Element>) {
        let children = match self {
            Node::Text(_) => return,
            Node::Element(element) => {
                if element.has_class(class) {
                    found.push(element);
                }
                &element.children
            }
            Node::Fragment(children) => children,
        };
        for child in children {
            child.collect_class(class, found);
        }
    }

    pub fn to_html(&self) -> String {
        let mut html = String::new();
        self.write_html(&mut html);
        html
    }

    fn write_html(&self, html: &mut String) {
        match self {
            Node::Text(text) => html.push_str(&html_escape(text)),
            Node::Fragment(children) => {
                for child in children {
                    child.write_html(html);
                }
            }
            Node::Element(element) => {
                html.push('<');
                html.push_str(element.tag);
                for (name, value) in &element.attrs {
                    let _ = write!(html, r#" {}="{}""#, name, html_escape(value));
                }
                html.push('>');

                if VOID_TAGS.contains(&element.tag) {
                    return;
                }

                for child in &element.children {
                    child.write_html(html);
                }
                let _ = write!(html, "</{}>", element.tag);
            }
        }
    }
}

pub fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_text_and_attributes() {
        let node: Node = Element::new("a")
            .attr("href", "https://x.test/?a=1&b=\"2\"")
            .text("<b>bold</b>")
            .into();

        assert_eq!(
            node.to_html(),
            r#"<a href="https://x.test/?a=1&amp;b=&quot;2&quot;">&lt;b&gt;bold&lt;/b&gt;</a>"#
        );
    }

    #[test]
    fn void_elements_have_no_closing_tag() {
        let node: Node = Element::new("div")
            .child(Element::new("img").attr("src", "u1"))
            .child(Element::new("br"))
            .into();

        assert_eq!(node.to_html(), r#"<div><img src="u1"><br></div>"#);
    }

    #[test]
    fn class_tokens_accumulate() {
        let element = Element::new("img").class("photo-thumb").class("is-last-viewed");

        assert_eq!(element.get_attr("class"), Some("photo-thumb is-last-viewed"));
        assert!(element.has_class("is-last-viewed"));
        assert!(!element.has_class("photo"));
    }

    #[test]
    fn queries_walk_fragments() {
        let node = Node::Fragment(vec![
            Element::new("p").text("one").into(),
            Node::Fragment(vec![Element::new("p").class("x").text("two").into()]),
        ]);

        assert_eq!(node.find_all("p").len(), 2);
        assert_eq!(node.find_by_class("x").len(), 1);
        assert_eq!(node.text_content(), "onetwo");
    }
}
