//! An owned, editable SVG element tree.
//!
//! Documents are parsed with [`roxmltree`], which is read-only, and copied
//! into [`Element`]s. Namespaced names are kept in their prefixed form
//! (`xlink:href`), and namespace declarations are carried as ordinary
//! `xmlns` attributes on the element that declared them.

use std::{collections::HashMap, sync::LazyLock};

use regex::Regex;
use roxmltree::{Document, Node, ParsingOptions};

use crate::Error;

pub const SVG_NS: &str = "http://www.w3.org/2000/svg";
pub const XLINK_NS: &str = "http://www.w3.org/1999/xlink";
const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

static URL_REFERENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"url\(\s*#([^)\s]+)\s*\)").unwrap());

#[derive(Clone, Debug, PartialEq)]
pub enum Child {
    Element(Element),
    Text(String),
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Element {
    pub name: String,
    attributes: Vec<(String, String)>,
    pub children: Vec<Child>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Element {
            name: name.into(),
            ..Default::default()
        }
    }

    /// An empty `<svg>` root declaring the SVG and xlink namespaces.
    pub fn svg_root() -> Self {
        Element::new("svg")
            .with_attr("xmlns", SVG_NS)
            .with_attr("xmlns:xlink", XLINK_NS)
            .with_attr("version", "1.1")
    }

    /// Parse a document, returning its root element.
    pub fn parse(text: &str) -> Result<Self, Error> {
        let options = ParsingOptions {
            allow_dtd: true,
            ..Default::default()
        };
        let doc = Document::parse_with_options(text, options)?;
        Ok(copy_element(doc.root_element(), None))
    }

    pub fn with_attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(Child::Element(child));
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.attributes
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    /// Set an attribute, keeping its position if it already exists.
    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attributes.iter_mut().find(|(key, _)| key == name) {
            Some((_, existing)) => *existing = value,
            None => self.attributes.push((name.to_owned(), value)),
        }
    }

    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let pos = self.attributes.iter().position(|(key, _)| key == name)?;
        Some(self.attributes.remove(pos).1)
    }

    pub fn id(&self) -> Option<&str> {
        self.attr("id")
    }

    /// The id named by `href` or `xlink:href`, without the leading `#`.
    pub fn href_id(&self) -> Option<&str> {
        self.attr("href")
            .or_else(|| self.attr("xlink:href"))
            .and_then(|href| href.strip_prefix('#'))
    }

    pub fn push(&mut self, child: Element) {
        self.children.push(Child::Element(child));
    }

    /// Child elements, skipping text.
    pub fn elements(&self) -> impl Iterator<Item = &Element> + '_ {
        self.children.iter().filter_map(|child| match child {
            Child::Element(el) => Some(el),
            Child::Text(_) => None,
        })
    }

    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut Element> + '_ {
        self.children.iter_mut().filter_map(|child| match child {
            Child::Element(el) => Some(el),
            Child::Text(_) => None,
        })
    }

    /// This element and all elements below it, in document order.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants { stack: vec![self] }
    }

    /// Visit this element and all elements below it, in document order.
    pub fn visit_mut(&mut self, f: &mut impl FnMut(&mut Element)) {
        f(self);
        for child in self.elements_mut() {
            child.visit_mut(f);
        }
    }

    /// Remove the child elements matching `predicate`, returning how many were removed.
    pub fn remove_children(&mut self, mut predicate: impl FnMut(&Element) -> bool) -> usize {
        let before = self.children.len();
        self.children.retain(|child| match child {
            Child::Element(el) => !predicate(el),
            Child::Text(_) => true,
        });
        before - self.children.len()
    }

    /// The only descendant matching `predicate`.
    ///
    /// Returns an error naming `what` if there are none or several.
    pub fn find_one(
        &self,
        what: &str,
        predicate: impl Fn(&Element) -> bool,
    ) -> Result<&Element, Error> {
        let mut matches = self.descendants().filter(|&el| predicate(el));
        match (matches.next(), matches.next()) {
            (Some(el), None) => Ok(el),
            (None, _) => Err(Error::UnexpectedStructure(format!("no {what}"))),
            (Some(_), Some(_)) => Err(Error::UnexpectedStructure(format!(
                "more than one {what}"
            ))),
        }
    }

    /// A copy of `descendant` that can be moved out of this tree.
    ///
    /// Prefixes used in the copied subtree that were declared on one of its
    /// ancestors are declared again on the copy. The `xlink` prefix is left
    /// alone, since every output root declares it.
    pub fn detach(&self, descendant: &Element) -> Element {
        let mut scope = Vec::new();
        collect_scope(self, descendant, &mut scope);
        let mut copy = descendant.clone();
        let declared: Vec<String> = descendant
            .descendants()
            .flat_map(|el| el.attributes())
            .filter_map(|(key, _)| key.strip_prefix("xmlns:"))
            .map(str::to_owned)
            .collect();
        let mut used: Vec<&str> = descendant
            .descendants()
            .flat_map(|el| {
                std::iter::once(el.name.as_str()).chain(el.attributes().map(|(key, _)| key))
            })
            .filter_map(|name| name.split_once(':').map(|(prefix, _)| prefix))
            .filter(|prefix| !matches!(*prefix, "xmlns" | "xml" | "xlink"))
            .collect();
        used.sort_unstable();
        used.dedup();
        for prefix in used {
            if declared.iter().any(|d| d == prefix) {
                continue;
            }
            let key = format!("xmlns:{prefix}");
            // the innermost declaration wins
            if let Some((_, uri)) = scope.iter().rev().find(|(k, _)| k.as_str() == key) {
                copy.set_attr(&key, uri.as_str());
            }
        }
        copy
    }

    /// Map of id to element for every element with an id.
    pub fn id_map(&self) -> HashMap<&str, &Element> {
        self.descendants()
            .filter_map(|el| el.id().map(|id| (id, el)))
            .collect()
    }

    /// Prefix every id, and every reference to an id, in this subtree.
    ///
    /// References are `href`/`xlink:href` values starting with `#` and
    /// `url(#…)` anywhere in an attribute value or a `<style>` sheet.
    /// `#id` selectors in style sheets are not rewritten.
    pub fn prefix_ids(&mut self, prefix: &str) {
        self.visit_mut(&mut |el| {
            for (key, value) in el.attributes.iter_mut() {
                match key.as_str() {
                    "id" => value.insert_str(0, prefix),
                    "href" | "xlink:href" if value.starts_with('#') => {
                        value.insert_str(1, prefix)
                    }
                    _ => prefix_urls(value, prefix),
                }
            }
            if el.name == "style" {
                for child in el.children.iter_mut() {
                    if let Child::Text(sheet) = child {
                        prefix_urls(sheet, prefix);
                    }
                }
            }
        });
    }

    /// Ids referenced from this subtree.
    pub fn references(&self) -> Vec<String> {
        let mut refs = Vec::new();
        for el in self.descendants() {
            for (key, value) in el.attributes() {
                if matches!(key, "href" | "xlink:href") {
                    if let Some(id) = value.strip_prefix('#') {
                        refs.push(id.to_owned());
                    }
                } else {
                    refs.extend(url_references(value));
                }
            }
            if el.name == "style" {
                for child in &el.children {
                    if let Child::Text(sheet) = child {
                        refs.extend(url_references(sheet));
                    }
                }
            }
        }
        refs
    }

    /// Serialize with two space indentation.
    pub fn to_pretty_string(&self) -> String {
        let mut out = String::new();
        self.write_pretty(&mut out, 0);
        out
    }

    fn write_pretty(&self, out: &mut String, depth: usize) {
        let indent = "  ".repeat(depth);
        out.push_str(&format!("{indent}<{}", self.name));
        for (key, value) in &self.attributes {
            out.push_str(&format!(" {key}=\"{}\"", escape(value, true)));
        }
        if self.children.is_empty() {
            out.push_str("/>\n");
            return;
        }
        // mixed or text-only content is written inline to keep the text intact
        if self.children.iter().any(|c| matches!(c, Child::Text(_))) {
            out.push('>');
            for child in &self.children {
                match child {
                    Child::Text(text) => out.push_str(&escape(text, false)),
                    Child::Element(el) => {
                        let mut inline = String::new();
                        el.write_pretty(&mut inline, 0);
                        out.push_str(inline.trim_end());
                    }
                }
            }
            out.push_str(&format!("</{}>\n", self.name));
            return;
        }
        out.push_str(">\n");
        for child in self.elements() {
            child.write_pretty(out, depth + 1);
        }
        out.push_str(&format!("{indent}</{}>\n", self.name));
    }
}

pub struct Descendants<'a> {
    stack: Vec<&'a Element>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Element;

    fn next(&mut self) -> Option<Self::Item> {
        let next = self.stack.pop()?;
        let len = self.stack.len();
        self.stack.extend(next.elements());
        self.stack[len..].reverse();
        Some(next)
    }
}

/// Rewrite every `url(#id)` in `text` to `url(#<prefix>id)`.
fn prefix_urls(text: &mut String, prefix: &str) {
    if !text.contains("url(") {
        return;
    }
    let replaced = URL_REFERENCE.replace_all(text.as_str(), |caps: &regex::Captures| {
        format!("url(#{prefix}{})", &caps[1])
    });
    *text = replaced.into_owned();
}

fn url_references(text: &str) -> impl Iterator<Item = String> + '_ {
    URL_REFERENCE
        .captures_iter(text)
        .map(|caps| caps[1].to_owned())
}

/// Push the namespace declarations on the path from `el` down to (but not
/// including) `target`. Returns `false` if `target` is not below `el`.
fn collect_scope<'a>(
    el: &'a Element,
    target: &Element,
    scope: &mut Vec<(&'a String, &'a String)>,
) -> bool {
    if std::ptr::eq(el, target) {
        return true;
    }
    let len = scope.len();
    scope.extend(
        el.attributes
            .iter()
            .filter(|(key, _)| key.starts_with("xmlns:"))
            .map(|(key, value)| (key, value)),
    );
    if el.elements().any(|child| collect_scope(child, target, scope)) {
        return true;
    }
    scope.truncate(len);
    false
}

fn copy_element(node: Node, parent: Option<Node>) -> Element {
    let mut element = Element::new(qualified_name(
        node,
        node.tag_name().namespace(),
        node.tag_name().name(),
    ));
    for ns in node.namespaces() {
        if ns.uri() == XML_NS {
            continue;
        }
        // only declare what the parent did not already have in scope
        let inherited = parent
            .map(|p| {
                p.namespaces()
                    .any(|pns| pns.name() == ns.name() && pns.uri() == ns.uri())
            })
            .unwrap_or(false);
        if inherited {
            continue;
        }
        let key = match ns.name() {
            Some(prefix) => format!("xmlns:{prefix}"),
            None => "xmlns".to_owned(),
        };
        element.attributes.push((key, ns.uri().to_owned()));
    }
    for attr in node.attributes() {
        let name = qualified_name(node, attr.namespace(), attr.name());
        element.attributes.push((name, attr.value().to_owned()));
    }
    for child in node.children() {
        if child.is_element() {
            element.push(copy_element(child, Some(node)));
        } else if child.is_text() {
            if let Some(text) = child.text().filter(|t| !t.trim().is_empty()) {
                element.children.push(Child::Text(text.to_owned()));
            }
        }
    }
    element
}

fn qualified_name(node: Node, namespace: Option<&str>, local: &str) -> String {
    let prefix = match namespace {
        None | Some(SVG_NS) => None,
        Some(XML_NS) => Some("xml"),
        Some(XLINK_NS) => Some("xlink"),
        Some(uri) => node.lookup_prefix(uri),
    };
    match prefix {
        Some(prefix) if !prefix.is_empty() => format!("{prefix}:{local}"),
        _ => local.to_owned(),
    }
}

fn escape(raw: &str, in_attribute: bool) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if in_attribute => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
