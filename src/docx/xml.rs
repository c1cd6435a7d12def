//! Lossless generic XML tree over `quick-xml` events.
//!
//! WordprocessingML is far larger than the handful of elements the reformatter
//! edits. Rather than model every element, each part is parsed into a plain
//! [`Element`] tree that keeps names, attributes, text and comments exactly as
//! found; the typed views in [`super::model`] are built on top of it and
//! anything they do not understand round-trips untouched.

use crate::error::SongbookError;
use quick_xml::escape::unescape;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

/// A node in the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    /// Unescaped character data (CDATA sections are folded in here).
    Text(String),
    Comment(String),
}

/// An XML element with its qualified name (`w:p`, not `p`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    /// Attributes in source order, values unescaped.
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Builder-style attribute setter.
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(key, value);
        self
    }

    /// Builder-style child append.
    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(Node::Element(child));
        self
    }

    /// Builder-style text append.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Node::Text(text.into()));
        self
    }

    pub fn is(&self, name: &str) -> bool {
        self.name == name
    }

    /// Name without its namespace prefix.
    pub fn local_name(&self) -> &str {
        self.name
            .split_once(':')
            .map(|(_, local)| local)
            .unwrap_or(&self.name)
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Set an attribute, replacing an existing value in place.
    pub fn set_attr(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.attrs.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.attrs.push((key, value)),
        }
    }

    pub fn remove_attr(&mut self, key: &str) -> Option<String> {
        let pos = self.attrs.iter().position(|(k, _)| k == key)?;
        Some(self.attrs.remove(pos).1)
    }

    /// Child elements, skipping text and comments.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            _ => None,
        })
    }

    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.children.iter_mut().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            _ => None,
        })
    }

    /// First child element with the given qualified name.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.elements().find(|e| e.is(name))
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut Element> {
        self.elements_mut().find(|e| e.is(name))
    }

    /// Concatenated text of this element's own text children.
    pub fn own_text(&self) -> String {
        self.children
            .iter()
            .filter_map(|n| match n {
                Node::Text(t) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Visit this element and every descendant element, parents first.
    pub fn walk(&self, f: &mut impl FnMut(&Element)) {
        f(self);
        for child in self.elements() {
            child.walk(f);
        }
    }

    /// Mutable pre-order walk. The callback runs before the children are
    /// visited, so children it inserts are visited too.
    pub fn walk_mut(&mut self, f: &mut impl FnMut(&mut Element)) {
        f(self);
        for child in self.elements_mut() {
            child.walk_mut(f);
        }
    }
}

/// Parse a complete XML part into its root element.
///
/// `part` is only used to label errors.
pub fn parse(part: &str, bytes: &[u8]) -> Result<Element, SongbookError> {
    let content = std::str::from_utf8(strip_bom(bytes)).map_err(|e| malformed(part, e))?;

    let mut reader = Reader::from_str(content);
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => stack.push(start_element(part, &e)?),
            Event::Empty(e) => {
                let element = start_element(part, &e)?;
                attach(part, &mut stack, &mut root, element)?;
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| malformed(part, "unbalanced end tag"))?;
                attach(part, &mut stack, &mut root, element)?;
            }
            Event::Text(e) => {
                let text = std::str::from_utf8(e.as_ref()).map_err(|e| malformed(part, e))?;
                push_text(&mut stack, text);
            }
            Event::CData(e) => {
                let raw = e.into_inner();
                let text = std::str::from_utf8(&raw).map_err(|e| malformed(part, e))?;
                push_text(&mut stack, text);
            }
            Event::GeneralRef(e) => {
                let entity = String::from_utf8_lossy(e.as_ref()).into_owned();
                let resolved = resolve_entity(&entity)
                    .ok_or_else(|| malformed(part, format!("unknown entity '&{entity};'")))?;
                push_text(&mut stack, &resolved);
            }
            Event::Comment(e) => {
                if let Some(parent) = stack.last_mut() {
                    let text = String::from_utf8_lossy(e.as_ref()).into_owned();
                    parent.children.push(Node::Comment(text));
                }
            }
            Event::Eof => break,
            // Declaration, processing instructions and doctype are regenerated
            // or irrelevant for OOXML parts.
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(malformed(part, "unexpected end of document"));
    }
    root.ok_or_else(|| malformed(part, "no root element"))
}

/// Serialise a root element as a standalone XML part.
pub fn write(root: &Element) -> Result<Vec<u8>, SongbookError> {
    let mut writer = Writer::new(Vec::new());
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
    write_element(&mut writer, root)?;
    Ok(writer.into_inner())
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &Element) -> Result<(), SongbookError> {
    let mut start = BytesStart::new(element.name.as_str());
    for (key, value) in &element.attrs {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    if element.children.is_empty() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }

    writer.write_event(Event::Start(start))?;
    for child in &element.children {
        match child {
            Node::Element(e) => write_element(writer, e)?,
            Node::Text(t) => writer.write_event(Event::Text(BytesText::new(t)))?,
            Node::Comment(c) => writer.write_event(Event::Comment(BytesText::from_escaped(c.as_str())))?,
        }
    }
    writer.write_event(Event::End(BytesEnd::new(element.name.as_str())))?;
    Ok(())
}

fn start_element(part: &str, e: &BytesStart<'_>) -> Result<Element, SongbookError> {
    let name = std::str::from_utf8(e.name().as_ref())
        .map_err(|err| malformed(part, err))?
        .to_string();

    let mut attrs = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        let key = std::str::from_utf8(attr.key.as_ref())
            .map_err(|err| malformed(part, err))?
            .to_string();
        let raw = std::str::from_utf8(&attr.value).map_err(|err| malformed(part, err))?;
        let value = unescape(raw).map_err(quick_xml::Error::from)?.into_owned();
        attrs.push((key, value));
    }

    Ok(Element {
        name,
        attrs,
        children: Vec::new(),
    })
}

fn attach(
    part: &str,
    stack: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
) -> Result<(), SongbookError> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(Node::Element(element)),
        None if root.is_none() => *root = Some(element),
        None => return Err(malformed(part, "more than one root element")),
    }
    Ok(())
}

/// Append text to the open element, merging with a preceding text node.
/// Text outside the root (whitespace between prolog and root) is dropped.
fn push_text(stack: &mut [Element], text: &str) {
    let Some(parent) = stack.last_mut() else {
        return;
    };
    if let Some(Node::Text(prev)) = parent.children.last_mut() {
        prev.push_str(text);
    } else {
        parent.children.push(Node::Text(text.to_string()));
    }
}

fn resolve_entity(entity: &str) -> Option<String> {
    match entity {
        "apos" => return Some("'".to_string()),
        "quot" => return Some("\"".to_string()),
        "lt" => return Some("<".to_string()),
        "gt" => return Some(">".to_string()),
        "amp" => return Some("&".to_string()),
        _ => {}
    }

    let code = if let Some(hex) = entity.strip_prefix("#x") {
        u32::from_str_radix(hex, 16).ok()?
    } else if let Some(dec) = entity.strip_prefix('#') {
        dec.parse::<u32>().ok()?
    } else {
        return None;
    };
    char::from_u32(code).map(|c| c.to_string())
}

fn strip_bom(bytes: &[u8]) -> &[u8] {
    bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes)
}

fn malformed(part: &str, detail: impl ToString) -> SongbookError {
    SongbookError::MalformedXml {
        part: part.to_string(),
        detail: detail.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_str(s: &str) -> Element {
        parse("test.xml", s.as_bytes()).expect("parse")
    }

    #[test]
    fn parses_nested_elements_and_attributes() {
        let root = parse_str(r#"<a x="1"><b y="two"/><c>text</c></a>"#);
        assert_eq!(root.name, "a");
        assert_eq!(root.attr("x"), Some("1"));
        assert_eq!(root.child("b").and_then(|b| b.attr("y")), Some("two"));
        assert_eq!(root.child("c").map(|c| c.own_text()), Some("text".into()));
    }

    #[test]
    fn entities_are_resolved_in_text_and_attributes() {
        let root = parse_str(r#"<w:t v="a &amp; b">Tom &amp; Jerry &#x263A; &lt;3</w:t>"#);
        assert_eq!(root.attr("v"), Some("a & b"));
        assert_eq!(root.own_text(), "Tom & Jerry \u{263A} <3");
        // Text and entity events are merged into one text node.
        assert_eq!(root.children.len(), 1);
    }

    #[test]
    fn whitespace_text_is_preserved() {
        let root = parse_str("<w:t xml:space=\"preserve\">  two spaces  </w:t>");
        assert_eq!(root.own_text(), "  two spaces  ");
    }

    #[test]
    fn local_name_strips_prefix() {
        assert_eq!(Element::new("w:bookmarkStart").local_name(), "bookmarkStart");
        assert_eq!(Element::new("plain").local_name(), "plain");
    }

    #[test]
    fn unknown_entity_is_an_error() {
        let err = parse("doc.xml", b"<a>&nbsp;</a>").unwrap_err();
        assert!(matches!(err, SongbookError::MalformedXml { .. }), "got {err:?}");
    }

    #[test]
    fn unbalanced_document_is_an_error() {
        assert!(parse("doc.xml", b"<a><b></b>").is_err());
        assert!(parse("doc.xml", b"").is_err());
    }

    #[test]
    fn write_then_parse_preserves_tree() {
        let source = r#"<w:document xmlns:w="urn:w"><w:body><w:p><w:r><w:t xml:space="preserve"> a &lt; b </w:t></w:r></w:p><!-- note --></w:body></w:document>"#;
        let root = parse_str(source);
        let bytes = write(&root).unwrap();
        let text = String::from_utf8(bytes.clone()).unwrap();
        assert!(text.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>"));
        assert!(text.contains("a &lt; b"));
        let reparsed = parse("again.xml", &bytes).unwrap();
        assert_eq!(reparsed, root);
    }

    #[test]
    fn bom_is_ignored() {
        let root = parse("bom.xml", b"\xEF\xBB\xBF<?xml version=\"1.0\"?><r/>").unwrap();
        assert_eq!(root.name, "r");
    }

    #[test]
    fn walk_mut_reaches_all_descendants() {
        let mut root = parse_str("<a><b><c/></b><c/></a>");
        let mut count = 0;
        root.walk_mut(&mut |e: &mut Element| {
            if e.is("c") {
                e.set_attr("seen", "1");
                count += 1;
            }
        });
        assert_eq!(count, 2);
        let mut seen = 0;
        root.walk(&mut |e: &Element| {
            if e.attr("seen") == Some("1") {
                seen += 1;
            }
        });
        assert_eq!(seen, 2);
    }
}
