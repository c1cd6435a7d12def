//! The main document part (`word/document.xml`).
//!
//! [`Document`] splits `w:body` into [`Block`]s held in a [`Body`] arena and
//! keeps a registry of bookmark names so new bookmarks get unique ids and
//! names. Everything outside the body (namespaces, `mc:Ignorable`, the root's
//! other children) is kept and written back as parsed.

use super::body::{Block, BlockId, Body, Cursor};
use super::bookmark::sanitize_bookmark_name;
use super::model::{self, tag, Paragraph, W_NAMESPACE};
use super::xml::{self, Element, Node};
use crate::error::SongbookError;
use std::collections::HashMap;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BookmarkLoc {
    id: u32,
    block: BlockId,
}

/// A parsed WordprocessingML main document.
#[derive(Debug, Clone)]
pub struct Document {
    part: String,
    /// The root element with an empty `w:body`; blocks live in `body`.
    root: Element,
    body: Body,
    bookmarks: HashMap<String, BookmarkLoc>,
    next_bookmark_id: u32,
}

impl Document {
    /// Parse the main document part. `part` names it in error messages.
    pub fn from_xml(part: &str, bytes: &[u8]) -> Result<Self, SongbookError> {
        let mut root = xml::parse(part, bytes)?;
        check_namespace(part, &root)?;

        let next_bookmark_id = max_bookmark_id(&root).map_or(0, |id| id + 1);

        let body_element = root.child_mut(tag::BODY).ok_or_else(|| SongbookError::MalformedXml {
            part: part.to_string(),
            detail: "no w:body element".to_string(),
        })?;

        let mut body = Body::new();
        let mut bookmarks = HashMap::new();
        for child in std::mem::take(&mut body_element.children) {
            // Whitespace and comments between body blocks carry no content.
            let Node::Element(element) = child else {
                continue;
            };

            let mut found = Vec::new();
            element.walk(&mut |e: &Element| {
                if e.is(tag::BOOKMARK_START) {
                    if let (Some(name), Some(id)) = (e.attr("w:name"), bookmark_id(e)) {
                        found.push((name.to_string(), id));
                    }
                }
            });

            let block = if element.is(tag::P) {
                Block::Paragraph(Paragraph::from_element(element))
            } else {
                Block::Other(element)
            };
            let id = body.push_back(block);
            for (name, bookmark) in found {
                bookmarks.insert(name, BookmarkLoc { id: bookmark, block: id });
            }
        }

        Ok(Self {
            part: part.to_string(),
            root,
            body,
            bookmarks,
            next_bookmark_id,
        })
    }

    /// Serialise back into part bytes.
    pub fn to_xml(&self) -> Result<Vec<u8>, SongbookError> {
        let mut root = self.root.clone();
        let body_element = root
            .child_mut(tag::BODY)
            .ok_or_else(|| SongbookError::Internal("w:body vanished from document root".into()))?;
        body_element.children = self
            .body
            .iter()
            .map(|(_, block)| {
                Node::Element(match block {
                    Block::Paragraph(p) => p.to_element(),
                    Block::Other(e) => e.clone(),
                })
            })
            .collect();
        xml::write(&root)
    }

    /// Name of the part this document was parsed from.
    pub fn part_name(&self) -> &str {
        &self.part
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    /// Top-level paragraphs in document order.
    pub fn paragraphs(&self) -> impl Iterator<Item = (BlockId, &Paragraph)> {
        self.body
            .iter()
            .filter_map(|(id, block)| block.as_paragraph().map(|p| (id, p)))
    }

    pub fn paragraph_count(&self) -> usize {
        self.paragraphs().count()
    }

    pub fn first_paragraph(&self) -> Option<BlockId> {
        self.paragraphs().next().map(|(id, _)| id)
    }

    pub fn paragraph(&self, id: BlockId) -> Option<&Paragraph> {
        self.body.get(id)?.as_paragraph()
    }

    pub fn paragraph_mut(&mut self, id: BlockId) -> Option<&mut Paragraph> {
        self.body.get_mut(id)?.as_paragraph_mut()
    }

    pub fn insert_paragraph_after(
        &mut self,
        anchor: BlockId,
        paragraph: Paragraph,
    ) -> Result<BlockId, SongbookError> {
        self.body
            .insert_after(anchor, Block::Paragraph(paragraph))
            .ok_or_else(|| detached(anchor))
    }

    pub fn insert_paragraph_before(
        &mut self,
        anchor: BlockId,
        paragraph: Paragraph,
    ) -> Result<BlockId, SongbookError> {
        self.body
            .insert_before(anchor, Block::Paragraph(paragraph))
            .ok_or_else(|| detached(anchor))
    }

    /// Insert at the very start of the body.
    pub fn push_front_paragraph(&mut self, paragraph: Paragraph) -> BlockId {
        self.body.push_front(Block::Paragraph(paragraph))
    }

    /// Insert at the cursor and advance it onto the new paragraph.
    pub fn insert_at(
        &mut self,
        cursor: &mut Cursor,
        paragraph: Paragraph,
    ) -> Result<BlockId, SongbookError> {
        let at = *cursor;
        cursor
            .insert(&mut self.body, Block::Paragraph(paragraph))
            .ok_or_else(|| SongbookError::Internal(format!("insert cursor {at:?} is detached")))
    }

    // ── Bookmarks ───────────────────────────────────────────────────────────

    pub fn has_bookmark(&self, name: &str) -> bool {
        self.bookmarks.contains_key(name)
    }

    /// Block holding the start marker of bookmark `name`.
    pub fn bookmark_block(&self, name: &str) -> Option<BlockId> {
        self.bookmarks.get(name).map(|loc| loc.block)
    }

    /// Every bookmark name, sorted.
    pub fn bookmark_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.bookmarks.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Wrap paragraph `block` in a bookmark and return the name actually used.
    ///
    /// The name is sanitised first. If a bookmark of that name already
    /// exists it is moved here: the old markers are removed and a warning is
    /// logged.
    pub fn add_bookmark(&mut self, block: BlockId, name: &str) -> Result<String, SongbookError> {
        let name = sanitize_bookmark_name(name);
        if self.paragraph(block).is_none() {
            return Err(SongbookError::Internal(format!(
                "bookmark '{name}' target {block:?} is not a paragraph"
            )));
        }

        if let Some(old) = self.bookmarks.remove(&name) {
            warn!(
                "Bookmark '{}' already exists (id {}); moving it to the new paragraph",
                name, old.id
            );
            self.remove_bookmark_markers(old.id);
        }

        let id = self.next_bookmark_id;
        self.next_bookmark_id += 1;
        if let Some(paragraph) = self.paragraph_mut(block) {
            paragraph.insert_bookmark(id, &name);
        }
        self.bookmarks.insert(name.clone(), BookmarkLoc { id, block });
        Ok(name)
    }

    /// Strip every start/end marker with `id`, wherever it sits.
    fn remove_bookmark_markers(&mut self, id: u32) {
        let ids: Vec<BlockId> = self.body.ids().collect();
        for block_id in ids {
            let remove_block = match self.body.get_mut(block_id) {
                Some(Block::Paragraph(p)) => {
                    p.remove_bookmark(id);
                    false
                }
                Some(Block::Other(e)) => {
                    if model::is_bookmark_marker(e, id) {
                        true
                    } else {
                        model::strip_bookmark_markers(e, id);
                        false
                    }
                }
                None => false,
            };
            if remove_block {
                self.body.remove(block_id);
            }
        }
    }

    // ── Queries over the whole body ─────────────────────────────────────────

    /// Anchors of all internal hyperlinks in top-level paragraphs.
    pub fn link_anchors(&self) -> Vec<&str> {
        self.paragraphs()
            .flat_map(|(_, p)| p.link_anchors())
            .collect()
    }

    /// Set `font` on every run in the body, tables and content controls
    /// included. Returns the number of runs reached inside opaque blocks.
    pub fn apply_font(&mut self, font: &str) -> usize {
        let mut nested = 0;
        for block in self.body.blocks_mut() {
            match block {
                Block::Paragraph(p) => p.apply_font(font),
                Block::Other(e) => nested += model::apply_font_to_block(e, font),
            }
        }
        nested
    }

    /// Font of every run in the body, in document order.
    pub fn run_fonts(&self) -> Vec<Option<String>> {
        self.body
            .iter()
            .flat_map(|(_, block)| match block {
                Block::Paragraph(p) => p.run_fonts(),
                Block::Other(e) => model::block_run_fonts(e),
            })
            .collect()
    }
}

fn detached(anchor: BlockId) -> SongbookError {
    SongbookError::Internal(format!("block {anchor:?} is no longer in the body"))
}

fn bookmark_id(e: &Element) -> Option<u32> {
    e.attr("w:id")?.parse().ok()
}

fn max_bookmark_id(root: &Element) -> Option<u32> {
    let mut max: Option<u32> = None;
    root.walk(&mut |e: &Element| {
        if e.is(tag::BOOKMARK_START) || e.is(tag::BOOKMARK_END) {
            if let Some(id) = bookmark_id(e) {
                max = Some(max.map_or(id, |m| m.max(id)));
            }
        }
    });
    max
}

/// The crate addresses elements by their `w:` qualified names, so the main
/// namespace has to be bound to exactly that prefix.
fn check_namespace(part: &str, root: &Element) -> Result<(), SongbookError> {
    if root.attr("xmlns:w") == Some(W_NAMESPACE) && root.is(tag::DOCUMENT) {
        return Ok(());
    }

    let bound = root.attrs.iter().find_map(|(k, v)| {
        (v == W_NAMESPACE).then(|| k.strip_prefix("xmlns:").unwrap_or("").to_string())
    });
    match bound {
        Some(prefix) if prefix != "w" => Err(SongbookError::UnsupportedNamespace { prefix }),
        _ => Err(SongbookError::MalformedXml {
            part: part.to_string(),
            detail: format!("root element '{}' is not a WordprocessingML w:document", root.name),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx::bookmark::is_valid_bookmark_name;

    fn doc(body: &str) -> Document {
        let xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="{W_NAMESPACE}" xmlns:r="urn:r">
  <w:body>
    {body}
  </w:body>
</w:document>"#
        );
        Document::from_xml("word/document.xml", xml.as_bytes()).unwrap()
    }

    fn texts(d: &Document) -> Vec<String> {
        d.paragraphs().map(|(_, p)| p.text()).collect()
    }

    #[test]
    fn splits_body_into_blocks() {
        let d = doc(
            r#"<w:p><w:r><w:t>one</w:t></w:r></w:p>
               <w:tbl><w:tr><w:tc><w:p><w:r><w:t>cell</w:t></w:r></w:p></w:tc></w:tr></w:tbl>
               <w:p/>
               <w:sectPr/>"#,
        );
        assert_eq!(d.body().len(), 4);
        assert_eq!(texts(&d), vec!["one", ""]);
        assert_eq!(d.paragraph_count(), 2);
    }

    #[test]
    fn round_trip_keeps_root_and_blocks() {
        let d = doc(r#"<w:p><w:pPr><w:jc w:val="center"/></w:pPr><w:r><w:t>x</w:t></w:r></w:p><w:sectPr w:rsidR="1"/>"#);
        let bytes = d.to_xml().unwrap();
        let text = String::from_utf8(bytes.clone()).unwrap();
        assert!(text.contains(r#"xmlns:r="urn:r""#));
        assert!(text.contains(r#"<w:sectPr w:rsidR="1"/>"#));
        let again = Document::from_xml("word/document.xml", &bytes).unwrap();
        assert_eq!(texts(&again), texts(&d));
    }

    #[test]
    fn wrong_prefix_is_unsupported() {
        let xml = format!(r#"<x:document xmlns:x="{W_NAMESPACE}"><x:body/></x:document>"#);
        let err = Document::from_xml("word/document.xml", xml.as_bytes()).unwrap_err();
        assert!(matches!(err, SongbookError::UnsupportedNamespace { ref prefix } if prefix == "x"));
    }

    #[test]
    fn missing_body_is_malformed() {
        let xml = format!(r#"<w:document xmlns:w="{W_NAMESPACE}"/>"#);
        let err = Document::from_xml("word/document.xml", xml.as_bytes()).unwrap_err();
        assert!(matches!(err, SongbookError::MalformedXml { .. }));
    }

    #[test]
    fn new_bookmark_ids_start_above_existing() {
        let mut d = doc(
            r#"<w:p><w:bookmarkStart w:id="41" w:name="_GoBack"/><w:bookmarkEnd w:id="41"/></w:p><w:p/>"#,
        );
        assert!(d.has_bookmark("_GoBack"));
        let target = d.paragraphs().nth(1).map(|(id, _)| id).unwrap();
        let name = d.add_bookmark(target, "song 1").unwrap();
        assert_eq!(name, "song_1");
        let mark = d.paragraph(target).unwrap().bookmarks().next().unwrap();
        assert_eq!(mark.id, 42);
    }

    #[test]
    fn colliding_bookmark_moves_to_latest_paragraph() {
        let mut d = doc("<w:p><w:r><w:t>a</w:t></w:r></w:p><w:p><w:r><w:t>b</w:t></w:r></w:p>");
        let ids: Vec<BlockId> = d.paragraphs().map(|(id, _)| id).collect();
        d.add_bookmark(ids[0], "Same Title!").unwrap();
        let name = d.add_bookmark(ids[1], "Same Title?").unwrap();

        assert_eq!(d.bookmark_names(), vec![name.as_str()]);
        assert_eq!(d.bookmark_block(&name), Some(ids[1]));
        assert_eq!(d.paragraph(ids[0]).unwrap().bookmarks().count(), 0);
        assert_eq!(d.paragraph(ids[0]).unwrap().content().len(), 1);
        assert!(is_valid_bookmark_name(&name));
    }

    #[test]
    fn collision_removes_body_level_markers() {
        let mut d = doc(
            r#"<w:bookmarkStart w:id="3" w:name="Top"/><w:p><w:r><w:t>a</w:t></w:r></w:p><w:bookmarkEnd w:id="3"/><w:p/>"#,
        );
        assert_eq!(d.body().len(), 4);
        let target = d.paragraphs().nth(1).map(|(id, _)| id).unwrap();
        d.add_bookmark(target, "Top").unwrap();
        assert_eq!(d.body().len(), 2);
        assert_eq!(d.bookmark_block("Top"), Some(target));
    }

    fn start_markers(d: &Document, name: &str) -> usize {
        let xml = String::from_utf8(d.to_xml().unwrap()).unwrap();
        xml.matches(&format!(r#"w:name="{name}""#)).count()
    }

    #[test]
    fn moved_bookmark_leaves_no_marker_inside_hyperlink() {
        let mut d = doc(
            r#"<w:p><w:hyperlink w:anchor="x"><w:bookmarkStart w:id="0" w:name="Top"/><w:r><w:t>old</w:t></w:r><w:bookmarkEnd w:id="0"/></w:hyperlink></w:p><w:p><w:r><w:t>new</w:t></w:r></w:p>"#,
        );
        let target = d.paragraphs().nth(1).map(|(id, _)| id).unwrap();
        d.add_bookmark(target, "Top").unwrap();

        assert_eq!(start_markers(&d, "Top"), 1);
        let xml = String::from_utf8(d.to_xml().unwrap()).unwrap();
        assert!(!xml.contains(r#"w:id="0""#), "old markers left: {xml}");
        assert_eq!(d.bookmark_block("Top"), Some(target));
    }

    #[test]
    fn moved_bookmark_leaves_no_marker_inside_inline_content() {
        let mut d = doc(
            r#"<w:p><w:sdt><w:sdtContent><w:bookmarkStart w:id="3" w:name="song_1"/><w:r><w:t>a</w:t></w:r><w:bookmarkEnd w:id="3" w:displacedByCustomXml="next"/></w:sdtContent></w:sdt><w:r><w:pict><v:textbox xmlns:v="urn:schemas-microsoft-com:vml"><w:txbxContent><w:p><w:bookmarkStart w:id="4" w:name="song_2"/><w:bookmarkEnd w:id="4"/></w:p></w:txbxContent></v:textbox></w:pict></w:r></w:p><w:p><w:r><w:t>b</w:t></w:r></w:p>"#,
        );
        let target = d.paragraphs().nth(1).map(|(id, _)| id).unwrap();
        d.add_bookmark(target, "song_1").unwrap();
        d.add_bookmark(target, "song_2").unwrap();

        assert_eq!(start_markers(&d, "song_1"), 1);
        assert_eq!(start_markers(&d, "song_2"), 1);
        let xml = String::from_utf8(d.to_xml().unwrap()).unwrap();
        assert!(!xml.contains("displacedByCustomXml"), "old end marker left: {xml}");
    }

    #[test]
    fn insert_after_removed_block_is_internal_error() {
        let mut d = doc(
            r#"<w:bookmarkStart w:id="0" w:name="Top"/><w:p><w:r><w:t>a</w:t></w:r></w:p><w:bookmarkEnd w:id="0"/>"#,
        );
        let marker = d.body().first().unwrap();
        let target = d.first_paragraph().unwrap();
        d.add_bookmark(target, "Top").unwrap();

        assert!(d.body().get(marker).is_none());
        assert!(matches!(
            d.insert_paragraph_after(marker, Paragraph::with_text("x")),
            Err(SongbookError::Internal(_))
        ));
        assert!(matches!(
            d.insert_at(&mut Cursor::after(marker), Paragraph::with_text("y")),
            Err(SongbookError::Internal(_))
        ));
        assert_eq!(texts(&d), vec!["a"]);
    }

    #[test]
    fn bookmark_on_non_paragraph_is_internal_error() {
        let mut d = doc("<w:tbl/>");
        let table = d.body().first().unwrap();
        assert!(matches!(
            d.add_bookmark(table, "x"),
            Err(SongbookError::Internal(_))
        ));
    }

    #[test]
    fn apply_font_reaches_tables() {
        let mut d = doc(
            r#"<w:p><w:r><w:t>a</w:t></w:r></w:p><w:tbl><w:tr><w:tc><w:p><w:r><w:t>b</w:t></w:r></w:p></w:tc></w:tr></w:tbl>"#,
        );
        let nested = d.apply_font("Georgia");
        assert_eq!(nested, 1);
        assert_eq!(d.run_fonts(), vec![Some("Georgia".to_string()); 2]);
    }

    #[test]
    fn inserts_through_cursor_and_front() {
        let mut d = doc("<w:p><w:r><w:t>body</w:t></w:r></w:p>");
        let first = d.first_paragraph().unwrap();
        let head = d.insert_paragraph_before(first, Paragraph::with_text("head")).unwrap();
        let mut cursor = Cursor::after(head);
        d.insert_at(&mut cursor, Paragraph::with_text("1")).unwrap();
        d.insert_at(&mut cursor, Paragraph::with_text("2")).unwrap();
        d.push_front_paragraph(Paragraph::with_text("front"));
        assert_eq!(texts(&d), vec!["front", "head", "1", "2", "body"]);
    }
}
