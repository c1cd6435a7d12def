//! Typed views over WordprocessingML paragraphs.
//!
//! Only the pieces the reformatter reads or writes get a type: paragraphs,
//! runs, hyperlinks, bookmark markers and a few properties (alignment, font,
//! bold, underline, color). Everything else stays an [`Element`] and is
//! written back exactly as parsed.
//!
//! Property containers (`w:pPr`, `w:rPr`) keep their children in schema
//! order. Word validates that order strictly, so setters insert new children
//! at their schema position instead of appending.

use super::xml::{Element, Node};
use serde::{Deserialize, Serialize};

/// WordprocessingML main namespace.
pub const W_NAMESPACE: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

pub(crate) mod tag {
    pub const DOCUMENT: &str = "w:document";
    pub const BODY: &str = "w:body";
    pub const P: &str = "w:p";
    pub const PPR: &str = "w:pPr";
    pub const R: &str = "w:r";
    pub const RPR: &str = "w:rPr";
    pub const T: &str = "w:t";
    pub const TAB: &str = "w:tab";
    pub const BR: &str = "w:br";
    pub const CR: &str = "w:cr";
    pub const HYPERLINK: &str = "w:hyperlink";
    pub const BOOKMARK_START: &str = "w:bookmarkStart";
    pub const BOOKMARK_END: &str = "w:bookmarkEnd";
    pub const JC: &str = "w:jc";
    pub const RFONTS: &str = "w:rFonts";
    pub const B: &str = "w:b";
    pub const U: &str = "w:u";
    pub const COLOR: &str = "w:color";
}

mod attr {
    pub const VAL: &str = "w:val";
    pub const ID: &str = "w:id";
    pub const NAME: &str = "w:name";
    pub const TYPE: &str = "w:type";
    pub const ANCHOR: &str = "w:anchor";
    pub const HISTORY: &str = "w:history";
    pub const ASCII: &str = "w:ascii";
    pub const HANSI: &str = "w:hAnsi";
    pub const ASCII_THEME: &str = "w:asciiTheme";
    pub const HANSI_THEME: &str = "w:hAnsiTheme";
    pub const XML_SPACE: &str = "xml:space";
}

/// Schema order of `w:rPr` children (CT_RPr).
const RPR_ORDER: &[&str] = &[
    "rStyle", "rFonts", "b", "bCs", "i", "iCs", "caps", "smallCaps", "strike", "dstrike",
    "outline", "shadow", "emboss", "imprint", "noProof", "snapToGrid", "vanish", "webHidden",
    "color", "spacing", "w", "kern", "position", "sz", "szCs", "highlight", "u", "effect", "bdr",
    "shd", "fitText", "vertAlign", "rtl", "cs", "em", "lang", "eastAsianLayout", "specVanish",
    "oMath", "rPrChange",
];

/// Schema order of `w:pPr` children (CT_PPr).
const PPR_ORDER: &[&str] = &[
    "pStyle", "keepNext", "keepLines", "pageBreakBefore", "framePr", "widowControl", "numPr",
    "suppressLineNumbers", "pBdr", "shd", "tabs", "suppressAutoHyphens", "kinsoku", "wordWrap",
    "overflowPunct", "topLinePunct", "autoSpaceDE", "autoSpaceDN", "bidi", "adjustRightInd",
    "snapToGrid", "spacing", "ind", "contextualSpacing", "mirrorIndents", "suppressOverlap", "jc",
    "textDirection", "textAlignment", "textboxTightWrap", "outlineLvl", "divId", "cnfStyle",
    "rPr", "sectPr", "pPrChange",
];

/// Find the child named `name`, inserting an empty one at its schema
/// position when absent. Unknown names sort last.
fn upsert_ordered<'a>(parent: &'a mut Element, name: &str, order: &[&str]) -> &'a mut Element {
    let rank = |n: &str| {
        let local = n.split_once(':').map(|(_, l)| l).unwrap_or(n);
        order.iter().position(|o| *o == local).unwrap_or(usize::MAX)
    };

    let index = match parent
        .children
        .iter()
        .position(|c| matches!(c, Node::Element(e) if e.is(name)))
    {
        Some(i) => i,
        None => {
            let new_rank = rank(name);
            let at = parent
                .children
                .iter()
                .position(|c| matches!(c, Node::Element(e) if rank(&e.name) > new_rank))
                .unwrap_or(parent.children.len());
            parent.children.insert(at, Node::Element(Element::new(name)));
            at
        }
    };

    match &mut parent.children[index] {
        Node::Element(e) => e,
        _ => unreachable!("index points at an element"),
    }
}

fn remove_child(parent: &mut Element, name: &str) {
    parent
        .children
        .retain(|c| !matches!(c, Node::Element(e) if e.is(name)));
}

/// Toggle properties (`w:b`) are on unless `w:val` says otherwise.
fn toggle_is_on(element: &Element) -> bool {
    !matches!(element.attr(attr::VAL), Some("0" | "false" | "off"))
}

/// Point a `w:rPr` element at `font`, dropping theme fonts that would win over it.
fn set_font_on(rpr: &mut Element, font: &str) {
    let fonts = upsert_ordered(rpr, tag::RFONTS, RPR_ORDER);
    fonts.remove_attr(attr::ASCII_THEME);
    fonts.remove_attr(attr::HANSI_THEME);
    fonts.set_attr(attr::ASCII, font);
    fonts.set_attr(attr::HANSI, font);
}

fn font_of(rpr: &Element) -> Option<&str> {
    let fonts = rpr.child(tag::RFONTS)?;
    fonts.attr(attr::ASCII).or_else(|| fonts.attr(attr::HANSI))
}

/// Apply `font` to every `w:r` below an opaque element. Returns the number
/// of runs touched.
fn set_font_on_nested_runs(element: &mut Element, font: &str) -> usize {
    let mut count = 0;
    element.walk_mut(&mut |e: &mut Element| {
        if e.is(tag::R) {
            if e.child(tag::RPR).is_none() {
                // rPr must be the first child of a run.
                e.children.insert(0, Node::Element(Element::new(tag::RPR)));
            }
            if let Some(rpr) = e.child_mut(tag::RPR) {
                set_font_on(rpr, font);
            }
            count += 1;
        }
    });
    count
}

fn nested_run_fonts(element: &Element, out: &mut Vec<Option<String>>) {
    element.walk(&mut |e: &Element| {
        if e.is(tag::R) {
            out.push(e.child(tag::RPR).and_then(font_of).map(str::to_string));
        }
    });
}

/// Text of `w:t` below an opaque element. Textbox content belongs to the
/// shape, not the paragraph, and `mc:Fallback` repeats `mc:Choice`.
fn nested_text(element: &Element, out: &mut String) {
    if element.is(tag::T) {
        out.push_str(&element.own_text());
        return;
    }
    if matches!(element.local_name(), "txbxContent" | "Fallback") {
        return;
    }
    for child in element.elements() {
        nested_text(child, out);
    }
}

pub(crate) fn is_bookmark_marker(element: &Element, id: u32) -> bool {
    (element.is(tag::BOOKMARK_START) || element.is(tag::BOOKMARK_END))
        && parse_id(element) == Some(id)
}

/// Drop every marker of bookmark `id` below `element` (not `element`
/// itself). Returns whether a start marker was among them.
pub(crate) fn strip_bookmark_markers(element: &mut Element, id: u32) -> bool {
    let mut found_start = false;
    element.walk_mut(&mut |e: &mut Element| {
        e.children.retain(|c| match c {
            Node::Element(child) if is_bookmark_marker(child, id) => {
                found_start |= child.is(tag::BOOKMARK_START);
                false
            }
            _ => true,
        });
    });
    found_start
}

// ── Run properties ──────────────────────────────────────────────────────────

/// Direct run formatting (`w:rPr`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunProps {
    element: Element,
}

impl Default for RunProps {
    fn default() -> Self {
        Self {
            element: Element::new(tag::RPR),
        }
    }
}

impl RunProps {
    fn from_element(element: Element) -> Self {
        Self { element }
    }

    fn to_element(&self) -> Option<Element> {
        (!self.element.children.is_empty() || !self.element.attrs.is_empty())
            .then(|| self.element.clone())
    }

    pub fn is_empty(&self) -> bool {
        self.element.children.is_empty()
    }

    /// The Latin font (`w:ascii`, falling back to `w:hAnsi`).
    pub fn font(&self) -> Option<&str> {
        font_of(&self.element)
    }

    pub fn set_font(&mut self, font: &str) {
        set_font_on(&mut self.element, font);
    }

    pub fn is_bold(&self) -> bool {
        self.element.child(tag::B).is_some_and(toggle_is_on)
    }

    pub fn set_bold(&mut self, on: bool) {
        if on {
            upsert_ordered(&mut self.element, tag::B, RPR_ORDER).remove_attr(attr::VAL);
        } else {
            remove_child(&mut self.element, tag::B);
        }
    }

    /// Underline style (`single`, `double`, …), `None` when not underlined.
    pub fn underline(&self) -> Option<&str> {
        let u = self.element.child(tag::U)?;
        match u.attr(attr::VAL) {
            Some("none") => None,
            Some(style) => Some(style),
            None => Some("single"),
        }
    }

    pub fn set_underline(&mut self, style: &str) {
        upsert_ordered(&mut self.element, tag::U, RPR_ORDER).set_attr(attr::VAL, style);
    }

    /// Hex RGB color, e.g. `0563C1`.
    pub fn color(&self) -> Option<&str> {
        self.element.child(tag::COLOR)?.attr(attr::VAL)
    }

    pub fn set_color(&mut self, hex: &str) {
        upsert_ordered(&mut self.element, tag::COLOR, RPR_ORDER).set_attr(attr::VAL, hex);
    }
}

// ── Runs ────────────────────────────────────────────────────────────────────

/// Kind of `w:br`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BreakType {
    TextWrapping,
    Page,
    Column,
}

/// One item inside a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunContent {
    Text(String),
    Tab,
    Break(BreakType),
    CarriageReturn,
    Other(Element),
}

/// A styled span of text (`w:r`).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Run {
    attrs: Vec<(String, String)>,
    props: RunProps,
    content: Vec<RunContent>,
}

impl Run {
    /// A run holding `text` and no formatting.
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            content: vec![RunContent::Text(text.into())],
            ..Self::default()
        }
    }

    /// A run holding a single page break.
    pub fn page_break() -> Self {
        Self {
            content: vec![RunContent::Break(BreakType::Page)],
            ..Self::default()
        }
    }

    fn from_element(element: Element) -> Self {
        let mut run = Run {
            attrs: element.attrs,
            ..Run::default()
        };

        for child in element.children {
            let Node::Element(e) = child else {
                continue;
            };
            let item = match e.name.as_str() {
                tag::RPR => {
                    run.props = RunProps::from_element(e);
                    continue;
                }
                tag::T => RunContent::Text(e.own_text()),
                tag::TAB if e.attrs.is_empty() => RunContent::Tab,
                tag::CR if e.attrs.is_empty() => RunContent::CarriageReturn,
                tag::BR if e.attrs.iter().all(|(k, _)| k == attr::TYPE) => {
                    match e.attr(attr::TYPE) {
                        None | Some("textWrapping") => RunContent::Break(BreakType::TextWrapping),
                        Some("page") => RunContent::Break(BreakType::Page),
                        Some("column") => RunContent::Break(BreakType::Column),
                        Some(_) => RunContent::Other(e),
                    }
                }
                _ => RunContent::Other(e),
            };
            run.content.push(item);
        }
        run
    }

    fn to_element(&self) -> Element {
        let mut element = Element::new(tag::R);
        element.attrs = self.attrs.clone();
        if let Some(props) = self.props.to_element() {
            element.children.push(Node::Element(props));
        }
        for item in &self.content {
            let child = match item {
                RunContent::Text(t) => {
                    let mut e = Element::new(tag::T).with_text(t.clone());
                    if t.starts_with(char::is_whitespace) || t.ends_with(char::is_whitespace) {
                        e.set_attr(attr::XML_SPACE, "preserve");
                    }
                    e
                }
                RunContent::Tab => Element::new(tag::TAB),
                RunContent::CarriageReturn => Element::new(tag::CR),
                RunContent::Break(BreakType::TextWrapping) => Element::new(tag::BR),
                RunContent::Break(BreakType::Page) => {
                    Element::new(tag::BR).with_attr(attr::TYPE, "page")
                }
                RunContent::Break(BreakType::Column) => {
                    Element::new(tag::BR).with_attr(attr::TYPE, "column")
                }
                RunContent::Other(e) => e.clone(),
            };
            element.children.push(Node::Element(child));
        }
        element
    }

    pub fn props(&self) -> &RunProps {
        &self.props
    }

    pub fn props_mut(&mut self) -> &mut RunProps {
        &mut self.props
    }

    pub fn content(&self) -> &[RunContent] {
        &self.content
    }

    /// Builder-style content append.
    pub fn with_content(mut self, item: RunContent) -> Self {
        self.content.push(item);
        self
    }

    /// Visible text: tabs as `\t`, line breaks as `\n`, page and column
    /// breaks contribute nothing.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for item in &self.content {
            match item {
                RunContent::Text(t) => out.push_str(t),
                RunContent::Tab => out.push('\t'),
                RunContent::Break(BreakType::TextWrapping) | RunContent::CarriageReturn => {
                    out.push('\n')
                }
                RunContent::Break(_) => {}
                RunContent::Other(e) => nested_text(e, &mut out),
            }
        }
        out
    }

    pub fn has_page_break(&self) -> bool {
        self.content
            .iter()
            .any(|c| matches!(c, RunContent::Break(BreakType::Page)))
    }
}

// ── Hyperlinks ──────────────────────────────────────────────────────────────

/// Visual style of generated hyperlinks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkStyle {
    /// Hex RGB color. Word's default hyperlink blue is `0563C1`.
    pub color: String,
    pub underline: bool,
}

impl Default for LinkStyle {
    fn default() -> Self {
        Self {
            color: "0563C1".to_string(),
            underline: true,
        }
    }
}

/// A `w:hyperlink`. Internal links carry `w:anchor`, external ones `r:id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hyperlink {
    attrs: Vec<(String, String)>,
    content: Vec<Inline>,
}

impl Hyperlink {
    /// An internal link to the bookmark `anchor` showing `text`.
    ///
    /// The anchor is not checked against existing bookmarks.
    pub fn internal(anchor: &str, text: &str, style: &LinkStyle) -> Self {
        let mut run = Run::with_text(text);
        run.props.set_color(&style.color);
        if style.underline {
            run.props.set_underline("single");
        }
        Self {
            attrs: vec![
                (attr::ANCHOR.to_string(), anchor.to_string()),
                (attr::HISTORY.to_string(), "1".to_string()),
            ],
            content: vec![Inline::Run(run)],
        }
    }

    fn from_element(element: Element) -> Self {
        Self {
            attrs: element.attrs,
            content: parse_inlines(element.children),
        }
    }

    fn to_element(&self) -> Element {
        let mut element = Element::new(tag::HYPERLINK);
        element.attrs = self.attrs.clone();
        element.children = write_inlines(&self.content);
        element
    }

    /// Target bookmark of an internal link.
    pub fn anchor(&self) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == attr::ANCHOR)
            .map(|(_, v)| v.as_str())
    }

    pub fn text(&self) -> String {
        inline_text(&self.content)
    }

    pub fn runs(&self) -> impl Iterator<Item = &Run> {
        self.content.iter().filter_map(|i| match i {
            Inline::Run(r) => Some(r),
            _ => None,
        })
    }
}

// ── Bookmarks ───────────────────────────────────────────────────────────────

/// A `w:bookmarkStart` marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookmarkStart {
    pub id: u32,
    pub name: String,
    extra: Vec<(String, String)>,
}

impl BookmarkStart {
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            extra: Vec::new(),
        }
    }
}

// ── Inline content ──────────────────────────────────────────────────────────

/// A child of a paragraph or hyperlink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    Run(Run),
    Hyperlink(Hyperlink),
    BookmarkStart(BookmarkStart),
    BookmarkEnd { id: u32 },
    /// Anything else (`w:proofErr`, `w:ins`, `w:fldSimple`, `w:sdt`, …).
    Other(Element),
}

fn parse_id(element: &Element) -> Option<u32> {
    element.attr(attr::ID)?.parse().ok()
}

fn parse_inlines(children: Vec<Node>) -> Vec<Inline> {
    let mut out = Vec::with_capacity(children.len());
    for child in children {
        // Inter-element whitespace and comments carry no meaning here.
        let Node::Element(e) = child else {
            continue;
        };
        let inline = match e.name.as_str() {
            tag::R => Inline::Run(Run::from_element(e)),
            tag::HYPERLINK => Inline::Hyperlink(Hyperlink::from_element(e)),
            tag::BOOKMARK_START => match (parse_id(&e), e.attr(attr::NAME)) {
                (Some(id), Some(name)) => Inline::BookmarkStart(BookmarkStart {
                    id,
                    name: name.to_string(),
                    extra: e
                        .attrs
                        .iter()
                        .filter(|(k, _)| k != attr::ID && k != attr::NAME)
                        .cloned()
                        .collect(),
                }),
                _ => Inline::Other(e),
            },
            tag::BOOKMARK_END if e.attrs.len() == 1 => match parse_id(&e) {
                Some(id) => Inline::BookmarkEnd { id },
                None => Inline::Other(e),
            },
            _ => Inline::Other(e),
        };
        out.push(inline);
    }
    out
}

fn write_inlines(content: &[Inline]) -> Vec<Node> {
    content
        .iter()
        .map(|inline| {
            Node::Element(match inline {
                Inline::Run(r) => r.to_element(),
                Inline::Hyperlink(h) => h.to_element(),
                Inline::BookmarkStart(b) => {
                    let mut e = Element::new(tag::BOOKMARK_START)
                        .with_attr(attr::ID, b.id.to_string())
                        .with_attr(attr::NAME, b.name.clone());
                    e.attrs.extend(b.extra.iter().cloned());
                    e
                }
                Inline::BookmarkEnd { id } => {
                    Element::new(tag::BOOKMARK_END).with_attr(attr::ID, id.to_string())
                }
                Inline::Other(e) => e.clone(),
            })
        })
        .collect()
}

fn inline_text(content: &[Inline]) -> String {
    let mut out = String::new();
    for inline in content {
        match inline {
            Inline::Run(r) => out.push_str(&r.text()),
            Inline::Hyperlink(h) => out.push_str(&h.text()),
            Inline::Other(e) => nested_text(e, &mut out),
            Inline::BookmarkStart(_) | Inline::BookmarkEnd { .. } => {}
        }
    }
    out
}

fn apply_font_to_inlines(content: &mut [Inline], font: &str) -> usize {
    let mut count = 0;
    for inline in content {
        match inline {
            Inline::Run(r) => {
                r.props.set_font(font);
                count += 1;
                for item in &mut r.content {
                    if let RunContent::Other(e) = item {
                        count += set_font_on_nested_runs(e, font);
                    }
                }
            }
            Inline::Hyperlink(h) => count += apply_font_to_inlines(&mut h.content, font),
            Inline::Other(e) => count += set_font_on_nested_runs(e, font),
            Inline::BookmarkStart(_) | Inline::BookmarkEnd { .. } => {}
        }
    }
    count
}

fn collect_run_fonts(content: &[Inline], out: &mut Vec<Option<String>>) {
    for inline in content {
        match inline {
            Inline::Run(r) => {
                out.push(r.props.font().map(str::to_string));
                for item in &r.content {
                    if let RunContent::Other(e) = item {
                        nested_run_fonts(e, out);
                    }
                }
            }
            Inline::Hyperlink(h) => collect_run_fonts(&h.content, out),
            Inline::Other(e) => nested_run_fonts(e, out),
            Inline::BookmarkStart(_) | Inline::BookmarkEnd { .. } => {}
        }
    }
}

/// Remove the markers of bookmark `id` from `content`, descending into
/// hyperlinks, opaque inline elements and opaque run content.
fn remove_bookmark_inlines(content: &mut Vec<Inline>, id: u32) -> bool {
    let mut found_start = false;
    content.retain(|inline| match inline {
        Inline::BookmarkStart(b) if b.id == id => {
            found_start = true;
            false
        }
        Inline::BookmarkEnd { id: end } if *end == id => false,
        Inline::Other(e) if is_bookmark_marker(e, id) => {
            found_start |= e.is(tag::BOOKMARK_START);
            false
        }
        _ => true,
    });

    for inline in content.iter_mut() {
        match inline {
            Inline::Hyperlink(h) => found_start |= remove_bookmark_inlines(&mut h.content, id),
            Inline::Other(e) => found_start |= strip_bookmark_markers(e, id),
            Inline::Run(r) => {
                for item in &mut r.content {
                    if let RunContent::Other(e) = item {
                        found_start |= strip_bookmark_markers(e, id);
                    }
                }
            }
            Inline::BookmarkStart(_) | Inline::BookmarkEnd { .. } => {}
        }
    }
    found_start
}

// ── Paragraphs ──────────────────────────────────────────────────────────────

/// Paragraph alignment (`w:jc`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Alignment {
    Left,
    Center,
    Right,
    Justify,
}

impl Alignment {
    fn as_val(self) -> &'static str {
        match self {
            Alignment::Left => "left",
            Alignment::Center => "center",
            Alignment::Right => "right",
            Alignment::Justify => "both",
        }
    }

    fn from_val(val: &str) -> Option<Self> {
        match val {
            "left" | "start" => Some(Alignment::Left),
            "center" => Some(Alignment::Center),
            "right" | "end" => Some(Alignment::Right),
            "both" | "distribute" => Some(Alignment::Justify),
            _ => None,
        }
    }
}

/// A `w:p`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paragraph {
    attrs: Vec<(String, String)>,
    props: Option<Element>,
    content: Vec<Inline>,
}

impl Default for Paragraph {
    fn default() -> Self {
        Self::new()
    }
}

impl Paragraph {
    /// An empty paragraph.
    pub fn new() -> Self {
        Self {
            attrs: Vec::new(),
            props: None,
            content: Vec::new(),
        }
    }

    /// A paragraph whose text lives in one synthesised run.
    pub fn with_text(text: &str) -> Self {
        let mut p = Self::new();
        if !text.is_empty() {
            p.push_run(Run::with_text(text));
        }
        p
    }

    pub(crate) fn from_element(element: Element) -> Self {
        let mut props = None;
        let mut rest = Vec::with_capacity(element.children.len());
        for child in element.children {
            match child {
                Node::Element(e) if e.is(tag::PPR) && props.is_none() => props = Some(e),
                other => rest.push(other),
            }
        }
        Self {
            attrs: element.attrs,
            props,
            content: parse_inlines(rest),
        }
    }

    pub(crate) fn to_element(&self) -> Element {
        let mut element = Element::new(tag::P);
        element.attrs = self.attrs.clone();
        if let Some(props) = &self.props {
            element.children.push(Node::Element(props.clone()));
        }
        element.children.extend(write_inlines(&self.content));
        element
    }

    fn props_mut(&mut self) -> &mut Element {
        self.props.get_or_insert_with(|| Element::new(tag::PPR))
    }

    /// Visible text of the paragraph, hyperlinks included.
    pub fn text(&self) -> String {
        inline_text(&self.content)
    }

    pub fn alignment(&self) -> Option<Alignment> {
        self.props
            .as_ref()?
            .child(tag::JC)?
            .attr(attr::VAL)
            .and_then(Alignment::from_val)
    }

    pub fn set_alignment(&mut self, alignment: Alignment) {
        upsert_ordered(self.props_mut(), tag::JC, PPR_ORDER).set_attr(attr::VAL, alignment.as_val());
    }

    pub fn content(&self) -> &[Inline] {
        &self.content
    }

    /// Runs directly inside the paragraph (not those inside hyperlinks).
    pub fn runs(&self) -> impl Iterator<Item = &Run> {
        self.content.iter().filter_map(|i| match i {
            Inline::Run(r) => Some(r),
            _ => None,
        })
    }

    pub fn runs_mut(&mut self) -> impl Iterator<Item = &mut Run> {
        self.content.iter_mut().filter_map(|i| match i {
            Inline::Run(r) => Some(r),
            _ => None,
        })
    }

    pub fn hyperlinks(&self) -> impl Iterator<Item = &Hyperlink> {
        self.content.iter().filter_map(|i| match i {
            Inline::Hyperlink(h) => Some(h),
            _ => None,
        })
    }

    pub fn bookmarks(&self) -> impl Iterator<Item = &BookmarkStart> {
        self.content.iter().filter_map(|i| match i {
            Inline::BookmarkStart(b) => Some(b),
            _ => None,
        })
    }

    pub fn push_run(&mut self, run: Run) {
        self.content.push(Inline::Run(run));
    }

    pub fn push_hyperlink(&mut self, link: Hyperlink) {
        self.content.push(Inline::Hyperlink(link));
    }

    /// Append a run containing a page break.
    pub fn push_page_break(&mut self) {
        self.push_run(Run::page_break());
    }

    pub fn has_page_break(&self) -> bool {
        self.runs().any(Run::has_page_break)
    }

    /// Whether the last run of the paragraph is a page break.
    pub fn ends_with_page_break(&self) -> bool {
        self.runs().last().is_some_and(Run::has_page_break)
    }

    /// Wrap the paragraph's content in a bookmark: the start marker goes
    /// first, the end marker last.
    pub(crate) fn insert_bookmark(&mut self, id: u32, name: &str) {
        self.content
            .insert(0, Inline::BookmarkStart(BookmarkStart::new(id, name)));
        self.content.push(Inline::BookmarkEnd { id });
    }

    /// Remove both markers of bookmark `id`. Returns whether the start marker
    /// was found.
    pub(crate) fn remove_bookmark(&mut self, id: u32) -> bool {
        remove_bookmark_inlines(&mut self.content, id)
    }

    /// Every internal hyperlink anchor in the paragraph.
    pub fn link_anchors(&self) -> Vec<&str> {
        self.hyperlinks().filter_map(Hyperlink::anchor).collect()
    }

    /// Apply `font` to every run in the paragraph, including runs inside
    /// hyperlinks and opaque inline content. A paragraph without any run gets
    /// the font on its paragraph mark instead.
    pub fn apply_font(&mut self, font: &str) {
        let touched = apply_font_to_inlines(&mut self.content, font);
        if touched == 0 {
            let mark = upsert_ordered(self.props_mut(), tag::RPR, PPR_ORDER);
            set_font_on(mark, font);
        }
    }

    /// Font of every run in the paragraph, in document order.
    pub fn run_fonts(&self) -> Vec<Option<String>> {
        let mut out = Vec::new();
        collect_run_fonts(&self.content, &mut out);
        out
    }

    /// Font on the paragraph mark (`w:pPr/w:rPr`).
    pub fn mark_font(&self) -> Option<&str> {
        font_of(self.props.as_ref()?.child(tag::RPR)?)
    }
}

/// Apply `font` to every run below an opaque block (table, content control).
pub(crate) fn apply_font_to_block(element: &mut Element, font: &str) -> usize {
    set_font_on_nested_runs(element, font)
}

/// Fonts of every run below an opaque block.
pub(crate) fn block_run_fonts(element: &Element) -> Vec<Option<String>> {
    let mut out = Vec::new();
    nested_run_fonts(element, &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx::xml::parse;

    fn paragraph(xml: &str) -> Paragraph {
        let source = format!(r#"<w:p xmlns:w="{W_NAMESPACE}">{xml}</w:p>"#);
        Paragraph::from_element(parse("p.xml", source.as_bytes()).unwrap())
    }

    #[test]
    fn text_concatenates_runs_and_hyperlinks() {
        let p = paragraph(
            r#"<w:r><w:t>1. </w:t></w:r><w:hyperlink w:anchor="x"><w:r><w:t>Song</w:t></w:r></w:hyperlink><w:r><w:tab/><w:t>A</w:t></w:r>"#,
        );
        assert_eq!(p.text(), "1. Song\tA");
        assert_eq!(p.link_anchors(), vec!["x"]);
    }

    #[test]
    fn page_breaks_add_no_text() {
        let mut p = paragraph("<w:r><w:t>=====****=====</w:t></w:r>");
        p.push_page_break();
        assert_eq!(p.text(), "=====****=====");
        assert!(p.ends_with_page_break());
    }

    #[test]
    fn opaque_inline_text_is_included() {
        let p = paragraph(r#"<w:ins w:id="3"><w:r><w:t>inserted</w:t></w:r></w:ins>"#);
        assert_eq!(p.text(), "inserted");
    }

    #[test]
    fn run_properties_are_inserted_in_schema_order() {
        let mut run = Run::with_text("x");
        run.props_mut().set_underline("single");
        run.props_mut().set_color("0563C1");
        run.props_mut().set_font("Georgia");
        run.props_mut().set_bold(true);

        let element = run.to_element();
        let rpr = element.child(tag::RPR).unwrap();
        let names: Vec<&str> = rpr.elements().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["w:rFonts", "w:b", "w:color", "w:u"]);
    }

    #[test]
    fn set_font_drops_theme_fonts() {
        let mut p = paragraph(
            r#"<w:r><w:rPr><w:rFonts w:asciiTheme="minorHAnsi" w:hAnsiTheme="minorHAnsi" w:eastAsia="SimSun"/></w:rPr><w:t>x</w:t></w:r>"#,
        );
        p.apply_font("Georgia");
        let run = p.runs().next().unwrap();
        assert_eq!(run.props().font(), Some("Georgia"));
        let element = run.to_element();
        let fonts = element.child(tag::RPR).unwrap().child(tag::RFONTS).unwrap();
        assert_eq!(fonts.attr("w:asciiTheme"), None);
        assert_eq!(fonts.attr("w:eastAsia"), Some("SimSun"));
    }

    const TEXTBOX_RUN: &str = r#"<w:r><w:rPr><w:rFonts w:ascii="Calibri"/></w:rPr><mc:AlternateContent xmlns:mc="urn:mc"><mc:Choice Requires="wps"><w:drawing><w:txbxContent><w:p><w:r><w:rPr><w:rFonts w:ascii="Arial" w:hAnsi="Arial"/></w:rPr><w:t>boxed</w:t></w:r></w:p></w:txbxContent></w:drawing></mc:Choice><mc:Fallback><w:pict><v:textbox xmlns:v="urn:v"><w:txbxContent><w:p><w:r><w:t>boxed</w:t></w:r></w:p></w:txbxContent></v:textbox></w:pict></mc:Fallback></mc:AlternateContent></w:r>"#;

    #[test]
    fn apply_font_reaches_runs_inside_textboxes() {
        let mut p = paragraph(&format!("<w:r><w:t>Song A</w:t></w:r>{TEXTBOX_RUN}"));
        assert!(p.run_fonts().contains(&Some("Arial".to_string())));

        p.apply_font("Georgia");
        assert_eq!(p.run_fonts(), vec![Some("Georgia".to_string()); 4]);
        let xml = String::from_utf8(crate::docx::xml::write(&p.to_element()).unwrap()).unwrap();
        assert!(!xml.contains("Arial") && !xml.contains("Calibri"), "{xml}");
    }

    #[test]
    fn textbox_and_fallback_text_stay_out_of_paragraph_text() {
        let p = paragraph(&format!("<w:r><w:t>=====****=====</w:t></w:r>{TEXTBOX_RUN}"));
        assert_eq!(p.text(), "=====****=====");

        let choice_only = paragraph(
            r#"<w:r><mc:AlternateContent xmlns:mc="urn:mc"><mc:Choice Requires="w14"><w:t>x</w:t></mc:Choice><mc:Fallback><w:t>x</w:t></mc:Fallback></mc:AlternateContent></w:r>"#,
        );
        assert_eq!(choice_only.text(), "x");
    }

    #[test]
    fn apply_font_reaches_hyperlinks_and_opaque_runs() {
        let mut p = paragraph(
            r#"<w:r><w:t>a</w:t></w:r><w:hyperlink w:anchor="t"><w:r><w:t>b</w:t></w:r></w:hyperlink><w:smartTag><w:r><w:t>c</w:t></w:r></w:smartTag>"#,
        );
        p.apply_font("Georgia");
        assert_eq!(p.run_fonts(), vec![Some("Georgia".to_string()); 3]);
        assert_eq!(p.mark_font(), None);
    }

    #[test]
    fn runless_paragraph_gets_mark_font() {
        let mut p = Paragraph::new();
        p.apply_font("Georgia");
        assert!(p.run_fonts().is_empty());
        assert_eq!(p.mark_font(), Some("Georgia"));
    }

    #[test]
    fn with_text_synthesises_a_run() {
        let p = Paragraph::with_text("Song A");
        assert_eq!(p.runs().count(), 1);
        assert_eq!(Paragraph::with_text("").runs().count(), 0);
    }

    #[test]
    fn alignment_round_trips_through_ppr() {
        let mut p = paragraph(r#"<w:pPr><w:pStyle w:val="Title"/><w:rPr><w:b/></w:rPr></w:pPr>"#);
        p.set_alignment(Alignment::Center);
        assert_eq!(p.alignment(), Some(Alignment::Center));
        let element = p.to_element();
        let ppr = element.child(tag::PPR).unwrap();
        let names: Vec<&str> = ppr.elements().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["w:pStyle", "w:jc", "w:rPr"]);
    }

    #[test]
    fn bookmarks_wrap_content_and_can_be_removed() {
        let mut p = Paragraph::with_text("Song A");
        p.insert_bookmark(7, "song_1");
        assert!(matches!(p.content().first(), Some(Inline::BookmarkStart(b)) if b.id == 7));
        assert!(matches!(p.content().last(), Some(Inline::BookmarkEnd { id: 7 })));
        assert!(p.remove_bookmark(7));
        assert_eq!(p.content().len(), 1);
        assert!(!p.remove_bookmark(7));
    }

    #[test]
    fn internal_hyperlink_is_styled() {
        let link = Hyperlink::internal("Top", "Back", &LinkStyle::default());
        assert_eq!(link.anchor(), Some("Top"));
        let run = link.runs().next().unwrap();
        assert_eq!(run.props().color(), Some("0563C1"));
        assert_eq!(run.props().underline(), Some("single"));
    }

    #[test]
    fn unknown_content_round_trips() {
        let source = r#"<w:proofErr w:type="spellStart"/><w:r w:rsidR="00AB"><w:rPr><w:sz w:val="28"/></w:rPr><w:t xml:space="preserve"> lead</w:t><w:drawing/></w:r><w:bookmarkStart w:id="0" w:name="_GoBack"/><w:bookmarkEnd w:id="0"/>"#;
        let p = paragraph(source);
        let reparsed = Paragraph::from_element(p.to_element());
        assert_eq!(reparsed, p);
        assert_eq!(p.bookmarks().next().map(|b| b.name.as_str()), Some("_GoBack"));
        assert_eq!(p.text(), " lead");
    }

    #[test]
    fn bold_toggle_respects_val() {
        let p = paragraph(r#"<w:r><w:rPr><w:b w:val="0"/></w:rPr><w:t>x</w:t></w:r>"#);
        assert!(!p.runs().next().unwrap().props().is_bold());
        let mut run = Run::with_text("y");
        run.props_mut().set_bold(true);
        assert!(run.props().is_bold());
        run.props_mut().set_bold(false);
        assert!(!run.props().is_bold());
    }
}
