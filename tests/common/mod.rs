//! Builders for small `.docx` fixtures.

#![allow(dead_code)]

use bansuri_songbook::docx::model::W_NAMESPACE;
use bansuri_songbook::Document;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

pub const CONTENT_TYPES: &[u8] = br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

pub const PACKAGE_RELS: &[u8] = br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

pub const STYLES: &[u8] = br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:docDefaults><w:rPrDefault><w:rPr><w:rFonts w:asciiTheme="minorHAnsi"/></w:rPr></w:rPrDefault></w:docDefaults></w:styles>"#;

/// Body XML for a list of paragraph texts; `""` becomes an empty paragraph.
pub fn body_xml(texts: &[&str]) -> String {
    texts
        .iter()
        .map(|t| {
            if t.is_empty() {
                "<w:p/>".to_string()
            } else {
                format!(
                    r#"<w:p><w:r><w:rPr><w:rFonts w:ascii="Calibri" w:hAnsi="Calibri"/></w:rPr><w:t xml:space="preserve">{t}</w:t></w:r></w:p>"#
                )
            }
        })
        .collect()
}

pub fn document_xml(body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="{W_NAMESPACE}" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><w:body>{body}<w:sectPr><w:pgSz w:w="11906" w:h="16838"/></w:sectPr></w:body></w:document>"#
    )
}

/// A minimal but Word-shaped archive. `word/styles.xml` is stored, the rest
/// deflated.
pub fn docx_bytes(body: &str) -> Vec<u8> {
    let deflated = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

    let document = document_xml(body);
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let parts: [(&str, &[u8], SimpleFileOptions); 4] = [
        ("[Content_Types].xml", CONTENT_TYPES, deflated),
        ("_rels/.rels", PACKAGE_RELS, deflated),
        ("word/document.xml", document.as_bytes(), deflated),
        ("word/styles.xml", STYLES, stored),
    ];
    for (name, data, options) in parts {
        zip.start_file(name, options).unwrap();
        zip.write_all(data).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

/// Write a fixture built from paragraph texts into `dir`.
pub fn write_songbook(dir: &Path, name: &str, texts: &[&str]) -> PathBuf {
    write_docx(dir, name, &body_xml(texts))
}

pub fn write_docx(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, docx_bytes(body)).unwrap();
    path
}

/// Re-open a written `.docx` and parse its main part.
pub fn read_document(path: &Path) -> Document {
    let package = bansuri_songbook::DocxPackage::open(path).unwrap();
    let part = package.main_part().to_string();
    Document::from_xml(&part, package.part(&part).unwrap()).unwrap()
}

pub fn texts(document: &Document) -> Vec<String> {
    document.paragraphs().map(|(_, p)| p.text()).collect()
}
