//! The OOXML zip container.
//!
//! A `.docx` is a zip archive of XML parts. [`DocxPackage`] holds every entry
//! in memory in archive order so the reformatter can replace the main
//! document part and write everything else back unchanged.

use crate::docx::xml;
use crate::error::SongbookError;
use std::io::{Cursor, Read, Seek, Write};
use std::path::Path;
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Package-level relationships part.
pub const PACKAGE_RELS: &str = "_rels/.rels";

/// Where Word puts the main document part when `_rels/.rels` says nothing.
pub const DEFAULT_MAIN_PART: &str = "word/document.xml";

const OFFICE_DOCUMENT_REL: &str = "/officeDocument";

/// Upper bound on the buffer reserved up front for one entry. The declared
/// size comes from the archive itself, so it is only a hint.
const MAX_PREALLOC: u64 = 16 * 1024 * 1024;

fn prealloc_hint(declared: u64) -> usize {
    usize::try_from(declared.min(MAX_PREALLOC)).unwrap_or(0)
}

#[derive(Debug, Clone)]
struct Entry {
    name: String,
    data: Vec<u8>,
    stored: bool,
    is_dir: bool,
}

/// In-memory copy of a `.docx` archive.
#[derive(Debug, Clone)]
pub struct DocxPackage {
    entries: Vec<Entry>,
    main_part: String,
}

impl DocxPackage {
    /// Read the archive at `path`.
    pub fn open(path: &Path) -> Result<Self, SongbookError> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(bytes)
    }

    /// Read an archive held in memory.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, SongbookError> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))?;

        let mut entries = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            let mut data = Vec::with_capacity(prealloc_hint(file.size()));
            file.read_to_end(&mut data)?;
            entries.push(Entry {
                name: file.name().to_string(),
                stored: file.compression() == CompressionMethod::Stored,
                is_dir: file.is_dir(),
                data,
            });
        }

        let mut package = Self {
            entries,
            main_part: DEFAULT_MAIN_PART.to_string(),
        };
        package.main_part = package.resolve_main_part()?;
        debug!(
            "Loaded package: {} entries, main part '{}'",
            package.entries.len(),
            package.main_part
        );

        if package.part(&package.main_part).is_none() {
            return Err(SongbookError::MissingPart {
                part: package.main_part.clone(),
            });
        }
        Ok(package)
    }

    /// Follow the `officeDocument` relationship in `_rels/.rels`.
    fn resolve_main_part(&self) -> Result<String, SongbookError> {
        let Some(rels) = self.part(PACKAGE_RELS) else {
            return Ok(DEFAULT_MAIN_PART.to_string());
        };
        let root = xml::parse(PACKAGE_RELS, rels)?;
        let target = root
            .elements()
            .filter(|e| e.local_name() == "Relationship")
            .find(|e| {
                e.attr("Type")
                    .is_some_and(|t| t.ends_with(OFFICE_DOCUMENT_REL))
            })
            .and_then(|e| e.attr("Target"));

        Ok(match target {
            Some(t) => t.trim_start_matches('/').to_string(),
            None => DEFAULT_MAIN_PART.to_string(),
        })
    }

    /// Name of the main document part, e.g. `word/document.xml`.
    pub fn main_part(&self) -> &str {
        &self.main_part
    }

    /// Raw bytes of a part.
    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.data.as_slice())
    }

    /// Replace a part's bytes, or append a new part.
    pub fn set_part(&mut self, name: &str, data: Vec<u8>) {
        match self.entries.iter_mut().find(|e| e.name == name) {
            Some(entry) => entry.data = data,
            None => self.entries.push(Entry {
                name: name.to_string(),
                data,
                stored: false,
                is_dir: false,
            }),
        }
    }

    /// Entry names in archive order.
    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    /// Write the archive, keeping entry order and each entry's compression.
    pub fn write_to<W: Write + Seek>(&self, writer: W) -> Result<W, SongbookError> {
        let mut zip = ZipWriter::new(writer);

        let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        let deflated = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        for entry in &self.entries {
            let options = if entry.stored { stored } else { deflated };
            if entry.is_dir {
                zip.add_directory(entry.name.as_str(), options)?;
                continue;
            }
            zip.start_file(entry.name.as_str(), options)?;
            zip.write_all(&entry.data)?;
        }

        Ok(zip.finish()?)
    }

    /// Serialise to an in-memory archive.
    pub fn to_bytes(&self) -> Result<Vec<u8>, SongbookError> {
        Ok(self.write_to(Cursor::new(Vec::new()))?.into_inner())
    }
}
