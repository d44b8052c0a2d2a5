//! The physical package: a ZIP archive materialized into an entry map.
//!
//! All entries are read up front; later part access is in-memory and
//! synchronous. A package that is not a valid ZIP fails to open with
//! [`ParseError::ArchiveCorrupt`]; a missing entry is simply absent, never an
//! error.

use crate::error::{ParseError, Result};
use crate::opc::packuri::PackUri;
use std::collections::HashMap;
use std::io::{Cursor, Read};
use zip::ZipArchive;

/// An OPC package loaded into memory.
pub struct Package {
    /// Archive-internal path (no leading slash) to entry bytes.
    entries: HashMap<String, Vec<u8>>,
}

impl std::fmt::Debug for Package {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Package")
            .field("entry_count", &self.entries.len())
            .finish()
    }
}

impl Package {
    /// Load a package from raw archive bytes.
    pub fn load(data: &[u8]) -> Result<Self> {
        let mut archive = ZipArchive::new(Cursor::new(data))
            .map_err(|e| ParseError::ArchiveCorrupt(e.to_string()))?;

        let mut entries = HashMap::with_capacity(archive.len());
        for index in 0..archive.len() {
            let Ok(mut file) = archive.by_index(index) else {
                continue;
            };
            if file.is_dir() {
                continue;
            }
            let name = file.name().trim_start_matches('/').to_string();
            let mut bytes = Vec::with_capacity(file.size() as usize);
            if file.read_to_end(&mut bytes).is_ok() {
                entries.insert(name, bytes);
            }
        }

        Ok(Self { entries })
    }

    /// Whether a part exists in the package.
    #[inline]
    pub fn contains(&self, uri: &PackUri) -> bool {
        self.entries.contains_key(uri.as_str())
    }

    /// Raw bytes of a part, or `None` when the path is missing.
    #[inline]
    pub fn bytes(&self, uri: &PackUri) -> Option<&[u8]> {
        self.entries.get(uri.as_str()).map(Vec::as_slice)
    }

    /// Text of a part, normalized for parsing.
    ///
    /// UTF-8 with a stripped BOM; CRLF and bare CR collapsed to LF. Invalid
    /// UTF-8 sequences are replaced rather than rejected. Returns `None` when
    /// the path is missing.
    pub fn normalized_text(&self, uri: &PackUri) -> Option<String> {
        let bytes = self.bytes(uri)?;
        Some(normalize_text(bytes))
    }

    /// Iterate all entry paths in the package.
    pub fn entry_names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of entries in the package.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the package holds no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Decode bytes as UTF-8, strip a BOM, and collapse CRLF/CR to LF.
fn normalize_text(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    let text = String::from_utf8_lossy(bytes);
    if !text.contains('\r') {
        return text.into_owned();
    }
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\r' {
            if chars.peek() == Some(&'\n') {
                chars.next();
            }
            out.push('\n');
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn archive_with(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let opts = SimpleFileOptions::default();
        for (name, bytes) in entries {
            writer.start_file(*name, opts).unwrap();
            writer.write_all(bytes).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_load_and_lookup() {
        let data = archive_with(&[("ppt/presentation.xml", b"<presentation/>")]);
        let pkg = Package::load(&data).unwrap();
        assert_eq!(pkg.len(), 1);
        assert!(pkg.contains(&PackUri::new("ppt/presentation.xml")));
        assert!(!pkg.contains(&PackUri::new("ppt/other.xml")));
    }

    #[test]
    fn test_corrupt_archive_is_fatal() {
        let err = Package::load(b"definitely not a zip").unwrap_err();
        assert!(matches!(err, ParseError::ArchiveCorrupt(_)));
    }

    #[test]
    fn test_missing_entry_is_none() {
        let data = archive_with(&[("a.xml", b"<a/>")]);
        let pkg = Package::load(&data).unwrap();
        assert!(pkg.normalized_text(&PackUri::new("b.xml")).is_none());
    }

    #[test]
    fn test_normalized_text_strips_bom_and_crlf() {
        let data = archive_with(&[("a.xml", b"\xEF\xBB\xBF<a>line1\r\nline2\rline3</a>")]);
        let pkg = Package::load(&data).unwrap();
        let text = pkg.normalized_text(&PackUri::new("a.xml")).unwrap();
        assert_eq!(text, "<a>line1\nline2\nline3</a>");
    }
}
