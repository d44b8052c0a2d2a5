//! Relationship (.rels) reading.
//!
//! Relationship files form the edges of the part graph. Reading is tolerant:
//! the scan accepts any `Relationship` element that carries all three of
//! `Id`, `Type`, and `Target`, and skips malformed entries, because real-world
//! packages contain invalid fragments and aborting the whole parse is worse
//! than continuing.

use crate::opc::packuri::PackUri;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::collections::HashMap;

/// Relationship type URIs recognized by the part-graph traversal.
pub mod reltype {
    pub const THEME: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme";
    pub const TABLE_STYLES: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/tableStyles";
    pub const SLIDE: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide";
    pub const SLIDE_LAYOUT: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout";
    pub const SLIDE_MASTER: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster";
    pub const IMAGE: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";
    pub const CHART: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/chart";
    pub const DIAGRAM_DATA: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/diagramData";
    pub const DIAGRAM_LAYOUT: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/diagramLayout";
    pub const HYPERLINK: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink";
}

/// A single relationship from a source part to a target.
#[derive(Debug, Clone)]
pub struct Relationship {
    /// Relationship ID (e.g. "rId1").
    pub id: String,
    /// Relationship type URI.
    pub reltype: String,
    /// Target reference as written, possibly relative.
    pub target: String,
    /// Whether the target is external to the package (a URL).
    pub is_external: bool,
}

/// The relationships of one source part, indexed by id.
#[derive(Debug, Default)]
pub struct Relationships {
    /// Directory of the source part, for resolving relative targets.
    base_dir: String,
    rels: HashMap<String, Relationship>,
}

impl Relationships {
    /// Parse the `.rels` text belonging to `source_part`.
    ///
    /// `text` may be `None` (no relationship file); that yields an empty
    /// collection. Entries missing any of `Id`/`Type`/`Target` are skipped.
    pub fn parse(source_part: &PackUri, text: Option<&str>) -> Self {
        let mut rels = HashMap::new();
        if let Some(text) = text {
            let mut reader = Reader::from_str(text);
            loop {
                match reader.read_event() {
                    Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                        if e.local_name().as_ref() == b"Relationship"
                            && let Some(rel) = read_relationship(e)
                        {
                            rels.insert(rel.id.clone(), rel);
                        }
                    },
                    Ok(Event::Eof) | Err(_) => break,
                    _ => {},
                }
            }
        }
        Self {
            base_dir: source_part.base_dir().to_string(),
            rels,
        }
    }

    /// Look up a relationship by id.
    #[inline]
    pub fn get(&self, id: &str) -> Option<&Relationship> {
        self.rels.get(id)
    }

    /// Resolve an internal relationship id to an absolute part name.
    ///
    /// Returns `None` for unknown ids and for external targets.
    pub fn target_uri(&self, id: &str) -> Option<PackUri> {
        let rel = self.rels.get(id)?;
        if rel.is_external {
            return None;
        }
        Some(PackUri::resolve(&self.base_dir, &rel.target))
    }

    /// Resolve an external relationship id to its URL.
    pub fn external_target(&self, id: &str) -> Option<&str> {
        let rel = self.rels.get(id)?;
        rel.is_external.then_some(rel.target.as_str())
    }

    /// The first relationship of the given type, resolved to a part name.
    pub fn first_of_type(&self, reltype: &str) -> Option<PackUri> {
        let mut matches: Vec<&Relationship> = self
            .rels
            .values()
            .filter(|rel| rel.reltype == reltype && !rel.is_external)
            .collect();
        // HashMap order is arbitrary; pick the lowest rId for determinism.
        matches.sort_by(|a, b| compare_rel_ids(&a.id, &b.id));
        matches
            .first()
            .map(|rel| PackUri::resolve(&self.base_dir, &rel.target))
    }

    /// All relationships of the given type, resolved, ordered by id.
    pub fn all_of_type(&self, reltype: &str) -> Vec<(String, PackUri)> {
        let mut matches: Vec<&Relationship> = self
            .rels
            .values()
            .filter(|rel| rel.reltype == reltype && !rel.is_external)
            .collect();
        matches.sort_by(|a, b| compare_rel_ids(&a.id, &b.id));
        matches
            .into_iter()
            .map(|rel| (rel.id.clone(), PackUri::resolve(&self.base_dir, &rel.target)))
            .collect()
    }

    /// Number of relationships.
    #[inline]
    pub fn len(&self) -> usize {
        self.rels.len()
    }

    /// Whether the collection is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rels.is_empty()
    }
}

/// Order "rId10" after "rId2" by comparing the numeric suffix when present.
fn compare_rel_ids(a: &str, b: &str) -> std::cmp::Ordering {
    let num = |id: &str| id.strip_prefix("rId").and_then(|n| n.parse::<u32>().ok());
    match (num(a), num(b)) {
        (Some(x), Some(y)) => x.cmp(&y),
        _ => a.cmp(b),
    }
}

fn read_relationship(e: &BytesStart) -> Option<Relationship> {
    let mut id = None;
    let mut reltype = None;
    let mut target = None;
    let mut is_external = false;
    for attr in e.attributes().flatten() {
        let value = attr.unescape_value().ok()?;
        match attr.key.as_ref() {
            b"Id" => id = Some(value.into_owned()),
            b"Type" => reltype = Some(value.into_owned()),
            b"Target" => target = Some(value.into_owned()),
            b"TargetMode" => is_external = value.as_ref() == "External",
            _ => {},
        }
    }
    Some(Relationship {
        id: id?,
        reltype: reltype?,
        target: target?,
        is_external,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const RELS: &str = r#"<?xml version="1.0"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout" Target="../slideLayouts/slideLayout1.xml"/>
  <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="../media/image1.png"/>
  <Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink" Target="https://example.com" TargetMode="External"/>
  <Relationship Id="rId4" Target="missing-type.xml"/>
</Relationships>"#;

    fn slide_rels() -> Relationships {
        Relationships::parse(&PackUri::new("ppt/slides/slide1.xml"), Some(RELS))
    }

    #[test]
    fn test_malformed_entries_skipped() {
        let rels = slide_rels();
        assert_eq!(rels.len(), 3);
        assert!(rels.get("rId4").is_none());
    }

    #[test]
    fn test_target_resolution() {
        let rels = slide_rels();
        let uri = rels.target_uri("rId1").unwrap();
        assert_eq!(uri.as_str(), "ppt/slideLayouts/slideLayout1.xml");
    }

    #[test]
    fn test_external_target() {
        let rels = slide_rels();
        assert!(rels.target_uri("rId3").is_none());
        assert_eq!(rels.external_target("rId3"), Some("https://example.com"));
    }

    #[test]
    fn test_first_of_type() {
        let rels = slide_rels();
        let layout = rels.first_of_type(reltype::SLIDE_LAYOUT).unwrap();
        assert_eq!(layout.as_str(), "ppt/slideLayouts/slideLayout1.xml");
        assert!(rels.first_of_type(reltype::CHART).is_none());
    }

    #[test]
    fn test_missing_rels_file_is_empty() {
        let rels = Relationships::parse(&PackUri::new("ppt/presentation.xml"), None);
        assert!(rels.is_empty());
    }
}
