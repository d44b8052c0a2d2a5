//! Owned XML tree with namespace-qualified access.
//!
//! Every parser above the container layer consumes this interface instead of
//! raw quick-xml events, so the DOM implementation stays swappable. Trees are
//! small (one per package part) and fully owned; no node references survive
//! past the parse that built them.
//!
//! A part whose XML fails to parse yields the empty tree: subsequent lookups
//! return nothing and the parse of the rest of the package continues.

use once_cell::sync::Lazy;
use quick_xml::NsReader;
use quick_xml::events::Event;
use quick_xml::name::ResolveResult;

/// Namespace URIs matched by URI, never by prefix.
pub mod ns {
    /// PresentationML main.
    pub const PML: &str = "http://schemas.openxmlformats.org/presentationml/2006/main";
    /// DrawingML main.
    pub const DML: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
    /// DrawingML charts.
    pub const CHART: &str = "http://schemas.openxmlformats.org/drawingml/2006/chart";
    /// `graphicData` uri for embedded tables.
    pub const TABLE: &str = "http://schemas.openxmlformats.org/drawingml/2006/table";
    /// DrawingML diagrams (SmartArt data/layout parts).
    pub const DIAGRAM: &str = "http://schemas.openxmlformats.org/drawingml/2006/diagram";
    /// Microsoft diagram drawing extension (prebaked SmartArt drawings).
    pub const DIAGRAM_DRAWING: &str = "http://schemas.microsoft.com/office/drawing/2008/diagram";
    /// Office document relationships (the `r:` attribute namespace).
    pub const REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
}

/// One element of a parsed part.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct XmlNode {
    /// Name as written in the source, prefix included.
    qname: String,
    /// Local name.
    name: String,
    /// Resolved namespace URI, when the prefix was bound.
    ns: Option<String>,
    /// Attributes as written: (qualified key, unescaped value).
    attrs: Vec<(String, String)>,
    children: Vec<XmlNode>,
    /// Concatenated direct text and CDATA content.
    text: String,
}

impl XmlNode {
    /// The empty tree. All lookups yield nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether this is the empty tree.
    pub fn is_empty(&self) -> bool {
        self.name.is_empty() && self.children.is_empty()
    }

    /// Parse a document and return its root element.
    pub fn parse(text: &str) -> Result<XmlNode, String> {
        let mut reader = NsReader::from_str(text);
        // Whitespace-only text between elements is noise for this grammar.
        reader.config_mut().trim_text(true);

        let mut stack: Vec<XmlNode> = Vec::new();
        let mut root: Option<XmlNode> = None;

        loop {
            match reader.read_resolved_event() {
                Ok((res, Event::Start(e))) => {
                    let node = element_from_event(&res, &e).map_err(|err| err.to_string())?;
                    stack.push(node);
                },
                Ok((res, Event::Empty(e))) => {
                    let node = element_from_event(&res, &e).map_err(|err| err.to_string())?;
                    attach(&mut stack, &mut root, node)?;
                },
                Ok((_, Event::End(_))) => {
                    let node = stack.pop().ok_or("unexpected closing tag")?;
                    attach(&mut stack, &mut root, node)?;
                },
                Ok((_, Event::Text(t))) => {
                    if let Some(current) = stack.last_mut() {
                        let content = t.xml_content().map_err(|err| err.to_string())?;
                        current.text.push_str(&content);
                    }
                },
                Ok((_, Event::CData(t))) => {
                    if let Some(current) = stack.last_mut() {
                        current.text.push_str(&String::from_utf8_lossy(&t.into_inner()));
                    }
                },
                Ok((_, Event::Eof)) => break,
                Ok(_) => {},
                Err(e) => return Err(e.to_string()),
            }
        }

        if !stack.is_empty() {
            return Err("unclosed element at end of document".to_string());
        }
        root.ok_or_else(|| "document has no root element".to_string())
    }

    /// Parse a fragment captured by [`XmlNode::outer_xml`].
    ///
    /// Fragments lose the document's namespace declarations, so the standard
    /// presentation prefixes are rebound around them. Returns the empty tree
    /// on failure.
    pub fn parse_fragment(text: &str) -> XmlNode {
        static FRAGMENT_PREFIX: Lazy<String> = Lazy::new(|| {
            format!(
                "<frag xmlns:a=\"{}\" xmlns:p=\"{}\" xmlns:r=\"{}\" xmlns:c=\"{}\" \
                 xmlns:dgm=\"{}\" xmlns:dsp=\"{}\">",
                ns::DML,
                ns::PML,
                ns::REL,
                ns::CHART,
                ns::DIAGRAM,
                ns::DIAGRAM_DRAWING,
            )
        });
        if text.is_empty() {
            return XmlNode::empty();
        }
        let wrapped = format!("{}{}</frag>", *FRAGMENT_PREFIX, text);
        match XmlNode::parse(&wrapped) {
            Ok(mut frag) if !frag.children.is_empty() => frag.children.remove(0),
            _ => XmlNode::empty(),
        }
    }

    /// Local name of this element.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Resolved namespace URI, when bound.
    #[inline]
    pub fn namespace(&self) -> Option<&str> {
        self.ns.as_deref()
    }

    /// Whether this element has the given namespace URI and local name.
    ///
    /// An element whose prefix was never bound (a reparsed fragment with an
    /// unknown prefix) matches on local name alone.
    pub fn is(&self, ns_uri: &str, local: &str) -> bool {
        self.name == local && self.ns.as_deref().is_none_or(|uri| uri == ns_uri)
    }

    /// First child with the given namespace URI and local name.
    pub fn child(&self, ns_uri: &str, local: &str) -> Option<&XmlNode> {
        self.children.iter().find(|c| c.is(ns_uri, local))
    }

    /// All children with the given namespace URI and local name, in order.
    pub fn children(&self, ns_uri: &str, local: &str) -> impl Iterator<Item = &XmlNode> {
        self.children.iter().filter(move |c| c.is(ns_uri, local))
    }

    /// First child with the given local name, any namespace.
    pub fn child_local(&self, local: &str) -> Option<&XmlNode> {
        self.children.iter().find(|c| c.name == local)
    }

    /// All direct children, in document order.
    #[inline]
    pub fn all_children(&self) -> &[XmlNode] {
        &self.children
    }

    /// Depth-first descendants with the given local name, any namespace.
    pub fn descendants_local<'a>(&'a self, local: &'a str) -> Vec<&'a XmlNode> {
        let mut out = Vec::new();
        collect_descendants(self, local, &mut out);
        out
    }

    /// Attribute value by local name.
    ///
    /// Matches `id`, `r:id`, or any other prefix carrying the same local
    /// part; attribute namespaces are not significant in this grammar.
    pub fn attr(&self, local: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| {
                key.as_str() == local
                    || key
                        .rsplit_once(':')
                        .is_some_and(|(_, key_local)| key_local == local)
            })
            .map(|(_, value)| value.as_str())
    }

    /// Attribute parsed as `i64`.
    pub fn attr_i64(&self, local: &str) -> Option<i64> {
        self.attr(local)?.parse().ok()
    }

    /// Attribute parsed as `f64`.
    pub fn attr_f64(&self, local: &str) -> Option<f64> {
        self.attr(local)?.parse().ok()
    }

    /// Attribute parsed as an OOXML boolean (`1`/`true`).
    pub fn attr_bool(&self, local: &str) -> Option<bool> {
        self.attr(local).map(|v| v == "1" || v == "true")
    }

    /// Direct text content of this element.
    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Text of this element and all descendants, concatenated in order.
    pub fn deep_text(&self) -> String {
        let mut out = String::new();
        collect_text(self, &mut out);
        out
    }

    /// Reserialize this element and its subtree.
    ///
    /// Prefixes are kept as written; namespace declarations from ancestors
    /// are not replayed, so feed the result to [`XmlNode::parse_fragment`]
    /// (which rebinds the standard prefixes) rather than [`XmlNode::parse`].
    pub fn outer_xml(&self) -> String {
        let mut out = String::new();
        write_node(self, &mut out);
        out
    }
}

fn attach(
    stack: &mut Vec<XmlNode>,
    root: &mut Option<XmlNode>,
    node: XmlNode,
) -> Result<(), String> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(node);
    } else if root.is_none() {
        *root = Some(node);
    } else {
        return Err("multiple root elements".to_string());
    }
    Ok(())
}

fn element_from_event(
    res: &ResolveResult,
    e: &quick_xml::events::BytesStart,
) -> Result<XmlNode, quick_xml::Error> {
    let qname = String::from_utf8_lossy(e.name().as_ref()).into_owned();
    let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
    let ns_uri = match res {
        ResolveResult::Bound(uri) => Some(String::from_utf8_lossy(uri.as_ref()).into_owned()),
        _ => None,
    };
    let mut attrs = Vec::new();
    for attr in e.attributes().with_checks(false).flatten() {
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        if key == "xmlns" || key.starts_with("xmlns:") {
            continue;
        }
        let value = attr
            .unescape_value()
            .map(|v| v.into_owned())
            .unwrap_or_else(|_| String::from_utf8_lossy(&attr.value).into_owned());
        attrs.push((key, value));
    }
    Ok(XmlNode {
        qname,
        name,
        ns: ns_uri,
        attrs,
        children: Vec::new(),
        text: String::new(),
    })
}

fn collect_descendants<'a>(node: &'a XmlNode, local: &str, out: &mut Vec<&'a XmlNode>) {
    for child in &node.children {
        if child.name == local {
            out.push(child);
        }
        collect_descendants(child, local, out);
    }
}

fn collect_text(node: &XmlNode, out: &mut String) {
    out.push_str(&node.text);
    for child in &node.children {
        collect_text(child, out);
    }
}

fn write_node(node: &XmlNode, out: &mut String) {
    out.push('<');
    out.push_str(&node.qname);
    for (key, value) in &node.attrs {
        out.push(' ');
        out.push_str(key);
        out.push_str("=\"");
        out.push_str(&escape(value));
        out.push('"');
    }
    if node.children.is_empty() && node.text.is_empty() {
        out.push_str("/>");
        return;
    }
    out.push('>');
    out.push_str(&escape(&node.text));
    for child in &node.children {
        write_node(child, out);
    }
    out.push_str("</");
    out.push_str(&node.qname);
    out.push('>');
}

fn escape(s: &str) -> String {
    if !s.contains(['&', '<', '>', '"', '\'']) {
        return s.to_string();
    }
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"<p:sld xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"
        xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main"
        xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
      <p:cSld name="Intro">
        <p:spTree>
          <p:sp>
            <p:txBody><a:p><a:r><a:t>Hello &amp; welcome</a:t></a:r></a:p></p:txBody>
          </p:sp>
          <p:pic><p:blipFill><a:blip r:embed="rId3"/></p:blipFill></p:pic>
        </p:spTree>
      </p:cSld>
    </p:sld>"#;

    #[test]
    fn test_namespace_qualified_lookup() {
        let root = XmlNode::parse(DOC).unwrap();
        assert!(root.is(ns::PML, "sld"));
        let csld = root.child(ns::PML, "cSld").unwrap();
        assert_eq!(csld.attr("name"), Some("Intro"));
        // The DML namespace must not match a PML element.
        assert!(root.child(ns::DML, "cSld").is_none());
    }

    #[test]
    fn test_text_unescaped() {
        let root = XmlNode::parse(DOC).unwrap();
        let tree = root.child(ns::PML, "cSld").unwrap().child(ns::PML, "spTree").unwrap();
        let sp = tree.child(ns::PML, "sp").unwrap();
        assert_eq!(sp.deep_text(), "Hello & welcome");
    }

    #[test]
    fn test_prefixed_attribute_by_local_name() {
        let root = XmlNode::parse(DOC).unwrap();
        let blips = root.descendants_local("blip");
        assert_eq!(blips.len(), 1);
        assert_eq!(blips[0].attr("embed"), Some("rId3"));
    }

    #[test]
    fn test_syntax_error_reported() {
        assert!(XmlNode::parse("<a><b></a>").is_err());
        assert!(XmlNode::parse("").is_err());
    }

    #[test]
    fn test_fragment_round_trip() {
        let root = XmlNode::parse(DOC).unwrap();
        let pic = root.descendants_local("pic")[0];
        let raw = pic.outer_xml();
        let reparsed = XmlNode::parse_fragment(&raw);
        assert!(reparsed.is(ns::PML, "pic"));
        let blip = reparsed.descendants_local("blip")[0];
        assert_eq!(blip.attr("embed"), Some("rId3"));
    }

    #[test]
    fn test_empty_tree_lookups() {
        let empty = XmlNode::empty();
        assert!(empty.is_empty());
        assert!(empty.child(ns::PML, "cSld").is_none());
        assert!(empty.attr("name").is_none());
        assert!(empty.descendants_local("sp").is_empty());
    }
}
