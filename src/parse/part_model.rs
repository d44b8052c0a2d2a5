//! Master and layout part models.
//!
//! A part model indexes what a slide inherits from one ancestor part: its
//! placeholders (keyed `idx_<n>` when an index exists, by type otherwise),
//! the shape tree for the static pass, default text styles, and the color
//! map. Part models live only while one slide's ancestry is being parsed.

use crate::drawing::color::ColorMap;
use crate::text::style::{DefaultTextStyles, ListStyle};
use crate::xml::{XmlNode, ns};
use std::collections::HashMap;

/// Placeholder types that only render when the header/footer element
/// enables them.
pub const SPECIAL_PH_TYPES: [&str; 3] = ["dt", "ftr", "sldNum"];

/// One placeholder slot of a master or layout.
#[derive(Debug, Clone)]
pub struct Placeholder {
    pub key: String,
    pub ph_type: String,
    pub idx: Option<i64>,
    /// The whole shape node, for property and transform inheritance.
    pub shape: XmlNode,
    pub list_style: Option<ListStyle>,
    /// Raw text body, inherited when the slide's own body is empty.
    pub tx_body: Option<XmlNode>,
}

/// Header/footer visibility switches from `p:hf`.
#[derive(Debug, Clone, Copy)]
pub struct HeaderFooter {
    pub dt: bool,
    pub ftr: bool,
    pub sld_num: bool,
}

impl Default for HeaderFooter {
    fn default() -> Self {
        Self {
            dt: true,
            ftr: true,
            sld_num: true,
        }
    }
}

impl HeaderFooter {
    pub fn parse(node: Option<&XmlNode>) -> HeaderFooter {
        let Some(node) = node else {
            return HeaderFooter::default();
        };
        let flag = |name: &str| node.attr_bool(name).unwrap_or(true);
        HeaderFooter {
            dt: flag("dt"),
            ftr: flag("ftr"),
            sld_num: flag("sldNum"),
        }
    }

    /// Whether a placeholder type is visible under these switches.
    pub fn shows(&self, ph_type: &str) -> bool {
        match ph_type {
            "dt" => self.dt,
            "ftr" => self.ftr,
            "sldNum" => self.sld_num,
            _ => true,
        }
    }
}

/// The parsed model of a master or layout part.
#[derive(Debug, Clone, Default)]
pub struct PartModel {
    pub placeholders: HashMap<String, Placeholder>,
    /// The part's `spTree`, for the static shape pass in document order.
    pub sp_tree: XmlNode,
    /// Master only: `txStyles` defaults.
    pub default_text_styles: Option<DefaultTextStyles>,
    /// Master: `clrMap`.
    pub color_map: Option<ColorMap>,
    /// Layout: `clrMapOvr/overrideClrMapping`, merged over the master's map.
    pub color_map_override: Option<ColorMap>,
    /// The part's background element, if any.
    pub bg: Option<XmlNode>,
    pub header_footer: HeaderFooter,
}

impl PartModel {
    /// Parse a `p:sldMaster` or `p:sldLayout` root.
    pub fn parse(root: &XmlNode) -> PartModel {
        let mut model = PartModel::default();

        if let Some(c_sld) = root.child(ns::PML, "cSld") {
            model.bg = c_sld.child(ns::PML, "bg").cloned();
            if let Some(sp_tree) = c_sld.child(ns::PML, "spTree") {
                model.sp_tree = sp_tree.clone();
                for shape in sp_tree.all_children() {
                    if shape.name() == "sp"
                        && let Some(placeholder) = parse_placeholder(shape)
                    {
                        model
                            .placeholders
                            .insert(placeholder.key.clone(), placeholder);
                    }
                }
            }
        }

        model.default_text_styles = root
            .child(ns::PML, "txStyles")
            .map(DefaultTextStyles::parse);
        model.color_map = root.child(ns::PML, "clrMap").map(ColorMap::parse);
        model.color_map_override = root.child(ns::PML, "clrMapOvr").map(|ovr| {
            ovr.child(ns::DML, "overrideClrMapping")
                .map(ColorMap::parse)
                .unwrap_or_default()
        });
        model.header_footer = HeaderFooter::parse(root.child(ns::PML, "hf"));

        model
    }

    /// Look up a placeholder by key, falling back to the first placeholder
    /// whose type matches when no exact key exists.
    pub fn placeholder(&self, key: &str, ph_type: &str) -> Option<&Placeholder> {
        if let Some(found) = self.placeholders.get(key) {
            return Some(found);
        }
        self.placeholders
            .values()
            .find(|candidate| candidate.ph_type == ph_type)
    }
}

/// The placeholder element of a shape's non-visual properties, if any.
pub fn placeholder_node(shape: &XmlNode) -> Option<&XmlNode> {
    let nv = shape
        .all_children()
        .iter()
        .find(|child| child.name().starts_with("nv") && child.name().ends_with("Pr"))?;
    nv.child(ns::PML, "nvPr")
        .or_else(|| Some(nv))
        .and_then(|nv_pr| nv_pr.descendants_local("ph").first().copied())
}

/// Placeholder key and type for a shape node.
///
/// Key is `idx_<n>` when an `idx` attribute exists, the type otherwise.
/// A present `idx` with a missing `type` implies `body`.
pub fn placeholder_key(shape: &XmlNode) -> Option<(String, String, Option<i64>)> {
    let ph = placeholder_node(shape)?;
    let idx = ph.attr_i64("idx");
    let ph_type = ph
        .attr("type")
        .map(str::to_string)
        .unwrap_or_else(|| "body".to_string());
    let key = match idx {
        Some(idx) => format!("idx_{idx}"),
        None => ph_type.clone(),
    };
    Some((key, ph_type, idx))
}

fn parse_placeholder(shape: &XmlNode) -> Option<Placeholder> {
    let (key, ph_type, idx) = placeholder_key(shape)?;
    let tx_body = shape.child(ns::PML, "txBody").cloned();
    let list_style = tx_body
        .as_ref()
        .and_then(|body| body.child(ns::DML, "lstStyle"))
        .map(ListStyle::parse)
        .filter(|style| !style.is_empty());
    Some(Placeholder {
        key,
        ph_type,
        idx,
        shape: shape.clone(),
        list_style,
        tx_body,
    })
}
