//! Table styles: the `tableStyles.xml` part and per-cell resolution.
//!
//! A table style carries up to 13 named parts. Which parts apply to a cell
//! depends on its grid position and the table's option booleans; precedence
//! rises from `wholeTbl` through banding and edges to the corners. Fills and
//! borders inside parts are kept as raw trees because their scheme colors
//! resolve against the slide's color map, not the style part's.

use crate::drawing::color::ColorDef;
use crate::drawing::properties::{SlideContext, parse_fill, parse_stroke};
use crate::scene::{Borders, Fill, Stroke};
use crate::xml::{XmlNode, ns};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::HashMap;

/// Style part names in increasing precedence.
pub const PART_NAMES: [&str; 13] = [
    "wholeTbl", "band1H", "band2H", "band1V", "band2V", "firstCol", "lastCol", "firstRow",
    "lastRow", "nwCell", "neCell", "swCell", "seCell",
];

const BORDER_SIDES: [&str; 4] = ["left", "right", "top", "bottom"];

/// Text formatting hints carried by a style part's `tcTxStyle`.
#[derive(Debug, Clone, Default)]
pub struct TcTextStyle {
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub color: Option<ColorDef>,
}

impl TcTextStyle {
    /// Shallow per-field merge, `other` winning.
    pub fn merged_with(&self, other: &TcTextStyle) -> TcTextStyle {
        TcTextStyle {
            bold: other.bold.or(self.bold),
            italic: other.italic.or(self.italic),
            color: other.color.clone().or_else(|| self.color.clone()),
        }
    }
}

/// One named part of a table style.
#[derive(Debug, Clone, Default)]
pub struct TableStylePart {
    /// Raw fill element from `tcStyle`.
    pub fill: Option<XmlNode>,
    /// Side name → raw `ln` element.
    pub borders: HashMap<String, XmlNode>,
    pub text: TcTextStyle,
}

/// A complete table style.
#[derive(Debug, Clone, Default)]
pub struct TableStyle {
    pub id: String,
    pub name: Option<String>,
    pub parts: HashMap<String, TableStylePart>,
}

/// All styles of the `tableStyles.xml` part.
#[derive(Debug, Clone, Default)]
pub struct TableStyles {
    pub styles: HashMap<String, TableStyle>,
    pub default_id: Option<String>,
}

impl Serialize for TableStyles {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut ids: Vec<&String> = self.styles.keys().collect();
        ids.sort();
        let mut map = serializer.serialize_map(Some(ids.len()))?;
        for id in ids {
            let style = &self.styles[id];
            let mut parts: Vec<&str> = style.parts.keys().map(String::as_str).collect();
            parts.sort();
            map.serialize_entry(
                id,
                &StyleSummary {
                    name: style.name.as_deref(),
                    parts,
                },
            )?;
        }
        map.end()
    }
}

/// Compact per-style view used only for serialization.
#[derive(Serialize)]
struct StyleSummary<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    parts: Vec<&'a str>,
}

impl TableStyles {
    /// Parse the root `a:tblStyleLst` element.
    pub fn parse(root: &XmlNode) -> TableStyles {
        let default_id = root
            .attr("def")
            .filter(|id| !id.is_empty())
            .map(str::to_string);
        let mut styles = HashMap::new();
        for style_node in root.children(ns::DML, "tblStyle") {
            let Some(id) = style_node.attr("styleId") else {
                continue;
            };
            let mut style = TableStyle {
                id: id.to_string(),
                name: style_node.attr("styleName").map(str::to_string),
                parts: HashMap::new(),
            };
            for part_node in style_node.all_children() {
                if PART_NAMES.contains(&part_node.name()) {
                    style
                        .parts
                        .insert(part_node.name().to_string(), parse_part(part_node));
                }
            }
            styles.insert(id.to_string(), style);
        }
        TableStyles { styles, default_id }
    }

    pub fn get(&self, id: &str) -> Option<&TableStyle> {
        self.styles.get(id)
    }

    pub fn default_style(&self) -> Option<&TableStyle> {
        self.styles.get(self.default_id.as_deref()?)
    }
}

fn parse_part(part_node: &XmlNode) -> TableStylePart {
    let mut part = TableStylePart::default();

    if let Some(tc_style) = part_node.child(ns::DML, "tcStyle") {
        part.fill = tc_style
            .child(ns::DML, "fill")
            .and_then(|fill| fill.all_children().first().cloned())
            .or_else(|| {
                // Direct fill element without the wrapper.
                tc_style
                    .all_children()
                    .iter()
                    .find(|child| child.name().ends_with("Fill") || child.name() == "noFill")
                    .cloned()
            });
        if let Some(borders) = tc_style.child(ns::DML, "tcBdr") {
            for side in BORDER_SIDES {
                if let Some(side_node) = borders.child(ns::DML, side)
                    && let Some(ln) = side_node.child(ns::DML, "ln")
                {
                    part.borders.insert(side.to_string(), ln.clone());
                }
            }
        }
    }

    if let Some(tx) = part_node.child(ns::DML, "tcTxStyle") {
        part.text = TcTextStyle {
            bold: tx.attr("b").map(|v| v == "on" || v == "1"),
            italic: tx.attr("i").map(|v| v == "on" || v == "1"),
            color: ColorDef::from_parent(tx),
        };
    }

    part
}

/// The table option booleans that drive part applicability.
#[derive(Debug, Clone, Copy, Default)]
pub struct TableFlags {
    pub first_row: bool,
    pub last_row: bool,
    pub first_col: bool,
    pub last_col: bool,
    pub band_row: bool,
    pub band_col: bool,
}

impl TableFlags {
    pub fn parse(tbl_pr: Option<&XmlNode>) -> TableFlags {
        let Some(tbl_pr) = tbl_pr else {
            return TableFlags::default();
        };
        let flag = |name: &str| tbl_pr.attr_bool(name).unwrap_or(false);
        TableFlags {
            first_row: flag("firstRow"),
            last_row: flag("lastRow"),
            first_col: flag("firstCol"),
            last_col: flag("lastCol"),
            band_row: flag("bandRow"),
            band_col: flag("bandCol"),
        }
    }
}

/// The style parts that apply to cell `(row, col)`, in increasing precedence.
pub fn applicable_parts(
    row: usize,
    col: usize,
    rows: usize,
    cols: usize,
    flags: TableFlags,
) -> Vec<&'static str> {
    let mut parts = vec!["wholeTbl"];

    let is_first_row = row == 0;
    let is_last_row = rows > 0 && row == rows - 1;
    let is_first_col = col == 0;
    let is_last_col = cols > 0 && col == cols - 1;

    // Banding stays applicable on edge rows and columns, ranked below the
    // edge parts: an edge part that declines to fill (noFill) falls back to
    // its band. Band indexing counts from the first data row/column.
    if flags.band_row {
        let index = row.saturating_sub(usize::from(flags.first_row));
        parts.push(if index % 2 == 0 { "band1H" } else { "band2H" });
    }
    if flags.band_col {
        let index = col.saturating_sub(usize::from(flags.first_col));
        parts.push(if index % 2 == 0 { "band1V" } else { "band2V" });
    }

    if flags.first_col && is_first_col {
        parts.push("firstCol");
    }
    if flags.last_col && is_last_col {
        parts.push("lastCol");
    }
    if flags.first_row && is_first_row {
        parts.push("firstRow");
    }
    if flags.last_row && is_last_row {
        parts.push("lastRow");
    }

    if flags.first_row && flags.first_col && is_first_row && is_first_col {
        parts.push("nwCell");
    }
    if flags.first_row && flags.last_col && is_first_row && is_last_col {
        parts.push("neCell");
    }
    if flags.last_row && flags.first_col && is_last_row && is_first_col {
        parts.push("swCell");
    }
    if flags.last_row && flags.last_col && is_last_row && is_last_col {
        parts.push("seCell");
    }

    parts
}

impl TableStyle {
    /// The style fill for a cell, scanning applicable parts from the highest
    /// precedence down and skipping explicit `noFill` parts so banding can
    /// show through.
    pub fn cell_fill(
        &self,
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
        flags: TableFlags,
        ctx: &SlideContext,
    ) -> Option<Fill> {
        let empty = HashMap::new();
        for part_name in applicable_parts(row, col, rows, cols, flags).iter().rev() {
            let Some(part) = self.parts.get(*part_name) else {
                continue;
            };
            let Some(fill_node) = &part.fill else {
                continue;
            };
            match parse_fill(fill_node, ctx, None, &empty) {
                Some(Fill::None) | None => continue,
                Some(fill) => return Some(fill),
            }
        }
        None
    }

    /// The union of the applicable parts' borders, higher precedence winning
    /// per side.
    pub fn cell_borders(
        &self,
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
        flags: TableFlags,
        ctx: &SlideContext,
    ) -> Borders {
        let mut sides: HashMap<&str, Stroke> = HashMap::new();
        for part_name in applicable_parts(row, col, rows, cols, flags) {
            let Some(part) = self.parts.get(part_name) else {
                continue;
            };
            for side in BORDER_SIDES {
                if let Some(ln) = part.borders.get(side)
                    && let Some(stroke) = parse_stroke(ln, ctx, None)
                {
                    sides.insert(side, stroke);
                }
            }
        }
        Borders {
            left: sides.remove("left"),
            right: sides.remove("right"),
            top: sides.remove("top"),
            bottom: sides.remove("bottom"),
        }
    }

    /// `wholeTbl` text style merged left-to-right with each applicable part.
    pub fn cell_text_style(
        &self,
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
        flags: TableFlags,
    ) -> TcTextStyle {
        let mut merged = TcTextStyle::default();
        for part_name in applicable_parts(row, col, rows, cols, flags) {
            if let Some(part) = self.parts.get(part_name) {
                merged = merged.merged_with(&part.text);
            }
        }
        merged
    }
}
