//! Theme part parsing.
//!
//! A theme supplies the color scheme (twelve named colors), the font scheme
//! (major/minor latin typefaces), and the format scheme: four parallel lists
//! of fill, line, effect, and background-fill definitions that style
//! references index 1-based. Format entries are kept as raw trees because
//! their `phClr` references are substituted per shape at resolve time.

use crate::drawing::color::ColorDef;
use crate::xml::{XmlNode, ns};
use serde::{Serialize, Serializer};
use std::collections::HashMap;

/// Theme color element names, in scheme order.
const COLOR_NAMES: [&str; 12] = [
    "dk1", "lt1", "dk2", "lt2", "accent1", "accent2", "accent3", "accent4", "accent5", "accent6",
    "hlink", "folHlink",
];

/// Major/minor latin typefaces.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FontScheme {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub major: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minor: Option<String>,
}

/// The four format lists, each indexed 1-based from style references.
#[derive(Debug, Clone, Default)]
pub struct FormatScheme {
    pub fills: Vec<XmlNode>,
    pub lines: Vec<XmlNode>,
    pub effects: Vec<XmlNode>,
    pub bg_fills: Vec<XmlNode>,
}

/// A parsed theme part.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Theme {
    pub name: String,
    #[serde(serialize_with = "serialize_scheme_hex")]
    pub color_scheme: HashMap<String, u32>,
    pub font_scheme: FontScheme,
    #[serde(skip)]
    pub format_scheme: FormatScheme,
}

fn serialize_scheme_hex<S: Serializer>(
    scheme: &HashMap<String, u32>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let mut entries: Vec<(&str, String)> = scheme
        .iter()
        .map(|(name, rgb)| (name.as_str(), format!("#{rgb:06X}")))
        .collect();
    entries.sort();
    serializer.collect_map(entries)
}

impl Theme {
    /// Parse the root `a:theme` element.
    pub fn parse(root: &XmlNode) -> Theme {
        let mut theme = Theme {
            name: root.attr("name").unwrap_or_default().to_string(),
            ..Theme::default()
        };
        let Some(elements) = root.child(ns::DML, "themeElements") else {
            return theme;
        };

        if let Some(clr_scheme) = elements.child(ns::DML, "clrScheme") {
            for name in COLOR_NAMES {
                if let Some(slot) = clr_scheme.child(ns::DML, name)
                    && let Some(def) = ColorDef::from_parent(slot)
                    && let Some(rgb) = concrete_rgb(&def)
                {
                    theme.color_scheme.insert(name.to_string(), rgb);
                }
            }
        }

        if let Some(font_scheme) = elements.child(ns::DML, "fontScheme") {
            theme.font_scheme.major = latin_typeface(font_scheme.child(ns::DML, "majorFont"));
            theme.font_scheme.minor = latin_typeface(font_scheme.child(ns::DML, "minorFont"));
        }

        if let Some(fmt) = elements.child(ns::DML, "fmtScheme") {
            if let Some(lst) = fmt.child(ns::DML, "fillStyleLst") {
                theme.format_scheme.fills = lst.all_children().to_vec();
            }
            if let Some(lst) = fmt.child(ns::DML, "lnStyleLst") {
                theme.format_scheme.lines = lst.all_children().to_vec();
            }
            if let Some(lst) = fmt.child(ns::DML, "effectStyleLst") {
                theme.format_scheme.effects = lst.all_children().to_vec();
            }
            if let Some(lst) = fmt.child(ns::DML, "bgFillStyleLst") {
                theme.format_scheme.bg_fills = lst.all_children().to_vec();
            }
        }

        theme
    }

    /// A format-scheme entry by 1-based style-reference index.
    pub fn format_entry(list: &[XmlNode], idx: usize) -> Option<&XmlNode> {
        if idx == 0 {
            return None;
        }
        list.get(idx - 1)
    }

    /// The major latin typeface, or the stock fallback.
    pub fn major_font(&self) -> &str {
        self.font_scheme.major.as_deref().unwrap_or("Arial")
    }

    /// The minor latin typeface, or the stock fallback.
    pub fn minor_font(&self) -> &str {
        self.font_scheme.minor.as_deref().unwrap_or("Arial")
    }
}

fn latin_typeface(font: Option<&XmlNode>) -> Option<String> {
    let typeface = font?.child(ns::DML, "latin")?.attr("typeface")?;
    (!typeface.is_empty()).then(|| typeface.to_string())
}

/// Theme scheme colors are concrete by construction (srgb or sys snapshot).
fn concrete_rgb(def: &ColorDef) -> Option<u32> {
    use crate::drawing::color::ColorSpec;
    match def.spec {
        ColorSpec::Srgb(rgb) | ColorSpec::System(rgb) => Some(rgb),
        _ => None,
    }
}
