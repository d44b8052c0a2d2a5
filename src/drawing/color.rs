//! Color parsing and resolution.
//!
//! Colors arrive as `srgbClr`, `sysClr`, `schemeClr`, or `prstClr` elements
//! carrying an ordered list of modifier children. Scheme colors are rebound
//! through the slide's color map before the theme lookup; modifiers apply in
//! source order to an HSL form of the base color.

use crate::scene::{Color, ColorModifier};
use crate::xml::XmlNode;
use smallvec::SmallVec;
use std::collections::HashMap;

/// Named preset colors the grammar allows in `prstClr`.
static PRESET_COLORS: phf::Map<&'static str, u32> = phf::phf_map! {
    "black" => 0x000000,
    "white" => 0xFFFFFF,
    "red" => 0xFF0000,
    "green" => 0x008000,
    "blue" => 0x0000FF,
    "yellow" => 0xFFFF00,
    "cyan" => 0x00FFFF,
    "magenta" => 0xFF00FF,
    "gray" => 0x808080,
    "grey" => 0x808080,
    "dkGray" => 0x404040,
    "ltGray" => 0xC0C0C0,
    "orange" => 0xFFA500,
    "purple" => 0x800080,
    "brown" => 0xA52A2A,
    "silver" => 0xC0C0C0,
};

/// The eight scheme-slot tokens a color map translates.
pub const SCHEME_SLOTS: [&str; 12] = [
    "bg1", "tx1", "bg2", "tx2", "accent1", "accent2", "accent3", "accent4", "accent5", "accent6",
    "hlink", "folHlink",
];

/// An unresolved color as parsed from the XML.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorDef {
    pub spec: ColorSpec,
    pub mods: SmallVec<[ColorModifier; 4]>,
}

/// The base color of a [`ColorDef`].
#[derive(Debug, Clone, PartialEq)]
pub enum ColorSpec {
    Srgb(u32),
    /// A scheme token, to be rebound through the color map at resolve time.
    Scheme(String),
    /// A system color; the serialized `lastClr` snapshot is authoritative.
    System(u32),
    Preset(String),
}

impl ColorDef {
    pub fn srgb(rgb: u32) -> Self {
        Self {
            spec: ColorSpec::Srgb(rgb),
            mods: SmallVec::new(),
        }
    }

    /// Parse a color element (`srgbClr` | `sysClr` | `schemeClr` | `prstClr`).
    pub fn parse(node: &XmlNode) -> Option<ColorDef> {
        let spec = match node.name() {
            "srgbClr" => ColorSpec::Srgb(parse_hex(node.attr("val")?)?),
            "sysClr" => {
                // Prefer the snapshot over the symbolic name.
                let last = node.attr("lastClr").and_then(parse_hex);
                ColorSpec::System(last.unwrap_or(0x000000))
            },
            "schemeClr" => ColorSpec::Scheme(node.attr("val")?.to_string()),
            "prstClr" => ColorSpec::Preset(node.attr("val")?.to_string()),
            _ => return None,
        };
        let mut mods = SmallVec::new();
        for child in node.all_children() {
            let value = child.attr_i64("val").unwrap_or(0) as f64 / 100_000.0;
            let modifier = match child.name() {
                "tint" => ColorModifier::Tint(value),
                "shade" => ColorModifier::Shade(value),
                "lumMod" => ColorModifier::LumMod(value),
                "lumOff" => ColorModifier::LumOff(value),
                "satMod" => ColorModifier::SatMod(value),
                "alpha" => ColorModifier::Alpha(value),
                _ => continue,
            };
            mods.push(modifier);
        }
        Some(ColorDef { spec, mods })
    }

    /// Find and parse the first color child of `parent`.
    pub fn from_parent(parent: &XmlNode) -> Option<ColorDef> {
        parent.all_children().iter().find_map(ColorDef::parse)
    }

    /// Substitute a `phClr` scheme reference with the style-reference color.
    ///
    /// The reference color's own modifiers run first, then the ones written
    /// on the `phClr` element.
    pub fn substitute_placeholder(&self, ph: &ColorDef) -> ColorDef {
        match &self.spec {
            ColorSpec::Scheme(name) if name == "phClr" => {
                let mut mods = ph.mods.clone();
                mods.extend(self.mods.iter().copied());
                ColorDef {
                    spec: ph.spec.clone(),
                    mods,
                }
            },
            _ => self.clone(),
        }
    }
}

/// Scheme-slot → theme-color-name translation.
///
/// A layout's `clrMapOvr` merges over the master's map; unmapped slots pass
/// through unchanged (the `dk1`/`lt1` theme names map to themselves).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColorMap {
    map: HashMap<String, String>,
}

impl ColorMap {
    /// Parse a `clrMap`/`overrideClrMapping` element's slot attributes.
    pub fn parse(node: &XmlNode) -> ColorMap {
        let mut map = HashMap::new();
        for slot in SCHEME_SLOTS {
            if let Some(target) = node.attr(slot) {
                map.insert(slot.to_string(), target.to_string());
            }
        }
        ColorMap { map }
    }

    /// This map with `overlay`'s entries taking precedence.
    pub fn merged_with(&self, overlay: &ColorMap) -> ColorMap {
        let mut map = self.map.clone();
        for (slot, target) in &overlay.map {
            map.insert(slot.clone(), target.clone());
        }
        ColorMap { map }
    }

    /// Translate a scheme token to its theme color name.
    pub fn apply<'a>(&'a self, slot: &'a str) -> &'a str {
        self.map.get(slot).map(String::as_str).unwrap_or(slot)
    }
}

/// Resolution context: the active theme color scheme plus color map.
pub struct ColorContext<'a> {
    /// Theme color name → concrete rgb.
    pub scheme: &'a HashMap<String, u32>,
    pub color_map: &'a ColorMap,
}

impl ColorDef {
    /// Resolve to an output color.
    ///
    /// With `keep_scheme` set, scheme colors stay symbolic with their
    /// modifier lists preserved (gradient stops keep unmodified chroma);
    /// everything else resolves to a concrete sRGB value.
    pub fn resolve(&self, ctx: &ColorContext, keep_scheme: bool) -> Color {
        let rgb = match &self.spec {
            ColorSpec::Srgb(rgb) | ColorSpec::System(rgb) => *rgb,
            ColorSpec::Preset(name) => PRESET_COLORS.get(name.as_str()).copied().unwrap_or(0),
            ColorSpec::Scheme(name) => {
                // An unsubstituted phClr has no scheme slot to preserve.
                if keep_scheme && name != "phClr" {
                    return Color::Scheme {
                        name: name.clone(),
                        mods: self.mods.to_vec(),
                    };
                }
                let theme_name = ctx.color_map.apply(name);
                ctx.scheme.get(theme_name).copied().unwrap_or(0x000000)
            },
        };
        let (rgb, alpha) = apply_modifiers(rgb, &self.mods);
        Color::Srgb {
            value: format!("#{rgb:06X}"),
            alpha,
        }
    }
}

/// Run the modifier list over an HSL form of the color.
fn apply_modifiers(rgb: u32, mods: &[ColorModifier]) -> (u32, Option<f64>) {
    if mods.is_empty() {
        return (rgb, None);
    }
    let (h, mut s, mut l) = rgb_to_hsl(rgb);
    let mut alpha = None;
    for modifier in mods {
        match *modifier {
            ColorModifier::Tint(t) => l = l * t + (1.0 - t),
            ColorModifier::Shade(v) => l *= v,
            ColorModifier::LumMod(v) => l *= v,
            ColorModifier::LumOff(v) => l += v,
            ColorModifier::SatMod(v) => s *= v,
            ColorModifier::Alpha(v) => alpha = Some(v.clamp(0.0, 1.0)),
        }
        s = s.clamp(0.0, 1.0);
        l = l.clamp(0.0, 1.0);
    }
    (hsl_to_rgb(h, s, l), alpha)
}

fn parse_hex(value: &str) -> Option<u32> {
    let value = value.trim_start_matches('#');
    if value.len() != 6 {
        return None;
    }
    u32::from_str_radix(value, 16).ok()
}

fn rgb_to_hsl(rgb: u32) -> (f64, f64, f64) {
    let r = ((rgb >> 16) & 0xFF) as f64 / 255.0;
    let g = ((rgb >> 8) & 0xFF) as f64 / 255.0;
    let b = (rgb & 0xFF) as f64 / 255.0;
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let l = (max + min) / 2.0;
    if (max - min).abs() < f64::EPSILON {
        return (0.0, 0.0, l);
    }
    let d = max - min;
    let s = if l > 0.5 {
        d / (2.0 - max - min)
    } else {
        d / (max + min)
    };
    let h = if (max - r).abs() < f64::EPSILON {
        ((g - b) / d).rem_euclid(6.0)
    } else if (max - g).abs() < f64::EPSILON {
        (b - r) / d + 2.0
    } else {
        (r - g) / d + 4.0
    } / 6.0;
    (h, s, l)
}

fn hsl_to_rgb(h: f64, s: f64, l: f64) -> u32 {
    let channel = |r: f64, g: f64, b: f64| -> u32 {
        let to_byte = |v: f64| (v * 255.0).round().clamp(0.0, 255.0) as u32;
        (to_byte(r) << 16) | (to_byte(g) << 8) | to_byte(b)
    };
    if s == 0.0 {
        return channel(l, l, l);
    }
    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;
    let hue = |mut t: f64| -> f64 {
        t = t.rem_euclid(1.0);
        if t < 1.0 / 6.0 {
            p + (q - p) * 6.0 * t
        } else if t < 0.5 {
            q
        } else if t < 2.0 / 3.0 {
            p + (q - p) * (2.0 / 3.0 - t) * 6.0
        } else {
            p
        }
    };
    channel(hue(h + 1.0 / 3.0), hue(h), hue(h - 1.0 / 3.0))
}

/// Parse a standalone color element from DML.
pub fn parse_color(node: &XmlNode) -> Option<ColorDef> {
    // Accept either the color element itself or a container around one.
    ColorDef::parse(node).or_else(|| ColorDef::from_parent(node))
}
