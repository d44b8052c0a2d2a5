//! Shape visual properties: fills, strokes, effects, and backgrounds.
//!
//! Extraction keeps the direct fill/stroke nodes as raw outer-XML strings so
//! the three-layer merge can tell "absent" apart from an explicit `noFill`:
//! a slide that writes `noFill` must not fall through to the master's fill.
//! The theme's default fill is applied only after the merge leaves every
//! layer absent (connectors excepted).

use crate::drawing::color::{ColorContext, ColorDef, ColorMap};
use crate::drawing::theme::Theme;
use crate::geom::Geometry;
use crate::geom::units::{angle_to_deg, emu_to_px, permille_to_ratio};
use crate::scene::{Effect, Fill, GradientStop, ImageRef, SrcRect, Stroke};
use crate::xml::{XmlNode, ns};
use std::collections::HashMap;

/// Fill element names, in the order the grammar allows them.
const FILL_NAMES: [&str; 6] = [
    "solidFill",
    "gradFill",
    "noFill",
    "blipFill",
    "pattFill",
    "grpFill",
];

/// Resolution context for one slide: the theme plus the effective color map.
pub struct SlideContext<'a> {
    pub theme: &'a Theme,
    pub color_map: ColorMap,
}

impl<'a> SlideContext<'a> {
    pub fn new(theme: &'a Theme, color_map: ColorMap) -> Self {
        Self { theme, color_map }
    }

    pub fn color_ctx(&self) -> ColorContext<'_> {
        ColorContext {
            scheme: &self.theme.color_scheme,
            color_map: &self.color_map,
        }
    }

    pub fn resolve(&self, def: &ColorDef) -> crate::scene::Color {
        def.resolve(&self.color_ctx(), false)
    }
}

/// Visual properties extracted from one layer's shape node.
#[derive(Debug, Default, Clone)]
pub struct ShapeProps {
    pub geometry: Option<Geometry>,
    /// Fill written directly on `spPr`.
    pub direct_fill: Option<Fill>,
    /// Fill obtained through `style/fillRef`.
    pub style_fill: Option<Fill>,
    /// Stroke written directly on `spPr/ln`.
    pub direct_stroke: Option<Stroke>,
    /// Stroke obtained through `style/lnRef`.
    pub style_stroke: Option<Stroke>,
    pub effect: Option<Effect>,
    /// Outer XML of the direct fill element; empty when absent.
    pub raw_fill: String,
    /// Outer XML of the direct `ln` element; empty when absent.
    pub raw_stroke: String,
}

impl ShapeProps {
    /// Whether this layer states a fill at all (directly or via style).
    pub fn has_fill(&self) -> bool {
        !self.raw_fill.is_empty() || self.style_fill.is_some()
    }

    /// The layer's effective fill; direct wins over style.
    pub fn fill(&self) -> Option<&Fill> {
        self.direct_fill.as_ref().or(self.style_fill.as_ref())
    }

    pub fn has_stroke(&self) -> bool {
        !self.raw_stroke.is_empty() || self.style_stroke.is_some()
    }

    pub fn stroke(&self) -> Option<&Stroke> {
        self.direct_stroke.as_ref().or(self.style_stroke.as_ref())
    }
}

/// Extract geometry, fill, stroke, and effect for one shape node.
///
/// `sp_pr` is the shape's `spPr` element; `style` its optional `p:style`;
/// `images` the relationship-id → media-reference map of the layer the node
/// came from.
pub fn extract_shape_properties(
    sp_pr: Option<&XmlNode>,
    style: Option<&XmlNode>,
    ctx: &SlideContext,
    images: &HashMap<String, String>,
) -> ShapeProps {
    let mut props = ShapeProps::default();

    if let Some(sp_pr) = sp_pr {
        props.geometry = Geometry::from_shape_properties(sp_pr);

        if let Some(fill_node) = direct_fill_node(sp_pr) {
            props.raw_fill = fill_node.outer_xml();
            props.direct_fill = parse_fill(fill_node, ctx, None, images);
        }

        if let Some(ln) = sp_pr.child(ns::DML, "ln") {
            props.raw_stroke = ln.outer_xml();
            props.direct_stroke = parse_stroke(ln, ctx, None);
        }

        if let Some(effect_lst) = sp_pr.child(ns::DML, "effectLst") {
            props.effect = parse_effect_list(effect_lst, ctx, None);
        }
    }

    if let Some(style) = style {
        if props.direct_fill.is_none()
            && let Some((entry, ph)) = style_entry(style, "fillRef", &ctx.theme.format_scheme.fills)
        {
            props.style_fill = parse_fill(entry, ctx, ph.as_ref(), images);
        }
        if props.direct_stroke.is_none()
            && let Some((entry, ph)) = style_entry(style, "lnRef", &ctx.theme.format_scheme.lines)
        {
            props.style_stroke = parse_stroke(entry, ctx, ph.as_ref());
        }
        if props.effect.is_none()
            && let Some((entry, ph)) =
                style_entry(style, "effectRef", &ctx.theme.format_scheme.effects)
        {
            let effect_lst = entry.child(ns::DML, "effectLst").unwrap_or(entry);
            props.effect = parse_effect_list(effect_lst, ctx, ph.as_ref());
        }
    }

    props
}

/// The theme's default shape fill: the second fill entry, or the first when
/// only one exists. `None` when the theme carries no fill list.
pub fn theme_default_fill(ctx: &SlideContext, images: &HashMap<String, String>) -> Option<Fill> {
    let fills = &ctx.theme.format_scheme.fills;
    let entry = if fills.len() >= 2 {
        &fills[1]
    } else {
        fills.first()?
    };
    parse_fill(entry, ctx, None, images)
}

fn direct_fill_node(sp_pr: &XmlNode) -> Option<&XmlNode> {
    sp_pr
        .all_children()
        .iter()
        .find(|child| FILL_NAMES.contains(&child.name()))
}

fn style_entry<'a>(
    style: &XmlNode,
    ref_name: &str,
    list: &'a [XmlNode],
) -> Option<(&'a XmlNode, Option<ColorDef>)> {
    let style_ref = style.child(ns::DML, ref_name)?;
    let idx = style_ref.attr_i64("idx").unwrap_or(0);
    if idx <= 0 {
        return None;
    }
    let entry = Theme::format_entry(list, idx as usize)?;
    Some((entry, ColorDef::from_parent(style_ref)))
}

/// Parse one fill element into a resolved [`Fill`].
///
/// `ph` substitutes `phClr` scheme references (style-reference color).
/// Returns `None` for `grpFill` (inherit from the enclosing group) and for
/// image fills whose relationship id does not resolve.
pub fn parse_fill(
    node: &XmlNode,
    ctx: &SlideContext,
    ph: Option<&ColorDef>,
    images: &HashMap<String, String>,
) -> Option<Fill> {
    match node.name() {
        "solidFill" => {
            let def = with_placeholder(ColorDef::from_parent(node)?, ph);
            Some(Fill::Solid {
                color: ctx.resolve(&def),
            })
        },
        "gradFill" => Some(parse_gradient(node, ctx, ph)),
        "noFill" => Some(Fill::None),
        "blipFill" => parse_blip_fill(node, ctx, images).map(|image| Fill::Image { image }),
        "pattFill" => {
            let color_of = |name: &str| {
                node.child(ns::DML, name)
                    .and_then(ColorDef::from_parent)
                    .map(|def| ctx.resolve(&with_placeholder(def, ph)))
            };
            Some(Fill::Pattern {
                preset: node.attr("prst").unwrap_or("pct5").to_string(),
                fg: color_of("fgClr"),
                bg: color_of("bgClr"),
            })
        },
        _ => None,
    }
}

fn parse_gradient(node: &XmlNode, ctx: &SlideContext, ph: Option<&ColorDef>) -> Fill {
    let mut stops = Vec::new();
    if let Some(gs_lst) = node.child(ns::DML, "gsLst") {
        for gs in gs_lst.children(ns::DML, "gs") {
            let Some(def) = ColorDef::from_parent(gs) else {
                continue;
            };
            let def = with_placeholder(def, ph);
            // Stops keep scheme chroma unmodified for renderer-side ramps.
            let color = def.resolve(&ctx.color_ctx(), true);
            stops.push(GradientStop {
                pos: permille_to_ratio(gs.attr_i64("pos").unwrap_or(0)),
                color,
            });
        }
    }
    stops.sort_by(|a, b| a.pos.total_cmp(&b.pos));
    let angle_deg = node
        .child(ns::DML, "lin")
        .and_then(|lin| lin.attr_i64("ang"))
        .map(angle_to_deg)
        .unwrap_or(0.0);
    Fill::Gradient { stops, angle_deg }
}

/// Parse `blipFill` content shared by fills and pictures.
pub fn parse_blip_fill(
    node: &XmlNode,
    ctx: &SlideContext,
    images: &HashMap<String, String>,
) -> Option<ImageRef> {
    let blip = node.child(ns::DML, "blip")?;
    let rel_id = blip.attr("embed").or_else(|| blip.attr("link"))?;
    let href = images.get(rel_id)?.clone();

    let src_rect = node.child(ns::DML, "srcRect").map(|rect| SrcRect {
        l: permille_to_ratio(rect.attr_i64("l").unwrap_or(0)),
        t: permille_to_ratio(rect.attr_i64("t").unwrap_or(0)),
        r: permille_to_ratio(rect.attr_i64("r").unwrap_or(0)),
        b: permille_to_ratio(rect.attr_i64("b").unwrap_or(0)),
    });

    let opacity = blip
        .child(ns::DML, "alphaModFix")
        .and_then(|fix| fix.attr_i64("amt"))
        .map(permille_to_ratio);

    let duotone = blip.child(ns::DML, "duotone").and_then(|duo| {
        let colors: Vec<_> = duo
            .all_children()
            .iter()
            .filter_map(ColorDef::parse)
            .map(|def| ctx.resolve(&def))
            .collect();
        match colors.len() {
            2 => Some([colors[0].clone(), colors[1].clone()]),
            _ => None,
        }
    });

    Some(ImageRef {
        href: Some(href),
        src_rect,
        opacity,
        duotone,
    })
}

/// Parse an `ln` element or a theme line entry.
pub fn parse_stroke(ln: &XmlNode, ctx: &SlideContext, ph: Option<&ColorDef>) -> Option<Stroke> {
    let width_px = emu_to_px(ln.attr_i64("w").unwrap_or(9525));
    let color = if ln.child(ns::DML, "noFill").is_some() {
        None
    } else {
        ln.child(ns::DML, "solidFill")
            .and_then(ColorDef::from_parent)
            .map(|def| ctx.resolve(&with_placeholder(def, ph)))
    };
    Some(Stroke {
        color,
        width_px,
        cap: ln.attr("cap").map(str::to_string),
        compound: ln.attr("cmpd").map(str::to_string),
        join: ["round", "bevel", "miter"]
            .iter()
            .find(|name| ln.child(ns::DML, name).is_some())
            .map(|name| name.to_string()),
        dash: ln
            .child(ns::DML, "prstDash")
            .and_then(|dash| dash.attr("val"))
            .map(str::to_string),
    })
}

/// Parse the outer shadow out of an `effectLst`.
pub fn parse_effect_list(
    effect_lst: &XmlNode,
    ctx: &SlideContext,
    ph: Option<&ColorDef>,
) -> Option<Effect> {
    let shadow = effect_lst.child(ns::DML, "outerShdw")?;
    let color = ColorDef::from_parent(shadow).map(|def| ctx.resolve(&with_placeholder(def, ph)));
    Some(Effect {
        color,
        blur_px: emu_to_px(shadow.attr_i64("blurRad").unwrap_or(0)),
        dist_px: emu_to_px(shadow.attr_i64("dist").unwrap_or(0)),
        dir_deg: angle_to_deg(shadow.attr_i64("dir").unwrap_or(0)),
    })
}

/// Resolve a `bg` element: `bgPr` wins over `bgRef`.
///
/// A `bgRef` with `idx` in `[1, 999]` indexes the theme's background fills
/// with the reference color substituting `phClr`; `idx >= 1000` is a direct
/// color reference.
pub fn parse_background(
    bg: &XmlNode,
    ctx: &SlideContext,
    images: &HashMap<String, String>,
) -> Option<Fill> {
    if let Some(bg_pr) = bg.child(ns::PML, "bgPr") {
        let fill_node = direct_fill_node(bg_pr)?;
        return parse_fill(fill_node, ctx, None, images);
    }

    let bg_ref = bg.child(ns::PML, "bgRef")?;
    let idx = bg_ref.attr_i64("idx").unwrap_or(0);
    let color = ColorDef::from_parent(bg_ref);
    if idx >= 1000 {
        let def = color?;
        return Some(Fill::Solid {
            color: ctx.resolve(&def),
        });
    }
    if (1..=999).contains(&idx) {
        let entry = Theme::format_entry(&ctx.theme.format_scheme.bg_fills, idx as usize)?;
        return parse_fill(entry, ctx, color.as_ref(), images);
    }
    None
}

fn with_placeholder(def: ColorDef, ph: Option<&ColorDef>) -> ColorDef {
    match ph {
        Some(ph) => def.substitute_placeholder(ph),
        None => def,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Color;

    fn office_theme() -> Theme {
        let xml = r#"<a:theme xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" name="T">
          <a:themeElements>
            <a:clrScheme name="T">
              <a:dk1><a:srgbClr val="000000"/></a:dk1>
              <a:lt1><a:srgbClr val="FFFFFF"/></a:lt1>
              <a:dk2><a:srgbClr val="222222"/></a:dk2>
              <a:lt2><a:srgbClr val="EEEEEE"/></a:lt2>
              <a:accent1><a:srgbClr val="4472C4"/></a:accent1>
              <a:accent2><a:srgbClr val="ED7D31"/></a:accent2>
              <a:accent3><a:srgbClr val="A5A5A5"/></a:accent3>
              <a:accent4><a:srgbClr val="FFC000"/></a:accent4>
              <a:accent5><a:srgbClr val="5B9BD5"/></a:accent5>
              <a:accent6><a:srgbClr val="70AD47"/></a:accent6>
              <a:hlink><a:srgbClr val="0563C1"/></a:hlink>
              <a:folHlink><a:srgbClr val="954F72"/></a:folHlink>
            </a:clrScheme>
            <a:fontScheme name="T">
              <a:majorFont><a:latin typeface="Arial"/></a:majorFont>
              <a:minorFont><a:latin typeface="Arial"/></a:minorFont>
            </a:fontScheme>
            <a:fmtScheme name="T">
              <a:fillStyleLst>
                <a:solidFill><a:schemeClr val="phClr"/></a:solidFill>
                <a:solidFill><a:schemeClr val="phClr"/></a:solidFill>
              </a:fillStyleLst>
              <a:lnStyleLst>
                <a:ln w="6350"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln>
              </a:lnStyleLst>
              <a:effectStyleLst><a:effectStyle><a:effectLst/></a:effectStyle></a:effectStyleLst>
              <a:bgFillStyleLst>
                <a:solidFill><a:schemeClr val="phClr"/></a:solidFill>
                <a:solidFill><a:srgbClr val="123456"/></a:solidFill>
              </a:bgFillStyleLst>
            </a:fmtScheme>
          </a:themeElements>
        </a:theme>"#;
        Theme::parse(&XmlNode::parse(xml).unwrap())
    }

    fn default_map() -> ColorMap {
        let xml = XmlNode::parse_fragment(
            r#"<p:clrMap bg1="lt1" tx1="dk1" bg2="lt2" tx2="dk2" accent1="accent1" accent2="accent2" accent3="accent3" accent4="accent4" accent5="accent5" accent6="accent6" hlink="hlink" folHlink="folHlink"/>"#,
        );
        ColorMap::parse(&xml)
    }

    #[test]
    fn test_solid_fill() {
        let theme = office_theme();
        let ctx = SlideContext::new(&theme, default_map());
        let node = XmlNode::parse_fragment(r#"<a:solidFill><a:srgbClr val="FF0000"/></a:solidFill>"#);
        let fill = parse_fill(&node, &ctx, None, &HashMap::new()).unwrap();
        assert_eq!(fill.solid_hex(), Some("#FF0000"));
    }

    #[test]
    fn test_no_fill_is_explicit() {
        let theme = office_theme();
        let ctx = SlideContext::new(&theme, default_map());
        let node = XmlNode::parse_fragment("<a:noFill/>");
        assert_eq!(parse_fill(&node, &ctx, None, &HashMap::new()), Some(Fill::None));
    }

    #[test]
    fn test_gradient_stops_keep_scheme_chroma() {
        let theme = office_theme();
        let ctx = SlideContext::new(&theme, default_map());
        let node = XmlNode::parse_fragment(
            r#"<a:gradFill>
              <a:gsLst>
                <a:gs pos="100000"><a:srgbClr val="0000FF"/></a:gs>
                <a:gs pos="0"><a:schemeClr val="accent1"><a:tint val="50000"/></a:schemeClr></a:gs>
              </a:gsLst>
              <a:lin ang="5400000"/>
            </a:gradFill>"#,
        );
        match parse_fill(&node, &ctx, None, &HashMap::new()).unwrap() {
            Fill::Gradient { stops, angle_deg } => {
                assert_eq!(angle_deg, 90.0);
                assert_eq!(stops.len(), 2);
                assert_eq!(stops[0].pos, 0.0);
                assert!(matches!(&stops[0].color, Color::Scheme { name, .. } if name == "accent1"));
                assert_eq!(stops[1].color.hex(), Some("#0000FF"));
            },
            other => panic!("{other:?}"),
        }
    }

    #[test]
    fn test_blip_fill_resolves_through_image_map() {
        let theme = office_theme();
        let ctx = SlideContext::new(&theme, default_map());
        let images = HashMap::from([("rId5".to_string(), "media/image1.png".to_string())]);
        let node = XmlNode::parse_fragment(
            r#"<p:blipFill>
              <a:blip r:embed="rId5"><a:alphaModFix amt="80000"/></a:blip>
              <a:srcRect l="10000" r="10000"/>
            </p:blipFill>"#,
        );
        match parse_fill(&node, &ctx, None, &images).unwrap() {
            Fill::Image { image } => {
                assert_eq!(image.href.as_deref(), Some("media/image1.png"));
                assert_eq!(image.opacity, Some(0.8));
                let rect = image.src_rect.unwrap();
                assert_eq!((rect.l, rect.r), (0.1, 0.1));
            },
            other => panic!("{other:?}"),
        }
    }

    #[test]
    fn test_blip_fill_dangling_rel_is_none() {
        let theme = office_theme();
        let ctx = SlideContext::new(&theme, default_map());
        let node =
            XmlNode::parse_fragment(r#"<p:blipFill><a:blip r:embed="rId9"/></p:blipFill>"#);
        assert!(parse_fill(&node, &ctx, None, &HashMap::new()).is_none());
    }

    #[test]
    fn test_style_fill_substitutes_placeholder_color() {
        let theme = office_theme();
        let ctx = SlideContext::new(&theme, default_map());
        let sp_pr = XmlNode::parse_fragment(r#"<p:spPr><a:prstGeom prst="rect"><a:avLst/></a:prstGeom></p:spPr>"#);
        let style = XmlNode::parse_fragment(
            r#"<p:style><a:fillRef idx="1"><a:schemeClr val="accent2"/></a:fillRef></p:style>"#,
        );
        let props =
            extract_shape_properties(Some(&sp_pr), Some(&style), &ctx, &HashMap::new());
        assert!(props.raw_fill.is_empty());
        assert_eq!(props.fill().and_then(Fill::solid_hex), Some("#ED7D31"));
    }

    #[test]
    fn test_direct_fill_beats_style() {
        let theme = office_theme();
        let ctx = SlideContext::new(&theme, default_map());
        let sp_pr = XmlNode::parse_fragment(
            r#"<p:spPr><a:solidFill><a:srgbClr val="00FF00"/></a:solidFill></p:spPr>"#,
        );
        let style = XmlNode::parse_fragment(
            r#"<p:style><a:fillRef idx="1"><a:schemeClr val="accent2"/></a:fillRef></p:style>"#,
        );
        let props =
            extract_shape_properties(Some(&sp_pr), Some(&style), &ctx, &HashMap::new());
        assert!(!props.raw_fill.is_empty());
        assert_eq!(props.fill().and_then(Fill::solid_hex), Some("#00FF00"));
    }

    #[test]
    fn test_stroke_parse() {
        let theme = office_theme();
        let ctx = SlideContext::new(&theme, default_map());
        let ln = XmlNode::parse_fragment(
            r#"<a:ln w="19050" cap="rnd" cmpd="dbl">
              <a:solidFill><a:srgbClr val="336699"/></a:solidFill>
              <a:prstDash val="dash"/>
              <a:round/>
            </a:ln>"#,
        );
        let stroke = parse_stroke(&ln, &ctx, None).unwrap();
        assert_eq!(stroke.width_px, 2.0);
        assert_eq!(stroke.cap.as_deref(), Some("rnd"));
        assert_eq!(stroke.compound.as_deref(), Some("dbl"));
        assert_eq!(stroke.dash.as_deref(), Some("dash"));
        assert_eq!(stroke.join.as_deref(), Some("round"));
        assert_eq!(stroke.color.as_ref().and_then(Color::hex), Some("#336699"));
    }

    #[test]
    fn test_effect_parse() {
        let theme = office_theme();
        let ctx = SlideContext::new(&theme, default_map());
        let lst = XmlNode::parse_fragment(
            r#"<a:effectLst><a:outerShdw blurRad="19050" dist="9525" dir="5400000">
              <a:srgbClr val="000000"/>
            </a:outerShdw></a:effectLst>"#,
        );
        let effect = parse_effect_list(&lst, &ctx, None).unwrap();
        assert_eq!(effect.blur_px, 2.0);
        assert_eq!(effect.dist_px, 1.0);
        assert_eq!(effect.dir_deg, 90.0);
    }

    #[test]
    fn test_background_prefers_bg_pr() {
        let theme = office_theme();
        let ctx = SlideContext::new(&theme, default_map());
        let bg = XmlNode::parse_fragment(
            r#"<p:bg>
              <p:bgPr><a:solidFill><a:srgbClr val="FF0000"/></a:solidFill><a:effectLst/></p:bgPr>
            </p:bg>"#,
        );
        let fill = parse_background(&bg, &ctx, &HashMap::new()).unwrap();
        assert_eq!(fill.solid_hex(), Some("#FF0000"));
    }

    #[test]
    fn test_background_ref_indexes_theme_bg_fills() {
        let theme = office_theme();
        let ctx = SlideContext::new(&theme, default_map());
        let bg = XmlNode::parse_fragment(
            r#"<p:bg><p:bgRef idx="2"><a:schemeClr val="accent1"/></p:bgRef></p:bg>"#,
        );
        let fill = parse_background(&bg, &ctx, &HashMap::new()).unwrap();
        assert_eq!(fill.solid_hex(), Some("#123456"));
    }

    #[test]
    fn test_background_ref_direct_color_above_1000() {
        let theme = office_theme();
        let ctx = SlideContext::new(&theme, default_map());
        let bg = XmlNode::parse_fragment(
            r#"<p:bg><p:bgRef idx="1001"><a:schemeClr val="accent1"/></p:bgRef></p:bg>"#,
        );
        let fill = parse_background(&bg, &ctx, &HashMap::new()).unwrap();
        assert_eq!(fill.solid_hex(), Some("#4472C4"));
    }

    #[test]
    fn test_theme_default_fill_uses_second_entry() {
        let theme = office_theme();
        let ctx = SlideContext::new(&theme, default_map());
        // Both entries are phClr solids; without a reference color the
        // scheme lookup falls back to black.
        let fill = theme_default_fill(&ctx, &HashMap::new()).unwrap();
        assert_eq!(fill.solid_hex(), Some("#000000"));
    }
}
