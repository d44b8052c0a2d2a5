//! Shape geometry and the outline path builder.
//!
//! Geometry comes in two forms: a named preset with optional adjustment
//! values, or a custom path of explicit commands in its own coordinate
//! space. Both render to a path string in the SVG path grammar
//! (`M`, `L`, `C`, `Q`, `A`, `Z`) sized to the shape's pixel extent.
//!
//! Adjustment values are normalized to the 100 000-unit adjustment space:
//! `50000` means half of the shape's lesser dimension.

use crate::geom::units::angle_to_deg;
use crate::xml::{XmlNode, ns};
use std::collections::HashMap;
use std::fmt::Write;

/// Parsed shape geometry.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Preset {
        name: String,
        adjustments: HashMap<String, i64>,
    },
    Custom {
        w: i64,
        h: i64,
        commands: Vec<PathCommand>,
    },
}

/// A point in path space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pt {
    pub x: f64,
    pub y: f64,
}

/// One command of a custom geometry path.
#[derive(Debug, Clone, PartialEq)]
pub enum PathCommand {
    MoveTo(Pt),
    LineTo(Pt),
    CubicTo(Pt, Pt, Pt),
    QuadTo(Pt, Pt),
    ArcTo {
        w_r: f64,
        h_r: f64,
        start_deg: f64,
        swing_deg: f64,
    },
    Close,
}

/// Default adjustment values per preset, in adjustment-space units.
static PRESET_DEFAULTS: phf::Map<&'static str, &'static [(&'static str, i64)]> = phf::phf_map! {
    "rect" => &[],
    "roundRect" => &[("adj", 16667)],
    "round1Rect" => &[("adj", 16667)],
    "round2SameRect" => &[("adj1", 16667), ("adj2", 0)],
    "round2DiagRect" => &[("adj1", 16667), ("adj2", 0)],
    "snip1Rect" => &[("adj", 16667)],
    "snip2SameRect" => &[("adj1", 16667), ("adj2", 0)],
    "snip2DiagRect" => &[("adj1", 16667), ("adj2", 0)],
    "snipRoundRect" => &[("adj1", 16667), ("adj2", 16667)],
    "ellipse" => &[],
    "arc" => &[("adj1", 16_200_000), ("adj2", 0)],
    "blockArc" => &[("adj1", 10_800_000), ("adj2", 0), ("adj3", 25000)],
    "chevron" => &[("adj", 50000)],
    "homePlate" => &[("adj", 50000)],
    "corner" => &[("adj1", 50000), ("adj2", 50000)],
};

impl Geometry {
    /// Read `prstGeom` (preferred) or `custGeom` out of a shape-properties
    /// element. Returns `None` when neither is present.
    pub fn from_shape_properties(sp_pr: &XmlNode) -> Option<Geometry> {
        if let Some(prst) = sp_pr.child(ns::DML, "prstGeom") {
            let name = prst.attr("prst")?.to_string();
            let mut adjustments = HashMap::new();
            if let Some(av_lst) = prst.child(ns::DML, "avLst") {
                for gd in av_lst.children(ns::DML, "gd") {
                    if let (Some(key), Some(value)) = (gd.attr("name"), gd.attr("fmla"))
                        && let Some(value) = value.strip_prefix("val ")
                        && let Ok(value) = value.trim().parse::<i64>()
                    {
                        adjustments.insert(key.to_string(), value);
                    }
                }
            }
            return Some(Geometry::Preset { name, adjustments });
        }

        let cust = sp_pr.child(ns::DML, "custGeom")?;
        let path_lst = cust.child(ns::DML, "pathLst")?;
        let mut w = 0;
        let mut h = 0;
        let mut commands = Vec::new();
        for path in path_lst.children(ns::DML, "path") {
            if w == 0 {
                w = path.attr_i64("w").unwrap_or(0);
            }
            if h == 0 {
                h = path.attr_i64("h").unwrap_or(0);
            }
            for cmd in path.all_children() {
                match cmd.name() {
                    "moveTo" => {
                        if let Some(p) = first_pt(cmd) {
                            commands.push(PathCommand::MoveTo(p));
                        }
                    },
                    "lnTo" => {
                        if let Some(p) = first_pt(cmd) {
                            commands.push(PathCommand::LineTo(p));
                        }
                    },
                    "cubicBezTo" => {
                        let pts = all_pts(cmd);
                        if pts.len() >= 3 {
                            commands.push(PathCommand::CubicTo(pts[0], pts[1], pts[2]));
                        }
                    },
                    "quadBezTo" => {
                        let pts = all_pts(cmd);
                        if pts.len() >= 2 {
                            commands.push(PathCommand::QuadTo(pts[0], pts[1]));
                        }
                    },
                    "arcTo" => {
                        commands.push(PathCommand::ArcTo {
                            w_r: cmd.attr_f64("wR").unwrap_or(0.0),
                            h_r: cmd.attr_f64("hR").unwrap_or(0.0),
                            start_deg: angle_to_deg(cmd.attr_i64("stAng").unwrap_or(0)),
                            swing_deg: angle_to_deg(cmd.attr_i64("swAng").unwrap_or(0)),
                        });
                    },
                    "close" => commands.push(PathCommand::Close),
                    _ => {},
                }
            }
        }
        Some(Geometry::Custom { w, h, commands })
    }

    /// The adjustment value for `key`, falling back to the preset default.
    pub fn adjustment(&self, key: &str, default: i64) -> i64 {
        match self {
            Geometry::Preset { adjustments, .. } => {
                adjustments.get(key).copied().unwrap_or(default)
            },
            Geometry::Custom { .. } => default,
        }
    }
}

fn first_pt(cmd: &XmlNode) -> Option<Pt> {
    let pt = cmd.child(ns::DML, "pt")?;
    Some(Pt {
        x: pt.attr_f64("x")?,
        y: pt.attr_f64("y")?,
    })
}

fn all_pts(cmd: &XmlNode) -> Vec<Pt> {
    cmd.children(ns::DML, "pt")
        .filter_map(|pt| {
            Some(Pt {
                x: pt.attr_f64("x")?,
                y: pt.attr_f64("y")?,
            })
        })
        .collect()
}

/// Render a geometry to an SVG-grammar path string for a `w`×`h` pixel box.
///
/// Returns `None` for unsupported preset names; the caller decides whether
/// to fall back to a plain rectangle. Flips are carried by the shape's
/// transform matrix, so the builder emits unmirrored coordinates.
pub fn build_path(
    geometry: &Geometry,
    w: f64,
    h: f64,
    _flip_h: bool,
    _flip_v: bool,
) -> Option<String> {
    match geometry {
        Geometry::Preset { name, .. } => build_preset(geometry, name, w, h),
        Geometry::Custom {
            w: src_w,
            h: src_h,
            commands,
        } => Some(build_custom(commands, *src_w, *src_h, w, h)),
    }
}

fn build_preset(geom: &Geometry, name: &str, w: f64, h: f64) -> Option<String> {
    let defaults = PRESET_DEFAULTS.get(name)?;
    let adj = |key: &str| -> f64 {
        let default = defaults
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| *v)
            .unwrap_or(0);
        geom.adjustment(key, default) as f64
    };
    // Corner radii and insets live in the 100 000-unit adjustment space and
    // scale against the lesser dimension, clamped to keep edges from crossing.
    let side = |key: &str| -> f64 {
        let ratio = (adj(key) / 100_000.0).clamp(0.0, 0.5);
        ratio * w.min(h)
    };

    let mut p = PathWriter::new();
    match name {
        "rect" => {
            p.move_to(0.0, 0.0);
            p.line_to(w, 0.0);
            p.line_to(w, h);
            p.line_to(0.0, h);
            p.close();
        },
        "roundRect" => {
            let r = side("adj");
            rounded_rect(&mut p, w, h, [r, r, r, r]);
        },
        "round1Rect" => {
            let r = side("adj");
            rounded_rect(&mut p, w, h, [0.0, r, 0.0, 0.0]);
        },
        "round2SameRect" => {
            let r1 = side("adj1");
            let r2 = side("adj2");
            rounded_rect(&mut p, w, h, [r1, r1, r2, r2]);
        },
        "round2DiagRect" => {
            let r1 = side("adj1");
            let r2 = side("adj2");
            rounded_rect(&mut p, w, h, [r1, r2, r1, r2]);
        },
        "snip1Rect" => {
            let s = side("adj");
            snipped_rect(&mut p, w, h, [0.0, s, 0.0, 0.0]);
        },
        "snip2SameRect" => {
            let s1 = side("adj1");
            let s2 = side("adj2");
            snipped_rect(&mut p, w, h, [s1, s1, s2, s2]);
        },
        "snip2DiagRect" => {
            let s1 = side("adj1");
            let s2 = side("adj2");
            snipped_rect(&mut p, w, h, [s1, s2, s1, s2]);
        },
        "snipRoundRect" => {
            let r = side("adj1");
            let s = side("adj2");
            p.move_to(r, 0.0);
            p.line_to(w - s, 0.0);
            p.line_to(w, s);
            p.line_to(w, h);
            p.line_to(0.0, h);
            p.line_to(0.0, r);
            p.arc(r, r, false, true, r, 0.0);
            p.close();
        },
        "ellipse" => {
            let (rx, ry) = (w / 2.0, h / 2.0);
            p.move_to(0.0, ry);
            p.arc(rx, ry, true, true, w, ry);
            p.arc(rx, ry, true, true, 0.0, ry);
            p.close();
        },
        "arc" => {
            let (cx, cy, rx, ry) = (w / 2.0, h / 2.0, w / 2.0, h / 2.0);
            let start = adj("adj1") / 60_000.0;
            let end = adj("adj2") / 60_000.0;
            let swing = positive_sweep(end - start);
            let (x0, y0) = ellipse_point(cx, cy, rx, ry, start);
            let (x1, y1) = ellipse_point(cx, cy, rx, ry, start + swing);
            p.move_to(x0, y0);
            p.arc(rx, ry, swing > 180.0, true, x1, y1);
        },
        "blockArc" => {
            let (cx, cy, rx, ry) = (w / 2.0, h / 2.0, w / 2.0, h / 2.0);
            let start = adj("adj1") / 60_000.0;
            let end = adj("adj2") / 60_000.0;
            let swing = positive_sweep(end - start);
            let thickness = (adj("adj3") / 100_000.0).clamp(0.0, 0.5) * w.min(h);
            let (irx, iry) = ((rx - thickness).max(0.0), (ry - thickness).max(0.0));
            let (x0, y0) = ellipse_point(cx, cy, rx, ry, start);
            let (x1, y1) = ellipse_point(cx, cy, rx, ry, start + swing);
            let (ix1, iy1) = ellipse_point(cx, cy, irx, iry, start + swing);
            let (ix0, iy0) = ellipse_point(cx, cy, irx, iry, start);
            p.move_to(x0, y0);
            p.arc(rx, ry, swing > 180.0, true, x1, y1);
            p.line_to(ix1, iy1);
            p.arc(irx, iry, swing > 180.0, false, ix0, iy0);
            p.close();
        },
        "chevron" => {
            let x1 = side("adj").min(w);
            p.move_to(0.0, 0.0);
            p.line_to(w - x1, 0.0);
            p.line_to(w, h / 2.0);
            p.line_to(w - x1, h);
            p.line_to(0.0, h);
            p.line_to(x1, h / 2.0);
            p.close();
        },
        "homePlate" => {
            let x1 = side("adj").min(w);
            p.move_to(0.0, 0.0);
            p.line_to(w - x1, 0.0);
            p.line_to(w, h / 2.0);
            p.line_to(w - x1, h);
            p.line_to(0.0, h);
            p.close();
        },
        "corner" => {
            let x1 = side("adj1");
            let y1 = side("adj2");
            p.move_to(0.0, 0.0);
            p.line_to(x1, 0.0);
            p.line_to(x1, h - y1);
            p.line_to(w, h - y1);
            p.line_to(w, h);
            p.line_to(0.0, h);
            p.close();
        },
        _ => return None,
    }
    Some(p.finish())
}

/// Corner radii ordered top-left, top-right, bottom-right, bottom-left.
fn rounded_rect(p: &mut PathWriter, w: f64, h: f64, [tl, tr, br, bl]: [f64; 4]) {
    p.move_to(tl, 0.0);
    p.line_to(w - tr, 0.0);
    if tr > 0.0 {
        p.arc(tr, tr, false, true, w, tr);
    }
    p.line_to(w, h - br);
    if br > 0.0 {
        p.arc(br, br, false, true, w - br, h);
    }
    p.line_to(bl, h);
    if bl > 0.0 {
        p.arc(bl, bl, false, true, 0.0, h - bl);
    }
    p.line_to(0.0, tl);
    if tl > 0.0 {
        p.arc(tl, tl, false, true, tl, 0.0);
    }
    p.close();
}

/// Snip distances ordered top-left, top-right, bottom-right, bottom-left.
fn snipped_rect(p: &mut PathWriter, w: f64, h: f64, [tl, tr, br, bl]: [f64; 4]) {
    p.move_to(tl, 0.0);
    p.line_to(w - tr, 0.0);
    if tr > 0.0 {
        p.line_to(w, tr);
    }
    p.line_to(w, h - br);
    if br > 0.0 {
        p.line_to(w - br, h);
    }
    p.line_to(bl, h);
    if bl > 0.0 {
        p.line_to(0.0, h - bl);
    }
    p.line_to(0.0, tl);
    if tl > 0.0 {
        p.line_to(tl, 0.0);
    }
    p.close();
}

fn build_custom(commands: &[PathCommand], src_w: i64, src_h: i64, w: f64, h: f64) -> String {
    let sx = if src_w != 0 { w / src_w as f64 } else { 1.0 };
    let sy = if src_h != 0 { h / src_h as f64 } else { 1.0 };
    let mut p = PathWriter::new();
    // Arc commands need the current point to locate the ellipse center.
    let mut cursor = Pt { x: 0.0, y: 0.0 };
    for cmd in commands {
        match cmd {
            PathCommand::MoveTo(pt) => {
                cursor = *pt;
                p.move_to(pt.x * sx, pt.y * sy);
            },
            PathCommand::LineTo(pt) => {
                cursor = *pt;
                p.line_to(pt.x * sx, pt.y * sy);
            },
            PathCommand::CubicTo(c1, c2, to) => {
                cursor = *to;
                p.cubic_to(
                    c1.x * sx,
                    c1.y * sy,
                    c2.x * sx,
                    c2.y * sy,
                    to.x * sx,
                    to.y * sy,
                );
            },
            PathCommand::QuadTo(c1, to) => {
                cursor = *to;
                p.quad_to(c1.x * sx, c1.y * sy, to.x * sx, to.y * sy);
            },
            PathCommand::ArcTo {
                w_r,
                h_r,
                start_deg,
                swing_deg,
            } => {
                // The current point sits on the ellipse at the start angle.
                let (sdx, sdy) = unit_direction(*start_deg);
                let cx = cursor.x - w_r * sdx;
                let cy = cursor.y - h_r * sdy;
                let end_deg = start_deg + swing_deg;
                let (ex, ey) = ellipse_point(cx, cy, *w_r, *h_r, end_deg);
                cursor = Pt { x: ex, y: ey };
                p.arc(
                    w_r * sx,
                    h_r * sy,
                    swing_deg.abs() > 180.0,
                    *swing_deg >= 0.0,
                    ex * sx,
                    ey * sy,
                );
            },
            PathCommand::Close => p.close(),
        }
    }
    p.finish()
}

fn positive_sweep(swing: f64) -> f64 {
    let swing = swing % 360.0;
    if swing <= 0.0 { swing + 360.0 } else { swing }
}

fn unit_direction(deg: f64) -> (f64, f64) {
    let rad = deg.to_radians();
    (rad.cos(), rad.sin())
}

fn ellipse_point(cx: f64, cy: f64, rx: f64, ry: f64, deg: f64) -> (f64, f64) {
    let rad = deg.to_radians();
    (cx + rx * rad.cos(), cy + ry * rad.sin())
}

/// Accumulates path commands in the SVG grammar.
struct PathWriter {
    out: String,
}

impl PathWriter {
    fn new() -> Self {
        Self { out: String::new() }
    }

    fn move_to(&mut self, x: f64, y: f64) {
        let _ = write!(self.out, "M{} {}", num(x), num(y));
    }

    fn line_to(&mut self, x: f64, y: f64) {
        let _ = write!(self.out, "L{} {}", num(x), num(y));
    }

    fn cubic_to(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, x: f64, y: f64) {
        let _ = write!(
            self.out,
            "C{} {} {} {} {} {}",
            num(x1),
            num(y1),
            num(x2),
            num(y2),
            num(x),
            num(y)
        );
    }

    fn quad_to(&mut self, x1: f64, y1: f64, x: f64, y: f64) {
        let _ = write!(self.out, "Q{} {} {} {}", num(x1), num(y1), num(x), num(y));
    }

    fn arc(&mut self, rx: f64, ry: f64, large: bool, sweep: bool, x: f64, y: f64) {
        let _ = write!(
            self.out,
            "A{} {} 0 {} {} {} {}",
            num(rx),
            num(ry),
            large as u8,
            sweep as u8,
            num(x),
            num(y)
        );
    }

    fn close(&mut self) {
        self.out.push('Z');
    }

    fn finish(self) -> String {
        self.out
    }
}

/// Format a coordinate with at most two decimals, trailing zeros trimmed.
fn num(v: f64) -> String {
    let s = format!("{v:.2}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" { "0".to_string() } else { s.to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn preset(name: &str) -> Geometry {
        Geometry::Preset {
            name: name.to_string(),
            adjustments: HashMap::new(),
        }
    }

    #[test]
    fn test_rect_path() {
        let path = build_path(&preset("rect"), 100.0, 50.0, false, false).unwrap();
        assert_eq!(path, "M0 0L100 0L100 50L0 50Z");
    }

    #[test]
    fn test_round_rect_uses_default_adjustment() {
        // adj defaults to 16667: radius = 50 * 0.16667 ≈ 8.33.
        let path = build_path(&preset("roundRect"), 100.0, 50.0, false, false).unwrap();
        assert!(path.starts_with("M8.33 0"), "{path}");
        assert!(path.contains("A8.33 8.33 0 0 1"), "{path}");
    }

    #[test]
    fn test_round_rect_adjustment_override() {
        let geom = Geometry::Preset {
            name: "roundRect".to_string(),
            adjustments: HashMap::from([("adj".to_string(), 50000)]),
        };
        let path = build_path(&geom, 100.0, 100.0, false, false).unwrap();
        assert!(path.starts_with("M50 0"), "{path}");
    }

    #[test]
    fn test_ellipse_two_arcs() {
        let path = build_path(&preset("ellipse"), 200.0, 100.0, false, false).unwrap();
        assert_eq!(path, "M0 50A100 50 0 1 1 200 50A100 50 0 1 1 0 50Z");
    }

    #[test]
    fn test_arc_default_quarter() {
        // Defaults: start 270°, end 0° → a quarter sweep from the top to the
        // right of the ellipse.
        let path = build_path(&preset("arc"), 100.0, 100.0, false, false).unwrap();
        assert!(path.starts_with("M50 0"), "{path}");
        assert!(path.ends_with("100 50"), "{path}");
        assert!(!path.contains('Z'), "{path}");
    }

    #[test]
    fn test_unknown_preset_is_none() {
        assert!(build_path(&preset("cloudCallout"), 10.0, 10.0, false, false).is_none());
    }

    #[test]
    fn test_custom_path_scaling() {
        let geom = Geometry::Custom {
            w: 10,
            h: 10,
            commands: vec![
                PathCommand::MoveTo(Pt { x: 0.0, y: 0.0 }),
                PathCommand::LineTo(Pt { x: 10.0, y: 5.0 }),
                PathCommand::Close,
            ],
        };
        let path = build_path(&geom, 100.0, 50.0, false, false).unwrap();
        assert_eq!(path, "M0 0L100 25Z");
    }

    #[test]
    fn test_custom_zero_source_dimension_keeps_scale() {
        let geom = Geometry::Custom {
            w: 0,
            h: 0,
            commands: vec![
                PathCommand::MoveTo(Pt { x: 1.0, y: 2.0 }),
                PathCommand::LineTo(Pt { x: 3.0, y: 4.0 }),
            ],
        };
        let path = build_path(&geom, 100.0, 50.0, false, false).unwrap();
        assert_eq!(path, "M1 2L3 4");
    }

    #[test]
    fn test_geometry_from_preset_xml() {
        let xml = r#"<a:spPr xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main">
            <a:prstGeom prst="roundRect">
              <a:avLst><a:gd name="adj" fmla="val 25000"/></a:avLst>
            </a:prstGeom>
        </a:spPr>"#;
        let node = XmlNode::parse(xml).unwrap();
        let geom = Geometry::from_shape_properties(&node).unwrap();
        match &geom {
            Geometry::Preset { name, adjustments } => {
                assert_eq!(name, "roundRect");
                assert_eq!(adjustments.get("adj"), Some(&25000));
            },
            other => panic!("expected preset, got {other:?}"),
        }
    }

    #[test]
    fn test_geometry_from_custom_xml() {
        let xml = r#"<a:spPr xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main">
            <a:custGeom>
              <a:pathLst>
                <a:path w="100" h="100">
                  <a:moveTo><a:pt x="0" y="0"/></a:moveTo>
                  <a:lnTo><a:pt x="100" y="0"/></a:lnTo>
                  <a:cubicBezTo>
                    <a:pt x="100" y="50"/><a:pt x="50" y="100"/><a:pt x="0" y="100"/>
                  </a:cubicBezTo>
                  <a:close/>
                </a:path>
              </a:pathLst>
            </a:custGeom>
        </a:spPr>"#;
        let node = XmlNode::parse(xml).unwrap();
        let geom = Geometry::from_shape_properties(&node).unwrap();
        match &geom {
            Geometry::Custom { w, h, commands } => {
                assert_eq!((*w, *h), (100, 100));
                assert_eq!(commands.len(), 4);
                assert!(matches!(commands[3], PathCommand::Close));
            },
            other => panic!("expected custom, got {other:?}"),
        }
    }
}
