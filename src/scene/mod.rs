//! The render-ready output model.
//!
//! Everything here is owned, resolved data: no XML nodes, no relationship
//! ids that still need lookups (image ids are pre-resolved through the
//! per-layer image maps), no theme aliases in font families. Renderers and
//! converters consume these types without further context.

use crate::error::Diagnostic;
use crate::geom::Matrix;
use serde::Serialize;
use std::collections::HashMap;

/// Position and extent in pixels, before the transform is applied.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

/// A color modifier in source order, with its value normalized to a ratio.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum ColorModifier {
    Tint(f64),
    Shade(f64),
    LumMod(f64),
    LumOff(f64),
    SatMod(f64),
    Alpha(f64),
}

/// A fully resolved color, or a preserved theme-scheme token.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Color {
    Srgb {
        /// `#RRGGBB`.
        value: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        alpha: Option<f64>,
    },
    Scheme {
        name: String,
        mods: Vec<ColorModifier>,
    },
}

impl Color {
    pub fn srgb(value: impl Into<String>) -> Self {
        Color::Srgb {
            value: value.into(),
            alpha: None,
        }
    }

    /// The hex value when fully resolved.
    pub fn hex(&self) -> Option<&str> {
        match self {
            Color::Srgb { value, .. } => Some(value),
            Color::Scheme { .. } => None,
        }
    }
}

/// One stop of a gradient fill.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradientStop {
    /// Position along the gradient axis, 0..1.
    pub pos: f64,
    pub color: Color,
}

/// Source cropping of an image fill, each side a 0..1 ratio.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct SrcRect {
    pub l: f64,
    pub t: f64,
    pub r: f64,
    pub b: f64,
}

/// A resolved image reference.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ImageRef {
    /// Opaque media reference produced by the host's media resolver.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub src_rect: Option<SrcRect>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duotone: Option<[Color; 2]>,
}

/// A shape or background fill.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Fill {
    Solid {
        color: Color,
    },
    Gradient {
        stops: Vec<GradientStop>,
        /// Gradient axis direction in degrees.
        angle_deg: f64,
    },
    Image {
        image: ImageRef,
    },
    Pattern {
        preset: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        fg: Option<Color>,
        #[serde(skip_serializing_if = "Option::is_none")]
        bg: Option<Color>,
    },
    None,
}

impl Fill {
    pub fn solid_hex(&self) -> Option<&str> {
        match self {
            Fill::Solid { color } => color.hex(),
            _ => None,
        }
    }
}

/// A resolved outline.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Stroke {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
    pub width_px: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cap: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub join: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compound: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dash: Option<String>,
}

/// An outer-shadow effect.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Effect {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
    pub blur_px: f64,
    pub dist_px: f64,
    pub dir_deg: f64,
}

/// Font of one laid-out run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FontSpec {
    /// Concrete family name; never a `+mj-lt`/`+mn-lt` alias.
    pub family: String,
    /// Size in pixels.
    pub size: f64,
    /// `normal` or `bold`.
    pub weight: String,
    /// `normal` or `italic`.
    pub style: String,
}

impl Default for FontSpec {
    fn default() -> Self {
        Self {
            family: "Arial".to_string(),
            size: 24.0,
            weight: "normal".to_string(),
            style: "normal".to_string(),
        }
    }
}

/// One measured run within a line.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Run {
    pub text: String,
    pub font: FontSpec,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub underline: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not", default)]
    pub strike: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highlight: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hyperlink: Option<String>,
    /// Baseline shift as a ratio; positive raises (superscript).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub baseline: Option<f64>,
}

/// One laid-out line.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Line {
    /// Top of the line relative to the text frame.
    pub y: f64,
    /// Left offset produced by margins, indent, and alignment.
    pub x: f64,
    pub height: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bullet: Option<String>,
    /// Extra width justification adds to each interior word gap.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub word_spacing: Option<f64>,
    pub runs: Vec<Run>,
}

/// A laid-out text body.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct TextLayout {
    pub total_height: f64,
    pub lines: Vec<Line>,
}

/// One resolved table cell.
///
/// Merged regions appear exactly once, at their top-left grid coordinate,
/// with spans recording their extent.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableCell {
    pub row: usize,
    pub col: usize,
    pub row_span: usize,
    pub col_span: usize,
    /// Cell box in table-local pixels.
    pub rect: Rect,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill: Option<Fill>,
    pub borders: Borders,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<TextLayout>,
}

/// Per-side cell borders.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct Borders {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left: Option<Stroke>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub right: Option<Stroke>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top: Option<Stroke>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bottom: Option<Stroke>,
}

/// One chart series.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ChartSeries {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub categories: Vec<String>,
    pub values: Vec<f64>,
}

/// Parsed chart content.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ChartData {
    /// Plot kind, e.g. `barChart`, `lineChart`, `pieChart`.
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub series: Vec<ChartSeries>,
}

/// A positioned, styled element of a slide.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Shape {
    Shape {
        #[serde(skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        pos: Rect,
        transform: Matrix,
        #[serde(skip_serializing_if = "Option::is_none")]
        path: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        fill: Option<Fill>,
        #[serde(skip_serializing_if = "Option::is_none")]
        stroke: Option<Stroke>,
        #[serde(skip_serializing_if = "Option::is_none")]
        effect: Option<Effect>,
        #[serde(skip_serializing_if = "Option::is_none")]
        text: Option<TextLayout>,
        rot: f64,
        flip_h: bool,
        flip_v: bool,
    },
    Picture {
        #[serde(skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        pos: Rect,
        transform: Matrix,
        #[serde(skip_serializing_if = "Option::is_none")]
        path: Option<String>,
        image: ImageRef,
        rot: f64,
    },
    Table {
        pos: Rect,
        transform: Matrix,
        num_rows: usize,
        num_cols: usize,
        cells: Vec<TableCell>,
    },
    Chart {
        pos: Rect,
        transform: Matrix,
        chart: ChartData,
    },
    Diagram {
        pos: Rect,
        transform: Matrix,
        children: Vec<Shape>,
    },
}

impl Shape {
    /// The shape's transform matrix.
    pub fn transform(&self) -> &Matrix {
        match self {
            Shape::Shape { transform, .. }
            | Shape::Picture { transform, .. }
            | Shape::Table { transform, .. }
            | Shape::Chart { transform, .. }
            | Shape::Diagram { transform, .. } => transform,
        }
    }

    /// The shape's untransformed box.
    pub fn pos(&self) -> &Rect {
        match self {
            Shape::Shape { pos, .. }
            | Shape::Picture { pos, .. }
            | Shape::Table { pos, .. }
            | Shape::Chart { pos, .. }
            | Shape::Diagram { pos, .. } => pos,
        }
    }
}

/// Recorded slide transition (type and duration only).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transition {
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<f64>,
}

/// Relationship-id → media reference maps, one per inheritance layer.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ImageMaps {
    pub slide: HashMap<String, String>,
    pub layout: HashMap<String, String>,
    pub master: HashMap<String, String>,
}

/// The parsed content of one slide.
#[derive(Debug, Clone, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SlideData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background: Option<Fill>,
    pub shapes: Vec<Shape>,
    pub image_maps: ImageMaps,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transition: Option<Transition>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub diagnostics: Vec<Diagnostic>,
}

/// One slide of the output, in presentation order.
#[derive(Debug, Clone, Serialize)]
pub struct Slide {
    /// Slide id from the presentation part's slide-id list.
    pub id: u32,
    pub data: SlideData,
}

/// Slide dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SlideSize {
    pub width: f64,
    pub height: f64,
}
