//! The text layout engine.
//!
//! Takes a text body, the merged property stacks, and the measurement
//! oracle, and produces positioned lines of styled runs. Purely synchronous:
//! every part involved is already in memory when layout starts.

use crate::drawing::properties::SlideContext;
use crate::drawing::table_style::TcTextStyle;
use crate::geom::units::centipoints_to_px;
use crate::opc::Relationships;
use crate::scene::{FontSpec, Line, Run, TextLayout};
use crate::text::measure::TextMeasurer;
use crate::text::style::{ListStyle, ParaProps, RunProps};
use crate::xml::{XmlNode, ns};
use std::collections::HashMap;

/// Default body insets in EMU (left/right 0.1", top/bottom 0.05").
const DEFAULT_INS_LR: i64 = 91_440;
const DEFAULT_INS_TB: i64 = 45_720;

/// Default run size in hundredths of a point.
const DEFAULT_SIZE: i64 = 1800;

/// Baseline line-height factor.
const LINE_FACTOR: f64 = 1.25;

/// The property stacks feeding one text body's layout.
#[derive(Default, Clone, Copy)]
pub struct TextMergeInput<'a> {
    /// Default text style for the placeholder family.
    pub defaults: Option<&'a ListStyle>,
    pub master_list: Option<&'a ListStyle>,
    pub layout_list: Option<&'a ListStyle>,
    /// The text body's own `lstStyle`.
    pub shape_list: Option<&'a ListStyle>,
    /// Table cell text style, applied after everything else.
    pub table_style: Option<&'a TcTextStyle>,
}

/// Auto-numbering counters, keyed by list level.
///
/// One instance lives per shape-tree pass and resets at every pass entry.
#[derive(Debug, Default)]
pub struct ListCounters {
    counters: HashMap<usize, i64>,
}

impl ListCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.counters.clear();
    }

    /// The next ordinal at `level`, beginning at `start_at`.
    fn next(&mut self, level: usize, start_at: i64) -> i64 {
        let counter = self.counters.entry(level).or_insert(start_at - 1);
        *counter += 1;
        *counter
    }
}

/// Body-level layout properties from `bodyPr`.
#[derive(Debug, Clone)]
pub struct BodyProps {
    pub l_ins: f64,
    pub t_ins: f64,
    pub r_ins: f64,
    pub b_ins: f64,
    /// Line-spacing reduction ratio from `normAutofit`.
    pub ln_spc_reduction: f64,
    /// Font scale ratio from `normAutofit`.
    pub font_scale: f64,
    pub anchor: Option<String>,
}

impl Default for BodyProps {
    fn default() -> Self {
        Self {
            l_ins: crate::geom::units::emu_to_px(DEFAULT_INS_LR),
            t_ins: crate::geom::units::emu_to_px(DEFAULT_INS_TB),
            r_ins: crate::geom::units::emu_to_px(DEFAULT_INS_LR),
            b_ins: crate::geom::units::emu_to_px(DEFAULT_INS_TB),
            ln_spc_reduction: 0.0,
            font_scale: 1.0,
            anchor: None,
        }
    }
}

impl BodyProps {
    pub fn parse(body_pr: Option<&XmlNode>) -> BodyProps {
        let mut props = BodyProps::default();
        let Some(body_pr) = body_pr else {
            return props;
        };
        let inset = |name: &str, default: f64| {
            body_pr
                .attr_i64(name)
                .map(crate::geom::units::emu_to_px)
                .unwrap_or(default)
        };
        props.l_ins = inset("lIns", props.l_ins);
        props.t_ins = inset("tIns", props.t_ins);
        props.r_ins = inset("rIns", props.r_ins);
        props.b_ins = inset("bIns", props.b_ins);
        props.anchor = body_pr.attr("anchor").map(str::to_string);
        if let Some(autofit) = body_pr.child(ns::DML, "normAutofit") {
            props.ln_spc_reduction = autofit
                .attr_i64("lnSpcReduction")
                .map(crate::geom::units::permille_to_ratio)
                .unwrap_or(0.0);
            props.font_scale = autofit
                .attr_i64("fontScale")
                .map(crate::geom::units::permille_to_ratio)
                .unwrap_or(1.0);
        }
        props
    }

    /// Merge: `other`'s explicit body takes over entirely when present.
    pub fn or_inherited(tx_body: Option<&XmlNode>, inherited: Option<&XmlNode>) -> BodyProps {
        let own = tx_body.and_then(|body| body.child(ns::DML, "bodyPr"));
        let fallback = inherited.and_then(|body| body.child(ns::DML, "bodyPr"));
        BodyProps::parse(own.or(fallback))
    }
}

/// Lay out a text body into positioned lines.
#[allow(clippy::too_many_arguments)]
pub fn layout_text_body(
    tx_body: &XmlNode,
    width_px: f64,
    body: &BodyProps,
    merge: &TextMergeInput,
    ctx: &SlideContext,
    measurer: &dyn TextMeasurer,
    counters: &mut ListCounters,
    rels: Option<&Relationships>,
) -> TextLayout {
    let mut layout = TextLayout::default();
    let padded_width = (width_px - body.l_ins - body.r_ins).max(0.0);
    let mut y = body.t_ins;

    // Only direct paragraph children: nested bodies (table text inside a
    // shape tree) must not leak in.
    for para in tx_body.children(ns::DML, "p") {
        let p_pr = para.child(ns::DML, "pPr");
        let level = p_pr.and_then(|p| p.attr_i64("lvl")).unwrap_or(0).max(0) as usize;

        let mut effective = ParaProps::default();
        for list in [
            merge.defaults,
            merge.master_list,
            merge.layout_list,
            merge.shape_list,
        ] {
            if let Some(template) = list.and_then(|list| list.level(level)) {
                effective = effective.merged_with(template);
            }
        }
        if let Some(p_pr) = p_pr {
            effective = effective.merged_with(&ParaProps::parse(p_pr));
        }
        if let Some(table) = merge.table_style {
            effective.def_rpr = effective.def_rpr.merged_with(&RunProps {
                bold: table.bold,
                italic: table.italic,
                color: table.color.clone(),
                ..RunProps::default()
            });
        }

        let bullet = bullet_text(&effective, level, counters);
        let para_runs = collect_runs(para, &effective.def_rpr, body, ctx, rels);
        let lines = wrap_paragraph(
            &para_runs,
            &effective,
            bullet,
            padded_width,
            body,
            measurer,
            &mut y,
        );
        layout.lines.extend(lines);
    }

    layout.total_height = y + body.b_ins;
    layout
}

/// A styled run before wrapping, with forced breaks kept separate.
enum ParaItem {
    Run(Run),
    Break,
}

fn collect_runs(
    para: &XmlNode,
    def_rpr: &RunProps,
    body: &BodyProps,
    ctx: &SlideContext,
    rels: Option<&Relationships>,
) -> Vec<ParaItem> {
    let mut items = Vec::new();
    for child in para.all_children() {
        match child.name() {
            "r" | "fld" => {
                let own = child
                    .child(ns::DML, "rPr")
                    .map(RunProps::parse)
                    .unwrap_or_default();
                let props = def_rpr.merged_with(&own);
                let text = child
                    .child(ns::DML, "t")
                    .map(|t| t.deep_text())
                    .unwrap_or_default();
                if text.is_empty() {
                    continue;
                }
                items.push(ParaItem::Run(make_run(text, &props, body, ctx, rels)));
            },
            "br" => items.push(ParaItem::Break),
            _ => {},
        }
    }
    items
}

fn make_run(
    text: String,
    props: &RunProps,
    body: &BodyProps,
    ctx: &SlideContext,
    rels: Option<&Relationships>,
) -> Run {
    let text = match props.caps.as_deref() {
        Some("all") => text.to_uppercase(),
        _ => text,
    };
    let family = resolve_family(props.latin.as_deref(), ctx);
    let size = centipoints_to_px(props.size.unwrap_or(DEFAULT_SIZE)) * body.font_scale;
    Run {
        text,
        font: FontSpec {
            family,
            size,
            weight: if props.bold.unwrap_or(false) {
                "bold".to_string()
            } else {
                "normal".to_string()
            },
            style: if props.italic.unwrap_or(false) {
                "italic".to_string()
            } else {
                "normal".to_string()
            },
        },
        color: props.color.as_ref().map(|def| ctx.resolve(def)),
        underline: props
            .underline
            .clone()
            .filter(|kind| kind != "none"),
        strike: props.strike.unwrap_or(false),
        highlight: props.highlight.as_ref().map(|def| ctx.resolve(def)),
        hyperlink: props
            .hyperlink_rid
            .as_deref()
            .and_then(|rid| rels?.external_target(rid).map(str::to_string)),
        baseline: props.baseline,
    }
}

/// A run's family with theme aliases replaced by concrete typefaces.
fn resolve_family(latin: Option<&str>, ctx: &SlideContext) -> String {
    match latin {
        Some("+mj-lt") | Some("+mj-ea") | Some("+mj-cs") => ctx.theme.major_font().to_string(),
        Some("+mn-lt") | Some("+mn-ea") | Some("+mn-cs") | None => {
            ctx.theme.minor_font().to_string()
        },
        Some(explicit) => explicit.to_string(),
    }
}

fn bullet_text(
    effective: &ParaProps,
    level: usize,
    counters: &mut ListCounters,
) -> Option<String> {
    if effective.bullet.is_none() {
        return None;
    }
    match effective.bullet.kind.as_deref() {
        Some("char") => effective.bullet.char.clone(),
        Some("autoNum") => {
            let start_at = effective.bullet.start_at.unwrap_or(1);
            let ordinal = counters.next(level, start_at);
            Some(format_ordinal(
                ordinal,
                effective.bullet.scheme.as_deref().unwrap_or("arabicPeriod"),
            ))
        },
        _ => None,
    }
}

/// Format an auto-number ordinal under a numbering scheme.
fn format_ordinal(ordinal: i64, scheme: &str) -> String {
    let digits = if scheme.starts_with("romanUc") {
        to_roman(ordinal).to_uppercase()
    } else if scheme.starts_with("romanLc") {
        to_roman(ordinal)
    } else if scheme.starts_with("alphaUc") {
        to_alpha(ordinal).to_uppercase()
    } else if scheme.starts_with("alphaLc") {
        to_alpha(ordinal)
    } else {
        ordinal.to_string()
    };
    if scheme.ends_with("ParenBoth") {
        format!("({digits})")
    } else if scheme.ends_with("ParenR") {
        format!("{digits})")
    } else if scheme.ends_with("Period") {
        format!("{digits}.")
    } else {
        digits
    }
}

fn to_roman(mut value: i64) -> String {
    const TABLE: [(i64, &str); 13] = [
        (1000, "m"),
        (900, "cm"),
        (500, "d"),
        (400, "cd"),
        (100, "c"),
        (90, "xc"),
        (50, "l"),
        (40, "xl"),
        (10, "x"),
        (9, "ix"),
        (5, "v"),
        (4, "iv"),
        (1, "i"),
    ];
    if value <= 0 {
        return value.to_string();
    }
    let mut out = String::new();
    for (weight, glyph) in TABLE {
        while value >= weight {
            out.push_str(glyph);
            value -= weight;
        }
    }
    out
}

fn to_alpha(value: i64) -> String {
    if value <= 0 {
        return value.to_string();
    }
    let mut value = value;
    let mut out = Vec::new();
    while value > 0 {
        value -= 1;
        out.push(b'a' + (value % 26) as u8);
        value /= 26;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

#[allow(clippy::too_many_arguments)]
fn wrap_paragraph(
    items: &[ParaItem],
    effective: &ParaProps,
    bullet: Option<String>,
    padded_width: f64,
    body: &BodyProps,
    measurer: &dyn TextMeasurer,
    y: &mut f64,
) -> Vec<Line> {
    let mar_l = effective.mar_l.unwrap_or(0.0);
    let indent = effective.indent.unwrap_or(0.0);
    let align = effective.align.as_deref().unwrap_or("l");

    let def_size = centipoints_to_px(effective.def_rpr.size.unwrap_or(DEFAULT_SIZE)) * body.font_scale;
    let line_height_of = |size: f64| size * (1.0 - body.ln_spc_reduction) * LINE_FACTOR;

    let bullet_offset = bullet
        .as_ref()
        .map(|text| {
            let font = FontSpec {
                size: def_size,
                ..FontSpec::default()
            };
            measurer.measure_text(text, &font) + def_size * 0.25
        })
        .unwrap_or(0.0);

    let mut lines: Vec<Line> = Vec::new();
    let mut current: Vec<Run> = Vec::new();
    let mut current_width = 0.0_f64;
    let mut first_line = true;

    let available = |first: bool| {
        let first_indent = if first { indent } else { 0.0 };
        (padded_width - mar_l - first_indent - bullet_offset).max(1.0)
    };

    let flush = |lines: &mut Vec<Line>,
                 current: &mut Vec<Run>,
                 width: f64,
                 first: bool,
                 last: bool,
                 y: &mut f64| {
        let max_size = current
            .iter()
            .map(|run| run.font.size)
            .fold(0.0_f64, f64::max);
        let size = if max_size > 0.0 { max_size } else { def_size };
        let height = line_height_of(size);
        let avail = available(first);
        let shift = match align {
            "ctr" => ((avail - width) / 2.0).max(0.0),
            "r" => (avail - width).max(0.0),
            _ => 0.0,
        };
        // Justification spreads the leftover width over interior word gaps;
        // lines that end a paragraph or a forced break stay ragged.
        let word_spacing = if align == "just" && !last {
            let trailing = current
                .last()
                .map(|run| {
                    let trimmed = run.text.trim_end();
                    measurer.measure_text(&run.text[trimmed.len()..], &run.font)
                })
                .unwrap_or(0.0);
            let text: String = current.iter().map(|run| run.text.as_str()).collect();
            let gaps = text.split_whitespace().count().saturating_sub(1);
            (gaps > 0)
                .then(|| (avail - (width - trailing)) / gaps as f64)
                .filter(|extra| *extra > 0.0)
        } else {
            None
        };
        let first_indent = if first { indent } else { 0.0 };
        lines.push(Line {
            y: *y,
            x: body.l_ins + mar_l + first_indent + bullet_offset + shift,
            height,
            bullet: if first { bullet.clone() } else { None },
            word_spacing,
            runs: std::mem::take(current),
        });
        *y += height;
    };

    for item in items {
        match item {
            ParaItem::Break => {
                flush(&mut lines, &mut current, current_width, first_line, true, y);
                current_width = 0.0;
                first_line = false;
            },
            ParaItem::Run(run) => {
                let mut segment = String::new();
                for word in split_words(&run.text) {
                    let word_width = measurer.measure_text(word, &run.font);
                    let fits = current_width + word_width <= available(first_line);
                    let line_has_content = current_width > 0.0 || !current.is_empty();
                    if !fits && line_has_content && !word.trim().is_empty() {
                        if !segment.is_empty() {
                            current.push(Run {
                                text: std::mem::take(&mut segment),
                                ..run.clone()
                            });
                        }
                        flush(&mut lines, &mut current, current_width, first_line, false, y);
                        current_width = 0.0;
                        first_line = false;
                        // Leading whitespace stays on the previous line.
                        let word = word.trim_start();
                        segment.push_str(word);
                        current_width += measurer.measure_text(word, &run.font);
                    } else {
                        segment.push_str(word);
                        current_width += word_width;
                    }
                }
                if !segment.is_empty() {
                    current.push(Run {
                        text: segment,
                        ..run.clone()
                    });
                }
            },
        }
    }

    // The final line, or an empty line for an empty paragraph.
    flush(&mut lines, &mut current, current_width, first_line, true, y);
    lines
}

/// Split into alternating word and whitespace tokens, both preserved.
fn split_words(text: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut start = 0;
    let mut in_space = None;
    for (index, c) in text.char_indices() {
        let is_space = c.is_whitespace();
        match in_space {
            None => in_space = Some(is_space),
            Some(prev) if prev != is_space => {
                tokens.push(&text[start..index]);
                start = index;
                in_space = Some(is_space);
            },
            _ => {},
        }
    }
    if start < text.len() {
        tokens.push(&text[start..]);
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drawing::color::ColorMap;
    use crate::drawing::theme::{FontScheme, Theme};
    use crate::text::measure::AvgAdvanceMeasurer;

    fn theme_with_fonts() -> Theme {
        Theme {
            font_scheme: FontScheme {
                major: Some("Calibri Light".to_string()),
                minor: Some("Calibri".to_string()),
            },
            ..Theme::default()
        }
    }

    fn layout(xml: &str, width: f64) -> TextLayout {
        let theme = theme_with_fonts();
        let ctx = SlideContext::new(&theme, ColorMap::default());
        let body = XmlNode::parse_fragment(xml);
        let props = BodyProps::parse(body.child(ns::DML, "bodyPr"));
        let mut counters = ListCounters::new();
        layout_text_body(
            &body,
            width,
            &props,
            &TextMergeInput::default(),
            &ctx,
            &AvgAdvanceMeasurer::default(),
            &mut counters,
            None,
        )
    }

    #[test]
    fn test_theme_font_alias() {
        // 18pt italic via the minor-font alias: family Calibri, 24px.
        let result = layout(
            r#"<p:txBody><a:bodyPr/><a:p>
              <a:r><a:rPr sz="1800" i="1"><a:latin typeface="+mn-lt"/></a:rPr><a:t>Hi</a:t></a:r>
            </a:p></p:txBody>"#,
            400.0,
        );
        let run = &result.lines[0].runs[0];
        assert_eq!(run.font.family, "Calibri");
        assert_eq!(run.font.size, 24.0);
        assert_eq!(run.font.style, "italic");
        assert_eq!(run.font.weight, "normal");
    }

    #[test]
    fn test_word_wrap() {
        // 24px font, 0.5 advance: each char 12px. "aaaa bbbb cccc" needs
        // 14*12=168px; a 100px-ish available width forces wrapping.
        let result = layout(
            r#"<p:txBody><a:bodyPr lIns="0" rIns="0" tIns="0" bIns="0"/><a:p>
              <a:r><a:rPr sz="1800"/><a:t>aaaa bbbb cccc</a:t></a:r>
            </a:p></p:txBody>"#,
            110.0,
        );
        assert_eq!(result.lines.len(), 2);
        assert_eq!(result.lines[0].runs[0].text, "aaaa bbbb ");
        assert_eq!(result.lines[1].runs[0].text, "cccc");
        assert!(result.lines[1].y > result.lines[0].y);
    }

    #[test]
    fn test_forced_break() {
        let result = layout(
            r#"<p:txBody><a:bodyPr/><a:p>
              <a:r><a:t>one</a:t></a:r><a:br/><a:r><a:t>two</a:t></a:r>
            </a:p></p:txBody>"#,
            400.0,
        );
        assert_eq!(result.lines.len(), 2);
        assert_eq!(result.lines[0].runs[0].text, "one");
        assert_eq!(result.lines[1].runs[0].text, "two");
    }

    #[test]
    fn test_line_height_formula() {
        // 18pt → 24px; height = 24 * 1.25 = 30.
        let result = layout(
            r#"<p:txBody><a:bodyPr/><a:p><a:r><a:rPr sz="1800"/><a:t>x</a:t></a:r></a:p></p:txBody>"#,
            400.0,
        );
        assert_eq!(result.lines[0].height, 30.0);
    }

    #[test]
    fn test_line_spacing_reduction() {
        let result = layout(
            r#"<p:txBody><a:bodyPr><a:normAutofit lnSpcReduction="20000"/></a:bodyPr>
              <a:p><a:r><a:rPr sz="1800"/><a:t>x</a:t></a:r></a:p></p:txBody>"#,
            400.0,
        );
        assert_eq!(result.lines[0].height, 24.0);
    }

    #[test]
    fn test_auto_numbering_increments() {
        let theme = theme_with_fonts();
        let ctx = SlideContext::new(&theme, ColorMap::default());
        let body = XmlNode::parse_fragment(
            r#"<p:txBody><a:bodyPr/>
              <a:p><a:pPr><a:buAutoNum type="arabicPeriod" startAt="2"/></a:pPr><a:r><a:t>a</a:t></a:r></a:p>
              <a:p><a:pPr><a:buAutoNum type="arabicPeriod" startAt="2"/></a:pPr><a:r><a:t>b</a:t></a:r></a:p>
            </p:txBody>"#,
        );
        let props = BodyProps::default();
        let mut counters = ListCounters::new();
        let result = layout_text_body(
            &body,
            400.0,
            &props,
            &TextMergeInput::default(),
            &ctx,
            &AvgAdvanceMeasurer::default(),
            &mut counters,
            None,
        );
        assert_eq!(result.lines[0].bullet.as_deref(), Some("2."));
        assert_eq!(result.lines[1].bullet.as_deref(), Some("3."));
    }

    #[test]
    fn test_char_bullet_only_on_first_line() {
        let result = layout(
            r#"<p:txBody><a:bodyPr lIns="0" rIns="0"/><a:p>
              <a:pPr><a:buChar char="•"/></a:pPr>
              <a:r><a:rPr sz="1800"/><a:t>aaaa bbbb cccc dddd</a:t></a:r>
            </a:p></p:txBody>"#,
            120.0,
        );
        assert!(result.lines.len() >= 2);
        assert_eq!(result.lines[0].bullet.as_deref(), Some("•"));
        assert!(result.lines[1].bullet.is_none());
    }

    #[test]
    fn test_justified_line_distributes_word_gaps() {
        // Same wrap setup as above: "aaaa bbbb " fills the first line at
        // 120px with a 12px trailing space, against 110px available.
        let result = layout(
            r#"<p:txBody><a:bodyPr lIns="0" rIns="0" tIns="0" bIns="0"/><a:p><a:pPr algn="just"/>
              <a:r><a:rPr sz="1800"/><a:t>aaaa bbbb cccc</a:t></a:r>
            </a:p></p:txBody>"#,
            110.0,
        );
        assert_eq!(result.lines.len(), 2);
        // 110 - (120 - 12) leftover px spread across the one interior gap.
        assert_eq!(result.lines[0].word_spacing, Some(2.0));
        assert_eq!(result.lines[0].x, 0.0);
        // The paragraph's closing line stays ragged.
        assert!(result.lines[1].word_spacing.is_none());
    }

    #[test]
    fn test_justified_break_line_stays_ragged() {
        let result = layout(
            r#"<p:txBody><a:bodyPr lIns="0" rIns="0"/><a:p><a:pPr algn="just"/>
              <a:r><a:rPr sz="1800"/><a:t>one two</a:t></a:r><a:br/>
              <a:r><a:rPr sz="1800"/><a:t>three</a:t></a:r>
            </a:p></p:txBody>"#,
            400.0,
        );
        assert_eq!(result.lines.len(), 2);
        assert!(result.lines[0].word_spacing.is_none());
        assert!(result.lines[1].word_spacing.is_none());
    }

    #[test]
    fn test_center_alignment_shifts_line() {
        let plain = layout(
            r#"<p:txBody><a:bodyPr lIns="0" rIns="0"/><a:p>
              <a:r><a:rPr sz="1800"/><a:t>ab</a:t></a:r></a:p></p:txBody>"#,
            200.0,
        );
        let centered = layout(
            r#"<p:txBody><a:bodyPr lIns="0" rIns="0"/><a:p><a:pPr algn="ctr"/>
              <a:r><a:rPr sz="1800"/><a:t>ab</a:t></a:r></a:p></p:txBody>"#,
            200.0,
        );
        assert_eq!(plain.lines[0].x, 0.0);
        // 200 - 24 = 176; half is 88.
        assert_eq!(centered.lines[0].x, 88.0);
    }

    #[test]
    fn test_field_contributes_text() {
        let result = layout(
            r#"<p:txBody><a:bodyPr/><a:p>
              <a:fld id="{X}" type="slidenum"><a:rPr sz="1200"/><a:t>7</a:t></a:fld>
            </a:p></p:txBody>"#,
            400.0,
        );
        assert_eq!(result.lines[0].runs[0].text, "7");
    }

    #[test]
    fn test_roman_and_alpha_ordinals() {
        assert_eq!(format_ordinal(4, "romanLcPeriod"), "iv.");
        assert_eq!(format_ordinal(9, "romanUcPeriod"), "IX.");
        assert_eq!(format_ordinal(1, "alphaLcParenR"), "a)");
        assert_eq!(format_ordinal(27, "alphaUcPeriod"), "AA.");
        assert_eq!(format_ordinal(3, "arabicParenBoth"), "(3)");
        assert_eq!(format_ordinal(5, "arabicPlain"), "5");
    }

    #[test]
    fn test_empty_paragraph_advances_y() {
        let result = layout(
            r#"<p:txBody><a:bodyPr/><a:p/><a:p><a:r><a:t>below</a:t></a:r></a:p></p:txBody>"#,
            400.0,
        );
        assert_eq!(result.lines.len(), 2);
        assert!(result.lines[0].runs.is_empty());
        assert!(result.lines[1].y > result.lines[0].y);
    }

    #[test]
    fn test_total_height_includes_insets() {
        let result = layout(
            r#"<p:txBody><a:bodyPr tIns="95250" bIns="95250"/><a:p>
              <a:r><a:rPr sz="1800"/><a:t>x</a:t></a:r></a:p></p:txBody>"#,
            400.0,
        );
        // 10 + 30 + 10
        assert_eq!(result.total_height, 50.0);
    }
}
