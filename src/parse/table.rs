//! Table grid walking and per-cell resolution.
//!
//! Walks `a:tbl`: grid columns, row heights, and cells. Merge continuations
//! (`hMerge`/`vMerge`) are skipped so every merged region surfaces exactly
//! once, at its top-left coordinate, with spans recording the extent.

use crate::drawing::properties::{SlideContext, parse_fill, parse_stroke};
use crate::drawing::table_style::{TableFlags, TableStyle, TableStyles, TcTextStyle};
use crate::geom::units::emu_to_px;
use crate::scene::{Rect, TableCell};
use crate::text::layout::{BodyProps, ListCounters, TextMergeInput, layout_text_body};
use crate::text::measure::TextMeasurer;
use crate::xml::{XmlNode, ns};
use std::collections::HashMap;

/// Parsed table content: dimensions plus resolved cells.
pub struct ParsedTable {
    pub num_rows: usize,
    pub num_cols: usize,
    pub cells: Vec<TableCell>,
}

/// Parse an `a:tbl` element.
pub fn parse_table(
    tbl: &XmlNode,
    table_styles: &TableStyles,
    ctx: &SlideContext,
    measurer: &dyn TextMeasurer,
) -> ParsedTable {
    let tbl_pr = tbl.child(ns::DML, "tblPr");
    let flags = TableFlags::parse(tbl_pr);
    let style = resolve_style(tbl_pr, table_styles);

    let col_widths: Vec<f64> = tbl
        .child(ns::DML, "tblGrid")
        .map(|grid| {
            grid.children(ns::DML, "gridCol")
                .map(|col| emu_to_px(col.attr_i64("w").unwrap_or(0)))
                .collect()
        })
        .unwrap_or_default();
    let num_cols = col_widths.len();

    let rows: Vec<&XmlNode> = tbl.children(ns::DML, "tr").collect();
    let num_rows = rows.len();
    let row_heights: Vec<f64> = rows
        .iter()
        .map(|row| emu_to_px(row.attr_i64("h").unwrap_or(0)))
        .collect();

    let col_x = prefix_sums(&col_widths);
    let row_y = prefix_sums(&row_heights);

    let mut cells = Vec::new();
    for (row_index, row) in rows.iter().enumerate() {
        let mut col_index = 0usize;
        for tc in row.children(ns::DML, "tc") {
            if col_index >= num_cols {
                break;
            }
            let h_merge = tc.attr_bool("hMerge").unwrap_or(false);
            let v_merge = tc.attr_bool("vMerge").unwrap_or(false);
            let grid_span = tc.attr_i64("gridSpan").unwrap_or(1).max(1) as usize;
            let row_span = tc.attr_i64("rowSpan").unwrap_or(1).max(1) as usize;

            if h_merge || v_merge {
                col_index += grid_span;
                continue;
            }

            let col_span = grid_span.min(num_cols - col_index);
            let row_span = row_span.min(num_rows - row_index);
            let rect = Rect {
                x: col_x[col_index],
                y: row_y[row_index],
                w: col_widths[col_index..col_index + col_span].iter().sum(),
                h: row_heights[row_index..row_index + row_span].iter().sum(),
            };

            cells.push(resolve_cell(
                tc,
                row_index,
                col_index,
                row_span,
                col_span,
                rect,
                num_rows,
                num_cols,
                flags,
                style,
                ctx,
                measurer,
            ));
            col_index += col_span;
        }
    }

    ParsedTable {
        num_rows,
        num_cols,
        cells,
    }
}

fn resolve_style<'a>(
    tbl_pr: Option<&XmlNode>,
    table_styles: &'a TableStyles,
) -> Option<&'a TableStyle> {
    let by_id = tbl_pr
        .and_then(|pr| pr.child(ns::DML, "tableStyleId"))
        .map(|id| id.text().trim().to_string())
        .and_then(|id| table_styles.get(&id));
    by_id.or_else(|| table_styles.default_style())
}

#[allow(clippy::too_many_arguments)]
fn resolve_cell(
    tc: &XmlNode,
    row: usize,
    col: usize,
    row_span: usize,
    col_span: usize,
    rect: Rect,
    num_rows: usize,
    num_cols: usize,
    flags: TableFlags,
    style: Option<&TableStyle>,
    ctx: &SlideContext,
    measurer: &dyn TextMeasurer,
) -> TableCell {
    let tc_pr = tc.child(ns::DML, "tcPr");
    let empty_images = HashMap::new();

    // Direct solid/gradient fills win; a direct noFill means "inherit from
    // the style", not "transparent".
    let direct_fill = tc_pr
        .and_then(|pr| {
            pr.all_children().iter().find(|child| {
                matches!(child.name(), "solidFill" | "gradFill" | "blipFill" | "pattFill")
            })
        })
        .and_then(|node| parse_fill(node, ctx, None, &empty_images));
    let fill = direct_fill.or_else(|| {
        style.and_then(|style| style.cell_fill(row, col, num_rows, num_cols, flags, ctx))
    });

    let mut borders = style
        .map(|style| style.cell_borders(row, col, num_rows, num_cols, flags, ctx))
        .unwrap_or_default();
    if let Some(pr) = tc_pr {
        let mut side = |name: &str, slot: &mut Option<crate::scene::Stroke>| {
            if let Some(ln) = pr.child(ns::DML, name) {
                *slot = parse_stroke(ln, ctx, None);
            }
        };
        side("lnL", &mut borders.left);
        side("lnR", &mut borders.right);
        side("lnT", &mut borders.top);
        side("lnB", &mut borders.bottom);
    }

    let text_style = style
        .map(|style| style.cell_text_style(row, col, num_rows, num_cols, flags))
        .unwrap_or_else(TcTextStyle::default);

    let text = tc.child(ns::DML, "txBody").map(|body| {
        let body_props = BodyProps::parse(body.child(ns::DML, "bodyPr"));
        let merge = TextMergeInput {
            table_style: Some(&text_style),
            ..TextMergeInput::default()
        };
        let mut counters = ListCounters::new();
        layout_text_body(
            body,
            rect.w,
            &body_props,
            &merge,
            ctx,
            measurer,
            &mut counters,
            None,
        )
    });

    TableCell {
        row,
        col,
        row_span,
        col_span,
        rect,
        fill,
        borders,
        text,
    }
}

fn prefix_sums(values: &[f64]) -> Vec<f64> {
    let mut out = Vec::with_capacity(values.len() + 1);
    let mut acc = 0.0;
    out.push(0.0);
    for value in values {
        acc += value;
        out.push(acc);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drawing::color::ColorMap;
    use crate::drawing::theme::Theme;
    use crate::scene::Fill;
    use crate::text::measure::AvgAdvanceMeasurer;

    fn simple_table(extra_pr: &str, rows: &str) -> String {
        format!(
            r#"<a:tbl>
              <a:tblPr {extra_pr}/>
              <a:tblGrid>
                <a:gridCol w="952500"/><a:gridCol w="952500"/><a:gridCol w="952500"/>
              </a:tblGrid>
              {rows}
            </a:tbl>"#
        )
    }

    fn cell(text: &str, attrs: &str) -> String {
        format!(
            r#"<a:tc {attrs}><a:txBody><a:bodyPr/><a:p><a:r><a:t>{text}</a:t></a:r></a:p></a:txBody><a:tcPr/></a:tc>"#
        )
    }

    fn parse(xml: &str) -> ParsedTable {
        let theme = Theme::default();
        let ctx = SlideContext::new(&theme, ColorMap::default());
        let node = XmlNode::parse_fragment(xml);
        parse_table(
            &node,
            &TableStyles::default(),
            &ctx,
            &AvgAdvanceMeasurer::default(),
        )
    }

    #[test]
    fn test_grid_positions_disjoint_and_complete() {
        let rows = format!(
            "<a:tr h=\"381000\">{}{}{}</a:tr><a:tr h=\"381000\">{}{}{}</a:tr>",
            cell("a", ""),
            cell("b", ""),
            cell("c", ""),
            cell("d", ""),
            cell("e", ""),
            cell("f", "")
        );
        let table = parse(&simple_table("", &rows));
        assert_eq!((table.num_rows, table.num_cols), (2, 3));
        assert_eq!(table.cells.len(), 6);

        let mut occupied = std::collections::HashSet::new();
        for cell in &table.cells {
            for r in cell.row..cell.row + cell.row_span {
                for c in cell.col..cell.col + cell.col_span {
                    assert!(occupied.insert((r, c)), "cell overlap at ({r},{c})");
                }
            }
        }
        assert_eq!(occupied.len(), 6);
    }

    #[test]
    fn test_merged_cells_appear_once() {
        // First row: one cell spanning two columns plus a continuation.
        let rows = format!(
            r#"<a:tr h="381000">{}<a:tc hMerge="1"/>{}</a:tr>
               <a:tr h="381000">{}{}{}</a:tr>"#,
            cell("wide", r#"gridSpan="2""#),
            cell("c", ""),
            cell("d", ""),
            cell("e", ""),
            cell("f", "")
        );
        let table = parse(&simple_table("", &rows));
        assert_eq!(table.cells.len(), 5);
        let wide = &table.cells[0];
        assert_eq!((wide.row, wide.col), (0, 0));
        assert_eq!(wide.col_span, 2);
        // 2 columns of 100px each.
        assert_eq!(wide.rect.w, 200.0);
    }

    #[test]
    fn test_row_span_extends_height() {
        let rows = format!(
            r#"<a:tr h="381000">{}{}{}</a:tr>
               <a:tr h="381000"><a:tc vMerge="1"/>{}{}</a:tr>"#,
            cell("tall", r#"rowSpan="2""#),
            cell("b", ""),
            cell("c", ""),
            cell("e", ""),
            cell("f", "")
        );
        let table = parse(&simple_table("", &rows));
        let tall = &table.cells[0];
        assert_eq!(tall.row_span, 2);
        assert_eq!(tall.rect.h, 80.0);
        // The second row's first real cell lands in column 1.
        let second_row: Vec<_> = table.cells.iter().filter(|c| c.row == 1).collect();
        assert_eq!(second_row[0].col, 1);
    }

    #[test]
    fn test_cell_text_laid_out() {
        let rows = format!("<a:tr h=\"381000\">{}{}{}</a:tr>", cell("hello", ""), cell("", ""), cell("", ""));
        let table = parse(&simple_table("", &rows));
        let text = table.cells[0].text.as_ref().unwrap();
        assert_eq!(text.lines[0].runs[0].text, "hello");
    }

    #[test]
    fn test_direct_cell_fill_wins() {
        let tc = r#"<a:tc><a:txBody><a:bodyPr/><a:p/></a:txBody>
            <a:tcPr><a:solidFill><a:srgbClr val="AA0000"/></a:solidFill></a:tcPr></a:tc>"#;
        let rows = format!(
            "<a:tr h=\"381000\">{}{}{}</a:tr>",
            tc,
            cell("b", ""),
            cell("c", "")
        );
        let table = parse(&simple_table("", &rows));
        assert_eq!(
            table.cells[0].fill.as_ref().and_then(Fill::solid_hex),
            Some("#AA0000")
        );
    }
}
