//! Chart part parsing.
//!
//! A graphic frame pointing at a chart part yields a [`ChartData`]: the plot
//! kind, the title, and each series' name, categories, and values. Axes,
//! 3-D walls, and styling stay with the renderer.

use crate::scene::{ChartData, ChartSeries};
use crate::xml::{XmlNode, ns};

/// Plot-group element names recognized inside `c:plotArea`.
const PLOT_KINDS: [&str; 9] = [
    "barChart",
    "bar3DChart",
    "lineChart",
    "pieChart",
    "doughnutChart",
    "areaChart",
    "scatterChart",
    "radarChart",
    "bubbleChart",
];

/// Parse a `c:chartSpace` document.
pub fn parse_chart_part(root: &XmlNode) -> ChartData {
    let mut data = ChartData::default();
    let Some(chart) = root.child(ns::CHART, "chart") else {
        return data;
    };

    data.title = chart
        .child(ns::CHART, "title")
        .map(|title| collect_text(title))
        .filter(|text| !text.is_empty());

    let Some(plot_area) = chart.child(ns::CHART, "plotArea") else {
        return data;
    };
    for group in plot_area.all_children() {
        if !PLOT_KINDS.contains(&group.name()) {
            continue;
        }
        if data.kind.is_empty() {
            data.kind = group.name().to_string();
        }
        for ser in group.children(ns::CHART, "ser") {
            data.series.push(parse_series(ser));
        }
    }
    data
}

fn parse_series(ser: &XmlNode) -> ChartSeries {
    let name = ser
        .child(ns::CHART, "tx")
        .map(|tx| collect_text(tx))
        .filter(|text| !text.is_empty());

    let categories = ser
        .child(ns::CHART, "cat")
        .map(|cat| point_texts(cat))
        .unwrap_or_default();

    let values = ser
        .child(ns::CHART, "val")
        .map(|val| {
            point_texts(val)
                .iter()
                .filter_map(|text| text.parse::<f64>().ok())
                .collect()
        })
        .unwrap_or_default();

    ChartSeries {
        name,
        categories,
        values,
    }
}

/// Cached point values under a `strRef`/`numRef`, in index order.
fn point_texts(node: &XmlNode) -> Vec<String> {
    let mut points: Vec<(i64, String)> = Vec::new();
    for pt in node.descendants_local("pt") {
        let index = pt.attr_i64("idx").unwrap_or(points.len() as i64);
        let value = pt
            .child(ns::CHART, "v")
            .map(|v| v.deep_text())
            .unwrap_or_default();
        points.push((index, value));
    }
    points.sort_by_key(|(index, _)| *index);
    points.into_iter().map(|(_, value)| value).collect()
}

/// All text runs under a title or series-name node.
fn collect_text(node: &XmlNode) -> String {
    // Literal values sit in c:v, rich titles in a:t runs.
    let from_v = node
        .descendants_local("v")
        .iter()
        .map(|v| v.deep_text())
        .collect::<String>();
    if !from_v.is_empty() {
        return from_v;
    }
    node.descendants_local("t")
        .iter()
        .map(|t| t.deep_text())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHART: &str = r#"<c:chartSpace xmlns:c="http://schemas.openxmlformats.org/drawingml/2006/chart"
        xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main">
      <c:chart>
        <c:title><c:tx><c:rich><a:bodyPr/><a:p><a:r><a:t>Sales</a:t></a:r></a:p></c:rich></c:tx></c:title>
        <c:plotArea>
          <c:layout/>
          <c:barChart>
            <c:barDir val="col"/>
            <c:ser>
              <c:idx val="0"/>
              <c:tx><c:strRef><c:f>Sheet1!$B$1</c:f><c:strCache><c:pt idx="0"><c:v>2024</c:v></c:pt></c:strCache></c:strRef></c:tx>
              <c:cat><c:strRef><c:f>Sheet1!$A$2:$A$4</c:f><c:strCache>
                <c:pt idx="1"><c:v>Feb</c:v></c:pt>
                <c:pt idx="0"><c:v>Jan</c:v></c:pt>
                <c:pt idx="2"><c:v>Mar</c:v></c:pt>
              </c:strCache></c:strRef></c:cat>
              <c:val><c:numRef><c:f>Sheet1!$B$2:$B$4</c:f><c:numCache>
                <c:pt idx="0"><c:v>10</c:v></c:pt>
                <c:pt idx="1"><c:v>20.5</c:v></c:pt>
                <c:pt idx="2"><c:v>30</c:v></c:pt>
              </c:numCache></c:numRef></c:val>
            </c:ser>
          </c:barChart>
        </c:plotArea>
      </c:chart>
    </c:chartSpace>"#;

    #[test]
    fn test_parse_bar_chart() {
        let data = parse_chart_part(&XmlNode::parse(CHART).unwrap());
        assert_eq!(data.kind, "barChart");
        assert_eq!(data.title.as_deref(), Some("Sales"));
        assert_eq!(data.series.len(), 1);
        let series = &data.series[0];
        assert_eq!(series.name.as_deref(), Some("2024"));
        // Categories come back in index order regardless of source order.
        assert_eq!(series.categories, vec!["Jan", "Feb", "Mar"]);
        assert_eq!(series.values, vec![10.0, 20.5, 30.0]);
    }

    #[test]
    fn test_chart_without_plot_area() {
        let xml = r#"<c:chartSpace xmlns:c="http://schemas.openxmlformats.org/drawingml/2006/chart">
            <c:chart/></c:chartSpace>"#;
        let data = parse_chart_part(&XmlNode::parse(xml).unwrap());
        assert!(data.kind.is_empty());
        assert!(data.series.is_empty());
    }
}
