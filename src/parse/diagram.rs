//! Diagram (SmartArt) expansion.
//!
//! Two modes. When the data model references a prebaked drawing part, its
//! shape tree is honored and each drawing shape pulls text from the data
//! graph via its model id. Otherwise the layout definition is interpreted:
//! `layoutNode`/`forEach`/`choose` walk the data graph and the `lin`
//! algorithm stacks the produced shapes vertically.
//!
//! The connection graph of a malformed file may cycle, so every data-point
//! resolution carries a visited set keyed by model id.

use crate::drawing::properties::{SlideContext, extract_shape_properties};
use crate::geom::units::emu_to_px;
use crate::geom::{Matrix, build_path};
use crate::scene::{Rect, Shape};
use crate::text::layout::{BodyProps, ListCounters, TextMergeInput, layout_text_body};
use crate::text::measure::TextMeasurer;
use crate::xml::{XmlNode, ns};
use std::collections::{HashMap, HashSet};

/// One point of the diagram data graph.
#[derive(Debug, Clone)]
struct DataPoint {
    pt_type: String,
    node: XmlNode,
}

/// One edge of the diagram data graph.
#[derive(Debug, Clone)]
struct Connection {
    kind: String,
    src: String,
    dest: String,
    src_ord: i64,
}

/// The parsed data-model part.
#[derive(Debug, Default)]
pub struct DataModel {
    points: HashMap<String, DataPoint>,
    order: Vec<String>,
    connections: Vec<Connection>,
}

impl DataModel {
    /// Parse a `dgm:dataModel` root.
    pub fn parse(root: &XmlNode) -> DataModel {
        let mut model = DataModel::default();
        if let Some(pt_lst) = root.child(ns::DIAGRAM, "ptLst") {
            for pt in pt_lst.children(ns::DIAGRAM, "pt") {
                let Some(id) = pt.attr("modelId") else {
                    continue;
                };
                model.order.push(id.to_string());
                model.points.insert(
                    id.to_string(),
                    DataPoint {
                        pt_type: pt.attr("type").unwrap_or("node").to_string(),
                        node: pt.clone(),
                    },
                );
            }
        }
        if let Some(cxn_lst) = root.child(ns::DIAGRAM, "cxnLst") {
            for cxn in cxn_lst.children(ns::DIAGRAM, "cxn") {
                let (Some(src), Some(dest)) = (cxn.attr("srcId"), cxn.attr("destId")) else {
                    continue;
                };
                model.connections.push(Connection {
                    kind: cxn.attr("type").unwrap_or("parOf").to_string(),
                    src: src.to_string(),
                    dest: dest.to_string(),
                    src_ord: cxn.attr_i64("srcOrd").unwrap_or(0),
                });
            }
        }
        model
    }

    /// The document root point, when present.
    fn doc_id(&self) -> Option<&str> {
        self.order
            .iter()
            .find(|id| self.points[*id].pt_type == "doc")
            .map(String::as_str)
    }

    /// Data children of `parent` over `parOf` edges, in source order.
    fn children_of(&self, parent: &str) -> Vec<&str> {
        let mut edges: Vec<&Connection> = self
            .connections
            .iter()
            .filter(|cxn| cxn.kind == "parOf" && cxn.src == parent)
            .collect();
        edges.sort_by_key(|cxn| cxn.src_ord);
        edges.iter().map(|cxn| cxn.dest.as_str()).collect()
    }

    /// Top-level points: children of the doc point, or every `node` point
    /// when the model has no doc root.
    fn top_level(&self) -> Vec<&str> {
        if let Some(doc) = self.doc_id() {
            let children = self.children_of(doc);
            if !children.is_empty() {
                return children;
            }
        }
        self.order
            .iter()
            .filter(|id| self.points[*id].pt_type == "node")
            .map(String::as_str)
            .collect()
    }

    /// Resolve a model id to its text-bearing data point.
    ///
    /// Presentation points are proxies resolved through inbound `presOf`
    /// edges; transition points are ignored; a text-less data point descends
    /// to its children. The visited set guarantees termination on cycles.
    fn find_data_point<'a>(&'a self, id: &str, visited: &mut HashSet<String>) -> Option<&'a DataPoint> {
        if !visited.insert(id.to_string()) {
            return None;
        }
        let point = self.points.get(id)?;
        match point.pt_type.as_str() {
            "parTrans" | "sibTrans" => None,
            "pres" => {
                let source = self
                    .connections
                    .iter()
                    .find(|cxn| cxn.kind == "presOf" && cxn.dest == id)?;
                self.find_data_point(&source.src, visited)
            },
            _ => {
                if point_text(point).is_some() {
                    return Some(point);
                }
                self.connections
                    .iter()
                    .filter(|cxn| cxn.kind != "presOf" && cxn.src == id)
                    .find_map(|cxn| self.find_data_point(&cxn.dest, visited))
            },
        }
    }
}

/// The drawing-part relationship id recorded in the data model's extension
/// list, when a prebaked drawing exists.
pub fn data_model_ext_rel_id(data_root: &XmlNode) -> Option<String> {
    for ext in data_root.descendants_local("dataModelExt") {
        if let Some(rel_id) = ext.attr("relId") {
            return Some(rel_id.to_string());
        }
    }
    None
}

fn point_text(point: &DataPoint) -> Option<&XmlNode> {
    let body = point.node.child(ns::DIAGRAM, "t")?;
    let has_text = body
        .descendants_local("t")
        .iter()
        .any(|t| !t.deep_text().trim().is_empty());
    has_text.then_some(body)
}

/// Expand a diagram into child shapes, relative to the graphic frame.
///
/// `frame_matrix` is the frame's accumulated transform; children compose
/// onto it so they render without re-applying parents.
pub fn expand_diagram(
    data_root: &XmlNode,
    layout_root: Option<&XmlNode>,
    drawing_root: Option<&XmlNode>,
    frame_matrix: &Matrix,
    ctx: &SlideContext,
    measurer: &dyn TextMeasurer,
) -> Vec<Shape> {
    let model = DataModel::parse(data_root);

    if let Some(drawing) = drawing_root {
        return expand_prebaked(drawing, &model, frame_matrix, ctx, measurer);
    }
    let Some(layout_root) = layout_root else {
        return Vec::new();
    };
    expand_scripted(layout_root, &model, frame_matrix, ctx, measurer)
}

/// Mode (a): honor the prebaked drawing part's shape tree.
fn expand_prebaked(
    drawing: &XmlNode,
    model: &DataModel,
    frame_matrix: &Matrix,
    ctx: &SlideContext,
    measurer: &dyn TextMeasurer,
) -> Vec<Shape> {
    let mut shapes = Vec::new();
    let empty_images = HashMap::new();
    for sp in drawing.descendants_local("sp") {
        let model_id = sp.attr("modelId");
        let sp_pr = sp.child(ns::DML, "spPr").or_else(|| sp.child_local("spPr"));
        let Some(sp_pr) = sp_pr else {
            continue;
        };
        let Some(xfrm) = sp_pr.child(ns::DML, "xfrm") else {
            continue;
        };
        let (pos, rot, flip_h, flip_v) = read_xfrm(xfrm);
        let props = extract_shape_properties(Some(sp_pr), None, ctx, &empty_images);
        let path = props
            .geometry
            .as_ref()
            .and_then(|geom| build_path(geom, pos.w, pos.h, flip_h, flip_v));

        // The drawing shape's own body wins; otherwise the data point's.
        let tx_body = sp
            .child_local("txBody")
            .or_else(|| {
                let mut visited = HashSet::new();
                model_id
                    .and_then(|id| model.find_data_point(id, &mut visited))
                    .and_then(point_text)
            });
        let text = tx_body.map(|body| {
            let body_props = BodyProps::parse(body.child(ns::DML, "bodyPr"));
            let mut counters = ListCounters::new();
            layout_text_body(
                body,
                pos.w,
                &body_props,
                &TextMergeInput::default(),
                ctx,
                measurer,
                &mut counters,
                None,
            )
        });

        let local = Matrix::for_shape(pos.x, pos.y, pos.w, pos.h, rot, flip_h, flip_v);
        shapes.push(Shape::Shape {
            name: None,
            pos,
            transform: frame_matrix.multiply(&local),
            path,
            fill: props.fill().cloned(),
            stroke: props.stroke().cloned(),
            effect: props.effect.clone(),
            text,
            rot,
            flip_h,
            flip_v,
        });
    }
    shapes
}

fn read_xfrm(xfrm: &XmlNode) -> (Rect, f64, bool, bool) {
    let off = xfrm.child(ns::DML, "off");
    let ext = xfrm.child(ns::DML, "ext");
    let pos = Rect {
        x: off.and_then(|o| o.attr_i64("x")).map(emu_to_px).unwrap_or(0.0),
        y: off.and_then(|o| o.attr_i64("y")).map(emu_to_px).unwrap_or(0.0),
        w: ext.and_then(|e| e.attr_i64("cx")).map(emu_to_px).unwrap_or(0.0),
        h: ext.and_then(|e| e.attr_i64("cy")).map(emu_to_px).unwrap_or(0.0),
    };
    let rot = crate::geom::units::angle_to_deg(xfrm.attr_i64("rot").unwrap_or(0));
    (
        pos,
        rot,
        xfrm.attr_bool("flipH").unwrap_or(false),
        xfrm.attr_bool("flipV").unwrap_or(false),
    )
}

/// A shape produced by the layout script, in EMU space.
#[derive(Debug, Clone, Default)]
struct ScriptShape {
    x_emu: i64,
    y_emu: i64,
    w_emu: i64,
    h_emu: i64,
    data_id: Option<String>,
}

/// Mode (b): interpret the layout definition tree.
fn expand_scripted(
    layout_root: &XmlNode,
    model: &DataModel,
    frame_matrix: &Matrix,
    ctx: &SlideContext,
    measurer: &dyn TextMeasurer,
) -> Vec<Shape> {
    let root_node = layout_root
        .child(ns::DIAGRAM, "layoutNode")
        .unwrap_or(layout_root);
    let root_ctx = model.doc_id().map(str::to_string).unwrap_or_default();
    let script_shapes = eval_layout_node(root_node, model, &root_ctx);

    script_shapes
        .into_iter()
        .map(|shape| {
            let pos = Rect {
                x: emu_to_px(shape.x_emu),
                y: emu_to_px(shape.y_emu),
                w: emu_to_px(shape.w_emu),
                h: emu_to_px(shape.h_emu),
            };
            let mut visited = HashSet::new();
            let data_point = shape
                .data_id
                .as_deref()
                .and_then(|id| model.find_data_point(id, &mut visited));
            let text = data_point.and_then(point_text).map(|body| {
                let body_props = BodyProps::parse(body.child(ns::DML, "bodyPr"));
                let mut counters = ListCounters::new();
                layout_text_body(
                    body,
                    pos.w.max(1.0),
                    &body_props,
                    &TextMergeInput::default(),
                    ctx,
                    measurer,
                    &mut counters,
                    None,
                )
            });

            let local = Matrix::for_shape(pos.x, pos.y, pos.w, pos.h, 0.0, false, false);
            Shape::Shape {
                name: None,
                pos,
                transform: frame_matrix.multiply(&local),
                path: None,
                fill: None,
                stroke: None,
                effect: None,
                text,
                rot: 0.0,
                flip_h: false,
                flip_v: false,
            }
        })
        .collect()
}

/// Evaluate one `layoutNode` in the given data context.
fn eval_layout_node(node: &XmlNode, model: &DataModel, data_ctx: &str) -> Vec<ScriptShape> {
    let mut children: Vec<ScriptShape> = Vec::new();
    let mut bound: Option<String> = None;
    let mut width = 0i64;
    let mut height = 0i64;
    let mut algorithm: Option<String> = None;

    eval_children(
        node,
        model,
        data_ctx,
        &mut children,
        &mut bound,
        &mut width,
        &mut height,
        &mut algorithm,
    );

    match algorithm.as_deref() {
        Some("lin") => {
            // Linear stacking along the vertical axis: a running y offset of
            // summed extents.
            let mut y = 0i64;
            for child in &mut children {
                child.y_emu = y;
                y += child.h_emu;
            }
            children
        },
        _ if bound.is_some() => {
            vec![ScriptShape {
                w_emu: width,
                h_emu: height,
                data_id: bound,
                ..ScriptShape::default()
            }]
        },
        _ => children,
    }
}

/// Walk a layout node's children, accumulating bindings, constraints, the
/// algorithm, and produced child shapes. `choose` branches splice inline.
#[allow(clippy::too_many_arguments)]
fn eval_children(
    node: &XmlNode,
    model: &DataModel,
    data_ctx: &str,
    children: &mut Vec<ScriptShape>,
    bound: &mut Option<String>,
    width: &mut i64,
    height: &mut i64,
    algorithm: &mut Option<String>,
) {
    for child in node.all_children() {
        match child.name() {
            "layoutNode" => {
                children.extend(eval_layout_node(child, model, data_ctx));
            },
            "forEach" => {
                for point_id in matched_points(child, model, data_ctx) {
                    let inner = eval_for_each_body(child, model, &point_id);
                    children.extend(inner);
                }
            },
            "choose" => {
                if let Some(branch) = pick_branch(child, model, data_ctx) {
                    eval_children(
                        branch, model, data_ctx, children, bound, width, height, algorithm,
                    );
                }
            },
            "presOf" => {
                let matched = matched_points(child, model, data_ctx);
                if let Some(first) = matched.first() {
                    *bound = Some(first.clone());
                }
            },
            "constrLst" => {
                for constr in child.children(ns::DIAGRAM, "constr") {
                    let value = constr.attr_i64("val").unwrap_or(0);
                    match constr.attr("type") {
                        Some("w") => *width = value,
                        Some("h") => *height = value,
                        _ => {},
                    }
                }
            },
            "alg" => {
                if let Some(kind) = child.attr("type") {
                    *algorithm = Some(kind.to_string());
                }
            },
            _ => {},
        }
    }
}

/// Evaluate the body of a `forEach` with one iterated point as context.
fn eval_for_each_body(for_each: &XmlNode, model: &DataModel, point_id: &str) -> Vec<ScriptShape> {
    let mut shapes = Vec::new();
    for child in for_each.all_children() {
        match child.name() {
            "layoutNode" => shapes.extend(eval_layout_node(child, model, point_id)),
            "forEach" => {
                for inner_id in matched_points(child, model, point_id) {
                    shapes.extend(eval_for_each_body(child, model, &inner_id));
                }
            },
            "choose" => {
                if let Some(branch) = pick_branch(child, model, point_id) {
                    shapes.extend(eval_for_each_body(branch, model, point_id));
                }
            },
            _ => {},
        }
    }
    shapes
}

/// Points matched by an `axis`/`ptType` selector in the given context.
fn matched_points(selector: &XmlNode, model: &DataModel, data_ctx: &str) -> Vec<String> {
    let axis = selector.attr("axis").unwrap_or("self");
    let pt_type = selector.attr("ptType").unwrap_or("all");
    let candidates: Vec<&str> = match axis {
        "ch" => {
            if data_ctx.is_empty() {
                model.top_level()
            } else {
                model.children_of(data_ctx)
            }
        },
        _ => {
            // axis="self": the context itself, or every top-level point when
            // the context is the data-model root.
            match model.points.get(data_ctx) {
                Some(point) if point.pt_type == "doc" => model.top_level(),
                Some(_) => vec![data_ctx],
                None if data_ctx.is_empty() => model.top_level(),
                None => Vec::new(),
            }
        },
    };
    candidates
        .into_iter()
        .filter(|id| {
            if pt_type == "all" {
                return true;
            }
            model
                .points
                .get(*id)
                .is_some_and(|point| point.pt_type == pt_type)
        })
        .map(str::to_string)
        .collect()
}

/// Evaluate a `choose`: the first `if` whose condition holds, else `else`.
fn pick_branch<'a>(choose: &'a XmlNode, model: &DataModel, data_ctx: &str) -> Option<&'a XmlNode> {
    for branch in choose.children(ns::DIAGRAM, "if") {
        if eval_condition(branch, model, data_ctx) {
            return Some(branch);
        }
    }
    choose.child(ns::DIAGRAM, "else")
}

fn eval_condition(branch: &XmlNode, model: &DataModel, data_ctx: &str) -> bool {
    match branch.attr("func") {
        Some("cnt") => {
            let count = matched_points(branch, model, data_ctx).len() as i64;
            let value: i64 = branch.attr_i64("val").unwrap_or(0);
            match branch.attr("op").unwrap_or("equ") {
                "equ" => count == value,
                "neq" => count != value,
                "gt" => count > value,
                "lt" => count < value,
                "gte" => count >= value,
                "lte" => count <= value,
                _ => false,
            }
        },
        // Unrecognized condition functions never match.
        _ => false,
    }
}
