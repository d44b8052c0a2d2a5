//! The slide parser.
//!
//! One slide's parse walks three shape trees — master, then layout, then the
//! slide itself — through the same dispatcher, merging every shape's visual
//! properties across the ancestry with slide > layout > master precedence.
//! Master and layout trees contribute their non-placeholder shapes plus the
//! date/footer/slide-number placeholders the header/footer switches show;
//! every other template placeholder renders only through the slide's own
//! shapes. Failures stay local: a shape that cannot be resolved is skipped
//! and recorded, never fatal to the slide or the presentation.

use crate::drawing::color::ColorMap;
use crate::drawing::properties::{
    ShapeProps, SlideContext, extract_shape_properties, parse_background, theme_default_fill,
};
use crate::drawing::table_style::TableStyles;
use crate::drawing::theme::Theme;
use crate::error::Diagnostics;
use crate::geom::path::Geometry;
use crate::geom::units::{angle_to_deg, emu_to_px};
use crate::geom::{Matrix, build_path};
use crate::opc::{Package, Relationships};
use crate::parse::diagram::{self, expand_diagram};
use crate::parse::part_model::{PartModel, Placeholder, SPECIAL_PH_TYPES, placeholder_key};
use crate::parse::{chart, table};
use crate::scene::{
    Fill, ImageMaps, Rect, Shape, SlideData, SlideSize, Transition,
};
use crate::text::layout::{BodyProps, ListCounters, TextMergeInput, layout_text_body};
use crate::text::measure::TextMeasurer;
use crate::text::style::{DefaultTextStyles, ListStyle};
use crate::xml::{XmlNode, ns};
use std::collections::{HashMap, HashSet};

/// Inheritance layer a shape node belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    Master,
    Layout,
    Slide,
}

/// Everything constant across the slides of one package.
pub struct SlideEnv<'a> {
    pub package: &'a Package,
    pub theme: &'a Theme,
    pub table_styles: &'a TableStyles,
    /// Fallback default text styles from the presentation part.
    pub presentation_styles: Option<&'a DefaultTextStyles>,
    pub measurer: &'a dyn TextMeasurer,
    pub slide_size: SlideSize,
}

/// The parts and relationship maps of one slide's ancestry.
pub struct SlideInputs {
    pub slide: XmlNode,
    pub layout: XmlNode,
    pub master: XmlNode,
    pub slide_rels: Relationships,
    pub layout_rels: Relationships,
    pub master_rels: Relationships,
    pub image_maps: ImageMaps,
}

/// Tagged dispatch over shape-tree elements.
enum ShapeElement<'a> {
    Sp(&'a XmlNode),
    CxnSp(&'a XmlNode),
    GrpSp(&'a XmlNode),
    GraphicFrame(&'a XmlNode),
    Pic(&'a XmlNode),
}

impl<'a> ShapeElement<'a> {
    fn classify(node: &'a XmlNode) -> Option<Self> {
        match node.name() {
            "sp" => Some(ShapeElement::Sp(node)),
            "cxnSp" => Some(ShapeElement::CxnSp(node)),
            "grpSp" => Some(ShapeElement::GrpSp(node)),
            "graphicFrame" => Some(ShapeElement::GraphicFrame(node)),
            "pic" => Some(ShapeElement::Pic(node)),
            _ => None,
        }
    }
}

/// Placeholder inheritance sources for one shape.
///
/// Owned clones: the stack outlives lookups into the part models while the
/// parser keeps mutating its diagnostics.
#[derive(Default, Clone)]
struct ResolutionStack {
    master: Option<Placeholder>,
    layout: Option<Placeholder>,
}

/// Offset, extent, rotation, and flips of an `xfrm` element, in pixels.
#[derive(Debug, Clone, Copy, Default)]
struct Xfrm {
    pos: Rect,
    rot: f64,
    flip_h: bool,
    flip_v: bool,
}

fn read_xfrm(xfrm: &XmlNode) -> Xfrm {
    let off = xfrm.child(ns::DML, "off");
    let ext = xfrm.child(ns::DML, "ext");
    Xfrm {
        pos: Rect {
            x: off.and_then(|o| o.attr_i64("x")).map(emu_to_px).unwrap_or(0.0),
            y: off.and_then(|o| o.attr_i64("y")).map(emu_to_px).unwrap_or(0.0),
            w: ext.and_then(|e| e.attr_i64("cx")).map(emu_to_px).unwrap_or(0.0),
            h: ext.and_then(|e| e.attr_i64("cy")).map(emu_to_px).unwrap_or(0.0),
        },
        rot: angle_to_deg(xfrm.attr_i64("rot").unwrap_or(0)),
        flip_h: xfrm.attr_bool("flipH").unwrap_or(false),
        flip_v: xfrm.attr_bool("flipV").unwrap_or(false),
    }
}

/// Parse one slide into its output data.
pub fn parse_slide(env: &SlideEnv, inputs: &SlideInputs) -> SlideData {
    let master = PartModel::parse(&inputs.master);
    let layout = PartModel::parse(&inputs.layout);

    let mut color_map = master.color_map.clone().unwrap_or_default();
    if let Some(override_map) = &layout.color_map_override {
        color_map = color_map.merged_with(override_map);
    }
    let ctx = SlideContext::new(env.theme, color_map);

    let default_styles = master
        .default_text_styles
        .clone()
        .or_else(|| env.presentation_styles.cloned())
        .unwrap_or_default();

    let mut parser = SlideParser {
        env,
        ctx,
        master,
        layout,
        inputs,
        default_styles,
        filled_by_picture: HashSet::new(),
        background: None,
        diagnostics: Diagnostics::new(),
    };
    parser.run()
}

struct SlideParser<'a> {
    env: &'a SlideEnv<'a>,
    ctx: SlideContext<'a>,
    master: PartModel,
    layout: PartModel,
    inputs: &'a SlideInputs,
    default_styles: DefaultTextStyles,
    /// Placeholder keys filled by slide-level pictures; the corresponding
    /// master/layout placeholder shapes are suppressed.
    filled_by_picture: HashSet<String>,
    background: Option<Fill>,
    diagnostics: Diagnostics,
}

impl<'a> SlideParser<'a> {
    fn run(mut self) -> SlideData {
        let slide_tree = self
            .inputs
            .slide
            .child(ns::PML, "cSld")
            .and_then(|c_sld| c_sld.child(ns::PML, "spTree"))
            .cloned()
            .unwrap_or_else(XmlNode::empty);

        self.collect_picture_placeholders(&slide_tree);
        self.background = self.select_background();

        let mut shapes = Vec::new();
        let master_tree = self.master.sp_tree.clone();
        let layout_tree = self.layout.sp_tree.clone();

        for (tree, layer) in [
            (&master_tree, Layer::Master),
            (&layout_tree, Layer::Layout),
            (&slide_tree, Layer::Slide),
        ] {
            let mut counters = ListCounters::new();
            let slide_block_start = shapes.len();
            self.walk_tree(tree, &Matrix::identity(), layer, &mut shapes, &mut counters);
            if layer == Layer::Slide {
                self.reorder_background_picture(&mut shapes, slide_block_start);
            }
        }

        let name = self
            .inputs
            .slide
            .child(ns::PML, "cSld")
            .and_then(|c_sld| c_sld.attr("name"))
            .filter(|name| !name.is_empty())
            .map(str::to_string);

        SlideData {
            name,
            background: self.background.clone(),
            shapes,
            image_maps: self.inputs.image_maps.clone(),
            transition: self.parse_transition(),
            diagnostics: self.diagnostics.into_vec(),
        }
    }

    /// Slide-level pictures that fill a placeholder key.
    fn collect_picture_placeholders(&mut self, slide_tree: &XmlNode) {
        for pic in slide_tree.descendants_local("pic") {
            if let Some((key, _, _)) = placeholder_key(pic) {
                self.filled_by_picture.insert(key);
            }
        }
    }

    /// Prefer the slide's own `bg`, else the layout's, else the master's.
    fn select_background(&mut self) -> Option<Fill> {
        let slide_bg = self
            .inputs
            .slide
            .child(ns::PML, "cSld")
            .and_then(|c_sld| c_sld.child(ns::PML, "bg"));
        if let Some(bg) = slide_bg {
            return parse_background(bg, &self.ctx, &self.inputs.image_maps.slide);
        }
        if let Some(bg) = self.layout.bg.clone() {
            return parse_background(&bg, &self.ctx, &self.inputs.image_maps.layout);
        }
        if let Some(bg) = self.master.bg.clone() {
            return parse_background(&bg, &self.ctx, &self.inputs.image_maps.master);
        }
        None
    }

    fn parse_transition(&self) -> Option<Transition> {
        let transition = self.inputs.slide.child(ns::PML, "transition")?;
        let kind = transition
            .all_children()
            .iter()
            .map(|child| child.name().to_string())
            .next()?;
        let duration_ms = transition
            .attr_f64("advTm")
            .or_else(|| transition.attr_f64("dur"));
        Some(Transition { kind, duration_ms })
    }

    fn layer_images(&self, layer: Layer) -> &HashMap<String, String> {
        match layer {
            Layer::Master => &self.inputs.image_maps.master,
            Layer::Layout => &self.inputs.image_maps.layout,
            Layer::Slide => &self.inputs.image_maps.slide,
        }
    }

    fn layer_rels(&self, layer: Layer) -> &Relationships {
        match layer {
            Layer::Master => &self.inputs.master_rels,
            Layer::Layout => &self.inputs.layout_rels,
            Layer::Slide => &self.inputs.slide_rels,
        }
    }

    /// Whether a master/layout shape is emitted by the static pass.
    fn emits_in_static_pass(&self, node: &XmlNode, layer: Layer) -> bool {
        let Some((key, ph_type, _)) = placeholder_key(node) else {
            return true;
        };
        if !SPECIAL_PH_TYPES.contains(&ph_type.as_str()) {
            return false;
        }
        let header_footer = match layer {
            Layer::Master => &self.master.header_footer,
            _ => &self.layout.header_footer,
        };
        header_footer.shows(&ph_type) && !self.filled_by_picture.contains(&key)
    }

    fn walk_tree(
        &mut self,
        tree: &XmlNode,
        parent: &Matrix,
        layer: Layer,
        out: &mut Vec<Shape>,
        counters: &mut ListCounters,
    ) {
        for child in tree.all_children() {
            let Some(element) = ShapeElement::classify(child) else {
                continue;
            };
            if layer != Layer::Slide && !self.emits_in_static_pass(child, layer) {
                continue;
            }
            match element {
                ShapeElement::Sp(node) => {
                    if let Some(shape) = self.parse_shape(node, false, layer, parent, counters) {
                        out.push(shape);
                    }
                },
                ShapeElement::CxnSp(node) => {
                    if let Some(shape) = self.parse_shape(node, true, layer, parent, counters) {
                        out.push(shape);
                    }
                },
                ShapeElement::GrpSp(node) => {
                    self.parse_group(node, layer, parent, out, counters);
                },
                ShapeElement::GraphicFrame(node) => {
                    if let Some(shape) = self.parse_graphic_frame(node, layer, parent) {
                        out.push(shape);
                    }
                },
                ShapeElement::Pic(node) => {
                    if let Some(shape) = self.parse_picture(node, layer, parent) {
                        out.push(shape);
                    }
                },
            }
        }
    }

    /// Recurse into a group, splicing its children in place with the
    /// accumulated matrix.
    fn parse_group(
        &mut self,
        node: &XmlNode,
        layer: Layer,
        parent: &Matrix,
        out: &mut Vec<Shape>,
        counters: &mut ListCounters,
    ) {
        let grp_pr = node.child(ns::PML, "grpSpPr").or_else(|| node.child_local("grpSpPr"));
        let matrix = match grp_pr.and_then(|pr| pr.child(ns::DML, "xfrm")) {
            Some(xfrm_node) => {
                let xfrm = read_xfrm(xfrm_node);
                let ch_off = xfrm_node.child(ns::DML, "chOff");
                let ch_ext = xfrm_node.child(ns::DML, "chExt");
                let ch = |node: Option<&XmlNode>, attr: &str| {
                    node.and_then(|n| n.attr_i64(attr)).map(emu_to_px).unwrap_or(0.0)
                };
                parent
                    .multiply(&Matrix::for_shape(
                        xfrm.pos.x, xfrm.pos.y, xfrm.pos.w, xfrm.pos.h, xfrm.rot, xfrm.flip_h,
                        xfrm.flip_v,
                    ))
                    .for_group_children(
                        xfrm.pos.w,
                        xfrm.pos.h,
                        ch(ch_off, "x"),
                        ch(ch_off, "y"),
                        ch(ch_ext, "cx"),
                        ch(ch_ext, "cy"),
                    )
            },
            None => *parent,
        };
        self.walk_tree(node, &matrix, layer, out, counters);
    }

    /// Placeholder inheritance sources for a shape at `layer`.
    fn resolution_stack(&self, node: &XmlNode, layer: Layer) -> ResolutionStack {
        let Some((key, ph_type, _)) = placeholder_key(node) else {
            return ResolutionStack::default();
        };
        let special = SPECIAL_PH_TYPES.contains(&ph_type.as_str());
        let master = self
            .master
            .placeholder(&key, &ph_type)
            .filter(|candidate| {
                // A non-special slide placeholder must not pick up the
                // master's date/footer/slide-number slots.
                special || !SPECIAL_PH_TYPES.contains(&candidate.ph_type.as_str())
            })
            .cloned();
        match layer {
            Layer::Master => ResolutionStack::default(),
            Layer::Layout => ResolutionStack {
                master,
                layout: None,
            },
            Layer::Slide => ResolutionStack {
                master,
                layout: self.layout.placeholder(&key, &ph_type).cloned(),
            },
        }
    }

    fn parse_shape(
        &mut self,
        node: &XmlNode,
        is_connector: bool,
        layer: Layer,
        parent: &Matrix,
        counters: &mut ListCounters,
    ) -> Option<Shape> {
        let stack = self.resolution_stack(node, layer);
        let sp_pr = node.child_local("spPr");
        let style = node.child_local("style");

        let xfrm = sp_pr
            .and_then(|pr| pr.child(ns::DML, "xfrm"))
            .or_else(|| placeholder_xfrm(stack.layout.as_ref()))
            .or_else(|| placeholder_xfrm(stack.master.as_ref()))
            .map(read_xfrm)
            .unwrap_or_default();

        let local = Matrix::for_shape(
            xfrm.pos.x, xfrm.pos.y, xfrm.pos.w, xfrm.pos.h, xfrm.rot, xfrm.flip_h, xfrm.flip_v,
        );
        let transform = parent.multiply(&local);

        let own = extract_shape_properties(sp_pr, style, &self.ctx, self.layer_images(layer));
        let layout_props = self.placeholder_props(stack.layout.as_ref(), Layer::Layout);
        let master_props = self.placeholder_props(stack.master.as_ref(), Layer::Master);
        let chain: [&ShapeProps; 3] = [&own, &layout_props, &master_props];

        let fill = if node.attr_bool("useBgFill").unwrap_or(false) {
            Some(self.background_fill_for_shape())
        } else {
            let merged = chain
                .iter()
                .find(|props| props.has_fill())
                .and_then(|props| props.fill().cloned());
            match merged {
                Some(fill) => Some(fill),
                None if !is_connector => theme_default_fill(&self.ctx, self.layer_images(layer)),
                None => None,
            }
        };

        let stroke = chain
            .iter()
            .find(|props| props.has_stroke())
            .and_then(|props| props.stroke().cloned());
        let effect = chain.iter().find_map(|props| props.effect.clone());

        let geometry = chain
            .iter()
            .find_map(|props| props.geometry.clone())
            .unwrap_or_else(|| Geometry::Preset {
                name: "rect".to_string(),
                adjustments: HashMap::new(),
            });
        let path = build_path(&geometry, xfrm.pos.w, xfrm.pos.h, xfrm.flip_h, xfrm.flip_v)
            .or_else(|| {
                if let Geometry::Preset { name, .. } = &geometry {
                    self.diagnostics
                        .unsupported(name.clone(), "preset geometry not in the path table");
                }
                let rect = Geometry::Preset {
                    name: "rect".to_string(),
                    adjustments: HashMap::new(),
                };
                build_path(&rect, xfrm.pos.w, xfrm.pos.h, xfrm.flip_h, xfrm.flip_v)
            });

        let text = self.layout_shape_text(node, &stack, layer, &xfrm, counters);

        Some(Shape::Shape {
            name: shape_name(node),
            pos: xfrm.pos,
            transform,
            path,
            fill,
            stroke,
            effect,
            text,
            rot: xfrm.rot,
            flip_h: xfrm.flip_h,
            flip_v: xfrm.flip_v,
        })
    }

    fn placeholder_props(&self, placeholder: Option<&Placeholder>, layer: Layer) -> ShapeProps {
        let Some(placeholder) = placeholder else {
            return ShapeProps::default();
        };
        let sp_pr = placeholder.shape.child_local("spPr");
        let style = placeholder.shape.child_local("style");
        extract_shape_properties(sp_pr, style, &self.ctx, self.layer_images(layer))
    }

    /// `useBgFill`: a resolved solid background becomes the shape fill;
    /// gradient and image backgrounds fall back to no fill.
    fn background_fill_for_shape(&self) -> Fill {
        match &self.background {
            Some(Fill::Solid { color }) => Fill::Solid {
                color: color.clone(),
            },
            _ => Fill::None,
        }
    }

    fn layout_shape_text(
        &self,
        node: &XmlNode,
        stack: &ResolutionStack,
        layer: Layer,
        xfrm: &Xfrm,
        counters: &mut ListCounters,
    ) -> Option<crate::scene::TextLayout> {
        let own_body = node.child(ns::PML, "txBody").or_else(|| node.child_local("txBody"));
        let layout_body = stack.layout.as_ref().and_then(|ph| ph.tx_body.as_ref());
        let master_body = stack.master.as_ref().and_then(|ph| ph.tx_body.as_ref());

        // Fall back layer by layer when the nearer body carries no text.
        let (body, body_layer) = if own_body.is_some_and(has_text) {
            (own_body?, layer)
        } else if let Some(body) = layout_body.filter(|body| has_text(body)) {
            (body, Layer::Layout)
        } else if let Some(body) = master_body.filter(|body| has_text(body)) {
            (body, Layer::Master)
        } else {
            (own_body?, layer)
        };

        let ph_type = placeholder_key(node)
            .map(|(_, ph_type, _)| ph_type)
            .unwrap_or_else(|| "other".to_string());

        let own_list = body
            .child(ns::DML, "lstStyle")
            .map(ListStyle::parse)
            .filter(|style| !style.is_empty());

        let merge = TextMergeInput {
            defaults: Some(self.default_styles.for_placeholder(&ph_type)),
            master_list: stack.master.as_ref().and_then(|ph| ph.list_style.as_ref()),
            layout_list: stack.layout.as_ref().and_then(|ph| ph.list_style.as_ref()),
            shape_list: own_list.as_ref(),
            table_style: None,
        };

        let inherited_body = layout_body.or(master_body);
        let body_props = BodyProps::or_inherited(Some(body), inherited_body);

        Some(layout_text_body(
            body,
            xfrm.pos.w,
            &body_props,
            &merge,
            &self.ctx,
            self.env.measurer,
            counters,
            Some(self.layer_rels(body_layer)),
        ))
    }

    fn parse_picture(&mut self, node: &XmlNode, layer: Layer, parent: &Matrix) -> Option<Shape> {
        let stack = self.resolution_stack(node, layer);
        let sp_pr = node.child_local("spPr");

        let own_xfrm = sp_pr.and_then(|pr| pr.child(ns::DML, "xfrm"));
        let inherited_xfrm = placeholder_xfrm(stack.layout.as_ref())
            .or_else(|| placeholder_xfrm(stack.master.as_ref()));
        // Without any transform and without a placeholder to inherit from,
        // the picture has no position and is omitted.
        let xfrm = read_xfrm(own_xfrm.or(inherited_xfrm)?);

        let blip_fill = node
            .child(ns::PML, "blipFill")
            .or_else(|| node.child_local("blipFill"))?;
        let rel_id = blip_fill
            .child(ns::DML, "blip")
            .and_then(|blip| blip.attr("embed").or_else(|| blip.attr("link")))?;
        let Some(image) =
            crate::drawing::properties::parse_blip_fill(blip_fill, &self.ctx, self.layer_images(layer))
        else {
            self.diagnostics
                .relationship_missing(format!("{layer:?} picture"), rel_id);
            return None;
        };

        let path = sp_pr
            .and_then(Geometry::from_shape_properties)
            .and_then(|geom| build_path(&geom, xfrm.pos.w, xfrm.pos.h, xfrm.flip_h, xfrm.flip_v));

        let local = Matrix::for_shape(
            xfrm.pos.x, xfrm.pos.y, xfrm.pos.w, xfrm.pos.h, xfrm.rot, xfrm.flip_h, xfrm.flip_v,
        );
        Some(Shape::Picture {
            name: shape_name(node),
            pos: xfrm.pos,
            transform: parent.multiply(&local),
            path,
            image,
            rot: xfrm.rot,
        })
    }

    fn parse_graphic_frame(
        &mut self,
        node: &XmlNode,
        layer: Layer,
        parent: &Matrix,
    ) -> Option<Shape> {
        let xfrm = node
            .child(ns::PML, "xfrm")
            .or_else(|| node.child_local("xfrm"))
            .map(read_xfrm)
            .unwrap_or_default();
        let local = Matrix::for_shape(
            xfrm.pos.x, xfrm.pos.y, xfrm.pos.w, xfrm.pos.h, xfrm.rot, false, false,
        );
        let transform = parent.multiply(&local);

        let graphic_data = node
            .child(ns::DML, "graphic")
            .and_then(|graphic| graphic.child(ns::DML, "graphicData"))?;
        let uri = graphic_data.attr("uri").unwrap_or_default();

        match uri {
            ns::TABLE => {
                let tbl = graphic_data.child(ns::DML, "tbl")?;
                let parsed = table::parse_table(
                    tbl,
                    self.env.table_styles,
                    &self.ctx,
                    self.env.measurer,
                );
                Some(Shape::Table {
                    pos: xfrm.pos,
                    transform,
                    num_rows: parsed.num_rows,
                    num_cols: parsed.num_cols,
                    cells: parsed.cells,
                })
            },
            ns::CHART => self.parse_chart_frame(graphic_data, layer, xfrm.pos, transform),
            ns::DIAGRAM => self.parse_diagram_frame(graphic_data, layer, xfrm.pos, transform),
            other => {
                self.diagnostics
                    .unsupported(other.to_string(), "graphic frame content ignored");
                None
            },
        }
    }

    fn parse_chart_frame(
        &mut self,
        graphic_data: &XmlNode,
        layer: Layer,
        pos: Rect,
        transform: Matrix,
    ) -> Option<Shape> {
        let rel_id = graphic_data
            .child(ns::CHART, "chart")
            .and_then(|chart| chart.attr("id"))?;
        let root = self.load_part_xml(rel_id, layer)?;
        let chart_data = chart::parse_chart_part(&root);
        Some(Shape::Chart {
            pos,
            transform,
            chart: chart_data,
        })
    }

    fn parse_diagram_frame(
        &mut self,
        graphic_data: &XmlNode,
        layer: Layer,
        pos: Rect,
        transform: Matrix,
    ) -> Option<Shape> {
        let rel_ids = graphic_data.child(ns::DIAGRAM, "relIds")?;
        let data_rel = rel_ids.attr("dm")?;
        let data_uri = self.layer_rels(layer).target_uri(data_rel);
        let Some(data_uri) = data_uri else {
            self.diagnostics
                .relationship_missing("diagram data", data_rel);
            return None;
        };
        let Some(data_text) = self.env.package.normalized_text(&data_uri) else {
            self.diagnostics.part_missing(data_uri.as_str());
            // A missing data model yields an empty diagram.
            return Some(Shape::Diagram {
                pos,
                transform,
                children: Vec::new(),
            });
        };
        let data_root = self.parse_xml(&data_text, data_uri.as_str());

        // A prebaked drawing part, referenced from the data model's
        // extension list, takes precedence over the layout script.
        let data_rels = Relationships::parse(
            &data_uri,
            self.env
                .package
                .normalized_text(&data_uri.rels_uri())
                .as_deref(),
        );
        let drawing_root = diagram::data_model_ext_rel_id(&data_root)
            .and_then(|rel_id| data_rels.target_uri(&rel_id))
            .and_then(|uri| {
                let text = self.env.package.normalized_text(&uri)?;
                Some(self.parse_xml(&text, uri.as_str()))
            });

        let layout_uri = rel_ids
            .attr("lo")
            .and_then(|rel_id| self.layer_rels(layer).target_uri(rel_id));
        let layout_root = match layout_uri {
            Some(uri) => self
                .env
                .package
                .normalized_text(&uri)
                .map(|text| self.parse_xml(&text, uri.as_str())),
            None => None,
        };

        let children = expand_diagram(
            &data_root,
            layout_root.as_ref(),
            drawing_root.as_ref(),
            &transform,
            &self.ctx,
            self.env.measurer,
        );
        Some(Shape::Diagram {
            pos,
            transform,
            children,
        })
    }

    fn load_part_xml(&mut self, rel_id: &str, layer: Layer) -> Option<XmlNode> {
        let Some(uri) = self.layer_rels(layer).target_uri(rel_id) else {
            self.diagnostics
                .relationship_missing(format!("{layer:?} part"), rel_id);
            return None;
        };
        let Some(text) = self.env.package.normalized_text(&uri) else {
            self.diagnostics.part_missing(uri.as_str());
            return None;
        };
        Some(self.parse_xml(&text, uri.as_str()))
    }

    fn parse_xml(&mut self, text: &str, identifier: &str) -> XmlNode {
        match XmlNode::parse(text) {
            Ok(root) => root,
            Err(message) => {
                self.diagnostics.xml_syntax(identifier, message);
                XmlNode::empty()
            },
        }
    }

    /// A slide-level picture exactly the size of the slide renders as a
    /// background layer: in front of master/layout output, behind the rest
    /// of the slide's shapes.
    fn reorder_background_picture(&mut self, shapes: &mut Vec<Shape>, slide_block_start: usize) {
        let size = self.env.slide_size;
        let is_slide_sized = |pos: &Rect| {
            pos.x.abs() < 0.5
                && pos.y.abs() < 0.5
                && (pos.w - size.width).abs() < 0.5
                && (pos.h - size.height).abs() < 0.5
        };
        let found = shapes
            .iter()
            .enumerate()
            .skip(slide_block_start)
            .find(|(_, shape)| matches!(shape, Shape::Picture { pos, .. } if is_slide_sized(pos)))
            .map(|(index, _)| index);
        if let Some(index) = found
            && index > slide_block_start
        {
            let picture = shapes.remove(index);
            shapes.insert(slide_block_start, picture);
        }
    }
}

fn placeholder_xfrm(placeholder: Option<&Placeholder>) -> Option<&XmlNode> {
    placeholder?
        .shape
        .child_local("spPr")
        .and_then(|pr| pr.child(ns::DML, "xfrm"))
}

fn shape_name(node: &XmlNode) -> Option<String> {
    node.all_children()
        .iter()
        .find(|child| child.name().starts_with("nv"))
        .and_then(|nv| nv.child(ns::PML, "cNvPr").or_else(|| nv.child_local("cNvPr")))
        .and_then(|c_nv_pr| c_nv_pr.attr("name"))
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}

/// Whether a text body carries any actual text.
fn has_text(body: &XmlNode) -> bool {
    body.children(ns::DML, "p").any(|para| {
        para.all_children().iter().any(|child| {
            matches!(child.name(), "r" | "fld")
                && child
                    .child(ns::DML, "t")
                    .is_some_and(|t| !t.deep_text().trim().is_empty())
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_text() {
        let with_text = XmlNode::parse_fragment(
            r#"<p:txBody><a:bodyPr/><a:p><a:r><a:t>hi</a:t></a:r></a:p></p:txBody>"#,
        );
        assert!(has_text(&with_text));

        let empty = XmlNode::parse_fragment(r#"<p:txBody><a:bodyPr/><a:p/></p:txBody>"#);
        assert!(!empty.is_empty());
        assert!(!has_text(&empty));

        let whitespace = XmlNode::parse_fragment(
            r#"<p:txBody><a:bodyPr/><a:p><a:r><a:t>  </a:t></a:r></a:p></p:txBody>"#,
        );
        assert!(!has_text(&whitespace));
    }

    #[test]
    fn test_shape_element_classify() {
        let sp = XmlNode::parse_fragment("<p:sp/>");
        assert!(matches!(ShapeElement::classify(&sp), Some(ShapeElement::Sp(_))));
        let noise = XmlNode::parse_fragment("<p:nvGrpSpPr/>");
        assert!(ShapeElement::classify(&noise).is_none());
    }

    #[test]
    fn test_read_xfrm() {
        let node = XmlNode::parse_fragment(
            r#"<a:xfrm rot="5400000" flipH="1"><a:off x="952500" y="0"/><a:ext cx="1905000" cy="952500"/></a:xfrm>"#,
        );
        let xfrm = read_xfrm(&node);
        assert_eq!(xfrm.pos.x, 100.0);
        assert_eq!(xfrm.pos.w, 200.0);
        assert_eq!(xfrm.pos.h, 100.0);
        assert_eq!(xfrm.rot, 90.0);
        assert!(xfrm.flip_h);
        assert!(!xfrm.flip_v);
    }
}
