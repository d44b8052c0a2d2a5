//! The presentation orchestrator.
//!
//! Opens the archive, loads the presentation part, resolves the theme and
//! table styles, then walks each slide's layout → master chain and hands
//! the three parts to the slide parser. Slide-level failures degrade to
//! diagnostics; only a corrupt archive or a missing presentation part is
//! fatal.

pub mod chart;
pub mod diagram;
pub mod part_model;
pub mod slide;
pub mod table;

use crate::drawing::table_style::TableStyles;
use crate::drawing::theme::Theme;
use crate::error::{Diagnostic, Diagnostics, ParseError, Result};
use crate::geom::units::emu_to_px;
use crate::opc::{Package, PackUri, Relationships, reltype};
use crate::scene::{ImageMaps, Slide, SlideSize};
use crate::text::measure::{AvgAdvanceMeasurer, TextMeasurer};
use crate::text::style::{DefaultTextStyles, ListStyle};
use crate::xml::{XmlNode, ns};
use quick_xml::Reader;
use quick_xml::events::Event;
use self::slide::{SlideEnv, SlideInputs};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Marker string reported when the deck has no slides, kept for
/// compatibility with the legacy result shape.
pub const NO_SLIDES_MARKER: &str = "No slides found in the presentation.";

/// Converts media bytes into an opaque reference the scene graph stores.
pub trait MediaResolver {
    fn media_href(&self, bytes: &[u8], mime_type_hint: &str) -> String;
}

/// Per-slide progress reported after each slide completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub slide_index: usize,
    pub total_slides: usize,
}

/// Receives [`Progress`] after every slide.
pub trait ProgressSink {
    fn on_slide(&self, progress: Progress);
}

/// Cooperative cancellation, polled between slides.
///
/// Cancelling yields a partial result holding every fully parsed slide.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Optional collaborators for a parse.
#[derive(Default)]
pub struct ParseOptions<'a> {
    /// Font measurement oracle; average-advance metrics when absent.
    pub measurer: Option<&'a dyn TextMeasurer>,
    /// Media reference producer; archive paths are used when absent.
    pub media: Option<&'a dyn MediaResolver>,
    pub progress: Option<&'a dyn ProgressSink>,
    pub cancel: Option<&'a CancellationToken>,
}

/// The parsed presentation: the full render-ready scene graph.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PresentationResult {
    pub theme: Theme,
    pub table_styles: TableStyles,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_table_style_id: Option<String>,
    pub slide_size: SlideSize,
    pub slides: Vec<Slide>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
    #[serde(rename = "slideshowLength", skip_serializing_if = "Option::is_none")]
    pub slideshow_length: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub cancelled: bool,
}

const DEFAULT_MEASURER: AvgAdvanceMeasurer = AvgAdvanceMeasurer { advance_ratio: 0.5 };

/// Parse a presentation package with default collaborators.
pub fn parse_presentation(package_bytes: &[u8]) -> Result<PresentationResult> {
    parse_presentation_with(package_bytes, &ParseOptions::default())
}

/// Parse a presentation package.
///
/// Fatal errors are a corrupt archive and a missing `ppt/presentation.xml`;
/// everything else surfaces as diagnostics on the result.
pub fn parse_presentation_with(
    package_bytes: &[u8],
    options: &ParseOptions,
) -> Result<PresentationResult> {
    let package = Package::load(package_bytes)?;
    let mut diagnostics = Diagnostics::new();

    let pres_uri = PackUri::new("ppt/presentation.xml");
    let Some(pres_text) = package.normalized_text(&pres_uri) else {
        return Err(ParseError::PresentationMissing(pres_uri.to_string()));
    };

    // The slide-id list is scanned tolerantly; a malformed presentation
    // DOM still yields slides as long as the sldId elements survive.
    let slide_ids = scan_slide_ids(&pres_text);
    let pres_root = parse_part_xml(&pres_text, pres_uri.as_str(), &mut diagnostics);
    let slide_size = read_slide_size(&pres_root);
    let pres_rels = read_rels(&package, &pres_uri);

    let presentation_styles = pres_root
        .child(ns::PML, "defaultTextStyle")
        .map(ListStyle::parse)
        .filter(|style| !style.is_empty())
        .map(|other| DefaultTextStyles {
            other,
            ..DefaultTextStyles::default()
        });

    let theme = load_theme(&package, &pres_rels, &mut diagnostics);
    let (table_styles, default_table_style_id) =
        load_table_styles(&package, &pres_rels, &mut diagnostics);

    let measurer = options.measurer.unwrap_or(&DEFAULT_MEASURER);
    let env = SlideEnv {
        package: &package,
        theme: &theme,
        table_styles: &table_styles,
        presentation_styles: presentation_styles.as_ref(),
        measurer,
        slide_size,
    };

    let mut slides = Vec::with_capacity(slide_ids.len());
    let total_slides = slide_ids.len();
    let mut cancelled = false;

    for (index, (slide_id, rel_id)) in slide_ids.iter().enumerate() {
        if options.cancel.is_some_and(CancellationToken::is_cancelled) {
            cancelled = true;
            break;
        }

        let data = parse_one_slide(&env, &package, &pres_rels, rel_id, options, &mut diagnostics);
        slides.push(Slide {
            id: *slide_id,
            data,
        });

        if let Some(sink) = options.progress {
            sink.on_slide(Progress {
                slide_index: index,
                total_slides,
            });
        }
    }

    let slideshow_length = slides.is_empty().then(|| NO_SLIDES_MARKER.to_string());

    Ok(PresentationResult {
        theme,
        table_styles,
        default_table_style_id,
        slide_size,
        slides,
        diagnostics: diagnostics.into_vec(),
        slideshow_length,
        cancelled,
    })
}

fn parse_one_slide(
    env: &SlideEnv,
    package: &Package,
    pres_rels: &Relationships,
    rel_id: &str,
    options: &ParseOptions,
    diagnostics: &mut Diagnostics,
) -> crate::scene::SlideData {
    let Some(slide_uri) = pres_rels.target_uri(rel_id) else {
        diagnostics.relationship_missing("ppt/presentation.xml", rel_id);
        return failed_slide(rel_id, "slide relationship does not resolve");
    };
    let Some(slide_text) = package.normalized_text(&slide_uri) else {
        diagnostics.part_missing(slide_uri.as_str());
        return failed_slide(slide_uri.as_str(), "slide part missing from package");
    };
    let slide_root = parse_part_xml(&slide_text, slide_uri.as_str(), diagnostics);
    if slide_root.is_empty() {
        return failed_slide(slide_uri.as_str(), "slide XML did not parse");
    }
    let slide_rels = read_rels(package, &slide_uri);

    let (layout_root, layout_rels) =
        load_ancestor(package, &slide_rels, reltype::SLIDE_LAYOUT, diagnostics);
    let (master_root, master_rels) =
        load_ancestor(package, &layout_rels, reltype::SLIDE_MASTER, diagnostics);

    let image_maps = ImageMaps {
        slide: build_image_map(package, &slide_rels, options, diagnostics),
        layout: build_image_map(package, &layout_rels, options, diagnostics),
        master: build_image_map(package, &master_rels, options, diagnostics),
    };

    let inputs = SlideInputs {
        slide: slide_root,
        layout: layout_root,
        master: master_root,
        slide_rels,
        layout_rels,
        master_rels,
        image_maps,
    };
    slide::parse_slide(env, &inputs)
}

/// A slide that failed before shape parsing: empty, with the failure in its
/// own diagnostics array.
fn failed_slide(identifier: &str, message: &str) -> crate::scene::SlideData {
    let mut diagnostics = Diagnostics::new();
    diagnostics.layout_failure(identifier, message);
    crate::scene::SlideData {
        diagnostics: diagnostics.into_vec(),
        ..crate::scene::SlideData::default()
    }
}

/// Load a layout or master through the given relationship type. A missing
/// part degrades to an empty tree plus a diagnostic.
fn load_ancestor(
    package: &Package,
    rels: &Relationships,
    rel_type: &str,
    diagnostics: &mut Diagnostics,
) -> (XmlNode, Relationships) {
    let Some(uri) = rels.first_of_type(rel_type) else {
        return (XmlNode::empty(), Relationships::default());
    };
    let Some(text) = package.normalized_text(&uri) else {
        diagnostics.part_missing(uri.as_str());
        return (XmlNode::empty(), Relationships::default());
    };
    let root = parse_part_xml(&text, uri.as_str(), diagnostics);
    let part_rels = read_rels(package, &uri);
    (root, part_rels)
}

/// Resolve every image relationship of one part into a media reference.
///
/// Append-only per layer: an id that is already present never overwrites.
fn build_image_map(
    package: &Package,
    rels: &Relationships,
    options: &ParseOptions,
    diagnostics: &mut Diagnostics,
) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for (rel_id, uri) in rels.all_of_type(reltype::IMAGE) {
        if map.contains_key(&rel_id) {
            continue;
        }
        let Some(bytes) = package.bytes(&uri) else {
            diagnostics.relationship_missing(uri.as_str(), &rel_id);
            continue;
        };
        let href = match options.media {
            Some(resolver) => resolver.media_href(bytes, mime_for_path(uri.as_str())),
            None => uri.to_string(),
        };
        map.insert(rel_id, href);
    }
    map
}

fn mime_for_path(path: &str) -> &'static str {
    let ext = path.rsplit('.').next().unwrap_or_default();
    match ext.to_ascii_lowercase().as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "svg" => "image/svg+xml",
        "tif" | "tiff" => "image/tiff",
        "wmf" => "image/x-wmf",
        "emf" => "image/x-emf",
        _ => "application/octet-stream",
    }
}

fn read_rels(package: &Package, part: &PackUri) -> Relationships {
    Relationships::parse(part, package.normalized_text(&part.rels_uri()).as_deref())
}

fn parse_part_xml(text: &str, identifier: &str, diagnostics: &mut Diagnostics) -> XmlNode {
    match XmlNode::parse(text) {
        Ok(root) => root,
        Err(message) => {
            diagnostics.xml_syntax(identifier, message);
            XmlNode::empty()
        },
    }
}

/// Scan the presentation part for `sldId` elements carrying an `r:id`,
/// tolerant of namespace prefixes. Order is the slide order.
fn scan_slide_ids(pres_text: &str) -> Vec<(u32, String)> {
    let mut ids = Vec::new();
    let mut reader = Reader::from_str(pres_text);
    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                if e.local_name().as_ref() != b"sldId" {
                    continue;
                }
                let mut slide_id = 0u32;
                let mut rel_id = None;
                for attr in e.attributes().with_checks(false).flatten() {
                    let value = match attr.unescape_value() {
                        Ok(value) => value,
                        Err(_) => continue,
                    };
                    if attr.key.as_ref() == b"id" {
                        slide_id = value.parse().unwrap_or(0);
                    } else if attr.key.local_name().as_ref() == b"id"
                        && attr.key.as_ref() != b"id"
                        && value.starts_with("rId")
                    {
                        rel_id = Some(value.into_owned());
                    }
                }
                if let Some(rel_id) = rel_id {
                    ids.push((slide_id, rel_id));
                }
            },
            Ok(Event::Eof) | Err(_) => break,
            _ => {},
        }
    }
    ids
}

fn read_slide_size(pres_root: &XmlNode) -> SlideSize {
    let sld_sz = pres_root.child(ns::PML, "sldSz");
    // Standard 4:3 when unspecified.
    let cx = sld_sz.and_then(|sz| sz.attr_i64("cx")).unwrap_or(9_144_000);
    let cy = sld_sz.and_then(|sz| sz.attr_i64("cy")).unwrap_or(6_858_000);
    SlideSize {
        width: emu_to_px(cx),
        height: emu_to_px(cy),
    }
}

/// The theme part, from the presentation's relationships or the stock path.
fn load_theme(package: &Package, pres_rels: &Relationships, diagnostics: &mut Diagnostics) -> Theme {
    let uri = pres_rels
        .first_of_type(reltype::THEME)
        .filter(|uri| package.contains(uri))
        .or_else(|| {
            let fallback = PackUri::new("ppt/theme/theme1.xml");
            package.contains(&fallback).then_some(fallback)
        });
    let Some(uri) = uri else {
        return Theme::default();
    };
    let Some(text) = package.normalized_text(&uri) else {
        return Theme::default();
    };
    Theme::parse(&parse_part_xml(&text, uri.as_str(), diagnostics))
}

fn load_table_styles(
    package: &Package,
    pres_rels: &Relationships,
    diagnostics: &mut Diagnostics,
) -> (TableStyles, Option<String>) {
    let uri = pres_rels
        .first_of_type(reltype::TABLE_STYLES)
        .filter(|uri| package.contains(uri))
        .or_else(|| {
            let fallback = PackUri::new("ppt/tableStyles.xml");
            package.contains(&fallback).then_some(fallback)
        });
    let Some(uri) = uri else {
        return (TableStyles::default(), None);
    };
    let Some(text) = package.normalized_text(&uri) else {
        return (TableStyles::default(), None);
    };
    let styles = TableStyles::parse(&parse_part_xml(&text, uri.as_str(), diagnostics));
    let default_id = styles.default_id.clone();
    (styles, default_id)
}
