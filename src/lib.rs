//! Longan - resolve PPTX presentations into a render-ready scene graph
//!
//! This library ingests an Office Open XML presentation package (.pptx) and
//! produces an in-memory scene graph: an ordered list of slides, each a
//! background plus a flat list of positioned, styled shapes. The three-layer
//! inheritance (slide master → slide layout → slide) and the theme's
//! color/font/format schemes are resolved during parsing, so renderers and
//! converters can draw a slide without any further lookups.
//!
//! # Features
//!
//! - **Part-graph traversal**: relationship files resolved with POSIX path
//!   semantics across masters, layouts, slides, media, themes, and charts
//! - **Three-layer style resolution**: per-field precedence with explicit
//!   `noFill` kept distinct from absence
//! - **Geometry**: preset and custom shape outlines as SVG-grammar paths,
//!   nested group transforms pre-multiplied into every shape
//! - **Text layout**: word wrapping with an injectable measurement oracle,
//!   bullets and auto-numbering, theme font aliases resolved
//! - **Tables, charts, diagrams**: banded table styles, chart series data,
//!   SmartArt expansion from prebaked drawings or layout scripts
//!
//! # Example
//!
//! ```no_run
//! use longan::parse_presentation;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let bytes = std::fs::read("deck.pptx")?;
//! let result = parse_presentation(&bytes)?;
//!
//! println!("{} x {}", result.slide_size.width, result.slide_size.height);
//! for slide in &result.slides {
//!     println!("slide {}: {} shapes", slide.id, slide.data.shapes.len());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Example - custom collaborators
//!
//! ```no_run
//! use longan::{CancellationToken, ParseOptions, parse_presentation_with};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let bytes = std::fs::read("deck.pptx")?;
//! let cancel = CancellationToken::new();
//! let options = ParseOptions {
//!     cancel: Some(&cancel),
//!     ..ParseOptions::default()
//! };
//! let result = parse_presentation_with(&bytes, &options)?;
//! assert!(!result.cancelled);
//! # Ok(())
//! # }
//! ```

pub mod drawing;
pub mod error;
pub mod geom;
pub mod opc;
pub mod parse;
pub mod scene;
pub mod text;
pub mod xml;

pub use error::{Diagnostic, DiagnosticKind, ParseError, Result};
pub use parse::{
    CancellationToken, MediaResolver, NO_SLIDES_MARKER, ParseOptions, PresentationResult,
    Progress, ProgressSink, parse_presentation, parse_presentation_with,
};
pub use scene::{Shape, Slide, SlideData, SlideSize};
pub use text::measure::{AvgAdvanceMeasurer, TextMeasurer};
