//! Text property stacks and the layout engine.

pub mod layout;
pub mod measure;
pub mod style;

pub use layout::{BodyProps, ListCounters, TextMergeInput, layout_text_body};
pub use measure::{AvgAdvanceMeasurer, TextMeasurer};
pub use style::{BulletProps, DefaultTextStyles, ListStyle, ParaProps, RunProps};
