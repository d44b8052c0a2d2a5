//! Package container access: the ZIP entry map, part names, and the
//! relationship graph between parts.

pub mod package;
pub mod packuri;
pub mod rel;

pub use package::Package;
pub use packuri::PackUri;
pub use rel::{Relationship, Relationships, reltype};
