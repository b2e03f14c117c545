//! Markup-to-tree parsing
//!
//! The store treats parsing as an opaque step: raw bytes in, a generic tree of
//! maps, lists and strings out. `RecordParser` is the seam; `XmlTreeParser` is
//! the implementation used for the published ISS XML files.

pub mod xml;

pub use xml::XmlTreeParser;

use crate::error::ParseError;

/// Generic parsed document.
///
/// Maps keep document key order (`serde_json` is built with `preserve_order`),
/// so records can be re-serialized with their fields in source order.
pub type RawTree = serde_json::Value;

/// Converts a raw markup byte stream into a `RawTree`.
pub trait RecordParser: Send + Sync {
    fn parse(&self, raw: &[u8]) -> Result<RawTree, ParseError>;
}
