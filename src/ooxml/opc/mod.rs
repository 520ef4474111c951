/// Open Packaging Conventions (OPC) implementation.
///
/// This module is the package loader shared by both template engines. It
/// covers the parts of the OPC specification needed to navigate and rewrite a
/// template:
///
/// - Package structure (part names, relationships)
/// - Content type lookup
/// - ZIP-based physical packaging with verbatim pass-through of untouched members
///
/// Package-structure parts (`[Content_Types].xml`, `.rels`) are read, never
/// regenerated.

pub mod constants;
pub mod error;
pub mod package;
pub mod packuri;
pub mod part;
pub mod phys_pkg;
pub mod pkgreader;
pub mod rel;

// Re-export commonly used types
pub use error::OpcError;
pub use package::{OpcPackage, PartStore};
pub use packuri::PackURI;
pub use part::XmlPart;
pub use rel::{Relationship, Relationships};
