//! Office Open XML (OOXML) template handling.
//!
//! # Architecture
//!
//! The module is organized into layers:
//!
//! 1. **OPC Layer** (`opc`): package handling (ZIP, parts, relationships,
//!    content types) and the `PartStore` capability set
//! 2. **Errors** (`error`): `TemplateLoadError`, the one error callers see
//! 3. **Format-Specific Modules**:
//!    - `docx`: Word templates (body, header and footer run text)
//!    - `xlsx`: Excel templates (shared-string cells of the first worksheet)
//!
//! # Example: Working with a Word template
//!
//! ```rust,no_run
//! use docstamp::ooxml::docx::{DocxSubstitutor, DocxTemplate};
//! use docstamp::{PlaceholderMap, Replacer, SubstitutionOptions};
//!
//! let options = SubstitutionOptions::default();
//! let mut template = DocxTemplate::open("templates/quotation.docx", &options)?;
//!
//! let mut placeholders = PlaceholderMap::new();
//! placeholders.insert("{{CLIENT_NAME}}".into(), "Juan Pérez".into());
//! let replacer = Replacer::new(&placeholders)?;
//! let mut tally = replacer.tally();
//!
//! let parts = DocxSubstitutor::new(options).substitute(&mut template, &replacer, &mut tally)?;
//! println!("rewrote {} parts, {} replacements", parts.len(), tally.total());
//! std::fs::write("quotation.docx", template.save()?)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
pub mod docx;
pub mod error;
pub mod opc;
pub mod xlsx;

// Re-export commonly used types from OPC layer
pub use opc::{OpcPackage, PackURI, PartStore};

// Re-export error types
pub use error::{Result, TemplateLoadError};
