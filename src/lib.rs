//! Docstamp - placeholder substitution for Office document templates
//!
//! This library takes a pre-authored Word (.docx) or Excel (.xlsx) template and
//! a map of placeholder strings to values, and produces a new document in which
//! every placeholder is replaced while formatting, structure and every other
//! part of the package stay as they were.
//!
//! # Features
//!
//! - **Word templates**: run text in the body, every header and every footer
//! - **Excel templates**: shared-string cells of the first worksheet
//! - **Format preserving**: untouched ZIP members are copied without being
//!   inflated; rewritten XML parts only change inside the text nodes that held
//!   a placeholder
//! - **Deterministic matching**: overlapping placeholders resolve to the
//!   longest one, independent of map order
//!
//! # Known limitation
//!
//! A placeholder is only found inside a single text node. Word splits text
//! into runs wherever formatting changes, so a placeholder that is partly bold
//! (or was edited in two goes) is left as it is.
//!
//! # Example
//!
//! ```no_run
//! use docstamp::{PlaceholderMap, generate_file};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut placeholders = PlaceholderMap::new();
//! placeholders.insert("{{CLIENT_NAME}}".into(), "Juan Pérez".into());
//! placeholders.insert("{{DATE}}".into(), "2024-01-01".into());
//!
//! let document = generate_file("templates/quotation.docx", &placeholders)?;
//! std::fs::write("quotation-juan-perez.docx", document)?;
//! # Ok(())
//! # }
//! ```
//!
//! # Example - Reporting unmatched placeholders
//!
//! ```no_run
//! use docstamp::{PlaceholderMap, TemplateKind, generate_with_report};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let template = std::fs::read("templates/invoice.xlsx")?;
//! let placeholders = PlaceholderMap::from([("{{TOTAL}}".to_string(), "150.00".to_string())]);
//!
//! let (document, report) = generate_with_report(TemplateKind::Xlsx, &template, &placeholders)?;
//! for key in report.unmatched() {
//!     eprintln!("placeholder {key} not found in template");
//! }
//! # let _ = document;
//! # Ok(())
//! # }
//! ```

/// Shared placeholder matching and XML splicing utilities
pub mod common;

/// Options shared by both engines
pub mod config;

/// OOXML packages and the format-specific engines
///
/// This module provides the package loader and the Word and Excel
/// substitution engines built on top of it.
pub mod ooxml;

/// Caller-facing entry points
pub mod template;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export commonly used types for convenience
pub use common::{MatchTally, PlaceholderMap, Replacer};
pub use config::SubstitutionOptions;
pub use ooxml::docx::{DocxSubstitutor, DocxTemplate};
pub use ooxml::opc::OpcError;
pub use ooxml::xlsx::{XlsxSubstitutor, XlsxTemplate};
pub use ooxml::{Result, TemplateLoadError};
pub use template::{
    SubstitutionEngine, SubstitutionReport, TemplateKind, generate, generate_auto,
    generate_auto_with_options, generate_file, generate_with_report,
};
