//! Excel (.xlsx) template support.
//!
//! Only the first worksheet is substituted, and only its shared-string cells.
//! The module is split the way the package is laid out:
//!
//! - `package`: `XlsxTemplate`, locating the workbook, first sheet and shared strings
//! - `shared_strings`: the shared strings table, parsed with byte ranges for rewriting
//! - `substitute`: `XlsxSubstitutor`, the engine itself
//!
//! # Example
//!
//! ```rust,no_run
//! use docstamp::ooxml::xlsx::XlsxSubstitutor;
//! use docstamp::{PlaceholderMap, SubstitutionEngine};
//!
//! let template = std::fs::read("templates/invoice.xlsx")?;
//! let mut placeholders = PlaceholderMap::new();
//! placeholders.insert("{{TOTAL}}".into(), "150.00".into());
//!
//! let output = XlsxSubstitutor::default().generate(&template, &placeholders)?;
//! std::fs::write("invoice.xlsx", output)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod package;
pub mod shared_strings;
pub mod substitute;

pub use package::XlsxTemplate;
pub use shared_strings::{SharedStringEntry, SharedStringTable};
pub use substitute::XlsxSubstitutor;
