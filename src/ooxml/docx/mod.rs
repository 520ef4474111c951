/// Word (.docx) template support.
///
/// The module is organized around two types:
/// - `DocxTemplate`: the package, with its body, header and footer parts located
/// - `DocxSubstitutor`: the engine that rewrites run text in those parts
///
/// # Example
///
/// ```rust,no_run
/// use docstamp::ooxml::docx::DocxSubstitutor;
/// use docstamp::{PlaceholderMap, SubstitutionEngine};
///
/// let template = std::fs::read("templates/quotation.docx")?;
/// let mut placeholders = PlaceholderMap::new();
/// placeholders.insert("{{CLIENT_NAME}}".into(), "Juan Pérez".into());
///
/// let output = DocxSubstitutor::default().generate(&template, &placeholders)?;
/// std::fs::write("quotation.docx", output)?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub mod package;
pub mod substitute;

pub use package::DocxTemplate;
pub use substitute::DocxSubstitutor;
