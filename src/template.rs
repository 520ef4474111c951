//! Caller-facing entry points.
//!
//! Every generation call is self-contained: the template is copied into a
//! private buffer, rewritten in memory and serialized into a fresh output
//! buffer. Nothing is cached between calls, so concurrent calls on the same
//! template are independent.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::common::{MatchTally, PlaceholderMap, Replacer};
use crate::config::SubstitutionOptions;
use crate::ooxml::docx::{DocxSubstitutor, DocxTemplate};
use crate::ooxml::error::{Result, TemplateLoadError};
use crate::ooxml::opc::constants::content_type as ct;
use crate::ooxml::opc::{OpcPackage, PackURI};
use crate::ooxml::xlsx::{XlsxSubstitutor, XlsxTemplate};

/// The document kinds templates can be made of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateKind {
    /// Word-processing document (.docx and its template/macro variants)
    Docx,
    /// Spreadsheet (.xlsx and its template/macro variants)
    Xlsx,
}

impl TemplateKind {
    /// Identify the kind from the content type of the package's main part.
    pub fn detect(package: &OpcPackage) -> Result<Self> {
        let main = package
            .main_document_partname()
            .map_err(|e| TemplateLoadError::missing("main document part", e.to_string()))?;
        let content_type = package.content_type(&main)?;

        if ct::WML_MAIN_PARTS.contains(&content_type) {
            Ok(TemplateKind::Docx)
        } else if ct::SML_MAIN_PARTS.contains(&content_type) {
            Ok(TemplateKind::Xlsx)
        } else {
            Err(TemplateLoadError::UnknownKind(content_type.to_string()))
        }
    }

    /// Guess the kind from a file extension.
    ///
    /// # Examples
    ///
    /// ```
    /// use docstamp::TemplateKind;
    /// use std::path::Path;
    ///
    /// assert_eq!(TemplateKind::from_extension(Path::new("cotizacion.DOCX")), Some(TemplateKind::Docx));
    /// assert_eq!(TemplateKind::from_extension(Path::new("factura.xltx")), Some(TemplateKind::Xlsx));
    /// assert_eq!(TemplateKind::from_extension(Path::new("notes.txt")), None);
    /// ```
    pub fn from_extension(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "docx" | "dotx" | "docm" | "dotm" => Some(TemplateKind::Docx),
            "xlsx" | "xltx" | "xlsm" | "xltm" => Some(TemplateKind::Xlsx),
            _ => None,
        }
    }

    /// The engine for this kind.
    pub fn engine(self, options: SubstitutionOptions) -> Box<dyn SubstitutionEngine + Send + Sync> {
        match self {
            TemplateKind::Docx => Box::new(DocxSubstitutor::new(options)),
            TemplateKind::Xlsx => Box::new(XlsxSubstitutor::new(options)),
        }
    }
}

impl std::fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TemplateKind::Docx => write!(f, "docx"),
            TemplateKind::Xlsx => write!(f, "xlsx"),
        }
    }
}

/// The contract both engines implement:
/// `generate(template_bytes, placeholders) -> document_bytes`.
pub trait SubstitutionEngine {
    /// The document kind this engine accepts.
    fn kind(&self) -> TemplateKind;

    /// Substitute `placeholders` into `template`, also reporting what was
    /// replaced.
    fn generate_with_report(
        &self,
        template: &[u8],
        placeholders: &PlaceholderMap,
    ) -> Result<(Vec<u8>, SubstitutionReport)>;

    /// Substitute `placeholders` into `template`.
    fn generate(&self, template: &[u8], placeholders: &PlaceholderMap) -> Result<Vec<u8>> {
        self.generate_with_report(template, placeholders)
            .map(|(output, _)| output)
    }
}

/// What a generation call replaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubstitutionReport {
    kind: TemplateKind,
    /// Replacements made per placeholder (zero for unmatched ones)
    replacements: BTreeMap<String, usize>,
    /// Parts whose bytes differ from the template, in processing order
    rewritten_parts: Vec<String>,
}

impl SubstitutionReport {
    pub(crate) fn new(
        kind: TemplateKind,
        replacer: &Replacer,
        tally: &MatchTally,
        rewritten_parts: Vec<PackURI>,
    ) -> Self {
        Self {
            kind,
            replacements: replacer.summarize(tally),
            rewritten_parts: rewritten_parts.iter().map(|p| p.to_string()).collect(),
        }
    }

    #[inline]
    pub fn kind(&self) -> TemplateKind {
        self.kind
    }

    #[inline]
    pub fn replacements(&self) -> &BTreeMap<String, usize> {
        &self.replacements
    }

    /// Replacements made for `placeholder`.
    pub fn count(&self, placeholder: &str) -> usize {
        self.replacements.get(placeholder).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.replacements.values().sum()
    }

    /// Placeholders that matched nothing in the template.
    pub fn unmatched(&self) -> Vec<&str> {
        self.replacements
            .iter()
            .filter(|(_, count)| **count == 0)
            .map(|(key, _)| key.as_str())
            .collect()
    }

    #[inline]
    pub fn rewritten_parts(&self) -> &[String] {
        &self.rewritten_parts
    }

    /// Whether the output is identical to the template.
    pub fn is_unchanged(&self) -> bool {
        self.rewritten_parts.is_empty()
    }
}

/// Substitute `placeholders` into a template of a known kind.
///
/// # Examples
///
/// ```rust,no_run
/// use docstamp::{PlaceholderMap, TemplateKind, generate};
///
/// let template = std::fs::read("templates/certificate.docx")?;
/// let placeholders = PlaceholderMap::from([
///     ("{{CLIENT_NAME}}".to_string(), "Juan Pérez".to_string()),
///     ("{{DATE}}".to_string(), "2024-01-01".to_string()),
/// ]);
/// let document = generate(TemplateKind::Docx, &template, &placeholders)?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn generate(
    kind: TemplateKind,
    template: &[u8],
    placeholders: &PlaceholderMap,
) -> Result<Vec<u8>> {
    kind.engine(SubstitutionOptions::default())
        .generate(template, placeholders)
}

/// Like [`generate`], also returning a [`SubstitutionReport`].
pub fn generate_with_report(
    kind: TemplateKind,
    template: &[u8],
    placeholders: &PlaceholderMap,
) -> Result<(Vec<u8>, SubstitutionReport)> {
    kind.engine(SubstitutionOptions::default())
        .generate_with_report(template, placeholders)
}

/// Substitute `placeholders` into a template whose kind is read from the
/// package itself.
pub fn generate_auto(template: &[u8], placeholders: &PlaceholderMap) -> Result<Vec<u8>> {
    generate_auto_with_options(template, placeholders, &SubstitutionOptions::default())
        .map(|(output, _)| output)
}

/// Like [`generate_auto`], with explicit options and a report.
pub fn generate_auto_with_options(
    template: &[u8],
    placeholders: &PlaceholderMap,
    options: &SubstitutionOptions,
) -> Result<(Vec<u8>, SubstitutionReport)> {
    let opc = OpcPackage::from_bytes_with_limit(template, options.max_part_bytes)?;
    let kind = TemplateKind::detect(&opc)?;
    tracing::debug!(%kind, "detected template kind");

    match kind {
        TemplateKind::Docx => DocxSubstitutor::new(options.clone())
            .generate_from(DocxTemplate::from_package(opc)?, placeholders),
        TemplateKind::Xlsx => XlsxSubstitutor::new(options.clone())
            .generate_from(XlsxTemplate::from_package(opc)?, placeholders),
    }
}

/// Read a template from disk and substitute `placeholders` into it.
///
/// The kind is read from the package; the file extension is not trusted.
pub fn generate_file<P: AsRef<Path>>(path: P, placeholders: &PlaceholderMap) -> Result<Vec<u8>> {
    let path = path.as_ref();
    let template = std::fs::read(path)?;
    tracing::debug!(path = %path.display(), bytes = template.len(), "read template");
    generate_auto(&template, placeholders)
}
