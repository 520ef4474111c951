/// Package adapter for Word templates.
use std::path::Path;

use crate::config::SubstitutionOptions;
use crate::ooxml::error::{Result, TemplateLoadError};
use crate::ooxml::opc::constants::{content_type as ct, relationship_type as rt};
use crate::ooxml::opc::{OpcPackage, PackURI, PartStore, Relationships};

/// A Word (.docx) template.
///
/// Wraps an OPC package whose main part is a WordprocessingML document and
/// knows which parts hold substitutable text: the body, then every header and
/// every footer the body refers to.
///
/// # Examples
///
/// ```rust,no_run
/// use docstamp::ooxml::docx::DocxTemplate;
/// use docstamp::SubstitutionOptions;
///
/// let template = DocxTemplate::open("templates/quotation.docx", &SubstitutionOptions::default())?;
/// for part in template.text_parts() {
///     println!("{}", part);
/// }
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct DocxTemplate {
    /// The underlying OPC package
    opc: OpcPackage,

    /// The main document part (`word/document.xml` in practice)
    document: PackURI,

    /// Header parts, sorted by partname
    headers: Vec<PackURI>,

    /// Footer parts, sorted by partname
    footers: Vec<PackURI>,
}

impl DocxTemplate {
    /// Open a .docx template from a file path.
    pub fn open<P: AsRef<Path>>(path: P, options: &SubstitutionOptions) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes, options)
    }

    /// Load a .docx template from bytes. The bytes are copied; the caller's
    /// buffer is never modified.
    pub fn from_bytes(bytes: &[u8], options: &SubstitutionOptions) -> Result<Self> {
        let opc = OpcPackage::from_bytes_with_limit(bytes, options.max_part_bytes)?;
        Self::from_package(opc)
    }

    /// Wrap an already opened package, checking that it is a Word document.
    pub fn from_package(mut opc: OpcPackage) -> Result<Self> {
        let document = opc
            .main_document_partname()
            .map_err(|e| TemplateLoadError::missing("main document part", e.to_string()))?;

        let content_type = opc.content_type(&document)?;
        if !ct::WML_MAIN_PARTS.contains(&content_type) {
            return Err(TemplateLoadError::InvalidContentType {
                expected: ct::WML_DOCUMENT_MAIN.to_string(),
                got: content_type.to_string(),
            });
        }

        let rels = opc.part_rels(&document)?;
        let headers = existing_targets(&opc, &rels, rt::HEADER, "header");
        let footers = existing_targets(&opc, &rels, rt::FOOTER, "footer");

        tracing::debug!(
            document = %document,
            headers = headers.len(),
            footers = footers.len(),
            "opened Word template"
        );

        Ok(Self {
            opc,
            document,
            headers,
            footers,
        })
    }

    #[inline]
    pub fn document_partname(&self) -> &PackURI {
        &self.document
    }

    #[inline]
    pub fn headers(&self) -> &[PackURI] {
        &self.headers
    }

    #[inline]
    pub fn footers(&self) -> &[PackURI] {
        &self.footers
    }

    /// Parts holding substitutable text, in processing order: body, headers,
    /// footers.
    pub fn text_parts(&self) -> impl Iterator<Item = &PackURI> {
        std::iter::once(&self.document)
            .chain(self.headers.iter())
            .chain(self.footers.iter())
    }

    /// Get the underlying OPC package.
    #[inline]
    pub fn opc_package(&self) -> &OpcPackage {
        &self.opc
    }

    #[inline]
    pub fn opc_package_mut(&mut self) -> &mut OpcPackage {
        &mut self.opc
    }

    /// Serialize the (possibly rewritten) template.
    pub fn save(self) -> Result<Vec<u8>> {
        Ok(self.opc.save()?)
    }
}

/// Resolve every internal relationship of `reltype`, dropping targets that are
/// not in the package.
fn existing_targets(
    opc: &OpcPackage,
    rels: &Relationships,
    reltype: &str,
    role: &str,
) -> Vec<PackURI> {
    let mut parts: Vec<PackURI> = rels
        .all_with_reltype(reltype)
        .filter_map(|rel| match rel.target_partname() {
            Ok(partname) if opc.contains_part(&partname) => Some(partname),
            Ok(partname) => {
                tracing::warn!(r_id = rel.r_id(), part = %partname, "skipping missing {role} part");
                None
            },
            Err(e) => {
                tracing::warn!(
                    r_id = rel.r_id(),
                    error = %e,
                    "skipping unresolvable {role} relationship"
                );
                None
            },
        })
        .collect();
    parts.sort();
    parts.dedup();
    parts
}
