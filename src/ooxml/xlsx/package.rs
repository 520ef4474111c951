/// Package adapter for Excel templates.
use std::path::Path;

use quick_xml::events::Event;
use quick_xml::name::{Namespace, ResolveResult};

use crate::config::SubstitutionOptions;
use crate::ooxml::error::{Result, TemplateLoadError};
use crate::ooxml::opc::constants::{content_type as ct, namespace as ns, relationship_type as rt};
use crate::ooxml::opc::part::XmlPart;
use crate::ooxml::opc::{OpcPackage, PackURI, PartStore};
use crate::ooxml::xlsx::shared_strings::is_sml;

/// An Excel (.xlsx) template.
///
/// Opening a template resolves the three parts substitution needs: the
/// workbook, its first worksheet and the shared strings table. A template
/// without any of them is rejected.
///
/// # Examples
///
/// ```rust,no_run
/// use docstamp::ooxml::xlsx::XlsxTemplate;
/// use docstamp::SubstitutionOptions;
///
/// let template = XlsxTemplate::open("templates/invoice.xlsx", &SubstitutionOptions::default())?;
/// println!("first sheet: {} ({})", template.first_sheet_name(), template.first_sheet());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct XlsxTemplate {
    opc: OpcPackage,
    workbook: PackURI,
    first_sheet: PackURI,
    first_sheet_name: String,
    shared_strings: PackURI,
}

/// The first `sheet` element of a workbook.
struct SheetRef {
    name: String,
    r_id: String,
}

impl XlsxTemplate {
    /// Open a .xlsx template from a file path.
    pub fn open<P: AsRef<Path>>(path: P, options: &SubstitutionOptions) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes, options)
    }

    /// Load a .xlsx template from bytes. The bytes are copied.
    pub fn from_bytes(bytes: &[u8], options: &SubstitutionOptions) -> Result<Self> {
        let opc = OpcPackage::from_bytes_with_limit(bytes, options.max_part_bytes)?;
        Self::from_package(opc)
    }

    /// Wrap an already opened package, locating the workbook, its first
    /// worksheet and the shared strings table.
    pub fn from_package(mut opc: OpcPackage) -> Result<Self> {
        let workbook = opc
            .main_document_partname()
            .map_err(|e| TemplateLoadError::missing("workbook part", e.to_string()))?;

        let content_type = opc.content_type(&workbook)?;
        if !ct::SML_MAIN_PARTS.contains(&content_type) {
            return Err(TemplateLoadError::InvalidContentType {
                expected: ct::SML_SHEET_MAIN.to_string(),
                got: content_type.to_string(),
            });
        }

        let rels = opc.part_rels(&workbook)?;

        let workbook_part = opc.xml_part(&workbook)?;
        let sheet = first_sheet(&workbook_part)?
            .ok_or_else(|| TemplateLoadError::missing("worksheet", "workbook declares no sheets"))?;

        let first_sheet = rels
            .get(&sheet.r_id)
            .ok_or_else(|| {
                TemplateLoadError::missing(
                    "worksheet",
                    format!("no relationship {} for sheet '{}'", sheet.r_id, sheet.name),
                )
            })?
            .target_partname()
            .map_err(|e| TemplateLoadError::missing("worksheet", e.to_string()))?;
        if !opc.contains_part(&first_sheet) {
            return Err(TemplateLoadError::missing(
                "worksheet",
                format!("{} is not in the package", first_sheet),
            ));
        }

        let shared_strings = rels
            .part_with_reltype(rt::SHARED_STRINGS)
            .and_then(|rel| rel.target_partname())
            .map_err(|e| TemplateLoadError::missing("shared strings table", e.to_string()))?;
        if !opc.contains_part(&shared_strings) {
            return Err(TemplateLoadError::missing(
                "shared strings table",
                format!("{} is not in the package", shared_strings),
            ));
        }

        tracing::debug!(
            workbook = %workbook,
            sheet = %first_sheet,
            sheet_name = %sheet.name,
            shared_strings = %shared_strings,
            "opened Excel template"
        );

        Ok(Self {
            opc,
            workbook,
            first_sheet,
            first_sheet_name: sheet.name,
            shared_strings,
        })
    }

    #[inline]
    pub fn workbook_partname(&self) -> &PackURI {
        &self.workbook
    }

    /// The only worksheet substitution is applied to.
    #[inline]
    pub fn first_sheet(&self) -> &PackURI {
        &self.first_sheet
    }

    #[inline]
    pub fn first_sheet_name(&self) -> &str {
        &self.first_sheet_name
    }

    #[inline]
    pub fn shared_strings_partname(&self) -> &PackURI {
        &self.shared_strings
    }

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

#[inline]
fn is_relationships_ns(resolved: &ResolveResult<'_>) -> bool {
    matches!(
        resolved,
        ResolveResult::Bound(Namespace(uri))
            if *uri == ns::OFC_RELATIONSHIPS.as_bytes()
                || *uri == ns::OFC_RELATIONSHIPS_STRICT.as_bytes()
    )
}

/// Find the first `sheet` of the workbook's `sheets` collection.
fn first_sheet(workbook: &XmlPart) -> Result<Option<SheetRef>> {
    let mut reader = workbook.reader();

    loop {
        let (resolved, event) = reader
            .read_resolved_event()
            .map_err(|e| TemplateLoadError::xml(workbook.partname(), e))?;
        let in_sml = is_sml(&resolved);

        match event {
            Event::Start(ref e) | Event::Empty(ref e)
                if in_sml && e.local_name().as_ref() == b"sheet" =>
            {
                let mut name = String::new();
                let mut r_id = None;
                for attr in e.attributes().with_checks(false).flatten() {
                    let (attr_ns, local) = reader.resolve_attribute(attr.key);
                    let value = attr
                        .unescape_value()
                        .map_err(|e| TemplateLoadError::xml(workbook.partname(), e))?;
                    match local.as_ref() {
                        b"id" if is_relationships_ns(&attr_ns) => r_id = Some(value.into_owned()),
                        b"name" if matches!(attr_ns, ResolveResult::Unbound) => {
                            name = value.into_owned()
                        },
                        _ => {},
                    }
                }
                let r_id = r_id.ok_or_else(|| {
                    TemplateLoadError::xml(workbook.partname(), "sheet element without r:id")
                })?;
                return Ok(Some(SheetRef { name, r_id }));
            },
            Event::Eof => return Ok(None),
            _ => {},
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{DocxBuilder, XlsxBuilder, patch_member};

    #[test]
    fn test_open_resolves_parts() {
        let bytes = XlsxBuilder::new()
            .sheet("Resumen", &[("A1", "{{TOTAL}}")])
            .sheet("Detalle", &[])
            .build();
        let template = XlsxTemplate::from_bytes(&bytes, &SubstitutionOptions::default()).unwrap();
        assert_eq!(template.workbook_partname().as_str(), "/xl/workbook.xml");
        assert_eq!(template.first_sheet().as_str(), "/xl/worksheets/sheet1.xml");
        assert_eq!(template.first_sheet_name(), "Resumen");
        assert_eq!(
            template.shared_strings_partname().as_str(),
            "/xl/sharedStrings.xml"
        );
    }

    #[test]
    fn test_missing_shared_strings() {
        let bytes = XlsxBuilder::new()
            .sheet("Hoja1", &[])
            .without_shared_strings()
            .build();
        match XlsxTemplate::from_bytes(&bytes, &SubstitutionOptions::default()) {
            Err(TemplateLoadError::MissingPart { role, .. }) => {
                assert_eq!(role, "shared strings table")
            },
            other => panic!("unexpected: {:?}", other.err()),
        }
    }

    #[test]
    fn test_workbook_without_sheets() {
        let bytes = XlsxBuilder::new().build();
        match XlsxTemplate::from_bytes(&bytes, &SubstitutionOptions::default()) {
            Err(TemplateLoadError::MissingPart { role, .. }) => assert_eq!(role, "worksheet"),
            other => panic!("unexpected: {:?}", other.err()),
        }
    }

    fn assert_missing_worksheet(bytes: &[u8]) {
        match XlsxTemplate::from_bytes(bytes, &SubstitutionOptions::default()) {
            Err(TemplateLoadError::MissingPart { role, .. }) => assert_eq!(role, "worksheet"),
            other => panic!("unexpected: {:?}", other.err()),
        }
    }

    #[test]
    fn test_sheet_without_relationship() {
        let bytes = XlsxBuilder::new().sheet("Hoja1", &[("A1", "x")]).build();
        let bytes = patch_member(&bytes, "xl/workbook.xml", r#"r:id="rId1""#, r#"r:id="rId42""#);
        assert_missing_worksheet(&bytes);
    }

    #[test]
    fn test_sheet_target_not_in_package() {
        let bytes = XlsxBuilder::new().sheet("Hoja1", &[("A1", "x")]).build();
        let bytes = patch_member(
            &bytes,
            "xl/_rels/workbook.xml.rels",
            "worksheets/sheet1.xml",
            "worksheets/sheet9.xml",
        );
        assert_missing_worksheet(&bytes);
    }

    #[test]
    fn test_word_document_is_rejected() {
        let bytes = DocxBuilder::new().build();
        assert!(matches!(
            XlsxTemplate::from_bytes(&bytes, &SubstitutionOptions::default()),
            Err(TemplateLoadError::InvalidContentType { .. })
        ));
    }
}
