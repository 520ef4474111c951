//! Shared-string substitution for the first worksheet of Excel templates.
//!
//! Every cell of type `s` on the first worksheet is resolved through the
//! shared strings table. When the referenced text contains placeholders, the
//! table entry itself is rewritten, so every cell sharing that index (on any
//! sheet) shows the new text. The visited cell is additionally turned into an
//! inline string cell holding the same text, unless
//! [`SubstitutionOptions::inline_rewritten_cells`] is off.

use std::collections::BTreeMap;
use std::ops::Range;

use quick_xml::events::{BytesStart, Event};

use crate::common::xml::{Splice, apply_splices};
use crate::common::{MatchTally, PlaceholderMap, Replacer};
use crate::config::SubstitutionOptions;
use crate::ooxml::error::{Result, TemplateLoadError};
use crate::ooxml::opc::PackURI;
use crate::ooxml::opc::part::XmlPart;
use crate::ooxml::xlsx::package::XlsxTemplate;
use crate::ooxml::xlsx::shared_strings::{SharedStringTable, is_sml, qualified, text_element};
use crate::template::{SubstitutionEngine, SubstitutionReport, TemplateKind};

/// Substitutes placeholders in the shared-string cells of the first worksheet.
#[derive(Debug, Clone, Default)]
pub struct XlsxSubstitutor {
    options: SubstitutionOptions,
}

impl XlsxSubstitutor {
    pub fn new(options: SubstitutionOptions) -> Self {
        Self { options }
    }

    #[inline]
    pub fn options(&self) -> &SubstitutionOptions {
        &self.options
    }

    /// Rewrite the first worksheet and the shared strings table of `template`.
    ///
    /// Returns the parts that were changed.
    pub fn substitute(
        &self,
        template: &mut XlsxTemplate,
        replacer: &Replacer,
        tally: &mut MatchTally,
    ) -> Result<Vec<PackURI>> {
        let sheet_name = template.first_sheet().clone();
        let sst_name = template.shared_strings_partname().clone();
        let opc = template.opc_package_mut();

        let sst_part = opc.xml_part(&sst_name)?;
        let table = SharedStringTable::parse(&sst_part)?;
        let sheet_part = opc.xml_part(&sheet_name)?;

        let scan = scan_cells(&sheet_part, &table, replacer, tally, &self.options)?;
        let mut rewritten = Vec::new();

        if !scan.splices.is_empty() {
            let blob = apply_splices(sheet_part.blob(), &scan.splices);
            tracing::debug!(part = %sheet_name, cells = scan.inlined, "inlined rewritten cells");
            opc.put_xml_part(XmlPart::load(
                sheet_name.clone(),
                sheet_part.content_type().to_string(),
                blob,
            )?)?;
            rewritten.push(sheet_name);
        }

        if !scan.updates.is_empty() {
            let blob = table.rewrite(sst_part.blob(), &scan.updates, self.options.preserve_space);
            tracing::debug!(
                part = %sst_name,
                entries = scan.updates.len(),
                "rewrote shared strings"
            );
            opc.put_xml_part(XmlPart::load(
                sst_name.clone(),
                sst_part.content_type().to_string(),
                blob,
            )?)?;
            rewritten.push(sst_name);
        }

        Ok(rewritten)
    }
}

impl SubstitutionEngine for XlsxSubstitutor {
    fn kind(&self) -> TemplateKind {
        TemplateKind::Xlsx
    }

    fn generate_with_report(
        &self,
        template: &[u8],
        placeholders: &PlaceholderMap,
    ) -> Result<(Vec<u8>, SubstitutionReport)> {
        self.generate_from(XlsxTemplate::from_bytes(template, &self.options)?, placeholders)
    }
}

impl XlsxSubstitutor {
    /// Substitute into an already opened template and serialize it.
    pub fn generate_from(
        &self,
        mut template: XlsxTemplate,
        placeholders: &PlaceholderMap,
    ) -> Result<(Vec<u8>, SubstitutionReport)> {
        let replacer = Replacer::new(placeholders)?;
        let mut tally = replacer.tally();

        let rewritten = self.substitute(&mut template, &replacer, &mut tally)?;
        let output = template.save()?;

        let report = SubstitutionReport::new(TemplateKind::Xlsx, &replacer, &tally, rewritten);
        tracing::info!(
            replacements = report.total(),
            parts = report.rewritten_parts().len(),
            "generated Excel document"
        );
        Ok((output, report))
    }
}

/// Result of scanning a worksheet.
#[derive(Debug, Default)]
struct CellScan {
    /// New text per shared string index
    updates: BTreeMap<usize, String>,
    /// Edits to the worksheet part
    splices: Vec<Splice>,
    inlined: usize,
}

/// A `c` element being read.
struct OpenCell {
    reference: String,
    prefix: Option<String>,
    /// Bytes of the start tag
    tag: Range<usize>,
    /// Start tag with `t="inlineStr"`, built only for shared-string cells
    inline_tag: Option<Vec<u8>>,
    /// Whole `v` element, and its content
    value: Option<(Range<usize>, Range<usize>)>,
    value_start: Option<(usize, usize)>,
}

/// Render `start` again with its `t` attribute replaced by `t="inlineStr"`.
fn inline_start_tag(start: &BytesStart<'_>) -> Vec<u8> {
    let mut out = Vec::with_capacity(start.len() + 16);
    out.push(b'<');
    out.extend_from_slice(start.name().as_ref());
    for attr in start.attributes().with_checks(false).flatten() {
        if attr.key.as_ref() == b"t" {
            continue;
        }
        let quote = if attr.value.contains(&b'"') { b'\'' } else { b'"' };
        out.push(b' ');
        out.extend_from_slice(attr.key.as_ref());
        out.push(b'=');
        out.push(quote);
        out.extend_from_slice(&attr.value);
        out.push(quote);
    }
    out.extend_from_slice(br#" t="inlineStr">"#);
    out
}

/// Whether the cell's `t` attribute says shared string.
fn is_shared_string_cell(start: &BytesStart<'_>) -> bool {
    start
        .attributes()
        .with_checks(false)
        .flatten()
        .any(|attr| attr.key.as_ref() == b"t" && attr.value.as_ref() == b"s")
}

fn cell_reference(start: &BytesStart<'_>) -> String {
    start
        .attributes()
        .with_checks(false)
        .flatten()
        .find(|attr| attr.key.as_ref() == b"r")
        .map(|attr| String::from_utf8_lossy(&attr.value).into_owned())
        .unwrap_or_default()
}

fn scan_cells(
    sheet: &XmlPart,
    table: &SharedStringTable,
    replacer: &Replacer,
    tally: &mut MatchTally,
    options: &SubstitutionOptions,
) -> Result<CellScan> {
    let mut scan = CellScan::default();
    let src = sheet.blob();

    if replacer.is_empty() {
        return Ok(scan);
    }
    // A shared-string cell needs a quoted `s` attribute value somewhere.
    if memchr::memmem::find(src, br#""s""#).is_none()
        && memchr::memmem::find(src, b"'s'").is_none()
    {
        return Ok(scan);
    }

    let mut reader = sheet.reader();
    let base = sheet.bom_len();
    let mut open: Option<OpenCell> = None;

    loop {
        let before = base + reader.buffer_position() as usize;
        let (resolved, event) = reader
            .read_resolved_event()
            .map_err(|e| TemplateLoadError::xml(sheet.partname(), e))?;
        let in_sml = is_sml(&resolved);

        match event {
            Event::Start(ref e) if in_sml && e.local_name().as_ref() == b"c" => {
                let after = base + reader.buffer_position() as usize;
                if !is_shared_string_cell(e) {
                    continue;
                }
                open = Some(OpenCell {
                    reference: cell_reference(e),
                    prefix: e
                        .name()
                        .prefix()
                        .map(|p| String::from_utf8_lossy(p.as_ref()).into_owned()),
                    tag: before..after,
                    inline_tag: options.inline_rewritten_cells.then(|| inline_start_tag(e)),
                    value: None,
                    value_start: None,
                });
            },
            Event::Start(ref e) if in_sml && e.local_name().as_ref() == b"v" => {
                if let Some(cell) = open.as_mut() {
                    cell.value_start = Some((before, base + reader.buffer_position() as usize));
                }
            },
            Event::End(ref e) if in_sml && e.local_name().as_ref() == b"v" => {
                if let Some(cell) = open.as_mut()
                    && let Some((outer_start, inner_start)) = cell.value_start.take()
                {
                    let after = base + reader.buffer_position() as usize;
                    cell.value = Some((outer_start..after, inner_start..before));
                }
            },
            Event::End(ref e) if in_sml && e.local_name().as_ref() == b"c" => {
                if let Some(cell) = open.take() {
                    visit_cell(cell, src, table, replacer, tally, options, &mut scan);
                }
            },
            Event::Eof => break,
            _ => {},
        }
    }

    Ok(scan)
}

fn visit_cell(
    cell: OpenCell,
    src: &[u8],
    table: &SharedStringTable,
    replacer: &Replacer,
    tally: &mut MatchTally,
    options: &SubstitutionOptions,
    scan: &mut CellScan,
) {
    let Some((value_element, value_content)) = cell.value else {
        return;
    };

    let Ok(index) = atoi_simd::parse::<u32, false, false>(src[value_content].trim_ascii()) else {
        tracing::warn!(cell = %cell.reference, "skipping cell with unparsable shared string index");
        return;
    };
    let index = index as usize;

    let Some(entry) = table.get(index) else {
        tracing::warn!(
            cell = %cell.reference,
            index,
            entries = table.len(),
            "skipping cell with out-of-range shared string index"
        );
        return;
    };
    if !entry.is_rewritable() {
        tracing::debug!(cell = %cell.reference, index, "shared string holds CDATA, left as is");
        return;
    }

    let Some(replaced) = replacer.replace(entry.text(), tally) else {
        return;
    };

    if let Some(inline_tag) = cell.inline_tag {
        let prefix = cell.prefix.as_deref();
        let is = qualified(prefix, "is");
        let text = text_element(prefix, &replaced, options.preserve_space);
        let inline_value = format!("<{is}>{text}</{is}>");
        scan.splices.push(Splice::new(cell.tag, inline_tag));
        scan.splices.push(Splice::new(value_element, inline_value));
        scan.inlined += 1;
    }
    scan.updates.entry(index).or_insert(replaced);
}
