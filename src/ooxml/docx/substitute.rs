//! Run-level text substitution for WordprocessingML parts.
//!
//! Each `w:t` element is one text node. Its character data is decoded, passed
//! through the [`Replacer`], and if the text changed the escaped result is
//! spliced over the original character data. Markup outside rewritten `w:t`
//! elements is never re-serialized.
//!
//! A placeholder split over two runs (for instance because half of it is bold)
//! is not found. Word splits runs freely when formatting changes, so template
//! authors should type each placeholder in one go.

use std::ops::Range;

use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};

use crate::common::xml::{
    Splice, apply_splices, escape_text, needs_space_preserve, unescape_text,
};
use crate::common::{MatchTally, PlaceholderMap, Replacer};
use crate::config::SubstitutionOptions;
use crate::ooxml::docx::package::DocxTemplate;
use crate::ooxml::error::{Result, TemplateLoadError};
use crate::ooxml::opc::PackURI;
use crate::ooxml::opc::constants::namespace as ns;
use crate::ooxml::opc::part::XmlPart;
use crate::template::{SubstitutionEngine, SubstitutionReport, TemplateKind};

/// Substitutes placeholders in the body, headers and footers of Word templates.
#[derive(Debug, Clone, Default)]
pub struct DocxSubstitutor {
    options: SubstitutionOptions,
}

impl DocxSubstitutor {
    pub fn new(options: SubstitutionOptions) -> Self {
        Self { options }
    }

    #[inline]
    pub fn options(&self) -> &SubstitutionOptions {
        &self.options
    }

    /// Rewrite every text part of `template` in place.
    ///
    /// Returns the parts that were changed.
    pub fn substitute(
        &self,
        template: &mut DocxTemplate,
        replacer: &Replacer,
        tally: &mut MatchTally,
    ) -> Result<Vec<PackURI>> {
        let parts: Vec<PackURI> = template.text_parts().cloned().collect();
        let mut rewritten = Vec::new();

        for partname in parts {
            let opc = template.opc_package_mut();
            let part = opc.xml_part(&partname)?;
            if let Some(blob) = substitute_runs(&part, replacer, tally, &self.options)? {
                tracing::debug!(part = %partname, "rewrote run text");
                opc.put_xml_part(XmlPart::load(
                    partname.clone(),
                    part.content_type().to_string(),
                    blob,
                )?)?;
                rewritten.push(partname);
            }
        }

        Ok(rewritten)
    }
}

impl SubstitutionEngine for DocxSubstitutor {
    fn kind(&self) -> TemplateKind {
        TemplateKind::Docx
    }

    fn generate_with_report(
        &self,
        template: &[u8],
        placeholders: &PlaceholderMap,
    ) -> Result<(Vec<u8>, SubstitutionReport)> {
        self.generate_from(DocxTemplate::from_bytes(template, &self.options)?, placeholders)
    }
}

impl DocxSubstitutor {
    /// Substitute into an already opened template and serialize it.
    pub fn generate_from(
        &self,
        mut template: DocxTemplate,
        placeholders: &PlaceholderMap,
    ) -> Result<(Vec<u8>, SubstitutionReport)> {
        let replacer = Replacer::new(placeholders)?;
        let mut tally = replacer.tally();

        let rewritten = self.substitute(&mut template, &replacer, &mut tally)?;
        let output = template.save()?;

        let report = SubstitutionReport::new(TemplateKind::Docx, &replacer, &tally, rewritten);
        tracing::info!(
            replacements = report.total(),
            parts = report.rewritten_parts().len(),
            "generated Word document"
        );
        Ok((output, report))
    }
}

/// An open `w:t` element.
struct OpenRun {
    /// Bytes of the start tag
    tag: Range<usize>,
    content_start: usize,
    has_space_attr: bool,
    /// Cleared when the content holds CDATA, comments or processing instructions
    plain: bool,
}

#[inline]
fn is_wml(resolved: &ResolveResult<'_>) -> bool {
    matches!(
        resolved,
        ResolveResult::Bound(Namespace(uri))
            if *uri == ns::WML_MAIN.as_bytes() || *uri == ns::WML_MAIN_STRICT.as_bytes()
    )
}

fn has_space_attr(start: &BytesStart<'_>) -> bool {
    start
        .attributes()
        .with_checks(false)
        .flatten()
        .any(|attr| attr.key.as_ref() == b"xml:space")
}

/// Substitute placeholders in every run text of a WordprocessingML part.
///
/// Returns `None` if no run changed.
pub(crate) fn substitute_runs(
    part: &XmlPart,
    replacer: &Replacer,
    tally: &mut MatchTally,
    options: &SubstitutionOptions,
) -> Result<Option<Vec<u8>>> {
    if replacer.is_empty() {
        return Ok(None);
    }

    let src = part.blob();
    let mut reader = part.reader();
    let base = part.bom_len();
    let mut splices = Vec::new();
    let mut open: Option<OpenRun> = None;

    loop {
        let before = base + reader.buffer_position() as usize;
        let (resolved, event) = reader
            .read_resolved_event()
            .map_err(|e| TemplateLoadError::xml(part.partname(), e))?;
        let in_wml = is_wml(&resolved);

        match event {
            Event::Start(ref e) if in_wml && e.local_name().as_ref() == b"t" => {
                let after = base + reader.buffer_position() as usize;
                open = Some(OpenRun {
                    tag: before..after,
                    content_start: after,
                    has_space_attr: has_space_attr(e),
                    plain: true,
                });
            },
            Event::End(ref e) if in_wml && e.local_name().as_ref() == b"t" => {
                let Some(run) = open.take() else { continue };
                if !run.plain {
                    continue;
                }

                let raw = &src[run.content_start..before];
                let text =
                    unescape_text(raw).map_err(|e| TemplateLoadError::xml(part.partname(), e))?;
                let Some(replaced) = replacer.replace(&text, tally) else {
                    continue;
                };

                if options.preserve_space && !run.has_space_attr && needs_space_preserve(&replaced)
                {
                    let tag = &src[run.tag.clone()];
                    let mut rebuilt = tag[..tag.len() - 1].to_vec();
                    rebuilt.extend_from_slice(br#" xml:space="preserve">"#);
                    splices.push(Splice::new(run.tag, rebuilt));
                }
                splices.push(Splice::new(
                    run.content_start..before,
                    escape_text(&replaced).as_bytes(),
                ));
            },
            Event::CData(_) | Event::Comment(_) | Event::PI(_) => {
                if let Some(run) = open.as_mut() {
                    run.plain = false;
                }
            },
            Event::Eof => break,
            _ => {},
        }
    }

    if splices.is_empty() {
        return Ok(None);
    }
    Ok(Some(apply_splices(src, &splices)))
}
