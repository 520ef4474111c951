//! Shared strings table for Excel templates.
//!
//! Cells of type `s` carry an index into this table instead of their own text.
//! Entries are parsed together with the byte range of their content so that a
//! rewritten entry can be spliced back without touching its neighbours.

use std::collections::BTreeMap;
use std::ops::Range;

use quick_xml::events::Event;
use quick_xml::name::{Namespace, ResolveResult};

use crate::common::xml::{Splice, apply_splices, escape_text, needs_space_preserve, unescape_text};
use crate::ooxml::error::{Result, TemplateLoadError};
use crate::ooxml::opc::constants::namespace as ns;
use crate::ooxml::opc::part::XmlPart;

// Typical template tables are small; avoid the first few reallocations.
const INITIAL_ENTRIES_CAPACITY: usize = 64;

/// One `si` item of the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharedStringEntry {
    /// Concatenated text of the entry's `t` elements (phonetic runs excluded)
    text: String,

    /// Byte range of the `si` content in the part
    content: Range<usize>,

    /// Namespace prefix of the `si` element, if any
    prefix: Option<String>,

    /// Whether the entry is made of formatted runs
    rich: bool,

    /// Whether the entry holds CDATA or comments and cannot be decoded from
    /// its bytes alone
    opaque: bool,
}

impl SharedStringEntry {
    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[inline]
    pub fn is_rich(&self) -> bool {
        self.rich
    }

    /// Whether the entry can be rewritten.
    #[inline]
    pub fn is_rewritable(&self) -> bool {
        !self.opaque
    }

    #[inline]
    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }
}

/// The parsed shared strings table.
#[derive(Debug, Default)]
pub struct SharedStringTable {
    entries: Vec<SharedStringEntry>,
}

#[inline]
pub(crate) fn is_sml(resolved: &ResolveResult<'_>) -> bool {
    matches!(
        resolved,
        ResolveResult::Bound(Namespace(uri))
            if *uri == ns::SML_MAIN.as_bytes() || *uri == ns::SML_MAIN_STRICT.as_bytes()
    )
}

/// Render `prefix:local`, or just `local` when there is no prefix.
#[inline]
pub(crate) fn qualified(prefix: Option<&str>, local: &str) -> String {
    match prefix {
        Some(p) => format!("{}:{}", p, local),
        None => local.to_string(),
    }
}

/// Render a complete `t` element holding `text`.
pub(crate) fn text_element(prefix: Option<&str>, text: &str, preserve_space: bool) -> String {
    let t = qualified(prefix, "t");
    if preserve_space && needs_space_preserve(text) {
        format!("<{t} xml:space=\"preserve\">{}</{t}>", escape_text(text))
    } else {
        format!("<{t}>{}</{t}>", escape_text(text))
    }
}

impl SharedStringTable {
    /// Parse the table from the `sharedStrings.xml` part.
    pub fn parse(part: &XmlPart) -> Result<Self> {
        let src = part.blob();
        let mut reader = part.reader();
        let base = part.bom_len();
        let mut entries = Vec::with_capacity(INITIAL_ENTRIES_CAPACITY);

        let mut current: Option<SharedStringEntry> = None;
        let mut text_start: Option<usize> = None;
        let mut phonetic_depth = 0usize;

        loop {
            let before = base + reader.buffer_position() as usize;
            let (resolved, event) = reader
                .read_resolved_event()
                .map_err(|e| TemplateLoadError::xml(part.partname(), e))?;
            let in_sml = is_sml(&resolved);

            match event {
                Event::Start(ref e) if in_sml => {
                    let after = base + reader.buffer_position() as usize;
                    match e.local_name().as_ref() {
                        b"si" => {
                            let prefix = e
                                .name()
                                .prefix()
                                .map(|p| String::from_utf8_lossy(p.as_ref()).into_owned());
                            current = Some(SharedStringEntry {
                                text: String::new(),
                                content: after..after,
                                prefix,
                                rich: false,
                                opaque: false,
                            });
                        },
                        b"r" => {
                            if let Some(entry) = current.as_mut() {
                                entry.rich = true;
                            }
                        },
                        b"rPh" => phonetic_depth += 1,
                        b"t" if current.is_some() && phonetic_depth == 0 => {
                            text_start = Some(after);
                        },
                        _ => {},
                    }
                },
                Event::Empty(ref e) if in_sml && e.local_name().as_ref() == b"si" => {
                    let after = base + reader.buffer_position() as usize;
                    entries.push(SharedStringEntry {
                        text: String::new(),
                        content: after..after,
                        prefix: None,
                        rich: false,
                        // An empty item has no content range to splice into.
                        opaque: true,
                    });
                },
                Event::End(ref e) if in_sml => match e.local_name().as_ref() {
                    b"t" => {
                        if let (Some(start), Some(entry)) = (text_start.take(), current.as_mut())
                            && !entry.opaque
                        {
                            let text = unescape_text(&src[start..before])
                                .map_err(|e| TemplateLoadError::xml(part.partname(), e))?;
                            entry.text.push_str(&text);
                        }
                    },
                    b"rPh" => phonetic_depth = phonetic_depth.saturating_sub(1),
                    b"si" => {
                        if let Some(mut entry) = current.take() {
                            entry.content.end = before;
                            entries.push(entry);
                        }
                        phonetic_depth = 0;
                    },
                    _ => {},
                },
                Event::CData(_) | Event::Comment(_) | Event::PI(_) => {
                    if let Some(entry) = current.as_mut() {
                        entry.opaque = true;
                    }
                },
                Event::Eof => break,
                _ => {},
            }
        }

        tracing::debug!(part = %part.partname(), entries = entries.len(), "parsed shared strings");
        Ok(Self { entries })
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&SharedStringEntry> {
        self.entries.get(index)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SharedStringEntry> {
        self.entries.iter()
    }

    /// Produce the part bytes with the entries in `updates` replaced.
    ///
    /// Each updated entry becomes a single plain `t` element; rich formatting
    /// and phonetic runs of that entry are dropped.
    pub fn rewrite(
        &self,
        src: &[u8],
        updates: &BTreeMap<usize, String>,
        preserve_space: bool,
    ) -> Vec<u8> {
        let splices: Vec<Splice> = updates
            .iter()
            .filter_map(|(&index, text)| {
                let entry = self.entries.get(index).filter(|e| e.is_rewritable())?;
                if entry.rich {
                    tracing::debug!(index, "collapsing rich shared string");
                }
                Some(Splice::new(
                    entry.content.clone(),
                    text_element(entry.prefix(), text, preserve_space),
                ))
            })
            .collect();
        apply_splices(src, &splices)
    }
}
