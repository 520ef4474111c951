//! In-memory fixtures for tests: minimal but well-formed Word and Excel
//! packages, and helpers to look inside the produced documents.

use std::collections::HashMap;
use std::io::{Cursor, Read, Write};

use quick_xml::Reader;
use quick_xml::events::Event;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::common::PlaceholderMap;
use crate::common::xml::{escape_text, needs_space_preserve, unescape_text};
use crate::ooxml::opc::constants::{content_type as ct, relationship_type as rt};
use crate::ooxml::opc::part::UTF8_BOM;
use crate::ooxml::opc::{PackURI, XmlPart};
use crate::ooxml::xlsx::SharedStringTable;

const CT_NS: &str = "http://schemas.openxmlformats.org/package/2006/content-types";
const REL_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const S_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const R_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const XML_DECL: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;
const WML_STYLES: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml";
const SML_STYLES: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml";
const STYLES_REL: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";
const IMAGE_REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";

/// Build a deflated ZIP archive from `(name, content)` pairs, in order.
pub fn build_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    for (name, bytes) in entries {
        zip.start_file(*name, options).unwrap();
        zip.write_all(bytes).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

/// Every member of an archive, inflated, in archive order.
pub fn zip_entries(bytes: &[u8]) -> Vec<(String, Vec<u8>)> {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
    (0..archive.len())
        .map(|i| {
            let mut file = archive.by_index(i).unwrap();
            let mut content = Vec::new();
            file.read_to_end(&mut content).unwrap();
            (file.name().to_string(), content)
        })
        .collect()
}

/// One member of an archive, inflated.
pub fn read_member(bytes: &[u8], name: &str) -> Vec<u8> {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut file = archive.by_name(name).unwrap();
    let mut content = Vec::new();
    file.read_to_end(&mut content).unwrap();
    content
}

/// Rebuild `package` with a UTF-8 byte order mark in front of each member
/// named in `members`.
pub fn with_bom(package: &[u8], members: &[&str]) -> Vec<u8> {
    rebuild(package, |name, bytes| {
        if members.contains(&name) {
            [UTF8_BOM, bytes.as_slice()].concat()
        } else {
            bytes
        }
    })
}

/// Rebuild `package` with every `from` in `member` replaced by `to`.
pub fn patch_member(package: &[u8], member: &str, from: &str, to: &str) -> Vec<u8> {
    rebuild(package, |name, bytes| {
        if name == member {
            String::from_utf8(bytes).unwrap().replace(from, to).into_bytes()
        } else {
            bytes
        }
    })
}

fn rebuild(package: &[u8], mut edit: impl FnMut(&str, Vec<u8>) -> Vec<u8>) -> Vec<u8> {
    let entries: Vec<(String, Vec<u8>)> = zip_entries(package)
        .into_iter()
        .map(|(name, bytes)| {
            let bytes = edit(name.as_str(), bytes);
            (name, bytes)
        })
        .collect();
    let refs: Vec<(&str, &[u8])> = entries
        .iter()
        .map(|(name, bytes)| (name.as_str(), bytes.as_slice()))
        .collect();
    build_zip(&refs)
}

pub fn placeholders(pairs: &[(&str, &str)]) -> PlaceholderMap {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Decoded text of every element whose local name is `t`, in document order.
pub fn run_texts(xml: &[u8]) -> Vec<String> {
    texts_where(xml, |_| true)
}

fn texts_where(xml: &[u8], mut keep: impl FnMut(usize) -> bool) -> Vec<String> {
    let xml = xml.strip_prefix(UTF8_BOM).unwrap_or(xml);
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(false);
    let mut texts = Vec::new();
    let mut start = None;
    let mut seen = 0;
    loop {
        let before = reader.buffer_position() as usize;
        match reader.read_event().unwrap() {
            Event::Start(e) if e.local_name().as_ref() == b"t" => {
                start = Some(reader.buffer_position() as usize);
            },
            Event::Empty(e) if e.local_name().as_ref() == b"t" => {
                if keep(seen) {
                    texts.push(String::new());
                }
                seen += 1;
            },
            Event::End(e) if e.local_name().as_ref() == b"t" => {
                if let Some(s) = start.take() {
                    if keep(seen) {
                        texts.push(unescape_text(&xml[s..before]).unwrap().into_owned());
                    }
                    seen += 1;
                }
            },
            Event::Eof => break,
            _ => {},
        }
    }
    texts
}

/// The text a spreadsheet cell displays, resolving shared strings.
///
/// `None` if the worksheet has no cell `reference`.
pub fn cell_text(xlsx: &[u8], sheet_file: &str, reference: &str) -> Option<String> {
    let member = read_member(xlsx, &format!("xl/worksheets/{sheet_file}"));
    let sheet = member.strip_prefix(UTF8_BOM).unwrap_or(&member[..]);
    let mut reader = Reader::from_reader(sheet);
    reader.config_mut().trim_text(false);

    let mut in_cell = false;
    let mut cell_type = String::new();
    let mut content_start = None;
    let mut text = String::new();
    loop {
        let before = reader.buffer_position() as usize;
        match reader.read_event().unwrap() {
            Event::Start(e) if e.local_name().as_ref() == b"c" => {
                let attr = |name: &[u8]| {
                    e.attributes()
                        .flatten()
                        .find(|a| a.key.as_ref() == name)
                        .map(|a| String::from_utf8(a.value.to_vec()).unwrap())
                };
                in_cell = attr(b"r").as_deref() == Some(reference);
                cell_type = attr(b"t").unwrap_or_default();
            },
            Event::Start(e)
                if in_cell && matches!(e.local_name().as_ref(), b"t" | b"v") =>
            {
                content_start = Some(reader.buffer_position() as usize);
            },
            Event::End(e) if in_cell && matches!(e.local_name().as_ref(), b"t" | b"v") => {
                if let Some(s) = content_start.take() {
                    text.push_str(&unescape_text(&sheet[s..before]).unwrap());
                }
            },
            Event::End(e) if in_cell && e.local_name().as_ref() == b"c" => break,
            Event::Eof => return None,
            _ => {},
        }
    }

    if cell_type != "s" {
        return Some(text);
    }
    let index: usize = text.trim().parse().unwrap();
    let sst = XmlPart::load(
        PackURI::new("/xl/sharedStrings.xml").unwrap(),
        ct::SML_SHARED_STRINGS.to_string(),
        read_member(xlsx, "xl/sharedStrings.xml"),
    )
    .unwrap();
    let table = SharedStringTable::parse(&sst).unwrap();
    Some(table.get(index).unwrap().text().to_string())
}

fn text_run(text: &str, bold: bool) -> String {
    let props = if bold { "<w:rPr><w:b/></w:rPr>" } else { "" };
    let space = if needs_space_preserve(text) { r#" xml:space="preserve""# } else { "" };
    format!("<w:r>{props}<w:t{space}>{}</w:t></w:r>", escape_text(text))
}

fn relationship(id: &str, reltype: &str, target: &str) -> String {
    format!(r#"<Relationship Id="{id}" Type="{reltype}" Target="{target}"/>"#)
}

fn override_ct(partname: &str, content_type: &str) -> String {
    format!(r#"<Override PartName="{partname}" ContentType="{content_type}"/>"#)
}

fn content_types(overrides: &[String]) -> String {
    format!(
        r#"{XML_DECL}<Types xmlns="{CT_NS}"><Default Extension="rels" ContentType="{}"/><Default Extension="xml" ContentType="application/xml"/><Default Extension="png" ContentType="image/png"/>{}</Types>"#,
        ct::OPC_RELATIONSHIPS,
        overrides.concat()
    )
}

fn package_rels(main: &str) -> String {
    format!(
        r#"{XML_DECL}<Relationships xmlns="{REL_NS}">{}</Relationships>"#,
        relationship("rId1", rt::OFFICE_DOCUMENT, main)
    )
}

/// Builds a minimal Word document.
///
/// With no calls besides `build`, the package holds exactly five parts:
/// content types, package relationships, the body, its relationships and the
/// styles part.
#[derive(Default)]
pub struct DocxBuilder {
    paragraphs: Vec<String>,
    headers: Vec<String>,
    footers: Vec<String>,
    dangling_headers: Vec<String>,
    images: Vec<(String, Vec<u8>)>,
}

impl DocxBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A paragraph with a single run.
    pub fn paragraph(mut self, text: &str) -> Self {
        self.paragraphs.push(format!("<w:p>{}</w:p>", text_run(text, false)));
        self
    }

    /// A paragraph made of several runs, optionally bold.
    pub fn runs(mut self, runs: &[(&str, bool)]) -> Self {
        let runs: String = runs.iter().map(|(text, bold)| text_run(text, *bold)).collect();
        self.paragraphs.push(format!("<w:p>{runs}</w:p>"));
        self
    }

    /// A header part (`word/headerN.xml`) with one paragraph.
    pub fn header(mut self, text: &str) -> Self {
        self.headers.push(text.to_string());
        self
    }

    /// A footer part (`word/footerN.xml`) with one paragraph.
    pub fn footer(mut self, text: &str) -> Self {
        self.footers.push(text.to_string());
        self
    }

    /// A header relationship whose target is not in the package.
    pub fn dangling_header(mut self, target: &str) -> Self {
        self.dangling_headers.push(target.to_string());
        self
    }

    pub fn image(mut self, name: &str, bytes: &[u8]) -> Self {
        self.images.push((name.to_string(), bytes.to_vec()));
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut overrides = vec![
            override_ct("/word/document.xml", ct::WML_DOCUMENT_MAIN),
            override_ct("/word/styles.xml", WML_STYLES),
        ];
        let mut rels = vec![relationship("rId1", STYLES_REL, "styles.xml")];
        let mut sect_refs = String::new();
        let mut extra: Vec<(String, Vec<u8>)> = Vec::new();

        let story = |root: &str, text: &str| {
            format!(
                r#"{XML_DECL}<w:{root} xmlns:w="{W_NS}" xmlns:r="{R_NS}"><w:p>{}</w:p></w:{root}>"#,
                text_run(text, false)
            )
        };

        for (kind, texts, reltype, content_type, root, reference) in [
            ("header", &self.headers, rt::HEADER, ct::WML_HEADER, "hdr", "headerReference"),
            ("footer", &self.footers, rt::FOOTER, ct::WML_FOOTER, "ftr", "footerReference"),
        ] {
            for (i, text) in texts.iter().enumerate() {
                let file = format!("{kind}{}.xml", i + 1);
                let id = format!("rId{}", rels.len() + 1);
                overrides.push(override_ct(&format!("/word/{file}"), content_type));
                rels.push(relationship(&id, reltype, &file));
                sect_refs.push_str(&format!(r#"<w:{reference} w:type="default" r:id="{id}"/>"#));
                extra.push((format!("word/{file}"), story(root, text).into_bytes()));
            }
        }
        for target in &self.dangling_headers {
            let id = format!("rId{}", rels.len() + 1);
            rels.push(relationship(&id, rt::HEADER, target));
        }
        for (name, bytes) in &self.images {
            let id = format!("rId{}", rels.len() + 1);
            let target = name.strip_prefix("word/").unwrap_or(name);
            rels.push(relationship(&id, IMAGE_REL, target));
            extra.push((name.clone(), bytes.clone()));
        }

        let document = format!(
            r#"{XML_DECL}<w:document xmlns:w="{W_NS}" xmlns:r="{R_NS}"><w:body>{}<w:sectPr>{sect_refs}</w:sectPr></w:body></w:document>"#,
            self.paragraphs.concat()
        );
        let document_rels = format!(
            r#"{XML_DECL}<Relationships xmlns="{REL_NS}">{}</Relationships>"#,
            rels.concat()
        );
        let styles = format!(
            r#"{XML_DECL}<w:styles xmlns:w="{W_NS}"><w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/></w:style></w:styles>"#
        );

        let mut entries: Vec<(String, Vec<u8>)> = vec![
            ("[Content_Types].xml".into(), content_types(&overrides).into_bytes()),
            ("_rels/.rels".into(), package_rels("word/document.xml").into_bytes()),
            ("word/document.xml".into(), document.into_bytes()),
            ("word/_rels/document.xml.rels".into(), document_rels.into_bytes()),
            ("word/styles.xml".into(), styles.into_bytes()),
        ];
        entries.extend(extra);

        let refs: Vec<(&str, &[u8])> = entries
            .iter()
            .map(|(name, bytes)| (name.as_str(), bytes.as_slice()))
            .collect();
        build_zip(&refs)
    }
}

/// Builds a minimal Excel workbook.
///
/// Cells added through [`XlsxBuilder::sheet`] are shared-string cells with
/// style `1`; identical texts share one table entry.
pub struct XlsxBuilder {
    sheets: Vec<(String, String)>,
    strings: Vec<String>,
    interned: HashMap<String, usize>,
    shared_strings: bool,
}

impl Default for XlsxBuilder {
    fn default() -> Self {
        Self {
            sheets: Vec::new(),
            strings: Vec::new(),
            interned: HashMap::new(),
            shared_strings: true,
        }
    }
}

impl XlsxBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a plain shared string, returning the builder; identical texts are
    /// stored once.
    pub fn shared_string(mut self, text: &str) -> Self {
        self.intern(text);
        self
    }

    /// Add a shared string entry from raw `si` content (rich runs and so on).
    pub fn raw_shared_string(mut self, inner_xml: &str) -> Self {
        self.strings.push(inner_xml.to_string());
        self
    }

    fn intern(&mut self, text: &str) -> usize {
        if let Some(&index) = self.interned.get(text) {
            return index;
        }
        let space = if needs_space_preserve(text) { r#" xml:space="preserve""# } else { "" };
        self.strings.push(format!("<t{space}>{}</t>", escape_text(text)));
        self.interned.insert(text.to_string(), self.strings.len() - 1);
        self.strings.len() - 1
    }

    /// A worksheet whose cells all hold shared strings.
    pub fn sheet(mut self, name: &str, cells: &[(&str, &str)]) -> Self {
        let xml: String = cells
            .iter()
            .map(|(reference, text)| {
                let index = self.intern(text);
                format!(r#"<c r="{reference}" s="1" t="s"><v>{index}</v></c>"#)
            })
            .collect();
        self.sheets.push((name.to_string(), xml));
        self
    }

    /// A worksheet with raw cell markup for row 1.
    pub fn raw_sheet(mut self, name: &str, cells_xml: &str) -> Self {
        self.sheets.push((name.to_string(), cells_xml.to_string()));
        self
    }

    pub fn without_shared_strings(mut self) -> Self {
        self.shared_strings = false;
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut overrides = vec![
            override_ct("/xl/workbook.xml", ct::SML_SHEET_MAIN),
            override_ct("/xl/styles.xml", SML_STYLES),
        ];
        let mut rels = Vec::new();
        let mut sheet_elements = String::new();
        let mut sheet_parts = Vec::new();

        for (i, (name, cells)) in self.sheets.iter().enumerate() {
            let n = i + 1;
            overrides.push(override_ct(&format!("/xl/worksheets/sheet{n}.xml"), ct::SML_WORKSHEET));
            rels.push(relationship(
                &format!("rId{n}"),
                rt::WORKSHEET,
                &format!("worksheets/sheet{n}.xml"),
            ));
            sheet_elements.push_str(&format!(
                r#"<sheet name="{}" sheetId="{n}" r:id="rId{n}"/>"#,
                escape_text(name)
            ));
            sheet_parts.push((
                format!("xl/worksheets/sheet{n}.xml"),
                format!(
                    r#"{XML_DECL}<worksheet xmlns="{S_NS}" xmlns:r="{R_NS}"><sheetData><row r="1">{cells}</row></sheetData></worksheet>"#
                )
                .into_bytes(),
            ));
        }

        let styles_id = format!("rId{}", self.sheets.len() + 1);
        rels.push(relationship(&styles_id, STYLES_REL, "styles.xml"));
        if self.shared_strings {
            let sst_id = format!("rId{}", self.sheets.len() + 2);
            rels.push(relationship(&sst_id, rt::SHARED_STRINGS, "sharedStrings.xml"));
            overrides.push(override_ct("/xl/sharedStrings.xml", ct::SML_SHARED_STRINGS));
        }

        let workbook = format!(
            r#"{XML_DECL}<workbook xmlns="{S_NS}" xmlns:r="{R_NS}"><sheets>{sheet_elements}</sheets></workbook>"#
        );
        let workbook_rels = format!(
            r#"{XML_DECL}<Relationships xmlns="{REL_NS}">{}</Relationships>"#,
            rels.concat()
        );
        let styles = format!(
            r#"{XML_DECL}<styleSheet xmlns="{S_NS}"><cellXfs count="2"><xf numFmtId="0"/><xf numFmtId="4"/></cellXfs></styleSheet>"#
        );

        let mut entries: Vec<(String, Vec<u8>)> = vec![
            ("[Content_Types].xml".into(), content_types(&overrides).into_bytes()),
            ("_rels/.rels".into(), package_rels("xl/workbook.xml").into_bytes()),
            ("xl/workbook.xml".into(), workbook.into_bytes()),
            ("xl/_rels/workbook.xml.rels".into(), workbook_rels.into_bytes()),
            ("xl/styles.xml".into(), styles.into_bytes()),
        ];
        entries.extend(sheet_parts);
        if self.shared_strings {
            let items: String = self.strings.iter().map(|si| format!("<si>{si}</si>")).collect();
            let sst = format!(
                r#"{XML_DECL}<sst xmlns="{S_NS}" count="{n}" uniqueCount="{n}">{items}</sst>"#,
                n = self.strings.len()
            );
            entries.push(("xl/sharedStrings.xml".into(), sst.into_bytes()));
        }

        let refs: Vec<(&str, &[u8])> = entries
            .iter()
            .map(|(name, bytes)| (name.as_str(), bytes.as_slice()))
            .collect();
        build_zip(&refs)
    }
}
