/// Objects that implement reading and writing OPC packages.
///
/// This module provides the main OpcPackage type: an editable, in-memory view
/// of a ZIP-packaged office document. Parts are read lazily, rewritten parts are
/// held as overrides, and saving streams every member of the original container
/// back out in its original order.
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use crate::config::DEFAULT_MAX_PART_BYTES;
use crate::ooxml::opc::constants::relationship_type;
use crate::ooxml::opc::error::{OpcError, Result};
use crate::ooxml::opc::packuri::{PACKAGE_URI, PackURI};
use crate::ooxml::opc::part::XmlPart;
use crate::ooxml::opc::phys_pkg::{PhysPkgReader, PhysPkgWriter};
use crate::ooxml::opc::pkgreader::{ContentTypeMap, parse_rels_xml};
use crate::ooxml::opc::rel::Relationships;

/// The capability set both template adapters are written against.
///
/// Parts can be listed, read and replaced, and the whole package serialized.
/// Parts are never added or removed.
pub trait PartStore {
    /// Names of every part in the package, in container order.
    fn part_names(&self) -> Vec<PackURI>;

    /// Read the current content of a part (the rewritten bytes if it was written).
    fn read_part(&mut self, partname: &PackURI) -> Result<Vec<u8>>;

    /// Replace the content of an existing part.
    fn write_part(&mut self, partname: &PackURI, blob: Vec<u8>) -> Result<()>;

    /// Serialize the package back into container bytes.
    fn save(self) -> Result<Vec<u8>>
    where
        Self: Sized;
}

/// An editable OPC package.
///
/// The package owns a private copy of the template bytes; the caller's buffer is
/// never touched. Only parts that were explicitly written differ in the output.
pub struct OpcPackage {
    /// Physical container (owns the template bytes)
    phys: PhysPkgReader,

    /// Content types from [Content_Types].xml
    content_types: ContentTypeMap,

    /// Package-level relationships
    rels: Relationships,

    /// Rewritten parts, keyed by archive index
    modified: BTreeMap<usize, Vec<u8>>,
}

impl OpcPackage {
    /// Open an OPC package from a file.
    ///
    /// # Example
    /// ```no_run
    /// use docstamp::ooxml::opc::OpcPackage;
    ///
    /// let pkg = OpcPackage::open("templates/quotation.docx").unwrap();
    /// ```
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_phys_reader(PhysPkgReader::open(path, DEFAULT_MAX_PART_BYTES)?)
    }

    /// Load an OPC package from a reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Self::from_phys_reader(PhysPkgReader::from_reader(reader, DEFAULT_MAX_PART_BYTES)?)
    }

    /// Load an OPC package from a byte slice, copying it into a private buffer.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::from_bytes_with_limit(data, DEFAULT_MAX_PART_BYTES)
    }

    /// Like [`OpcPackage::from_bytes`], with an explicit per-part size limit.
    pub fn from_bytes_with_limit(data: &[u8], max_part_bytes: u64) -> Result<Self> {
        Self::from_phys_reader(PhysPkgReader::from_bytes(data.to_vec(), max_part_bytes)?)
    }

    fn from_phys_reader(mut phys: PhysPkgReader) -> Result<Self> {
        let content_types = ContentTypeMap::from_xml(&phys.content_types_xml()?)?;

        let package_uri = PackURI::new(PACKAGE_URI).map_err(OpcError::InvalidPackUri)?;
        let rels = match phys.rels_xml_for(&package_uri)? {
            Some(xml) => Relationships::from_srels(
                package_uri.base_uri(),
                parse_rels_xml(&xml, package_uri.base_uri())?.iter(),
            ),
            None => Relationships::new(package_uri.base_uri().to_string()),
        };

        tracing::debug!(
            members = phys.len(),
            content_types = content_types.len(),
            package_rels = rels.len(),
            "opened OPC package"
        );

        Ok(Self {
            phys,
            content_types,
            rels,
            modified: BTreeMap::new(),
        })
    }

    /// Get the partname of the main document part.
    ///
    /// For Word documents, this is the document.xml part.
    /// For Excel, the workbook.xml part.
    pub fn main_document_partname(&self) -> Result<PackURI> {
        let rel = self.rels.part_with_reltype(relationship_type::OFFICE_DOCUMENT)?;
        let partname = rel.target_partname()?;
        if !self.contains_part(&partname) {
            return Err(OpcError::PartNotFound(partname.to_string()));
        }
        Ok(partname)
    }

    /// Get the content type of a part.
    pub fn content_type(&self, partname: &PackURI) -> Result<&str> {
        self.content_types.get(partname)
    }

    /// Load a part as XML, checking its content type is an XML one.
    pub fn xml_part(&mut self, partname: &PackURI) -> Result<XmlPart> {
        let content_type = self.content_type(partname)?.to_string();
        if !XmlPart::is_xml_content_type(&content_type) {
            return Err(OpcError::XmlError(format!(
                "{} has non-XML content type {}",
                partname, content_type
            )));
        }
        let blob = self.read_part(partname)?;
        XmlPart::load(partname.clone(), content_type, blob)
    }

    /// Store a rewritten XML part.
    pub fn put_xml_part(&mut self, part: XmlPart) -> Result<()> {
        let partname = part.partname().clone();
        self.write_part(&partname, part.into_blob())
    }

    /// Load the relationships whose source is `partname`.
    ///
    /// A part without a `.rels` part has no relationships; that is not an error.
    pub fn part_rels(&mut self, partname: &PackURI) -> Result<Relationships> {
        let base_uri = partname.base_uri();
        match self.phys.rels_xml_for(partname)? {
            Some(xml) => Ok(Relationships::from_srels(
                base_uri,
                parse_rels_xml(&xml, base_uri)?.iter(),
            )),
            None => Ok(Relationships::new(base_uri.to_string())),
        }
    }

    /// Get a reference to the package-level relationships.
    pub fn rels(&self) -> &Relationships {
        &self.rels
    }

    /// Check if a part exists in the package.
    pub fn contains_part(&self, partname: &PackURI) -> bool {
        self.phys.contains(partname)
    }

    /// Number of parts (directory members excluded).
    pub fn part_count(&self) -> usize {
        self.phys.entries().iter().filter(|e| !e.is_dir).count()
    }

    /// Partnames of the parts written since the package was opened.
    pub fn modified_parts(&self) -> Vec<PackURI> {
        let entries = self.phys.entries();
        self.modified
            .keys()
            .map(|&i| PackURI::from_membername(&entries[i].name))
            .collect()
    }

    pub fn is_modified(&self) -> bool {
        !self.modified.is_empty()
    }
}

impl PartStore for OpcPackage {
    fn part_names(&self) -> Vec<PackURI> {
        self.phys
            .entries()
            .iter()
            .filter(|e| !e.is_dir)
            .map(|e| PackURI::from_membername(&e.name))
            .collect()
    }

    fn read_part(&mut self, partname: &PackURI) -> Result<Vec<u8>> {
        let index = self
            .phys
            .index_of(partname)
            .ok_or_else(|| OpcError::PartNotFound(partname.to_string()))?;
        match self.modified.get(&index) {
            Some(blob) => Ok(blob.clone()),
            None => self.phys.blob_at(index),
        }
    }

    fn write_part(&mut self, partname: &PackURI, blob: Vec<u8>) -> Result<()> {
        let index = self
            .phys
            .index_of(partname)
            .ok_or_else(|| OpcError::PartNotFound(partname.to_string()))?;
        self.modified.insert(index, blob);
        Ok(())
    }

    fn save(mut self) -> Result<Vec<u8>> {
        let mut writer = PhysPkgWriter::new();

        for index in 0..self.phys.len() {
            match self.modified.remove(&index) {
                Some(blob) => {
                    let meta = self.phys.entries()[index].clone();
                    tracing::debug!(
                        part = %meta.name,
                        bytes = blob.len(),
                        "writing rewritten part"
                    );
                    writer.write(&meta, &blob)?;
                },
                None => writer.raw_copy(&mut self.phys, index)?,
            }
        }

        writer.finish()
    }
}
