//! Provides a general interface to a physical OPC package (ZIP file).
//!
//! This module handles the low-level reading and writing of OPC packages as ZIP
//! archives. The reader keeps a private copy of the container bytes and inflates
//! members on demand; the writer either re-deflates a rewritten part or copies an
//! untouched member verbatim (compressed bytes, CRC and timestamps included).

use crate::ooxml::opc::error::{OpcError, Result};
use crate::ooxml::opc::packuri::{CONTENT_TYPES_URI, PackURI};
use std::collections::HashMap;
use std::io::{Cursor, Read, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipArchive, ZipWriter};

/// Local file header signature every ZIP container starts with.
pub const ZIP_SIGNATURE: &[u8] = &[0x50, 0x4B, 0x03, 0x04];

/// Metadata of one ZIP member, captured once when the archive is opened.
#[derive(Debug, Clone)]
pub struct EntryMeta {
    /// Member name exactly as stored in the archive
    pub name: String,
    pub is_dir: bool,
    pub compression: CompressionMethod,
    pub last_modified: Option<DateTime>,
    /// Declared uncompressed size
    pub size: u64,
}

/// Physical package reader over an owned copy of the container bytes.
pub struct PhysPkgReader {
    archive: ZipArchive<Cursor<Vec<u8>>>,

    /// Members in archive order
    entries: Vec<EntryMeta>,

    /// Lowercased member name to entry index; OPC part names are case-insensitive
    index: HashMap<String, usize>,

    /// Upper bound for the inflated size of any single member
    max_part_bytes: u64,
}

impl PhysPkgReader {
    /// Open an OPC package from a file path.
    ///
    /// # Errors
    /// Returns an error if the file doesn't exist, isn't a valid ZIP file,
    /// or cannot be read.
    pub fn open<P: AsRef<Path>>(path: P, max_part_bytes: u64) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(OpcError::PackageNotFound(path.display().to_string()));
        }

        let data = std::fs::read(path)?;
        Self::from_bytes(data, max_part_bytes)
    }

    /// Create a reader from a reader, buffering the whole container.
    pub fn from_reader<R: Read>(mut reader: R, max_part_bytes: u64) -> Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::from_bytes(data, max_part_bytes)
    }

    /// Create a reader that owns `data`.
    pub fn from_bytes(data: Vec<u8>, max_part_bytes: u64) -> Result<Self> {
        if !data.starts_with(ZIP_SIGNATURE) {
            return Err(OpcError::NotAZipContainer);
        }

        let mut archive = ZipArchive::new(Cursor::new(data))?;
        let mut entries = Vec::with_capacity(archive.len());
        let mut index = HashMap::with_capacity(archive.len());

        for i in 0..archive.len() {
            let file = archive.by_index_raw(i)?;
            let meta = EntryMeta {
                name: file.name().to_string(),
                is_dir: file.is_dir(),
                compression: file.compression(),
                last_modified: file.last_modified(),
                size: file.size(),
            };
            if !meta.is_dir {
                index.insert(meta.name.to_ascii_lowercase(), i);
            }
            entries.push(meta);
        }

        Ok(Self {
            archive,
            entries,
            index,
            max_part_bytes,
        })
    }

    /// Find the archive index of the member backing `pack_uri`.
    #[inline]
    pub fn index_of(&self, pack_uri: &PackURI) -> Option<usize> {
        self.index
            .get(&pack_uri.membername().to_ascii_lowercase())
            .copied()
    }

    /// Get the binary content for a part by its PackURI.
    pub fn blob_for(&mut self, pack_uri: &PackURI) -> Result<Vec<u8>> {
        let index = self
            .index_of(pack_uri)
            .ok_or_else(|| OpcError::PartNotFound(pack_uri.to_string()))?;
        self.blob_at(index)
    }

    /// Inflate the member at `index`, enforcing the per-part size limit.
    ///
    /// The declared size is checked first; the actual inflated length is checked
    /// as well since the header can lie.
    pub fn blob_at(&mut self, index: usize) -> Result<Vec<u8>> {
        let limit = self.max_part_bytes;
        let file = self.archive.by_index(index)?;
        let name = file.name().to_string();

        if file.size() > limit {
            return Err(OpcError::PartTooLarge {
                part: name,
                size: file.size(),
                limit,
            });
        }

        let mut blob = Vec::with_capacity(file.size() as usize);
        file.take(limit.saturating_add(1)).read_to_end(&mut blob)?;

        if blob.len() as u64 > limit {
            return Err(OpcError::PartTooLarge {
                part: name,
                size: blob.len() as u64,
                limit,
            });
        }

        Ok(blob)
    }

    /// Get the [Content_Types].xml content.
    pub fn content_types_xml(&mut self) -> Result<Vec<u8>> {
        let content_types_uri = PackURI::new(CONTENT_TYPES_URI).map_err(OpcError::InvalidPackUri)?;
        self.blob_for(&content_types_uri)
    }

    /// Get the relationships XML for a specific source URI.
    ///
    /// Returns None if the source has no relationships part.
    pub fn rels_xml_for(&mut self, source_uri: &PackURI) -> Result<Option<Vec<u8>>> {
        let rels_uri = source_uri.rels_uri().map_err(OpcError::InvalidPackUri)?;

        match self.blob_for(&rels_uri) {
            Ok(blob) => Ok(Some(blob)),
            Err(OpcError::PartNotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Number of members in the archive, directories included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Members in archive order.
    pub fn entries(&self) -> &[EntryMeta] {
        &self.entries
    }

    /// Check if a specific member exists in the package.
    #[inline]
    pub fn contains(&self, pack_uri: &PackURI) -> bool {
        self.index_of(pack_uri).is_some()
    }
}

/// Physical package writer producing an in-memory ZIP archive.
pub struct PhysPkgWriter {
    archive: ZipWriter<Cursor<Vec<u8>>>,
}

impl PhysPkgWriter {
    pub fn new() -> Self {
        Self {
            archive: ZipWriter::new(Cursor::new(Vec::new())),
        }
    }

    /// Write a rewritten member.
    ///
    /// Stored members stay stored; anything else is deflated. The original
    /// modification time is kept when known.
    pub fn write(&mut self, meta: &EntryMeta, blob: &[u8]) -> Result<()> {
        let method = match meta.compression {
            CompressionMethod::Stored => CompressionMethod::Stored,
            _ => CompressionMethod::Deflated,
        };
        let mut options = SimpleFileOptions::default().compression_method(method);
        if let Some(modified) = meta.last_modified {
            options = options.last_modified_time(modified);
        }

        self.archive.start_file(meta.name.as_str(), options)?;
        self.archive.write_all(blob)?;
        Ok(())
    }

    /// Copy the member at `index` of `reader` without inflating it.
    pub fn raw_copy(&mut self, reader: &mut PhysPkgReader, index: usize) -> Result<()> {
        let file = reader.archive.by_index_raw(index)?;
        self.archive.raw_copy_file(file)?;
        Ok(())
    }

    /// Finish writing and return the package bytes.
    pub fn finish(self) -> Result<Vec<u8>> {
        Ok(self.archive.finish()?.into_inner())
    }
}

impl Default for PhysPkgWriter {
    fn default() -> Self {
        Self::new()
    }
}
