use crate::ooxml::opc::error::{OpcError, Result};
use crate::ooxml::opc::packuri::PackURI;
use quick_xml::NsReader;

/// UTF-8 byte order mark some producers write at the start of XML parts.
pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";
/// Open Packaging Convention (OPC) objects related to package parts.
///
/// Only XML parts are ever loaded as objects: they are the parts holding text
/// nodes. Every other part (images, embedded binaries, fonts) is never inflated
/// and travels from the template to the output as raw ZIP data.

/// An XML part loaded out of a package for scanning or rewriting.
#[derive(Debug, Clone)]
pub struct XmlPart {
    /// The partname (URI) of this part
    partname: PackURI,

    /// The content type of this part
    content_type: String,

    /// The XML content as raw UTF-8 bytes
    xml_bytes: Vec<u8>,

    /// Length of the leading byte order mark, 0 or 3
    bom_len: usize,
}

impl XmlPart {
    /// Load an XML part from raw data, validating that it is UTF-8.
    pub fn load(partname: PackURI, content_type: String, xml_bytes: Vec<u8>) -> Result<Self> {
        std::str::from_utf8(&xml_bytes)
            .map_err(|e| OpcError::XmlError(format!("Invalid UTF-8 in {}: {}", partname, e)))?;

        let bom_len = if xml_bytes.starts_with(UTF8_BOM) { UTF8_BOM.len() } else { 0 };
        Ok(Self {
            partname,
            content_type,
            xml_bytes,
            bom_len,
        })
    }

    #[inline]
    pub fn partname(&self) -> &PackURI {
        &self.partname
    }

    #[inline]
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    #[inline]
    pub fn blob(&self) -> &[u8] {
        &self.xml_bytes
    }

    /// Consume the part, returning its XML bytes.
    #[inline]
    pub fn into_blob(self) -> Vec<u8> {
        self.xml_bytes
    }

    /// Number of bytes taken by a leading byte order mark.
    ///
    /// The reader starts after the mark, so positions it reports are relative
    /// to `blob()[bom_len()..]`; add this to get offsets into [`Self::blob`].
    #[inline]
    pub fn bom_len(&self) -> usize {
        self.bom_len
    }

    /// Get a namespace-aware reader over the XML content, past any byte
    /// order mark.
    ///
    /// Text is never trimmed: byte offsets reported by the reader must line up
    /// with the stored bytes so that text nodes can be spliced in place.
    pub fn reader(&self) -> NsReader<&[u8]> {
        let mut reader = NsReader::from_reader(&self.xml_bytes[self.bom_len..]);
        reader.config_mut().trim_text(false);
        reader
    }

    /// Check if a content type represents XML content.
    #[inline]
    pub fn is_xml_content_type(content_type: &str) -> bool {
        content_type.ends_with("+xml") || content_type.ends_with("/xml")
    }
}
