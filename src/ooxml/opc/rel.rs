use crate::ooxml::opc::constants::relationship_type;
use crate::ooxml::opc::error::{OpcError, Result};
use crate::ooxml::opc::packuri::PackURI;
use crate::ooxml::opc::pkgreader::SerializedRelationship;
/// Relationship-related objects for OPC packages.
///
/// Templates are navigated, never re-linked: relationships are loaded from the
/// `.rels` parts to find the main document, headers, footers, worksheets and the
/// shared-string table, and the `.rels` parts themselves are passed through to
/// the output untouched.
use std::collections::HashMap;

/// A single relationship from a source part to a target.
///
/// Identified by an rId; either internal (pointing to another part) or external
/// (pointing to a URL).
#[derive(Debug, Clone)]
pub struct Relationship {
    /// Relationship ID (e.g., "rId1", "rId2")
    r_id: String,

    /// Relationship type URI
    reltype: String,

    /// Target reference - either a part URI or external URL
    target_ref: String,

    /// Base URI for resolving relative references
    base_uri: String,

    /// Whether this is an external relationship
    is_external: bool,
}

impl Relationship {
    pub fn new(
        r_id: String,
        reltype: String,
        target_ref: String,
        base_uri: String,
        is_external: bool,
    ) -> Self {
        Self {
            r_id,
            reltype,
            target_ref,
            base_uri,
            is_external,
        }
    }

    #[inline]
    pub fn r_id(&self) -> &str {
        &self.r_id
    }

    #[inline]
    pub fn reltype(&self) -> &str {
        &self.reltype
    }

    /// For internal relationships this is a part reference relative to the
    /// source; for external ones an absolute URL.
    #[inline]
    pub fn target_ref(&self) -> &str {
        &self.target_ref
    }

    #[inline]
    pub fn is_external(&self) -> bool {
        self.is_external
    }

    /// Get the absolute target partname for internal relationships.
    ///
    /// Returns an error if this is an external relationship.
    pub fn target_partname(&self) -> Result<PackURI> {
        if self.is_external {
            return Err(OpcError::InvalidRelationship(format!(
                "{} targets an external resource",
                self.r_id
            )));
        }
        PackURI::from_rel_ref(&self.base_uri, &self.target_ref).map_err(OpcError::InvalidPackUri)
    }
}

/// Collection of relationships from a single source.
#[derive(Debug)]
pub struct Relationships {
    /// Base URI for resolving relative references
    base_uri: String,

    /// Map of relationship ID to Relationship
    rels: HashMap<String, Relationship>,
}

impl Relationships {
    /// Create a new empty relationships collection.
    pub fn new(base_uri: String) -> Self {
        Self {
            base_uri,
            rels: HashMap::new(),
        }
    }

    /// Build the collection from relationships read out of a `.rels` part.
    pub fn from_srels<'a, I>(base_uri: &str, srels: I) -> Self
    where
        I: IntoIterator<Item = &'a SerializedRelationship>,
    {
        let mut rels = Self::new(base_uri.to_string());
        for srel in srels {
            rels.add_relationship(
                srel.reltype.clone(),
                srel.target_ref.clone(),
                srel.r_id.clone(),
                srel.is_external(),
            );
        }
        rels
    }

    /// Add a relationship to the collection, replacing any with the same rId.
    pub fn add_relationship(
        &mut self,
        reltype: String,
        target_ref: String,
        r_id: String,
        is_external: bool,
    ) {
        let rel = Relationship::new(
            r_id.clone(),
            reltype,
            target_ref,
            self.base_uri.clone(),
            is_external,
        );
        self.rels.insert(r_id, rel);
    }

    /// Get a relationship by its ID.
    #[inline]
    pub fn get(&self, r_id: &str) -> Option<&Relationship> {
        self.rels.get(r_id)
    }

    /// Get the single relationship of a specific type.
    ///
    /// Returns an error if no relationship of the type is found,
    /// or if multiple relationships of the type exist.
    pub fn part_with_reltype<'a>(&'a self, reltype: &'a str) -> Result<&'a Relationship> {
        let mut matching = self.all_with_reltype(reltype);

        match (matching.next(), matching.next()) {
            (None, _) => Err(OpcError::RelationshipNotFound(format!(
                "No relationship of type '{}'",
                reltype
            ))),
            (Some(rel), None) => Ok(rel),
            (Some(_), Some(_)) => Err(OpcError::InvalidRelationship(format!(
                "Multiple relationships of type '{}'",
                reltype
            ))),
        }
    }

    /// Iterate over every internal relationship of a specific type.
    pub fn all_with_reltype<'a>(
        &'a self,
        reltype: &'a str,
    ) -> impl Iterator<Item = &'a Relationship> + 'a {
        self.rels
            .values()
            .filter(move |rel| {
                !rel.is_external() && relationship_type::matches(rel.reltype(), reltype)
            })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rels.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::opc::constants::relationship_type as rt;

    fn sample() -> Relationships {
        let mut rels = Relationships::new("/word".to_string());
        rels.add_relationship(
            rt::HEADER.to_string(),
            "header1.xml".to_string(),
            "rId7".to_string(),
            false,
        );
        rels.add_relationship(
            rt::HEADER.to_string(),
            "header2.xml".to_string(),
            "rId8".to_string(),
            false,
        );
        rels.add_relationship(
            rt::FOOTER.to_string(),
            "footer1.xml".to_string(),
            "rId9".to_string(),
            false,
        );
        rels.add_relationship(
            "http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink".to_string(),
            "https://example.com".to_string(),
            "rId10".to_string(),
            true,
        );
        rels
    }

    #[test]
    fn test_relationship_target_partname() {
        let rels = sample();
        let rel = rels.get("rId9").unwrap();
        assert_eq!(rel.target_partname().unwrap().as_str(), "/word/footer1.xml");
        assert!(rels.get("rId10").unwrap().target_partname().is_err());
    }

    #[test]
    fn test_part_with_reltype() {
        let rels = sample();
        assert_eq!(rels.part_with_reltype(rt::FOOTER).unwrap().r_id(), "rId9");
        assert!(matches!(
            rels.part_with_reltype(rt::HEADER),
            Err(OpcError::InvalidRelationship(_))
        ));
        assert!(matches!(
            rels.part_with_reltype(rt::WORKSHEET),
            Err(OpcError::RelationshipNotFound(_))
        ));
    }

    #[test]
    fn test_part_with_reltype_strict_spelling() {
        let mut rels = Relationships::new("/xl".to_string());
        rels.add_relationship(
            "http://purl.oclc.org/ooxml/officeDocument/relationships/sharedStrings".to_string(),
            "sharedStrings.xml".to_string(),
            "rId3".to_string(),
            false,
        );
        let wanted = rt::SHARED_STRINGS.to_string();
        let rel = rels.part_with_reltype(&wanted).unwrap();
        assert_eq!(rel.target_partname().unwrap().as_str(), "/xl/sharedStrings.xml");
    }

    #[test]
    fn test_all_with_reltype() {
        let rels = sample();
        let mut headers: Vec<&str> = rels
            .all_with_reltype(rt::HEADER)
            .map(|r| r.target_ref())
            .collect();
        headers.sort_unstable();
        assert_eq!(headers, ["header1.xml", "header2.xml"]);
        assert_eq!(rels.len(), 4);
    }
}
