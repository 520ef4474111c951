/// Constant values related to the Open Packaging Convention.
///
/// This module contains the content type URIs, XML namespaces and relationship
/// types that template packages are navigated by. Both the transitional and the
/// strict ISO/IEC 29500 flavours are listed where they differ.

/// Content type URIs (like MIME-types) that specify a part's format
pub mod content_type {
    // OPC core content types
    pub const OPC_RELATIONSHIPS: &str = "application/vnd.openxmlformats-package.relationships+xml";

    // WordprocessingML content types
    pub const WML_DOCUMENT_MAIN: &str =
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml";
    pub const WML_TEMPLATE_MAIN: &str =
        "application/vnd.openxmlformats-officedocument.wordprocessingml.template.main+xml";
    pub const WML_DOCUMENT_MACRO_MAIN: &str =
        "application/vnd.ms-word.document.macroEnabled.main+xml";
    pub const WML_TEMPLATE_MACRO_MAIN: &str =
        "application/vnd.ms-word.template.macroEnabledTemplate.main+xml";
    pub const WML_FOOTER: &str =
        "application/vnd.openxmlformats-officedocument.wordprocessingml.footer+xml";
    pub const WML_HEADER: &str =
        "application/vnd.openxmlformats-officedocument.wordprocessingml.header+xml";

    // SpreadsheetML content types
    pub const SML_SHEET_MAIN: &str =
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml";
    pub const SML_TEMPLATE_MAIN: &str =
        "application/vnd.openxmlformats-officedocument.spreadsheetml.template.main+xml";
    pub const SML_SHEET_MACRO_MAIN: &str = "application/vnd.ms-excel.sheet.macroEnabled.main+xml";
    pub const SML_TEMPLATE_MACRO_MAIN: &str =
        "application/vnd.ms-excel.template.macroEnabled.main+xml";
    pub const SML_WORKSHEET: &str =
        "application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml";
    pub const SML_SHARED_STRINGS: &str =
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml";

    /// Main-part content types accepted for word-processing templates.
    pub const WML_MAIN_PARTS: [&str; 4] = [
        WML_DOCUMENT_MAIN,
        WML_TEMPLATE_MAIN,
        WML_DOCUMENT_MACRO_MAIN,
        WML_TEMPLATE_MACRO_MAIN,
    ];

    /// Main-part content types accepted for spreadsheet templates.
    pub const SML_MAIN_PARTS: [&str; 4] = [
        SML_SHEET_MAIN,
        SML_TEMPLATE_MAIN,
        SML_SHEET_MACRO_MAIN,
        SML_TEMPLATE_MACRO_MAIN,
    ];
}

/// XML namespace URIs
pub mod namespace {
    /// WordprocessingML main namespace
    pub const WML_MAIN: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
    pub const WML_MAIN_STRICT: &str = "http://purl.oclc.org/ooxml/wordprocessingml/main";

    /// SpreadsheetML main namespace
    pub const SML_MAIN: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
    pub const SML_MAIN_STRICT: &str = "http://purl.oclc.org/ooxml/spreadsheetml/main";

    /// Office relationships namespace (the `r:` prefix)
    pub const OFC_RELATIONSHIPS: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
    pub const OFC_RELATIONSHIPS_STRICT: &str =
        "http://purl.oclc.org/ooxml/officeDocument/relationships";
}

/// Open XML relationship target modes
pub mod target_mode {
    /// Internal relationship target mode (default)
    pub const INTERNAL: &str = "Internal";

    /// External relationship target mode (e.g., hyperlinks to external URLs)
    pub const EXTERNAL: &str = "External";
}

/// Relationship type URIs used in OPC packages
pub mod relationship_type {
    pub const OFFICE_DOCUMENT: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
    pub const FOOTER: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/footer";
    pub const HEADER: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/header";
    pub const WORKSHEET: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet";
    pub const SHARED_STRINGS: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings";

    /// Prefix used by strict documents in place of the transitional
    /// `http://schemas.openxmlformats.org/officeDocument/2006/relationships/`.
    const STRICT_PREFIX: &str = "http://purl.oclc.org/ooxml/officeDocument/relationships/";
    const TRANSITIONAL_PREFIX: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/";

    /// Compare two relationship types, treating the strict and transitional
    /// spellings of the same type as equal.
    pub fn matches(actual: &str, expected: &str) -> bool {
        if actual == expected {
            return true;
        }
        match (
            actual.strip_prefix(STRICT_PREFIX),
            expected.strip_prefix(TRANSITIONAL_PREFIX),
        ) {
            (Some(a), Some(e)) => a == e,
            _ => false,
        }
    }

}
