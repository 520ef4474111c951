/// Error types for template loading and substitution.
use thiserror::Error;

use crate::ooxml::opc::error::OpcError;

/// Result type for template operations.
pub type Result<T> = std::result::Result<T, TemplateLoadError>;

/// The template could not be used.
///
/// Every failure of a generation call is one of these. Errors are
/// deterministic: the same template fails the same way every time.
#[derive(Error, Debug)]
pub enum TemplateLoadError {
    /// The container itself is unusable (not a ZIP, no content types, ...)
    #[error("OPC error: {0}")]
    Opc(#[from] OpcError),

    /// A structurally mandatory part is absent
    #[error("Missing {role}: {detail}")]
    MissingPart { role: &'static str, detail: String },

    /// The main part is not of the expected document kind
    #[error("Invalid content type: expected {expected}, got {got}")]
    InvalidContentType { expected: String, got: String },

    /// A part that has to be scanned is not well-formed XML
    #[error("XML error in {part}: {message}")]
    Xml { part: String, message: String },

    /// The document kind could not be determined
    #[error("Unknown template kind: {0}")]
    UnknownKind(String),

    /// The placeholder set could not be compiled
    #[error("Invalid placeholders: {0}")]
    Placeholders(#[from] aho_corasick::BuildError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TemplateLoadError {
    pub(crate) fn missing(role: &'static str, detail: impl Into<String>) -> Self {
        TemplateLoadError::MissingPart {
            role,
            detail: detail.into(),
        }
    }

    pub(crate) fn xml(part: impl ToString, message: impl ToString) -> Self {
        TemplateLoadError::Xml {
            part: part.to_string(),
            message: message.to_string(),
        }
    }
}
