use std::fmt;

/// Fatal failure modes of the extraction pipeline.
///
/// Recoverable conditions (an XPath expression matching nothing, an
/// unresolvable CURIE prefix, a `prefixDef` without a usable pattern) are
/// reported as warnings instead and never abort a call.
#[derive(Debug)]
pub enum ExtractionError {
    /// The source filename does not end in `.xml` or `.tei`. Raised before
    /// any I/O is attempted.
    InvalidExtension(String),

    /// The source is neither an existing local file nor a fetchable URL.
    InvalidSource { source: String, reason: String },

    /// Retrieval failed after the source passed validation.
    UnreadableSource { source: String, cause: String },

    /// The retrieved content is not well-formed XML.
    MalformedXml { source: String, cause: String },

    /// The scoping expression could not be compiled or evaluated.
    InvalidXPath { expression: String, cause: String },
}

impl fmt::Display for ExtractionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractionError::InvalidExtension(ext) => write!(
                f,
                "invalid file format: {ext:?} must have a .xml or .tei extension"
            ),
            ExtractionError::InvalidSource { source, reason } => {
                write!(f, "invalid source {source:?}: {reason}")
            }
            ExtractionError::UnreadableSource { source, cause } => {
                write!(f, "failed to read {source}: {cause}")
            }
            ExtractionError::MalformedXml { source, cause } => {
                write!(f, "malformed XML in {source}: {cause}")
            }
            ExtractionError::InvalidXPath { expression, cause } => {
                write!(f, "invalid XPath expression {expression:?}: {cause}")
            }
        }
    }
}

impl std::error::Error for ExtractionError {}
