use std::fmt;
use std::path::{Path, PathBuf};

use url::Url;

use crate::error::ExtractionError;

/// A validated extraction source: a local TEI-XML file or a document
/// reachable over HTTP(S).
#[derive(Debug, Clone)]
pub enum SourceRef {
    File(PathBuf),
    Url(Url),
}

impl fmt::Display for SourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceRef::File(path) => write!(f, "{}", path.display()),
            SourceRef::Url(url) => write!(f, "{}", url),
        }
    }
}

/// Checks the source reference before any I/O happens.
///
/// The filename must end in `.xml` or `.tei` (case-insensitive). An
/// `http://`/`https://` source must parse as a URL; anything else must name
/// an existing regular file. Nothing is fetched or read here.
pub fn validate(source: &str) -> Result<SourceRef, ExtractionError> {
    let lower = source.to_ascii_lowercase();
    if !(lower.ends_with(".xml") || lower.ends_with(".tei")) {
        return Err(ExtractionError::InvalidExtension(source.to_string()));
    }

    if source.starts_with("http://") || source.starts_with("https://") {
        let url = Url::parse(source).map_err(|e| ExtractionError::InvalidSource {
            source: source.to_string(),
            reason: e.to_string(),
        })?;
        return Ok(SourceRef::Url(url));
    }

    if source.contains("://") {
        return Err(ExtractionError::InvalidSource {
            source: source.to_string(),
            reason: "unsupported URL scheme, only http and https can be fetched".to_string(),
        });
    }

    let path = Path::new(source);
    if !path.is_file() {
        return Err(ExtractionError::InvalidSource {
            source: source.to_string(),
            reason: "no such file".to_string(),
        });
    }

    Ok(SourceRef::File(path.to_path_buf()))
}
