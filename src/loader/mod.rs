use std::fs;

use sxd_document::dom::{ChildOfRoot, Document, Element};
use sxd_document::Package;
use tracing::{info, warn};
use url::Url;

use crate::error::ExtractionError;
use crate::source::SourceRef;

/// A parsed TEI-XML document together with the base URI it was loaded from.
///
/// The base URI is `file://` plus the absolute path for local sources and
/// the URL itself for remote ones; relative RDFa references are resolved
/// against it during extraction.
#[derive(Debug)]
pub struct LoadedDocument {
    pub package: Package,
    pub base_uri: String,
    pub source: String,
}

/// Retrieves and parses a validated source. A single attempt, no retries:
/// retrieval failure is `UnreadableSource`, parse failure is `MalformedXml`.
pub fn load(source: &SourceRef, verbose: bool) -> Result<LoadedDocument, ExtractionError> {
    let source_name = source.to_string();

    let (bytes, base_uri) = match source {
        SourceRef::File(path) => {
            let bytes = fs::read(path).map_err(|e| ExtractionError::UnreadableSource {
                source: source_name.clone(),
                cause: e.to_string(),
            })?;
            let absolute = fs::canonicalize(path).unwrap_or_else(|_| path.clone());
            (bytes, format!("file://{}", absolute.display()))
        }
        SourceRef::Url(url) => (fetch(url)?, url.to_string()),
    };

    let text = decode(&bytes, &source_name);

    let package =
        sxd_document::parser::parse(&text).map_err(|e| ExtractionError::MalformedXml {
            source: source_name.clone(),
            cause: e.to_string(),
        })?;

    if verbose {
        let document = package.as_document();
        if let Some(root) = root_element(&document) {
            let children = root
                .children()
                .into_iter()
                .filter_map(|child| match child {
                    sxd_document::dom::ChildOfElement::Element(el) => {
                        Some(el.name().local_part())
                    }
                    _ => None,
                })
                .collect::<Vec<_>>()
                .join(", ");
            info!(
                "loaded {}: root element {}, direct children: {}",
                source_name,
                root.name().local_part(),
                children
            );
        }
    }

    Ok(LoadedDocument {
        package,
        base_uri,
        source: source_name,
    })
}

/// First element under the document root.
pub fn root_element<'d>(document: &Document<'d>) -> Option<Element<'d>> {
    document.root().children().into_iter().find_map(|child| match child {
        ChildOfRoot::Element(element) => Some(element),
        _ => None,
    })
}

fn fetch(url: &Url) -> Result<Vec<u8>, ExtractionError> {
    let unreadable = |cause: String| ExtractionError::UnreadableSource {
        source: url.to_string(),
        cause,
    };

    // No timeout: a hung fetch is the caller's responsibility to interrupt.
    let client = reqwest::blocking::Client::builder()
        .timeout(None)
        .user_agent(concat!("tei_rdfa/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| unreadable(e.to_string()))?;

    let response = client
        .get(url.clone())
        .send()
        .and_then(|response| response.error_for_status())
        .map_err(|e| unreadable(e.to_string()))?;

    let bytes = response.bytes().map_err(|e| unreadable(e.to_string()))?;
    Ok(bytes.to_vec())
}

fn decode(bytes: &[u8], source: &str) -> String {
    let encoding = match encoding_rs::Encoding::for_bom(bytes) {
        Some((encoding, _)) => encoding,
        None => encoding_rs::UTF_8,
    };

    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        warn!("encoding errors detected in {}", source);
    }

    text.into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;

    const MINIMAL: &str = r#"<TEI xmlns="http://www.tei-c.org/ns/1.0"><teiHeader/><text/></TEI>"#;

    fn write_doc(contents: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".xml").tempfile().unwrap();
        file.write_all(contents).unwrap();
        file
    }

    #[test]
    fn loads_local_documents_with_a_file_base_uri() {
        let file = write_doc(MINIMAL.as_bytes());
        let loaded = load(&SourceRef::File(file.path().to_path_buf()), false).unwrap();
        assert!(loaded.base_uri.starts_with("file://"));
        assert!(loaded.base_uri.ends_with(".xml"));

        let document = loaded.package.as_document();
        let root = root_element(&document).unwrap();
        assert_eq!(root.name().local_part(), "TEI");
    }

    #[test]
    fn strips_a_byte_order_mark_before_parsing() {
        let mut contents = vec![0xEF, 0xBB, 0xBF];
        contents.extend_from_slice(MINIMAL.as_bytes());
        let file = write_doc(&contents);
        let loaded = load(&SourceRef::File(file.path().to_path_buf()), false).unwrap();
        assert!(root_element(&loaded.package.as_document()).is_some());
    }

    #[test]
    fn reports_parse_failures_as_malformed_xml() {
        let file = write_doc(b"<TEI><teiHeader></TEI>");
        let err = load(&SourceRef::File(file.path().to_path_buf()), false).unwrap_err();
        match err {
            ExtractionError::MalformedXml { source, .. } => {
                assert!(source.ends_with(".xml"));
            }
            other => panic!("expected MalformedXml, got {other}"),
        }
    }

    #[test]
    fn reports_vanished_files_as_unreadable() {
        let path = PathBuf::from("/no/such/place/letter.xml");
        let err = load(&SourceRef::File(path), false).unwrap_err();
        assert!(matches!(err, ExtractionError::UnreadableSource { .. }));
    }

    #[test]
    fn fetches_remote_documents() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/letter.xml")
            .with_status(200)
            .with_header("content-type", "application/xml")
            .with_body(MINIMAL)
            .create();

        let url = Url::parse(&format!("{}/letter.xml", server.url())).unwrap();
        let loaded = load(&SourceRef::Url(url.clone()), false).unwrap();
        assert_eq!(loaded.base_uri, url.to_string());
        mock.assert();
    }

    #[test]
    fn surfaces_http_errors_as_unreadable() {
        let mut server = mockito::Server::new();
        let _mock = server.mock("GET", "/missing.xml").with_status(404).create();

        let url = Url::parse(&format!("{}/missing.xml", server.url())).unwrap();
        let err = load(&SourceRef::Url(url), false).unwrap_err();
        assert!(matches!(err, ExtractionError::UnreadableSource { .. }));
    }
}
