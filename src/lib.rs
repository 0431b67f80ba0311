pub mod error;
pub mod extractor;
pub mod loader;
pub mod prefixes;
pub mod source;
pub mod utils;

pub use error::ExtractionError;
pub use extractor::extract_graph;
pub use loader::{load, LoadedDocument};
pub use prefixes::{expand_pattern, pattern_base, resolve_prefixes, PrefixMap};
pub use source::{validate, SourceRef};
pub use utils::{OutputFormat, RdfSerializer};

use oxrdf::Graph;
use tracing::info;

/// Extracts RDFa triples from a TEI-XML document into an RDF graph.
///
/// `source` is a local path or an `http(s)` URL ending in `.xml` or `.tei`.
/// With `xpath_expression`, only the matched elements and their subtrees are
/// scanned for RDFa attributes; the default is the whole document. Namespace
/// prefixes are taken from the document's `<prefixDef>` declarations, backed
/// by a table of well-known vocabularies.
///
/// `verbose` controls per-stage progress logging; warnings about skipped
/// constructs are always emitted. Each call is self-contained: no state is
/// shared or cached between calls.
pub fn extract(
    source: &str,
    xpath_expression: Option<&str>,
    verbose: bool,
) -> Result<Graph, ExtractionError> {
    let source_ref = source::validate(source)?;

    if verbose {
        info!("loading {} ...", source);
    }
    let loaded = loader::load(&source_ref, verbose)?;

    let document = loaded.package.as_document();
    let prefix_map = prefixes::resolve_prefixes(&document, verbose);

    let graph = extractor::extract_graph(
        &document,
        &loaded.base_uri,
        &prefix_map,
        xpath_expression,
        verbose,
    )?;

    if verbose {
        info!("returning RDF graph with {} triple(s)", graph.len());
    }

    Ok(graph)
}
