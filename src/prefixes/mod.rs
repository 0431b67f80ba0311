use std::collections::HashMap;

use sxd_document::dom::{ChildOfElement, Document, Element};
use tracing::{info, warn};

use crate::loader;

pub const TEI_NS: &str = "http://www.tei-c.org/ns/1.0";
pub const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

/// Well-known vocabularies consulted when a CURIE prefix is not declared in
/// the document itself.
const BUILTIN_PREFIXES: &[(&str, &str)] = &[
    ("rdf", "http://www.w3.org/1999/02/22-rdf-syntax-ns#"),
    ("rdfs", "http://www.w3.org/2000/01/rdf-schema#"),
    ("xsd", "http://www.w3.org/2001/XMLSchema#"),
    ("foaf", "http://xmlns.com/foaf/0.1/"),
    ("dc", "http://purl.org/dc/elements/1.1/"),
    ("dcterms", "http://purl.org/dc/terms/"),
];

/// Prefix-to-namespace mapping built from a document's `<prefixDef>`
/// declarations.
///
/// Lookup falls back to [`BUILTIN_PREFIXES`] for prefixes the document does
/// not declare; a declared prefix shadows the built-in entry of the same
/// name. Valid only for the extraction call that built it.
#[derive(Debug, Clone, Default)]
pub struct PrefixMap {
    declared: HashMap<String, String>,
}

impl PrefixMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last declaration for a given prefix wins.
    pub fn insert(&mut self, prefix: impl Into<String>, base: impl Into<String>) {
        self.declared.insert(prefix.into(), base.into());
    }

    /// Namespace base for a prefix: the document's declaration if present,
    /// otherwise the built-in table.
    pub fn base_for(&self, prefix: &str) -> Option<&str> {
        self.declared.get(prefix).map(String::as_str).or_else(|| {
            BUILTIN_PREFIXES
                .iter()
                .find(|(known, _)| *known == prefix)
                .map(|(_, base)| *base)
        })
    }

    pub fn len(&self) -> usize {
        self.declared.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declared.is_empty()
    }

    /// Declared prefixes only, for binding into XPath evaluation contexts.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.declared.iter().map(|(p, b)| (p.as_str(), b.as_str()))
    }
}

/// Namespace base encoded by a TEI `replacementPattern`: the text before the
/// first placeholder (`{$1}`, `$1` or `%s`), or the whole pattern when it
/// carries no placeholder.
pub fn pattern_base(pattern: &str) -> &str {
    for placeholder in ["{$1}", "$1", "%s"] {
        if let Some(index) = pattern.find(placeholder) {
            return &pattern[..index];
        }
    }
    pattern
}

/// Substitutes an identifier suffix into a `replacementPattern` URI template.
pub fn expand_pattern(pattern: &str, suffix: &str) -> String {
    format!("{}{}", pattern_base(pattern), suffix)
}

/// Collects `teiHeader/encodingDesc/listPrefixDef/prefixDef` declarations
/// into a [`PrefixMap`]. A document without declarations yields an empty map;
/// entries without a usable `ident` or `replacementPattern` are skipped with
/// a warning.
pub fn resolve_prefixes(document: &Document<'_>, verbose: bool) -> PrefixMap {
    let mut map = PrefixMap::new();

    let Some(root) = loader::root_element(document) else {
        return map;
    };

    for header in tei_children(root, "teiHeader") {
        for encoding_desc in tei_children(header, "encodingDesc") {
            for list in tei_children(encoding_desc, "listPrefixDef") {
                for def in tei_children(list, "prefixDef") {
                    let Some(ident) = def.attribute_value("ident") else {
                        warn!("prefixDef without an ident attribute, skipping");
                        continue;
                    };
                    let Some(pattern) = def.attribute_value("replacementPattern") else {
                        warn!("prefixDef {:?} has no replacementPattern, skipping", ident);
                        continue;
                    };
                    map.insert(ident, pattern_base(pattern));
                }
            }
        }
    }

    if verbose {
        info!("resolved {} prefix declaration(s) from the document header", map.len());
    }

    map
}

fn tei_children<'d>(element: Element<'d>, local: &str) -> Vec<Element<'d>> {
    element
        .children()
        .into_iter()
        .filter_map(|child| match child {
            ChildOfElement::Element(el)
                if el.name().local_part() == local && el.name().namespace_uri() == Some(TEI_NS) =>
            {
                Some(el)
            }
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use sxd_document::Package;

    fn parse(xml: &str) -> Package {
        sxd_document::parser::parse(xml).expect("test document is well-formed")
    }

    fn header(defs: &str) -> String {
        format!(
            r#"<TEI xmlns="http://www.tei-c.org/ns/1.0">
                 <teiHeader><encodingDesc><listPrefixDef>{defs}</listPrefixDef></encodingDesc></teiHeader>
                 <text/>
               </TEI>"#
        )
    }

    #[test]
    fn pattern_base_strips_known_placeholder_forms() {
        assert_eq!(pattern_base("http://example.org/$1"), "http://example.org/");
        assert_eq!(pattern_base("http://example.org/{$1}"), "http://example.org/");
        assert_eq!(pattern_base("http://example.org/%s"), "http://example.org/");
        assert_eq!(pattern_base("http://example.org/ns#"), "http://example.org/ns#");
        assert_eq!(pattern_base("http://example.org/$1/profile"), "http://example.org/");
    }

    #[test]
    fn expand_pattern_substitutes_the_suffix() {
        assert_eq!(expand_pattern("http://example.org/$1", "name"), "http://example.org/name");
        assert_eq!(expand_pattern("http://example.org/ns#", "name"), "http://example.org/ns#name");
    }

    #[test]
    fn resolves_declared_prefixes() {
        let xml = header(
            r#"<prefixDef ident="psn" matchPattern="([a-z]+)"
                          replacementPattern="http://example.org/persons/$1"/>"#,
        );
        let package = parse(&xml);
        let map = resolve_prefixes(&package.as_document(), false);
        assert_eq!(map.len(), 1);
        assert_eq!(map.base_for("psn"), Some("http://example.org/persons/"));
    }

    #[test]
    fn last_declaration_wins_for_duplicate_idents() {
        let xml = header(
            r#"<prefixDef ident="psn" replacementPattern="http://old.example.org/$1"/>
               <prefixDef ident="psn" replacementPattern="http://new.example.org/$1"/>"#,
        );
        let package = parse(&xml);
        let map = resolve_prefixes(&package.as_document(), false);
        assert_eq!(map.base_for("psn"), Some("http://new.example.org/"));
    }

    #[test]
    fn skips_declarations_without_a_pattern() {
        let xml = header(
            r#"<prefixDef ident="broken" matchPattern="([a-z]+)"/>
               <prefixDef ident="ok" replacementPattern="http://example.org/$1"/>"#,
        );
        let package = parse(&xml);
        let map = resolve_prefixes(&package.as_document(), false);
        assert_eq!(map.len(), 1);
        assert_eq!(map.base_for("broken"), None);
        assert_eq!(map.base_for("ok"), Some("http://example.org/"));
    }

    #[test]
    fn documents_without_declarations_yield_an_empty_map() {
        let package = parse(r#"<TEI xmlns="http://www.tei-c.org/ns/1.0"><teiHeader/><text/></TEI>"#);
        let map = resolve_prefixes(&package.as_document(), false);
        assert!(map.is_empty());
    }

    #[test]
    fn builtin_prefixes_back_undeclared_lookups() {
        let map = PrefixMap::new();
        assert_eq!(map.base_for("rdf"), Some("http://www.w3.org/1999/02/22-rdf-syntax-ns#"));
        assert_eq!(map.base_for("dc"), Some("http://purl.org/dc/elements/1.1/"));
        assert_eq!(map.base_for("zz"), None);
    }

    #[test]
    fn declared_prefixes_shadow_builtins() {
        let mut map = PrefixMap::new();
        map.insert("dc", "http://example.org/not-dublin-core/");
        assert_eq!(map.base_for("dc"), Some("http://example.org/not-dublin-core/"));
    }
}
