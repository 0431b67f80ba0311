use oxiri::Iri;
use oxrdf::vocab::rdf;
use oxrdf::{Graph, Literal, NamedNode, Triple};
use sxd_document::dom::{ChildOfElement, Document, Element};
use sxd_xpath::nodeset::Node;
use sxd_xpath::{Context, Factory, Value};
use tracing::{info, warn};

use crate::error::ExtractionError;
use crate::loader;
use crate::prefixes::{PrefixMap, TEI_NS, XML_NS};

/// Extracts RDFa triples from the document into an RDF graph.
///
/// With an XPath expression, only the matched elements and their subtrees
/// contribute triples; without one the walk starts at the document root. The
/// base URI seeds the subject inheritance chain and anchors relative
/// references. An expression matching nothing is a warning, not an error,
/// and yields an empty graph.
pub fn extract_graph(
    document: &Document<'_>,
    base_uri: &str,
    prefixes: &PrefixMap,
    xpath_expression: Option<&str>,
    verbose: bool,
) -> Result<Graph, ExtractionError> {
    let scope = Scope {
        base: parse_base(base_uri),
        prefixes,
    };
    let default_subject = NamedNode::new_unchecked(scope.base.as_str());
    let mut graph = Graph::new();

    let roots: Vec<Element<'_>> = match xpath_expression {
        Some(expression) => {
            let elements = select_elements(document, expression, prefixes)?;
            if elements.is_empty() {
                warn!(
                    "no elements matching XPath expression {:?}, returning an empty graph",
                    expression
                );
                return Ok(graph);
            }
            if verbose {
                info!(
                    "{} element(s) matching XPath expression {:?}",
                    elements.len(),
                    expression
                );
            }
            elements
        }
        None => loader::root_element(document).into_iter().collect(),
    };

    for element in roots {
        process_element(element, &default_subject, &scope, &mut graph);
    }

    if verbose {
        info!("extracted {} triple(s)", graph.len());
    }

    Ok(graph)
}

/// Per-call resolution state: the document base IRI and the prefix mapping.
struct Scope<'a> {
    base: Iri<String>,
    prefixes: &'a PrefixMap,
}

impl Scope<'_> {
    /// Expands a CURIE through the prefix map, or resolves the value as an
    /// IRI reference against the document base. `None` means the value is
    /// unusable and the construct should be skipped; the warning has already
    /// been emitted.
    fn resolve_reference(&self, value: &str) -> Option<NamedNode> {
        if let Some((prefix, local)) = value.split_once(':') {
            if let Some(base) = self.prefixes.base_for(prefix) {
                return Some(NamedNode::new_unchecked(format!("{base}{local}")));
            }
            // Not a declared CURIE. Full IRIs (http://..., urn:uuid:...) pass
            // through verbatim; anything else is an unresolvable prefix.
            let looks_like_iri = local.starts_with("//") || matches!(prefix, "urn" | "mailto");
            if looks_like_iri {
                if let Ok(iri) = Iri::parse(value.to_string()) {
                    return Some(NamedNode::new_unchecked(iri.into_inner()));
                }
            }
            warn!("unresolved prefix {:?} in {:?}, skipping", prefix, value);
            return None;
        }

        match self.base.resolve(value) {
            Ok(iri) => Some(NamedNode::new_unchecked(iri.into_inner())),
            Err(error) => {
                warn!(
                    "cannot resolve {:?} against base {:?}: {}, skipping",
                    value,
                    self.base.as_str(),
                    error
                );
                None
            }
        }
    }
}

fn parse_base(base_uri: &str) -> Iri<String> {
    Iri::parse(base_uri.to_string())
        .unwrap_or_else(|_| Iri::parse_unchecked(base_uri.to_string()))
}

/// Compiles and evaluates the scoping expression at the document root,
/// returning the matched elements in document order. `tei` and `xml` are
/// always bound, plus every prefix resolved from the document.
fn select_elements<'d>(
    document: &Document<'d>,
    expression: &str,
    prefixes: &PrefixMap,
) -> Result<Vec<Element<'d>>, ExtractionError> {
    let invalid = |cause: String| ExtractionError::InvalidXPath {
        expression: expression.to_string(),
        cause,
    };

    let xpath = Factory::new()
        .build(expression)
        .map_err(|e| invalid(e.to_string()))?
        .ok_or_else(|| invalid("empty expression".to_string()))?;

    let mut context = Context::new();
    context.set_namespace("tei", TEI_NS);
    context.set_namespace("xml", XML_NS);
    for (prefix, base) in prefixes.iter() {
        context.set_namespace(prefix, base);
    }

    let value = xpath
        .evaluate(&context, document.root())
        .map_err(|e| invalid(e.to_string()))?;

    match value {
        Value::Nodeset(nodes) => Ok(nodes
            .document_order()
            .into_iter()
            .filter_map(|node| match node {
                Node::Element(element) => Some(element),
                _ => None,
            })
            .collect()),
        // A non-nodeset value selects no elements.
        _ => Ok(Vec::new()),
    }
}

/// Depth-first pre-order walk. Each call receives the inherited subject as an
/// immutable value; children inherit whatever subject this element resolves.
fn process_element(
    element: Element<'_>,
    inherited: &NamedNode,
    scope: &Scope<'_>,
    graph: &mut Graph,
) {
    let subject = element_subject(element, inherited, scope);

    process_typeof(element, &subject, scope, graph);
    process_property(element, &subject, scope, graph);
    process_rel(element, &subject, scope, graph);
    process_rev(element, &subject, scope, graph);

    for child in element.children() {
        if let ChildOfElement::Element(child) = child {
            process_element(child, &subject, scope, graph);
        }
    }
}

/// `about` always names the subject. A bare `resource` does too, unless the
/// element also carries `property`, `rel` or `rev` (then it names an object).
/// Everything else inherits.
fn element_subject(element: Element<'_>, inherited: &NamedNode, scope: &Scope<'_>) -> NamedNode {
    if let Some(about) = element.attribute_value("about") {
        if let Some(subject) = scope.resolve_reference(about) {
            return subject;
        }
        return inherited.clone();
    }

    if let Some(resource) = element.attribute_value("resource") {
        let names_object = element.attribute_value("property").is_some()
            || element.attribute_value("rel").is_some()
            || element.attribute_value("rev").is_some();
        if !names_object {
            if let Some(subject) = scope.resolve_reference(resource) {
                return subject;
            }
        }
    }

    inherited.clone()
}

fn process_typeof(element: Element<'_>, subject: &NamedNode, scope: &Scope<'_>, graph: &mut Graph) {
    let Some(types) = element.attribute_value("typeof") else {
        return;
    };

    for token in types.split_whitespace() {
        if let Some(class) = scope.resolve_reference(token) {
            graph.insert(&Triple::new(subject.clone(), rdf::TYPE, class));
        }
    }
}

fn process_property(
    element: Element<'_>,
    subject: &NamedNode,
    scope: &Scope<'_>,
    graph: &mut Graph,
) {
    let Some(properties) = element.attribute_value("property") else {
        return;
    };

    for token in properties.split_whitespace() {
        let Some(predicate) = scope.resolve_reference(token) else {
            continue;
        };

        if let Some(resource) = element.attribute_value("resource") {
            if let Some(object) = scope.resolve_reference(resource) {
                graph.insert(&Triple::new(subject.clone(), predicate, object));
            }
            continue;
        }

        graph.insert(&Triple::new(subject.clone(), predicate, property_literal(element)));
    }
}

/// Object for a `property` without a `resource` target: the `content`
/// attribute when present (even empty), else the element's own text, else
/// the joined text of its direct children, else an empty literal so the
/// property relationship is preserved.
fn property_literal(element: Element<'_>) -> Literal {
    if let Some(content) = element.attribute_value("content") {
        return Literal::new_simple_literal(content);
    }

    let own = direct_text(element);
    if !own.is_empty() {
        return Literal::new_simple_literal(own);
    }

    let parts: Vec<String> = element
        .children()
        .into_iter()
        .filter_map(|child| match child {
            ChildOfElement::Element(child) => {
                let text = direct_text(child);
                (!text.is_empty()).then_some(text)
            }
            _ => None,
        })
        .collect();

    Literal::new_simple_literal(parts.join(" "))
}

/// Concatenated direct text children, surrounding whitespace trimmed.
/// Comments and processing instructions contribute nothing.
fn direct_text(element: Element<'_>) -> String {
    let mut text = String::new();
    for child in element.children() {
        if let ChildOfElement::Text(node) = child {
            text.push_str(node.text());
        }
    }
    text.trim().to_string()
}

fn process_rel(element: Element<'_>, subject: &NamedNode, scope: &Scope<'_>, graph: &mut Graph) {
    let Some(relations) = element.attribute_value("rel") else {
        return;
    };

    let targets: Vec<NamedNode> = match element.attribute_value("resource") {
        Some(resource) => scope.resolve_reference(resource).into_iter().collect(),
        None => descendant_resources(element, scope),
    };

    for token in relations.split_whitespace() {
        let Some(predicate) = scope.resolve_reference(token) else {
            continue;
        };
        for target in &targets {
            graph.insert(&Triple::new(subject.clone(), predicate.clone(), target.clone()));
        }
    }
}

/// Chaining: a `rel` without its own `resource` targets every descendant
/// element that carries one.
fn descendant_resources(element: Element<'_>, scope: &Scope<'_>) -> Vec<NamedNode> {
    let mut targets = Vec::new();
    collect_descendant_resources(element, scope, &mut targets);
    targets
}

fn collect_descendant_resources(
    element: Element<'_>,
    scope: &Scope<'_>,
    targets: &mut Vec<NamedNode>,
) {
    for child in element.children() {
        if let ChildOfElement::Element(child) = child {
            if let Some(resource) = child.attribute_value("resource") {
                if let Some(target) = scope.resolve_reference(resource) {
                    targets.push(target);
                }
            }
            collect_descendant_resources(child, scope, targets);
        }
    }
}

/// `rev` reverses the relation: the `resource` target becomes the subject
/// and the current subject the object.
fn process_rev(element: Element<'_>, subject: &NamedNode, scope: &Scope<'_>, graph: &mut Graph) {
    let Some(reversed) = element.attribute_value("rev") else {
        return;
    };
    let Some(resource) = element.attribute_value("resource") else {
        return;
    };
    let Some(target) = scope.resolve_reference(resource) else {
        return;
    };

    for token in reversed.split_whitespace() {
        if let Some(predicate) = scope.resolve_reference(token) {
            graph.insert(&Triple::new(target.clone(), predicate, subject.clone()));
        }
    }
}
