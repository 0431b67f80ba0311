use anyhow::{Context, Result};
use oxrdf::vocab::xsd;
use oxrdf::{Graph, SubjectRef, TermRef, TripleRef};
use rio_api::formatter::TriplesFormatter;
use rio_api::model as rio;
use rio_turtle::{NTriplesFormatter, TurtleFormatter};
use serde::Serialize;

/// Output formats offered by the command-line frontend. The extracted graph
/// itself is format-agnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Turtle,
    NTriples,
    Json,
}

pub struct RdfSerializer;

impl RdfSerializer {
    pub fn new() -> Self {
        Self
    }

    pub fn serialize(&self, graph: &Graph, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Turtle => self.serialize_turtle(graph),
            OutputFormat::NTriples => self.serialize_ntriples(graph),
            OutputFormat::Json => self.serialize_json(graph),
        }
    }

    fn serialize_turtle(&self, graph: &Graph) -> Result<String> {
        let mut formatter = TurtleFormatter::new(Vec::new());
        for triple in graph.iter() {
            formatter
                .format(&rio_triple(&triple))
                .context("failed to format triple as Turtle")?;
        }
        let bytes = formatter.finish().context("failed to finish Turtle output")?;
        String::from_utf8(bytes).context("Turtle output is not valid UTF-8")
    }

    fn serialize_ntriples(&self, graph: &Graph) -> Result<String> {
        let mut formatter = NTriplesFormatter::new(Vec::new());
        for triple in graph.iter() {
            formatter
                .format(&rio_triple(&triple))
                .context("failed to format triple as N-Triples")?;
        }
        String::from_utf8(formatter.finish()?).context("N-Triples output is not valid UTF-8")
    }

    fn serialize_json(&self, graph: &Graph) -> Result<String> {
        let records: Vec<TripleRecord> = graph.iter().map(|triple| record(&triple)).collect();
        serde_json::to_string_pretty(&records).context("failed to serialize triples to JSON")
    }
}

impl Default for RdfSerializer {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Serialize)]
struct TripleRecord {
    subject: String,
    predicate: String,
    object: String,
}

fn record(triple: &TripleRef<'_>) -> TripleRecord {
    let subject = match triple.subject {
        SubjectRef::NamedNode(node) => node.as_str().to_string(),
        SubjectRef::BlankNode(node) => node.as_str().to_string(),
    };

    let object = match triple.object {
        TermRef::NamedNode(node) => node.as_str().to_string(),
        TermRef::BlankNode(node) => node.as_str().to_string(),
        TermRef::Literal(literal) => literal.value().to_string(),
    };

    TripleRecord {
        subject,
        predicate: triple.predicate.as_str().to_string(),
        object,
    }
}

fn rio_triple<'a>(triple: &TripleRef<'a>) -> rio::Triple<'a> {
    let subject = match triple.subject {
        SubjectRef::NamedNode(node) => rio::Subject::NamedNode(rio::NamedNode { iri: node.as_str() }),
        SubjectRef::BlankNode(node) => rio::Subject::BlankNode(rio::BlankNode { id: node.as_str() }),
    };

    let object = match triple.object {
        TermRef::NamedNode(node) => rio::Term::NamedNode(rio::NamedNode { iri: node.as_str() }),
        TermRef::BlankNode(node) => rio::Term::BlankNode(rio::BlankNode { id: node.as_str() }),
        TermRef::Literal(literal) => rio::Term::Literal(match literal.language() {
            Some(language) => rio::Literal::LanguageTaggedString {
                value: literal.value(),
                language,
            },
            None if literal.datatype() == xsd::STRING => rio::Literal::Simple {
                value: literal.value(),
            },
            None => rio::Literal::Typed {
                value: literal.value(),
                datatype: rio::NamedNode {
                    iri: literal.datatype().as_str(),
                },
            },
        }),
    };

    rio::Triple {
        subject,
        predicate: rio::NamedNode {
            iri: triple.predicate.as_str(),
        },
        object,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxrdf::{Literal, NamedNode, Triple};

    fn sample_graph() -> Graph {
        let mut graph = Graph::new();
        graph.insert(&Triple::new(
            NamedNode::new("http://example.org/letter.xml#p1").unwrap(),
            NamedNode::new("http://xmlns.com/foaf/0.1/name").unwrap(),
            Literal::new_simple_literal("Alice"),
        ));
        graph.insert(&Triple::new(
            NamedNode::new("http://example.org/letter.xml#p1").unwrap(),
            NamedNode::new("http://xmlns.com/foaf/0.1/knows").unwrap(),
            NamedNode::new("http://example.org/letter.xml#p2").unwrap(),
        ));
        graph
    }

    #[test]
    fn ntriples_output_has_one_statement_per_line() {
        let output = RdfSerializer::new()
            .serialize(&sample_graph(), OutputFormat::NTriples)
            .unwrap();
        assert_eq!(output.trim_end().lines().count(), 2);
        assert!(output.contains("<http://xmlns.com/foaf/0.1/name> \"Alice\""));
    }

    #[test]
    fn turtle_output_contains_every_term() {
        let output = RdfSerializer::new()
            .serialize(&sample_graph(), OutputFormat::Turtle)
            .unwrap();
        assert!(output.contains("http://example.org/letter.xml#p1"));
        assert!(output.contains("Alice"));
    }

    #[test]
    fn json_output_is_an_array_of_triple_records() {
        let output = RdfSerializer::new()
            .serialize(&sample_graph(), OutputFormat::Json)
            .unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        let records = parsed.as_array().unwrap();
        assert_eq!(records.len(), 2);
        assert!(records
            .iter()
            .all(|record| record.get("subject").is_some() && record.get("predicate").is_some()));
    }
}
