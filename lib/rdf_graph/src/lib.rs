pub mod vocab;

use oxrdf::{Graph, NamedNodeRef, SubjectRef, TermRef, Triple};
use oxrdfio::{RdfFormat, RdfParseError, RdfParser};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GraphError {
    #[error(transparent)]
    ParseError(#[from] RdfParseError),
    #[error("Unsupported RDF format `{0}`")]
    UnsupportedFormat(String),
    #[error("Unable to detect RDF format")]
    UnknownFormat,
}

/// A parsed RDF graph exposing the pattern lookups the quality engine needs.
pub struct MetadataGraph {
    graph: Graph,
}

impl MetadataGraph {
    pub fn new(graph: Graph) -> MetadataGraph {
        MetadataGraph { graph }
    }

    /// Parses `text` into a graph, sniffing the format when none is declared.
    /// Named graph components of quad formats are discarded.
    pub fn parse(text: &str, format: Option<RdfFormat>) -> Result<MetadataGraph, GraphError> {
        let format = match format {
            Some(format) => format,
            None => detect_format(text)?,
        };
        let mut graph = Graph::new();
        for quad in RdfParser::from_format(format).for_reader(text.as_bytes()) {
            let quad = quad?;
            let triple = Triple::new(quad.subject, quad.predicate, quad.object);
            graph.insert(&triple);
        }
        Ok(MetadataGraph { graph })
    }

    pub fn len(&self) -> usize {
        self.graph.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.is_empty()
    }

    pub fn subjects_of_class(&self, class: NamedNodeRef) -> Vec<SubjectRef<'_>> {
        self.graph
            .subjects_for_predicate_object(oxrdf::vocab::rdf::TYPE, class)
            .collect()
    }

    pub fn objects<'a>(
        &'a self,
        subject: SubjectRef<'a>,
        predicate: NamedNodeRef<'a>,
    ) -> impl Iterator<Item = TermRef<'a>> + 'a {
        self.graph.objects_for_subject_predicate(subject, predicate)
    }

    pub fn has_property(&self, subject: SubjectRef<'_>, predicate: NamedNodeRef<'_>) -> bool {
        self.objects(subject, predicate).next().is_some()
    }

    pub fn inner(&self) -> &Graph {
        &self.graph
    }
}

/// Best-effort sniffing for undeclared formats. JSON-LD is recognized but not
/// parsed here, the caller must supply a graph parsed elsewhere.
pub fn detect_format(text: &str) -> Result<RdfFormat, GraphError> {
    let head = text.trim_start();
    if head.is_empty() {
        return Err(GraphError::UnknownFormat);
    }
    if head.starts_with("<?xml") || head.contains("<rdf:RDF") {
        return Ok(RdfFormat::RdfXml);
    }
    if head.starts_with('{') || head.starts_with('[') {
        return Err(GraphError::UnsupportedFormat("json-ld".to_string()));
    }
    // Turtle parses the N-Triples subset as well.
    Ok(RdfFormat::Turtle)
}
