use crate::types::{
    ComplianceStrategy, EntityType, MetricDefinition, MetricResult, MetricScope, ValueExtraction,
};
use log::debug;
use oxrdf::{SubjectRef, TermRef};
use rdf_graph::MetadataGraph;
use std::collections::HashSet;
use std::sync::Arc;
use url_checker::UrlChecker;
use vocabulary_index::VocabularyIndex;

/// Evaluates one metric against one graph: counts entities in scope,
/// determines compliance per strategy, produces a proportional score.
pub struct MetricEvaluator {
    vocabularies: Arc<VocabularyIndex>,
    url_checker: Arc<UrlChecker>,
}

impl MetricEvaluator {
    pub fn new(vocabularies: Arc<VocabularyIndex>, url_checker: Arc<UrlChecker>) -> MetricEvaluator {
        MetricEvaluator {
            vocabularies,
            url_checker,
        }
    }

    pub async fn evaluate(&self, graph: &MetadataGraph, metric: &MetricDefinition) -> MetricResult {
        let (total, compliant) = match metric.scope {
            MetricScope::Dataset => self.evaluate_entity(graph, metric, EntityType::Dataset).await,
            MetricScope::Distribution => {
                self.evaluate_entity(graph, metric, EntityType::Distribution)
                    .await
            }
            MetricScope::Catalog => self.evaluate_entity(graph, metric, EntityType::Catalog).await,
            MetricScope::Multi => {
                let (dataset_total, dataset_compliant) =
                    self.evaluate_entity(graph, metric, EntityType::Dataset).await;
                let (distribution_total, distribution_compliant) = self
                    .evaluate_entity(graph, metric, EntityType::Distribution)
                    .await;
                (
                    dataset_total + distribution_total,
                    dataset_compliant + distribution_compliant,
                )
            }
        };
        debug!(
            "Metric `{}`: {}/{} compliant",
            metric.id, compliant, total
        );
        MetricResult::from_counts(metric, total, compliant)
    }

    async fn evaluate_entity(
        &self,
        graph: &MetadataGraph,
        metric: &MetricDefinition,
        entity: EntityType,
    ) -> (u64, u64) {
        let subjects = graph.subjects_of_class(entity.class());
        let total = subjects.len() as u64;
        if total == 0 {
            return (0, 0);
        }
        let compliant = match &metric.check {
            ComplianceStrategy::Presence => subjects
                .iter()
                .filter(|subject| has_present_value(graph, **subject, metric))
                .count() as u64,
            ComplianceStrategy::Vocabulary(name) => subjects
                .iter()
                .filter(|subject| {
                    let values = extract_values(graph, **subject, metric);
                    !values.is_empty() && self.vocabularies.matches(&values, name)
                })
                .count() as u64,
            ComplianceStrategy::UrlStatus => {
                // One representative URL per entity, checked as a single
                // population. Compliance is attributed at the population
                // rate, not per entity.
                let urls: Vec<String> = subjects
                    .iter()
                    .filter_map(|subject| {
                        extract_values(graph, *subject, metric).into_iter().next()
                    })
                    .collect();
                let report = self.url_checker.check_batch(&urls).await;
                debug!(
                    "Metric `{}`: checked {} of {} URLs, rate {:.3}",
                    metric.id, report.sample_size, report.valid_urls, report.rate
                );
                (total as f64 * report.rate).round() as u64
            }
            // Overwritten by the engine once a SHACL report is available.
            ComplianceStrategy::ExternalCompliance => 0,
        };
        (total, compliant.min(total))
    }
}

fn has_present_value(
    graph: &MetadataGraph,
    subject: SubjectRef<'_>,
    metric: &MetricDefinition,
) -> bool {
    graph
        .objects(subject, metric.property.as_ref())
        .any(|object| match object {
            TermRef::Literal(literal) => !literal.value().trim().is_empty(),
            _ => true,
        })
}

/// Object values of the metric's property on `subject`, de-duplicated
/// case-insensitively. With `ValueExtraction::Follow`, non-literal objects
/// contribute the literals reached through the follow property as well.
fn extract_values(
    graph: &MetadataGraph,
    subject: SubjectRef<'_>,
    metric: &MetricDefinition,
) -> Vec<String> {
    let mut values = vec![];
    let mut seen = HashSet::new();
    for object in graph.objects(subject, metric.property.as_ref()) {
        match object {
            TermRef::Literal(literal) => {
                push_value(&mut values, &mut seen, literal.value());
            }
            TermRef::NamedNode(node) => {
                push_value(&mut values, &mut seen, node.as_str());
                if let ValueExtraction::Follow(property) = &metric.extraction {
                    follow_literals(graph, node.into(), property.as_ref(), &mut values, &mut seen);
                }
            }
            TermRef::BlankNode(node) => {
                if let ValueExtraction::Follow(property) = &metric.extraction {
                    follow_literals(graph, node.into(), property.as_ref(), &mut values, &mut seen);
                }
            }
            #[allow(unreachable_patterns)]
            _ => {}
        }
    }
    values
}

fn follow_literals(
    graph: &MetadataGraph,
    node: SubjectRef<'_>,
    property: oxrdf::NamedNodeRef<'_>,
    values: &mut Vec<String>,
    seen: &mut HashSet<String>,
) {
    for object in graph.objects(node, property) {
        if let TermRef::Literal(literal) = object {
            push_value(values, seen, literal.value());
        }
    }
}

fn push_value(values: &mut Vec<String>, seen: &mut HashSet<String>, value: &str) {
    let normalized = value.trim().to_lowercase();
    if normalized.is_empty() {
        return;
    }
    if seen.insert(normalized) {
        values.push(value.to_string());
    }
}
