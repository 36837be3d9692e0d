use crate::errors::QualityError;
use crate::evaluator::MetricEvaluator;
use crate::profiles::Profile;
use crate::shacl::ShaclReport;
use crate::types::{ComplianceStrategy, QualityResult};
use log::debug;
use rdf_graph::MetadataGraph;
use std::collections::BTreeMap;
use std::sync::Arc;
use url_checker::UrlChecker;
use vocabulary_index::VocabularyIndex;

/// Public entry point: walks every metric of a profile over a graph and
/// aggregates dimension and total scores.
pub struct QualityEngine {
    evaluator: MetricEvaluator,
}

impl QualityEngine {
    pub fn new(vocabularies: Arc<VocabularyIndex>, url_checker: Arc<UrlChecker>) -> QualityEngine {
        QualityEngine {
            evaluator: MetricEvaluator::new(vocabularies, url_checker),
        }
    }

    /// An empty graph is a valid input and yields an all-zero result with
    /// every metric present and `found == false`.
    pub async fn assess(
        &self,
        graph: &MetadataGraph,
        profile: &Profile,
    ) -> Result<QualityResult, QualityError> {
        debug!(
            "Assessing graph with {} triples against profile `{}` {}",
            graph.len(),
            profile.id,
            profile.version
        );
        let mut results = BTreeMap::new();
        let mut compliance_metric_id = None;
        for (dimension, metrics) in &profile.dimensions {
            let mut dimension_results = vec![];
            for metric in metrics {
                if metric.check == ComplianceStrategy::ExternalCompliance {
                    compliance_metric_id = Some(metric.id.clone());
                }
                dimension_results.push(self.evaluator.evaluate(graph, metric).await);
            }
            results.insert(*dimension, dimension_results);
        }
        Ok(QualityResult::aggregate(results, compliance_metric_id))
    }

    /// Overwrites the external-compliance metric with a binary score and
    /// recomputes every aggregate from scratch. A result without such a
    /// metric is returned unchanged.
    pub fn fold_in_compliance(&self, result: QualityResult, report: &ShaclReport) -> QualityResult {
        let Some(id) = result.compliance_metric_id.clone() else {
            return result;
        };
        let passes = report.passes();
        debug!(
            "Folding in SHACL compliance for metric `{}`: conforms={}, violations={}",
            id,
            report.conforms,
            report.violations.len()
        );
        let mut results = BTreeMap::new();
        for (dimension, dimension_score) in result.by_dimension {
            let metrics = dimension_score
                .metrics
                .into_iter()
                .map(|mut metric| {
                    if metric.id == id {
                        if passes {
                            metric.score = metric.max_score;
                            metric.compliant_entities = metric.total_entities;
                            metric.compliance_percentage = 100.0;
                        } else {
                            metric.score = 0.0;
                            metric.compliant_entities = 0;
                            metric.compliance_percentage = 0.0;
                        }
                    }
                    metric
                })
                .collect();
            results.insert(dimension, metrics);
        }
        QualityResult::aggregate(results, Some(id))
    }
}
