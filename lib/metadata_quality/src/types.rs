use oxrdf::{NamedNode, NamedNodeRef};
use rdf_graph::vocab::dcat;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    Findability,
    Accessibility,
    Interoperability,
    Reusability,
    Contextuality,
}

impl Dimension {
    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::Findability => "findability",
            Dimension::Accessibility => "accessibility",
            Dimension::Interoperability => "interoperability",
            Dimension::Reusability => "reusability",
            Dimension::Contextuality => "contextuality",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityType {
    Dataset,
    Distribution,
    Catalog,
}

impl EntityType {
    pub fn class(&self) -> NamedNodeRef<'static> {
        match self {
            EntityType::Dataset => dcat::DATASET_CLASS,
            EntityType::Distribution => dcat::DISTRIBUTION_CLASS,
            EntityType::Catalog => dcat::CATALOG_CLASS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricScope {
    Dataset,
    Distribution,
    Catalog,
    /// Datasets and distributions evaluated independently, counts summed.
    Multi,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ComplianceStrategy {
    Presence,
    Vocabulary(String),
    UrlStatus,
    ExternalCompliance,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ValueExtraction {
    Direct,
    /// Also follow non-literal objects through this property and take the
    /// literals found there (e.g. `dct:format` nodes carrying `rdfs:label`).
    Follow(NamedNode),
}

#[derive(Debug, Clone)]
pub struct MetricDefinition {
    pub id: String,
    pub property: NamedNode,
    pub weight: f64,
    pub dimension: Dimension,
    pub scope: MetricScope,
    pub check: ComplianceStrategy,
    pub extraction: ValueExtraction,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricResult {
    pub id: String,
    pub score: f64,
    pub max_score: f64,
    pub scope: MetricScope,
    pub total_entities: u64,
    pub compliant_entities: u64,
    pub compliance_percentage: f64,
    pub found: bool,
}

impl MetricResult {
    pub fn from_counts(metric: &MetricDefinition, total: u64, compliant: u64) -> MetricResult {
        if total == 0 {
            return MetricResult {
                id: metric.id.clone(),
                score: 0.0,
                max_score: metric.weight,
                scope: metric.scope,
                total_entities: 0,
                compliant_entities: 0,
                compliance_percentage: 0.0,
                found: false,
            };
        }
        let compliant = compliant.min(total);
        MetricResult {
            id: metric.id.clone(),
            score: round3(metric.weight * compliant as f64 / total as f64),
            max_score: metric.weight,
            scope: metric.scope,
            total_entities: total,
            compliant_entities: compliant,
            compliance_percentage: round1(100.0 * compliant as f64 / total as f64),
            found: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DimensionScore {
    pub score: f64,
    pub max_score: f64,
    pub percentage: f64,
    pub metrics: Vec<MetricResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityResult {
    pub total_score: f64,
    pub max_score: f64,
    pub percentage: f64,
    pub metrics: Vec<MetricResult>,
    pub by_dimension: BTreeMap<Dimension, DimensionScore>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compliance_metric_id: Option<String>,
}

impl QualityResult {
    /// Builds every aggregate from the per-metric results. Also used to
    /// recompute after the compliance overwrite, so the sum invariants hold
    /// by construction.
    pub fn aggregate(
        results: BTreeMap<Dimension, Vec<MetricResult>>,
        compliance_metric_id: Option<String>,
    ) -> QualityResult {
        let mut by_dimension = BTreeMap::new();
        let mut metrics = vec![];
        let mut total_score = 0.0;
        let mut max_score = 0.0;
        for (dimension, dimension_metrics) in results {
            let score: f64 = dimension_metrics.iter().map(|m| m.score).sum();
            let max: f64 = dimension_metrics.iter().map(|m| m.max_score).sum();
            let percentage = if max == 0.0 {
                0.0
            } else {
                round1(100.0 * score / max)
            };
            total_score += score;
            max_score += max;
            metrics.extend(dimension_metrics.iter().cloned());
            by_dimension.insert(
                dimension,
                DimensionScore {
                    score,
                    max_score: max,
                    percentage,
                    metrics: dimension_metrics,
                },
            );
        }
        let percentage = if max_score == 0.0 {
            0.0
        } else {
            round1(100.0 * total_score / max_score)
        };
        QualityResult {
            total_score,
            max_score,
            percentage,
            metrics,
            by_dimension,
            compliance_metric_id,
        }
    }
}

pub fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
