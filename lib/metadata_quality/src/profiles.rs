use crate::errors::QualityError;
use crate::types::{
    ComplianceStrategy, Dimension, MetricDefinition, MetricScope, ValueExtraction,
};
use oxrdf::NamedNode;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

pub const DCAT_AP_ES: &str = "dcat_ap_es";

const DCAT_AP_ES_JSON: &str = include_str!("../profiles/dcat_ap_es.json");

#[derive(Deserialize)]
struct RawProfile {
    id: String,
    version: String,
    #[serde(default)]
    prefixes: HashMap<String, String>,
    dimensions: BTreeMap<Dimension, Vec<RawMetric>>,
}

#[derive(Deserialize)]
struct RawMetric {
    id: String,
    property: String,
    weight: f64,
    scope: MetricScope,
    check: RawCheck,
    #[serde(default)]
    vocabulary: Option<String>,
    #[serde(default)]
    follow: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
enum RawCheck {
    Presence,
    Vocabulary,
    UrlStatus,
    ExternalCompliance,
}

/// A declarative metric table for one profile/version, loaded once and
/// consumed read-only. Prefixed property names are expanded and compliance
/// strategies resolved at load time, the evaluator never inspects metric id
/// strings.
#[derive(Debug, Clone)]
pub struct Profile {
    pub id: String,
    pub version: String,
    pub dimensions: BTreeMap<Dimension, Vec<MetricDefinition>>,
}

impl Profile {
    pub fn bundled(id: &str) -> Result<Profile, QualityError> {
        match id {
            DCAT_AP_ES => Profile::from_json(DCAT_AP_ES_JSON),
            _ => Err(QualityError::ProfileNotFound(id.to_string())),
        }
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Profile, QualityError> {
        let content = std::fs::read_to_string(path)?;
        Profile::from_json(&content)
    }

    pub fn from_json(json: &str) -> Result<Profile, QualityError> {
        let raw: RawProfile = serde_json::from_str(json)?;
        let mut dimensions = BTreeMap::new();
        let mut compliance_metrics = 0usize;
        for (dimension, raw_metrics) in raw.dimensions {
            let mut metrics = vec![];
            for raw_metric in raw_metrics {
                let metric = resolve_metric(raw_metric, dimension, &raw.prefixes)?;
                if metric.check == ComplianceStrategy::ExternalCompliance {
                    compliance_metrics += 1;
                }
                metrics.push(metric);
            }
            dimensions.insert(dimension, metrics);
        }
        if compliance_metrics > 1 {
            return Err(QualityError::ProfileConfigError(format!(
                "profile `{}` declares {} external compliance metrics, at most one is allowed",
                raw.id, compliance_metrics
            )));
        }
        Ok(Profile {
            id: raw.id,
            version: raw.version,
            dimensions,
        })
    }

    pub fn metrics(&self) -> impl Iterator<Item = &MetricDefinition> {
        self.dimensions.values().flatten()
    }

    pub fn total_weight(&self) -> f64 {
        self.metrics().map(|m| m.weight).sum()
    }
}

fn resolve_metric(
    raw: RawMetric,
    dimension: Dimension,
    prefixes: &HashMap<String, String>,
) -> Result<MetricDefinition, QualityError> {
    let check = match raw.check {
        RawCheck::Presence => ComplianceStrategy::Presence,
        RawCheck::Vocabulary => match &raw.vocabulary {
            Some(name) => ComplianceStrategy::Vocabulary(name.clone()),
            None => {
                return Err(QualityError::ProfileConfigError(format!(
                    "metric `{}` uses a vocabulary check but names no vocabulary",
                    raw.id
                )))
            }
        },
        RawCheck::UrlStatus => ComplianceStrategy::UrlStatus,
        RawCheck::ExternalCompliance => ComplianceStrategy::ExternalCompliance,
    };
    let extraction = match &raw.follow {
        Some(property) => ValueExtraction::Follow(expand_property(property, prefixes, &raw.id)?),
        None => ValueExtraction::Direct,
    };
    Ok(MetricDefinition {
        property: expand_property(&raw.property, prefixes, &raw.id)?,
        id: raw.id,
        weight: raw.weight,
        dimension,
        scope: raw.scope,
        check,
        extraction,
    })
}

fn expand_property(
    property: &str,
    prefixes: &HashMap<String, String>,
    metric_id: &str,
) -> Result<NamedNode, QualityError> {
    let iri = if property.starts_with("http://") || property.starts_with("https://") {
        property.to_string()
    } else {
        let (prefix, local) = property.split_once(':').ok_or_else(|| {
            QualityError::ProfileConfigError(format!(
                "metric `{}`: property `{}` is neither an IRI nor prefixed",
                metric_id, property
            ))
        })?;
        let base = prefixes
            .get(prefix)
            .map(String::as_str)
            .or_else(|| builtin_prefix(prefix))
            .ok_or_else(|| {
                QualityError::ProfileConfigError(format!(
                    "metric `{}`: unknown prefix `{}`",
                    metric_id, prefix
                ))
            })?;
        format!("{}{}", base, local)
    };
    NamedNode::new(iri).map_err(|e| {
        QualityError::ProfileConfigError(format!(
            "metric `{}`: invalid property IRI: {}",
            metric_id, e
        ))
    })
}

fn builtin_prefix(prefix: &str) -> Option<&'static str> {
    match prefix {
        "dct" => Some("http://purl.org/dc/terms/"),
        "dcat" => Some("http://www.w3.org/ns/dcat#"),
        "foaf" => Some("http://xmlns.com/foaf/0.1/"),
        "rdf" => Some("http://www.w3.org/1999/02/22-rdf-syntax-ns#"),
        "rdfs" => Some("http://www.w3.org/2000/01/rdf-schema#"),
        "adms" => Some("http://www.w3.org/ns/adms#"),
        "dqv" => Some("http://www.w3.org/ns/dqv#"),
        _ => None,
    }
}
