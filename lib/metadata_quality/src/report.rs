use crate::types::QualityResult;
use chrono::Utc;
use serde_json::{json, Value};
use uuid::Uuid;

/// Serializes a result as a DQV-like JSON-LD document: one measurement for
/// the overall percentage, one per dimension, one per metric. Numeric values
/// are taken from the result unchanged.
pub fn to_dqv_document(result: &QualityResult, computed_on: Option<&str>) -> Value {
    let computed_on = computed_on.unwrap_or("urn:graph:assessed");
    let mut measurements = vec![json!({
        "@id": mint_id(),
        "@type": "dqv:QualityMeasurement",
        "dqv:isMeasurementOf": "overallScore",
        "dqv:computedOn": {"@id": computed_on},
        "dqv:value": result.percentage,
        "rdfs:comment": format!(
            "{} of {} total points",
            result.total_score, result.max_score
        ),
    })];
    for (dimension, dimension_score) in &result.by_dimension {
        measurements.push(json!({
            "@id": mint_id(),
            "@type": "dqv:QualityMeasurement",
            "dqv:isMeasurementOf": dimension.as_str(),
            "dqv:computedOn": {"@id": computed_on},
            "dqv:value": dimension_score.percentage,
            "rdfs:comment": format!(
                "{} of {} points in {}",
                dimension_score.score,
                dimension_score.max_score,
                dimension.as_str()
            ),
        }));
    }
    for metric in &result.metrics {
        measurements.push(json!({
            "@id": mint_id(),
            "@type": "dqv:QualityMeasurement",
            "dqv:isMeasurementOf": metric.id,
            "dqv:computedOn": {"@id": computed_on},
            "dqv:value": metric.score,
            "rdfs:comment": format!(
                "{} of {} entities compliant",
                metric.compliant_entities, metric.total_entities
            ),
        }));
    }
    json!({
        "@context": {
            "dqv": "http://www.w3.org/ns/dqv#",
            "rdfs": "http://www.w3.org/2000/01/rdf-schema#",
        },
        "generated": Utc::now().to_rfc3339(),
        "@graph": measurements,
    })
}

fn mint_id() -> String {
    format!("urn:uuid:{}", Uuid::new_v4())
}
