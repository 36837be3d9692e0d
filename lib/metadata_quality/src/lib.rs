pub mod engine;
pub mod errors;
pub mod evaluator;
pub mod profiles;
pub mod report;
pub mod shacl;
pub mod types;

pub use engine::QualityEngine;
pub use errors::QualityError;
pub use evaluator::MetricEvaluator;
pub use profiles::{Profile, DCAT_AP_ES};
pub use shacl::{ShaclReport, ShaclViolation};
pub use types::{
    ComplianceStrategy, Dimension, DimensionScore, EntityType, MetricDefinition, MetricResult,
    MetricScope, QualityResult, ValueExtraction,
};
