use rdf_graph::GraphError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QualityError {
    #[error("Profile `{0}` not found")]
    ProfileNotFound(String),
    #[error("Invalid profile configuration: {0}")]
    ProfileConfigError(String),
    #[error(transparent)]
    ReadFileError(#[from] std::io::Error),
    #[error(transparent)]
    ReadJSONError(#[from] serde_json::Error),
    #[error(transparent)]
    GraphError(#[from] GraphError),
}
