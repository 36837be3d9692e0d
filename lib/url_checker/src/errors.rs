use thiserror::Error;

#[derive(Debug, Error)]
pub enum UrlCheckError {
    #[error(transparent)]
    HttpClientError(#[from] reqwest::Error),
}
