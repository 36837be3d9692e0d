use crate::cache::CheckMethod;
use crate::errors::UrlCheckError;
use async_trait::async_trait;
use log::debug;
use reqwest::redirect::Policy;
use std::future::Future;
use std::time::Duration;

/// Status codes where a HEAD verdict is not trusted and a single GET retry
/// decides the outcome.
pub const GET_RETRY_STATUSES: [u16; 4] = [400, 403, 405, 503];

pub fn is_accessible(status: u16) -> bool {
    (200..400).contains(&status)
}

#[derive(Debug, Clone, Copy)]
pub struct ProbeOutcome {
    pub accessible: bool,
    pub status: Option<u16>,
    pub method: CheckMethod,
}

impl ProbeOutcome {
    pub fn failed(method: CheckMethod) -> ProbeOutcome {
        ProbeOutcome {
            accessible: false,
            status: None,
            method,
        }
    }
}

/// Single-URL reachability probe. Trait object so tests can substitute a
/// deterministic implementation for the HTTP one.
#[async_trait]
pub trait UrlProbe: Send + Sync {
    async fn probe(&self, url: &str) -> ProbeOutcome;
}

pub struct HttpProbe {
    client: reqwest::Client,
}

impl HttpProbe {
    pub fn new(timeout: Duration, max_redirects: usize) -> Result<HttpProbe, UrlCheckError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(Policy::limited(max_redirects))
            .build()?;
        Ok(HttpProbe { client })
    }

    async fn probe_get(&self, url: &str) -> ProbeOutcome {
        match self.client.get(url).send().await {
            Ok(response) => {
                let status = response.status().as_u16();
                // The response is dropped once the status is known, the body
                // is never read.
                drop(response);
                ProbeOutcome {
                    accessible: is_accessible(status),
                    status: Some(status),
                    method: CheckMethod::Get,
                }
            }
            Err(e) => {
                debug!("GET {} failed: {}", url, e);
                ProbeOutcome::failed(CheckMethod::Get)
            }
        }
    }
}

#[async_trait]
impl UrlProbe for HttpProbe {
    async fn probe(&self, url: &str) -> ProbeOutcome {
        match self.client.head(url).send().await {
            Ok(response) => {
                resolve_head_status(response.status().as_u16(), || self.probe_get(url)).await
            }
            Err(e) => {
                debug!("HEAD {} failed: {}", url, e);
                ProbeOutcome::failed(CheckMethod::Head)
            }
        }
    }
}

/// Turns a HEAD status into the final verdict, issuing the single GET retry
/// for statuses where servers commonly reject HEAD itself. The GET verdict,
/// when taken, is final.
async fn resolve_head_status<G, F>(status: u16, get: G) -> ProbeOutcome
where
    G: FnOnce() -> F,
    F: Future<Output = ProbeOutcome>,
{
    if GET_RETRY_STATUSES.contains(&status) {
        return get().await;
    }
    ProbeOutcome {
        accessible: is_accessible(status),
        status: Some(status),
        method: CheckMethod::Head,
    }
}
