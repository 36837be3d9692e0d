pub mod cache;
pub mod errors;
pub mod probe;
pub mod ssrf;

use crate::cache::{Clock, SystemClock, UrlCache, UrlCheckRecord};
use crate::errors::UrlCheckError;
use crate::probe::{HttpProbe, UrlProbe};
use log::debug;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::{timeout_at, Instant};

/// Default jitter floor: spacing requests closer than this defeats the point
/// of a polite sequential mode.
pub const MIN_DELAY_MILLIS: u64 = 100;

#[derive(Debug, Clone)]
pub enum DelayStrategy {
    None,
    /// Exactly the configured delay between requests.
    Fixed { millis: u64 },
    /// A delay in `base ± spread`, clamped below at the floor.
    Jittered {
        base_millis: u64,
        spread_millis: u64,
        floor_millis: u64,
    },
}

impl DelayStrategy {
    pub fn jittered(base_millis: u64, spread_millis: u64) -> DelayStrategy {
        DelayStrategy::Jittered {
            base_millis,
            spread_millis,
            floor_millis: MIN_DELAY_MILLIS,
        }
    }

    pub fn next_delay<R: Rng>(&self, rng: &mut R) -> Option<Duration> {
        match self {
            DelayStrategy::None => None,
            DelayStrategy::Fixed { millis } => Some(Duration::from_millis(*millis)),
            DelayStrategy::Jittered {
                base_millis,
                spread_millis,
                floor_millis,
            } => {
                let spread = *spread_millis as i64;
                let offset = if spread == 0 {
                    0
                } else {
                    rng.gen_range(-spread..=spread)
                };
                let millis = (*base_millis as i64 + offset).max(*floor_millis as i64).max(0);
                Some(Duration::from_millis(millis as u64))
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConcurrencyMode {
    /// One request at a time, with the configured inter-request delay.
    Sequential,
    /// Up to N requests in flight.
    Bounded(usize),
}

#[derive(Debug, Clone)]
pub struct UrlCheckerConfig {
    pub timeout: Duration,
    pub max_redirects: usize,
    pub sample_threshold: usize,
    pub min_sample: usize,
    pub max_sample: usize,
    pub cache_ttl: Duration,
    pub allowed_domains: Option<Vec<String>>,
    pub mode: ConcurrencyMode,
    pub delay: DelayStrategy,
    pub batch_deadline: Option<Duration>,
}

impl Default for UrlCheckerConfig {
    fn default() -> UrlCheckerConfig {
        UrlCheckerConfig {
            timeout: Duration::from_secs(10),
            max_redirects: 5,
            sample_threshold: 50,
            min_sample: 10,
            max_sample: 100,
            cache_ttl: Duration::from_secs(300),
            allowed_domains: None,
            mode: ConcurrencyMode::Bounded(8),
            delay: DelayStrategy::None,
            batch_deadline: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UrlBatchReport {
    /// Exact accessible count when everything was checked, otherwise
    /// `round(rate * valid_urls)`.
    pub accessible_estimate: u64,
    pub total_input: usize,
    pub valid_urls: usize,
    /// URLs actually checked (a deadline may cut the planned sample short).
    pub sample_size: usize,
    pub sampled: bool,
    pub rate: f64,
}

impl UrlBatchReport {
    fn empty(total_input: usize) -> UrlBatchReport {
        UrlBatchReport {
            accessible_estimate: 0,
            total_input,
            valid_urls: 0,
            sample_size: 0,
            sampled: false,
            rate: 0.0,
        }
    }
}

/// Reduces an arbitrary-size URL set to a single accessibility rate:
/// dedupe, SSRF-filter, sample, probe with caching, extrapolate.
pub struct UrlChecker {
    config: UrlCheckerConfig,
    probe: Arc<dyn UrlProbe>,
    cache: Arc<UrlCache>,
    clock: Arc<dyn Clock>,
}

impl UrlChecker {
    pub fn new(config: UrlCheckerConfig) -> Result<UrlChecker, UrlCheckError> {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let probe = Arc::new(HttpProbe::new(config.timeout, config.max_redirects)?);
        let cache = Arc::new(UrlCache::new(config.cache_ttl, clock.clone()));
        Ok(UrlChecker::with_parts(config, probe, cache, clock))
    }

    pub fn with_parts(
        config: UrlCheckerConfig,
        probe: Arc<dyn UrlProbe>,
        cache: Arc<UrlCache>,
        clock: Arc<dyn Clock>,
    ) -> UrlChecker {
        UrlChecker {
            config,
            probe,
            cache,
            clock,
        }
    }

    pub async fn check_batch(&self, urls: &[String]) -> UrlBatchReport {
        let total_input = urls.len();
        let mut seen = HashSet::new();
        let mut valid = vec![];
        for url in urls {
            if !seen.insert(url.as_str()) {
                continue;
            }
            match ssrf::blocked_reason(url, self.config.allowed_domains.as_deref()) {
                Some(reason) => debug!("Dropping URL `{}` before check: {}", url, reason),
                None => valid.push(url.clone()),
            }
        }
        let valid_count = valid.len();
        if valid_count == 0 {
            return UrlBatchReport::empty(total_input);
        }

        let planned = sample_size(valid_count, &self.config);
        let sample: Vec<String> = if planned < valid_count {
            let mut rng = rand::thread_rng();
            valid.choose_multiple(&mut rng, planned).cloned().collect()
        } else {
            valid
        };

        let deadline = self.config.batch_deadline.map(|d| Instant::now() + d);
        let results = match self.config.mode {
            ConcurrencyMode::Sequential => self.run_sequential(sample, deadline).await,
            ConcurrencyMode::Bounded(workers) => {
                self.run_bounded(sample, workers.max(1), deadline).await
            }
        };

        let checked = results.len();
        let accessible = results.iter().filter(|a| **a).count();
        let rate = if checked == 0 {
            0.0
        } else {
            accessible as f64 / checked as f64
        };
        let sampled = checked < valid_count;
        let accessible_estimate = if sampled {
            (rate * valid_count as f64).round() as u64
        } else {
            accessible as u64
        };
        UrlBatchReport {
            accessible_estimate,
            total_input,
            valid_urls: valid_count,
            sample_size: checked,
            sampled,
            rate,
        }
    }

    async fn run_sequential(&self, urls: Vec<String>, deadline: Option<Instant>) -> Vec<bool> {
        let mut results = vec![];
        let mut first = true;
        for url in urls {
            if deadline_passed(deadline) {
                break;
            }
            if !first {
                let delay = self.config.delay.next_delay(&mut rand::thread_rng());
                if let Some(delay) = delay {
                    // Never sleep past the batch deadline.
                    let delay = match deadline {
                        Some(at) => delay.min(at.saturating_duration_since(Instant::now())),
                        None => delay,
                    };
                    tokio::time::sleep(delay).await;
                }
            }
            first = false;
            if deadline_passed(deadline) {
                break;
            }
            results.push(
                check_cached(
                    self.probe.clone(),
                    self.cache.clone(),
                    self.clock.clone(),
                    url,
                )
                .await,
            );
        }
        results
    }

    async fn run_bounded(
        &self,
        urls: Vec<String>,
        workers: usize,
        deadline: Option<Instant>,
    ) -> Vec<bool> {
        let mut results = vec![];
        let mut join_set: JoinSet<bool> = JoinSet::new();
        let mut pending = urls.into_iter();
        loop {
            while join_set.len() < workers && !deadline_passed(deadline) {
                match pending.next() {
                    Some(url) => {
                        join_set.spawn(check_cached(
                            self.probe.clone(),
                            self.cache.clone(),
                            self.clock.clone(),
                            url,
                        ));
                    }
                    None => break,
                }
            }
            if join_set.is_empty() {
                break;
            }
            let joined = match deadline {
                Some(at) => match timeout_at(at, join_set.join_next()).await {
                    Ok(joined) => joined,
                    Err(_) => {
                        join_set.abort_all();
                        break;
                    }
                },
                None => join_set.join_next().await,
            };
            match joined {
                Some(Ok(accessible)) => results.push(accessible),
                Some(Err(_)) => {}
                None => break,
            }
        }
        results
    }
}

async fn check_cached(
    probe: Arc<dyn UrlProbe>,
    cache: Arc<UrlCache>,
    clock: Arc<dyn Clock>,
    url: String,
) -> bool {
    if let Some(record) = cache.get(&url) {
        return record.accessible;
    }
    let outcome = probe.probe(&url).await;
    let record = UrlCheckRecord {
        accessible: outcome.accessible,
        status: outcome.status,
        method: outcome.method,
        checked_at: clock.now(),
    };
    let accessible = record.accessible;
    cache.set(&url, record);
    accessible
}

fn deadline_passed(deadline: Option<Instant>) -> bool {
    match deadline {
        Some(at) => Instant::now() >= at,
        None => false,
    }
}

fn sample_size(n: usize, config: &UrlCheckerConfig) -> usize {
    if n <= config.sample_threshold {
        return n;
    }
    let scaled = (n as f64 / (n as f64).log10()).floor() as usize;
    scaled
        .max(config.min_sample)
        .min(config.max_sample)
        .min(n)
}
