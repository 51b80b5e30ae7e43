//! Timeout and retry policy shared by every downstream client.

use core_config::{ConfigError, FromEnv, env_parse_or};
use observability::DownstreamMetrics;
use observability::downstream::{OUTCOME_ERROR, OUTCOME_OK, OUTCOME_TIMEOUT};
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::error::{ImageSearchError, ImageSearchResult};

/// Retry configuration for downstream calls
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    /// Multiplier for exponential backoff (typically 2.0)
    pub backoff_multiplier: f64,
    pub use_jitter: bool,
}

impl RetryPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    pub fn without_jitter(mut self) -> Self {
        self.use_jitter = false;
        self
    }

    /// No retries at all.
    pub fn none() -> Self {
        Self::default().with_max_retries(0)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(2),
            backoff_multiplier: 2.0,
            use_jitter: true,
        }
    }
}

/// Per-call timeout, retry policy and fan-out bound for downstream calls.
#[derive(Debug, Clone)]
pub struct DownstreamConfig {
    pub timeout: Duration,
    pub retry: RetryPolicy,
    pub asset_fetch_concurrency: usize,
    /// Largest asset body read into memory before it is base64 encoded
    pub max_asset_bytes: usize,
}

/// 20 MiB.
pub const DEFAULT_MAX_ASSET_BYTES: usize = 20 * 1024 * 1024;

impl Default for DownstreamConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
            asset_fetch_concurrency: 4,
            max_asset_bytes: DEFAULT_MAX_ASSET_BYTES,
        }
    }
}

impl FromEnv for DownstreamConfig {
    /// - DOWNSTREAM_TIMEOUT_SECS: defaults to 30
    /// - DOWNSTREAM_MAX_RETRIES: defaults to 2
    /// - ASSET_FETCH_CONCURRENCY: defaults to 4, at least 1
    /// - ASSET_MAX_BYTES: defaults to 20 MiB, at least 1
    fn from_env() -> Result<Self, ConfigError> {
        let timeout_secs = env_parse_or("DOWNSTREAM_TIMEOUT_SECS", 30u64)?;
        let max_retries = env_parse_or("DOWNSTREAM_MAX_RETRIES", 2u32)?;
        let concurrency = env_parse_or("ASSET_FETCH_CONCURRENCY", 4usize)?;
        let max_asset_bytes = env_parse_or("ASSET_MAX_BYTES", DEFAULT_MAX_ASSET_BYTES)?;

        Ok(Self {
            timeout: Duration::from_secs(timeout_secs),
            retry: RetryPolicy::default().with_max_retries(max_retries),
            asset_fetch_concurrency: concurrency.max(1),
            max_asset_bytes: max_asset_bytes.max(1),
        })
    }
}

const MAX_ERROR_BODY_CHARS: usize = 512;

/// Build a reqwest client that gives up on any single request after `timeout`.
pub fn http_client(timeout: Duration) -> ImageSearchResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| ImageSearchError::Config(format!("Failed to build HTTP client: {}", e)))
}

/// Turn a non-2xx response into [`ImageSearchError::Upstream`], keeping a bounded excerpt of the body.
pub async fn ensure_success(
    service: &'static str,
    response: reqwest::Response,
) -> ImageSearchResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let excerpt: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();

    Err(ImageSearchError::Upstream {
        service,
        status: Some(status.as_u16()),
        message: if excerpt.is_empty() {
            status.to_string()
        } else {
            format!("{}: {}", status, excerpt)
        },
    })
}

/// Run `operation`, retrying transient failures with exponential backoff.
///
/// The whole sequence is recorded as one downstream call for `service`.
pub async fn call_with_retry<F, Fut, T>(
    service: &'static str,
    policy: &RetryPolicy,
    mut operation: F,
) -> ImageSearchResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ImageSearchResult<T>>,
{
    let started = Instant::now();
    let mut attempt = 0;
    let mut delay = policy.initial_delay;

    let result = loop {
        match operation().await {
            Ok(value) => {
                if attempt > 0 {
                    debug!(service, "Call succeeded after {} retries", attempt);
                }
                break Ok(value);
            }
            Err(e) if e.is_transient() && attempt < policy.max_retries => {
                attempt += 1;

                let wait = if policy.use_jitter {
                    apply_jitter(delay)
                } else {
                    delay
                };

                warn!(
                    service,
                    "Transient failure (attempt {}/{}): {}. Retrying in {}ms",
                    attempt,
                    policy.max_retries,
                    e,
                    wait.as_millis()
                );

                tokio::time::sleep(wait).await;

                delay = delay.mul_f64(policy.backoff_multiplier).min(policy.max_delay);
            }
            Err(e) => break Err(e),
        }
    };

    let outcome = match &result {
        Ok(_) => OUTCOME_OK,
        Err(ImageSearchError::Timeout { .. }) => OUTCOME_TIMEOUT,
        Err(_) => OUTCOME_ERROR,
    };
    DownstreamMetrics::record_call(service, outcome, started.elapsed());

    result
}

/// Scale `delay` to a pseudo-random 50-100% of itself.
fn apply_jitter(delay: Duration) -> Duration {
    use std::collections::hash_map::RandomState;
    use std::hash::BuildHasher;

    let random_factor =
        (RandomState::new().hash_one(std::time::SystemTime::now()) % 50) as f64 / 100.0 + 0.5;

    delay.mul_f64(random_factor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn unavailable() -> ImageSearchError {
        ImageSearchError::Upstream {
            service: "vision",
            status: Some(503),
            message: "503 Service Unavailable".into(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_transient_failures_until_success() {
        let counter = Arc::new(AtomicU32::new(0));
        let policy = RetryPolicy::new().without_jitter();

        let result = call_with_retry("vision", &policy, || {
            let counter = counter.clone();
            async move {
                if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(unavailable())
                } else {
                    Ok("vector")
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "vector");
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_max_retries() {
        let counter = Arc::new(AtomicU32::new(0));
        let policy = RetryPolicy::new().with_max_retries(1);

        let result: ImageSearchResult<()> = call_with_retry("search", &policy, || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(ImageSearchError::Timeout { service: "search" })
            }
        })
        .await;

        assert!(matches!(result, Err(ImageSearchError::Timeout { .. })));
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_permanent_failure_is_not_retried() {
        let counter = Arc::new(AtomicU32::new(0));

        let result: ImageSearchResult<()> = call_with_retry("chat", &RetryPolicy::new(), || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(ImageSearchError::Upstream {
                    service: "chat",
                    status: Some(401),
                    message: "401 Unauthorized".into(),
                })
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_jitter_stays_within_bounds() {
        let delay = Duration::from_millis(1000);
        for _ in 0..20 {
            let jittered = apply_jitter(delay);
            assert!(jittered >= Duration::from_millis(500));
            assert!(jittered <= delay);
        }
    }

    #[test]
    fn test_downstream_config_from_env() {
        temp_env::with_vars(
            [
                ("DOWNSTREAM_TIMEOUT_SECS", Some("5")),
                ("DOWNSTREAM_MAX_RETRIES", Some("0")),
                ("ASSET_FETCH_CONCURRENCY", Some("0")),
                ("ASSET_MAX_BYTES", Some("1024")),
            ],
            || {
                let config = DownstreamConfig::from_env().unwrap();
                assert_eq!(config.timeout, Duration::from_secs(5));
                assert_eq!(config.retry.max_retries, 0);
                assert_eq!(config.asset_fetch_concurrency, 1);
                assert_eq!(config.max_asset_bytes, 1024);
            },
        );
    }

    #[test]
    fn test_downstream_config_defaults_cap_asset_size() {
        temp_env::with_var_unset("ASSET_MAX_BYTES", || {
            let config = DownstreamConfig::from_env().unwrap();
            assert_eq!(config.max_asset_bytes, DEFAULT_MAX_ASSET_BYTES);
        });
    }
}
