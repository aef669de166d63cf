use std::time::Duration;

use common::models::OptionChain;
use rand::Rng;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::{error::FetchError, traits::OptionChainSource};

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub attempts: u32,
    /// Wait after failed attempt `n` is `n * step`.
    pub step: Duration,
    pub jitter_min: Duration,
    pub jitter_max: Duration,
}

impl RetryPolicy {
    pub fn new(attempts: u32) -> Self {
        Self {
            attempts: attempts.max(1),
            step: Duration::from_secs(5),
            jitter_min: Duration::from_secs(1),
            jitter_max: Duration::from_secs(3),
        }
    }

    /// No waiting at all; used for tests and replays.
    pub fn immediate(attempts: u32) -> Self {
        Self {
            attempts: attempts.max(1),
            step: Duration::ZERO,
            jitter_min: Duration::ZERO,
            jitter_max: Duration::ZERO,
        }
    }

    pub fn backoff(&self, attempt: u32) -> Duration {
        self.step.saturating_mul(attempt)
    }

    pub fn jitter(&self) -> Duration {
        let (lo, hi) = if self.jitter_min <= self.jitter_max {
            (self.jitter_min, self.jitter_max)
        } else {
            (self.jitter_max, self.jitter_min)
        };
        let lo_ms = lo.as_millis() as u64;
        let hi_ms = hi.as_millis() as u64;
        if lo_ms == hi_ms {
            return lo;
        }
        Duration::from_millis(rand::rng().random_range(lo_ms..=hi_ms))
    }
}

pub struct ChainPoller {
    source: Box<dyn OptionChainSource>,
    policy: RetryPolicy,
    verbose: bool,
}

impl ChainPoller {
    pub fn new(source: Box<dyn OptionChainSource>, policy: RetryPolicy) -> Self {
        Self {
            source,
            policy,
            verbose: false,
        }
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub async fn fetch_with_retry(&self, symbol: &str) -> Result<OptionChain, FetchError> {
        let attempts = self.policy.attempts;
        let mut last_error = None;

        for attempt in 1..=attempts {
            info!("Fetch attempt {}/{} for {}", attempt, attempts, symbol);

            let jitter = self.policy.jitter();
            if !jitter.is_zero() {
                sleep(jitter).await;
            }

            match self.source.fetch_chain(symbol).await {
                Ok(chain) => return Ok(chain),
                Err(e) => {
                    if self.verbose {
                        warn!("Error on attempt {}/{}: {:?}", attempt, attempts, e);
                    } else {
                        warn!("Error on attempt {}/{}: {}", attempt, attempts, e);
                    }
                    last_error = Some(e);
                }
            }

            if attempt < attempts {
                let wait = self.policy.backoff(attempt);
                if !wait.is_zero() {
                    info!("Waiting {}s before retry...", wait.as_secs());
                    sleep(wait).await;
                }
            }
        }

        let last = last_error.unwrap_or_else(|| FetchError::MalformedPayload("no attempt made".to_string()));
        if last.is_blocked() {
            warn!("Upstream is blocking requests from this host; consider a fallback CSV or another host");
        }
        Err(FetchError::RetriesExhausted {
            attempts,
            last: Box::new(last),
        })
    }
}
