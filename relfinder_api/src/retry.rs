//! Retry policy for transient transport failures.

use std::fmt;
use std::time::Duration;

use rand::Rng;

/// A transient failure observed on one attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    Timeout,
    Connection(String),
    Status(u16),
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Failure::Timeout => write!(f, "read timed out"),
            Failure::Connection(msg) => write!(f, "connection aborted: {}", msg),
            Failure::Status(status) => write!(f, "http status {}", status),
        }
    }
}

/// How the transport reacts to transient failures.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RetryPolicy {
    /// Never give up. Timeouts are retried immediately; connection failures
    /// and HTTP errors wait for the request timeout before the next attempt.
    #[default]
    Unbounded,
    /// Give up after `max_attempts` attempts, waiting
    /// `base_delay * 2^(attempt-1)` (capped at `max_delay`, ±20% jitter)
    /// between them.
    Bounded {
        max_attempts: u32,
        base_delay: Duration,
        max_delay: Duration,
    },
}

impl RetryPolicy {
    /// Delay before the attempt following `attempt` (1-based), or `None` to give up.
    pub fn next_delay(&self, attempt: u32, failure: &Failure, timeout: Duration) -> Option<Duration> {
        match self {
            RetryPolicy::Unbounded => Some(match failure {
                Failure::Timeout => Duration::ZERO,
                Failure::Connection(_) | Failure::Status(_) => timeout,
            }),
            RetryPolicy::Bounded {
                max_attempts,
                base_delay,
                max_delay,
            } => {
                if attempt >= *max_attempts {
                    return None;
                }
                let shift = attempt.saturating_sub(1).min(30);
                let base = base_delay
                    .saturating_mul(1u32 << shift)
                    .min(*max_delay);
                let jitter = rand::thread_rng().gen_range(0.8..1.2);
                Some(base.mul_f64(jitter))
            }
        }
    }
}
