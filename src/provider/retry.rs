use std::fmt;
use std::time::Duration;

use crate::config::RetryPolicy;
use crate::error::CompletionError;
use crate::types::CompletionResult;

/// HTTP status the backend uses to signal throttling.
pub(crate) const RATE_LIMIT_STATUS: u16 = 429;

/// Why a single attempt should be retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RetryReason {
    /// No response was obtained (network failure or per-attempt timeout).
    Transport(String),
    /// 2xx status, but the body had no usable primary candidate text.
    Malformed,
    /// The backend answered 429.
    RateLimited(String),
}

impl fmt::Display for RetryReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(message) => write!(f, "transport failure: {message}"),
            Self::Malformed => f.write_str("malformed response body"),
            Self::RateLimited(message) => write!(f, "rate limited: {message}"),
        }
    }
}

/// Classification of one attempt.
#[derive(Debug)]
pub(crate) enum AttemptOutcome {
    Success(CompletionResult),
    Retryable(RetryReason),
    Fatal { status: u16, message: String },
    /// The request never left the process, e.g. a header the transport refused to build.
    Rejected(CompletionError),
}

/// Ephemeral per-call attempt bookkeeping; never outlives one `execute` future.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RetryState {
    pub(crate) attempt_index: u32,
    pub(crate) max_attempts: u32,
}

impl RetryState {
    /// A policy that slipped past validation with zero attempts still gets one.
    pub(crate) fn new(policy: &RetryPolicy) -> Self {
        Self {
            attempt_index: 0,
            max_attempts: policy.max_attempts.max(1),
        }
    }

    /// Number of attempts issued so far, counting the current one.
    pub(crate) fn attempts_made(&self) -> u32 {
        self.attempt_index + 1
    }

    pub(crate) fn is_last_attempt(&self) -> bool {
        self.attempts_made() >= self.max_attempts
    }
}

/// Computes `base_delay * 2^attempt_index` without jitter, saturating on overflow.
///
/// With the default one second base the waits are 1s, 2s, 4s, 8s.
pub(crate) fn backoff_delay(policy: &RetryPolicy, attempt_index: u32) -> Duration {
    let factor = 1u64.checked_shl(attempt_index).unwrap_or(u64::MAX);
    Duration::from_millis(policy.base_delay_ms.saturating_mul(factor))
}
