use thiserror::Error;

/// Aggregates every failure mode exposed by the completion client.
///
/// Callers that only need the coarse contract should use
/// [`CompletionError::user_message`]; callers that want to react differently to
/// exhausted retries and immediate rejections can match on [`FailureKind`].
#[derive(Debug, Error)]
pub enum CompletionError {
    /// Represents transport-layer or networking failures, including timeouts.
    #[error("transport error: {message}")]
    Transport { message: String },
    /// Signals validation failures in the request itself.
    #[error("invalid request: {message}")]
    Validation { message: String },
    /// Raised when building or validating configuration fails.
    #[error("invalid configuration for {field}: {reason}")]
    InvalidConfig {
        /// Name of the configuration field that failed validation.
        field: String,
        /// Additional context explaining why the field is invalid.
        reason: String,
    },
    /// Every permitted attempt ended in a retryable outcome.
    #[error("could not get a response after {attempts} attempts")]
    RetriesExhausted { attempts: u32 },
    /// The backend answered with a status that is never retried.
    #[error("request rejected with status {status}: {message}")]
    NonRetryable {
        /// HTTP status returned by the backend.
        status: u16,
        /// Upstream error message, kept verbatim for debugging.
        message: String,
    },
    /// The caller cancelled the call before it resolved.
    #[error("request cancelled after {attempts} attempts")]
    Cancelled {
        /// Number of attempts that were issued before cancellation.
        attempts: u32,
    },
}

/// Coarse classification of a [`CompletionError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Retryable outcomes until the attempt budget ran out.
    TransientExhausted,
    /// The backend rejected the request outright.
    NonRetryable,
    /// The call was abandoned by its caller.
    Cancelled,
    /// The request or configuration was invalid before anything was sent.
    InvalidRequest,
}

impl CompletionError {
    /// Creates a [`CompletionError::Transport`] from a textual description.
    ///
    /// # Examples
    ///
    /// ```
    /// use finboard_ai::error::CompletionError;
    ///
    /// let err = CompletionError::transport("dns lookup failed");
    /// assert!(matches!(err, CompletionError::Transport { .. }));
    /// ```
    pub fn transport<T: Into<String>>(message: T) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Creates a [`CompletionError::Validation`] from a textual description.
    pub fn validation<T: Into<String>>(message: T) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Returns the structured kind of this failure.
    ///
    /// A bare `Transport` error only escapes the retry loop when the transport
    /// itself could not be built, so it is grouped with the exhausted case.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Transport { .. } | Self::RetriesExhausted { .. } => {
                FailureKind::TransientExhausted
            }
            Self::NonRetryable { .. } => FailureKind::NonRetryable,
            Self::Cancelled { .. } => FailureKind::Cancelled,
            Self::Validation { .. } | Self::InvalidConfig { .. } => FailureKind::InvalidRequest,
        }
    }

    /// Produces the single generic string shown to end users.
    ///
    /// Rate limits, malformed bodies and network errors are intentionally not
    /// distinguished here.
    ///
    /// # Examples
    ///
    /// ```
    /// use finboard_ai::error::CompletionError;
    ///
    /// let err = CompletionError::RetriesExhausted { attempts: 5 };
    /// assert_eq!(err.user_message(), "Could not get a response after 5 attempts.");
    /// ```
    pub fn user_message(&self) -> String {
        match self {
            Self::RetriesExhausted { attempts } | Self::Cancelled { attempts } => {
                attempts_message(*attempts)
            }
            Self::NonRetryable { .. } | Self::Transport { .. } => attempts_message(1),
            Self::Validation { message } => format!("Invalid request: {message}"),
            Self::InvalidConfig { field, .. } => {
                format!("The assistant is not configured correctly ({field}).")
            }
        }
    }
}

fn attempts_message(attempts: u32) -> String {
    if attempts == 1 {
        "Could not get a response after 1 attempt.".to_string()
    } else {
        format!("Could not get a response after {attempts} attempts.")
    }
}
