//! Shared data structures for completion requests, results and conversation turns.
//!
//! These types are the stable contract between the completion client and the
//! dashboard features that call it; none of them carry backend-specific wire details.

use serde::{Deserialize, Serialize};

use crate::error::CompletionError;

/// Persona used whenever a request does not carry its own system instruction.
pub const DEFAULT_SYSTEM_INSTRUCTION: &str = "You are a concise, helpful financial assistant \
embedded in a market dashboard. Answer clearly, prefer facts over speculation, mention \
uncertainty when data may be stale, and never present your answer as personalized \
investment advice.";

/// A single completion request.
///
/// Requests are immutable once built: the prompt is validated up front and a blank
/// system instruction counts as absent. Absent instructions resolve to the client's
/// configured persona, or [`DEFAULT_SYSTEM_INSTRUCTION`].
///
/// # Examples
///
/// ```
/// use finboard_ai::types::{CompletionRequest, DEFAULT_SYSTEM_INSTRUCTION};
///
/// let request = CompletionRequest::new("How did AAPL close today?").unwrap();
/// assert!(request.grounding_enabled());
/// assert_eq!(request.system_instruction(), DEFAULT_SYSTEM_INSTRUCTION);
///
/// let request = request.with_grounding(false);
/// assert!(!request.grounding_enabled());
///
/// assert!(CompletionRequest::new("   ").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletionRequest {
    prompt_text: String,
    system_instruction: Option<String>,
    grounding_enabled: bool,
}

impl CompletionRequest {
    /// Creates a grounded request using the default persona.
    ///
    /// # Errors
    ///
    /// Returns [`CompletionError::Validation`] when the prompt is empty after trimming.
    pub fn new(prompt_text: impl Into<String>) -> Result<Self, CompletionError> {
        let prompt_text = prompt_text.into();
        if prompt_text.trim().is_empty() {
            return Err(CompletionError::validation("prompt text must not be empty"));
        }
        Ok(Self {
            prompt_text,
            system_instruction: None,
            grounding_enabled: true,
        })
    }

    /// Replaces the system instruction; blank or missing values fall back to the default persona.
    pub fn with_system_instruction(mut self, instruction: Option<impl Into<String>>) -> Self {
        self.system_instruction = instruction
            .map(Into::into)
            .filter(|text: &String| !text.trim().is_empty());
        self
    }

    /// Enables or disables search grounding.
    pub fn with_grounding(mut self, enabled: bool) -> Self {
        self.grounding_enabled = enabled;
        self
    }

    pub fn prompt_text(&self) -> &str {
        &self.prompt_text
    }

    /// Instruction sent with this request, falling back to [`DEFAULT_SYSTEM_INSTRUCTION`].
    pub fn system_instruction(&self) -> &str {
        self.custom_system_instruction()
            .unwrap_or(DEFAULT_SYSTEM_INSTRUCTION)
    }

    /// Instruction explicitly set by the caller, if any.
    pub fn custom_system_instruction(&self) -> Option<&str> {
        self.system_instruction.as_deref()
    }

    pub fn grounding_enabled(&self) -> bool {
        self.grounding_enabled
    }
}

/// A web source backing part of a grounded answer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Citation {
    pub uri: String,
    pub title: String,
}

/// Normalized successful completion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionResult {
    /// Text of the primary candidate.
    pub text: String,
    /// Sources in the order the backend attributed them; empty for ungrounded answers.
    #[serde(default)]
    pub citations: Vec<Citation>,
}

/// Tagged value form of a finished call, for callers that do not use continuations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionOutcome {
    Success(CompletionResult),
    /// Generic user-facing failure string.
    Failure(String),
}

impl CompletionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Text to render in place of the result: the answer or the failure string.
    pub fn display_text(&self) -> &str {
        match self {
            Self::Success(result) => &result.text,
            Self::Failure(message) => message,
        }
    }
}

/// Who produced a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    User,
    Assistant,
}

/// One entry of a caller-owned conversation history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub speaker: Speaker,
    pub text: String,
    #[serde(default)]
    pub citations: Vec<Citation>,
}

impl ConversationTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::User,
            text: text.into(),
            citations: Vec::new(),
        }
    }

    pub fn assistant(text: impl Into<String>, citations: Vec<Citation>) -> Self {
        Self {
            speaker: Speaker::Assistant,
            text: text.into(),
            citations,
        }
    }
}
