use std::sync::Arc;

use crate::client::CompletionClient;
use crate::types::{CompletionOutcome, CompletionRequest, ConversationTurn, Speaker};

/// Number of earlier turns replayed into each prompt.
const HISTORY_WINDOW: usize = 10;

/// Conversational assistant keeping its own history.
///
/// The completion client is stateless, so the transcript of earlier turns is
/// folded into each prompt here.
pub struct ChatSession {
    client: Arc<CompletionClient>,
    history: Vec<ConversationTurn>,
}

impl ChatSession {
    pub fn new(client: Arc<CompletionClient>) -> Self {
        Self {
            client,
            history: Vec::new(),
        }
    }

    pub fn history(&self) -> &[ConversationTurn] {
        &self.history
    }

    /// Sends a user message and appends both turns to the history.
    ///
    /// Failures are recorded inline as an assistant turn carrying the generic
    /// failure string. Blank messages are ignored and return `None`.
    pub async fn send(&mut self, text: &str) -> Option<&ConversationTurn> {
        let text = text.trim();
        let prompt = self.build_prompt(text);
        let request = CompletionRequest::new(prompt).ok()?;

        self.history.push(ConversationTurn::user(text));
        let reply = match self.client.run(&request).await {
            CompletionOutcome::Success(result) => {
                ConversationTurn::assistant(result.text, result.citations)
            }
            CompletionOutcome::Failure(message) => ConversationTurn::assistant(message, Vec::new()),
        };
        self.history.push(reply);
        self.history.last()
    }

    pub fn clear(&mut self) {
        self.history.clear();
    }

    fn build_prompt(&self, text: &str) -> String {
        if text.is_empty() {
            return String::new();
        }

        let start = self.history.len().saturating_sub(HISTORY_WINDOW);
        let earlier = &self.history[start..];
        if earlier.is_empty() {
            return text.to_string();
        }

        let mut prompt = String::from("Conversation so far:\n");
        for turn in earlier {
            let speaker = match turn.speaker {
                Speaker::User => "User",
                Speaker::Assistant => "Assistant",
            };
            prompt.push_str(speaker);
            prompt.push_str(": ");
            prompt.push_str(&turn.text);
            prompt.push('\n');
        }
        prompt.push_str("\nUser: ");
        prompt.push_str(text);
        prompt
    }
}
