use std::sync::Arc;

use futures_util::future::join_all;
use serde::{Deserialize, Serialize};

use crate::client::CompletionClient;
use crate::error::CompletionError;
use crate::types::{CompletionOutcome, CompletionRequest};

const SUMMARY_INSTRUCTION: &str = "You are a financial news editor. Summarize the most \
recent, relevant news for the requested company in three short bullet points, citing \
sources where possible. Do not give investment advice.";

/// One watchlist entry to summarize.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsItem {
    /// Ticker symbol such as `AAPL`.
    pub symbol: String,
    /// Company display name.
    pub name: String,
}

/// Per-item news summarizer using search grounding.
pub struct NewsSummarizer {
    client: Arc<CompletionClient>,
}

impl NewsSummarizer {
    pub fn new(client: Arc<CompletionClient>) -> Self {
        Self { client }
    }

    /// Summarizes recent news for one item.
    pub async fn summarize(&self, item: &NewsItem) -> CompletionOutcome {
        match build_request(item) {
            Ok(request) => self.client.run(&request).await,
            Err(err) => CompletionOutcome::Failure(err.user_message()),
        }
    }

    /// Summarizes several items concurrently; results keep the input order.
    ///
    /// Each summary retries on its own schedule and a failure in one never affects another.
    pub async fn summarize_all(&self, items: &[NewsItem]) -> Vec<CompletionOutcome> {
        join_all(items.iter().map(|item| self.summarize(item))).await
    }
}

fn build_request(item: &NewsItem) -> Result<CompletionRequest, CompletionError> {
    let symbol = item.symbol.trim();
    if symbol.is_empty() {
        return Err(CompletionError::validation("news item requires a symbol"));
    }
    let name = item.name.trim();
    let subject = if name.is_empty() {
        symbol.to_string()
    } else {
        format!("{name} ({symbol})")
    };

    Ok(CompletionRequest::new(format!(
        "Summarize the latest market news about {subject}."
    ))?
    .with_system_instruction(Some(SUMMARY_INSTRUCTION))
    .with_grounding(true))
}
