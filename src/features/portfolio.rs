use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::client::CompletionClient;
use crate::error::CompletionError;
use crate::types::{CompletionOutcome, CompletionRequest};

const ANALYST_INSTRUCTION: &str = "You are a portfolio analyst. Assess diversification, \
concentration risk and sector exposure of the holdings provided. Be specific and brief, \
and do not give personalized investment advice.";

/// A position in the user's portfolio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub symbol: String,
    pub shares: f64,
    /// Last price in the portfolio currency.
    pub price: f64,
}

impl Holding {
    pub fn market_value(&self) -> f64 {
        self.shares * self.price
    }
}

/// Portfolio analyzer.
///
/// The analysis works only from the holdings it is given, so search grounding is
/// turned off.
pub struct PortfolioAnalyzer {
    client: Arc<CompletionClient>,
}

impl PortfolioAnalyzer {
    pub fn new(client: Arc<CompletionClient>) -> Self {
        Self { client }
    }

    pub async fn analyze(&self, holdings: &[Holding]) -> CompletionOutcome {
        match build_request(holdings) {
            Ok(request) => self.client.run(&request).await,
            Err(err) => CompletionOutcome::Failure(err.user_message()),
        }
    }
}

fn build_request(holdings: &[Holding]) -> Result<CompletionRequest, CompletionError> {
    if holdings.is_empty() {
        return Err(CompletionError::validation("portfolio has no holdings"));
    }

    let total: f64 = holdings.iter().map(Holding::market_value).sum();
    let mut prompt = String::from("Analyze this portfolio:\n");
    for holding in holdings {
        let value = holding.market_value();
        let weight = if total > 0.0 { value / total * 100.0 } else { 0.0 };
        prompt.push_str(&format!(
            "- {}: {} shares @ {:.2} = {:.2} ({:.1}%)\n",
            holding.symbol, holding.shares, holding.price, value, weight
        ));
    }
    prompt.push_str(&format!("Total value: {total:.2}"));

    Ok(CompletionRequest::new(prompt)?
        .with_system_instruction(Some(ANALYST_INSTRUCTION))
        .with_grounding(false))
}
