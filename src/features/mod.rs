//! Dashboard features built on top of [`crate::client::CompletionClient`].
//!
//! Each feature owns its own prompt construction and state; none of them share
//! anything with the client or with each other beyond an `Arc` to the client.

pub mod chat;
pub mod portfolio;
pub mod summary;

pub use chat::ChatSession;
pub use portfolio::{Holding, PortfolioAnalyzer};
pub use summary::{NewsItem, NewsSummarizer};
