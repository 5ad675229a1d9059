//! 金融看板的 AI 补全客户端 以及调用它的聊天 新闻摘要 组合分析功能

pub mod client;
pub mod config;
pub mod error;
pub mod features;
pub mod http;
pub mod provider;
pub mod types;

pub use client::CompletionClient;
pub use config::{ClientConfig, Credential, RetryPolicy, build_client};
pub use error::{CompletionError, FailureKind};
pub use tokio_util::sync::CancellationToken;
pub use types::*;
