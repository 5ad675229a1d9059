use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::client::CompletionClient;
use crate::error::CompletionError;
use crate::http::DynHttpTransport;
use crate::provider::GoogleGeminiProvider;

/// 重试策略 默认 5 次尝试 基础退避 1000ms
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// 单次调用最多发出的请求数 包含首次请求
    pub max_attempts: u32,
    /// 第 n 次失败后等待 base_delay_ms * 2^n 毫秒
    pub base_delay_ms: u64,
    /// 单次请求超时 留空时交给底层 transport
    pub attempt_timeout_ms: Option<u64>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay_ms: 1000,
            attempt_timeout_ms: None,
        }
    }
}

impl RetryPolicy {
    /// 校验策略是否可用
    pub fn validate(&self) -> Result<(), CompletionError> {
        if self.max_attempts == 0 {
            return Err(CompletionError::InvalidConfig {
                field: "retry.max_attempts".to_string(),
                reason: "at least one attempt is required".to_string(),
            });
        }
        if self.attempt_timeout_ms == Some(0) {
            return Err(CompletionError::InvalidConfig {
                field: "retry.attempt_timeout_ms".to_string(),
                reason: "timeout must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    pub fn attempt_timeout(&self) -> Option<Duration> {
        self.attempt_timeout_ms.map(Duration::from_millis)
    }
}

/// 鉴权信息
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Credential {
    /// 简单 API Key
    ApiKey { key: String },
    /// 部署时不携带凭证 由外部代理注入
    #[default]
    None,
}

/// 客户端配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    pub base_url: Option<String>,
    /// 例如 `gemini-2.5-flash`
    pub model: Option<String>,
    #[serde(default)]
    pub credential: Credential,
    /// 覆盖默认 persona
    pub system_instruction: Option<String>,
    #[serde(default)]
    pub retry: RetryPolicy,
}

impl ClientConfig {
    /// 从环境变量读取 GEMINI_API_KEY / GEMINI_MODEL / GEMINI_BASE_URL
    pub fn from_env() -> Self {
        let non_empty = |name: &str| env::var(name).ok().filter(|v| !v.trim().is_empty());

        Self {
            base_url: non_empty("GEMINI_BASE_URL"),
            model: non_empty("GEMINI_MODEL"),
            credential: non_empty("GEMINI_API_KEY")
                .map(|key| Credential::ApiKey { key })
                .unwrap_or_default(),
            system_instruction: None,
            retry: RetryPolicy::default(),
        }
    }
}

/// 根据配置构建 CompletionClient
pub fn build_client(
    config: &ClientConfig,
    transport: DynHttpTransport,
) -> Result<CompletionClient, CompletionError> {
    config.retry.validate()?;

    let api_key = match &config.credential {
        Credential::ApiKey { key } => {
            reqwest::header::HeaderValue::from_str(key).map_err(|_| {
                CompletionError::InvalidConfig {
                    field: "credential.key".to_string(),
                    reason: "key must be visible ASCII without line breaks".to_string(),
                }
            })?;
            key.clone()
        }
        Credential::None => String::new(),
    };
    let mut provider = GoogleGeminiProvider::new(transport, api_key);

    if let Some(base_url) = &config.base_url {
        provider = provider.with_base_url(base_url.clone());
    }
    if let Some(model) = &config.model {
        provider = provider.with_model(model.clone());
    }

    let mut client = CompletionClient::new(provider).with_policy(config.retry.clone());
    if let Some(instruction) = &config.system_instruction {
        client = client.with_default_instruction(instruction.clone());
    }
    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::reqwest::default_dyn_transport;

    #[test]
    fn retry_policy_deserializes_with_defaults() {
        let policy: RetryPolicy =
            serde_json::from_value(serde_json::json!({ "base_delay_ms": 250 })).expect("policy");
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.base_delay_ms, 250);
        assert_eq!(policy.attempt_timeout(), None);
    }

    #[test]
    fn client_config_deserializes_credential() {
        let config: ClientConfig = serde_json::from_value(serde_json::json!({
            "model": "gemini-2.0-flash",
            "credential": { "type": "api_key", "key": "secret" },
            "retry": { "max_attempts": 3, "attempt_timeout_ms": 15000 }
        }))
        .expect("config");

        assert!(matches!(config.credential, Credential::ApiKey { ref key } if key == "secret"));
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.retry.base_delay_ms, 1000);
        assert_eq!(
            config.retry.attempt_timeout(),
            Some(Duration::from_secs(15))
        );
    }

    /// 未配置凭证时也可以构建 客户端保持默认策略
    #[test]
    fn build_client_accepts_missing_credential() {
        let transport = default_dyn_transport().expect("transport");
        let client = build_client(&ClientConfig::default(), transport).expect("client");
        assert_eq!(client.policy(), &RetryPolicy::default());
    }

    #[test]
    fn build_client_rejects_zero_attempts() {
        let transport = default_dyn_transport().expect("transport");
        let config = ClientConfig {
            retry: RetryPolicy {
                max_attempts: 0,
                ..RetryPolicy::default()
            },
            ..ClientConfig::default()
        };

        match build_client(&config, transport) {
            Err(CompletionError::InvalidConfig { field, .. }) => {
                assert_eq!(field, "retry.max_attempts");
            }
            Ok(_) => panic!("expected invalid config"),
            Err(other) => panic!("unexpected error type: {other:?}"),
        }
    }

    #[test]
    fn build_client_rejects_key_that_cannot_be_sent_as_header() {
        let transport = default_dyn_transport().expect("transport");
        let config = ClientConfig {
            credential: Credential::ApiKey {
                key: "abc\ndef".to_string(),
            },
            ..ClientConfig::default()
        };

        match build_client(&config, transport) {
            Err(CompletionError::InvalidConfig { field, .. }) => {
                assert_eq!(field, "credential.key");
            }
            Ok(_) => panic!("expected invalid config"),
            Err(other) => panic!("unexpected error type: {other:?}"),
        }
    }
}
