use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::RetryPolicy;
use crate::error::CompletionError;
use crate::provider::GoogleGeminiProvider;
use crate::provider::retry::{AttemptOutcome, RetryReason, RetryState, backoff_delay};
use crate::types::{
    CompletionOutcome, CompletionRequest, CompletionResult, DEFAULT_SYSTEM_INSTRUCTION,
};

/// 带重试的补全客户端
///
/// 每次调用彼此独立 重试计数与退避只存在于单次调用内部 可以被多个功能并发共享。
#[derive(Clone)]
pub struct CompletionClient {
    provider: GoogleGeminiProvider,
    policy: RetryPolicy,
    default_instruction: Option<String>,
}

impl CompletionClient {
    /// 使用默认重试策略创建客户端
    pub fn new(provider: GoogleGeminiProvider) -> Self {
        Self {
            provider,
            policy: RetryPolicy::default(),
            default_instruction: None,
        }
    }

    /// 覆盖重试策略 `max_attempts` 为 0 时按 1 次处理
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// 请求未指定 system instruction 时使用的 persona
    pub fn with_default_instruction(mut self, instruction: impl Into<String>) -> Self {
        let instruction = instruction.into();
        self.default_instruction = (!instruction.trim().is_empty()).then_some(instruction);
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// 发送请求 直到成功 遇到不可重试错误 或用尽重试次数
    pub async fn execute(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResult, CompletionError> {
        self.execute_inner(request, None).await
    }

    /// 与 [`Self::execute`] 相同 但取消后不再发起请求或等待退避
    pub async fn execute_cancellable(
        &self,
        request: &CompletionRequest,
        cancel: &CancellationToken,
    ) -> Result<CompletionResult, CompletionError> {
        self.execute_inner(request, Some(cancel)).await
    }

    /// 回调形式 两个回调中恰好调用一个 且只调用一次
    pub async fn execute_with<S, F>(&self, request: &CompletionRequest, on_success: S, on_failure: F)
    where
        S: FnOnce(CompletionResult),
        F: FnOnce(String),
    {
        match self.execute(request).await {
            Ok(result) => on_success(result),
            Err(err) => on_failure(err.user_message()),
        }
    }

    /// 可取消的回调形式 取消后两个回调都不会被调用
    pub async fn execute_with_cancel<S, F>(
        &self,
        request: &CompletionRequest,
        cancel: &CancellationToken,
        on_success: S,
        on_failure: F,
    ) where
        S: FnOnce(CompletionResult),
        F: FnOnce(String),
    {
        match self.execute_cancellable(request, cancel).await {
            Ok(result) => on_success(result),
            Err(CompletionError::Cancelled { .. }) => {}
            Err(err) => on_failure(err.user_message()),
        }
    }

    /// 面向调用方的便捷入口 直接接受原始 prompt
    ///
    /// 空 prompt 不会发出请求 而是直接走失败回调。
    pub async fn execute_prompt<S, F>(
        &self,
        prompt_text: &str,
        on_success: S,
        on_failure: F,
        system_instruction: Option<&str>,
        grounding_enabled: Option<bool>,
    ) where
        S: FnOnce(CompletionResult),
        F: FnOnce(String),
    {
        match CompletionRequest::new(prompt_text) {
            Ok(request) => {
                let request = request
                    .with_system_instruction(system_instruction)
                    .with_grounding(grounding_enabled.unwrap_or(true));
                self.execute_with(&request, on_success, on_failure).await;
            }
            Err(err) => on_failure(err.user_message()),
        }
    }

    /// 值形式 成功或通用失败文案
    pub async fn run(&self, request: &CompletionRequest) -> CompletionOutcome {
        match self.execute(request).await {
            Ok(result) => CompletionOutcome::Success(result),
            Err(err) => CompletionOutcome::Failure(err.user_message()),
        }
    }

    fn resolve_instruction<'a>(&'a self, request: &'a CompletionRequest) -> &'a str {
        request
            .custom_system_instruction()
            .or(self.default_instruction.as_deref())
            .unwrap_or(DEFAULT_SYSTEM_INSTRUCTION)
    }

    async fn execute_inner(
        &self,
        request: &CompletionRequest,
        cancel: Option<&CancellationToken>,
    ) -> Result<CompletionResult, CompletionError> {
        let instruction = self.resolve_instruction(request);
        let timeout = self.policy.attempt_timeout();
        let mut state = RetryState::new(&self.policy);

        loop {
            if cancel.is_some_and(CancellationToken::is_cancelled) {
                info!(
                    attempts = state.attempt_index,
                    "completion cancelled before next attempt"
                );
                return Err(CompletionError::Cancelled {
                    attempts: state.attempt_index,
                });
            }

            debug!(
                attempt = state.attempts_made(),
                max_attempts = state.max_attempts,
                grounding = request.grounding_enabled(),
                provider = self.provider.name(),
                "sending completion attempt"
            );

            let attempt = bounded(timeout, self.provider.attempt(request, instruction, timeout));
            let Some(outcome) = until_cancelled(cancel, attempt).await else {
                info!(
                    attempts = state.attempts_made(),
                    "completion cancelled during attempt"
                );
                return Err(CompletionError::Cancelled {
                    attempts: state.attempts_made(),
                });
            };

            let reason = match outcome {
                AttemptOutcome::Success(result) => {
                    debug!(
                        attempt = state.attempts_made(),
                        citations = result.citations.len(),
                        "completion succeeded"
                    );
                    return Ok(result);
                }
                AttemptOutcome::Fatal { status, message } => {
                    warn!(status, %message, "completion rejected, not retrying");
                    return Err(CompletionError::NonRetryable { status, message });
                }
                AttemptOutcome::Rejected(err) => {
                    warn!(error = %err, "request could not be built, not retrying");
                    return Err(err);
                }
                AttemptOutcome::Retryable(reason) => reason,
            };

            if state.is_last_attempt() {
                warn!(
                    attempts = state.attempts_made(),
                    %reason,
                    "completion attempts exhausted"
                );
                return Err(CompletionError::RetriesExhausted {
                    attempts: state.attempts_made(),
                });
            }

            let delay = backoff_delay(&self.policy, state.attempt_index);
            warn!(
                attempt = state.attempts_made(),
                %reason,
                delay_ms = delay.as_millis() as u64,
                "completion attempt failed, backing off"
            );
            if until_cancelled(cancel, tokio::time::sleep(delay))
                .await
                .is_none()
            {
                info!(
                    attempts = state.attempts_made(),
                    "completion cancelled during backoff"
                );
                return Err(CompletionError::Cancelled {
                    attempts: state.attempts_made(),
                });
            }
            state.attempt_index += 1;
        }
    }
}

/// 单次尝试的超时 不依赖 transport 自己是否遵守 `HttpRequest::timeout`
async fn bounded<F>(limit: Option<Duration>, attempt: F) -> AttemptOutcome
where
    F: Future<Output = AttemptOutcome>,
{
    let Some(limit) = limit else {
        return attempt.await;
    };
    match tokio::time::timeout(limit, attempt).await {
        Ok(outcome) => outcome,
        Err(_) => AttemptOutcome::Retryable(RetryReason::Transport(format!(
            "attempt timed out after {}ms",
            limit.as_millis()
        ))),
    }
}

/// 在取消信号与 future 之间竞速 取消时返回 None
async fn until_cancelled<F: Future>(
    cancel: Option<&CancellationToken>,
    future: F,
) -> Option<F::Output> {
    match cancel {
        Some(token) => {
            tokio::select! {
                biased;
                _ = token.cancelled() => None,
                output = future => Some(output),
            }
        }
        None => Some(future.await),
    }
}
