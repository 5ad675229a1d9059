use std::collections::HashMap;
use std::time::Duration;

use tracing::debug;

use crate::error::CompletionError;
use crate::http::{DynHttpTransport, HttpResponse, post_json_with_headers};
use crate::provider::retry::{AttemptOutcome, RATE_LIMIT_STATUS, RetryReason};
use crate::types::CompletionRequest;

use super::error::parse_gemini_error;
use super::request::build_gemini_body;
use super::response::map_response;
use super::types::GeminiGenerateContentResponse;

pub(crate) const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub(crate) const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Google Gemini GenerateContent endpoint performing exactly one attempt per call.
///
/// Retrying is the caller's job; this type only builds the payload, sends it and
/// classifies what came back.
#[derive(Clone)]
pub struct GoogleGeminiProvider {
    pub(crate) transport: DynHttpTransport,
    pub(crate) base_url: String,
    pub(crate) api_key: Option<String>,
    pub(crate) model: String,
}

impl GoogleGeminiProvider {
    /// Creates a provider that targets the default Google Generative Language endpoint.
    ///
    /// An empty key is allowed: the request is sent without credentials and the
    /// backend decides.
    pub fn new(transport: DynHttpTransport, api_key: impl Into<String>) -> Self {
        let api_key = api_key.into();
        Self {
            transport,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: (!api_key.trim().is_empty()).then_some(api_key),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    /// Overrides the base URL, making it easier to point at proxies or compatibility layers.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Sets the model, such as `gemini-2.5-flash`.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Builds the non-streaming endpoint URL for GenerateContent.
    pub(crate) fn endpoint(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        let model_path = normalize_model(&self.model);
        if base.ends_with("/v1beta") {
            format!("{base}/{model_path}:generateContent")
        } else {
            format!("{base}/v1beta/{model_path}:generateContent")
        }
    }

    fn build_headers(&self) -> HashMap<String, String> {
        let mut headers = HashMap::new();
        if let Some(key) = &self.api_key {
            headers.insert("x-goog-api-key".to_string(), key.clone());
        }
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        headers.insert("Accept".to_string(), "application/json".to_string());
        headers
    }

    /// Sends one request and classifies the result.
    pub(crate) async fn attempt(
        &self,
        request: &CompletionRequest,
        system_instruction: &str,
        timeout: Option<Duration>,
    ) -> AttemptOutcome {
        let body = build_gemini_body(request, system_instruction);
        let response = post_json_with_headers(
            self.transport.as_ref(),
            self.endpoint(),
            self.build_headers(),
            &body,
            timeout,
        )
        .await;

        match response {
            Ok(response) => classify_response(response, request.grounding_enabled()),
            Err(err @ CompletionError::Validation { .. }) => AttemptOutcome::Rejected(err),
            Err(err) => AttemptOutcome::Retryable(RetryReason::Transport(err.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        "google_gemini"
    }
}

fn classify_response(response: HttpResponse, grounding_requested: bool) -> AttemptOutcome {
    if response.is_success() {
        let parsed = serde_json::from_slice::<GeminiGenerateContentResponse>(&response.body);
        return match parsed {
            Ok(parsed) => match map_response(parsed, grounding_requested) {
                Some(result) => AttemptOutcome::Success(result),
                None => AttemptOutcome::Retryable(RetryReason::Malformed),
            },
            Err(err) => {
                debug!(error = %err, "failed to parse Gemini response");
                AttemptOutcome::Retryable(RetryReason::Malformed)
            }
        };
    }

    let HttpResponse { status, body, .. } = response;
    let text = String::from_utf8_lossy(&body);
    let message = parse_gemini_error(status, &text);
    if status == RATE_LIMIT_STATUS {
        AttemptOutcome::Retryable(RetryReason::RateLimited(message))
    } else {
        AttemptOutcome::Fatal { status, message }
    }
}

fn normalize_model(model: &str) -> String {
    if model.starts_with("models/") {
        model.to_string()
    } else {
        format!("models/{model}")
    }
}
