#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use finboard_ai::error::CompletionError;
use finboard_ai::http::{HttpRequest, HttpResponse, HttpTransport};
use finboard_ai::provider::GoogleGeminiProvider;
use finboard_ai::{CompletionClient, RetryPolicy};
use serde_json::{Value, json};
use tokio::time::Instant;

/// One scripted reaction of the fake backend.
#[derive(Debug, Clone)]
pub enum Reply {
    Status(u16, String),
    NetworkError,
    /// Never answers; the attempt only ends through a timeout or cancellation.
    Hang,
}

impl Reply {
    pub fn text(text: &str) -> Self {
        Self::Status(200, success_body(text, json!(null)))
    }

    pub fn grounded(text: &str, attributions: Value) -> Self {
        Self::Status(
            200,
            success_body(text, json!({ "groundingAttributions": attributions })),
        )
    }

    pub fn malformed() -> Self {
        Self::Status(200, r#"{"candidates":[]}"#.to_string())
    }

    pub fn rate_limited() -> Self {
        Self::Status(
            429,
            r#"{"error":{"code":429,"message":"quota exhausted","status":"RESOURCE_EXHAUSTED"}}"#
                .to_string(),
        )
    }

    pub fn server_error() -> Self {
        Self::Status(
            500,
            r#"{"error":{"code":500,"message":"internal","status":"INTERNAL"}}"#.to_string(),
        )
    }
}

fn success_body(text: &str, grounding: Value) -> String {
    let mut candidate = json!({
        "content": { "role": "model", "parts": [ { "text": text } ] },
        "finishReason": "STOP"
    });
    if !grounding.is_null() {
        candidate["groundingMetadata"] = grounding;
    }
    json!({ "candidates": [candidate], "modelVersion": "gemini-2.5-flash" }).to_string()
}

/// A request observed by [`ScriptedTransport`] and the virtual time it arrived.
#[derive(Debug, Clone)]
pub struct Seen {
    pub request: HttpRequest,
    pub at: Instant,
}

impl Seen {
    pub fn body(&self) -> Value {
        self.request.json_body().expect("json body")
    }

    pub fn prompt(&self) -> String {
        prompt_of(&self.request)
    }
}

fn prompt_of(request: &HttpRequest) -> String {
    request
        .json_body()
        .and_then(|body| {
            body["contents"][0]["parts"][0]["text"]
                .as_str()
                .map(str::to_string)
        })
        .unwrap_or_default()
}

/// In-memory transport replaying scripted replies.
///
/// Replies are looked up by exact prompt first, then taken from the shared queue.
/// Running out of replies fails the test.
#[derive(Default)]
pub struct ScriptedTransport {
    shared: Mutex<VecDeque<Reply>>,
    by_prompt: Mutex<HashMap<String, VecDeque<Reply>>>,
    seen: Mutex<Vec<Seen>>,
}

impl ScriptedTransport {
    pub fn new(replies: impl IntoIterator<Item = Reply>) -> Arc<Self> {
        let transport = Self::default();
        transport.shared.lock().unwrap().extend(replies);
        Arc::new(transport)
    }

    pub fn routed(routes: impl IntoIterator<Item = (&'static str, Vec<Reply>)>) -> Arc<Self> {
        let transport = Self::default();
        {
            let mut by_prompt = transport.by_prompt.lock().unwrap();
            for (prompt, replies) in routes {
                by_prompt.insert(prompt.to_string(), replies.into());
            }
        }
        Arc::new(transport)
    }

    pub fn seen(&self) -> Vec<Seen> {
        self.seen.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    pub fn calls_for(&self, prompt: &str) -> Vec<Seen> {
        self.seen()
            .into_iter()
            .filter(|seen| seen.prompt() == prompt)
            .collect()
    }

    pub fn remaining(&self) -> usize {
        self.shared.lock().unwrap().len()
    }

    fn next_reply(&self, prompt: &str) -> Reply {
        if let Some(queue) = self.by_prompt.lock().unwrap().get_mut(prompt) {
            if let Some(reply) = queue.pop_front() {
                return reply;
            }
        }
        self.shared
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("unexpected extra call for prompt: {prompt}"))
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, CompletionError> {
        let prompt = prompt_of(&request);
        self.seen.lock().unwrap().push(Seen {
            request,
            at: Instant::now(),
        });

        match self.next_reply(&prompt) {
            Reply::Status(status, body) => Ok(HttpResponse {
                status,
                headers: HashMap::new(),
                body: body.into_bytes(),
            }),
            Reply::NetworkError => Err(CompletionError::transport("connection reset by peer")),
            Reply::Hang => std::future::pending().await,
        }
    }
}

pub fn client_for(transport: Arc<ScriptedTransport>) -> CompletionClient {
    CompletionClient::new(GoogleGeminiProvider::new(transport, "test-key"))
}

pub fn client_with_policy(transport: Arc<ScriptedTransport>, policy: RetryPolicy) -> CompletionClient {
    client_for(transport).with_policy(policy)
}
