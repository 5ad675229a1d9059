use serde::Deserialize;

/// Extracts a readable message from a Gemini error body.
///
/// Gemini wraps failures in `{"error": {"code", "message", "status"}}`. The RPC status is
/// appended to the message when present; bodies that do not follow the envelope are
/// returned raw, prefixed with the HTTP status.
pub(crate) fn parse_gemini_error(status: u16, body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        error: Option<InnerError>,
    }

    #[derive(Deserialize)]
    struct InnerError {
        message: Option<String>,
        status: Option<String>,
    }

    if let Ok(ErrorBody { error: Some(error) }) = serde_json::from_str::<ErrorBody>(body) {
        let message = error.message.unwrap_or_else(|| "unknown error".to_string());
        return match error.status.as_deref() {
            Some(status_text) if !status_text.is_empty() => format!("{message} ({status_text})"),
            _ => message,
        };
    }

    format!("status {status}: {}", body.trim())
}
