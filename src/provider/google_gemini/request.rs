use serde_json::{Map, Value, json};

use crate::types::CompletionRequest;

/// 构建 Google Gemini GenerateContent 请求体
///
/// 模型名称走路径参数 `POST /v1beta/models/{model}:generateContent` 不出现在 body 中。
/// 关闭 grounding 时完全省略 tools 字段 而不是写入空数组。
pub(crate) fn build_gemini_body(request: &CompletionRequest, system_instruction: &str) -> Value {
    let mut body = Map::new();

    body.insert(
        "contents".to_string(),
        json!([
            {
                "role": "user",
                "parts": [ { "text": request.prompt_text() } ]
            }
        ]),
    );

    if request.grounding_enabled() {
        body.insert("tools".to_string(), json!([ { "google_search": {} } ]));
    }

    body.insert(
        "systemInstruction".to_string(),
        json!({
            "parts": [ { "text": system_instruction } ]
        }),
    );

    Value::Object(body)
}
