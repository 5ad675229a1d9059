use crate::types::{Citation, CompletionResult};

use super::types::{GeminiGenerateContentResponse, GeminiGroundingMetadata};

/// 将 Gemini 响应归一化为 CompletionResult
///
/// 首个候选的首个 part 没有非空文本时返回 None 由上层按可重试的畸形响应处理。
pub(crate) fn map_response(
    resp: GeminiGenerateContentResponse,
    grounding_requested: bool,
) -> Option<CompletionResult> {
    let candidate = resp.candidates.into_iter().next()?;
    let text = candidate
        .content
        .and_then(|content| content.parts.into_iter().next())
        .and_then(|part| part.text)
        .filter(|text| !text.trim().is_empty())?;

    let citations = match (grounding_requested, candidate.grounding_metadata) {
        (true, Some(metadata)) => convert_citations(metadata),
        _ => Vec::new(),
    };

    Some(CompletionResult { text, citations })
}

/// 来源 -> Citation 缺少 uri 或 title 的条目直接丢弃 保持原有顺序
fn convert_citations(metadata: GeminiGroundingMetadata) -> Vec<Citation> {
    let entries = if metadata.grounding_attributions.is_empty() {
        metadata.grounding_chunks
    } else {
        metadata.grounding_attributions
    };

    entries
        .into_iter()
        .filter_map(|entry| entry.web)
        .filter_map(|web| {
            let uri = web.uri.filter(|uri| !uri.trim().is_empty())?;
            let title = web.title.filter(|title| !title.trim().is_empty())?;
            Some(Citation { uri, title })
        })
        .collect()
}
