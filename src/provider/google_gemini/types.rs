use serde::Deserialize;

/// GenerateContentResponse 顶层结构
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct GeminiGenerateContentResponse {
    /// 候选回答列表 只使用第一个
    #[serde(default)]
    pub(crate) candidates: Vec<GeminiCandidate>,
}

/// 单个候选回答
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct GeminiCandidate {
    #[serde(default)]
    pub(crate) content: Option<GeminiContent>,
    /// 搜索增强时附带的来源信息
    #[serde(default, rename = "groundingMetadata")]
    pub(crate) grounding_metadata: Option<GeminiGroundingMetadata>,
}

/// 候选内容
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct GeminiContent {
    #[serde(default)]
    pub(crate) parts: Vec<GeminiPart>,
}

/// Content.part 这里只关心文本
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct GeminiPart {
    #[serde(default)]
    pub(crate) text: Option<String>,
}

/// groundingMetadata
///
/// 旧版接口返回 groundingAttributions 新版返回 groundingChunks 两者都接受
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct GeminiGroundingMetadata {
    #[serde(default, rename = "groundingAttributions", alias = "grounding_attributions")]
    pub(crate) grounding_attributions: Vec<GeminiGroundingEntry>,
    #[serde(default, rename = "groundingChunks", alias = "grounding_chunks")]
    pub(crate) grounding_chunks: Vec<GeminiGroundingEntry>,
}

/// 单条来源 web 字段可能缺失
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct GeminiGroundingEntry {
    #[serde(default)]
    pub(crate) web: Option<GeminiWebReference>,
}

/// 网页引用 uri 与 title 都可能缺失
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct GeminiWebReference {
    #[serde(default)]
    pub(crate) uri: Option<String>,
    #[serde(default)]
    pub(crate) title: Option<String>,
}
