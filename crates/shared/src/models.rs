//! Catalog of models the studio can talk to through OpenRouter.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelDescriptor {
    pub id: &'static str,
    pub name: &'static str,
    pub provider: &'static str,
    /// Accepts image parts in user messages.
    pub vision: bool,
    pub free: bool,
    pub description: &'static str,
}

pub const DEFAULT_MODEL_ID: &str = "openai/gpt-4.1";

const fn model(
    id: &'static str,
    name: &'static str,
    provider: &'static str,
    vision: bool,
    free: bool,
    description: &'static str,
) -> ModelDescriptor {
    ModelDescriptor {
        id,
        name,
        provider,
        vision,
        free,
        description,
    }
}

pub static MODEL_CATALOG: &[ModelDescriptor] = &[
    model("openai/gpt-4.1", "GPT-4.1", "OpenAI", true, false, "Latest GPT-4 with vision"),
    model("openai/gpt-5.1", "GPT-5.1", "OpenAI", true, false, "Most capable model"),
    model("openai/gpt-5.1-codex", "GPT-5.1 Codex", "OpenAI", true, false, "Advanced coding model"),
    model("openai/gpt-5.1-codex-mini", "GPT-5.1 Codex Mini", "OpenAI", true, false, "Lightweight coding model"),
    model("x-ai/grok-4-fast", "Grok 4 Fast", "xAI", true, false, "Fast & powerful"),
    model("x-ai/grok-code-fast-1", "Grok Code Fast", "xAI", false, false, "Optimized for coding"),
    model("tngtech/deepseek-r1t2-chimera:free", "DeepSeek R1T2 Chimera", "TNG", false, true, "Free reasoning model"),
    model("z-ai/glm-4.6", "GLM-4.6", "Z-AI", true, false, "Multimodal Chinese model"),
    model("kwaipilot/kat-coder-pro:free", "KAT Coder Pro", "Kwaipilot", false, true, "Free coding specialist"),
    model("alibaba/tongyi-deepresearch-30b-a3b:free", "Tongyi DeepResearch", "Alibaba", false, true, "Free research model"),
    model("qwen/qwen3-coder:free", "Qwen3 Coder", "Qwen", false, true, "Free coding model"),
    model("anthropic/claude-sonnet-4", "Claude Sonnet 4", "Anthropic", true, false, "Balanced performance"),
    model("google/gemini-2.5-pro-preview", "Gemini 2.5 Pro", "Google", true, false, "Advanced reasoning"),
];

pub fn find_model(id: &str) -> Option<&'static ModelDescriptor> {
    MODEL_CATALOG.iter().find(|m| m.id == id)
}

pub fn default_model() -> &'static ModelDescriptor {
    find_model(DEFAULT_MODEL_ID).unwrap_or(&MODEL_CATALOG[0])
}
