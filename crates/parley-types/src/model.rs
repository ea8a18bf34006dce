//! Catalog of models selectable through the gateway.

use serde::Serialize;

/// A selectable chat model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ModelInfo {
    /// Gateway model id, e.g. `openai/gpt-4.1`.
    pub id: &'static str,
    pub name: &'static str,
    /// Vendor grouping shown in model pickers.
    pub category: &'static str,
}

impl ModelInfo {
    /// Gateway ids prefixed with `vis-` accept image input.
    pub fn supports_vision(&self) -> bool {
        self.id.starts_with("vis-")
    }
}

const fn model(id: &'static str, name: &'static str, category: &'static str) -> ModelInfo {
    ModelInfo { id, name, category }
}

pub const MODEL_CATALOG: &[ModelInfo] = &[
    model(
        "vis-google/gemini-2.5-pro-preview",
        "Google: Gemini 2.5 Pro Preview (vision)",
        "Google",
    ),
    model("mistralai/devstral-small", "Mistral: Devstral Small", "Mistral"),
    model("openai/o3", "OpenAI: o3", "OpenAI"),
    model(
        "google/gemini-2.5-pro-preview",
        "Google: Gemini 2.5 Pro Preview",
        "Google",
    ),
    model("anthropic/claude-opus-4", "Anthropic: Claude Opus 4", "Anthropic"),
    model("anthropic/claude-sonnet-4", "Anthropic: Claude Sonnet 4", "Anthropic"),
    model(
        "google/gemini-2.5-flash-pre",
        "Google: Gemini 2.5 Flash Preview",
        "Google",
    ),
    model("openai/gpt-4.1", "OpenAI: GPT-4.1", "OpenAI"),
    model("openai/gpt-4.1-mini", "OpenAI: GPT-4.1 Mini", "OpenAI"),
    model("meta-llama/llama-4-maverick", "Llama 4 Maverick", "Meta"),
    model("qwen/qwen-2.5-72b-instruct", "Qwen2.5 72B Instruct", "Qwen"),
    model("deepseek/deepseek-chat", "DeepSeek V3", "DeepSeek"),
];

pub const DEFAULT_MODEL_ID: &str = "openai/gpt-4.1-mini";

pub fn find_model(id: &str) -> Option<&'static ModelInfo> {
    MODEL_CATALOG.iter().find(|m| m.id == id)
}

pub fn default_model() -> &'static ModelInfo {
    find_model(DEFAULT_MODEL_ID).unwrap_or(&MODEL_CATALOG[0])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_catalog_ids_are_unique() {
        let ids: HashSet<_> = MODEL_CATALOG.iter().map(|m| m.id).collect();
        assert_eq!(ids.len(), MODEL_CATALOG.len());
        assert_eq!(MODEL_CATALOG.len(), 12);
    }

    #[test]
    fn test_find_model() {
        let m = find_model("deepseek/deepseek-chat").unwrap();
        assert_eq!(m.name, "DeepSeek V3");
        assert_eq!(m.category, "DeepSeek");
        assert!(find_model("nope/none").is_none());
    }

    #[test]
    fn test_default_model_is_in_catalog() {
        assert_eq!(default_model().id, DEFAULT_MODEL_ID);
    }

    #[test]
    fn test_vision_flag() {
        assert!(find_model("vis-google/gemini-2.5-pro-preview").unwrap().supports_vision());
        assert!(!find_model("openai/o3").unwrap().supports_vision());
    }
}
