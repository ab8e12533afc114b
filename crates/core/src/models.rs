//! # Kairox Models
//!
//! LLM endpoint configuration shared by the agent and the CLI.
//!
//! Every supported provider speaks the OpenAI chat-completions protocol;
//! they differ only in base URL and the environment variable holding the
//! API key:
//! - NVIDIA NIM - `NVIDIA_API_KEY`
//! - OpenAI - `OPENAI_API_KEY`
//! - OpenRouter - `OPENROUTER_API_KEY`
//! - DeepSeek - `DEEPSEEK_API_KEY`

use crate::agent::AgentError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Supported LLM providers
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    #[default]
    Nvidia,
    #[serde(rename = "openai")]
    OpenAI,
    OpenRouter,
    DeepSeek,
}

impl LlmProvider {
    /// Get all available providers
    pub fn all() -> Vec<LlmProvider> {
        vec![
            LlmProvider::Nvidia,
            LlmProvider::OpenAI,
            LlmProvider::OpenRouter,
            LlmProvider::DeepSeek,
        ]
    }

    /// Display name for UI
    pub fn display_name(&self) -> &'static str {
        match self {
            LlmProvider::Nvidia => "NVIDIA NIM",
            LlmProvider::OpenAI => "OpenAI",
            LlmProvider::OpenRouter => "OpenRouter",
            LlmProvider::DeepSeek => "DeepSeek",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            LlmProvider::Nvidia => "https://integrate.api.nvidia.com/v1",
            LlmProvider::OpenAI => "https://api.openai.com/v1",
            LlmProvider::OpenRouter => "https://openrouter.ai/api/v1",
            LlmProvider::DeepSeek => "https://api.deepseek.com/v1",
        }
    }

    /// Environment variable holding the API key
    pub fn api_key_env(&self) -> &'static str {
        match self {
            LlmProvider::Nvidia => "NVIDIA_API_KEY",
            LlmProvider::OpenAI => "OPENAI_API_KEY",
            LlmProvider::OpenRouter => "OPENROUTER_API_KEY",
            LlmProvider::DeepSeek => "DEEPSEEK_API_KEY",
        }
    }
}

impl FromStr for LlmProvider {
    type Err = AgentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "nvidia" | "nim" => Ok(LlmProvider::Nvidia),
            "openai" => Ok(LlmProvider::OpenAI),
            "openrouter" => Ok(LlmProvider::OpenRouter),
            "deepseek" => Ok(LlmProvider::DeepSeek),
            other => Err(AgentError::config(format!("unknown provider: {}", other))),
        }
    }
}

/// Configuration for the chat-completions endpoint
///
/// ## Example
/// ```rust,ignore
/// use kairox_core::models::{ModelConfig, LlmProvider};
///
/// // NVIDIA NIM with the bundled default model
/// let config = ModelConfig::from_env()?;
///
/// // Specific provider and model
/// let config = ModelConfig::with_provider(LlmProvider::OpenAI, "gpt-4o")
///     .with_api_key("sk-...");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default)]
    pub provider: LlmProvider,
    /// Model name (e.g., "moonshotai/kimi-k2-instruct", "gpt-4o")
    pub model: String,
    /// Endpoint override; the provider default is used when unset
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    pub temperature: f32,
    pub top_p: f32,
    pub max_completion_tokens: u32,
    /// Ask the chat template for a separate reasoning channel
    pub thinking: bool,
    pub connect_timeout_secs: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::Nvidia,
            model: "moonshotai/kimi-k2-instruct".to_string(),
            base_url: None,
            api_key: None,
            temperature: 0.6,
            top_p: 0.9,
            max_completion_tokens: 4096,
            thinking: true,
            connect_timeout_secs: 30,
        }
    }
}

impl ModelConfig {
    /// Create config for a specific provider
    pub fn with_provider(provider: LlmProvider, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            ..Default::default()
        }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Resolve provider, model, endpoint, and key from the process environment.
    ///
    /// Reads `KAIROX_PROVIDER`, `KAIROX_MODEL`, `KAIROX_BASE_URL` and the
    /// provider's key variable.
    pub fn from_env() -> Result<Self, AgentError> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// [`ModelConfig::from_env`] over an arbitrary variable lookup; blank values count as unset
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AgentError> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let provider = match var("KAIROX_PROVIDER") {
            Some(name) => name.parse()?,
            None => LlmProvider::default(),
        };

        let mut config = Self {
            provider,
            ..Default::default()
        };
        if let Some(model) = var("KAIROX_MODEL") {
            config.model = model;
        }
        config.base_url = var("KAIROX_BASE_URL");
        config.api_key = var(provider.api_key_env());

        if config.api_key.is_none() {
            return Err(AgentError::config(format!(
                "missing required environment variable: {}",
                provider.api_key_env()
            )));
        }

        Ok(config)
    }

    /// The configured base URL, or the provider default, without a trailing slash
    pub fn endpoint(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.provider.default_base_url())
            .trim_end_matches('/')
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = ModelConfig::default();
        assert_eq!(config.provider, LlmProvider::Nvidia);
        assert_eq!(config.model, "moonshotai/kimi-k2-instruct");
        assert_eq!(config.max_completion_tokens, 4096);
        assert!(config.thinking);
        assert_eq!(config.endpoint(), "https://integrate.api.nvidia.com/v1");
    }

    #[test]
    fn test_provider_display_names() {
        assert_eq!(LlmProvider::Nvidia.display_name(), "NVIDIA NIM");
        assert_eq!(LlmProvider::OpenAI.display_name(), "OpenAI");
        assert_eq!(LlmProvider::all().len(), 4);
    }

    #[test]
    fn test_from_vars_defaults_to_nvidia() {
        let config = ModelConfig::from_vars(vars(&[("NVIDIA_API_KEY", "nv-123")])).unwrap();
        assert_eq!(config.provider, LlmProvider::Nvidia);
        assert_eq!(config.api_key.as_deref(), Some("nv-123"));
    }

    #[test]
    fn test_from_vars_overrides() {
        let config = ModelConfig::from_vars(vars(&[
            ("KAIROX_PROVIDER", "OpenRouter"),
            ("KAIROX_MODEL", "moonshotai/kimi-k2"),
            ("KAIROX_BASE_URL", "http://localhost:8080/v1/"),
            ("OPENROUTER_API_KEY", "or-1"),
        ]))
        .unwrap();
        assert_eq!(config.provider, LlmProvider::OpenRouter);
        assert_eq!(config.model, "moonshotai/kimi-k2");
        assert_eq!(config.endpoint(), "http://localhost:8080/v1");
    }

    #[test]
    fn test_missing_key_names_variable() {
        let err = ModelConfig::from_vars(vars(&[("KAIROX_PROVIDER", "deepseek")])).unwrap_err();
        assert!(err.to_string().contains("DEEPSEEK_API_KEY"));
    }

    #[test]
    fn test_unknown_provider() {
        assert!("grok".parse::<LlmProvider>().is_err());
    }

    #[test]
    fn test_model_config_serialization_omits_key() {
        let config = ModelConfig::with_provider(LlmProvider::OpenAI, "gpt-4o").with_api_key("sk-1");
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("openai"));
        assert!(json.contains("gpt-4o"));
        assert!(!json.contains("sk-1"));
    }
}
