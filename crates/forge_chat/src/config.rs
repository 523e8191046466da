//! Assistant configuration.
//!
//! Layering follows the workspace convention: defaults, then
//! `.forge/settings.json` in the workspace root, then environment variables.
//! A backend is configured only when an API key is present.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ChatError, ChatResult};

pub const DEFAULT_BACKEND_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_BUILD_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_MAX_CONTEXT_FILES: usize = 2;
pub const DEFAULT_FILE_EXCERPT_CHARS: usize = 800;

/// Supported generation providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    OpenAI,
    Anthropic,
}

impl LlmProvider {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::OpenAI => "OpenAI",
            Self::Anthropic => "Anthropic",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Self::OpenAI => "gpt-4o-mini",
            Self::Anthropic => "claude-3-5-sonnet-latest",
        }
    }

    pub fn api_key_var(&self) -> &'static str {
        match self {
            Self::OpenAI => "OPENAI_API_KEY",
            Self::Anthropic => "ANTHROPIC_API_KEY",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "openai" => Some(Self::OpenAI),
            "anthropic" => Some(Self::Anthropic),
            _ => None,
        }
    }
}

/// Connection settings for the generation backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendConfig {
    pub provider: LlmProvider,
    pub api_key: String,
    pub model: String,
    /// Override for OpenAI-compatible gateways
    pub base_url: Option<String>,
}

/// Bounds on the project context embedded in prompts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptLimits {
    pub max_context_files: usize,
    /// Per-file character budget
    pub file_excerpt_chars: usize,
}

impl Default for PromptLimits {
    fn default() -> Self {
        Self {
            max_context_files: DEFAULT_MAX_CONTEXT_FILES,
            file_excerpt_chars: DEFAULT_FILE_EXCERPT_CHARS,
        }
    }
}

/// Resolved assistant configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssistantConfig {
    /// `None` means heuristic-only operation
    pub backend: Option<BackendConfig>,
    pub backend_timeout: Duration,
    pub build_timeout: Duration,
    pub limits: PromptLimits,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            backend: None,
            backend_timeout: Duration::from_secs(DEFAULT_BACKEND_TIMEOUT_SECS),
            build_timeout: Duration::from_secs(DEFAULT_BUILD_TIMEOUT_SECS),
            limits: PromptLimits::default(),
        }
    }
}

/// Contents of `.forge/settings.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceSettings {
    #[serde(default)]
    pub default_provider: Option<String>,
    #[serde(default)]
    pub default_model: Option<String>,
    #[serde(default)]
    pub backend_timeout_secs: Option<u64>,
    #[serde(default)]
    pub build_timeout_secs: Option<u64>,
    #[serde(default)]
    pub max_context_files: Option<usize>,
    #[serde(default)]
    pub file_excerpt_chars: Option<usize>,
}

impl WorkspaceSettings {
    pub fn path(workspace_root: &Path) -> std::path::PathBuf {
        workspace_root.join(".forge").join("settings.json")
    }

    /// Load settings; a missing file yields defaults.
    pub fn load(workspace_root: &Path) -> ChatResult<Self> {
        let path = Self::path(workspace_root);
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path)?;
        serde_json::from_str(&content)
            .map_err(|e| ChatError::Config(format!("{}: {}", path.display(), e)))
    }
}

impl AssistantConfig {
    /// Configuration without a backend.
    pub fn offline() -> Self {
        Self::default()
    }

    /// Read configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(&WorkspaceSettings::default(), |key| std::env::var(key).ok())
    }

    /// Read `.forge/settings.json`, then apply the process environment.
    pub fn from_settings(workspace_root: &Path) -> ChatResult<Self> {
        let settings = WorkspaceSettings::load(workspace_root)?;
        Ok(Self::from_lookup(&settings, |key| std::env::var(key).ok()))
    }

    /// Resolve configuration from settings and a variable lookup.
    ///
    /// Environment values win over settings. Without a preferred provider,
    /// `OPENAI_API_KEY` is checked before `ANTHROPIC_API_KEY`.
    pub fn from_lookup<F>(settings: &WorkspaceSettings, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let number = |key: &str| var(key).and_then(|v| v.trim().parse::<u64>().ok());

        let preferred = var("FORGE_LLM_PROVIDER")
            .as_deref()
            .and_then(LlmProvider::parse)
            .or_else(|| settings.default_provider.as_deref().and_then(LlmProvider::parse));

        let candidates = match preferred {
            Some(p) => vec![p],
            None => vec![LlmProvider::OpenAI, LlmProvider::Anthropic],
        };
        let model = var("FORGE_LLM_MODEL").or_else(|| settings.default_model.clone());

        let backend = candidates.into_iter().find_map(|provider| {
            var(provider.api_key_var()).map(|api_key| BackendConfig {
                provider,
                api_key,
                model: model
                    .clone()
                    .unwrap_or_else(|| provider.default_model().to_string()),
                base_url: var("FORGE_LLM_BASE_URL"),
            })
        });

        let backend_timeout = number("FORGE_BACKEND_TIMEOUT_SECS")
            .or(settings.backend_timeout_secs)
            .unwrap_or(DEFAULT_BACKEND_TIMEOUT_SECS);
        let build_timeout = number("FORGE_BUILD_TIMEOUT_SECS")
            .or(settings.build_timeout_secs)
            .unwrap_or(DEFAULT_BUILD_TIMEOUT_SECS);

        let defaults = PromptLimits::default();
        let limits = PromptLimits {
            max_context_files: settings
                .max_context_files
                .unwrap_or(defaults.max_context_files),
            file_excerpt_chars: settings
                .file_excerpt_chars
                .unwrap_or(defaults.file_excerpt_chars),
        };

        match &backend {
            Some(b) => debug!(provider = b.provider.display_name(), model = %b.model, "Backend configured"),
            None => debug!("No backend credentials found, using local heuristics only"),
        }

        Self {
            backend,
            backend_timeout: Duration::from_secs(backend_timeout),
            build_timeout: Duration::from_secs(build_timeout),
            limits,
        }
    }

    /// Drop the backend, keeping every other setting.
    pub fn without_backend(mut self) -> Self {
        self.backend = None;
        self
    }
}
