use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "lecturenotes.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub transcription: TranscriptionConfig,
    pub llm: LlmConfig,
    pub generation: GenerationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionConfig {
    pub backend: String,
    pub model: String,
    pub azure: AzureConfig,
}

#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AzureConfig {
    pub endpoint: String,
    pub api_key: String,
    pub deployment: String,
}

impl fmt::Debug for AzureConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AzureConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"[REDACTED]")
            .field("deployment", &self.deployment)
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// "azure" (Azure OpenAI deployment) or "openai" (any OpenAI-compatible API).
    pub provider: String,
    /// Base URL, e.g. "https://your-resource.openai.azure.com" or "https://api.openai.com/v1".
    pub endpoint: String,
    /// API key (or set LECTURENOTES_LLM_KEY environment variable).
    pub api_key: String,
    /// Azure OpenAI deployment name for chat completions.
    pub deployment: String,
    /// Model name sent to OpenAI-compatible endpoints.
    pub model: String,
    pub timeout_secs: u64,
}

impl fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmConfig")
            .field("provider", &self.provider)
            .field("endpoint", &self.endpoint)
            .field("api_key", &"[REDACTED]")
            .field("deployment", &self.deployment)
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Difficulty label passed through to every prompt. Not validated.
    pub difficulty: String,
    /// Number of informative sentences used for quiz questions and flashcards.
    pub sentence_limit: usize,
    pub mcq_count: usize,
    pub long_answer_pairs: usize,
    pub max_concepts: usize,
    /// Character budget for the lecture excerpt in MCQ and chat prompts.
    pub passage_chars: usize,
    /// Character budget for the lecture excerpt in revision-notes prompts.
    pub notes_chars: usize,
    /// Seed for option shuffling. Unset means a fresh random seed per session.
    pub seed: Option<u64>,
}

// --- Default implementations ---

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            backend: "azure".to_string(),
            model: "base.en".to_string(),
            azure: AzureConfig::default(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "azure".to_string(),
            endpoint: String::new(),
            api_key: String::new(),
            deployment: String::new(),
            model: String::new(),
            timeout_secs: 120,
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            difficulty: "Medium".to_string(),
            sentence_limit: 5,
            mcq_count: 5,
            long_answer_pairs: 3,
            max_concepts: 5,
            passage_chars: 3000,
            notes_chars: 2500,
            seed: None,
        }
    }
}

// --- Config loading ---

impl Config {
    /// Load config and return the resolved file path (if any).
    pub fn load_with_path(path: Option<&Path>) -> anyhow::Result<(Self, Option<PathBuf>)> {
        // 1. Check explicit path
        if let Some(p) = path {
            let content = std::fs::read_to_string(p).map_err(|e| {
                anyhow::anyhow!("Failed to read config file {}: {}", p.display(), e)
            })?;
            let config: Config = toml::from_str(&content)?;
            return Ok((config, Some(p.to_path_buf())));
        }

        // 2. Check beside the executable
        if let Ok(exe_path) = std::env::current_exe() {
            let beside_exe = exe_path.parent().map(|p| p.join(CONFIG_FILE_NAME));
            if let Some(p) = beside_exe {
                if p.exists() {
                    let content = std::fs::read_to_string(&p)?;
                    let config: Config = toml::from_str(&content)?;
                    return Ok((config, Some(p)));
                }
            }
        }

        // 3. Check platform config directory (e.g. ~/.config/lecturenotes/config.toml)
        if let Some(p) = Self::platform_path() {
            if p.exists() {
                let content = std::fs::read_to_string(&p)?;
                let config: Config = toml::from_str(&content)?;
                return Ok((config, Some(p)));
            }
        }

        // 4. Fall back to defaults
        tracing::info!("No config file found, using defaults");
        Ok((Config::default(), None))
    }

    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        Self::load_with_path(path).map(|(config, _)| config)
    }

    /// Where `init-config` writes when no explicit path is given.
    pub fn platform_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("lecturenotes").join("config.toml"))
    }

    /// Generate a default config file with all fields and inline documentation.
    pub fn generate_default_commented() -> String {
        r#"# lecturenotes configuration

[transcription]
# Transcription backend: "azure" (cloud Whisper deployment) or "local"
# (whisper.cpp, requires building with the `whisper-local` feature).
backend = "azure"
# Whisper model name for the local backend. Options: tiny.en, base.en, small.en
# Or an absolute path to a ggml .bin model file.
model = "base.en"

[transcription.azure]
# Azure OpenAI endpoint hosting the Whisper deployment.
# endpoint = "https://your-resource.openai.azure.com"
# API key (or set LECTURENOTES_AZURE_KEY environment variable).
# api_key = ""
# Deployment name for the Whisper model.
# deployment = "whisper"

[llm]
# Text generation provider: "azure" or "openai" (any OpenAI-compatible API).
provider = "azure"
# Base URL of the provider.
# endpoint = "https://your-resource.openai.azure.com"
# API key (or set LECTURENOTES_LLM_KEY environment variable).
# api_key = ""
# Azure OpenAI chat deployment name (provider = "azure").
# deployment = "gpt-4o-mini"
# Model name (provider = "openai").
# model = "gpt-4o-mini"
# Request timeout in seconds. A timed out call counts as empty model output.
timeout_secs = 120

[generation]
# Difficulty label inserted into prompts, e.g. "Easy", "Medium", "Hard".
difficulty = "Medium"
# Informative sentences (more than 6 words) used for quiz questions and flashcards.
sentence_limit = 5
# Number of multiple-choice questions to request.
mcq_count = 5
# Number of long-answer question/answer pairs.
long_answer_pairs = 3
# Number of key concepts to extract.
max_concepts = 5
# Character budget for the lecture excerpt in MCQ and chatbot prompts.
passage_chars = 3000
# Character budget for the lecture excerpt in revision-notes prompts.
notes_chars = 2500
# Fixed seed for shuffling MCQ options (reproducible output).
# seed = 42
"#
        .to_string()
    }
}
