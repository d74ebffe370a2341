use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::LlmConfig;
use crate::llm::gateway::{GenerationOptions, TextGenerator};

const AZURE_API_VERSION: &str = "2024-06-01";

#[derive(Debug, Serialize)]
struct ChatRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<String>,
    messages: Vec<ChatMessage>,
    max_completion_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    prompt_tokens: u64,
    completion_tokens: u64,
    total_tokens: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Provider {
    Azure,
    OpenAi,
}

pub struct LlmClient {
    provider: Provider,
    endpoint: String,
    api_key: String,
    /// Azure deployment name or OpenAI model name.
    model: String,
    client: reqwest::blocking::Client,
}

impl std::fmt::Debug for LlmClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmClient")
            .field("provider", &self.provider)
            .field("endpoint", &self.endpoint)
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .finish()
    }
}

impl LlmClient {
    /// Create a new LLM client from the [llm] config section.
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let provider = match config.provider.as_str() {
            "azure" => Provider::Azure,
            "openai" => Provider::OpenAi,
            other => anyhow::bail!("Unknown LLM provider: {} (expected azure or openai)", other),
        };

        let endpoint = if config.endpoint.is_empty() {
            anyhow::bail!(
                "LLM endpoint not configured. Set [llm] endpoint in lecturenotes.toml"
            );
        } else {
            config.endpoint.trim_end_matches('/').to_string()
        };

        let api_key = if !config.api_key.is_empty() {
            config.api_key.clone()
        } else {
            std::env::var("LECTURENOTES_LLM_KEY")
                .context("LLM API key not configured. Set [llm] api_key or LECTURENOTES_LLM_KEY")?
        };

        let model = match provider {
            Provider::Azure => &config.deployment,
            Provider::OpenAi => &config.model,
        };
        if model.is_empty() {
            match provider {
                Provider::Azure => anyhow::bail!(
                    "LLM deployment not configured. Set [llm] deployment in lecturenotes.toml"
                ),
                Provider::OpenAi => anyhow::bail!(
                    "LLM model not configured. Set [llm] model in lecturenotes.toml"
                ),
            }
        }

        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            provider,
            endpoint,
            api_key,
            model: model.clone(),
            client,
        })
    }

    fn completions_url(&self) -> String {
        match self.provider {
            Provider::Azure => format!(
                "{}/openai/deployments/{}/chat/completions?api-version={}",
                self.endpoint, self.model, AZURE_API_VERSION
            ),
            Provider::OpenAi => format!("{}/chat/completions", self.endpoint),
        }
    }

    fn build_request(&self, prompt: &str, options: &GenerationOptions) -> ChatRequest {
        ChatRequest {
            model: match self.provider {
                Provider::Azure => None,
                Provider::OpenAi => Some(self.model.clone()),
            },
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            max_completion_tokens: options.max_length,
            temperature: options.effective_temperature(),
        }
    }

    /// Send a single-turn chat completion request and return the response text.
    fn complete(&self, prompt: &str, options: &GenerationOptions) -> Result<String> {
        let url = self.completions_url();
        let request = self.build_request(prompt, options);

        tracing::info!(
            "Sending chat completion request to {} ({}, max_length={})",
            self.endpoint,
            self.model,
            options.max_length
        );

        let builder = self.client.post(&url).json(&request);
        let builder = match self.provider {
            Provider::Azure => builder.header("api-key", &self.api_key),
            Provider::OpenAi => builder.bearer_auth(&self.api_key),
        };
        let response = builder
            .send()
            .context("Failed to send chat completion request")?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response
                .text()
                .unwrap_or_else(|_| "unable to read response body".to_string());
            anyhow::bail!(
                "LLM endpoint returned HTTP {}: {}",
                status.as_u16(),
                error_body
            );
        }

        let chat_response: ChatResponse = response
            .json()
            .context("Failed to parse chat completion response")?;

        if let Some(usage) = &chat_response.usage {
            tracing::info!(
                "Token usage: prompt={}, completion={}, total={}",
                usage.prompt_tokens,
                usage.completion_tokens,
                usage.total_tokens
            );
        }

        let choice = chat_response
            .choices
            .first()
            .context("No choices in chat completion response")?;

        if let Some(reason) = &choice.finish_reason {
            if reason != "stop" {
                tracing::warn!("Chat completion finish_reason: {}", reason);
            }
        }

        Ok(choice.message.content.clone())
    }
}

impl TextGenerator for LlmClient {
    fn name(&self) -> &str {
        match self.provider {
            Provider::Azure => "azure-openai",
            Provider::OpenAi => "openai-compatible",
        }
    }

    fn generate(&self, prompt: &str, options: &GenerationOptions) -> Result<String> {
        self.complete(prompt, options)
    }
}
