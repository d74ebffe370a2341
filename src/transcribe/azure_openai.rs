use anyhow::{Context, Result};
use reqwest::blocking::multipart;
use serde::Deserialize;

use crate::config::AzureConfig;
use crate::transcribe::backend::{Segment, Transcript, TranscriptionBackend};

#[derive(Debug, Deserialize)]
struct VerboseTranscription {
    #[serde(default)]
    text: String,
    #[serde(default)]
    segments: Vec<VerboseSegment>,
}

#[derive(Debug, Deserialize)]
struct VerboseSegment {
    text: String,
    start: f64,
    end: f64,
}

pub struct AzureOpenAIBackend {
    endpoint: String,
    api_key: String,
    deployment: String,
}

impl AzureOpenAIBackend {
    pub fn new(config: &AzureConfig) -> Result<Self> {
        if config.endpoint.is_empty() || config.deployment.is_empty() {
            anyhow::bail!(
                "Azure Whisper endpoint/deployment not configured. \
                 Set [transcription.azure] in lecturenotes.toml"
            );
        }

        let api_key = if config.api_key.is_empty() {
            std::env::var("LECTURENOTES_AZURE_KEY")
                .map_err(|_| anyhow::anyhow!("Azure API key not configured"))?
        } else {
            config.api_key.clone()
        };

        Ok(Self {
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_key,
            deployment: config.deployment.clone(),
        })
    }
}

/// MIME type for an uploaded audio file, from its extension.
fn mime_for(file_name: &str) -> &'static str {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "mp3" => "audio/mpeg",
        "m4a" => "audio/mp4",
        "flac" => "audio/flac",
        "ogg" => "audio/ogg",
        _ => "audio/wav",
    }
}

fn into_transcript(file_name: &str, body: VerboseTranscription) -> Transcript {
    let segments = if body.segments.is_empty() {
        vec![Segment::untimed(body.text)]
    } else {
        body.segments
            .into_iter()
            .map(|s| Segment {
                text: s.text,
                start: Some(s.start),
                end: Some(s.end),
            })
            .collect()
    };
    Transcript::new(file_name, segments)
}

impl TranscriptionBackend for AzureOpenAIBackend {
    fn name(&self) -> &str {
        "azure-openai"
    }

    fn transcribe(&self, file_name: &str, audio: &[u8]) -> Result<Transcript> {
        let url = format!(
            "{}/openai/deployments/{}/audio/transcriptions?api-version=2024-06-01",
            self.endpoint, self.deployment
        );

        let form = multipart::Form::new()
            .part(
                "file",
                multipart::Part::bytes(audio.to_vec())
                    .file_name(file_name.to_string())
                    .mime_str(mime_for(file_name))?,
            )
            .text("response_format", "verbose_json");

        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(300))
            .build()?;
        let response = client
            .post(&url)
            .header("api-key", &self.api_key)
            .multipart(form)
            .send()
            .context("Failed to send transcription request")?;

        let response = response.error_for_status()?;
        let body: VerboseTranscription = response
            .json()
            .context("Failed to parse transcription response")?;

        Ok(into_transcript(file_name, body))
    }
}
