use std::path::Path;

use anyhow::{Context, Result};

use crate::config::Config;
use crate::transcribe::backend::{Transcript, TranscriptionBackend};

const AUDIO_EXTENSIONS: &[&str] = &["wav", "mp3", "m4a", "flac", "ogg"];

/// How a lecture input file should be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Audio,
    TranscriptJson,
    PlainText,
}

impl InputKind {
    pub fn detect(path: &Path) -> Self {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        if AUDIO_EXTENSIONS.contains(&ext.as_str()) {
            InputKind::Audio
        } else if ext == "json" {
            InputKind::TranscriptJson
        } else {
            InputKind::PlainText
        }
    }
}

/// Build the appropriate backend from config.
pub fn build_backend(
    config: &Config,
    backend_override: Option<&str>,
) -> Result<Box<dyn TranscriptionBackend>> {
    let backend_name = backend_override.unwrap_or(&config.transcription.backend);

    match backend_name {
        "local" => {
            #[cfg(feature = "whisper-local")]
            {
                use crate::transcribe::whisper_local::WhisperLocal;
                let model = &config.transcription.model;
                let model_file = if model.ends_with(".bin") {
                    model.clone()
                } else {
                    format!("ggml-{}.bin", model)
                };
                Ok(Box::new(WhisperLocal::new(&model_file)?))
            }
            #[cfg(not(feature = "whisper-local"))]
            {
                anyhow::bail!(
                    "Local whisper backend is not compiled in (build with --features whisper-local)"
                )
            }
        }
        "azure" => {
            use crate::transcribe::azure_openai::AzureOpenAIBackend;
            Ok(Box::new(AzureOpenAIBackend::new(
                &config.transcription.azure,
            )?))
        }
        other => anyhow::bail!("Unknown transcription backend: {}", other),
    }
}

/// Read an audio file and run it through the backend.
pub fn transcribe_file(backend: &dyn TranscriptionBackend, audio_path: &Path) -> Result<Transcript> {
    let audio = std::fs::read(audio_path)
        .with_context(|| format!("Failed to read {}", audio_path.display()))?;
    let file_name = audio_path
        .file_name()
        .ok_or_else(|| anyhow::anyhow!("audio path has no filename: {}", audio_path.display()))?
        .to_string_lossy()
        .to_string();

    tracing::info!("Transcribing {} with {}", file_name, backend.name());
    let transcript = backend
        .transcribe(&file_name, &audio)
        .with_context(|| format!("Speech-to-text failed for {}", file_name))?;
    tracing::info!(
        "Transcribed {} ({} segments)",
        file_name,
        transcript.segments.len()
    );
    Ok(transcript)
}

/// Write a transcript as pretty JSON.
pub fn save_transcript(transcript: &Transcript, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }
    let content = serde_json::to_string_pretty(transcript)?;
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    tracing::info!("Transcript saved to {}", path.display());
    Ok(())
}

/// Load a lecture from an audio file, a transcript JSON file, or plain text.
pub fn load_lecture(
    config: &Config,
    input: &Path,
    backend_override: Option<&str>,
) -> Result<Transcript> {
    match InputKind::detect(input) {
        InputKind::Audio => {
            let backend = build_backend(config, backend_override)?;
            transcribe_file(backend.as_ref(), input)
        }
        InputKind::TranscriptJson => {
            let content = std::fs::read_to_string(input)
                .with_context(|| format!("Failed to read {}", input.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse transcript {}", input.display()))
        }
        InputKind::PlainText => {
            let content = std::fs::read_to_string(input)
                .with_context(|| format!("Failed to read {}", input.display()))?;
            Ok(Transcript::from_text(input.display().to_string(), &content))
        }
    }
}
