use std::io::Cursor;

use anyhow::Result;
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

use crate::transcribe::backend::{Segment, Transcript, TranscriptionBackend};

const WHISPER_SAMPLE_RATE: u32 = 16000;

pub struct WhisperLocal {
    ctx: WhisperContext,
}

impl WhisperLocal {
    pub fn new(model_path: &str) -> Result<Self> {
        let ctx = WhisperContext::new_with_params(model_path, WhisperContextParameters::default())
            .map_err(|e| anyhow::anyhow!("Failed to load Whisper model: {:?}", e))?;
        Ok(Self { ctx })
    }
}

/// Decode 16-bit PCM WAV bytes into mono f32 samples in [-1.0, 1.0].
fn decode_wav_mono(audio: &[u8]) -> Result<Vec<f32>> {
    let mut reader = hound::WavReader::new(Cursor::new(audio))?;
    let spec = reader.spec();
    if spec.sample_rate != WHISPER_SAMPLE_RATE {
        anyhow::bail!(
            "Local transcription needs {} Hz audio, got {} Hz",
            WHISPER_SAMPLE_RATE,
            spec.sample_rate
        );
    }
    let samples_i16: Vec<i16> = reader
        .samples::<i16>()
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let channels = spec.channels.max(1) as usize;
    Ok(samples_i16
        .chunks(channels)
        .map(|frame| frame.iter().map(|&s| s as f32 / 32768.0).sum::<f32>() / channels as f32)
        .collect())
}

impl TranscriptionBackend for WhisperLocal {
    fn name(&self) -> &str {
        "whisper-local"
    }

    fn transcribe(&self, file_name: &str, audio: &[u8]) -> Result<Transcript> {
        let samples = decode_wav_mono(audio)?;

        let mut state = self
            .ctx
            .create_state()
            .map_err(|e| anyhow::anyhow!("Failed to create state: {:?}", e))?;

        let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
        params.set_n_threads(4);
        params.set_language(Some("en"));

        state
            .full(params, &samples)
            .map_err(|e| anyhow::anyhow!("Transcription failed: {:?}", e))?;

        let mut segments = Vec::new();
        let n_segments = state.full_n_segments();
        for i in 0..n_segments {
            if let Some(segment) = state.get_segment(i) {
                if let Ok(text) = segment.to_str_lossy() {
                    // whisper timestamps are in centiseconds
                    segments.push(Segment {
                        text: text.to_string(),
                        start: Some(segment.start_timestamp() as f64 / 100.0),
                        end: Some(segment.end_timestamp() as f64 / 100.0),
                    });
                }
            }
        }

        Ok(Transcript::new(file_name, segments))
    }
}
