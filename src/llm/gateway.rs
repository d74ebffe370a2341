use anyhow::Result;

/// Decoding settings for a single generation call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationOptions {
    pub max_length: u32,
    pub temperature: f32,
    pub do_sample: bool,
}

impl GenerationOptions {
    pub fn sampled(max_length: u32, temperature: f32) -> Self {
        Self {
            max_length,
            temperature,
            do_sample: true,
        }
    }

    /// Deterministic decoding.
    pub fn greedy(max_length: u32) -> Self {
        Self {
            max_length,
            temperature: 0.0,
            do_sample: false,
        }
    }

    /// Temperature actually sent to the model: zero unless sampling is on.
    pub fn effective_temperature(&self) -> f32 {
        if self.do_sample {
            self.temperature
        } else {
            0.0
        }
    }
}

/// Opaque text-generation model. Returns raw generated text for a prompt.
pub trait TextGenerator {
    fn name(&self) -> &str;
    fn generate(&self, prompt: &str, options: &GenerationOptions) -> Result<String>;
}
