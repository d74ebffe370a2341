pub mod azure_openai;
pub mod backend;
pub mod runner;
#[cfg(feature = "whisper-local")]
pub mod whisper_local;
