pub mod cli;
pub mod commands;
pub mod config;
pub mod interactive;
pub mod llm;
pub mod session;
pub mod study;
pub mod transcribe;
