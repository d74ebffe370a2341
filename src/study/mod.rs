pub mod chat;
pub mod concepts;
pub mod generate;
pub mod mcq;
pub mod prompt;
pub mod text;
