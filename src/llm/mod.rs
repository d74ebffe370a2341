pub mod client;
pub mod gateway;
