pub mod config;
mod config_env;
pub mod intent;
pub mod line;
pub mod llm;
pub mod models;
pub mod repos;
pub mod spotify;
pub mod weather;
