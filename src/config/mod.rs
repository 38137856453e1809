pub mod env;
mod loader;

pub use env::{AppConfig, ConfigError, DirectoryConfig, ModelConfig};
pub use loader::load_config;
