use thiserror::Error;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub model: ModelConfig,
    pub directories: DirectoryConfig,
    pub logging: LoggingConfig,
    pub timezone: String,
}

#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub model_dir: String,
    pub vocabulary_filename: String,
    pub weights_filename: String,
}

#[derive(Debug, Clone)]
pub struct DirectoryConfig {
    pub logs_dir: String,
    pub data_dir: String,
    pub db_filename: String,
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}
