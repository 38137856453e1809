use std::env;

use chrono_tz::Tz;

use super::env::{AppConfig, ConfigError, DirectoryConfig, LoggingConfig, ModelConfig};

pub fn load_config() -> Result<AppConfig, ConfigError> {
    AppConfig::from_env()
}

impl AppConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let model = ModelConfig {
            model_dir: env::var("MODEL_DIR").unwrap_or_else(|_| "models".to_string()),
            vocabulary_filename: env::var("VOCABULARY_FILENAME")
                .unwrap_or_else(|_| "vocabulary.json".to_string()),
            weights_filename: env::var("WEIGHTS_FILENAME")
                .unwrap_or_else(|_| "weights.json".to_string()),
        };

        let directories = DirectoryConfig {
            logs_dir: env::var("LOGS_DIR").unwrap_or_else(|_| "logs".to_string()),
            data_dir: env::var("DATA_DIR").unwrap_or_else(|_| "data".to_string()),
            db_filename: env::var("DB_FILENAME").unwrap_or_else(|_| "sentinel.db".to_string()),
        };

        let logging = LoggingConfig {
            level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        };

        let timezone = env::var("SENTINEL_TIMEZONE").unwrap_or_else(|_| "UTC".to_string());
        timezone
            .parse::<Tz>()
            .map_err(|_| ConfigError::Invalid {
                key: "SENTINEL_TIMEZONE",
                value: timezone.clone(),
            })?;

        Ok(Self {
            model,
            directories,
            logging,
            timezone,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_env_is_empty() {
        let config = AppConfig::from_env().expect("default config loads");
        assert_eq!(config.directories.db_filename, "sentinel.db");
        assert_eq!(config.model.vocabulary_filename, "vocabulary.json");
    }
}
