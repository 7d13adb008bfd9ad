use std::path::Path;

use crate::config::schema::Config;
use crate::error::ConfigError;

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<Config, ConfigError> {
    let config: Config = serde_json::from_str(content)?;

    validate_config(&config)?;

    Ok(config)
}

fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.scan.max_folder_depth == 0 {
        return Err(ConfigError::Validation {
            message: "scan.max_folder_depth must be at least 1".to_string(),
        });
    }

    if config.scan.max_files == 0 {
        return Err(ConfigError::Validation {
            message: "scan.max_files must be at least 1".to_string(),
        });
    }

    if config.matching.date_window_days <= 0 {
        return Err(ConfigError::Validation {
            message: "matching.date_window_days must be positive".to_string(),
        });
    }

    // Accepting every best candidate would defeat the precision-first
    // decision rule; a zero threshold is always a config mistake.
    if config.matching.accept_threshold == 0 {
        return Err(ConfigError::Validation {
            message: "matching.accept_threshold must be positive".to_string(),
        });
    }

    for pattern in &config.matching.exclude_labels {
        if let Err(e) = regex::Regex::new(pattern) {
            return Err(ConfigError::InvalidPattern {
                pattern: pattern.clone(),
                reason: e.to_string(),
            });
        }
    }

    Ok(())
}
