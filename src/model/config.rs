use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

const ENV_CONFIG_PATH: &str = "PREDICT_CARE_CONFIG_PATH";
const DEFAULT_CONFIG_PATH: &str = "config.yaml";

const ENV_JWT_SECRET: &str = "PREDICT_CARE_JWT_SECRET";
const DEFAULT_JWT_SECRET: &str = "insecure-dev-secret-change-in-production";

/// File storage configuration for uploaded health records
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Root directory for uploaded files. Each user gets a subdirectory.
    #[serde(default = "default_upload_dir")]
    pub upload_dir: String,
}

fn default_upload_dir() -> String {
    "uploads".to_string()
}

fn default_seed_demo_doctors() -> bool {
    true
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_dir: default_upload_dir(),
        }
    }
}

impl StorageConfig {
    /// Per-user upload directory. Files are isolated under `user_{id}`.
    pub fn user_dir(&self, user_id: i64) -> PathBuf {
        Path::new(&self.upload_dir).join(format!("user_{}", user_id))
    }
}

/// YAML configuration file structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub storage: StorageConfig,
    /// Seed the demo doctor accounts at startup when the table is empty
    #[serde(default = "default_seed_demo_doctors")]
    pub seed_demo_doctors: bool,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub storage: StorageConfig,
    pub seed_demo_doctors: bool,
    pub jwt_secret: String,
    pub port: u16,
    pub host: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage: StorageConfig::default(),
            seed_demo_doctors: true,
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            port: 8080,
            host: "127.0.0.1".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment and config file
    pub fn from_env() -> Self {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);

        let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());

        let jwt_secret =
            std::env::var(ENV_JWT_SECRET).unwrap_or_else(|_| DEFAULT_JWT_SECRET.to_string());

        // Load config file
        let config_path =
            std::env::var(ENV_CONFIG_PATH).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

        let file = Self::load_config_file(&config_path).unwrap_or_default();

        Self {
            storage: file.storage,
            seed_demo_doctors: file.seed_demo_doctors,
            jwt_secret,
            port,
            host,
        }
    }

    /// Load configuration from YAML file
    fn load_config_file(path: &str) -> Option<ConfigFile> {
        let path = Path::new(path);

        if !path.exists() {
            tracing::debug!(path = %path.display(), "Config file not found, using defaults");
            return None;
        }

        match fs::read_to_string(path) {
            Ok(contents) => {
                // Handle empty file
                let contents = contents.trim();
                if contents.is_empty() {
                    tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
                    return Some(ConfigFile::default());
                }

                match serde_yaml::from_str(contents) {
                    Ok(config) => {
                        tracing::info!(path = %path.display(), "Loaded configuration from file");
                        Some(config)
                    }
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "Failed to parse config file, using defaults");
                        None
                    }
                }
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to read config file, using defaults");
                None
            }
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_binds_loopback() {
        let config = Config::default();
        assert_eq!(config.bind_addr(), "127.0.0.1:8080");
    }

    #[test]
    fn storage_user_dir_isolates_users() {
        let storage = StorageConfig::default();
        assert_eq!(storage.user_dir(7), Path::new("uploads").join("user_7"));
        assert_ne!(storage.user_dir(1), storage.user_dir(2));
    }

    #[test]
    fn config_file_defaults_apply_to_missing_keys() {
        let file: ConfigFile = serde_yaml::from_str("storage:\n  upload_dir: /tmp/records\n").unwrap();
        assert_eq!(file.storage.upload_dir, "/tmp/records");
        assert!(file.seed_demo_doctors);
    }

    #[test]
    fn seed_toggle_can_be_disabled() {
        let file: ConfigFile = serde_yaml::from_str("seed_demo_doctors: false\n").unwrap();
        assert!(!file.seed_demo_doctors);
        assert_eq!(file.storage.upload_dir, "uploads");
    }
}
