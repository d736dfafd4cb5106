// src/config.rs

use serde::Deserialize;
use std::{fs, path::Path};

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub vision: VisionSection,
    #[serde(default)]
    pub image: ImageSection,
    #[serde(default)]
    pub storage: StorageSection,
    #[serde(default)]
    pub pipeline: PipelineSection,
}

#[derive(Debug, Deserialize)]
pub struct VisionSection {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Name of the environment variable holding the API key. The key
    /// itself never lives in the config file.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

#[derive(Debug, Deserialize)]
pub struct ImageSection {
    #[serde(default = "default_max_dimension")]
    pub max_dimension: u32,
    /// Grayscale contrast enhancement before recognition. Off by
    /// default; intended for faint thermal-paper receipts.
    #[serde(default)]
    pub enhance: bool,
}

#[derive(Debug, Deserialize)]
pub struct StorageSection {
    #[serde(default = "default_storage_root")]
    pub root: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct PipelineSection {
    #[serde(default)]
    pub enforce_total_reconciliation: bool,
}

fn default_base_url() -> String {
    "https://dashscope.aliyuncs.com/compatible-mode/v1".to_string()
}

fn default_model() -> String {
    "qwen-vl-max-latest".to_string()
}

fn default_api_key_env() -> String {
    "DASHSCOPE_API_KEY".to_string()
}

fn default_max_dimension() -> u32 {
    1600
}

fn default_storage_root() -> String {
    "exports".to_string()
}

impl Default for VisionSection {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            api_key_env: default_api_key_env(),
        }
    }
}

impl Default for ImageSection {
    fn default() -> Self {
        Self {
            max_dimension: default_max_dimension(),
            enhance: false,
        }
    }
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            root: default_storage_root(),
        }
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Box<dyn std::error::Error>> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let cfg: Config = toml::from_str("").unwrap();
        assert_eq!(cfg.vision.model, "qwen-vl-max-latest");
        assert_eq!(cfg.vision.api_key_env, "DASHSCOPE_API_KEY");
        assert_eq!(cfg.image.max_dimension, 1600);
        assert!(!cfg.image.enhance);
        assert_eq!(cfg.storage.root, "exports");
        assert!(!cfg.pipeline.enforce_total_reconciliation);
    }

    #[test]
    fn partial_config_overrides() {
        let cfg: Config = toml::from_str(
            r#"
            [vision]
            model = "qwen-vl-plus"

            [pipeline]
            enforce_total_reconciliation = true
            "#,
        )
        .unwrap();
        assert_eq!(cfg.vision.model, "qwen-vl-plus");
        assert!(cfg.pipeline.enforce_total_reconciliation);
        // Untouched sections keep their defaults.
        assert!(cfg.vision.base_url.contains("dashscope"));
        assert_eq!(cfg.storage.root, "exports");
    }
}
