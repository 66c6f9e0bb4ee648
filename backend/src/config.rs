use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Server configuration, loaded from an optional YAML file. Every section
/// falls back to the defaults below, so a missing file is not an error.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub upload: UploadConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub reports: ReportsConfig,
    #[serde(default)]
    pub static_assets: StaticConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    #[serde(default = "default_upload_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_max_upload_bytes")]
    pub max_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Ordered candidate locations for the TorchScript artifact; the first
    /// path that exists is loaded.
    #[serde(default = "default_model_candidates")]
    pub candidates: Vec<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportsConfig {
    #[serde(default = "default_history_candidates")]
    pub training_history: Vec<PathBuf>,
    #[serde(default = "default_report_candidates")]
    pub classification_report: Vec<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StaticConfig {
    /// Directory the single-page UI is served from. When unset, the server
    /// falls back to `<manifest dir>/../static` during development and
    /// `static` otherwise.
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            dir: default_upload_dir(),
            max_bytes: default_max_upload_bytes(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            candidates: default_model_candidates(),
        }
    }
}

impl Default for ReportsConfig {
    fn default() -> Self {
        Self {
            training_history: default_history_candidates(),
            classification_report: default_report_candidates(),
        }
    }
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("uploads")
}

fn default_max_upload_bytes() -> usize {
    16 * 1024 * 1024
}

fn default_model_candidates() -> Vec<PathBuf> {
    [
        "../model-info/best_guava_model.pt",
        "model-info/best_guava_model.pt",
        "best_guava_model.pt",
        "converted_guava_model.pt",
    ]
    .iter()
    .map(PathBuf::from)
    .collect()
}

fn default_history_candidates() -> Vec<PathBuf> {
    [
        "../model-info/training_history.csv",
        "model-info/training_history.csv",
        "training_history.csv",
    ]
    .iter()
    .map(PathBuf::from)
    .collect()
}

fn default_report_candidates() -> Vec<PathBuf> {
    [
        "../model-info/classification_report.csv",
        "model-info/classification_report.csv",
        "classification_report.csv",
    ]
    .iter()
    .map(PathBuf::from)
    .collect()
}

impl AppConfig {
    /// Reads the config file named by `GUAVA_CONFIG` (default `config.yaml`).
    /// A missing file yields the defaults; a malformed file is an error.
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        let path = std::env::var("GUAVA_CONFIG").unwrap_or_else(|_| "config.yaml".to_string());
        if !Path::new(&path).exists() {
            return Ok(Self::default());
        }
        let config_str = std::fs::read_to_string(&path)?;
        let config: AppConfig = serde_yaml::from_str(&config_str)?;
        Ok(config)
    }
}

/// Returns the first candidate path that exists on disk.
pub fn first_existing(candidates: &[PathBuf]) -> Option<PathBuf> {
    candidates.iter().find(|p| p.exists()).cloned()
}
