use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliConfig {
    pub data_dir: PathBuf,
    pub json: bool,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            data_dir: dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("guessloto"),
            json: false,
        }
    }
}

impl CliConfig {
    pub fn new(data_dir: Option<PathBuf>, json: bool) -> Self {
        let defaults = Self::default();
        Self {
            data_dir: data_dir.unwrap_or(defaults.data_dir),
            json,
        }
    }
}
