use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info};

use crate::locate::DEFAULT_SUFFIX;
use crate::trainer::TrainerConfig;

pub const DEFAULT_TOKEN_ENV: &str = "HANDOFF_ACCESS_TOKEN";
pub const DEFAULT_TIMEOUT_SECS: u64 = 600;

fn default_suffix() -> String {
    DEFAULT_SUFFIX.to_string()
}

fn default_token_env() -> String {
    DEFAULT_TOKEN_ENV.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandoffConfig {
    pub output_dir: PathBuf,
    #[serde(default = "default_suffix")]
    pub suffix: String,
    #[serde(default)]
    pub upload: Option<UploadConfig>,
    #[serde(default)]
    pub trainer: Option<TrainerConfig>,
}

/// Where and how to publish. Endpoint and bucket may also come from the
/// environment, so both are optional at parse time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub bucket: Option<String>,
    #[serde(default)]
    pub key: Option<String>,
    /// Name of the environment variable holding the bearer token.
    #[serde(default = "default_token_env")]
    pub token_env: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl HandoffConfig {
    pub fn trace_loaded(&self) {
        info!(
            output_dir = %self.output_dir.display(),
            suffix = %self.suffix,
            upload = self.upload.is_some(),
            trainer = self.trainer.is_some(),
            "Loaded HandoffConfig"
        );
        debug!(?self, "HandoffConfig loaded (full debug)");
    }
}
