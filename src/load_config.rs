/// `load_config` module: loads the static YAML handoff config and merges in
/// environment overrides for the upload destination.
///
/// Secrets never live in the file: the bearer token is read at publish time
/// from the variable named by `upload.token_env`. The endpoint and bucket may
/// be set in the file or overridden with `HANDOFF_ENDPOINT` / `HANDOFF_BUCKET`.
///
/// # Errors
/// All errors use `anyhow::Error` and are surfaced at the CLI boundary.
use anyhow::Result;
use artifact_handoff_core::config::{HandoffConfig, UploadConfig};
use std::fs;
use std::path::Path;
use tracing::{error, info};

pub const ENDPOINT_ENV: &str = "HANDOFF_ENDPOINT";
pub const BUCKET_ENV: &str = "HANDOFF_BUCKET";

/// Upload settings after env merging, with the required fields present.
#[derive(Debug, Clone)]
pub struct ResolvedUpload {
    pub endpoint: String,
    pub bucket: String,
    pub key: Option<String>,
    pub token_env: String,
    pub timeout_secs: u64,
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<HandoffConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => content,
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    let mut config: HandoffConfig = match serde_yaml::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            conf
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
        }
    };

    if config.suffix.is_empty() {
        anyhow::bail!("suffix must not be empty");
    }

    let endpoint_env = std::env::var(ENDPOINT_ENV).ok();
    let bucket_env = std::env::var(BUCKET_ENV).ok();
    if endpoint_env.is_some() || bucket_env.is_some() {
        let upload = config.upload.get_or_insert_with(|| UploadConfig {
            endpoint: None,
            bucket: None,
            key: None,
            token_env: artifact_handoff_core::config::DEFAULT_TOKEN_ENV.to_string(),
            timeout_secs: artifact_handoff_core::config::DEFAULT_TIMEOUT_SECS,
        });
        if let Some(endpoint) = endpoint_env {
            info!(var = ENDPOINT_ENV, "Endpoint overridden from environment");
            upload.endpoint = Some(endpoint);
        }
        if let Some(bucket) = bucket_env {
            info!(var = BUCKET_ENV, "Bucket overridden from environment");
            upload.bucket = Some(bucket);
        }
    }

    config.trace_loaded();
    Ok(config)
}

/// Checks that an upload section names both an endpoint and a bucket.
pub fn resolve_upload(upload: &UploadConfig) -> Result<ResolvedUpload> {
    let endpoint = match upload.endpoint.as_deref().map(str::trim) {
        Some(e) if !e.is_empty() => e.to_string(),
        _ => {
            error!("Upload endpoint missing from config and environment");
            anyhow::bail!("upload.endpoint is required (or set {ENDPOINT_ENV})");
        }
    };
    let bucket = match upload.bucket.as_deref().map(str::trim) {
        Some(b) if !b.is_empty() => b.to_string(),
        _ => {
            error!("Upload bucket missing from config and environment");
            anyhow::bail!("upload.bucket is required (or set {BUCKET_ENV})");
        }
    };
    Ok(ResolvedUpload {
        endpoint,
        bucket,
        key: upload.key.clone(),
        token_env: upload.token_env.clone(),
        timeout_secs: upload.timeout_secs,
    })
}
