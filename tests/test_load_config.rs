use artifact_handoff::load_config::{load_config, resolve_upload, BUCKET_ENV, ENDPOINT_ENV};
use serial_test::serial;
use std::env;
use std::fs::write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

fn clear_env() {
    env::remove_var(ENDPOINT_ENV);
    env::remove_var(BUCKET_ENV);
}

/// A full config file parses into the typed config with trainer and upload sections.
#[test]
#[serial]
fn test_load_config_full_file() {
    clear_env();
    let config_yaml = r#"
output_dir: ./outputs
suffix: .safetensors
upload:
  endpoint: https://store.example.com
  bucket: models
  key: run42.safetensors
  token_env: MY_TOKEN
  timeout_secs: 30
trainer:
  command: accelerate
  args: ["launch", "train_network.py"]
  working_dir: ./kohya
  use_shell: true
"#;
    let config_file = NamedTempFile::new().expect("temp file");
    write(config_file.path(), config_yaml).unwrap();

    let config = load_config(config_file.path()).expect("Config should load");

    assert_eq!(config.output_dir, PathBuf::from("./outputs"));
    let upload = config.upload.as_ref().expect("upload section");
    assert_eq!(upload.bucket.as_deref(), Some("models"));
    assert_eq!(upload.token_env, "MY_TOKEN");
    assert_eq!(upload.timeout_secs, 30);

    let trainer = config.trainer.expect("trainer section");
    assert_eq!(trainer.command, "accelerate");
    assert_eq!(trainer.args, vec!["launch", "train_network.py"]);
    assert!(trainer.use_shell);

    let resolved = resolve_upload(upload).expect("upload resolves");
    assert_eq!(resolved.endpoint, "https://store.example.com");
    assert_eq!(resolved.key.as_deref(), Some("run42.safetensors"));
}

/// Environment variables override (or supply) the upload destination.
#[test]
#[serial]
fn test_load_config_env_overrides_destination() {
    clear_env();
    let config_file = NamedTempFile::new().expect("temp file");
    write(config_file.path(), "output_dir: ./outputs\n").unwrap();

    env::set_var(ENDPOINT_ENV, "http://127.0.0.1:9000");
    env::set_var(BUCKET_ENV, "from-env");
    let config = load_config(config_file.path()).expect("Config should load");
    clear_env();

    let upload = config.upload.expect("upload created from env");
    assert_eq!(upload.endpoint.as_deref(), Some("http://127.0.0.1:9000"));
    assert_eq!(upload.bucket.as_deref(), Some("from-env"));
    assert_eq!(upload.token_env, "HANDOFF_ACCESS_TOKEN");
    assert_eq!(config.suffix, ".safetensors");
}

/// The trainer runs through the shell when the config does not say otherwise.
#[test]
#[serial]
fn test_load_config_trainer_defaults_to_shell() {
    clear_env();
    let config_file = NamedTempFile::new().expect("temp file");
    write(
        config_file.path(),
        "output_dir: ./outputs\ntrainer:\n  command: accelerate\n",
    )
    .unwrap();

    let config = load_config(config_file.path()).expect("Config should load");
    let trainer = config.trainer.expect("trainer section");
    assert!(trainer.use_shell, "use_shell must default to true");
    assert!(trainer.args.is_empty());
}

#[test]
#[serial]
fn test_resolve_upload_requires_bucket() {
    clear_env();
    let config_file = NamedTempFile::new().expect("temp file");
    write(
        config_file.path(),
        "output_dir: ./outputs\nupload:\n  endpoint: https://store.example.com\n",
    )
    .unwrap();

    let config = load_config(config_file.path()).expect("Config should load");
    let err = resolve_upload(config.upload.as_ref().unwrap()).unwrap_err();
    assert!(
        err.to_string().contains("bucket"),
        "Must name the missing bucket, got: {err}"
    );
}

/// Invalid YAML is reported as a parse error.
#[test]
#[serial]
fn test_load_config_errors_for_invalid_file() {
    clear_env();
    let config_file = NamedTempFile::new().expect("temp file");
    write(config_file.path(), b"not-yaml: [:::").unwrap();

    let err = load_config(config_file.path()).unwrap_err();
    let msg = err.to_string();
    assert!(
        msg.contains("parse") || msg.contains("YAML"),
        "Parse error expected, got: {msg}"
    );
}

#[test]
#[serial]
fn test_load_config_errors_for_missing_file() {
    clear_env();
    let err = load_config("definitely/not/here.yaml").unwrap_err();
    assert!(err.to_string().contains("Failed to read config file"));
}
