//! # contract: shared types and seams for the artifact handoff
//!
//! Plain data flowing between the locator, the publisher and their callers,
//! plus the traits that keep the network and the credential source pluggable:
//! - [`ObjectStore`]: durable remote storage accepting a streamed object.
//! - [`CredentialProvider`]: explicit source of authentication material.
//!
//! Both traits carry `mockall` automocks (feature `test-export-mocks`) so
//! callers can drive every publish outcome without a network.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

/// A model file selected for publication.
///
/// Candidates returned by [`ArtifactLocator`](crate::locate::ArtifactLocator)
/// name a regular file with the expected suffix as of the scan. Nothing holds
/// that true afterwards, so the publisher checks the path again before upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactCandidate {
    pub path: PathBuf,
    pub modified: SystemTime,
    pub size: u64,
}

impl ArtifactCandidate {
    pub fn new(path: impl Into<PathBuf>, modified: SystemTime, size: u64) -> Self {
        Self {
            path: path.into(),
            modified,
            size,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Base name of the candidate, used as the default object key.
    pub fn base_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TargetError {
    #[error("upload bucket must not be empty")]
    EmptyBucket,
    #[error("object key override must not be empty")]
    EmptyKey,
}

/// Destination of a publish: a bucket plus an optional object key override.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadTarget {
    bucket: String,
    key: Option<String>,
}

impl UploadTarget {
    pub fn new(bucket: impl Into<String>) -> Result<Self, TargetError> {
        let bucket = bucket.into();
        if bucket.trim().is_empty() {
            return Err(TargetError::EmptyBucket);
        }
        Ok(Self { bucket, key: None })
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Result<Self, TargetError> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err(TargetError::EmptyKey);
        }
        self.key = Some(key);
        Ok(self)
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn key_override(&self) -> Option<&str> {
        self.key.as_deref()
    }

    /// The override when one was given, otherwise the candidate's base name.
    pub fn resolve_key(&self, candidate: &ArtifactCandidate) -> String {
        match &self.key {
            Some(key) => key.clone(),
            None => candidate.base_name(),
        }
    }
}

/// Why a publish did not succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    SourceNotFound,
    AuthRejected,
    TransferError,
    RemoteRejected,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FailureReason::SourceNotFound => "source not found",
            FailureReason::AuthRejected => "auth rejected",
            FailureReason::TransferError => "transfer error",
            FailureReason::RemoteRejected => "remote rejected",
        };
        f.write_str(s)
    }
}

/// Outcome of a single publish. There is no partial success.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum UploadResult {
    Success {
        remote_key: String,
        bytes: u64,
        sha256: Option<String>,
    },
    Failure {
        reason: FailureReason,
        detail: String,
    },
}

impl UploadResult {
    pub fn failure(reason: FailureReason, detail: impl Into<String>) -> Self {
        UploadResult::Failure {
            reason,
            detail: detail.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, UploadResult::Success { .. })
    }
}

/// Request metadata for one object write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutObject {
    pub bucket: String,
    pub key: String,
    pub content_length: u64,
}

/// Acknowledgement from the store after it received the whole body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutAck {
    pub key: String,
    pub bytes: u64,
    /// Hex SHA-256 of the bytes actually streamed, when the store computed it.
    pub sha256: Option<String>,
    pub etag: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("store refused credentials (status {status}): {message}")]
    Unauthorized { status: u16, message: String },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("store rejected object (status {status}): {message}")]
    Rejected { status: u16, message: String },
}

impl StoreError {
    pub fn reason(&self) -> FailureReason {
        match self {
            StoreError::Unauthorized { .. } => FailureReason::AuthRejected,
            StoreError::Transport(_) => FailureReason::TransferError,
            StoreError::Rejected { .. } => FailureReason::RemoteRejected,
        }
    }
}

/// Authentication material handed to the store for one request.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    token: String,
}

impl Credentials {
    pub fn bearer(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialError {
    #[error("credential variable {0} is not set")]
    Missing(String),
    #[error("invalid credentials: {0}")]
    Invalid(String),
}

/// Supplies credentials explicitly instead of the store reading them from
/// the process environment on its own.
#[cfg_attr(any(test, feature = "test-export-mocks"), mockall::automock)]
pub trait CredentialProvider: Send + Sync {
    fn credentials(&self) -> Result<Credentials, CredentialError>;
}

/// Fixed credentials, for callers that already hold a token.
#[derive(Debug, Clone)]
pub struct StaticCredentials(Credentials);

impl StaticCredentials {
    pub fn new(token: impl Into<String>) -> Self {
        Self(Credentials::bearer(token))
    }
}

impl CredentialProvider for StaticCredentials {
    fn credentials(&self) -> Result<Credentials, CredentialError> {
        if self.0.token().is_empty() {
            return Err(CredentialError::Invalid("empty token".into()));
        }
        Ok(self.0.clone())
    }
}

/// Durable object storage accepting one streamed object per call.
///
/// Implementors must only return `Ok` once the remote side has acknowledged
/// the complete body, and must map credential refusals to
/// [`StoreError::Unauthorized`] so the publisher can tell them apart.
#[cfg_attr(any(test, feature = "test-export-mocks"), mockall::automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put_object(
        &self,
        credentials: Credentials,
        request: PutObject,
        body: tokio::fs::File,
    ) -> Result<PutAck, StoreError>;
}
