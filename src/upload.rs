#![doc = "Object-store integration for the CLI: bridges the core `ObjectStore` and `CredentialProvider` traits to an HTTP endpoint and the process environment."]
//
//! # HTTP object store
//!
//! [`HttpObjectStore`] writes one object per call with
//! `PUT {endpoint}/{bucket}/{key}`, streaming the file body and sending the
//! token from [`Credentials`] as a bearer header. Any S3-style gateway or
//! presigning proxy that accepts bearer-authenticated PUTs will do.
//!
//! Status mapping:
//! - 2xx: acknowledged; the ack carries the streamed byte count and SHA-256
//! - 401 / 403: [`StoreError::Unauthorized`]
//! - any other status: [`StoreError::Rejected`]
//! - connection, timeout or body errors: [`StoreError::Transport`]
//!
//! [`EnvCredentials`] reads the bearer token from a named environment
//! variable after loading `.env` if present.

use std::env;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use futures::TryStreamExt;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE, ETAG};
use reqwest::{Body, Client, StatusCode, Url};
use sha2::{Digest, Sha256};
use tokio_util::io::ReaderStream;

pub use artifact_handoff_core::contract::{
    CredentialError, CredentialProvider, Credentials, ObjectStore, PutAck, PutObject, StoreError,
};

#[derive(Debug, Clone)]
pub struct HttpObjectStore {
    client: Client,
    endpoint: Url,
}

impl HttpObjectStore {
    pub fn new(endpoint: &str, timeout: Duration) -> anyhow::Result<Self> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| anyhow::anyhow!("Invalid object store endpoint {endpoint:?}: {e}"))?;
        if endpoint.cannot_be_a_base() {
            anyhow::bail!("Object store endpoint {endpoint} cannot carry a bucket path");
        }
        let client = Client::builder().timeout(timeout).build()?;
        tracing::debug!(
            endpoint = %endpoint,
            timeout_secs = timeout.as_secs(),
            "Initialized HttpObjectStore"
        );
        Ok(Self { client, endpoint })
    }

    /// `{endpoint}/{bucket}/{key}`. A `/` in the key separates path segments,
    /// so `runs/run42.safetensors` lands under a `runs` prefix. Each segment
    /// is percent-encoded on its own.
    pub fn object_url(&self, bucket: &str, key: &str) -> Result<Url, StoreError> {
        let mut url = self.endpoint.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                StoreError::Transport(format!("endpoint {} has no path", self.endpoint))
            })?;
            segments.pop_if_empty().push(bucket);
            segments.extend(key.split('/'));
        }
        Ok(url)
    }
}

#[async_trait]
impl ObjectStore for HttpObjectStore {
    async fn put_object(
        &self,
        credentials: Credentials,
        request: PutObject,
        body: tokio::fs::File,
    ) -> Result<PutAck, StoreError> {
        let url = self.object_url(&request.bucket, &request.key)?;
        tracing::debug!(
            url = %url,
            bytes = request.content_length,
            "Uploading object"
        );

        let sent = Arc::new(AtomicU64::new(0));
        let hasher = Arc::new(Mutex::new(Sha256::new()));
        let stream = {
            let sent = sent.clone();
            let hasher = hasher.clone();
            ReaderStream::new(body).inspect_ok(move |chunk| {
                sent.fetch_add(chunk.len() as u64, Ordering::Relaxed);
                hasher
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .update(chunk);
            })
        };

        let response = self
            .client
            .put(url.clone())
            .bearer_auth(credentials.token())
            .header(CONTENT_TYPE, "application/octet-stream")
            .header(CONTENT_LENGTH, request.content_length)
            .body(Body::wrap_stream(stream))
            .send()
            .await
            .map_err(|e| {
                tracing::debug!(error = ?e, url = %url, "Transport error uploading object");
                StoreError::Transport(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            tracing::debug!(
                status = status.as_u16(),
                body = %message,
                "Object store refused upload"
            );
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => StoreError::Unauthorized {
                    status: status.as_u16(),
                    message,
                },
                _ => StoreError::Rejected {
                    status: status.as_u16(),
                    message,
                },
            });
        }

        let etag = response
            .headers()
            .get(ETAG)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let digest = hasher
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .finalize();
        let sha256 = Some(format!("{digest:x}"));
        let bytes = sent.load(Ordering::Relaxed);
        tracing::debug!(
            key = %request.key,
            bytes,
            etag = ?etag,
            "Object store acknowledged upload"
        );

        Ok(PutAck {
            key: request.key,
            bytes,
            sha256,
            etag,
        })
    }
}

/// Reads the bearer token from one environment variable on every call.
#[derive(Debug, Clone)]
pub struct EnvCredentials {
    var: String,
}

impl EnvCredentials {
    pub fn new_from_env(var: impl Into<String>) -> Self {
        dotenvy::dotenv().ok(); // loads environment variables from .env if present
        Self { var: var.into() }
    }
}

impl CredentialProvider for EnvCredentials {
    fn credentials(&self) -> Result<Credentials, CredentialError> {
        match env::var(&self.var) {
            Ok(token) if token.trim().is_empty() => {
                tracing::debug!(var = %self.var, "Credential variable is empty");
                Err(CredentialError::Invalid(format!("{} is empty", self.var)))
            }
            Ok(token) => Ok(Credentials::bearer(token)),
            Err(e) => {
                tracing::debug!(error = ?e, var = %self.var, "Credential variable missing");
                Err(CredentialError::Missing(self.var.clone()))
            }
        }
    }
}
