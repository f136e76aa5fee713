//! Publication of a located artifact to an [`ObjectStore`].
//!
//! `publish` never returns an error or panics: every failure is folded into
//! [`UploadResult::Failure`] with one of the four [`FailureReason`]s. There is
//! no internal retry; callers wanting one wrap `publish` themselves.

use tokio::fs::File;
use tracing::debug;

use crate::contract::{
    ArtifactCandidate, CredentialProvider, FailureReason, ObjectStore, PutObject, UploadResult,
    UploadTarget,
};

pub struct Publisher<S, C> {
    store: S,
    credentials: C,
}

impl<S, C> Publisher<S, C>
where
    S: ObjectStore,
    C: CredentialProvider,
{
    pub fn new(store: S, credentials: C) -> Self {
        Self { store, credentials }
    }

    pub async fn publish(
        &self,
        candidate: &ArtifactCandidate,
        target: &UploadTarget,
    ) -> UploadResult {
        let key = target.resolve_key(candidate);

        // The source is checked before credentials so a vanished file never
        // reaches the network.
        let file = match File::open(candidate.path()).await {
            Ok(file) => file,
            Err(e) => {
                return UploadResult::failure(
                    FailureReason::SourceNotFound,
                    format!("cannot open {}: {e}", candidate.path().display()),
                )
            }
        };
        let content_length = match file.metadata().await {
            Ok(m) if m.is_file() => m.len(),
            Ok(_) => {
                return UploadResult::failure(
                    FailureReason::SourceNotFound,
                    format!("{} is not a regular file", candidate.path().display()),
                )
            }
            Err(e) => {
                return UploadResult::failure(
                    FailureReason::SourceNotFound,
                    format!("cannot stat {}: {e}", candidate.path().display()),
                )
            }
        };

        let credentials = match self.credentials.credentials() {
            Ok(credentials) => credentials,
            Err(e) => return UploadResult::failure(FailureReason::AuthRejected, e.to_string()),
        };

        let request = PutObject {
            bucket: target.bucket().to_string(),
            key: key.clone(),
            content_length,
        };
        debug!(
            bucket = %request.bucket,
            key = %request.key,
            bytes = content_length,
            path = %candidate.path().display(),
            "Uploading artifact"
        );

        match self.store.put_object(credentials, request, file).await {
            Ok(ack) if ack.bytes != content_length => UploadResult::failure(
                FailureReason::RemoteRejected,
                format!(
                    "store acknowledged {} of {} bytes for {}",
                    ack.bytes, content_length, key
                ),
            ),
            Ok(ack) => {
                debug!(key = %ack.key, etag = ?ack.etag, "Store acknowledged object");
                UploadResult::Success {
                    remote_key: key,
                    bytes: ack.bytes,
                    sha256: ack.sha256,
                }
            }
            Err(e) => UploadResult::failure(e.reason(), e.to_string()),
        }
    }
}
