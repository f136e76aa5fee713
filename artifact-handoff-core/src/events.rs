//! Reporting seam for handoff outcomes.
//!
//! The runner reports through an injected [`HandoffEvents`] rather than a
//! process-wide logger. [`TracingEvents`] is the production sink: one `info`
//! line on success and one `error` line for each failure kind.

use tracing::{debug, error, info};

use crate::contract::{ArtifactCandidate, FailureReason};
use crate::locate::NotFound;

#[cfg_attr(any(test, feature = "test-export-mocks"), mockall::automock)]
pub trait HandoffEvents: Send + Sync {
    /// A candidate was selected. Not a terminal event.
    fn located(&self, candidate: &ArtifactCandidate);

    fn not_found(&self, outcome: &NotFound);

    fn published(&self, candidate: &ArtifactCandidate, remote_key: &str, bytes: u64);

    fn publish_failed(&self, candidate: &ArtifactCandidate, reason: FailureReason, detail: &str);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEvents;

impl HandoffEvents for TracingEvents {
    fn located(&self, candidate: &ArtifactCandidate) {
        debug!(
            path = %candidate.path().display(),
            size = candidate.size,
            "Located trained artifact"
        );
    }

    fn not_found(&self, outcome: &NotFound) {
        error!(
            directory = %outcome.directory.display(),
            kind = ?outcome.kind,
            "No trained artifact found, nothing to publish"
        );
    }

    fn published(&self, candidate: &ArtifactCandidate, remote_key: &str, bytes: u64) {
        info!(
            path = %candidate.path().display(),
            remote_key,
            bytes,
            "Published trained artifact"
        );
    }

    fn publish_failed(&self, candidate: &ArtifactCandidate, reason: FailureReason, detail: &str) {
        match reason {
            FailureReason::SourceNotFound => error!(
                path = %candidate.path().display(),
                detail,
                "Artifact disappeared before upload"
            ),
            FailureReason::AuthRejected => error!(
                path = %candidate.path().display(),
                detail,
                "Object store rejected credentials"
            ),
            FailureReason::TransferError => error!(
                path = %candidate.path().display(),
                detail,
                "Transfer to object store failed"
            ),
            FailureReason::RemoteRejected => error!(
                path = %candidate.path().display(),
                detail,
                "Object store refused the artifact"
            ),
        }
    }
}
