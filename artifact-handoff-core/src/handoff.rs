//! End-to-end handoff: locate the trained artifact, then publish it once.
//!
//! ```text
//! Idle -> Locating -> NotFound                       (terminal)
//!                  -> Located -> Publishing -> Success (terminal)
//!                                           -> Failure (terminal)
//! ```
//!
//! The runner owns no retry policy and never aborts the process; the caller
//! turns [`HandoffReport::exit_code`] into a process status.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, error, Instrument};
use uuid::Uuid;

use crate::contract::{
    ArtifactCandidate, CredentialProvider, FailureReason, ObjectStore, UploadResult, UploadTarget,
};
use crate::events::HandoffEvents;
use crate::locate::{ArtifactLocator, NotFoundKind};
use crate::publish::Publisher;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HandoffState {
    Idle,
    Locating,
    Located,
    NotFound,
    Publishing,
    Success,
    Failure,
}

impl HandoffState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            HandoffState::NotFound | HandoffState::Success | HandoffState::Failure
        )
    }

    /// Whether `next` is a legal successor of `self`.
    pub fn can_advance_to(self, next: HandoffState) -> bool {
        use HandoffState::*;
        matches!(
            (self, next),
            (Idle, Locating)
                | (Locating, Located)
                | (Locating, NotFound)
                | (Located, Publishing)
                | (Publishing, Success)
                | (Publishing, Failure)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum HandoffOutcome {
    NotFound {
        kind: NotFoundKind,
    },
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

impl From<UploadResult> for HandoffOutcome {
    fn from(result: UploadResult) -> Self {
        match result {
            UploadResult::Success {
                remote_key,
                bytes,
                sha256,
            } => HandoffOutcome::Success {
                remote_key,
                bytes,
                sha256,
            },
            UploadResult::Failure { reason, detail } => HandoffOutcome::Failure { reason, detail },
        }
    }
}

/// Named result of one handoff run.
#[derive(Debug, Clone, Serialize)]
pub struct HandoffReport {
    pub run_id: Uuid,
    pub output_dir: PathBuf,
    pub candidate: Option<ArtifactCandidate>,
    pub outcome: HandoffOutcome,
    /// States visited, from `Idle` to the terminal one.
    pub states: Vec<HandoffState>,
}

impl HandoffReport {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, HandoffOutcome::Success { .. })
    }

    pub fn exit_code(&self) -> u8 {
        if self.is_success() {
            0
        } else {
            1
        }
    }
}

struct StateTrail(Vec<HandoffState>);

impl StateTrail {
    fn new() -> Self {
        Self(vec![HandoffState::Idle])
    }

    fn advance(&mut self, next: HandoffState) {
        if let Some(&current) = self.0.last() {
            debug_assert!(current.can_advance_to(next), "{current:?} -> {next:?}");
            debug!(from = ?current, to = ?next, "Handoff state change");
        }
        self.0.push(next);
    }
}

pub struct HandoffRunner<S, C, E> {
    locator: ArtifactLocator,
    publisher: Publisher<S, C>,
    events: E,
}

impl<S, C, E> HandoffRunner<S, C, E>
where
    S: ObjectStore,
    C: CredentialProvider,
    E: HandoffEvents,
{
    pub fn new(locator: ArtifactLocator, publisher: Publisher<S, C>, events: E) -> Self {
        Self {
            locator,
            publisher,
            events,
        }
    }

    pub async fn run(&self, output_dir: &Path, target: &UploadTarget) -> HandoffReport {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("handoff", %run_id, output_dir = %output_dir.display());
        let report = self.run_inner(run_id, output_dir, target).instrument(span).await;

        match serde_json::to_string(&report) {
            Ok(json) => debug!(json = %json, "Handoff report"),
            Err(e) => error!(error = ?e, "Failed to serialize handoff report"),
        }
        report
    }

    async fn run_inner(
        &self,
        run_id: Uuid,
        output_dir: &Path,
        target: &UploadTarget,
    ) -> HandoffReport {
        let mut trail = StateTrail::new();
        trail.advance(HandoffState::Locating);

        let candidate = match self.locator.locate(output_dir) {
            Ok(candidate) => candidate,
            Err(not_found) => {
                trail.advance(HandoffState::NotFound);
                self.events.not_found(&not_found);
                return HandoffReport {
                    run_id,
                    output_dir: output_dir.to_path_buf(),
                    candidate: None,
                    outcome: HandoffOutcome::NotFound {
                        kind: not_found.kind,
                    },
                    states: trail.0,
                };
            }
        };
        trail.advance(HandoffState::Located);
        self.events.located(&candidate);

        trail.advance(HandoffState::Publishing);
        let result = self.publisher.publish(&candidate, target).await;
        match &result {
            UploadResult::Success {
                remote_key, bytes, ..
            } => {
                trail.advance(HandoffState::Success);
                self.events.published(&candidate, remote_key, *bytes);
            }
            UploadResult::Failure { reason, detail } => {
                trail.advance(HandoffState::Failure);
                self.events.publish_failed(&candidate, *reason, detail);
            }
        }

        HandoffReport {
            run_id,
            output_dir: output_dir.to_path_buf(),
            candidate: Some(candidate),
            outcome: result.into(),
            states: trail.0,
        }
    }
}
