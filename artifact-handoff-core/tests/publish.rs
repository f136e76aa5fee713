use artifact_handoff_core::contract::{
    ArtifactCandidate, CredentialError, Credentials, FailureReason, MockCredentialProvider,
    MockObjectStore, PutAck, PutObject, StaticCredentials, StoreError, UploadResult, UploadTarget,
};
use artifact_handoff_core::locate::ArtifactLocator;
use artifact_handoff_core::publish::Publisher;
use std::fs::write;
use std::time::SystemTime;
use tempfile::tempdir;

fn valid_credentials() -> MockCredentialProvider {
    let mut creds = MockCredentialProvider::new();
    creds
        .expect_credentials()
        .returning(|| Ok(Credentials::bearer("test-token")));
    creds
}

fn acking_store() -> MockObjectStore {
    let mut store = MockObjectStore::new();
    store
        .expect_put_object()
        .times(1)
        .returning(|_creds, req: PutObject, _body| {
            Ok(PutAck {
                key: req.key,
                bytes: req.content_length,
                sha256: Some("abc123".into()),
                etag: None,
            })
        });
    store
}

fn failing_store(err: StoreError) -> MockObjectStore {
    let mut store = MockObjectStore::new();
    store
        .expect_put_object()
        .times(1)
        .returning(move |_, _, _| Err(err.clone()));
    store
}

#[tokio::test]
async fn missing_source_fails_without_network_call() {
    let mut store = MockObjectStore::new();
    store.expect_put_object().never();
    let mut creds = MockCredentialProvider::new();
    creds.expect_credentials().never();

    let publisher = Publisher::new(store, creds);
    let candidate = ArtifactCandidate::new("/nonexistent/model.safetensors", SystemTime::now(), 1);
    let target = UploadTarget::new("b").unwrap();

    match publisher.publish(&candidate, &target).await {
        UploadResult::Failure { reason, .. } => assert_eq!(reason, FailureReason::SourceNotFound),
        other => panic!("expected SourceNotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn directory_as_source_is_source_not_found() {
    let tmp = tempdir().unwrap();
    let mut store = MockObjectStore::new();
    store.expect_put_object().never();

    let publisher = Publisher::new(store, valid_credentials());
    let candidate = ArtifactCandidate::new(tmp.path(), SystemTime::now(), 0);
    let result = publisher
        .publish(&candidate, &UploadTarget::new("b").unwrap())
        .await;
    assert!(matches!(
        result,
        UploadResult::Failure {
            reason: FailureReason::SourceNotFound,
            ..
        }
    ));
}

#[tokio::test]
async fn unavailable_credentials_are_auth_rejected_without_network_call() {
    let tmp = tempdir().unwrap();
    write(tmp.path().join("model.safetensors"), b"weights").unwrap();
    let candidate = ArtifactLocator::default().locate(tmp.path()).unwrap();

    let mut store = MockObjectStore::new();
    store.expect_put_object().never();
    let mut creds = MockCredentialProvider::new();
    creds
        .expect_credentials()
        .returning(|| Err(CredentialError::Missing("HANDOFF_ACCESS_TOKEN".into())));

    let result = Publisher::new(store, creds)
        .publish(&candidate, &UploadTarget::new("b").unwrap())
        .await;
    match result {
        UploadResult::Failure { reason, detail } => {
            assert_eq!(reason, FailureReason::AuthRejected);
            assert!(detail.contains("HANDOFF_ACCESS_TOKEN"));
        }
        other => panic!("expected AuthRejected, got {other:?}"),
    }
}

#[tokio::test]
async fn store_error_kinds_map_to_distinct_failures() {
    let tmp = tempdir().unwrap();
    write(tmp.path().join("model.safetensors"), b"weights").unwrap();
    let candidate = ArtifactLocator::default().locate(tmp.path()).unwrap();
    let target = UploadTarget::new("b").unwrap();

    let cases = vec![
        (
            StoreError::Unauthorized {
                status: 401,
                message: "bad token".into(),
            },
            FailureReason::AuthRejected,
        ),
        (
            StoreError::Transport("connection reset".into()),
            FailureReason::TransferError,
        ),
        (
            StoreError::Rejected {
                status: 507,
                message: "insufficient storage".into(),
            },
            FailureReason::RemoteRejected,
        ),
    ];

    for (err, expected) in cases {
        let publisher = Publisher::new(failing_store(err), StaticCredentials::new("bad"));
        match publisher.publish(&candidate, &target).await {
            UploadResult::Failure { reason, .. } => assert_eq!(reason, expected),
            other => panic!("expected {expected:?}, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn short_acknowledgement_is_remote_rejected() {
    let tmp = tempdir().unwrap();
    write(tmp.path().join("model.safetensors"), b"weights").unwrap();
    let candidate = ArtifactLocator::default().locate(tmp.path()).unwrap();

    let mut store = MockObjectStore::new();
    store.expect_put_object().returning(|_, req, _| {
        Ok(PutAck {
            key: req.key,
            bytes: req.content_length - 1,
            sha256: None,
            etag: None,
        })
    });

    let result = Publisher::new(store, valid_credentials())
        .publish(&candidate, &UploadTarget::new("b").unwrap())
        .await;
    assert!(matches!(
        result,
        UploadResult::Failure {
            reason: FailureReason::RemoteRejected,
            ..
        }
    ));
}

#[tokio::test]
async fn successful_publish_uses_base_name_as_key() {
    let tmp = tempdir().unwrap();
    write(tmp.path().join("model.safetensors"), b"weights").unwrap();
    let candidate = ArtifactLocator::default().locate(tmp.path()).unwrap();

    let mut store = MockObjectStore::new();
    store
        .expect_put_object()
        .withf(|creds, req, _| {
            creds.token() == "test-token"
                && req.bucket == "b"
                && req.key == "model.safetensors"
                && req.content_length == 7
        })
        .times(1)
        .returning(|_, req, _| {
            Ok(PutAck {
                key: req.key,
                bytes: req.content_length,
                sha256: None,
                etag: Some("\"etag\"".into()),
            })
        });

    let result = Publisher::new(store, valid_credentials())
        .publish(&candidate, &UploadTarget::new("b").unwrap())
        .await;
    assert_eq!(
        result,
        UploadResult::Success {
            remote_key: "model.safetensors".into(),
            bytes: 7,
            sha256: None,
        }
    );
}

#[tokio::test]
async fn key_override_replaces_base_name() {
    let tmp = tempdir().unwrap();
    write(tmp.path().join("model.safetensors"), b"weights").unwrap();
    let candidate = ArtifactLocator::default().locate(tmp.path()).unwrap();
    let target = UploadTarget::new("b")
        .unwrap()
        .with_key("run42.safetensors")
        .unwrap();

    let result = Publisher::new(acking_store(), valid_credentials())
        .publish(&candidate, &target)
        .await;
    match result {
        UploadResult::Success {
            remote_key, sha256, ..
        } => {
            assert_eq!(remote_key, "run42.safetensors");
            assert_eq!(sha256.as_deref(), Some("abc123"));
        }
        other => panic!("expected success, got {other:?}"),
    }
}
