// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use dg_core::test_support::holder;
use dg_core::LockStatus;
use tokio::net::UnixListener;

/// Serve one connection with a canned response, returning the request seen
async fn serve_once(listener: UnixListener, response: Response) -> Request {
    let (stream, _) = listener.accept().await.unwrap();
    let (mut reader, mut writer) = stream.into_split();
    let bytes = wire::read_message(&mut reader).await.unwrap();
    let request: Request = wire::decode(&bytes).unwrap();
    let data = wire::encode(&response).unwrap();
    wire::write_message(&mut writer, &data).await.unwrap();
    request
}

#[test]
fn missing_socket_means_not_running() {
    let dir = tempfile::tempdir().unwrap();
    let err = DaemonClient::at(&dir.path().join("daemon.sock")).unwrap_err();
    assert!(err.is_not_running());
}

#[tokio::test]
async fn lock_status_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let socket = dir.path().join("daemon.sock");
    let listener = UnixListener::bind(&socket).unwrap();
    let status = LockStatus::from_holder(Some(&holder("alice", "run-1", 1_000)), 4_000);
    let server = tokio::spawn(serve_once(listener, Response::Lock { status: status.clone() }));

    let client = DaemonClient::at(&socket).unwrap();
    assert_eq!(client.lock_status().await.unwrap(), status);
    assert_eq!(server.await.unwrap(), Request::Query { query: dg_wire::Query::LockStatus });
}

#[tokio::test]
async fn error_response_becomes_rejection() {
    let dir = tempfile::tempdir().unwrap();
    let socket = dir.path().join("daemon.sock");
    let listener = UnixListener::bind(&socket).unwrap();
    let response = Response::Error {
        kind: Some(ErrorKind::NotFound),
        message: "no artifact recorded for revision abc".to_string(),
        context: None,
    };
    tokio::spawn(serve_once(listener, response));

    let client = DaemonClient::at(&socket).unwrap();
    match client.get_digest("abc").await.unwrap_err() {
        ClientError::Rejected { kind, message, .. } => {
            assert_eq!(kind, Some(ErrorKind::NotFound));
            assert!(message.contains("abc"));
        }
        other => panic!("unexpected: {other:?}"),
    }
}

#[tokio::test]
async fn unexpected_response_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let socket = dir.path().join("daemon.sock");
    let listener = UnixListener::bind(&socket).unwrap();
    tokio::spawn(serve_once(listener, Response::Pong));

    let client = DaemonClient::at(&socket).unwrap();
    let err = client.list_artifacts().await.unwrap_err();
    assert!(matches!(err, ClientError::UnexpectedResponse(_)));
}

#[tokio::test]
async fn stale_socket_means_not_running() {
    let dir = tempfile::tempdir().unwrap();
    let socket = dir.path().join("daemon.sock");
    drop(UnixListener::bind(&socket).unwrap());

    let client = DaemonClient::at(&socket).unwrap();
    let err = client.hello().await.unwrap_err();
    assert!(err.is_not_running(), "{err:?}");
}
