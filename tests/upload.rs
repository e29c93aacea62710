//! Assign, upload and submit

mod common;

use common::{client, client_with, FakeTransport, Method, Reply, MASTER};
use serde_json::json;
use std::io::Cursor;
use swfs_client::common::AssignRequest;
use swfs_client::{ClientConfig, Error, UploadDescriptor};

const VOLUME: &str = "10.0.0.1:8080/3,01637037d6";
const ASSIGN: &str = "master:9333/dir/assign";
const SUBMIT: &str = "master:9333/submit";

fn on_assign(fake: &FakeTransport) {
    fake.on(
        Method::Get,
        ASSIGN,
        Reply::Json(json!({
            "fid": "3,01637037d6",
            "url": "10.0.0.1:8080",
            "publicUrl": "files.example.com:8080",
            "count": 1
        })),
    );
}

fn descriptor(size: usize) -> UploadDescriptor {
    UploadDescriptor::from_reader(Cursor::new(vec![b'x'; size]), "report.pdf", size as u64)
}

#[tokio::test]
async fn test_upload_sets_identity_on_success() {
    let fake = FakeTransport::new();
    on_assign(&fake);
    fake.on(
        Method::Upload,
        VOLUME,
        Reply::Json(json!({ "name": "report.pdf", "size": 100, "eTag": "1f2e3d4c" })),
    );
    let client = client(&fake);

    let mut file = descriptor(100).with_collection("docs").with_ttl("3d");
    file.mod_time = Some(1_700_000_000);
    let assign = client.upload(&mut file).await.unwrap();

    assert_eq!(assign.file_id, "3,01637037d6");
    assert_eq!(file.file_id.as_deref(), Some("3,01637037d6"));
    assert_eq!(file.etag.as_deref(), Some("1f2e3d4c"));
    assert_eq!(file.server.as_deref(), Some("10.0.0.1:8080"));
    assert!(file.is_consumed());

    let assign_call = &fake.calls_to(Method::Get, ASSIGN)[0];
    assert_eq!(assign_call.query("collection").as_deref(), Some("docs"));
    assert_eq!(assign_call.query("ttl").as_deref(), Some("3d"));

    let upload_call = &fake.calls_to(Method::Upload, VOLUME)[0];
    assert_eq!(upload_call.query("collection").as_deref(), Some("docs"));
    assert_eq!(upload_call.query("ttl").as_deref(), Some("3d"));
    assert_eq!(upload_call.query("ts").as_deref(), Some("1700000000"));

    let part = upload_call.upload.as_ref().unwrap();
    assert_eq!(part.file_name, "report.pdf");
    assert_eq!(part.mime_type, "application/pdf");
    assert_eq!(part.data.len(), 100);
}

#[tokio::test]
async fn test_upload_size_mismatch() {
    let fake = FakeTransport::new();
    on_assign(&fake);
    fake.on(
        Method::Upload,
        VOLUME,
        Reply::Json(json!({ "size": 90, "eTag": "deadbeef" })),
    );
    let client = client(&fake);

    let mut file = descriptor(100);
    let err = client.upload(&mut file).await.unwrap_err();

    assert!(matches!(err, Error::SizeMismatch { expected: 100, actual: 90 }));
    assert_eq!(file.etag, None);
    assert_eq!(file.file_id, None);
    assert_eq!(file.server, None);
}

#[tokio::test]
async fn test_upload_is_capped_at_max_file_size() {
    let fake = FakeTransport::new();
    on_assign(&fake);
    fake.on(Method::Upload, VOLUME, Reply::Json(json!({ "size": 64 })));
    let mut config = ClientConfig::new(MASTER);
    config.max_file_size = 64;
    let client = client_with(&fake, config);

    let mut file = descriptor(100);
    let err = client.upload(&mut file).await.unwrap_err();

    assert!(matches!(err, Error::SizeMismatch { expected: 100, actual: 64 }));
    let part = fake.calls_to(Method::Upload, VOLUME)[0].upload.clone().unwrap();
    assert_eq!(part.data.len(), 64);
}

#[tokio::test]
async fn test_upload_volume_error() {
    let fake = FakeTransport::new();
    on_assign(&fake);
    fake.on(
        Method::Upload,
        VOLUME,
        Reply::Json(json!({ "error": "volume 3 is read only" })),
    );
    let client = client(&fake);

    let mut file = descriptor(10);
    match client.upload(&mut file).await {
        Err(Error::UploadFailed(message)) => assert_eq!(message, "volume 3 is read only"),
        other => panic!("unexpected: {:?}", other),
    }
    assert!(file.file_id.is_none());
}

#[tokio::test]
async fn test_assign_count_zero_fails_before_upload() {
    let fake = FakeTransport::new();
    fake.on(
        Method::Get,
        ASSIGN,
        Reply::Json(json!({ "fid": "", "url": "", "count": 0 })),
    );
    let client = client(&fake);

    let mut file = descriptor(10);
    let err = client.upload(&mut file).await.unwrap_err();
    assert!(matches!(err, Error::AssignFailed(_)));
    assert!(fake.calls_to(Method::Upload, VOLUME).is_empty());
    // The content was never sent
    assert!(!file.is_consumed());
}

#[tokio::test]
async fn test_assign_error_message() {
    let fake = FakeTransport::new();
    fake.on(
        Method::Get,
        ASSIGN,
        Reply::Json(json!({ "error": "No free volumes left!" })),
    );
    let client = client(&fake);

    match client.assign(&AssignRequest::default()).await {
        Err(Error::AssignFailed(message)) => assert_eq!(message, "No free volumes left!"),
        other => panic!("unexpected: {:?}", other),
    }
}

#[tokio::test]
async fn test_assign_bad_json_keeps_body() {
    let fake = FakeTransport::new();
    fake.on(Method::Get, ASSIGN, Reply::Raw("not json at all"));
    let client = client(&fake);

    match client.assign(&AssignRequest::default()).await {
        Err(Error::Decode { body, .. }) => assert_eq!(body, "not json at all"),
        other => panic!("unexpected: {:?}", other),
    }
}

#[tokio::test]
async fn test_assign_request_params() {
    let fake = FakeTransport::new();
    on_assign(&fake);
    let client = client(&fake);

    client
        .assign(&AssignRequest {
            count: 5,
            replication: Some("001".into()),
            data_center: Some("dc1".into()),
            ..Default::default()
        })
        .await
        .unwrap();

    let call = &fake.calls_to(Method::Get, ASSIGN)[0];
    assert_eq!(call.query("count").as_deref(), Some("5"));
    assert_eq!(call.query("replication").as_deref(), Some("001"));
    assert_eq!(call.query("dataCenter").as_deref(), Some("dc1"));
    assert_eq!(call.query("collection"), None);
}

#[tokio::test]
async fn test_descriptor_uploads_once() {
    let fake = FakeTransport::new();
    on_assign(&fake);
    fake.on(Method::Upload, VOLUME, Reply::Json(json!({ "size": 10, "eTag": "aa" })));
    let client = client(&fake);

    let mut file = descriptor(10);
    client.upload(&mut file).await.unwrap();

    let err = client.upload(&mut file).await.unwrap_err();
    assert!(matches!(err, Error::ContentUnavailable));
    assert_eq!(fake.calls_to(Method::Get, ASSIGN).len(), 1);
}

#[tokio::test]
async fn test_upload_file_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.txt");
    std::fs::write(&path, b"0123456789").unwrap();

    let fake = FakeTransport::new();
    on_assign(&fake);
    fake.on(Method::Upload, VOLUME, Reply::Json(json!({ "size": 10, "eTag": "bb" })));
    let client = client(&fake);

    let (assign, file) = client
        .upload_file(&path, Some("notes"), None)
        .await
        .unwrap();
    assert_eq!(assign.url, "10.0.0.1:8080");
    assert_eq!(file.file_name, "notes.txt");
    assert_eq!(file.etag.as_deref(), Some("bb"));

    let call = &fake.calls_to(Method::Upload, VOLUME)[0];
    assert!(call.query("ts").is_some());
    let part = call.upload.as_ref().unwrap();
    assert_eq!(part.mime_type, "text/plain");
    assert_eq!(part.data, b"0123456789");
}

#[tokio::test]
async fn test_submit() {
    let fake = FakeTransport::new();
    fake.on(
        Method::Upload,
        SUBMIT,
        Reply::Json(json!({
            "fileName": "report.pdf",
            "fid": "4,0a1b2c3d",
            "fileUrl": "10.0.0.1:8080/4,0a1b2c3d",
            "size": 100
        })),
    );
    let client = client(&fake);

    let mut file = descriptor(100).with_collection("docs");
    let result = client.submit(&mut file).await.unwrap();

    assert_eq!(result.file_id, "4,0a1b2c3d");
    assert_eq!(result.file_url, "10.0.0.1:8080/4,0a1b2c3d");
    assert_eq!(file.file_id.as_deref(), Some("4,0a1b2c3d"));

    let call = &fake.calls_to(Method::Upload, SUBMIT)[0];
    assert_eq!(call.query("collection").as_deref(), Some("docs"));
    assert_eq!(call.upload.as_ref().unwrap().data.len(), 100);
}

#[tokio::test]
async fn test_submit_size_mismatch_and_error() {
    let fake = FakeTransport::new();
    fake.on(
        Method::Upload,
        SUBMIT,
        Reply::Json(json!({ "fid": "4,0a", "size": 99 })),
    )
    .on(
        Method::Upload,
        SUBMIT,
        Reply::Json(json!({ "error": "no writable volumes" })),
    );
    let client = client(&fake);

    let mut file = descriptor(100);
    let err = client.submit(&mut file).await.unwrap_err();
    assert!(matches!(err, Error::SizeMismatch { expected: 100, actual: 99 }));
    assert!(file.file_id.is_none());

    let mut file = descriptor(100);
    let err = client.submit(&mut file).await.unwrap_err();
    assert!(matches!(err, Error::UploadFailed(ref m) if m == "no writable volumes"));
}

#[tokio::test]
async fn test_upload_refused_with_error_status() {
    let fake = FakeTransport::new();
    on_assign(&fake);
    fake.on(
        Method::Upload,
        VOLUME,
        Reply::StatusJson(500, json!({ "error": "volume 3 is read only" })),
    );
    let client = client(&fake);

    let mut file = descriptor(10);
    match client.upload(&mut file).await {
        Err(Error::UploadFailed(message)) => assert_eq!(message, "volume 3 is read only"),
        other => panic!("unexpected: {:?}", other),
    }
}

#[tokio::test]
async fn test_assign_refused_with_error_status() {
    let fake = FakeTransport::new();
    fake.on(
        Method::Get,
        ASSIGN,
        Reply::StatusJson(406, json!({ "error": "No free volumes left!" })),
    );
    let client = client(&fake);

    match client.assign(&AssignRequest::default()).await {
        Err(Error::AssignFailed(message)) => assert_eq!(message, "No free volumes left!"),
        other => panic!("unexpected: {:?}", other),
    }
}
