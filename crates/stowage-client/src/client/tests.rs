//! Unit tests for the store client facade

use super::*;

use stowage_core::{hash, Credentials};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_auth(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/v1/authorize"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "accountId": "acct-1",
            "authorizationToken": "token-abc",
            "apiUrl": server.uri(),
            "downloadUrl": server.uri(),
        })))
        .mount(server)
        .await;
}

async fn mount_upload_url(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/v1/get_upload_url"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "bucketId": "bucket-1",
            "uploadUrl": format!("{}/upload", server.uri()),
            "authorizationToken": "upload-token",
        })))
        .mount(server)
        .await;
}

fn client(server: &MockServer) -> StoreClient {
    let config = ClientConfig::new(
        Credentials::new("key-id", "secret"),
        "bucket-1",
        "my-bucket",
    )
    .with_auth_base_url(server.uri());
    StoreClient::new(config).unwrap()
}

#[test]
fn test_invalid_auth_url_is_rejected() {
    let config = ClientConfig::new(Credentials::new("id", "key"), "b", "n")
        .with_auth_base_url("not a url");
    match StoreClient::new(config).unwrap_err() {
        StowageError::Config { message } => assert!(message.contains("auth base URL")),
        other => panic!("expected Config error, got {:?}", other),
    }
}

#[test]
fn test_empty_bucket_is_rejected() {
    let config = ClientConfig::new(Credentials::new("id", "key"), "", "n");
    assert!(matches!(
        StoreClient::new(config).unwrap_err(),
        StowageError::Config { .. }
    ));
}

#[tokio::test]
async fn test_upload_archive_marks_custom_info() {
    let server = MockServer::start().await;
    mount_auth(&server).await;
    mount_upload_url(&server).await;

    Mock::given(method("POST"))
        .and(path("/upload"))
        .and(header("x-info-archive", "true"))
        .and(header("x-info-archive_file_count", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "fileId": "id-1",
            "fileName": "bundle.stow",
            "contentType": "application/octet-stream",
            "contentLength": 99,
            "contentSha1": hash::digest(b""),
            "fileInfo": { "archive": "true", "archive_file_count": "2" },
        })))
        .expect(1)
        .mount(&server)
        .await;

    let entries = vec![
        Entry::new("a.txt", b"alpha".to_vec()),
        Entry::new("b.txt", b"beta".to_vec()),
    ];
    let record = client(&server)
        .upload_archive("bundle.stow", &entries, UploadOptions::default())
        .await
        .unwrap();
    assert!(record.is_archive());
}

#[tokio::test]
async fn test_download_archive_unbundles_payloads() {
    let server = MockServer::start().await;
    mount_auth(&server).await;

    let entries = vec![
        Entry::new("a.txt", b"alpha".to_vec()),
        Entry::new("nested/b.bin", vec![0u8, 1, 2]),
    ];
    let blob = stowage_archive::encode(&entries).unwrap();

    Mock::given(method("GET"))
        .and(path("/file/my-bucket/bundle.stow"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(blob))
        .mount(&server)
        .await;

    let decoded = client(&server)
        .download_archive("bundle.stow", &DownloadOptions::default())
        .await
        .unwrap();
    assert_eq!(decoded, entries);
}

#[tokio::test]
async fn test_download_archive_rejects_garbage() {
    let server = MockServer::start().await;
    mount_auth(&server).await;

    Mock::given(method("GET"))
        .and(path("/file/my-bucket/junk.stow"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![9u8; 16]))
        .mount(&server)
        .await;

    let err = client(&server)
        .download_archive("junk.stow", &DownloadOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, StowageError::ArchiveFormat { .. }));
}

#[tokio::test]
async fn test_list_file_names_single_page() {
    let server = MockServer::start().await;
    mount_auth(&server).await;

    Mock::given(method("POST"))
        .and(path("/api/v1/list_file_names"))
        .and(body_partial_json(serde_json::json!({
            "bucketId": "bucket-1",
            "startFileName": "m",
            "maxFileCount": 100,
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "files": [{
                "fileId": "id-1",
                "fileName": "mango.txt",
                "contentType": "text/plain",
                "contentLength": 5,
                "contentSha1": hash::digest(b"mango"),
            }],
            "nextFileName": "n",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let page = client(&server)
        .list_file_names(Some("m"), Some(100))
        .await
        .unwrap();
    assert_eq!(page.files.len(), 1);
    assert_eq!(page.files[0].file_name, "mango.txt");
    assert_eq!(page.next_file_name.as_deref(), Some("n"));
}

#[tokio::test]
async fn test_list_file_names_last_page_has_no_cursor() {
    let server = MockServer::start().await;
    mount_auth(&server).await;

    Mock::given(method("POST"))
        .and(path("/api/v1/list_file_names"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "files": [],
        })))
        .mount(&server)
        .await;

    let page = client(&server).list_file_names(None, None).await.unwrap();
    assert!(page.files.is_empty());
    assert_eq!(page.next_file_name, None);
}

#[tokio::test]
async fn test_delete_file_version() {
    let server = MockServer::start().await;
    mount_auth(&server).await;

    Mock::given(method("POST"))
        .and(path("/api/v1/delete_file_version"))
        .and(body_partial_json(serde_json::json!({
            "fileName": "old.txt",
            "fileId": "id-9",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "fileName": "old.txt",
            "fileId": "id-9",
        })))
        .expect(1)
        .mount(&server)
        .await;

    client(&server)
        .delete_file_version("old.txt", "id-9")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_delete_missing_version_reports_not_found() {
    let server = MockServer::start().await;
    mount_auth(&server).await;

    Mock::given(method("POST"))
        .and(path("/api/v1/delete_file_version"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = client(&server)
        .delete_file_version("ghost.txt", "id-0")
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_one_client_one_auth_across_mixed_operations() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/authorize"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "accountId": "acct-1",
            "authorizationToken": "token-abc",
            "apiUrl": server.uri(),
            "downloadUrl": server.uri(),
        })))
        .expect(1)
        .mount(&server)
        .await;
    mount_upload_url(&server).await;

    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "fileId": "id-1",
            "fileName": "a.txt",
            "contentType": "application/octet-stream",
            "contentLength": 1,
            "contentSha1": hash::digest(b"x"),
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/file/my-bucket/a.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"x".to_vec()))
        .mount(&server)
        .await;

    let client = client(&server);
    client
        .upload("a.txt", b"x".to_vec(), UploadOptions::default())
        .await
        .unwrap();
    client
        .download_by_name("a.txt", &DownloadOptions::default())
        .await
        .unwrap();
}
