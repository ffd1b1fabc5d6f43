use std::time::Duration;

use memo_core::remote::{RemoteError, RemoteTransport, RetryPolicy, WebDavClient};
use memo_core::WebDavConfig;
use pretty_assertions::assert_eq;
use wiremock::matchers::{basic_auth, body_string, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> WebDavClient {
    client_with_url(&server.uri())
}

fn client_with_url(url: &str) -> WebDavClient {
    let config = WebDavConfig::new(url, "cato", "secret").unwrap();
    WebDavClient::new(&config, Duration::from_secs(5))
        .unwrap()
        .with_retry_policy(RetryPolicy::immediate(3))
}

const LISTING: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<d:multistatus xmlns:d="DAV:">
  <d:response>
    <d:href>/memo_data/notes/</d:href>
    <d:propstat><d:prop>
      <d:resourcetype><d:collection/></d:resourcetype>
    </d:prop></d:propstat>
  </d:response>
  <d:response>
    <d:href>/memo_data/notes/2024-W01.json</d:href>
    <d:propstat><d:prop>
      <d:resourcetype/>
      <d:getcontentlength>42</d:getcontentlength>
      <d:getlastmodified>Mon, 01 Jan 2024 10:00:00 GMT</d:getlastmodified>
    </d:prop></d:propstat>
  </d:response>
  <d:response>
    <d:href>/memo_data/notes/archive/</d:href>
    <d:propstat><d:prop>
      <d:resourcetype><d:collection/></d:resourcetype>
    </d:prop></d:propstat>
  </d:response>
</d:multistatus>"#;

#[tokio::test]
async fn get_retries_server_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/memo_data/notes/2024-W01.json"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/memo_data/notes/2024-W01.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
        .expect(1)
        .mount(&server)
        .await;

    let body = client_for(&server)
        .get_text("memo_data/notes/2024-W01.json")
        .await
        .unwrap();
    assert_eq!(body, "[]");
}

#[tokio::test]
async fn server_errors_give_up_after_max_retries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(4)
        .mount(&server)
        .await;

    let error = client_for(&server).get_binary("memo_data/assets/a1").await.unwrap_err();
    assert!(matches!(error, RemoteError::Server { status: 500, .. }));
}

#[tokio::test]
async fn not_found_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let error = client_for(&server).get_binary("memo_data/assets/a1").await.unwrap_err();
    assert!(error.is_not_found());
}

#[tokio::test]
async fn unauthorized_is_an_authentication_error() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let error = client_for(&server)
        .put_text("memo_data/notes/2024-W01.json", "[]")
        .await
        .unwrap_err();
    assert!(error.is_authentication());
}

#[tokio::test]
async fn requests_carry_basic_auth_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/memo_data/notes/2024-W01.json"))
        .and(basic_auth("cato", "secret"))
        .and(header("content-type", "application/json; charset=utf-8"))
        .and(body_string("[{\"id\":\"n1\"}]"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    client_for(&server)
        .put_text("memo_data/notes/2024-W01.json", "[{\"id\":\"n1\"}]")
        .await
        .unwrap();
}

#[tokio::test]
async fn mkcol_treats_existing_collection_as_success() {
    let server = MockServer::start().await;
    Mock::given(method("MKCOL"))
        .and(path("/memo_data/"))
        .respond_with(ResponseTemplate::new(405))
        .expect(1)
        .mount(&server)
        .await;

    client_for(&server).ensure_collection("memo_data").await.unwrap();
}

#[tokio::test]
async fn mkcol_reports_conflicts() {
    let server = MockServer::start().await;
    Mock::given(method("MKCOL"))
        .respond_with(ResponseTemplate::new(409))
        .mount(&server)
        .await;

    let error = client_for(&server)
        .ensure_collection("memo_data/notes")
        .await
        .unwrap_err();
    assert_eq!(error.status(), Some(409));
}

#[tokio::test]
async fn delete_of_missing_resource_succeeds() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/memo_data/assets/a1"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    client_for(&server).delete("memo_data/assets/a1").await.unwrap();
}

#[tokio::test]
async fn delete_forbidden_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let error = client_for(&server).delete("memo_data/assets/a1").await.unwrap_err();
    assert_eq!(error.status(), Some(403));
}

#[tokio::test]
async fn list_entries_parses_multistatus_and_drops_self() {
    let server = MockServer::start().await;
    Mock::given(method("PROPFIND"))
        .and(path("/memo_data/notes/"))
        .and(header("Depth", "1"))
        .respond_with(
            ResponseTemplate::new(207).set_body_raw(LISTING, "application/xml; charset=utf-8"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let entries = client_for(&server)
        .list_entries("memo_data/notes")
        .await
        .unwrap();

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].name, "2024-W01.json");
    assert!(!entries[0].is_collection);
    assert_eq!(entries[0].size, 42);
    assert!(entries[0].last_modified.is_some());
    assert_eq!(entries[1].name, "archive");
    assert!(entries[1].is_collection);
}

#[tokio::test]
async fn list_entries_rejects_non_multistatus_body() {
    let server = MockServer::start().await;
    Mock::given(method("PROPFIND"))
        .respond_with(ResponseTemplate::new(207).set_body_string("<html>login</html>"))
        .mount(&server)
        .await;

    let error = client_for(&server)
        .list_entries("memo_data/notes")
        .await
        .unwrap_err();
    assert!(matches!(error, RemoteError::InvalidResponse { .. }));
}

#[tokio::test]
async fn exists_follows_propfind_status() {
    let server = MockServer::start().await;
    Mock::given(method("PROPFIND"))
        .and(path("/memo_data/assets/present"))
        .and(header("Depth", "0"))
        .respond_with(ResponseTemplate::new(207).set_body_string(LISTING))
        .mount(&server)
        .await;
    Mock::given(method("PROPFIND"))
        .and(path("/memo_data/assets/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert!(client.exists("memo_data/assets/present").await);
    assert!(!client.exists("memo_data/assets/missing").await);
}

#[tokio::test]
async fn exists_is_false_when_server_is_unreachable() {
    let client = client_with_url("http://127.0.0.1:9").with_retry_policy(RetryPolicy::immediate(0));
    assert!(!client.exists("memo_data").await);
}

#[tokio::test]
async fn binary_round_trips_bytes_unchanged() {
    let server = MockServer::start().await;
    let payload = vec![0_u8, 159, 146, 150, 255];
    Mock::given(method("GET"))
        .and(path("/memo_data/assets/img%201"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(payload.clone()))
        .mount(&server)
        .await;

    let bytes = client_for(&server).get_binary("memo_data/assets/img 1").await.unwrap();
    assert_eq!(bytes, payload);
}
