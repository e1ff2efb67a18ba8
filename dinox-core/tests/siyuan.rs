use dinox_core::{SiyuanClient, SiyuanError};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn ids_by_hpath_sends_token_and_notebook() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/filetree/getIDsByHPath"))
        .and(header("authorization", "Token kernel-token"))
        .and(body_json(json!({
            "notebook": "nb-1",
            "path": "/2024-01-01/X"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 0,
            "msg": "",
            "data": ["20240101090000-aaaaaaa"]
        })))
        .mount(&server)
        .await;

    let client =
        SiyuanClient::with_base_url(&server.uri(), Some("kernel-token".to_string())).unwrap();
    let ids = client.ids_by_hpath("nb-1", "/2024-01-01/X").await.unwrap();
    assert_eq!(ids, vec!["20240101090000-aaaaaaa".to_string()]);
}

#[tokio::test]
async fn ids_by_hpath_reads_null_as_no_match() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/filetree/getIDsByHPath"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 0,
            "msg": "",
            "data": null
        })))
        .mount(&server)
        .await;

    let client = SiyuanClient::with_base_url(&server.uri(), None).unwrap();
    assert!(client.ids_by_hpath("nb-1", "/missing").await.unwrap().is_empty());
}

#[tokio::test]
async fn path_by_id_accepts_plain_and_located_payloads() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/filetree/getPathByID"))
        .and(body_json(json!({ "id": "plain" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 0,
            "msg": "",
            "data": "/20240101/plain.sy"
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/filetree/getPathByID"))
        .and(body_json(json!({ "id": "located" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 0,
            "msg": "",
            "data": { "notebook": "nb-1", "path": "/20240101/located.sy" }
        })))
        .mount(&server)
        .await;

    let client = SiyuanClient::with_base_url(&server.uri(), None).unwrap();
    assert_eq!(
        client.path_by_id("plain").await.unwrap(),
        "/20240101/plain.sy"
    );
    assert_eq!(
        client.path_by_id("located").await.unwrap(),
        "/20240101/located.sy"
    );
}

#[tokio::test]
async fn create_doc_with_md_returns_new_id() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/filetree/createDocWithMd"))
        .and(body_json(json!({
            "notebook": "nb-1",
            "path": "/2024-01-01/X",
            "markdown": "hi"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 0,
            "msg": "",
            "data": "20240101090000-bbbbbbb"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = SiyuanClient::with_base_url(&server.uri(), None).unwrap();
    let id = client
        .create_doc_with_md("nb-1", "/2024-01-01/X", "hi")
        .await
        .unwrap();
    assert_eq!(id, "20240101090000-bbbbbbb");
}

#[tokio::test]
async fn remove_doc_maps_kernel_error_code() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/filetree/removeDoc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": -1,
            "msg": "notebook not found",
            "data": null
        })))
        .mount(&server)
        .await;

    let client = SiyuanClient::with_base_url(&server.uri(), None).unwrap();
    let err = client
        .remove_doc("nb-x", "/20240101/located.sy")
        .await
        .unwrap_err();
    match err {
        SiyuanError::Kernel { code, msg, .. } => {
            assert_eq!(code, -1);
            assert_eq!(msg, "notebook not found");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}
