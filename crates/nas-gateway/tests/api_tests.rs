//! End-to-end tests against a gateway bound to a local port

use nas_accounts::MemoryCredentialStore;
use nas_gateway::{config::SeedUser, server, AppState, GatewayConfig};
use nas_token::SignatureEngine;
use nas_vfs::{Disk, Filesystem, MemoryFilesystem, ROOT_DIRECTORY_ID};
use reqwest::{multipart, Client, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::net::TcpListener;

const PRIVATE_PEM: &[u8] = include_bytes!("fixtures/private.pem");
const PUBLIC_PEM: &[u8] = include_bytes!("fixtures/public.pem");

struct Gateway {
    base: String,
    client: Client,
    fs: Arc<MemoryFilesystem>,
}

impl Gateway {
    async fn start() -> Self {
        let fs = Arc::new(MemoryFilesystem::new(vec![Disk::new(0, "/sd", 8 * 1024 * 1024)]).unwrap());
        let config = GatewayConfig {
            seed_user: Some(SeedUser {
                username: "admin".to_string(),
                password: "secret".to_string(),
            }),
            ..Default::default()
        };
        let state = AppState::with_collaborators(
            config,
            Arc::clone(&fs) as Arc<dyn Filesystem>,
            Arc::new(MemoryCredentialStore::new()),
            Arc::new(SignatureEngine::from_pem(PRIVATE_PEM, PUBLIC_PEM).unwrap()),
        )
        .unwrap();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            server::serve(listener, Arc::new(state), std::future::pending()).await.unwrap();
        });

        Self {
            base: format!("http://{addr}"),
            client: Client::new(),
            fs,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    async fn login(&self, username: &str, password: &str) -> String {
        let response = self
            .client
            .post(self.url("/api/login"))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        response.text().await.unwrap()
    }

    async fn upload(&self, token: &str, parent: i64, name: &str, data: Vec<u8>, size: Option<usize>) -> reqwest::Response {
        let mut url = self.url(&format!("/api/files/{parent}"));
        if let Some(size) = size {
            url.push_str(&format!("?size={size}"));
        }
        let form = multipart::Form::new().part("file", multipart::Part::bytes(data).file_name(name.to_string()));
        self.client
            .put(url)
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await
            .unwrap()
    }

    async fn list(&self, token: &str, id: i64) -> Vec<Value> {
        let response = self
            .client
            .get(self.url(&format!("/api/files/{id}")))
            .bearer_auth(token)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = response.json().await.unwrap();
        body["data"].as_array().unwrap().clone()
    }
}

async fn error_of(response: reqwest::Response) -> (StatusCode, Value) {
    let status = response.status();
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"]["code"], status.as_u16());
    (status, body["error"].clone())
}

#[tokio::test]
async fn test_user_lifecycle() {
    let gw = Gateway::start().await;

    let response = gw
        .client
        .post(gw.url("/api/users"))
        .json(&json!({ "username": "bob", "password": "hunter2" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let token = gw.login("bob", "hunter2").await;
    assert_eq!(token.split('.').count(), 3);
    assert_eq!(token, gw.login("bob", "hunter2").await);

    let response = gw.client.get(gw.url("/api/users/2")).bearer_auth(&token).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "data": { "id": 2, "username": "bob" } }));

    let response = gw.client.get(gw.url("/api/users/1")).bearer_auth(&token).send().await.unwrap();
    let (status, error) = error_of(response).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(error["domain"], "Authorization");

    let response = gw
        .client
        .patch(gw.url("/api/users/2"))
        .bearer_auth(&token)
        .json(&json!({ "password": "changed" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    gw.login("bob", "changed").await;

    let response = gw.client.delete(gw.url("/api/users/2")).bearer_auth(&token).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = gw.client.get(gw.url("/api/users/2")).bearer_auth(&token).send().await.unwrap();
    let (status, error) = error_of(response).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error["domain"], "Server");
    assert_eq!(error["location"], 2);
    assert_eq!(error["locationType"], "User ID");
}

#[tokio::test]
async fn test_login_failures() {
    let gw = Gateway::start().await;

    let response = gw
        .client
        .post(gw.url("/api/login"))
        .json(&json!({ "username": "admin", "password": "wrong" }))
        .send()
        .await
        .unwrap();
    let (status, error) = error_of(response).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error["domain"], "Credentials");

    let response = gw
        .client
        .post(gw.url("/api/login"))
        .json(&json!({ "username": "admin" }))
        .send()
        .await
        .unwrap();
    let (status, error) = error_of(response).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["domain"], "Validation");
    assert_eq!(error["message"], "Missing password field in request body");

    let response = gw.client.post(gw.url("/api/login")).body("{not json").send().await.unwrap();
    let (status, error) = error_of(response).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["domain"], "JSON");

    let response = gw.client.post(gw.url("/api/login")).send().await.unwrap();
    let (_, error) = error_of(response).await;
    assert_eq!(error["message"], "Missing request body");

    let response = gw
        .client
        .post(gw.url("/api/login"))
        .body(vec![b' '; 64 * 1024])
        .send()
        .await
        .unwrap();
    let (status, error) = error_of(response).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(error["domain"], "Validation");
}

#[tokio::test]
async fn test_file_lifecycle() {
    let gw = Gateway::start().await;
    let token = gw.login("admin", "secret").await;

    let response = gw
        .client
        .post(gw.url("/api/files/0"))
        .bearer_auth(&token)
        .json(&json!({ "name": "photos" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let root = gw.list(&token, ROOT_DIRECTORY_ID).await;
    assert_eq!(root.len(), 1);
    assert_eq!(root[0]["name"], "photos");
    assert_eq!(root[0]["isDirectory"], true);
    assert_eq!(root[0]["ownerID"], 1);
    assert!(root[0].get("size").is_none());
    let dir = root[0]["id"].as_i64().unwrap();

    let data: Vec<u8> = (0..300_000u32).map(|i| (i % 251) as u8).collect();
    let response = gw.upload(&token, dir, "big.bin", data.clone(), Some(data.len())).await;
    assert_eq!(response.status(), StatusCode::OK);

    let listing = gw.list(&token, dir).await;
    assert_eq!(listing[0]["name"], "big.bin");
    assert_eq!(listing[0]["size"], data.len());
    assert!(listing[0]["lastModified"].is_i64());
    let file = listing[0]["id"].as_i64().unwrap();

    let response = gw.client.get(gw.url(&format!("/api/files/{file}"))).bearer_auth(&token).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.bytes().await.unwrap().to_vec(), data);

    let response = gw
        .client
        .patch(gw.url(&format!("/api/files/{file}")))
        .bearer_auth(&token)
        .json(&json!({ "newName": "renamed.bin" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(gw.list(&token, dir).await[0]["name"], "renamed.bin");

    let response = gw.client.delete(gw.url(&format!("/api/files/{dir}"))).bearer_auth(&token).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(gw.list(&token, ROOT_DIRECTORY_ID).await.is_empty());
}

#[tokio::test]
async fn test_upload_without_size_is_rejected() {
    let gw = Gateway::start().await;
    let token = gw.login("admin", "secret").await;
    let before = gw.fs.entry_count();

    let response = gw.upload(&token, 0, "a.txt", b"hello".to_vec(), None).await;
    let (status, error) = error_of(response).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["domain"], "Validation");
    assert_eq!(gw.fs.entry_count(), before);
}

#[tokio::test]
async fn test_upload_size_mismatch_leaves_nothing() {
    let gw = Gateway::start().await;
    let token = gw.login("admin", "secret").await;

    let response = gw.upload(&token, 0, "a.txt", b"hello".to_vec(), Some(10)).await;
    let (status, error) = error_of(response).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(error["domain"], "File");
    assert!(gw.list(&token, ROOT_DIRECTORY_ID).await.is_empty());
}

#[tokio::test]
async fn test_bearer_token_required() {
    let gw = Gateway::start().await;

    let response = gw.client.get(gw.url("/api/files/0")).send().await.unwrap();
    let (status, error) = error_of(response).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error["domain"], "Unauthorized");

    let response = gw
        .client
        .get(gw.url("/api/files/0"))
        .header("Authorization", "Token abc")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_tampered_token_is_rejected() {
    let gw = Gateway::start().await;
    let token = gw.login("admin", "secret").await;

    let mut segments: Vec<String> = token.split('.').map(str::to_string).collect();
    segments[1] = nas_token::base64url::encode(br#"{"id":2,"username":"admin"}"#);
    let forged = segments.join(".");

    let response = gw.client.get(gw.url("/api/users/2")).bearer_auth(&forged).send().await.unwrap();
    let (status, error) = error_of(response).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error["domain"], "Unauthorized");
}

#[tokio::test]
async fn test_unknown_route() {
    let gw = Gateway::start().await;

    let response = gw.client.get(gw.url("/api/nothing")).send().await.unwrap();
    assert!(response.headers().contains_key("x-request-id"));
    let (status, error) = error_of(response).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error["domain"], "Server");
    assert_eq!(error["message"], "Resource Not Found");
    assert_eq!(error["location"], "/api/nothing");
    assert_eq!(error["locationType"], "Request URI");

    let response = gw.client.put(gw.url("/api/login")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_offline_disk_names_mount_point() {
    let gw = Gateway::start().await;
    let token = gw.login("admin", "secret").await;

    let response = gw.upload(&token, 0, "a.txt", b"data".to_vec(), Some(4)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let file = gw.list(&token, ROOT_DIRECTORY_ID).await[0]["id"].as_i64().unwrap();

    gw.fs.set_disk_online(0, false).unwrap();

    let response = gw.client.get(gw.url(&format!("/api/files/{file}"))).bearer_auth(&token).send().await.unwrap();
    let (status, error) = error_of(response).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(error["domain"], "Disk");
    assert_eq!(error["location"], "/sd");
    assert_eq!(error["locationType"], "Disk Mount Point");
}

#[tokio::test]
async fn test_extra_file_parts_are_ignored() {
    let gw = Gateway::start().await;
    let token = gw.login("admin", "secret").await;

    let form = multipart::Form::new()
        .part("file", multipart::Part::bytes(b"abc".to_vec()).file_name("a.txt"))
        .part("file", multipart::Part::bytes(b"def".to_vec()).file_name("b.txt"));
    let response = gw
        .client
        .put(gw.url("/api/files/0?size=3"))
        .bearer_auth(&token)
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let root = gw.list(&token, ROOT_DIRECTORY_ID).await;
    assert_eq!(root.len(), 1);
    assert_eq!(root[0]["name"], "a.txt");
    assert_eq!(root[0]["size"], 3);
}
