use std::{net::SocketAddr, sync::Arc};

use async_trait::async_trait;
use renovo::{
    auth::{IdentityProfile, IdentityProvider},
    config::Config,
    server::{create_router, create_state_with},
    ServiceError, ServiceResult,
};
use reqwest::StatusCode;
use serde_json::{json, Value};
use tempfile::TempDir;

/// Accepts tokens of the form `token-<sub>`
struct FakeIdentity;

#[async_trait]
impl IdentityProvider for FakeIdentity {
    async fn fetch_profile(&self, access_token: &str) -> ServiceResult<IdentityProfile> {
        let sub = access_token
            .strip_prefix("token-")
            .ok_or(ServiceError::Unauthorized)?;
        Ok(IdentityProfile {
            sub: sub.to_string(),
            email: format!("{sub}@example.com"),
            name: Some(sub.to_string()),
            picture: None,
        })
    }
}

struct TestServer {
    _dir: TempDir,
    addr: SocketAddr,
    client: reqwest::Client,
}

impl TestServer {
    async fn start() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::with_data_dir(dir.path().to_string_lossy());
        config.scheduler.enabled = false;

        let state = create_state_with(config, Arc::new(FakeIdentity)).await.unwrap();
        let app = create_router(state);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            _dir: dir,
            addr,
            client: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    async fn login(&self, sub: &str) -> String {
        let response = self
            .client
            .post(self.url("/api/auth/session"))
            .json(&json!({ "access_token": format!("token-{sub}") }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let body: Value = response.json().await.unwrap();
        body["token"].as_str().unwrap().to_string()
    }

    async fn get(&self, token: &str, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .unwrap()
    }

    async fn post(&self, token: &str, path: &str, body: Value) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    async fn put(&self, token: &str, path: &str, body: Value) -> reqwest::Response {
        self.client
            .put(self.url(path))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .unwrap()
    }
}

#[tokio::test]
async fn health_and_authentication() {
    let server = TestServer::start().await;

    let health = server.client.get(server.url("/healthz")).send().await.unwrap();
    assert_eq!(health.status(), StatusCode::OK);

    let anonymous = server.client.get(server.url("/api/projects")).send().await.unwrap();
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);

    let rejected = server
        .client
        .post(server.url("/api/auth/session"))
        .json(&json!({ "access_token": "garbage" }))
        .send()
        .await
        .unwrap();
    assert_eq!(rejected.status(), StatusCode::UNAUTHORIZED);

    let token = server.login("alice").await;
    let me: Value = server.get(&token, "/api/auth/session").await.json().await.unwrap();
    assert_eq!(me["email"], "alice@example.com");

    let logout = server
        .client
        .delete(server.url("/api/auth/session"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(logout.status(), StatusCode::NO_CONTENT);
    assert_eq!(
        server.get(&token, "/api/projects").await.status(),
        StatusCode::UNAUTHORIZED
    );
}

#[tokio::test]
async fn project_budget_and_report() {
    let server = TestServer::start().await;
    let token = server.login("alice").await;

    let created = server
        .post(&token, "/api/projects", json!({ "name": "Kitchen", "currency": "usd" }))
        .await;
    assert_eq!(created.status(), StatusCode::CREATED);
    let project: Value = created.json().await.unwrap();
    let id = project["id"].as_str().unwrap().to_string();
    assert_eq!(project["status"], "planning");

    let item = server
        .post(
            &token,
            &format!("/api/projects/{id}/budget/items"),
            json!({ "category": "cabinets", "description": "Base units", "estimated_cost": 1000.0, "actual_cost": 1000.0 }),
        )
        .await;
    assert_eq!(item.status(), StatusCode::CREATED);

    let task = server
        .post(
            &token,
            &format!("/api/projects/{id}/tasks"),
            json!({ "title": "Hang cabinets", "estimated_price": 200.0, "actual_price": 500.0 }),
        )
        .await;
    assert_eq!(task.status(), StatusCode::CREATED);

    let budget: Value = server
        .get(&token, &format!("/api/projects/{id}/budget"))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(budget["currency"], "USD");
    assert_eq!(budget["total_estimated"], 1200.0);
    assert_eq!(budget["total_actual"], 1500.0);
    assert_eq!(budget["variance_percent"], 25.0);
    assert_eq!(budget["alert"], "critical");

    let progress: Value = server
        .get(&token, &format!("/api/projects/{id}/progress"))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(progress["tasks_total"], 1);

    let report = server.get(&token, &format!("/api/projects/{id}/report.pdf")).await;
    assert_eq!(report.status(), StatusCode::OK);
    assert_eq!(report.headers()["content-type"], "application/pdf");
    let bytes = report.bytes().await.unwrap();
    assert!(bytes.starts_with(b"%PDF"));
}

#[tokio::test]
async fn ownership_and_lifecycle_errors() {
    let server = TestServer::start().await;
    let alice = server.login("alice").await;
    let bob = server.login("bob").await;

    let project: Value = server
        .post(&alice, "/api/projects", json!({ "name": "Bathroom" }))
        .await
        .json()
        .await
        .unwrap();
    let id = project["id"].as_str().unwrap().to_string();

    assert_eq!(
        server.get(&bob, &format!("/api/projects/{id}")).await.status(),
        StatusCode::FORBIDDEN
    );
    assert_eq!(
        server
            .get(&alice, &format!("/api/projects/{}", uuid::Uuid::new_v4()))
            .await
            .status(),
        StatusCode::NOT_FOUND
    );
    let bobs: Value = server.get(&bob, "/api/projects").await.json().await.unwrap();
    assert_eq!(bobs.as_array().unwrap().len(), 0);

    let invalid = server.post(&alice, "/api/projects", json!({ "name": "  " })).await;
    assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);

    let milestone: Value = server
        .post(
            &alice,
            &format!("/api/projects/{id}/milestones"),
            json!({ "title": "Tiling", "due_date": "2026-06-01" }),
        )
        .await
        .json()
        .await
        .unwrap();
    let milestone_id = milestone["id"].as_str().unwrap().to_string();

    let done = server
        .put(
            &alice,
            &format!("/api/milestones/{milestone_id}/status"),
            json!({ "status": "completed" }),
        )
        .await;
    assert_eq!(done.status(), StatusCode::OK);

    let reopen = server
        .put(
            &alice,
            &format!("/api/milestones/{milestone_id}/status"),
            json!({ "status": "in_progress" }),
        )
        .await;
    assert_eq!(reopen.status(), StatusCode::CONFLICT);

    let foreign_status = server
        .put(
            &bob,
            &format!("/api/milestones/{milestone_id}/status"),
            json!({ "status": "overdue" }),
        )
        .await;
    assert_eq!(foreign_status.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn templates_expand_into_tasks() {
    let server = TestServer::start().await;
    let token = server.login("carol").await;

    let templates: Value = server.get(&token, "/api/templates").await.json().await.unwrap();
    let templates = templates.as_array().unwrap();
    assert_eq!(templates.len(), 14);
    let painting = templates
        .iter()
        .find(|t| t["name"] == "Priming and painting")
        .unwrap();
    let painting_id = painting["id"].as_str().unwrap();

    // defaults cannot be edited
    let edit = server
        .put(&token, &format!("/api/templates/{painting_id}"), json!({ "name": "Mine" }))
        .await;
    assert_eq!(edit.status(), StatusCode::FORBIDDEN);

    let project: Value = server
        .post(&token, "/api/projects", json!({ "name": "Lounge" }))
        .await
        .json()
        .await
        .unwrap();
    let id = project["id"].as_str().unwrap().to_string();

    let created = server
        .post(
            &token,
            &format!("/api/projects/{id}/tasks/from-templates"),
            json!({ "template_ids": [painting_id], "start_date": "2026-05-04" }),
        )
        .await;
    assert_eq!(created.status(), StatusCode::CREATED);
    let tasks: Value = created.json().await.unwrap();
    assert_eq!(tasks[0]["title"], "Priming and painting");
    assert_eq!(tasks[0]["due_date"], "2026-05-07");

    let unknown = server
        .post(
            &token,
            &format!("/api/projects/{id}/tasks/from-templates"),
            json!({ "template_ids": [uuid::Uuid::new_v4()] }),
        )
        .await;
    assert_eq!(unknown.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn document_upload_keeps_display_name_and_file_type() {
    let server = TestServer::start().await;
    let token = server.login("dana").await;

    let project: Value = server
        .post(&token, "/api/projects", json!({ "name": "Porch" }))
        .await
        .json()
        .await
        .unwrap();
    let id = project["id"].as_str().unwrap().to_string();

    let form = reqwest::multipart::Form::new()
        .text("name", "Signed contract")
        .text("kind", "contract")
        .part(
            "file",
            reqwest::multipart::Part::bytes(b"%PDF-1.4 contract".to_vec()).file_name("contract.pdf"),
        );
    let uploaded = server
        .client
        .post(server.url(&format!("/api/projects/{id}/documents")))
        .bearer_auth(&token)
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(uploaded.status(), StatusCode::CREATED);
    let document: Value = uploaded.json().await.unwrap();
    assert_eq!(document["name"], "Signed contract");
    assert_eq!(document["kind"], "contract");
    assert_eq!(document["mime_type"], "application/pdf");

    let content = server
        .get(&token, &format!("/api/documents/{}/content", document["id"].as_str().unwrap()))
        .await;
    assert_eq!(content.headers()["content-type"], "application/pdf");
    assert_eq!(&content.bytes().await.unwrap()[..], b"%PDF-1.4 contract");
}
