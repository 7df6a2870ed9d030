//! HTTP-level tests for the lab router.
//!
//! The router is driven in-process with `oneshot`; the catalog and the model
//! are replaced by in-memory fakes that count their calls.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use http_body_util::BodyExt;
use hyper::{Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use lab_router::catalog::{self, CatalogError, InviteIssuer, LabDirectory};
use lab_router::llm::{self, LlmClient, LlmError, ToolCallResult, ToolDefinition};
use lab_router::middleware::auth::ApiKey;
use lab_router::resolver::{IntentMap, PromptResolver};
use lab_router::router::{build_router, Services};
use lab_router::Lab;

const API_KEY: &str = "test-router-key";

// ── Fakes ──────────────────────────────────────────────────────

#[derive(Default)]
struct FakeCatalog {
    labs: Vec<Lab>,
    fail_listing: bool,
    reject_invites: bool,
    list_calls: AtomicUsize,
    invite_calls: AtomicUsize,
}

#[async_trait]
impl LabDirectory for FakeCatalog {
    async fn list_labs(&self) -> catalog::Result<Vec<Lab>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_listing {
            return Err(CatalogError::Status {
                status: 503,
                body: "maintenance".into(),
            });
        }
        Ok(self.labs.clone())
    }
}

#[async_trait]
impl InviteIssuer for FakeCatalog {
    async fn create_invite(&self, slug: &str) -> catalog::Result<String> {
        self.invite_calls.fetch_add(1, Ordering::SeqCst);
        if self.reject_invites {
            return Err(CatalogError::GraphQl(vec![format!(
                "track {slug} is not published"
            )]));
        }
        Ok(format!("https://play.instruqt.com/infoblox/invite/{slug}-inv"))
    }
}

struct FakeModel {
    slug: Option<&'static str>,
    calls: AtomicUsize,
}

#[async_trait]
impl LlmClient for FakeModel {
    async fn chat_with_tool(
        &self,
        _system_prompt: &str,
        _user_prompt: &str,
        tool: &ToolDefinition,
    ) -> llm::Result<ToolCallResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.slug {
            Some(slug) => Ok(ToolCallResult {
                tool_name: tool.name.clone(),
                arguments: json!({ "slug": slug }),
            }),
            None => Err(LlmError::RateLimited("insufficient_quota".into())),
        }
    }

    fn model_name(&self) -> &str {
        "fake"
    }
}

// ── Test app builder ───────────────────────────────────────────

fn sample_labs() -> Vec<Lab> {
    vec![
        Lab {
            id: "track_1".into(),
            slug: "infoblox-threat-defense".into(),
            title: Some("Infoblox Threat Defense".into()),
            description: Some("Hands-on lab".into()),
        },
        Lab {
            id: "track_2".into(),
            slug: "chosen-slug".into(),
            title: Some("Network Automation".into()),
            description: None,
        },
    ]
}

struct TestApp {
    router: axum::Router,
    catalog: Arc<FakeCatalog>,
    model: Arc<FakeModel>,
}

fn build_test_app(catalog: FakeCatalog, model_slug: Option<&'static str>) -> TestApp {
    let catalog = Arc::new(catalog);
    let model = Arc::new(FakeModel {
        slug: model_slug,
        calls: AtomicUsize::new(0),
    });
    let resolver =
        PromptResolver::new(IntentMap::builtin(), catalog.clone()).with_model(model.clone());
    let services = Services {
        directory: catalog.clone(),
        issuer: catalog.clone(),
        resolver: Arc::new(resolver),
    };
    TestApp {
        router: build_router(services, ApiKey::new(API_KEY)),
        catalog,
        model,
    }
}

fn default_app() -> TestApp {
    build_test_app(
        FakeCatalog {
            labs: sample_labs(),
            ..Default::default()
        },
        Some("chosen-slug"),
    )
}

fn request(method: &str, uri: &str, auth: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(auth) = auth {
        builder = builder.header("authorization", auth);
    }
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

fn bearer() -> Option<&'static str> {
    Some("Bearer test-router-key")
}

async fn send(router: axum::Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = router.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

// ── Health ─────────────────────────────────────────────────────

#[tokio::test]
async fn health_needs_no_auth() {
    let app = default_app();
    let (status, body) = send(app.router, request("GET", "/health", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok" }));
}

// ── Auth ───────────────────────────────────────────────────────

#[tokio::test]
async fn missing_or_wrong_key_is_rejected_before_collaborators() {
    let cases = [
        ("GET", "/tracks", None, None),
        ("GET", "/tracks", Some("Bearer nope"), None),
        ("POST", "/invite?slug=x", Some("test-router-key"), None),
        (
            "POST",
            "/resolve",
            Some("bearer test-router-key"),
            Some(json!({ "prompt": "dns" })),
        ),
        ("POST", "/resolve", None, Some(json!({ "prompt": "dns" }))),
    ];

    for (method, uri, auth, body) in cases {
        let app = default_app();
        let (status, json) = send(app.router, request(method, uri, auth, body)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{method} {uri} {auth:?}");
        assert_eq!(json, json!({ "detail": "Invalid API key" }));
        assert_eq!(app.catalog.list_calls.load(Ordering::SeqCst), 0);
        assert_eq!(app.catalog.invite_calls.load(Ordering::SeqCst), 0);
        assert_eq!(app.model.calls.load(Ordering::SeqCst), 0);
    }
}

// ── /tracks ────────────────────────────────────────────────────

#[tokio::test]
async fn tracks_lists_directory_verbatim() {
    let app = default_app();
    let (status, body) = send(app.router, request("GET", "/tracks", bearer(), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::to_value(sample_labs()).unwrap());
}

#[tokio::test]
async fn tracks_upstream_failure_is_generic_502() {
    let app = build_test_app(
        FakeCatalog {
            fail_listing: true,
            ..Default::default()
        },
        None,
    );
    let (status, body) = send(app.router, request("GET", "/tracks", bearer(), None)).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body, json!({ "detail": "Failed to list tracks" }));
}

// ── /invite ────────────────────────────────────────────────────

#[tokio::test]
async fn invite_by_query_slug() {
    let app = default_app();
    let (status, body) = send(
        app.router,
        request("POST", "/invite?slug=any-slug", bearer(), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "slug": "any-slug",
            "invite_url": "https://play.instruqt.com/infoblox/invite/any-slug-inv"
        })
    );
    // no existence check against the directory
    assert_eq!(app.catalog.list_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn invite_by_body_slug() {
    let app = default_app();
    let (status, body) = send(
        app.router,
        request(
            "POST",
            "/invite",
            bearer(),
            Some(json!({ "slug": "infoblox-threat-defense" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["slug"], "infoblox-threat-defense");
}

#[tokio::test]
async fn blank_query_slug_falls_back_to_body() {
    let app = default_app();
    let (status, body) = send(
        app.router,
        request(
            "POST",
            "/invite?slug=",
            bearer(),
            Some(json!({ "slug": "real" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["slug"], "real");
}

#[tokio::test]
async fn invite_without_slug_is_bad_request() {
    let app = default_app();
    let (status, _) = send(app.router, request("POST", "/invite", bearer(), None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(app.catalog.invite_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn invite_rejection_echoes_issuer_detail() {
    let app = build_test_app(
        FakeCatalog {
            reject_invites: true,
            ..Default::default()
        },
        None,
    );
    let (status, body) = send(
        app.router,
        request("POST", "/invite?slug=draft-lab", bearer(), None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    let detail = body["detail"].as_str().unwrap();
    assert!(detail.starts_with("Invite creation failed:"), "{detail}");
    assert!(detail.contains("track draft-lab is not published"), "{detail}");
}

// ── /resolve ───────────────────────────────────────────────────

#[tokio::test]
async fn resolve_body_without_prompt_is_json_422() {
    let app = default_app();
    let (status, body) = send(
        app.router,
        request("POST", "/resolve", bearer(), Some(json!({ "nope": 1 }))),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let detail = body["detail"].as_str().unwrap();
    assert!(detail.contains("missing field `prompt`"), "{detail}");
    assert_eq!(app.catalog.list_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn resolve_via_intent_rule() {
    let app = default_app();
    let (status, body) = send(
        app.router,
        request(
            "POST",
            "/resolve",
            bearer(),
            Some(json!({ "prompt": "I need a DNS lab" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["slug"], "infoblox-lab1");
    assert_eq!(
        body["invite_url"],
        "https://play.instruqt.com/infoblox/invite/infoblox-lab1-inv"
    );
    assert_eq!(app.catalog.list_calls.load(Ordering::SeqCst), 0);
    assert_eq!(app.model.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn resolve_via_title_match() {
    let app = default_app();
    let (status, body) = send(
        app.router,
        request(
            "POST",
            "/resolve",
            bearer(),
            Some(json!({ "prompt": "threat defense" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["slug"], "infoblox-threat-defense");
    assert_eq!(app.model.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn resolve_via_model_fallback() {
    let app = default_app();
    let (status, body) = send(
        app.router,
        request(
            "POST",
            "/resolve",
            bearer(),
            Some(json!({ "prompt": "completely unrelated gibberish" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["slug"], "chosen-slug");
    assert_eq!(app.catalog.list_calls.load(Ordering::SeqCst), 1);
    assert_eq!(app.model.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn resolve_rate_limited_is_404() {
    let app = build_test_app(
        FakeCatalog {
            labs: sample_labs(),
            ..Default::default()
        },
        None,
    );
    let (status, body) = send(
        app.router,
        request(
            "POST",
            "/resolve",
            bearer(),
            Some(json!({ "prompt": "completely unrelated gibberish" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "detail": "No matching lab" }));
    assert_eq!(app.catalog.invite_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn resolve_directory_failure_is_502() {
    let app = build_test_app(
        FakeCatalog {
            fail_listing: true,
            ..Default::default()
        },
        Some("chosen-slug"),
    );
    let (status, _) = send(
        app.router,
        request(
            "POST",
            "/resolve",
            bearer(),
            Some(json!({ "prompt": "kubernetes" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(app.model.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn resolve_invite_failure_is_502_with_detail() {
    let app = build_test_app(
        FakeCatalog {
            reject_invites: true,
            ..Default::default()
        },
        None,
    );
    let (status, body) = send(
        app.router,
        request("POST", "/resolve", bearer(), Some(json!({ "prompt": "dns" }))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["detail"]
        .as_str()
        .unwrap()
        .contains("track infoblox-lab1 is not published"));
}

// ── Unhandled failures ─────────────────────────────────────────

struct PanickingDirectory;

#[async_trait]
impl LabDirectory for PanickingDirectory {
    async fn list_labs(&self) -> catalog::Result<Vec<Lab>> {
        panic!("directory exploded")
    }
}

#[tokio::test]
async fn handler_panic_is_json_500() {
    let directory: Arc<dyn LabDirectory> = Arc::new(PanickingDirectory);
    let issuer = Arc::new(FakeCatalog::default());
    let services = Services {
        directory: directory.clone(),
        issuer,
        resolver: Arc::new(PromptResolver::new(IntentMap::builtin(), directory)),
    };
    let router = build_router(services, ApiKey::new(API_KEY));

    let (status, body) = send(router, request("GET", "/tracks", bearer(), None)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["type"], "Panic");
    assert_eq!(body["error"]["detail"], "directory exploded");
}
