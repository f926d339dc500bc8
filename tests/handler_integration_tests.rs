use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use async_trait::async_trait;
use lab_cms::{
    AppConfig, AppState, InMemoryRepository, MockStorageService, RepositoryState, create_router,
    repository::{Repository, RepositoryError, StoredDocument},
};
use serde_json::{Value, json};
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};
use tokio::sync::Barrier;
use tower::util::ServiceExt;
use uuid::Uuid;

// --- Helpers ---

fn app() -> Router {
    app_with_repo(Arc::new(InMemoryRepository::new()))
}

fn app_with_repo(repo: RepositoryState) -> Router {
    // AppConfig::default() runs in Env::Local, so the x-user-role bypass is available.
    let state = AppState {
        repo,
        storage: Arc::new(MockStorageService::new()),
        config: AppConfig::default(),
    };
    create_router(state)
}

/// In-memory store whose next `gated` reads wait for each other, so two requests are
/// guaranteed to have both read the document before either writes.
struct LockstepRepository {
    inner: InMemoryRepository,
    barrier: Barrier,
    gated: AtomicUsize,
}

impl LockstepRepository {
    fn new() -> Self {
        Self {
            inner: InMemoryRepository::new(),
            barrier: Barrier::new(2),
            gated: AtomicUsize::new(0),
        }
    }

    fn gate_next_reads(&self) {
        self.gated.store(2, Ordering::SeqCst);
    }
}

#[async_trait]
impl Repository for LockstepRepository {
    async fn list(&self, collection: &str) -> Result<Vec<StoredDocument>, RepositoryError> {
        self.inner.list(collection).await
    }

    async fn get(
        &self,
        collection: &str,
        id: Uuid,
    ) -> Result<Option<StoredDocument>, RepositoryError> {
        let doc = self.inner.get(collection, id).await?;
        let gated = self
            .gated
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if gated {
            self.barrier.wait().await;
        }
        Ok(doc)
    }

    async fn insert(&self, collection: &str, body: Value) -> Result<StoredDocument, RepositoryError> {
        self.inner.insert(collection, body).await
    }

    async fn update(
        &self,
        collection: &str,
        id: Uuid,
        patch: Value,
    ) -> Result<Option<StoredDocument>, RepositoryError> {
        self.inner.update(collection, id, patch).await
    }

    async fn delete(&self, collection: &str, id: Uuid) -> Result<bool, RepositoryError> {
        self.inner.delete(collection, id).await
    }
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("x-user-role", "admin");
    let body = match body {
        Some(value) => {
            builder = builder.header("Content-Type", "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

const BASE: &str = "/api/Admin/private";

fn journal(title: &str, year: &str) -> Value {
    json!({
        "title": title,
        "authors": ["A. Sharma", "B. Rao"],
        "journal": "IEEE Transactions on Networking",
        "year": year,
        "ranking": "Q1"
    })
}

async fn create_journal(app: &Router, title: &str, year: &str) -> Value {
    let (status, body) = send(
        app,
        "POST",
        &format!("{BASE}/createJournal"),
        Some(journal(title, year)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["data"].clone()
}

// --- Tests ---

#[tokio::test]
async fn test_health_check() {
    let response = app()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_create_rejects_missing_required_fields() {
    let app = app();

    let (status, body) = send(
        &app,
        "POST",
        &format!("{BASE}/createJournal"),
        Some(json!({ "title": "Only a title", "authors": ["  "] })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["message"],
        "Please fill in all required fields: authors, journal, year"
    );

    // Nothing was stored.
    let (_, list) = send(&app, "GET", &format!("{BASE}/getAllJournal"), None).await;
    assert_eq!(list["total"], 0);
}

#[tokio::test]
async fn test_create_returns_document_envelope() {
    let app = app();
    let supplied_id = Uuid::new_v4().to_string();

    let mut payload = journal("Graph Neural Routing", "2024");
    payload["id"] = json!(supplied_id);

    let (status, body) = send(&app, "POST", &format!("{BASE}/createJournal"), Some(payload)).await;

    assert_eq!(status, StatusCode::CREATED);
    let doc = &body["data"];
    assert_eq!(doc["title"], "Graph Neural Routing");
    assert_eq!(doc["authors"], json!(["A. Sharma", "B. Rao"]));
    assert!(doc["created_at"].is_string());
    assert!(doc["updated_at"].is_string());
    // The store assigns ids; a client-supplied one is ignored.
    assert_ne!(doc["id"], json!(supplied_id));
}

#[tokio::test]
async fn test_get_all_lists_newest_first_with_total() {
    let app = app();
    create_journal(&app, "First Paper", "2021").await;
    create_journal(&app, "Second Paper", "2022").await;

    let (status, body) = send(&app, "GET", &format!("{BASE}/getAllJournal"), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);
    assert_eq!(body["data"][0]["title"], "Second Paper");
    assert_eq!(body["data"][1]["title"], "First Paper");
}

#[tokio::test]
async fn test_get_all_with_search_parameter() {
    let app = app();
    create_journal(&app, "Deep Learning for Spectrum Sensing", "2023").await;
    create_journal(&app, "Blockchain Auditing", "2022").await;

    let (status, body) = send(
        &app,
        "GET",
        &format!("{BASE}/getAllJournal?search=deep%20LEARNING"),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["data"][0]["title"], "Deep Learning for Spectrum Sensing");
}

#[tokio::test]
async fn test_get_by_id_or_search_term() {
    let app = app();
    let created = create_journal(&app, "Edge Caching", "2020").await;
    create_journal(&app, "Federated Learning", "2021").await;

    let id = created["id"].as_str().unwrap();
    let (status, by_id) = send(&app, "GET", &format!("{BASE}/getJournal/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(by_id["total"], 1);
    assert_eq!(by_id["data"][0]["id"], created["id"]);

    let (_, by_term) = send(&app, "GET", &format!("{BASE}/getJournal/2021"), None).await;
    assert_eq!(by_term["total"], 1);
    assert_eq!(by_term["data"][0]["title"], "Federated Learning");

    // An unknown id falls back to search and matches nothing.
    let (status, missing) = send(
        &app,
        "GET",
        &format!("{BASE}/getJournal/{}", Uuid::new_v4()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(missing["total"], 0);
}

#[tokio::test]
async fn test_update_merges_supplied_fields() {
    let app = app();
    let created = create_journal(&app, "Edge Caching", "2020").await;
    let id = created["id"].as_str().unwrap();

    tokio::time::sleep(std::time::Duration::from_millis(5)).await;

    let (status, body) = send(
        &app,
        "PUT",
        &format!("{BASE}/updateJournal/{id}"),
        Some(json!({ "ranking": "Q2", "volume": "41" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let doc = &body["data"];
    assert_eq!(doc["title"], "Edge Caching");
    assert_eq!(doc["ranking"], "Q2");
    assert_eq!(doc["volume"], "41");
    assert_eq!(doc["created_at"], created["created_at"]);
    assert_ne!(doc["updated_at"], created["updated_at"]);
}

#[tokio::test]
async fn test_update_rejects_blanking_a_required_field() {
    let app = app();
    let created = create_journal(&app, "Edge Caching", "2020").await;
    let id = created["id"].as_str().unwrap();

    let (status, body) = send(
        &app,
        "PUT",
        &format!("{BASE}/updateJournal/{id}"),
        Some(json!({ "title": "" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Please fill in all required fields: title");

    let (_, list) = send(&app, "GET", &format!("{BASE}/getJournal/{id}"), None).await;
    assert_eq!(list["data"][0]["title"], "Edge Caching");
}

#[tokio::test]
async fn test_overlapping_updates_of_different_fields_both_survive() {
    let repo = Arc::new(LockstepRepository::new());
    let app = app_with_repo(repo.clone());
    let created = create_journal(&app, "Edge Caching", "2020").await;
    let id = created["id"].as_str().unwrap();
    let uri = format!("{BASE}/updateJournal/{id}");

    repo.gate_next_reads();
    let (ranking, volume) = tokio::join!(
        send(&app, "PUT", &uri, Some(json!({ "ranking": "Q2" }))),
        send(&app, "PUT", &uri, Some(json!({ "volume": "41" }))),
    );
    assert_eq!(ranking.0, StatusCode::OK);
    assert_eq!(volume.0, StatusCode::OK);

    let (_, list) = send(&app, "GET", &format!("{BASE}/getJournal/{id}"), None).await;
    let doc = &list["data"][0];
    assert_eq!(doc["ranking"], "Q2");
    assert_eq!(doc["volume"], "41");
    assert_eq!(doc["title"], "Edge Caching");
}

#[tokio::test]
async fn test_update_ignores_unknown_fields() {
    let app = app();
    let created = create_journal(&app, "Edge Caching", "2020").await;
    let id = created["id"].as_str().unwrap();

    let (status, body) = send(
        &app,
        "PUT",
        &format!("{BASE}/updateJournal/{id}"),
        Some(json!({ "volume": "7", "not_a_field": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["volume"], "7");
    assert!(body["data"].get("not_a_field").is_none());
}

#[tokio::test]
async fn test_listing_fails_on_an_undecodable_document() {
    let repo = Arc::new(InMemoryRepository::new());
    let app = app_with_repo(repo.clone());
    create_journal(&app, "Edge Caching", "2020").await;
    repo.insert("journals", json!({ "title": "Broken", "authors": 5 }))
        .await
        .unwrap();

    let (status, body) = send(&app, "GET", &format!("{BASE}/getAllJournal"), None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "Internal server error");

    let (status, _) = send(&app, "GET", &format!("{BASE}/getJournal/Edge"), None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_update_unknown_and_malformed_ids() {
    let app = app();

    let (status, body) = send(
        &app,
        "PUT",
        &format!("{BASE}/updateJournal/{}", Uuid::new_v4()),
        Some(json!({ "ranking": "Q3" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Journal not found");

    let (status, _) = send(
        &app,
        "PUT",
        &format!("{BASE}/updateJournal/not-a-uuid"),
        Some(json!({ "ranking": "Q3" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_non_object_body_is_rejected() {
    let app = app();
    let (status, body) = send(
        &app,
        "POST",
        &format!("{BASE}/createJournal"),
        Some(json!(["not", "an", "object"])),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Request body must be a JSON object");
}

#[tokio::test]
async fn test_delete_then_delete_again() {
    let app = app();
    let created = create_journal(&app, "Edge Caching", "2020").await;
    let id = created["id"].as_str().unwrap();

    let (status, body) = send(&app, "DELETE", &format!("{BASE}/deleteJournal/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Journal deleted successfully");

    let (_, list) = send(&app, "GET", &format!("{BASE}/getAllJournal"), None).await;
    assert_eq!(list["total"], 0);

    let (status, _) = send(&app, "DELETE", &format!("{BASE}/deleteJournal/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_collections_are_independent() {
    let app = app();
    create_journal(&app, "Edge Caching", "2020").await;

    let (status, patents) = send(&app, "GET", &format!("{BASE}/getAllPatent"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(patents["total"], 0);
}

#[tokio::test]
async fn test_student_with_nested_contact() {
    let app = app();

    let (status, body) = send(
        &app,
        "POST",
        &format!("{BASE}/createStudent"),
        Some(json!({
            "name": "Priya Nair",
            "degree": "PhD",
            "research_area": "Wireless security",
            "contact": { "email": "priya@lab.example", "phone": "+91 00000" }
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["degree"], "PhD");
    assert_eq!(body["data"]["contact"]["email"], "priya@lab.example");

    let (status, body) = send(
        &app,
        "POST",
        &format!("{BASE}/createStudent"),
        Some(json!({ "name": "No Degree" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Please fill in all required fields: degree");

    let (status, _) = send(
        &app,
        "POST",
        &format!("{BASE}/createStudent"),
        Some(json!({ "name": "Bad Degree", "degree": "Diploma" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_teaching_courses_round_trip_through_api() {
    let app = app();

    let (status, body) = send(
        &app,
        "POST",
        &format!("{BASE}/createTeaching"),
        Some(json!({
            "semester": "Monsoon",
            "year": "2024",
            "courses": [
                { "code": "CS601", "name": "Network Security", "role": "Instructor" },
                { "code": "CS420", "name": "Distributed Systems", "role": "TA" }
            ]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["courses"][1]["code"], "CS420");

    let (_, found) = send(
        &app,
        "GET",
        &format!("{BASE}/getAllTeaching?search=network%20security"),
        None,
    )
    .await;
    assert_eq!(found["total"], 1);
}
