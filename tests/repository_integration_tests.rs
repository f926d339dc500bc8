use lab_cms::repository::{
    InMemoryRepository, PostgresRepository, Repository, RepositoryError, merge_object,
};
use serde_json::json;
use sqlx::PgPool;
use std::time::Duration;
use uuid::Uuid;

// --- Test Context and Setup ---

/// Postgres-backed context. Needs `DATABASE_URL`; those tests are `#[ignore]`d.
struct DbTestContext {
    pool: PgPool,
}

impl DbTestContext {
    async fn setup() -> Self {
        dotenv::dotenv().ok();

        let db_url = std::env::var("DATABASE_URL")
            .expect("DATABASE_URL must be set to run integration tests");

        let pool = PgPool::connect(&db_url)
            .await
            .expect("Failed to connect to database for integration tests.");

        let context = DbTestContext { pool };
        context
            .repository()
            .migrate()
            .await
            .expect("Failed to run database migrations.");
        context
    }

    fn repository(&self) -> PostgresRepository {
        PostgresRepository::new(self.pool.clone())
    }
}

/// A collection name no other test run touches.
fn scratch_collection() -> String {
    format!("test_{}", Uuid::new_v4().simple())
}

// --- Shared Scenarios ---

async fn check_insert_get_list(repo: &dyn Repository) {
    let collection = scratch_collection();

    let first = repo
        .insert(&collection, json!({ "title": "First" }))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(5)).await;
    let second = repo
        .insert(&collection, json!({ "title": "Second" }))
        .await
        .unwrap();

    assert_eq!(first.created_at, first.updated_at);
    assert_ne!(first.id, second.id);

    let fetched = repo.get(&collection, first.id).await.unwrap().unwrap();
    assert_eq!(fetched.body["title"], "First");

    let listed = repo.list(&collection).await.unwrap();
    let titles: Vec<_> = listed.iter().map(|d| d.body["title"].clone()).collect();
    assert_eq!(titles, vec![json!("Second"), json!("First")]);
}

async fn check_update_merges(repo: &dyn Repository) {
    let collection = scratch_collection();
    let doc = repo
        .insert(&collection, json!({ "title": "Draft", "year": "2023" }))
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(5)).await;

    let updated = repo
        .update(&collection, doc.id, json!({ "year": "2024", "link": "https://x" }))
        .await
        .unwrap()
        .expect("document exists");

    assert_eq!(
        updated.body,
        json!({ "title": "Draft", "year": "2024", "link": "https://x" })
    );
    assert_eq!(updated.created_at, doc.created_at);
    assert!(updated.updated_at > doc.updated_at);

    let missing = repo
        .update(&collection, Uuid::new_v4(), json!({ "year": "2025" }))
        .await
        .unwrap();
    assert!(missing.is_none());
}

async fn check_delete(repo: &dyn Repository) {
    let collection = scratch_collection();
    let doc = repo
        .insert(&collection, json!({ "title": "Gone soon" }))
        .await
        .unwrap();

    assert!(repo.delete(&collection, doc.id).await.unwrap());
    assert!(repo.get(&collection, doc.id).await.unwrap().is_none());
    assert!(!repo.delete(&collection, doc.id).await.unwrap());
}

async fn check_collections_are_isolated(repo: &dyn Repository) {
    let journals = scratch_collection();
    let patents = scratch_collection();

    let doc = repo
        .insert(&journals, json!({ "title": "Journal only" }))
        .await
        .unwrap();

    assert!(repo.list(&patents).await.unwrap().is_empty());
    assert!(repo.get(&patents, doc.id).await.unwrap().is_none());
    assert!(!repo.delete(&patents, doc.id).await.unwrap());
    assert_eq!(repo.list(&journals).await.unwrap().len(), 1);
}

async fn check_rejects_non_objects(repo: &dyn Repository) {
    let collection = scratch_collection();
    let result = repo.insert(&collection, json!("just a string")).await;
    assert!(matches!(result, Err(RepositoryError::NotAnObject)));

    let doc = repo.insert(&collection, json!({ "a": 1 })).await.unwrap();
    let result = repo.update(&collection, doc.id, json!([1, 2])).await;
    assert!(matches!(result, Err(RepositoryError::NotAnObject)));
}

// --- In-memory ---

#[tokio::test]
async fn test_memory_insert_get_list() {
    check_insert_get_list(&InMemoryRepository::new()).await;
}

#[tokio::test]
async fn test_memory_update_merges() {
    check_update_merges(&InMemoryRepository::new()).await;
}

#[tokio::test]
async fn test_memory_delete() {
    check_delete(&InMemoryRepository::new()).await;
}

#[tokio::test]
async fn test_memory_collections_are_isolated() {
    check_collections_are_isolated(&InMemoryRepository::new()).await;
}

#[tokio::test]
async fn test_memory_rejects_non_objects() {
    check_rejects_non_objects(&InMemoryRepository::new()).await;
}

#[tokio::test]
async fn test_memory_list_of_unknown_collection_is_empty() {
    let repo = InMemoryRepository::new();
    assert!(repo.list("nothing_here").await.unwrap().is_empty());
}

#[test]
fn test_merge_object_is_shallow() {
    let mut target = json!({ "title": "T", "contact": { "email": "a@x", "phone": "1" } });
    merge_object(&mut target, json!({ "contact": { "email": "b@x" } }));
    // Nested objects are replaced wholesale.
    assert_eq!(target, json!({ "title": "T", "contact": { "email": "b@x" } }));
}

// --- Postgres ---

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_postgres_insert_get_list() {
    let ctx = DbTestContext::setup().await;
    check_insert_get_list(&ctx.repository()).await;
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_postgres_update_merges() {
    let ctx = DbTestContext::setup().await;
    check_update_merges(&ctx.repository()).await;
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_postgres_delete() {
    let ctx = DbTestContext::setup().await;
    check_delete(&ctx.repository()).await;
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_postgres_collections_are_isolated() {
    let ctx = DbTestContext::setup().await;
    check_collections_are_isolated(&ctx.repository()).await;
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_postgres_rejects_non_objects() {
    let ctx = DbTestContext::setup().await;
    check_rejects_non_objects(&ctx.repository()).await;
}
