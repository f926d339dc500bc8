use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use sqlx::{FromRow, PgPool, types::Json};
use std::{collections::HashMap, sync::Arc};
use tokio::sync::RwLock;
use uuid::Uuid;

/// StoredDocument
///
/// A document as the store sees it: the untyped JSON body of one resource plus the
/// identifier and timestamps the store maintains.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: Uuid,
    pub body: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// RepositoryError
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("document body must be a JSON object")]
    NotAnObject,
}

/// Repository Trait
///
/// Persistence contract for every collection. Each method is a single atomic document
/// operation; nothing spans collections. `Send + Sync + async_trait` keep the trait object
/// (`Arc<dyn Repository>`) usable across axum's task boundaries.
///
/// Bodies are untyped JSON objects: the typed view of a collection lives in
/// `resource::Resource`, so one implementation serves all of them.
#[async_trait]
pub trait Repository: Send + Sync {
    /// list
    ///
    /// Fetches every document of a collection.
    ///
    /// # Arguments
    /// * `collection` - Collection name, e.g. `journals`.
    ///
    /// # Returns
    /// The documents ordered by `created_at`, newest first. Documents created in the
    /// same instant keep the most recent insertion first. An unknown collection is empty,
    /// not an error.
    async fn list(&self, collection: &str) -> Result<Vec<StoredDocument>, RepositoryError>;

    /// get
    ///
    /// Fetches one document by id. `None` when the id is unknown in that collection,
    /// even if it exists in another one.
    async fn get(&self, collection: &str, id: Uuid)
    -> Result<Option<StoredDocument>, RepositoryError>;

    /// insert
    ///
    /// Stores a new document under a freshly generated id, with both timestamps set to
    /// now.
    ///
    /// # Arguments
    /// * `collection` - Target collection; created implicitly on first insert.
    /// * `body` - The document body. Must be a JSON object.
    ///
    /// # Errors
    /// `RepositoryError::NotAnObject` for any other JSON value.
    async fn insert(&self, collection: &str, body: Value)
    -> Result<StoredDocument, RepositoryError>;

    /// update
    ///
    /// Shallow-merges the top-level keys of `patch` into the stored body and bumps
    /// `updated_at`. Keys absent from `patch` are left as they are in the store at the
    /// moment of the write, so concurrent patches of different keys compose. The merge
    /// and the timestamp bump happen as one operation.
    ///
    /// # Arguments
    /// * `collection` - Collection holding the document.
    /// * `id` - Document id.
    /// * `patch` - JSON object of keys to overwrite.
    ///
    /// # Returns
    /// The document after the merge, or `None` when it does not exist.
    async fn update(
        &self,
        collection: &str,
        id: Uuid,
        patch: Value,
    ) -> Result<Option<StoredDocument>, RepositoryError>;

    /// delete
    ///
    /// Removes one document. Returns true if a document was removed, false when the id
    /// was unknown.
    async fn delete(&self, collection: &str, id: Uuid) -> Result<bool, RepositoryError>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;

fn ensure_object(value: &Value) -> Result<(), RepositoryError> {
    if value.is_object() {
        Ok(())
    } else {
        Err(RepositoryError::NotAnObject)
    }
}

/// merge_object
///
/// Top-level merge of `patch` into `target`; keys in `patch` win. Nested objects are
/// replaced, not merged. Does nothing unless both values are objects.
pub fn merge_object(target: &mut Value, patch: Value) {
    if let (Value::Object(target), Value::Object(patch)) = (target, patch) {
        for (key, value) in patch {
            target.insert(key, value);
        }
    }
}

// --- Postgres ---

#[derive(FromRow)]
struct DocumentRow {
    id: Uuid,
    body: Json<Value>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<DocumentRow> for StoredDocument {
    fn from(row: DocumentRow) -> Self {
        StoredDocument {
            id: row.id,
            body: row.body.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// PostgresRepository
///
/// `Repository` backed by a single `documents` table (`collection`, `body jsonb`).
/// Every method is one SQL statement, which gives the per-document atomicity the trait
/// promises without explicit transactions. The table layout lives in `./migrations`.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies the embedded migrations under `./migrations`.
    pub async fn migrate(&self) -> Result<(), RepositoryError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn list(&self, collection: &str) -> Result<Vec<StoredDocument>, RepositoryError> {
        let rows = sqlx::query_as::<_, DocumentRow>(
            r#"
            SELECT id, body, created_at, updated_at
            FROM documents
            WHERE collection = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(collection)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(StoredDocument::from).collect())
    }

    async fn get(
        &self,
        collection: &str,
        id: Uuid,
    ) -> Result<Option<StoredDocument>, RepositoryError> {
        let row = sqlx::query_as::<_, DocumentRow>(
            "SELECT id, body, created_at, updated_at FROM documents WHERE collection = $1 AND id = $2",
        )
        .bind(collection)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(StoredDocument::from))
    }

    async fn insert(
        &self,
        collection: &str,
        body: Value,
    ) -> Result<StoredDocument, RepositoryError> {
        ensure_object(&body)?;
        let row = sqlx::query_as::<_, DocumentRow>(
            r#"
            INSERT INTO documents (id, collection, body, created_at, updated_at)
            VALUES ($1, $2, $3, NOW(), NOW())
            RETURNING id, body, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(collection)
        .bind(Json(body))
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    /// Uses the JSONB `||` operator so the merge happens in one statement.
    async fn update(
        &self,
        collection: &str,
        id: Uuid,
        patch: Value,
    ) -> Result<Option<StoredDocument>, RepositoryError> {
        ensure_object(&patch)?;
        let row = sqlx::query_as::<_, DocumentRow>(
            r#"
            UPDATE documents
            SET body = body || $3, updated_at = NOW()
            WHERE collection = $1 AND id = $2
            RETURNING id, body, created_at, updated_at
            "#,
        )
        .bind(collection)
        .bind(id)
        .bind(Json(patch))
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(StoredDocument::from))
    }

    async fn delete(&self, collection: &str, id: Uuid) -> Result<bool, RepositoryError> {
        let res = sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}

// --- In-memory ---

/// InMemoryRepository
///
/// `Repository` kept in process memory. Used for local development without
/// `DATABASE_URL` and by the test suites. Every operation takes the lock once.
#[derive(Default)]
pub struct InMemoryRepository {
    collections: RwLock<HashMap<String, Vec<StoredDocument>>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn list(&self, collection: &str) -> Result<Vec<StoredDocument>, RepositoryError> {
        let collections = self.collections.read().await;
        let mut docs = collections.get(collection).cloned().unwrap_or_default();
        // Stable sort keeps insertion order for equal timestamps, newest first.
        docs.reverse();
        docs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(docs)
    }

    async fn get(
        &self,
        collection: &str,
        id: Uuid,
    ) -> Result<Option<StoredDocument>, RepositoryError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|d| d.id == id).cloned()))
    }

    async fn insert(
        &self,
        collection: &str,
        body: Value,
    ) -> Result<StoredDocument, RepositoryError> {
        ensure_object(&body)?;
        let now = Utc::now();
        let doc = StoredDocument {
            id: Uuid::new_v4(),
            body,
            created_at: now,
            updated_at: now,
        };
        self.collections
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .push(doc.clone());
        Ok(doc)
    }

    async fn update(
        &self,
        collection: &str,
        id: Uuid,
        patch: Value,
    ) -> Result<Option<StoredDocument>, RepositoryError> {
        ensure_object(&patch)?;
        let mut collections = self.collections.write().await;
        let Some(doc) = collections
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|d| d.id == id))
        else {
            return Ok(None);
        };
        if !doc.body.is_object() {
            doc.body = Value::Object(Map::new());
        }
        merge_object(&mut doc.body, patch);
        doc.updated_at = Utc::now().max(doc.updated_at);
        Ok(Some(doc.clone()))
    }

    async fn delete(&self, collection: &str, id: Uuid) -> Result<bool, RepositoryError> {
        let mut collections = self.collections.write().await;
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(false);
        };
        let before = docs.len();
        docs.retain(|d| d.id != id);
        Ok(docs.len() < before)
    }
}
