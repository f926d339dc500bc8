use axum::{
    Extension, Json,
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    error::ApiError,
    filter::{ListQuery, filtered_view},
    models::{
        DataEnvelope, GalleryUploadRequest, GalleryUploadResponse, ListEnvelope, MessageResponse,
    },
    repository::{RepositoryState, StoredDocument, merge_object},
    resource::{Document, Resource},
    storage::{StorageState, gallery_object_key},
};

/// Keys the store owns; never accepted from a request body.
const RESERVED_KEYS: [&str; 4] = ["id", "_id", "created_at", "updated_at"];

/// SearchParams
///
/// Optional server-side search for the list endpoint (`getAll<Name>?search=...`).
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
pub struct SearchParams {
    pub search: Option<String>,
}

// --- Helpers ---

/// Decodes a whole collection. One undecodable document fails the listing, so a
/// response never reports a `total` short of what the store holds.
fn decode_all<R: Resource>(docs: Vec<StoredDocument>) -> Result<Vec<Document<R>>, ApiError> {
    docs.into_iter().map(decode_one::<R>).collect()
}

fn decode_one<R: Resource>(stored: StoredDocument) -> Result<Document<R>, ApiError> {
    let id = stored.id;
    Document::try_from(stored)
        .map_err(|e| ApiError::Malformed(format!("{} {}: {}", R::NAME, id, e)))
}

fn search<R: Resource>(docs: Vec<Document<R>>, term: Option<&str>) -> Vec<Document<R>> {
    match term.map(str::trim).filter(|t| !t.is_empty()) {
        None => docs,
        Some(term) => {
            let query = ListQuery::search(term);
            filtered_view(&docs, &query).into_iter().cloned().collect()
        }
    }
}

/// Parses a request body into a JSON object with store-owned keys removed.
fn parse_object(body: &Bytes) -> Result<Value, ApiError> {
    let mut value: Value = serde_json::from_slice(body)
        .map_err(|e| ApiError::BadRequest(format!("Invalid JSON body: {}", e)))?;
    let Value::Object(map) = &mut value else {
        return Err(ApiError::BadRequest("Request body must be a JSON object".into()));
    };
    for key in RESERVED_KEYS {
        map.remove(key);
    }
    Ok(value)
}

/// Decodes and validates a full resource body, returning its normalized JSON form.
fn validated<R: Resource>(value: Value) -> Result<(R, Value), ApiError> {
    let item: R = serde_json::from_value(value)
        .map_err(|e| ApiError::BadRequest(format!("Invalid {}: {}", R::NAME, e)))?;
    let missing = item.missing_fields();
    if !missing.is_empty() {
        return Err(ApiError::Validation(missing));
    }
    let normalized = serde_json::to_value(&item)
        .map_err(|e| ApiError::BadRequest(format!("Invalid {}: {}", R::NAME, e)))?;
    Ok((item, normalized))
}

/// Narrows the normalized document to the keys the client actually sent. Unknown keys
/// were dropped by normalization and stay dropped.
fn patched_fields(patch: &Value, normalized: Value) -> Value {
    let (Value::Object(patch), Value::Object(mut normalized)) = (patch, normalized) else {
        return Value::Object(Map::new());
    };
    Value::Object(
        patch
            .keys()
            .filter_map(|key| normalized.remove_entry(key))
            .collect(),
    )
}

fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::BadRequest(format!("Invalid id: {}", raw)))
}

// --- Resource Handlers ---

/// get_all
///
/// Handler for `GET /api/{prefix}/private/getAll<Name>`.
///
/// Lists every document of `R::COLLECTION`, newest first, wrapped in a
/// `{data, total}` envelope. When `?search=` carries a non-blank term the list is
/// narrowed to documents whose searchable fields contain it (case-insensitive).
///
/// # Arguments
/// * `repo` - The document store, injected via `State`.
/// * `params` - Optional `search` term.
///
/// # Returns
/// `200 OK` with the envelope, or `500` when the store fails or holds a document that
/// no longer decodes as `R`.
pub async fn get_all<R: Resource>(
    State(repo): State<RepositoryState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<ListEnvelope<Document<R>>>, ApiError> {
    let docs = decode_all::<R>(repo.list(R::COLLECTION).await?)?;
    Ok(Json(search(docs, params.search.as_deref()).into()))
}

/// get_matching
///
/// Handler for `GET /api/{prefix}/private/get<Name>/{query}`.
///
/// When `query` parses as a UUID naming an existing document, that single document is
/// returned. Otherwise `query` is treated as a search term over the whole collection,
/// exactly like `getAll<Name>?search=`. The response is always a list envelope, which
/// may be empty.
///
/// # Arguments
/// * `repo` - The document store.
/// * `query` - A document id or a search term.
pub async fn get_matching<R: Resource>(
    State(repo): State<RepositoryState>,
    Path(query): Path<String>,
) -> Result<Json<ListEnvelope<Document<R>>>, ApiError> {
    if let Ok(id) = Uuid::parse_str(&query) {
        if let Some(stored) = repo.get(R::COLLECTION, id).await? {
            return Ok(Json(vec![decode_one::<R>(stored)?].into()));
        }
    }
    let docs = decode_all::<R>(repo.list(R::COLLECTION).await?)?;
    Ok(Json(search(docs, Some(&query)).into()))
}

/// create
///
/// Handler for `POST /api/{prefix}/private/create<Name>`.
///
/// The body must be a JSON object. Store-owned keys (`id`, `created_at`, ...) are
/// discarded, the rest is decoded as `R` with defaults for absent optional fields, and
/// every required field must be non-blank before anything is written.
///
/// # Arguments
/// * `repo` - The document store.
/// * `user` - The caller, placed in the request extensions by the role gate.
/// * `body` - Raw request body.
///
/// # Returns
/// `201 Created` with `{data}` holding the stored document, `400` with the missing-fields
/// message when validation fails.
pub async fn create<R: Resource>(
    State(repo): State<RepositoryState>,
    Extension(user): Extension<AuthUser>,
    body: Bytes,
) -> Result<(StatusCode, Json<DataEnvelope<Document<R>>>), ApiError> {
    let (_, normalized) = validated::<R>(parse_object(&body)?)?;
    let stored = repo.insert(R::COLLECTION, normalized).await?;
    tracing::info!(user = %user.id, id = %stored.id, "created {}", R::NAME);
    Ok((
        StatusCode::CREATED,
        Json(DataEnvelope {
            data: decode_one(stored)?,
        }),
    ))
}

/// update
///
/// Handler for `PUT /api/{prefix}/private/update<Name>/{id}`.
///
/// Partial update. The supplied top-level fields are merged over the current document
/// and the result is validated as a whole, so blanking a required field is rejected.
/// Only the supplied fields (in their normalized form) are then written, and the store
/// merges them in a single operation. Two concurrent updates of different fields
/// therefore both survive.
///
/// # Arguments
/// * `repo` - The document store.
/// * `user` - The caller.
/// * `id` - Document id; must be a UUID.
/// * `body` - JSON object with the fields to change.
///
/// # Returns
/// `200 OK` with the updated document, `400` for a malformed id or body or a failed
/// validation, `404` when no such document exists.
pub async fn update<R: Resource>(
    State(repo): State<RepositoryState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<DataEnvelope<Document<R>>>, ApiError> {
    let id = parse_id(&id)?;
    let patch = parse_object(&body)?;

    let existing = repo
        .get(R::COLLECTION, id)
        .await?
        .ok_or(ApiError::NotFound(R::NAME))?;
    let mut merged = existing.body;
    merge_object(&mut merged, patch.clone());
    let (_, normalized) = validated::<R>(merged)?;

    let stored = repo
        .update(R::COLLECTION, id, patched_fields(&patch, normalized))
        .await?
        .ok_or(ApiError::NotFound(R::NAME))?;
    tracing::info!(user = %user.id, %id, "updated {}", R::NAME);
    Ok(Json(DataEnvelope {
        data: decode_one(stored)?,
    }))
}

/// delete
///
/// Handler for `DELETE /api/{prefix}/private/delete<Name>/{id}`.
///
/// # Returns
/// `200 OK` with `{message: "<Name> deleted successfully"}`, `404` when nothing was
/// removed, `400` for an id that is not a UUID.
pub async fn delete<R: Resource>(
    State(repo): State<RepositoryState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = parse_id(&id)?;
    if !repo.delete(R::COLLECTION, id).await? {
        return Err(ApiError::NotFound(R::NAME));
    }
    tracing::info!(user = %user.id, %id, "deleted {}", R::NAME);
    Ok(Json(MessageResponse::new(format!(
        "{} deleted successfully",
        R::NAME
    ))))
}

// --- Gallery Uploads ---

/// upload_gallery_image
///
/// Hands out a short-lived presigned URL so the admin panel can PUT the image straight
/// to object storage. The returned `resource_key` goes into `Gallery.image`.
///
/// # Arguments
/// * `storage` - The object storage service.
/// * `payload` - Original file name and MIME type. Only `image/*` types are accepted.
///
/// # Returns
/// The upload URL and object key, `400` for a non-image type, `500` when signing fails.
#[utoipa::path(
    post,
    path = "/api/{prefix}/private/uploadGalleryImage",
    params(("prefix" = String, Path, description = "Admin or Subadmin")),
    request_body = GalleryUploadRequest,
    responses(
        (status = 200, description = "Presigned URL", body = GalleryUploadResponse),
        (status = 400, description = "Not an image", body = MessageResponse)
    )
)]
pub async fn upload_gallery_image(
    State(storage): State<StorageState>,
    Json(payload): Json<GalleryUploadRequest>,
) -> Result<Json<GalleryUploadResponse>, ApiError> {
    if !payload.file_type.starts_with("image/") {
        return Err(ApiError::BadRequest(format!(
            "Unsupported file type: {}",
            payload.file_type
        )));
    }

    let object_key = gallery_object_key(&payload.filename);

    let upload_url = storage
        .get_presigned_upload_url(&object_key, &payload.file_type)
        .await
        .map_err(|e| ApiError::Storage(e.to_string()))?;

    Ok(Json(GalleryUploadResponse {
        upload_url,
        resource_key: object_key,
    }))
}
