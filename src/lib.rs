use axum::{
    Router,
    extract::FromRef,
    http::HeaderName,
    middleware,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Server: configuration, identity, persistence, object storage, HTTP surface.
pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod repository;
pub mod storage;

// Resource catalogue and the list logic shared by server and client.
pub mod filter;
pub mod models;
pub mod resource;

// Client side of the list-resource contract.
pub mod client;

pub mod routes;
use auth::{Role, RoleGate};
use routes::{private, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use repository::{InMemoryRepository, PostgresRepository, RepositoryState};
pub use resource::{Document, Resource};
pub use storage::{MockStorageService, S3StorageClient, StorageState};

/// ApiDoc
///
/// OpenAPI document served at `/api-docs/openapi.json`. The CRUD groups are generated
/// per resource at runtime, so only their schemas are listed here.
#[derive(OpenApi)]
#[openapi(
    paths(handlers::upload_gallery_image),
    components(
        schemas(
            models::Journal, models::Conference, models::Patent, models::Book,
            models::Workshop, models::Student, models::Degree, models::Contact,
            models::Intern, models::News, models::Event, models::Gallery,
            models::Teaching, models::Course, models::Activity,
            models::GalleryUploadRequest, models::GalleryUploadResponse,
            models::MessageResponse,
        )
    ),
    tags(
        (name = "lab-cms", description = "Lab content management API")
    )
)]
struct ApiDoc;

/// AppState
///
/// Shared, cloneable container of every service a request may need.
#[derive(Clone)]
pub struct AppState {
    /// Document store for every collection.
    pub repo: RepositoryState,
    /// Object storage for gallery uploads.
    pub storage: StorageState,
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for StorageState {
    fn from_ref(app_state: &AppState) -> StorageState {
        app_state.storage.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

const REQUEST_ID_HEADER: &str = "x-request-id";

/// create_router
///
/// Assembles the route table: docs and health check, then the private resource routes
/// mounted once per role prefix behind that role's gate.
pub fn create_router(state: AppState) -> Router {
    let mut router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes());

    // Admin prefix: admins only. Subadmin prefix: subadmins and admins.
    for role in [Role::Admin, Role::Subadmin] {
        let gate = RoleGate::new(&state.config, role);
        router = router.nest(
            &format!("/api/{}/private", role.route_prefix()),
            private::private_routes()
                .route_layer(middleware::from_fn_with_state(gate, auth::require_role)),
        );
    }

    with_observability(router.with_state(state))
}

/// with_observability
///
/// Request ids (generated, then echoed back), one tracing span per request, and a
/// permissive CORS policy for the admin panel.
fn with_observability(router: Router) -> Router {
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(request_span)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(request_id)),
        )
        .layer(
            CorsLayer::new()
                .allow_methods(Any)
                .allow_origin(Any)
                .allow_headers(Any),
        )
}

fn request_span(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = %request.method(),
        path = %request.uri().path(),
        req_id = %request_id,
    )
}
