use crate::{
    AppState, handlers,
    models::{
        Activity, Book, Conference, Event, Gallery, Intern, Journal, News, Patent, Student,
        Teaching, Workshop,
    },
    resource::Resource,
};
use axum::{
    Router,
    routing::{delete, get, post, put},
};

/// resource_routes
///
/// The five CRUD endpoints of one resource, named after `R::NAME`:
///
/// ```text
/// GET    /getAll<Name>?search=   -> handlers::get_all
/// GET    /get<Name>/{query}      -> handlers::get_matching
/// POST   /create<Name>           -> handlers::create
/// PUT    /update<Name>/{id}      -> handlers::update
/// DELETE /delete<Name>/{id}      -> handlers::delete
/// ```
pub fn resource_routes<R: Resource>() -> Router<AppState> {
    Router::new()
        .route(&format!("/getAll{}", R::NAME), get(handlers::get_all::<R>))
        .route(
            &format!("/get{}/{{query}}", R::NAME),
            get(handlers::get_matching::<R>),
        )
        .route(&format!("/create{}", R::NAME), post(handlers::create::<R>))
        .route(
            &format!("/update{}/{{id}}", R::NAME),
            put(handlers::update::<R>),
        )
        .route(
            &format!("/delete{}/{{id}}", R::NAME),
            delete(handlers::delete::<R>),
        )
}

/// private_routes
///
/// Every resource group plus the gallery upload endpoint. Role gating is applied by
/// the caller as a route layer.
pub fn private_routes() -> Router<AppState> {
    Router::new()
        // --- Publications ---
        .merge(resource_routes::<Journal>())
        .merge(resource_routes::<Conference>())
        .merge(resource_routes::<Patent>())
        .merge(resource_routes::<Book>())
        .merge(resource_routes::<Workshop>())
        // --- People ---
        .merge(resource_routes::<Student>())
        .merge(resource_routes::<Intern>())
        // --- Lab life ---
        .merge(resource_routes::<News>())
        .merge(resource_routes::<Event>())
        .merge(resource_routes::<Gallery>())
        .merge(resource_routes::<Teaching>())
        .merge(resource_routes::<Activity>())
        // POST /uploadGalleryImage
        // Presigned object-storage URL for a new gallery image.
        .route("/uploadGalleryImage", post(handlers::upload_gallery_image))
}
