use super::handlers;
use super::state::AppState;
use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, patch, post, put};
use axum::Router;
use std::sync::Arc;

/// Multipart overhead allowed on top of the thumbnail size limit, so an
/// oversized image reaches validation instead of being cut off.
const FORM_OVERHEAD_BYTES: usize = 1024 * 1024;

pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(handlers::public::index))
        .route("/posts", get(handlers::public::posts))
        .route("/posts/:slug", get(handlers::public::post))
}

pub fn auth_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/admin", get(handlers::auth::admin_home))
        .route(
            "/admin/login",
            get(handlers::auth::login_form).post(handlers::auth::login),
        )
        .route("/admin/logout", post(handlers::auth::logout))
}

pub fn admin_routes(max_thumbnail_bytes: usize) -> Router<Arc<AppState>> {
    use handlers::{admin, terms};

    let upload_limit = max_thumbnail_bytes + FORM_OVERHEAD_BYTES;

    Router::new()
        .route("/admin/dashboard", get(admin::dashboard))
        .route("/admin/posts", get(admin::posts))
        .route(
            "/admin/posts",
            post(admin::create_post).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/admin/posts/create", get(admin::create_post_form))
        .route("/admin/posts/bulk-delete", post(admin::bulk_delete_posts))
        .route("/admin/posts/:id/edit", get(admin::edit_post))
        .route(
            "/admin/posts/:id",
            post(admin::update_post)
                .put(admin::update_post)
                .layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/admin/posts/:id", delete(admin::delete_post))
        .route(
            "/admin/posts/:id/toggle-status",
            patch(admin::toggle_post_status),
        )
        .route(
            "/admin/categories",
            get(terms::categories).post(terms::store_category),
        )
        .route("/admin/categories/create", get(terms::create_category_form))
        .route(
            "/admin/categories/bulk-delete",
            post(terms::bulk_delete_categories),
        )
        .route("/admin/categories/:id/edit", get(terms::edit_category))
        .route(
            "/admin/categories/:id",
            put(terms::update_category).delete(terms::delete_category),
        )
        .route("/admin/tags", get(terms::tags).post(terms::store_tag))
        .route("/admin/tags/create", get(terms::create_tag_form))
        .route("/admin/tags/bulk-delete", post(terms::bulk_delete_tags))
        .route("/admin/tags/:id/edit", get(terms::edit_tag))
        .route(
            "/admin/tags/:id",
            put(terms::update_tag).delete(terms::delete_tag),
        )
        .route(
            "/admin/profile",
            get(admin::profile).put(admin::update_profile),
        )
}
