use crate::{AppState, handlers};
use axum::{
    Router,
    routing::post,
};

/// Authenticated Router Module
///
/// Every route here sits behind `auth_middleware` (see `create_router`): a missing
/// token is rejected with 401, an invalid or expired one with 403, before any handler runs.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // POST/GET/DELETE /content
        // Add a bookmark, list the caller's bookmarks, delete one of them by `contentId`.
        // Deletion is owner-scoped.
        .route(
            "/content",
            post(handlers::add_content)
                .get(handlers::list_content)
                .delete(handlers::delete_content),
        )
        // POST /brain/share
        // `{ "share": true }` issues (or returns the existing) share hash; `false` revokes it.
        .route("/brain/share", post(handlers::share_brain))
}
