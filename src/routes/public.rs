use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints reachable without a token. Mounted under `/api/v1` by `create_router`.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // POST /signup
        // Validates the credentials shape, rejects taken usernames (409) and stores a bcrypt hash.
        .route("/signup", post(handlers::signup))
        // POST /signin
        // Returns a 24-hour identity token. Unknown user and wrong password look identical.
        .route("/signin", post(handlers::signin))
        // GET /brain/{shareLink}
        // Read-only view of the collection behind a share hash.
        .route("/brain/{shareLink}", get(handlers::get_shared_brain))
}
