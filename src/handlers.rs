use crate::{
    AppState,
    auth::AuthUser,
    error::{ApiError, ApiJson},
    models::{
        ContentListResponse, CreateContentRequest, DeleteContentRequest, MessageResponse,
        OwnedContent, ShareRequest, ShareResponse, SharedBrainResponse, SigninRequest,
        SigninResponse, SignupRequest,
    },
    password::{hash_password, verify_password},
    repository::USERS_USERNAME_KEY,
    share,
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid username or password";
pub const USERNAME_TAKEN_MESSAGE: &str = "Username already exists";

// --- Handlers ---

/// signup
///
/// [Public Route] Creates an account. The username lookup gives the friendly 409;
/// the `users_username_key` constraint settles concurrent signups for the same name.
#[utoipa::path(
    post,
    path = "/api/v1/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "User created", body = MessageResponse),
        (status = 400, description = "Invalid username or password shape", body = MessageResponse),
        (status = 409, description = "Username already exists", body = MessageResponse)
    )
)]
pub async fn signup(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<SignupRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    payload.validate()?;

    if state
        .repo
        .find_user_by_username(&payload.username)
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict(USERNAME_TAKEN_MESSAGE.to_string()));
    }

    let password_hash = hash_password(payload.password, state.config.bcrypt_cost).await?;

    match state
        .repo
        .create_user(&payload.username, &password_hash)
        .await
    {
        Ok(user) => {
            tracing::info!(user_id = %user.id, "user signed up");
            Ok((
                StatusCode::CREATED,
                Json(MessageResponse::new("User created successfully")),
            ))
        }
        Err(e) if e.violates(USERS_USERNAME_KEY) => {
            Err(ApiError::Conflict(USERNAME_TAKEN_MESSAGE.to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

/// signin
///
/// [Public Route] Exchanges credentials for an identity token. An unknown username and
/// a wrong password produce the same 401 body so accounts cannot be enumerated.
#[utoipa::path(
    post,
    path = "/api/v1/signin",
    request_body = SigninRequest,
    responses(
        (status = 200, description = "Signed in", body = SigninResponse),
        (status = 401, description = "Invalid username or password", body = MessageResponse)
    )
)]
pub async fn signin(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<SigninRequest>,
) -> Result<Json<SigninResponse>, ApiError> {
    payload.validate()?;

    let invalid = || ApiError::Unauthenticated(INVALID_CREDENTIALS_MESSAGE.to_string());

    let Some(user) = state.repo.find_user_by_username(&payload.username).await? else {
        return Err(invalid());
    };

    if !verify_password(payload.password, user.password_hash.clone()).await? {
        return Err(invalid());
    }

    let token = state.tokens.issue(user.id, &user.username)?;
    tracing::info!(user_id = %user.id, "user signed in");

    Ok(Json(SigninResponse {
        message: "Signin successful".to_string(),
        token,
    }))
}

/// add_content
///
/// [Authenticated Route] Stores a bookmark owned by the caller. The insert is awaited,
/// so a 200 means the item is visible to the next list call.
#[utoipa::path(
    post,
    path = "/api/v1/content",
    request_body = CreateContentRequest,
    responses(
        (status = 200, description = "Content added", body = MessageResponse),
        (status = 400, description = "Missing link", body = MessageResponse)
    )
)]
pub async fn add_content(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateContentRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    if payload.link.trim().is_empty() {
        return Err(ApiError::Validation("Link is required".to_string()));
    }

    let content = state.repo.create_content(id, payload).await?;
    tracing::debug!(content_id = %content.id, user_id = %id, "content added");

    Ok(Json(MessageResponse::new("Content added")))
}

/// list_content
///
/// [Authenticated Route] Everything the caller owns, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/content",
    responses((status = 200, description = "Caller's content", body = ContentListResponse))
)]
pub async fn list_content(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<ContentListResponse>, ApiError> {
    let content = state.repo.list_content(id).await?;
    Ok(Json(ContentListResponse { content }))
}

/// delete_content
///
/// [Authenticated Route] Deletes one of the caller's items. Ownership is established
/// with `OwnedContent::claim` before the store is touched; an unknown or foreign id
/// changes nothing and still answers 200.
#[utoipa::path(
    delete,
    path = "/api/v1/content",
    request_body = DeleteContentRequest,
    responses((status = 200, description = "Deleted content", body = MessageResponse))
)]
pub async fn delete_content(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<DeleteContentRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let owned = state
        .repo
        .get_content(payload.content_id)
        .await?
        .and_then(|content| OwnedContent::claim(content, id));

    match owned {
        Some(owned) => {
            state.repo.delete_content(&owned).await?;
            tracing::debug!(content_id = %owned.id(), user_id = %id, "content deleted");
        }
        None => {
            tracing::debug!(content_id = %payload.content_id, user_id = %id, "no owned content to delete");
        }
    }

    Ok(Json(MessageResponse::new("Deleted content")))
}

/// share_brain
///
/// [Authenticated Route] `{ "share": true }` returns the caller's share hash, creating
/// it on first use; `{ "share": false }` removes the link.
#[utoipa::path(
    post,
    path = "/api/v1/brain/share",
    request_body = ShareRequest,
    responses((status = 200, description = "Hash or removal message", body = ShareResponse))
)]
pub async fn share_brain(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<ShareRequest>,
) -> Result<Json<ShareResponse>, ApiError> {
    if payload.share {
        let hash = share::issue(state.repo.as_ref(), id).await?;
        Ok(Json(ShareResponse::Hash { hash }))
    } else {
        share::revoke(state.repo.as_ref(), id).await?;
        Ok(Json(ShareResponse::Message {
            message: "Removed link".to_string(),
        }))
    }
}

/// get_shared_brain
///
/// [Public Route] The read-only collection behind a share hash. Unknown hashes get a
/// message-only body: 404, or 411 when legacy status codes are configured.
#[utoipa::path(
    get,
    path = "/api/v1/brain/{shareLink}",
    params(("shareLink" = String, Path, description = "Share hash")),
    responses(
        (status = 200, description = "Shared collection", body = SharedBrainResponse),
        (status = 404, description = "Unknown share hash", body = MessageResponse)
    )
)]
pub async fn get_shared_brain(
    State(state): State<AppState>,
    Path(hash): Path<String>,
) -> Result<Json<SharedBrainResponse>, ApiError> {
    let legacy = state.config.legacy_status_codes;

    let Some(link) = state.repo.find_share_link(&hash).await? else {
        return Err(if legacy {
            ApiError::IncorrectInput("Sorry incorrect input".to_string())
        } else {
            ApiError::NotFound("Share link not found".to_string())
        });
    };

    let Some(user) = state.repo.get_user(link.user_id).await? else {
        let message = "User not found".to_string();
        return Err(if legacy {
            ApiError::IncorrectInput(message)
        } else {
            ApiError::NotFound(message)
        });
    };

    let content = state.repo.list_content(user.id).await?;

    Ok(Json(SharedBrainResponse {
        username: user.username,
        content,
    }))
}
