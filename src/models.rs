use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::ApiError;

static USERNAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9_]{3,30}$").expect("username pattern is a valid regex")
});

pub const SIGNUP_INVALID_MESSAGE: &str = "Username can only contain letters, numbers, and underscores and should have size between 3 to 30 characters, Password size must be between 6 to 128 characters";
pub const SIGNIN_INVALID_MESSAGE: &str = "Username and password are required";

// --- Persisted Records ---

/// User
///
/// A row of the `users` table. The password hash never leaves the server.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Content
///
/// A row of the `content` table: one bookmark owned by one user.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Content {
    pub id: Uuid,
    pub title: Option<String>,
    pub link: String,
    // `type` is reserved in Rust.
    #[sqlx(rename = "type")]
    pub content_type: String,
    pub tags: Vec<String>,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// ShareLink
///
/// A row of the `share_links` table. `user_id` is unique: one live link per user.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct ShareLink {
    pub id: Uuid,
    pub hash: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// OwnedContent
///
/// Proof that a caller owns a piece of content. Store mutations on content take this
/// instead of a raw id, so an ownership check always precedes the write.
#[derive(Debug, Clone)]
pub struct OwnedContent {
    content: Content,
}

impl OwnedContent {
    /// Grants the capability only when `caller` is the owner.
    pub fn claim(content: Content, caller: Uuid) -> Option<Self> {
        (content.user_id == caller).then_some(Self { content })
    }

    pub fn id(&self) -> Uuid {
        self.content.id
    }

    pub fn owner(&self) -> Uuid {
        self.content.user_id
    }
}

// --- Request Payloads ---

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct SignupRequest {
    #[schema(example = "alice123")]
    pub username: String,
    #[schema(example = "secret1")]
    pub password: String,
}

impl SignupRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        let password_len = self.password.chars().count();
        if !USERNAME_PATTERN.is_match(&self.username) || !(6..=128).contains(&password_len) {
            return Err(ApiError::Validation(SIGNUP_INVALID_MESSAGE.to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct SigninRequest {
    pub username: String,
    pub password: String,
}

impl SigninRequest {
    /// Shape check only; credentials themselves are judged against the store.
    pub fn validate(&self) -> Result<(), ApiError> {
        let username_len = self.username.chars().count();
        let password_len = self.password.chars().count();
        if !(3..=30).contains(&username_len) || !(1..=128).contains(&password_len) {
            return Err(ApiError::Validation(SIGNIN_INVALID_MESSAGE.to_string()));
        }
        Ok(())
    }
}

/// CreateContentRequest
///
/// Body of POST /content. `type` is a free-form tag such as "video" or "article".
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateContentRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[schema(example = "https://example.com/post")]
    pub link: String,
    #[serde(rename = "type")]
    #[schema(example = "article")]
    pub content_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DeleteContentRequest {
    pub content_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ShareRequest {
    pub share: bool,
}

// --- Response Schemas ---

/// Generic `{ "message": ... }` body used for acknowledgements and every error.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct SigninResponse {
    pub message: String,
    pub token: String,
}

/// Owner reference resolved to a username.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ContentOwner {
    pub id: Uuid,
    pub username: String,
}

/// ContentItem
///
/// A content row as clients see it, with the owner resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ContentItem {
    pub id: Uuid,
    pub title: Option<String>,
    pub link: String,
    #[serde(rename = "type")]
    pub content_type: String,
    pub tags: Vec<String>,
    pub user_id: ContentOwner,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

impl ContentItem {
    pub fn from_content(content: Content, username: String) -> Self {
        Self {
            id: content.id,
            title: content.title,
            link: content.link,
            content_type: content.content_type,
            tags: content.tags,
            user_id: ContentOwner {
                id: content.user_id,
                username,
            },
            created_at: content.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ContentListResponse {
    pub content: Vec<ContentItem>,
}

/// ShareResponse
///
/// `{ "hash": ... }` when sharing is enabled, `{ "message": ... }` when it is revoked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[serde(untagged)]
#[ts(export)]
pub enum ShareResponse {
    Hash { hash: String },
    Message { message: String },
}

/// The public, read-only view of a user's collection.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct SharedBrainResponse {
    pub username: String,
    pub content: Vec<ContentItem>,
}
