use crate::models::{
    Content, ContentItem, CreateContentRequest, OwnedContent, ShareLink, User,
};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{FromRow, PgPool};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

// Constraint names declared in `migrations/`. The in-memory store reports the same names.
pub const USERS_USERNAME_KEY: &str = "users_username_key";
pub const SHARE_LINKS_USER_ID_KEY: &str = "share_links_user_id_key";
pub const SHARE_LINKS_HASH_KEY: &str = "share_links_hash_key";
pub const CONTENT_USER_ID_FKEY: &str = "content_user_id_fkey";

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("unique constraint violated: {constraint}")]
    UniqueViolation { constraint: String },

    #[error("foreign key constraint violated: {constraint}")]
    ForeignKeyViolation { constraint: String },

    #[error("database error: {0}")]
    Database(sqlx::Error),
}

impl RepositoryError {
    /// True when this is a uniqueness violation of `constraint`.
    pub fn violates(&self, constraint: &str) -> bool {
        matches!(self, RepositoryError::UniqueViolation { constraint: c } if c == constraint)
    }
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            let constraint = db_err.constraint().unwrap_or_default().to_string();
            if db_err.is_unique_violation() {
                return RepositoryError::UniqueViolation { constraint };
            }
            if db_err.is_foreign_key_violation() {
                return RepositoryError::ForeignKeyViolation { constraint };
            }
        }
        RepositoryError::Database(err)
    }
}

pub type RepoResult<T> = Result<T, RepositoryError>;

/// Repository Trait
///
/// The persistence contract for users, content and share links. Handlers only see
/// this trait, so the Postgres store and the in-memory store are interchangeable.
///
/// **Send + Sync + async_trait** are required to share `Arc<dyn Repository>` across
/// Axum's task boundaries.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users ---
    async fn get_user(&self, id: Uuid) -> RepoResult<Option<User>>;
    async fn find_user_by_username(&self, username: &str) -> RepoResult<Option<User>>;
    // Fails with `UniqueViolation(USERS_USERNAME_KEY)` on a taken username.
    async fn create_user(&self, username: &str, password_hash: &str) -> RepoResult<User>;

    // --- Content ---
    async fn create_content(&self, user_id: Uuid, req: CreateContentRequest)
    -> RepoResult<Content>;
    async fn get_content(&self, id: Uuid) -> RepoResult<Option<Content>>;
    // Newest first, owner resolved to a username.
    async fn list_content(&self, user_id: Uuid) -> RepoResult<Vec<ContentItem>>;
    // Returns true if a row was removed.
    async fn delete_content(&self, owned: &OwnedContent) -> RepoResult<bool>;

    // --- Share Links ---
    async fn get_share_link_for_user(&self, user_id: Uuid) -> RepoResult<Option<ShareLink>>;
    async fn find_share_link(&self, hash: &str) -> RepoResult<Option<ShareLink>>;
    // Fails with `UniqueViolation` on either `SHARE_LINKS_USER_ID_KEY` or `SHARE_LINKS_HASH_KEY`.
    async fn create_share_link(&self, user_id: Uuid, hash: &str) -> RepoResult<ShareLink>;
    async fn delete_share_link(&self, user_id: Uuid) -> RepoResult<bool>;
}

/// RepositoryState
///
/// The shared handle to the persistence layer held by `AppState`.
pub type RepositoryState = Arc<dyn Repository>;

/// Content row joined with its owner's username.
#[derive(FromRow)]
struct ContentWithOwnerRow {
    #[sqlx(flatten)]
    content: Content,
    owner_username: String,
}

/// PostgresRepository
///
/// `Repository` backed by PostgreSQL through a shared connection pool.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn get_user(&self, id: Uuid) -> RepoResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, password_hash, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_user_by_username(&self, username: &str) -> RepoResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, password_hash, created_at FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    /// create_user
    ///
    /// The `users_username_key` constraint is the final word on uniqueness; a concurrent
    /// signup that slipped past the handler's lookup surfaces here as a `UniqueViolation`.
    async fn create_user(&self, username: &str, password_hash: &str) -> RepoResult<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, username, password_hash, created_at)
            VALUES ($1, $2, $3, NOW())
            RETURNING id, username, password_hash, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(username)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await?;
        Ok(user)
    }

    async fn create_content(
        &self,
        user_id: Uuid,
        req: CreateContentRequest,
    ) -> RepoResult<Content> {
        let content = sqlx::query_as::<_, Content>(
            r#"
            INSERT INTO content (id, title, link, type, tags, user_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, NOW())
            RETURNING id, title, link, type, tags, user_id, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(req.title)
        .bind(req.link)
        .bind(req.content_type)
        .bind(Vec::<String>::new())
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(content)
    }

    async fn get_content(&self, id: Uuid) -> RepoResult<Option<Content>> {
        let content = sqlx::query_as::<_, Content>(
            "SELECT id, title, link, type, tags, user_id, created_at FROM content WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(content)
    }

    async fn list_content(&self, user_id: Uuid) -> RepoResult<Vec<ContentItem>> {
        let rows = sqlx::query_as::<_, ContentWithOwnerRow>(
            r#"
            SELECT c.id, c.title, c.link, c.type, c.tags, c.user_id, c.created_at,
                   u.username AS owner_username
            FROM content c
            JOIN users u ON u.id = c.user_id
            WHERE c.user_id = $1
            ORDER BY c.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| ContentItem::from_content(row.content, row.owner_username))
            .collect())
    }

    /// delete_content
    ///
    /// The owner column stays in the filter even though `OwnedContent` was already checked.
    async fn delete_content(&self, owned: &OwnedContent) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM content WHERE id = $1 AND user_id = $2")
            .bind(owned.id())
            .bind(owned.owner())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_share_link_for_user(&self, user_id: Uuid) -> RepoResult<Option<ShareLink>> {
        let link = sqlx::query_as::<_, ShareLink>(
            "SELECT id, hash, user_id, created_at FROM share_links WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(link)
    }

    async fn find_share_link(&self, hash: &str) -> RepoResult<Option<ShareLink>> {
        let link = sqlx::query_as::<_, ShareLink>(
            "SELECT id, hash, user_id, created_at FROM share_links WHERE hash = $1",
        )
        .bind(hash)
        .fetch_optional(&self.pool)
        .await?;
        Ok(link)
    }

    async fn create_share_link(&self, user_id: Uuid, hash: &str) -> RepoResult<ShareLink> {
        let link = sqlx::query_as::<_, ShareLink>(
            r#"
            INSERT INTO share_links (id, hash, user_id, created_at)
            VALUES ($1, $2, $3, NOW())
            RETURNING id, hash, user_id, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(hash)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(link)
    }

    async fn delete_share_link(&self, user_id: Uuid) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM share_links WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[derive(Default)]
struct MemoryTables {
    users: Vec<User>,
    content: Vec<Content>,
    share_links: Vec<ShareLink>,
}

/// InMemoryRepository
///
/// `Repository` held in process memory. Enforces the same uniqueness and owner
/// constraints as the Postgres schema. Used by tests and by local runs without
/// a `DATABASE_URL`; nothing survives a restart.
#[derive(Default)]
pub struct InMemoryRepository {
    tables: RwLock<MemoryTables>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn unique_violation(constraint: &str) -> RepositoryError {
    RepositoryError::UniqueViolation {
        constraint: constraint.to_string(),
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn get_user(&self, id: Uuid) -> RepoResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> RepoResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.username == username).cloned())
    }

    async fn create_user(&self, username: &str, password_hash: &str) -> RepoResult<User> {
        let mut tables = self.tables.write().await;
        if tables.users.iter().any(|u| u.username == username) {
            return Err(unique_violation(USERS_USERNAME_KEY));
        }

        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            created_at: Utc::now(),
        };
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn create_content(
        &self,
        user_id: Uuid,
        req: CreateContentRequest,
    ) -> RepoResult<Content> {
        let mut tables = self.tables.write().await;
        if !tables.users.iter().any(|u| u.id == user_id) {
            return Err(RepositoryError::ForeignKeyViolation {
                constraint: CONTENT_USER_ID_FKEY.to_string(),
            });
        }

        let content = Content {
            id: Uuid::new_v4(),
            title: req.title,
            link: req.link,
            content_type: req.content_type,
            tags: Vec::new(),
            user_id,
            created_at: Utc::now(),
        };
        tables.content.push(content.clone());
        Ok(content)
    }

    async fn get_content(&self, id: Uuid) -> RepoResult<Option<Content>> {
        let tables = self.tables.read().await;
        Ok(tables.content.iter().find(|c| c.id == id).cloned())
    }

    async fn list_content(&self, user_id: Uuid) -> RepoResult<Vec<ContentItem>> {
        let tables = self.tables.read().await;
        let Some(owner) = tables.users.iter().find(|u| u.id == user_id) else {
            return Ok(Vec::new());
        };

        // Insertion order is creation order; reverse for newest first.
        Ok(tables
            .content
            .iter()
            .rev()
            .filter(|c| c.user_id == user_id)
            .map(|c| ContentItem::from_content(c.clone(), owner.username.clone()))
            .collect())
    }

    async fn delete_content(&self, owned: &OwnedContent) -> RepoResult<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.content.len();
        tables
            .content
            .retain(|c| !(c.id == owned.id() && c.user_id == owned.owner()));
        Ok(tables.content.len() < before)
    }

    async fn get_share_link_for_user(&self, user_id: Uuid) -> RepoResult<Option<ShareLink>> {
        let tables = self.tables.read().await;
        Ok(tables.share_links.iter().find(|l| l.user_id == user_id).cloned())
    }

    async fn find_share_link(&self, hash: &str) -> RepoResult<Option<ShareLink>> {
        let tables = self.tables.read().await;
        Ok(tables.share_links.iter().find(|l| l.hash == hash).cloned())
    }

    async fn create_share_link(&self, user_id: Uuid, hash: &str) -> RepoResult<ShareLink> {
        let mut tables = self.tables.write().await;
        if tables.share_links.iter().any(|l| l.hash == hash) {
            return Err(unique_violation(SHARE_LINKS_HASH_KEY));
        }
        if tables.share_links.iter().any(|l| l.user_id == user_id) {
            return Err(unique_violation(SHARE_LINKS_USER_ID_KEY));
        }

        let link = ShareLink {
            id: Uuid::new_v4(),
            hash: hash.to_string(),
            user_id,
            created_at: Utc::now(),
        };
        tables.share_links.push(link.clone());
        Ok(link)
    }

    async fn delete_share_link(&self, user_id: Uuid) -> RepoResult<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.share_links.len();
        tables.share_links.retain(|l| l.user_id != user_id);
        Ok(tables.share_links.len() < before)
    }
}
