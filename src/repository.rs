use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use thiserror::Error;

use crate::models::{
    Comment, CommentRecord, NewUser, Post, PostRecord, User, UserRecord,
};

/// Errors surfaced by the Persistence Gateway.
#[derive(Debug, Error)]
pub enum RepoError {
    /// A unique constraint rejected the write (e.g. duplicate email).
    #[error("unique constraint violated")]
    UniqueViolation,
    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),
}

impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => Self::UniqueViolation,
            _ => Self::Database(err),
        }
    }
}

/// Repository Trait
///
/// Read-side contract plus the entry point for transactional writes. Soft-deleted
/// rows never come back from any method; callers do not filter them. A user's
/// soft deletion only blocks their login: their posts and comments stay visible
/// with the owner attached.
///
/// **Send + Sync + async_trait** keep `Arc<dyn Repository>` shareable across
/// Axum's request tasks.
#[async_trait]
pub trait Repository: Send + Sync {
    /// Opens a datastore transaction. See [`UnitOfWork`].
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, RepoError>;

    // --- User/Auth ---
    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, RepoError>;
    async fn count_users(&self) -> Result<i64, RepoError>;

    // --- Post Retrieval ---
    /// All posts with owners and comments (comment owners not attached).
    async fn list_posts(&self) -> Result<Vec<Post>, RepoError>;
    /// One post with owner and comments, each comment with its owner.
    async fn get_post(&self, id: i64) -> Result<Option<Post>, RepoError>;
    async fn post_exists(&self, id: i64) -> Result<bool, RepoError>;

    // --- Comment Retrieval ---
    /// Comments of a live post, owners attached, oldest first.
    async fn list_comments(&self, post_id: i64) -> Result<Vec<Comment>, RepoError>;
}

/// UnitOfWork
///
/// One datastore transaction. Every write plus the reads that guard it (existence,
/// ownership) go through the same unit. Only [`UnitOfWork::commit`] publishes the
/// writes; dropping the unit on any other path rolls everything back.
#[async_trait]
pub trait UnitOfWork: Send {
    async fn create_user(&mut self, user: NewUser) -> Result<UserRecord, RepoError>;
    /// The email stays reserved by the unique index.
    async fn soft_delete_user(&mut self, id: i64) -> Result<(), RepoError>;

    /// Loads a live post and locks it against concurrent writers.
    async fn find_post_for_update(&mut self, id: i64) -> Result<Option<PostRecord>, RepoError>;
    /// Like `find_post_for_update`, but only blocks concurrent updates/deletes.
    async fn find_post_for_share(&mut self, id: i64) -> Result<Option<PostRecord>, RepoError>;
    async fn insert_post(
        &mut self,
        user_id: i64,
        title: &str,
        content: &str,
    ) -> Result<PostRecord, RepoError>;
    /// Replaces title and content. The owner is never touched.
    async fn update_post(&mut self, id: i64, title: &str, content: &str) -> Result<(), RepoError>;
    /// Soft-deletes the post; the datastore cascades to its comments.
    async fn soft_delete_post(&mut self, id: i64) -> Result<(), RepoError>;
    async fn load_post_with_owner(&mut self, id: i64) -> Result<Option<Post>, RepoError>;

    /// Loads a live comment only if it belongs to `post_id`, locked for update.
    async fn find_comment_for_update(
        &mut self,
        post_id: i64,
        comment_id: i64,
    ) -> Result<Option<CommentRecord>, RepoError>;
    async fn insert_comment(
        &mut self,
        post_id: i64,
        user_id: i64,
        content: &str,
    ) -> Result<CommentRecord, RepoError>;
    async fn soft_delete_comment(&mut self, id: i64) -> Result<(), RepoError>;
    async fn load_comment_with_owner(&mut self, id: i64) -> Result<Option<Comment>, RepoError>;

    async fn commit(self: Box<Self>) -> Result<(), RepoError>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;

// --- SQL fragments ---

const USER_COLUMNS: &str = "id, email, password_hash, name, created_at, updated_at";
const POST_COLUMNS: &str = "id, title, content, user_id, created_at, updated_at";
const COMMENT_COLUMNS: &str = "id, content, user_id, post_id, created_at, updated_at";

/// Post joined with its owner; the owner columns carry an `owner_` prefix. The
/// owner's `deleted_at` is not filtered.
const POST_WITH_OWNER: &str = r#"
    SELECT p.id, p.title, p.content, p.user_id, p.created_at, p.updated_at,
           u.email AS owner_email, u.name AS owner_name,
           u.created_at AS owner_created_at, u.updated_at AS owner_updated_at
    FROM posts p
    JOIN users u ON u.id = p.user_id
    WHERE p.deleted_at IS NULL
"#;

/// Live comments of live posts joined with their owner.
const COMMENT_WITH_OWNER: &str = r#"
    SELECT c.id, c.content, c.user_id, c.post_id, c.created_at, c.updated_at,
           u.email AS owner_email, u.name AS owner_name,
           u.created_at AS owner_created_at, u.updated_at AS owner_updated_at
    FROM comments c
    JOIN posts p ON p.id = c.post_id AND p.deleted_at IS NULL
    JOIN users u ON u.id = c.user_id
    WHERE c.deleted_at IS NULL
"#;

#[derive(FromRow)]
struct PostOwnerRow {
    #[sqlx(flatten)]
    post: PostRecord,
    owner_email: String,
    owner_name: String,
    owner_created_at: DateTime<Utc>,
    owner_updated_at: DateTime<Utc>,
}

impl From<PostOwnerRow> for Post {
    fn from(row: PostOwnerRow) -> Self {
        let owner = User {
            id: row.post.user_id,
            email: row.owner_email,
            name: row.owner_name,
            created_at: row.owner_created_at,
            updated_at: row.owner_updated_at,
        };
        Post::from_parts(row.post, owner)
    }
}

#[derive(FromRow)]
struct CommentOwnerRow {
    #[sqlx(flatten)]
    comment: CommentRecord,
    owner_email: String,
    owner_name: String,
    owner_created_at: DateTime<Utc>,
    owner_updated_at: DateTime<Utc>,
}

impl From<CommentOwnerRow> for Comment {
    fn from(row: CommentOwnerRow) -> Self {
        let owner = User {
            id: row.comment.user_id,
            email: row.owner_email,
            name: row.owner_name,
            created_at: row.owner_created_at,
            updated_at: row.owner_updated_at,
        };
        Comment::from_parts(row.comment, Some(owner))
    }
}

/// PostgresRepository
///
/// The concrete implementation of the `Repository` trait, backed by PostgreSQL.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, RepoError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PostgresUnitOfWork { tx }))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, RepoError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1 AND deleted_at IS NULL");
        Ok(sqlx::query_as::<_, UserRecord>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn count_users(&self) -> Result<i64, RepoError> {
        Ok(sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?)
    }

    /// list_posts
    ///
    /// Two explicit queries: posts joined with owners, then every live comment of
    /// those posts in one `ANY($1)` round trip, grouped in memory.
    async fn list_posts(&self) -> Result<Vec<Post>, RepoError> {
        let sql = format!("{POST_WITH_OWNER} ORDER BY p.id");
        let mut posts: Vec<Post> = sqlx::query_as::<_, PostOwnerRow>(&sql)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Post::from)
            .collect();

        let ids: Vec<i64> = posts.iter().map(|p| p.id).collect();
        let sql = format!(
            "SELECT {COMMENT_COLUMNS} FROM comments \
             WHERE post_id = ANY($1) AND deleted_at IS NULL ORDER BY id"
        );
        let comments = sqlx::query_as::<_, CommentRecord>(&sql)
            .bind(ids.as_slice())
            .fetch_all(&self.pool)
            .await?;

        let mut by_post: HashMap<i64, Vec<Comment>> = HashMap::new();
        for record in comments {
            by_post
                .entry(record.post_id)
                .or_default()
                .push(Comment::from_parts(record, None));
        }
        for post in &mut posts {
            post.comments = by_post.remove(&post.id).unwrap_or_default();
        }
        Ok(posts)
    }

    async fn get_post(&self, id: i64) -> Result<Option<Post>, RepoError> {
        let sql = format!("{POST_WITH_OWNER} AND p.id = $1");
        let Some(row) = sqlx::query_as::<_, PostOwnerRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
        else {
            return Ok(None);
        };

        let mut post = Post::from(row);
        post.comments = self.list_comments(id).await?;
        Ok(Some(post))
    }

    async fn post_exists(&self, id: i64) -> Result<bool, RepoError> {
        Ok(sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM posts WHERE id = $1 AND deleted_at IS NULL)",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn list_comments(&self, post_id: i64) -> Result<Vec<Comment>, RepoError> {
        let sql = format!("{COMMENT_WITH_OWNER} AND c.post_id = $1 ORDER BY c.id");
        Ok(sqlx::query_as::<_, CommentOwnerRow>(&sql)
            .bind(post_id)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Comment::from)
            .collect())
    }
}

/// PostgresUnitOfWork
///
/// Wraps a `sqlx` transaction. `sqlx` rolls back a transaction that is dropped
/// without being committed, which is what makes early returns safe.
struct PostgresUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl UnitOfWork for PostgresUnitOfWork {
    async fn create_user(&mut self, user: NewUser) -> Result<UserRecord, RepoError> {
        let sql = format!(
            "INSERT INTO users (email, password_hash, name) VALUES ($1, $2, $3) \
             RETURNING {USER_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, UserRecord>(&sql)
            .bind(user.email)
            .bind(user.password_hash)
            .bind(user.name)
            .fetch_one(&mut *self.tx)
            .await?)
    }

    async fn soft_delete_user(&mut self, id: i64) -> Result<(), RepoError> {
        sqlx::query(
            "UPDATE users SET deleted_at = NOW(), updated_at = NOW() \
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn find_post_for_update(&mut self, id: i64) -> Result<Option<PostRecord>, RepoError> {
        let sql = format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE id = $1 AND deleted_at IS NULL FOR UPDATE"
        );
        Ok(sqlx::query_as::<_, PostRecord>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?)
    }

    async fn find_post_for_share(&mut self, id: i64) -> Result<Option<PostRecord>, RepoError> {
        let sql = format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE id = $1 AND deleted_at IS NULL FOR SHARE"
        );
        Ok(sqlx::query_as::<_, PostRecord>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?)
    }

    async fn insert_post(
        &mut self,
        user_id: i64,
        title: &str,
        content: &str,
    ) -> Result<PostRecord, RepoError> {
        let sql = format!(
            "INSERT INTO posts (title, content, user_id) VALUES ($1, $2, $3) \
             RETURNING {POST_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, PostRecord>(&sql)
            .bind(title)
            .bind(content)
            .bind(user_id)
            .fetch_one(&mut *self.tx)
            .await?)
    }

    async fn update_post(&mut self, id: i64, title: &str, content: &str) -> Result<(), RepoError> {
        sqlx::query(
            "UPDATE posts SET title = $2, content = $3, updated_at = NOW() \
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(title)
        .bind(content)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn soft_delete_post(&mut self, id: i64) -> Result<(), RepoError> {
        // The posts_soft_delete_cascade trigger marks the comments.
        sqlx::query("UPDATE posts SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn load_post_with_owner(&mut self, id: i64) -> Result<Option<Post>, RepoError> {
        let sql = format!("{POST_WITH_OWNER} AND p.id = $1");
        Ok(sqlx::query_as::<_, PostOwnerRow>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?
            .map(Post::from))
    }

    async fn find_comment_for_update(
        &mut self,
        post_id: i64,
        comment_id: i64,
    ) -> Result<Option<CommentRecord>, RepoError> {
        let sql = format!(
            "SELECT {COMMENT_COLUMNS} FROM comments \
             WHERE id = $1 AND post_id = $2 AND deleted_at IS NULL FOR UPDATE"
        );
        Ok(sqlx::query_as::<_, CommentRecord>(&sql)
            .bind(comment_id)
            .bind(post_id)
            .fetch_optional(&mut *self.tx)
            .await?)
    }

    async fn insert_comment(
        &mut self,
        post_id: i64,
        user_id: i64,
        content: &str,
    ) -> Result<CommentRecord, RepoError> {
        let sql = format!(
            "INSERT INTO comments (content, user_id, post_id) VALUES ($1, $2, $3) \
             RETURNING {COMMENT_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, CommentRecord>(&sql)
            .bind(content)
            .bind(user_id)
            .bind(post_id)
            .fetch_one(&mut *self.tx)
            .await?)
    }

    async fn soft_delete_comment(&mut self, id: i64) -> Result<(), RepoError> {
        sqlx::query("UPDATE comments SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn load_comment_with_owner(&mut self, id: i64) -> Result<Option<Comment>, RepoError> {
        let sql = format!("{COMMENT_WITH_OWNER} AND c.id = $1");
        Ok(sqlx::query_as::<_, CommentOwnerRow>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?
            .map(Comment::from))
    }

    async fn commit(self: Box<Self>) -> Result<(), RepoError> {
        self.tx.commit().await?;
        Ok(())
    }
}
