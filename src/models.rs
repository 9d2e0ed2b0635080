use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;

// --- Storage Rows (Mapped to Database, never serialized outward) ---

/// UserRecord
///
/// A live row of the `users` table, including the password hash. Only the
/// Persistence Gateway and the auth handlers see this type; responses use [`User`].
#[derive(Debug, Clone, FromRow)]
pub struct UserRecord {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// PostRecord
///
/// A live row of the `posts` table. `user_id` is written once at insert time.
#[derive(Debug, Clone, FromRow)]
pub struct PostRecord {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// CommentRecord
///
/// A live row of the `comments` table. Comments are immutable after insert.
#[derive(Debug, Clone, FromRow)]
pub struct CommentRecord {
    pub id: i64,
    pub content: String,
    pub user_id: i64,
    pub post_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Values needed to insert a user; the password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub name: String,
}

// --- Response Shapes (Output Schemas) ---

/// User
///
/// Public representation of a user. The password hash has no field here, so it
/// cannot leak through serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct User {
    #[ts(type = "number")]
    pub id: i64,
    pub email: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserRecord> for User {
    fn from(record: UserRecord) -> Self {
        Self {
            id: record.id,
            email: record.email,
            name: record.name,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// Post
///
/// A post with its owner embedded. `comments` is filled by the read endpoints
/// and left empty by create/update responses.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct Post {
    #[ts(type = "number")]
    pub id: i64,
    pub title: String,
    pub content: String,
    #[ts(type = "number")]
    pub user_id: i64,
    pub user: User,
    #[serde(default)]
    pub comments: Vec<Comment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    pub fn from_parts(record: PostRecord, owner: User) -> Self {
        Self {
            id: record.id,
            title: record.title,
            content: record.content,
            user_id: record.user_id,
            user: owner,
            comments: Vec::new(),
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// Comment
///
/// A comment, optionally with its owner attached. The post listing omits
/// comment owners; single-post and comment endpoints include them.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct Comment {
    #[ts(type = "number")]
    pub id: i64,
    pub content: String,
    #[ts(type = "number")]
    pub user_id: i64,
    #[ts(type = "number")]
    pub post_id: i64,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    #[ts(optional)]
    pub user: Option<User>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Comment {
    pub fn from_parts(record: CommentRecord, owner: Option<User>) -> Self {
        Self {
            id: record.id,
            content: record.content,
            user_id: record.user_id,
            post_id: record.post_id,
            user: owner,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// AuthResponse
///
/// Returned by register and login: a fresh bearer token plus the public user.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

/// MessageResponse
///
/// Confirmation body for deletions, e.g. `{"message": "Post deleted successfully"}`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

/// ErrorResponse
///
/// Shape of every error body. Documented for the OpenAPI schema; handlers
/// produce it through `ApiError`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ErrorResponse {
    pub error: String,
}

// --- Request Payloads (Input Schemas) ---

/// RegisterRequest
///
/// Input payload for POST /api/register. Missing fields decode as empty strings so
/// the validator, not the JSON decoder, reports which one is required.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub name: String,
}

/// LoginRequest
///
/// Input payload for POST /api/login.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// PostRequest
///
/// Input payload for creating (POST) and replacing (PUT) a post.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct PostRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
}

/// CommentRequest
///
/// Input payload for POST /api/posts/{post_id}/comments.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct CommentRequest {
    #[serde(default)]
    pub content: String,
}

/// HealthResponse
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}
