//! In-memory Persistence Gateway.
//!
//! Implements the same contract as the PostgreSQL repository so handlers and
//! routers can be exercised without a database. A transaction takes the store's
//! lock for its whole lifetime and works on a private copy: `commit` publishes the
//! copy, dropping the unit discards it.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::models::{Comment, CommentRecord, NewUser, Post, PostRecord, User, UserRecord};
use crate::repository::{RepoError, Repository, UnitOfWork};

#[derive(Clone)]
struct Row<T> {
    record: T,
    deleted_at: Option<DateTime<Utc>>,
}

impl<T> Row<T> {
    fn new(record: T) -> Self {
        Self {
            record,
            deleted_at: None,
        }
    }

    fn live(&self) -> Option<&T> {
        self.deleted_at.is_none().then_some(&self.record)
    }
}

#[derive(Clone, Default)]
struct Store {
    users: Vec<Row<UserRecord>>,
    posts: Vec<Row<PostRecord>>,
    comments: Vec<Row<CommentRecord>>,
    last_user_id: i64,
    last_post_id: i64,
    last_comment_id: i64,
}

impl Store {
    /// Owner of a post or comment. A soft-deleted user still owns their content.
    fn owner(&self, id: i64) -> Option<User> {
        self.users
            .iter()
            .find(|u| u.record.id == id)
            .map(|u| User::from(u.record.clone()))
    }

    fn post(&self, id: i64) -> Option<&PostRecord> {
        self.posts.iter().filter_map(Row::live).find(|p| p.id == id)
    }

    fn post_with_owner(&self, record: &PostRecord) -> Option<Post> {
        let owner = self.owner(record.user_id)?;
        Some(Post::from_parts(record.clone(), owner))
    }

    /// Live comments of `post_id`, only while the post itself is live.
    fn comments_of(&self, post_id: i64, with_owner: bool) -> Vec<Comment> {
        if self.post(post_id).is_none() {
            return Vec::new();
        }
        self.comments
            .iter()
            .filter_map(Row::live)
            .filter(|c| c.post_id == post_id)
            .filter_map(|c| {
                let owner = self.owner(c.user_id)?;
                Some(Comment::from_parts(c.clone(), with_owner.then_some(owner)))
            })
            .collect()
    }
}

/// InMemoryRepository
///
/// Cheap to clone; clones share the same store.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    store: Arc<Mutex<Store>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, RepoError> {
        let guard = Arc::clone(&self.store).lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryUnitOfWork { guard, working }))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, RepoError> {
        let store = self.store.lock().await;
        Ok(store
            .users
            .iter()
            .filter_map(Row::live)
            .find(|u| u.email == email)
            .cloned())
    }

    async fn count_users(&self) -> Result<i64, RepoError> {
        let store = self.store.lock().await;
        Ok(store.users.len() as i64)
    }

    async fn list_posts(&self) -> Result<Vec<Post>, RepoError> {
        let store = self.store.lock().await;
        Ok(store
            .posts
            .iter()
            .filter_map(Row::live)
            .filter_map(|record| {
                let mut post = store.post_with_owner(record)?;
                post.comments = store.comments_of(record.id, false);
                Some(post)
            })
            .collect())
    }

    async fn get_post(&self, id: i64) -> Result<Option<Post>, RepoError> {
        let store = self.store.lock().await;
        Ok(store.post(id).and_then(|record| {
            let mut post = store.post_with_owner(record)?;
            post.comments = store.comments_of(id, true);
            Some(post)
        }))
    }

    async fn post_exists(&self, id: i64) -> Result<bool, RepoError> {
        Ok(self.store.lock().await.post(id).is_some())
    }

    async fn list_comments(&self, post_id: i64) -> Result<Vec<Comment>, RepoError> {
        Ok(self.store.lock().await.comments_of(post_id, true))
    }
}

struct MemoryUnitOfWork {
    guard: OwnedMutexGuard<Store>,
    working: Store,
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    async fn create_user(&mut self, user: NewUser) -> Result<UserRecord, RepoError> {
        // Mirrors the unique index: soft-deleted rows still hold their address.
        if self.working.users.iter().any(|u| u.record.email == user.email) {
            return Err(RepoError::UniqueViolation);
        }
        self.working.last_user_id += 1;
        let now = Utc::now();
        let record = UserRecord {
            id: self.working.last_user_id,
            email: user.email,
            password_hash: user.password_hash,
            name: user.name,
            created_at: now,
            updated_at: now,
        };
        self.working.users.push(Row::new(record.clone()));
        Ok(record)
    }

    async fn soft_delete_user(&mut self, id: i64) -> Result<(), RepoError> {
        if let Some(row) = self
            .working
            .users
            .iter_mut()
            .find(|u| u.record.id == id && u.deleted_at.is_none())
        {
            row.deleted_at = Some(Utc::now());
        }
        Ok(())
    }

    async fn find_post_for_update(&mut self, id: i64) -> Result<Option<PostRecord>, RepoError> {
        Ok(self.working.post(id).cloned())
    }

    async fn find_post_for_share(&mut self, id: i64) -> Result<Option<PostRecord>, RepoError> {
        Ok(self.working.post(id).cloned())
    }

    async fn insert_post(
        &mut self,
        user_id: i64,
        title: &str,
        content: &str,
    ) -> Result<PostRecord, RepoError> {
        self.working.last_post_id += 1;
        let now = Utc::now();
        let record = PostRecord {
            id: self.working.last_post_id,
            title: title.to_string(),
            content: content.to_string(),
            user_id,
            created_at: now,
            updated_at: now,
        };
        self.working.posts.push(Row::new(record.clone()));
        Ok(record)
    }

    async fn update_post(&mut self, id: i64, title: &str, content: &str) -> Result<(), RepoError> {
        if let Some(row) = self
            .working
            .posts
            .iter_mut()
            .find(|p| p.record.id == id && p.deleted_at.is_none())
        {
            row.record.title = title.to_string();
            row.record.content = content.to_string();
            row.record.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn soft_delete_post(&mut self, id: i64) -> Result<(), RepoError> {
        let now = Utc::now();
        let Some(row) = self
            .working
            .posts
            .iter_mut()
            .find(|p| p.record.id == id && p.deleted_at.is_none())
        else {
            return Ok(());
        };
        row.deleted_at = Some(now);

        // Same effect as the posts_soft_delete_cascade trigger.
        for comment in self
            .working
            .comments
            .iter_mut()
            .filter(|c| c.record.post_id == id && c.deleted_at.is_none())
        {
            comment.deleted_at = Some(now);
        }
        Ok(())
    }

    async fn load_post_with_owner(&mut self, id: i64) -> Result<Option<Post>, RepoError> {
        Ok(self
            .working
            .post(id)
            .and_then(|record| self.working.post_with_owner(record)))
    }

    async fn find_comment_for_update(
        &mut self,
        post_id: i64,
        comment_id: i64,
    ) -> Result<Option<CommentRecord>, RepoError> {
        Ok(self
            .working
            .comments
            .iter()
            .filter_map(Row::live)
            .find(|c| c.id == comment_id && c.post_id == post_id)
            .cloned())
    }

    async fn insert_comment(
        &mut self,
        post_id: i64,
        user_id: i64,
        content: &str,
    ) -> Result<CommentRecord, RepoError> {
        self.working.last_comment_id += 1;
        let now = Utc::now();
        let record = CommentRecord {
            id: self.working.last_comment_id,
            content: content.to_string(),
            user_id,
            post_id,
            created_at: now,
            updated_at: now,
        };
        self.working.comments.push(Row::new(record.clone()));
        Ok(record)
    }

    async fn soft_delete_comment(&mut self, id: i64) -> Result<(), RepoError> {
        if let Some(row) = self
            .working
            .comments
            .iter_mut()
            .find(|c| c.record.id == id && c.deleted_at.is_none())
        {
            row.deleted_at = Some(Utc::now());
        }
        Ok(())
    }

    async fn load_comment_with_owner(&mut self, id: i64) -> Result<Option<Comment>, RepoError> {
        let Some(record) = self
            .working
            .comments
            .iter()
            .filter_map(Row::live)
            .find(|c| c.id == id)
            .cloned()
        else {
            return Ok(None);
        };
        if self.working.post(record.post_id).is_none() {
            return Ok(None);
        }
        Ok(self
            .working
            .owner(record.user_id)
            .map(|owner| Comment::from_parts(record, Some(owner))))
    }

    async fn commit(self: Box<Self>) -> Result<(), RepoError> {
        let Self { mut guard, working } = *self;
        *guard = working;
        Ok(())
    }
}
