/// Persistence layer
///
/// The services talk to storage only through the traits below. `PgStore` is
/// the PostgreSQL implementation; every multi-row aggregate write it performs
/// runs inside one sqlx transaction, so a dropped or failed request rolls the
/// whole unit back.
pub mod pool;
pub mod post_repo;
pub mod user_repo;
pub mod view_repo;

pub use pool::{create_pool, run_migrations};

use crate::error::Result;
use crate::models::{
    Comment, Like, NewContentBlock, NewUser, PostDetail, PostWithContents, User, View,
};
use async_trait::async_trait;
use sqlx::PgPool;

/// Durable user records
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Any user whose username equals `username` or whose email equals `email`.
    async fn find_by_username_or_email(&self, username: &str, email: &str)
        -> Result<Option<User>>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Insert a user. A uniqueness violation surfaces as `AppError::Conflict`.
    async fn insert_user(&self, user: &NewUser) -> Result<User>;
}

/// Post aggregates: a post plus its contents, comments, likes and views
#[async_trait]
pub trait PostStore: Send + Sync {
    /// Insert the post and all blocks as one committed unit.
    async fn create_post(
        &self,
        owner_id: i64,
        title: &str,
        blocks: &[NewContentBlock],
    ) -> Result<PostWithContents>;

    /// Set the title and, when `blocks` is `Some`, replace the block set
    /// wholesale, as one committed unit. `None` when the post does not exist.
    async fn replace_post(
        &self,
        post_id: i64,
        title: &str,
        blocks: Option<&[NewContentBlock]>,
    ) -> Result<Option<PostWithContents>>;

    /// Remove the post and every row referencing it. `false` when the post
    /// does not exist.
    async fn delete_post(&self, post_id: i64) -> Result<bool>;

    /// Consistent snapshot of one aggregate.
    async fn load_post(&self, post_id: i64) -> Result<Option<PostDetail>>;

    /// Consistent snapshot of every aggregate, ordered by post id.
    async fn list_posts(&self) -> Result<Vec<PostDetail>>;

    async fn add_comment(&self, post_id: i64, user_id: i64, body: &str)
        -> Result<Option<Comment>>;

    /// Idempotent per (post, user): liking twice returns the first like.
    async fn add_like(&self, post_id: i64, user_id: i64) -> Result<Option<Like>>;
}

/// Append-only view events
#[async_trait]
pub trait ViewStore: Send + Sync {
    async fn insert_view(&self, post_id: i64, viewer_id: i64) -> Result<View>;
}

/// PostgreSQL-backed implementation of every store trait
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn find_by_username_or_email(
        &self,
        username: &str,
        email: &str,
    ) -> Result<Option<User>> {
        user_repo::find_by_username_or_email(&self.pool, username, email).await
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        user_repo::find_by_username(&self.pool, username).await
    }

    async fn insert_user(&self, user: &NewUser) -> Result<User> {
        user_repo::create_user(&self.pool, user).await
    }
}

#[async_trait]
impl PostStore for PgStore {
    async fn create_post(
        &self,
        owner_id: i64,
        title: &str,
        blocks: &[NewContentBlock],
    ) -> Result<PostWithContents> {
        post_repo::create_post_aggregate(&self.pool, owner_id, title, blocks).await
    }

    async fn replace_post(
        &self,
        post_id: i64,
        title: &str,
        blocks: Option<&[NewContentBlock]>,
    ) -> Result<Option<PostWithContents>> {
        post_repo::replace_post_aggregate(&self.pool, post_id, title, blocks).await
    }

    async fn delete_post(&self, post_id: i64) -> Result<bool> {
        post_repo::delete_post_aggregate(&self.pool, post_id).await
    }

    async fn load_post(&self, post_id: i64) -> Result<Option<PostDetail>> {
        post_repo::load_post_detail(&self.pool, post_id).await
    }

    async fn list_posts(&self) -> Result<Vec<PostDetail>> {
        post_repo::list_post_details(&self.pool).await
    }

    async fn add_comment(
        &self,
        post_id: i64,
        user_id: i64,
        body: &str,
    ) -> Result<Option<Comment>> {
        post_repo::insert_comment(&self.pool, post_id, user_id, body).await
    }

    async fn add_like(&self, post_id: i64, user_id: i64) -> Result<Option<Like>> {
        post_repo::insert_like(&self.pool, post_id, user_id).await
    }
}

#[async_trait]
impl ViewStore for PgStore {
    async fn insert_view(&self, post_id: i64, viewer_id: i64) -> Result<View> {
        view_repo::insert_view(&self.pool, post_id, viewer_id).await
    }
}
