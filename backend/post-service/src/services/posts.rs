/// Post service - the post aggregate (post + contents + comments + likes + views)
///
/// Multi-row writes are delegated to the store as single committed units;
/// this layer adds not-found handling, view recording, metrics and logging.
use crate::db::PostStore;
use crate::error::{AppError, Result};
use crate::metrics::{outcome, POST_AGGREGATE_OPS};
use crate::models::{Comment, Like, NewContentBlock, PostDetail, PostWithContents};
use crate::services::ViewRecorder;
use std::sync::Arc;

#[derive(Clone)]
pub struct PostService {
    posts: Arc<dyn PostStore>,
    views: ViewRecorder,
}

impl PostService {
    pub fn new(posts: Arc<dyn PostStore>, views: ViewRecorder) -> Self {
        Self { posts, views }
    }

    /// Create a post with its content blocks
    pub async fn create(
        &self,
        owner_id: i64,
        title: &str,
        blocks: &[NewContentBlock],
    ) -> Result<PostWithContents> {
        let result = self.posts.create_post(owner_id, title, blocks).await;
        track("create", &result);

        let post = result.map_err(|e| log_failure(e, "create", owner_id))?;
        tracing::info!(
            post_id = post.post.id,
            owner_id,
            blocks = post.contents.len(),
            "post created"
        );
        Ok(post)
    }

    /// Retitle a post. With `Some(blocks)` the block set is replaced
    /// wholesale; with `None` the existing blocks are kept.
    pub async fn update(
        &self,
        post_id: i64,
        title: &str,
        blocks: Option<&[NewContentBlock]>,
    ) -> Result<PostWithContents> {
        let result = self
            .posts
            .replace_post(post_id, title, blocks)
            .await
            .and_then(|post| post.ok_or_else(|| AppError::post_not_found(post_id)));
        track("update", &result);

        let post = result.map_err(|e| log_failure(e, "update", post_id))?;
        tracing::info!(post_id, blocks = post.contents.len(), "post updated");
        Ok(post)
    }

    /// Delete a post together with every record that references it
    pub async fn delete(&self, post_id: i64) -> Result<()> {
        let result = self.posts.delete_post(post_id).await.and_then(|deleted| {
            if deleted {
                Ok(())
            } else {
                Err(AppError::post_not_found(post_id))
            }
        });
        track("delete", &result);

        result.map_err(|e| log_failure(e, "delete", post_id))?;
        tracing::info!(post_id, "post deleted");
        Ok(())
    }

    /// Read one aggregate, then record that `viewer_id` viewed it.
    ///
    /// The snapshot is taken before the view is appended, so it does not
    /// contain the view produced by this call. A failed view insert is logged
    /// and counted but does not fail the read.
    pub async fn get(&self, post_id: i64, viewer_id: i64) -> Result<PostDetail> {
        let result = self
            .posts
            .load_post(post_id)
            .await
            .and_then(|post| post.ok_or_else(|| AppError::post_not_found(post_id)));
        track("get", &result);

        let post = result.map_err(|e| log_failure(e, "get", post_id))?;

        if let Err(e) = self.views.record(post_id, viewer_id).await {
            tracing::warn!(post_id, viewer_id, error = %e, "view recording failed; serving read anyway");
        }

        Ok(post)
    }

    /// Every aggregate, ordered by post id
    pub async fn list(&self) -> Result<Vec<PostDetail>> {
        let result = self.posts.list_posts().await;
        track("list", &result);

        result.map_err(|e| {
            if e.is_internal() {
                tracing::error!(operation = "list", error = %e, "post operation failed");
            }
            e
        })
    }

    pub async fn comment(&self, post_id: i64, user_id: i64, body: &str) -> Result<Comment> {
        let result = self
            .posts
            .add_comment(post_id, user_id, body)
            .await
            .and_then(|c| c.ok_or_else(|| AppError::post_not_found(post_id)));
        track("comment", &result);

        result.map_err(|e| log_failure(e, "comment", post_id))
    }

    pub async fn like(&self, post_id: i64, user_id: i64) -> Result<Like> {
        let result = self
            .posts
            .add_like(post_id, user_id)
            .await
            .and_then(|l| l.ok_or_else(|| AppError::post_not_found(post_id)));
        track("like", &result);

        result.map_err(|e| log_failure(e, "like", post_id))
    }
}

fn track<T>(operation: &str, result: &Result<T>) {
    POST_AGGREGATE_OPS
        .with_label_values(&[operation, outcome(result)])
        .inc();
}

/// Log internal failures with the operation and entity id; pass the error on.
fn log_failure(err: AppError, operation: &'static str, entity_id: i64) -> AppError {
    if err.is_internal() {
        tracing::error!(operation, entity_id, error = %err, "post operation failed");
    }
    err
}
