/// View event persistence
use crate::error::{foreign_key_violated, AppError, Result};
use crate::models::View;
use sqlx::PgPool;

const VIEW_POST_FKEY: &str = "post_views_post_id_fkey";

/// Append one view row. A post deleted in the meantime yields `NotFound`.
pub async fn insert_view(pool: &PgPool, post_id: i64, viewer_id: i64) -> Result<View> {
    sqlx::query_as::<_, View>(
        r#"
        INSERT INTO post_views (post_id, viewer_id)
        VALUES ($1, $2)
        RETURNING id, post_id, viewer_id, viewed_at
        "#,
    )
    .bind(post_id)
    .bind(viewer_id)
    .fetch_one(pool)
    .await
    .map_err(|e| {
        if foreign_key_violated(&e) == Some(VIEW_POST_FKEY) {
            AppError::post_not_found(post_id)
        } else {
            AppError::from(e)
        }
    })
}
