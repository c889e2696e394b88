/// Post aggregate persistence
///
/// The `*_aggregate` functions each own exactly one transaction. Helpers that
/// take `&mut PgConnection` are building blocks meant to run inside one of
/// those transactions and never commit on their own.
use crate::error::{foreign_key_violated, AppError, Result};
use crate::models::{
    Comment, ContentBlock, Like, NewContentBlock, Post, PostDetail, PostWithContents, View,
};
use sqlx::{PgConnection, PgPool};
use std::collections::HashMap;

/// Foreign keys from child rows to `posts`; a violation of one of these
/// means the post is gone.
const COMMENT_POST_FKEY: &str = "comments_post_id_fkey";
const LIKE_POST_FKEY: &str = "likes_post_id_fkey";

/// Dependents removed before the post row itself, children first.
const CASCADE_DELETES: [(&str, &str); 4] = [
    ("post_contents", "DELETE FROM post_contents WHERE post_id = $1"),
    ("comments", "DELETE FROM comments WHERE post_id = $1"),
    ("likes", "DELETE FROM likes WHERE post_id = $1"),
    ("post_views", "DELETE FROM post_views WHERE post_id = $1"),
];

const SNAPSHOT_ISOLATION: &str = "SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY";

// =====================================================================
// Aggregate writes
// =====================================================================

/// Insert a post and its blocks in one transaction.
pub async fn create_post_aggregate(
    pool: &PgPool,
    owner_id: i64,
    title: &str,
    blocks: &[NewContentBlock],
) -> Result<PostWithContents> {
    let mut tx = pool.begin().await?;

    let post = sqlx::query_as::<_, Post>(
        r#"
        INSERT INTO posts (user_id, title)
        VALUES ($1, $2)
        RETURNING id, user_id, title, created_at, updated_at
        "#,
    )
    .bind(owner_id)
    .bind(title)
    .fetch_one(&mut *tx)
    .await?;

    insert_contents(&mut tx, post.id, blocks).await?;
    let contents = fetch_contents(&mut tx, post.id).await?;

    tx.commit().await?;

    Ok(PostWithContents { post, contents })
}

/// Retitle a post and, when `blocks` is given, swap its whole block set, all
/// in one transaction. `None` leaves the existing blocks in place;
/// `Some(&[])` clears them.
///
/// The post row is locked first, so concurrent replaces/deletes of the same
/// post run one after another instead of interleaving their delete and
/// insert phases.
pub async fn replace_post_aggregate(
    pool: &PgPool,
    post_id: i64,
    title: &str,
    blocks: Option<&[NewContentBlock]>,
) -> Result<Option<PostWithContents>> {
    let mut tx = pool.begin().await?;

    if !lock_post(&mut tx, post_id).await? {
        return Ok(None);
    }

    let post = sqlx::query_as::<_, Post>(
        r#"
        UPDATE posts
        SET title = $2, updated_at = NOW()
        WHERE id = $1
        RETURNING id, user_id, title, created_at, updated_at
        "#,
    )
    .bind(post_id)
    .bind(title)
    .fetch_one(&mut *tx)
    .await?;

    if let Some(blocks) = blocks {
        let removed = sqlx::query("DELETE FROM post_contents WHERE post_id = $1")
            .bind(post_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        insert_contents(&mut tx, post_id, blocks).await?;

        tracing::debug!(
            post_id,
            removed_blocks = removed,
            inserted_blocks = blocks.len(),
            "post content replaced"
        );
    }

    let contents = fetch_contents(&mut tx, post_id).await?;

    tx.commit().await?;

    Ok(Some(PostWithContents { post, contents }))
}

/// Delete a post and everything that references it in one transaction.
pub async fn delete_post_aggregate(pool: &PgPool, post_id: i64) -> Result<bool> {
    let mut tx = pool.begin().await?;

    if !lock_post(&mut tx, post_id).await? {
        return Ok(false);
    }

    for (table, statement) in CASCADE_DELETES {
        let rows = sqlx::query(statement)
            .bind(post_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        tracing::debug!(post_id, table, rows, "cascade delete");
    }

    sqlx::query("DELETE FROM posts WHERE id = $1")
        .bind(post_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(true)
}

// =====================================================================
// Aggregate reads
// =====================================================================

/// Read one aggregate inside a repeatable-read snapshot.
pub async fn load_post_detail(pool: &PgPool, post_id: i64) -> Result<Option<PostDetail>> {
    let mut tx = pool.begin().await?;
    sqlx::query(SNAPSHOT_ISOLATION).execute(&mut *tx).await?;

    let post = sqlx::query_as::<_, Post>(
        r#"
        SELECT id, user_id, title, created_at, updated_at
        FROM posts
        WHERE id = $1
        "#,
    )
    .bind(post_id)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(post) = post else {
        return Ok(None);
    };

    let ids = [post_id];
    let contents = fetch_contents_for(&mut tx, &ids).await?;
    let comments = fetch_comments_for(&mut tx, &ids).await?;
    let likes = fetch_likes_for(&mut tx, &ids).await?;
    let views = fetch_views_for(&mut tx, &ids).await?;

    tx.commit().await?;

    Ok(Some(PostDetail {
        post,
        contents,
        comments,
        likes,
        views,
    }))
}

/// Read every aggregate, ordered by post id, inside one snapshot.
pub async fn list_post_details(pool: &PgPool) -> Result<Vec<PostDetail>> {
    let mut tx = pool.begin().await?;
    sqlx::query(SNAPSHOT_ISOLATION).execute(&mut *tx).await?;

    let posts = sqlx::query_as::<_, Post>(
        r#"
        SELECT id, user_id, title, created_at, updated_at
        FROM posts
        ORDER BY id
        "#,
    )
    .fetch_all(&mut *tx)
    .await?;

    if posts.is_empty() {
        tx.commit().await?;
        return Ok(Vec::new());
    }

    let ids: Vec<i64> = posts.iter().map(|p| p.id).collect();
    let mut contents = group_by_post(fetch_contents_for(&mut tx, &ids).await?, |c| c.post_id);
    let mut comments = group_by_post(fetch_comments_for(&mut tx, &ids).await?, |c| c.post_id);
    let mut likes = group_by_post(fetch_likes_for(&mut tx, &ids).await?, |l| l.post_id);
    let mut views = group_by_post(fetch_views_for(&mut tx, &ids).await?, |v| v.post_id);

    tx.commit().await?;

    Ok(posts
        .into_iter()
        .map(|post| PostDetail {
            contents: contents.remove(&post.id).unwrap_or_default(),
            comments: comments.remove(&post.id).unwrap_or_default(),
            likes: likes.remove(&post.id).unwrap_or_default(),
            views: views.remove(&post.id).unwrap_or_default(),
            post,
        })
        .collect())
}

// =====================================================================
// Append-only children
// =====================================================================

/// `None` when the post does not exist (or is deleted concurrently).
pub async fn insert_comment(
    pool: &PgPool,
    post_id: i64,
    user_id: i64,
    body: &str,
) -> Result<Option<Comment>> {
    let result = sqlx::query_as::<_, Comment>(
        r#"
        INSERT INTO comments (post_id, user_id, body)
        SELECT $1, $2, $3
        WHERE EXISTS (SELECT 1 FROM posts WHERE id = $1)
        RETURNING id, post_id, user_id, body, created_at
        "#,
    )
    .bind(post_id)
    .bind(user_id)
    .bind(body)
    .fetch_optional(pool)
    .await;

    absent_on_post_fk_violation(result, COMMENT_POST_FKEY)
}

/// `None` when the post does not exist. A repeat like returns the original row.
pub async fn insert_like(pool: &PgPool, post_id: i64, user_id: i64) -> Result<Option<Like>> {
    let result = sqlx::query_as::<_, Like>(
        r#"
        INSERT INTO likes (post_id, user_id)
        SELECT $1, $2
        WHERE EXISTS (SELECT 1 FROM posts WHERE id = $1)
        ON CONFLICT (post_id, user_id) DO UPDATE SET post_id = EXCLUDED.post_id
        RETURNING id, post_id, user_id, created_at
        "#,
    )
    .bind(post_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await;

    absent_on_post_fk_violation(result, LIKE_POST_FKEY)
}

// =====================================================================
// Transaction building blocks
// =====================================================================

/// Take the row lock on `posts.id`; false when no such post exists.
pub async fn lock_post(conn: &mut PgConnection, post_id: i64) -> Result<bool> {
    let row = sqlx::query_as::<_, (i64,)>("SELECT id FROM posts WHERE id = $1 FOR UPDATE")
        .bind(post_id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(row.is_some())
}

/// Insert blocks with positions 0..n in submission order.
pub async fn insert_contents(
    conn: &mut PgConnection,
    post_id: i64,
    blocks: &[NewContentBlock],
) -> Result<()> {
    for (position, block) in blocks.iter().enumerate() {
        let position = i32::try_from(position)
            .map_err(|_| AppError::Validation("Too many content blocks".to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO post_contents (post_id, position, block_type, data)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(post_id)
        .bind(position)
        .bind(&block.block_type)
        .bind(&block.data)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

pub async fn fetch_contents(conn: &mut PgConnection, post_id: i64) -> Result<Vec<ContentBlock>> {
    fetch_contents_for(conn, &[post_id]).await
}

async fn fetch_contents_for(conn: &mut PgConnection, post_ids: &[i64]) -> Result<Vec<ContentBlock>> {
    let rows = sqlx::query_as::<_, ContentBlock>(
        r#"
        SELECT id, post_id, position, block_type, data
        FROM post_contents
        WHERE post_id = ANY($1)
        ORDER BY post_id, position
        "#,
    )
    .bind(post_ids)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows)
}

async fn fetch_comments_for(conn: &mut PgConnection, post_ids: &[i64]) -> Result<Vec<Comment>> {
    let rows = sqlx::query_as::<_, Comment>(
        r#"
        SELECT id, post_id, user_id, body, created_at
        FROM comments
        WHERE post_id = ANY($1)
        ORDER BY post_id, id
        "#,
    )
    .bind(post_ids)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows)
}

async fn fetch_likes_for(conn: &mut PgConnection, post_ids: &[i64]) -> Result<Vec<Like>> {
    let rows = sqlx::query_as::<_, Like>(
        r#"
        SELECT id, post_id, user_id, created_at
        FROM likes
        WHERE post_id = ANY($1)
        ORDER BY post_id, id
        "#,
    )
    .bind(post_ids)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows)
}

async fn fetch_views_for(conn: &mut PgConnection, post_ids: &[i64]) -> Result<Vec<View>> {
    let rows = sqlx::query_as::<_, View>(
        r#"
        SELECT id, post_id, viewer_id, viewed_at
        FROM post_views
        WHERE post_id = ANY($1)
        ORDER BY post_id, id
        "#,
    )
    .bind(post_ids)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows)
}

fn group_by_post<T>(rows: Vec<T>, post_id: impl Fn(&T) -> i64) -> HashMap<i64, Vec<T>> {
    let mut grouped: HashMap<i64, Vec<T>> = HashMap::new();
    for row in rows {
        grouped.entry(post_id(&row)).or_default().push(row);
    }
    grouped
}

/// Map a violation of `post_fkey` to `None`. Any other foreign key (e.g. the
/// acting user no longer exists) stays an error.
fn absent_on_post_fk_violation<T>(
    result: std::result::Result<Option<T>, sqlx::Error>,
    post_fkey: &str,
) -> Result<Option<T>> {
    match result {
        Ok(row) => Ok(row),
        Err(e) if foreign_key_violated(&e) == Some(post_fkey) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_by_post_keeps_order() {
        let rows = vec![(1, "a"), (2, "x"), (1, "b"), (1, "c")];
        let grouped = group_by_post(rows, |r| r.0);

        let first: Vec<&str> = grouped[&1].iter().map(|r| r.1).collect();
        assert_eq!(first, vec!["a", "b", "c"]);
        assert_eq!(grouped[&2].len(), 1);
        assert!(!grouped.contains_key(&3));
    }

    #[test]
    fn test_cascade_order_ends_with_children_only() {
        let tables: Vec<&str> = CASCADE_DELETES.iter().map(|(t, _)| *t).collect();
        assert_eq!(tables, vec!["post_contents", "comments", "likes", "post_views"]);
        assert!(CASCADE_DELETES
            .iter()
            .all(|(_, sql)| sql.contains("WHERE post_id = $1")));
    }
}
