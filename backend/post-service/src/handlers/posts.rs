/// Post handlers - HTTP surface of the post aggregate
///
/// Every route requires a session. Mutations accept a title plus a list of
/// typed content blocks; block order in the request is the stored order.
/// An update that omits `contents` changes only the title.
use crate::error::Result;
use crate::handlers::auth::MessageResponse;
use crate::middleware::AuthenticatedUser;
use crate::models::NewContentBlock;
use crate::services::PostService;
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::Value;
use validator::{Validate, ValidationError};

#[derive(Debug, Deserialize, Validate)]
pub struct ContentBlockInput {
    #[serde(rename = "type")]
    #[validate(length(min = 1, max = 64, message = "block type must be 1-64 characters"))]
    pub block_type: String,
    #[validate(custom(function = "validate_block_data"))]
    pub data: Value,
}

/// Create body. A missing `contents` means a post with no blocks.
#[derive(Debug, Deserialize, Validate)]
pub struct CreatePostRequest {
    #[validate(length(min = 1, max = 255, message = "title must be 1-255 characters"))]
    pub title: String,
    #[serde(default)]
    #[validate(nested)]
    pub contents: Vec<ContentBlockInput>,
}

/// Update body. `contents: None` keeps the current blocks; `Some([])` clears them.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdatePostRequest {
    #[validate(length(min = 1, max = 255, message = "title must be 1-255 characters"))]
    pub title: String,
    #[serde(default)]
    #[validate(nested)]
    pub contents: Option<Vec<ContentBlockInput>>,
}

fn into_blocks(contents: Vec<ContentBlockInput>) -> Vec<NewContentBlock> {
    contents
        .into_iter()
        .map(|b| NewContentBlock {
            block_type: b.block_type,
            data: b.data,
        })
        .collect()
}

#[derive(Debug, Deserialize, Validate)]
pub struct CommentRequest {
    #[validate(length(min = 1, max = 10000, message = "comment must be 1-10000 characters"))]
    pub body: String,
}

fn validate_block_data(data: &Value) -> std::result::Result<(), ValidationError> {
    if data.is_null() {
        let mut err = ValidationError::new("block_data");
        err.message = Some("block data must not be null".into());
        return Err(err);
    }
    Ok(())
}

/// POST /create-post
pub async fn create_post(
    user: AuthenticatedUser,
    posts: web::Data<PostService>,
    req: web::Json<CreatePostRequest>,
) -> Result<HttpResponse> {
    let req = req.into_inner();
    req.validate()?;

    let blocks = into_blocks(req.contents);
    let post = posts.create(user.id(), &req.title, &blocks).await?;
    Ok(HttpResponse::Ok().json(post))
}

/// GET /posts
pub async fn list_posts(
    _user: AuthenticatedUser,
    posts: web::Data<PostService>,
) -> Result<HttpResponse> {
    let all = posts.list().await?;
    Ok(HttpResponse::Ok().json(all))
}

/// GET /posts/{post_id}
///
/// Records a view by the caller after the aggregate has been read.
pub async fn get_post(
    user: AuthenticatedUser,
    posts: web::Data<PostService>,
    post_id: web::Path<i64>,
) -> Result<HttpResponse> {
    let post = posts.get(post_id.into_inner(), user.id()).await?;
    Ok(HttpResponse::Ok().json(post))
}

/// PUT /posts/{post_id}
pub async fn update_post(
    _user: AuthenticatedUser,
    posts: web::Data<PostService>,
    post_id: web::Path<i64>,
    req: web::Json<UpdatePostRequest>,
) -> Result<HttpResponse> {
    let req = req.into_inner();
    req.validate()?;

    let blocks = req.contents.map(into_blocks);
    let post = posts
        .update(post_id.into_inner(), &req.title, blocks.as_deref())
        .await?;
    Ok(HttpResponse::Ok().json(post))
}

/// DELETE /posts/{post_id}
pub async fn delete_post(
    _user: AuthenticatedUser,
    posts: web::Data<PostService>,
    post_id: web::Path<i64>,
) -> Result<HttpResponse> {
    posts.delete(post_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(MessageResponse::new("Post deleted")))
}

/// POST /posts/{post_id}/comments
pub async fn add_comment(
    user: AuthenticatedUser,
    posts: web::Data<PostService>,
    post_id: web::Path<i64>,
    req: web::Json<CommentRequest>,
) -> Result<HttpResponse> {
    req.validate()?;

    let comment = posts
        .comment(post_id.into_inner(), user.id(), &req.body)
        .await?;
    Ok(HttpResponse::Ok().json(comment))
}

/// POST /posts/{post_id}/likes
pub async fn add_like(
    user: AuthenticatedUser,
    posts: web::Data<PostService>,
    post_id: web::Path<i64>,
) -> Result<HttpResponse> {
    let like = posts.like(post_id.into_inner(), user.id()).await?;
    Ok(HttpResponse::Ok().json(like))
}
