//! In-memory store for integration tests
//!
//! Implements every persistence trait without PostgreSQL. Each write checks
//! its inputs before touching state, so a rejected write leaves nothing behind
//! (the same all-or-nothing outcome the transactional store gives).

use async_trait::async_trait;
use chrono::Utc;
use post_service::db::{PostStore, UserStore, ViewStore};
use post_service::models::{
    Comment, ContentBlock, Like, NewContentBlock, NewUser, Post, PostDetail, PostWithContents,
    User, View,
};
use post_service::{AppError, Result};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct State {
    users: Vec<User>,
    posts: BTreeMap<i64, Post>,
    contents: Vec<ContentBlock>,
    comments: Vec<Comment>,
    likes: Vec<Like>,
    views: Vec<View>,
    last_id: i64,
    last_post_id: i64,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn detail(&self, post: &Post) -> PostDetail {
        PostDetail {
            post: post.clone(),
            contents: self.contents_of(post.id),
            comments: self
                .comments
                .iter()
                .filter(|c| c.post_id == post.id)
                .cloned()
                .collect(),
            likes: self
                .likes
                .iter()
                .filter(|l| l.post_id == post.id)
                .cloned()
                .collect(),
            views: self
                .views
                .iter()
                .filter(|v| v.post_id == post.id)
                .cloned()
                .collect(),
        }
    }

    fn contents_of(&self, post_id: i64) -> Vec<ContentBlock> {
        let mut blocks: Vec<_> = self
            .contents
            .iter()
            .filter(|b| b.post_id == post_id)
            .cloned()
            .collect();
        blocks.sort_by_key(|b| b.position);
        blocks
    }

    fn push_blocks(&mut self, post_id: i64, blocks: &[NewContentBlock]) {
        for (position, block) in blocks.iter().enumerate() {
            let id = self.next_id();
            self.contents.push(ContentBlock {
                id,
                post_id,
                position: position as i32,
                block_type: block.block_type.clone(),
                data: block.data.clone(),
            });
        }
    }
}

/// Mirrors the `block_type <> ''` check constraint
fn check_blocks(blocks: &[NewContentBlock]) -> Result<()> {
    if blocks.iter().any(|b| b.block_type.is_empty()) {
        return Err(AppError::Database(
            "new row violates check constraint \"post_contents_block_type_check\"".to_string(),
        ));
    }
    Ok(())
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
    fail_views: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent view insert fail
    pub fn fail_views(&self, fail: bool) {
        self.fail_views.store(fail, Ordering::SeqCst);
    }

    pub fn view_count(&self, post_id: i64) -> usize {
        let state = self.state.lock().unwrap();
        state.views.iter().filter(|v| v.post_id == post_id).count()
    }

    /// Rows in any child table that still reference `post_id`
    pub fn rows_referencing(&self, post_id: i64) -> usize {
        let state = self.state.lock().unwrap();
        state.contents.iter().filter(|r| r.post_id == post_id).count()
            + state.comments.iter().filter(|r| r.post_id == post_id).count()
            + state.likes.iter().filter(|r| r.post_id == post_id).count()
            + state.views.iter().filter(|r| r.post_id == post_id).count()
    }

    pub fn post_count(&self) -> usize {
        self.state.lock().unwrap().posts.len()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_username_or_email(
        &self,
        username: &str,
        email: &str,
    ) -> Result<Option<User>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .users
            .iter()
            .find(|u| u.username == username || u.email == email)
            .cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let state = self.state.lock().unwrap();
        Ok(state.users.iter().find(|u| u.username == username).cloned())
    }

    async fn insert_user(&self, user: &NewUser) -> Result<User> {
        let mut state = self.state.lock().unwrap();
        if state
            .users
            .iter()
            .any(|u| u.username == user.username || u.email == user.email)
        {
            return Err(AppError::Conflict(
                "Username or email already exists".to_string(),
            ));
        }

        let id = state.users.len() as i64 + 1;
        let created = User {
            id,
            username: user.username.clone(),
            email: user.email.clone(),
            password_hash: user.password_hash.clone(),
            gender: user.gender.clone(),
            birth_date: user.birth_date,
            created_at: Utc::now(),
        };
        state.users.push(created.clone());
        Ok(created)
    }
}

#[async_trait]
impl PostStore for MemoryStore {
    async fn create_post(
        &self,
        owner_id: i64,
        title: &str,
        blocks: &[NewContentBlock],
    ) -> Result<PostWithContents> {
        check_blocks(blocks)?;
        let mut state = self.state.lock().unwrap();
        if !state.users.iter().any(|u| u.id == owner_id) {
            return Err(AppError::Database(
                "insert violates foreign key constraint \"posts_user_id_fkey\"".to_string(),
            ));
        }

        state.last_post_id += 1;
        let id = state.last_post_id;
        let now = Utc::now();
        let post = Post {
            id,
            user_id: owner_id,
            title: title.to_string(),
            created_at: now,
            updated_at: now,
        };
        state.posts.insert(id, post.clone());
        state.push_blocks(id, blocks);

        Ok(PostWithContents {
            post,
            contents: state.contents_of(id),
        })
    }

    async fn replace_post(
        &self,
        post_id: i64,
        title: &str,
        blocks: Option<&[NewContentBlock]>,
    ) -> Result<Option<PostWithContents>> {
        if let Some(blocks) = blocks {
            check_blocks(blocks)?;
        }
        let mut state = self.state.lock().unwrap();
        let Some(post) = state.posts.get_mut(&post_id) else {
            return Ok(None);
        };
        post.title = title.to_string();
        post.updated_at = Utc::now();
        let post = post.clone();

        if let Some(blocks) = blocks {
            state.contents.retain(|b| b.post_id != post_id);
            state.push_blocks(post_id, blocks);
        }

        Ok(Some(PostWithContents {
            post,
            contents: state.contents_of(post_id),
        }))
    }

    async fn delete_post(&self, post_id: i64) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        if state.posts.remove(&post_id).is_none() {
            return Ok(false);
        }
        state.contents.retain(|r| r.post_id != post_id);
        state.comments.retain(|r| r.post_id != post_id);
        state.likes.retain(|r| r.post_id != post_id);
        state.views.retain(|r| r.post_id != post_id);
        Ok(true)
    }

    async fn load_post(&self, post_id: i64) -> Result<Option<PostDetail>> {
        let state = self.state.lock().unwrap();
        Ok(state.posts.get(&post_id).map(|p| state.detail(p)))
    }

    async fn list_posts(&self) -> Result<Vec<PostDetail>> {
        let state = self.state.lock().unwrap();
        Ok(state.posts.values().map(|p| state.detail(p)).collect())
    }

    async fn add_comment(
        &self,
        post_id: i64,
        user_id: i64,
        body: &str,
    ) -> Result<Option<Comment>> {
        let mut state = self.state.lock().unwrap();
        if !state.posts.contains_key(&post_id) {
            return Ok(None);
        }
        let comment = Comment {
            id: state.next_id(),
            post_id,
            user_id,
            body: body.to_string(),
            created_at: Utc::now(),
        };
        state.comments.push(comment.clone());
        Ok(Some(comment))
    }

    async fn add_like(&self, post_id: i64, user_id: i64) -> Result<Option<Like>> {
        let mut state = self.state.lock().unwrap();
        if !state.posts.contains_key(&post_id) {
            return Ok(None);
        }
        if let Some(existing) = state
            .likes
            .iter()
            .find(|l| l.post_id == post_id && l.user_id == user_id)
        {
            return Ok(Some(existing.clone()));
        }
        let like = Like {
            id: state.next_id(),
            post_id,
            user_id,
            created_at: Utc::now(),
        };
        state.likes.push(like.clone());
        Ok(Some(like))
    }
}

#[async_trait]
impl ViewStore for MemoryStore {
    async fn insert_view(&self, post_id: i64, viewer_id: i64) -> Result<View> {
        if self.fail_views.load(Ordering::SeqCst) {
            return Err(AppError::Database("view store unavailable".to_string()));
        }
        let mut state = self.state.lock().unwrap();
        if !state.posts.contains_key(&post_id) {
            return Err(AppError::post_not_found(post_id));
        }
        let view = View {
            id: state.next_id(),
            post_id,
            viewer_id,
            viewed_at: Utc::now(),
        };
        state.views.push(view.clone());
        Ok(view)
    }
}
