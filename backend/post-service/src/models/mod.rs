/// Data models for users and the post aggregate
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Registered account. The password hash is never serialized.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub gender: String,
    pub birth_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for a user whose password has already been hashed
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub gender: String,
    pub birth_date: NaiveDate,
}

/// Public identity carried inside session tokens and returned by `/info`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub gender: String,
    pub birth_date: NaiveDate,
}

impl From<&User> for Identity {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            gender: user.gender.clone(),
            birth_date: user.birth_date,
        }
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Post {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One ordered block of a post's body
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ContentBlock {
    pub id: i64,
    pub post_id: i64,
    pub position: i32,
    #[serde(rename = "type")]
    pub block_type: String,
    pub data: Value,
}

/// Block as submitted by a client, before it has an id or position
#[derive(Debug, Clone, PartialEq)]
pub struct NewContentBlock {
    pub block_type: String,
    pub data: Value,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub user_id: i64,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Like {
    pub id: i64,
    pub post_id: i64,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct View {
    pub id: i64,
    pub post_id: i64,
    pub viewer_id: i64,
    pub viewed_at: DateTime<Utc>,
}

/// Write-side read model: the post and its content blocks in order
#[derive(Debug, Clone, Serialize)]
pub struct PostWithContents {
    #[serde(flatten)]
    pub post: Post,
    pub contents: Vec<ContentBlock>,
}

/// Full aggregate snapshot returned by `get` and `list`
#[derive(Debug, Clone, Serialize)]
pub struct PostDetail {
    #[serde(flatten)]
    pub post: Post,
    pub contents: Vec<ContentBlock>,
    pub comments: Vec<Comment>,
    pub likes: Vec<Like>,
    pub views: Vec<View>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_user() -> User {
        User {
            id: 1,
            username: "alice".to_string(),
            email: "a@x.com".to_string(),
            password_hash: "$argon2id$v=19$m=19456,t=2,p=1$abc$def".to_string(),
            gender: "female".to_string(),
            birth_date: NaiveDate::from_ymd_opt(1990, 4, 1).unwrap(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_user_never_serializes_hash() {
        let value = serde_json::to_value(sample_user()).unwrap();
        assert!(value.get("password_hash").is_none());
        assert!(!value.to_string().contains("argon2"));
        assert_eq!(value["username"], "alice");
    }

    #[test]
    fn test_identity_from_user() {
        let identity = Identity::from(&sample_user());
        assert_eq!(identity.id, 1);
        assert_eq!(identity.email, "a@x.com");
        assert_eq!(
            serde_json::to_value(&identity).unwrap()["birth_date"],
            "1990-04-01"
        );
    }

    #[test]
    fn test_post_with_contents_shape() {
        let now = Utc::now();
        let post = PostWithContents {
            post: Post {
                id: 3,
                user_id: 1,
                title: "hi".to_string(),
                created_at: now,
                updated_at: now,
            },
            contents: vec![ContentBlock {
                id: 10,
                post_id: 3,
                position: 0,
                block_type: "text".to_string(),
                data: json!("a"),
            }],
        };

        let value = serde_json::to_value(&post).unwrap();
        assert_eq!(value["id"], 3);
        assert_eq!(value["title"], "hi");
        assert_eq!(value["contents"][0]["type"], "text");
        assert_eq!(value["contents"][0]["data"], "a");
    }
}
