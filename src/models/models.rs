use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::GUEST_USER_ID;

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct User {
    pub id: i64,
    pub handle: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct Profile {
    pub bio: Option<String>,
    pub avatar: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Post {
    pub id: i64,
    pub user_id: i64,
    pub content: String,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub likes_count: i64,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub user_id: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct FollowEdge {
    pub follower_id: i64,
    pub following_id: i64,
    pub created_at: DateTime<Utc>,
}

/// The resolved identity acting in a request: a registered user or the
/// well-known guest.
#[derive(Serialize, Clone, Debug)]
pub struct Principal {
    pub id: i64,
    pub handle: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl Principal {
    pub fn guest() -> Self {
        Self {
            id: GUEST_USER_ID,
            handle: "Guest User".to_string(),
            email: "guest@example.com".to_string(),
            first_name: "Guest".to_string(),
            last_name: "User".to_string(),
        }
    }

    pub fn is_guest(&self) -> bool {
        self.id == GUEST_USER_ID
    }
}

impl From<&User> for Principal {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            handle: user.handle.clone(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
        }
    }
}

// === Materialized views returned by the read side ===

#[derive(Serialize, Clone, Debug)]
pub struct PostView {
    pub id: i64,
    pub user_id: i64,
    pub handle: String,
    pub first_name: String,
    pub last_name: String,
    pub content: String,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub likes_count: i64,
    pub comments_count: i64,
    pub comments: Vec<CommentView>,
}

#[derive(Serialize, Clone, Debug)]
pub struct CommentView {
    pub id: i64,
    pub post_id: i64,
    pub user_id: i64,
    pub handle: String,
    pub first_name: String,
    pub last_name: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// One entry in a followers/following listing, newest edge first.
#[derive(Serialize, Clone, Debug)]
pub struct FollowerView {
    pub id: i64,
    pub handle: String,
    pub first_name: String,
    pub last_name: String,
    pub avatar: Option<String>,
    pub followed_at: DateTime<Utc>,
}

/// Public user directory entry (no credential material).
#[derive(Serialize, Clone, Debug)]
pub struct UserView {
    pub id: i64,
    pub handle: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub created_at: DateTime<Utc>,
    pub bio: Option<String>,
    pub avatar: Option<String>,
}
