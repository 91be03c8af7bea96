use std::collections::{BTreeMap, BTreeSet};

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::config::GUEST_USER_ID;
use crate::core::helpers::{hash_password, now};
use crate::models::models::{Comment, FollowEdge, Post, Profile, User};

/// All entity tables behind one lock. Reads run concurrently under the
/// shared guard; every mutation runs under the exclusive guard, which makes
/// each operation a single atomic step (toggles never race on the cached
/// counters, cascades never leave orphans).
#[derive(Default)]
pub struct State {
    pub users: BTreeMap<i64, User>,
    pub profiles: BTreeMap<i64, Profile>,
    pub posts: BTreeMap<i64, Post>,
    pub comments: BTreeMap<i64, Comment>,
    /// LikeEdge set keyed by (post_id, user_id); source of truth for liked
    /// state. `Post.likes_count` is a cache of the per-post count.
    pub likes: BTreeSet<(i64, i64)>,
    /// FollowEdges in creation order (newest last).
    pub follows: Vec<FollowEdge>,
    next_user_id: i64,
    next_post_id: i64,
    next_comment_id: i64,
}

impl State {
    pub fn alloc_user_id(&mut self) -> i64 {
        let id = self.next_user_id;
        self.next_user_id += 1;
        id
    }

    pub fn alloc_post_id(&mut self) -> i64 {
        let id = self.next_post_id;
        self.next_post_id += 1;
        id
    }

    pub fn alloc_comment_id(&mut self) -> i64 {
        let id = self.next_comment_id;
        self.next_comment_id += 1;
        id
    }

    pub fn likes_of(&self, post_id: i64) -> i64 {
        self.likes
            .range((post_id, i64::MIN)..=(post_id, i64::MAX))
            .count() as i64
    }

    pub fn user_by_handle(&self, handle: &str) -> Option<&User> {
        self.users.values().find(|u| u.handle == handle)
    }
}

pub struct Db {
    state: RwLock<State>,
}

impl Db {
    pub fn new() -> Self {
        let state = State {
            // User id 1 is reserved for the guest principal.
            next_user_id: GUEST_USER_ID + 1,
            next_post_id: 1,
            next_comment_id: 1,
            ..State::default()
        };
        Self {
            state: RwLock::new(state),
        }
    }

    pub fn read(&self) -> RwLockReadGuard<'_, State> {
        self.state.read()
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, State> {
        self.state.write()
    }
}

impl Default for Db {
    fn default() -> Self {
        Self::new()
    }
}

/// Seed a couple of demo accounts and posts so a fresh instance has
/// something to show. Idempotent: skipped when the handles already exist.
pub fn seed_demo(db: &Db) -> Result<(), crate::core::errors::ApiError> {
    let mut state = db.write();
    if state.user_by_handle("alice").is_some() {
        return Ok(());
    }

    fn make_user(
        state: &mut State,
        handle: &str,
        first: &str,
        bio: &str,
    ) -> Result<i64, crate::core::errors::ApiError> {
        let id = state.alloc_user_id();
        state.users.insert(
            id,
            User {
                id,
                handle: handle.to_string(),
                email: format!("{}@example.com", handle),
                password: hash_password(handle)?,
                first_name: first.to_string(),
                last_name: String::new(),
                created_at: now(),
            },
        );
        state.profiles.insert(
            id,
            Profile {
                bio: Some(bio.to_string()),
                avatar: None,
            },
        );
        Ok(id)
    }

    let alice = make_user(&mut state, "alice", "Alice", "Hello, I'm Alice!")?;
    let bob = make_user(&mut state, "bob", "Bob", "Bob's corner of the internet")?;

    for (author, content) in [
        (alice, "Welcome to Ripple! Excited to share thoughts here."),
        (alice, "Just finished an amazing project. Feeling productive today!"),
        (bob, "Hey everyone! Just joined, looking forward to connecting."),
    ] {
        let id = state.alloc_post_id();
        state.posts.insert(
            id,
            Post {
                id,
                user_id: author,
                content: content.to_string(),
                image: None,
                created_at: now(),
                updated_at: None,
                likes_count: 0,
            },
        );
    }

    state.follows.push(FollowEdge {
        follower_id: bob,
        following_id: alice,
        created_at: now(),
    });

    tracing::info!(alice, bob, "seeded demo data");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_ids_start_above_the_guest_id() {
        let db = Db::new();
        let first = db.write().alloc_user_id();
        assert!(first > GUEST_USER_ID);
    }

    #[test]
    fn likes_of_counts_only_the_given_post() {
        let db = Db::new();
        {
            let mut state = db.write();
            state.likes.insert((10, 2));
            state.likes.insert((10, 3));
            state.likes.insert((11, 2));
        }
        let state = db.read();
        assert_eq!(state.likes_of(10), 2);
        assert_eq!(state.likes_of(11), 1);
        assert_eq!(state.likes_of(12), 0);
    }

    #[test]
    fn seed_demo_is_idempotent() {
        let db = Db::new();
        seed_demo(&db).unwrap();
        let users_before = db.read().users.len();
        seed_demo(&db).unwrap();
        assert_eq!(db.read().users.len(), users_before);
    }
}
