use actix_web::{web, HttpRequest, HttpResponse};

use crate::auth;
use crate::core::db::Db;
use crate::core::errors::ApiError;

/// Flip the like edge for (post, user) and return the resulting liked state
/// and the post's new counter.
///
/// The edge flip and the counter write happen under one write guard, and the
/// counter is recomputed from the edge set rather than blindly incremented,
/// so concurrent togglers on the same post cannot lose updates and the cache
/// never diverges from the edges.
pub fn toggle_like(db: &Db, user_id: i64, post_id: i64) -> Result<(bool, i64), ApiError> {
    let mut state = db.write();
    if !state.posts.contains_key(&post_id) {
        return Err(ApiError::NotFound("Post not found".to_string()));
    }

    let edge = (post_id, user_id);
    let liked = if state.likes.remove(&edge) {
        false
    } else {
        state.likes.insert(edge);
        true
    };

    let likes_count = state.likes_of(post_id);
    if let Some(post) = state.posts.get_mut(&post_id) {
        post.likes_count = likes_count;
    }

    tracing::debug!(post_id, user_id, liked, likes_count, "toggled like");
    Ok((liked, likes_count))
}

// === HTTP handler ===

pub async fn toggle(
    req: HttpRequest,
    db: web::Data<Db>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let principal = auth::authenticate(&db, &req)?;
    let (liked, likes_count) = toggle_like(&db, principal.id, path.into_inner())?;
    let message = if liked { "Post liked" } else { "Post unliked" };
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": message,
        "liked": liked,
        "likes_count": likes_count,
    })))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::auth::{login_or_create, LoginOutcome};
    use crate::posts::create_post;

    fn user(db: &Db, handle: &str) -> i64 {
        match login_or_create(db, handle, "password1").unwrap() {
            LoginOutcome::Created(u) | LoginOutcome::Authenticated(u) => u.id,
        }
    }

    #[test]
    fn double_toggle_round_trips() {
        let db = Db::new();
        let a = user(&db, "ann");
        let b = user(&db, "ben");
        let post = create_post(&db, a, "likeable", None).unwrap();

        assert_eq!(toggle_like(&db, b, post.id).unwrap(), (true, 1));
        assert_eq!(toggle_like(&db, b, post.id).unwrap(), (false, 0));

        let state = db.read();
        assert!(state.likes.is_empty());
        assert_eq!(state.posts.get(&post.id).unwrap().likes_count, 0);
    }

    #[test]
    fn liking_a_missing_post_is_not_found() {
        let db = Db::new();
        let a = user(&db, "ann");
        assert!(matches!(
            toggle_like(&db, a, 404).unwrap_err(),
            ApiError::NotFound(_)
        ));
    }

    #[test]
    fn distinct_likers_each_count_once() {
        let db = Db::new();
        let a = user(&db, "ann");
        let post = create_post(&db, a, "popular", None).unwrap();
        for handle in ["ben", "cam", "dot"] {
            let liker = user(&db, handle);
            toggle_like(&db, liker, post.id).unwrap();
        }
        assert_eq!(db.read().posts.get(&post.id).unwrap().likes_count, 3);
    }

    #[test]
    fn concurrent_toggles_do_not_lose_updates() {
        let db = Arc::new(Db::new());
        let author = user(&db, "ann");
        let post = create_post(&db, author, "contended", None).unwrap();

        let likers: Vec<i64> = (0..8)
            .map(|i| user(&db, &format!("liker{}", i)))
            .collect();

        let handles: Vec<_> = likers
            .into_iter()
            .map(|liker| {
                let db = Arc::clone(&db);
                std::thread::spawn(move || {
                    toggle_like(&db, liker, post.id).unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let state = db.read();
        let counted = state.likes_of(post.id);
        assert_eq!(counted, 8);
        assert_eq!(state.posts.get(&post.id).unwrap().likes_count, counted);
    }
}
