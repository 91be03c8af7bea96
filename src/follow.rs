use std::collections::HashSet;

use actix_web::{web, HttpRequest, HttpResponse};

use crate::auth;
use crate::core::db::{Db, State};
use crate::core::errors::ApiError;
use crate::core::helpers::now;
use crate::models::models::{FollowEdge, FollowerView};

/// Flip the follow edge for (follower, followee) and return the resulting
/// state. The whole toggle runs under one write guard, so duplicate toggles
/// for the same pair serialize and the edge set stays a set.
pub fn toggle_follow(db: &Db, follower_id: i64, following_id: i64) -> Result<bool, ApiError> {
    if follower_id == following_id {
        return Err(ApiError::SelfFollow);
    }

    let mut state = db.write();
    if !state.users.contains_key(&following_id) {
        return Err(ApiError::NotFound("Target user not found".to_string()));
    }

    let existing = state
        .follows
        .iter()
        .position(|e| e.follower_id == follower_id && e.following_id == following_id);

    let following = match existing {
        Some(idx) => {
            state.follows.remove(idx);
            false
        }
        None => {
            state.follows.push(FollowEdge {
                follower_id,
                following_id,
                created_at: now(),
            });
            true
        }
    };

    tracing::debug!(follower_id, following_id, following, "toggled follow");
    Ok(following)
}

fn edge_view(state: &State, user_id: i64, edge: &FollowEdge) -> Option<FollowerView> {
    let user = state.users.get(&user_id)?;
    let profile = state.profiles.get(&user_id);
    Some(FollowerView {
        id: user.id,
        handle: user.handle.clone(),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        avatar: profile.and_then(|p| p.avatar.clone()),
        followed_at: edge.created_at,
    })
}

/// Users following `user_id`, most recent edge first.
pub fn followers_of(db: &Db, user_id: i64) -> Vec<FollowerView> {
    let state = db.read();
    state
        .follows
        .iter()
        .rev()
        .filter(|e| e.following_id == user_id)
        .filter_map(|e| edge_view(&state, e.follower_id, e))
        .collect()
}

/// Users that `user_id` follows, most recent edge first.
pub fn following_of(db: &Db, user_id: i64) -> Vec<FollowerView> {
    let state = db.read();
    state
        .follows
        .iter()
        .rev()
        .filter(|e| e.follower_id == user_id)
        .filter_map(|e| edge_view(&state, e.following_id, e))
        .collect()
}

/// Author ids whose posts belong in `user_id`'s timeline: self plus everyone
/// they follow.
pub fn feed_scope(db: &Db, user_id: i64) -> HashSet<i64> {
    let state = db.read();
    let mut scope: HashSet<i64> = state
        .follows
        .iter()
        .filter(|e| e.follower_id == user_id)
        .map(|e| e.following_id)
        .collect();
    scope.insert(user_id);
    scope
}

// === HTTP handlers ===

pub async fn toggle(
    req: HttpRequest,
    db: web::Data<Db>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let principal = auth::authenticate(&db, &req)?;
    let following = toggle_follow(&db, principal.id, path.into_inner())?;
    let message = if following {
        "User followed"
    } else {
        "User unfollowed"
    };
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": message,
        "following": following,
    })))
}

pub async fn followers(
    req: HttpRequest,
    db: web::Data<Db>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    auth::authenticate(&db, &req)?;
    Ok(HttpResponse::Ok().json(followers_of(&db, path.into_inner())))
}

pub async fn following(
    req: HttpRequest,
    db: web::Data<Db>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    auth::authenticate(&db, &req)?;
    Ok(HttpResponse::Ok().json(following_of(&db, path.into_inner())))
}
