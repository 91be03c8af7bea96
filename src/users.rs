use std::collections::HashSet;

use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;

use crate::auth;
use crate::config::MAX_BIO_LENGTH;
use crate::core::db::{Db, State};
use crate::core::errors::ApiError;
use crate::core::helpers::sanitize_text;
use crate::models::models::{User, UserView};
use crate::posts;

fn user_view(state: &State, user: &User) -> UserView {
    let profile = state.profiles.get(&user.id);
    UserView {
        id: user.id,
        handle: user.handle.clone(),
        email: user.email.clone(),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        created_at: user.created_at,
        bio: profile.and_then(|p| p.bio.clone()),
        avatar: profile.and_then(|p| p.avatar.clone()),
    }
}

/// All users with their profile fields, newest account first.
pub fn list_users(db: &Db) -> Vec<UserView> {
    let state = db.read();
    let mut views: Vec<UserView> = state.users.values().map(|u| user_view(&state, u)).collect();
    views.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    views
}

pub fn get_user(db: &Db, user_id: i64) -> Result<UserView, ApiError> {
    let state = db.read();
    state
        .users
        .get(&user_id)
        .map(|u| user_view(&state, u))
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
}

pub fn update_profile(
    db: &Db,
    user_id: i64,
    bio: Option<&str>,
    avatar: Option<&str>,
) -> Result<UserView, ApiError> {
    let mut state = db.write();
    if !state.users.contains_key(&user_id) {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    let profile = state.profiles.entry(user_id).or_default();
    if let Some(bio) = bio {
        if bio.len() > MAX_BIO_LENGTH {
            return Err(ApiError::Validation(
                "Bio too long (max 500 chars)".to_string(),
            ));
        }
        let clean = sanitize_text(bio);
        profile.bio = if clean.is_empty() { None } else { Some(clean) };
    }
    if let Some(avatar) = avatar {
        profile.avatar = Some(avatar.to_string());
    }

    let user = state.users.get(&user_id).cloned();
    match user {
        Some(user) => Ok(user_view(&state, &user)),
        None => Err(ApiError::NotFound("User not found".to_string())),
    }
}

// === HTTP handlers ===

#[derive(Deserialize)]
pub struct ProfileRequest {
    pub bio: Option<String>,
    pub avatar: Option<String>,
}

pub async fn list(req: HttpRequest, db: web::Data<Db>) -> Result<HttpResponse, ApiError> {
    auth::authenticate(&db, &req)?;
    Ok(HttpResponse::Ok().json(list_users(&db)))
}

pub async fn get(
    req: HttpRequest,
    db: web::Data<Db>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    auth::authenticate(&db, &req)?;
    Ok(HttpResponse::Ok().json(get_user(&db, path.into_inner())?))
}

/// Profile edits are self-only; an id mismatch is a truthful Forbidden.
pub async fn update(
    req: HttpRequest,
    db: web::Data<Db>,
    path: web::Path<i64>,
    body: web::Json<ProfileRequest>,
) -> Result<HttpResponse, ApiError> {
    let principal = auth::authenticate(&db, &req)?;
    let user_id = path.into_inner();
    if principal.id != user_id {
        return Err(ApiError::Forbidden(
            "You can only update your own profile".to_string(),
        ));
    }
    let view = update_profile(&db, user_id, body.bio.as_deref(), body.avatar.as_deref())?;
    Ok(HttpResponse::Ok().json(view))
}

/// A user's public timeline: their posts only, newest first.
pub async fn user_posts(
    req: HttpRequest,
    db: web::Data<Db>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    auth::authenticate(&db, &req)?;
    let scope = HashSet::from([path.into_inner()]);
    Ok(HttpResponse::Ok().json(posts::list_posts(&db, Some(&scope))))
}
