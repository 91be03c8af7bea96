use std::collections::HashSet;

use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;

use crate::auth;
use crate::config::MAX_POST_LENGTH;
use crate::core::db::{Db, State};
use crate::core::errors::ApiError;
use crate::core::helpers::{now, sanitize_text};
use crate::models::models::{Comment, CommentView, Post, PostView, Principal};

/// Display fields for a post or comment author. Rows written by the guest
/// principal have no backing user row, so fall back to its synthetic fields.
fn author_fields(state: &State, user_id: i64) -> (String, String, String) {
    match state.users.get(&user_id) {
        Some(u) => (u.handle.clone(), u.first_name.clone(), u.last_name.clone()),
        None => {
            let guest = Principal::guest();
            (guest.handle, guest.first_name, guest.last_name)
        }
    }
}

fn comment_view(state: &State, comment: &Comment) -> CommentView {
    let (handle, first_name, last_name) = author_fields(state, comment.user_id);
    CommentView {
        id: comment.id,
        post_id: comment.post_id,
        user_id: comment.user_id,
        handle,
        first_name,
        last_name,
        content: comment.content.clone(),
        created_at: comment.created_at,
    }
}

/// Materialize one post: author summary, live like count, comments ascending
/// by creation time.
fn post_view(state: &State, post: &Post) -> PostView {
    let mut comments: Vec<CommentView> = state
        .comments
        .values()
        .filter(|c| c.post_id == post.id)
        .map(|c| comment_view(state, c))
        .collect();
    comments.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

    let (handle, first_name, last_name) = author_fields(state, post.user_id);
    PostView {
        id: post.id,
        user_id: post.user_id,
        handle,
        first_name,
        last_name,
        content: post.content.clone(),
        image: post.image.clone(),
        created_at: post.created_at,
        updated_at: post.updated_at,
        likes_count: state.likes_of(post.id),
        comments_count: comments.len() as i64,
        comments,
    }
}

fn clean_content(raw: &str) -> Result<String, ApiError> {
    let content = sanitize_text(raw).trim().to_string();
    if content.is_empty() {
        return Err(ApiError::Validation("Content is required".to_string()));
    }
    if content.len() > MAX_POST_LENGTH {
        return Err(ApiError::Validation("Content too long".to_string()));
    }
    Ok(content)
}

pub fn create_post(
    db: &Db,
    author_id: i64,
    content: &str,
    image: Option<String>,
) -> Result<PostView, ApiError> {
    let content = clean_content(content)?;

    let mut state = db.write();
    let id = state.alloc_post_id();
    let post = Post {
        id,
        user_id: author_id,
        content,
        image,
        created_at: now(),
        updated_at: None,
        likes_count: 0,
    };
    let view = post_view(&state, &post);
    state.posts.insert(id, post);

    tracing::debug!(post_id = id, author_id, "created post");
    Ok(view)
}

/// Edit a post owned by `actor_id`. A post that exists but belongs to someone
/// else reports NotFound, same as a missing one, so callers cannot probe for
/// other users' post ids.
pub fn edit_post(db: &Db, actor_id: i64, post_id: i64, content: &str) -> Result<(), ApiError> {
    let content = clean_content(content)?;

    let mut state = db.write();
    let post = state
        .posts
        .get_mut(&post_id)
        .filter(|p| p.user_id == actor_id)
        .ok_or_else(|| ApiError::NotFound("Post not found".to_string()))?;

    post.content = content;
    post.updated_at = Some(now());
    Ok(())
}

/// Delete a post owned by `actor_id`, cascading to its comments and likes in
/// the same write so no orphan rows survive.
pub fn delete_post(db: &Db, actor_id: i64, post_id: i64) -> Result<(), ApiError> {
    let mut state = db.write();
    let owned = state
        .posts
        .get(&post_id)
        .is_some_and(|p| p.user_id == actor_id);
    if !owned {
        return Err(ApiError::NotFound("Post not found".to_string()));
    }

    state.posts.remove(&post_id);
    state.comments.retain(|_, c| c.post_id != post_id);
    let likes: Vec<(i64, i64)> = state
        .likes
        .range((post_id, i64::MIN)..=(post_id, i64::MAX))
        .copied()
        .collect();
    for edge in likes {
        state.likes.remove(&edge);
    }

    tracing::debug!(post_id, actor_id, "deleted post");
    Ok(())
}

pub fn add_comment(
    db: &Db,
    actor_id: i64,
    post_id: i64,
    content: &str,
) -> Result<CommentView, ApiError> {
    let content = clean_content(content)?;

    let mut state = db.write();
    if !state.posts.contains_key(&post_id) {
        return Err(ApiError::NotFound("Post not found".to_string()));
    }

    let id = state.alloc_comment_id();
    let comment = Comment {
        id,
        post_id,
        user_id: actor_id,
        content,
        created_at: now(),
    };
    let view = comment_view(&state, &comment);
    state.comments.insert(id, comment);
    Ok(view)
}

pub fn get_post(db: &Db, post_id: i64) -> Result<PostView, ApiError> {
    let state = db.read();
    state
        .posts
        .get(&post_id)
        .map(|p| post_view(&state, p))
        .ok_or_else(|| ApiError::NotFound("Post not found".to_string()))
}

/// The timeline: newest first, ties broken by id descending for a
/// deterministic total order. `scope` restricts to the given author ids;
/// `None` is the global listing.
pub fn list_posts(db: &Db, scope: Option<&HashSet<i64>>) -> Vec<PostView> {
    let state = db.read();
    let mut views: Vec<PostView> = state
        .posts
        .values()
        .filter(|p| scope.map_or(true, |s| s.contains(&p.user_id)))
        .map(|p| post_view(&state, p))
        .collect();
    views.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    views
}

// === HTTP handlers ===

#[derive(Deserialize)]
pub struct CreatePostRequest {
    pub content: String,
    pub image: Option<String>,
}

#[derive(Deserialize)]
pub struct EditPostRequest {
    pub content: String,
}

#[derive(Deserialize)]
pub struct CommentRequest {
    pub content: String,
}

#[derive(Deserialize)]
pub struct ListQuery {
    /// Comma-separated author ids; restricts the listing when present.
    pub scope: Option<String>,
}

pub async fn list(
    req: HttpRequest,
    db: web::Data<Db>,
    query: web::Query<ListQuery>,
) -> Result<HttpResponse, ApiError> {
    auth::authenticate(&db, &req)?;
    let scope: Option<HashSet<i64>> = match &query.scope {
        Some(raw) => Some(
            raw.split(',')
                .filter_map(|part| part.trim().parse::<i64>().ok())
                .collect(),
        ),
        None => None,
    };
    Ok(HttpResponse::Ok().json(list_posts(&db, scope.as_ref())))
}

pub async fn get(
    req: HttpRequest,
    db: web::Data<Db>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    auth::authenticate(&db, &req)?;
    Ok(HttpResponse::Ok().json(get_post(&db, path.into_inner())?))
}

pub async fn create(
    req: HttpRequest,
    db: web::Data<Db>,
    body: web::Json<CreatePostRequest>,
) -> Result<HttpResponse, ApiError> {
    let principal = auth::authenticate(&db, &req)?;
    let view = create_post(&db, principal.id, &body.content, body.image.clone())?;
    Ok(HttpResponse::Created().json(view))
}

pub async fn edit(
    req: HttpRequest,
    db: web::Data<Db>,
    path: web::Path<i64>,
    body: web::Json<EditPostRequest>,
) -> Result<HttpResponse, ApiError> {
    let principal = auth::authenticate(&db, &req)?;
    edit_post(&db, principal.id, path.into_inner(), &body.content)?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Post updated successfully"
    })))
}

pub async fn delete(
    req: HttpRequest,
    db: web::Data<Db>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let principal = auth::authenticate(&db, &req)?;
    delete_post(&db, principal.id, path.into_inner())?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Post deleted successfully"
    })))
}

pub async fn comment(
    req: HttpRequest,
    db: web::Data<Db>,
    path: web::Path<i64>,
    body: web::Json<CommentRequest>,
) -> Result<HttpResponse, ApiError> {
    let principal = auth::authenticate(&db, &req)?;
    let view = add_comment(&db, principal.id, path.into_inner(), &body.content)?;
    Ok(HttpResponse::Created().json(view))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{login_or_create, LoginOutcome};
    use crate::likes;

    fn user(db: &Db, handle: &str) -> i64 {
        match login_or_create(db, handle, "password1").unwrap() {
            LoginOutcome::Created(u) | LoginOutcome::Authenticated(u) => u.id,
        }
    }

    #[test]
    fn blank_content_is_rejected() {
        let db = Db::new();
        let a = user(&db, "ann");
        for raw in ["", "   ", "<b></b>"] {
            assert!(matches!(
                create_post(&db, a, raw, None).unwrap_err(),
                ApiError::Validation(_)
            ));
        }
        assert!(db.read().posts.is_empty());
    }

    #[test]
    fn created_post_starts_unliked_with_author_summary() {
        let db = Db::new();
        let a = user(&db, "ann");
        let view = create_post(&db, a, "hello", None).unwrap();
        assert_eq!(view.likes_count, 0);
        assert_eq!(view.comments_count, 0);
        assert_eq!(view.handle, "ann");
    }

    #[test]
    fn editing_another_users_post_reports_not_found() {
        let db = Db::new();
        let a = user(&db, "ann");
        let b = user(&db, "ben");
        let post = create_post(&db, a, "mine", None).unwrap();

        let err = edit_post(&db, b, post.id, "stolen").unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
        assert_eq!(db.read().posts.get(&post.id).unwrap().content, "mine");
    }

    #[test]
    fn delete_cascades_to_comments_and_likes() {
        let db = Db::new();
        let a = user(&db, "ann");
        let b = user(&db, "ben");
        let post = create_post(&db, a, "soon gone", None).unwrap();
        add_comment(&db, b, post.id, "nice").unwrap();
        likes::toggle_like(&db, b, post.id).unwrap();

        delete_post(&db, a, post.id).unwrap();

        let state = db.read();
        assert!(state.posts.is_empty());
        assert!(state.comments.is_empty());
        assert!(state.likes.is_empty());
    }

    #[test]
    fn comments_on_missing_posts_fail() {
        let db = Db::new();
        let a = user(&db, "ann");
        assert!(matches!(
            add_comment(&db, a, 42, "hello?").unwrap_err(),
            ApiError::NotFound(_)
        ));
    }

    #[test]
    fn guest_comments_render_synthetic_author() {
        let db = Db::new();
        let a = user(&db, "ann");
        let post = create_post(&db, a, "open thread", None).unwrap();
        let view = add_comment(&db, crate::config::GUEST_USER_ID, post.id, "hi!").unwrap();
        assert_eq!(view.handle, "Guest User");
    }

    #[test]
    fn listing_is_newest_first_with_id_tiebreak() {
        let db = Db::new();
        let a = user(&db, "ann");
        let first = create_post(&db, a, "one", None).unwrap();
        let second = create_post(&db, a, "two", None).unwrap();

        // Force identical timestamps so only the id ordering decides.
        {
            let mut state = db.write();
            let ts = state.posts.get(&first.id).unwrap().created_at;
            state.posts.get_mut(&second.id).unwrap().created_at = ts;
        }

        let ids: Vec<i64> = list_posts(&db, None).iter().map(|v| v.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }

    #[test]
    fn scoped_listing_filters_by_author() {
        let db = Db::new();
        let a = user(&db, "ann");
        let b = user(&db, "ben");
        create_post(&db, a, "from ann", None).unwrap();
        let b_post = create_post(&db, b, "from ben", None).unwrap();

        let scope = HashSet::from([b]);
        let ids: Vec<i64> = list_posts(&db, Some(&scope)).iter().map(|v| v.id).collect();
        assert_eq!(ids, vec![b_post.id]);
    }

    #[test]
    fn comments_are_materialized_ascending() {
        let db = Db::new();
        let a = user(&db, "ann");
        let post = create_post(&db, a, "thread", None).unwrap();
        let c1 = add_comment(&db, a, post.id, "first").unwrap();
        let c2 = add_comment(&db, a, post.id, "second").unwrap();

        let view = get_post(&db, post.id).unwrap();
        let ids: Vec<i64> = view.comments.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![c1.id, c2.id]);
        assert_eq!(view.comments_count, 2);
    }
}
