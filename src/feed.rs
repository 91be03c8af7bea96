use actix_web::{web, HttpRequest, HttpResponse};

use crate::auth;
use crate::core::db::Db;
use crate::core::errors::ApiError;
use crate::follow;
use crate::models::models::PostView;
use crate::posts;

/// Assemble a user's timeline: their own posts plus posts from everyone they
/// follow, newest first.
pub fn feed(db: &Db, user_id: i64) -> Vec<PostView> {
    let scope = follow::feed_scope(db, user_id);
    posts::list_posts(db, Some(&scope))
}

// === HTTP handler ===

/// `GET /feed/{user_id}` — a feed is only visible to its owner. Unlike post
/// edit/delete, the scope mismatch is reported truthfully as Forbidden.
pub async fn get(
    req: HttpRequest,
    db: web::Data<Db>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let principal = auth::authenticate(&db, &req)?;
    let user_id = path.into_inner();
    if principal.id != user_id {
        return Err(ApiError::Forbidden(
            "You can only access your own feed".to_string(),
        ));
    }
    Ok(HttpResponse::Ok().json(feed(&db, user_id)))
}
