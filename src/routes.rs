use actix_web::web;

use crate::{auth, feed, follow, likes, posts, users};

/// Route table shared by the server binary and the in-process test harness.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .route("/register", web::post().to(auth::register))
            .route("/login", web::post().to(auth::login)),
    )
    .service(
        web::scope("/posts")
            .route("", web::get().to(posts::list))
            .route("", web::post().to(posts::create))
            .route("/{id}", web::get().to(posts::get))
            .route("/{id}", web::put().to(posts::edit))
            .route("/{id}", web::delete().to(posts::delete))
            .route("/{id}/like", web::post().to(likes::toggle))
            .route("/{id}/comments", web::post().to(posts::comment)),
    )
    .route("/feed/{user_id}", web::get().to(feed::get))
    .service(
        web::scope("/users")
            .route("", web::get().to(users::list))
            .route("/{id}", web::get().to(users::get))
            .route("/{id}", web::put().to(users::update))
            .route("/{id}/posts", web::get().to(users::user_posts))
            .route("/{id}/follow", web::post().to(follow::toggle))
            .route("/{id}/followers", web::get().to(follow::followers))
            .route("/{id}/following", web::get().to(follow::following)),
    );
}
