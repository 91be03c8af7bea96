pub mod auth;
pub mod config;
pub mod core;
pub mod feed;
pub mod follow;
pub mod likes;
pub mod models;
pub mod posts;
pub mod routes;
pub mod users;
