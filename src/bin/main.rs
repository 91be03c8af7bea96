use actix_web::{web, App, HttpServer};
use tracing_subscriber::EnvFilter;

use ripple::config;
use ripple::core::db::{seed_demo, Db};
use ripple::routes;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let db = web::Data::new(Db::new());
    if std::env::var("RIPPLE_SEED_DEMO").is_ok() {
        if let Err(err) = seed_demo(&db) {
            tracing::warn!(%err, "demo seeding failed");
        }
    }

    let bind = config::bind_address();
    tracing::info!(%bind, "server listening");

    HttpServer::new(move || App::new().app_data(db.clone()).configure(routes::configure))
        .bind(&bind)?
        .run()
        .await
}
