use sea_orm::Database;
use tracing::info;

use vitrin_store::config::StoreConfig;
use vitrin_store::router::build_router;
use vitrin_store::state::AppState;

#[tokio::main]
async fn main() {
    vitrin_core::tracing::init_tracing();

    let config = StoreConfig::from_env();

    let db = Database::connect(&config.database_url)
        .await
        .expect("failed to connect to database");

    let state = AppState {
        db,
        jwt_secret: config.jwt_secret,
        cookie_domain: config.cookie_domain,
    };

    let router = build_router(state);
    let http_addr = format!("0.0.0.0:{}", config.store_port);
    let listener = tokio::net::TcpListener::bind(&http_addr)
        .await
        .expect("failed to bind");

    info!("store service listening on {http_addr}");
    axum::serve(listener, router).await.expect("server error");
}
