//! estate_crm server
//!
//! Opens the document store selected by `MONGODB_URL` and serves the REST
//! API and HTML fragments on `CRM_BIND_ADDR` (default 0.0.0.0:5000).
//!
//! Usage:
//!   cargo run --bin create_test_user   # seed a login
//!   cargo run --bin estate_crm         # start server

use estate_crm::config::AppConfig;
use estate_crm::logging;
use estate_crm::rest::create_router;
use estate_crm::storage::Store;
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;
    let _guard = logging::init(&config.log);

    info!(database = %config.database.url, path = %config.database.path.display(), "starting estate_crm");
    let store = Store::open(&config.database.path)?;

    let app = create_router(store.clone(), &config.jwt_secret);
    let listener = TcpListener::bind(config.bind_addr).await?;
    info!(addr = %config.bind_addr, "REST API listening");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    store.flush()?;
    info!("shut down");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("ctrl-c received, draining connections");
    }
}
