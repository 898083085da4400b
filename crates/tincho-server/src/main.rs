//! Runs a Tincho server configured from the environment.
//!
//! ```text
//! TINCHO_BIND=0.0.0.0:8080 TINCHO_MAX_ROOMS=100 TINCHO_ROOM_TIMEOUT=60 \
//! RUST_LOG=info tincho-server
//! ```

mod logging;

use tincho::{ServerConfig, TinchoError, TinchoServer};

#[tokio::main]
async fn main() -> Result<(), TinchoError> {
    logging::init();

    let config = ServerConfig::from_env()?;
    tracing::info!(
        bind = %config.bind_addr,
        max_rooms = config.registry.max_rooms,
        room_timeout_secs = config.registry.room.room_timeout.as_secs(),
        "starting Tincho server"
    );

    let server = TinchoServer::builder()
        .bind(&config.bind_addr)
        .registry_config(config.registry)
        .build()
        .await?;

    server
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "cannot listen for ctrl-c");
                std::future::pending::<()>().await;
            }
        })
        .await
}
