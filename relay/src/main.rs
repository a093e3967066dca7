use relay::config::RelayConfig;
use relay::state::AppState;
use relay::{routes, services};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Err(e) = dotenvy::dotenv() {
        // A missing .env file is the normal case outside development.
        if !e.not_found() {
            return Err(e.into());
        }
    }
    tracing_subscriber::fmt::init();

    let config = RelayConfig::from_env()?;
    let port = config.port;
    tracing::info!(
        port,
        stroke_ttl_secs = config.stroke_ttl.as_secs(),
        queue_capacity = config.client_queue_capacity,
        "relay configured"
    );

    let state = AppState::new(config);

    // Spawn background idle-room sweeper.
    let _sweeper = services::sweeper::spawn_sweeper(state.clone());

    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}")).await?;

    tracing::info!(%port, "relay listening");
    axum::serve(listener, app).await?;
    Ok(())
}
