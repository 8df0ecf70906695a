#[cfg(feature = "http_api")]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use std::net::SocketAddr;

    use rotation_tool::http_api::{self, ADDR_ENV_VAR, DEFAULT_ADDR};
    use rotation_tool::{BoardMetadata, RotationBoard};
    use tracing::info;
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .init();

    let addr: SocketAddr = std::env::var(ADDR_ENV_VAR)
        .unwrap_or_else(|_| DEFAULT_ADDR.to_string())
        .parse()?;

    let metadata = BoardMetadata::from_env()?;
    info!(board = %metadata.board_name, base_date = %metadata.base_date, "loaded board configuration");

    info!("rotation-tool HTTP API listening on http://{addr}");
    let board = RotationBoard::with_sample_entries(metadata);
    http_api::serve(addr, board).await?;
    Ok(())
}

#[cfg(not(feature = "http_api"))]
fn main() {
    eprintln!("Rebuild with the `http_api` feature to enable the HTTP server.");
}
