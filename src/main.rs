use jobtracker_backend::{
    config::{get_config, init_config},
    database::pool::{create_pool, run_migrations},
    routes, AppState,
};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Ceiling for any request body; uploads get their own tighter limit.
const MAX_REQUEST_BYTES: usize = 64 * 1024 * 1024;

fn request_body_limit(max_upload_bytes: usize) -> usize {
    MAX_REQUEST_BYTES.max(max_upload_bytes.saturating_mul(2))
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();
    init_config()?;
    let config = get_config();

    let pool = create_pool().await?;
    run_migrations(&pool).await?;

    tokio::fs::create_dir_all(&config.uploads_dir).await?;
    info!("Storing uploads in: {}", config.uploads_dir);

    let app_state = AppState::new(pool);

    let app = routes::router(app_state)
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(RequestBodyLimitLayer::new(request_body_limit(
            config.max_upload_bytes,
        )));

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_limit_saturates_for_huge_upload_limits() {
        assert_eq!(request_body_limit(1024), MAX_REQUEST_BYTES);
        assert_eq!(request_body_limit(100 * 1024 * 1024), 200 * 1024 * 1024);
        assert_eq!(request_body_limit(usize::MAX), usize::MAX);
    }
}
