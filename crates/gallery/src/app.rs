use anyhow::Context;
use axum::{Router, extract::DefaultBodyLimit, middleware::from_fn};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing::info;

use crate::{AppState, config::GalleryConfig, db, middleware::version::add_version_headers, routes};

/// Build the full HTTP application for `state`.
pub fn router(state: AppState) -> Router {
    let mut app = Router::new()
        .merge(routes::health_router())
        .nest("/api", routes::api_router());

    let media_prefix = state.config().media.url_prefix.trim_end_matches('/');
    if media_prefix.starts_with('/') && media_prefix.len() > 1 {
        app = app.nest_service(media_prefix, ServeDir::new(&state.config().media.root));
    }

    app.layer(DefaultBodyLimit::max(state.config().max_upload_bytes))
        .layer(from_fn(add_version_headers))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub struct Server;

impl Server {
    pub async fn run(config: GalleryConfig) -> anyhow::Result<()> {
        let pool = db::connect(&config.database_url)
            .await
            .context("failed to open database")?;

        tokio::fs::create_dir_all(&config.media.root)
            .await
            .with_context(|| format!("failed to create media root {}", config.media.root.display()))?;

        let listen_addr = config.listen_addr.clone();
        let state = AppState::new(pool, config);
        let app = router(state);

        let listener = TcpListener::bind(&listen_addr)
            .await
            .with_context(|| format!("failed to bind {listen_addr}"))?;
        info!(listen_addr = %listen_addr, "Gallery server listening");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("server error")?;

        info!("Gallery server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
