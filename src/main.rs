use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::http::HeaderValue;
use caliops_api::{
    config,
    seed,
    store::{DataStore, RemoteBackend, RestBackend},
    AppState,
};
use tokio::signal;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer,
};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = config::load_config()?;
    config::init_tracing(cfg.log_level(), cfg.log_json);

    // Remote backend only when connection parameters look usable; otherwise
    // the store starts latched to local-only.
    let remote: Option<Arc<dyn RemoteBackend>> = if cfg.remote_configured() {
        match RestBackend::new(
            &cfg.remote_url,
            &cfg.remote_api_key,
            Duration::from_secs(cfg.remote_timeout_secs),
        ) {
            Ok(backend) => {
                info!(url = %cfg.remote_url, "remote table store configured");
                Some(Arc::new(backend))
            }
            Err(err) => {
                warn!(error = %err, "remote backend rejected; starting local-only");
                None
            }
        }
    } else {
        info!("remote table store not configured; starting local-only");
        None
    };

    let store = Arc::new(DataStore::new(remote, cfg.batch_size));
    if cfg.seed_sample_data {
        seed::seed_sample_data(&store, &cfg.tables).await;
    }

    let cors_layer = if let Some(origins) = cfg
        .cors_allowed_origins
        .as_deref()
        .filter(|s| !s.trim().is_empty())
    {
        let parsed: Vec<HeaderValue> = origins
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .filter_map(|origin| HeaderValue::from_str(origin).ok())
            .collect();
        if parsed.is_empty() {
            error!("CORS origin list contained no usable origins");
            anyhow::bail!("invalid APP__CORS_ALLOWED_ORIGINS value");
        }
        info!(origins = %origins, "CORS restricted to configured origins");
        CorsLayer::new()
            .allow_origin(tower_http::cors::AllowOrigin::list(parsed))
            .allow_methods(tower_http::cors::Any)
            .allow_headers(tower_http::cors::Any)
    } else if cfg.should_allow_permissive_cors() {
        info!("CORS permissive mode enabled");
        CorsLayer::permissive()
    } else {
        error!("Missing CORS configuration; set APP__CORS_ALLOWED_ORIGINS or APP__CORS_ALLOW_ANY_ORIGIN=true");
        anyhow::bail!("missing CORS configuration");
    };

    let state = AppState::new(cfg.clone(), store);
    let app = caliops_api::app_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(cors_layer);

    let addr: SocketAddr = format!("{}:{}", cfg.host, cfg.port).parse()?;
    info!("caliops-api listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm =
            signal(SignalKind::terminate()).expect("failed to install signal handler");
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("shutdown signal received");
}
