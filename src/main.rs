use algorecall_backend::{
    config::{get_config, init_config, LogFormat},
    database::pool::{create_pool, run_migrations},
    middleware::{cors::cors_layer, rate_limit},
    routes, utils, AppState,
};
use axum::{extract::DefaultBodyLimit, routing::get, Router};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{compression::CompressionLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("algorecall_backend=info,tower_http=info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_config()?;
    let config = get_config();
    init_tracing(config.log_format);

    let pool = create_pool().await?;
    run_migrations(&pool).await?;

    let app_state = AppState::new(pool);

    if let Some(path) = &config.problems_seed_file {
        let imported = app_state.problem_service.import_seed_file(path).await?;
        info!("Imported {} problems from {}", imported, path);
    }

    {
        let state = app_state.clone();
        let idle_minutes = config.session_idle_minutes;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_secs(1));
            let mut ticks: u64 = 0;
            loop {
                ticker.tick().await;
                ticks += 1;
                let now = utils::time::now();
                let expired = state
                    .sessions
                    .tick_all(now, state.progress_recorder.as_ref());
                if expired > 0 {
                    tracing::debug!(expired, "Question timers expired");
                }

                if ticks % 60 == 0 {
                    let cutoff = utils::time::idle_cutoff(now, idle_minutes);
                    let sessions = state.sessions.evict_idle(cutoff);
                    let views = state.catalogs.evict_idle(cutoff);
                    if sessions + views > 0 {
                        info!(sessions, views, "Evicted idle quiz sessions and catalog views");
                    }
                }
            }
        });
    }

    let base_routes = Router::new().route("/health", get(routes::health::health));

    let api = routes::api_router().layer(axum::middleware::from_fn_with_state(
        rate_limit::RateLimiter::new(config.api_rps),
        rate_limit::rps_middleware,
    ));

    let app = base_routes
        .merge(api)
        .with_state(app_state)
        .layer(cors_layer(config.cors_origin.as_deref()))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(2 * 1024 * 1024));

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
