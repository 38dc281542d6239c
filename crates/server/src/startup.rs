use axum::Router;
use configs::AppConfig;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use service::users::{UserService, UserStore};

use crate::routes::{self, RouterConfig, ServerState};

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// Open the user store and assemble the router around it.
///
/// The service handle is returned so the caller can flush it on shutdown.
pub async fn build_app(cfg: &AppConfig) -> anyhow::Result<(Router, UserService)> {
    let store = UserStore::open(&cfg.storage.users_file, cfg.storage.load_policy)
        .await
        .map_err(|e| anyhow::anyhow!("cannot open user store: {e}"))?;
    let users = UserService::new(store);
    let state = ServerState { users: users.clone() };
    let app = routes::build_router(state, build_cors(), &RouterConfig::from_app(cfg));
    Ok((app, users))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    info!("received Ctrl+C, shutting down");
}

/// Serve on an already bound listener until `shutdown` resolves, then flush the store.
pub async fn serve<F>(listener: TcpListener, cfg: &AppConfig, shutdown: F) -> anyhow::Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let (app, users) = build_app(cfg).await?;
    let addr = listener.local_addr()?;
    info!(%addr, users_file = %cfg.storage.users_file.display(), "server listening");
    axum::serve(listener, app).with_graceful_shutdown(shutdown).await?;

    if let Err(e) = users.flush().await {
        error!(error = %e, "final flush of user store failed");
    }
    info!("server stopped");
    Ok(())
}

/// Public entry: prepare directories, bind, and run until Ctrl+C.
pub async fn run(cfg: AppConfig) -> anyhow::Result<()> {
    common::env::ensure_env(&cfg.frontend.dir, cfg.storage.data_dir()).await?;
    let listener = TcpListener::bind(cfg.bind_addr()).await?;
    serve(listener, &cfg, shutdown_signal()).await
}
