use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Context;
use tokio::signal;

use wms_lite::{
    auth::{Argon2PasswordHasher, bootstrap::build_auth, sweeper::spawn_session_sweeper},
    config::AppConfig,
    db::connection,
    logging::init_tracing,
    routes::app,
    services::ServiceContext,
    state::AppState,
};

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        tracing::error!("server failed: {err:?}");
        eprintln!("server failed: {err:?}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cfg = AppConfig::from_env()?;
    init_tracing(&cfg.logging);

    let db_cfg = cfg.database()?.clone();
    let auth_cfg = cfg.auth()?.clone();

    let db = connection::connect(&db_cfg).await?;
    let services = ServiceContext::new(&db, Arc::new(Argon2PasswordHasher));
    let auth = build_auth(&auth_cfg, services.daos(), services.hasher())
        .context("failed to initialise auth")?;

    let sweeper = spawn_session_sweeper(
        auth.sessions.clone(),
        Duration::from_secs(auth_cfg.session_sweep_interval_secs),
    );

    let state = AppState::new(cfg, db, services, auth);
    let addr: SocketAddr = format!("{}:{}", state.config.general.host, state.config.general.port)
        .parse()
        .context("invalid host/port")?;

    let router = app(Arc::clone(&state));
    tracing::info!("listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    sweeper.abort();
    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for ctrl-c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
