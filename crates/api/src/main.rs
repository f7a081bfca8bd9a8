use anyhow::Context;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    pipilica_observability::init();

    let config = pipilica_infra::AppConfig::from_env().context("invalid configuration")?;
    tracing::info!(store = %config.store.describe(), "starting PiPiLiCa Shop gateway");

    let services = pipilica_api::app::services::build_services(&config.store)
        .await
        .context("failed to initialise document store")?;
    let verifier = pipilica_api::app::services::build_verifier(&config.auth);

    let app = pipilica_api::app::build_app(services.clone(), verifier);

    let listener = tokio::net::TcpListener::bind(config.socket_addr())
        .await
        .with_context(|| format!("failed to bind {}", config.socket_addr()))?;

    tracing::info!("Running Server PiPiLiCa Shop on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    services.shutdown().await;
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("shutdown signal received, draining connections");
}
