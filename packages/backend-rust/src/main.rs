use shuxue_backend_rust::config::Config;
use shuxue_backend_rust::logging::{init_tracing, LogSettings};
use shuxue_backend_rust::seed;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let config = Config::from_env();
    let _log_guard = init_tracing(&LogSettings::from_env(&config.log_level));

    let catalog = match seed::load_catalog(config.catalog_path.as_deref()).await {
        Ok(catalog) => catalog,
        Err(err) => {
            tracing::error!(error = %err, "catalog failed to load");
            std::process::exit(1);
        }
    };

    let addr = config.bind_addr();
    tracing::info!(
        %addr,
        practice_limit = config.practice_limit,
        session_ttl_minutes = config.session_ttl_minutes,
        single_learner = config.default_user_id.is_some(),
        "shuxue backend listening"
    );
    let app = shuxue_backend_rust::create_app_with(config, catalog);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!(error = %err, %addr, "bind listener failed");
            std::process::exit(1);
        }
    };

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(error = %e, "server error");
    }

    tracing::info!("Graceful shutdown complete");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %err, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to install SIGTERM handler");
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
}
