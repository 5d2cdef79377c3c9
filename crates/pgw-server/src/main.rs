//! CLI entry point: load configuration, connect the provider fleet,
//! and serve the HTTP front end until shutdown (spec §1, §5 "Shutdown").

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use pgw_server::http::{build_router, AppState};
use pgw_supervisor::ProviderSupervisor;
use pgw_transport::RmcpTransport;

/// Provider gateway: exposes a fleet of STDIO tool servers over HTTP.
#[derive(Parser, Debug)]
#[command(name = "pgw-server", version, about)]
struct Cli {
    /// Path to the providers YAML file. Falls back to `PGW_CONFIG`,
    /// then `providers.yaml`.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Address the HTTP front end binds to.
    #[arg(long, default_value = "127.0.0.1:8080")]
    bind: SocketAddr,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    pgw_server::logging::init();
    let cli = Cli::parse();

    let tunables = pgw_server::config::tunables_from_env().context("invalid tunables")?;
    let config_path = pgw_server::config::resolve_config_path(cli.config);
    let providers = pgw_server::config::load_providers(&config_path, tunables)
        .with_context(|| format!("failed to load '{}'", config_path.display()))?;

    pgw_domain::info!(
        "startup",
        "loaded provider configuration",
        format!("{} provider(s) from {}", providers.len(), config_path.display())
    );

    let transport = RmcpTransport::new();
    let supervisor = Arc::new(ProviderSupervisor::new(transport, tunables));
    supervisor.connect_all(providers).await;

    let metrics_handle = PrometheusBuilder::new()
        .install_recorder()
        .context("failed to install Prometheus recorder")?;

    let state = AppState::new(Arc::clone(&supervisor), metrics_handle);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(cli.bind)
        .await
        .with_context(|| format!("failed to bind {}", cli.bind))?;
    pgw_domain::info!("startup", "listening", cli.bind.to_string());

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("HTTP server failed")?;

    pgw_domain::info!("shutdown", "draining provider fleet");
    supervisor.shutdown().await;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
