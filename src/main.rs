//! `cliente-lookup` server binary.
//!
//! Configuration comes from the environment, see [`Settings`]. Log level is
//! controlled by `RUST_LOG` (default `cliente_lookup=info,tower_http=info`).

use std::sync::Arc;

use anyhow::Context;
use cliente_lookup::{router, AppState, Settings, SqlApiClient, VendedorDirectory};
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cliente_lookup=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Settings::from_env().context("invalid configuration")?;
    tracing::info!(
        sql_api_url = %settings.sql_api_url,
        timeout_ms = settings.client.timeout_ms,
        max_retries = settings.client.max_retries,
        retry_backoff_ms = settings.client.retry_backoff_ms,
        "starting cliente-lookup"
    );

    let client =
        SqlApiClient::new(settings.sql_api_url.clone()).with_options(settings.client.clone());
    let mut state = AppState::new(client);

    if let Some(vendedores) = &settings.vendedores {
        let directory = VendedorDirectory::load(&vendedores.path, vendedores.ttl)
            .await
            .context("could not load vendedor directory")?;
        state = state.with_vendedores(Arc::new(directory));
    }

    let listener = TcpListener::bind(settings.listen_addr)
        .await
        .with_context(|| format!("could not bind {}", settings.listen_addr))?;
    tracing::info!(addr = %settings.listen_addr, "listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server failed")?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "could not listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
