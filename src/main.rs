use anyhow::Context;
use tracing_subscriber::EnvFilter;

use clubsite_api::{app, config, is_production, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up SESSION_SECRET, ADMIN_PASSWORD, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("clubsite_api=info,tower_http=info")),
        )
        .init();

    // Initialize configuration (this loads the config singleton)
    let config = config::config();
    tracing::info!("Starting clubsite API in {:?} mode", config.environment);

    let problems = config.startup_problems();
    if !problems.is_empty() {
        if is_production!() {
            anyhow::bail!("refusing to start: {}", problems.join(", "));
        }
        for problem in problems {
            tracing::warn!("{}", problem);
        }
    }
    if config.api.enable_dev_endpoints && config.security.local_admin_token.is_none() {
        tracing::warn!("Dev endpoints enabled but LOCAL_ADMIN_TOKEN is unset; every /dev request will be rejected");
    }

    let state = AppState::from_config(config.clone());
    let app = app(state);

    let bind_addr = format!("0.0.0.0:{}", config.api.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!(
        data_dir = %config.storage.data_dir.display(),
        upload_dir = %config.storage.upload_dir.display(),
        "Clubsite API listening on http://{}",
        bind_addr
    );

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
