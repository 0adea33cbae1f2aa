use anyhow::Context;
use tracing_subscriber::EnvFilter;
use umkmkarir::{app, AppState, Config, DocStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let config = Config::from_env()?;

    let store = DocStore::connect(&config.database_url, &config.app_id)
        .await
        .with_context(|| format!("opening document store at {}", config.database_url))?;

    let bind_addr = config.bind_addr.clone();
    let app_state = AppState::new(store, config).map_err(|err| err.0)?;

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding {bind_addr}"))?;
    tracing::info!(%bind_addr, "listening");

    axum::serve(listener, app(app_state)).await?;
    Ok(())
}
