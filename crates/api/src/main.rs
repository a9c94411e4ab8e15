use anyhow::Context;

use stockroom_infra::config::CatalogConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    stockroom_observability::init();

    let config = CatalogConfig::from_env().context("invalid configuration")?;
    let bind = std::env::var("STOCKROOM_BIND").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

    let app = stockroom_api::app::build_app(config).await?;

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("failed to bind {bind}"))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
