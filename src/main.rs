// src/main.rs
use container_loader::api;
use container_loader::config::AppConfig;

#[tokio::main]
async fn main() {
    let dotenv_result = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,container_loader=debug".into()),
        )
        .init();

    if let Err(err) = dotenv_result {
        if !matches!(err, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound)
        {
            tracing::warn!(error = %err, "Could not load .env");
        }
    }

    let app_config = AppConfig::from_env();
    let api_config = app_config.api.clone();
    let optimizer_config = app_config.optimizer.clone();

    tracing::info!(config = ?optimizer_config.packing_config(), "Container loader starting");
    if let Err(err) = api::start_api_server(api_config, optimizer_config).await {
        tracing::error!(error = %err, "API server terminated with an error");
        std::process::exit(1);
    }
}
