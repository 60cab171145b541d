use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let prefix = std::env::var("API_PREFIX").ok().filter(|p| !p.is_empty());
    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;
    match &prefix {
        Some(prefix) => tracing::info!("listening on http://{addr}/{prefix}"),
        None => tracing::info!("listening on http://{addr}"),
    }
    mock_server::run(listener, prefix.as_deref()).await
}
