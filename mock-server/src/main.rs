use mock_server::MockDevice;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("127.0.0.1:{port}");
    let device = match std::env::var("SLIDE_CODE") {
        Ok(code) if !code.is_empty() => MockDevice::with_code(&code),
        _ => MockDevice::new(),
    };

    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "mock slide listening");
    mock_server::run(listener, device).await
}
