use std::sync::Arc;

use anyhow::Context;
use preflight_core::YamlFileSource;
use preflight_lib::App;
use preflight_server::ServerConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_CONFIG_PATH: &str = "config/system.yaml";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_path =
        std::env::var("PREFLIGHT_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let mut server = ServerConfig::default();
    if let Ok(addr) = std::env::var("PREFLIGHT_ADDR") {
        server.bind_addr = addr
            .parse()
            .with_context(|| format!("无效的监听地址: {}", addr))?;
    }

    let app = App::new(Arc::new(YamlFileSource::new(&config_path)), &server);
    let router = app.router();

    let listener = tokio::net::TcpListener::bind(server.bind_addr)
        .await
        .with_context(|| format!("无法监听 {}", server.bind_addr))?;
    tracing::info!("[Server] 监听 {}，配置文件 {}", listener.local_addr()?, config_path);

    axum::serve(listener, router).await?;
    Ok(())
}
