//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use segment_router::config::{RouteConfig, RouterConfig};
use segment_router::http::HttpServer;
use segment_router::lifecycle::Shutdown;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

/// Config with a representative route set.
pub fn sample_config() -> RouterConfig {
    let mut config = RouterConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.routes = vec![
        RouteConfig::new("user/$id:int/profile", "echo"),
        RouteConfig::new("user/$name/posts", "echo"),
        RouteConfig::new("blog/$year:int/$slug:str", "@post"),
        RouteConfig::new("price/$amount:float", "echo"),
        RouteConfig::new("files/$path", "echo"),
        RouteConfig::new("health", "Health::check"),
    ];
    config.aliases.insert("post".into(), "echo".into());
    config
}

/// Paths exercised by cache and resolution tests.
pub const SAMPLE_PATHS: &[&str] = &[
    "",
    "/",
    "/user/42/profile",
    "/user/42/profile/",
    "/USER/42/PROFILE",
    "/user/abc/profile",
    "/user/abc/posts",
    "/blog/2024/hello-world?ref=feed",
    "/blog/twenty/hello",
    "/price/3.14",
    "/price/3",
    "/files/a%20b",
    "/files/a/b",
    "/health",
    "/unknown/route",
];

/// Unique temp file path for this process.
pub fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("segment-router-it-{}-{}", name, std::process::id()))
}

/// Start a server on an ephemeral port.
pub async fn start_server(
    config: RouterConfig,
) -> (SocketAddr, Shutdown, mpsc::UnboundedSender<RouterConfig>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let (update_tx, config_updates) = mpsc::unbounded_channel();
    let server = HttpServer::new(config).unwrap();
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, config_updates, server_shutdown).await;
    });

    tokio::time::sleep(Duration::from_millis(100)).await;
    (addr, shutdown, update_tx)
}
